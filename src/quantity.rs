#[macro_use]
pub mod macros;

pub mod charge;
pub mod current;
pub mod time;
pub mod voltage;
mod zero;

pub use self::zero::Zero;
