quantity!(Amperes, "A");
