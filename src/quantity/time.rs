quantity!(Seconds, "s");
