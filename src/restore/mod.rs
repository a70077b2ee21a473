mod logic;

pub use logic::run_restore;
