pub mod segment;
pub mod windows;
pub mod eval;
