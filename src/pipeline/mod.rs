pub mod eval;
pub mod segment;
pub mod windows;
