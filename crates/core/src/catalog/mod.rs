pub mod builtin;
pub mod synthetic;
