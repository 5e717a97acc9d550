//! Request validation helpers built on garde.

mod validate;

pub use validate::*;
