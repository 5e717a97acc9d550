mod key_codec;
mod secret_generator;

pub use key_codec::*;
pub use secret_generator::*;
