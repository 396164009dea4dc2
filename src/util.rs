//! Generic containers used by the class-file encoder

mod offset_vec;

pub use offset_vec::*;
