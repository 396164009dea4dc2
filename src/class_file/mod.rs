//! Wire-format representation of a class file
//!
//! Everything in this module serializes to the exact byte layout the class loader and bytecode
//! verifier consume: big-endian multi-byte fields, `u16`-prefixed tables, length-prefixed
//! attribute bodies.

mod attribute;
mod class;
mod constants;
mod field;
mod method;
mod serialize;
mod version;

pub use attribute::*;
pub use class::*;
pub use constants::*;
pub use field::*;
pub use method::*;
pub use serialize::*;
pub use version::*;
