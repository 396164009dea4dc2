//! Assemble JVM class files
//!
//! This crate turns symbolic method bodies and pre-computed verifier type states into byte-exact
//! class files: it owns the constant pool, the field/method tables, and the attributes - most
//! importantly the `StackMapTable` metadata that lets the JVM verify a method by type-checking
//! instead of symbolic execution. Encoding individual instructions and tracking the type state
//! they produce is the caller's job; this crate consumes the finished offset -> state table.
//!
//! ### Simple example
//!
//! Consider a class with a single static method `int max(int, int)`. The conditional branch
//! makes offset 7 a jump target, so the method needs a stack map frame there:
//!
//! ```
//! use classfile_asm::class_file::{Serialize, Version};
//! use classfile_asm::model::{Class, Code, Method};
//! use classfile_asm::verifier::{Frame, VerificationType};
//! use classfile_asm::{ClassAccessFlags, Error, MethodAccessFlags};
//!
//! # fn assemble() -> Result<(), Error> {
//! // At entry and at the branch target the locals are the two `int` arguments
//! let entry_frame = Frame::<String, u16> {
//!     locals: vec![VerificationType::Integer, VerificationType::Integer],
//!     stack: vec![],
//! };
//!
//! let mut class = Class::new(
//!     ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
//!     "Example",
//!     Some("java/lang/Object"),
//! );
//! class.add_method(Method {
//!     access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
//!     name: String::from("max"),
//!     descriptor: String::from("(II)I"),
//!     code: Some(Code {
//!         max_stack: 2,
//!         max_locals: 2,
//!         //             iload_0 iload_1 if_icmple +5      iload_0 ireturn iload_1 ireturn
//!         bytecode: vec![0x1a, 0x1b, 0xa4, 0x00, 0x05, 0x1a, 0xac, 0x1b, 0xac],
//!         frames: vec![(7, entry_frame.clone())],
//!         entry_frame,
//!     }),
//!     generic_signature: None,
//! });
//!
//! // Finally, encode the class into bytes
//! let class_file = class.serialize(Version::JAVA8)?;
//! let mut class_bytes: Vec<u8> = vec![];
//! class_file.serialize(&mut class_bytes).map_err(Error::IoError)?;
//! assert_eq!(&class_bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
//! # Ok(())
//! # }
//! # assemble().unwrap();
//! ```

mod access_flags;
pub mod class_file;
mod errors;
mod inner_classes;
pub mod model;
pub mod util;
pub mod verifier;

pub use access_flags::*;
pub use errors::*;
pub use inner_classes::*;
