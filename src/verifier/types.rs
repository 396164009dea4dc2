use crate::class_file::{ClassConstantIndex, ConstantPoolOverflow, ConstantsPool, Serialize};
use crate::util::Width;
use byteorder::WriteBytesExt;

/// These types are from [this hierarchy][0]
///
/// The type is generic in the class payload `Cls` and the uninitialized payload `U`:
///
///   - while states are being produced by an instruction emitter, `Cls` is the internal binary
///     name of the class (a `String`) and `U` is the absolute offset of the `new` instruction
///   - when serializing into a classfile, `Cls` becomes a `ClassConstantIndex` into the pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.10.1.2
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum VerificationType<Cls, U> {
    /// Unknown or uninhabited slot; also the filler occupying the upper half of a category-2
    /// value in the raw (per-slot) local array
    Top,

    Integer,
    Float,
    Double,
    Long,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    /// Object type
    Object(Cls),

    /// State of an object after `new` has been called but `<init>` has not been called
    Uninitialized(U),
}

impl VerificationType<String, u16> {
    /// Resolve the type into its serializable form, registering the class constant if needed
    pub fn into_serializable(
        &self,
        constants: &mut ConstantsPool,
    ) -> Result<VerificationType<ClassConstantIndex, u16>, ConstantPoolOverflow> {
        Ok(match self {
            VerificationType::Top => VerificationType::Top,
            VerificationType::Integer => VerificationType::Integer,
            VerificationType::Float => VerificationType::Float,
            VerificationType::Double => VerificationType::Double,
            VerificationType::Long => VerificationType::Long,
            VerificationType::Null => VerificationType::Null,
            VerificationType::UninitializedThis => VerificationType::UninitializedThis,
            VerificationType::Object(class_name) => {
                VerificationType::Object(constants.get_class(class_name)?)
            }
            VerificationType::Uninitialized(offset) => VerificationType::Uninitialized(*offset),
        })
    }
}

impl Serialize for VerificationType<ClassConstantIndex, u16> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            VerificationType::Top => 0u8.serialize(writer)?,
            VerificationType::Integer => 1u8.serialize(writer)?,
            VerificationType::Float => 2u8.serialize(writer)?,
            VerificationType::Double => 3u8.serialize(writer)?,
            VerificationType::Long => 4u8.serialize(writer)?,
            VerificationType::Null => 5u8.serialize(writer)?,
            VerificationType::UninitializedThis => 6u8.serialize(writer)?,
            VerificationType::Object(cls) => {
                7u8.serialize(writer)?;
                cls.serialize(writer)?;
            }
            VerificationType::Uninitialized(off) => {
                8u8.serialize(writer)?;
                off.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl<Cls, A> Width for VerificationType<Cls, A> {
    fn width(&self) -> usize {
        match self {
            VerificationType::Double | VerificationType::Long => 2,
            _ => 1,
        }
    }
}
