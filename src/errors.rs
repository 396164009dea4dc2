use crate::class_file::{ClassConstantIndex, ConstantIndex, ConstantPoolOverflow};
use crate::verifier::CompactFrame;

#[derive(Debug)]
pub enum Error {
    ConstantPoolOverflow(ConstantPoolOverflow),
    IoError(std::io::Error),

    /// A particular offset has two conflicting frames
    ConflictingFrames {
        offset: u16,
        frame: CompactFrame<ClassConstantIndex, u16>,
        existing: CompactFrame<ClassConstantIndex, u16>,
    },

    /// The offset -> state table handed to the encoder was not ascending
    FramesOutOfOrder { previous: u16, found: u16 },

    /// Two class attributes of different kinds were asked to merge
    IncompatibleAttributes {
        left: &'static str,
        right: &'static str,
    },

    /// An index pointing into the second slot of a `long`/`double` pool entry
    MisalignedConstantIndex(ConstantIndex),

    /// An index past the end of the constant pool
    MissingConstant(ConstantIndex),
}

impl From<ConstantPoolOverflow> for Error {
    fn from(overflow: ConstantPoolOverflow) -> Error {
        Error::ConstantPoolOverflow(overflow)
    }
}
