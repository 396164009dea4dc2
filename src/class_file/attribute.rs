use crate::class_file::{ClassConstantIndex, Serialize, Utf8ConstantIndex};
use crate::verifier::VerificationType;
use crate::InnerClassAccessFlags;
use byteorder::WriteBytesExt;

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// The representation is designed to be easily extended with custom attributes.
/// While some attributes aren't essential, others are really important (eg. the
/// code attribute for including the actual bytecode).
///
/// The body is kept as an already-serialized buffer, so the 4-byte length prefix written by
/// [`Serialize`] is exact by construction.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: Vec<u8>,
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        (self.info.len() as u32).serialize(writer)?;
        writer.write_all(&self.info)?;

        Ok(())
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be turned into attributes.
pub trait AttributeLike: Serialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_array: BytecodeArray,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Code {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        self.code_array.serialize(writer)?;
        self.exception_table.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";
}

pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: BytecodeIndex,

    /// End of exception handler range (exclusive)
    pub end_pc: BytecodeIndex,

    /// Start of the exception handler
    pub handler_pc: BytecodeIndex,

    pub catch_type: ClassConstantIndex,
}

impl Serialize for ExceptionHandler {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.start_pc.serialize(writer)?;
        self.end_pc.serialize(writer)?;
        self.handler_pc.serialize(writer)?;
        self.catch_type.serialize(writer)?;
        Ok(())
    }
}

/// Encoded bytecode instructions
pub struct BytecodeArray(pub Vec<u8>);

impl Serialize for BytecodeArray {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        let len = self.0.len() as u32;
        len.serialize(writer)?;
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// Index into `BytecodeArray`
pub struct BytecodeIndex(pub u16);

impl Serialize for BytecodeIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.7.4
#[derive(Debug)]
pub struct StackMapTable(pub Vec<StackMapFrame>);

impl AttributeLike for StackMapTable {
    const NAME: &'static str = "StackMapTable";
}

impl Serialize for StackMapTable {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// Frames carry their offset as a delta from the previous frame: the first frame's delta is its
/// absolute offset, every following frame's delta is `offset - previous_offset - 1`. The compact
/// single-byte forms exist only for deltas of at most 63; every extended form carries the delta
/// as a 16-bit big-endian field after the tag.
#[derive(Debug, PartialEq, Eq)]
pub enum StackMapFrame {
    /// Frame has the same locals as the previous frame and number of stack items is zero
    /// Tags: 0-63 or 251
    SameLocalsNoStack { offset_delta: u16 },

    /// Frame has the same locals as the previous frame and number of stack items is one
    /// Tags: 64-127 or 247
    SameLocalsOneStack {
        offset_delta: u16,
        stack: VerificationType<ClassConstantIndex, u16>,
    },

    /// Frame is like the previous frame, but without the last `chopped_k` locals
    ///
    /// Note: `chopped_k` must be in the range 1 to 3 inclusive
    /// Tags: 248-250
    ChopLocalsNoStack { offset_delta: u16, chopped_k: u8 },

    /// Frame is like the previous frame, but with extra locals
    /// Tags: 252-254
    AppendLocalsNoStack {
        offset_delta: u16,
        locals: Vec<VerificationType<ClassConstantIndex, u16>>,
    },

    /// Frame has exactly the locals and stack specified
    /// Tag: 255
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType<ClassConstantIndex, u16>>,
        stack: Vec<VerificationType<ClassConstantIndex, u16>>,
    },
}

impl Serialize for StackMapFrame {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            // `same_frame` and `same_frame_extended`
            StackMapFrame::SameLocalsNoStack { offset_delta } => {
                if *offset_delta <= 63 {
                    (*offset_delta as u8).serialize(writer)?;
                } else {
                    251u8.serialize(writer)?;
                    offset_delta.serialize(writer)?;
                }
            }

            // `same_locals_1_stack_item_frame` and `same_locals_1_stack_item_frame_extended`
            StackMapFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => {
                if *offset_delta <= 63 {
                    (*offset_delta as u8 + 64).serialize(writer)?;
                } else {
                    247u8.serialize(writer)?;
                    offset_delta.serialize(writer)?;
                }
                stack.serialize(writer)?;
            }

            // `chop_frame`
            StackMapFrame::ChopLocalsNoStack {
                offset_delta,
                chopped_k,
            } => {
                assert!(
                    0 < *chopped_k && *chopped_k < 4,
                    "ChopLocalsNoStack chops 1-3 locals"
                );
                (251 - chopped_k).serialize(writer)?;
                offset_delta.serialize(writer)?;
            }

            // `append_frame`
            StackMapFrame::AppendLocalsNoStack {
                offset_delta,
                locals,
            } => {
                let added_k = locals.len();
                assert!(
                    0 < added_k && added_k < 4,
                    "AppendLocalsNoStack adds 1-3 locals"
                );
                (251 + added_k as u8).serialize(writer)?;
                offset_delta.serialize(writer)?;
                for local in locals {
                    local.serialize(writer)?;
                }
            }

            // `full_frame`
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                255u8.serialize(writer)?;
                offset_delta.serialize(writer)?;
                locals.serialize(writer)?;
                stack.serialize(writer)?;
            }
        };
        Ok(())
    }
}

/// Every inner class referenced in a class' constant pool must be included in the inner classes
/// attribute on the class.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.6
#[derive(Debug)]
pub struct InnerClasses(pub Vec<InnerClass>);

impl AttributeLike for InnerClasses {
    const NAME: &'static str = "InnerClasses";
}

impl Serialize for InnerClasses {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

#[derive(Debug)]
pub struct InnerClass {
    pub inner_class: ClassConstantIndex,
    pub outer_class: ClassConstantIndex,
    pub inner_name: Utf8ConstantIndex,
    pub access_flags: InnerClassAccessFlags,
}

impl Serialize for InnerClass {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.inner_class.serialize(writer)?;
        self.outer_class.serialize(writer)?;
        self.inner_name.serialize(writer)?;
        self.access_flags.serialize(writer)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Signature {
    pub signature: Utf8ConstantIndex,
}

impl AttributeLike for Signature {
    const NAME: &'static str = "Signature";
}

impl Serialize for Signature {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.signature.serialize(writer)?;
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.10
#[derive(Debug)]
pub struct SourceFile {
    pub source_file: Utf8ConstantIndex,
}

impl AttributeLike for SourceFile {
    const NAME: &'static str = "SourceFile";
}

impl Serialize for SourceFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.source_file.serialize(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::class_file::{ConstantIndex, ConstantsPool};
    use crate::verifier::VerificationType::*;

    fn serialized<A: Serialize>(value: &A) -> Vec<u8> {
        let mut buffer = vec![];
        value.serialize(&mut buffer).unwrap();
        buffer
    }

    fn class_index(index: u16) -> ClassConstantIndex {
        ClassConstantIndex(ConstantIndex(index))
    }

    #[test]
    fn same_frame_small_delta_fits_in_the_tag() {
        let frame = StackMapFrame::SameLocalsNoStack { offset_delta: 4 };
        assert_eq!(serialized(&frame), vec![0x04]);
    }

    #[test]
    fn same_frame_large_delta_uses_extended_form() {
        let frame = StackMapFrame::SameLocalsNoStack { offset_delta: 64 };
        assert_eq!(serialized(&frame), vec![251, 0, 64]);
    }

    #[test]
    fn one_stack_item_frame_offsets_the_tag() {
        let frame = StackMapFrame::SameLocalsOneStack {
            offset_delta: 2,
            stack: Integer,
        };
        assert_eq!(serialized(&frame), vec![66, 1]);

        let frame = StackMapFrame::SameLocalsOneStack {
            offset_delta: 100,
            stack: Object(class_index(9)),
        };
        assert_eq!(serialized(&frame), vec![247, 0, 100, 7, 0, 9]);
    }

    #[test]
    fn chop_frame_tag_encodes_the_count() {
        let frame = StackMapFrame::ChopLocalsNoStack {
            offset_delta: 5,
            chopped_k: 2,
        };
        assert_eq!(serialized(&frame), vec![249, 0, 5]);
    }

    #[test]
    #[should_panic]
    fn chop_frame_count_out_of_range() {
        let frame = StackMapFrame::ChopLocalsNoStack {
            offset_delta: 5,
            chopped_k: 4,
        };
        let _ = serialized(&frame);
    }

    #[test]
    fn append_frame_tag_encodes_the_count() {
        let frame = StackMapFrame::AppendLocalsNoStack {
            offset_delta: 8,
            locals: vec![Long, Object(class_index(7))],
        };
        assert_eq!(serialized(&frame), vec![253, 0, 8, 4, 7, 0, 7]);
    }

    #[test]
    fn full_frame_layout() {
        let frame = StackMapFrame::Full {
            offset_delta: 300,
            locals: vec![Integer],
            stack: vec![Integer, Integer],
        };
        assert_eq!(
            serialized(&frame),
            vec![255, 0x01, 0x2c, 0, 1, 1, 0, 2, 1, 1]
        );
    }

    #[test]
    fn exception_handler_layout() {
        let handler = ExceptionHandler {
            start_pc: BytecodeIndex(0),
            end_pc: BytecodeIndex(8),
            handler_pc: BytecodeIndex(9),
            catch_type: class_index(3),
        };
        assert_eq!(serialized(&handler), vec![0, 0, 0, 8, 0, 9, 0, 3]);
    }

    #[test]
    fn attribute_length_is_exact() {
        let mut constants = ConstantsPool::new();
        let code = Code {
            max_stack: 1,
            max_locals: 1,
            code_array: BytecodeArray(vec![0xb1]),
            exception_table: vec![],
            attributes: vec![],
        };
        let attribute = constants.get_attribute(code).unwrap();
        let bytes = serialized(&attribute);

        // name index (u2), length (u4), then the body
        let length = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        assert_eq!(length as usize, bytes.len() - 6);
        assert_eq!(length, 13);
    }

    #[test]
    fn signature_and_source_file_bodies_are_one_index() {
        let mut constants = ConstantsPool::new();
        let signature = Signature {
            signature: constants.get_utf8("Ljava/util/List<Ljava/lang/String;>;").unwrap(),
        };
        assert_eq!(serialized(&signature), vec![0, 1]);

        let source_file = SourceFile {
            source_file: constants.get_utf8("Example.java").unwrap(),
        };
        assert_eq!(serialized(&source_file), vec![0, 2]);
    }

    #[test]
    fn inner_classes_record_layout() {
        let inner_classes = InnerClasses(vec![InnerClass {
            inner_class: class_index(2),
            outer_class: class_index(4),
            inner_name: Utf8ConstantIndex(ConstantIndex(5)),
            access_flags: InnerClassAccessFlags::PUBLIC | InnerClassAccessFlags::STATIC,
        }]);
        assert_eq!(
            serialized(&inner_classes),
            vec![0, 1, 0, 2, 0, 4, 0, 5, 0, 0x09]
        );
    }
}
