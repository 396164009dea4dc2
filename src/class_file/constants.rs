use crate::class_file::{Attribute, AttributeLike, Serialize};
use crate::errors::Error;
use crate::util::{Offset, OffsetResult, OffsetVec, Width};
use byteorder::WriteBytesExt;
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::result::Result;

/// Class file constants pool builder
///
/// The pool is append only and only after the pool is fully built up, it can be consumed into a
/// regular [`OffsetVec`]. Registration is idempotent: the `get_*` methods return the index already
/// assigned to a structurally equal constant. Constituent constants (eg. the UTF-8 name inside a
/// class constant) are always registered before the constant that refers to them.
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,

    utf8s: HashMap<String, Utf8ConstantIndex>,
    classes: HashMap<String, ClassConstantIndex>,
    strings: HashMap<Utf8ConstantIndex, StringConstantIndex>,
    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<u32, ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<u64, ConstantIndex>,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
    fieldrefs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), FieldRefConstantIndex>,
    methodrefs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex, bool), MethodRefConstantIndex>,
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    ///
    /// Index 0 is reserved by the format, so the first constant lands at index 1.
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            strings: HashMap::new(),
            integers: HashMap::new(),
            floats: HashMap::new(),
            longs: HashMap::new(),
            doubles: HashMap::new(),
            name_and_types: HashMap::new(),
            fieldrefs: HashMap::new(),
            methodrefs: HashMap::new(),
        }
    }

    /// List out the internal names of all classes referenced in the constant pool
    pub fn referenced_classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, ConstantPoolOverflow> {
        // Compute the offset at which this constant will be inserted
        let offset = self.constants.offset_len().0;

        // Detect if the next constant would overflow the pool
        if offset + constant.width() > u16::MAX as usize {
            return Err(ConstantPoolOverflow {
                constant,
                offset: offset as u16,
            });
        }

        self.constants.push(constant);
        Ok(ConstantIndex(offset as u16))
    }

    /// Consume the pool and return the final vector of constants
    pub fn into_offset_vec(self) -> OffsetVec<Constant> {
        self.constants
    }

    /// Resolve an index back into its constant
    ///
    /// An index that points into the second slot of a `long`/`double` entry violates the pool's
    /// alignment invariant and is reported as an error, not silently resolved.
    pub fn lookup(&self, index: ConstantIndex) -> Result<&Constant, Error> {
        match self.constants.get_offset(Offset(index.0 as usize)) {
            OffsetResult::Ok(_, constant) => Ok(constant),
            OffsetResult::InvalidOffset(_) => Err(Error::MisalignedConstantIndex(index)),
            OffsetResult::TooLarge => Err(Error::MissingConstant(index)),
        }
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, ConstantPoolOverflow> {
        let cow = utf8.into();

        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            Ok(*idx)
        } else {
            let owned = cow.into_owned();
            let constant = Constant::Utf8(owned.clone());
            let idx = Utf8ConstantIndex(self.push_constant(constant)?);
            self.utf8s.insert(owned, idx);
            Ok(idx)
        }
    }

    /// Get or insert a class constant from the constant pool
    ///
    /// The name is an internal binary name (eg. `java/lang/Object`); its UTF-8 constituent is
    /// registered first.
    pub fn get_class(&mut self, name: &str) -> Result<ClassConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.classes.get(name) {
            Ok(*idx)
        } else {
            let name_utf8 = self.get_utf8(name)?;
            let idx = ClassConstantIndex(self.push_constant(Constant::Class(name_utf8))?);
            self.classes.insert(name.to_owned(), idx);
            Ok(idx)
        }
    }

    /// Get or insert a string constant from the constant pool
    pub fn get_string(
        &mut self,
        utf8: Utf8ConstantIndex,
    ) -> Result<StringConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.strings.get(&utf8) {
            Ok(*idx)
        } else {
            let idx = StringConstantIndex(self.push_constant(Constant::String(utf8))?);
            self.strings.insert(utf8, idx);
            Ok(idx)
        }
    }

    /// Get or insert an integer constant from the constant pool
    pub fn get_integer(&mut self, integer: i32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.integers.get(&integer) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Integer(integer))?;
            self.integers.insert(integer, idx);
            Ok(idx)
        }
    }

    /// Get or insert a float constant from the constant pool
    ///
    /// Deduplication is by bit pattern, so `-0.0` and `0.0` stay distinct and `NaN` is usable.
    pub fn get_float(&mut self, float: f32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let key = float.to_bits();
        if let Some(idx) = self.floats.get(&key) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Float(float))?;
            self.floats.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a long constant from the constant pool (occupies two slots)
    pub fn get_long(&mut self, long: i64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.longs.get(&long) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Long(long))?;
            self.longs.insert(long, idx);
            Ok(idx)
        }
    }

    /// Get or insert a double constant from the constant pool (occupies two slots)
    pub fn get_double(&mut self, double: f64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let key = double.to_bits();
        if let Some(idx) = self.doubles.get(&key) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Double(double))?;
            self.doubles.insert(key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a name & type constant from the constant pool
    pub fn get_name_and_type(
        &mut self,
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    ) -> Result<NameAndTypeConstantIndex, ConstantPoolOverflow> {
        let name_and_type_key = (name, descriptor);
        if let Some(idx) = self.name_and_types.get(&name_and_type_key) {
            Ok(*idx)
        } else {
            let constant = Constant::NameAndType { name, descriptor };
            let idx = NameAndTypeConstantIndex(self.push_constant(constant)?);
            self.name_and_types.insert(name_and_type_key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a field reference constant from the constant pool
    pub fn get_field_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<FieldRefConstantIndex, ConstantPoolOverflow> {
        let class_idx = self.get_class(class)?;
        let name_utf8 = self.get_utf8(name)?;
        let descriptor_utf8 = self.get_utf8(descriptor)?;
        let name_and_type_idx = self.get_name_and_type(name_utf8, descriptor_utf8)?;

        let fieldref_key = (class_idx, name_and_type_idx);
        if let Some(idx) = self.fieldrefs.get(&fieldref_key) {
            Ok(*idx)
        } else {
            let constant = Constant::FieldRef(class_idx, name_and_type_idx);
            let idx = FieldRefConstantIndex(self.push_constant(constant)?);
            self.fieldrefs.insert(fieldref_key, idx);
            Ok(idx)
        }
    }

    /// Get or insert a method reference constant from the constant pool
    pub fn get_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        is_interface: bool,
    ) -> Result<MethodRefConstantIndex, ConstantPoolOverflow> {
        let class_idx = self.get_class(class)?;
        let name_utf8 = self.get_utf8(name)?;
        let descriptor_utf8 = self.get_utf8(descriptor)?;
        let name_and_type_idx = self.get_name_and_type(name_utf8, descriptor_utf8)?;

        let methodref_key = (class_idx, name_and_type_idx, is_interface);
        if let Some(idx) = self.methodrefs.get(&methodref_key) {
            Ok(*idx)
        } else {
            let constant = Constant::MethodRef {
                class: class_idx,
                name_and_type: name_and_type_idx,
                is_interface,
            };
            let idx = MethodRefConstantIndex(self.push_constant(constant)?);
            self.methodrefs.insert(methodref_key, idx);
            Ok(idx)
        }
    }

    /// Register a constant (and its constituents) and write its big-endian index
    ///
    /// Callers never write raw numeric indices themselves.
    pub fn write_index<W: WriteBytesExt>(
        &mut self,
        constant: &ConstantData,
        writer: &mut W,
    ) -> Result<(), Error> {
        let index = constant.constant_index(self)?;
        index.serialize(writer).map_err(Error::IoError)
    }

    /// Add an attribute to the constant pool
    ///
    /// The attribute's name constant is interned here, which means attribute names only ever
    /// reach the pool for attributes that are actually emitted.
    pub fn get_attribute<A: AttributeLike>(&mut self, attribute: A) -> Result<Attribute, Error> {
        let name_index = self.get_utf8(A::NAME)?;
        let mut info = vec![];

        attribute.serialize(&mut info).map_err(Error::IoError)?;

        Ok(Attribute { name_index, info })
    }
}

impl Default for ConstantsPool {
    fn default() -> ConstantsPool {
        ConstantsPool::new()
    }
}

#[derive(Debug)]
pub struct ConstantPoolOverflow {
    pub constant: Constant,
    pub offset: u16,
}

/// Constants as in the constant pool
///
/// Note: method handle, method type, and invoke dynamic constants are not included (this
/// assembler never generates them).
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                (buffer.len() as u16).serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
            Constant::Class(name) => {
                7u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::String(utf8) => {
                8u8.serialize(writer)?;
                utf8.serialize(writer)?;
            }
            Constant::FieldRef(class, name_and_type) => {
                9u8.serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => {
                (if !is_interface { 10u8 } else { 11u8 }).serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::NameAndType { name, descriptor } => {
                12u8.serialize(writer)?;
                name.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
        };
        Ok(())
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the spec:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
/// >
/// > In retrospect, making 8-byte constants take two constant pool entries was a poor choice.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// The `constant_pool_count` is one more than the highest occupied slot, not the number of
/// entries, because wide constants burn an extra index.
impl Serialize for OffsetVec<Constant> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        (self.offset_len().0 as u16).serialize(writer)?;
        for (_, _, constant) in self.iter() {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

/// Symbolic form of a constant, before any pool index has been assigned
///
/// Registering one of these registers its constituents first (a class constant registers the
/// UTF-8 constant holding its name, a field reference registers a class and a name & type, and
/// so on), so the pool invariant that every referenced index exists holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantData {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(String),
    String(String),
    FieldRef {
        class: String,
        name: String,
        descriptor: String,
    },
    MethodRef {
        class: String,
        name: String,
        descriptor: String,
        is_interface: bool,
    },
    NameAndType {
        name: String,
        descriptor: String,
    },
}

impl ConstantData {
    /// Unpack the constants this constant refers to
    ///
    /// All of these must be (and, via [`ConstantsWriter::constant_index`], are) registered in the
    /// pool before the referring constant itself.
    pub fn constituents(&self) -> Vec<ConstantData> {
        match self {
            ConstantData::Utf8(_)
            | ConstantData::Integer(_)
            | ConstantData::Float(_)
            | ConstantData::Long(_)
            | ConstantData::Double(_) => vec![],
            ConstantData::Class(name) => vec![ConstantData::Utf8(name.clone())],
            ConstantData::String(value) => vec![ConstantData::Utf8(value.clone())],
            ConstantData::NameAndType { name, descriptor } => vec![
                ConstantData::Utf8(name.clone()),
                ConstantData::Utf8(descriptor.clone()),
            ],
            ConstantData::FieldRef {
                class,
                name,
                descriptor,
            }
            | ConstantData::MethodRef {
                class,
                name,
                descriptor,
                ..
            } => vec![
                ConstantData::Class(class.clone()),
                ConstantData::NameAndType {
                    name: name.clone(),
                    descriptor: descriptor.clone(),
                },
            ],
        }
    }
}

pub trait ConstantsWriter<Index = ConstantIndex> {
    /// Get or insert a constant into the constant pool and return the associated index
    fn constant_index(
        &self,
        constants: &mut ConstantsPool,
    ) -> Result<Index, ConstantPoolOverflow>;
}

impl ConstantsWriter for ConstantData {
    fn constant_index(
        &self,
        constants: &mut ConstantsPool,
    ) -> Result<ConstantIndex, ConstantPoolOverflow> {
        match self {
            ConstantData::Utf8(string) => Ok(constants.get_utf8(string.as_str())?.into()),
            ConstantData::Integer(integer) => constants.get_integer(*integer),
            ConstantData::Float(float) => constants.get_float(*float),
            ConstantData::Long(long) => constants.get_long(*long),
            ConstantData::Double(double) => constants.get_double(*double),
            ConstantData::Class(name) => Ok(constants.get_class(name)?.into()),
            ConstantData::String(value) => {
                let utf8 = constants.get_utf8(value.as_str())?;
                Ok(constants.get_string(utf8)?.into())
            }
            ConstantData::NameAndType { name, descriptor } => {
                let name = constants.get_utf8(name.as_str())?;
                let descriptor = constants.get_utf8(descriptor.as_str())?;
                Ok(constants.get_name_and_type(name, descriptor)?.into())
            }
            ConstantData::FieldRef {
                class,
                name,
                descriptor,
            } => Ok(constants.get_field_ref(class, name, descriptor)?.into()),
            ConstantData::MethodRef {
                class,
                name,
                descriptor,
                is_interface,
            } => Ok(constants
                .get_method_ref(class, name, descriptor, *is_interface)?
                .into()),
        }
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u{0000}` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![];
    for c in string.chars() {
        // Handle the exception for how `\u{0000}` is represented
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x1F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

impl ConstantIndex {
    /// Index 0 is reserved by the format and never refers to a pool entry
    pub const ZERO: ConstantIndex = ConstantIndex(0);
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct StringConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(pub ConstantIndex);

impl ClassConstantIndex {
    /// Stands in for "no class" (eg. the super class of `java/lang/Object`)
    pub const ZERO: ClassConstantIndex = ClassConstantIndex(ConstantIndex::ZERO);
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct FieldRefConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct MethodRefConstantIndex(pub ConstantIndex);

impl From<Utf8ConstantIndex> for ConstantIndex {
    fn from(index: Utf8ConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<StringConstantIndex> for ConstantIndex {
    fn from(index: StringConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<NameAndTypeConstantIndex> for ConstantIndex {
    fn from(index: NameAndTypeConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<ClassConstantIndex> for ConstantIndex {
    fn from(index: ClassConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<FieldRefConstantIndex> for ConstantIndex {
    fn from(index: FieldRefConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<MethodRefConstantIndex> for ConstantIndex {
    fn from(index: MethodRefConstantIndex) -> ConstantIndex {
        index.0
    }
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for Utf8ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for StringConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for NameAndTypeConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for ClassConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for FieldRefConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for MethodRefConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}


#[cfg(test)]
mod pool_tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let mut constants = ConstantsPool::new();
        let first = constants.get_utf8("example").unwrap();
        let again = constants.get_utf8("example").unwrap();
        assert_eq!(first, again);

        let other = constants.get_utf8("other").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut constants = ConstantsPool::new();
        let long_idx = constants.get_long(42).unwrap();
        assert_eq!(long_idx, ConstantIndex(1));

        // The companion slot at index 2 is burned, so the next constant lands at 3
        let next = constants.get_utf8("x").unwrap();
        assert_eq!(ConstantIndex::from(next), ConstantIndex(3));

        assert!(constants.lookup(ConstantIndex(1)).is_ok());
        assert!(matches!(
            constants.lookup(ConstantIndex(2)),
            Err(Error::MisalignedConstantIndex(ConstantIndex(2)))
        ));
        assert!(matches!(
            constants.lookup(ConstantIndex(4)),
            Err(Error::MissingConstant(ConstantIndex(4)))
        ));
    }

    #[test]
    fn class_constant_registers_name_constituent() {
        let mut constants = ConstantsPool::new();
        let class_idx = constants.get_class("java/lang/Object").unwrap();

        // The UTF-8 name was registered before the class constant itself
        let name_idx = constants.get_utf8("java/lang/Object").unwrap();
        assert_eq!(ConstantIndex::from(name_idx), ConstantIndex(1));
        assert_eq!(ConstantIndex::from(class_idx), ConstantIndex(2));
    }

    #[test]
    fn member_ref_constituents() {
        let data = ConstantData::FieldRef {
            class: String::from("Example"),
            name: String::from("x"),
            descriptor: String::from("I"),
        };
        assert_eq!(
            data.constituents(),
            vec![
                ConstantData::Class(String::from("Example")),
                ConstantData::NameAndType {
                    name: String::from("x"),
                    descriptor: String::from("I"),
                },
            ]
        );

        let mut constants = ConstantsPool::new();
        let idx = data.constant_index(&mut constants).unwrap();
        // utf8 "Example", class, utf8 "x", utf8 "I", name & type, then the field ref
        assert_eq!(idx, ConstantIndex(6));
        assert!(matches!(
            constants.lookup(idx),
            Ok(Constant::FieldRef(_, _))
        ));
    }

    #[test]
    fn write_index_registers_first() {
        let mut constants = ConstantsPool::new();
        let mut out: Vec<u8> = vec![];
        constants
            .write_index(&ConstantData::Class(String::from("A")), &mut out)
            .unwrap();

        // utf8 "A" took index 1, so the class constant is at index 2
        assert_eq!(out, vec![0, 2]);
    }

    #[test]
    fn loadable_constants_register_transitively() {
        let mut constants = ConstantsPool::new();

        let string = ConstantData::String(String::from("hi"));
        let idx = string.constant_index(&mut constants).unwrap();
        // utf8 "hi" first, then the string constant referring to it
        assert_eq!(idx, ConstantIndex(2));

        let method = ConstantData::MethodRef {
            class: String::from("java/lang/Object"),
            name: String::from("<init>"),
            descriptor: String::from("()V"),
            is_interface: false,
        };
        let idx = method.constant_index(&mut constants).unwrap();
        assert!(matches!(
            constants.lookup(idx),
            Ok(Constant::MethodRef {
                is_interface: false,
                ..
            })
        ));
        // Registration is idempotent through the symbolic layer too
        assert_eq!(method.constant_index(&mut constants).unwrap(), idx);
    }

    #[test]
    fn float_deduplication_is_by_bit_pattern() {
        let mut constants = ConstantsPool::new();
        let positive = constants.get_float(0.0).unwrap();
        let negative = constants.get_float(-0.0).unwrap();
        assert_ne!(positive, negative);
        assert_eq!(positive, constants.get_float(0.0).unwrap());
    }
}
