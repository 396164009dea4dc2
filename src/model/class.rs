use crate::class_file;
use crate::class_file::{ClassConstantIndex, ClassFile, ConstantsPool, Version};
use crate::errors::Error;
use crate::inner_classes::InnerClassMap;
use crate::model::{Field, Method};
use crate::ClassAccessFlags;

/// Class-level attribute, in symbolic form
///
/// This is a closed set: every consumption site (serialization, [`ClassAttribute::merge`])
/// matches exhaustively, so adding a kind is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassAttribute {
    InnerClasses(InnerClassMap),
    Signature(String),
    SourceFile(String),
}

impl ClassAttribute {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassAttribute::InnerClasses(_) => "InnerClasses",
            ClassAttribute::Signature(_) => "Signature",
            ClassAttribute::SourceFile(_) => "SourceFile",
        }
    }

    /// Merge two attributes of the same kind, `self` taking precedence
    ///
    /// Inner-class maps combine with [`InnerClassMap::merge`]'s left bias; scalar attributes
    /// keep the left value outright. Asking two attributes of different kinds to merge is a
    /// contract violation and fails loudly rather than silently picking one.
    pub fn merge(self, other: ClassAttribute) -> Result<ClassAttribute, Error> {
        match (self, other) {
            (ClassAttribute::InnerClasses(left), ClassAttribute::InnerClasses(right)) => {
                Ok(ClassAttribute::InnerClasses(left.merge(right)))
            }
            (left @ ClassAttribute::Signature(_), ClassAttribute::Signature(_)) => Ok(left),
            (left @ ClassAttribute::SourceFile(_), ClassAttribute::SourceFile(_)) => Ok(left),
            (left, right) => Err(Error::IncompatibleAttributes {
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }
}

/// Semantic representation of a class
pub struct Class {
    pub access_flags: ClassAccessFlags,

    /// Internal binary name of this class (eg. `me/alec/Point`)
    pub this_class: String,

    /// Internal binary name of the super class; `None` only for `java/lang/Object`
    pub super_class: Option<String>,

    /// Internal binary names of implemented interfaces
    pub interfaces: Vec<String>,

    pub fields: Vec<Field>,
    pub methods: Vec<Method>,

    /// Class-level attributes, including inner-class records carried over from composed units
    pub attributes: Vec<ClassAttribute>,
}

impl Class {
    /// Create a new class with no members
    pub fn new(
        access_flags: ClassAccessFlags,
        this_class: &str,
        super_class: Option<&str>,
    ) -> Class {
        Class {
            access_flags,
            this_class: this_class.to_owned(),
            super_class: super_class.map(str::to_owned),
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        }
    }

    /// Add a method to the class
    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }

    /// Add a field to the class
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Serialize the class into a class file
    ///
    /// Equivalent to [`Class::serialize_filtered`] with no exclusions.
    pub fn serialize(self, version: Version) -> Result<ClassFile, Error> {
        self.serialize_filtered(version, |_| false)
    }

    /// Serialize the class into a class file, vetoing inner-class detection for some names
    ///
    /// This builds a fresh constant pool, serializes fields and methods against it, and then
    /// handles the class attributes:
    ///
    ///   - `Signature`/`SourceFile`, if present
    ///   - `InnerClasses`, synthesized from every class reference that ended up in the constant
    ///     pool (minus names vetoed by `exclude_nested`), merged over any records carried in
    ///     [`Class::attributes`]. Newly discovered records are the left operand of the merge,
    ///     so they win on conflicting inner simple names.
    pub fn serialize_filtered(
        self,
        version: Version,
        exclude_nested: impl Fn(&str) -> bool,
    ) -> Result<ClassFile, Error> {
        let mut constants = ConstantsPool::new();

        let this_class = constants.get_class(&self.this_class)?;
        let super_class = match &self.super_class {
            Some(name) => constants.get_class(name)?,
            None => ClassConstantIndex::ZERO,
        };
        let interfaces = self
            .interfaces
            .iter()
            .map(|interface| constants.get_class(interface))
            .collect::<Result<Vec<_>, _>>()?;

        // Serialize fields and methods
        let fields = self
            .fields
            .into_iter()
            .map(|field| field.serialize_field(&mut constants))
            .collect::<Result<Vec<class_file::Field>, Error>>()?;
        let methods = self
            .methods
            .into_iter()
            .map(|method| method.serialize_method(&mut constants))
            .collect::<Result<Vec<class_file::Method>, Error>>()?;

        // Fold the symbolic attributes; several inner-class maps combine left-to-right
        let mut carried_inner_classes = InnerClassMap::new();
        let mut signature: Option<String> = None;
        let mut source_file: Option<String> = None;
        for attribute in self.attributes {
            match attribute {
                ClassAttribute::InnerClasses(map) => {
                    carried_inner_classes = carried_inner_classes.merge(map);
                }
                ClassAttribute::Signature(sig) => {
                    signature.get_or_insert(sig);
                }
                ClassAttribute::SourceFile(file) => {
                    source_file.get_or_insert(file);
                }
            }
        }

        let mut attributes = vec![];
        if let Some(signature) = signature {
            let signature = class_file::Signature {
                signature: constants.get_utf8(signature)?,
            };
            attributes.push(constants.get_attribute(signature)?);
        }
        if let Some(source_file) = source_file {
            let source_file = class_file::SourceFile {
                source_file: constants.get_utf8(source_file)?,
            };
            attributes.push(constants.get_attribute(source_file)?);
        }

        // `InnerClasses` attribute: nested relationships detected from the pool override
        // same-named records carried over from composed units
        let mut referenced: Vec<String> = constants
            .referenced_classes()
            .map(str::to_owned)
            .collect();
        referenced.sort();
        let discovered =
            InnerClassMap::detect(referenced.iter().map(String::as_str), exclude_nested);
        let inner_classes = discovered.merge(carried_inner_classes);
        if !inner_classes.is_empty() {
            let inner_classes = inner_classes.into_attribute(&mut constants)?;
            attributes.push(constants.get_attribute(inner_classes)?);
        }

        Ok(ClassFile {
            version,
            constants: constants.into_offset_vec(),
            access_flags: self.access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::class_file::Serialize;
    use crate::inner_classes::InnerClassRecord;
    use crate::model::Code;
    use crate::verifier::{Frame, VerificationType};
    use crate::{FieldAccessFlags, InnerClassAccessFlags, MethodAccessFlags};

    fn sample_class() -> Class {
        let mut class = Class::new(
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            "Example",
            Some("java/lang/Object"),
        );
        class.attributes.push(ClassAttribute::SourceFile(String::from("Example.java")));

        class.add_field(Field {
            access_flags: FieldAccessFlags::PUBLIC | FieldAccessFlags::FINAL,
            name: String::from("count"),
            descriptor: String::from("I"),
            generic_signature: None,
        });

        // static void check(Example$Helper h): `ifnull` jumps to offset 5, which therefore
        // needs a stack map frame whose local carries the helper class reference
        let helper_frame = Frame::<String, u16> {
            locals: vec![VerificationType::Object(String::from("Example$Helper"))],
            stack: vec![],
        };
        class.add_method(Method {
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            name: String::from("check"),
            descriptor: String::from("(LExample$Helper;)V"),
            code: Some(Code {
                max_stack: 1,
                max_locals: 1,
                //             aload_0 ifnull +4    nop   return
                bytecode: vec![0x2a, 0xc6, 0x00, 0x04, 0x00, 0xb1],
                entry_frame: helper_frame.clone(),
                frames: vec![(5, helper_frame)],
            }),
            generic_signature: None,
        });

        class
    }

    #[test]
    fn sample_class_serializes() {
        let class_file = sample_class().serialize(Version::JAVA8).unwrap();

        let mut class_bytes: Vec<u8> = vec![];
        class_file.serialize(&mut class_bytes).unwrap();

        assert_eq!(&class_bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        // minor 0, major 52
        assert_eq!(&class_bytes[4..8], &[0, 0, 0, 52]);
    }

    #[test]
    fn referenced_nested_classes_are_synthesized() {
        let class_file = sample_class().serialize(Version::JAVA8).unwrap();

        // `SourceFile` first, `InnerClasses` last
        assert_eq!(class_file.attributes.len(), 2);
        let inner_classes = &class_file.attributes[1];

        // One record: count, three indices, then the PUBLIC | STATIC flag mask
        assert_eq!(inner_classes.info.len(), 10);
        assert_eq!(&inner_classes.info[..2], &[0, 1]);
        assert_eq!(&inner_classes.info[8..], &[0x00, 0x09]);
    }

    #[test]
    fn exclusions_suppress_synthesis() {
        let class_file = sample_class()
            .serialize_filtered(Version::JAVA8, |name| name.starts_with("Example$"))
            .unwrap();

        // Only `SourceFile` remains
        assert_eq!(class_file.attributes.len(), 1);
    }

    #[test]
    fn discovered_records_override_carried_ones() {
        let mut class = sample_class();
        let mut carried = InnerClassMap::new();
        carried.insert(InnerClassRecord {
            inner_class: String::from("Other$Helper"),
            outer_class: String::from("Other"),
            inner_name: String::from("Helper"),
            access_flags: InnerClassAccessFlags::PRIVATE,
        });
        class.attributes.push(ClassAttribute::InnerClasses(carried));

        let class_file = class.serialize(Version::JAVA8).unwrap();
        let inner_classes = &class_file.attributes[1];

        // Still a single record, and its flags are the synthesized PUBLIC | STATIC pair, not
        // the PRIVATE record carried in: the discovered map won the merge
        assert_eq!(&inner_classes.info[..2], &[0, 1]);
        assert_eq!(&inner_classes.info[8..], &[0x00, 0x09]);
    }

    #[test]
    fn mismatched_attribute_merges_fail() {
        let merged = ClassAttribute::SourceFile(String::from("A.java"))
            .merge(ClassAttribute::Signature(String::from("LA;")));
        assert!(matches!(
            merged,
            Err(Error::IncompatibleAttributes {
                left: "SourceFile",
                right: "Signature",
            })
        ));

        let merged = ClassAttribute::SourceFile(String::from("A.java"))
            .merge(ClassAttribute::SourceFile(String::from("B.java")));
        assert_eq!(
            merged.unwrap(),
            ClassAttribute::SourceFile(String::from("A.java"))
        );
    }
}
