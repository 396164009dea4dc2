use crate::class_file;
use crate::class_file::{ConstantsPool, Signature};
use crate::errors::Error;
use crate::model::Code;
use crate::MethodAccessFlags;

/// Semantic representation of a method
pub struct Method {
    pub access_flags: MethodAccessFlags,

    /// Unqualified method name (eg. `max` or `<init>`)
    pub name: String,

    /// Method descriptor (eg. `(II)I`)
    pub descriptor: String,

    /// Method body, absent for `abstract` and `native` methods
    pub code: Option<Code>,

    /// Generic signature, if the method has one
    pub generic_signature: Option<String>,
}

impl Method {
    /// Serialize the method into its `method_info` form
    ///
    /// Attribute name constants are registered per attribute actually emitted: a method without
    /// a body interns neither `Code` nor `StackMapTable`, and `StackMapTable` reaches the pool
    /// only when the body really carries frames.
    pub fn serialize_method(self, constants: &mut ConstantsPool) -> Result<class_file::Method, Error> {
        let name_index = constants.get_utf8(self.name.as_str())?;
        let descriptor_index = constants.get_utf8(self.descriptor.as_str())?;
        let mut attributes = vec![];

        if let Some(code) = self.code {
            let code = code.serialize_code(constants)?;
            attributes.push(constants.get_attribute(code)?);
        }

        if let Some(generic_signature) = self.generic_signature {
            let signature = Signature {
                signature: constants.get_utf8(generic_signature)?,
            };
            attributes.push(constants.get_attribute(signature)?);
        }

        Ok(class_file::Method {
            access_flags: self.access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::class_file::{Constant, ConstantIndex};
    use crate::verifier::Frame;

    #[test]
    fn attribute_names_are_interned_only_when_emitted() {
        let mut constants = ConstantsPool::new();
        let method = Method {
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            name: String::from("run"),
            descriptor: String::from("()V"),
            code: None,
            generic_signature: None,
        };
        let method = method.serialize_method(&mut constants).unwrap();
        assert!(method.attributes.is_empty());

        // "run" and "()V" are the only pool entries; no "Code" constant was interned
        assert!(matches!(
            constants.lookup(ConstantIndex(3)),
            Err(Error::MissingConstant(_))
        ));
    }

    #[test]
    fn method_bodies_become_code_attributes() {
        let mut constants = ConstantsPool::new();
        let method = Method {
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            name: String::from("noop"),
            descriptor: String::from("()V"),
            code: Some(Code {
                max_stack: 0,
                max_locals: 0,
                bytecode: vec![0xb1],
                entry_frame: Frame::default(),
                frames: vec![],
            }),
            generic_signature: None,
        };
        let method = method.serialize_method(&mut constants).unwrap();

        assert_eq!(method.attributes.len(), 1);
        let name = constants
            .lookup(ConstantIndex::from(method.attributes[0].name_index))
            .unwrap();
        assert!(matches!(name, Constant::Utf8(name) if name == "Code"));
    }
}
