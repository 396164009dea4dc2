use crate::class_file;
use crate::class_file::{ConstantsPool, Signature};
use crate::errors::Error;
use crate::FieldAccessFlags;

/// Semantic representation of a field
pub struct Field {
    pub access_flags: FieldAccessFlags,

    /// Unqualified field name
    pub name: String,

    /// Field descriptor (eg. `I` or `Ljava/lang/String;`)
    pub descriptor: String,

    /// Generic signature, if the field has one
    pub generic_signature: Option<String>,
}

impl Field {
    /// Serialize the field into its `field_info` form
    pub fn serialize_field(self, constants: &mut ConstantsPool) -> Result<class_file::Field, Error> {
        let name_index = constants.get_utf8(self.name.as_str())?;
        let descriptor_index = constants.get_utf8(self.descriptor.as_str())?;
        let mut attributes = vec![];

        if let Some(generic_signature) = self.generic_signature {
            let signature = Signature {
                signature: constants.get_utf8(generic_signature)?,
            };
            attributes.push(constants.get_attribute(signature)?);
        }

        Ok(class_file::Field {
            access_flags: self.access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }
}
