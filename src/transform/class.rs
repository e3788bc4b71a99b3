//! Class images
//!
//! A class image is the unit of "bytecode" the loader works on: one game
//! class with its access flags, members and instruction lists. Images travel
//! as bytes and are decoded once per transformation.
//!
//! ## Encoding
//!
//! ```text
//! +--------+---------+------------------------+
//! | "LEAF" | version | bincode(ClassImage)    |
//! | 4 B    | u16 LE  | ...                    |
//! +--------+---------+------------------------+
//! ```
//!
//! Encoding is deterministic: members keep their declaration order and no
//! hash maps are serialized.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::metadata::Side;

/// Leading bytes of every encoded class image
pub const MAGIC: [u8; 4] = *b"LEAF";

/// Current encoding version
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

bitflags! {
    /// Access and property flags of classes and members
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Access: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

impl Access {
    const VISIBILITY: Access = Access::PUBLIC
        .union(Access::PRIVATE)
        .union(Access::PROTECTED);

    /// Replaces the visibility bits, keeping all other flags
    #[must_use]
    pub fn with_visibility(self, visibility: Access) -> Access {
        (self - Self::VISIBILITY) | (visibility & Self::VISIBILITY)
    }

    /// Package-private when none of the visibility bits are set
    pub fn is_package_private(self) -> bool {
        !self.intersects(Self::VISIBILITY)
    }

    /// Parses flag names such as `["public", "static"]`
    ///
    /// # Errors
    ///
    /// Returns the first unknown flag name.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Access, String> {
        let mut access = Access::empty();
        for name in names {
            access |= match name.as_ref() {
                "public" => Access::PUBLIC,
                "private" => Access::PRIVATE,
                "protected" => Access::PROTECTED,
                "static" => Access::STATIC,
                "final" => Access::FINAL,
                "abstract" => Access::ABSTRACT,
                "synthetic" => Access::SYNTHETIC,
                other => return Err(format!("unknown access flag '{other}'")),
            };
        }
        Ok(access)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub descriptor: String,
    pub access: Access,
    /// Present only on one side when set
    pub environment: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub descriptor: String,
    pub access: Access,
    pub environment: Option<Side>,
    /// Instruction list
    pub code: Vec<String>,
}

/// A decoded game class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassImage {
    /// Internal name, e.g. `net/game/Player`
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access: Access,
    /// Side-only class when set
    pub environment: Option<Side>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

impl ClassImage {
    /// A public class extending nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: None,
            interfaces: Vec::new(),
            access: Access::PUBLIC,
            environment: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn field(&self, name: &str, descriptor: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.descriptor == descriptor)
    }

    pub fn field_mut(&mut self, name: &str, descriptor: &str) -> Option<&mut FieldInfo> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name && f.descriptor == descriptor)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn method_mut(&mut self, name: &str, descriptor: &str) -> Option<&mut MethodInfo> {
        self.methods
            .iter_mut()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    /// Decodes an encoded class image
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Malformed`] for a wrong header, an unknown
    /// format version or a payload bincode cannot read.
    pub fn decode(class: &str, bytes: &[u8]) -> Result<ClassImage, TransformError> {
        let malformed = |reason: String| TransformError::Malformed {
            class: class.to_string(),
            reason,
        };

        if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
            return Err(malformed("missing class image header".to_string()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(malformed(format!("unsupported format version {version}")));
        }

        bincode::deserialize(&bytes[HEADER_LEN..]).map_err(|e| malformed(e.to_string()))
    }

    /// Encodes this image with the current header
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Encode`] if bincode fails to serialize.
    pub fn encode(&self) -> Result<Vec<u8>, TransformError> {
        let payload = bincode::serialize(self).map_err(|e| TransformError::Encode {
            class: self.name.clone(),
            reason: e.to_string(),
        })?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> ClassImage {
        let mut image = ClassImage::new("net/game/Player");
        image.super_name = Some("net/game/Entity".to_string());
        image.fields.push(FieldInfo {
            name: "health".to_string(),
            descriptor: "I".to_string(),
            access: Access::PRIVATE,
            environment: None,
        });
        image.methods.push(MethodInfo {
            name: "tick".to_string(),
            descriptor: "()V".to_string(),
            access: Access::PUBLIC,
            environment: Some(Side::Client),
            code: vec!["aload_0".to_string(), "return".to_string()],
        });
        image
    }

    #[test]
    fn test_encode_decode() {
        let image = sample();
        let bytes = image.encode().expect("encode");
        assert_eq!(&bytes[..4], b"LEAF");
        let decoded = ClassImage::decode("net/game/Player", &bytes).expect("decode");
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(
            sample().encode().expect("encode"),
            sample().encode().expect("encode")
        );
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        let err = ClassImage::decode("a/B", b"CAFEBABE").expect_err("bad magic");
        assert!(matches!(err, TransformError::Malformed { .. }));

        let mut bytes = sample().encode().expect("encode");
        bytes[4] = 9;
        let err = ClassImage::decode("a/B", &bytes).expect_err("bad version");
        assert!(err.to_string().contains("unsupported format version"));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let bytes = sample().encode().expect("encode");
        assert!(ClassImage::decode("a/B", &bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_with_visibility() {
        let access = (Access::PRIVATE | Access::FINAL).with_visibility(Access::PUBLIC);
        assert_eq!(access, Access::PUBLIC | Access::FINAL);
        assert!(Access::STATIC.is_package_private());
    }

    #[test]
    fn test_access_from_names() {
        assert_eq!(
            Access::from_names(&["public", "static"]),
            Ok(Access::PUBLIC | Access::STATIC)
        );
        assert!(Access::from_names(&["volatile-ish"]).is_err());
    }

    #[test]
    fn test_member_lookup() {
        let mut image = sample();
        assert!(image.field("health", "I").is_some());
        assert!(image.field("health", "J").is_none());
        assert!(image.method("tick", "()V").is_some());
        image
            .method_mut("tick", "()V")
            .expect("method exists")
            .code
            .clear();
        assert!(image.method("tick", "()V").expect("method").code.is_empty());
    }
}
