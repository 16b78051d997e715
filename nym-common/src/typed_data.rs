//! Domain-separated structured messages (EIP-712 encoding).
//!
//! Every message signed by a nym holder is a [`TypedMessage`]: a domain,
//! a flat schema of named fields and the values for those fields. The digest
//! is `keccak256(0x19 0x01 || domainSeparator || hashStruct(message))`, so two
//! messages collide only if domain, schema and values all agree.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::{NymError, Result};

pub const DOMAIN_NAME: &str = "nym";
pub const DOMAIN_VERSION: &str = "1";
pub const DOMAIN_CHAIN_ID: u64 = 1;

const DOMAIN_TYPE: &str = "EIP712Domain(string name,string version,uint256 chainId)";

/// Name binding signed once per pseudonym.
pub const NYM_SCHEMA: TypeSchema = TypeSchema {
    primary_type: "Nym",
    fields: &[FieldSpec::new("nymName", FieldType::String)],
};

/// Post or reply content.
pub const POST_SCHEMA: TypeSchema = TypeSchema {
    primary_type: "Post",
    fields: &[
        FieldSpec::new("title", FieldType::String),
        FieldSpec::new("body", FieldType::String),
        FieldSpec::new("parentId", FieldType::String),
        FieldSpec::new("timestamp", FieldType::Uint256),
    ],
};

pub const UPVOTE_SCHEMA: TypeSchema = TypeSchema {
    primary_type: "Upvote",
    fields: &[
        FieldSpec::new("postId", FieldType::String),
        FieldSpec::new("timestamp", FieldType::Uint256),
    ],
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
}

impl Default for TypedDomain {
    fn default() -> Self {
        Self {
            name: DOMAIN_NAME.to_owned(),
            version: DOMAIN_VERSION.to_owned(),
            chain_id: DOMAIN_CHAIN_ID,
        }
    }
}

impl TypedDomain {
    pub fn separator(&self) -> [u8; 32] {
        keccak256(&[
            &keccak256(&[DOMAIN_TYPE.as_bytes()]),
            &keccak256(&[self.name.as_bytes()]),
            &keccak256(&[self.version.as_bytes()]),
            &uint256_word(self.chain_id),
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bytes,
    Bytes32,
    Uint256,
    Address,
    Bool,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Bytes32 => "bytes32",
            FieldType::Uint256 => "uint256",
            FieldType::Address => "address",
            FieldType::Bool => "bool",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldType,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldType) -> Self {
        Self { name, kind }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeSchema {
    pub primary_type: &'static str,
    pub fields: &'static [FieldSpec],
}

impl TypeSchema {
    /// `Name(type1 field1,type2 field2,...)`
    pub fn encode_type(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{} {}", field.kind.as_str(), field.name))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.primary_type, fields)
    }

    pub fn type_hash(&self) -> [u8; 32] {
        keccak256(&[self.encode_type().as_bytes()])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Bytes(Vec<u8>),
    Bytes32([u8; 32]),
    /// Big-endian 256-bit word.
    Uint256([u8; 32]),
    Address([u8; 20]),
    Bool(bool),
}

impl FieldValue {
    pub fn uint(value: u64) -> Self {
        FieldValue::Uint256(uint256_word(value))
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Bytes(_) => FieldType::Bytes,
            FieldValue::Bytes32(_) => FieldType::Bytes32,
            FieldValue::Uint256(_) => FieldType::Uint256,
            FieldValue::Address(_) => FieldType::Address,
            FieldValue::Bool(_) => FieldType::Bool,
        }
    }

    fn encode_data(&self) -> [u8; 32] {
        match self {
            FieldValue::String(value) => keccak256(&[value.as_bytes()]),
            FieldValue::Bytes(value) => keccak256(&[value]),
            FieldValue::Bytes32(value) | FieldValue::Uint256(value) => *value,
            FieldValue::Address(value) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(value);
                word
            }
            FieldValue::Bool(value) => uint256_word(u64::from(*value)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedMessage {
    domain: TypedDomain,
    schema: TypeSchema,
    values: Vec<FieldValue>,
}

impl TypedMessage {
    /// Builds a message, checking that `values` line up with `schema`.
    pub fn new(domain: TypedDomain, schema: TypeSchema, values: Vec<FieldValue>) -> Result<Self> {
        if values.len() != schema.fields.len() {
            return Err(NymError::InvalidTypedData(format!(
                "{} expects {} fields, got {}",
                schema.primary_type,
                schema.fields.len(),
                values.len()
            )));
        }
        for (field, value) in schema.fields.iter().zip(&values) {
            if field.kind != value.field_type() {
                return Err(NymError::InvalidTypedData(format!(
                    "{}.{} is {}, got {}",
                    schema.primary_type,
                    field.name,
                    field.kind.as_str(),
                    value.field_type().as_str()
                )));
            }
        }
        Ok(Self::from_parts(domain, schema, values))
    }

    /// Schema and values are fixed by the caller.
    pub(crate) fn from_parts(domain: TypedDomain, schema: TypeSchema, values: Vec<FieldValue>) -> Self {
        Self {
            domain,
            schema,
            values,
        }
    }

    /// The message a holder signs to bind `nym_name` to their key.
    pub fn nym_binding(nym_name: &str) -> Self {
        Self::from_parts(
            TypedDomain::default(),
            NYM_SCHEMA,
            vec![FieldValue::String(nym_name.to_owned())],
        )
    }

    pub fn domain(&self) -> &TypedDomain {
        &self.domain
    }

    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn hash_struct(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(self.schema.type_hash());
        for value in &self.values {
            hasher.update(value.encode_data());
        }
        hasher.finalize().into()
    }

    pub fn digest(&self) -> [u8; 32] {
        keccak256(&[
            &[0x19, 0x01],
            &self.domain.separator(),
            &self.hash_struct(),
        ])
    }
}

pub(crate) fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn uint256_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_type_lists_fields_in_order() {
        assert_eq!(
            POST_SCHEMA.encode_type(),
            "Post(string title,string body,string parentId,uint256 timestamp)"
        );
        assert_eq!(NYM_SCHEMA.encode_type(), "Nym(string nymName)");
        assert_eq!(
            UPVOTE_SCHEMA.encode_type(),
            "Upvote(string postId,uint256 timestamp)"
        );
    }

    #[test]
    fn domain_separator_matches_manual_encoding() {
        let domain = TypedDomain::default();
        let mut chain = [0u8; 32];
        chain[31] = 1;
        let expected = keccak256(&[
            &keccak256(&[b"EIP712Domain(string name,string version,uint256 chainId)"]),
            &keccak256(&[b"nym"]),
            &keccak256(&[b"1"]),
            &chain,
        ]);
        assert_eq!(domain.separator(), expected);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(
            TypedMessage::nym_binding("anon-abc123").digest(),
            TypedMessage::nym_binding("anon-abc123").digest()
        );
        assert_ne!(
            TypedMessage::nym_binding("anon-abc123").digest(),
            TypedMessage::nym_binding("anon-abc124").digest()
        );
    }

    #[test]
    fn schema_and_domain_separate_identical_values() {
        let values = vec![FieldValue::String("0xabc".into()), FieldValue::uint(7)];
        let upvote =
            TypedMessage::new(TypedDomain::default(), UPVOTE_SCHEMA, values.clone()).unwrap();

        const OTHER: TypeSchema = TypeSchema {
            primary_type: "Downvote",
            fields: &[
                FieldSpec::new("postId", FieldType::String),
                FieldSpec::new("timestamp", FieldType::Uint256),
            ],
        };
        let downvote = TypedMessage::new(TypedDomain::default(), OTHER, values.clone()).unwrap();
        assert_ne!(upvote.digest(), downvote.digest());

        let other_chain = TypedDomain {
            chain_id: 5,
            ..TypedDomain::default()
        };
        let moved = TypedMessage::new(other_chain, UPVOTE_SCHEMA, values).unwrap();
        assert_ne!(upvote.digest(), moved.digest());
        assert_eq!(upvote.hash_struct(), moved.hash_struct());
    }

    #[test]
    fn new_rejects_schema_mismatch() {
        let err = TypedMessage::new(TypedDomain::default(), NYM_SCHEMA, vec![]).unwrap_err();
        assert!(matches!(err, NymError::InvalidTypedData(_)));

        let err = TypedMessage::new(
            TypedDomain::default(),
            NYM_SCHEMA,
            vec![FieldValue::Bool(true)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Nym.nymName"));
    }

    #[test]
    fn static_values_encode_as_words() {
        let mut address = [0u8; 20];
        address[19] = 0xaa;
        assert_eq!(FieldValue::Address(address).encode_data()[31], 0xaa);
        assert_eq!(FieldValue::Bool(true).encode_data()[31], 1);
        assert_eq!(FieldValue::uint(258).encode_data()[30..], [1, 2]);
    }
}
