//! Content records handed over by the surrounding forum.

use serde::{Deserialize, Serialize};

use crate::typed_data::{FieldValue, TypedDomain, TypedMessage, POST_SCHEMA, UPVOTE_SCHEMA};

/// `parentId` of a top-level post.
pub const ROOT_PARENT_ID: &str = "0x0";

/// Fields a holder signs when posting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMessage {
    pub title: String,
    pub body: String,
    pub parent_id: String,
    pub timestamp: u64,
}

impl ContentMessage {
    pub fn post(title: impl Into<String>, body: impl Into<String>, timestamp: u64) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            parent_id: ROOT_PARENT_ID.to_owned(),
            timestamp,
        }
    }

    pub fn reply(parent_id: impl Into<String>, body: impl Into<String>, timestamp: u64) -> Self {
        Self {
            title: String::new(),
            body: body.into(),
            parent_id: parent_id.into(),
            timestamp,
        }
    }

    pub fn typed(&self) -> TypedMessage {
        TypedMessage::from_parts(
            TypedDomain::default(),
            POST_SCHEMA,
            vec![
                FieldValue::String(self.title.clone()),
                FieldValue::String(self.body.clone()),
                FieldValue::String(self.parent_id.clone()),
                FieldValue::uint(self.timestamp),
            ],
        )
    }

    /// `0x`-hex of the typed digest.
    pub fn post_id(&self) -> String {
        format!("0x{}", hex::encode(self.typed().digest()))
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id != ROOT_PARENT_ID
    }
}

/// Stored post: message fields, claimed pseudonym and attestation bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(flatten)]
    pub message: ContentMessage,
    pub nym_name: String,
    #[serde(with = "crate::ser::hex_bytes")]
    pub attestation: Vec<u8>,
}

/// Upvotes are signed with the voter's own key; nothing about them is pseudonymous.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upvote {
    pub post_id: String,
    pub timestamp: u64,
}

impl Upvote {
    pub fn typed(&self) -> TypedMessage {
        TypedMessage::from_parts(
            TypedDomain::default(),
            UPVOTE_SCHEMA,
            vec![
                FieldValue::String(self.post_id.clone()),
                FieldValue::uint(self.timestamp),
            ],
        )
    }

    pub fn upvote_id(&self) -> String {
        format!("0x{}", hex::encode(self.typed().digest()))
    }
}
