//! Opaque identifiers.
//!
//! Every entity id is a string on the wire. The newtypes only exist so a
//! `CardId` can't be handed to something expecting a `CategoryId`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Timestamp;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identity of a [`crate::Card`].
    CardId
);
string_id!(
    /// Identity of a [`crate::Category`].
    CategoryId
);
string_id!(
    /// Identity of a [`crate::Comment`].
    CommentId
);
string_id!(
    /// Identity of a [`crate::Project`].
    ProjectId
);
string_id!(
    /// Identity of a [`crate::PresetColor`] in the fixed catalogue.
    PresetColorId
);
string_id!(
    /// Correlation id stamped on every mutation envelope.
    ///
    /// Generated ids are UUID v7, so they are unique and sort by creation time.
    UpdateId
);

impl UpdateId {
    /// Generate a fresh, time-ordered update id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Creation time embedded in the id, if it is a time-based UUID.
    ///
    /// Ids that are not UUIDs (hand-written fixtures, foreign clients) have no
    /// embedded time and return `None`.
    pub fn timestamp(&self) -> Option<Timestamp> {
        let uuid = uuid::Uuid::parse_str(&self.0).ok()?;
        let (seconds, nanos) = uuid.get_timestamp()?.to_unix();
        Some(Timestamp::new(seconds as i64, nanos))
    }
}
