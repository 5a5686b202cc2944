//! UUID newtypes for every matter-scoped identity.
//!
//! Every core call is bound to a [`MatterId`]; C1 (the namespace guard)
//! validates these on the way in so storage/cache keys can never be built
//! from a malformed or missing identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{DocketError, DocketResult};

macro_rules! uuid_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(raw: &str) -> DocketResult<Self> {
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| DocketError::invalid_parameter(format!(
                        "{} is not a well-formed UUID: {raw}",
                        stringify!($name)
                    )))
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DocketError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

uuid_newtype!(MatterId, "Authorization boundary: every entity is scoped by one matter.");
uuid_newtype!(UserId, "A member of one or more matters.");
uuid_newtype!(DocumentId, "A document belonging to exactly one matter.");
uuid_newtype!(ChunkId, "A parent or child chunk belonging to exactly one document.");
uuid_newtype!(BoundingBoxId, "A bounding box belonging to exactly one document page.");
uuid_newtype!(CitationId, "An extracted citation.");
uuid_newtype!(EntityId, "An entity node in a matter's identity graph.");
uuid_newtype!(TimelineEventId, "A timeline event.");
uuid_newtype!(FindingId, "Any surfaced claim requiring verification.");
uuid_newtype!(JobId, "A processing job.");
uuid_newtype!(SessionId, "A transient (matter, user) chat session.");
