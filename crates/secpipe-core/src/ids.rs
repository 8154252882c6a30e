//! Time-ordered identifiers shared across the pipeline.
//!
//! Every entity in the data model carries a sortable 128-bit identifier.
//! We use UUIDv7 (timestamp + random bits) so that `ORDER BY id` and
//! `ORDER BY created_at` agree without a separate column to maintain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when parsing an identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {label}: {source}")]
pub struct IdParseError {
    label: &'static str,
    #[source]
    source: uuid::Error,
}

macro_rules! define_sortable_id {
    ($name:ident, $label:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new identifier ordered by creation time.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|source| IdParseError { label: $label, source })
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
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_sortable_id!(CompanyId, "company id");
define_sortable_id!(FilingId, "filing id");
define_sortable_id!(DocumentId, "document id");
define_sortable_id!(FinancialConceptId, "financial concept id");
define_sortable_id!(FinancialValueId, "financial value id");
define_sortable_id!(PromptId, "prompt id");
define_sortable_id!(ModelConfigId, "model config id");
define_sortable_id!(GeneratedContentId, "generated content id");
define_sortable_id!(JobId, "job id");
define_sortable_id!(PipelineRunId, "pipeline run id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_strings() {
        let id = CompanyId::new();
        let parsed = CompanyId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_are_time_ordered() {
        let earlier = Uuid::new_v7(uuid::Timestamp::from_unix(uuid::NoContext, 1_000, 0));
        let later = Uuid::new_v7(uuid::Timestamp::from_unix(uuid::NoContext, 2_000, 0));
        assert!(JobId::from(earlier) < JobId::from(later));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(CompanyId::parse("not-a-uuid").is_err());
    }
}
