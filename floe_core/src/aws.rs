//! AWS resource naming helpers.
//!
//! [`Arn`] parses the `arn:partition:service:region:account-id:resource`
//! format. Region and account id may be empty (IAM ARNs carry no region,
//! S3 ARNs carry neither), and the resource part comes in three shapes:
//! `type/id` (path form), `type:id`, or a bare id.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArnParseError {
    #[error("ARN '{value}' does not start with 'arn:'")]
    MissingPrefix { value: String },

    #[error("ARN '{value}' has only {parts} of 6 colon-separated parts")]
    TooFewParts { value: String, parts: usize },

    #[error("ARN '{value}' has an empty {field} part")]
    EmptyPart { value: String, field: &'static str }
}

/// A parsed AWS ARN. `Display` round-trips the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    raw: String,
    pub partition: String,
    pub service: String,
    pub region: Option<String>,
    pub account_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: String,
    pub resource_id_is_path: bool
}

impl Arn {
    pub fn parse(value: &str) -> Result<Self, ArnParseError> {
        let parts: Vec<&str> = value.splitn(6, ':').collect();
        if parts.first() != Some(&"arn") {
            return Err(ArnParseError::MissingPrefix {
                value: value.to_string()
            });
        }
        if parts.len() < 6 {
            return Err(ArnParseError::TooFewParts {
                value: value.to_string(),
                parts: parts.len()
            });
        }

        let required = |part: &str, field: &'static str| {
            if part.is_empty() {
                Err(ArnParseError::EmptyPart {
                    value: value.to_string(),
                    field
                })
            } else {
                Ok(part.to_string())
            }
        };
        let optional = |part: &str| {
            if part.is_empty() {
                None
            } else {
                Some(part.to_string())
            }
        };

        let resource = required(parts[5], "resource")?;
        let (resource_type, resource_id, resource_id_is_path) =
            match resource.split_once('/') {
                Some((rtype, rid)) => {
                    (Some(rtype.to_string()), rid.to_string(), true)
                }
                None => match resource.split_once(':') {
                    Some((rtype, rid)) => {
                        (Some(rtype.to_string()), rid.to_string(), false)
                    }
                    None => (None, resource.clone(), false)
                }
            };

        Ok(Self {
            raw: value.to_string(),
            partition: required(parts[1], "partition")?,
            service: required(parts[2], "service")?,
            region: optional(parts[3]),
            account_id: optional(parts[4]),
            resource_type,
            resource_id,
            resource_id_is_path
        })
    }
}

impl std::str::FromStr for Arn {
    type Err = ArnParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl std::fmt::Display for Arn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for Arn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Arn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}
