//! Scalar helper types for schema models.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A list of strings carried as a single comma-separated line.
///
/// Deserializes from `"a, b, c"` (whitespace trimmed, empty entries
/// dropped) and serializes back to `"a,b,c"`, so env-var friendly scalars
/// can stand in for lists in a schema model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsvLine(pub Vec<String>);

impl CsvLine {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl std::ops::Deref for CsvLine {
    type Target = Vec<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::str::FromStr for CsvLine {
    type Err = std::convert::Infallible;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            line.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        ))
    }
}

impl std::fmt::Display for CsvLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl Serialize for CsvLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CsvLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let line = String::deserialize(deserializer)?;
        line.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_validation() {
        let line: CsvLine = serde_json::from_value(json!("a,b,c")).unwrap();
        assert_eq!(line.as_slice(), ["a", "b", "c"]);
    }

    #[test]
    fn test_spaces_trimmed() {
        let line: CsvLine = serde_json::from_value(json!("a, b, c     ")).unwrap();
        assert_eq!(line.as_slice(), ["a", "b", "c"]);
    }

    #[test]
    fn test_serializes_back_to_one_line() {
        let line: CsvLine = serde_json::from_value(json!("a,b,c")).unwrap();
        assert_eq!(serde_json::to_value(&line).unwrap(), json!("a,b,c"));
    }

    #[test]
    fn test_empty_entries_dropped() {
        let line: CsvLine = serde_json::from_value(json!("a,,b,")).unwrap();
        assert_eq!(line.as_slice(), ["a", "b"]);
    }
}
