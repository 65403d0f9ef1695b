use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Breakdown keys accepted by the search analytics query.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Dimension {
    Date,
    Query,
    Page,
    Device,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Date => "date",
            Dimension::Query => "query",
            Dimension::Page => "page",
            Dimension::Device => "device",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Dimension::Date),
            "query" => Ok(Dimension::Query),
            "page" => Ok(Dimension::Page),
            "device" => Ok(Dimension::Device),
            other => Err(ModelError::UnknownDimension(other.to_string())),
        }
    }
}

impl TryFrom<String> for Dimension {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Query".parse::<Dimension>().unwrap(), Dimension::Query);
        assert_eq!(" DEVICE ".parse::<Dimension>().unwrap(), Dimension::Device);
    }

    #[test]
    fn rejects_unsupported_dimension() {
        let err = "country".parse::<Dimension>().unwrap_err();
        assert_eq!(err, ModelError::UnknownDimension("country".into()));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&[Dimension::Date, Dimension::Page]).unwrap();
        assert_eq!(json, r#"["date","page"]"#);
    }

    #[test]
    fn deserializes_any_case() {
        let dims: Vec<Dimension> = serde_json::from_str(r#"["Date","QUERY"]"#).unwrap();
        assert_eq!(dims, [Dimension::Date, Dimension::Query]);
        assert!(serde_json::from_str::<Dimension>(r#""country""#).is_err());
    }
}
