//! The closed set of SQL dialects the query engine understands.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Target engine syntax. Only these two are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
  /// Distributed-SQL engine.
  #[default]
  #[serde(alias = "Trino")]
  Trino,
  /// OLAP engine.
  #[serde(alias = "Spark")]
  Spark,
}

impl Dialect {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Trino => "trino",
      Self::Spark => "spark",
    }
  }
}

impl fmt::Display for Dialect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Dialect {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "trino" => Ok(Self::Trino),
      "spark" => Ok(Self::Spark),
      _ => Err(Error::UnknownDialect(s.to_owned())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_capitalised_names() {
    let d: Dialect = serde_json::from_str("\"Spark\"").unwrap();
    assert_eq!(d, Dialect::Spark);
    assert_eq!("TRINO".parse::<Dialect>().unwrap(), Dialect::Trino);
  }

  #[test]
  fn serialises_lowercase() {
    assert_eq!(serde_json::to_string(&Dialect::Trino).unwrap(), "\"trino\"");
  }

  #[test]
  fn rejects_other_engines() {
    assert!(matches!(
      "postgres".parse::<Dialect>(),
      Err(Error::UnknownDialect(_))
    ));
    assert!(serde_json::from_str::<Dialect>("\"mysql\"").is_err());
  }
}
