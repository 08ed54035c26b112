use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Settings carried by a data cube and every cube derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// Dimension holding the grid tile name of each record.
    pub tile_dimension: String,
    /// Read the records of a load call with rayon.
    pub parallel_reads: bool,
    /// Drop records whose file can not be read instead of failing.
    pub skip_missing: bool,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            tile_dimension: "tile".to_string(),
            parallel_reads: false,
            skip_missing: false,
        }
    }
}

impl CubeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{}", CubeConfig::default())]
    #[case(
        r#"{"parallel_reads": true, "tile_dimension": "tilename"}"#,
        CubeConfig { tile_dimension: "tilename".to_string(), parallel_reads: true, skip_missing: false }
    )]
    fn fills_missing_fields(#[case] json: &str, #[case] expected: CubeConfig) {
        assert_eq!(CubeConfig::from_json(json).unwrap(), expected);
    }

    #[rstest]
    fn rejects_malformed_json() {
        assert!(CubeConfig::from_json("{parallel_reads: yes}").is_err());
    }
}
