//! Adapter configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::infer::InferOptions;

/// Display name given to a partitioned table's implicit timestamp column.
pub const DEFAULT_PARTITION_COL: &str = "PARTITIONTIME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Name under which the partition column is exposed to callers.
    /// `None` keeps the warehouse's own name.
    pub partition_col: Option<String>,

    /// Default strictness for schema inference over mixed columns.
    pub strict_inference: bool,

    /// Drop missing values before inferring column types.
    pub aggressive_null: bool,

    /// Project queries are billed to, when it differs from the data project.
    pub billing_project: Option<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            partition_col: Some(DEFAULT_PARTITION_COL.to_string()),
            strict_inference: true,
            aggressive_null: true,
            billing_project: None,
        }
    }
}

impl AdapterConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `WHARF_PARTITION_COL`: partition column display name (`none` or empty disables)
    /// - `WHARF_STRICT_INFERENCE`: `true`/`false`
    /// - `WHARF_AGGRESSIVE_NULL`: `true`/`false`
    /// - `WHARF_BILLING_PROJECT`: billing project override
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("WHARF_PARTITION_COL") {
            cfg.partition_col = parse_partition_col(&s);
        }

        if let Ok(s) = std::env::var("WHARF_STRICT_INFERENCE") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.strict_inference = v;
            }
        }

        if let Ok(s) = std::env::var("WHARF_AGGRESSIVE_NULL") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.aggressive_null = v;
            }
        }

        if let Ok(s) = std::env::var("WHARF_BILLING_PROJECT") {
            if !s.is_empty() {
                cfg.billing_project = Some(s);
            }
        }

        cfg
    }

    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Inference options snapshot used by the inferrer.
    pub fn infer_options(&self) -> InferOptions {
        InferOptions::default()
            .with_strict(self.strict_inference)
            .with_aggressive_null(self.aggressive_null)
    }
}

fn parse_partition_col(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AdapterConfig::default();
        assert_eq!(cfg.partition_col.as_deref(), Some("PARTITIONTIME"));
        assert!(cfg.strict_inference);
        assert!(cfg.aggressive_null);
    }

    #[test]
    fn yaml_overrides_keep_defaults() {
        let cfg = AdapterConfig::from_yaml_str("partition_col: null\nstrict_inference: false\n")
            .unwrap();
        assert_eq!(cfg.partition_col, None);
        assert!(!cfg.strict_inference);
        assert!(cfg.aggressive_null);

        let opts = cfg.infer_options();
        assert!(!opts.strict);
        assert!(opts.aggressive_null);

        assert!(AdapterConfig::from_yaml_str("strict_inference: maybe").is_err());
    }

    #[test]
    fn partition_col_disable_spellings() {
        assert_eq!(parse_partition_col("none"), None);
        assert_eq!(parse_partition_col(" "), None);
        assert_eq!(parse_partition_col("PT"), Some("PT".to_string()));
    }
}
