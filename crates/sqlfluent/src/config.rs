//! Builder configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The shape read terminals return rows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    /// [`crate::Row`] values
    #[default]
    Array,
    /// JSON objects keyed by column
    Object,
    /// The driver's statement handle, unread
    Statement,
}

/// Configuration for a [`crate::Builder`].
///
/// Can be loaded from any serde format; durations are given in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Refuse UPDATE/DELETE without a WHERE condition.
    pub strict: bool,
    /// Result shape of read terminals.
    pub shape: ResultShape,
    /// Insert rows through a prepared template (`true`) or one inlined statement.
    pub prepare_inserts: bool,
    /// Dry run: record and log each statement's explain table instead of executing it.
    pub debug: bool,
    /// Default TTL of cached reads. `None` means entries never expire.
    #[serde(with = "secs")]
    pub cache_ttl: Option<Duration>,
    /// Cache key namespace.
    pub cache_prefix: String,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            strict: true,
            shape: ResultShape::Array,
            prepare_inserts: true,
            debug: false,
            cache_ttl: None,
            cache_prefix: "sqlfluent".to_string(),
            max_sql_log_length: Some(200),
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults (strict, array rows, prepared inserts).
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or refuse unfiltered UPDATE/DELETE.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn shape(mut self, shape: ResultShape) -> Self {
        self.shape = shape;
        self
    }

    /// Choose the default insert strategy.
    pub fn prepare_inserts(mut self, prepare: bool) -> Self {
        self.prepare_inserts = prepare;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the default TTL of cached reads.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    /// Set maximum logged SQL length.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match ttl {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuilderConfig::new();
        assert!(config.strict);
        assert!(config.prepare_inserts);
        assert_eq!(config.shape, ResultShape::Array);
        assert_eq!(config.cache_prefix, "sqlfluent");
        assert_eq!(config.max_sql_log_length, Some(200));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: BuilderConfig =
            serde_json::from_str(r#"{"strict": false, "shape": "object", "cache_ttl": 60}"#)
                .unwrap();
        assert!(!config.strict);
        assert_eq!(config.shape, ResultShape::Object);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(60)));
        assert!(config.prepare_inserts);
    }

    #[test]
    fn serializes_ttl_in_seconds() {
        let config = BuilderConfig::new().with_cache_ttl(Duration::from_secs(5));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["cache_ttl"], 5);
    }
}
