//! Postal code to coordinate resolution.
//!
//! Resolution is a single fallible request/response step behind the
//! [`CoordinateResolver`] trait. Strategies are interchangeable: the HTTP
//! geocoder in [`crate::client`] for live lookups, and [`TableResolver`]
//! for fixed tables. Timeouts belong to the strategy's configuration and
//! retries belong to the caller; nothing here retries or falls back to a
//! placeholder coordinate.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use futures::future::{self, BoxFuture, FutureExt};
use thiserror::Error;

use crate::postal::PostalCode;
use crate::types::Coordinate;

/// Message shown to end users for any resolution failure.
pub const USER_FACING_MESSAGE: &str = "search failed, try again";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The service does not know this postal code
    #[error("no location found for postal code {0}")]
    NotFound(PostalCode),

    /// Transport failure, non-success status or timeout
    #[error("postal code lookup unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something we could not interpret
    #[error("invalid response from postal code lookup: {message}")]
    InvalidResponse { message: String },
}

impl ResolveError {
    /// Text suitable for showing to the person who searched
    pub fn user_message(&self) -> &'static str {
        USER_FACING_MESSAGE
    }

    /// Whether trying the same request again might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Turns a postal code into a coordinate.
pub trait CoordinateResolver: Send + Sync {
    fn resolve<'a>(&'a self, code: &'a PostalCode) -> BoxFuture<'a, Result<Coordinate, ResolveError>>;
}

/// Resolver backed by a fixed postal code table
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    entries: HashMap<String, Coordinate>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: PostalCode, coordinate: Coordinate) {
        self.entries.insert(code.digits().to_string(), coordinate);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `{"1000005": {"latitude": 35.68, "longitude": 139.76}, ...}`.
    ///
    /// Keys may use either `NNNNNNN` or `NNN-NNNN`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Coordinate> =
            serde_json::from_str(json).context("Failed to parse postal code table")?;

        let mut table = Self::new();
        for (key, coordinate) in raw {
            let code = PostalCode::parse(&key)
                .with_context(|| format!("Invalid postal code in table: {}", key))?;
            table.insert(code, coordinate);
        }
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read postal code table {}", path.display()))?;
        let table = Self::from_json(&json)?;
        tracing::info!("Loaded {} postal code(s) from {}", table.len(), path.display());
        Ok(table)
    }

    fn lookup(&self, code: &PostalCode) -> Result<Coordinate, ResolveError> {
        self.entries
            .get(code.digits())
            .copied()
            .ok_or_else(|| ResolveError::NotFound(code.clone()))
    }
}

impl FromIterator<(PostalCode, Coordinate)> for TableResolver {
    fn from_iter<T: IntoIterator<Item = (PostalCode, Coordinate)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (code, coordinate) in iter {
            table.insert(code, coordinate);
        }
        table
    }
}

impl CoordinateResolver for TableResolver {
    fn resolve<'a>(&'a self, code: &'a PostalCode) -> BoxFuture<'a, Result<Coordinate, ResolveError>> {
        future::ready(self.lookup(code)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PostalCode {
        PostalCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_table_resolver_hit_and_miss() {
        let table: TableResolver = [(code("1000005"), Coordinate::new(35.6812, 139.7671))]
            .into_iter()
            .collect();

        let hit = table.resolve(&code("100-0005")).await.unwrap();
        assert_eq!(hit, Coordinate::new(35.6812, 139.7671));

        let miss = table.resolve(&code("9999999")).await.unwrap_err();
        assert!(matches!(miss, ResolveError::NotFound(ref c) if c.digits() == "9999999"));
        assert!(!miss.is_retryable());
        assert_eq!(miss.user_message(), USER_FACING_MESSAGE);
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"{
            "100-0005": {"latitude": 35.6812, "longitude": 139.7671},
            "5300001": {"latitude": 34.7025, "longitude": 135.4959}
        }"#;
        let table = TableResolver::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(&code("1000005")).unwrap(),
            Coordinate::new(35.6812, 139.7671)
        );
    }

    #[test]
    fn test_table_from_json_rejects_bad_keys() {
        let json = r#"{"12-34": {"latitude": 0, "longitude": 0}}"#;
        assert!(TableResolver::from_json(json).is_err());
        assert!(TableResolver::from_json("not json").is_err());
    }

    #[test]
    fn test_error_classification() {
        assert!(ResolveError::Unavailable("timeout".to_string()).is_retryable());
        assert!(
            !ResolveError::InvalidResponse {
                message: "bad".to_string()
            }
            .is_retryable()
        );
    }
}
