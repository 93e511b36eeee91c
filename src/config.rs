//! Environment-driven configuration shared by the CLI and the server.
//!
//! | Variable              | Meaning                                   | Default            |
//! |-----------------------|-------------------------------------------|--------------------|
//! | `BOOKSTORE_CATALOG`   | Path to a catalog JSON file               | embedded catalog   |
//! | `POSTAL_API_URL`      | HeartRails-compatible geocoder endpoint   | public HeartRails  |
//! | `POSTAL_TABLE`        | Postal code table; replaces the HTTP API  | unset              |
//! | `POSTAL_TIMEOUT_SECS` | Per-lookup timeout for the HTTP resolver  | 10                 |
//! | `SEARCH_RADIUS_KM`    | Radius used when a search gives none      | 5                  |
//!
//! Values that fail to parse fall back to the default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::client::{self, HttpResolver, HttpResolverConfig};
use crate::finder::BookstoreFinder;
use crate::geo;
use crate::resolver::{CoordinateResolver, TableResolver};

/// Which resolution strategy to build
#[derive(Debug, Clone)]
pub enum ResolverConfig {
    Http(HttpResolverConfig),
    Table(PathBuf),
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::Http(HttpResolverConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// External catalog file; the embedded catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    pub resolver: ResolverConfig,
    pub default_radius_km: f64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            resolver: ResolverConfig::default(),
            default_radius_km: geo::DEFAULT_RADIUS_KM,
        }
    }
}

impl FinderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let catalog_path = non_empty("BOOKSTORE_CATALOG").map(PathBuf::from);

        let resolver = match non_empty("POSTAL_TABLE") {
            Some(path) => ResolverConfig::Table(PathBuf::from(path)),
            None => ResolverConfig::Http(HttpResolverConfig {
                endpoint: non_empty("POSTAL_API_URL")
                    .unwrap_or_else(|| client::DEFAULT_ENDPOINT.to_string()),
                timeout: non_empty("POSTAL_TIMEOUT_SECS")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(client::DEFAULT_TIMEOUT),
            }),
        };

        let default_radius_km = non_empty("SEARCH_RADIUS_KM")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(geo::DEFAULT_RADIUS_KM);

        Self {
            catalog_path,
            resolver,
            default_radius_km,
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::from_path(path)
                .with_context(|| format!("Failed to load catalog from {}", path.display())),
            None => Catalog::embedded().context("Failed to load embedded catalog"),
        }
    }

    pub fn build_resolver(&self) -> Result<Arc<dyn CoordinateResolver>> {
        let resolver: Arc<dyn CoordinateResolver> = match &self.resolver {
            ResolverConfig::Http(config) => {
                tracing::info!("Resolving postal codes via {}", config.endpoint);
                Arc::new(
                    HttpResolver::with_config(config.clone())
                        .context("Failed to build HTTP client")?,
                )
            }
            ResolverConfig::Table(path) => Arc::new(TableResolver::from_path(path)?),
        };
        Ok(resolver)
    }

    pub fn build_finder(&self) -> Result<BookstoreFinder> {
        Ok(BookstoreFinder::new(
            self.load_catalog()?,
            self.build_resolver()?,
        ))
    }
}
