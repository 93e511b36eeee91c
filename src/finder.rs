//! Ties the catalog, postal code parsing and a resolver together for the
//! two front-ends.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::geo;
use crate::postal::{PostalCode, PostalCodeError};
use crate::resolver::{CoordinateResolver, ResolveError};
use crate::types::{Bookstore, Coordinate, RankedBookstore};

/// Why a nearby search produced no result list.
///
/// An empty result list is not an error; it comes back as `Ok` with no
/// entries.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    InvalidPostalCode(#[from] PostalCodeError),

    #[error(transparent)]
    Resolution(#[from] ResolveError),
}

/// Outcome of a successful postal code search
#[derive(Debug, Clone, Serialize)]
pub struct NearbySearch<'a> {
    pub postal_code: String,
    pub origin: Coordinate,
    pub radius_km: f64,
    pub results: Vec<RankedBookstore<'a>>,
}

#[derive(Clone)]
pub struct BookstoreFinder {
    catalog: Catalog,
    resolver: Arc<dyn CoordinateResolver>,
}

impl BookstoreFinder {
    pub fn new(catalog: Catalog, resolver: Arc<dyn CoordinateResolver>) -> Self {
        Self { catalog, resolver }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Bookstores within `radius_km` of the location of `raw_postal_code`.
    ///
    /// Resolver failures are returned unchanged and never retried.
    pub async fn search_near(
        &self,
        raw_postal_code: &str,
        radius_km: f64,
    ) -> Result<NearbySearch<'_>, SearchError> {
        let code = PostalCode::parse(raw_postal_code)?;

        let origin = self.resolver.resolve(&code).await.inspect_err(|e| {
            tracing::warn!("Postal code {} could not be resolved: {}", code, e);
        })?;

        let results = geo::find_within_radius(origin, self.catalog.all(), radius_km);
        tracing::info!(
            "Search near {} ({}): {} bookstore(s) within {} km",
            code,
            origin,
            results.len(),
            radius_km
        );

        Ok(NearbySearch {
            postal_code: code.formatted(),
            origin,
            radius_km,
            results,
        })
    }

    /// [`Self::search_near`] with [`geo::DEFAULT_RADIUS_KM`]
    pub async fn search_near_default(
        &self,
        raw_postal_code: &str,
    ) -> Result<NearbySearch<'_>, SearchError> {
        self.search_near(raw_postal_code, geo::DEFAULT_RADIUS_KM)
            .await
    }

    /// Catalog entries in `prefecture`, or all of them for `None`/`""`
    pub fn browse(&self, prefecture: Option<&str>) -> Vec<&Bookstore> {
        self.catalog.by_prefecture(prefecture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::TableResolver;

    fn finder() -> BookstoreFinder {
        let table: TableResolver = [
            ("1000005", Coordinate::new(35.6812, 139.7671)),
            ("5300001", Coordinate::new(34.7025, 135.4959)),
            ("9071801", Coordinate::new(24.0, 123.0)),
        ]
        .into_iter()
        .map(|(code, c)| (PostalCode::parse(code).unwrap(), c))
        .collect();

        BookstoreFinder::new(Catalog::embedded().unwrap(), Arc::new(table))
    }

    #[tokio::test]
    async fn test_search_near_tokyo_station() {
        let finder = finder();
        let search = finder.search_near_default("100-0005").await.unwrap();
        assert_eq!(search.postal_code, "100-0005");
        assert_eq!(search.radius_km, geo::DEFAULT_RADIUS_KM);

        let ids: Vec<u32> = search.results.iter().map(|r| r.bookstore.id).collect();
        assert_eq!(ids, vec![1, 11, 2, 3]);
    }

    #[tokio::test]
    async fn test_search_near_custom_radius() {
        let finder = finder();
        let search = finder.search_near("1000005", 30.0).await.unwrap();
        let ids: Vec<u32> = search.results.iter().map(|r| r.bookstore.id).collect();
        assert_eq!(ids, vec![1, 11, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let finder = finder();
        let search = finder.search_near("9071801", 5.0).await.unwrap();
        assert!(search.results.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_postal_code() {
        let finder = finder();
        let err = finder.search_near("12-34", 5.0).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidPostalCode(PostalCodeError::InvalidFormat(_))
        ));
        let err = finder.search_near("", 5.0).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidPostalCode(PostalCodeError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_resolution_failure_propagates() {
        let finder = finder();
        let err = finder.search_near("0000000", 5.0).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Resolution(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn test_browse() {
        let finder = finder();
        assert_eq!(finder.browse(None).len(), finder.catalog().len());
        let osaka: Vec<u32> = finder.browse(Some("大阪府")).iter().map(|s| s.id).collect();
        assert_eq!(osaka, vec![6]);
        assert!(finder.browse(Some("Atlantis")).is_empty());
    }
}
