//! The immutable, shared bookstore catalog.
//!
//! A [`Catalog`] is loaded once and never changes afterwards. Entries live
//! behind an `Arc<[Bookstore]>`, so clones are cheap and every query reads
//! the same memory without locking. All query results are fresh views that
//! borrow from the catalog.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::geo;
use crate::prefecture;
use crate::region::{self, RegionGroup};
use crate::types::{Bookstore, Coordinate, RankedBookstore};

/// Catalog compiled into the binary, used when no external file is given.
const EMBEDDED_CATALOG: &str = include_str!("../data/bookstores.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate bookstore id {0}")]
    DuplicateId(u32),
}

#[derive(Debug, Clone)]
pub struct Catalog {
    bookstores: Arc<[Bookstore]>,
}

impl Catalog {
    /// Build a catalog from records, rejecting duplicate ids.
    pub fn new(bookstores: Vec<Bookstore>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(bookstores.len());
        for store in &bookstores {
            if !seen.insert(store.id) {
                return Err(CatalogError::DuplicateId(store.id));
            }
        }

        Ok(Self {
            bookstores: bookstores.into(),
        })
    }

    /// Parse a JSON array of bookstore records.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let bookstores: Vec<Bookstore> = serde_json::from_str(json)?;
        Self::new(bookstores)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            "Loaded {} bookstore(s) from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The catalog shipped with the crate.
    pub fn embedded() -> Result<Self, CatalogError> {
        let catalog = Self::from_json(EMBEDDED_CATALOG)?;
        tracing::info!("Loaded {} bookstore(s) from embedded catalog", catalog.len());
        Ok(catalog)
    }

    pub fn all(&self) -> &[Bookstore] {
        &self.bookstores
    }

    pub fn len(&self) -> usize {
        self.bookstores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookstores.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Bookstore> {
        self.bookstores.iter().find(|s| s.id == id)
    }

    /// See [`prefecture::filter_by_prefecture`].
    pub fn by_prefecture(&self, prefecture: Option<&str>) -> Vec<&Bookstore> {
        prefecture::filter_by_prefecture(self.all(), prefecture)
    }

    /// See [`prefecture::list_prefectures`].
    pub fn prefectures(&self) -> Vec<&str> {
        prefecture::list_prefectures(self.all())
    }

    /// See [`geo::find_within_radius`].
    pub fn nearby(&self, origin: Coordinate, radius_km: f64) -> Vec<RankedBookstore<'_>> {
        geo::find_within_radius(origin, self.all(), radius_km)
    }

    /// See [`region::group_by_region`].
    pub fn regions(&self) -> Vec<RegionGroup<'_>> {
        region::group_by_region(self.all())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TOKYO_STATION: Coordinate = Coordinate::new(35.6812, 139.7671);

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.get(6).map(|s| s.name.as_str()), Some("梅田ブックセンター"));
        assert!(catalog.get(9999).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id":1,"name":"a","address":"","latitude":0,"longitude":0,"phone":""},
            {"id":1,"name":"b","address":"","latitude":0,"longitude":0,"phone":""}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Catalog::from_json("[{\"id\": \"x\"}]"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":3,"name":"c","address":"","latitude":1.5,"longitude":2.5,"phone":"","prefecture":"Tokyo"}}]"#
        )
        .unwrap();

        let catalog = Catalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.prefectures(), vec!["Tokyo"]);

        assert!(matches!(
            Catalog::from_path(file.path().with_extension("missing")),
            Err(CatalogError::Io(_))
        ));
    }

    #[test]
    fn test_nearby_tokyo_station() {
        let catalog = Catalog::embedded().unwrap();
        let ids: Vec<u32> = catalog
            .nearby(TOKYO_STATION, geo::DEFAULT_RADIUS_KM)
            .iter()
            .map(|r| r.bookstore.id)
            .collect();
        assert_eq!(ids, vec![1, 11, 2, 3]);
    }

    #[test]
    fn test_by_prefecture_and_listing() {
        let catalog = Catalog::embedded().unwrap();

        let tokyo: Vec<u32> = catalog.by_prefecture(Some("東京都")).iter().map(|s| s.id).collect();
        assert_eq!(tokyo, vec![1, 2, 3, 4]);
        assert_eq!(catalog.by_prefecture(Some("")).len(), catalog.len());

        let prefectures = catalog.prefectures();
        let mut sorted = prefectures.clone();
        sorted.sort();
        assert_eq!(prefectures, sorted);
        assert!(prefectures.contains(&"大阪府"));
        assert_eq!(prefectures.iter().filter(|p| **p == "東京都").count(), 1);
    }

    #[test]
    fn test_regions_skip_unassigned_store() {
        let catalog = Catalog::embedded().unwrap();
        let grouped: usize = catalog.regions().iter().map(|g| g.bookstore_count()).sum();
        // Store 11 has no prefecture
        assert_eq!(grouped, catalog.len() - 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let catalog = Catalog::embedded().unwrap();
        let clone = catalog.clone();
        assert!(std::ptr::eq(catalog.all(), clone.all()));
    }
}
