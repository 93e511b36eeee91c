pub mod catalog;
pub mod client;
pub mod config;
pub mod finder;
pub mod geo;
pub mod postal;
pub mod prefecture;
pub mod region;
pub mod resolver;
pub mod types;

pub use catalog::{Catalog, CatalogError};
pub use client::{HttpResolver, HttpResolverConfig};
pub use config::{FinderConfig, ResolverConfig};
pub use finder::{BookstoreFinder, NearbySearch, SearchError};
pub use geo::{DEFAULT_RADIUS_KM, find_within_radius, haversine_km};
pub use postal::{PostalCode, PostalCodeError};
pub use prefecture::{filter_by_prefecture, list_prefectures};
pub use region::{Prefecture, Region, RegionGroup, group_by_region};
pub use resolver::{CoordinateResolver, ResolveError, TableResolver};
pub use types::{Bookstore, Coordinate, RankedBookstore};
