use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in degrees.
///
/// No range validation is applied; out-of-range values still produce a
/// defined (if meaningless) distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometers
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        crate::geo::haversine_km(*self, *other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A catalog record: one physical bookstore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookstore {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: String,
    /// Prefecture name (e.g. "東京都"), the grouping/filter attribute
    #[serde(default, alias = "category", skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// X (formerly Twitter) handle
    #[serde(
        default,
        rename = "xaccount",
        alias = "socialHandle",
        skip_serializing_if = "Option::is_none"
    )]
    pub x_account: Option<String>,
    #[serde(default, alias = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Bookstore {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Google Maps search link for this store's location
    pub fn map_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={}",
            self.coordinate()
        )
    }

    pub fn has_phone(&self) -> bool {
        !self.phone.trim().is_empty()
    }
}

/// A bookstore paired with its distance from a search origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedBookstore<'a> {
    pub bookstore: &'a Bookstore,
    /// Always >= 0
    pub distance_km: f64,
}

impl RankedBookstore<'_> {
    /// Distance rounded to one decimal place, e.g. "1.2 km"
    pub fn display_distance(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }
}
