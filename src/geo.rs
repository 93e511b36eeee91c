//! Great-circle distance and radius search over bookstores.
//!
//! Distances use the Haversine formula on a spherical Earth of radius
//! [`EARTH_RADIUS_KM`]. There is no ellipsoid correction and no bounds
//! checking on coordinates.

use crate::types::{Bookstore, Coordinate, RankedBookstore};

/// Mean Earth radius used for all distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Radius used when a search does not specify one.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Haversine distance between two coordinates in kilometers.
///
/// `haversine_km(a, a) == 0.0` and `haversine_km(a, b) == haversine_km(b, a)`
/// hold exactly for identical inputs.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1.0 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Bookstores within `radius_km` of `origin`, nearest first.
///
/// The boundary is inclusive. Equal distances keep their input order
/// (stable sort). Entries whose distance is NaN never qualify.
pub fn find_within_radius<'a, I>(
    origin: Coordinate,
    bookstores: I,
    radius_km: f64,
) -> Vec<RankedBookstore<'a>>
where
    I: IntoIterator<Item = &'a Bookstore>,
{
    let mut ranked: Vec<RankedBookstore<'a>> = bookstores
        .into_iter()
        .map(|bookstore| RankedBookstore {
            bookstore,
            distance_km: haversine_km(origin, bookstore.coordinate()),
        })
        .filter(|r| r.distance_km <= radius_km)
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    tracing::debug!(
        "{} bookstore(s) within {} km of {}",
        ranked.len(),
        radius_km,
        origin
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO_STATION: Coordinate = Coordinate::new(35.6812, 139.7671);
    const OSAKA_STATION: Coordinate = Coordinate::new(34.7025, 135.4959);

    fn store(id: u32, latitude: f64, longitude: f64) -> Bookstore {
        Bookstore {
            id,
            name: format!("store {}", id),
            address: String::new(),
            latitude,
            longitude,
            phone: String::new(),
            prefecture: None,
            url: None,
            x_account: None,
            image: None,
        }
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(haversine_km(TOKYO_STATION, TOKYO_STATION), 0.0);
        assert_eq!(haversine_km(OSAKA_STATION, OSAKA_STATION), 0.0);
        let odd = Coordinate::new(-89.9, 179.99);
        assert_eq!(haversine_km(odd, odd), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let points = [
            TOKYO_STATION,
            OSAKA_STATION,
            Coordinate::new(43.0687, 141.3508),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(0.0, -179.5),
        ];
        for a in points {
            for b in points {
                assert_eq!(haversine_km(a, b), haversine_km(b, a));
                assert!(haversine_km(a, b) >= 0.0);
            }
        }
    }

    #[test]
    fn test_tokyo_to_osaka() {
        let d = haversine_km(TOKYO_STATION, OSAKA_STATION);
        assert!((d - 403.0).abs() < 5.0, "got {} km", d);
        assert_eq!(TOKYO_STATION.distance_km(&OSAKA_STATION), d);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-3);
    }

    #[test]
    fn test_find_within_radius_filters_and_sorts() {
        let stores = vec![
            store(1, 35.6896, 139.7006), // Shinjuku, ~6.1 km
            store(2, 35.7138, 139.7770), // Ueno, ~3.7 km
            store(3, 35.6717, 139.7650), // Ginza, ~1.1 km
            store(4, 34.7025, 135.4959), // Osaka
            store(5, 35.6950, 139.7580), // Jimbocho, ~1.7 km
        ];

        let results = find_within_radius(TOKYO_STATION, &stores, DEFAULT_RADIUS_KM);
        let ids: Vec<u32> = results.iter().map(|r| r.bookstore.id).collect();
        assert_eq!(ids, vec![3, 5, 2]);

        for pair in results.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
        for r in &results {
            assert!(r.distance_km <= DEFAULT_RADIUS_KM);
            assert_eq!(
                r.distance_km,
                haversine_km(TOKYO_STATION, r.bookstore.coordinate())
            );
        }
    }

    #[test]
    fn test_find_within_radius_empty_catalog() {
        let stores: Vec<Bookstore> = Vec::new();
        assert!(find_within_radius(TOKYO_STATION, &stores, 100.0).is_empty());
        assert!(find_within_radius(OSAKA_STATION, &stores, 0.0).is_empty());
    }

    #[test]
    fn test_zero_radius_keeps_only_exact_matches() {
        let stores = vec![
            store(1, 35.6717, 139.7650),
            store(2, TOKYO_STATION.latitude, TOKYO_STATION.longitude),
        ];
        let results = find_within_radius(TOKYO_STATION, &stores, 0.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].bookstore.id, 2);
        assert_eq!(results[0].distance_km, 0.0);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let stores = vec![store(1, OSAKA_STATION.latitude, OSAKA_STATION.longitude)];
        let exact = haversine_km(TOKYO_STATION, OSAKA_STATION);
        assert_eq!(find_within_radius(TOKYO_STATION, &stores, exact).len(), 1);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let stores = vec![
            store(9, 35.6717, 139.7650),
            store(4, 35.6717, 139.7650),
            store(7, 35.6717, 139.7650),
        ];
        let ids: Vec<u32> = find_within_radius(TOKYO_STATION, &stores, 5.0)
            .iter()
            .map(|r| r.bookstore.id)
            .collect();
        assert_eq!(ids, vec![9, 4, 7]);
    }

    #[test]
    fn test_nan_coordinates_never_qualify() {
        let stores = vec![store(1, f64::NAN, 139.0)];
        assert!(find_within_radius(TOKYO_STATION, &stores, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_does_not_mutate_input() {
        let stores = vec![store(2, 35.7138, 139.7770), store(1, 35.6717, 139.7650)];
        let before = stores.clone();
        let _ = find_within_radius(TOKYO_STATION, &stores, 10.0);
        assert_eq!(stores, before);
    }
}
