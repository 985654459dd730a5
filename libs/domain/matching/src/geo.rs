//! Great-circle distance and radius filtering (spec §4.C).

use dispatch_domain_models::ProviderProfile;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Keeps only providers whose home coordinates fall within both the
/// requested search radius (if any) and their own declared service radius.
pub fn filter_by_radius<'a>(
    providers: &'a [ProviderProfile],
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
) -> Vec<(&'a ProviderProfile, f64)> {
    providers
        .iter()
        .filter_map(|p| {
            let (home_lat, home_lng) = (p.home_lat?, p.home_lng?);
            let distance = haversine_km(lat, lng, home_lat, home_lng);
            let effective_radius = radius_km.map_or(p.service_radius_km, |r| r.min(p.service_radius_km));
            (distance <= effective_radius).then_some((p, distance))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero_distance() {
        assert!(haversine_km(43.65, -79.38, 43.65, -79.38) < 1e-9);
    }

    #[test]
    fn toronto_to_montreal_is_roughly_five_hundred_km() {
        let km = haversine_km(43.6532, -79.3832, 45.5019, -73.5674);
        assert!((km - 504.0).abs() < 20.0, "got {km}");
    }
}
