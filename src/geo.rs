//! Great-circle distance on a spherical Earth.
//!
//! Station resolution only needs to rank candidate stations by distance
//! from a geocoded point, so a spherical model is enough; no geodesic
//! refinement.

/// Earth radius in kilometers (WGS84 equatorial).
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// (latitude, longitude) in decimal degrees to a unit vector.
fn latlon_to_xyz(lat_deg: f64, lon_deg: f64) -> [f64; 3] {
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    let coslat = lat.cos();
    [coslat * lon.cos(), coslat * lon.sin(), lat.sin()]
}

/// Distance in kilometers between two (latitude, longitude) points in
/// decimal degrees.
///
/// The dot product is clamped into [-1, 1] before `acos`: floating
/// rounding can push identical or antipodal points just outside the
/// domain, which would produce NaN.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let va = latlon_to_xyz(a.0, a.1);
    let vb = latlon_to_xyz(b.0, b.1);
    let dot: f64 = va.iter().zip(vb.iter()).map(|(x, y)| x * y).sum();
    dot.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKYO: (f64, f64) = (35.6895, 139.6917);
    const OSAKA: (f64, f64) = (34.6937, 135.5023);

    #[test]
    fn test_distance_to_self_is_zero() {
        for p in [(0.0, 0.0), TOKYO, (-90.0, 0.0), (89.999, 179.999)] {
            let d = distance(p, p);
            assert!(d.abs() < 1e-9, "distance({:?}, {:?}) = {}", p, p, d);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        assert_eq!(distance(TOKYO, OSAKA), distance(OSAKA, TOKYO));
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        // dot product lands at (or just below) -1.0 here; without the
        // clamp acos would return NaN.
        let d = distance((0.0, 0.0), (0.0, 180.0));
        assert!(d.is_finite());
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_tokyo_osaka_is_about_400_km() {
        let d = distance(TOKYO, OSAKA);
        assert!((390.0..420.0).contains(&d), "got {} km", d);
    }

    #[test]
    fn test_poles_are_a_quarter_circumference_from_the_equator() {
        let d = distance((90.0, 0.0), (0.0, 57.3));
        let quarter = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KM;
        assert!((d - quarter).abs() < 1e-6, "got {} km", d);
    }
}
