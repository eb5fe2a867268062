use crate::raw_point::RawPoint;

/// Equatorial radius of the WGS84 ellipsoid, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Length of one degree of latitude, in meters.
pub const ONE_DEGREE: f64 = 1000. * 10000.8 / 90.;

// Beyond this many degrees the flat approximation drifts too far.
const APPROXIMATION_LIMIT: f64 = 0.2;

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat1 - lat2).to_radians();
    let d_lon = (lon1 - lon2).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::sin(d_lon / 2.).powi(2) * f64::cos(lat1) * f64::cos(lat2);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS * c
}

/// Distance in meters between two coordinates.
///
/// Nearby points use an equirectangular approximation scaled by the latitude of the
/// first point, distant ones fall back to the haversine formula. When `elevations`
/// holds both heights the vertical delta is added in quadrature.
///
/// Returns `None` when the computation does not yield a finite distance.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, elevations: Option<(f64, f64)>) -> Option<f64> {
    let d_lat = lat1 - lat2;
    let d_lon = lon1 - lon2;

    let distance_2d = if d_lat.abs() > APPROXIMATION_LIMIT || d_lon.abs() > APPROXIMATION_LIMIT {
        haversine_distance(lat1, lon1, lat2, lon2)
    } else {
        let y = d_lon * lat1.to_radians().cos();
        (d_lat * d_lat + y * y).sqrt() * ONE_DEGREE
    };

    let distance = match elevations {
        Some((ele1, ele2)) => (distance_2d.powi(2) + (ele1 - ele2).powi(2)).sqrt(),
        None => distance_2d,
    };

    distance.is_finite().then_some(distance)
}

/// Horizontal distance between two samples.
pub fn distance_2d(from: &RawPoint, to: &RawPoint) -> Option<f64> {
    distance(from.latitude, from.longitude, to.latitude, to.longitude, None)
}

/// Distance including the elevation change. Falls back to the horizontal
/// distance when either sample lacks an elevation.
pub fn distance_3d(from: &RawPoint, to: &RawPoint) -> Option<f64> {
    let elevations = from.elevation.zip(to.elevation);
    distance(from.latitude, from.longitude, to.latitude, to.longitude, elevations)
}
