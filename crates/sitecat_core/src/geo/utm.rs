//! UTM forward/inverse projection on the WGS84 ellipsoid.
//!
//! # Responsibility
//! - Derive the UTM zone from longitude.
//! - Project latitude/longitude to easting/northing and back using the
//!   six-term Krüger series.
//!
//! # Invariants
//! - Forward input: latitude in `[-80, 84]`, longitude in `[-180, 180]`.
//! - Southern points carry the 10,000,000 m false northing.
//! - Round trip error stays below 1e-9 degrees inside the UTM domain.

use super::series::{conformal_tan, geodetic_tan, KrugerSeries, ORDER, WGS84, WGS84_A};
use super::{GeoError, GeoPoint, GeoResult, Hemisphere, UtmCoordinate};

/// UTM central scale factor.
pub const UTM_K0: f64 = 0.9996;
/// False easting applied in every zone.
pub const FALSE_EASTING: f64 = 500_000.0;
/// False northing applied in the southern hemisphere.
pub const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const MIN_LATITUDE: f64 = -80.0;
const MAX_LATITUDE: f64 = 84.0;
/// Widest easting offset from the false easting accepted by the inverse.
const MAX_EASTING_OFFSET: f64 = 1_100_000.0;
/// Northing ceiling in both hemispheres (pole in the north, equator in the south).
const MAX_NORTHING: f64 = 10_000_000.0;
/// Longitude band around the central meridian covered by a zone's grid.
const MAX_ZONE_OFFSET_DEGREES: f64 = 9.0;

/// Forward projection result with auxiliary grid quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub utm: UtmCoordinate,
    /// Point scale factor `k`.
    pub scale_factor: f64,
    /// Grid convergence `gamma` in degrees (grid north minus true north).
    pub convergence_degrees: f64,
}

/// Returns the UTM zone for a longitude: `ceil((lon + 180) / 6)` clipped to 1..=60.
///
/// A longitude on a zone boundary belongs to the western zone.
pub fn zone_for_longitude(longitude: f64) -> GeoResult<u8> {
    check_longitude(longitude)?;
    let zone = ((longitude + 180.0) / 6.0).ceil() as i32;
    Ok(zone.clamp(1, 60) as u8)
}

/// Central meridian of a zone in degrees.
pub fn central_meridian(zone: u8) -> GeoResult<f64> {
    check_zone(zone)?;
    Ok(f64::from(zone - 1) * 6.0 - 180.0 + 3.0)
}

/// Projects a WGS84 point to UTM in the zone derived from its longitude.
pub fn latlong_to_utm(latitude: f64, longitude: f64) -> GeoResult<UtmCoordinate> {
    project(latitude, longitude).map(|projection| projection.utm)
}

/// Projects into a caller-chosen zone, e.g. to keep a survey path in one grid.
///
/// # Errors
/// - `InvalidCoordinate` for out-of-range latitude/longitude/zone, or when the
///   point is more than one zone width away from the zone's central meridian.
pub fn latlong_to_utm_in_zone(latitude: f64, longitude: f64, zone: u8) -> GeoResult<UtmCoordinate> {
    project_in_zone(latitude, longitude, zone).map(|projection| projection.utm)
}

/// Forward projection returning scale factor and convergence as well.
pub fn project(latitude: f64, longitude: f64) -> GeoResult<Projection> {
    let zone = zone_for_longitude(longitude)?;
    project_in_zone(latitude, longitude, zone)
}

fn project_in_zone(latitude: f64, longitude: f64, zone: u8) -> GeoResult<Projection> {
    check_latitude(latitude)?;
    check_longitude(longitude)?;
    let lambda0 = central_meridian(zone)?;

    let delta = normalize_degrees(longitude - lambda0);
    if delta.abs() > MAX_ZONE_OFFSET_DEGREES {
        return Err(GeoError::invalid("longitude", longitude));
    }

    let series: &KrugerSeries = &WGS84;
    let phi = latitude.to_radians();
    let lambda = delta.to_radians();
    let (sin_lambda, cos_lambda) = lambda.sin_cos();

    let tau = phi.tan();
    let tau_prime = conformal_tan(tau, series.e);
    let xi_prime = tau_prime.atan2(cos_lambda);
    let eta_prime = (sin_lambda / tau_prime.hypot(cos_lambda)).asinh();

    let mut xi = xi_prime;
    let mut eta = eta_prime;
    let mut p = 1.0;
    let mut q = 0.0;
    for j in 0..ORDER {
        let order = 2.0 * (j + 1) as f64;
        let (sin_x, cos_x) = (order * xi_prime).sin_cos();
        let (sinh_e, cosh_e) = ((order * eta_prime).sinh(), (order * eta_prime).cosh());
        let alpha = series.alpha[j];
        xi += alpha * sin_x * cosh_e;
        eta += alpha * cos_x * sinh_e;
        p += order * alpha * cos_x * cosh_e;
        q += order * alpha * sin_x * sinh_e;
    }

    let scale = UTM_K0 * series.rectifying_radius;
    let hemisphere = Hemisphere::for_latitude(latitude);
    let easting = FALSE_EASTING + scale * eta;
    let northing = hemisphere.false_northing() + scale * xi;

    let gamma_prime = (sin_lambda * tau_prime).atan2(cos_lambda * tau_prime.hypot(1.0));
    let convergence_degrees = (gamma_prime + q.atan2(p)).to_degrees();
    let sin_phi = phi.sin();
    let scale_factor = UTM_K0 * (series.rectifying_radius / WGS84_A)
        * p.hypot(q)
        * (1.0 - series.e2 * sin_phi * sin_phi).sqrt()
        * tau.hypot(1.0)
        / tau_prime.hypot(cos_lambda);

    Ok(Projection {
        utm: UtmCoordinate {
            zone,
            hemisphere,
            easting,
            northing,
        },
        scale_factor,
        convergence_degrees,
    })
}

/// Inverse projection from UTM grid values to WGS84 latitude/longitude.
///
/// `hemisphere` is `N` or `S` (case-insensitive).
///
/// # Errors
/// - `InvalidCoordinate` for zone outside 1..=60, an unknown hemisphere
///   character, easting/northing outside the grid, or a grid position that
///   maps more than 9 degrees away from the zone's central meridian.
pub fn utm_to_latlong(zone: u8, easting: f64, northing: f64, hemisphere: char) -> GeoResult<GeoPoint> {
    let hemisphere = Hemisphere::from_char(hemisphere)?;
    let lambda0 = central_meridian(zone)?;
    check_grid(easting, northing)?;

    let series: &KrugerSeries = &WGS84;
    let scale = UTM_K0 * series.rectifying_radius;
    let xi = (northing - hemisphere.false_northing()) / scale;
    let eta = (easting - FALSE_EASTING) / scale;

    let mut xi_prime = xi;
    let mut eta_prime = eta;
    for j in 0..ORDER {
        let order = 2.0 * (j + 1) as f64;
        let beta = series.beta[j];
        xi_prime -= beta * (order * xi).sin() * (order * eta).cosh();
        eta_prime -= beta * (order * xi).cos() * (order * eta).sinh();
    }

    let sinh_eta = eta_prime.sinh();
    let cos_xi = xi_prime.cos().max(0.0);
    let r = sinh_eta.hypot(cos_xi);

    let (latitude, delta) = if r == 0.0 {
        (90.0_f64.copysign(xi_prime), 0.0)
    } else {
        let tau = geodetic_tan(xi_prime.sin() / r, series.e);
        (tau.atan().to_degrees(), sinh_eta.atan2(cos_xi).to_degrees())
    };
    if !latitude.is_finite() || !delta.is_finite() || delta.abs() > MAX_ZONE_OFFSET_DEGREES {
        return Err(GeoError::invalid(
            "grid position",
            format!("{easting}E {northing}N in zone {zone}"),
        ));
    }

    Ok(GeoPoint {
        latitude,
        longitude: normalize_degrees(lambda0 + delta),
    })
}

pub(crate) fn check_zone(zone: u8) -> GeoResult<()> {
    if (1..=60).contains(&zone) {
        Ok(())
    } else {
        Err(GeoError::invalid("zone", zone))
    }
}

/// Checks easting/northing against the grid extent shared by every zone.
pub(crate) fn check_grid(easting: f64, northing: f64) -> GeoResult<()> {
    if !easting.is_finite() || easting < 0.0 || (easting - FALSE_EASTING).abs() > MAX_EASTING_OFFSET
    {
        return Err(GeoError::invalid("easting", easting));
    }
    if !northing.is_finite() || !(0.0..=MAX_NORTHING).contains(&northing) {
        return Err(GeoError::invalid("northing", northing));
    }
    Ok(())
}

fn check_latitude(latitude: f64) -> GeoResult<()> {
    if latitude.is_finite() && (MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
        Ok(())
    } else {
        Err(GeoError::invalid("latitude", latitude))
    }
}

fn check_longitude(longitude: f64) -> GeoResult<()> {
    if longitude.is_finite() && (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(GeoError::invalid("longitude", longitude))
    }
}

/// Wraps an angle into `[-180, 180]`, keeping `180` for positive input.
fn normalize_degrees(value: f64) -> f64 {
    let wrapped = (value + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && value > 0.0 {
        180.0
    } else {
        wrapped
    }
}
