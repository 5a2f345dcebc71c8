//! Krüger series coefficients and conformal-latitude helpers for WGS84.

use once_cell::sync::Lazy;

/// WGS84 semi-major axis in meters.
pub(crate) const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub(crate) const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Number of series terms kept for both directions.
pub(crate) const ORDER: usize = 6;

// Row `j` holds the numerator polynomial of alpha[j+1] / n^(j+1) in
// descending powers of `n`, followed by the common denominator.
const ALPHA_POLY: [&[f64]; ORDER] = [
    &[31564.0, -66675.0, 34440.0, 47250.0, -100800.0, 75600.0, 151200.0],
    &[-1983433.0, 863232.0, 748608.0, -1161216.0, 524160.0, 1935360.0],
    &[670412.0, 406647.0, -533952.0, 184464.0, 725760.0],
    &[6601661.0, -7732800.0, 2230245.0, 7257600.0],
    &[-13675556.0, 3438171.0, 7983360.0],
    &[212378941.0, 319334400.0],
];

const BETA_POLY: [&[f64]; ORDER] = [
    &[384796.0, -382725.0, -6720.0, 932400.0, -1612800.0, 1209600.0, 2419200.0],
    &[-1118711.0, 1695744.0, -1174656.0, 258048.0, 80640.0, 3870720.0],
    &[22276.0, -16929.0, -15984.0, 12852.0, 362880.0],
    &[-830251.0, -158400.0, 197865.0, 7257600.0],
    &[-435388.0, 453717.0, 15966720.0],
    &[20648693.0, 638668800.0],
];

/// Precomputed ellipsoid quantities used by forward and inverse projection.
#[derive(Debug, Clone)]
pub(crate) struct KrugerSeries {
    /// First eccentricity.
    pub e: f64,
    /// First eccentricity squared.
    pub e2: f64,
    /// Meridional (rectifying) radius `A`.
    pub rectifying_radius: f64,
    pub alpha: [f64; ORDER],
    pub beta: [f64; ORDER],
}

pub(crate) static WGS84: Lazy<KrugerSeries> = Lazy::new(|| KrugerSeries::new(WGS84_A, WGS84_F));

impl KrugerSeries {
    pub fn new(a: f64, f: f64) -> Self {
        let n = f / (2.0 - f);
        let n2 = n * n;
        let e2 = f * (2.0 - f);
        let rectifying_radius =
            a / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0 + n2 * n2 * n2 / 256.0);

        let mut alpha = [0.0; ORDER];
        let mut beta = [0.0; ORDER];
        let mut power = n;
        for j in 0..ORDER {
            alpha[j] = power * ratio(ALPHA_POLY[j], n);
            beta[j] = power * ratio(BETA_POLY[j], n);
            power *= n;
        }

        Self {
            e: e2.sqrt(),
            e2,
            rectifying_radius,
            alpha,
            beta,
        }
    }
}

fn ratio(poly: &[f64], n: f64) -> f64 {
    let (denominator, numerator) = match poly.split_last() {
        Some(parts) => parts,
        None => return 0.0,
    };
    numerator.iter().fold(0.0, |acc, c| acc * n + c) / denominator
}

/// tan(phi) -> tan(phi'), conformal latitude.
pub(crate) fn conformal_tan(tau: f64, e: f64) -> f64 {
    let tau1 = tau.hypot(1.0);
    let sigma = (e * (e * tau / tau1).atanh()).sinh();
    sigma.hypot(1.0) * tau - sigma * tau1
}

/// Inverse of [`conformal_tan`], solved with Newton's method.
pub(crate) fn geodetic_tan(tau_prime: f64, e: f64) -> f64 {
    const MAX_ITERATIONS: usize = 8;
    let tolerance = f64::EPSILON.sqrt() * 0.1 * tau_prime.abs().max(1.0);
    let e2m = 1.0 - e * e;

    let mut tau = tau_prime / e2m.sqrt();
    for _ in 0..MAX_ITERATIONS {
        let current = conformal_tan(tau, e);
        let step = (tau_prime - current) * (1.0 + e2m * tau * tau)
            / (e2m * tau.hypot(1.0) * current.hypot(1.0));
        tau += step;
        if step.abs() < tolerance {
            break;
        }
    }
    tau
}
