// Distribution Evaluation
// Density and CDF for every fitted family, dispatched on the variant

use super::special::{ln_beta, ln_gamma, regularized_beta, regularized_gamma_p, standard_normal_cdf};
use crate::models::DistributionParameters;
use std::f64::consts::PI;

/// Bandwidth used by the kernel density estimate when all samples coincide.
pub const DEGENERATE_BANDWIDTH: f64 = 0.01;

impl DistributionParameters {
    /// Density of the fitted distribution at `value`. Empirical fits use a
    /// Gaussian kernel density estimate over the stored samples.
    pub fn probability(&self, value: f64) -> f64 {
        match self {
            Self::Normal { mean, std_dev } => normal_pdf(value, *mean, *std_dev),
            Self::Gamma { shape, rate } => gamma_pdf(value, *shape, *rate),
            Self::Beta { alpha, beta } => beta_pdf(value, *alpha, *beta),
            Self::Exponential { rate } => exponential_pdf(value, *rate),
            Self::LogNormal { mu, sigma } => lognormal_pdf(value, *mu, *sigma),
            Self::Empirical { samples, .. } => kernel_density(value, samples),
        }
    }

    pub fn cdf(&self, value: f64) -> f64 {
        match self {
            Self::Normal { mean, std_dev } => normal_cdf(value, *mean, *std_dev),
            Self::Gamma { shape, rate } => {
                if value <= 0.0 {
                    0.0
                } else {
                    regularized_gamma_p(*shape, rate * value)
                }
            }
            Self::Beta { alpha, beta } => regularized_beta(*alpha, *beta, value),
            Self::Exponential { rate } => {
                if value < 0.0 {
                    0.0
                } else {
                    1.0 - (-rate * value).exp()
                }
            }
            Self::LogNormal { mu, sigma } => {
                if value <= 0.0 {
                    0.0
                } else {
                    normal_cdf(value.ln(), *mu, *sigma)
                }
            }
            Self::Empirical { samples, .. } => {
                if samples.is_empty() {
                    return 0.0;
                }
                let at_or_below = samples.partition_point(|s| *s <= value);
                at_or_below as f64 / samples.len() as f64
            }
        }
    }
}

// A zero-spread normal is a point mass at the mean
fn normal_pdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return if x == mean { f64::INFINITY } else { 0.0 };
    }
    let z = (x - mean) / std_dev;
    (-0.5 * z * z).exp() / (std_dev * (2.0 * PI).sqrt())
}

fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return if x < mean { 0.0 } else { 1.0 };
    }
    standard_normal_cdf((x - mean) / std_dev)
}

fn gamma_pdf(x: f64, shape: f64, rate: f64) -> f64 {
    if x < 0.0 {
        return 0.0;
    }
    if x == 0.0 {
        return if shape < 1.0 {
            f64::INFINITY
        } else if shape == 1.0 {
            rate
        } else {
            0.0
        };
    }
    (shape * rate.ln() + (shape - 1.0) * x.ln() - rate * x - ln_gamma(shape)).exp()
}

fn beta_pdf(x: f64, alpha: f64, beta: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return 0.0;
    }
    if x == 0.0 || x == 1.0 {
        // Density at the edge depends only on the shape touching it
        let (edge_shape, other_shape) = if x == 0.0 { (alpha, beta) } else { (beta, alpha) };
        return if edge_shape < 1.0 {
            f64::INFINITY
        } else if edge_shape == 1.0 {
            (-ln_beta(1.0, other_shape)).exp()
        } else {
            0.0
        };
    }
    ((alpha - 1.0) * x.ln() + (beta - 1.0) * (1.0 - x).ln() - ln_beta(alpha, beta)).exp()
}

fn exponential_pdf(x: f64, rate: f64) -> f64 {
    if x < 0.0 {
        return 0.0;
    }
    rate * (-rate * x).exp()
}

fn lognormal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if sigma <= 0.0 {
        return if x.ln() == mu { f64::INFINITY } else { 0.0 };
    }
    let z = (x.ln() - mu) / sigma;
    (-0.5 * z * z).exp() / (x * sigma * (2.0 * PI).sqrt())
}

/// Gaussian KDE with Silverman's rule-of-thumb bandwidth.
pub fn kernel_density(x: f64, samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let n = samples.len() as f64;
    let (_, std_dev) = super::fitter::mean_std_dev(samples);
    let mut h = 1.06 * std_dev * n.powf(-0.2);
    if h == 0.0 {
        h = DEGENERATE_BANDWIDTH;
    }

    let sum: f64 = samples
        .iter()
        .map(|xi| {
            let z = (x - xi) / h;
            (-0.5 * z * z).exp()
        })
        .sum();

    sum / (n * h * (2.0 * PI).sqrt())
}
