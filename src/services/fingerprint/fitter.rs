// Distribution Fitter
// Fits five parametric families to a sample, scores each with a
// Kolmogorov-Smirnov derived goodness of fit and keeps the best one.
// Falls back to an empirical (KDE) model when nothing fits well enough.

use crate::models::{DistributionParameters, FittedDistribution};
use tracing::debug;

/// Below this many samples the families cannot be told apart.
pub const MIN_FIT_SAMPLES: usize = 5;

/// Critical value coefficient for a 5% significance level.
const KS_CRITICAL_COEFFICIENT: f64 = 1.36;
/// Scores at or above this are in the "good fit" band.
const GOOD_FIT_FLOOR: f64 = 0.8;
const MIN_GAMMA_SHAPE: f64 = 0.1;

type FitFn = fn(&[f64]) -> Option<DistributionParameters>;

/// Candidate families in tie-break order: on equal scores the earlier
/// entry wins.
const CANDIDATES: [FitFn; 5] = [fit_normal, fit_gamma, fit_beta, fit_exponential, fit_lognormal];

/// Sample mean and sample standard deviation (n-1 denominator). The
/// standard deviation is 0 with fewer than two samples.
pub fn mean_std_dev(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    (mean, sample_variance(data, mean).sqrt())
}

fn sample_variance(data: &[f64], mean: f64) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64
}

/// Fit the best distribution to `samples`.
///
/// With fewer than [`MIN_FIT_SAMPLES`] samples the result is a Normal built
/// from the sample statistics. Otherwise every family in [`CANDIDATES`] is
/// tried; the winner is kept when its score reaches `acceptance_threshold`,
/// else the empirical distribution of the samples is returned.
pub fn fit_distribution(samples: &[f64], acceptance_threshold: f64) -> FittedDistribution {
    if samples.len() < MIN_FIT_SAMPLES {
        let (mean, std_dev) = mean_std_dev(samples);
        return FittedDistribution {
            params: DistributionParameters::Normal { mean, std_dev },
            goodness_of_fit: 0.0,
        };
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let best = CANDIDATES
        .iter()
        .filter_map(|fit| fit(&sorted))
        .map(|params| {
            let score = goodness_of_fit_ks(&sorted, |x| params.cdf(x));
            debug!(
                family = params.family_name(),
                score,
                "[FITTER] candidate scored"
            );
            (params, score)
        })
        .fold(None, |best: Option<(DistributionParameters, f64)>, (params, score)| match best {
            Some((_, best_score)) if score <= best_score || score.is_nan() => best,
            None if score.is_nan() => None,
            _ => Some((params, score)),
        });

    match best {
        Some((params, score)) if score >= acceptance_threshold => FittedDistribution {
            params,
            goodness_of_fit: score,
        },
        other => {
            debug!(
                best_score = other.as_ref().map(|(_, s)| *s).unwrap_or(f64::NEG_INFINITY),
                acceptance_threshold,
                samples = sorted.len(),
                "[FITTER] no family accepted, using empirical distribution"
            );
            empirical_distribution(sorted)
        }
    }
}

/// Kolmogorov-Smirnov goodness of fit in [0, 1], higher is better.
///
/// `sorted` must be in ascending order. The largest gap between the
/// empirical and theoretical CDF is measured at each sample and at the
/// step just before it, then mapped onto [0.8, 1.0] when below the 5%
/// critical value and onto [0, 0.8) otherwise.
pub fn goodness_of_fit_ks<F>(sorted: &[f64], cdf: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = sorted.len() as f64;
    let mut max_diff: f64 = 0.0;

    for (i, &x) in sorted.iter().enumerate() {
        let theoretical = cdf(x);

        let diff = ((i + 1) as f64 / n - theoretical).abs();
        if diff > max_diff {
            max_diff = diff;
        }

        if i > 0 {
            let diff = (i as f64 / n - theoretical).abs();
            if diff > max_diff {
                max_diff = diff;
            }
        }
    }

    let critical_value = KS_CRITICAL_COEFFICIENT / n.sqrt();
    if max_diff > critical_value {
        GOOD_FIT_FLOOR * (1.0 - max_diff / n.sqrt())
    } else {
        GOOD_FIT_FLOOR + (1.0 - GOOD_FIT_FLOOR) * (1.0 - max_diff / critical_value)
    }
}

/// Non-parametric fit: the sorted samples and their step CDF.
pub fn empirical_distribution(sorted: Vec<f64>) -> FittedDistribution {
    let n = sorted.len() as f64;
    let cdf = (1..=sorted.len()).map(|i| i as f64 / n).collect();
    FittedDistribution {
        params: DistributionParameters::Empirical { samples: sorted, cdf },
        goodness_of_fit: 1.0,
    }
}

// ============ Family fits ============

/// Maximum likelihood style fit using the sample statistics.
fn fit_normal(data: &[f64]) -> Option<DistributionParameters> {
    let (mean, std_dev) = mean_std_dev(data);
    Some(DistributionParameters::Normal { mean, std_dev })
}

/// Method of moments; only for non-negative data.
fn fit_gamma(data: &[f64]) -> Option<DistributionParameters> {
    if data.iter().any(|v| *v < 0.0) {
        return None;
    }
    let (mean, _) = mean_std_dev(data);
    let variance = sample_variance(data, mean);

    let shape = mean * mean / variance;
    let rate = mean / variance;
    if !shape.is_finite() || shape < MIN_GAMMA_SHAPE || !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    Some(DistributionParameters::Gamma { shape, rate })
}

/// Method of moments; only for data inside [0, 1].
fn fit_beta(data: &[f64]) -> Option<DistributionParameters> {
    if data.iter().any(|v| !(0.0..=1.0).contains(v)) {
        return None;
    }

    let (mean, _) = mean_std_dev(data);
    let variance = sample_variance(data, mean);
    if variance == 0.0 || mean == 0.0 || mean == 1.0 {
        return None;
    }

    let common = mean * (1.0 - mean) / variance - 1.0;
    let alpha = mean * common;
    let beta = (1.0 - mean) * common;
    if !alpha.is_finite() || !beta.is_finite() || alpha <= 0.0 || beta <= 0.0 {
        return None;
    }
    Some(DistributionParameters::Beta { alpha, beta })
}

fn fit_exponential(data: &[f64]) -> Option<DistributionParameters> {
    if data.iter().any(|v| *v < 0.0) {
        return None;
    }
    let (mean, _) = mean_std_dev(data);
    if mean <= 0.0 {
        return None;
    }
    Some(DistributionParameters::Exponential { rate: 1.0 / mean })
}

/// Normal fit in log space; only for strictly positive data.
fn fit_lognormal(data: &[f64]) -> Option<DistributionParameters> {
    if data.iter().any(|v| *v <= 0.0) {
        return None;
    }
    let logs: Vec<f64> = data.iter().map(|v| v.ln()).collect();
    let (mu, sigma) = mean_std_dev(&logs);
    Some(DistributionParameters::LogNormal { mu, sigma })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_small_sample_returns_normal_statistics() {
        let samples = [0.1, 0.2, 0.3, 0.6];
        let fitted = fit_distribution(&samples, 0.8);
        match fitted.params {
            DistributionParameters::Normal { mean, std_dev } => {
                assert!(close(mean, 0.3, 1e-12));
                // sample variance: (0.04 + 0.01 + 0 + 0.09) / 3
                assert!(close(std_dev, (0.14f64 / 3.0).sqrt(), 1e-12));
            }
            other => panic!("expected normal, got {:?}", other),
        }
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        let fitted = fit_distribution(&[0.4], 0.8);
        assert_eq!(
            fitted.params,
            DistributionParameters::Normal { mean: 0.4, std_dev: 0.0 }
        );
    }

    #[test]
    fn test_empty_sample_is_degenerate_normal() {
        let fitted = fit_distribution(&[], 0.8);
        assert_eq!(fitted, FittedDistribution::placeholder());
    }

    #[test]
    fn test_goodness_of_fit_bands() {
        let sorted: Vec<f64> = (0..20).map(|i| (i as f64 + 0.5) / 20.0).collect();
        // uniform data against the uniform CDF is a near-perfect fit
        let good = goodness_of_fit_ks(&sorted, |x| x.clamp(0.0, 1.0));
        assert!(good >= 0.8 && good <= 1.0, "got {}", good);
        // and against a CDF stuck at 0 it is a poor fit
        let poor = goodness_of_fit_ks(&sorted, |_| 0.0);
        assert!(poor < 0.8, "got {}", poor);
        assert!(close(poor, 0.8 * (1.0 - 1.0 / 20f64.sqrt()), 1e-12));
    }

    #[test]
    fn test_never_returns_beta_outside_unit_interval() {
        let samples = [0.5, 1.5, 2.5, 3.0, 3.5, 4.0, 4.5, 5.5, 6.0, 7.5];
        for threshold in [0.0, 0.5, 0.8] {
            let fitted = fit_distribution(&samples, threshold);
            assert!(!matches!(fitted.params, DistributionParameters::Beta { .. }));
        }
    }

    #[test]
    fn test_never_returns_positive_only_family_for_negative_data() {
        let samples = [-1.2, -0.4, 0.0, 0.3, 0.9, 1.1, -0.7, 0.2];
        let fitted = fit_distribution(&samples, 0.0);
        assert!(matches!(fitted.params, DistributionParameters::Normal { .. }));
    }

    #[test]
    fn test_skewed_data_with_negative_sample_never_fits_gamma() {
        // right-skewed, positive mean, one value just below zero
        let samples = [
            -0.01, 0.02, 0.03, 0.05, 0.06, 0.08, 0.1, 0.12, 0.15, 0.2, 0.25, 0.3, 0.4, 0.6, 0.9,
        ];
        assert!(fit_gamma(&samples).is_none());
        for threshold in [0.0, 0.5, 0.8] {
            let fitted = fit_distribution(&samples, threshold);
            assert!(
                matches!(
                    fitted.params,
                    DistributionParameters::Normal { .. } | DistributionParameters::Empirical { .. }
                ),
                "got {:?}",
                fitted.params
            );
        }
    }

    #[test]
    fn test_zero_threshold_prefers_parametric_family() {
        let samples = [0.21, 0.25, 0.19, 0.22, 0.24, 0.2, 0.23, 0.18, 0.26, 0.22];
        let fitted = fit_distribution(&samples, 0.0);
        assert!(!matches!(fitted.params, DistributionParameters::Empirical { .. }));
        assert!(fitted.goodness_of_fit > 0.0 && fitted.goodness_of_fit <= 1.0);
    }

    #[test]
    fn test_unreachable_threshold_falls_back_to_empirical() {
        let samples = [0.3, 0.1, 0.2, 0.5, 0.4];
        let fitted = fit_distribution(&samples, 1.5);
        assert_eq!(fitted.goodness_of_fit, 1.0);
        match fitted.params {
            DistributionParameters::Empirical { samples, cdf } => {
                assert_eq!(samples, vec![0.1, 0.2, 0.3, 0.4, 0.5]);
                assert_eq!(cdf, vec![0.2, 0.4, 0.6, 0.8, 1.0]);
            }
            other => panic!("expected empirical, got {:?}", other),
        }
    }

    #[test]
    fn test_constant_zero_samples_use_empirical() {
        // every family except the point-mass normal is rejected and that
        // one scores below the good-fit band
        let fitted = fit_distribution(&[0.0; 5], 0.8);
        assert!(matches!(fitted.params, DistributionParameters::Empirical { .. }));
    }

    #[test]
    fn test_family_rejections() {
        assert!(fit_gamma(&[0.5; 6]).is_none());
        assert!(fit_gamma(&[-0.5, 1.0, 2.0, 3.0, 4.0]).is_none());
        assert!(fit_beta(&[0.0, 0.0, 0.0, 0.0, 0.0]).is_none());
        assert!(fit_beta(&[0.2, 0.4, 1.2, 0.3, 0.1]).is_none());
        assert!(fit_exponential(&[0.0; 5]).is_none());
        assert!(fit_exponential(&[-0.1, 0.2, 0.3, 0.4, 0.5]).is_none());
        assert!(fit_lognormal(&[0.0, 0.2, 0.3, 0.4, 0.5]).is_none());
    }

    #[test]
    fn test_gamma_method_of_moments() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        // mean 3, sample variance 2.5
        match fit_gamma(&data) {
            Some(DistributionParameters::Gamma { shape, rate }) => {
                assert!(close(shape, 3.6, 1e-12));
                assert!(close(rate, 1.2, 1e-12));
            }
            other => panic!("expected gamma, got {:?}", other),
        }
    }
}
