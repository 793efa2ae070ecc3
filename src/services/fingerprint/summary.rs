// Model Summary
// Human-readable rendering of a fitted distribution model

use crate::models::{DistributionModel, DistributionParameters, FittedDistribution, Slot};
use std::fmt;

fn write_parameters(out: &mut fmt::Formatter<'_>, fitted: &FittedDistribution) -> fmt::Result {
    match &fitted.params {
        DistributionParameters::Normal { mean, std_dev } => {
            writeln!(out, "   Mean: {:.4}, StdDev: {:.4}", mean, std_dev)
        }
        DistributionParameters::Gamma { shape, rate } => {
            writeln!(out, "   Shape: {:.4}, Rate: {:.4}", shape, rate)
        }
        DistributionParameters::Beta { alpha, beta } => {
            writeln!(out, "   Alpha: {:.4}, Beta: {:.4}", alpha, beta)
        }
        DistributionParameters::Exponential { rate } => writeln!(out, "   Rate: {:.4}", rate),
        DistributionParameters::LogNormal { mu, sigma } => {
            writeln!(out, "   Mu: {:.4}, Sigma: {:.4}", mu, sigma)
        }
        DistributionParameters::Empirical { samples, .. } => {
            writeln!(out, "   Sample size: {}", samples.len())
        }
    }
}

/// Per-slot fitted families and their parameters. Slots without frequency
/// samples are omitted.
impl fmt::Display for DistributionModel {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "Fitted Distribution Model Summary:")?;
        writeln!(out, "Based on {} text samples", self.sample_count)?;
        writeln!(out, "Anomaly threshold: {:.2}", self.anomaly_threshold)?;
        writeln!(out)?;
        writeln!(out, "Character distribution types:")?;

        for slot in Slot::all() {
            let slot_model = self.slot(slot);
            if !slot_model.has_frequency_data() {
                continue;
            }

            writeln!(
                out,
                "======{}: Frequency mean: {:.4} (StdDev: ±{:.4})======",
                slot, slot_model.frequency_stats.mean, slot_model.frequency_stats.std_dev
            )?;
            writeln!(
                out,
                "====={}: Position mean: {:.4} (StdDev: ±{:.4})=====",
                slot, slot_model.position_stats.mean, slot_model.position_stats.std_dev
            )?;

            for (kind, fitted) in [("frequency", &slot_model.frequency), ("position", &slot_model.position)] {
                writeln!(
                    out,
                    "{} {}: {} distribution (fit: {:.2})",
                    slot,
                    kind,
                    fitted.params.family_name(),
                    fitted.goodness_of_fit
                )?;
                write_parameters(out, fitted)?;
            }
        }

        Ok(())
    }
}

pub fn model_summary(model: &DistributionModel) -> String {
    model.to_string()
}
