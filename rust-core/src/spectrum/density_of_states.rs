use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::errors::{Result, TbError};

/// Density of states sampled at a list of energies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosCurve {
    pub energies: Vec<f64>,
    pub values: Vec<f64>,
}

/// Equal-width histogram; `counts[b]` holds the summed weight of bin b
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosHistogram {
    /// num_bins + 1 edges from min to max
    pub bin_edges: Vec<f64>,
    pub counts: Vec<f64>,
}

impl DosHistogram {
    pub fn bin_width(&self) -> f64 {
        match self.bin_edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Histogram as a curve over bin centers
    pub fn to_curve(&self) -> DosCurve {
        DosCurve {
            energies: self.centers(),
            values: self.counts.clone(),
        }
    }
}

/// Histogram of `eigenvalues` in `num_bins` equal bins over [min, max].
///
/// The last bin includes max. If all energies coincide the range is widened
/// to [E - ½, E + ½]. Without weights every eigenvalue counts 1.
pub fn histogram(eigenvalues: &[f64], num_bins: usize, weights: Option<&[f64]>) -> Result<DosHistogram> {
    check_inputs(eigenvalues, weights)?;
    if num_bins == 0 {
        return Err(TbError::InvalidArgument("histogram needs at least one bin".to_string()));
    }

    let (mut min, mut max) = energy_range(eigenvalues);
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / num_bins as f64;

    let bin_edges: Vec<f64> = (0..=num_bins).map(|b| min + width * b as f64).collect();
    let mut counts = vec![0.0; num_bins];
    for (i, &energy) in eigenvalues.iter().enumerate() {
        let bin = (((energy - min) / width).floor() as usize).min(num_bins - 1);
        counts[bin] += weights.map_or(1.0, |w| w[i]);
    }

    Ok(DosHistogram { bin_edges, counts })
}

/// Lorentzian-broadened DOS Σᵢ wᵢ (Γ/π) / ((E − Eᵢ)² + Γ²) at `num_points`
/// energies equally spaced over [min, max]
pub fn lorentzian(
    eigenvalues: &[f64],
    num_points: usize,
    broadening: f64,
    weights: Option<&[f64]>,
) -> Result<DosCurve> {
    check_inputs(eigenvalues, weights)?;
    if !(broadening > 0.0 && broadening.is_finite()) {
        return Err(TbError::InvalidArgument(format!(
            "broadening must be positive, got {}",
            broadening
        )));
    }
    if num_points == 0 {
        return Err(TbError::InvalidArgument(
            "broadened DOS needs at least one energy point".to_string(),
        ));
    }

    let (min, max) = energy_range(eigenvalues);
    let energies: Vec<f64> = if num_points == 1 {
        vec![0.5 * (min + max)]
    } else {
        let step = (max - min) / (num_points - 1) as f64;
        (0..num_points).map(|i| min + step * i as f64).collect()
    };

    let gamma_sq = broadening * broadening;
    let values = energies
        .iter()
        .map(|&energy| {
            eigenvalues
                .iter()
                .enumerate()
                .map(|(i, &e_i)| {
                    let w = weights.map_or(1.0, |w| w[i]);
                    w * (broadening / PI) / ((energy - e_i).powi(2) + gamma_sq)
                })
                .sum::<f64>()
        })
        .collect();

    Ok(DosCurve { energies, values })
}

fn check_inputs(eigenvalues: &[f64], weights: Option<&[f64]>) -> Result<()> {
    if eigenvalues.is_empty() {
        return Err(TbError::InvalidArgument("no eigenvalues to bin".to_string()));
    }
    if eigenvalues.iter().any(|e| !e.is_finite()) {
        return Err(TbError::InvalidArgument("eigenvalues must be finite".to_string()));
    }
    if let Some(w) = weights {
        if w.len() != eigenvalues.len() {
            return Err(TbError::DimensionMismatch(format!(
                "{} weights for {} eigenvalues",
                w.len(),
                eigenvalues.len()
            )));
        }
    }
    Ok(())
}

fn energy_range(eigenvalues: &[f64]) -> (f64, f64) {
    eigenvalues
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| (lo.min(e), hi.max(e)))
}
