//! Feature Scaler - zero mean / unit variance per column
//!
//! Two ways of scaling a batch:
//! - `StandardScaler::fit_transform` fits statistics on the batch itself and
//!   throws them away afterwards, so a row's scaled value depends on the rows
//!   it is scored with.
//! - `StandardScaler::transform` reuses statistics persisted with the model.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::error::ScoringError;

/// Columns with a std below this are left unscaled (scale 1.0)
const ZERO_SCALE_EPSILON: f64 = 10.0 * f64::EPSILON;

/// Fitted per-column statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub n_samples: usize,
}

impl ScalerStats {
    /// Population mean and std (ddof = 0) of each column
    pub fn fit(matrix: &Array2<f64>) -> Result<Self, ScoringError> {
        let mean = matrix.mean_axis(Axis(0)).ok_or(ScoringError::EmptyBatch)?;
        let scale = matrix.var_axis(Axis(0), 0.0).mapv(|var| {
            let std = var.sqrt();
            if std < ZERO_SCALE_EPSILON { 1.0 } else { std }
        });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
            n_samples: matrix.nrows(),
        })
    }

    pub fn transform(&self, matrix: &Array2<f64>) -> Result<Array2<f64>, ScoringError> {
        if matrix.nrows() == 0 {
            return Err(ScoringError::EmptyBatch);
        }
        if matrix.ncols() != self.mean.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.mean.len(),
                actual: matrix.ncols(),
            });
        }

        let mean = Array1::from(self.mean.clone());
        let scale = Array1::from(self.scale.clone());
        Ok((matrix - &mean) / &scale)
    }
}

/// Standard scaler, optionally carrying fitted statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub stats: Option<ScalerStats>,
}

impl StandardScaler {
    /// Unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fitted(stats: ScalerStats) -> Self {
        Self { stats: Some(stats) }
    }

    pub fn is_fitted(&self) -> bool {
        self.stats.is_some()
    }

    /// Fit and keep the statistics (offline fitting)
    pub fn fit(&mut self, matrix: &Array2<f64>) -> Result<(), ScoringError> {
        self.stats = Some(ScalerStats::fit(matrix)?);
        Ok(())
    }

    /// Fit on `matrix` itself and rescale it; statistics are discarded
    pub fn fit_transform(matrix: &Array2<f64>) -> Result<Array2<f64>, ScoringError> {
        ScalerStats::fit(matrix)?.transform(matrix)
    }

    /// Rescale with the persisted statistics
    pub fn transform(&self, matrix: &Array2<f64>) -> Result<Array2<f64>, ScoringError> {
        self.stats
            .as_ref()
            .ok_or(ScoringError::ScalerNotFitted)?
            .transform(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_zero_mean_unit_variance() {
        let matrix = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaled = StandardScaler::fit_transform(&matrix).unwrap();

        for column in scaled.columns() {
            let mean = column.sum() / column.len() as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / column.len() as f64;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let matrix = array![[5.0, 0.0], [7.0, 0.0]];
        let stats = ScalerStats::fit(&matrix).unwrap();
        assert_eq!(stats.scale[1], 1.0);

        let scaled = stats.transform(&matrix).unwrap();
        assert_eq!(scaled[[0, 1]], 0.0);
        assert_eq!(scaled[[1, 1]], 0.0);
    }

    #[test]
    fn test_single_row_scales_to_zeros() {
        let matrix = array![[5000.0, 12.0, 3.0, 999.0]];
        let scaled = StandardScaler::fit_transform(&matrix).unwrap();
        assert!(scaled.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_batch_relative_scaling() {
        // Same row, different companions, different scaled value
        let alone = StandardScaler::fit_transform(&array![[10.0], [20.0]]).unwrap();
        let crowd = StandardScaler::fit_transform(&array![[10.0], [20.0], [1000.0]]).unwrap();
        assert_ne!(alone[[0, 0]], crowd[[0, 0]]);
    }

    #[test]
    fn test_transform_errors() {
        let unfitted = StandardScaler::new();
        assert!(matches!(
            unfitted.transform(&array![[1.0]]),
            Err(ScoringError::ScalerNotFitted)
        ));

        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0, 2.0, 3.0]]),
            Err(ScoringError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let empty = Array2::<f64>::zeros((0, 4));
        assert!(matches!(StandardScaler::fit_transform(&empty), Err(ScoringError::EmptyBatch)));
    }
}
