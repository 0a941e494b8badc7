//! Per-time-step symbol probabilities produced by the recognizer.

use crate::core::{LATTICE_ROW_SUM_TOLERANCE, OCRError, TensorD};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Ix2, Ix3};
use serde::{Deserialize, Serialize};

/// Axis order of a 3D recognition output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticeLayout {
    /// `[batch, time, classes]`, as exported by CRNN models.
    #[default]
    BatchMajor,
    /// `[time, batch, classes]`, as exported by the ocrs models.
    SequenceMajor,
}

/// How the values of a recognition output should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticeEncoding {
    /// Infer from the values: probabilities, then log-probabilities, else logits.
    #[default]
    Auto,
    Probabilities,
    LogProbabilities,
    /// Unnormalized scores; a softmax is applied per time step.
    Logits,
}

/// A `time_steps x num_classes` matrix of probabilities.
///
/// Every row sums to one within [`LATTICE_ROW_SUM_TOLERANCE`]; construction
/// fails otherwise. Class 0 is the CTC blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    probs: Array2<f32>,
}

fn lattice_error(message: impl Into<String>) -> OCRError {
    OCRError::inference_message("recognition", message)
}

fn rows_are_distributions(values: &Array2<f32>) -> bool {
    values.iter().all(|v| v.is_finite() && *v >= -LATTICE_ROW_SUM_TOLERANCE)
        && values
            .axis_iter(Axis(0))
            .all(|row| (row.sum() - 1.0).abs() <= LATTICE_ROW_SUM_TOLERANCE)
}

fn softmax_rows(mut values: Array2<f32>) -> Array2<f32> {
    for mut row in values.axis_iter_mut(Axis(0)) {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    values
}

impl Lattice {
    /// Wraps a probability matrix after checking the row invariant.
    pub fn from_probabilities(probs: Array2<f32>) -> Result<Self, OCRError> {
        if probs.ncols() == 0 {
            return Err(lattice_error("lattice must have at least one class"));
        }
        if let Some(value) = probs.iter().find(|v| !v.is_finite()) {
            return Err(lattice_error(format!(
                "lattice contains a non-finite value ({value})"
            )));
        }
        for (t, row) in probs.axis_iter(Axis(0)).enumerate() {
            let sum = row.sum();
            if (sum - 1.0).abs() > LATTICE_ROW_SUM_TOLERANCE {
                return Err(lattice_error(format!(
                    "lattice row {t} sums to {sum}, expected 1 within {LATTICE_ROW_SUM_TOLERANCE}"
                )));
            }
            if row.iter().any(|v| *v < -LATTICE_ROW_SUM_TOLERANCE) {
                return Err(lattice_error(format!(
                    "lattice row {t} contains a negative probability"
                )));
            }
        }
        Ok(Self {
            probs: probs.mapv(|v| v.max(0.0)),
        })
    }

    /// Builds a lattice from natural-log probabilities.
    pub fn from_log_probabilities(log_probs: Array2<f32>) -> Result<Self, OCRError> {
        Self::from_probabilities(log_probs.mapv(f32::exp))
    }

    /// Builds a lattice from logits by applying a softmax to each row.
    pub fn from_logits(logits: Array2<f32>) -> Result<Self, OCRError> {
        if let Some(value) = logits.iter().find(|v| !v.is_finite()) {
            return Err(lattice_error(format!(
                "logits contain a non-finite value ({value})"
            )));
        }
        Self::from_probabilities(softmax_rows(logits))
    }

    /// Builds a lattice from raw scores read according to `encoding`.
    pub fn from_scores(scores: Array2<f32>, encoding: LatticeEncoding) -> Result<Self, OCRError> {
        match encoding {
            LatticeEncoding::Probabilities => Self::from_probabilities(scores),
            LatticeEncoding::LogProbabilities => Self::from_log_probabilities(scores),
            LatticeEncoding::Logits => Self::from_logits(scores),
            LatticeEncoding::Auto => {
                if rows_are_distributions(&scores) {
                    Self::from_probabilities(scores)
                } else {
                    let exp = scores.mapv(f32::exp);
                    if scores.iter().all(|v| *v <= LATTICE_ROW_SUM_TOLERANCE)
                        && rows_are_distributions(&exp)
                    {
                        Self::from_probabilities(exp)
                    } else {
                        Self::from_logits(scores)
                    }
                }
            }
        }
    }

    /// Extracts the `time x classes` scores of the first batch item of a
    /// recognition output. 2D outputs are taken as `[time, classes]`.
    pub fn sequence_scores(output: TensorD, layout: LatticeLayout) -> Result<Array2<f32>, OCRError> {
        match output.ndim() {
            2 => Ok(output.into_dimensionality::<Ix2>()?),
            3 => {
                let output = output.into_dimensionality::<Ix3>()?;
                let batch_axis = match layout {
                    LatticeLayout::BatchMajor => Axis(0),
                    LatticeLayout::SequenceMajor => Axis(1),
                };
                if output.len_of(batch_axis) == 0 {
                    return Err(lattice_error("recognition output has an empty batch"));
                }
                Ok(output.index_axis(batch_axis, 0).to_owned())
            }
            n => Err(lattice_error(format!(
                "recognition output must be 2D or 3D, got {n}D with shape {:?}",
                output.shape()
            ))),
        }
    }

    pub fn time_steps(&self) -> usize {
        self.probs.nrows()
    }

    /// Number of classes including the blank.
    pub fn num_classes(&self) -> usize {
        self.probs.ncols()
    }

    pub fn probabilities(&self) -> ArrayView2<'_, f32> {
        self.probs.view()
    }

    pub fn row(&self, t: usize) -> ArrayView1<'_, f32> {
        self.probs.row(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use ndarray::{Array3, array};

    #[test]
    fn test_rows_must_sum_to_one() {
        let ok = Lattice::from_probabilities(array![[0.2, 0.8], [0.5, 0.5]]).unwrap();
        assert_eq!((ok.time_steps(), ok.num_classes()), (2, 2));

        let err = Lattice::from_probabilities(array![[0.2, 0.7]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);

        let err = Lattice::from_probabilities(array![[f32::NAN, 1.0]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_auto_encoding() {
        let probs = array![[0.25, 0.75]];
        let lattice = Lattice::from_scores(probs.clone(), LatticeEncoding::Auto).unwrap();
        assert_eq!(lattice.probabilities(), probs.view());

        let log = probs.mapv(f32::ln);
        let lattice = Lattice::from_scores(log, LatticeEncoding::Auto).unwrap();
        assert!((lattice.row(0)[1] - 0.75).abs() < 1e-5);

        let logits = array![[2.0, 4.0, 1.0]];
        let lattice = Lattice::from_scores(logits, LatticeEncoding::Auto).unwrap();
        assert!((lattice.row(0).sum() - 1.0).abs() < 1e-5);
        assert!(lattice.row(0)[1] > lattice.row(0)[0]);
    }

    #[test]
    fn test_sequence_scores_layouts() {
        // two time steps, one batch item, three classes
        let seq_major = Array3::from_shape_fn((2, 1, 3), |(t, _, c)| (t * 3 + c) as f32);
        let scores =
            Lattice::sequence_scores(seq_major.into_dyn(), LatticeLayout::SequenceMajor).unwrap();
        assert_eq!(scores, array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);

        let batch_major = Array3::from_shape_fn((1, 2, 3), |(_, t, c)| (t * 3 + c) as f32);
        let scores =
            Lattice::sequence_scores(batch_major.into_dyn(), LatticeLayout::BatchMajor).unwrap();
        assert_eq!(scores, array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]);

        let four_d = ndarray::Array4::<f32>::zeros((1, 1, 2, 3)).into_dyn();
        assert!(Lattice::sequence_scores(four_d, LatticeLayout::BatchMajor).is_err());
    }
}
