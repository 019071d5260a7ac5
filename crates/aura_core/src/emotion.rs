//! Emotion vector model.
//!
//! The agent's affective state is a fixed, ordered set of named dimensions
//! mapped to integers. Two numeric regimes exist across deployments:
//! bounded-independent (each axis clamped to a closed interval) and simplex
//! (non-negative values sharing a fixed budget). The wire format is a
//! comma-separated integer list in dimension order; parsing is strict —
//! a malformed reading is rejected whole, never partially applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric constraint governing a dimension set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Regime {
    /// Each dimension independently clamped to `[min, max]`.
    Bounded { min: i32, max: i32 },
    /// All dimensions non-negative, summing exactly to `total`.
    Simplex { total: i32 },
}

/// The configured dimension set: names, regime, and the two reference
/// vectors (homeostatic baseline and first-contact initial state).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSpace {
    pub dimensions: Vec<String>,
    pub regime: Regime,
    pub baseline: Vec<i32>,
    pub initial: Vec<i32>,
}

#[derive(Debug, Error)]
pub enum EmotionSpaceError {
    #[error("emotion space has no dimensions")]
    Empty,
    #[error("{which} vector has {got} values, expected {expected}")]
    Arity {
        which: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{which} vector violates the {regime:?} regime")]
    Invalid { which: &'static str, regime: Regime },
}

impl EmotionSpace {
    /// The canonical deployment: four bipolar axes in [-100, 100],
    /// resting at neutral zero.
    pub fn bipolar() -> Self {
        Self {
            dimensions: vec![
                "Sadness_Joy".to_string(),
                "Disgust_Trust".to_string(),
                "Fear_Anger".to_string(),
                "Anticipation_Surprise".to_string(),
            ],
            regime: Regime::Bounded {
                min: -100,
                max: 100,
            },
            baseline: vec![0, 0, 0, 0],
            initial: vec![0, 0, 0, 0],
        }
    }

    /// The historical six-category deployment: proportions of a fixed
    /// emotional budget of 100.
    pub fn simplex() -> Self {
        Self {
            dimensions: vec![
                "Happiness".to_string(),
                "Sadness".to_string(),
                "Fear".to_string(),
                "Anger".to_string(),
                "Disgust".to_string(),
                "Surprise".to_string(),
            ],
            regime: Regime::Simplex { total: 100 },
            baseline: vec![50, 10, 10, 5, 5, 20],
            initial: vec![50, 10, 10, 5, 5, 20],
        }
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Check internal consistency. Called once at config load so a broken
    /// space fails at startup, not mid-conversation.
    pub fn validate(&self) -> Result<(), EmotionSpaceError> {
        if self.dimensions.is_empty() {
            return Err(EmotionSpaceError::Empty);
        }
        for (which, v) in [("baseline", &self.baseline), ("initial", &self.initial)] {
            if v.len() != self.dimensions.len() {
                return Err(EmotionSpaceError::Arity {
                    which,
                    expected: self.dimensions.len(),
                    got: v.len(),
                });
            }
            if !self.regime.holds_for(v) {
                return Err(EmotionSpaceError::Invalid {
                    which,
                    regime: self.regime,
                });
            }
        }
        Ok(())
    }

    pub fn baseline_vector(&self) -> EmotionVector {
        EmotionVector {
            values: self.baseline.clone(),
        }
    }

    pub fn initial_vector(&self) -> EmotionVector {
        EmotionVector {
            values: self.initial.clone(),
        }
    }

    /// Dimension names joined for prompt injection ("A, B, C").
    pub fn dimension_list(&self) -> String {
        self.dimensions.join(", ")
    }
}

impl Regime {
    /// Does `values` satisfy this regime's invariant?
    pub fn holds_for(&self, values: &[i32]) -> bool {
        match *self {
            Regime::Bounded { min, max } => values.iter().all(|&v| v >= min && v <= max),
            Regime::Simplex { total } => {
                values.iter().all(|&v| v >= 0)
                    && values.iter().map(|&v| v as i64).sum::<i64>() == total as i64
            }
        }
    }

    /// Clamp a float working vector in place. Used by the drift engine,
    /// which advances state in f64 between integer snapshots.
    pub fn clamp_floats(&self, values: &mut [f64]) {
        match *self {
            Regime::Bounded { min, max } => {
                for v in values.iter_mut() {
                    *v = v.clamp(min as f64, max as f64);
                }
            }
            Regime::Simplex { total } => {
                for v in values.iter_mut() {
                    if !v.is_finite() || *v < 0.0 {
                        *v = 0.0;
                    }
                }
                let sum: f64 = values.iter().sum();
                if sum > 0.0 {
                    let scale = total as f64 / sum;
                    for v in values.iter_mut() {
                        *v *= scale;
                    }
                }
                // An all-zero float vector is left as-is here; the integer
                // snapshot resolves it to the configured initial state.
            }
        }
    }
}

/// Strict-parse failure. The caller must fall back to its previous vector;
/// a malformed reading is never guessed at or partially applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmotionParseError {
    #[error("expected {expected} values, got {got}")]
    Arity { expected: usize, got: usize },
    #[error("token {token:?} is not an integer")]
    NotAnInteger { token: String },
    #[error("value {value} at position {index} is outside the configured range")]
    OutOfRange { index: usize, value: i32 },
    #[error("values sum to {sum}, expected {expected}")]
    BadSum { sum: i64, expected: i32 },
}

/// One affective reading: an ordered integer per configured dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionVector {
    values: Vec<i32>,
}

impl EmotionVector {
    /// Build from raw values, enforcing arity and the regime invariant.
    pub fn from_values(values: Vec<i32>, space: &EmotionSpace) -> Result<Self, EmotionParseError> {
        if values.len() != space.len() {
            return Err(EmotionParseError::Arity {
                expected: space.len(),
                got: values.len(),
            });
        }
        let mut v = Self { values };
        v.clamp(space);
        Ok(v)
    }

    /// Build from a float working vector, rounding half away from zero,
    /// then enforcing the regime invariant.
    pub fn from_floats(values: &[f64], space: &EmotionSpace) -> Self {
        let ints: Vec<i32> = values.iter().map(|v| v.round() as i32).collect();
        let mut v = Self { values: ints };
        v.clamp(space);
        v
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn as_floats(&self) -> Vec<f64> {
        self.values.iter().map(|&v| v as f64).collect()
    }

    /// The persisted/prompt wire format: comma-separated integers in
    /// dimension order.
    pub fn format(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse a final emotion reading. Strict: exact arity, every token an
    /// integer, and the result must already satisfy the active regime.
    pub fn parse(text: &str, space: &EmotionSpace) -> Result<Self, EmotionParseError> {
        let values = tokenize(text, space)?;
        match space.regime {
            Regime::Bounded { min, max } => {
                for (index, &value) in values.iter().enumerate() {
                    if value < min || value > max {
                        return Err(EmotionParseError::OutOfRange { index, value });
                    }
                }
            }
            Regime::Simplex { total } => {
                for (index, &value) in values.iter().enumerate() {
                    if value < 0 {
                        return Err(EmotionParseError::OutOfRange { index, value });
                    }
                }
                let sum: i64 = values.iter().map(|&v| v as i64).sum();
                if sum != total as i64 {
                    return Err(EmotionParseError::BadSum {
                        sum,
                        expected: total,
                    });
                }
            }
        }
        Ok(Self { values })
    }

    /// Parse a signed delta list. Same tokenisation as `parse` but with no
    /// range constraint — deltas may be negative even in simplex mode.
    pub fn parse_deltas(text: &str, space: &EmotionSpace) -> Result<Vec<i32>, EmotionParseError> {
        tokenize(text, space)
    }

    /// Enforce the active regime's invariant in place.
    ///
    /// Bounded: independent per-axis clamp, no redistribution.
    /// Simplex: floor negatives at 0, rescale proportionally to the total,
    /// and settle the rounding residual on the largest dimension. A raw
    /// post-floor sum of 0 resets to the configured initial vector.
    pub fn clamp(&mut self, space: &EmotionSpace) {
        match space.regime {
            Regime::Bounded { min, max } => {
                for v in self.values.iter_mut() {
                    *v = (*v).clamp(min, max);
                }
            }
            Regime::Simplex { total } => {
                for v in self.values.iter_mut() {
                    if *v < 0 {
                        *v = 0;
                    }
                }
                let sum: i64 = self.values.iter().map(|&v| v as i64).sum();
                if sum == 0 {
                    self.values = space.initial.clone();
                    return;
                }
                if sum != total as i64 {
                    let mut scaled: Vec<i32> = self
                        .values
                        .iter()
                        .map(|&v| ((v as f64) * (total as f64) / (sum as f64)).round() as i32)
                        .collect();
                    let residual = total - scaled.iter().sum::<i32>();
                    if residual != 0 {
                        let largest = scaled
                            .iter()
                            .enumerate()
                            .max_by_key(|(_, &v)| v)
                            .map(|(i, _)| i)
                            .unwrap_or(0);
                        scaled[largest] += residual;
                        debug_assert!(scaled[largest] >= 0);
                    }
                    self.values = scaled;
                }
            }
        }
    }

    /// Apply signed per-dimension deltas, then enforce the regime.
    /// Delta arity must already match; callers get it from `parse_deltas`.
    pub fn apply_deltas(&self, deltas: &[i32], space: &EmotionSpace) -> EmotionVector {
        debug_assert_eq!(deltas.len(), self.values.len());
        let values = self
            .values
            .iter()
            .zip(deltas.iter())
            .map(|(&v, &d)| v.saturating_add(d))
            .collect();
        let mut out = Self { values };
        out.clamp(space);
        out
    }

    /// Labelled one-per-line rendering for system-prompt injection.
    pub fn describe(&self, space: &EmotionSpace) -> String {
        space
            .dimensions
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn tokenize(text: &str, space: &EmotionSpace) -> Result<Vec<i32>, EmotionParseError> {
    let parts: Vec<&str> = text.trim().split(',').collect();
    if parts.len() != space.len() {
        return Err(EmotionParseError::Arity {
            expected: space.len(),
            got: parts.len(),
        });
    }
    parts
        .iter()
        .map(|p| {
            p.trim()
                .parse::<i32>()
                .map_err(|_| EmotionParseError::NotAnInteger {
                    token: p.trim().to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spaces_validate() {
        EmotionSpace::bipolar().validate().unwrap();
        EmotionSpace::simplex().validate().unwrap();
    }

    #[test]
    fn test_parse_roundtrip() {
        let space = EmotionSpace::bipolar();
        let v = EmotionVector::from_values(vec![20, -5, 0, 10], &space).unwrap();
        let parsed = EmotionVector::parse(&v.format(), &space).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        let space = EmotionSpace::bipolar();
        assert_eq!(
            EmotionVector::parse("1,2,3", &space),
            Err(EmotionParseError::Arity {
                expected: 4,
                got: 3
            })
        );
        assert!(EmotionVector::parse("1,2,3,4,5", &space).is_err());
    }

    #[test]
    fn test_parse_rejects_non_integer() {
        let space = EmotionSpace::bipolar();
        let err = EmotionVector::parse("1,two,3,4", &space).unwrap_err();
        assert_eq!(
            err,
            EmotionParseError::NotAnInteger {
                token: "two".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        let space = EmotionSpace::bipolar();
        let err = EmotionVector::parse("150,0,0,0", &space).unwrap_err();
        assert_eq!(
            err,
            EmotionParseError::OutOfRange {
                index: 0,
                value: 150
            }
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let space = EmotionSpace::bipolar();
        let v = EmotionVector::parse(" 20, -5 , 0 ,10 ", &space).unwrap();
        assert_eq!(v.values(), &[20, -5, 0, 10]);
    }

    #[test]
    fn test_simplex_parse_requires_exact_sum() {
        let space = EmotionSpace::simplex();
        assert!(EmotionVector::parse("50,10,10,5,5,20", &space).is_ok());
        let err = EmotionVector::parse("50,10,10,5,5,21", &space).unwrap_err();
        assert_eq!(
            err,
            EmotionParseError::BadSum {
                sum: 101,
                expected: 100
            }
        );
    }

    #[test]
    fn test_bounded_clamp_no_redistribution() {
        let space = EmotionSpace::bipolar();
        let v = EmotionVector::from_values(vec![100, -100, 0, 50], &space).unwrap();
        let out = v.apply_deltas(&[30, -30, 0, 0], &space);
        assert_eq!(out.values(), &[100, -100, 0, 50]);
    }

    #[test]
    fn test_simplex_clamp_rescales_to_exact_total() {
        let space = EmotionSpace::simplex();
        let mut v = EmotionVector {
            values: vec![60, 20, 10, 5, 5, 20], // sums to 120
        };
        v.clamp(&space);
        assert_eq!(v.values().iter().sum::<i32>(), 100);
        assert!(v.values().iter().all(|&x| x >= 0));
    }

    #[test]
    fn test_simplex_clamp_floors_negatives() {
        let space = EmotionSpace::simplex();
        let mut v = EmotionVector {
            values: vec![-10, 50, 20, 10, 10, 10],
        };
        v.clamp(&space);
        assert_eq!(v.values()[0], 0);
        assert_eq!(v.values().iter().sum::<i32>(), 100);
    }

    #[test]
    fn test_simplex_zero_sum_resets_to_initial() {
        let space = EmotionSpace::simplex();
        let mut v = EmotionVector {
            values: vec![0, 0, 0, 0, 0, 0],
        };
        v.clamp(&space);
        assert_eq!(v.values(), space.initial_vector().values());
    }

    #[test]
    fn test_apply_deltas_bounded() {
        let space = EmotionSpace::bipolar();
        let v = space.initial_vector();
        let out = v.apply_deltas(&[20, -5, 0, 10], &space);
        assert_eq!(out.values(), &[20, -5, 0, 10]);
    }

    #[test]
    fn test_from_floats_rounds_half_away_from_zero() {
        let space = EmotionSpace::bipolar();
        let v = EmotionVector::from_floats(&[13.0, -3.25, 0.0, 6.5], &space);
        assert_eq!(v.values(), &[13, -3, 0, 7]);
    }

    #[test]
    fn test_describe_labels_dimensions() {
        let space = EmotionSpace::bipolar();
        let v = EmotionVector::from_values(vec![20, -5, 0, 10], &space).unwrap();
        let desc = v.describe(&space);
        assert!(desc.contains("Sadness_Joy: 20"));
        assert!(desc.contains("Fear_Anger: 0"));
    }

    #[test]
    fn test_clamp_floats_bounded() {
        let regime = Regime::Bounded {
            min: -100,
            max: 100,
        };
        let mut vals = vec![150.0, -150.0, 3.5];
        regime.clamp_floats(&mut vals);
        assert_eq!(vals, vec![100.0, -100.0, 3.5]);
    }

    #[test]
    fn test_clamp_floats_simplex_preserves_total() {
        let regime = Regime::Simplex { total: 100 };
        let mut vals = vec![60.0, 30.0, 30.0];
        regime.clamp_floats(&mut vals);
        let sum: f64 = vals.iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }
}
