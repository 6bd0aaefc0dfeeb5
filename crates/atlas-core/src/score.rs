//! Distance and score values.
//!
//! The nearest-neighbor store reports a [`Distance`] where smaller means a
//! closer match. Flat-list consumers want a [`Score`] where larger is better.
//! The only way to obtain a score from a distance is [`Score::from`], which
//! negates the value: `d1 < d2` iff `Score::from(d1) > Score::from(d2)`.
//!
//! Both types order with `f64::total_cmp`, so sorting never panics on NaN.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Non-negative query/chunk distance, smaller is more relevant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    /// Negative inputs clamp to zero. NaN becomes `+inf`, so a corrupt
    /// distance always ranks last.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(f64::INFINITY)
        } else if value < 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    pub fn value(self) -> f64 { self.0 }

    pub fn total_cmp(&self, other: &Self) -> Ordering { self.0.total_cmp(&other.0) }

    /// Arithmetic mean, `None` for an empty input.
    pub fn mean<I: IntoIterator<Item = Distance>>(values: I) -> Option<Distance> {
        let (sum, n) = values.into_iter().fold((0.0f64, 0usize), |(s, n), d| (s + d.0, n + 1));
        if n == 0 { None } else { Some(Distance(sum / n as f64)) }
    }
}

impl From<f32> for Distance {
    fn from(v: f32) -> Self { Self::new(f64::from(v)) }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.4}", self.0) }
}

/// Ranking score for flat hit lists, higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub fn value(self) -> f64 { self.0 }

    pub fn total_cmp(&self, other: &Self) -> Ordering { self.0.total_cmp(&other.0) }
}

impl From<Distance> for Score {
    fn from(d: Distance) -> Self { Score(-d.0) }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.4}", self.0) }
}
