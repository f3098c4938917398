//! Audio sample value type.
//!
//! A `Sample` wraps a single amplitude. Equality is tolerance based so that
//! values produced by slightly different arithmetic paths still compare equal.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Absolute tolerance used when comparing two samples.
pub const SAMPLE_TOLERANCE: f64 = 1e-8;

/// One audio amplitude, nominally in [-1, 1] (not enforced).
///
/// Two samples are equal iff `|a - b| <= SAMPLE_TOLERANCE`. This relation is
/// not transitive, so `Sample` deliberately implements neither `Eq` nor `Hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sample(f64);

impl Sample {
    /// Silence.
    pub const ZERO: Sample = Sample(0.0);

    /// Wraps a raw amplitude.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Returns the raw amplitude.
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Narrows the amplitude for output devices that take `f32`.
    pub fn to_f32(self) -> f32 {
        self.0 as f32
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Sample> for f64 {
    fn from(sample: Sample) -> Self {
        sample.0
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        (self.0 - other.0).abs() <= SAMPLE_TOLERANCE
    }
}

impl Add for Sample {
    type Output = Sample;

    fn add(self, rhs: Sample) -> Sample {
        Sample(self.0 + rhs.0)
    }
}

impl AddAssign for Sample {
    fn add_assign(&mut self, rhs: Sample) {
        self.0 += rhs.0;
    }
}

impl Sub for Sample {
    type Output = Sample;

    fn sub(self, rhs: Sample) -> Sample {
        Sample(self.0 - rhs.0)
    }
}

impl Neg for Sample {
    type Output = Sample;

    fn neg(self) -> Sample {
        Sample(-self.0)
    }
}

impl Mul<f64> for Sample {
    type Output = Sample;

    fn mul(self, rhs: f64) -> Sample {
        Sample(self.0 * rhs)
    }
}

impl Div<f64> for Sample {
    type Output = Sample;

    fn div(self, rhs: f64) -> Sample {
        Sample(self.0 / rhs)
    }
}

impl Sum for Sample {
    fn sum<I: Iterator<Item = Sample>>(iter: I) -> Sample {
        iter.fold(Sample::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_equality() {
        assert_eq!(Sample::new(1.0), Sample::new(1.0 + 1e-9));
        assert_ne!(Sample::new(1.0), Sample::new(1.0 + 1e-6));
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        assert_eq!(Sample::new(0.0), Sample::new(0.5e-8));
        assert_ne!(Sample::new(0.0), Sample::new(2e-8));
    }

    #[test]
    fn test_conversions() {
        let sample: Sample = 0.25.into();
        let raw: f64 = sample.into();
        assert_eq!(raw, 0.25);
        assert_eq!(sample.to_f32(), 0.25f32);
        assert_eq!(Sample::default(), Sample::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let a = Sample::new(0.05);
        let b = Sample::new(-0.05);
        assert_eq!(a + b, Sample::ZERO);
        assert_eq!(a - b, Sample::new(0.1));
        assert_eq!(-a, b);
        assert_eq!((a + a) / 2.0 * 0.995, Sample::new(0.04975));

        let mut total = Sample::ZERO;
        total += a;
        total += a;
        assert_eq!(total, Sample::new(0.1));

        let summed: Sample = [a, a, b].into_iter().sum();
        assert_eq!(summed, a);
    }
}
