use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point on the complex plane as two `f64` components.
///
/// Serialized as `{"real": .., "imag": ..}` so it matches the render request
/// wire format.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    #[serde(rename = "real")]
    pub re: f64,
    #[serde(rename = "imag")]
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns `re² + im²` without taking the square root.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// One step of the quadratic recurrence: `self² + addend`.
    ///
    /// Both output components are computed from the same input pair.
    #[inline]
    pub fn square_add(self, addend: Self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im + addend.re,
            im: 2.0 * self.re * self.im + addend.im,
        }
    }
}

impl Add for Complex {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{} + {}i", self.re, self.im)
        } else {
            write!(f, "{} - {}i", self.re, -self.im)
        }
    }
}
