use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Squared bailout radius: an orbit has escaped once `|z|² > 4`, i.e. `|z| > 2`.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Parameters controlling fractal iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Iteration cap. A result equal to this value means the orbit never
    /// escaped and the point is treated as a set member.
    pub max_iterations: u32,
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

    pub fn new(max_iterations: u32) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        Ok(Self { max_iterations })
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Which quadratic recurrence to iterate.
///
/// Both use `z_{k+1} = z_k² + a`. They differ in the seed and the addend:
///
/// | Variant      | `z₀`        | `a`             |
/// |--------------|-------------|-----------------|
/// | `Mandelbrot` | `0`         | the pixel point |
/// | `Julia`      | pixel point | the constant    |
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FractalVariant {
    #[default]
    Mandelbrot,
    Julia { c: Complex },
}

impl FractalVariant {
    /// A visually interesting default: `c = -0.7 + 0.27015i`.
    pub const DEFAULT_JULIA_C: Complex = Complex {
        re: -0.7,
        im: 0.27015,
    };

    /// Julia variant with the default constant.
    pub fn default_julia() -> Self {
        Self::Julia {
            c: Self::DEFAULT_JULIA_C,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mandelbrot => "Mandelbrot",
            Self::Julia { .. } => "Julia",
        }
    }

    /// The Julia constant, if this is a Julia variant.
    pub fn julia_c(&self) -> Option<Complex> {
        match self {
            Self::Mandelbrot => None,
            Self::Julia { c } => Some(*c),
        }
    }

    /// Iterate a single mapped point. See [`evaluate`].
    #[inline]
    pub fn evaluate(&self, point: Complex, params: &FractalParams) -> u32 {
        evaluate(point, params.max_iterations, *self)
    }
}

/// Escape-time count for `c` under `variant`.
///
/// Returns the 0-based index of the update after which `|z|² > 4` was first
/// observed, or `max_iterations` when the orbit stays bounded for that many
/// updates. Always terminates within `max_iterations` steps.
#[inline]
pub fn evaluate(c: Complex, max_iterations: u32, variant: FractalVariant) -> u32 {
    let (mut z, addend) = match variant {
        FractalVariant::Mandelbrot => (Complex::ZERO, c),
        FractalVariant::Julia { c: k } => (c, k),
    };

    for n in 0..max_iterations {
        z = z.square_add(addend);
        if z.norm_sq() > ESCAPE_RADIUS_SQ {
            return n;
        }
    }

    max_iterations
}
