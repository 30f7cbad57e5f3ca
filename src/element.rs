use ndarray_linalg::{c32, c64, Lapack, Scalar};
use rand::Rng;

/// Numeric entry type shared by every tensor, chain and decomposition in the
/// crate.
///
/// Real and complex chains run through the same code: [`Scalar::conj`] is the
/// identity for `f32`/`f64`, so conjugate transposes reduce to plain
/// transposes without any runtime branching.
pub trait Element: Scalar + Lapack {
    /// Draws one entry uniformly from [-1, 1); complex types draw the real and
    /// imaginary parts independently.
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

impl Element for f32 {
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.gen_range(-1.0..1.0)
    }
}

impl Element for f64 {
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.gen_range(-1.0..1.0)
    }
}

impl Element for c32 {
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        c32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    }
}

impl Element for c64 {
    fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        c64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    }
}
