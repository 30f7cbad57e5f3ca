//! Common single- and two-site operators as dense matrices in the
//! computational basis. Two-site operators act on the merged index
//! `p0 * d + p1`, first site slowest.

use crate::element::Element;

use ndarray::*;
use ndarray_linalg::c64;

pub(crate) fn lit<T: Element>(x: f64) -> T {
    T::from_real(T::real(x))
}

fn from_rows<T: Element>(rows: [[f64; 2]; 2]) -> Array2<T> {
    Array2::from_shape_fn((2, 2), |(i, j)| lit(rows[i][j]))
}

pub fn identity<T: Element>(dim: usize) -> Array2<T> {
    Array2::eye(dim)
}

pub fn pauli_x<T: Element>() -> Array2<T> {
    from_rows([[0., 1.], [1., 0.]])
}

/// Only defined for complex entries.
pub fn pauli_y() -> Array2<c64> {
    arr2(&[
        [c64::new(0., 0.), c64::new(0., -1.)],
        [c64::new(0., 1.), c64::new(0., 0.)],
    ])
}

pub fn pauli_z<T: Element>() -> Array2<T> {
    from_rows([[1., 0.], [0., -1.]])
}

pub fn hadamard<T: Element>() -> Array2<T> {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    from_rows([[h, h], [h, -h]])
}

/// Spin-1/2 raising operator `S⁺ = |0⟩⟨1|`.
pub fn spin_plus<T: Element>() -> Array2<T> {
    from_rows([[0., 1.], [0., 0.]])
}

pub fn spin_minus<T: Element>() -> Array2<T> {
    from_rows([[0., 0.], [1., 0.]])
}

/// `Sᶻ = Z / 2`.
pub fn spin_z<T: Element>() -> Array2<T> {
    from_rows([[0.5, 0.], [0., -0.5]])
}

/// Controlled NOT with the first site as control.
pub fn cnot<T: Element>() -> Array2<T> {
    let mut gate = Array2::zeros((4, 4));
    gate[[0, 0]] = T::one();
    gate[[1, 1]] = T::one();
    gate[[2, 3]] = T::one();
    gate[[3, 2]] = T::one();
    gate
}

pub fn swap<T: Element>() -> Array2<T> {
    let mut gate = Array2::zeros((4, 4));
    gate[[0, 0]] = T::one();
    gate[[1, 2]] = T::one();
    gate[[2, 1]] = T::one();
    gate[[3, 3]] = T::one();
    gate
}

/// Kronecker product `a ⊗ b`, with the row and column index of `a` varying
/// slowest.
pub fn kron<T: Element>(a: &Array2<T>, b: &Array2<T>) -> Array2<T> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(i, j)| {
        a[[i / br, j / bc]] * b[[i % br, j % bc]]
    })
}
