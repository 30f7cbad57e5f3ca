//! Matrix product states and operators, their canonical forms, and tensor
//! renormalization group coarse-graining, over dense `ndarray` tensors.

// Same expansion as `ndarray_linalg::assert_close_l2!`, whose 0.13 definition
// (`$crate::$close` with a `path` fragment) no longer parses on current rustc.
#[cfg(test)]
macro_rules! assert_close_l2 {
    ($test: expr,$truth: expr,$tol: expr) => {
        ndarray_linalg::close_l2($test, $truth, $tol);
    };
    ($test: expr,$truth: expr,$tol: expr; $comment: expr) => {
        eprintln!($comment);
        ndarray_linalg::close_l2($test, $truth, $tol);
    };
}
#[cfg(test)]
pub(crate) use assert_close_l2;

pub mod element;
pub mod error;
pub mod linalg;
pub mod matrix_product;
pub mod tensor;
pub mod trg;

pub use element::Element;
pub use error::{Result, TenChainError};
pub use linalg::singular_value::Truncation;
pub use matrix_product::canonical::{Canonical, SvDistribution};
pub use matrix_product::gates::{circuit_to_mps, Gate};
pub use matrix_product::mpo::Mpo;
pub use matrix_product::mps::Mps;
pub use matrix_product::TensorTrain;
pub use tensor::Tensor;
pub use trg::{Trg, TrgConfig};
