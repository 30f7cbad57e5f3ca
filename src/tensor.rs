use crate::element::Element;
use crate::error::*;

use ndarray::*;
use ndarray_linalg::Scalar;
use num::Zero;
use rand::Rng;

/// Dense N-dimensional array with positional axes, stored in row-major order.
///
/// Every flattening in the crate (matricization, pair merging, full-tensor
/// reconstruction) follows this order: the leftmost axis varies slowest.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T: Element> {
    pub data: ArrayD<T>,
}

impl<T: Element> Tensor<T> {
    pub fn zeros(shape: &[usize]) -> Tensor<T> {
        Tensor {
            data: ArrayD::<T>::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Tensor<T> {
        Tensor {
            data: ArrayD::<T>::ones(IxDyn(shape)),
        }
    }

    pub fn from_array<D: Dimension>(data: Array<T, D>) -> Tensor<T> {
        Tensor {
            data: data.into_dyn(),
        }
    }

    /// Tensor of the given shape filled with [`Element::sample`] draws.
    pub fn random<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Tensor<T> {
        Tensor {
            data: ArrayD::from_shape_fn(IxDyn(shape), |_| T::sample(rng)),
        }
    }

    pub fn with_data(mut self, dat: &[T]) -> Result<Tensor<T>> {
        if dat.len() == self.data.len() {
            let tmp = Array::<T, Ix1>::from_iter(dat.iter().cloned());
            self.data = tmp.into_shape(self.data.shape())?;
            Ok(self)
        } else {
            Err(TenChainError::ShapeMismatch("Tensor::with_data"))
        }
    }

    pub fn with_data_from_iter(mut self, dat: impl IntoIterator<Item = T>) -> Result<Tensor<T>> {
        let tmp = Array::<T, Ix1>::from_iter(dat);
        self.data = tmp.into_shape(self.data.shape())?;
        Ok(self)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reorders the axes: axis `i` of the result is axis `axes[i]` of `self`.
    /// The result is always in standard layout.
    pub fn permuted(&self, axes: &[usize]) -> Result<Tensor<T>> {
        let rank = self.rank();
        let mut seen = vec![false; rank];
        if axes.len() != rank {
            return Err(TenChainError::ShapeMismatch("Tensor::permuted"));
        }
        for &axis in axes {
            if axis >= rank || seen[axis] {
                return Err(TenChainError::ShapeMismatch("Tensor::permuted"));
            }
            seen[axis] = true;
        }
        let view = self.data.view().permuted_axes(axes.to_vec());
        Ok(Tensor {
            data: view.as_standard_layout().into_owned(),
        })
    }

    /// Row-major reshape; the number of elements must be unchanged.
    pub fn reshaped(&self, shape: &[usize]) -> Result<Tensor<T>> {
        if shape.iter().product::<usize>() != self.len() {
            return Err(TenChainError::ShapeMismatch("Tensor::reshaped"));
        }
        let flat = Array::from_iter(self.data.iter().cloned());
        Ok(Tensor {
            data: flat.into_shape(IxDyn(shape))?,
        })
    }

    /// Groups the first `split` axes into rows and the remaining axes into
    /// columns.
    pub fn as_matrix(&self, split: usize) -> Result<Array2<T>> {
        if split > self.rank() {
            return Err(TenChainError::ShapeMismatch("Tensor::as_matrix"));
        }
        let rows = self.shape()[..split].iter().product::<usize>();
        let cols = self.shape()[split..].iter().product::<usize>();
        let flat = Array::from_iter(self.data.iter().cloned());
        Ok(flat.into_shape((rows, cols))?)
    }

    pub fn from_matrix(mat: Array2<T>, shape: &[usize]) -> Result<Tensor<T>> {
        if shape.iter().product::<usize>() != mat.len() {
            return Err(TenChainError::ShapeMismatch("Tensor::from_matrix"));
        }
        let flat = Array::from_iter(mat.iter().cloned());
        Ok(Tensor {
            data: flat.into_shape(IxDyn(shape))?,
        })
    }

    pub fn conj(&self) -> Tensor<T> {
        Tensor {
            data: self.data.mapv(|x| x.conj()),
        }
    }

    pub fn scaled(mut self, factor: T) -> Tensor<T> {
        self.data.mapv_inplace(|x| x * factor);
        self
    }

    /// Frobenius norm.
    pub fn norm(&self) -> T::Real {
        let sq = self
            .data
            .iter()
            .fold(T::Real::zero(), |acc, x| acc + x.square());
        Scalar::sqrt(sq)
    }

    pub fn max_abs(&self) -> T::Real {
        self.data.iter().fold(T::Real::zero(), |acc, x| {
            let a = x.abs();
            if a > acc {
                a
            } else {
                acc
            }
        })
    }

    /// Value of a tensor holding exactly one element, whatever its rank.
    pub fn as_scalar(&self) -> Result<T> {
        if self.len() == 1 {
            self.data
                .iter()
                .next()
                .copied()
                .ok_or(TenChainError::ShapeMismatch("Tensor::as_scalar"))
        } else {
            Err(TenChainError::ShapeMismatch("Tensor::as_scalar"))
        }
    }
}

impl<T: Element> std::ops::Index<&[usize]> for Tensor<T> {
    type Output = T;

    fn index(&self, inds: &[usize]) -> &Self::Output {
        if inds.len() != self.rank() {
            panic!(
                "The number of indices provided, {}, does not match the rank of the tensor, {}.",
                inds.len(),
                self.rank()
            );
        }
        &self.data[inds]
    }
}

impl<T: Element> std::ops::IndexMut<&[usize]> for Tensor<T> {
    fn index_mut(&mut self, inds: &[usize]) -> &mut Self::Output {
        if inds.len() != self.rank() {
            panic!(
                "The number of indices provided, {}, does not match the rank of the tensor, {}.",
                inds.len(),
                self.rank()
            );
        }
        &mut self.data[inds]
    }
}
