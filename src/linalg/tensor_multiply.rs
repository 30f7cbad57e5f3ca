use crate::element::Element;
use crate::error::*;
use crate::tensor::*;

use ndarray::*;

impl<T: Element> Tensor<T> {
    /// Moves `axis` to the front and flattens the remaining axes, in their
    /// original order, into the column dimension.
    pub fn matricize(&self, axis: usize) -> Result<Array2<T>> {
        if axis >= self.rank() {
            return Err(TenChainError::ShapeMismatch("Tensor::matricize"));
        }
        let mut order = vec![axis];
        order.extend((0..self.rank()).filter(|&a| a != axis));
        self.permuted(&order)?.as_matrix(1)
    }

    /// Contracts the columns of `mat` (`k x d`) against `axis` of `self`
    /// (size `d`). The result has size `k` along `axis`; all other axes keep
    /// their positions.
    pub fn mode_product(&self, mat: &Array2<T>, axis: usize) -> Result<Tensor<T>> {
        if axis >= self.rank() || mat.ncols() != self.shape()[axis] {
            return Err(TenChainError::ShapeMismatch("Tensor::mode_product"));
        }
        let product = mat.dot(&self.matricize(axis)?);
        let mut shape = vec![mat.nrows()];
        shape.extend(
            self.shape()
                .iter()
                .enumerate()
                .filter(|&(a, _)| a != axis)
                .map(|(_, &d)| d),
        );
        // the product carries the new axis in front; move it back into place
        let mut order = (1..self.rank()).collect::<Vec<_>>();
        order.insert(axis, 0);
        Tensor::from_matrix(product, &shape)?.permuted(&order)
    }

    /// General axis contraction: sums over `axes_self[i]` of `self` paired
    /// with `axes_other[i]` of `other`. The result's axes are the free axes of
    /// `self` followed by the free axes of `other`, each in original order.
    pub fn contract(
        &self,
        other: &Tensor<T>,
        axes_self: &[usize],
        axes_other: &[usize],
    ) -> Result<Tensor<T>> {
        if axes_self.len() != axes_other.len() {
            return Err(TenChainError::ShapeMismatch("Tensor::contract"));
        }
        for (&a, &b) in axes_self.iter().zip(axes_other) {
            if a >= self.rank() || b >= other.rank() || self.shape()[a] != other.shape()[b] {
                return Err(TenChainError::ShapeMismatch("Tensor::contract"));
            }
        }
        let free_self = (0..self.rank())
            .filter(|a| !axes_self.contains(a))
            .collect::<Vec<_>>();
        let free_other = (0..other.rank())
            .filter(|a| !axes_other.contains(a))
            .collect::<Vec<_>>();

        let mut my_inds_order = free_self.clone();
        my_inds_order.extend_from_slice(axes_self);
        let mut other_inds_order = axes_other.to_vec();
        other_inds_order.extend_from_slice(&free_other);

        // permuted() rejects repeated axes, which covers duplicate pairs
        let my_data = self.permuted(&my_inds_order)?.as_matrix(free_self.len())?;
        let other_data = other
            .permuted(&other_inds_order)?
            .as_matrix(axes_other.len())?;
        let result_data = my_data.dot(&other_data);

        let mut shape = free_self
            .iter()
            .map(|&a| self.shape()[a])
            .collect::<Vec<_>>();
        shape.extend(free_other.iter().map(|&a| other.shape()[a]));
        Tensor::from_matrix(result_data, &shape)
    }

    /// Merges two neighbouring site tensors `(p0, l, m)` and `(p1, m, r)` into
    /// one `(p0 * p1, l, r)` tensor; `p0` varies slowest in the merged
    /// physical index.
    pub fn merge_pair(&self, next: &Tensor<T>) -> Result<Tensor<T>> {
        if self.rank() != 3 || next.rank() != 3 || self.shape()[2] != next.shape()[1] {
            return Err(TenChainError::ShapeMismatch("Tensor::merge_pair"));
        }
        let (p0, l) = (self.shape()[0], self.shape()[1]);
        let (p1, r) = (next.shape()[0], next.shape()[2]);
        self.contract(next, &[2], &[1])?
            .permuted(&[0, 2, 1, 3])?
            .reshaped(&[p0 * p1, l, r])
    }

    /// Sums the diagonal of axes `a` and `b` (which must have equal size); the
    /// remaining axes keep their order.
    pub fn trace_axes(&self, a: usize, b: usize) -> Result<Tensor<T>> {
        if a == b || a >= self.rank() || b >= self.rank() || self.shape()[a] != self.shape()[b] {
            return Err(TenChainError::ShapeMismatch("Tensor::trace_axes"));
        }
        let d = self.shape()[a];
        let rest = (0..self.rank())
            .filter(|&x| x != a && x != b)
            .collect::<Vec<_>>();
        let rest_shape = rest.iter().map(|&x| self.shape()[x]).collect::<Vec<_>>();
        let mut order = rest;
        order.push(a);
        order.push(b);
        let grouped = self
            .permuted(&order)?
            .as_matrix(order.len() - 2)?
            .into_shape((self.len() / (d * d).max(1), d, d))?;
        let traced = Array1::from_shape_fn(grouped.dim().0, |i| {
            (0..d).fold(T::zero(), |acc, k| acc + grouped[[i, k, k]])
        });
        Tensor::from_array(traced).reshaped(&rest_shape)
    }
}
