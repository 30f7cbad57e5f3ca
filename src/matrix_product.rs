//! One-dimensional tensor networks: matrix product states and operators.
//!
//! Site tensors keep their physical axes first and their two virtual bonds
//! last, `(physical.., left, right)`. Chains are plain owned vectors;
//! canonicalization and gate application rewrite neighbouring slots in place,
//! so a chain must not be shared with another thread while such a call runs.

pub mod canonical;
pub mod gates;
pub mod mpo;
pub mod mps;
pub mod operators;

use crate::element::Element;
use crate::error::*;
use crate::tensor::*;

pub trait TensorTrain<T: Element> {
    /// Rank of each site tensor in this kind of chain.
    const SITE_RANK: usize;

    fn get_tensors(&self) -> &[Tensor<T>];

    fn len(&self) -> usize {
        self.get_tensors().len()
    }

    fn is_empty(&self) -> bool {
        self.get_tensors().is_empty()
    }

    /// Physical dimensions of one site (every axis but the two bonds).
    fn site_physical_dims(&self, site: usize) -> &[usize] {
        &self.get_tensors()[site].shape()[..Self::SITE_RANK - 2]
    }

    /// `[D_0, D_1, .., D_L]`: the left bond of every site followed by the
    /// trailing bond of the last one.
    fn bond_dims(&self) -> Vec<usize> {
        let tensors = self.get_tensors();
        let mut dims = tensors
            .iter()
            .map(|t| t.shape()[Self::SITE_RANK - 2])
            .collect::<Vec<_>>();
        if let Some(last) = tensors.last() {
            dims.push(last.shape()[Self::SITE_RANK - 1]);
        }
        dims
    }

    fn max_bond_dim(&self) -> usize {
        self.bond_dims().into_iter().max().unwrap_or(0)
    }
}

/// Checks rank, bond adjacency and boundary agreement of a chain.
///
/// Open chains carry unit boundary bonds; periodic ones carry equal leading
/// and trailing bonds.
pub(crate) fn validate_chain<T: Element>(
    tensors: &[Tensor<T>],
    site_rank: usize,
    caller: &'static str,
) -> Result<()> {
    if tensors.is_empty() {
        return Err(TenChainError::ShapeMismatch(caller));
    }
    if tensors.iter().any(|t| t.rank() != site_rank) {
        return Err(TenChainError::ShapeMismatch(caller));
    }
    let left = site_rank - 2;
    let right = site_rank - 1;
    for (a, b) in tensors.iter().zip(tensors.iter().skip(1)) {
        if a.shape()[right] != b.shape()[left] {
            return Err(TenChainError::ShapeMismatch(caller));
        }
    }
    let first = &tensors[0];
    let last = &tensors[tensors.len() - 1];
    if first.shape()[left] != last.shape()[right] {
        return Err(TenChainError::ShapeMismatch(caller));
    }
    Ok(())
}
