//! Applying gate sequences to matrix product states.

use crate::element::Element;
use crate::error::*;
use crate::linalg::singular_value::*;
use crate::matrix_product::canonical::SvDistribution;
use crate::matrix_product::mps::Mps;
use crate::matrix_product::TensorTrain;
use crate::tensor::*;

use log::debug;
use ndarray::*;

/// A local unitary (or any local linear map) acting on one site or on two
/// neighbouring sites.
#[derive(Clone, Debug)]
pub enum Gate<T: Element> {
    /// `n x n` matrix on `site`.
    Single { site: usize, matrix: Array2<T> },
    /// `n0 n1 x n0 n1` matrix on `site` and `site + 1`, first site slowest.
    Pair { site: usize, matrix: Array2<T> },
}

impl<T: Element> Gate<T> {
    pub fn single(site: usize, matrix: Array2<T>) -> Gate<T> {
        Gate::Single { site, matrix }
    }

    pub fn pair(site: usize, matrix: Array2<T>) -> Gate<T> {
        Gate::Pair { site, matrix }
    }
}

impl<T: Element> Mps<T> {
    pub fn apply_single_site_gate(&mut self, site: usize, gate: &Array2<T>) -> Result<()> {
        if site >= self.len() {
            return Err(TenChainError::InvalidConfiguration(format!(
                "gate site {} outside chain of length {}",
                site,
                self.len()
            )));
        }
        let n = self.tensors[site].shape()[0];
        if gate.dim() != (n, n) {
            return Err(TenChainError::ShapeMismatch("Mps::apply_single_site_gate"));
        }
        self.tensors[site] = self.tensors[site].mode_product(gate, 0)?;
        Ok(())
    }

    /// Applies `gate` to `site` and `site + 1` and splits the result back into
    /// two sites with a truncated SVD. The singular values go where
    /// `distribution` says. Returns the kept singular values.
    pub fn apply_two_site_gate(
        &mut self,
        site: usize,
        gate: &Array2<T>,
        trunc: &Truncation,
        distribution: SvDistribution,
    ) -> Result<Array1<T::Real>> {
        if site + 1 >= self.len() {
            return Err(TenChainError::InvalidConfiguration(format!(
                "two-site gate at {} outside chain of length {}",
                site,
                self.len()
            )));
        }
        let (n0, n1) = (self.tensors[site].shape()[0], self.tensors[site + 1].shape()[0]);
        if gate.dim() != (n0 * n1, n0 * n1) {
            return Err(TenChainError::ShapeMismatch("Mps::apply_two_site_gate"));
        }
        let merged = self.tensors[site]
            .merge_pair(&self.tensors[site + 1])?
            .mode_product(gate, 0)?;
        let (left, right) = (merged.shape()[1], merged.shape()[2]);
        // (n0, l) x (n1, r)
        let mat = merged
            .reshaped(&[n0, n1, left, right])?
            .permuted(&[0, 2, 1, 3])?
            .as_matrix(2)?;
        let MatrixSVD { u, s: sdiag, vt } = trunc.apply(thin_svd(&mat)?);
        let k = sdiag.len();
        self.tensors[site] = Tensor::from_matrix(u, &[n0, left, k])?;
        self.tensors[site + 1] = Tensor::from_matrix(vt, &[k, n1, right])?.permuted(&[1, 0, 2])?;
        self.absorb_singular_values(site, &sdiag, distribution)?;
        Ok(sdiag)
    }

    /// Applies `gates` in order. Two-site gates are split with `trunc`.
    pub fn apply_gates(
        &mut self,
        gates: &[Gate<T>],
        trunc: &Truncation,
        distribution: SvDistribution,
    ) -> Result<()> {
        trunc.validate()?;
        for gate in gates {
            match gate {
                Gate::Single { site, matrix } => self.apply_single_site_gate(*site, matrix)?,
                Gate::Pair { site, matrix } => {
                    self.apply_two_site_gate(*site, matrix, trunc, distribution)?;
                }
            }
        }
        debug!(
            "applied {} gates, bond dimensions {:?}",
            gates.len(),
            self.bond_dims()
        );
        Ok(())
    }
}

/// Runs `gates` on the all-zero product state `|0..0⟩`.
pub fn circuit_to_mps<T: Element>(
    physical_dims: &[usize],
    gates: &[Gate<T>],
    trunc: &Truncation,
    distribution: SvDistribution,
) -> Result<Mps<T>> {
    let mut mps = Mps::basis_state(physical_dims, &vec![0; physical_dims.len()])?;
    mps.apply_gates(gates, trunc, distribution)?;
    Ok(mps)
}

#[cfg(test)]
mod gates_tests {
    use super::*;
    use crate::matrix_product::operators::*;
    use ndarray_linalg::{c64};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ghz_gates(qubits: usize) -> Vec<Gate<f64>> {
        let mut gates = vec![Gate::single(0, hadamard())];
        gates.extend((0..qubits - 1).map(|i| Gate::pair(i, cnot())));
        gates
    }

    #[test]
    fn ghz_state_from_cnot_chain() -> Result<()> {
        for dist in [SvDistribution::Left, SvDistribution::Right, SvDistribution::Sqrt] {
            let mps = circuit_to_mps(&[2; 5], &ghz_gates(5), &Truncation::none(), dist)?;
            let vector = mps.to_vector()?;
            assert_eq!(vector.len(), 32);
            let h = std::f64::consts::FRAC_1_SQRT_2;
            for (i, &x) in vector.iter().enumerate() {
                let expected = if i == 0 || i == 31 { h } else { 0.0 };
                approx::assert_abs_diff_eq!(x, expected, epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn ghz_bonds_stay_small_with_cutoff() -> Result<()> {
        let trunc = Truncation::none().with_cutoff(1e-12);
        let mps = circuit_to_mps(&[2; 6], &ghz_gates(6), &trunc, SvDistribution::Right)?;
        assert_eq!(mps.bond_dims(), vec![1, 2, 2, 2, 2, 2, 1]);
        approx::assert_abs_diff_eq!(
            mps.entanglement_entropy(2)?,
            std::f64::consts::LN_2,
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn two_site_gate_matches_dense() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(51);
        let mut mps = Mps::<c64>::random(&[2, 3, 2], 3, &mut rng)?;
        let gate = Tensor::<c64>::random(&[6, 6], &mut rng).as_matrix(1)?;
        let before = mps.to_full_tensor()?;
        mps.apply_two_site_gate(0, &gate, &Truncation::none(), SvDistribution::Sqrt)?;

        // gate acts on the merged (site 0, site 1) index
        let expected = Tensor::from_matrix(gate.dot(&before.as_matrix(2)?), &[2, 3, 2])?;
        assert_close_l2!(&mps.to_full_tensor()?.data, &expected.data, 1e-12);
        Ok(())
    }

    #[test]
    fn single_site_gate_acts_on_one_axis() -> Result<()> {
        let mut mps = Mps::<f64>::basis_state(&[2, 2, 2], &[0, 0, 0])?;
        mps.apply_single_site_gate(1, &pauli_x())?;
        let vector = mps.to_vector()?;
        assert_eq!(vector[2], 1.0);
        assert_eq!(vector.sum(), 1.0);
        Ok(())
    }

    #[test]
    fn bad_gates_are_rejected() -> Result<()> {
        let mut mps = Mps::<f64>::basis_state(&[2, 2], &[0, 0])?;
        assert!(mps.apply_single_site_gate(2, &pauli_x()).is_err());
        assert!(mps.apply_single_site_gate(0, &identity(3)).is_err());
        assert!(mps
            .apply_two_site_gate(1, &cnot(), &Truncation::none(), SvDistribution::Left)
            .is_err());
        assert!(mps
            .apply_two_site_gate(0, &identity(3), &Truncation::none(), SvDistribution::Left)
            .is_err());
        let gates = vec![Gate::pair(0, cnot())];
        assert!(mps
            .apply_gates(&gates, &Truncation::none().with_maxdim(0), SvDistribution::Left)
            .is_err());
        Ok(())
    }
}
