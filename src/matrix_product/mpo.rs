use crate::element::Element;
use crate::error::*;
use crate::matrix_product::mps::Mps;
use crate::matrix_product::operators::*;
use crate::matrix_product::{validate_chain, TensorTrain};
use crate::tensor::*;

use ndarray::*;

/// Matrix product operator: a chain of `(out, in, left, right)` site
/// tensors.
#[derive(Clone, Debug, PartialEq)]
pub struct Mpo<T: Element> {
    tensors: Vec<Tensor<T>>,
}

impl<T: Element> TensorTrain<T> for Mpo<T> {
    const SITE_RANK: usize = 4;

    fn get_tensors(&self) -> &[Tensor<T>] {
        &self.tensors
    }
}

fn scaled<T: Element>(op: Array2<T>, factor: f64) -> Array2<T> {
    op.mapv(|x| x * lit(factor))
}

impl<T: Element> Mpo<T> {
    pub fn new(tensors: Vec<Tensor<T>>) -> Result<Mpo<T>> {
        validate_chain(&tensors, Self::SITE_RANK, "Mpo::new")?;
        Ok(Mpo { tensors })
    }

    /// Open chain of `len` copies of a lower-triangular bulk tensor
    /// `(out, in, left, right)`: the first site keeps only the last row of
    /// the bond matrix and the last site only its first column.
    fn from_bulk(len: usize, bulk: &Array4<T>) -> Result<Mpo<T>> {
        if len == 0 {
            return Err(TenChainError::InvalidConfiguration(
                "operator chain needs at least one site".to_owned(),
            ));
        }
        let (d, _, b, _) = bulk.dim();
        let tensors = (0..len)
            .map(|i| {
                let (left, offset) = if i == 0 { (1, b - 1) } else { (b, 0) };
                let right = if i + 1 == len { 1 } else { b };
                Tensor::from_array(Array4::from_shape_fn((d, d, left, right), |(m, n, l, r)| {
                    bulk[[m, n, l + offset, r]]
                }))
            })
            .collect();
        Mpo::new(tensors)
    }

    /// `H = -J Σ Z_i Z_{i+1} - g Σ X_i - h Σ Z_i` with bond dimension 3.
    pub fn transverse_ising(len: usize, j: f64, g: f64, h: f64) -> Result<Mpo<T>> {
        let mut bulk = Array4::<T>::zeros((2, 2, 3, 3));
        let field = scaled(pauli_x::<T>(), -g) + scaled(pauli_z::<T>(), -h);
        bulk.slice_mut(s![.., .., 0, 0]).assign(&identity::<T>(2));
        bulk.slice_mut(s![.., .., 1, 0]).assign(&pauli_z::<T>());
        bulk.slice_mut(s![.., .., 2, 0]).assign(&field);
        bulk.slice_mut(s![.., .., 2, 1]).assign(&scaled(pauli_z::<T>(), -j));
        bulk.slice_mut(s![.., .., 2, 2]).assign(&identity::<T>(2));
        Mpo::from_bulk(len, &bulk)
    }

    /// Spin-1/2 XXZ chain
    /// `H = J Σ (SˣSˣ + SʸSʸ + Δ SᶻSᶻ) - h Σ Sᶻ` with bond dimension 5.
    pub fn heisenberg_xxz(len: usize, j: f64, delta: f64, h: f64) -> Result<Mpo<T>> {
        let mut bulk = Array4::<T>::zeros((2, 2, 5, 5));
        bulk.slice_mut(s![.., .., 0, 0]).assign(&identity::<T>(2));
        bulk.slice_mut(s![.., .., 1, 0]).assign(&spin_plus::<T>());
        bulk.slice_mut(s![.., .., 2, 0]).assign(&spin_minus::<T>());
        bulk.slice_mut(s![.., .., 3, 0]).assign(&spin_z::<T>());
        bulk.slice_mut(s![.., .., 4, 0]).assign(&scaled(spin_z::<T>(), -h));
        // S⁺S⁻ + S⁻S⁺ = 2 (SˣSˣ + SʸSʸ)
        bulk.slice_mut(s![.., .., 4, 1]).assign(&scaled(spin_minus::<T>(), 0.5 * j));
        bulk.slice_mut(s![.., .., 4, 2]).assign(&scaled(spin_plus::<T>(), 0.5 * j));
        bulk.slice_mut(s![.., .., 4, 3]).assign(&scaled(spin_z::<T>(), j * delta));
        bulk.slice_mut(s![.., .., 4, 4]).assign(&identity::<T>(2));
        Mpo::from_bulk(len, &bulk)
    }

    pub fn into_tensors(self) -> Vec<Tensor<T>> {
        self.tensors
    }

    /// Contracts the chain into one tensor with every output axis followed by
    /// every input axis, `(m_0, .., m_L, n_0, .., n_L)`. Small chains only.
    pub fn to_full_tensor(&self) -> Result<Tensor<T>> {
        // (left, m_0, n_0, .., m_i, n_i, right)
        let mut tens = self.tensors[0].permuted(&[2, 0, 1, 3])?;
        for tensor in self.tensors.iter().skip(1) {
            tens = tens.contract(tensor, &[tens.rank() - 1], &[2])?;
        }
        let tens = tens.trace_axes(0, tens.rank() - 1)?;
        let outputs = (0..self.len()).map(|i| 2 * i);
        let inputs = (0..self.len()).map(|i| 2 * i + 1);
        tens.permuted(&outputs.chain(inputs).collect::<Vec<_>>())
    }

    /// Dense `(Π out) x (Π in)` matrix of the operator; first site slowest.
    pub fn to_matrix(&self) -> Result<Array2<T>> {
        self.to_full_tensor()?.as_matrix(self.len())
    }

    /// Exact product with a state; bond dimensions multiply.
    pub fn apply(&self, mps: &Mps<T>) -> Result<Mps<T>> {
        let states = mps.get_tensors();
        if states.len() != self.len() {
            return Err(TenChainError::ShapeMismatch("Mpo::apply"));
        }
        let mut tensors = Vec::with_capacity(self.len());
        for (w, a) in self.tensors.iter().zip(states) {
            if w.shape()[1] != a.shape()[0] {
                return Err(TenChainError::ShapeMismatch("Mpo::apply"));
            }
            let (m, wl, wr) = (w.shape()[0], w.shape()[2], w.shape()[3]);
            let (al, ar) = (a.shape()[1], a.shape()[2]);
            // (m, wl, wr, al, ar) -> (m, wl, al, wr, ar)
            let site = w
                .contract(a, &[1], &[0])?
                .permuted(&[0, 1, 3, 2, 4])?
                .reshaped(&[m, wl * al, wr * ar])?;
            tensors.push(site);
        }
        Mps::new(tensors)
    }

    /// `⟨ψ|W|ψ⟩ / ⟨ψ|ψ⟩`.
    pub fn expectation(&self, mps: &Mps<T>) -> Result<T> {
        let norm_sq = mps.inner_product(mps)?;
        if norm_sq == T::zero() {
            return Err(TenChainError::InvalidConfiguration(
                "expectation value of a zero state".to_owned(),
            ));
        }
        Ok(mps.inner_product(&self.apply(mps)?)? / norm_sq)
    }
}

#[cfg(test)]
mod mpo_tests {
    use super::*;
    use ndarray_linalg::{c64};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// `op` on `site` of a chain of `len` qubits.
    fn embed<T: Element>(op: &Array2<T>, site: usize, len: usize) -> Array2<T> {
        let left = identity::<T>(1 << site);
        let right = identity::<T>(1 << (len - site - op.nrows().trailing_zeros() as usize));
        kron(&kron(&left, op), &right)
    }

    fn dense_ising(len: usize, j: f64, g: f64, h: f64) -> Array2<f64> {
        let mut ham = Array2::<f64>::zeros((1 << len, 1 << len));
        for i in 0..len {
            ham = ham + embed(&scaled(pauli_x::<f64>(), -g), i, len);
            ham = ham + embed(&scaled(pauli_z::<f64>(), -h), i, len);
        }
        for i in 0..len - 1 {
            let zz = kron(&pauli_z::<f64>(), &pauli_z::<f64>());
            ham = ham + embed(&scaled(zz, -j), i, len);
        }
        ham
    }

    #[test]
    fn transverse_ising_matches_dense() -> Result<()> {
        let mpo = Mpo::<f64>::transverse_ising(4, 1.0, 0.7, 0.2)?;
        assert_eq!(mpo.bond_dims(), vec![1, 3, 3, 3, 1]);
        assert_close_l2!(&mpo.to_matrix()?, &dense_ising(4, 1.0, 0.7, 0.2), 1e-12);
        Ok(())
    }

    #[test]
    fn single_site_operator_is_the_field() -> Result<()> {
        let mpo = Mpo::<f64>::transverse_ising(1, 1.0, 0.5, 0.25)?;
        let expected = scaled(pauli_x::<f64>(), -0.5) + scaled(pauli_z::<f64>(), -0.25);
        assert_close_l2!(&mpo.to_matrix()?, &expected, 1e-12);
        assert!(Mpo::<f64>::transverse_ising(0, 1.0, 1.0, 0.0).is_err());
        Ok(())
    }

    #[test]
    fn heisenberg_matches_dense() -> Result<()> {
        let (len, j, delta, h) = (3, 1.3, 0.6, 0.4);
        let mpo = Mpo::<c64>::heisenberg_xxz(len, j, delta, h)?;
        let sx = scaled(pauli_x::<c64>(), 0.5);
        let sy = pauli_y().mapv(|x| x * 0.5);
        let sz = spin_z::<c64>();
        let mut ham = Array2::<c64>::zeros((8, 8));
        for i in 0..len - 1 {
            let bond = kron(&sx, &sx) + kron(&sy, &sy) + scaled(kron(&sz, &sz), delta);
            ham = ham + embed(&scaled(bond, j), i, len);
        }
        for i in 0..len {
            ham = ham + embed(&scaled(sz.clone(), -h), i, len);
        }
        assert_close_l2!(&mpo.to_matrix()?, &ham, 1e-12);
        Ok(())
    }

    #[test]
    fn apply_matches_dense_product() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(61);
        let mps = Mps::<c64>::random(&[2; 4], 3, &mut rng)?;
        let mpo = Mpo::<c64>::heisenberg_xxz(4, 1.0, 0.5, 0.1)?;
        let result = mpo.apply(&mps)?;
        assert_eq!(result.bond_dims(), vec![1, 15, 15, 15, 1]);
        let expected = mpo.to_matrix()?.dot(&mps.to_vector()?);
        assert_close_l2!(&result.to_vector()?, &expected, 1e-12);
        Ok(())
    }

    #[test]
    fn expectation_matches_dense() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(62);
        let mps = Mps::<f64>::random(&[2; 5], 2, &mut rng)?;
        let mpo = Mpo::<f64>::transverse_ising(5, 1.0, 1.0, 0.3)?;
        let v = mps.to_vector()?;
        let expected = v.dot(&dense_ising(5, 1.0, 1.0, 0.3).dot(&v)) / v.dot(&v);
        approx::assert_relative_eq!(mpo.expectation(&mps)?, expected, max_relative = 1e-10);
        Ok(())
    }

    #[test]
    fn ferromagnet_ground_state_energy() -> Result<()> {
        let up = Mps::<f64>::basis_state(&[2; 6], &[0; 6])?;
        let mpo = Mpo::<f64>::transverse_ising(6, 1.0, 0.0, 0.0)?;
        approx::assert_abs_diff_eq!(mpo.expectation(&up)?, -5.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn mismatched_chains_are_rejected() -> Result<()> {
        let mpo = Mpo::<f64>::transverse_ising(3, 1.0, 1.0, 0.0)?;
        let short = Mps::<f64>::basis_state(&[2, 2], &[0, 0])?;
        let wide = Mps::<f64>::basis_state(&[2, 3, 2], &[0, 0, 0])?;
        assert!(mpo.apply(&short).is_err());
        assert!(mpo.apply(&wide).is_err());
        let bad = vec![Tensor::<f64>::zeros(&[2, 2, 1, 3]), Tensor::zeros(&[2, 2, 2, 1])];
        assert!(Mpo::new(bad).is_err());
        Ok(())
    }
}
