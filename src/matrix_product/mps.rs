use crate::element::Element;
use crate::error::*;
use crate::linalg::singular_value::*;
use crate::matrix_product::{validate_chain, TensorTrain};
use crate::tensor::*;

use ndarray::*;
use ndarray_linalg::Scalar;
use num::Zero;
use rand::Rng;

/// Matrix product state: a chain of `(physical, left, right)` site tensors.
#[derive(Clone, Debug, PartialEq)]
pub struct Mps<T: Element> {
    pub(crate) tensors: Vec<Tensor<T>>,
}

impl<T: Element> TensorTrain<T> for Mps<T> {
    const SITE_RANK: usize = 3;

    fn get_tensors(&self) -> &[Tensor<T>] {
        &self.tensors
    }
}

impl<T: Element> Mps<T> {
    pub fn new(tensors: Vec<Tensor<T>>) -> Result<Mps<T>> {
        validate_chain(&tensors, Self::SITE_RANK, "Mps::new")?;
        Ok(Mps { tensors })
    }

    /// Product state with site `i` in basis state `config[i]`; every bond has
    /// dimension 1.
    pub fn basis_state(physical_dims: &[usize], config: &[usize]) -> Result<Mps<T>> {
        if physical_dims.len() != config.len() {
            return Err(TenChainError::ShapeMismatch("Mps::basis_state"));
        }
        let mut tensors = Vec::with_capacity(config.len());
        for (&n, &c) in physical_dims.iter().zip(config) {
            if c >= n {
                return Err(TenChainError::InvalidConfiguration(format!(
                    "basis state {} outside physical dimension {}",
                    c, n
                )));
            }
            let mut site = Tensor::zeros(&[n, 1, 1]);
            site[&[c, 0, 0][..]] = T::one();
            tensors.push(site);
        }
        Mps::new(tensors)
    }

    /// Open chain with random entries and internal bonds of `bond_dim`.
    pub fn random<R: Rng + ?Sized>(
        physical_dims: &[usize],
        bond_dim: usize,
        rng: &mut R,
    ) -> Result<Mps<T>> {
        if bond_dim == 0 {
            return Err(TenChainError::InvalidConfiguration(
                "bond dimension must be positive".to_owned(),
            ));
        }
        let len = physical_dims.len();
        let tensors = physical_dims
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let left = if i == 0 { 1 } else { bond_dim };
                let right = if i + 1 == len { 1 } else { bond_dim };
                Tensor::random(&[n, left, right], rng)
            })
            .collect();
        Mps::new(tensors)
    }

    /// Factorizes a dense tensor, one axis per site, by successive SVDs.
    pub fn from_full_tensor(atensor: &Tensor<T>, trunc: &Truncation) -> Result<Mps<T>> {
        trunc.validate()?;
        let dims = atensor.shape().to_vec();
        let Some((&last_dim, leading)) = dims.split_last() else {
            return Err(TenChainError::ShapeMismatch("Mps::from_full_tensor"));
        };
        let mut mps = Vec::with_capacity(dims.len());
        let mut left = 1;
        let mut vnew = atensor.as_matrix(0)?;
        for &n in leading {
            let cols = vnew.len() / (left * n);
            let mat = Tensor::from_matrix(vnew, &[left * n, cols])?.as_matrix(1)?;
            let MatrixSVD { u, s: sdiag, vt } = trunc.apply(thin_svd(&mat)?);
            let k = sdiag.len();
            mps.push(Tensor::from_matrix(u, &[left, n, k])?.permuted(&[1, 0, 2])?);
            vnew = &vt * &sdiag.mapv(T::from_real).insert_axis(Axis(1));
            left = k;
        }
        mps.push(Tensor::from_matrix(vnew, &[left, last_dim, 1])?.permuted(&[1, 0, 2])?);
        Mps::new(mps)
    }

    pub fn into_tensors(self) -> Vec<Tensor<T>> {
        self.tensors
    }

    pub fn physical_dims(&self) -> Vec<usize> {
        self.tensors.iter().map(|t| t.shape()[0]).collect()
    }

    /// Contracts the whole chain into one tensor with one axis per site,
    /// tracing the boundary bond. Exponential in the chain length; meant for
    /// small reference checks only.
    pub fn to_full_tensor(&self) -> Result<Tensor<T>> {
        let mut tens = self.tensors[0].clone();
        for tensor in self.tensors.iter().skip(1) {
            tens = tens.merge_pair(tensor)?;
        }
        tens.trace_axes(1, 2)?.reshaped(&self.physical_dims())
    }

    pub fn to_vector(&self) -> Result<Array1<T>> {
        let full = self.to_full_tensor()?;
        Ok(Array::from_iter(full.data.iter().cloned()))
    }

    /// `<self|other>`, with `self` conjugated.
    ///
    /// Contracts site by site while carrying the boundary environment
    /// `E[a0, b0, a, b]`; for open chains the `a0, b0` bonds are trivial and
    /// `E` is just a `bond_a x bond_b` matrix. Bond dimensions of the two
    /// chains are independent.
    pub fn inner_product(&self, other: &Mps<T>) -> Result<T> {
        if self.len() != other.len() || self.physical_dims() != other.physical_dims() {
            return Err(TenChainError::ShapeMismatch("Mps::inner_product"));
        }
        let da = self.tensors[0].shape()[1];
        let db = other.tensors[0].shape()[1];
        let mut env = Tensor::zeros(&[da, db, da, db]);
        for a in 0..da {
            for b in 0..db {
                env[&[a, b, a, b][..]] = T::one();
            }
        }
        for (bra, ket) in self.tensors.iter().zip(&other.tensors) {
            // [a0, b0, b, p, a']
            let partial = env.contract(&bra.conj(), &[2], &[1])?;
            // [a0, b0, a', b']
            env = partial.contract(ket, &[3, 2], &[0, 1])?;
        }
        env.trace_axes(0, 2)?.trace_axes(0, 1)?.as_scalar()
    }

    pub fn norm(&self) -> Result<T::Real> {
        let sq = self.inner_product(self)?.re();
        if sq > T::Real::zero() {
            Ok(Scalar::sqrt(sq))
        } else {
            Ok(T::Real::zero())
        }
    }
}

#[cfg(test)]
mod mps_tests {
    use super::*;
    use ndarray_linalg::{c64};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_mismatched_bonds() {
        let a = Tensor::<f64>::zeros(&[2, 1, 3]);
        let b = Tensor::<f64>::zeros(&[2, 2, 1]);
        assert!(matches!(
            Mps::new(vec![a.clone(), b]),
            Err(TenChainError::ShapeMismatch("Mps::new"))
        ));
        let c = Tensor::<f64>::zeros(&[2, 3, 2]);
        // trailing bond 2 disagrees with leading bond 1
        assert!(Mps::new(vec![a, c]).is_err());
        assert!(Mps::<f64>::new(vec![]).is_err());
        assert!(Mps::new(vec![Tensor::<f64>::zeros(&[2, 1])]).is_err());
    }

    #[test]
    fn basis_state_vector() -> Result<()> {
        let mps = Mps::<f64>::basis_state(&[2, 3, 2], &[1, 2, 0])?;
        let vector = mps.to_vector()?;
        assert_eq!(vector.len(), 12);
        for (i, &x) in vector.iter().enumerate() {
            let expected = if i == 6 + 2 * 2 { 1.0 } else { 0.0 };
            assert_eq!(x, expected);
        }
        assert!(Mps::<f64>::basis_state(&[2, 2], &[0, 2]).is_err());
        Ok(())
    }

    #[test]
    fn random_chain_shapes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(21);
        let mps = Mps::<c64>::random(&[2, 3, 2, 2], 4, &mut rng)?;
        assert_eq!(mps.bond_dims(), vec![1, 4, 4, 4, 1]);
        assert_eq!(mps.physical_dims(), vec![2, 3, 2, 2]);
        assert_eq!(mps.site_physical_dims(1), [3]);
        assert_eq!(mps.max_bond_dim(), 4);
        Ok(())
    }

    #[test]
    fn single_site_mp() -> Result<()> {
        let atensor = Tensor::<f64>::zeros(&[2]).with_data(&[1., 2.])?;
        let mps = Mps::from_full_tensor(&atensor, &Truncation::none())?;
        assert_eq!(mps.len(), 1);
        assert_close_l2!(&mps.to_full_tensor()?.data, &atensor.data, 1e-12);
        Ok(())
    }

    #[test]
    fn three_index_mp() -> Result<()> {
        let atensor =
            Tensor::<f64>::zeros(&[2, 2, 2]).with_data(&[1., 2., 3., 4., 5., 6., 7., 8.])?;
        let mps = Mps::from_full_tensor(&atensor, &Truncation::none().with_cutoff(1e-12))?;
        assert_eq!(mps.len(), 3);
        assert_close_l2!(&mps.to_full_tensor()?.data, &atensor.data, 1e-12);
        Ok(())
    }

    #[test]
    fn random_full_tensor_round_trip() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(22);
        let atensor = Tensor::<c64>::random(&[2, 3, 2, 2], &mut rng);
        let mps = Mps::from_full_tensor(&atensor, &Truncation::none())?;
        assert_eq!(mps.bond_dims(), vec![1, 2, 4, 2, 1]);
        assert_close_l2!(&mps.to_full_tensor()?.data, &atensor.data, 1e-12);
        Ok(())
    }

    #[test]
    fn inner_product_matches_dense_vdot() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(23);
        let dims = [2, 3, 2, 2, 3];
        let a = Mps::<c64>::random(&dims, 3, &mut rng)?;
        let b = Mps::<c64>::random(&dims, 5, &mut rng)?;
        let value = a.inner_product(&b)?;
        let va = a.to_vector()?;
        let vb = b.to_vector()?;
        let expected = va
            .iter()
            .zip(vb.iter())
            .fold(c64::new(0.0, 0.0), |acc, (x, y)| acc + x.conj() * y);
        assert!((value - expected).norm() <= 1e-10 * expected.norm());
        Ok(())
    }

    #[test]
    fn inner_product_on_periodic_chain() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(24);
        let tensors = (0..4)
            .map(|_| Tensor::<f64>::random(&[2, 3, 3], &mut rng))
            .collect::<Vec<_>>();
        let a = Mps::new(tensors)?;
        let b = Mps::<f64>::random(&[2, 2, 2, 2], 2, &mut rng)?;
        let expected = a.to_vector()?.dot(&b.to_vector()?);
        approx::assert_relative_eq!(a.inner_product(&b)?, expected, max_relative = 1e-10);
        let self_overlap = a.to_vector()?.dot(&a.to_vector()?);
        approx::assert_relative_eq!(a.norm()?, self_overlap.sqrt(), max_relative = 1e-10);
        Ok(())
    }

    #[test]
    fn inner_product_rejects_mismatched_physical_dims() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(25);
        let a = Mps::<f64>::random(&[2, 2, 2], 2, &mut rng)?;
        let b = Mps::<f64>::random(&[2, 3, 2], 2, &mut rng)?;
        let c = Mps::<f64>::random(&[2, 2], 2, &mut rng)?;
        assert!(a.inner_product(&b).is_err());
        assert!(a.inner_product(&c).is_err());
        Ok(())
    }
}
