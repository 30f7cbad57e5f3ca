use crate::element::Element;
use crate::error::*;

use ndarray::*;
use ndarray_linalg::{Scalar, QR, SVD};

/// Output of a thin singular value decomposition, `M = U * diag(S) * Vᴴ`.
///
/// With `M` of shape `m x n` and `k = min(m, n)`, `u` is `m x k`, `s` has
/// length `k` and `vt` is `k x n`. Singular values are sorted in descending
/// order.
#[derive(Clone, Debug)]
pub struct MatrixSVD<T: Element> {
    pub u: Array2<T>,
    pub s: Array1<T::Real>,
    pub vt: Array2<T>,
}

impl<T: Element> MatrixSVD<T> {
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Keeps the `keep` largest singular triplets.
    pub fn truncated(self, keep: usize) -> MatrixSVD<T> {
        let keep = keep.min(self.rank());
        MatrixSVD {
            u: self.u.slice(s![.., ..keep]).to_owned(),
            s: self.s.slice(s![..keep]).to_owned(),
            vt: self.vt.slice(s![..keep, ..]).to_owned(),
        }
    }

    /// `U * diag(S)`.
    pub fn weighted_u(&self) -> Array2<T> {
        let sigma = self.s.mapv(T::from_real).insert_axis(Axis(0));
        &self.u * &sigma
    }

    /// `diag(S) * Vᴴ`.
    pub fn weighted_vt(&self) -> Array2<T> {
        let sigma = self.s.mapv(T::from_real).insert_axis(Axis(1));
        &self.vt * &sigma
    }

    /// `U * diag(sqrt(S))` and `diag(sqrt(S)) * Vᴴ`.
    pub fn split_sqrt(&self) -> (Array2<T>, Array2<T>) {
        let root = self.s.mapv(|x| T::from_real(Scalar::sqrt(x)));
        let left = &self.u * &root.view().insert_axis(Axis(0));
        let right = &self.vt * &root.view().insert_axis(Axis(1));
        (left, right)
    }
}

/// Thin SVD of `mat`.
///
/// LAPACK's `gesvd` already returns descending singular values; the order is
/// still checked and the triplets permuted if a backend hands them back
/// unsorted.
pub fn thin_svd<T: Element>(mat: &Array2<T>) -> Result<MatrixSVD<T>> {
    let (uopt, sdiag, vtopt) = mat.svd(true, true)?;
    let umat = uopt.ok_or(TenChainError::DecompositionFailure("thin_svd: U not computed"))?;
    let vmat = vtopt.ok_or(TenChainError::DecompositionFailure("thin_svd: Vt not computed"))?;
    let k = sdiag.len();
    // gesvd hands back square U and Vt; only the first k columns/rows pair
    // with singular values.
    let svd = MatrixSVD {
        u: umat.slice(s![.., ..k]).to_owned(),
        s: sdiag,
        vt: vmat.slice(s![..k, ..]).to_owned(),
    };
    Ok(sort_descending(svd))
}

fn sort_descending<T: Element>(svd: MatrixSVD<T>) -> MatrixSVD<T> {
    let sorted = svd.s.windows(2).into_iter().all(|w| w[0] >= w[1]);
    if sorted {
        return svd;
    }
    let mut order = (0..svd.rank()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        svd.s[b]
            .partial_cmp(&svd.s[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    MatrixSVD {
        u: svd.u.select(Axis(1), &order),
        s: svd.s.select(Axis(0), &order),
        vt: svd.vt.select(Axis(0), &order),
    }
}

/// Reduced QR decomposition: for `mat` of shape `m x n`, `Q` is `m x k` with
/// orthonormal columns and `R` is `k x n` upper triangular, `k = min(m, n)`.
pub fn thin_qr<T: Element>(mat: &Array2<T>) -> Result<(Array2<T>, Array2<T>)> {
    Ok(mat.qr()?)
}

/// Bond truncation policy applied to a descending singular value list.
///
/// Singular values at or below `cutoff` are dropped and at most `maxdim` are
/// kept. At least one value always survives so that a bond never vanishes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Truncation {
    pub maxdim: Option<usize>,
    pub cutoff: Option<f64>,
}

impl Truncation {
    /// Exact: keep every singular value.
    pub fn none() -> Truncation {
        Truncation::default()
    }

    pub fn with_maxdim(mut self, maxdim: usize) -> Truncation {
        self.maxdim = Some(maxdim);
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Truncation {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.maxdim == Some(0) {
            return Err(TenChainError::InvalidConfiguration(
                "truncation maxdim must be positive".to_owned(),
            ));
        }
        if let Some(cutoff) = self.cutoff {
            if !cutoff.is_finite() || cutoff < 0.0 {
                return Err(TenChainError::InvalidConfiguration(format!(
                    "truncation cutoff must be a non-negative finite number, got {}",
                    cutoff
                )));
            }
        }
        Ok(())
    }

    /// Number of leading singular values this policy keeps.
    pub fn kept<R: Scalar>(&self, sigma: &Array1<R>) -> usize {
        let above = match self.cutoff {
            Some(cutoff) => {
                let cutoff = R::real(cutoff);
                sigma.iter().filter(|&&x| x.re() > cutoff).count()
            }
            None => sigma.len(),
        };
        let capped = match self.maxdim {
            Some(maxdim) => above.min(maxdim),
            None => above,
        };
        capped.max(1).min(sigma.len().max(1))
    }

    /// Applies the policy to a thin SVD.
    pub fn apply<T: Element>(&self, svd: MatrixSVD<T>) -> MatrixSVD<T> {
        let keep = self.kept(&svd.s);
        svd.truncated(keep)
    }
}

#[cfg(test)]
mod singular_value_tests {
    use super::*;
    use ndarray_linalg::{c64};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_matrix() -> Array2<f64> {
        Array::from_iter((1..=16).map(f64::from))
            .into_shape((4, 4))
            .unwrap()
    }

    #[test]
    fn untruncated_svd_reconstructs() -> Result<()> {
        let mat = sample_matrix();
        let svd = thin_svd(&mat)?;
        let ans = svd.weighted_u().dot(&svd.vt);
        assert_close_l2!(&ans, &mat, 1e-12);
        assert!(svd.s.windows(2).into_iter().all(|w| w[0] >= w[1]));
        Ok(())
    }

    #[test]
    fn rectangular_svd_is_thin() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(11);
        let mat = crate::tensor::Tensor::<c64>::random(&[3, 7], &mut rng).as_matrix(1)?;
        let svd = thin_svd(&mat)?;
        assert_eq!(svd.u.dim(), (3, 3));
        assert_eq!(svd.s.len(), 3);
        assert_eq!(svd.vt.dim(), (3, 7));
        let (left, right) = svd.split_sqrt();
        assert_close_l2!(&left.dot(&right), &mat, 1e-12);
        Ok(())
    }

    #[test]
    fn maxdim_truncated_svd() -> Result<()> {
        // rank two, so keeping two triplets is still exact
        let mat = sample_matrix();
        let svd = Truncation::none().with_maxdim(2).apply(thin_svd(&mat)?);
        assert_eq!(svd.rank(), 2);
        let ans = svd.weighted_u().dot(&svd.vt);
        assert_close_l2!(&ans, &mat, 1e-12);
        Ok(())
    }

    #[test]
    fn cutoff_truncated_svd() -> Result<()> {
        let mat = sample_matrix();
        let svd = Truncation::none().with_cutoff(1e-10).apply(thin_svd(&mat)?);
        assert!(svd.rank() <= 2);
        let ans = svd.u.dot(&svd.weighted_vt());
        assert_close_l2!(&ans, &mat, 1e-12);
        Ok(())
    }

    #[test]
    fn truncation_keeps_at_least_one_value() {
        let sigma = arr1(&[1e-20, 1e-21]);
        assert_eq!(Truncation::none().with_cutoff(1e-3).kept(&sigma), 1);
        assert_eq!(Truncation::none().kept(&sigma), 2);
    }

    #[test]
    fn invalid_truncation_is_rejected() {
        assert!(Truncation::none().with_maxdim(0).validate().is_err());
        assert!(Truncation::none().with_cutoff(-1.0).validate().is_err());
        assert!(Truncation::none().with_cutoff(f64::NAN).validate().is_err());
        assert!(Truncation::none().with_maxdim(4).with_cutoff(1e-8).validate().is_ok());
    }

    #[test]
    fn qr_is_reduced() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(12);
        let mat = crate::tensor::Tensor::<c64>::random(&[6, 2], &mut rng).as_matrix(1)?;
        let (q, r) = thin_qr(&mat)?;
        assert_eq!(q.dim(), (6, 2));
        assert_eq!(r.dim(), (2, 2));
        let qhq = q.t().mapv(|x| x.conj()).dot(&q);
        assert_close_l2!(&qhq, &Array2::<c64>::eye(2), 1e-12);
        assert_close_l2!(&q.dot(&r), &mat, 1e-12);
        Ok(())
    }
}
