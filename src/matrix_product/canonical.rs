//! Canonical forms of matrix product states.
//!
//! All forms are built from one QR-based step that makes a single site
//! orthonormal and pushes the remaining factor into its neighbour. At either
//! end of the chain the neighbour is [`boundary_tensor`], so the factor pushed
//! out of the chain is exactly the state's norm.

use std::str::FromStr;

use crate::element::Element;
use crate::error::*;
use crate::linalg::singular_value::*;
use crate::matrix_product::mps::Mps;
use crate::matrix_product::TensorTrain;
use crate::tensor::*;

use log::debug;
use ndarray::*;
use ndarray_linalg::Scalar;
use num::{Float, Zero};

/// Orthonormality direction of a full sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Canonical {
    Left,
    Right,
}

impl FromStr for Canonical {
    type Err = TenChainError;

    fn from_str(s: &str) -> Result<Canonical> {
        match s {
            "left" => Ok(Canonical::Left),
            "right" => Ok(Canonical::Right),
            other => Err(TenChainError::InvalidConfiguration(format!(
                "unknown canonical form {:?}",
                other
            ))),
        }
    }
}

/// Where a bond's singular values go when they are put back into the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SvDistribution {
    /// Onto the site left of the bond.
    Left,
    /// Onto the site right of the bond.
    Right,
    /// `sqrt(S)` onto each side.
    Sqrt,
}

impl FromStr for SvDistribution {
    type Err = TenChainError;

    fn from_str(s: &str) -> Result<SvDistribution> {
        match s {
            "left" | "left-weighted" => Ok(SvDistribution::Left),
            "right" | "right-weighted" => Ok(SvDistribution::Right),
            "sqrt" | "symmetric-sqrt-split" => Ok(SvDistribution::Sqrt),
            other => Err(TenChainError::InvalidConfiguration(format!(
                "unknown singular value distribution {:?}",
                other
            ))),
        }
    }
}

/// Shape of [`boundary_tensor`].
pub const BOUNDARY_SHAPE: [usize; 3] = [1, 1, 1];

/// The `1 x 1 x 1` tensor holding 1 that stands in for the missing neighbour
/// beyond either end of an open chain.
pub fn boundary_tensor<T: Element>() -> Tensor<T> {
    Tensor::ones(&BOUNDARY_SHAPE)
}

fn site_dims<T: Element>(site: &Tensor<T>, caller: &'static str) -> Result<(usize, usize, usize)> {
    match *site.shape() {
        [n, dl, dr] => Ok((n, dl, dr)),
        _ => Err(TenChainError::ShapeMismatch(caller)),
    }
}

/// Makes `site` left-orthonormal and absorbs the triangular factor into the
/// left bond of `next`. Returns the updated `(site, next)`.
///
/// The new bond dimension is `min(n * D_l, D_r)`.
pub fn orthonormalize_left_step<T: Element>(
    site: &Tensor<T>,
    next: &Tensor<T>,
) -> Result<(Tensor<T>, Tensor<T>)> {
    let (n, dl, dr) = site_dims(site, "orthonormalize_left_step")?;
    if next.rank() != 3 || next.shape()[1] != dr {
        return Err(TenChainError::ShapeMismatch("orthonormalize_left_step"));
    }
    let (q, r) = thin_qr(&site.as_matrix(2)?)?;
    let k = q.ncols();
    let site = Tensor::from_matrix(q, &[n, dl, k])?;
    let next = next.mode_product(&r, 1)?;
    Ok((site, next))
}

/// Mirror of [`orthonormalize_left_step`]: makes `site` right-orthonormal and
/// absorbs the factor into the right bond of `prev`. Returns the updated
/// `(site, prev)`.
pub fn orthonormalize_right_step<T: Element>(
    site: &Tensor<T>,
    prev: &Tensor<T>,
) -> Result<(Tensor<T>, Tensor<T>)> {
    let (n, dl, dr) = site_dims(site, "orthonormalize_right_step")?;
    if prev.rank() != 3 || prev.shape()[2] != dl {
        return Err(TenChainError::ShapeMismatch("orthonormalize_right_step"));
    }
    let swapped = site.permuted(&[0, 2, 1])?;
    let (q, r) = thin_qr(&swapped.as_matrix(2)?)?;
    let k = q.ncols();
    let site = Tensor::from_matrix(q, &[n, dr, k])?.permuted(&[0, 2, 1])?;
    let prev = prev.mode_product(&r, 2)?;
    Ok((site, prev))
}

/// Splits the scalar left in the boundary tensor into a non-negative norm and
/// a unit phase, which goes back onto `site`. For real data the phase is ±1.
fn extract_norm<T: Element>(site: Tensor<T>, boundary: &Tensor<T>) -> Result<(Tensor<T>, T::Real)> {
    let r = boundary.as_scalar()?;
    let nrm = r.abs();
    if nrm == T::Real::zero() {
        return Ok((site, nrm));
    }
    Ok((site.scaled(r.div_real(nrm)), nrm))
}

fn scale_axis<T: Element>(site: &mut Tensor<T>, axis: usize, weights: &Array1<T::Real>) -> Result<()> {
    if site.shape()[axis] != weights.len() {
        return Err(TenChainError::ShapeMismatch("Mps::absorb_singular_values"));
    }
    for (mut lane, &w) in site.data.axis_iter_mut(Axis(axis)).zip(weights.iter()) {
        lane.mapv_inplace(|x| x.mul_real(w));
    }
    Ok(())
}

/// Checks `Aᴴ A = 1` for the `(physical * left, right)` matricization.
pub fn is_left_orthonormal<T: Element>(site: &Tensor<T>, tol: f64) -> Result<bool> {
    site_dims(site, "is_left_orthonormal")?;
    let mat = site.as_matrix(2)?;
    Ok(is_isometry(&mat, tol))
}

/// Checks `B Bᴴ = 1` for the `(left, physical * right)` matricization.
pub fn is_right_orthonormal<T: Element>(site: &Tensor<T>, tol: f64) -> Result<bool> {
    site_dims(site, "is_right_orthonormal")?;
    let mat = site.permuted(&[0, 2, 1])?.as_matrix(2)?;
    Ok(is_isometry(&mat, tol))
}

fn is_isometry<T: Element>(mat: &Array2<T>, tol: f64) -> bool {
    let gram = mat.t().mapv(|x| x.conj()).dot(mat);
    let tol = T::real(tol);
    gram.indexed_iter().all(|((i, j), &x)| {
        let target = if i == j { T::one() } else { T::zero() };
        (x - target).abs() <= tol
    })
}

/// Von Neumann entropy `-Σ p ln p` of the Schmidt probabilities
/// `p = s² / Σ s²`.
pub fn von_neumann_entropy<R: Float>(sigma: ArrayView1<R>) -> R {
    let total = sigma.iter().fold(R::zero(), |acc, &s| acc + s * s);
    if total <= R::zero() {
        return R::zero();
    }
    sigma.iter().fold(R::zero(), |acc, &s| {
        let p = s * s / total;
        if p > R::zero() {
            acc - p * p.ln()
        } else {
            acc
        }
    })
}

impl<T: Element> Mps<T> {
    /// Sweeps left to right, leaving every site left-orthonormal, and returns
    /// the norm pushed out at the right end.
    ///
    /// The state is unchanged up to that norm: it equals `norm` times the
    /// state of the rewritten chain. Needs a trailing bond of dimension 1.
    pub fn orthonormalize_left(&mut self) -> Result<T::Real> {
        let last = self.len() - 1;
        for i in 0..last {
            let (site, next) = orthonormalize_left_step(&self.tensors[i], &self.tensors[i + 1])?;
            self.tensors[i] = site;
            self.tensors[i + 1] = next;
        }
        let (site, boundary) = orthonormalize_left_step(&self.tensors[last], &boundary_tensor())?;
        let (site, nrm) = extract_norm(site, &boundary)?;
        self.tensors[last] = site;
        debug!("left sweep over {} sites, norm {:?}", self.len(), nrm);
        Ok(nrm)
    }

    /// Sweeps right to left, leaving every site right-orthonormal, and returns
    /// the norm pushed out at the left end. Needs a leading bond of
    /// dimension 1.
    pub fn orthonormalize_right(&mut self) -> Result<T::Real> {
        for i in (1..self.len()).rev() {
            let (site, prev) = orthonormalize_right_step(&self.tensors[i], &self.tensors[i - 1])?;
            self.tensors[i] = site;
            self.tensors[i - 1] = prev;
        }
        let (site, boundary) = orthonormalize_right_step(&self.tensors[0], &boundary_tensor())?;
        let (site, nrm) = extract_norm(site, &boundary)?;
        self.tensors[0] = site;
        debug!("right sweep over {} sites, norm {:?}", self.len(), nrm);
        Ok(nrm)
    }

    pub fn orthonormalize(&mut self, form: Canonical) -> Result<T::Real> {
        match form {
            Canonical::Left => self.orthonormalize_left(),
            Canonical::Right => self.orthonormalize_right(),
        }
    }

    /// Site-canonical form: sites left of `center` become left-orthonormal,
    /// sites right of it right-orthonormal, and `center` absorbs both
    /// remainders. The represented state is unchanged.
    pub fn orthonormalize_center(&mut self, center: usize) -> Result<()> {
        self.check_site(center)?;
        for i in 0..center {
            let (site, next) = orthonormalize_left_step(&self.tensors[i], &self.tensors[i + 1])?;
            self.tensors[i] = site;
            self.tensors[i + 1] = next;
        }
        for i in (center + 1..self.len()).rev() {
            let (site, prev) = orthonormalize_right_step(&self.tensors[i], &self.tensors[i - 1])?;
            self.tensors[i] = site;
            self.tensors[i - 1] = prev;
        }
        debug!("site-canonical form centered at {}", center);
        Ok(())
    }

    /// Bond-canonical (Schmidt) form at the bond between `bond` and
    /// `bond + 1`.
    ///
    /// Afterwards sites `<= bond` are left-orthonormal and sites `> bond`
    /// right-orthonormal, and the returned descending singular values are the
    /// entanglement spectrum of that cut. The singular values are *not* left
    /// in the chain; [`Mps::absorb_singular_values`] puts them back. On the
    /// last site the (unit) right factor is folded into the site itself.
    pub fn orthonormalize_bond(&mut self, bond: usize) -> Result<Array1<T::Real>> {
        self.orthonormalize_center(bond)?;
        let (n, dl, dr) = site_dims(&self.tensors[bond], "Mps::orthonormalize_bond")?;
        let MatrixSVD { u, s: sdiag, vt } = thin_svd(&self.tensors[bond].as_matrix(2)?)?;
        let k = sdiag.len();
        if bond + 1 < self.len() {
            self.tensors[bond] = Tensor::from_matrix(u, &[n, dl, k])?;
            self.tensors[bond + 1] = self.tensors[bond + 1].mode_product(&vt, 1)?;
        } else {
            self.tensors[bond] = Tensor::from_matrix(u.dot(&vt), &[n, dl, dr])?;
        }
        Ok(sdiag)
    }

    /// Multiplies the singular values of `bond` back into the chain.
    pub fn absorb_singular_values(
        &mut self,
        bond: usize,
        sigma: &Array1<T::Real>,
        distribution: SvDistribution,
    ) -> Result<()> {
        self.check_site(bond)?;
        if distribution != SvDistribution::Left && bond + 1 >= self.len() {
            return Err(TenChainError::InvalidConfiguration(format!(
                "bond {} has no right neighbour to absorb into",
                bond
            )));
        }
        match distribution {
            SvDistribution::Left => scale_axis(&mut self.tensors[bond], 2, sigma),
            SvDistribution::Right => scale_axis(&mut self.tensors[bond + 1], 1, sigma),
            SvDistribution::Sqrt => {
                let root = sigma.mapv(Scalar::sqrt);
                scale_axis(&mut self.tensors[bond], 2, &root)?;
                scale_axis(&mut self.tensors[bond + 1], 1, &root)
            }
        }
    }

    /// Truncates every bond according to `trunc`.
    ///
    /// Brings the chain into right-canonical form, then sweeps left to right
    /// with truncated SVDs. Returns the kept singular values of each bond,
    /// which are those of the normalized state; the original overall scale is
    /// restored on the last site.
    pub fn compress(&mut self, trunc: &Truncation) -> Result<Vec<Array1<T::Real>>> {
        trunc.validate()?;
        let nrm = self.orthonormalize_right()?;
        let last = self.len() - 1;
        let mut spectra = Vec::with_capacity(last);
        for i in 0..last {
            let (n, dl, _) = site_dims(&self.tensors[i], "Mps::compress")?;
            let svd = trunc.apply(thin_svd(&self.tensors[i].as_matrix(2)?)?);
            let carry = svd.weighted_vt();
            let MatrixSVD { u, s: sdiag, .. } = svd;
            self.tensors[i] = Tensor::from_matrix(u, &[n, dl, sdiag.len()])?;
            self.tensors[i + 1] = self.tensors[i + 1].mode_product(&carry, 1)?;
            spectra.push(sdiag);
        }
        self.tensors[last] = self.tensors[last].clone().scaled(T::from_real(nrm));
        debug!(
            "compressed {} sites, bond dimensions {:?}",
            self.len(),
            self.bond_dims()
        );
        Ok(spectra)
    }

    /// Schmidt probabilities `s² / Σ s²` across `bond`.
    pub fn entanglement_spectrum(&self, bond: usize) -> Result<Array1<T::Real>> {
        let sigma = self.clone().orthonormalize_bond(bond)?;
        let total = sigma.iter().fold(T::Real::zero(), |acc, &s| acc + s * s);
        if total == T::Real::zero() {
            return Ok(sigma);
        }
        Ok(sigma.mapv(|s| s * s / total))
    }

    pub fn entanglement_entropy(&self, bond: usize) -> Result<T::Real> {
        let sigma = self.clone().orthonormalize_bond(bond)?;
        Ok(von_neumann_entropy(sigma.view()))
    }

    fn check_site(&self, site: usize) -> Result<()> {
        if site < self.len() {
            Ok(())
        } else {
            Err(TenChainError::InvalidConfiguration(format!(
                "site {} outside chain of length {}",
                site,
                self.len()
            )))
        }
    }
}
