//! Reynolds-stress realization via the Lund-Wu-Squires transform.
//!
//! The correlation engines produce fluctuations with isotropic unit-variance
//! statistics. Multiplying each node's fluctuation by the lower-triangular
//! Cholesky-type factor a of the target stress tensor, a aᵀ = R (Klein et
//! al., 2003, Eq. 5), embeds the target one-point correlations: the embedded
//! field reproduces R in expectation.
//!
//! The factor exists only for realizable (positive-definite) stress input.
//! A violating node is a user-input error: construction fails with a
//! [`RealizabilityError`] naming the node and the offending condition, and
//! nothing is clamped.

use thiserror::Error;

use crate::types::{LowerTriangular3, SymmTensor3, Vec3};

/// Fatal stress-input error, reported at first use of the realizer.
#[derive(Debug, Error)]
pub enum RealizabilityError {
    /// Leading diagonal entry must be positive
    #[error("Reynolds stress at node {node} is not realizable: R_xx = {value} must be positive")]
    NonPositiveXx { node: usize, value: f64 },

    /// Second leading principal minor must be positive
    #[error(
        "Reynolds stress at node {node} is not realizable: \
         R_xx R_yy - R_xy^2 = {value} must be positive"
    )]
    NonPositiveMinor { node: usize, value: f64 },

    /// Determinant must be positive
    #[error("Reynolds stress at node {node} is not realizable: det(R) = {value} must be positive")]
    NonPositiveDeterminant { node: usize, value: f64 },
}

/// Per-node lower-triangular stress factors, computed once.
#[derive(Clone, Debug)]
pub struct StressRealizer {
    transforms: Vec<LowerTriangular3>,
}

impl StressRealizer {
    /// Validate realizability and factor every node's stress tensor.
    pub fn new(stresses: &[SymmTensor3]) -> Result<Self, RealizabilityError> {
        let mut transforms = Vec::with_capacity(stresses.len());
        for (node, r) in stresses.iter().enumerate() {
            transforms.push(lund_wu_squires(node, r)?);
        }
        Ok(Self { transforms })
    }

    /// The factor at one node.
    #[inline(always)]
    pub fn transform(&self, node: usize) -> &LowerTriangular3 {
        &self.transforms[node]
    }

    /// All per-node factors.
    pub fn transforms(&self) -> &[LowerTriangular3] {
        &self.transforms
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// True when no nodes were factored.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Map one node's isotropic fluctuation into the anisotropic field.
    #[inline(always)]
    pub fn embed(&self, node: usize, fluctuation: &Vec3) -> Vec3 {
        self.transforms[node].apply(fluctuation)
    }
}

/// Closed-form Cholesky factor of one stress tensor.
///
/// The three leading principal minors being positive is exactly the
/// condition for the factor to exist with positive diagonal; each is
/// checked before the square root that needs it.
fn lund_wu_squires(node: usize, r: &SymmTensor3) -> Result<LowerTriangular3, RealizabilityError> {
    if r.xx <= 0.0 {
        return Err(RealizabilityError::NonPositiveXx {
            node,
            value: r.xx,
        });
    }
    let minor = r.xx * r.yy - r.xy * r.xy;
    if minor <= 0.0 {
        return Err(RealizabilityError::NonPositiveMinor { node, value: minor });
    }
    let det = r.det();
    if det <= 0.0 {
        return Err(RealizabilityError::NonPositiveDeterminant { node, value: det });
    }

    let a11 = r.xx.sqrt();
    let a21 = r.xy / a11;
    let a22 = (r.yy - a21 * a21).sqrt();
    let a31 = r.xz / a11;
    let a32 = (r.yz - a21 * a31) / a22;
    let a33 = (r.zz - a31 * a31 - a32 * a32).sqrt();

    Ok(LowerTriangular3::new(a11, a21, a22, a31, a32, a33))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_identity_stress_gives_identity_transform() {
        let realizer = StressRealizer::new(&[SymmTensor3::identity()]).unwrap();
        assert_eq!(*realizer.transform(0), LowerTriangular3::identity());
    }

    #[test]
    fn test_diagonal_stress_gives_rms_diagonal() {
        let realizer = StressRealizer::new(&[SymmTensor3::diagonal(4.0, 9.0, 16.0)]).unwrap();
        let a = realizer.transform(0);

        assert!((a.xx - 2.0).abs() < TOL);
        assert!((a.yy - 3.0).abs() < TOL);
        assert!((a.zz - 4.0).abs() < TOL);
        assert!(a.yx.abs() < TOL && a.zx.abs() < TOL && a.zy.abs() < TOL);
    }

    #[test]
    fn test_factor_reconstructs_stress() {
        // Channel-flow-like anisotropic tensor with shear.
        let r = SymmTensor3::new(4.0, -1.2, 0.3, 2.5, -0.4, 1.8);
        let realizer = StressRealizer::new(&[r]).unwrap();

        let back = realizer.transform(0).outer();
        assert!((back.xx - r.xx).abs() < TOL);
        assert!((back.xy - r.xy).abs() < TOL);
        assert!((back.xz - r.xz).abs() < TOL);
        assert!((back.yy - r.yy).abs() < TOL);
        assert!((back.yz - r.yz).abs() < TOL);
        assert!((back.zz - r.zz).abs() < TOL);
    }

    #[test]
    fn test_embed_applies_factor() {
        let realizer = StressRealizer::new(&[SymmTensor3::diagonal(4.0, 1.0, 0.25)]).unwrap();
        let embedded = realizer.embed(0, &Vec3::new(1.0, 1.0, 1.0));

        assert!((embedded.x - 2.0).abs() < TOL);
        assert!((embedded.y - 1.0).abs() < TOL);
        assert!((embedded.z - 0.5).abs() < TOL);
    }

    #[test]
    fn test_negative_eigenvalue_rejected() {
        // diag(1, -1, 1) has eigenvalue -1; the second minor exposes it.
        let r = SymmTensor3::diagonal(1.0, -1.0, 1.0);
        let err = StressRealizer::new(&[r]).unwrap_err();
        assert!(matches!(
            err,
            RealizabilityError::NonPositiveMinor { node: 0, .. }
        ));
    }

    #[test]
    fn test_non_positive_xx_rejected() {
        let r = SymmTensor3::new(0.0, 0.0, 0.0, 1.0, 0.0, 1.0);
        let err = StressRealizer::new(&[r]).unwrap_err();
        assert!(matches!(err, RealizabilityError::NonPositiveXx { .. }));
    }

    #[test]
    fn test_excess_shear_rejected() {
        // |R_xy| > sqrt(R_xx R_yy) cannot come from a real covariance.
        let r = SymmTensor3::new(1.0, 2.0, 0.0, 1.0, 0.0, 1.0);
        let err = StressRealizer::new(&[r]).unwrap_err();
        assert!(matches!(err, RealizabilityError::NonPositiveMinor { .. }));
    }

    #[test]
    fn test_indefinite_full_tensor_rejected() {
        // Passes the first two minors, fails on the determinant.
        let r = SymmTensor3::new(1.0, 0.0, 2.0, 1.0, 0.0, 1.0);
        assert!(r.xx * r.yy - r.xy * r.xy > 0.0);
        let err = StressRealizer::new(&[r]).unwrap_err();
        assert!(matches!(
            err,
            RealizabilityError::NonPositiveDeterminant { .. }
        ));
    }

    #[test]
    fn test_error_names_offending_node() {
        let stresses = [
            SymmTensor3::identity(),
            SymmTensor3::identity(),
            SymmTensor3::diagonal(-1.0, 1.0, 1.0),
        ];
        let err = StressRealizer::new(&stresses).unwrap_err();
        assert!(matches!(
            err,
            RealizabilityError::NonPositiveXx { node: 2, .. }
        ));
    }
}
