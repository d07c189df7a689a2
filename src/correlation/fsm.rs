//! Forward-stepwise correlation engine (Xie-Castro, 2008).
//!
//! Replaces the streamwise convolution of the digital-filter method by a
//! first-order recursion: in-plane correlations are still imposed by a 2-D
//! valid convolution of a fresh single-slab box, while the temporal
//! correlation comes from blending with the previous step's fluctuation
//! plane (Eq. 14),
//!
//! ```text
//! u_m = u_{m-1} * exp(const1FSM / T) + psi_m * sqrt(1 - exp(const2FSM / T))
//! ```
//!
//! with T the component's streamwise time scale in steps. With the default
//! constants (const2 = 2 const1) the blending weights satisfy
//! E1^2 + W2^2 = 1, so the recursion holds the fluctuation variance
//! stationary. The realized streamwise autocorrelation is the exponential
//! E1^r; a Gaussian shape cannot be produced, which is why configuration
//! rejects `is_gaussian` for this variant.

use crate::correlation::coeffs::FilterCoefficientTable;
use crate::correlation::collect_components;
use crate::correlation::random_box::RandomBox;
use crate::types::Vec3;

/// Two-dimensional in-plane filter plus streamwise recursion.
#[derive(Clone, Debug)]
pub struct ForwardStepwise {
    table: FilterCoefficientTable,
    height: usize,
    width: usize,
}

impl ForwardStepwise {
    /// Create the engine for a plane of `plane` = (height, width) nodes.
    pub fn new(table: FilterCoefficientTable, plane: (usize, usize)) -> Self {
        Self {
            table,
            height: plane.0,
            width: plane.1,
        }
    }

    /// The precomputed kernel table.
    pub fn table(&self) -> &FilterCoefficientTable {
        &self.table
    }

    /// Allocate the single-slab box sized for this engine's in-plane kernels.
    pub fn allocate_box(&self) -> RandomBox {
        RandomBox::for_forward_stepwise((self.height, self.width), &self.table)
    }

    /// Produce the next fluctuation plane from the current slab contents.
    ///
    /// On the first step there is no previous plane and the output is the
    /// freshly filtered slab itself, which already carries unit variance;
    /// later steps blend it with the cached previous plane.
    pub fn correlate(&self, random_box: &RandomBox, previous: Option<&[Vec3]>) -> Vec<Vec3> {
        let psi = [0, 1, 2].map(|c| self.filter_slab(random_box, c));
        let n_nodes = self.height * self.width;

        let Some(prev) = previous else {
            return collect_components(&psi, n_nodes);
        };
        assert_eq!(prev.len(), n_nodes, "previous plane size mismatch");

        let e1 = [0, 1, 2].map(|c| self.table.fsm_previous_weight(c));
        let w2 = [0, 1, 2].map(|c| self.table.fsm_fresh_weight(c));

        let mut out = Vec::with_capacity(n_nodes);
        for n in 0..n_nodes {
            out.push(Vec3::new(
                e1[0] * prev[n].x + w2[0] * psi[0][n],
                e1[1] * prev[n].y + w2[1] * psi[1][n],
                e1[2] * prev[n].z + w2[2] * psi[2][n],
            ));
        }
        out
    }

    /// Two-pass in-plane valid convolution of one component's slab.
    fn filter_slab(&self, random_box: &RandomBox, c: usize) -> Vec<f64> {
        let dims = random_box.dims(c);
        let data = random_box.component(c);
        let k2 = self.table.kernel(1, c).weights();
        let k3 = self.table.kernel(2, c).weights();

        // Pass over e2: collapse the row padding.
        let mut tmp = vec![0.0; self.height * dims.width];
        for (q, &w) in k2.iter().enumerate() {
            for j in 0..self.height {
                let src = &data[(j + q) * dims.width..(j + q + 1) * dims.width];
                let dst = &mut tmp[j * dims.width..(j + 1) * dims.width];
                for (acc, &x) in dst.iter_mut().zip(src) {
                    *acc += w * x;
                }
            }
        }

        // Pass over e3: collapse the column padding.
        let mut out = vec![0.0; self.height * self.width];
        for j in 0..self.height {
            let row = &tmp[j * dims.width..(j + 1) * dims.width];
            let dst = &mut out[j * self.width..(j + 1) * self.width];
            for (k, acc) in dst.iter_mut().enumerate() {
                let mut sum = 0.0;
                for (r, &w) in k3.iter().enumerate() {
                    sum += w * row[k + r];
                }
                *acc = sum;
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    use crate::random::NormalSource;
    use crate::types::LengthScaleSet;

    const TOL: f64 = 1e-12;

    fn engine(scales: LengthScaleSet, plane: (usize, usize)) -> ForwardStepwise {
        let table =
            FilterCoefficientTable::new(&scales, false, -0.5 * PI, -0.25 * PI, -0.5 * PI, 1e-8);
        ForwardStepwise::new(table, plane)
    }

    #[test]
    fn test_first_step_is_filtered_slab() {
        // Tiny in-plane scales degenerate the 2-D filter to the identity, so
        // the first plane equals the slab interior sample for sample.
        let fsm = engine(
            LengthScaleSet::from_components([2.0, 2.0, 2.0, 1e-8, 1e-8, 1e-8, 1e-8, 1e-8, 1e-8]),
            (3, 3),
        );
        let mut rb = fsm.allocate_box();
        let mut source = NormalSource::fixed(17);
        rb.fill(&mut source);

        let out = fsm.correlate(&rb, None);
        for j in 0..3 {
            for k in 0..3 {
                assert_eq!(
                    out[j * 3 + k].x.to_bits(),
                    rb.get(0, 0, j + 1, k + 1).to_bits()
                );
            }
        }
    }

    #[test]
    fn test_recursion_blends_previous_and_fresh() {
        let fsm = engine(LengthScaleSet::isotropic(2.0), (3, 3));
        let mut rb = fsm.allocate_box();

        // Zero slab: the fresh contribution vanishes and the output is the
        // previous plane scaled by the per-component retention weights.
        for c in 0..3 {
            let n = rb.dims(c).len();
            rb.set_component(c, vec![0.0; n]);
        }
        let prev = vec![Vec3::new(1.0, 2.0, 4.0); 9];

        let out = fsm.correlate(&rb, Some(&prev));
        let e1 = fsm.table().fsm_previous_weight(0);
        for v in &out {
            assert!((v.x - e1).abs() < TOL);
            assert!((v.y - 2.0 * e1).abs() < TOL);
            assert!((v.z - 4.0 * e1).abs() < TOL);
        }
    }

    #[test]
    fn test_zero_previous_scales_fresh_slab() {
        let fsm = engine(LengthScaleSet::isotropic(2.0), (4, 4));
        let mut rb = fsm.allocate_box();
        let mut source = NormalSource::fixed(29);
        rb.fill(&mut source);

        let fresh = fsm.correlate(&rb, None);
        let zeros = vec![Vec3::zero(); 16];
        let blended = fsm.correlate(&rb, Some(&zeros));

        let w2 = fsm.table().fsm_fresh_weight(0);
        for (b, f) in blended.iter().zip(&fresh) {
            assert!((b.x - w2 * f.x).abs() < TOL);
        }
    }
}
