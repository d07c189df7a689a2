//! Digital-filter correlation engine (Klein et al., 2003).
//!
//! Imposes the target two-point correlations by convolving the random box
//! with the precomputed one-dimensional kernels. The 3-D convolution is
//! separable: one pass per direction reduces the O(depth^3) stencil per
//! output node to three sequential O(depth) passes. All passes are
//! valid-mode, so the padded box collapses to exactly one height x width
//! plane of correlated fluctuations per component.

use crate::correlation::coeffs::FilterCoefficientTable;
use crate::correlation::collect_components;
use crate::correlation::random_box::RandomBox;
use crate::types::Vec3;

/// Separable 3-D valid convolution over the rolling random box.
#[derive(Clone, Debug)]
pub struct DigitalFilter {
    table: FilterCoefficientTable,
    height: usize,
    width: usize,
}

impl DigitalFilter {
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

    /// Allocate the rolling box sized for this engine's kernels.
    pub fn allocate_box(&self) -> RandomBox {
        RandomBox::for_digital_filter((self.height, self.width), &self.table)
    }

    /// Convolve the current box contents into one fluctuation plane.
    pub fn correlate(&self, random_box: &RandomBox) -> Vec<Vec3> {
        let planes = [0, 1, 2].map(|c| self.filter_component(random_box, c));
        collect_components(&planes, self.height * self.width)
    }

    /// Parallel version of [`Self::correlate`] using Rayon.
    ///
    /// Parallelizes the convolution passes across output rows; the
    /// summation order per node is unchanged, so the result is identical
    /// to the serial version.
    #[cfg(feature = "parallel")]
    pub fn correlate_parallel(&self, random_box: &RandomBox) -> Vec<Vec3> {
        let planes = [0, 1, 2].map(|c| self.filter_component_parallel(random_box, c));
        collect_components(&planes, self.height * self.width)
    }

    /// Three-pass separable convolution for one velocity component.
    fn filter_component(&self, random_box: &RandomBox, c: usize) -> Vec<f64> {
        let dims = random_box.dims(c);
        let data = random_box.component(c);
        let k1 = self.table.kernel(0, c).weights();
        let k2 = self.table.kernel(1, c).weights();
        let k3 = self.table.kernel(2, c).weights();

        // Pass 1 (e1): collapse the streamwise depth onto one padded slab.
        let slab = dims.slab_len();
        let mut tmp1 = vec![0.0; slab];
        for (p, &w) in k1.iter().enumerate() {
            let src = &data[p * slab..(p + 1) * slab];
            for (acc, &x) in tmp1.iter_mut().zip(src) {
                *acc += w * x;
            }
        }

        // Pass 2 (e2): collapse the row padding.
        let mut tmp2 = vec![0.0; self.height * dims.width];
        for (q, &w) in k2.iter().enumerate() {
            for j in 0..self.height {
                let src = &tmp1[(j + q) * dims.width..(j + q + 1) * dims.width];
                let dst = &mut tmp2[j * dims.width..(j + 1) * dims.width];
                for (acc, &x) in dst.iter_mut().zip(src) {
                    *acc += w * x;
                }
            }
        }

        // Pass 3 (e3): collapse the column padding.
        let mut out = vec![0.0; self.height * self.width];
        for j in 0..self.height {
            let row = &tmp2[j * dims.width..(j + 1) * dims.width];
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

    /// Row-parallel variant of [`Self::filter_component`].
    #[cfg(feature = "parallel")]
    fn filter_component_parallel(&self, random_box: &RandomBox, c: usize) -> Vec<f64> {
        use rayon::prelude::*;

        let dims = random_box.dims(c);
        let data = random_box.component(c);
        let k1 = self.table.kernel(0, c).weights();
        let k2 = self.table.kernel(1, c).weights();
        let k3 = self.table.kernel(2, c).weights();

        let mut tmp1 = vec![0.0; dims.slab_len()];
        tmp1.par_chunks_mut(dims.width)
            .enumerate()
            .for_each(|(j, row)| {
                for (p, &w) in k1.iter().enumerate() {
                    let src = &data[dims.index(p, j, 0)..dims.index(p, j, 0) + dims.width];
                    for (acc, &x) in row.iter_mut().zip(src) {
                        *acc += w * x;
                    }
                }
            });

        let mut tmp2 = vec![0.0; self.height * dims.width];
        tmp2.par_chunks_mut(dims.width)
            .enumerate()
            .for_each(|(j, row)| {
                for (q, &w) in k2.iter().enumerate() {
                    let src = &tmp1[(j + q) * dims.width..(j + q + 1) * dims.width];
                    for (acc, &x) in row.iter_mut().zip(src) {
                        *acc += w * x;
                    }
                }
            });

        let mut out = vec![0.0; self.height * self.width];
        out.par_chunks_mut(self.width)
            .enumerate()
            .for_each(|(j, dst)| {
                let row = &tmp2[j * dims.width..(j + 1) * dims.width];
                for (k, acc) in dst.iter_mut().enumerate() {
                    let mut sum = 0.0;
                    for (r, &w) in k3.iter().enumerate() {
                        sum += w * row[k + r];
                    }
                    *acc = sum;
                }
            });

        out
    }
}
