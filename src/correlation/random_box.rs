//! Rolling 3-D buffer of standard-normal samples.
//!
//! Each velocity component owns one box of independent draws sized so that a
//! valid-mode separable convolution against the component's filter kernels
//! yields exactly one plane of output nodes. Per distinct time index the box
//! is advanced by one slab (shift-refill) instead of being regenerated,
//! which amortizes the random-number cost to one plane-sized slab per step.
//!
//! Draw ordering is part of the persistence and replay contract:
//!
//! - [`RandomBox::fill`] draws the components in u, v, w order, each
//!   component's box in (slab, row, column) index order, slab 0 nearest the
//!   patch and the last slab furthest upstream;
//! - [`RandomBox::shift_refill`] discards slab 0, moves every remaining slab
//!   one position toward the patch, and draws one fresh slab at the far end,
//!   again in u, v, w order with each slab row-major.
//!
//! Restoring a persisted box and replaying the same shift-refill sequence
//! therefore reproduces the original draw stream bit for bit.

use crate::correlation::coeffs::FilterCoefficientTable;
use crate::random::NormalSource;

/// Dimensions of one component's random box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxDims {
    /// Slabs along e1 (streamwise); the filter support 2N+1, or 1 for the
    /// forward-stepwise variant.
    pub depth: usize,
    /// Rows along e2: plane height plus the e2 kernel padding 2N.
    pub height: usize,
    /// Columns along e3: plane width plus the e3 kernel padding 2N.
    pub width: usize,
}

impl BoxDims {
    /// Total number of samples.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.depth * self.height * self.width
    }

    /// True for a zero-sized box; never the case after construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples per slab.
    #[inline(always)]
    pub fn slab_len(&self) -> usize {
        self.height * self.width
    }

    /// Flat index of sample (slab, row, column).
    #[inline(always)]
    pub fn index(&self, p: usize, j: usize, k: usize) -> usize {
        (p * self.height + j) * self.width + k
    }
}

/// Per-component rolling buffers of standard-normal samples.
#[derive(Clone, Debug)]
pub struct RandomBox {
    dims: [BoxDims; 3],
    data: [Vec<f64>; 3],
}

impl RandomBox {
    /// Allocate boxes for the digital-filter variant: the streamwise depth is
    /// the full filter support of each component's e1 kernel.
    pub fn for_digital_filter(plane: (usize, usize), table: &FilterCoefficientTable) -> Self {
        Self::with_depths(plane, table, |c| 2 * table.half_width(0, c) + 1)
    }

    /// Allocate boxes for the forward-stepwise variant: a single slab per
    /// component, since the streamwise correlation comes from the recursion
    /// rather than a convolution.
    pub fn for_forward_stepwise(plane: (usize, usize), table: &FilterCoefficientTable) -> Self {
        Self::with_depths(plane, table, |_| 1)
    }

    fn with_depths(
        plane: (usize, usize),
        table: &FilterCoefficientTable,
        depth: impl Fn(usize) -> usize,
    ) -> Self {
        let (height, width) = plane;
        let dims = [0, 1, 2].map(|c| BoxDims {
            depth: depth(c),
            height: height + 2 * table.half_width(1, c),
            width: width + 2 * table.half_width(2, c),
        });
        let data = dims.map(|d| vec![0.0; d.len()]);
        Self { dims, data }
    }

    /// Dimensions of one component's box.
    #[inline(always)]
    pub fn dims(&self, component: usize) -> BoxDims {
        self.dims[component]
    }

    /// Sample at (slab, row, column) of one component's box.
    #[inline(always)]
    pub fn get(&self, component: usize, p: usize, j: usize, k: usize) -> f64 {
        self.data[component][self.dims[component].index(p, j, k)]
    }

    /// Flat view of one component's box.
    #[inline(always)]
    pub fn component(&self, component: usize) -> &[f64] {
        &self.data[component]
    }

    /// Replace one component's box contents, used when restoring persisted
    /// state. The caller has already checked the dimensions.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not match the allocated box length.
    pub fn set_component(&mut self, component: usize, data: Vec<f64>) {
        assert_eq!(
            data.len(),
            self.dims[component].len(),
            "restored box length does not match its dimensions"
        );
        self.data[component] = data;
    }

    /// Draw the entire box contents afresh.
    pub fn fill(&mut self, source: &mut NormalSource) {
        for data in &mut self.data {
            source.fill(data);
        }
    }

    /// Advance by one time step: discard the slab nearest the patch, shift
    /// the remaining slabs one position toward it, and draw a fresh slab at
    /// the far end.
    ///
    /// For single-slab boxes this reduces to redrawing the slab.
    pub fn shift_refill(&mut self, source: &mut NormalSource) {
        for (dims, data) in self.dims.iter().zip(self.data.iter_mut()) {
            let slab = dims.slab_len();
            data.copy_within(slab.., 0);
            let tail = data.len() - slab;
            source.fill(&mut data[tail..]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    use crate::types::LengthScaleSet;

    fn table(scales: LengthScaleSet) -> FilterCoefficientTable {
        FilterCoefficientTable::new(&scales, true, -0.5 * PI, -0.25 * PI, -0.5 * PI, 1e-8)
    }

    #[test]
    fn test_digital_filter_dims() {
        // L = 1 in every direction: half-width 3, so depth 7 and padding 6.
        let t = table(LengthScaleSet::isotropic(1.0));
        let rb = RandomBox::for_digital_filter((4, 5), &t);

        for c in 0..3 {
            assert_eq!(
                rb.dims(c),
                BoxDims {
                    depth: 7,
                    height: 10,
                    width: 11
                }
            );
        }
    }

    #[test]
    fn test_forward_stepwise_single_slab() {
        let t = table(LengthScaleSet::isotropic(1.0));
        let rb = RandomBox::for_forward_stepwise((4, 5), &t);

        for c in 0..3 {
            assert_eq!(rb.dims(c).depth, 1);
            assert_eq!(rb.component(c).len(), 10 * 11);
        }
    }

    #[test]
    fn test_fill_follows_draw_order() {
        let t = table(LengthScaleSet::isotropic(1e-8));
        let mut rb = RandomBox::for_digital_filter((2, 2), &t);

        let mut source = NormalSource::fixed(11);
        rb.fill(&mut source);

        // Replay the documented order: u box first, index (p, j, k) flattened.
        let mut replay = NormalSource::fixed(11);
        let dims = rb.dims(0);
        assert_eq!(dims.depth, 3);
        for p in 0..dims.depth {
            for j in 0..dims.height {
                for k in 0..dims.width {
                    assert_eq!(rb.get(0, p, j, k).to_bits(), replay.next().to_bits());
                }
            }
        }
        // Then the v box.
        assert_eq!(rb.get(1, 0, 0, 0).to_bits(), replay.next().to_bits());
    }

    #[test]
    fn test_shift_moves_slabs_toward_patch() {
        let t = table(LengthScaleSet::isotropic(1e-8));
        let mut rb = RandomBox::for_digital_filter((3, 3), &t);

        let mut source = NormalSource::fixed(5);
        rb.fill(&mut source);
        let before = rb.clone();

        rb.shift_refill(&mut source);

        for c in 0..3 {
            let dims = rb.dims(c);
            // Slab p now holds what slab p + 1 held before.
            for p in 0..dims.depth - 1 {
                for j in 0..dims.height {
                    for k in 0..dims.width {
                        assert_eq!(
                            rb.get(c, p, j, k).to_bits(),
                            before.get(c, p + 1, j, k).to_bits()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_refill_draws_one_slab_per_component() {
        let t = table(LengthScaleSet::isotropic(1e-8));
        let mut rb = RandomBox::for_digital_filter((3, 3), &t);

        let mut source = NormalSource::fixed(5);
        rb.fill(&mut source);

        // Replay the refill draws independently.
        let mut replay = source.clone();
        rb.shift_refill(&mut source);

        for c in 0..3 {
            let dims = rb.dims(c);
            let last = dims.depth - 1;
            for j in 0..dims.height {
                for k in 0..dims.width {
                    assert_eq!(rb.get(c, last, j, k).to_bits(), replay.next().to_bits());
                }
            }
        }
    }

    #[test]
    fn test_single_slab_refill_replaces_everything() {
        let t = table(LengthScaleSet::isotropic(1.0));
        let mut rb = RandomBox::for_forward_stepwise((3, 3), &t);

        let mut source = NormalSource::fixed(5);
        rb.fill(&mut source);
        let before = rb.clone();

        rb.shift_refill(&mut source);

        let changed = (0..3)
            .flat_map(|c| {
                rb.component(c)
                    .iter()
                    .zip(before.component(c))
                    .map(|(a, b)| a != b)
            })
            .filter(|&x| x)
            .count();
        assert!(changed > 0, "refill must draw new samples");
    }
}
