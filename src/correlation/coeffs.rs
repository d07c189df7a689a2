//! Precomputed filter coefficients for the correlation engines.
//!
//! The digital-filter method shapes white noise into correlated fluctuations
//! by convolving with one-dimensional kernels, one per (plane direction,
//! velocity component) pair, derived from the integral length scales in
//! grid units (Klein et al., 2003, Eq. 14):
//!
//! ```text
//! b_k = exp(modelConst * k^2 / L^2) / norm     (Gaussian form)
//! b_k = exp(modelConst * |k| / L)  / norm      (exponential form)
//! ```
//!
//! The Gaussian kernel is normalized so the sum of squared weights is one
//! (the filter preserves variance); the exponential kernel is normalized so
//! the weights sum to one. The forward-stepwise method additionally uses two
//! per-component blending weights derived from the streamwise time scales
//! (Xie-Castro, 2008, Eq. 14).
//!
//! The table is computed once at initialization; the length-scale set cannot
//! change afterwards.

use crate::types::LengthScaleSet;

/// One-dimensional discrete filter kernel for one (direction, component).
#[derive(Clone, Debug)]
pub struct FilterKernel {
    /// Normalized weights at offsets -N..=N, stored at index k + N.
    weights: Vec<f64>,
    /// Kernel half-width N.
    half_width: usize,
}

impl FilterKernel {
    /// Build the kernel for a length scale in grid units.
    ///
    /// The support is three length scales on either side of the centre,
    /// N = ceil(3 L), which truncates the Gaussian tail below 1e-6 of the
    /// centre weight. The normalization denominator is floored by
    /// `threshold`.
    fn new(l_grid: f64, is_gaussian: bool, model_const: f64, threshold: f64) -> Self {
        let half_width = (3.0 * l_grid).ceil() as usize;
        let len = 2 * half_width + 1;

        let mut weights = Vec::with_capacity(len);
        for i in 0..len {
            let k = i as f64 - half_width as f64;
            let arg = if is_gaussian {
                model_const * k * k / (l_grid * l_grid)
            } else {
                model_const * k.abs() / l_grid
            };
            weights.push(arg.exp());
        }

        let norm = if is_gaussian {
            weights.iter().map(|b| b * b).sum::<f64>().sqrt()
        } else {
            weights.iter().sum::<f64>()
        }
        .max(threshold);

        for b in &mut weights {
            *b /= norm;
        }

        Self {
            weights,
            half_width,
        }
    }

    /// Normalized weights, offsets -N..=N.
    #[inline(always)]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Kernel half-width N.
    #[inline(always)]
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Kernel support 2N + 1.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false; the support is at least three weights.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Normalized kernel autocorrelation at integer lag r,
    /// sum_k b_k b_{k+r} / sum_k b_k^2.
    ///
    /// Filtering white noise with this kernel produces output whose
    /// two-point autocorrelation equals this function in expectation.
    pub fn autocorrelation(&self, lag: usize) -> f64 {
        let sum_sq: f64 = self.weights.iter().map(|b| b * b).sum();
        if lag >= self.weights.len() || sum_sq == 0.0 {
            return 0.0;
        }
        let overlap: f64 = self.weights[lag..]
            .iter()
            .zip(self.weights.iter())
            .map(|(a, b)| a * b)
            .sum();
        overlap / sum_sq
    }
}

/// Filter kernels for all nine (direction, component) pairs, plus the
/// forward-stepwise blending weights.
///
/// Directions follow the local patch frame (0 = e1 streamwise, 1 = e2,
/// 2 = e3); components are the velocity components (0 = u, 1 = v, 2 = w).
#[derive(Clone, Debug)]
pub struct FilterCoefficientTable {
    /// kernels[direction][component]
    kernels: [[FilterKernel; 3]; 3],
    /// Weight on the previous-step field per component,
    /// exp(const1FSM / L_e1c).
    fsm_previous: [f64; 3],
    /// Weight on the fresh filtered slab per component,
    /// sqrt(1 - exp(const2FSM / L_e1c)).
    fsm_fresh: [f64; 3],
}

impl FilterCoefficientTable {
    /// Compute the table from a length-scale set already converted to grid
    /// units (streamwise entries in time steps, in-plane entries in node
    /// spacings).
    pub fn new(
        scales: &LengthScaleSet,
        is_gaussian: bool,
        model_const: f64,
        const1_fsm: f64,
        const2_fsm: f64,
        threshold: f64,
    ) -> Self {
        let kernels = [0, 1, 2].map(|dir| {
            [0, 1, 2].map(|comp| {
                FilterKernel::new(scales.get(dir, comp), is_gaussian, model_const, threshold)
            })
        });

        let fsm_previous = [0, 1, 2].map(|comp| (const1_fsm / scales.get(0, comp)).exp());
        let fsm_fresh = [0, 1, 2].map(|comp| (1.0 - (const2_fsm / scales.get(0, comp)).exp()).sqrt());

        Self {
            kernels,
            fsm_previous,
            fsm_fresh,
        }
    }

    /// Kernel for a (direction, component) pair.
    #[inline(always)]
    pub fn kernel(&self, direction: usize, component: usize) -> &FilterKernel {
        &self.kernels[direction][component]
    }

    /// Kernel half-width for a (direction, component) pair.
    #[inline(always)]
    pub fn half_width(&self, direction: usize, component: usize) -> usize {
        self.kernels[direction][component].half_width()
    }

    /// Forward-stepwise weight on the previous-step field for a component.
    #[inline(always)]
    pub fn fsm_previous_weight(&self, component: usize) -> f64 {
        self.fsm_previous[component]
    }

    /// Forward-stepwise weight on the fresh filtered slab for a component.
    #[inline(always)]
    pub fn fsm_fresh_weight(&self, component: usize) -> f64 {
        self.fsm_fresh[component]
    }
}
