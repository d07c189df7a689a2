//! Correlation-imposition engines for the turbulence plane.
//!
//! White noise from the rolling [`RandomBox`] is shaped into spatially and
//! temporally correlated fluctuations by one of two interchangeable
//! algorithms, selected once at configuration time:
//!
//! - [`DigitalFilter`]: a separable 3-D valid convolution against
//!   precomputed kernels (Klein et al., 2003); supports Gaussian and
//!   exponential autocorrelation shapes.
//! - [`ForwardStepwise`]: a 2-D in-plane convolution plus a first-order
//!   streamwise recursion (Xie-Castro, 2008); cheaper per step, restricted
//!   to the exponential shape.
//!
//! Each [`CorrelationEngine::step`] call advances the rolling buffer by
//! exactly one time slab and produces one plane of fluctuations with zero
//! mean and isotropic unit-variance statistics; anisotropy is embedded
//! afterwards by the stress realizer.

mod coeffs;
mod dfm;
mod fsm;
mod random_box;

pub use coeffs::{FilterCoefficientTable, FilterKernel};
pub use dfm::DigitalFilter;
pub use fsm::ForwardStepwise;
pub use random_box::{BoxDims, RandomBox};

use crate::config::{InletConfig, Variant};
use crate::random::NormalSource;
use crate::types::{LengthScaleSet, Vec3};

/// Zip three per-component scalar planes into one vector plane.
pub(crate) fn collect_components(planes: &[Vec<f64>; 3], n_nodes: usize) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(n_nodes);
    for n in 0..n_nodes {
        out.push(Vec3::new(planes[0][n], planes[1][n], planes[2][n]));
    }
    out
}

/// Correlation engine, dispatching to the variant chosen at construction.
#[derive(Clone, Debug)]
pub enum CorrelationEngine {
    /// Digital-filter method: full separable 3-D convolution.
    DigitalFilter(DigitalFilter),
    /// Forward-stepwise method: 2-D convolution plus recursion.
    ForwardStepwise(ForwardStepwise),
}

impl CorrelationEngine {
    /// Build the engine named by the configuration, computing the kernel
    /// table from the grid-unit length scales.
    pub fn from_config(
        config: &InletConfig,
        grid_scales: &LengthScaleSet,
        plane: (usize, usize),
    ) -> Self {
        let table = FilterCoefficientTable::new(
            grid_scales,
            config.is_gaussian,
            config.model_const,
            config.const1_fsm,
            config.const2_fsm,
            config.threshold,
        );
        match config.variant {
            Variant::DigitalFilter => Self::DigitalFilter(DigitalFilter::new(table, plane)),
            Variant::ForwardStepwise => Self::ForwardStepwise(ForwardStepwise::new(table, plane)),
        }
    }

    /// The variant this engine implements.
    pub fn variant(&self) -> Variant {
        match self {
            Self::DigitalFilter(_) => Variant::DigitalFilter,
            Self::ForwardStepwise(_) => Variant::ForwardStepwise,
        }
    }

    /// The precomputed kernel table.
    pub fn table(&self) -> &FilterCoefficientTable {
        match self {
            Self::DigitalFilter(dfm) => dfm.table(),
            Self::ForwardStepwise(fsm) => fsm.table(),
        }
    }

    /// Allocate the rolling box sized for this engine.
    pub fn allocate_box(&self) -> RandomBox {
        match self {
            Self::DigitalFilter(dfm) => dfm.allocate_box(),
            Self::ForwardStepwise(fsm) => fsm.allocate_box(),
        }
    }

    /// Advance the rolling buffer by one time index and produce the next
    /// fluctuation plane.
    ///
    /// `previous` is the cached previous-step plane, used only by the
    /// forward-stepwise recursion; the digital filter ignores it.
    pub fn step(
        &self,
        random_box: &mut RandomBox,
        source: &mut NormalSource,
        previous: Option<&[Vec3]>,
    ) -> Vec<Vec3> {
        random_box.shift_refill(source);
        match self {
            Self::DigitalFilter(dfm) => {
                #[cfg(feature = "parallel")]
                {
                    dfm.correlate_parallel(random_box)
                }
                #[cfg(not(feature = "parallel"))]
                {
                    dfm.correlate(random_box)
                }
            }
            Self::ForwardStepwise(fsm) => fsm.correlate(random_box, previous),
        }
    }
}
