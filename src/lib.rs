//! # synturb
//!
//! Synthetic turbulence generation for LES and DES inflow boundaries.
//!
//! This crate provides the building blocks of a digital-filter turbulence
//! generator and assembles them into a per-patch inlet:
//! - Patch geometry and the virtual turbulence plane
//! - Integral length scales and their grid-unit conversion
//! - Filter kernels (Gaussian, exponential) and coefficient tables
//! - Rolling white-noise boxes with a reproducible draw order
//! - Digital-filter and forward-stepwise correlation engines
//! - Reynolds-stress realizability and anisotropy embedding
//! - Plane-to-patch mapping (nearest node or planar interpolation)
//! - Flow-rate correction against the mean-profile reference
//! - Profile input files and restart state persistence

pub mod config;
pub mod correlation;
pub mod flow_rate;
pub mod inlet;
pub mod interp;
pub mod io;
pub mod mapping;
pub mod plane;
pub mod random;
pub mod stress;
pub mod types;

// Re-export main types for convenience
pub use config::{ConfigError, InletConfig, MapMethod, StressInput, Variant, VelocityInput};
pub use correlation::{
    BoxDims, CorrelationEngine, DigitalFilter, FilterCoefficientTable, FilterKernel,
    ForwardStepwise, RandomBox,
};
pub use flow_rate::{net_flow_rate, FlowRateCorrector, FluxSum, SingleProcess};
pub use inlet::{GeneratorState, InletError, TurbulentInlet};
pub use interp::{GeometryError, PlanarInterpolation};
pub use mapping::PatchMapper;
pub use plane::{PatchGeometry, PlaneFrame, TurbulencePlane};
pub use random::{NormalSource, DEFAULT_SEED};
pub use stress::{RealizabilityError, StressRealizer};
pub use types::{Blend, LengthScaleSet, LowerTriangular3, SymmTensor3, Vec3};

// I/O types
pub use io::{
    parse_points, parse_state, parse_symm_tensors, parse_vectors, read_points_file,
    read_state_file, read_symm_tensor_file, read_vector_file, state_path, write_state_file,
    ProfileFileError, StateFileError, StateSnapshot, TensorProfile, VectorProfile,
};
