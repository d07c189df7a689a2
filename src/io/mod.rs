//! I/O utilities for reading and writing data files.
//!
//! This module provides:
//! - **Boundary-data profiles**: Per-point mean-velocity and Reynolds-stress
//!   input for non-uniform inlets
//! - **Generator state**: Save and restore of the complete generator state
//!   for bit-exact restart continuation
//!
//! # File Formats
//!
//! ## Profile Files
//!
//! A points file paired with a value file, one entry per line:
//!
//! ```text
//! # inlet profile points
//! # columns: x(m) y(m) z(m)
//! 0.0 0.05 0.10
//! 0.0 0.05 0.20
//! ```
//!
//! ```text
//! # mean velocity
//! # columns: ux(m/s) uy(m/s) uz(m/s)
//! 8.5 0.0 0.0
//! 9.5 0.0 0.0
//! ```
//!
//! ## State Files
//!
//! ```text
//! # synthetic turbulence generator state
//! name inlet
//! variant digitalFilter
//! timeIndex 42
//! seed 1234567
//! wordPos 6291456
//! ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use synturb::io::{read_state_file, VectorProfile};
//!
//! let profile = VectorProfile::read(
//!     Path::new("constant/boundaryData/inlet/points"),
//!     Path::new("constant/boundaryData/inlet/UMean"),
//! )?;
//! println!("profile has {} points", profile.points.len());
//!
//! let state = read_state_file(Path::new("constant/inlet.turbulenceState"))?;
//! println!("resuming at time index {:?}", state.time_index);
//! ```

mod profile;
mod state;

pub use profile::{
    parse_points, parse_symm_tensors, parse_vectors, read_points_file, read_symm_tensor_file,
    read_vector_file, ProfileFileError, TensorProfile, VectorProfile,
};
pub use state::{
    parse_state, read_state_file, state_path, write_state_file, StateFileError, StateSnapshot,
};
