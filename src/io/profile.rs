//! Readers for boundary-data profile files.
//!
//! A profile consists of a points file and a matching value file, one entry
//! per line:
//!
//! ```text
//! # inlet profile points
//! # columns: x(m) y(m) z(m)
//! 0.0 0.05 0.10
//! 0.0 0.05 0.20
//! ```
//!
//! Value files carry three columns for vectors (ux uy uz) or six for
//! symmetric tensors (xx xy xz yy yz zz). Blank lines and `#` comments are
//! skipped; extra columns are ignored. The two files of a profile must have
//! the same number of entries.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::types::{SymmTensor3, Vec3};

/// Error type for profile file parsing.
#[derive(Debug, Error)]
pub enum ProfileFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse error with line number
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file (no data records)
    #[error("Profile file contains no data")]
    EmptyFile,

    /// Points and value files disagree on the entry count
    #[error("Profile has {points} points but {values} values")]
    CountMismatch { points: usize, values: usize },
}

/// Parse fixed-width numeric rows, skipping blanks and comments.
fn parse_columns<const N: usize>(
    content: &str,
    expected: &str,
) -> Result<Vec<[f64; N]>, ProfileFileError> {
    let mut rows = Vec::new();

    for (line_num, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < N {
            return Err(ProfileFileError::ParseError {
                line: line_num + 1,
                message: format!("Expected: {expected}"),
            });
        }

        let mut row = [0.0; N];
        for (slot, part) in row.iter_mut().zip(parts.iter()) {
            *slot = part.parse().map_err(|_| ProfileFileError::ParseError {
                line: line_num + 1,
                message: format!("Invalid value '{part}'"),
            })?;
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ProfileFileError::EmptyFile);
    }
    Ok(rows)
}

/// Parse profile points (x y z per line) from a string.
pub fn parse_points(content: &str) -> Result<Vec<Vec3>, ProfileFileError> {
    let rows = parse_columns::<3>(content, "x y z")?;
    Ok(rows.into_iter().map(Vec3::from_array).collect())
}

/// Parse vector values (ux uy uz per line) from a string.
pub fn parse_vectors(content: &str) -> Result<Vec<Vec3>, ProfileFileError> {
    let rows = parse_columns::<3>(content, "ux uy uz")?;
    Ok(rows.into_iter().map(Vec3::from_array).collect())
}

/// Parse symmetric tensor values (xx xy xz yy yz zz per line) from a string.
pub fn parse_symm_tensors(content: &str) -> Result<Vec<SymmTensor3>, ProfileFileError> {
    let rows = parse_columns::<6>(content, "xx xy xz yy yz zz")?;
    Ok(rows.into_iter().map(SymmTensor3::from_array).collect())
}

/// Read a profile points file.
pub fn read_points_file(path: &Path) -> Result<Vec<Vec3>, ProfileFileError> {
    parse_points(&fs::read_to_string(path)?)
}

/// Read a vector value file.
pub fn read_vector_file(path: &Path) -> Result<Vec<Vec3>, ProfileFileError> {
    parse_vectors(&fs::read_to_string(path)?)
}

/// Read a symmetric-tensor value file.
pub fn read_symm_tensor_file(path: &Path) -> Result<Vec<SymmTensor3>, ProfileFileError> {
    parse_symm_tensors(&fs::read_to_string(path)?)
}

/// A mean-velocity profile: points with one vector per point.
#[derive(Clone, Debug)]
pub struct VectorProfile {
    /// Profile point coordinates.
    pub points: Vec<Vec3>,
    /// Velocity at each point [m/s].
    pub values: Vec<Vec3>,
}

impl VectorProfile {
    /// Read and pair a points file with a vector value file.
    pub fn read(points_path: &Path, values_path: &Path) -> Result<Self, ProfileFileError> {
        let points = read_points_file(points_path)?;
        let values = read_vector_file(values_path)?;
        if points.len() != values.len() {
            return Err(ProfileFileError::CountMismatch {
                points: points.len(),
                values: values.len(),
            });
        }
        Ok(Self { points, values })
    }
}

/// A Reynolds-stress profile: points with one symmetric tensor per point.
#[derive(Clone, Debug)]
pub struct TensorProfile {
    /// Profile point coordinates.
    pub points: Vec<Vec3>,
    /// Stress tensor at each point [m²/s²].
    pub values: Vec<SymmTensor3>,
}

impl TensorProfile {
    /// Read and pair a points file with a tensor value file.
    pub fn read(points_path: &Path, values_path: &Path) -> Result<Self, ProfileFileError> {
        let points = read_points_file(points_path)?;
        let values = read_symm_tensor_file(values_path)?;
        if points.len() != values.len() {
            return Err(ProfileFileError::CountMismatch {
                points: points.len(),
                values: values.len(),
            });
        }
        Ok(Self { points, values })
    }
}
