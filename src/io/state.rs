//! Persisted generator state for restart continuation.
//!
//! With `is_continuous` set, the controller saves its complete mutable state
//! at checkpoint time and restores it at start-up, so a restarted simulation
//! continues the exact random sequence of the uninterrupted run.
//!
//! The file is line-oriented `key value...` text:
//!
//! ```text
//! # synthetic turbulence generator state
//! name inlet
//! variant digitalFilter
//! timeIndex 42
//! seed 1234567
//! wordPos 6291456
//! initialFlowRate 1.2599999999999998
//! boxDims0 3 10 10
//! boxData0 -0.8423... 0.1175... (one value per box cell)
//! ```
//!
//! Floats are written with Rust's default formatting, which emits the
//! shortest decimal that parses back to the identical bits, so restore is
//! bit-exact without hex encoding.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Vec3;

/// Error type for state file reading and writing.
#[derive(Debug, Error)]
pub enum StateFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse error with line number
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// A required entry never appeared
    #[error("State file is missing entry '{0}'")]
    MissingKey(&'static str),

    /// An entry's value count disagrees with the declared dimensions
    #[error("State entry '{key}' has {found} values, expected {expected}")]
    SizeMismatch {
        key: String,
        expected: usize,
        found: usize,
    },
}

/// Complete serializable generator state.
///
/// Mirrors the controller's `GeneratorState` plus the identity entries
/// (instance name, variant) used to reject a state file written by a
/// differently configured inlet.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Controller instance name.
    pub name: String,
    /// Variant name, e.g. `digitalFilter`.
    pub variant: String,
    /// Last evaluated time index, absent before the first step.
    pub time_index: Option<u64>,
    /// RNG seed of the run.
    pub seed: u64,
    /// RNG stream position in 32-bit words.
    pub word_pos: u128,
    /// Reference flow rate computed at first initialization [m³/s].
    pub initial_flow_rate: f64,
    /// Random-box dimensions (depth, height, width) per component.
    pub box_dims: [[usize; 3]; 3],
    /// Random-box contents per component, flattened.
    pub box_data: [Vec<f64>; 3],
    /// Previous correlated plane field (forward-stepwise only).
    pub previous_plane: Option<Vec<Vec3>>,
}

/// Conventional state file location for a named controller instance.
pub fn state_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.turbulenceState"))
}

/// Write a snapshot to `path`, replacing any previous file.
pub fn write_state_file(path: &Path, snapshot: &StateSnapshot) -> Result<(), StateFileError> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "# synthetic turbulence generator state")?;
    writeln!(w, "name {}", snapshot.name)?;
    writeln!(w, "variant {}", snapshot.variant)?;
    if let Some(index) = snapshot.time_index {
        writeln!(w, "timeIndex {index}")?;
    }
    writeln!(w, "seed {}", snapshot.seed)?;
    writeln!(w, "wordPos {}", snapshot.word_pos)?;
    writeln!(w, "initialFlowRate {}", snapshot.initial_flow_rate)?;

    for (c, dims) in snapshot.box_dims.iter().enumerate() {
        writeln!(w, "boxDims{c} {} {} {}", dims[0], dims[1], dims[2])?;
    }
    for (c, data) in snapshot.box_data.iter().enumerate() {
        write!(w, "boxData{c}")?;
        for v in data {
            write!(w, " {v}")?;
        }
        writeln!(w)?;
    }
    if let Some(plane) = &snapshot.previous_plane {
        write!(w, "previousPlane")?;
        for v in plane {
            write!(w, " {} {} {}", v.x, v.y, v.z)?;
        }
        writeln!(w)?;
    }

    w.flush()?;
    Ok(())
}

/// Read a snapshot back from `path`.
pub fn read_state_file(path: &Path) -> Result<StateSnapshot, StateFileError> {
    parse_state(&fs::read_to_string(path)?)
}

/// Parse a snapshot from its text form.
pub fn parse_state(content: &str) -> Result<StateSnapshot, StateFileError> {
    let mut name: Option<String> = None;
    let mut variant: Option<String> = None;
    let mut time_index: Option<u64> = None;
    let mut seed: Option<u64> = None;
    let mut word_pos: Option<u128> = None;
    let mut initial_flow_rate: Option<f64> = None;
    let mut box_dims: [Option<[usize; 3]>; 3] = [None, None, None];
    let mut box_data: [Option<Vec<f64>>; 3] = [None, None, None];
    let mut previous_plane: Option<Vec<Vec3>> = None;

    for (line_num, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = line_num + 1;

        let (key, rest) = line
            .split_once(char::is_whitespace)
            .ok_or(StateFileError::ParseError {
                line: line_no,
                message: "Expected: key value".into(),
            })?;
        let rest = rest.trim();

        match key {
            "name" => name = Some(rest.to_string()),
            "variant" => variant = Some(rest.to_string()),
            "timeIndex" => time_index = Some(parse_scalar(rest, line_no)?),
            "seed" => seed = Some(parse_scalar(rest, line_no)?),
            "wordPos" => word_pos = Some(parse_scalar(rest, line_no)?),
            "initialFlowRate" => initial_flow_rate = Some(parse_scalar(rest, line_no)?),
            "boxDims0" | "boxDims1" | "boxDims2" => {
                let c = component_index(key);
                let values: Vec<usize> = parse_list(rest, line_no)?;
                if values.len() != 3 {
                    return Err(StateFileError::ParseError {
                        line: line_no,
                        message: "Expected: depth height width".into(),
                    });
                }
                box_dims[c] = Some([values[0], values[1], values[2]]);
            }
            "boxData0" | "boxData1" | "boxData2" => {
                let c = component_index(key);
                box_data[c] = Some(parse_list(rest, line_no)?);
            }
            "previousPlane" => {
                let flat: Vec<f64> = parse_list(rest, line_no)?;
                if flat.len() % 3 != 0 {
                    return Err(StateFileError::ParseError {
                        line: line_no,
                        message: "previousPlane needs 3 values per node".into(),
                    });
                }
                previous_plane = Some(
                    flat.chunks_exact(3)
                        .map(|v| Vec3::new(v[0], v[1], v[2]))
                        .collect(),
                );
            }
            _ => {
                return Err(StateFileError::ParseError {
                    line: line_no,
                    message: format!("Unknown key '{key}'"),
                });
            }
        }
    }

    let name = name.ok_or(StateFileError::MissingKey("name"))?;
    let variant = variant.ok_or(StateFileError::MissingKey("variant"))?;
    let seed = seed.ok_or(StateFileError::MissingKey("seed"))?;
    let word_pos = word_pos.ok_or(StateFileError::MissingKey("wordPos"))?;
    let initial_flow_rate =
        initial_flow_rate.ok_or(StateFileError::MissingKey("initialFlowRate"))?;

    let mut dims = [[0; 3]; 3];
    let mut data: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for c in 0..3 {
        dims[c] = box_dims[c].ok_or(StateFileError::MissingKey("boxDims"))?;
        data[c] = box_data[c].take().ok_or(StateFileError::MissingKey("boxData"))?;

        let expected = dims[c][0] * dims[c][1] * dims[c][2];
        if data[c].len() != expected {
            return Err(StateFileError::SizeMismatch {
                key: format!("boxData{c}"),
                expected,
                found: data[c].len(),
            });
        }
    }

    Ok(StateSnapshot {
        name,
        variant,
        time_index,
        seed,
        word_pos,
        initial_flow_rate,
        box_dims: dims,
        box_data: data,
        previous_plane,
    })
}

fn component_index(key: &str) -> usize {
    match key.as_bytes()[key.len() - 1] {
        b'0' => 0,
        b'1' => 1,
        _ => 2,
    }
}

fn parse_scalar<T: std::str::FromStr>(text: &str, line: usize) -> Result<T, StateFileError> {
    text.parse().map_err(|_| StateFileError::ParseError {
        line,
        message: format!("Invalid value '{text}'"),
    })
}

fn parse_list<T: std::str::FromStr>(text: &str, line: usize) -> Result<Vec<T>, StateFileError> {
    text.split_whitespace()
        .map(|part| parse_scalar(part, line))
        .collect()
}
