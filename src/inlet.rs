//! The turbulent inlet controller.
//!
//! [`TurbulentInlet`] owns one boundary patch's synthetic turbulence
//! pipeline end to end. Construction takes the validated configuration and
//! the patch geometry through every initialization stage: turbulence plane
//! and local frame, target statistics (uniform or profile-interpolated),
//! realizability check and stress factors, filter kernels, rolling
//! white-noise box, plane-to-patch pairing, and the reference flow rate.
//! A constructed inlet is ready; nothing else can fail.
//!
//! Each call to [`TurbulentInlet::evaluate`] with a fresh time index
//! advances the generator one step and returns the face-velocity field:
//!
//! 1. the rolling box discards its oldest slab and draws a fresh one,
//! 2. the correlation engine produces a unit-variance fluctuation plane,
//! 3. the stress factors embed anisotropy per node,
//! 4. the mean profile is added,
//! 5. the plane field is mapped onto the patch faces,
//! 6. the flow-rate correction rescales patch-normal components.
//!
//! Re-evaluating the same index returns the cached field unchanged, so the
//! host may call once per outer iteration without advancing the turbulence.
//!
//! With `is_continuous` set, [`TurbulentInlet::checkpoint`] persists the
//! complete mutable state and [`TurbulentInlet::with_state_dir`] restores
//! it, continuing the random sequence bit for bit across a restart. The
//! cached face field itself is the host solver's to persist; until the
//! first post-restart step the inlet reports the mean profile.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::config::{ConfigError, InletConfig, StressInput, Variant, VelocityInput};
use crate::correlation::{CorrelationEngine, RandomBox};
use crate::flow_rate::{net_flow_rate, FlowRateCorrector, FluxSum, SingleProcess};
use crate::interp::{GeometryError, PlanarInterpolation};
use crate::io::{
    read_state_file, state_path, write_state_file, ProfileFileError, StateFileError,
    StateSnapshot, TensorProfile, VectorProfile,
};
use crate::mapping::PatchMapper;
use crate::plane::{PatchGeometry, TurbulencePlane};
use crate::random::NormalSource;
use crate::stress::{RealizabilityError, StressRealizer};
use crate::types::Vec3;

/// Warn once per process when a continuous restart finds no state file.
static MISSING_STATE_WARNED: AtomicBool = AtomicBool::new(false);

/// Any fatal error raised while bringing an inlet up.
#[derive(Debug, Error)]
pub enum InletError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Realizability(#[from] RealizabilityError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Profile(#[from] ProfileFileError),

    #[error(transparent)]
    State(#[from] StateFileError),

    /// The persisted state was written by a differently configured inlet
    #[error("persisted state does not match this inlet: {0}")]
    StateMismatch(String),
}

/// All mutable per-step state of one inlet.
///
/// Grouped so the persistence layer and the stepping logic agree on exactly
/// what "generator state" means; everything else in the controller is
/// immutable after construction.
#[derive(Clone, Debug)]
pub struct GeneratorState {
    /// Last evaluated time index; `None` before the first step.
    pub time_index: Option<u64>,
    /// Random source, including its stream position.
    pub source: NormalSource,
    /// Rolling white-noise buffer.
    pub random_box: RandomBox,
    /// Previous correlated plane, kept for the forward-stepwise recursion.
    pub previous_plane: Option<Vec<Vec3>>,
    /// Reference flow rate captured at first initialization [m³/s].
    pub initial_flow_rate: f64,
}

/// Synthetic turbulence generator bound to one boundary patch.
pub struct TurbulentInlet {
    config: InletConfig,
    patch: PatchGeometry,
    plane: TurbulencePlane,
    engine: CorrelationEngine,
    realizer: StressRealizer,
    mapper: PatchMapper,
    corrector: Option<FlowRateCorrector>,
    flux_sum: Box<dyn FluxSum>,
    state: GeneratorState,
    patch_values: Vec<Vec3>,
}

impl std::fmt::Debug for TurbulentInlet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `flux_sum` is a trait object without Debug; every other field prints.
        f.debug_struct("TurbulentInlet")
            .field("config", &self.config)
            .field("patch", &self.patch)
            .field("plane", &self.plane)
            .field("engine", &self.engine)
            .field("realizer", &self.realizer)
            .field("mapper", &self.mapper)
            .field("corrector", &self.corrector)
            .field("state", &self.state)
            .field("patch_values", &self.patch_values)
            .finish_non_exhaustive()
    }
}

impl TurbulentInlet {
    /// Build a ready inlet from a configuration and the patch geometry.
    pub fn new(config: InletConfig, patch: PatchGeometry) -> Result<Self, InletError> {
        Self::build(config, patch, None)
    }

    /// Build an inlet, restoring persisted state from `dir` when the
    /// configuration asks for continuation.
    ///
    /// A missing state file is not an error: the inlet warns once per
    /// process and starts a fresh sequence, which is what a first run with
    /// `is_continuous` already set needs.
    pub fn with_state_dir(
        config: InletConfig,
        patch: PatchGeometry,
        dir: &Path,
    ) -> Result<Self, InletError> {
        let snapshot = if config.is_continuous {
            let path = state_path(dir, &config.name);
            if path.exists() {
                Some(read_state_file(&path)?)
            } else {
                if !MISSING_STATE_WARNED.swap(true, Ordering::Relaxed) {
                    eprintln!(
                        "Warning: no saved state at {} for '{}'; starting a fresh sequence",
                        path.display(),
                        config.name
                    );
                }
                None
            }
        } else {
            None
        };
        Self::build(config, patch, snapshot)
    }

    /// Replace the flux reduction used by the flow-rate correction.
    ///
    /// Hosts that split the patch across processes install their collective
    /// sum here; the default assumes one process owns the whole patch.
    pub fn with_flux_reducer(mut self, reducer: Box<dyn FluxSum>) -> Self {
        self.flux_sum = reducer;
        self
    }

    fn build(
        config: InletConfig,
        patch: PatchGeometry,
        snapshot: Option<StateSnapshot>,
    ) -> Result<Self, InletError> {
        config.validate()?;

        let mut plane =
            TurbulencePlane::from_patch(&patch, config.plane_divisions, config.threshold);

        match &config.mean_velocity {
            VelocityInput::Uniform(u) => plane.set_uniform_mean(*u),
            VelocityInput::Profile { points, values } => {
                let profile = VectorProfile::read(points, values)?;
                let weights = PlanarInterpolation::new(
                    &profile.points,
                    &plane.node_positions(),
                    config.perturb,
                )?;
                plane.set_mean(weights.interpolate(&profile.values));
            }
        }
        match &config.reynolds_stresses {
            StressInput::Uniform(r) => plane.set_uniform_stress(*r),
            StressInput::Profile { points, values } => {
                let profile = TensorProfile::read(points, values)?;
                let weights = PlanarInterpolation::new(
                    &profile.points,
                    &plane.node_positions(),
                    config.perturb,
                )?;
                plane.set_stress(weights.interpolate(&profile.values));
            }
        }

        let realizer = StressRealizer::new(&plane.stresses)?;

        let grid_scales = config.length_scales.to_grid_units(
            config.patch_normal_speed,
            config.dt,
            plane.spacing.0,
            plane.spacing.1,
            config.threshold,
        );
        let engine = CorrelationEngine::from_config(&config, &grid_scales, (plane.n2, plane.n3));

        let mapper = PatchMapper::new(config.map_method, &plane, &patch, config.perturb)?;

        // The reference flux comes from the mean profile alone; a restored
        // run keeps the value captured at its first initialization.
        let mean_on_patch = mapper.map(&plane.mean_velocity);
        let fresh_flow_rate = net_flow_rate(&patch, &mean_on_patch);

        let state = match snapshot {
            Some(snap) => Self::restore_state(&config, &engine, plane.n_nodes(), snap)?,
            None => {
                let mut source = if config.is_fixed_seed {
                    NormalSource::fixed(config.seed)
                } else {
                    NormalSource::from_clock()
                };
                let mut random_box = engine.allocate_box();
                random_box.fill(&mut source);
                GeneratorState {
                    time_index: None,
                    source,
                    random_box,
                    previous_plane: None,
                    initial_flow_rate: fresh_flow_rate,
                }
            }
        };

        let corrector = if config.is_corrected_flow_rate {
            Some(FlowRateCorrector::new(
                state.initial_flow_rate,
                config.threshold,
            ))
        } else {
            None
        };

        Ok(Self {
            config,
            patch,
            plane,
            engine,
            realizer,
            mapper,
            corrector,
            flux_sum: Box::new(SingleProcess),
            state,
            patch_values: mean_on_patch,
        })
    }

    /// Rebuild the generator state from a snapshot, rejecting state written
    /// by a differently configured inlet.
    fn restore_state(
        config: &InletConfig,
        engine: &CorrelationEngine,
        n_nodes: usize,
        snap: StateSnapshot,
    ) -> Result<GeneratorState, InletError> {
        if snap.name != config.name {
            return Err(InletError::StateMismatch(format!(
                "state file belongs to '{}', this inlet is '{}'",
                snap.name, config.name
            )));
        }
        if snap.variant != config.variant.name() {
            return Err(InletError::StateMismatch(format!(
                "state was written by the {} variant, this inlet runs {}",
                snap.variant,
                config.variant.name()
            )));
        }

        let mut random_box = engine.allocate_box();
        for c in 0..3 {
            let dims = random_box.dims(c);
            let expected = [dims.depth, dims.height, dims.width];
            if snap.box_dims[c] != expected {
                return Err(InletError::StateMismatch(format!(
                    "random box dims {:?} do not match the configured {:?}",
                    snap.box_dims[c], expected
                )));
            }
        }
        if let Some(prev) = &snap.previous_plane {
            if prev.len() != n_nodes {
                return Err(InletError::StateMismatch(format!(
                    "previous plane has {} nodes, the configured plane has {}",
                    prev.len(),
                    n_nodes
                )));
            }
        }

        let [d0, d1, d2] = snap.box_data;
        random_box.set_component(0, d0);
        random_box.set_component(1, d1);
        random_box.set_component(2, d2);

        Ok(GeneratorState {
            time_index: snap.time_index,
            source: NormalSource::restore(snap.seed, snap.word_pos),
            random_box,
            previous_plane: snap.previous_plane,
            initial_flow_rate: snap.initial_flow_rate,
        })
    }

    /// Face velocities for the given time index.
    ///
    /// A fresh index advances the generator one step; a repeated index
    /// returns the cached field untouched.
    pub fn evaluate(&mut self, time_index: u64) -> &[Vec3] {
        if self.state.time_index != Some(time_index) {
            self.advance(time_index);
        }
        &self.patch_values
    }

    fn advance(&mut self, time_index: u64) {
        let fluctuations = self.engine.step(
            &mut self.state.random_box,
            &mut self.state.source,
            self.state.previous_plane.as_deref(),
        );

        // The recursion consumes the raw correlated plane, before anisotropy.
        if self.engine.variant() == Variant::ForwardStepwise {
            self.state.previous_plane = Some(fluctuations.clone());
        }

        let mut plane_values = Vec::with_capacity(fluctuations.len());
        for (node, f) in fluctuations.iter().enumerate() {
            plane_values.push(self.plane.mean_velocity[node] + self.realizer.embed(node, f));
        }

        let mut mapped = self.mapper.map(&plane_values);
        if let Some(corrector) = &self.corrector {
            corrector.correct(&self.patch, &mut mapped, self.flux_sum.as_ref());
        }

        self.patch_values = mapped;
        self.state.time_index = Some(time_index);
    }

    /// Most recently evaluated face velocities.
    pub fn patch_values(&self) -> &[Vec3] {
        &self.patch_values
    }

    /// Persist the generator state into `dir` when continuation is enabled.
    ///
    /// Returns the written path, or `None` when `is_continuous` is off.
    pub fn checkpoint(&self, dir: &Path) -> Result<Option<PathBuf>, StateFileError> {
        if !self.config.is_continuous {
            return Ok(None);
        }
        let path = state_path(dir, &self.config.name);
        write_state_file(&path, &self.snapshot())?;
        Ok(Some(path))
    }

    /// Capture the complete mutable state.
    pub fn snapshot(&self) -> StateSnapshot {
        let mut box_dims = [[0_usize; 3]; 3];
        let mut box_data: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for c in 0..3 {
            let dims = self.state.random_box.dims(c);
            box_dims[c] = [dims.depth, dims.height, dims.width];
            box_data[c] = self.state.random_box.component(c).to_vec();
        }

        StateSnapshot {
            name: self.config.name.clone(),
            variant: self.config.variant.name().to_string(),
            time_index: self.state.time_index,
            seed: self.state.source.seed(),
            word_pos: self.state.source.word_pos(),
            initial_flow_rate: self.state.initial_flow_rate,
            box_dims,
            box_data,
            previous_plane: self.state.previous_plane.clone(),
        }
    }

    /// The configuration this inlet was built from.
    pub fn config(&self) -> &InletConfig {
        &self.config
    }

    /// The patch geometry this inlet serves.
    pub fn patch(&self) -> &PatchGeometry {
        &self.patch
    }

    /// The turbulence plane with its target statistics.
    pub fn plane(&self) -> &TurbulencePlane {
        &self.plane
    }

    /// The mutable per-step state.
    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    /// Reference flow rate the correction targets [m³/s].
    pub fn initial_flow_rate(&self) -> f64 {
        self.state.initial_flow_rate
    }
}
