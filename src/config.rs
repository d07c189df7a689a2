//! Configuration of the turbulent inlet.
//!
//! Mirrors the boundary-condition dictionary of the generator: the required
//! entries are constructor arguments, the optional entries carry the
//! documented defaults and are overridden with builder methods. Validation
//! runs once, before any state is allocated, and every violation is a fatal
//! configuration error.

use std::f64::consts::PI;
use std::path::PathBuf;

use thiserror::Error;

use crate::random::DEFAULT_SEED;
use crate::types::{LengthScaleSet, SymmTensor3, Vec3};

/// Synthetic turbulence generator variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Digital-filter method (Klein et al., 2003): full 3-D convolution.
    DigitalFilter,
    /// Forward-stepwise method (Xie-Castro, 2008): 2-D convolution plus a
    /// streamwise recursion, restricted to exponential autocorrelation.
    ForwardStepwise,
}

impl Variant {
    /// Name used in messages and persisted state.
    pub fn name(&self) -> &'static str {
        match self {
            Variant::DigitalFilter => "digitalFilter",
            Variant::ForwardStepwise => "forwardStepwise",
        }
    }
}

/// Method used to carry plane-node values onto patch faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapMethod {
    /// One-to-one map to the nearest plane node, no interpolation.
    NearestNode,
    /// Linear interpolation through the planar-interpolation collaborator.
    PlanarInterpolation,
}

/// Reynolds-stress input: one uniform tensor or a per-point profile.
#[derive(Clone, Debug)]
pub enum StressInput {
    /// Spatially uniform stress tensor (xx, xy, xz, yy, yz, zz) [m²/s²].
    Uniform(SymmTensor3),
    /// Boundary-data profile: a points file and a matching tensor-value file.
    Profile { points: PathBuf, values: PathBuf },
}

/// Mean-velocity input: one uniform vector or a per-point profile.
#[derive(Clone, Debug)]
pub enum VelocityInput {
    /// Spatially uniform mean velocity [m/s].
    Uniform(Vec3),
    /// Boundary-data profile: a points file and a matching vector-value file.
    Profile { points: PathBuf, values: PathBuf },
}

/// Fatal configuration error, reported before any step runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Plane divisions are node counts and need at least two nodes per axis
    #[error("plane divisions must be at least 2 nodes per axis, got {0}x{1}")]
    PlaneDivisions(usize, usize),

    /// All nine length-scale entries must be positive
    #[error("length scales must be positive, smallest entry is {0}")]
    NonPositiveLengthScale(f64),

    /// Characteristic speed drives the frozen-turbulence conversion
    #[error("patch-normal speed must exceed the threshold, got {0}")]
    NonPositiveSpeed(f64),

    /// The streamwise scale conversion divides by the time step
    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),

    /// Threshold guards divisions; zero or negative defeats it
    #[error("threshold must be positive, got {0}")]
    NonPositiveThreshold(f64),

    /// A non-negative model constant makes the filter kernel divergent
    #[error("model constant must be negative, got {0}")]
    DivergentModelConst(f64),

    /// Positive FSM constants would make the blending weights complex
    #[error("FSM constants must be negative, got const1 = {0}, const2 = {1}")]
    PositiveFsmConst(f64, f64),

    /// The forward-stepwise recursion only realizes exponential correlation
    #[error("the forward-stepwise variant supports only the exponential kernel (isGaussian = false)")]
    GaussianWithForwardStepwise,

    /// Perturbation fraction for planar interpolation
    #[error("perturbation fraction must be non-negative, got {0}")]
    NegativePerturb(f64),
}

/// Complete configuration of a turbulent inlet.
///
/// # Example
///
/// ```
/// use synturb::{InletConfig, LengthScaleSet, StressInput, SymmTensor3, Variant, Vec3, VelocityInput};
///
/// let config = InletConfig::new(
///     Variant::DigitalFilter,
///     (16, 16),
///     LengthScaleSet::isotropic(0.04),
///     StressInput::Uniform(SymmTensor3::diagonal(1.0, 0.8, 0.6)),
///     VelocityInput::Uniform(Vec3::new(10.0, 0.0, 0.0)),
///     10.0,
///     0.001,
/// )
/// .with_seed(2024);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct InletConfig {
    /// Instance name; keys the persisted state file.
    pub name: String,
    /// Generator variant, fixed for the lifetime of the inlet.
    pub variant: Variant,
    /// Number of plane nodes along (e2, e3).
    pub plane_divisions: (usize, usize),
    /// Integral length-scale set in metres, local patch frame.
    pub length_scales: LengthScaleSet,
    /// Reynolds-stress input in global coordinates.
    pub reynolds_stresses: StressInput,
    /// Mean-velocity input in global coordinates.
    pub mean_velocity: VelocityInput,
    /// Characteristic mean speed normal to the patch [m/s].
    pub patch_normal_speed: f64,
    /// Simulation time-step size [s]; the streamwise scales convert through it.
    pub dt: f64,
    /// Gaussian (true) or exponential (false) filter kernel.
    pub is_gaussian: bool,
    /// Fixed seed (reproducible) or clock seed (varies per run).
    pub is_fixed_seed: bool,
    /// Seed used when `is_fixed_seed` is set.
    pub seed: u64,
    /// Persist and restore generator state across restarts.
    pub is_continuous: bool,
    /// Rescale the patch-normal component to conserve the reference flux.
    pub is_corrected_flow_rate: bool,
    /// Plane-to-patch mapping strategy.
    pub map_method: MapMethod,
    /// Floor applied to near-zero denominators.
    pub threshold: f64,
    /// Autocorrelation shape constant (Klein et al., 2003, Eq. 14).
    pub model_const: f64,
    /// Coordinate perturbation fraction for planar interpolation.
    pub perturb: f64,
    /// First FSM blending exponent (Xie-Castro, 2008, Eq. 14).
    pub const1_fsm: f64,
    /// Second FSM blending exponent (Xie-Castro, 2008, Eq. 14).
    pub const2_fsm: f64,
}

impl InletConfig {
    /// Create a configuration from the required entries; optional entries
    /// take the documented defaults.
    ///
    /// The kernel shape defaults to Gaussian for the digital-filter variant
    /// and exponential for the forward-stepwise variant (its only option).
    pub fn new(
        variant: Variant,
        plane_divisions: (usize, usize),
        length_scales: LengthScaleSet,
        reynolds_stresses: StressInput,
        mean_velocity: VelocityInput,
        patch_normal_speed: f64,
        dt: f64,
    ) -> Self {
        Self {
            name: "turbulentInlet".to_string(),
            variant,
            plane_divisions,
            length_scales,
            reynolds_stresses,
            mean_velocity,
            patch_normal_speed,
            dt,
            is_gaussian: variant == Variant::DigitalFilter,
            is_fixed_seed: true,
            seed: DEFAULT_SEED,
            is_continuous: false,
            is_corrected_flow_rate: true,
            map_method: MapMethod::NearestNode,
            threshold: 1e-8,
            model_const: -0.5 * PI,
            perturb: 1e-5,
            const1_fsm: -0.25 * PI,
            const2_fsm: -0.5 * PI,
        }
    }

    /// Set the instance name (keys the persisted state file).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Select the kernel shape explicitly.
    pub fn with_gaussian(mut self, is_gaussian: bool) -> Self {
        self.is_gaussian = is_gaussian;
        self
    }

    /// Use a fixed seed value.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.is_fixed_seed = true;
        self.seed = seed;
        self
    }

    /// Seed from the clock instead of a fixed value.
    pub fn with_clock_seed(mut self) -> Self {
        self.is_fixed_seed = false;
        self
    }

    /// Enable or disable state persistence across restarts.
    pub fn with_continuous(mut self, is_continuous: bool) -> Self {
        self.is_continuous = is_continuous;
        self
    }

    /// Enable or disable the flow-rate correction.
    pub fn with_corrected_flow_rate(mut self, enabled: bool) -> Self {
        self.is_corrected_flow_rate = enabled;
        self
    }

    /// Select the plane-to-patch mapping strategy.
    pub fn with_map_method(mut self, method: MapMethod) -> Self {
        self.map_method = method;
        self
    }

    /// Override the numeric floor.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the kernel shape constant.
    pub fn with_model_const(mut self, model_const: f64) -> Self {
        self.model_const = model_const;
        self
    }

    /// Override the interpolation perturbation fraction.
    pub fn with_perturb(mut self, perturb: f64) -> Self {
        self.perturb = perturb;
        self
    }

    /// Override the FSM blending exponents.
    pub fn with_fsm_constants(mut self, const1: f64, const2: f64) -> Self {
        self.const1_fsm = const1;
        self.const2_fsm = const2;
        self
    }

    /// Check every numeric entry; all violations are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (n2, n3) = self.plane_divisions;
        if n2 < 2 || n3 < 2 {
            return Err(ConfigError::PlaneDivisions(n2, n3));
        }
        if self.threshold <= 0.0 {
            return Err(ConfigError::NonPositiveThreshold(self.threshold));
        }
        let min_scale = self.length_scales.min_entry();
        if min_scale <= 0.0 {
            return Err(ConfigError::NonPositiveLengthScale(min_scale));
        }
        if self.patch_normal_speed <= self.threshold {
            return Err(ConfigError::NonPositiveSpeed(self.patch_normal_speed));
        }
        if self.dt <= 0.0 {
            return Err(ConfigError::NonPositiveTimeStep(self.dt));
        }
        if self.model_const >= 0.0 {
            return Err(ConfigError::DivergentModelConst(self.model_const));
        }
        if self.perturb < 0.0 {
            return Err(ConfigError::NegativePerturb(self.perturb));
        }
        if self.variant == Variant::ForwardStepwise {
            if self.is_gaussian {
                return Err(ConfigError::GaussianWithForwardStepwise);
            }
            if self.const1_fsm >= 0.0 || self.const2_fsm >= 0.0 {
                return Err(ConfigError::PositiveFsmConst(
                    self.const1_fsm,
                    self.const2_fsm,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(variant: Variant) -> InletConfig {
        InletConfig::new(
            variant,
            (8, 8),
            LengthScaleSet::isotropic(0.1),
            StressInput::Uniform(SymmTensor3::identity()),
            VelocityInput::Uniform(Vec3::new(10.0, 0.0, 0.0)),
            10.0,
            0.01,
        )
    }

    #[test]
    fn test_defaults_match_dictionary() {
        let config = base_config(Variant::DigitalFilter);

        assert!(config.is_gaussian);
        assert!(config.is_fixed_seed);
        assert!(!config.is_continuous);
        assert!(config.is_corrected_flow_rate);
        assert_eq!(config.map_method, MapMethod::NearestNode);
        assert!((config.threshold - 1e-8).abs() < 1e-20);
        assert!((config.model_const + 0.5 * PI).abs() < 1e-12);
        assert!((config.const1_fsm + 0.25 * PI).abs() < 1e-12);
        assert!((config.const2_fsm + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_fsm_defaults_to_exponential() {
        let config = base_config(Variant::ForwardStepwise);
        assert!(!config.is_gaussian);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fsm_rejects_gaussian() {
        let config = base_config(Variant::ForwardStepwise).with_gaussian(true);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GaussianWithForwardStepwise)
        ));
    }

    #[test]
    fn test_rejects_small_plane() {
        let mut config = base_config(Variant::DigitalFilter);
        config.plane_divisions = (1, 8);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PlaneDivisions(1, 8))
        ));
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let mut config = base_config(Variant::DigitalFilter);
        config.length_scales = LengthScaleSet::from_components([
            0.1, 0.1, 0.1, 0.1, 0.0, 0.1, 0.1, 0.1, 0.1,
        ]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveLengthScale(_))
        ));
    }

    #[test]
    fn test_rejects_divergent_model_const() {
        let config = base_config(Variant::DigitalFilter).with_model_const(0.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DivergentModelConst(_))
        ));
    }

    #[test]
    fn test_rejects_slow_mean_flow() {
        let mut config = base_config(Variant::DigitalFilter);
        config.patch_normal_speed = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveSpeed(_))
        ));
    }
}
