//! Integral length-scale set for the turbulence generator.

/// Integral length scales per plane direction and velocity component.
///
/// Rows are plane directions in the local patch frame: e1 (streamwise,
/// patch-normal into the domain), e2 and e3 (in-plane). Columns are the
/// velocity components u, v, w. Input order matches the boundary-condition
/// dictionary: (e1u, e1v, e1w, e2u, e2v, e2w, e3u, e3v, e3w), in metres.
///
/// The first row is associated with the convective mean-flow direction and is
/// converted to a time scale via Taylor's frozen-turbulence hypothesis before
/// use; the in-plane rows are converted to plane-grid units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthScaleSet {
    /// scales[direction][component], direction 0 = e1, component 0 = u
    scales: [[f64; 3]; 3],
}

impl LengthScaleSet {
    /// Create from the nine dictionary-order entries.
    pub fn from_components(entries: [f64; 9]) -> Self {
        Self {
            scales: [
                [entries[0], entries[1], entries[2]],
                [entries[3], entries[4], entries[5]],
                [entries[6], entries[7], entries[8]],
            ],
        }
    }

    /// Isotropic set: the same scale for every direction and component.
    pub fn isotropic(l: f64) -> Self {
        Self {
            scales: [[l; 3]; 3],
        }
    }

    /// Scale for a (direction, component) pair.
    #[inline(always)]
    pub fn get(&self, direction: usize, component: usize) -> f64 {
        self.scales[direction][component]
    }

    /// Iterator over all nine entries (direction-major).
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.scales.iter().flat_map(|row| row.iter().copied())
    }

    /// Smallest entry, used by configuration validation.
    pub fn min_entry(&self) -> f64 {
        self.iter().fold(f64::INFINITY, f64::min)
    }

    /// Convert physical scales to plane-grid units.
    ///
    /// The streamwise row becomes a time scale through division by the
    /// characteristic mean speed (frozen turbulence), then a step count
    /// through division by the time step. The in-plane rows are divided by
    /// the plane node spacing. Every converted entry is floored by
    /// `threshold` so later divisions stay well defined.
    pub fn to_grid_units(
        &self,
        patch_normal_speed: f64,
        dt: f64,
        spacing_e2: f64,
        spacing_e3: f64,
        threshold: f64,
    ) -> Self {
        let mut scales = self.scales;
        for c in 0..3 {
            scales[0][c] = (scales[0][c] / (patch_normal_speed * dt)).max(threshold);
            scales[1][c] = (scales[1][c] / spacing_e2).max(threshold);
            scales[2][c] = (scales[2][c] / spacing_e3).max(threshold);
        }
        Self { scales }
    }
}
