//! Patch geometry and the virtual turbulence plane.
//!
//! Synthetic turbulence is produced on a rectangular structured grid of
//! nodes — the turbulence plane — lying on the boundary patch and parallel
//! to it, then mapped onto the (possibly unstructured) patch faces.
//!
//! Frame convention: e1 is the unit patch normal pointing into the domain,
//! e2 and e3 complete a right-handed orthonormal frame. Plane divisions
//! count nodes along e2 (height) and e3 (width); the nodes span the bounding
//! box of the patch face centres inclusively.

use crate::types::{SymmTensor3, Vec3};

/// Boundary-patch geometry supplied by the host mesh provider.
///
/// The normal is a single representative unit vector pointing into the
/// domain; per-face orientation differences are the host's concern.
#[derive(Clone, Debug)]
pub struct PatchGeometry {
    /// Face-centre coordinates in global space.
    pub face_centres: Vec<Vec3>,
    /// Face areas [m²], aligned with `face_centres`.
    pub face_areas: Vec<f64>,
    /// Unit normal pointing into the computational domain.
    pub normal: Vec3,
}

impl PatchGeometry {
    /// Create patch geometry from face data.
    ///
    /// # Panics
    ///
    /// Panics on an empty patch, mismatched lengths, or a zero normal.
    pub fn new(face_centres: Vec<Vec3>, face_areas: Vec<f64>, normal: Vec3) -> Self {
        assert!(!face_centres.is_empty(), "patch has no faces");
        assert_eq!(
            face_centres.len(),
            face_areas.len(),
            "face centres and areas must align"
        );
        let unit = normal.normalized(1e-12);
        assert!(
            unit.magnitude() > 0.5,
            "patch normal must have non-zero magnitude"
        );
        Self {
            face_centres,
            face_areas,
            normal: unit,
        }
    }

    /// Axis-aligned rectangular patch in the x = `x0` plane with inward
    /// normal +x, split into `ny` × `nz` square faces. Convenience for
    /// tests and demos.
    pub fn rectangle(x0: f64, y0: f64, y1: f64, z0: f64, z1: f64, ny: usize, nz: usize) -> Self {
        assert!(ny > 0 && nz > 0, "need at least one face per direction");
        assert!(y1 > y0 && z1 > z0, "invalid patch bounds");

        let dy = (y1 - y0) / ny as f64;
        let dz = (z1 - z0) / nz as f64;
        let area = dy * dz;

        let mut centres = Vec::with_capacity(ny * nz);
        let mut areas = Vec::with_capacity(ny * nz);
        for j in 0..ny {
            for k in 0..nz {
                let y = y0 + (j as f64 + 0.5) * dy;
                let z = z0 + (k as f64 + 0.5) * dz;
                centres.push(Vec3::new(x0, y, z));
                areas.push(area);
            }
        }
        Self::new(centres, areas, Vec3::new(1.0, 0.0, 0.0))
    }

    /// Number of patch faces.
    pub fn n_faces(&self) -> usize {
        self.face_centres.len()
    }
}

/// Right-handed orthonormal frame attached to the patch.
#[derive(Clone, Copy, Debug)]
pub struct PlaneFrame {
    /// Unit normal into the domain (streamwise).
    pub e1: Vec3,
    /// First in-plane direction (plane height).
    pub e2: Vec3,
    /// Second in-plane direction (plane width).
    pub e3: Vec3,
}

impl PlaneFrame {
    /// Build the frame from the inward patch normal.
    ///
    /// e2 is the global axis least aligned with the normal, projected onto
    /// the plane and normalized; e3 = e1 × e2. The choice is deterministic
    /// so that every process sharing a patch derives the same frame.
    pub fn from_normal(normal: Vec3) -> Self {
        let e1 = normal.normalized(1e-12);

        let axes = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let mut pick = axes[0];
        let mut smallest = f64::INFINITY;
        for axis in axes {
            let alignment = e1.dot(&axis).abs();
            if alignment < smallest {
                smallest = alignment;
                pick = axis;
            }
        }

        let e2 = (pick - e1 * pick.dot(&e1)).normalized(1e-12);
        let e3 = e1.cross(&e2);
        Self { e1, e2, e3 }
    }

    /// In-plane coordinates (ξ2, ξ3) of a global point.
    #[inline(always)]
    pub fn project(&self, p: &Vec3) -> (f64, f64) {
        (p.dot(&self.e2), p.dot(&self.e3))
    }
}

/// Structured turbulence-plane grid with its per-node statistics.
///
/// Owns the target mean-velocity and Reynolds-stress fields once the
/// controller has placed them (uniform broadcast or interpolated profile).
#[derive(Clone, Debug)]
pub struct TurbulencePlane {
    /// Local frame on the patch.
    pub frame: PlaneFrame,
    /// Nodes along e2 (height).
    pub n2: usize,
    /// Nodes along e3 (width).
    pub n3: usize,
    /// In-plane coordinates of node (0, 0).
    pub origin: (f64, f64),
    /// Node spacing along (e2, e3) [m].
    pub spacing: (f64, f64),
    /// Normal offset of the plane along e1 (mean of the face centres).
    pub offset_e1: f64,
    /// Target mean velocity per node, global coordinates.
    pub mean_velocity: Vec<Vec3>,
    /// Target Reynolds stresses per node, global coordinates.
    pub stresses: Vec<SymmTensor3>,
}

impl TurbulencePlane {
    /// Lay the plane grid over the bounding box of the patch face centres.
    ///
    /// Degenerate extents (a patch one face wide) are floored by `threshold`
    /// so node spacing stays finite.
    pub fn from_patch(patch: &PatchGeometry, divisions: (usize, usize), threshold: f64) -> Self {
        let frame = PlaneFrame::from_normal(patch.normal);
        let (n2, n3) = divisions;
        assert!(n2 >= 2 && n3 >= 2, "plane needs at least 2x2 nodes");

        let mut min2 = f64::INFINITY;
        let mut max2 = f64::NEG_INFINITY;
        let mut min3 = f64::INFINITY;
        let mut max3 = f64::NEG_INFINITY;
        let mut sum1 = 0.0;
        for c in &patch.face_centres {
            let (x2, x3) = frame.project(c);
            min2 = min2.min(x2);
            max2 = max2.max(x2);
            min3 = min3.min(x3);
            max3 = max3.max(x3);
            sum1 += c.dot(&frame.e1);
        }

        let extent2 = (max2 - min2).max(threshold);
        let extent3 = (max3 - min3).max(threshold);
        let n_nodes = n2 * n3;

        Self {
            frame,
            n2,
            n3,
            origin: (min2, min3),
            spacing: (extent2 / (n2 - 1) as f64, extent3 / (n3 - 1) as f64),
            offset_e1: sum1 / patch.face_centres.len() as f64,
            mean_velocity: vec![Vec3::zero(); n_nodes],
            stresses: vec![SymmTensor3::zero(); n_nodes],
        }
    }

    /// Total node count.
    #[inline(always)]
    pub fn n_nodes(&self) -> usize {
        self.n2 * self.n3
    }

    /// Flattened node index (row-major: e2 outer, e3 inner).
    #[inline(always)]
    pub fn node_index(&self, j: usize, k: usize) -> usize {
        j * self.n3 + k
    }

    /// In-plane coordinates of node (j, k).
    #[inline(always)]
    pub fn node_coords(&self, j: usize, k: usize) -> (f64, f64) {
        (
            self.origin.0 + j as f64 * self.spacing.0,
            self.origin.1 + k as f64 * self.spacing.1,
        )
    }

    /// Global position of node (j, k).
    pub fn node_position(&self, j: usize, k: usize) -> Vec3 {
        let (x2, x3) = self.node_coords(j, k);
        self.frame.e1 * self.offset_e1 + self.frame.e2 * x2 + self.frame.e3 * x3
    }

    /// Global positions of all nodes in flattened order.
    pub fn node_positions(&self) -> Vec<Vec3> {
        let mut positions = Vec::with_capacity(self.n_nodes());
        for j in 0..self.n2 {
            for k in 0..self.n3 {
                positions.push(self.node_position(j, k));
            }
        }
        positions
    }

    /// Broadcast one mean velocity to every node.
    pub fn set_uniform_mean(&mut self, u: Vec3) {
        self.mean_velocity.fill(u);
    }

    /// Broadcast one stress tensor to every node.
    pub fn set_uniform_stress(&mut self, r: SymmTensor3) {
        self.stresses.fill(r);
    }

    /// Install a per-node mean-velocity field.
    pub fn set_mean(&mut self, field: Vec<Vec3>) {
        assert_eq!(field.len(), self.n_nodes(), "mean field size mismatch");
        self.mean_velocity = field;
    }

    /// Install a per-node stress field.
    pub fn set_stress(&mut self, field: Vec<SymmTensor3>) {
        assert_eq!(field.len(), self.n_nodes(), "stress field size mismatch");
        self.stresses = field;
    }
}
