//! Point-to-point planar interpolation between arbitrary point clouds.
//!
//! Boundary-data profiles arrive on their own point set, which rarely matches
//! the turbulence-plane nodes, and the plane nodes rarely match the patch
//! face centres. Both gaps are bridged the same way: fit a plane through the
//! source points, project everything into that plane, and interpolate each
//! query from the triangle of its three nearest source points.
//!
//! Weights are computed once at construction; [`PlanarInterpolation::interpolate`]
//! is then a pure weighted sum and can be reused for any [`Blend`] value type
//! living on the same source points.

use faer::{linalg::solvers::Solve, Mat};
use thiserror::Error;

use crate::plane::PlaneFrame;
use crate::types::{Blend, Vec3};

/// Relative tolerance below which a fitted system or a weight triangle is
/// treated as degenerate.
const DEGENERACY_TOL: f64 = 1e-10;

/// Fatal source-geometry error raised at construction.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("planar interpolation needs at least 3 source points, got {0}")]
    TooFewPoints(usize),

    #[error("source points are degenerate (coincident or collinear): {message}")]
    DegenerateSource { message: String },
}

/// Three source indices and their barycentric weights for one query point.
///
/// The nearest-point fallback stores the nearest index three times with
/// weights (1, 0, 0), so the blending loop needs no special case.
#[derive(Clone, Copy, Debug)]
struct WeightTriplet {
    nodes: [usize; 3],
    weights: [f64; 3],
}

/// Precomputed interpolation weights from one point cloud onto another.
#[derive(Clone, Debug)]
pub struct PlanarInterpolation {
    triplets: Vec<WeightTriplet>,
    n_source: usize,
}

impl PlanarInterpolation {
    /// Fit the source plane and compute weights for every query point.
    ///
    /// `perturb` shifts every source point by that fraction of the source
    /// bounding-box extent before the nearest-point searches. The shift is
    /// uniform, so it breaks exact equidistance ties between sources without
    /// masking genuinely degenerate (collinear or coincident) input, which
    /// still fails with [`GeometryError::DegenerateSource`].
    pub fn new(
        source_points: &[Vec3],
        query_points: &[Vec3],
        perturb: f64,
    ) -> Result<Self, GeometryError> {
        if source_points.len() < 3 {
            return Err(GeometryError::TooFewPoints(source_points.len()));
        }

        let shifted = perturb_points(source_points, perturb);
        let frame = fit_plane_frame(&shifted)?;

        let centroid = centroid(&shifted);
        let source_coords: Vec<(f64, f64)> = shifted
            .iter()
            .map(|p| frame.project(&(*p - centroid)))
            .collect();

        let mut triplets = Vec::with_capacity(query_points.len());
        for q in query_points {
            let qc = frame.project(&(*q - centroid));
            let nearest = three_nearest(&source_coords, qc);

            let triplet = match barycentric_weights(
                source_coords[nearest[0]],
                source_coords[nearest[1]],
                source_coords[nearest[2]],
                qc,
            ) {
                Some(weights) => WeightTriplet {
                    nodes: nearest,
                    weights,
                },
                // Degenerate triangle or query outside it: nearest point only.
                None => WeightTriplet {
                    nodes: [nearest[0]; 3],
                    weights: [1.0, 0.0, 0.0],
                },
            };
            triplets.push(triplet);
        }

        Ok(Self {
            triplets,
            n_source: source_points.len(),
        })
    }

    /// Number of source points the weights were built for.
    pub fn n_source(&self) -> usize {
        self.n_source
    }

    /// Number of query points.
    pub fn n_queries(&self) -> usize {
        self.triplets.len()
    }

    /// Interpolate a source field onto the query points.
    ///
    /// # Panics
    ///
    /// Panics when `source_values` does not match the source point count.
    pub fn interpolate<T: Blend>(&self, source_values: &[T]) -> Vec<T> {
        assert_eq!(
            source_values.len(),
            self.n_source,
            "source field size mismatch"
        );

        self.triplets
            .iter()
            .map(|t| {
                let mut acc = T::zero();
                for (node, w) in t.nodes.iter().zip(t.weights.iter()) {
                    acc.scaled_add(*w, &source_values[*node]);
                }
                acc
            })
            .collect()
    }
}

/// Shift all points by the `perturb` fraction of their bounding-box extent.
fn perturb_points(points: &[Vec3], perturb: f64) -> Vec<Vec3> {
    let mut min = Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
    let mut max = Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    let shift = (max - min) * perturb;
    points.iter().map(|p| *p + shift).collect()
}

fn centroid(points: &[Vec3]) -> Vec3 {
    let mut sum = Vec3::zero();
    for p in points {
        sum = sum + *p;
    }
    sum * (1.0 / points.len() as f64)
}

/// Least-squares plane through the points, returned as a patch-style frame.
///
/// The axis with the smallest spread is regressed on the other two, so the
/// fit stays well conditioned for near-axis-aligned patches. The 2×2 normal
/// equations are solved with faer after an explicit determinant check; a
/// singular system means the points are coincident or collinear.
fn fit_plane_frame(points: &[Vec3]) -> Result<PlaneFrame, GeometryError> {
    let c = centroid(points);

    // Spread per global axis decides the dependent coordinate.
    let mut spread = [0.0_f64; 3];
    for p in points {
        let d = *p - c;
        spread[0] += d.x * d.x;
        spread[1] += d.y * d.y;
        spread[2] += d.z * d.z;
    }
    let mut dep = 0;
    for axis in 1..3 {
        if spread[axis] < spread[dep] {
            dep = axis;
        }
    }
    let (i1, i2) = match dep {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };

    // Normal equations for w = alpha*u + beta*v on centred coordinates.
    let mut ata = Mat::<f64>::zeros(2, 2);
    let mut atw = Mat::<f64>::zeros(2, 1);
    for p in points {
        let d = *p - c;
        let u = d.component(i1);
        let v = d.component(i2);
        let w = d.component(dep);
        ata[(0, 0)] += u * u;
        ata[(0, 1)] += u * v;
        ata[(1, 0)] += u * v;
        ata[(1, 1)] += v * v;
        atw[(0, 0)] += u * w;
        atw[(1, 0)] += v * w;
    }

    let scale = ata[(0, 0)].max(ata[(1, 1)]);
    let det = ata[(0, 0)] * ata[(1, 1)] - ata[(0, 1)] * ata[(1, 0)];
    if scale <= 0.0 || det.abs() <= DEGENERACY_TOL * scale * scale {
        return Err(GeometryError::DegenerateSource {
            message: format!("plane fit is singular (det = {det:.3e})"),
        });
    }

    let lu = ata.as_ref().full_piv_lu();
    let coeffs = lu.solve(&atw);

    // Plane w - alpha*u - beta*v = 0, so the normal has 1 in the dependent
    // slot and the negated slopes in the independent slots.
    let mut normal = [0.0_f64; 3];
    normal[dep] = 1.0;
    normal[i1] = -coeffs[(0, 0)];
    normal[i2] = -coeffs[(1, 0)];

    Ok(PlaneFrame::from_normal(Vec3::new(
        normal[0], normal[1], normal[2],
    )))
}

/// Indices of the three nearest coordinates, sorted by ascending distance.
fn three_nearest(coords: &[(f64, f64)], q: (f64, f64)) -> [usize; 3] {
    let mut best = [(f64::INFINITY, usize::MAX); 3];
    for (i, &(x, y)) in coords.iter().enumerate() {
        let d = (x - q.0) * (x - q.0) + (y - q.1) * (y - q.1);
        if d < best[2].0 {
            best[2] = (d, i);
            if best[2].0 < best[1].0 {
                best.swap(1, 2);
            }
            if best[1].0 < best[0].0 {
                best.swap(0, 1);
            }
        }
    }
    [best[0].1, best[1].1, best[2].1]
}

/// Barycentric weights of `q` in triangle (a, b, c).
///
/// Returns `None` when the triangle area vanishes relative to its edge
/// lengths or when `q` lies outside the triangle.
fn barycentric_weights(
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    q: (f64, f64),
) -> Option<[f64; 3]> {
    let v0 = (b.0 - a.0, b.1 - a.1);
    let v1 = (c.0 - a.0, c.1 - a.1);
    let v2 = (q.0 - a.0, q.1 - a.1);

    let edge_scale = (v0.0 * v0.0 + v0.1 * v0.1).max(v1.0 * v1.0 + v1.1 * v1.1);
    let det = v0.0 * v1.1 - v1.0 * v0.1;
    if det.abs() <= DEGENERACY_TOL * edge_scale {
        return None;
    }

    let wb = (v2.0 * v1.1 - v1.0 * v2.1) / det;
    let wc = (v0.0 * v2.1 - v2.0 * v0.1) / det;
    let wa = 1.0 - wb - wc;

    if wa < -DEGENERACY_TOL || wb < -DEGENERACY_TOL || wc < -DEGENERACY_TOL {
        return None;
    }
    Some([wa, wb, wc])
}
