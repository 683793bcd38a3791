// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Numeric primitives shared by every map generator: linear interpolation of
// scattered samples onto a regular grid (Delaunay barycentric weights via
// `spade`), nearest-neighbour fill (`rstar`), and the bilinear regular-grid
// sampler that carries flat-page fields into photo space.

use ndarray::Array3;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use spade::{DelaunayTriangulation, HasPosition, Point2, PositionInTriangulation, Triangulation};
use tracing::{debug, instrument};
use warpsynth_core::error::{Result, WarpsynthError};

use crate::raster::UvRaster;

/// Normalised coordinate given to invalid pixels before rescaling to the
/// sampler's `[-1, 1]` range; it lands far outside the source.
const OUT_OF_RANGE: f64 = 5.0;

// -- Scattered interpolation --------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Site {
    position: Point2<f64>,
    index: usize,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Scattered samples `points -> values` with `N` value channels.
pub struct ScatteredInterpolator<const N: usize> {
    triangulation: DelaunayTriangulation<Site>,
    nearest: RTree<IndexedPoint>,
    values: Vec<[f64; N]>,
}

impl<const N: usize> ScatteredInterpolator<N> {
    pub fn new(points: &[[f64; 2]], values: Vec<[f64; N]>) -> Result<Self> {
        if points.len() != values.len() {
            return Err(WarpsynthError::InvalidShape {
                expected: format!("{} values", points.len()),
                actual: format!("{} values", values.len()),
            });
        }
        if points.is_empty() {
            return Err(WarpsynthError::Interpolation(
                "no sample points to interpolate from".to_string(),
            ));
        }

        let sites = points
            .iter()
            .enumerate()
            .map(|(index, p)| Site {
                position: Point2::new(p[0], p[1]),
                index,
            })
            .collect();
        let triangulation = DelaunayTriangulation::<Site>::bulk_load(sites)
            .map_err(|err| WarpsynthError::Interpolation(format!("triangulation failed: {err:?}")))?;
        let nearest = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(index, p)| IndexedPoint::new(*p, index))
                .collect(),
        );

        debug!(
            points = points.len(),
            faces = triangulation.num_inner_faces(),
            "Scattered interpolator built"
        );
        Ok(Self {
            triangulation,
            nearest,
            values,
        })
    }

    fn blend(&self, weights: &[(usize, f64)]) -> [f64; N] {
        let mut out = [0.0; N];
        for &(index, weight) in weights {
            for (slot, value) in out.iter_mut().zip(&self.values[index]) {
                *slot += weight * value;
            }
        }
        out
    }

    /// Barycentric interpolation inside the convex hull of the points;
    /// `None` outside it.
    pub fn linear(&self, point: [f64; 2]) -> Option<[f64; N]> {
        let q = Point2::new(point[0], point[1]);
        match self.triangulation.locate(q) {
            PositionInTriangulation::OnVertex(vertex) => {
                Some(self.values[self.triangulation.vertex(vertex).data().index])
            }
            PositionInTriangulation::OnEdge(edge) => {
                let edge = self.triangulation.directed_edge(edge);
                let (from, to) = (edge.from(), edge.to());
                let (a, b) = (from.position(), to.position());
                let length2 = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
                let t = if length2 > 0.0 {
                    (((q.x - a.x) * (b.x - a.x) + (q.y - a.y) * (b.y - a.y)) / length2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Some(self.blend(&[(from.data().index, 1.0 - t), (to.data().index, t)]))
            }
            PositionInTriangulation::OnFace(face) => {
                let [v0, v1, v2] = self.triangulation.face(face).vertices();
                let (a, b, c) = (v0.position(), v1.position(), v2.position());
                let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
                if det == 0.0 {
                    return None;
                }
                let w0 = ((b.y - c.y) * (q.x - c.x) + (c.x - b.x) * (q.y - c.y)) / det;
                let w1 = ((c.y - a.y) * (q.x - c.x) + (a.x - c.x) * (q.y - c.y)) / det;
                let w2 = 1.0 - w0 - w1;
                Some(self.blend(&[
                    (v0.data().index, w0),
                    (v1.data().index, w1),
                    (v2.data().index, w2),
                ]))
            }
            _ => None,
        }
    }

    /// Value of the sample point closest to `point`.
    pub fn nearest(&self, point: [f64; 2]) -> [f64; N] {
        self.nearest
            .nearest_neighbor(&point)
            .map(|site| self.values[site.data])
            .unwrap_or([f64::NAN; N])
    }

    /// Interpolate onto an `R x R` grid spanning `[0, 1] x [0, 1]`, the first
    /// grid axis following the first point coordinate.
    ///
    /// Cells outside the convex hull take the nearest sample when
    /// `extrapolate` is set and are NaN otherwise.
    #[instrument(skip(self))]
    pub fn onto_unit_grid(&self, resolution: usize, extrapolate: bool) -> Array3<f64> {
        let step = 1.0 / (resolution.max(2) - 1) as f64;
        let mut grid = Array3::from_elem((resolution, resolution, N), f64::NAN);
        let mut outside = 0usize;

        for i in 0..resolution {
            for j in 0..resolution {
                let point = [i as f64 * step, j as f64 * step];
                let value = match self.linear(point) {
                    Some(value) => Some(value),
                    None => {
                        outside += 1;
                        extrapolate.then(|| self.nearest(point))
                    }
                };
                if let Some(value) = value {
                    for (k, v) in value.into_iter().enumerate() {
                        grid[[i, j, k]] = v;
                    }
                }
            }
        }

        debug!(outside, "Grid cells outside the convex hull");
        grid
    }
}

// -- Hole filling -------------------------------------------------------------

/// Replace every grid cell holding a NaN with the value of the nearest cell
/// (in index space) that holds none. Returns the number of filled cells.
pub fn fill_nan_nearest(grid: &mut Array3<f64>) -> Result<usize> {
    let (rows, cols, _) = grid.dim();
    let is_hole = |grid: &Array3<f64>, i: usize, j: usize| {
        grid.slice(ndarray::s![i, j, ..]).iter().any(|v| v.is_nan())
    };

    let mut holes = Vec::new();
    let mut valid = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            if is_hole(grid, i, j) {
                holes.push((i, j));
            } else {
                valid.push(IndexedPoint::new([i as f64, j as f64], i * cols + j));
            }
        }
    }
    if holes.is_empty() {
        return Ok(0);
    }
    if valid.is_empty() {
        return Err(WarpsynthError::Interpolation(
            "grid has no defined cells to fill holes from".to_string(),
        ));
    }

    let tree = RTree::bulk_load(valid);
    for &(i, j) in &holes {
        if let Some(source) = tree.nearest_neighbor(&[i as f64, j as f64]) {
            let (si, sj) = (source.data / cols, source.data % cols);
            let value = grid.slice(ndarray::s![si, sj, ..]).to_owned();
            grid.slice_mut(ndarray::s![i, j, ..]).assign(&value);
        }
    }
    Ok(holes.len())
}

// -- Regular-grid sampling ----------------------------------------------------

/// Per-photo-pixel source positions derived from a UV raster.
///
/// Each pixel holds `(row, col)` in the sampler's normalised `[-1, 1]`
/// domain: the texture coordinate with its vertical axis flipped to the top
/// of the page, rescaled from `[0, 1]`. Invalid pixels hold an out-of-range
/// position so they sample nothing.
#[derive(Debug, Clone)]
pub struct SamplingGrid {
    coords: Array3<f64>,
}

impl SamplingGrid {
    pub fn from_uv(uv: &UvRaster) -> Self {
        let coords = Array3::from_shape_fn((uv.height(), uv.width(), 2), |(row, col, k)| {
            let unit = if uv.is_valid(row, col) {
                uv.texture_coordinate(row, col)[k]
            } else {
                OUT_OF_RANGE
            };
            unit * 2.0 - 1.0
        });
        Self { coords }
    }

    pub fn height(&self) -> usize {
        self.coords.dim().0
    }

    pub fn width(&self) -> usize {
        self.coords.dim().1
    }

    /// Bilinear sampling of an `h x w x C` source at every grid position,
    /// with the corner pixels aligned to `-1` and `1` and zero outside the
    /// source. Returns an `H x W x C` array.
    pub fn sample(&self, source: &Array3<f64>) -> Array3<f64> {
        let (src_rows, src_cols, channels) = source.dim();
        let mut out = Array3::zeros((self.height(), self.width(), channels));

        for row in 0..self.height() {
            for col in 0..self.width() {
                let iy = (self.coords[[row, col, 0]] + 1.0) / 2.0 * (src_rows as f64 - 1.0);
                let ix = (self.coords[[row, col, 1]] + 1.0) / 2.0 * (src_cols as f64 - 1.0);
                let (y0, x0) = (iy.floor(), ix.floor());
                let (ty, tx) = (iy - y0, ix - x0);

                let taps = [
                    (y0, x0, (1.0 - ty) * (1.0 - tx)),
                    (y0, x0 + 1.0, (1.0 - ty) * tx),
                    (y0 + 1.0, x0, ty * (1.0 - tx)),
                    (y0 + 1.0, x0 + 1.0, ty * tx),
                ];
                for (y, x, weight) in taps {
                    if y < 0.0 || x < 0.0 || y >= src_rows as f64 || x >= src_cols as f64 {
                        continue;
                    }
                    let (y, x) = (y as usize, x as usize);
                    for k in 0..channels {
                        out[[row, col, k]] += weight * source[[y, x, k]];
                    }
                }
            }
        }
        out
    }
}
