//! Structured axis-aligned boundaries for tests and benches.

use smallvec::{smallvec, SmallVec};

use coupler_core::{BoundaryDiscretization, BoundaryId, FaceId, FaceQuadrature, Point};

/// Boundary of a uniform grid of `cells[a]` cells over `[0, lengths[a]]`
/// along each axis `a`.
///
/// Boundary ids follow the usual colorized-box convention: `2a` is the
/// side at coordinate `0` of axis `a`, `2a + 1` the side at
/// `lengths[a]`. Faces of one side are traversed with the lowest
/// remaining axis running fastest, so along a 2D edge the traversal
/// follows the increasing tangential coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxBoundary {
    cells: SmallVec<[usize; 3]>,
    lengths: SmallVec<[f64; 3]>,
}

impl BoxBoundary {
    pub const LEFT: BoundaryId = BoundaryId(0);
    pub const RIGHT: BoundaryId = BoundaryId(1);
    pub const BOTTOM: BoundaryId = BoundaryId(2);
    pub const TOP: BoundaryId = BoundaryId(3);
    pub const BACK: BoundaryId = BoundaryId(4);
    pub const FRONT: BoundaryId = BoundaryId(5);

    pub fn interval(cells: usize, length: f64) -> Self {
        Self::new(&[cells], &[length])
    }

    pub fn rectangle(cells: [usize; 2], lengths: [f64; 2]) -> Self {
        Self::new(&cells, &lengths)
    }

    pub fn cuboid(cells: [usize; 3], lengths: [f64; 3]) -> Self {
        Self::new(&cells, &lengths)
    }

    fn new(cells: &[usize], lengths: &[f64]) -> Self {
        assert!(
            cells.iter().all(|&n| n > 0),
            "every axis needs at least one cell"
        );
        Self {
            cells: SmallVec::from_slice(cells),
            lengths: SmallVec::from_slice(lengths),
        }
    }

    /// Number of faces on side `boundary`; zero for ids outside the box.
    pub fn face_count(&self, boundary: BoundaryId) -> usize {
        let axis = boundary.0 as usize / 2;
        if axis >= self.cells.len() {
            return 0;
        }
        self.tangential(axis).map(|t| self.cells[t]).product()
    }

    fn tangential(&self, axis: usize) -> impl Iterator<Item = usize> {
        (0..self.cells.len()).filter(move |&t| t != axis)
    }

    fn first_face(&self, boundary: BoundaryId) -> u32 {
        (0..boundary.0)
            .map(|b| self.face_count(BoundaryId(b)) as u32)
            .sum()
    }

    /// `(side, ordinal within the side)` of `face`.
    fn locate(&self, face: FaceId) -> Option<(BoundaryId, usize)> {
        let mut start = 0;
        for b in 0..2 * self.cells.len() as u32 {
            let count = self.face_count(BoundaryId(b)) as u32;
            if face.0 < start + count {
                return Some((BoundaryId(b), (face.0 - start) as usize));
            }
            start += count;
        }
        None
    }
}

impl BoundaryDiscretization for BoxBoundary {
    type Field = BoundaryField;

    fn dim(&self) -> usize {
        self.cells.len()
    }

    fn boundary_faces(&self, boundary: BoundaryId) -> Box<dyn Iterator<Item = FaceId> + '_> {
        let first = self.first_face(boundary);
        let count = self.face_count(boundary) as u32;
        Box::new((first..first + count).map(FaceId))
    }

    fn quadrature_points(&self, face: FaceId, quadrature: &FaceQuadrature, out: &mut Vec<Point>) {
        out.clear();
        let Some((boundary, mut ordinal)) = self.locate(face) else {
            return;
        };
        let axis = boundary.0 as usize / 2;
        let normal = if boundary.0 % 2 == 0 {
            0.0
        } else {
            self.lengths[axis]
        };

        let mut cell: SmallVec<[(usize, usize); 2]> = SmallVec::new();
        for t in self.tangential(axis) {
            cell.push((t, ordinal % self.cells[t]));
            ordinal /= self.cells[t];
        }

        for reference in quadrature.points() {
            let mut p: Point = smallvec![0.0; self.dim()];
            p[axis] = normal;
            for (k, &(t, i)) in cell.iter().enumerate() {
                let h = self.lengths[t] / self.cells[t] as f64;
                let xi = reference.get(k).copied().unwrap_or(0.0);
                p[t] = (i as f64 + xi) * h;
            }
            out.push(p);
        }
    }

    fn field_values(
        &self,
        field: &BoundaryField,
        face: FaceId,
        quadrature: &FaceQuadrature,
        out: &mut Vec<f64>,
    ) {
        out.clear();
        match field {
            BoundaryField::Analytic(f) => {
                let mut points = Vec::with_capacity(quadrature.len());
                self.quadrature_points(face, quadrature, &mut points);
                for p in &points {
                    out.extend_from_slice(&f(p.as_slice()));
                }
            }
            BoundaryField::PerPoint(values) => {
                let Some((_, ordinal)) = self.locate(face) else {
                    return;
                };
                let stride = quadrature.len() * self.dim();
                let start = (ordinal * stride).min(values.len());
                let end = (start + stride).min(values.len());
                out.extend_from_slice(&values[start..end]);
            }
        }
    }
}

/// A vector field on a [`BoxBoundary`].
pub enum BoundaryField {
    /// Evaluated at the physical position of each quadrature point.
    Analytic(Box<dyn Fn(&[f64]) -> Point>),
    /// Flat values, `dim` per quadrature point, in traversal order of the
    /// face's side. Short data yields short evaluations.
    PerPoint(Vec<f64>),
}

impl BoundaryField {
    pub fn analytic(f: impl Fn(&[f64]) -> Point + 'static) -> Self {
        Self::Analytic(Box::new(f))
    }

    pub fn per_point(values: Vec<f64>) -> Self {
        Self::PerPoint(values)
    }
}
