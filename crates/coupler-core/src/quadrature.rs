//! Quadrature rules on the reference face `[0, 1]^face_dim`.
//!
//! A face of a `dim`-dimensional cell has dimension `dim - 1`: a point in
//! 1D, an edge in 2D, a quadrilateral in 3D. Rules for quadrilateral faces
//! are tensor products of the 1D rule with the first coordinate running
//! fastest.

use smallvec::smallvec;

use crate::error::QuadratureError;
use crate::id::Point;

const NEWTON_TOLERANCE: f64 = 1e-15;
const NEWTON_MAX_ITERATIONS: usize = 100;

/// A quadrature rule on the reference face.
///
/// `points[q]` has `face_dim` reference coordinates in `[0, 1]`;
/// `weights[q]` sum to 1 (the measure of the reference face).
#[derive(Clone, Debug, PartialEq)]
pub struct FaceQuadrature {
    face_dim: usize,
    points: Vec<Point>,
    weights: Vec<f64>,
}

impl FaceQuadrature {
    /// Gauss-Legendre rule with `n` points per face direction.
    ///
    /// Exact for polynomials of degree `2n - 1` in each direction.
    pub fn gauss(n: usize, face_dim: usize) -> Result<Self, QuadratureError> {
        let (nodes, weights) = gauss_legendre_1d(n)?;
        Self::tensor_product(&nodes, &weights, face_dim)
    }

    /// Equidistant rule with `n` points per face direction.
    ///
    /// Points sit at the midpoints of `n` equal sub-intervals, so no point
    /// lies on a face edge and neighbouring faces never share a point.
    pub fn equidistant(n: usize, face_dim: usize) -> Result<Self, QuadratureError> {
        if n == 0 {
            return Err(QuadratureError::ZeroPoints);
        }
        let h = 1.0 / n as f64;
        let nodes: Vec<f64> = (0..n).map(|i| (i as f64 + 0.5) * h).collect();
        let weights = vec![h; n];
        Self::tensor_product(&nodes, &weights, face_dim)
    }

    fn tensor_product(
        nodes: &[f64],
        weights: &[f64],
        face_dim: usize,
    ) -> Result<Self, QuadratureError> {
        let (points, weights) = match face_dim {
            0 => (vec![Point::new()], vec![1.0]),
            1 => (
                nodes.iter().map(|&x| smallvec![x]).collect(),
                weights.to_vec(),
            ),
            2 => {
                let mut points = Vec::with_capacity(nodes.len() * nodes.len());
                let mut w = Vec::with_capacity(nodes.len() * nodes.len());
                for (&y, &wy) in nodes.iter().zip(weights) {
                    for (&x, &wx) in nodes.iter().zip(weights) {
                        points.push(smallvec![x, y]);
                        w.push(wx * wy);
                    }
                }
                (points, w)
            }
            _ => return Err(QuadratureError::UnsupportedFaceDim { face_dim }),
        };
        Ok(Self {
            face_dim,
            points,
            weights,
        })
    }

    /// Dimension of the reference face.
    pub fn face_dim(&self) -> usize {
        self.face_dim
    }

    /// Number of quadrature points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; every rule has at least one point.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reference coordinates of all points, in quadrature order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Weights of all points, in quadrature order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Gauss-Legendre nodes and weights on `[0, 1]`, ascending.
///
/// Newton iteration on the Legendre polynomial `P_n`, started from the
/// Chebyshev-like initial guess.
fn gauss_legendre_1d(n: usize) -> Result<(Vec<f64>, Vec<f64>), QuadratureError> {
    if n == 0 {
        return Err(QuadratureError::ZeroPoints);
    }
    let mut pairs = Vec::with_capacity(n);
    for i in 0..n {
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let (p, d) = legendre(n, x);
            dp = d;
            let dx = p / d;
            x -= dx;
            if dx.abs() < NEWTON_TOLERANCE {
                dp = legendre(n, x).1;
                break;
            }
        }
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        // Map [-1, 1] onto [0, 1].
        pairs.push((0.5 * (x + 1.0), 0.5 * w));
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(pairs.into_iter().unzip())
}

/// `P_n(x)` and `P_n'(x)` by the three-term recurrence.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let n = n as f64;
    let dp = n * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}
