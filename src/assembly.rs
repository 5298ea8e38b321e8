use faer::Mat;
use itertools::{izip, Itertools};

use crate::error::{AssemblyError, Result};

/// Sectional properties attached to an element.
#[derive(Clone, Debug)]
pub struct ElementProperties {
    /// Compliance matrix `[6][6]`
    pub compliance: Mat<f64>,
    /// Mass matrix `[6][6]`
    pub mass: Mat<f64>,
    /// Rotation from element to global frame `[3][3]`
    pub orientation: Mat<f64>,
}

impl Default for ElementProperties {
    fn default() -> Self {
        Self {
            compliance: Mat::zeros(6, 6),
            mass: Mat::zeros(6, 6),
            orientation: Mat::from_fn(3, 3, |i, j| if i == j { 1. } else { 0. }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    /// Start point index
    pub start: usize,
    /// Stop point index
    pub stop: usize,
    /// Distance between start and stop points
    pub length: f64,
    /// Element midpoint (xyz)
    pub midpoint: [f64; 3],
    /// Compliance matrix `[6][6]`
    pub compliance: Mat<f64>,
    /// Mass matrix `[6][6]`
    pub mass: Mat<f64>,
    /// Rotation from element to global frame `[3][3]`
    pub orientation: Mat<f64>,
}

/// Points and the beam elements connecting them.
#[derive(Clone, Debug)]
pub struct Assembly {
    pub points: Vec<[f64; 3]>,
    pub elements: Vec<Element>,
}

impl Assembly {
    /// Creates an assembly, computing element length and midpoint from the
    /// point coordinates.
    pub fn new(
        points: Vec<[f64; 3]>,
        start: &[usize],
        stop: &[usize],
        properties: Vec<ElementProperties>,
    ) -> Result<Self> {
        if start.len() != stop.len() {
            return Err(AssemblyError::MismatchedConnectivity {
                n_start: start.len(),
                n_stop: stop.len(),
            });
        }
        if properties.len() != start.len() {
            return Err(AssemblyError::VectorLength {
                name: "element properties",
                actual: properties.len(),
                expected: start.len(),
            });
        }

        let n_points = points.len();
        let elements = izip!(start.iter(), stop.iter(), properties.into_iter())
            .enumerate()
            .map(|(elem, (&p1, &p2, props))| {
                for point in [p1, p2] {
                    if point >= n_points {
                        return Err(AssemblyError::PointOutOfRange {
                            elem,
                            point,
                            n_points,
                        });
                    }
                }
                let (x1, x2) = (points[p1], points[p2]);
                let length = (0..3).map(|i| (x2[i] - x1[i]).powi(2)).sum::<f64>().sqrt();
                Ok(Element {
                    start: p1,
                    stop: p2,
                    length,
                    midpoint: [0, 1, 2].map(|i| (x1[i] + x2[i]) / 2.),
                    compliance: props.compliance,
                    mass: props.mass,
                    orientation: props.orientation,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { points, elements })
    }

    /// Creates an assembly whose elements carry default (zero) properties.
    pub fn from_connectivity(
        points: Vec<[f64; 3]>,
        start: &[usize],
        stop: &[usize],
    ) -> Result<Self> {
        let properties = vec![ElementProperties::default(); start.len()];
        Self::new(points, start, stop, properties)
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Start point of each element
    pub fn start(&self) -> Vec<usize> {
        self.elements.iter().map(|e| e.start).collect_vec()
    }

    /// Stop point of each element
    pub fn stop(&self) -> Vec<usize> {
        self.elements.iter().map(|e| e.stop).collect_vec()
    }
}

/// Returns a force scaling factor that balances force/moment unknowns
/// against displacement/rotation unknowns.
///
/// The factor is the smallest power of two at or above
/// `n / (100 * sum(|c|))`, where `n` counts compliance entries larger than
/// machine epsilon. Assemblies with no such entries get `1.0`.
pub fn default_force_scaling(assembly: &Assembly) -> f64 {
    let (n_sum, c_sum) = assembly
        .elements
        .iter()
        .flat_map(|e| {
            (0..6)
                .cartesian_product(0..6)
                .map(|(i, j)| e.compliance[(i, j)].abs())
                .collect_vec()
        })
        .fold((0_usize, 0_f64), |(n, c), v| {
            (if v > f64::EPSILON { n + 1 } else { n }, c + v)
        });

    if n_sum == 0 {
        return 1.;
    }

    let target = n_sum as f64 / c_sum / 100.;
    2_f64.powi(target.log2().ceil() as i32)
}
