//! # Ray–body intersection solutions
//!
//! A **solution set** maps output-coordinate names to pure numeric functions of six
//! arguments: the ray direction `(x0, y0, z0)` followed by the body center
//! `(mx, my, mz)`, both expressed from the ray origin in the same frame. The
//! [`Targeter`](crate::targeter::Targeter) only relies on this contract and is
//! agnostic to the shape of the body.
//!
//! ## Ray–sphere
//!
//! For a ray `p(t) = t·u` and a sphere of radius `R` centered on `m`,
//! `|t·u − m|² = R²` is the quadratic
//!
//! ```text
//! |u|²·t² − 2 (u·m)·t + (|m|² − R²) = 0
//! t = ((u·m) ∓ √Δ) / |u|²,   Δ = (u·m)² − |u|²·(|m|² − R²)
//! ```
//!
//! The `−` root is the **nearside** intersection, the `+` root the **farside** one.
//! [`SolutionSet::ray_sphere`] encodes both closed forms directly and exposes the
//! `x, y, z` intersection coordinates and the ray parameter `d` (equal to the range
//! when `u` is a unit vector).
//!
//! ## Misses
//!
//! A ray that misses the sphere has `Δ < 0`; `sqrt` then returns NaN and every
//! coordinate is NaN. Nothing panics and no error is raised. At API boundaries the
//! NaN convention is lifted into [`Intersection::Miss`].

use nalgebra::{DVector, Matrix3xX, Vector3};

use crate::constants::Meter;
use crate::targeter_errors::TargeterError;

/// Which root of the ray–sphere quadratic to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Branch {
    /// Intersection closest to the ray origin.
    #[default]
    Nearside,
    /// Intersection farthest from the ray origin.
    Farside,
}

impl Branch {
    pub fn from_farside(farside: bool) -> Self {
        if farside {
            Branch::Farside
        } else {
            Branch::Nearside
        }
    }
}

/// A numeric intersection expression over `(x0, y0, z0, mx, my, mz)`.
///
/// Implementations must return NaN (never panic) when the ray has no real intersection.
/// Any `Fn(f64, f64, f64, f64, f64, f64) -> f64` closure is a solution.
pub trait IntersectionSolution {
    fn solve(&self, x0: f64, y0: f64, z0: f64, mx: f64, my: f64, mz: f64) -> f64;

    /// Evaluate the expression elementwise over paired batches of rays and centers.
    fn solve_batch(&self, rays: &Matrix3xX<f64>, centers: &Matrix3xX<f64>) -> DVector<f64> {
        DVector::from_iterator(
            rays.ncols(),
            rays.column_iter()
                .zip(centers.column_iter())
                .map(|(u, m)| self.solve(u[0], u[1], u[2], m[0], m[1], m[2])),
        )
    }
}

impl<F> IntersectionSolution for F
where
    F: Fn(f64, f64, f64, f64, f64, f64) -> f64,
{
    fn solve(&self, x0: f64, y0: f64, z0: f64, mx: f64, my: f64, mz: f64) -> f64 {
        self(x0, y0, z0, mx, my, mz)
    }
}

/// Output coordinate of a ray–sphere solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SphereOutput {
    X,
    Y,
    Z,
    D,
}

/// Closed-form ray–sphere root for one output coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySphereSolution {
    radius: Meter,
    branch: Branch,
    output: SphereOutput,
}

impl RaySphereSolution {
    /// Ray parameter of the selected root.
    #[inline]
    fn parameter(&self, u: &Vector3<f64>, m: &Vector3<f64>) -> f64 {
        let a = u.norm_squared();
        let b = u.dot(m);
        let c = m.norm_squared() - self.radius * self.radius;
        let sqrt_disc = (b * b - a * c).sqrt();
        match self.branch {
            Branch::Nearside => (b - sqrt_disc) / a,
            Branch::Farside => (b + sqrt_disc) / a,
        }
    }
}

impl IntersectionSolution for RaySphereSolution {
    fn solve(&self, x0: f64, y0: f64, z0: f64, mx: f64, my: f64, mz: f64) -> f64 {
        let u = Vector3::new(x0, y0, z0);
        let t = self.parameter(&u, &Vector3::new(mx, my, mz));
        match self.output {
            SphereOutput::X => x0 * t,
            SphereOutput::Y => y0 * t,
            SphereOutput::Z => z0 * t,
            SphereOutput::D => t,
        }
    }
}

/// Named intersection expressions, evaluated together on whole batches.
pub struct SolutionSet {
    solutions: Vec<(String, Box<dyn IntersectionSolution + Send + Sync>)>,
}

impl std::fmt::Debug for SolutionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolutionSet")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl SolutionSet {
    /// Empty set, to be filled with [`SolutionSet::with_solution`].
    pub fn new() -> Self {
        SolutionSet {
            solutions: Vec::new(),
        }
    }

    /// Add (or replace) a named solution.
    pub fn with_solution<S>(mut self, name: impl Into<String>, solution: S) -> Self
    where
        S: IntersectionSolution + Send + Sync + 'static,
    {
        let name = name.into();
        self.solutions.retain(|(existing, _)| *existing != name);
        self.solutions.push((name, Box::new(solution)));
        self
    }

    /// Ray–sphere intersection solutions for a sphere of the given radius.
    ///
    /// Arguments
    /// -----------------
    /// * `radius`: sphere radius, in the unit of the positions it will be applied to.
    /// * `branch`: nearside or farside root.
    ///
    /// Return
    /// ----------
    /// * A set with the `x`, `y`, `z` and `d` solutions, or [`TargeterError::InvalidRadius`]
    ///   if the radius is not finite and strictly positive.
    pub fn ray_sphere(radius: Meter, branch: Branch) -> Result<Self, TargeterError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(TargeterError::InvalidRadius(radius));
        }
        let solution = |output| RaySphereSolution {
            radius,
            branch,
            output,
        };
        Ok(SolutionSet::new()
            .with_solution("x", solution(SphereOutput::X))
            .with_solution("y", solution(SphereOutput::Y))
            .with_solution("z", solution(SphereOutput::Z))
            .with_solution("d", solution(SphereOutput::D)))
    }

    /// Pick explicit solutions if given, else build ray–sphere solutions from the radius.
    ///
    /// Return
    /// ----------
    /// * [`TargeterError::MissingSolutionsAndRadius`] when neither is supplied.
    pub fn resolve(
        solutions: Option<SolutionSet>,
        target_radius: Option<Meter>,
        branch: Branch,
    ) -> Result<Self, TargeterError> {
        match (solutions, target_radius) {
            (Some(solutions), _) => Ok(solutions),
            (None, Some(radius)) => SolutionSet::ray_sphere(radius, branch),
            (None, None) => Err(TargeterError::MissingSolutionsAndRadius),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.solutions.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Evaluate a single named solution on one ray.
    pub fn solve(&self, name: &str, ray: &Vector3<f64>, center: &Vector3<f64>) -> Option<f64> {
        self.solutions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.solve(ray.x, ray.y, ray.z, center.x, center.y, center.z))
    }

    /// Evaluate every solution once over paired batches of rays and centers.
    ///
    /// Columns of `rays` and `centers` are paired by position; the result keeps the
    /// order in which solutions were added.
    pub fn evaluate(
        &self,
        rays: &Matrix3xX<f64>,
        centers: &Matrix3xX<f64>,
    ) -> Vec<(String, DVector<f64>)> {
        self.solutions
            .iter()
            .map(|(name, solution)| (name.clone(), solution.solve_batch(rays, centers)))
            .collect()
    }

    /// Intersection of a single ray, lifted out of the NaN convention.
    ///
    /// Requires `x`, `y` and `z` solutions; returns [`Intersection::Miss`] if one is
    /// missing or any coordinate is not finite.
    pub fn intersect(&self, ray: &Vector3<f64>, center: &Vector3<f64>) -> Intersection {
        let coords = ["x", "y", "z"].map(|name| self.solve(name, ray, center));
        match coords {
            [Some(x), Some(y), Some(z)] => Intersection::from_vector(Vector3::new(x, y, z)),
            _ => Intersection::Miss,
        }
    }
}

impl Default for SolutionSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of intersecting one ray with a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    Hit(Vector3<f64>),
    Miss,
}

impl Intersection {
    /// Lift a vector produced by the numeric kernels: any non-finite component is a miss.
    pub fn from_vector(position: Vector3<f64>) -> Self {
        if position.iter().all(|c| c.is_finite()) {
            Intersection::Hit(position)
        } else {
            Intersection::Miss
        }
    }

    /// Lower back into the NaN convention used by the array kernels.
    pub fn to_vector(self) -> Vector3<f64> {
        match self {
            Intersection::Hit(position) => position,
            Intersection::Miss => Vector3::repeat(f64::NAN),
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Intersection::Hit(_))
    }
}
