//! Derivative-free minimisation used for model parameter estimation.

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at `optimal_point`.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// Whether a convergence criterion was met before `max_iter`.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of simplex values.
    pub tolerance: f64,
    /// Convergence tolerance on the distance of vertices from the centroid.
    pub point_tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Relative size of the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            point_tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Box constraints applied after every simplex move.
struct Bounds<'a>(Option<&'a [(f64, f64)]>);

impl Bounds<'_> {
    fn clamp(&self, mut point: Vec<f64>) -> Vec<f64> {
        if let Some(bounds) = self.0 {
            for (x, &(lo, hi)) in point.iter_mut().zip(bounds.iter()) {
                *x = x.clamp(lo, hi);
            }
        }
        point
    }
}

/// Minimise `objective` starting at `initial` with the Nelder-Mead simplex method.
///
/// # Example
/// ```
/// use salescast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            evaluations: 0,
            converged: false,
        };
    }

    let bounds = Bounds(bounds);
    let mut evaluations = 0usize;
    let mut eval = |x: &[f64]| {
        evaluations += 1;
        let v = objective(x);
        // NaN never wins a comparison
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    vertices.push(bounds.clamp(initial.to_vec()));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertices.push(bounds.clamp(vertex));
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);

        let centroid = centroid_without(&vertices, worst);
        let spread = vertices
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        // both the simplex and its values must have collapsed
        if values[worst] - values[best] < config.tolerance && spread < config.point_tolerance {
            converged = true;
            break;
        }

        let reflected = bounds.clamp(towards(&centroid, &vertices[worst], -config.alpha));
        let f_reflected = eval(&reflected);

        if f_reflected < values[best] {
            let expanded = bounds.clamp(towards(&centroid, &reflected, config.gamma));
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                vertices[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                vertices[worst] = reflected;
                values[worst] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[second_worst] {
            vertices[worst] = reflected;
            values[worst] = f_reflected;
            continue;
        }

        let outside = f_reflected < values[worst];
        let (target, f_target) = if outside {
            (reflected, f_reflected)
        } else {
            (vertices[worst].clone(), values[worst])
        };
        let contracted = bounds.clamp(towards(&centroid, &target, config.rho));
        let f_contracted = eval(&contracted);
        if f_contracted < f_target || (outside && f_contracted <= f_target) {
            vertices[worst] = contracted;
            values[worst] = f_contracted;
            continue;
        }

        let anchor = vertices[best].clone();
        for i in (0..=n).filter(|&i| i != best) {
            let shrunk = towards(&anchor, &vertices[i], config.sigma);
            vertices[i] = bounds.clamp(shrunk);
            values[i] = eval(&vertices[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: vertices[best].clone(),
        optimal_value: values[best],
        iterations,
        evaluations,
        converged,
    }
}

/// Centroid of every vertex except `skip`.
fn centroid_without(vertices: &[Vec<f64>], skip: usize) -> Vec<f64> {
    let dim = vertices[0].len();
    let count = (vertices.len() - 1) as f64;
    let mut centroid = vec![0.0; dim];
    for (_, vertex) in vertices.iter().enumerate().filter(|(i, _)| *i != skip) {
        for (c, x) in centroid.iter_mut().zip(vertex) {
            *c += x / count;
        }
    }
    centroid
}

/// `origin + t * (point - origin)`; negative `t` reflects through `origin`.
fn towards(origin: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + t * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
        assert!(result.evaluations > result.iterations);
    }

    #[test]
    fn nelder_mead_rosenbrock() {
        let config = NelderMeadConfig {
            max_iter: 5000,
            tolerance: 1e-12,
            ..Default::default()
        };

        let result = nelder_mead(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            config,
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-2);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-2);
    }

    #[test]
    fn nelder_mead_respects_bounds() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.5, 0.5],
            Some(&[(0.0, 1.0), (0.0, 1.0)]),
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.optimal_point[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn nelder_mead_treats_nan_as_worst() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_keeps_going_when_vertices_straddle_minimum() {
        // 0.95 and 1.05 have equal objective values
        let config = NelderMeadConfig {
            initial_step: 0.1 / 0.95,
            ..Default::default()
        };
        let result = nelder_mead(|x| (x[0] - 1.0).powi(2), &[0.95], None, config);

        assert!(result.converged);
        assert!(result.iterations > 1);
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn nelder_mead_empty_initial() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());

        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }
}
