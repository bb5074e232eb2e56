//! Long Short-Term Memory layer with backpropagation through time.
//!
//! # Reference
//!
//! Hochreiter, S., & Schmidhuber, J. (1997). Long Short-Term Memory. Neural Computation.

use ndarray::{s, Array2, ArrayView2, Axis};
use rand::Rng;

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Glorot/Xavier uniform initialisation for a `(fan_in, fan_out)` matrix.
pub(crate) fn glorot_uniform<R: Rng>(fan_in: usize, fan_out: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-limit..limit))
}

fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // Box-Muller; 1 - u keeps the log argument in (0, 1]
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Random `(rows, cols)` matrix with orthonormal rows, `rows <= cols`.
///
/// Rows are drawn from a standard normal and orthonormalised with modified
/// Gram-Schmidt.
pub(crate) fn orthogonal<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let mut q = Array2::from_shape_fn((rows, cols), |_| standard_normal(rng));
    for i in 0..rows {
        for j in 0..i {
            let proj = q.row(i).dot(&q.row(j));
            let prev = q.row(j).to_owned();
            q.row_mut(i).scaled_add(-proj, &prev);
        }
        let norm = q.row(i).dot(&q.row(i)).sqrt();
        if norm > 1e-12 {
            q.row_mut(i).mapv_inplace(|v| v / norm);
        }
    }
    q
}

/// Gradients of one [`LstmLayer`], shaped like its parameters.
#[derive(Debug, Clone)]
pub struct LstmGradients {
    pub kernel: Array2<f64>,
    pub recurrent: Array2<f64>,
    pub bias: Array2<f64>,
}

impl LstmGradients {
    /// Gradients in [`LstmLayer::parameters_mut`] order.
    pub fn into_vec(self) -> Vec<Array2<f64>> {
        vec![self.kernel, self.recurrent, self.bias]
    }
}

#[derive(Debug, Clone)]
struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    input: Array2<f64>,
    forget: Array2<f64>,
    candidate: Array2<f64>,
    output: Array2<f64>,
    tanh_c: Array2<f64>,
}

/// Activations recorded by [`LstmLayer::forward`] for the backward pass.
#[derive(Debug, Clone, Default)]
pub struct LstmCache {
    steps: Vec<StepCache>,
}

impl LstmCache {
    /// Number of recorded timesteps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A single LSTM layer over `(batch, input_size)` timestep matrices.
///
/// The four gates share one kernel of shape `(input_size, 4 * hidden)` and one
/// recurrent kernel of shape `(hidden, 4 * hidden)`, laid out as
/// input, forget, candidate, output.
#[derive(Debug, Clone)]
pub struct LstmLayer {
    input_size: usize,
    hidden_size: usize,
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array2<f64>,
}

impl LstmLayer {
    /// Create a layer with Glorot-uniform input weights, orthogonal recurrent
    /// weights and a forget-gate bias of one.
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let h = hidden_size;
        let kernel = glorot_uniform(input_size, 4 * h, rng);
        let recurrent = orthogonal(h, 4 * h, rng);
        let mut bias = Array2::zeros((1, 4 * h));
        bias.slice_mut(s![.., h..2 * h]).fill(1.0);
        Self {
            input_size,
            hidden_size,
            kernel,
            recurrent,
            bias,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Mutable parameters: kernel, recurrent kernel, bias.
    pub fn parameters_mut(&mut self) -> Vec<&mut Array2<f64>> {
        vec![&mut self.kernel, &mut self.recurrent, &mut self.bias]
    }

    fn gates(&self, x: &ArrayView2<f64>, h: &Array2<f64>) -> [Array2<f64>; 4] {
        let hs = self.hidden_size;
        let z = x.dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;
        [
            z.slice(s![.., 0..hs]).mapv(sigmoid),
            z.slice(s![.., hs..2 * hs]).mapv(sigmoid),
            z.slice(s![.., 2 * hs..3 * hs]).mapv(f64::tanh),
            z.slice(s![.., 3 * hs..]).mapv(sigmoid),
        ]
    }

    /// Run the layer over a sequence starting from zero state.
    ///
    /// Returns the hidden state at every step together with the cache
    /// needed by [`backward`](Self::backward).
    pub fn forward(&self, inputs: &[Array2<f64>]) -> (Vec<Array2<f64>>, LstmCache) {
        let batch = inputs.first().map_or(0, |x| x.nrows());
        let mut h = Array2::zeros((batch, self.hidden_size));
        let mut c = Array2::zeros((batch, self.hidden_size));
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut cache = LstmCache {
            steps: Vec::with_capacity(inputs.len()),
        };

        for x in inputs {
            let [input, forget, candidate, output] = self.gates(&x.view(), &h);
            let c_new = &forget * &c + &input * &candidate;
            let tanh_c = c_new.mapv(f64::tanh);
            let h_new = &output * &tanh_c;

            cache.steps.push(StepCache {
                x: x.clone(),
                h_prev: h,
                c_prev: c,
                input,
                forget,
                candidate,
                output,
                tanh_c,
            });
            outputs.push(h_new.clone());
            h = h_new;
            c = c_new;
        }

        (outputs, cache)
    }

    /// Hidden states only, without recording a cache.
    pub fn infer(&self, inputs: &[Array2<f64>]) -> Vec<Array2<f64>> {
        let batch = inputs.first().map_or(0, |x| x.nrows());
        let mut h = Array2::zeros((batch, self.hidden_size));
        let mut c = Array2::zeros((batch, self.hidden_size));
        let mut outputs = Vec::with_capacity(inputs.len());
        for x in inputs {
            let [input, forget, candidate, output] = self.gates(&x.view(), &h);
            c = &forget * &c + &input * &candidate;
            h = &output * &c.mapv(f64::tanh);
            outputs.push(h.clone());
        }
        outputs
    }

    /// Backpropagate `d_outputs` (one gradient per timestep) through time.
    ///
    /// Returns the parameter gradients and the gradient with respect to each
    /// timestep's input.
    pub fn backward(
        &self,
        cache: &LstmCache,
        d_outputs: &[Array2<f64>],
    ) -> (LstmGradients, Vec<Array2<f64>>) {
        let hs = self.hidden_size;
        let mut grads = LstmGradients {
            kernel: Array2::zeros(self.kernel.raw_dim()),
            recurrent: Array2::zeros(self.recurrent.raw_dim()),
            bias: Array2::zeros(self.bias.raw_dim()),
        };
        let mut d_inputs = vec![Array2::zeros((0, 0)); cache.steps.len()];

        let batch = cache.steps.first().map_or(0, |s| s.x.nrows());
        let mut dh_next = Array2::<f64>::zeros((batch, hs));
        let mut dc_next = Array2::<f64>::zeros((batch, hs));

        for (t, step) in cache.steps.iter().enumerate().rev() {
            let dh = &d_outputs[t] + &dh_next;

            let d_output = &dh * &step.tanh_c;
            let dc = &dh * &step.output * &step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let d_input = &dc * &step.candidate;
            let d_forget = &dc * &step.c_prev;
            let d_candidate = &dc * &step.input;
            dc_next = &dc * &step.forget;

            let mut dz = Array2::<f64>::zeros((batch, 4 * hs));
            dz.slice_mut(s![.., 0..hs])
                .assign(&(&d_input * &step.input.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., hs..2 * hs])
                .assign(&(&d_forget * &step.forget.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * hs..3 * hs])
                .assign(&(&d_candidate * &step.candidate.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * hs..])
                .assign(&(&d_output * &step.output.mapv(|v| v * (1.0 - v))));

            grads.kernel += &step.x.t().dot(&dz);
            grads.recurrent += &step.h_prev.t().dot(&dz);
            grads.bias += &dz.sum_axis(Axis(0)).insert_axis(Axis(0));

            d_inputs[t] = dz.dot(&self.kernel.t());
            dh_next = dz.dot(&self.recurrent.t());
        }

        (grads, d_inputs)
    }
}
