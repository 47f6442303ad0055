//! Multi-layer perceptron regressor.
//!
//! ReLU hidden layers and a linear output unit, trained full-batch with Adam
//! on a standardized target.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ports::{check_training_data, LearnError, Learner, Regressor};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;

/// MLP hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpParams {
    /// Width of each hidden layer
    pub hidden: Vec<usize>,
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty on weights
    pub l2: f64,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden: vec![32, 16],
            epochs: 300,
            learning_rate: 0.01,
            l2: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Dense {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl Dense {
    fn he_uniform(fan_in: usize, fan_out: usize, rng: &mut ChaCha8Rng) -> Self {
        let limit = (6.0 / fan_in as f64).sqrt();
        let weights = Array2::from_shape_simple_fn((fan_in, fan_out), || rng.gen_range(-limit..limit));
        Self {
            weights,
            bias: Array1::zeros(fan_out),
        }
    }
}

struct AdamState {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

impl AdamState {
    fn for_layer(layer: &Dense) -> Self {
        Self {
            m_w: Array2::zeros(layer.weights.raw_dim()),
            v_w: Array2::zeros(layer.weights.raw_dim()),
            m_b: Array1::zeros(layer.bias.raw_dim()),
            v_b: Array1::zeros(layer.bias.raw_dim()),
        }
    }
}

fn adam_step<D: ndarray::Dimension>(
    param: &mut ndarray::Array<f64, D>,
    m: &mut ndarray::Array<f64, D>,
    v: &mut ndarray::Array<f64, D>,
    grad: &ndarray::Array<f64, D>,
    lr_t: f64,
) {
    Zip::from(param).and(m).and(v).and(grad).for_each(|p, m, v, &g| {
        *m = BETA1 * *m + (1.0 - BETA1) * g;
        *v = BETA2 * *v + (1.0 - BETA2) * g * g;
        *p -= lr_t * *m / (v.sqrt() + ADAM_EPS);
    });
}

/// A fitted MLP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    layers: Vec<Dense>,
    y_mean: f64,
    y_std: f64,
}

impl Mlp {
    /// Forward pass over a batch; returns the activations of every layer,
    /// starting with the input.
    fn forward(&self, x: ArrayView2<'_, f64>) -> Vec<Array2<f64>> {
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(x.to_owned());
        let last = self.layers.len() - 1;
        for (l, layer) in self.layers.iter().enumerate() {
            let mut z = acts[l].dot(&layer.weights) + &layer.bias;
            if l < last {
                z.mapv_inplace(|v| v.max(0.0));
            }
            acts.push(z);
        }
        acts
    }
}

impl Regressor for Mlp {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let last = self.layers.len() - 1;
        let mut h = row.to_owned();
        for (l, layer) in self.layers.iter().enumerate() {
            h = h.dot(&layer.weights) + &layer.bias;
            if l < last {
                h.mapv_inplace(|v| v.max(0.0));
            }
        }
        self.y_mean + self.y_std * h[0]
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let acts = self.forward(x);
        let out = acts.last().map_or_else(|| Array1::zeros(x.nrows()), |a| a.column(0).to_owned());
        out.mapv(|z| self.y_mean + self.y_std * z)
    }
}

impl Learner for MlpParams {
    type Model = Mlp;

    fn name(&self) -> &'static str {
        "mlp"
    }

    fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        seed: u64,
    ) -> Result<Self::Model, LearnError> {
        check_training_data(x, y)?;
        if self.hidden.iter().any(|&w| w == 0) {
            return Err(LearnError::InvalidParameter("hidden layer width must be positive".into()));
        }
        if self.learning_rate <= 0.0 {
            return Err(LearnError::InvalidParameter(format!(
                "learning_rate {} must be positive",
                self.learning_rate
            )));
        }

        let n = x.nrows() as f64;
        let y_mean = y.mean().unwrap_or(0.0);
        let y_std = match y.std(0.0) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let target = y.mapv(|v| (v - y_mean) / y_std).insert_axis(Axis(1));

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut widths = vec![x.ncols()];
        widths.extend(&self.hidden);
        widths.push(1);
        let layers: Vec<Dense> = widths
            .windows(2)
            .map(|w| Dense::he_uniform(w[0], w[1], &mut rng))
            .collect();

        let mut model = Mlp {
            layers,
            y_mean,
            y_std,
        };
        let mut state: Vec<AdamState> = model.layers.iter().map(AdamState::for_layer).collect();

        for epoch in 1..=self.epochs {
            let acts = model.forward(x);
            let Some(output) = acts.last() else {
                break;
            };
            // d(0.5 * mean squared error) / d(output)
            let mut delta = (output - &target) / n;

            let t = epoch as i32;
            let lr_t = self.learning_rate * (1.0 - BETA2.powi(t)).sqrt() / (1.0 - BETA1.powi(t));

            for l in (0..model.layers.len()).rev() {
                let grad_w = acts[l].t().dot(&delta) + &(&model.layers[l].weights * self.l2);
                let grad_b = delta.sum_axis(Axis(0));
                let next_delta = if l > 0 {
                    let mut back = delta.dot(&model.layers[l].weights.t());
                    Zip::from(&mut back)
                        .and(&acts[l])
                        .for_each(|d, &a| if a <= 0.0 { *d = 0.0 });
                    Some(back)
                } else {
                    None
                };

                let layer = &mut model.layers[l];
                let s = &mut state[l];
                adam_step(&mut layer.weights, &mut s.m_w, &mut s.v_w, &grad_w, lr_t);
                adam_step(&mut layer.bias, &mut s.m_b, &mut s.v_b, &grad_b, lr_t);

                if let Some(back) = next_delta {
                    delta = back;
                }
            }
        }

        let finite = model
            .layers
            .iter()
            .all(|l| l.weights.iter().chain(l.bias.iter()).all(|v| v.is_finite()));
        if !finite {
            return Err(LearnError::NonFinite("mlp weights"));
        }
        tracing::debug!("Trained MLP {:?} for {} epochs", self.hidden, self.epochs);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((80, 2), |(i, j)| {
            if j == 0 {
                (i % 10) as f64 / 5.0 - 1.0
            } else {
                (i / 10) as f64 / 4.0 - 1.0
            }
        });
        let y = Array1::from_iter(x.outer_iter().map(|r| 100.0 + 20.0 * r[0] - 10.0 * r[1]));
        (x, y)
    }

    #[test]
    fn test_learns_linear_target() {
        let (x, y) = plane();
        let model = MlpParams::default().fit(x.view(), y.view(), 42).expect("fit");
        let pred = model.predict(x.view());
        let rmse = (&pred - &y).mapv(|e| e * e).mean().map_or(f64::NAN, f64::sqrt);
        let std = y.std(0.0);
        assert!(rmse < 0.3 * std, "rmse {rmse} vs std {std}");
    }

    #[test]
    fn test_batch_and_row_predictions_agree() {
        let (x, y) = plane();
        let params = MlpParams {
            epochs: 20,
            ..MlpParams::default()
        };
        let model = params.fit(x.view(), y.view(), 1).expect("fit");
        let batch = model.predict(x.view());
        for (i, row) in x.outer_iter().enumerate() {
            assert!((model.predict_row(row) - batch[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let (x, y) = plane();
        let params = MlpParams {
            epochs: 30,
            ..MlpParams::default()
        };
        let a = params.fit(x.view(), y.view(), 5).expect("fit");
        let b = params.fit(x.view(), y.view(), 5).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_width_layer_rejected() {
        let (x, y) = plane();
        let params = MlpParams {
            hidden: vec![8, 0],
            ..MlpParams::default()
        };
        assert!(params.fit(x.view(), y.view(), 0).is_err());
    }
}
