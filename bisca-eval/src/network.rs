//! The evaluator network: two dense ReLU layers and a scalar output head.

use crate::features::extract_features;
use bisca_core::GameState;
use bisca_rng::Lcg64;

/// Default hidden layer widths for freshly initialized networks.
const DEFAULT_HIDDEN1: usize = 64;
const DEFAULT_HIDDEN2: usize = 32;

/// Weight scale for random initialization.
const INIT_SCALE: f64 = 0.08;

/// Weights of the two-hidden-layer evaluator.
///
/// Row-major matrices: `w1` is `[hidden1 x input_size]`, `w2` is
/// `[hidden2 x hidden1]`, `w3` is the output projection. A loaded legacy
/// network has `hidden2 == 0`: `w2`/`b2` are empty and `w3` (length
/// `hidden1`) projects the first hidden layer straight to the output.
#[derive(Debug, Clone, PartialEq)]
pub struct NnueWeights {
    pub w1: Vec<f32>,
    pub b1: Vec<f32>,
    pub w2: Vec<f32>,
    pub b2: Vec<f32>,
    pub w3: Vec<f32>,
    pub b3: f32,
    pub input_size: usize,
    pub hidden1: usize,
    pub hidden2: usize,
}

impl NnueWeights {
    /// Fresh network with uniform random weights in [-0.08, 0.08].
    ///
    /// Used as the fallback when no weight file is available; an untrained
    /// network still gives search a consistent (if arbitrary) heuristic.
    pub fn init_random(input_size: usize, rng: &mut Lcg64) -> Self {
        let hidden1 = DEFAULT_HIDDEN1;
        let hidden2 = DEFAULT_HIDDEN2;

        let rand_f32 = |rng: &mut Lcg64| ((rng.next_f64() * 2.0 - 1.0) * INIT_SCALE) as f32;

        let fill = |n: usize, rng: &mut Lcg64| -> Vec<f32> {
            (0..n).map(|_| rand_f32(rng)).collect()
        };

        let w1 = fill(hidden1 * input_size, rng);
        let b1 = fill(hidden1, rng);
        let w2 = fill(hidden2 * hidden1, rng);
        let b2 = fill(hidden2, rng);
        let w3 = fill(hidden2, rng);
        let b3 = rand_f32(rng);

        NnueWeights {
            w1,
            b1,
            w2,
            b2,
            w3,
            b3,
            input_size,
            hidden1,
            hidden2,
        }
    }

    /// Forward pass over a raw feature vector.
    ///
    /// Unbounded scalar; larger favors the player the features were
    /// extracted for.
    pub fn forward(&self, input: &[f32]) -> f32 {
        debug_assert_eq!(input.len(), self.input_size);

        let mut h1 = vec![0.0f32; self.hidden1];
        for (h, out) in h1.iter_mut().enumerate() {
            let row = &self.w1[h * self.input_size..(h + 1) * self.input_size];
            let mut acc = self.b1[h];
            for (w, x) in row.iter().zip(input) {
                acc += w * x;
            }
            *out = acc.max(0.0);
        }

        let mut out = self.b3;
        if self.hidden2 > 0 {
            let mut h2 = vec![0.0f32; self.hidden2];
            for (h, slot) in h2.iter_mut().enumerate() {
                let row = &self.w2[h * self.hidden1..(h + 1) * self.hidden1];
                let mut acc = self.b2[h];
                for (w, x) in row.iter().zip(&h1) {
                    acc += w * x;
                }
                *slot = acc.max(0.0);
            }
            for (w, x) in self.w3.iter().zip(&h2) {
                out += w * x;
            }
        } else {
            // Legacy single-layer network: project h1 directly.
            for (w, x) in self.w3.iter().zip(&h1) {
                out += w * x;
            }
        }
        out
    }

    /// Score a position from `viewpoint`'s perspective.
    pub fn evaluate(&self, state: &GameState, viewpoint: usize, perfect_info: bool) -> f32 {
        let input = extract_features(state, viewpoint, perfect_info);
        self.forward(&input)
    }
}
