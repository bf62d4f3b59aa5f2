//! Position evaluation for the Bisca4 engine.
//!
//! A small NNUE-style feed-forward network scores a game state from one
//! player's viewpoint. The feature vector is the only channel through which
//! the network perceives a position, so information hiding is enforced at
//! extraction time: the opponent's hand is encoded only in perfect-info mode.

mod features;
mod io;
mod network;

pub use features::{extract_features, INPUT_SIZE};
pub use io::{load_weights, save_weights, WeightsError};
pub use network::NnueWeights;
