//! Move search for Bisca4.
//!
//! Two interchangeable engines explore hypothetical futures by cloning the
//! game state and applying moves deterministically:
//! - depth-limited alpha-beta with a shared transposition table, move
//!   ordering, iterative deepening with aspiration windows, and an optional
//!   root-parallel driver;
//! - Monte-Carlo Tree Search with UCT selection and random or
//!   evaluator-guided rollouts.

mod alphabeta;
mod engine;
mod mcts;
mod table;

pub use alphabeta::{
    apply_move, search_best_move, search_best_move_id, search_best_move_mt, AlphaBeta,
    SearchOutcome,
};
pub use engine::{choose_move, Engine, MoveChoice};
pub use mcts::{search_best_move_mcts, MctsConfig, MctsOutcome};
pub use table::{position_hash, Bound, TransTable, TtEntry};
