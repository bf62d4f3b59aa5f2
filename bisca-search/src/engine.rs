//! Engine selection: a closed tagged variant over the two search
//! algorithms, exposing one uniform choose-move contract to callers.

use bisca_core::GameState;
use bisca_eval::NnueWeights;
use bisca_rng::Lcg64;

use crate::alphabeta::{search_best_move_id, search_best_move_mt};
use crate::mcts::{search_best_move_mcts, MctsConfig};
use crate::table::TransTable;

/// Which search algorithm decides a move, and with what budget.
#[derive(Debug, Clone, Copy)]
pub enum Engine {
    AlphaBeta {
        depth: u32,
        /// Fan root moves out across rayon tasks instead of the iterative
        /// deepening driver.
        root_parallel: bool,
    },
    Mcts {
        config: MctsConfig,
        /// Whether cut-short rollouts consult the evaluator.
        use_evaluator: bool,
    },
}

/// Uniform result of asking an engine for a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveChoice {
    /// Hand index for the current player; `None` when no legal move exists.
    pub mv: Option<usize>,
    pub eval: f32,
    /// Chosen-child visit count; MCTS only.
    pub visits: Option<u32>,
}

/// Ask the configured engine for the current player's move.
///
/// Alpha-beta always consults the evaluator; MCTS uses it only when the
/// engine was configured to (rollout-only otherwise).
pub fn choose_move(
    state: &GameState,
    engine: &Engine,
    weights: &NnueWeights,
    table: &TransTable,
    perfect_info: bool,
    rng: &mut Lcg64,
) -> MoveChoice {
    match *engine {
        Engine::AlphaBeta {
            depth,
            root_parallel,
        } => {
            let outcome = if root_parallel {
                search_best_move_mt(state, weights, table, depth, perfect_info)
            } else {
                search_best_move_id(state, weights, table, depth, perfect_info)
            };
            MoveChoice {
                mv: outcome.mv,
                eval: outcome.eval,
                visits: None,
            }
        }
        Engine::Mcts {
            config,
            use_evaluator,
        } => {
            let rollout_weights = if use_evaluator { Some(weights) } else { None };
            let outcome = search_best_move_mcts(
                state,
                state.current_player,
                &config,
                rollout_weights,
                perfect_info,
                rng,
            );
            MoveChoice {
                mv: outcome.mv,
                eval: outcome.eval,
                visits: Some(outcome.visits),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisca_eval::INPUT_SIZE;

    #[test]
    fn test_both_engines_produce_legal_moves() {
        let mut rng = Lcg64::new(21);
        let state = GameState::deal(&mut rng);
        let weights = NnueWeights::init_random(INPUT_SIZE, &mut rng);
        let table = TransTable::default();

        let engines = [
            Engine::AlphaBeta {
                depth: 2,
                root_parallel: false,
            },
            Engine::Mcts {
                config: MctsConfig {
                    iterations: 100,
                    ..MctsConfig::default()
                },
                use_evaluator: true,
            },
        ];

        for engine in engines {
            let choice = choose_move(&state, &engine, &weights, &table, false, &mut rng);
            let mv = choice.mv.expect("fresh deal has moves");
            assert!(mv < state.hands[state.current_player].len());
            match engine {
                Engine::AlphaBeta { .. } => assert!(choice.visits.is_none()),
                Engine::Mcts { .. } => assert!(choice.visits.is_some()),
            }
        }
    }
}
