//! Depth-limited alpha-beta search with a transposition table, evaluator
//! move ordering, iterative deepening with aspiration windows, and a
//! root-parallel driver.

use std::sync::atomic::{AtomicU32, Ordering};

use bisca_core::GameState;
use bisca_eval::NnueWeights;
use rayon::prelude::*;

use crate::table::{position_hash, TransTable};

/// Result of searching one root position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    /// Hand index to play; `None` when the root has no legal moves.
    pub mv: Option<usize>,
    pub eval: f32,
}

/// Clone the state, play the card, resolve any completed trick.
///
/// Trick resolution is fully deterministic (draws pop from the ordered
/// deck), so identical move sequences from identical positions yield
/// identical states — which is what makes sub-trees cacheable.
pub fn apply_move(state: &GameState, player: usize, hand_index: usize) -> GameState {
    let mut next = state.clone();
    next.play_card(player, hand_index);
    next.maybe_close_trick();
    next
}

/// Alpha-beta searcher over hypothetical futures of one root position.
///
/// Values are always from `root_player`'s perspective; nodes where the
/// opponent is to move minimize.
pub struct AlphaBeta<'a> {
    weights: &'a NnueWeights,
    table: &'a TransTable,
    root_player: usize,
    perfect_info: bool,
}

impl<'a> AlphaBeta<'a> {
    pub fn new(
        weights: &'a NnueWeights,
        table: &'a TransTable,
        root_player: usize,
        perfect_info: bool,
    ) -> Self {
        AlphaBeta {
            weights,
            table,
            root_player,
            perfect_info,
        }
    }

    #[inline]
    fn static_eval(&self, state: &GameState) -> f32 {
        self.weights
            .evaluate(state, self.root_player, self.perfect_info)
    }

    /// Horizon evaluation with a one-ply stabilization step.
    ///
    /// An empty table means a trick just resolved; scoring that instant
    /// directly mis-values the position, so look one card ahead and take
    /// the max (root to move) or min (opponent to move) over the replies.
    fn horizon_eval(&self, state: &GameState) -> f32 {
        if !state.trick.cards.is_empty() {
            return self.static_eval(state);
        }

        let player = state.current_player;
        let moves = state.legal_moves(player);
        if moves.is_empty() {
            return self.static_eval(state);
        }

        let maximizing = player == self.root_player;
        let mut best = if maximizing {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };
        for m in moves {
            let next = apply_move(state, player, m);
            let v = self.static_eval(&next);
            best = if maximizing { best.max(v) } else { best.min(v) };
        }
        best
    }

    /// Legal moves sorted by a single-evaluator-call heuristic: apply the
    /// move, score the result, no recursion. High-to-low at MAX nodes,
    /// low-to-high at MIN nodes, to tighten pruning.
    pub fn ordered_moves(&self, state: &GameState, player: usize) -> Vec<(usize, f32)> {
        let mut ordered: Vec<(usize, f32)> = state
            .legal_moves(player)
            .into_iter()
            .map(|m| {
                let next = apply_move(state, player, m);
                (m, self.static_eval(&next))
            })
            .collect();

        if player == self.root_player {
            ordered.sort_by(|a, b| b.1.total_cmp(&a.1));
        } else {
            ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
        }
        ordered
    }

    /// Recursive alpha-beta over the clone-and-apply move graph.
    pub fn search(&self, state: &GameState, depth: u32, mut alpha: f32, mut beta: f32) -> f32 {
        if state.finished {
            return self.static_eval(state);
        }

        let alpha_orig = alpha;
        let beta_orig = beta;

        if depth > 0 {
            let key = position_hash(state);
            if let Some(v) = self.table.lookup(key, depth, alpha, beta) {
                return v;
            }
        }

        if depth == 0 {
            return self.horizon_eval(state);
        }

        let player = state.current_player;
        let ordered = self.ordered_moves(state, player);
        if ordered.is_empty() {
            return self.static_eval(state);
        }

        let maximizing = player == self.root_player;
        let mut best_move = ordered[0].0;
        let mut best = if maximizing {
            f32::NEG_INFINITY
        } else {
            f32::INFINITY
        };

        for &(m, _) in &ordered {
            let next = apply_move(state, player, m);
            let val = self.search(&next, depth - 1, alpha, beta);

            if maximizing {
                if val > best {
                    best = val;
                }
                if val > alpha {
                    alpha = val;
                    best_move = m;
                }
            } else {
                if val < best {
                    best = val;
                }
                if val < beta {
                    beta = val;
                    best_move = m;
                }
            }
            if alpha >= beta {
                break;
            }
        }

        let key = position_hash(state);
        self.table
            .store(key, depth, best, alpha_orig, beta_orig, Some(best_move));
        best
    }

    /// Search every root move inside the window `[alpha, beta]`, raising
    /// alpha as values come in. Shared by the plain and iterative drivers.
    fn search_root(
        &self,
        state: &GameState,
        ordered: &[(usize, f32)],
        depth: u32,
        mut alpha: f32,
        beta: f32,
    ) -> (f32, usize) {
        let player = state.current_player;
        let mut best = f32::NEG_INFINITY;
        let mut best_move = ordered[0].0;

        for &(m, _) in ordered {
            let next = apply_move(state, player, m);
            let val = self.search(&next, depth.saturating_sub(1), alpha, beta);
            if val > best {
                best = val;
                best_move = m;
            }
            if best > alpha {
                alpha = best;
            }
        }
        (best, best_move)
    }
}

/// Single-window, single-threaded driver.
pub fn search_best_move(
    state: &GameState,
    weights: &NnueWeights,
    table: &TransTable,
    depth: u32,
    perfect_info: bool,
) -> SearchOutcome {
    let player = state.current_player;
    let searcher = AlphaBeta::new(weights, table, player, perfect_info);

    let ordered = searcher.ordered_moves(state, player);
    if ordered.is_empty() {
        return SearchOutcome {
            mv: None,
            eval: searcher.static_eval(state),
        };
    }

    let (eval, mv) = searcher.search_root(
        state,
        &ordered,
        depth,
        f32::NEG_INFINITY,
        f32::INFINITY,
    );
    SearchOutcome { mv: Some(mv), eval }
}

/// Iterative deepening with aspiration windows.
///
/// Each depth opens a window around the previous best value, widening
/// geometrically on the failing side and retrying the same depth until the
/// result lands strictly inside. Shallow iterations warm the table and the
/// move ordering for the deeper ones.
pub fn search_best_move_id(
    state: &GameState,
    weights: &NnueWeights,
    table: &TransTable,
    depth: u32,
    perfect_info: bool,
) -> SearchOutcome {
    let player = state.current_player;
    let searcher = AlphaBeta::new(weights, table, player, perfect_info);

    let ordered = searcher.ordered_moves(state, player);
    if ordered.is_empty() {
        return SearchOutcome {
            mv: None,
            eval: searcher.static_eval(state),
        };
    }

    let mut best_eval = searcher.static_eval(state);
    let mut best_move = ordered[0].0;

    for d in 1..=depth {
        let mut delta = 0.5 + 0.5 * d as f32;
        let mut alpha = best_eval - delta;
        let mut beta = best_eval + delta;

        loop {
            let (cur_best, cur_move) = searcher.search_root(state, &ordered, d, alpha, beta);

            if cur_best <= alpha {
                // Fail low: widen downward and retry this depth.
                alpha -= delta;
                delta *= 2.0;
                continue;
            }
            if cur_best >= beta {
                // Fail high: widen upward and retry this depth.
                beta += delta;
                delta *= 2.0;
                continue;
            }

            best_eval = cur_best;
            best_move = cur_move;
            break;
        }
    }

    SearchOutcome {
        mv: Some(best_move),
        eval: best_eval,
    }
}

/// Root-parallel driver: every root move is searched to full depth in its
/// own rayon task and the best result wins.
///
/// Tasks share one alpha bound through a relaxed atomic, read once at task
/// start and raised after each exact result. Pruning is therefore
/// best-effort (a late task may miss an earlier bound) but selection stays
/// correct: any move that could win is searched with alpha below its true
/// value, so its value comes back exact.
pub fn search_best_move_mt(
    state: &GameState,
    weights: &NnueWeights,
    table: &TransTable,
    depth: u32,
    perfect_info: bool,
) -> SearchOutcome {
    let player = state.current_player;
    let searcher = AlphaBeta::new(weights, table, player, perfect_info);

    let ordered = searcher.ordered_moves(state, player);
    if ordered.is_empty() {
        return SearchOutcome {
            mv: None,
            eval: searcher.static_eval(state),
        };
    }

    let shared_alpha = AtomicU32::new(f32::NEG_INFINITY.to_bits());

    let results: Vec<(usize, f32)> = ordered
        .par_iter()
        .map(|&(m, _)| {
            let alpha = f32::from_bits(shared_alpha.load(Ordering::Relaxed));
            let next = apply_move(state, player, m);
            let val = searcher.search(&next, depth.saturating_sub(1), alpha, f32::INFINITY);

            // Raise the shared bound; only exact values (above the bound)
            // get published.
            let mut cur = shared_alpha.load(Ordering::Relaxed);
            while f32::from_bits(cur) < val {
                match shared_alpha.compare_exchange_weak(
                    cur,
                    val.to_bits(),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(seen) => cur = seen,
                }
            }

            (m, val)
        })
        .collect();

    let mut best_move = results[0].0;
    let mut best = f32::NEG_INFINITY;
    for &(m, val) in &results {
        if val > best {
            best = val;
            best_move = m;
        }
    }

    SearchOutcome {
        mv: Some(best_move),
        eval: best,
    }
}
