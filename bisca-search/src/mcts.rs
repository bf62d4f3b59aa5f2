//! Monte-Carlo Tree Search with UCT selection.
//!
//! The tree is arena-backed: nodes live in a `Vec` addressed by index, each
//! child owned by exactly one parent edge, the whole arena discarded when
//! the search call returns. Values are stored root-player-relative and
//! negated at opponent nodes during selection.

use bisca_core::{GameState, TOTAL_POINTS};
use bisca_eval::NnueWeights;
use bisca_rng::Lcg64;

use crate::alphabeta::apply_move;

/// Tuning knobs for one MCTS invocation.
#[derive(Debug, Clone, Copy)]
pub struct MctsConfig {
    pub iterations: u32,
    /// UCT exploration constant.
    pub exploration: f32,
    /// Rollout step budget; 0 plays every rollout to the end of the game.
    pub rollout_limit: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            iterations: 2000,
            exploration: std::f32::consts::SQRT_2,
            rollout_limit: 0,
        }
    }
}

/// Result of one MCTS invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MctsOutcome {
    /// Hand index to play; `None` when the root has no legal moves.
    pub mv: Option<usize>,
    /// Mean value of the chosen child, root-player-relative.
    pub eval: f32,
    /// Visit count of the chosen child.
    pub visits: u32,
}

type NodeId = u32;

struct Node {
    state: GameState,
    to_play: usize,
    move_from_parent: usize,
    parent: Option<NodeId>,
    /// Legal moves not yet expanded, pre-shuffled to avoid ordering bias.
    untried: Vec<usize>,
    children: Vec<(usize, NodeId)>,
    visits: u32,
    /// Accumulated value from the search root player's perspective.
    total_value: f32,
}

struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new() -> Self {
        Tree { nodes: Vec::new() }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }
}

fn shuffle_moves(moves: &mut [usize], rng: &mut Lcg64) {
    for i in (1..moves.len()).rev() {
        let j = rng.next_index(i + 1);
        moves.swap(i, j);
    }
}

/// Descend by UCT until a node with untried moves, a terminal, or a leaf.
fn select(tree: &Tree, root_player: usize, exploration: f32) -> NodeId {
    let mut id: NodeId = 0;
    loop {
        let node = tree.get(id);
        if !node.untried.is_empty() || node.state.finished || node.children.is_empty() {
            return id;
        }

        let parent_visits = (node.visits + 1) as f32;
        let mut best_score = f32::NEG_INFINITY;
        let mut best_child = id;

        for &(_, child_id) in &node.children {
            let child = tree.get(child_id);
            let score = if child.visits == 0 {
                // Unvisited children have infinite priority.
                f32::INFINITY
            } else {
                let mut mean = child.total_value / child.visits as f32;
                if node.to_play != root_player {
                    mean = -mean;
                }
                mean + exploration * (parent_visits.ln() / child.visits as f32).sqrt()
            };

            if score > best_score {
                best_score = score;
                best_child = child_id;
            }
        }

        if best_child == id {
            return id;
        }
        id = best_child;
    }
}

/// Pop one untried move and attach the resulting child node.
fn expand(tree: &mut Tree, id: NodeId, rng: &mut Lcg64) -> NodeId {
    let (mv, next) = {
        let node = tree.get_mut(id);
        let Some(mv) = node.untried.pop() else {
            return id;
        };
        let next = apply_move(&node.state, node.to_play, mv);
        (mv, next)
    };

    let to_play = next.current_player;
    let mut untried = next.legal_moves(to_play);
    shuffle_moves(&mut untried, rng);

    let child = Node {
        state: next,
        to_play,
        move_from_parent: mv,
        parent: Some(id),
        untried,
        children: Vec::new(),
        visits: 0,
        total_value: 0.0,
    };
    let child_id = tree.push(child);
    tree.get_mut(id).children.push((mv, child_id));
    child_id
}

/// Play uniformly random moves from the node's state until the game ends or
/// the step budget runs out.
///
/// A finished game is worth its true normalized score differential; a
/// cut-short rollout falls back to the evaluator when one is configured.
fn rollout(
    start: &GameState,
    root_player: usize,
    cfg: &MctsConfig,
    weights: Option<&NnueWeights>,
    perfect_info: bool,
    rng: &mut Lcg64,
) -> f32 {
    let mut state = start.clone();
    let mut steps = 0u32;

    while !state.finished {
        if cfg.rollout_limit > 0 && steps >= cfg.rollout_limit {
            break;
        }
        let player = state.current_player;
        let moves = state.legal_moves(player);
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.next_index(moves.len())];
        state = apply_move(&state, player, mv);
        steps += 1;
    }

    let diff = state.score[root_player] as f32 - state.score[1 - root_player] as f32;
    match weights {
        Some(w) if !state.finished => w.evaluate(&state, root_player, perfect_info),
        _ => diff / TOTAL_POINTS as f32,
    }
}

/// Add the value to every node from the touched leaf up to the root.
fn backpropagate(tree: &mut Tree, mut id: NodeId, value: f32) {
    loop {
        let node = tree.get_mut(id);
        node.visits += 1;
        node.total_value += value;
        match node.parent {
            Some(parent) => id = parent,
            None => break,
        }
    }
}

/// Grow a tree for the given root; separated from result extraction so
/// tests can inspect the root's children.
fn build_tree(
    state: &GameState,
    root_player: usize,
    cfg: &MctsConfig,
    weights: Option<&NnueWeights>,
    perfect_info: bool,
    rng: &mut Lcg64,
) -> Tree {
    let mut untried = state.legal_moves(root_player);
    shuffle_moves(&mut untried, rng);

    let mut tree = Tree::new();
    tree.push(Node {
        state: state.clone(),
        to_play: root_player,
        move_from_parent: usize::MAX,
        parent: None,
        untried,
        children: Vec::new(),
        visits: 0,
        total_value: 0.0,
    });

    for _ in 0..cfg.iterations {
        let mut id = select(&tree, root_player, cfg.exploration);
        if !tree.get(id).state.finished {
            id = expand(&mut tree, id, rng);
        }
        let value = rollout(
            &tree.get(id).state,
            root_player,
            cfg,
            weights,
            perfect_info,
            rng,
        );
        backpropagate(&mut tree, id, value);
    }

    tree
}

/// Run MCTS from the given state for `root_player`.
///
/// The chosen move is the most-visited root child (not the best mean);
/// `None` with zero evaluation when the root has no legal moves.
pub fn search_best_move_mcts(
    state: &GameState,
    root_player: usize,
    cfg: &MctsConfig,
    weights: Option<&NnueWeights>,
    perfect_info: bool,
    rng: &mut Lcg64,
) -> MctsOutcome {
    let moves = state.legal_moves(root_player);
    if moves.is_empty() {
        return MctsOutcome {
            mv: None,
            eval: 0.0,
            visits: 0,
        };
    }

    let tree = build_tree(state, root_player, cfg, weights, perfect_info, rng);

    let root = tree.get(0);
    let mut best: Option<&Node> = None;
    for &(_, child_id) in &root.children {
        let child = tree.get(child_id);
        if best.map_or(true, |b| child.visits > b.visits) {
            best = Some(child);
        }
    }

    match best {
        Some(child) => MctsOutcome {
            mv: Some(child.move_from_parent),
            eval: if child.visits > 0 {
                child.total_value / child.visits as f32
            } else {
                0.0
            },
            visits: child.visits,
        },
        None => MctsOutcome {
            mv: Some(moves[0]),
            eval: 0.0,
            visits: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisca_eval::INPUT_SIZE;

    fn fresh_deal(seed: u64) -> (GameState, Lcg64) {
        let mut rng = Lcg64::new(seed);
        let state = GameState::deal(&mut rng);
        (state, rng)
    }

    #[test]
    fn test_returns_legal_move() {
        let (state, mut rng) = fresh_deal(1);
        let cfg = MctsConfig {
            iterations: 200,
            ..MctsConfig::default()
        };
        let outcome = search_best_move_mcts(&state, 0, &cfg, None, false, &mut rng);
        let mv = outcome.mv.expect("fresh deal has moves");
        assert!(mv < state.hands[0].len());
        assert!(outcome.visits > 0);
        assert!(outcome.eval.is_finite());
    }

    #[test]
    fn test_no_moves_for_off_turn_player() {
        let (state, mut rng) = fresh_deal(2);
        // Player 1 is not to move; the root has no legal moves for them.
        let outcome =
            search_best_move_mcts(&state, 1, &MctsConfig::default(), None, false, &mut rng);
        assert_eq!(outcome.mv, None);
        assert_eq!(outcome.eval, 0.0);
        assert_eq!(outcome.visits, 0);
    }

    #[test]
    fn test_root_visit_conservation() {
        let (state, mut rng) = fresh_deal(3);
        let cfg = MctsConfig {
            iterations: 300,
            ..MctsConfig::default()
        };
        let tree = build_tree(&state, 0, &cfg, None, false, &mut rng);

        // Every iteration of a non-terminal root descends through exactly
        // one root child, so child visits sum to the iteration count.
        let root = tree.get(0);
        let total: u32 = root
            .children
            .iter()
            .map(|&(_, id)| tree.get(id).visits)
            .sum();
        assert_eq!(total, cfg.iterations);
        assert_eq!(root.visits, cfg.iterations);
        assert_eq!(root.children.len(), 4);
    }

    #[test]
    fn test_deterministic_for_fixed_rng() {
        let (state, _) = fresh_deal(4);
        let cfg = MctsConfig {
            iterations: 100,
            ..MctsConfig::default()
        };
        let mut rng1 = Lcg64::new(42);
        let mut rng2 = Lcg64::new(42);
        let a = search_best_move_mcts(&state, 0, &cfg, None, false, &mut rng1);
        let b = search_best_move_mcts(&state, 0, &cfg, None, false, &mut rng2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rollout_terminal_value_is_normalized_diff() {
        // Play a game to the end, then roll out from the terminal state:
        // the value must be the exact normalized differential.
        let (mut state, mut rng) = fresh_deal(5);
        while !state.finished {
            let p = state.current_player;
            let moves = state.legal_moves(p);
            state.play_card(p, moves[rng.next_index(moves.len())]);
            state.maybe_close_trick();
        }
        let cfg = MctsConfig::default();
        let v = rollout(&state, 0, &cfg, None, false, &mut rng);
        let expected = (state.score[0] as f32 - state.score[1] as f32) / TOTAL_POINTS as f32;
        assert_eq!(v, expected);
    }

    #[test]
    fn test_capped_rollout_uses_evaluator() {
        let (state, mut rng) = fresh_deal(6);
        let weights = NnueWeights::init_random(INPUT_SIZE, &mut rng);
        let cfg = MctsConfig {
            iterations: 50,
            rollout_limit: 2,
            ..MctsConfig::default()
        };

        // With a 2-step cap from a fresh deal the game cannot finish, so
        // every rollout value comes from the evaluator; the search still
        // produces a legal move.
        let outcome =
            search_best_move_mcts(&state, 0, &cfg, Some(&weights), false, &mut rng);
        assert!(outcome.mv.is_some());
    }
}
