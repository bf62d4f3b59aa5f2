//! Transposition table: a bounded memoization cache shared across search
//! threads, plus the structural position hash that keys it.

use bisca_core::GameState;
use rustc_hash::FxHashMap;
use std::sync::Mutex;

/// How a cached value bounds the true minimax value at its depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    pub value: f32,
    pub depth: u32,
    pub flag: Bound,
    pub best_move: Option<usize>,
}

/// Mutex-guarded position cache with a hard entry cap.
///
/// Overflow clears the whole map instead of evicting selectively — coarse
/// backpressure that keeps the table bounded without bookkeeping.
pub struct TransTable {
    entries: Mutex<FxHashMap<u64, TtEntry>>,
    capacity: usize,
}

impl TransTable {
    pub const DEFAULT_CAPACITY: usize = 1_000_000;

    pub fn new(capacity: usize) -> Self {
        TransTable {
            entries: Mutex::new(FxHashMap::default()),
            capacity,
        }
    }

    /// Probe for a usable value at the given search window.
    ///
    /// An entry applies only if it was searched at least as deep as
    /// requested, and then only when its bound decides the node: exact
    /// always, a lower bound at or above beta, an upper bound at or below
    /// alpha.
    pub fn lookup(&self, key: u64, depth: u32, alpha: f32, beta: f32) -> Option<f32> {
        let entries = self.entries.lock().expect("tt lock poisoned");
        let e = entries.get(&key)?;
        if e.depth < depth {
            return None;
        }
        match e.flag {
            Bound::Exact => Some(e.value),
            Bound::Lower if e.value >= beta => Some(e.value),
            Bound::Upper if e.value <= alpha => Some(e.value),
            _ => None,
        }
    }

    /// Record a resolved node. The flag is derived from where the value
    /// landed relative to the original window.
    pub fn store(
        &self,
        key: u64,
        depth: u32,
        value: f32,
        alpha_orig: f32,
        beta_orig: f32,
        best_move: Option<usize>,
    ) {
        let flag = if value <= alpha_orig {
            Bound::Upper
        } else if value >= beta_orig {
            Bound::Lower
        } else {
            Bound::Exact
        };

        let mut entries = self.entries.lock().expect("tt lock poisoned");
        if entries.len() > self.capacity {
            entries.clear();
        }
        entries.insert(
            key,
            TtEntry {
                value,
                depth,
                flag,
                best_move,
            },
        );
    }

    /// Raw entry access, for diagnostics and tests.
    pub fn get(&self, key: u64) -> Option<TtEntry> {
        self.entries.lock().expect("tt lock poisoned").get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("tt lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().expect("tt lock poisoned").clear();
    }
}

impl Default for TransTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[inline]
fn hash_combine(h: &mut u64, v: u64) {
    *h ^= v
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(*h << 6)
        .wrapping_add(*h >> 2);
}

#[inline]
fn card_key(card: &bisca_core::Card) -> u64 {
    ((card.suit as u64) << 8) | card.rank as u64
}

/// Structural 64-bit hash over every field that affects future play:
/// turn, scores, trump identity, deck order, both hands, and the table.
pub fn position_hash(state: &GameState) -> u64 {
    let mut h = 0xcafe_babe_1234_5678u64;

    hash_combine(&mut h, state.current_player as u64);
    hash_combine(&mut h, (state.score[0] & 0xffff) as u64);
    hash_combine(&mut h, (state.score[1] & 0xffff) as u64);

    hash_combine(&mut h, state.trump_suit as u64);
    hash_combine(&mut h, card_key(&state.trump_card));

    for card in &state.deck {
        hash_combine(&mut h, card_key(card).wrapping_add(0x1111_1111_1111_1111));
    }

    for (p, hand) in state.hands.iter().enumerate() {
        let salt = if p == 1 { 0x2222_2222_2222_2222 } else { 0 };
        for card in hand {
            hash_combine(&mut h, card_key(card).wrapping_add(salt));
        }
    }

    for card in &state.trick.cards {
        hash_combine(&mut h, card_key(card).wrapping_add(0x3333_3333_3333_3333));
    }
    hash_combine(&mut h, state.trick.leader as u64);

    hash_combine(&mut h, if state.finished { 0xf00d_f00d } else { 0 });

    h
}
