mod card;
mod state;

pub use card::{full_deck, shuffle_deck, Card, Rank, Suit};
pub use state::{GameState, Trick, NUM_PLAYERS, TOTAL_POINTS};
