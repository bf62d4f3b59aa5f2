use crate::card::{full_deck, shuffle_deck, Card, Suit};
use bisca_rng::Lcg64;

/// Bisca4 is strictly two-handed
pub const NUM_PLAYERS: usize = 2;

/// Total card points in the deck; the two scores sum to this once a game ends
pub const TOTAL_POINTS: u32 = 120;

/// The cards currently laid on the table, plus who led them.
///
/// A trick holds up to 4 cards (two leads of two cards each); card `i` was
/// played by the leader when `i` is even and by the other player otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trick {
    pub cards: Vec<Card>,
    pub leader: usize,
}

impl Trick {
    /// Which player played the card at position `index` in this trick
    #[inline]
    pub fn player_of(&self, index: usize) -> usize {
        if index % 2 == 0 {
            self.leader
        } else {
            1 - self.leader
        }
    }
}

/// Complete state of one Bisca4 game.
///
/// Invariant: until `finished`, the union of the draw deck, both hands, the
/// table and (while undistributed) the trump card is the full 40-card deck,
/// each card exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Draw deck; the top is the last element
    pub deck: Vec<Card>,
    /// The card turned face-up at the deal; fixes the trump suit
    pub trump_card: Card,
    pub trump_suit: Suit,
    /// Whether the face-up trump card has been drawn into a hand
    pub trump_card_given: bool,
    pub hands: [Vec<Card>; 2],
    pub score: [u32; 2],
    /// Whose turn it is to play a card
    pub current_player: usize,
    pub trick: Trick,
    pub finished: bool,
}

impl GameState {
    /// Start a new game: shuffle with the supplied generator, turn the last
    /// card as trump, deal 4 cards to each player alternately (player 0
    /// first).
    pub fn deal(rng: &mut Lcg64) -> Self {
        let mut deck = full_deck();
        shuffle_deck(&mut deck, rng);

        let trump_card = deck.pop().expect("full deck is never empty");

        let mut hands = [Vec::with_capacity(4), Vec::with_capacity(4)];
        for _ in 0..4 {
            hands[0].push(deck.pop().expect("deck holds 39 cards after trump"));
            hands[1].push(deck.pop().expect("deck holds 39 cards after trump"));
        }

        GameState {
            deck,
            trump_card,
            trump_suit: trump_card.suit,
            trump_card_given: false,
            hands,
            score: [0, 0],
            current_player: 0,
            trick: Trick::default(),
            finished: false,
        }
    }

    /// Hand indices the given player may play: every card in hand when it is
    /// their turn, nothing otherwise. Bisca has no follow-suit obligation.
    pub fn legal_moves(&self, player: usize) -> Vec<usize> {
        if player != self.current_player {
            return Vec::new();
        }
        (0..self.hands[player].len()).collect()
    }

    /// Move the card at `hand_index` from the player's hand onto the table.
    ///
    /// Returns false — leaving the state untouched — when the game is over,
    /// it is not that player's turn, or the index is out of range.
    pub fn play_card(&mut self, player: usize, hand_index: usize) -> bool {
        if self.finished {
            return false;
        }
        if player != self.current_player {
            return false;
        }
        if hand_index >= self.hands[player].len() {
            return false;
        }

        let card = self.hands[player].remove(hand_index);
        self.trick.cards.push(card);
        self.current_player = 1 - self.current_player;
        true
    }

    /// Decide the winner and point value of the 4 cards on the table.
    ///
    /// If any trump was played the strongest trump wins; otherwise the
    /// strongest card of the led suit wins (off-suit cards cannot win).
    pub fn evaluate_trick(&self) -> (usize, u32) {
        debug_assert_eq!(self.trick.cards.len(), 4);

        let pot: u32 = self.trick.cards.iter().map(|c| c.points()).sum();

        let any_trump = self.trick.cards.iter().any(|c| c.suit == self.trump_suit);
        let winning_suit = if any_trump {
            self.trump_suit
        } else {
            self.trick.cards[0].suit
        };

        let mut winner_index = 0;
        for i in 1..4 {
            let cur = &self.trick.cards[i];
            let win = &self.trick.cards[winner_index];
            if cur.suit != winning_suit {
                continue;
            }
            if win.suit != winning_suit || cur.strength() > win.strength() {
                winner_index = i;
            }
        }

        (self.trick.player_of(winner_index), pot)
    }

    /// True once the draw deck and the face-up trump card are both exhausted
    pub fn no_more_draws(&self) -> bool {
        self.deck.is_empty() && self.trump_card_given
    }

    pub fn hands_empty(&self) -> bool {
        self.hands[0].is_empty() && self.hands[1].is_empty()
    }

    /// Resolve the table if it holds a full trick of 4 cards; otherwise a
    /// no-op.
    ///
    /// Resolution awards the pot to the winner, refills both hands from the
    /// deck (winner draws first), hands out the face-up trump card once the
    /// deck is empty — the trick loser gets it in preference to the winner —
    /// and makes the winner the next leader. The game ends when nothing is
    /// left to draw or play.
    pub fn maybe_close_trick(&mut self) {
        if self.trick.cards.len() < 4 {
            return;
        }

        let (winner, pot) = self.evaluate_trick();
        let loser = 1 - winner;
        self.score[winner] += pot;

        // Winner draws first, alternating, two rounds.
        for player in [winner, loser, winner, loser] {
            if self.needs_card(player) && !self.deck.is_empty() {
                let card = self.deck.pop().expect("checked non-empty");
                self.hands[player].push(card);
            }
        }

        // The face-up trump card is the last card dealt out; the trick loser
        // has priority over the winner.
        if !self.trump_card_given {
            if self.needs_card(loser) {
                self.hands[loser].push(self.trump_card);
                self.trump_card_given = true;
            } else if self.needs_card(winner) {
                self.hands[winner].push(self.trump_card);
                self.trump_card_given = true;
            }
        }

        self.trick.cards.clear();
        self.trick.leader = winner;
        self.current_player = winner;

        if self.no_more_draws() && self.hands_empty() && self.trick.cards.is_empty() {
            self.finished = true;
        }
    }

    /// Whether the player is short of a full hand while cards remain to draw
    fn needs_card(&self, player: usize) -> bool {
        self.hands[player].len() < 4 && (!self.deck.is_empty() || !self.trump_card_given)
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "---------------------------------")?;
        writeln!(f, "Trump: {} ({})", self.trump_card, self.trump_suit.name())?;
        writeln!(f, "Score: P0={} P1={}", self.score[0], self.score[1])?;
        writeln!(
            f,
            "Deck remaining: {} cards (face-up trump not counted)",
            self.deck.len()
        )?;
        writeln!(f, "Trump given: {}", if self.trump_card_given { 1 } else { 0 })?;
        writeln!(f, "Current player: {}", self.current_player)?;
        for p in 0..NUM_PLAYERS {
            writeln!(f, "Hand P{}:", p)?;
            for (i, card) in self.hands[p].iter().enumerate() {
                writeln!(f, "  [{}] {}", i, card)?;
            }
        }
        writeln!(
            f,
            "Current trick ({} cards played, P{} led):",
            self.trick.cards.len(),
            self.trick.leader
        )?;
        for (i, card) in self.trick.cards.iter().enumerate() {
            writeln!(f, "  ({}) {}", i, card)?;
        }
        writeln!(f, "Game over: {}", if self.finished { "YES" } else { "NO" })?;
        write!(f, "---------------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank;

    /// Every card of the 40 exactly once across deck, hands, table and the
    /// undistributed trump card.
    fn assert_conservation(st: &GameState) {
        let mut counts = [0u8; 40];
        for c in &st.deck {
            counts[c.to_index() as usize] += 1;
        }
        for hand in &st.hands {
            for c in hand {
                counts[c.to_index() as usize] += 1;
            }
        }
        for c in &st.trick.cards {
            counts[c.to_index() as usize] += 1;
        }
        if !st.trump_card_given {
            counts[st.trump_card.to_index() as usize] += 1;
        }
        for (i, &n) in counts.iter().enumerate() {
            assert_eq!(n, 1, "card index {} appears {} times", i, n);
        }
    }

    fn play_random_game(seed: u64) -> GameState {
        let mut rng = Lcg64::new(seed);
        let mut st = GameState::deal(&mut rng);
        while !st.finished {
            let p = st.current_player;
            let moves = st.legal_moves(p);
            assert!(!moves.is_empty(), "stuck before finish");
            let mv = moves[rng.next_index(moves.len())];
            assert!(st.play_card(p, mv));
            st.maybe_close_trick();
            if !st.finished {
                assert_conservation(&st);
            }
        }
        st
    }

    #[test]
    fn test_deal_shape() {
        let mut rng = Lcg64::new(1);
        let st = GameState::deal(&mut rng);
        assert_eq!(st.deck.len(), 31);
        assert_eq!(st.hands[0].len(), 4);
        assert_eq!(st.hands[1].len(), 4);
        assert_eq!(st.score, [0, 0]);
        assert_eq!(st.current_player, 0);
        assert!(!st.trump_card_given);
        assert!(!st.finished);
        assert_eq!(st.trump_suit, st.trump_card.suit);
        assert_conservation(&st);
    }

    #[test]
    fn test_deal_deterministic() {
        let mut rng1 = Lcg64::new(42);
        let mut rng2 = Lcg64::new(42);
        let st1 = GameState::deal(&mut rng1);
        let st2 = GameState::deal(&mut rng2);
        assert_eq!(st1, st2);

        let mut rng3 = Lcg64::new(43);
        let st3 = GameState::deal(&mut rng3);
        assert_ne!(st1, st3);
    }

    #[test]
    fn test_legal_moves_only_on_turn() {
        let mut rng = Lcg64::new(5);
        let st = GameState::deal(&mut rng);
        assert_eq!(st.legal_moves(0), vec![0, 1, 2, 3]);
        assert!(st.legal_moves(1).is_empty());
    }

    #[test]
    fn test_play_card_rejections_leave_state_unchanged() {
        let mut rng = Lcg64::new(9);
        let st = GameState::deal(&mut rng);

        // Out of turn
        let mut s = st.clone();
        assert!(!s.play_card(1, 0));
        assert_eq!(s, st);

        // Index out of range
        let mut s = st.clone();
        assert!(!s.play_card(0, 4));
        assert_eq!(s, st);

        // Finished game
        let mut s = st.clone();
        s.finished = true;
        let snapshot = s.clone();
        assert!(!s.play_card(0, 0));
        assert_eq!(s, snapshot);
    }

    #[test]
    fn test_play_card_moves_card_and_flips_turn() {
        let mut rng = Lcg64::new(11);
        let mut st = GameState::deal(&mut rng);
        let card = st.hands[0][2];
        assert!(st.play_card(0, 2));
        assert_eq!(st.hands[0].len(), 3);
        assert_eq!(st.trick.cards, vec![card]);
        assert_eq!(st.current_player, 1);
    }

    #[test]
    fn test_close_trick_is_noop_below_four_cards() {
        let mut rng = Lcg64::new(13);
        let mut st = GameState::deal(&mut rng);
        st.play_card(0, 0);
        st.play_card(1, 0);
        let snapshot = st.clone();
        st.maybe_close_trick();
        assert_eq!(st, snapshot);
    }

    /// Fixture with a known table: hearts trump, player 0 led.
    fn fixed_trick_state(cards: [Card; 4]) -> GameState {
        let mut rng = Lcg64::new(1);
        let mut st = GameState::deal(&mut rng);
        st.trump_card = Card::new(Suit::Hearts, Rank::Two);
        st.trump_suit = Suit::Hearts;
        st.trick.cards = cards.to_vec();
        st.trick.leader = 0;
        st
    }

    #[test]
    fn test_trick_winner_highest_of_led_suit() {
        let st = fixed_trick_state([
            Card::new(Suit::Clubs, Rank::Queen),
            Card::new(Suit::Clubs, Rank::Ace),
            Card::new(Suit::Spades, Rank::Ace), // off-suit, cannot win
            Card::new(Suit::Clubs, Rank::Three),
        ]);
        let (winner, pot) = st.evaluate_trick();
        assert_eq!(winner, 1); // Ace of clubs, played second by player 1
        assert_eq!(pot, 2 + 11 + 11 + 0);
    }

    #[test]
    fn test_trick_winner_trump_beats_lead() {
        let st = fixed_trick_state([
            Card::new(Suit::Clubs, Rank::Ace),
            Card::new(Suit::Hearts, Rank::Two), // lone trump wins
            Card::new(Suit::Clubs, Rank::Ten),
            Card::new(Suit::Spades, Rank::King),
        ]);
        let (winner, pot) = st.evaluate_trick();
        assert_eq!(winner, 1);
        assert_eq!(pot, 11 + 0 + 10 + 4);
    }

    #[test]
    fn test_trick_winner_highest_trump_among_trumps() {
        let st = fixed_trick_state([
            Card::new(Suit::Hearts, Rank::Queen),
            Card::new(Suit::Hearts, Rank::Ten),
            Card::new(Suit::Hearts, Rank::King),
            Card::new(Suit::Hearts, Rank::Jack),
        ]);
        // King is the strongest trump on the table.
        let (winner, pot) = st.evaluate_trick();
        assert_eq!(winner, 0);
        assert_eq!(pot, 2 + 10 + 4 + 3);
    }

    #[test]
    fn test_close_trick_awards_points_and_clears_table() {
        let mut rng = Lcg64::new(17);
        let mut st = GameState::deal(&mut rng);
        for _ in 0..4 {
            let p = st.current_player;
            assert!(st.play_card(p, 0));
        }
        assert_eq!(st.trick.cards.len(), 4);
        let (winner, pot) = st.evaluate_trick();

        st.maybe_close_trick();
        assert!(st.trick.cards.is_empty());
        assert_eq!(st.score[winner], pot);
        assert_eq!(st.score[1 - winner], 0);
        assert_eq!(st.current_player, winner);
        assert_eq!(st.trick.leader, winner);
        // Both hands refilled to 4 while the deck lasts.
        assert_eq!(st.hands[0].len(), 4);
        assert_eq!(st.hands[1].len(), 4);
        assert_conservation(&st);
    }

    #[test]
    fn test_random_games_terminate_with_120_points() {
        for seed in 1..=20 {
            let st = play_random_game(seed);
            assert!(st.finished);
            assert!(st.deck.is_empty());
            assert!(st.trump_card_given);
            assert!(st.hands_empty());
            assert_eq!(st.score[0] + st.score[1], TOTAL_POINTS);
        }
    }

    #[test]
    fn test_trump_card_goes_to_a_player_when_deck_empties() {
        // Play until the deck is gone; the trump card must have been dealt
        // to exactly one of the hands at that point.
        let mut rng = Lcg64::new(23);
        let mut st = GameState::deal(&mut rng);
        while !st.deck.is_empty() {
            let p = st.current_player;
            let moves = st.legal_moves(p);
            st.play_card(p, moves[0]);
            st.maybe_close_trick();
        }
        assert!(st.trump_card_given);
        assert_conservation(&st);
    }
}
