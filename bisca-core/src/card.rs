use bisca_rng::Lcg64;

/// Represents the four suits of the Portuguese 40-card deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl Suit {
    /// All suits in standard order
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Convert from numeric index (0-3)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Suit::Clubs),
            1 => Some(Suit::Diamonds),
            2 => Some(Suit::Hearts),
            3 => Some(Suit::Spades),
            _ => None,
        }
    }

    /// Get the suit name used for display
    pub fn name(&self) -> &'static str {
        match self {
            Suit::Clubs => "Clubs",
            Suit::Diamonds => "Diamonds",
            Suit::Hearts => "Hearts",
            Suit::Spades => "Spades",
        }
    }
}

/// Bisca ranks in strength order (weakest first). The deck has no 7, 8 or 9,
/// and the 10 outranks the face cards except the Ace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Rank {
    Two = 0,
    Three = 1,
    Four = 2,
    Five = 3,
    Six = 4,
    Ten = 5,
    Jack = 6,
    Queen = 7,
    King = 8,
    Ace = 9,
}

impl Rank {
    /// All ranks in strength order
    pub const ALL: [Rank; 10] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Convert from strength index (0-9)
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Rank::Two),
            1 => Some(Rank::Three),
            2 => Some(Rank::Four),
            3 => Some(Rank::Five),
            4 => Some(Rank::Six),
            5 => Some(Rank::Ten),
            6 => Some(Rank::Jack),
            7 => Some(Rank::Queen),
            8 => Some(Rank::King),
            9 => Some(Rank::Ace),
            _ => None,
        }
    }

    /// Point value of the rank
    /// A=11, 10=10, K=4, J=3, Q=2, others=0
    pub fn points(&self) -> u32 {
        match self {
            Rank::Ace => 11,
            Rank::Ten => 10,
            Rank::King => 4,
            Rank::Jack => 3,
            Rank::Queen => 2,
            _ => 0,
        }
    }

    /// Trick-winning strength within a suit (higher beats lower)
    #[inline]
    pub fn strength(&self) -> u8 {
        *self as u8
    }

    /// Get the rank as a display string (2-6, 10, J, Q, K, A)
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// Represents a single playing card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    /// Create a new card
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Card { suit, rank }
    }

    /// Create a card from an index (0-39)
    /// Index is calculated as: suit * 10 + rank strength
    pub fn from_index(index: u8) -> Option<Self> {
        if index >= 40 {
            return None;
        }
        let suit = Suit::from_index(index / 10)?;
        let rank = Rank::from_index(index % 10)?;
        Some(Card::new(suit, rank))
    }

    /// Convert card to index (0-39)
    #[inline]
    pub fn to_index(&self) -> u8 {
        (self.suit as u8) * 10 + self.rank.strength()
    }

    /// Point value of this card
    #[inline]
    pub fn points(&self) -> u32 {
        self.rank.points()
    }

    /// Trick-winning strength of this card within its suit
    #[inline]
    pub fn strength(&self) -> u8 {
        self.rank.strength()
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} of {}", self.rank.name(), self.suit.name())
    }
}

/// Build the 40-card Bisca deck in canonical order (all ranks of each suit)
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(40);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(suit, rank));
        }
    }
    deck
}

/// Fisher-Yates shuffle driven by the supplied generator
pub fn shuffle_deck(deck: &mut [Card], rng: &mut Lcg64) {
    for i in (1..deck.len()).rev() {
        let j = rng.next_index(i + 1);
        deck.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_index_conversion() {
        // Test all 40 cards
        for i in 0..40 {
            let card = Card::from_index(i).unwrap();
            assert_eq!(card.to_index(), i);
        }
        assert!(Card::from_index(40).is_none());
    }

    #[test]
    fn test_point_values() {
        assert_eq!(Card::new(Suit::Spades, Rank::Ace).points(), 11);
        assert_eq!(Card::new(Suit::Hearts, Rank::Ten).points(), 10);
        assert_eq!(Card::new(Suit::Diamonds, Rank::King).points(), 4);
        assert_eq!(Card::new(Suit::Clubs, Rank::Jack).points(), 3);
        assert_eq!(Card::new(Suit::Clubs, Rank::Queen).points(), 2);
        assert_eq!(Card::new(Suit::Spades, Rank::Six).points(), 0);
    }

    #[test]
    fn test_deck_total_points() {
        let total: u32 = full_deck().iter().map(|c| c.points()).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn test_strength_order() {
        // A > 10 > K > J > Q > 6 > 5 > 4 > 3 > 2
        assert!(Rank::Ace.strength() > Rank::Ten.strength());
        assert!(Rank::Ten.strength() > Rank::King.strength());
        assert!(Rank::King.strength() > Rank::Jack.strength());
        assert!(Rank::Jack.strength() > Rank::Queen.strength());
        assert!(Rank::Queen.strength() > Rank::Six.strength());
        assert!(Rank::Three.strength() > Rank::Two.strength());
    }

    #[test]
    fn test_full_deck_is_distinct() {
        let deck = full_deck();
        assert_eq!(deck.len(), 40);
        let mut indices: Vec<u8> = deck.iter().map(|c| c.to_index()).collect();
        indices.sort();
        for (i, &idx) in indices.iter().enumerate() {
            assert_eq!(i as u8, idx);
        }
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let mut rng1 = bisca_rng::Lcg64::new(42);
        let mut rng2 = bisca_rng::Lcg64::new(42);
        let mut deck1 = full_deck();
        let mut deck2 = full_deck();
        shuffle_deck(&mut deck1, &mut rng1);
        shuffle_deck(&mut deck2, &mut rng2);
        assert_eq!(deck1, deck2);
    }

    #[test]
    fn test_shuffle_preserves_cards() {
        let mut rng = bisca_rng::Lcg64::new(7);
        let mut deck = full_deck();
        shuffle_deck(&mut deck, &mut rng);
        let mut indices: Vec<u8> = deck.iter().map(|c| c.to_index()).collect();
        indices.sort();
        let expected: Vec<u8> = (0..40).collect();
        assert_eq!(indices, expected);
    }
}
