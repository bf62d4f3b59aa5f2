//! Feature extraction: game state -> fixed 178-float input vector.

use bisca_core::{GameState, TOTAL_POINTS};

/// Input width of the evaluator network.
pub const INPUT_SIZE: usize = 178;

// Vector layout. Card slots are indexed by `Card::to_index()` (0-39).
const OWN_HAND: usize = 0;
const OPP_HAND: usize = 40;
const TABLE: usize = 80;
const OWN_SCORE: usize = 120;
const OPP_SCORE: usize = 121;
const DECK_FILL: usize = 122;
const TRUMP_SUIT: usize = 123;
const KNOWN: usize = 127;
const TRUMP_GIVEN: usize = 167;
const TRUMP_RANK: usize = 168;

/// Encode a position from `viewpoint`'s perspective.
///
/// The opponent-hand block (and the opponent's contribution to the known
/// mask) is filled only when `perfect_info` is set; in the realistic partial
/// information mode those 40 slots stay zero.
pub fn extract_features(state: &GameState, viewpoint: usize, perfect_info: bool) -> Vec<f32> {
    let mut feat = vec![0.0f32; INPUT_SIZE];

    let me = viewpoint;
    let opp = 1 - viewpoint;

    for card in &state.hands[me] {
        feat[OWN_HAND + card.to_index() as usize] = 1.0;
    }

    if perfect_info {
        for card in &state.hands[opp] {
            feat[OPP_HAND + card.to_index() as usize] = 1.0;
        }
    }

    for card in &state.trick.cards {
        feat[TABLE + card.to_index() as usize] = 1.0;
    }

    feat[OWN_SCORE] = state.score[me] as f32 / TOTAL_POINTS as f32;
    feat[OPP_SCORE] = state.score[opp] as f32 / TOTAL_POINTS as f32;
    feat[DECK_FILL] = state.deck.len() as f32 / 40.0;

    feat[TRUMP_SUIT + state.trump_suit as usize] = 1.0;

    // Cards whose location the viewpoint player knows for certain: own hand
    // and the public table, plus the opponent's hand under perfect info.
    for card in &state.hands[me] {
        feat[KNOWN + card.to_index() as usize] = 1.0;
    }
    for card in &state.trick.cards {
        feat[KNOWN + card.to_index() as usize] = 1.0;
    }
    if perfect_info {
        for card in &state.hands[opp] {
            feat[KNOWN + card.to_index() as usize] = 1.0;
        }
    }

    feat[TRUMP_GIVEN] = if state.trump_card_given { 1.0 } else { 0.0 };
    feat[TRUMP_RANK + state.trump_card.rank as usize] = 1.0;

    feat
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisca_rng::Lcg64;

    #[test]
    fn test_vector_width() {
        let mut rng = Lcg64::new(1);
        let st = GameState::deal(&mut rng);
        assert_eq!(extract_features(&st, 0, false).len(), INPUT_SIZE);
    }

    #[test]
    fn test_own_hand_encoding() {
        let mut rng = Lcg64::new(3);
        let st = GameState::deal(&mut rng);
        let feat = extract_features(&st, 0, false);

        let own: Vec<usize> = (0..40).filter(|&i| feat[OWN_HAND + i] == 1.0).collect();
        let expected: Vec<usize> = {
            let mut v: Vec<usize> = st.hands[0].iter().map(|c| c.to_index() as usize).collect();
            v.sort();
            v
        };
        assert_eq!(own, expected);
    }

    #[test]
    fn test_opponent_hand_hidden_without_perfect_info() {
        let mut rng = Lcg64::new(5);
        let st = GameState::deal(&mut rng);

        let partial = extract_features(&st, 0, false);
        assert!(partial[OPP_HAND..OPP_HAND + 40].iter().all(|&x| x == 0.0));

        let perfect = extract_features(&st, 0, true);
        let visible = perfect[OPP_HAND..OPP_HAND + 40]
            .iter()
            .filter(|&&x| x == 1.0)
            .count();
        assert_eq!(visible, st.hands[1].len());
    }

    #[test]
    fn test_known_mask_matches_visibility() {
        let mut rng = Lcg64::new(7);
        let mut st = GameState::deal(&mut rng);
        st.play_card(0, 0);
        let feat = extract_features(&st, 1, false);

        // Viewpoint player 1 knows their own 4 cards plus the table card.
        let known = feat[KNOWN..KNOWN + 40].iter().filter(|&&x| x == 1.0).count();
        assert_eq!(known, st.hands[1].len() + st.trick.cards.len());
    }

    #[test]
    fn test_scalars_and_one_hots() {
        let mut rng = Lcg64::new(9);
        let mut st = GameState::deal(&mut rng);
        st.score = [60, 30];
        let feat = extract_features(&st, 0, false);

        assert_eq!(feat[OWN_SCORE], 0.5);
        assert_eq!(feat[OPP_SCORE], 0.25);
        assert_eq!(feat[DECK_FILL], 31.0 / 40.0);

        let suit_hot: Vec<usize> = (0..4).filter(|&i| feat[TRUMP_SUIT + i] == 1.0).collect();
        assert_eq!(suit_hot, vec![st.trump_suit as usize]);

        let rank_hot: Vec<usize> = (0..10).filter(|&i| feat[TRUMP_RANK + i] == 1.0).collect();
        assert_eq!(rank_hot, vec![st.trump_card.rank as usize]);

        assert_eq!(feat[TRUMP_GIVEN], 0.0);
        st.trump_card_given = true;
        let feat = extract_features(&st, 0, false);
        assert_eq!(feat[TRUMP_GIVEN], 1.0);
    }

    #[test]
    fn test_viewpoint_swaps_score_slots() {
        let mut rng = Lcg64::new(11);
        let mut st = GameState::deal(&mut rng);
        st.score = [90, 12];
        let p0 = extract_features(&st, 0, false);
        let p1 = extract_features(&st, 1, false);
        assert_eq!(p0[OWN_SCORE], p1[OPP_SCORE]);
        assert_eq!(p0[OPP_SCORE], p1[OWN_SCORE]);
    }
}
