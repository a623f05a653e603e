//! Seeded Fisher–Yates shuffle and round-robin dealing.
//!
//! The 256-bit seed keys a ChaCha20 stream, so the many per-swap draws come
//! from one counter-mode expansion of the seed rather than reusing it. Given
//! the same seed the permutation (and therefore the deal) is identical.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::cards::{Card, DECK_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DealError {
    #[error("player count must be positive")]
    NoPlayers,
    #[error("cards per player must be positive")]
    BadHandSize,
    #[error("deal of {requested} cards exceeds deck of {DECK_SIZE}")]
    NotEnoughCards { requested: usize },
}

/// In-place Fisher–Yates permutation of `deck` driven by `seed`.
pub fn shuffle(deck: &mut [Card], seed: [u8; 32]) {
    let mut rng = ChaCha20Rng::from_seed(seed);
    for i in (1..deck.len()).rev() {
        let j = rng.gen_range(0..=i);
        deck.swap(i, j);
    }
}

/// Splits an already-permuted deck into `player_count` hands of
/// `cards_per_player` each plus the remaining draw pile.
///
/// Dealing is round-robin: hand `k` receives the cards at positions
/// `k`, `k + n`, `k + 2n`, and so on, the conventional around-the-table
/// order rather than contiguous blocks. The draw pile keeps the permuted
/// order of the rest.
pub fn deal(
    deck: &[Card],
    player_count: usize,
    cards_per_player: usize,
) -> Result<(Vec<Vec<Card>>, Vec<Card>), DealError> {
    if player_count == 0 {
        return Err(DealError::NoPlayers);
    }
    if cards_per_player == 0 {
        return Err(DealError::BadHandSize);
    }
    let requested = player_count * cards_per_player;
    if requested > deck.len() {
        return Err(DealError::NotEnoughCards { requested });
    }

    let mut hands = vec![Vec::with_capacity(cards_per_player); player_count];
    for (i, &card) in deck.iter().take(requested).enumerate() {
        hands[i % player_count].push(card);
    }
    let draw_pile = deck[requested..].to_vec();

    Ok((hands, draw_pile))
}
