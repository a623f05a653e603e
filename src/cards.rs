//! Canonical UNO deck and card semantics.
//!
//! Cards are `u8` indices into [`PACK_OF_CARDS`]; the compact code strings
//! (`"7R"`, `"skipG"`, `"_B"`, `"D2Y"`, `"W"`, `"D4W"`) are what clients see
//! on the wire. Several indices share a code (most ranks appear twice per
//! color); card-conservation bookkeeping is always over indices.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Total number of cards in a standard UNO deck.
pub const DECK_SIZE: usize = 108;

/// Card code table, index-aligned with the card identifiers used everywhere
/// else. Matches the conventional UNO composition: per color one `0`, two
/// each of `1`-`9`, two skips, two reverses (`_`), two draw-twos, plus four
/// wilds and four wild-draw-fours.
pub const PACK_OF_CARDS: [&str; DECK_SIZE] = [
    "0R", "1R", "1R", "2R", "2R", "3R", "3R", "4R", "4R", "5R", "5R", "6R", "6R", "7R", "7R", "8R",
    "8R", "9R", "9R", "skipR", "skipR", "_R", "_R", "D2R", "D2R", "0G", "1G", "1G", "2G", "2G",
    "3G", "3G", "4G", "4G", "5G", "5G", "6G", "6G", "7G", "7G", "8G", "8G", "9G", "9G", "skipG",
    "skipG", "_G", "_G", "D2G", "D2G", "0B", "1B", "1B", "2B", "2B", "3B", "3B", "4B", "4B", "5B",
    "5B", "6B", "6B", "7B", "7B", "8B", "8B", "9B", "9B", "skipB", "skipB", "_B", "_B", "D2B",
    "D2B", "0Y", "1Y", "1Y", "2Y", "2Y", "3Y", "3Y", "4Y", "4Y", "5Y", "5Y", "6Y", "6Y", "7Y",
    "7Y", "8Y", "8Y", "9Y", "9Y", "skipY", "skipY", "_Y", "_Y", "D2Y", "D2Y", "W", "W", "W", "W",
    "D4W", "D4W", "D4W", "D4W",
];

/// One of the four playable colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl CardColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardColor::Red => "red",
            CardColor::Green => "green",
            CardColor::Blue => "blue",
            CardColor::Yellow => "yellow",
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            'R' => Some(CardColor::Red),
            'G' => Some(CardColor::Green),
            'B' => Some(CardColor::Blue),
            'Y' => Some(CardColor::Yellow),
            _ => None,
        }
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" | "r" | "red" | "Red" => Ok(CardColor::Red),
            "G" | "g" | "green" | "Green" => Ok(CardColor::Green),
            "B" | "b" | "blue" | "Blue" => Ok(CardColor::Blue),
            "Y" | "y" | "yellow" | "Yellow" => Ok(CardColor::Yellow),
            other => Err(format!("unknown card color: {other}")),
        }
    }
}

/// Face value of a card, independent of color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardFace {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

static CARD_SPECS: Lazy<[(Option<CardColor>, CardFace); DECK_SIZE]> = Lazy::new(|| {
    let mut specs = [(None, CardFace::Wild); DECK_SIZE];
    for (index, code) in PACK_OF_CARDS.iter().enumerate() {
        specs[index] = parse_code(code);
    }
    specs
});

fn parse_code(code: &str) -> (Option<CardColor>, CardFace) {
    match code {
        "W" => return (None, CardFace::Wild),
        "D4W" => return (None, CardFace::WildDrawFour),
        _ => {}
    }

    let suffix = code.chars().next_back().unwrap_or('?');
    let color = CardColor::from_suffix(suffix);
    let face = if let Some(rest) = code.strip_prefix("skip") {
        debug_assert!(rest.len() == 1);
        CardFace::Skip
    } else if code.starts_with('_') {
        CardFace::Reverse
    } else if code.starts_with("D2") {
        CardFace::DrawTwo
    } else {
        let digit = code.as_bytes()[0] - b'0';
        CardFace::Number(digit)
    };

    (color, face)
}

/// A single physical card, identified by its deck index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card(u8);

impl Card {
    pub fn from_index(index: u8) -> Option<Self> {
        ((index as usize) < DECK_SIZE).then_some(Card(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn code(self) -> &'static str {
        PACK_OF_CARDS[self.0 as usize]
    }

    /// Printed color, `None` for wilds.
    pub fn color(self) -> Option<CardColor> {
        CARD_SPECS[self.0 as usize].0
    }

    pub fn face(self) -> CardFace {
        CARD_SPECS[self.0 as usize].1
    }

    pub fn is_wild(self) -> bool {
        matches!(self.face(), CardFace::Wild | CardFace::WildDrawFour)
    }

    /// Whether this card may be laid on a discard pile whose effective color
    /// is `active_color` and whose top card is `top`. Wilds always match;
    /// everything else matches on color or on face.
    pub fn matches(self, top: Card, active_color: CardColor) -> bool {
        if self.is_wild() {
            return true;
        }
        if self.color() == Some(active_color) {
            return true;
        }
        !top.is_wild() && self.face() == top.face()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Fresh ordered deck, one card per index.
pub fn full_deck() -> Vec<Card> {
    (0..DECK_SIZE as u8).map(Card).collect()
}
