//! Per-room game session: lifecycle state machine, seating, deck partitions,
//! and the UNO play rules.
//!
//! Every mutating operation validates fully before touching state; a rejected
//! operation leaves the session exactly as it was. Card conservation holds
//! throughout: once dealt, the union of all hands, the draw pile, and the
//! discard pile is always the whole 108-card deck.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cards::{self, Card, CardColor, CardFace, DECK_SIZE};
use crate::randomness::{SeedOutcome, SeedSource};
use crate::shuffle;

pub mod events;

mod tests;

pub use events::{RoomEvent, RoomEventKind};

/// Seating capacity of a room.
pub const MAX_PLAYERS: usize = 10;
/// Minimum seated players before `start` is accepted.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Linear lifecycle of a session. `reset` never transitions; it replaces the
/// whole session value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    NotStarted,
    Started,
    Ended,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::NotStarted => "not_started",
            GamePhase::Started => "started",
            GamePhase::Ended => "ended",
        }
    }
}

/// Coarse classification of rejections, used by the API layer for status
/// mapping and surfaced in error bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Phase,
    Capacity,
    Rule,
    Exhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Phase => "phase",
            ErrorKind::Capacity => "capacity",
            ErrorKind::Rule => "rule",
            ErrorKind::Exhausted => "exhausted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid deal request: {0}")]
    InvalidDealRequest(String),
    #[error("player {0} is not seated in this room")]
    UnknownPlayer(String),
    #[error("room has already started")]
    AlreadyStarted,
    #[error("operation {op} is not valid in phase {phase:?}")]
    InvalidPhase { op: &'static str, phase: GamePhase },
    #[error("room is full ({MAX_PLAYERS} players)")]
    GameFull,
    #[error("need at least {MIN_PLAYERS_TO_START} players to start, have {have}")]
    NotEnoughPlayers { have: usize },
    #[error("it is not {player}'s turn")]
    NotPlayersTurn { player: String },
    #[error("card {card} is not in hand")]
    CardNotInHand { card: String },
    #[error("card {card} cannot be played: {reason}")]
    IllegalMove { card: String, reason: String },
    #[error("draw pile is empty")]
    DrawPileEmpty,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidRequest(_)
            | SessionError::InvalidDealRequest(_)
            | SessionError::UnknownPlayer(_) => ErrorKind::Validation,
            SessionError::AlreadyStarted | SessionError::InvalidPhase { .. } => ErrorKind::Phase,
            SessionError::GameFull | SessionError::NotEnoughPlayers { .. } => ErrorKind::Capacity,
            SessionError::NotPlayersTurn { .. }
            | SessionError::CardNotInHand { .. }
            | SessionError::IllegalMove { .. } => ErrorKind::Rule,
            SessionError::DrawPileEmpty => ErrorKind::Exhausted,
        }
    }
}

/// Cards forced onto the next player by a draw-two or wild-draw-four.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyDraw {
    pub player: String,
    pub cards: usize,
}

/// Seat handed back to a joining player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub player: String,
    pub seat: usize,
    pub players: Vec<String>,
}

/// Outcome of a shuffle-and-deal, returned to the caller (hands included;
/// the broadcast event carries hand sizes only).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DealSummary {
    pub hands: BTreeMap<String, Vec<String>>,
    pub draw_pile_size: usize,
    pub seed_source: SeedSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DrawSummary {
    pub player: String,
    pub card: String,
    pub hand_size: usize,
    pub draw_pile_size: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlaySummary {
    pub player: String,
    pub card: String,
    pub active_color: Option<CardColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty: Option<PenaltyDraw>,
    pub next_player: Option<String>,
    pub winner: Option<String>,
    pub hand_size: usize,
    pub draw_pile_size: usize,
}

/// Serializable public projection of a session; never includes hand contents.
#[derive(Clone, Debug, Serialize)]
pub struct PublicView {
    pub room_id: String,
    pub phase: GamePhase,
    pub players: Vec<String>,
    pub hand_sizes: BTreeMap<String, usize>,
    pub draw_pile_size: usize,
    pub discard_pile_size: usize,
    pub discard_top: Option<String>,
    pub active_color: Option<CardColor>,
    pub current_player: Option<String>,
    pub direction: i8,
    pub last_seed_source: Option<SeedSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seed_request_id: Option<String>,
}

#[derive(Clone, Debug)]
struct SeedAudit {
    source: SeedSource,
    request_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    room_id: String,
    phase: GamePhase,
    players: Vec<String>,
    /// Parallel to `players`; seat index is turn order.
    hands: Vec<Vec<Card>>,
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    turn_cursor: usize,
    /// `1` clockwise, `-1` after an odd number of reverses.
    direction: i8,
    /// Effective discard color; diverges from the top card after wild plays.
    active_color: Option<CardColor>,
    last_seed: Option<SeedAudit>,
}

impl GameSession {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            phase: GamePhase::NotStarted,
            players: Vec::new(),
            hands: Vec::new(),
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            turn_cursor: 0,
            direction: 1,
            active_color: None,
            last_seed: None,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn draw_pile_size(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn current_player(&self) -> Option<&str> {
        self.players.get(self.turn_cursor).map(String::as_str)
    }

    /// Seat a player. Only valid before the game starts.
    pub fn join(&mut self, player: &str) -> Result<JoinSummary, SessionError> {
        if self.phase != GamePhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        let player = player.trim();
        if player.is_empty() {
            return Err(SessionError::InvalidRequest("player name is empty".into()));
        }
        if self.players.iter().any(|p| p == player) {
            return Err(SessionError::InvalidRequest(format!(
                "player {player} is already seated"
            )));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(SessionError::GameFull);
        }

        self.players.push(player.to_string());
        self.hands.push(Vec::new());
        Ok(JoinSummary {
            player: player.to_string(),
            seat: self.players.len() - 1,
            players: self.players.clone(),
        })
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != GamePhase::NotStarted {
            return Err(SessionError::InvalidPhase {
                op: "start",
                phase: self.phase,
            });
        }
        if self.players.len() < MIN_PLAYERS_TO_START {
            return Err(SessionError::NotEnoughPlayers {
                have: self.players.len(),
            });
        }
        self.phase = GamePhase::Started;
        Ok(())
    }

    /// Checks a deal request without mutating anything; the orchestrator runs
    /// this before paying for a seed fetch.
    pub fn validate_deal(
        &self,
        player_count: usize,
        cards_per_player: usize,
    ) -> Result<(), SessionError> {
        if self.phase == GamePhase::Ended {
            return Err(SessionError::InvalidPhase {
                op: "shuffle_and_deal",
                phase: self.phase,
            });
        }
        if self.players.is_empty() {
            return Err(SessionError::InvalidDealRequest(
                "no players seated".into(),
            ));
        }
        if player_count != self.players.len() {
            return Err(SessionError::InvalidDealRequest(format!(
                "player_count {player_count} does not match the {} seated players",
                self.players.len()
            )));
        }
        if cards_per_player == 0 {
            return Err(SessionError::InvalidDealRequest(
                "cards_per_player must be positive".into(),
            ));
        }
        if player_count * cards_per_player > DECK_SIZE {
            return Err(SessionError::InvalidDealRequest(format!(
                "deal of {} cards exceeds deck of {DECK_SIZE}",
                player_count * cards_per_player
            )));
        }
        Ok(())
    }

    /// Shuffles a fresh deck with `seed` and deals it round-robin. Allowed
    /// from `NotStarted` (pre-seating preview) as well as `Started`; any
    /// previous partitions are discarded wholesale, so conservation holds.
    pub fn shuffle_and_deal(
        &mut self,
        player_count: usize,
        cards_per_player: usize,
        seed: &SeedOutcome,
    ) -> Result<DealSummary, SessionError> {
        self.validate_deal(player_count, cards_per_player)?;

        let mut deck = cards::full_deck();
        shuffle::shuffle(&mut deck, seed.seed);
        let (hands, draw_pile) = shuffle::deal(&deck, player_count, cards_per_player)
            .map_err(|err| SessionError::InvalidDealRequest(err.to_string()))?;

        self.hands = hands;
        self.draw_pile = draw_pile;
        self.discard_pile.clear();
        self.turn_cursor = 0;
        self.direction = 1;
        self.active_color = None;
        self.last_seed = Some(SeedAudit {
            source: seed.source,
            request_id: seed.request_id.clone(),
        });

        Ok(DealSummary {
            hands: self
                .players
                .iter()
                .zip(&self.hands)
                .map(|(player, hand)| {
                    (
                        player.clone(),
                        hand.iter().map(|c| c.code().to_string()).collect(),
                    )
                })
                .collect(),
            draw_pile_size: self.draw_pile.len(),
            seed_source: seed.source,
            request_id: seed.request_id.clone(),
        })
    }

    /// Move the top draw-pile card into the acting player's hand. Does not
    /// advance the turn; the player may still play.
    pub fn draw(&mut self, player: &str) -> Result<DrawSummary, SessionError> {
        self.require_phase(GamePhase::Started, "draw")?;
        let seat = self.seat_of(player)?;
        self.require_turn(seat)?;
        if self.draw_pile.is_empty() {
            return Err(SessionError::DrawPileEmpty);
        }

        let card = self.draw_pile.pop().ok_or(SessionError::DrawPileEmpty)?;
        self.hands[seat].push(card);
        Ok(DrawSummary {
            player: player.to_string(),
            card: card.code().to_string(),
            hand_size: self.hands[seat].len(),
            draw_pile_size: self.draw_pile.len(),
        })
    }

    /// Play a card from the acting player's hand onto the discard pile,
    /// applying action-card side effects and advancing the turn. A play that
    /// empties the hand wins and ends the game.
    pub fn play(
        &mut self,
        player: &str,
        card_code: &str,
        declared_color: Option<CardColor>,
    ) -> Result<PlaySummary, SessionError> {
        self.require_phase(GamePhase::Started, "play")?;
        let seat = self.seat_of(player)?;
        self.require_turn(seat)?;

        let hand_index = self.hands[seat]
            .iter()
            .position(|c| c.code() == card_code)
            .ok_or_else(|| SessionError::CardNotInHand {
                card: card_code.to_string(),
            })?;
        let card = self.hands[seat][hand_index];

        if card.is_wild() && declared_color.is_none() {
            return Err(SessionError::IllegalMove {
                card: card.code().to_string(),
                reason: "a wild play must declare a color".into(),
            });
        }
        if let (Some(&top), Some(active)) = (self.discard_pile.last(), self.active_color) {
            if !card.matches(top, active) {
                return Err(SessionError::IllegalMove {
                    card: card.code().to_string(),
                    reason: format!("does not match {top} with active color {active}"),
                });
            }
        }

        // Validation complete; apply in one go. A declared color only takes
        // effect on wild plays; a colored card always sets its own color.
        let card = self.hands[seat].remove(hand_index);
        self.discard_pile.push(card);
        self.active_color = if card.is_wild() {
            declared_color
        } else {
            card.color()
        };

        if self.hands[seat].is_empty() {
            self.phase = GamePhase::Ended;
            return Ok(PlaySummary {
                player: player.to_string(),
                card: card.code().to_string(),
                active_color: self.active_color,
                penalty: None,
                next_player: None,
                winner: Some(player.to_string()),
                hand_size: 0,
                draw_pile_size: self.draw_pile.len(),
            });
        }

        let mut penalty = None;
        let steps = match card.face() {
            CardFace::Number(_) | CardFace::Wild => 1,
            CardFace::Skip => 2,
            CardFace::Reverse => {
                if self.players.len() == 2 {
                    // Reverse acts as a skip heads-up.
                    2
                } else {
                    self.direction = -self.direction;
                    1
                }
            }
            CardFace::DrawTwo => {
                penalty = Some(self.penalize_next(2));
                2
            }
            CardFace::WildDrawFour => {
                penalty = Some(self.penalize_next(4));
                2
            }
        };
        self.advance_turn(steps);

        Ok(PlaySummary {
            player: player.to_string(),
            card: card.code().to_string(),
            active_color: self.active_color,
            penalty,
            next_player: self.current_player().map(str::to_string),
            winner: None,
            hand_size: self.hands[seat].len(),
            draw_pile_size: self.draw_pile.len(),
        })
    }

    pub fn end(&mut self) -> Result<(), SessionError> {
        self.require_phase(GamePhase::Started, "end")?;
        self.phase = GamePhase::Ended;
        Ok(())
    }

    pub fn public_view(&self) -> PublicView {
        PublicView {
            room_id: self.room_id.clone(),
            phase: self.phase,
            players: self.players.clone(),
            hand_sizes: self
                .players
                .iter()
                .zip(&self.hands)
                .map(|(player, hand)| (player.clone(), hand.len()))
                .collect(),
            draw_pile_size: self.draw_pile.len(),
            discard_pile_size: self.discard_pile.len(),
            discard_top: self.discard_pile.last().map(|c| c.code().to_string()),
            active_color: self.active_color,
            current_player: self.current_player().map(str::to_string),
            direction: self.direction,
            last_seed_source: self.last_seed.as_ref().map(|s| s.source),
            last_seed_request_id: self.last_seed.as_ref().and_then(|s| s.request_id.clone()),
        }
    }

    /// Hand sizes keyed by player, for broadcast payloads.
    pub fn hand_sizes(&self) -> BTreeMap<String, usize> {
        self.players
            .iter()
            .zip(&self.hands)
            .map(|(player, hand)| (player.clone(), hand.len()))
            .collect()
    }

    fn require_phase(&self, expected: GamePhase, op: &'static str) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::InvalidPhase {
                op,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn seat_of(&self, player: &str) -> Result<usize, SessionError> {
        self.players
            .iter()
            .position(|p| p == player)
            .ok_or_else(|| SessionError::UnknownPlayer(player.to_string()))
    }

    fn require_turn(&self, seat: usize) -> Result<(), SessionError> {
        if seat != self.turn_cursor {
            return Err(SessionError::NotPlayersTurn {
                player: self.players[seat].clone(),
            });
        }
        Ok(())
    }

    fn offset_seat(&self, steps: usize) -> usize {
        let len = self.players.len() as i64;
        let shifted = self.turn_cursor as i64 + steps as i64 * self.direction as i64;
        shifted.rem_euclid(len) as usize
    }

    fn advance_turn(&mut self, steps: usize) {
        self.turn_cursor = self.offset_seat(steps);
    }

    /// Forced draws for the seat after the actor, capped by availability so
    /// an already-validated play cannot fail mid-apply.
    fn penalize_next(&mut self, count: usize) -> PenaltyDraw {
        let victim = self.offset_seat(1);
        let mut drawn = 0;
        for _ in 0..count {
            match self.draw_pile.pop() {
                Some(card) => {
                    self.hands[victim].push(card);
                    drawn += 1;
                }
                None => break,
            }
        }
        PenaltyDraw {
            player: self.players[victim].clone(),
            cards: drawn,
        }
    }

    /// Total cards across all partitions; 0 before the first deal, 108 after.
    pub fn total_cards(&self) -> usize {
        let in_hands: usize = self.hands.iter().map(Vec::len).sum();
        in_hands + self.draw_pile.len() + self.discard_pile.len()
    }
}
