#![cfg(test)]

use super::*;
use crate::cards::full_deck;
use crate::randomness::{SeedOutcome, SeedSource};

fn local_seed(byte: u8) -> SeedOutcome {
    SeedOutcome {
        seed: [byte; 32],
        source: SeedSource::Local,
        request_id: None,
    }
}

fn chain_seed(byte: u8) -> SeedOutcome {
    SeedOutcome {
        seed: [byte; 32],
        source: SeedSource::OnChain,
        request_id: Some("0x01".into()),
    }
}

fn room_with_players(names: &[&str]) -> GameSession {
    let mut session = GameSession::new("room-a");
    for name in names {
        session.join(name).unwrap();
    }
    session
}

fn started_and_dealt(names: &[&str], cards_per_player: usize) -> GameSession {
    let mut session = room_with_players(names);
    session.start().unwrap();
    session
        .shuffle_and_deal(names.len(), cards_per_player, &local_seed(3))
        .unwrap();
    session
}

/// Moves one specific card into `seat`'s hand from wherever it currently
/// sits, so fixtures keep the deck partition conserved.
fn give_card(session: &mut GameSession, seat: usize, card: crate::cards::Card) {
    for hand in session.hands.iter_mut() {
        hand.retain(|&c| c != card);
    }
    session.draw_pile.retain(|&c| c != card);
    session.discard_pile.retain(|&c| c != card);
    session.hands[seat].push(card);
}

fn card(code: &str) -> crate::cards::Card {
    full_deck().into_iter().find(|c| c.code() == code).unwrap()
}

/// Multiset check: hands + draw pile + discard pile must be exactly the full
/// deck, by index.
fn assert_card_conservation(session: &GameSession) {
    let mut all: Vec<_> = session
        .hands
        .iter()
        .flatten()
        .chain(&session.draw_pile)
        .chain(&session.discard_pile)
        .copied()
        .collect();
    all.sort();
    assert_eq!(all, full_deck(), "card conservation violated");
}

#[test]
fn join_assigns_seats_in_order() {
    let mut session = GameSession::new("room-a");
    let first = session.join("p1").unwrap();
    let second = session.join("p2").unwrap();
    assert_eq!(first.seat, 0);
    assert_eq!(second.seat, 1);
    assert_eq!(session.players(), ["p1", "p2"]);
}

#[test]
fn join_rejects_duplicates_blanks_and_overflow() {
    let mut session = GameSession::new("room-a");
    session.join("p1").unwrap();
    assert_eq!(session.join("p1").unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(session.join("  ").unwrap_err().kind(), ErrorKind::Validation);

    for i in 2..=MAX_PLAYERS {
        session.join(&format!("p{i}")).unwrap();
    }
    assert_eq!(session.join("p11"), Err(SessionError::GameFull));
    assert_eq!(session.players().len(), MAX_PLAYERS);
}

#[test]
fn join_after_start_is_a_phase_error_and_leaves_players_untouched() {
    let mut session = room_with_players(&["p1", "p2"]);
    session.start().unwrap();
    let err = session.join("p3").unwrap_err();
    assert_eq!(err, SessionError::AlreadyStarted);
    assert_eq!(err.kind(), ErrorKind::Phase);
    assert_eq!(session.players(), ["p1", "p2"]);
}

#[test]
fn start_requires_two_players_and_does_not_mutate() {
    let mut session = room_with_players(&["p1"]);
    let err = session.start().unwrap_err();
    assert_eq!(err, SessionError::NotEnoughPlayers { have: 1 });
    assert_eq!(err.kind(), ErrorKind::Capacity);
    assert_eq!(session.phase(), GamePhase::NotStarted);
    assert_eq!(session.players(), ["p1"]);
}

#[test]
fn start_twice_is_a_phase_error() {
    let mut session = room_with_players(&["p1", "p2"]);
    session.start().unwrap();
    assert_eq!(
        session.start(),
        Err(SessionError::InvalidPhase {
            op: "start",
            phase: GamePhase::Started,
        })
    );
}

#[test]
fn deal_partitions_the_deck_round_robin() {
    let session = started_and_dealt(&["p1", "p2"], 7);
    assert_eq!(session.hands[0].len(), 7);
    assert_eq!(session.hands[1].len(), 7);
    assert_eq!(session.draw_pile_size(), 94);
    assert!(session.discard_pile.is_empty());
    assert_card_conservation(&session);
}

#[test]
fn deal_is_allowed_before_start_as_preview() {
    let mut session = room_with_players(&["p1", "p2"]);
    let summary = session
        .shuffle_and_deal(2, 5, &local_seed(9))
        .unwrap();
    assert_eq!(session.phase(), GamePhase::NotStarted);
    assert_eq!(summary.draw_pile_size, 98);
    assert_card_conservation(&session);
}

#[test]
fn deal_records_seed_provenance() {
    let mut session = room_with_players(&["p1", "p2"]);
    session.shuffle_and_deal(2, 7, &chain_seed(1)).unwrap();
    let view = session.public_view();
    assert_eq!(view.last_seed_source, Some(SeedSource::OnChain));
    assert_eq!(view.last_seed_request_id.as_deref(), Some("0x01"));
}

#[test]
fn deal_rejects_mismatched_and_oversized_requests() {
    let mut session = room_with_players(&["p1", "p2"]);
    assert_eq!(
        session.shuffle_and_deal(3, 7, &local_seed(1)).unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        session.shuffle_and_deal(2, 0, &local_seed(1)).unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        session.shuffle_and_deal(2, 55, &local_seed(1)).unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(session.total_cards(), 0, "rejections must not deal");

    let mut empty = GameSession::new("room-b");
    assert_eq!(
        empty.shuffle_and_deal(0, 7, &local_seed(1)),
        Err(SessionError::InvalidDealRequest("no players seated".into()))
    );
}

#[test]
fn deal_accepts_any_hand_size_that_fits_the_deck() {
    let mut session = room_with_players(&["p1", "p2"]);
    session.start().unwrap();
    let summary = session.shuffle_and_deal(2, 30, &local_seed(4)).unwrap();
    assert_eq!(session.hands[0].len(), 30);
    assert_eq!(session.hands[1].len(), 30);
    assert_eq!(summary.draw_pile_size, 48);
    assert_card_conservation(&session);
}

#[test]
fn deal_is_deterministic_per_seed() {
    let a = started_and_dealt(&["p1", "p2"], 7);
    let b = started_and_dealt(&["p1", "p2"], 7);
    assert_eq!(a.hands, b.hands);
    assert_eq!(a.draw_pile, b.draw_pile);
}

#[test]
fn draw_moves_one_card_and_keeps_turn() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    let summary = session.draw("p1").unwrap();
    assert_eq!(summary.hand_size, 8);
    assert_eq!(summary.draw_pile_size, 93);
    assert_eq!(session.current_player(), Some("p1"));
    assert_card_conservation(&session);
}

#[test]
fn draw_enforces_turn_phase_and_membership() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    assert_eq!(
        session.draw("p2").unwrap_err().kind(),
        ErrorKind::Rule,
        "out of turn"
    );
    assert_eq!(
        session.draw("ghost").unwrap_err().kind(),
        ErrorKind::Validation
    );

    let mut idle = room_with_players(&["p1", "p2"]);
    assert_eq!(idle.draw("p1").unwrap_err().kind(), ErrorKind::Phase);
}

#[test]
fn draw_from_empty_pile_is_resource_exhausted() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    // Drain the pile directly; the partition stays conserved because the
    // cards move into p1's hand.
    while session.draw_pile_size() > 0 {
        session.draw("p1").unwrap();
    }
    let err = session.draw("p1").unwrap_err();
    assert_eq!(err, SessionError::DrawPileEmpty);
    assert_eq!(err.kind(), ErrorKind::Exhausted);
    assert_card_conservation(&session);
}

#[test]
fn play_rejects_card_not_in_hand_without_mutation() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    // Compare by code: most ranks exist twice, so absence of an index is not
    // absence of its code.
    let absent = full_deck()
        .into_iter()
        .find(|c| !session.hands[0].iter().any(|held| held.code() == c.code()))
        .unwrap();
    let before = session.hands.clone();
    let err = session.play("p1", absent.code(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rule);
    assert_eq!(session.hands, before);
    assert!(session.discard_pile.is_empty());
}

#[test]
fn first_play_onto_empty_discard_is_unrestricted() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    let card = session.hands[0]
        .iter()
        .copied()
        .find(|c| !c.is_wild())
        .expect("a 7-card hand nearly always holds a non-wild");
    let summary = session.play("p1", card.code(), None).unwrap();
    assert_eq!(summary.card, card.code());
    assert_eq!(session.discard_pile.last(), Some(&card));
    assert_card_conservation(&session);
}

#[test]
fn play_requires_color_or_face_match() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    // Fix a known discard state rather than hunting through a random hand.
    let top = card("5R");
    let legal = card("5G");
    let illegal = card("8B");
    let other = card("9Y");
    session.discard_pile = vec![top];
    session.active_color = top.color();
    session.hands[0] = vec![legal, illegal];
    session.hands[1] = vec![other];
    // Rebalance the draw pile so conservation still holds for this fixture.
    session.draw_pile = full_deck()
        .into_iter()
        .filter(|c| ![top, legal, illegal, other].contains(c))
        .collect();

    let err = session.play("p1", illegal.code(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rule);

    session.play("p1", legal.code(), None).unwrap();
    assert_eq!(session.active_color, legal.color());
    assert_eq!(session.current_player(), Some("p2"));
    assert_card_conservation(&session);
}

#[test]
fn wild_play_requires_and_applies_declared_color() {
    let mut session = started_and_dealt(&["p1", "p2", "p3"], 7);
    give_card(&mut session, 0, card("W"));

    let err = session.play("p1", "W", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rule);

    let summary = session
        .play("p1", "W", Some(crate::cards::CardColor::Blue))
        .unwrap();
    assert_eq!(summary.active_color, Some(crate::cards::CardColor::Blue));
    assert_eq!(session.current_player(), Some("p2"));
    assert_card_conservation(&session);
}

#[test]
fn declared_color_on_non_wild_play_is_ignored() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    give_card(&mut session, 0, card("5G"));

    let summary = session
        .play("p1", "5G", Some(crate::cards::CardColor::Blue))
        .unwrap();
    assert_eq!(summary.active_color, Some(crate::cards::CardColor::Green));
    assert_eq!(session.active_color, Some(crate::cards::CardColor::Green));
}

#[test]
fn skip_and_draw_two_advance_past_the_victim() {
    let mut session = started_and_dealt(&["p1", "p2", "p3"], 7);
    give_card(&mut session, 0, card("skipR"));
    session.play("p1", "skipR", None).unwrap();
    assert_eq!(session.current_player(), Some("p3"));

    give_card(&mut session, 2, card("D2R"));
    let before_victim = session.hands[0].len();
    let summary = session.play("p3", "D2R", None).unwrap();
    assert_eq!(
        summary.penalty,
        Some(PenaltyDraw {
            player: "p1".into(),
            cards: 2,
        })
    );
    assert_eq!(session.hands[0].len(), before_victim + 2);
    assert_eq!(session.current_player(), Some("p2"));
    assert_card_conservation(&session);
}

#[test]
fn reverse_flips_direction_and_acts_as_skip_heads_up() {
    let mut session = started_and_dealt(&["p1", "p2", "p3"], 7);
    give_card(&mut session, 0, card("_R"));
    session.play("p1", "_R", None).unwrap();
    assert_eq!(session.direction, -1);
    assert_eq!(session.current_player(), Some("p3"));
    assert_card_conservation(&session);

    let mut heads_up = started_and_dealt(&["p1", "p2"], 7);
    give_card(&mut heads_up, 0, card("_G"));
    heads_up.play("p1", "_G", None).unwrap();
    assert_eq!(heads_up.direction, 1);
    assert_eq!(heads_up.current_player(), Some("p1"), "reverse skips heads-up");
}

#[test]
fn emptying_the_hand_wins_and_ends_the_game() {
    let mut session = started_and_dealt(&["p1", "p2"], 7);
    let last = session.hands[0][0];
    let rest: Vec<_> = session.hands[0][1..].to_vec();
    session.hands[0] = vec![last];
    session.draw_pile.extend(rest);

    let declared = last.is_wild().then_some(crate::cards::CardColor::Red);
    let summary = session.play("p1", last.code(), declared).unwrap();
    assert_eq!(summary.winner.as_deref(), Some("p1"));
    assert_eq!(session.phase(), GamePhase::Ended);
    assert_card_conservation(&session);

    // Ended sessions are queryable but immutable.
    assert_eq!(session.draw("p2").unwrap_err().kind(), ErrorKind::Phase);
    assert_eq!(
        session.play("p2", "0R", None).unwrap_err().kind(),
        ErrorKind::Phase
    );
}

#[test]
fn end_transitions_only_from_started() {
    let mut session = room_with_players(&["p1", "p2"]);
    assert_eq!(session.end().unwrap_err().kind(), ErrorKind::Phase);
    session.start().unwrap();
    session.end().unwrap();
    assert_eq!(session.phase(), GamePhase::Ended);
    assert_eq!(session.end().unwrap_err().kind(), ErrorKind::Phase);
}

#[test]
fn public_view_reports_sizes_not_contents() {
    let session = started_and_dealt(&["p1", "p2"], 7);
    let view = session.public_view();
    assert_eq!(view.phase, GamePhase::Started);
    assert_eq!(view.hand_sizes["p1"], 7);
    assert_eq!(view.hand_sizes["p2"], 7);
    assert_eq!(view.draw_pile_size, 94);
    assert_eq!(view.discard_top, None);
    assert_eq!(view.current_player.as_deref(), Some("p1"));
    assert_eq!(view.last_seed_source, Some(SeedSource::Local));

    let json = serde_json::to_value(&view).unwrap();
    assert!(json.get("hands").is_none(), "view must not expose hands");
}

#[test]
fn conservation_holds_across_a_long_mixed_sequence() {
    let mut session = started_and_dealt(&["p1", "p2", "p3"], 7);
    for _ in 0..40 {
        let actor = session.current_player().unwrap().to_string();
        // Try to play the first legal card; otherwise draw.
        let seat = session.players().iter().position(|p| *p == actor).unwrap();
        let candidate = session.hands[seat].iter().copied().find(|c| {
            match (session.discard_pile.last(), session.active_color) {
                (Some(&top), Some(active)) => c.matches(top, active),
                _ => true,
            }
        });
        match candidate {
            Some(card) => {
                let declared = card.is_wild().then_some(crate::cards::CardColor::Green);
                session.play(&actor, card.code(), declared).unwrap();
            }
            None => {
                if session.draw(&actor).is_err() {
                    break;
                }
            }
        }
        assert_card_conservation(&session);
        if session.phase() == GamePhase::Ended {
            break;
        }
    }
}
