//! End-to-end duel scenarios against the public API

use quickdraw::game::{
    Archetype, CombatPhase, Duel, DuelError, DuelEvent, DuelSettings, EndReason, GoWindow,
    MatchTarget, PersonalityPool, RoundPhase, RoundResult, Side,
};

const DT: f32 = 1.0 / 60.0;

fn settings(seed: u64, enemy_ai: bool) -> DuelSettings {
    DuelSettings {
        enemy_ai,
        seed,
        go_window: GoWindow { min: 2.0, max: 2.0 },
        ..Default::default()
    }
}

fn advance_to(duel: &mut Duel, t: f32) {
    while duel.time() < t {
        duel.advance(DT);
    }
}

fn advance_while(duel: &mut Duel, max_ticks: u32, mut cond: impl FnMut(&Duel) -> bool) {
    for _ in 0..max_ticks {
        if !cond(duel) {
            return;
        }
        duel.advance(DT);
    }
    panic!("still waiting after {} ticks", max_ticks);
}

/// Go at 2.0s, press at 2.5s, hold until the aim has settled, release
fn steady_shot(seed: u64) -> (Duel, Vec<DuelEvent>) {
    let mut duel = Duel::new(settings(seed, false));

    advance_to(&mut duel, 2.5);
    assert_eq!(duel.round_phase(), RoundPhase::Duel);
    assert_eq!(duel.go_at(), Some(2.0));

    duel.press_draw();
    advance_while(&mut duel, 60, |d| d.phase(Side::Player) != CombatPhase::Aiming);
    advance_while(&mut duel, 60, |d| d.spread() > 6.0 + 1e-3);
    assert!(duel.spread() <= duel.hit_radius());
    duel.release_draw();

    advance_while(&mut duel, 120, |d| d.round_phase() != RoundPhase::Over);
    advance_while(&mut duel, 120, |d| {
        d.last_outcome().map_or(true, |o| d.time() < o.display_at)
    });
    duel.advance(DT);

    let events = duel.drain_events();
    (duel, events)
}

#[test]
fn test_steady_shot_downs_opponent() {
    let (duel, events) = steady_shot(7);

    let outcome = duel.last_outcome().unwrap();
    assert_eq!(outcome.result, RoundResult::Won);
    assert_eq!(outcome.reason, EndReason::Shot);
    assert_eq!(outcome.headline, "ENEMY DOWN");
    assert_eq!(duel.scores(), (1, 0));
    assert_eq!(duel.phase(Side::Enemy), CombatPhase::Dead);

    let react = outcome.player.react.unwrap();
    assert!((react - 0.5).abs() < 0.02, "react {}", react);
    assert!(outcome.player.shot.unwrap() > outcome.player.react.unwrap());
    assert!(outcome.enemy.react.is_none());

    let shots: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, DuelEvent::ShotFired { side: Side::Player, .. }))
        .collect();
    assert_eq!(shots.len(), 1);
    assert!(events.iter().any(|e| matches!(
        e,
        DuelEvent::Hit { shooter: Side::Player, target: Side::Enemy, lethal: true, .. }
    )));
    assert!(events.iter().any(|e| matches!(e, DuelEvent::OutcomeReady { .. })));
}

#[test]
fn test_steady_shot_is_deterministic() {
    let (_, a) = steady_shot(31);
    let (_, b) = steady_shot(31);
    assert_eq!(a, b);
}

#[test]
fn test_false_start_loses_round() {
    let mut duel = Duel::new(settings(3, false));
    advance_to(&mut duel, 0.5);
    duel.press_draw();

    assert_eq!(duel.round_phase(), RoundPhase::Over);
    let outcome = duel.last_outcome().unwrap();
    assert_eq!(outcome.result, RoundResult::Lost);
    assert_eq!(outcome.reason, EndReason::FalseStart);
    assert_eq!(outcome.reason.to_string(), "FALSE START");
    assert_eq!(duel.scores(), (0, 1));
    assert!((outcome.display_at - outcome.ended_at - 0.2).abs() < 1e-5);

    // terminal: further input changes nothing
    duel.release_draw();
    duel.press_draw();
    assert_eq!(duel.scores(), (0, 1));
}

#[test]
fn test_veteran_never_false_starts() {
    let pool = PersonalityPool::new(vec![Archetype::Veteran.personality()]).unwrap();
    for seed in 0..20 {
        let mut duel = Duel::with_pool(settings(seed, true), pool.clone());
        advance_to(&mut duel, 1.9);
        assert_eq!(duel.round_phase(), RoundPhase::Standoff);
    }
}

#[test]
fn test_opponent_draws_and_fires_after_go() {
    let pool = PersonalityPool::new(vec![Archetype::Veteran.personality()]).unwrap();
    let mut duel = Duel::with_pool(settings(11, true), pool);
    advance_to(&mut duel, 4.0);

    let events = duel.drain_events();
    let enemy_shot = events.iter().position(|e| matches!(e, DuelEvent::ShotFired { side: Side::Enemy, .. }));
    assert!(enemy_shot.is_some());

    let metrics = duel.combatant(Side::Enemy).metrics;
    let react = metrics.reacted_at.unwrap() - 2.0;
    assert!((0.10 - 0.02..=0.30 + 0.02).contains(&react), "react {}", react);

    let hit = events.iter().any(|e| matches!(e, DuelEvent::Hit { target: Side::Player, .. }));
    if hit {
        assert_eq!(duel.last_outcome().map(|o| o.result), Some(RoundResult::Lost));
    } else {
        assert_eq!(duel.round_phase(), RoundPhase::Duel);
    }
}

#[test]
fn test_practice_never_ends_round() {
    let mut duel = Duel::new(DuelSettings {
        practice: true,
        seed: 19,
        ..Default::default()
    });
    assert_eq!(duel.round_phase(), RoundPhase::Duel);

    let mut hits = 0;
    for tick in 0..1800u32 {
        match tick % 45 {
            0 => duel.press_draw(),
            30 => duel.release_draw(),
            _ => {}
        }
        duel.advance(DT);
        hits += duel
            .drain_events()
            .iter()
            .filter(|e| matches!(e, DuelEvent::Hit { lethal: false, .. }))
            .count();
        assert_eq!(duel.round_phase(), RoundPhase::Duel);
        assert!(duel.combatant(Side::Player).is_alive());
        assert!(duel.combatant(Side::Enemy).is_alive());
    }
    assert!(hits > 0);
    assert_eq!(duel.scores(), (0, 0));
}

#[test]
fn test_match_concludes_and_rejects_reset() {
    let mut duel = Duel::new(DuelSettings {
        match_target: MatchTarget::FirstTo(3),
        ..settings(5, false)
    });

    for round in 1..=3 {
        advance_to(&mut duel, 0.3);
        duel.press_draw();
        duel.release_draw();
        assert_eq!(duel.scores(), (0, round));
        if round < 3 {
            duel.reset(false).unwrap();
            assert_eq!(duel.round_phase(), RoundPhase::Standoff);
        }
    }

    let outcome = duel.last_outcome().unwrap();
    assert!(outcome.match_over);
    assert_eq!(outcome.headline, "MATCH LOST");
    assert!(duel.session().is_over());
    assert_eq!(duel.session().rounds_played(), 3);

    assert_eq!(duel.reset(false), Err(DuelError::MatchConcluded));
    assert_eq!(duel.round_phase(), RoundPhase::Over);

    duel.reset(true).unwrap();
    assert_eq!(duel.scores(), (0, 0));
    assert_eq!(duel.round_phase(), RoundPhase::Standoff);
    assert_eq!(duel.hud().round_label, "Round 1");
}

#[test]
fn test_target_cycle_and_endless() {
    let mut duel = Duel::new(settings(8, false));
    assert_eq!(duel.cycle_match_target(), MatchTarget::FirstTo(5));
    duel.set_match_target(MatchTarget::Endless);

    for _ in 0..12 {
        advance_to(&mut duel, 0.2);
        duel.press_draw();
        duel.release_draw();
        assert!(!duel.last_outcome().unwrap().match_over);
        duel.reset(false).unwrap();
    }
    assert_eq!(duel.scores(), (0, 12));
    assert_eq!(duel.hud().target_label, "Endless");
}

#[test]
fn test_same_seed_same_event_stream_with_ai() {
    let script = |seed: u64| {
        let mut duel = Duel::new(DuelSettings {
            seed,
            go_window: GoWindow { min: 1.5, max: 3.8 },
            ..Default::default()
        });
        let mut events = Vec::new();
        for tick in 0..900u32 {
            if duel.round_phase() == RoundPhase::Duel && duel.phase(Side::Player) == CombatPhase::Holstered {
                duel.press_draw();
            }
            if tick % 50 == 49 {
                duel.release_draw();
            }
            duel.advance(DT);
            events.extend(duel.drain_events());
            if duel.round_phase() == RoundPhase::Over && duel.reset(false).is_err() {
                break;
            }
        }
        events
    };
    for seed in [1, 2, 3] {
        assert_eq!(script(seed), script(seed));
    }
}
