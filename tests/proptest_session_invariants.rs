//! Property-based invariant tests for the live session and onboarding store.
//!
//! 1. Percent stays in [0, 100] and power in [0, max] for any tick sequence.
//! 2. Once ended, ticks never change elapsed time, energy or amount.
//! 3. Resume without supply never leaves a supply-loss pause.
//! 4. Completing a step twice is the same as completing it once.
//! 5. Progress percentage is (index + 1) / 5 * 100 for every step.

use chargedeck::config::SessionConfig;
use chargedeck::onboarding::{OnboardingStore, STEPS};
use chargedeck::persistence::MemoryStore;
use chargedeck::session::{LiveSession, SessionPhase};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Tick(f64),
    Pause,
    Resume,
    Supply(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (-200.0f64..200.0).prop_map(Op::Tick),
        1 => Just(Op::Pause),
        1 => Just(Op::Resume),
        1 => any::<bool>().prop_map(Op::Supply),
    ]
}

fn config_strategy() -> impl Strategy<Value = SessionConfig> {
    (0.0f64..=100.0, 0.0f64..=80.0, 0.01f64..=5.0).prop_map(|(percent, power, step)| {
        SessionConfig {
            initial_percent: percent,
            initial_power_kw: power,
            percent_per_tick: step,
            ..SessionConfig::default()
        }
    })
}

fn apply(session: &mut LiveSession, op: &Op) {
    match op {
        Op::Tick(delta) => {
            session.tick_with(*delta);
        }
        Op::Pause => {
            let _ = session.pause();
        }
        Op::Resume => {
            let _ = session.resume();
        }
        Op::Supply(present) => {
            session.set_supply(*present);
        }
    }
}

proptest! {
    #[test]
    fn readings_stay_in_range(config in config_strategy(), ops in prop::collection::vec(op_strategy(), 0..300)) {
        let mut session = LiveSession::new(&config, true);
        for op in &ops {
            apply(&mut session, op);
            prop_assert!((0.0..=100.0).contains(&session.percent()), "percent {}", session.percent());
            prop_assert!((0.0..=config.max_power_kw).contains(&session.power_kw()), "power {}", session.power_kw());
            prop_assert!(session.kwh() >= 0.0);
        }
    }
}

proptest! {
    #[test]
    fn ended_session_is_frozen(ops in prop::collection::vec(op_strategy(), 1..100)) {
        let config = SessionConfig { initial_percent: 100.0, ..SessionConfig::default() };
        let mut session = LiveSession::new(&config, true);
        prop_assert_eq!(session.phase(), SessionPhase::Ended);
        let (elapsed, kwh, amount) = (session.elapsed_seconds(), session.kwh(), session.accrued_amount());
        for op in &ops {
            apply(&mut session, op);
        }
        prop_assert_eq!(session.phase(), SessionPhase::Ended);
        prop_assert_eq!(session.elapsed_seconds(), elapsed);
        prop_assert!((session.kwh() - kwh).abs() < f64::EPSILON);
        prop_assert!((session.accrued_amount() - amount).abs() < f64::EPSILON);
    }
}

proptest! {
    #[test]
    fn resume_without_supply_stays_paused(ticks in 1usize..20) {
        let mut session = LiveSession::new(&SessionConfig::default(), true);
        session.set_supply(false);
        for _ in 0..ticks {
            session.tick_with(0.0);
        }
        prop_assert!(session.resume().is_err());
        prop_assert_eq!(session.phase(), SessionPhase::PausedSupplyLost);
    }
}

proptest! {
    #[test]
    fn completing_twice_equals_once(ids in prop::collection::vec(0usize..STEPS.len(), 0..12)) {
        let mut once = OnboardingStore::open(Box::new(MemoryStore::new()));
        let mut twice = OnboardingStore::open(Box::new(MemoryStore::new()));
        for i in &ids {
            once.complete_step(STEPS[*i].id).unwrap();
            twice.complete_step(STEPS[*i].id).unwrap();
            twice.complete_step(STEPS[*i].id).unwrap();
        }
        prop_assert_eq!(once.completed_steps(), twice.completed_steps());
    }
}

proptest! {
    #[test]
    fn progress_matches_step_index(index in 0usize..STEPS.len(), charger in "[A-Z]{3}-[0-9]{3}") {
        let mut store = OnboardingStore::open(Box::new(MemoryStore::new()));
        store.start().unwrap();
        store.set_charger_id(&charger).unwrap();
        for _ in 0..index {
            store.advance().unwrap();
        }
        let p = store.progress();
        prop_assert!((p.percentage - (index + 1) as f64 / 5.0 * 100.0).abs() < 1e-9);
        let route = store.route_for_step(index).unwrap();
        prop_assert!(!route.contains(":id"));
        if index > 0 {
            prop_assert!(route.contains(&charger));
        }
    }
}
