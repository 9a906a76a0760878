//! End-to-end scenarios: concrete round sequences with known outcomes.

use fallow::{
    ArmState, BanditEngine, BanditError, EngineConfig, LifecycleConfig, OutcomeBounds,
    TransitionReason,
};

fn config(c: f64, dormancy: u64, window: usize, cooldown: u64, max_dormant: u64) -> EngineConfig {
    EngineConfig {
        exploration_constant: c,
        profit_window: window,
        lifecycle: LifecycleConfig {
            dormancy_threshold: dormancy,
            reactivation_cooldown: cooldown,
            max_dormant_rounds: max_dormant,
        },
        ..EngineConfig::default()
    }
}

#[test]
fn worked_ucb_example_two_arms() {
    // c = 2.0, no decay. Round 1: A (cold), reward 1.0. Round 2: B (cold),
    // reward 0.2. Round 3: both bonuses are equal, so A's higher mean wins.
    let mut engine = BanditEngine::new(EngineConfig::default());
    engine.add_arm("a").unwrap();
    engine.add_arm("b").unwrap();

    assert_eq!(engine.next_round().unwrap(), "a");
    engine.report_outcome("a", 1.0, 0.0).unwrap();
    assert_eq!(engine.next_round().unwrap(), "b");
    engine.report_outcome("b", 0.2, 0.0).unwrap();

    let sel = engine.next_round_explain().unwrap();
    assert_eq!(sel.chosen, "a");
    assert!(!sel.cold_start);
    let bonus = 2.0 * (2.0 * 3.0f64.ln()).sqrt();
    let score_a = sel.candidates[0].score.unwrap();
    let score_b = sel.candidates[1].score.unwrap();
    assert!((score_a - (1.0 + bonus)).abs() < 1e-9, "score_a={score_a}");
    assert!((score_b - (0.2 + bonus)).abs() < 1e-9, "score_b={score_b}");
}

#[test]
fn neglected_arm_cycles_through_dormancy_and_cooldown() {
    // Pure exploitation (c = 0): once "a" proves better, "b" is starved,
    // goes Dormant by inactivity, comes back on cooldown, and is starved
    // into Dormant again.
    let mut engine = BanditEngine::new(config(0.0, 3, 100, 5, 1000));
    engine.add_arm("a").unwrap();
    engine.add_arm("b").unwrap();

    // Cold start.
    assert_eq!(engine.next_round().unwrap(), "a");
    engine.report_outcome("a", 1.0, 0.0).unwrap();
    assert_eq!(engine.next_round().unwrap(), "b");
    engine.report_outcome("b", 0.1, 0.0).unwrap();

    // Rounds 3-5: "a" every time; "b" idles up to the threshold.
    for round in 3..=5 {
        assert_eq!(engine.next_round().unwrap(), "a");
        let report = engine.report_outcome("a", 1.0, 0.0).unwrap();
        assert!(report.lifecycle.applied.is_empty(), "round {round}");
    }

    // Round 6: idle = 4 > 3, "b" demoted.
    assert_eq!(engine.next_round().unwrap(), "a");
    let report = engine.report_outcome("a", 1.0, 0.0).unwrap();
    assert_eq!(report.lifecycle.applied.len(), 1);
    let t = &report.lifecycle.applied[0];
    assert_eq!(t.arm, "b");
    assert_eq!(t.to, ArmState::Dormant);
    assert_eq!(
        t.reason,
        TransitionReason::InactivityTimeout {
            rounds_idle: 4,
            threshold: 3
        }
    );

    // Rounds 7-10: "b" is dormant and not competitive (0.1 vs 1.0).
    for _ in 7..=10 {
        assert_eq!(engine.next_round().unwrap(), "a");
        let report = engine.report_outcome("a", 1.0, 0.0).unwrap();
        assert!(report.lifecycle.applied.is_empty());
        assert_eq!(engine.ledger().get("b").unwrap().state, ArmState::Dormant);
    }

    // Round 11: dormant for 5 rounds = cooldown, "b" reactivates.
    engine.next_round().unwrap();
    let report = engine.report_outcome("a", 1.0, 0.0).unwrap();
    let t = &report.lifecycle.applied[0];
    assert_eq!(t.arm, "b");
    assert_eq!(t.to, ArmState::Active);
    assert_eq!(
        t.reason,
        TransitionReason::CooldownElapsed {
            dormant_for: 5,
            cooldown: 5
        }
    );

    // The reactivation restarted b's idleness clock: it survives rounds
    // 12-14 and is starved back to Dormant at round 15.
    for _ in 12..=14 {
        assert_eq!(engine.next_round().unwrap(), "a");
        let report = engine.report_outcome("a", 1.0, 0.0).unwrap();
        assert!(report.lifecycle.applied.is_empty());
    }
    engine.next_round().unwrap();
    let report = engine.report_outcome("a", 1.0, 0.0).unwrap();
    assert_eq!(report.lifecycle.applied[0].arm, "b");
    assert_eq!(report.lifecycle.applied[0].to, ArmState::Dormant);
}

#[test]
fn money_losing_arm_is_demoted_by_trend_not_reward() {
    // "b" produces the same reward as "a" but at a ruinous cost. UCB
    // scores rewards only, so the profit trend is what parks it.
    let mut engine = BanditEngine::new(config(2.0, 100, 2, 50, 1000));
    engine.add_arm("a").unwrap();
    engine.add_arm("b").unwrap();

    let mut demoted = None;
    for _ in 0..20 {
        let arm = engine.next_round().unwrap();
        let (reward, cost) = if arm == "b" { (1.0, 3.0) } else { (1.0, 0.0) };
        let report = engine.report_outcome(&arm, reward, cost).unwrap();
        if let Some(t) = report.lifecycle.applied.iter().find(|t| t.arm == "b") {
            demoted = Some(t.clone());
            break;
        }
    }
    let t = demoted.expect("b should be demoted within 20 rounds");
    assert_eq!(t.to, ArmState::Dormant);
    assert!(matches!(
        t.reason,
        TransitionReason::NegativeTrend { trailing_sum } if trailing_sum < 0.0
    ));
    assert!(engine.arm_profit("b") < 0.0);
}

#[test]
fn dormant_arm_reactivates_when_the_leader_collapses() {
    let mut engine = BanditEngine::new(config(0.0, 2, 100, 100, 1000));
    engine.add_arm("a").unwrap();
    engine.add_arm("b").unwrap();

    engine.next_round().unwrap();
    engine.report_outcome("a", 0.9, 0.0).unwrap();
    engine.next_round().unwrap();
    engine.report_outcome("b", 0.5, 0.0).unwrap();

    // "a" leads while "b" starves into Dormant (round 5: idle 3 > 2).
    for reward in [0.9, 0.9, 0.0] {
        assert_eq!(engine.next_round().unwrap(), "a");
        engine.report_outcome("a", reward, 0.0).unwrap();
    }
    assert_eq!(engine.ledger().get("b").unwrap().state, ArmState::Dormant);

    // a's rewards have collapsed; once its mean sinks below b's 0.5 the
    // dormant arm is competitive again, long before the 100-round cooldown.
    engine.next_round().unwrap();
    let report = engine.report_outcome("a", 0.0, 0.0).unwrap();
    assert!(report.lifecycle.applied.is_empty(), "mean still 0.54");

    engine.next_round().unwrap();
    let report = engine.report_outcome("a", 0.0, 0.0).unwrap();
    let t = report
        .lifecycle
        .applied
        .iter()
        .find(|t| t.arm == "b")
        .expect("b reactivates");
    assert_eq!(t.to, ArmState::Active);
    assert!(matches!(
        t.reason,
        TransitionReason::CompetitiveAgain { hypothetical_score, active_floor }
            if hypothetical_score == 0.5 && active_floor < 0.5
    ));

    // And with pure exploitation the comeback arm wins the next round.
    assert_eq!(engine.next_round().unwrap(), "b");
}

#[test]
fn expiry_prunes_an_arm_that_never_comes_back() {
    // Expiry set below the cooldown: the arm is removed before the
    // cooldown can resurrect it.
    let mut engine = BanditEngine::new(config(0.0, 2, 100, 50, 6));
    engine.add_arm("a").unwrap();
    engine.add_arm("b").unwrap();

    engine.next_round().unwrap();
    engine.report_outcome("a", 1.0, 0.0).unwrap();
    engine.next_round().unwrap();
    engine.report_outcome("b", 0.1, 0.0).unwrap();

    let mut removed = None;
    for _ in 0..20 {
        let arm = engine.next_round().unwrap();
        let report = engine.report_outcome(&arm, 1.0, 0.0).unwrap();
        if let Some(t) = report
            .lifecycle
            .applied
            .iter()
            .find(|t| t.to == ArmState::Removed)
        {
            removed = Some(t.clone());
            break;
        }
    }
    let t = removed.expect("b should expire");
    assert_eq!(t.arm, "b");
    assert!(matches!(
        t.reason,
        TransitionReason::DormancyExpired { max_dormant: 6, .. }
    ));
    // Terminal: the engine keeps running on "a" alone.
    for _ in 0..5 {
        assert_eq!(engine.next_round().unwrap(), "a");
        engine.report_outcome("a", 1.0, 0.0).unwrap();
    }
    assert_eq!(engine.ledger().get("b").unwrap().state, ArmState::Removed);
}

#[test]
fn accounting_closes_across_interleaved_arms() {
    let mut engine = BanditEngine::new(EngineConfig::default());
    for id in ["a", "b", "c"] {
        engine.add_arm(id).unwrap();
    }
    let outcomes = [
        (2.0, 0.5),
        (0.1, 0.4),
        (1.0, 1.0),
        (0.7, 0.1),
        (0.0, 0.3),
        (1.5, 0.2),
    ];
    let mut expected = 0.0;
    for (reward, cost) in outcomes {
        let arm = engine.next_round().unwrap();
        engine.report_outcome(&arm, reward, cost).unwrap();
        expected += reward - cost;
    }
    assert!((engine.total_profit() - expected).abs() < 1e-9);
    let by_arm: f64 = ["a", "b", "c"].iter().map(|id| engine.arm_profit(id)).sum();
    assert!((by_arm - expected).abs() < 1e-9);
}

#[test]
fn engine_surfaces_ledger_errors_unchanged() {
    let mut engine = BanditEngine::new(EngineConfig::default());
    engine.add_arm("a").unwrap();
    assert_eq!(
        engine.add_arm("a"),
        Err(BanditError::DuplicateArm { id: "a".into() })
    );
    let arm = engine.next_round().unwrap();
    assert_eq!(
        engine.report_outcome("ghost", 1.0, 0.0),
        Err(BanditError::UnknownArm { id: "ghost".into() })
    );
    engine.report_outcome(&arm, 1.0, 0.0).unwrap();
}

#[test]
fn bounded_outcomes_reject_before_any_mutation() {
    let mut engine = BanditEngine::new(EngineConfig {
        outcome_bounds: OutcomeBounds {
            min_reward: 0.0,
            max_reward: 1.0,
            min_cost: 0.0,
            max_cost: 10.0,
        },
        ..EngineConfig::default()
    });
    engine.add_arm("a").unwrap();
    let arm = engine.next_round().unwrap();
    let before = engine.snapshot();

    for (reward, cost) in [(-0.1, 0.0), (1.5, 0.0), (0.5, -1.0), (0.5, 11.0)] {
        assert!(matches!(
            engine.report_outcome(&arm, reward, cost),
            Err(BanditError::InvalidOutcome { .. })
        ));
    }
    assert_eq!(engine.snapshot(), before);
    engine.report_outcome(&arm, 1.0, 10.0).unwrap();
}
