//! Breaker, scoring and ordering behaviour through the public registry API.

use std::sync::Arc;

use provider_router::health::{Clock, FailureReason, ProviderId};
use provider_router::resilience::CircuitState;
use provider_router::selection::{rank, Candidate};

mod common;

#[test]
fn test_scenario_mostly_timeouts_opens_circuit() {
    let (registry, clock) = common::registry_at(50_000);
    let start = clock.now_ms();
    let p = ProviderId::from("p");
    assert_eq!(registry.get(&p).score, 0.5);

    registry.record_success(&p, 900, true);
    for _ in 0..19 {
        registry.record_failure(&p, Some(30_000), FailureReason::Timeout, "deadline exceeded");
    }

    let stats = registry.get(&p);
    assert_eq!(stats.total, 20);
    assert_eq!(stats.failure, 19);
    assert_eq!(stats.state(), CircuitState::Open);
    assert_eq!(stats.breaker.open_until, Some(start + 8_000));
    assert_eq!(stats.breaker.backoff_ms, 16_000);
    assert_eq!(stats.last_failure_reason, Some(FailureReason::Timeout));
}

#[test]
fn test_never_trips_before_min_requests() {
    let (registry, _) = common::registry_at(0);
    let p = ProviderId::from("p");
    for n in 1..12 {
        registry.record_failure(&p, None, FailureReason::Http, "500");
        assert_eq!(registry.get(&p).state(), CircuitState::Closed, "tripped after {n}");
    }
    registry.record_failure(&p, None, FailureReason::Http, "500");
    assert_eq!(registry.get(&p).state(), CircuitState::Open);
}

#[test]
fn test_rates_stay_in_unit_interval() {
    let (registry, clock) = common::registry_at(0);
    let p = ProviderId::from("p");
    let reasons = [
        FailureReason::Timeout,
        FailureReason::Http,
        FailureReason::Json,
        FailureReason::Validation,
        FailureReason::Unknown,
    ];

    for i in 0..200u64 {
        match i % 7 {
            0 | 3 => registry.record_success(&p, i * 10, i % 2 == 0),
            _ => registry.record_failure(&p, Some(i), reasons[(i % 5) as usize], "x"),
        }
        clock.advance(1_000);
        let s = registry.get(&p);
        assert!((0.0..=1.0).contains(&s.success_rate));
        assert!((0.0..=1.0).contains(&s.json_rate));
        assert!((0.0..=1.0).contains(&s.score));
        let base = registry.config().base_open_ms;
        let max = registry.config().max_open_ms;
        assert!((base..=max).contains(&s.breaker.backoff_ms));
    }
}

#[test]
fn test_backoff_escalates_per_consecutive_open() {
    let (registry, clock) = common::registry_at(0);
    let p = ProviderId::from("p");
    let config = registry.config().clone();

    for _ in 0..config.min_requests {
        registry.record_failure(&p, None, FailureReason::Timeout, "t");
    }
    let mut opens = 1u32;
    assert_eq!(registry.get(&p).breaker.backoff_ms, config.base_open_ms * 2);

    for _ in 0..6 {
        let open_until = registry.get(&p).breaker.open_until.unwrap();
        clock.set(open_until);
        assert!(registry.try_acquire(&p));
        registry.record_failure(&p, None, FailureReason::Timeout, "probe failed");
        opens += 1;

        let expected = config
            .base_open_ms
            .saturating_mul(2u64.pow(opens))
            .min(config.max_open_ms);
        let stats = registry.get(&p);
        assert_eq!(stats.state(), CircuitState::Open);
        assert_eq!(stats.breaker.backoff_ms, expected);
    }
}

#[test]
fn test_half_open_success_resets_regardless_of_depth() {
    let (registry, clock) = common::registry_at(0);
    let p = ProviderId::from("p");
    for _ in 0..12 {
        registry.record_failure(&p, None, FailureReason::Http, "503");
    }
    for _ in 0..4 {
        clock.set(registry.get(&p).breaker.open_until.unwrap());
        assert!(registry.can_attempt(&p));
        registry.record_failure(&p, None, FailureReason::Http, "503");
    }
    assert_eq!(registry.get(&p).breaker.backoff_ms, 120_000);

    clock.set(registry.get(&p).breaker.open_until.unwrap());
    assert!(registry.can_attempt(&p));
    assert_eq!(registry.get(&p).state(), CircuitState::HalfOpen);
    registry.record_success(&p, 50, true);

    let stats = registry.get(&p);
    assert_eq!(stats.state(), CircuitState::Closed);
    assert_eq!(stats.breaker.backoff_ms, 8_000);
}

#[test]
fn test_concurrent_callers_get_one_probe() {
    let (registry, clock) = common::registry_at(0);
    let p = ProviderId::from("p");
    for _ in 0..12 {
        registry.record_failure(&p, None, FailureReason::Timeout, "t");
    }
    clock.advance(8_000);

    let admitted: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let p = p.clone();
                scope.spawn(move || registry.try_acquire(&p))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum()
    });

    assert_eq!(admitted, 1);
    assert!(registry.get(&p).breaker.half_open_probe_in_flight);
}

#[test]
fn test_open_provider_ranked_after_eligible_one() {
    let order = rank(vec![
        Candidate {
            id: "a".into(),
            score: 0.8,
            eligible: true,
        },
        Candidate {
            id: "b".into(),
            score: 0.9,
            eligible: false,
        },
    ]);
    assert_eq!(order, vec![ProviderId::from("a"), ProviderId::from("b")]);
}

#[test]
fn test_best_order_over_registry() {
    let (registry, _) = common::registry_at(0);
    let fast = ProviderId::from("fast");
    let slow = ProviderId::from("slow");
    let down = ProviderId::from("down");
    let fresh = ProviderId::from("fresh");

    registry.record_success(&fast, 200, true);
    registry.record_success(&slow, 20_000, true);
    for _ in 0..12 {
        registry.record_failure(&down, None, FailureReason::Timeout, "t");
    }

    let order = registry.best_order(&[down.clone(), fresh.clone(), slow.clone(), fast.clone()]);
    assert_eq!(order, vec![fast, slow, fresh, down]);
}
