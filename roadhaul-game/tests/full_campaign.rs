use roadhaul_game::{
    ActionError, EventConfig, GameCatalog, GameMode, GameSession, TickOutcome, make_jobs_for_city,
};

const TICK: f32 = 0.25;

fn new_session(seed: u64) -> GameSession {
    let mut session = GameSession::new(GameCatalog::default_catalog().clone(), seed);
    session.press_start().unwrap();
    session
}

/// Minimal driver: always take the first job, keep the tank topped up, pay
/// for service when possible and spin through inspections.
fn drive(session: &mut GameSession) -> TickOutcome {
    match session.mode() {
        GameMode::City => {
            if session.fuel_percent() < 60.0 && session.stats().money >= 50 {
                session.refuel().unwrap();
            }
            session.start_job(0).unwrap();
        }
        GameMode::DotCheck => {
            let _ = session.spin_dot();
            let _ = session.collect_dot();
        }
        GameMode::Driving if session.breakdown().is_active() => {
            if session.pay_breakdown().is_err() {
                session.abandon_trip().unwrap();
            }
        }
        _ => {}
    }
    session.tick(TICK)
}

fn assert_invariants(session: &GameSession) {
    let stats = session.stats();
    assert!(stats.money >= 0);
    for value in [
        stats.truck_health,
        stats.engine_health,
        stats.tire_health,
        stats.dot_reputation,
    ] {
        assert!((0.0..=100.0).contains(&value), "stat out of range: {value}");
    }
    assert!(stats.fuel >= 0.0 && stats.fuel <= session.tank_capacity() + 1e-3);
    assert_eq!(session.jobs().len(), 4);
    for job in session.jobs() {
        assert_ne!(job.dest_id, session.current_city_id());
        assert!(job.distance_total >= 80);
    }
    match session.mode() {
        GameMode::Driving | GameMode::DotCheck => assert!(session.active_job().is_some()),
        GameMode::City | GameMode::Start => {
            assert!(session.active_job().is_none());
            assert!(!session.breakdown().is_active());
        }
    }
    if session.breakdown().is_active() {
        assert!(session.breakdown().pending_cost >= 90);
    }
}

#[test]
fn long_campaign_keeps_invariants() {
    for seed in [1_u64, 7, 0xFACE, 0x5EED] {
        let mut session = new_session(seed);
        let mut deliveries = 0u32;
        for _ in 0..40_000 {
            let outcome = drive(&mut session);
            if outcome.delivered.is_some() {
                deliveries += 1;
            }
            assert_invariants(&session);
        }
        assert!(deliveries > 0, "seed {seed} never delivered");
        assert_eq!(session.stats().jobs_delivered, deliveries);
    }
}

#[test]
fn same_seed_same_career() {
    let mut a = new_session(99);
    let mut b = new_session(99);
    for _ in 0..5_000 {
        assert_eq!(drive(&mut a), drive(&mut b));
    }
    assert_eq!(a.stats(), b.stats());
    assert_eq!(a.current_city_id(), b.current_city_id());
    assert_eq!(a.challenges().state(), b.challenges().state());
}

#[test]
fn fuel_burn_matches_distance() {
    let mut cfg = EventConfig::default();
    cfg.interval_min = 1000.0;
    cfg.interval_max = 1000.0;
    let mut session =
        GameSession::with_event_config(GameCatalog::default_catalog().clone(), 5, cfg);
    session.press_start().unwrap();
    session.start_job(0).unwrap();
    let fuel = session.stats().fuel;
    let remaining = session.job_remaining();
    for _ in 0..4 {
        session.tick(TICK);
    }
    let travelled = remaining - session.job_remaining();
    assert!((travelled - session.speed()).abs() < 1e-2);
    assert!((fuel - session.stats().fuel - travelled * 0.04).abs() < 1e-3);
}

#[test]
fn abandon_rolls_back_to_trip_origin() {
    let mut session = new_session(3);
    session.start_job(0).unwrap();
    let first_leg = session.active_job().unwrap().job.dest_id;
    session.stats_mut().fuel = 1.0e6;
    while session.mode() != GameMode::City {
        drive(&mut session);
    }
    assert_eq!(session.current_city_id(), first_leg);

    session.start_job(2).unwrap();
    for _ in 0..4 {
        session.tick(TICK);
    }
    let money = session.stats().money;
    session.abandon_trip().unwrap();
    assert_eq!(session.current_city_id(), first_leg);
    assert_eq!(session.trip_origin_id(), first_leg);
    assert_eq!(session.stats().money, money);
    assert_eq!(
        session.jobs(),
        make_jobs_for_city(first_leg, session.distances()).as_slice()
    );
    assert_eq!(session.abandon_trip(), Err(ActionError::InvalidState));
}

#[test]
fn broke_driver_is_towed_home() {
    let mut session = new_session(11);
    session.start_job(3).unwrap();
    session.stats_mut().money = 0;
    session.stats_mut().fuel = 0.5;
    let mut failed = false;
    for _ in 0..100 {
        if session.breakdown().is_active() {
            session.abandon_trip().unwrap();
            break;
        }
        if session.mode() == GameMode::DotCheck {
            let _ = session.spin_dot();
            let _ = session.collect_dot();
        }
        if session.tick(TICK).trip_failed {
            failed = true;
            break;
        }
    }
    assert!(failed || session.mode() == GameMode::City);
    assert_eq!(session.current_city_id(), 0);
    assert!(session.active_job().is_none());
}
