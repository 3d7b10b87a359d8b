use chrono::Weekday;
use tickpulse::{
    ALERT_SLOTS, AdminCommand, EventKind, HISTORY_LEN, ManualClock, MomentumMonitor, Settings,
    ThresholdProfile, TickpulseError, interval_seconds,
};
use tokio_test::{assert_err, assert_ok};

const EPSILON: f64 = 1e-9;

/// Price that moves the engine's velocity to `target` on the next update.
fn price_for_diff(monitor: &MomentumMonitor, target: f64) -> String {
    let profile = monitor.engine().profile();
    let state = monitor.engine().state();
    let price = (target - (1.0 - profile.alpha_fast) * state.ema_fast
        + (1.0 - profile.alpha_slow) * state.ema_slow)
        / (profile.alpha_fast - profile.alpha_slow);
    format!("{price}")
}

fn monday_open() -> ManualClock {
    ManualClock::at(2024, 1, 8, 9, 30, 0)
}

#[test]
fn test_bull_breakout_rush_and_trend_end() {
    let clock = monday_open();
    let mut monitor = MomentumMonitor::new(Settings::for_symbol("SPY"));
    assert_eq!(*monitor.engine().profile(), ThresholdProfile::default());

    // seed
    let seed = assert_ok!(monitor.ingest("500.00", &clock));
    assert!(seed.reading.is_seed());
    assert_eq!(monitor.engine().state().ema_fast, 500.0);
    assert_eq!(monitor.engine().state().ema_slow, 500.0);
    assert!(seed.alert.is_none());

    // breakout
    clock.advance_ms(2_000);
    let breakout = assert_ok!(monitor.ingest("501.00", &clock));
    let state = *monitor.engine().state();
    assert!((state.ema_fast - 500.22).abs() < EPSILON);
    assert!((state.ema_slow - 500.10).abs() < EPSILON);
    assert!((state.diff - 0.12).abs() < EPSILON);
    let alert = breakout.alert.expect("breakout alert");
    assert_eq!(alert.kind, EventKind::BullBreak);
    assert!((alert.value - 0.12).abs() < EPSILON);
    assert_eq!(alert.timestamp, "09:30:02");

    // acceleration: 0.20 > 0.12 * 1.20
    clock.advance_ms(2_000);
    let next = price_for_diff(&monitor, 0.20);
    let rush = assert_ok!(monitor.ingest(&next, &clock));
    let alert = rush.alert.expect("rush alert");
    assert_eq!(alert.kind, EventKind::BullRush);
    assert!((alert.value - 0.20).abs() < 1e-6);

    // back inside the chop band
    clock.advance_ms(2_000);
    let next = price_for_diff(&monitor, 0.03);
    let end = assert_ok!(monitor.ingest(&next, &clock));
    let alert = end.alert.expect("trend end alert");
    assert_eq!(alert.kind, EventKind::TrendEnd);
    assert!((alert.value - 0.03).abs() < 1e-6);

    // still inside: nothing
    let next = price_for_diff(&monitor, 0.02);
    assert!(assert_ok!(monitor.ingest(&next, &clock)).alert.is_none());

    let kinds: Vec<EventKind> = monitor.alerts().snapshot().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::TrendEnd, EventKind::BullRush, EventKind::BullBreak]
    );

    let history = monitor.history().chronological();
    assert_eq!(history.len(), HISTORY_LEN);
    assert!((history[HISTORY_LEN - 1] - 0.02).abs() < 1e-6);
    assert_eq!(history[HISTORY_LEN - 6], 0.0);
}

#[test]
fn test_bear_side_mirrors_bull_side() {
    let clock = monday_open();
    let mut monitor = MomentumMonitor::default();
    assert_ok!(monitor.ingest("500.00", &clock));

    let expected = [
        // TC0: breakout below the band
        (-0.10, Some(EventKind::BearBreak)),
        // TC1: acceleration past 1.2x
        (-0.15, Some(EventKind::BearDump)),
        // TC2: below the acceleration factor
        (-0.16, None),
        // TC3: back inside the band
        (-0.04, Some(EventKind::TrendEnd)),
    ];

    for (index, (target, kind)) in expected.into_iter().enumerate() {
        let next = price_for_diff(&monitor, target);
        let outcome = assert_ok!(monitor.ingest(&next, &clock));
        assert_eq!(outcome.alert.map(|a| a.kind), kind, "TC{} failed", index);
    }
}

#[test]
fn test_diff_tracks_ema_spread_for_any_sequence() {
    let clock = monday_open();
    let mut monitor = MomentumMonitor::default();
    let prices = [
        "500", "500.5", "499.75", "bad", "502", "-3", "498.2", "498.2", "0", "503.9", "501",
    ];

    for raw in prices {
        let _ = monitor.ingest(raw, &clock);
        let state = monitor.engine().state();
        assert!((state.diff - (state.ema_fast - state.ema_slow)).abs() < EPSILON);
    }
    assert_eq!(monitor.snapshot().ticks, 8);
}

#[test]
fn test_alert_log_stays_bounded() {
    let clock = monday_open();
    let mut monitor = MomentumMonitor::default();
    assert_ok!(monitor.ingest("500.00", &clock));

    // alternate breakouts and trend ends
    for round in 0..10 {
        let side = if round % 2 == 0 { 1.0 } else { -1.0 };
        let next = price_for_diff(&monitor, 0.10 * side);
        assert_ok!(monitor.ingest(&next, &clock));
        let next = price_for_diff(&monitor, 0.0);
        assert_ok!(monitor.ingest(&next, &clock));
    }

    let alerts = monitor.alerts().snapshot();
    assert_eq!(alerts.len(), ALERT_SLOTS);
    assert_eq!(alerts[0].kind, EventKind::TrendEnd);
    assert_eq!(alerts[1].kind, EventKind::BearBreak);
}

#[test]
fn test_rejected_input_and_uninitialized_state() {
    let clock = monday_open();
    let mut monitor = MomentumMonitor::default();

    assert_eq!(assert_err!(monitor.velocity()), TickpulseError::Uninitialized);
    assert_err!(monitor.ingest("0", &clock));
    assert_err!(monitor.ingest("NaN", &clock));
    assert_eq!(assert_err!(monitor.velocity()), TickpulseError::Uninitialized);
    assert!(monitor.history().is_empty());
}

#[test]
fn test_symbol_switch_keeps_log_and_history() {
    let clock = monday_open();
    let mut monitor = MomentumMonitor::default();
    assert_ok!(monitor.ingest("500.00", &clock));
    assert_ok!(monitor.ingest("501.00", &clock));

    monitor.apply(
        AdminCommand::SetSymbol {
            symbol: " iwm ".to_string(),
        },
        &clock,
    );

    assert_eq!(monitor.settings().symbol, "IWM");
    assert_eq!(monitor.alerts().len(), 1);
    assert_eq!(monitor.history().len(), 2);
    assert_eq!(monitor.snapshot().price, None);
}

#[test]
fn test_scheduler_intervals() {
    struct TestCase {
        weekday: Weekday,
        hour: u32,
        minute: u32,
        expected: u64,
    }

    let tests = vec![
        TestCase {
            // TC0: open turbo
            weekday: Weekday::Mon,
            hour: 9,
            minute: 45,
            expected: 2,
        },
        TestCase {
            // TC1: pre-market sleep
            weekday: Weekday::Mon,
            hour: 8,
            minute: 0,
            expected: 60,
        },
        TestCase {
            // TC2: lunch
            weekday: Weekday::Mon,
            hour: 12,
            minute: 30,
            expected: 10,
        },
        TestCase {
            // TC3: weekend
            weekday: Weekday::Sat,
            hour: 10,
            minute: 0,
            expected: 300,
        },
        TestCase {
            // TC4: one minute before the open
            weekday: Weekday::Mon,
            hour: 9,
            minute: 29,
            expected: 4,
        },
    ];

    for (index, test) in tests.into_iter().enumerate() {
        let actual = interval_seconds(test.weekday, test.hour, test.minute);
        assert_eq!(actual, test.expected, "TC{} failed", index);
    }
}
