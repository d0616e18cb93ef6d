// Space2Super End-to-End Test Scenarios
//
// Scripted key streams run through the config, role table, daemon loop and a
// recording sink. No input hardware is needed.
//
// Run with: cargo test --test e2e_scenarios

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use space2super_core::{
    Config, Daemon, Emission, EmissionReason, Engine, Key, KeyNames, ManualClock, RawEvent,
    RecordingSink, ScriptedSource,
};

// =========================================================================
// Test Helpers
// =========================================================================

const SPACE: u16 = 57;
const LEFT_META: u16 = 125;
const RIGHT_META: u16 = 126;
const LEFT_SHIFT: u16 = 42;
const LEFT_CTRL: u16 = 29;
const A: u16 = 30;
const BTN_LEFT: u16 = 0x110;
const BTN_RIGHT: u16 = 0x111;
const F24: u16 = 194;

/// Run a timed script (ms after start) through a daemon built from `config`
fn run_with(config: &Config, script: &[(u64, RawEvent)]) -> Vec<Emission> {
    let table = config.role_table(&KeyNames).unwrap();
    let substitute = config.substitute_key(&KeyNames).unwrap();
    let clock = ManualClock::new();
    let running = Arc::new(AtomicBool::new(true));

    let mut source = script
        .iter()
        .fold(ScriptedSource::new(clock.clone()), |source, (ms, event)| {
            source.at(*ms, *event)
        })
        .stop_when_done(running.clone());
    let mut sink = RecordingSink::new();
    let mut daemon = Daemon::new(table, Engine::new(substitute, config.timeout()), clock);

    daemon
        .run_until(&mut source, &mut sink, &running, 10)
        .unwrap();
    assert_eq!(source.remaining(), 0);
    sink.take()
}

fn run(script: &[(u64, RawEvent)]) -> Vec<Emission> {
    run_with(&Config::default(), script)
}

fn press(code: u16) -> RawEvent {
    RawEvent::press(code)
}

fn release(code: u16) -> RawEvent {
    RawEvent::release(code)
}

fn repeat(code: u16) -> RawEvent {
    RawEvent::repeat(code)
}

fn reasons(emissions: &[Emission]) -> Vec<EmissionReason> {
    emissions.iter().map(|e| e.reason).collect()
}

// =========================================================================
// Tap and hold timing
// =========================================================================

#[test]
fn test_quick_tap_types_substitute() {
    let emissions = run(&[(0, press(SPACE)), (300, release(SPACE))]);
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].key, Key::from(F24));
    assert_eq!(emissions[0].reason, EmissionReason::Tap);
}

#[test]
fn test_hold_past_timeout_types_nothing() {
    assert!(run(&[(0, press(SPACE)), (700, release(SPACE))]).is_empty());
}

#[test]
fn test_release_exactly_at_timeout_is_a_tap() {
    let emissions = run(&[(0, press(SPACE)), (600, release(SPACE))]);
    assert_eq!(reasons(&emissions), vec![EmissionReason::Tap]);

    assert!(run(&[(0, press(SPACE)), (601, release(SPACE))]).is_empty());
}

#[test]
fn test_autorepeat_does_not_restart_hold() {
    // 0.5x timeout, repeat, then 0.6x timeout: held 1.1x in total
    let emissions = run(&[
        (0, press(SPACE)),
        (300, repeat(SPACE)),
        (300, press(SPACE)),
        (660, release(SPACE)),
    ]);
    assert!(emissions.is_empty());
}

#[test]
fn test_custom_timeout_from_config() {
    let config = Config::from_toml("[general]\ntimeout_ms = 200\n").unwrap();
    assert!(run_with(&config, &[(0, press(SPACE)), (300, release(SPACE))]).is_empty());
    assert_eq!(
        run_with(&config, &[(0, press(SPACE)), (150, release(SPACE))]).len(),
        1
    );
}

// =========================================================================
// Chords
// =========================================================================

#[test]
fn test_companion_chord_emits_once_at_press() {
    let emissions = run(&[
        (0, press(SPACE)),
        (50, press(LEFT_META)),
        (60, release(LEFT_META)),
        (100, release(SPACE)),
    ]);
    assert_eq!(reasons(&emissions), vec![EmissionReason::CompanionChord]);
}

#[test]
fn test_each_companion_press_emits() {
    let emissions = run(&[
        (0, press(SPACE)),
        (50, press(LEFT_META)),
        (60, press(RIGHT_META)),
        (70, release(RIGHT_META)),
        (80, release(LEFT_META)),
        (100, release(SPACE)),
    ]);
    assert_eq!(emissions.len(), 2);
}

#[test]
fn test_typing_while_holding_suppresses_tap() {
    let emissions = run(&[
        (0, press(SPACE)),
        (40, press(A)),
        (60, release(A)),
        (100, release(SPACE)),
    ]);
    assert!(emissions.is_empty());
}

#[test]
fn test_held_modifier_suppresses_tap() {
    let emissions = run(&[
        (0, press(SPACE)),
        (20, press(LEFT_SHIFT)),
        (100, release(SPACE)),
        (150, release(LEFT_SHIFT)),
    ]);
    assert!(emissions.is_empty());
}

#[test]
fn test_modifier_released_before_target_allows_tap() {
    // Ctrl is back up by the time the target is released
    let emissions = run(&[
        (0, press(LEFT_CTRL)),
        (10, press(SPACE)),
        (20, release(LEFT_CTRL)),
        (100, release(SPACE)),
    ]);
    assert_eq!(reasons(&emissions), vec![EmissionReason::Tap]);
}

#[test]
fn test_pointer_click_while_holding_suppresses_tap() {
    let emissions = run(&[
        (0, press(SPACE)),
        (30, press(BTN_RIGHT)),
        (40, release(BTN_RIGHT)),
        (100, release(SPACE)),
    ]);
    assert!(emissions.is_empty());
}

#[test]
fn test_pointer_click_before_hold_is_ignored() {
    let emissions = run(&[
        (0, press(BTN_LEFT)),
        (10, release(BTN_LEFT)),
        (20, press(SPACE)),
        (100, release(SPACE)),
    ]);
    assert_eq!(emissions.len(), 1);
}

// =========================================================================
// Robustness
// =========================================================================

#[test]
fn test_spurious_release_then_normal_tap() {
    let emissions = run(&[
        (0, release(SPACE)),
        (0, release(LEFT_SHIFT)),
        (10, press(SPACE)),
        (50, release(SPACE)),
    ]);
    assert_eq!(reasons(&emissions), vec![EmissionReason::Tap]);
}

#[test]
fn test_taint_does_not_leak_into_next_hold() {
    let emissions = run(&[
        (0, press(SPACE)),
        (10, press(A)),
        (20, release(A)),
        (30, release(SPACE)),
        (100, press(SPACE)),
        (150, release(SPACE)),
    ]);
    assert_eq!(emissions.len(), 1);
}

#[test]
fn test_companionless_config_treats_meta_as_other() {
    let config = Config::from_toml("[roles]\ncompanions = []\n").unwrap();
    let emissions = run_with(
        &config,
        &[
            (0, press(SPACE)),
            (50, press(LEFT_META)),
            (60, release(LEFT_META)),
            (100, release(SPACE)),
        ],
    );
    assert!(emissions.is_empty());
}

#[test]
fn test_numeric_target_and_substitute() {
    let config = Config::from_toml(
        r#"
        [general]
        target = 58
        substitute = 1
        "#,
    )
    .unwrap();
    let emissions = run_with(
        &config,
        &[
            (0, press(SPACE)),
            (10, release(SPACE)),
            (20, press(58)),
            (90, release(58)),
        ],
    );
    assert_eq!(emissions.len(), 1);
    assert_eq!(emissions[0].key, Key::from(1));
}
