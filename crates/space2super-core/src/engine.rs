// Space2Super Disambiguation Engine
// Tap/hold state machine for the target key

use std::time::{Duration, Instant};

use crate::output::EmissionSink;
use crate::role::KeyRole;
use crate::{Action, Key};

/// Hold duration up to which a lone Target release still counts as a tap
pub const DEFAULT_TIMEOUT_MS: u64 = 600;

/// What an input event is, as far as the engine cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// A keyboard key with its resolved role
    Key(KeyRole),
    /// Any pointer button
    PointerButton,
}

/// Why an emission was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum EmissionReason {
    /// Target pressed and released alone within the timeout
    #[strum(serialize = "tap")]
    Tap,
    /// Companion pressed while Target was held
    #[strum(serialize = "companion chord")]
    CompanionChord,
}

/// Request to inject a press immediately followed by a release of `key`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    pub key: Key,
    pub reason: EmissionReason,
}

/// Mutable session state, owned by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    target_down: bool,
    target_down_since: Option<Instant>,
    tainted: bool,
    modifier_count: u32,
}

impl SessionState {
    pub fn target_down(&self) -> bool {
        self.target_down
    }

    /// When the current hold started; `None` while Target is up
    pub fn target_down_since(&self) -> Option<Instant> {
        self.target_down_since
    }

    pub fn tainted(&self) -> bool {
        self.tainted
    }

    pub fn modifier_count(&self) -> u32 {
        self.modifier_count
    }

    fn begin_hold(&mut self, now: Instant) {
        self.target_down = true;
        self.target_down_since = Some(now);
        self.tainted = false;
    }

    fn end_hold(&mut self) {
        self.target_down = false;
        self.target_down_since = None;
        self.tainted = false;
    }

    fn taint(&mut self) {
        if self.target_down {
            self.tainted = true;
        }
    }
}

/// Tap/hold disambiguation state machine.
///
/// Feed it one classified event at a time, in delivery order. `handle`
/// never fails: events that make no sense in the current state (a release
/// without a press, an extra modifier release) are absorbed as no-ops.
#[derive(Debug, Clone)]
pub struct Engine {
    state: SessionState,
    substitute: Key,
    timeout: Duration,
}

impl Engine {
    /// Create an engine emitting `substitute` with the given tap timeout
    pub fn new(substitute: Key, timeout: Duration) -> Self {
        Self {
            state: SessionState::default(),
            substitute,
            timeout,
        }
    }

    /// Create with the timeout in milliseconds
    pub fn with_timeout_ms(substitute: Key, timeout_ms: u64) -> Self {
        Self::new(substitute, Duration::from_millis(timeout_ms))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn substitute(&self) -> Key {
        self.substitute
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Advance the state machine by one event.
    pub fn handle(&mut self, class: EventClass, action: Action, now: Instant) -> Option<Emission> {
        log::trace!("{:?} {} | before: {:?}", class, action, self.state);

        let emission = match (class, action) {
            (EventClass::Key(KeyRole::Target), Action::Press) => {
                // Autorepeat arrives as a press on some hosts; it must not restart the timer
                if !self.state.target_down {
                    self.state.begin_hold(now);
                }
                None
            }
            // A repeat with no recorded press means the press was missed
            (EventClass::Key(KeyRole::Target), Action::Repeat) => None,
            (EventClass::Key(KeyRole::Target), Action::Release) => self.release_target(now),

            (EventClass::Key(KeyRole::Companion), Action::Press) => {
                if self.state.target_down {
                    Some(self.emit(EmissionReason::CompanionChord))
                } else {
                    None
                }
            }
            (EventClass::Key(KeyRole::Companion), Action::Release) => {
                self.state.taint();
                None
            }
            (EventClass::Key(KeyRole::Companion), Action::Repeat) => None,

            (EventClass::Key(KeyRole::Modifier), Action::Press) => {
                self.state.modifier_count = self.state.modifier_count.saturating_add(1);
                None
            }
            (EventClass::Key(KeyRole::Modifier), Action::Release) => {
                self.state.modifier_count = self.state.modifier_count.saturating_sub(1);
                None
            }
            (EventClass::Key(KeyRole::Modifier), Action::Repeat) => None,

            (EventClass::Key(KeyRole::Other), Action::Press | Action::Repeat)
            | (EventClass::PointerButton, Action::Press | Action::Repeat) => {
                self.state.taint();
                None
            }
            (EventClass::Key(KeyRole::Other), Action::Release)
            | (EventClass::PointerButton, Action::Release) => None,
        };

        log::trace!("{:?} {} | after: {:?}", class, action, self.state);
        emission
    }

    /// Run `handle` and hand any emission to `sink` before returning.
    pub fn dispatch<S>(
        &mut self,
        class: EventClass,
        action: Action,
        now: Instant,
        sink: &mut S,
    ) -> Result<Option<Emission>, S::Error>
    where
        S: EmissionSink + ?Sized,
    {
        let emission = self.handle(class, action, now);
        if let Some(ref emission) = emission {
            sink.emit(emission)?;
        }
        Ok(emission)
    }

    fn release_target(&mut self, now: Instant) -> Option<Emission> {
        if !self.state.target_down {
            return None;
        }

        let mut emission = None;
        if !self.state.tainted && self.state.modifier_count == 0 {
            if let Some(since) = self.state.target_down_since {
                let held = now.saturating_duration_since(since);
                log::debug!(
                    "Target released alone after {} ms (limit {} ms)",
                    held.as_millis(),
                    self.timeout.as_millis()
                );
                if held <= self.timeout {
                    emission = Some(self.emit(EmissionReason::Tap));
                }
            }
        }

        self.state.end_hold();
        emission
    }

    fn emit(&self, reason: EmissionReason) -> Emission {
        log::debug!("Emitting {} ({})", self.substitute, reason);
        Emission {
            key: self.substitute,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    const TARGET: EventClass = EventClass::Key(KeyRole::Target);
    const COMPANION: EventClass = EventClass::Key(KeyRole::Companion);
    const MODIFIER: EventClass = EventClass::Key(KeyRole::Modifier);
    const OTHER: EventClass = EventClass::Key(KeyRole::Other);

    fn substitute() -> Key {
        Key::from(194)
    }

    fn engine() -> Engine {
        Engine::with_timeout_ms(substitute(), DEFAULT_TIMEOUT_MS)
    }

    fn tap() -> Option<Emission> {
        Some(Emission {
            key: substitute(),
            reason: EmissionReason::Tap,
        })
    }

    fn chord() -> Option<Emission> {
        Some(Emission {
            key: substitute(),
            reason: EmissionReason::CompanionChord,
        })
    }

    #[test]
    fn test_quick_tap_emits_on_release() {
        let clock = ManualClock::new();
        let mut engine = engine();

        assert_eq!(engine.handle(TARGET, Action::Press, clock.at_ms(0)), None);
        assert!(engine.state().target_down());
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(300)), tap());
        assert_eq!(*engine.state(), SessionState::default());
    }

    #[test]
    fn test_long_hold_does_not_emit() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(700)), None);
        assert!(!engine.state().target_down());
    }

    #[test]
    fn test_release_exactly_at_timeout_is_a_tap() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(600)), tap());

        engine.handle(TARGET, Action::Press, clock.at_ms(1000));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(1601)), None);
    }

    #[test]
    fn test_companion_press_emits_immediately_and_release_taints() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        assert_eq!(engine.handle(COMPANION, Action::Press, clock.at_ms(50)), chord());
        assert!(!engine.state().tainted());

        assert_eq!(engine.handle(COMPANION, Action::Release, clock.at_ms(60)), None);
        assert!(engine.state().tainted());

        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(100)), None);
        assert!(!engine.state().tainted());
    }

    #[test]
    fn test_release_with_companion_still_held_is_a_tap() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        assert_eq!(engine.handle(COMPANION, Action::Press, clock.at_ms(50)), chord());
        // Companion still down: nothing has tainted the hold yet
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(100)), tap());
        assert_eq!(engine.handle(COMPANION, Action::Release, clock.at_ms(120)), None);
        assert_eq!(*engine.state(), SessionState::default());
    }

    #[test]
    fn test_companion_without_target_is_ignored() {
        let clock = ManualClock::new();
        let mut engine = engine();

        assert_eq!(engine.handle(COMPANION, Action::Press, clock.now()), None);
        assert_eq!(engine.handle(COMPANION, Action::Release, clock.now()), None);
        assert_eq!(*engine.state(), SessionState::default());
    }

    #[test]
    fn test_companion_repeat_does_not_re_emit() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        assert_eq!(engine.handle(COMPANION, Action::Press, clock.at_ms(10)), chord());
        assert_eq!(engine.handle(COMPANION, Action::Repeat, clock.at_ms(300)), None);
    }

    #[test]
    fn test_other_key_taints_hold() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        engine.handle(OTHER, Action::Press, clock.at_ms(20));
        assert!(engine.state().tainted());
        engine.handle(OTHER, Action::Release, clock.at_ms(40));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(80)), None);
    }

    #[test]
    fn test_other_key_before_hold_does_not_taint() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(OTHER, Action::Press, clock.at_ms(0));
        engine.handle(OTHER, Action::Release, clock.at_ms(10));
        assert!(!engine.state().tainted());

        engine.handle(TARGET, Action::Press, clock.at_ms(20));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(90)), tap());
    }

    #[test]
    fn test_autorepeating_other_key_taints() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(OTHER, Action::Press, clock.at_ms(0));
        engine.handle(TARGET, Action::Press, clock.at_ms(10));
        engine.handle(OTHER, Action::Repeat, clock.at_ms(30));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(50)), None);
    }

    #[test]
    fn test_pointer_button_taints_hold() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(EventClass::PointerButton, Action::Press, clock.at_ms(0));
        assert!(!engine.state().tainted());

        engine.handle(TARGET, Action::Press, clock.at_ms(10));
        engine.handle(EventClass::PointerButton, Action::Press, clock.at_ms(20));
        engine.handle(EventClass::PointerButton, Action::Release, clock.at_ms(30));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(40)), None);
    }

    #[test]
    fn test_modifier_held_suppresses_tap() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        engine.handle(MODIFIER, Action::Press, clock.at_ms(10));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(50)), None);
        engine.handle(MODIFIER, Action::Release, clock.at_ms(60));
        assert_eq!(engine.state().modifier_count(), 0);
    }

    #[test]
    fn test_modifier_pressed_before_hold_suppresses_tap() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(MODIFIER, Action::Press, clock.at_ms(0));
        engine.handle(TARGET, Action::Press, clock.at_ms(10));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(50)), None);
    }

    #[test]
    fn test_modifier_released_during_hold_allows_tap() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(MODIFIER, Action::Press, clock.at_ms(0));
        engine.handle(TARGET, Action::Press, clock.at_ms(10));
        engine.handle(MODIFIER, Action::Release, clock.at_ms(20));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(50)), tap());
    }

    #[test]
    fn test_modifier_count_never_negative() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(MODIFIER, Action::Release, clock.now());
        engine.handle(MODIFIER, Action::Release, clock.now());
        assert_eq!(engine.state().modifier_count(), 0);

        engine.handle(MODIFIER, Action::Press, clock.now());
        engine.handle(MODIFIER, Action::Press, clock.now());
        engine.handle(MODIFIER, Action::Repeat, clock.now());
        assert_eq!(engine.state().modifier_count(), 2);
        engine.handle(MODIFIER, Action::Release, clock.now());
        assert_eq!(engine.state().modifier_count(), 1);
    }

    #[test]
    fn test_repeat_does_not_reset_hold_timer() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        engine.handle(TARGET, Action::Repeat, clock.at_ms(300));
        engine.handle(TARGET, Action::Press, clock.at_ms(300));
        assert_eq!(engine.state().target_down_since(), Some(clock.at_ms(0)));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(660)), None);
    }

    #[test]
    fn test_spurious_release_is_noop() {
        let clock = ManualClock::new();
        let mut engine = engine();

        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(0)), None);
        assert_eq!(*engine.state(), SessionState::default());

        engine.handle(TARGET, Action::Press, clock.at_ms(10));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(20)), tap());
    }

    #[test]
    fn test_taint_resets_between_holds() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Press, clock.at_ms(0));
        engine.handle(OTHER, Action::Press, clock.at_ms(5));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(10)), None);

        engine.handle(OTHER, Action::Release, clock.at_ms(15));
        engine.handle(TARGET, Action::Press, clock.at_ms(20));
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(30)), tap());
    }

    #[test]
    fn test_stray_repeat_does_not_start_hold() {
        let clock = ManualClock::new();
        let mut engine = engine();

        engine.handle(TARGET, Action::Repeat, clock.at_ms(0));
        assert!(!engine.state().target_down());
        assert_eq!(engine.handle(TARGET, Action::Release, clock.at_ms(10)), None);
    }
}
