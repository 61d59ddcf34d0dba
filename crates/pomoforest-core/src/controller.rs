//! The focus session component.
//!
//! [`FocusController`] owns the session state machine together with
//! everything its transitions touch: the forest history, the ambient sound,
//! the clock and the celebration hook. Callers feed it [`Command`]s and
//! periodic [`FocusController::check`] calls and render the returned events.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, AudioController, SoundType};
use crate::clock::{to_datetime, Clock};
use crate::events::Event;
use crate::forest::{ForestEntry, HistoryStore};
use crate::storage::KvStore;
use crate::timer::{Session, SessionStatus, Transition, TreeStage};

/// User intents accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    GiveUp,
    Reset,
    SetSound(SoundType),
    ToggleSound,
    SetMuted(bool),
    ToggleMute,
    /// Ask for a [`Snapshot`] without changing anything.
    Refresh,
    /// End the driver loop. The controller itself ignores it.
    Quit,
}

/// One-shot effect fired when a session completes.
pub trait Celebration {
    fn celebrate(&mut self);
}

impl<F: FnMut()> Celebration for F {
    fn celebrate(&mut self) {
        self()
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: SessionStatus,
    pub remaining_secs: u32,
    pub formatted_time: String,
    pub tree_stage: Option<TreeStage>,
    pub tree: Option<String>,
    pub message: String,
    pub sound: SoundType,
    pub sound_label: String,
    pub muted: bool,
    /// Ambient sound indicator.
    pub audible: bool,
    pub forest_size: usize,
}

pub struct FocusController<S: KvStore, B: AudioBackend, C: Clock> {
    session: Session,
    history: HistoryStore<S>,
    audio: AudioController<B>,
    clock: C,
    rng: Box<dyn RngCore>,
    celebration: Box<dyn Celebration>,
}

impl<S: KvStore, B: AudioBackend, C: Clock> FocusController<S, B, C> {
    pub fn new(history: HistoryStore<S>, audio: AudioController<B>, clock: C) -> Self {
        Self {
            session: Session::new(),
            history,
            audio,
            clock,
            rng: Box::new(StdRng::from_entropy()),
            celebration: Box::new(|| {}),
        }
    }

    /// Replace the RNG used for tree placement.
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn with_celebration(mut self, celebration: impl Celebration + 'static) -> Self {
        self.celebration = Box::new(celebration);
        self
    }

    /// Start from a given session instead of a fresh one.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn audio(&self) -> &AudioController<B> {
        &self.audio
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn snapshot(&self) -> Snapshot {
        let status = self.session.status();
        let stage = self.session.tree_stage();
        let sound = self.audio.sound();
        Snapshot {
            status,
            remaining_secs: self.session.remaining_secs(),
            formatted_time: self.session.formatted_time(),
            tree_stage: stage,
            tree: stage.map(|s| s.emoji().to_string()),
            message: status.message().to_string(),
            sound,
            sound_label: sound.label().to_string(),
            muted: self.audio.is_muted(),
            audible: self.audio.is_audible(status),
            forest_size: self.history.len(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn handle(&mut self, command: Command) -> Option<Event> {
        let now = self.clock.now_ms();
        let status = self.session.status();
        match command {
            Command::Start => {
                let transition = self.session.start(now)?;
                Some(self.apply(transition, now))
            }
            Command::Pause => {
                let transition = self.session.pause(now)?;
                Some(self.apply(transition, now))
            }
            Command::GiveUp => {
                let transition = self.session.give_up(now)?;
                Some(self.apply(transition, now))
            }
            Command::Reset => {
                let transition = self.session.reset()?;
                Some(self.apply(transition, now))
            }
            Command::SetSound(sound) => self.change_sound(sound, status, now),
            Command::ToggleSound => self.change_sound(self.audio.sound().toggled(), status, now),
            Command::SetMuted(muted) => self.change_mute(muted, status, now),
            Command::ToggleMute => self.change_mute(!self.audio.is_muted(), status, now),
            Command::Refresh => Some(Event::StateSnapshot(self.snapshot())),
            Command::Quit => None,
        }
    }

    /// Periodic countdown check. Emits `Countdown` when the visible second
    /// changes and `SessionCompleted` once when time runs out.
    pub fn check(&mut self) -> Option<Event> {
        if !self.session.is_running() {
            return None;
        }
        let now = self.clock.now_ms();
        let before = self.session.remaining_secs();
        if let Some(transition) = self.session.check(now) {
            return Some(self.apply(transition, now));
        }
        let remaining = self.session.remaining_secs();
        (remaining != before).then(|| Event::Countdown {
            remaining_secs: remaining,
            formatted_time: self.session.formatted_time(),
            at: to_datetime(now),
        })
    }

    /// Stop side effects for teardown.
    pub fn shutdown(&mut self) {
        self.audio.stop();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, transition: Transition, now: u64) -> Event {
        let status = self.session.status();
        let at = to_datetime(now);
        debug!(?transition, %status, remaining = self.session.remaining_secs(), "session transition");
        match transition {
            Transition::Started => {
                self.audio.start_from_user(status);
                Event::SessionStarted {
                    remaining_secs: self.session.remaining_secs(),
                    at,
                }
            }
            Transition::Resumed => {
                self.audio.start_from_user(status);
                Event::SessionResumed {
                    remaining_secs: self.session.remaining_secs(),
                    at,
                }
            }
            Transition::Paused => {
                self.audio.sync(status);
                Event::SessionPaused {
                    remaining_secs: self.session.remaining_secs(),
                    at,
                }
            }
            Transition::GaveUp => {
                self.audio.sync(status);
                Event::SessionFailed {
                    elapsed_secs: self.session.elapsed_secs(),
                    at,
                }
            }
            Transition::Reset => {
                self.audio.sync(status);
                Event::SessionReset { at }
            }
            Transition::Completed => self.complete(now),
        }
    }

    fn complete(&mut self, now: u64) -> Event {
        self.audio.sync(self.session.status());
        let entry = ForestEntry::plant(&mut *self.rng, now);
        if let Err(err) = self.history.append(entry.clone()) {
            warn!("failed to persist forest history: {err}");
        }
        self.celebration.celebrate();
        info!(trees = self.history.len(), "focus session completed");
        Event::SessionCompleted {
            entry,
            forest_size: self.history.len(),
            at: to_datetime(now),
        }
    }

    fn change_sound(&mut self, sound: SoundType, status: SessionStatus, now: u64) -> Option<Event> {
        self.audio.set_sound(sound, status).then(|| Event::SoundChanged {
            sound,
            at: to_datetime(now),
        })
    }

    fn change_mute(&mut self, muted: bool, status: SessionStatus, now: u64) -> Option<Event> {
        self.audio.set_muted(muted, status).then(|| Event::MuteChanged {
            muted,
            at: to_datetime(now),
        })
    }
}

impl<S: KvStore, B: AudioBackend, C: Clock> Drop for FocusController<S, B, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentPlayer;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use crate::timer::FOCUS_DURATION_SECS;
    use rand_pcg::Pcg64;
    use std::cell::Cell;
    use std::rc::Rc;

    const T0: u64 = 1_700_000_000_000;

    type TestController = FocusController<MemoryStore, SilentPlayer, ManualClock>;

    fn controller(clock: &ManualClock) -> TestController {
        let history = HistoryStore::load(MemoryStore::new());
        let audio = AudioController::new(SilentPlayer::new(), "/sounds", SoundType::Rain, false);
        FocusController::new(history, audio, clock.clone()).with_rng(Pcg64::seed_from_u64(3))
    }

    #[test]
    fn start_begins_countdown_and_audio() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        let event = c.handle(Command::Start).unwrap();
        assert!(matches!(event, Event::SessionStarted { remaining_secs: 1500, .. }));
        assert!(c.is_running());
        assert!(c.audio().backend().is_playing());
        assert!(c.snapshot().audible);
    }

    #[test]
    fn start_while_muted_stays_silent() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        c.handle(Command::SetMuted(true));
        c.handle(Command::Start);
        assert!(!c.audio().backend().is_playing());
        assert!(!c.snapshot().audible);
    }

    #[test]
    fn pause_stops_audio_and_resume_restarts_it() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        c.handle(Command::Start);
        clock.advance_ms(61_000);
        let event = c.handle(Command::Pause).unwrap();
        assert!(matches!(event, Event::SessionPaused { remaining_secs: 1439, .. }));
        assert!(!c.audio().backend().is_playing());

        clock.advance_ms(600_000);
        let event = c.handle(Command::Start).unwrap();
        assert!(matches!(event, Event::SessionResumed { remaining_secs: 1439, .. }));
        assert!(c.audio().backend().is_playing());
    }

    #[test]
    fn countdown_events_only_on_second_changes() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        c.handle(Command::Start);
        clock.advance_ms(200);
        assert!(c.check().is_none());
        clock.advance_ms(800);
        match c.check() {
            Some(Event::Countdown {
                remaining_secs,
                formatted_time,
                ..
            }) => {
                assert_eq!(remaining_secs, 1499);
                assert_eq!(formatted_time, "24:59");
            }
            other => panic!("expected Countdown, got {other:?}"),
        }
    }

    #[test]
    fn completion_plants_one_tree_and_celebrates_once() {
        let clock = ManualClock::at(T0);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut c = controller(&clock).with_celebration(move || counter.set(counter.get() + 1));

        c.handle(Command::Start);
        clock.advance_ms(u64::from(FOCUS_DURATION_SECS) * 1000);
        let event = c.check().unwrap();
        match event {
            Event::SessionCompleted {
                entry, forest_size, ..
            } => {
                assert_eq!(forest_size, 1);
                assert_eq!(entry.id, (T0 + 1_500_000) as i64);
            }
            other => panic!("expected SessionCompleted, got {other:?}"),
        }
        assert_eq!(c.session().status(), SessionStatus::Completed);
        assert_eq!(c.session().remaining_secs(), 0);
        assert!(!c.audio().backend().is_playing());

        clock.advance_ms(10_000);
        assert!(c.check().is_none());
        assert_eq!(fired.get(), 1);
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn newest_tree_comes_first() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        for _ in 0..2 {
            c.handle(Command::Start);
            clock.advance_ms(1_500_000);
            c.check();
            c.handle(Command::Reset);
        }
        let ids: Vec<_> = c.history().entries().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] > ids[1]);
    }

    #[test]
    fn give_up_wilts_without_planting() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        c.handle(Command::Start);
        clock.advance_ms(300_000);
        let event = c.handle(Command::GiveUp).unwrap();
        assert!(matches!(event, Event::SessionFailed { elapsed_secs: 300, .. }));
        let snap = c.snapshot();
        assert_eq!(snap.tree_stage, Some(TreeStage::Wilted));
        assert_eq!(snap.message, "Try Again");
        assert_eq!(snap.forest_size, 0);
        assert!(!c.audio().backend().is_playing());
    }

    #[test]
    fn terminal_state_ignores_non_reset_commands() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        c.handle(Command::Start);
        c.handle(Command::GiveUp);
        assert!(c.handle(Command::Start).is_none());
        assert!(c.handle(Command::Pause).is_none());
        assert!(c.handle(Command::GiveUp).is_none());
        assert_eq!(c.session().status(), SessionStatus::Failed);

        assert!(matches!(c.handle(Command::Reset), Some(Event::SessionReset { .. })));
        let snap = c.snapshot();
        assert_eq!(snap.status, SessionStatus::Idle);
        assert_eq!(snap.formatted_time, "25:00");
        assert_eq!(snap.tree, None);
    }

    #[test]
    fn sound_and_mute_toggles_report_changes() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        c.handle(Command::Start);
        assert!(matches!(
            c.handle(Command::ToggleSound),
            Some(Event::SoundChanged { sound: SoundType::Fire, .. })
        ));
        assert!(c.audio().backend().is_playing());
        assert!(c.handle(Command::SetSound(SoundType::Fire)).is_none());

        assert!(matches!(
            c.handle(Command::ToggleMute),
            Some(Event::MuteChanged { muted: true, .. })
        ));
        assert!(!c.audio().backend().is_playing());
        assert_eq!(c.snapshot().sound_label, "Fireplace");
    }

    #[test]
    fn refresh_returns_snapshot() {
        let clock = ManualClock::at(T0);
        let mut c = controller(&clock);
        match c.handle(Command::Refresh) {
            Some(Event::StateSnapshot(snap)) => {
                assert_eq!(snap.status, SessionStatus::Idle);
                assert_eq!(snap.message, "Plant a seed of focus");
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
        assert!(c.handle(Command::Quit).is_none());
    }
}
