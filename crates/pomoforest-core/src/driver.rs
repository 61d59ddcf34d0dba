//! Async event loop around a [`FocusController`].
//!
//! A single task multiplexes user commands with the countdown check. The
//! check interval only exists while the session is running: it is created on
//! entry to `Running` and dropped on every exit, so nothing can touch the
//! session after it stops or after the loop ends.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::debug;

use crate::audio::AudioBackend;
use crate::clock::Clock;
use crate::controller::{Command, FocusController, Snapshot};
use crate::events::Event;
use crate::storage::KvStore;

/// Run until `Command::Quit` arrives or every command sender is dropped.
///
/// `on_event` sees each event together with the state right after it.
pub async fn run<S, B, C, F>(
    controller: &mut FocusController<S, B, C>,
    mut commands: mpsc::Receiver<Command>,
    mut on_event: F,
    poll: Duration,
) where
    S: KvStore,
    B: AudioBackend,
    C: Clock,
    F: FnMut(&Event, &Snapshot),
{
    let mut ticker: Option<Interval> = None;

    loop {
        sync_ticker(&mut ticker, controller.is_running(), poll);

        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Quit) => break,
                Some(command) => {
                    if let Some(event) = controller.handle(command) {
                        on_event(&event, &controller.snapshot());
                    }
                }
            },
            () = next_tick(&mut ticker) => {
                if let Some(event) = controller.check() {
                    on_event(&event, &controller.snapshot());
                }
            }
        }
    }

    ticker.take();
    controller.shutdown();
    debug!("driver loop finished");
}

fn sync_ticker(ticker: &mut Option<Interval>, running: bool, poll: Duration) {
    match (ticker.is_some(), running) {
        (false, true) => {
            let mut fresh = interval(poll);
            fresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(fresh);
            debug!(?poll, "countdown check scheduled");
        }
        (true, false) => {
            *ticker = None;
            debug!("countdown check cancelled");
        }
        _ => {}
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioController, SilentPlayer, SoundType};
    use crate::clock::TokioClock;
    use crate::forest::HistoryStore;
    use crate::storage::MemoryStore;
    use crate::timer::{Session, SessionStatus};

    fn controller() -> FocusController<MemoryStore, SilentPlayer, TokioClock> {
        let history = HistoryStore::load(MemoryStore::new());
        let audio = AudioController::new(SilentPlayer::new(), "/sounds", SoundType::Rain, false);
        FocusController::new(history, audio, TokioClock::new())
    }

    #[tokio::test(start_paused = true)]
    async fn short_session_completes_and_stops_polling() {
        let mut c = controller().with_session(Session::resume_from(3));
        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::Start).await.unwrap();

        let quitter = async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            tx.send(Command::Quit).await.unwrap();
        };

        let mut seen = Vec::new();
        let driver = run(
            &mut c,
            rx,
            |event, snap| seen.push((event.clone(), snap.status)),
            Duration::from_millis(200),
        );
        tokio::join!(driver, quitter);

        assert!(matches!(seen.first(), Some((Event::SessionResumed { .. }, SessionStatus::Running))));
        let completions = seen
            .iter()
            .filter(|(e, _)| matches!(e, Event::SessionCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(matches!(seen.last(), Some((Event::SessionCompleted { .. }, SessionStatus::Completed))));
        assert_eq!(c.session().remaining_secs(), 0);
        assert_eq!(c.history().len(), 1);
        assert!(!c.audio().backend().is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_the_countdown() {
        let mut c = controller();
        let (tx, rx) = mpsc::channel(8);

        let script = async move {
            tx.send(Command::Start).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            tx.send(Command::Pause).await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            // Dropping the sender ends the loop.
        };

        let mut countdowns = Vec::new();
        let driver = run(
            &mut c,
            rx,
            |event, _| {
                if let Event::Countdown { remaining_secs, .. } = event {
                    countdowns.push(*remaining_secs);
                }
            },
            Duration::from_millis(200),
        );
        tokio::join!(driver, script);

        assert_eq!(c.session().status(), SessionStatus::Paused);
        assert_eq!(c.session().remaining_secs(), 1498);
        assert_eq!(countdowns, vec![1499, 1498]);
    }
}
