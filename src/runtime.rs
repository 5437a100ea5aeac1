use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::feedback::{Feedback, FeedbackProvider};
use crate::game::{FeedbackTicket, QuestionToken};

/// Interval between ticks when no input arrives
pub const TICK_RATE_MS: u64 = 100;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A feedback provider finished for the question tagged `token`
    Feedback {
        token: QuestionToken,
        feedback: Feedback,
    },
}

/// Source of events (keyboard, resize, resolved feedback)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source reading the terminal on a background thread
pub struct CrosstermEventSource {
    tx: Sender<GameEvent>,
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input = tx.clone();

        std::thread::spawn(move || loop {
            let sent = match event::read() {
                // Windows reports both press and release
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    input.send(GameEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => input.send(GameEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    debug!("terminal input closed: {e}");
                    break;
                }
            };
            if sent.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    /// Handle for posting events from worker threads
    pub fn sender(&self) -> Sender<GameEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-backed event source for tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}

/// Resolve `ticket` on a worker thread and post the result back as an event.
///
/// Nothing waits on the thread. If the receiver is gone the result is dropped.
pub fn spawn_feedback(
    provider: Arc<dyn FeedbackProvider>,
    ticket: FeedbackTicket,
    tx: Sender<GameEvent>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let feedback = provider.feedback(&ticket.request);
        let _ = tx.send(GameEvent::Feedback {
            token: ticket.token,
            feedback,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{Answer, FeedbackRequest, LocalFeedback};
    use crate::game::Game;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

        match runner.step() {
            GameEvent::Resize => {}
            other => panic!("expected Resize event, got {other:?}"),
        }
    }

    #[test]
    fn default_ticker_uses_tick_rate() {
        assert_eq!(
            FixedTicker::default().interval(),
            Duration::from_millis(TICK_RATE_MS)
        );
    }

    #[test]
    fn spawned_feedback_arrives_as_event() {
        use crate::audio::Audio;
        use crate::difficulty::Difficulty;
        use crate::store::MemoryStore;
        use rand::{rngs::StdRng, SeedableRng};

        let mut game = Game::new(
            Difficulty::Easy,
            Box::new(MemoryStore::new()),
            Audio::silent(),
            StdRng::seed_from_u64(3),
        );
        game.start_game();
        let q = game.current_question().unwrap();
        let ticket = game.submit_answer(&q.result.to_string()).unwrap();
        assert_eq!(
            ticket.request,
            FeedbackRequest {
                a: q.a,
                b: q.b,
                is_correct: true,
                answer: Answer::Given(q.result.to_string()),
            }
        );

        let (tx, rx) = mpsc::channel();
        let provider: Arc<dyn FeedbackProvider> = Arc::new(LocalFeedback::seeded(1));
        spawn_feedback(provider, ticket.clone(), tx).join().unwrap();

        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::default());
        match runner.step() {
            GameEvent::Feedback { token, feedback } => {
                assert_eq!(token, ticket.token);
                assert!(!feedback.message.is_empty());
                assert!(game.resolve_feedback(token, feedback));
            }
            other => panic!("expected Feedback event, got {other:?}"),
        }
    }
}
