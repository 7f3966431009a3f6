use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::trace;

/// User intent forwarded by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Select(usize),
    Submit,
    Advance,
    /// Submit if the question is still open, otherwise advance.
    Next,
    Abandon,
}

/// Unified event type consumed by the quiz driver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizEvent {
    Command(Command),
    Tick,
}

/// Source of quiz events (commands and timer ticks)
pub trait QuizEventSource {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Event source fed through an mpsc channel
pub struct ChannelEventSource {
    rx: Receiver<QuizEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
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

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// The scheduling contract a quiz needs from its host.
pub trait Timer {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Cancellable periodic task that sends `QuizEvent::Tick` into a channel.
///
/// A tick already in flight when `stop` is called may still arrive; the
/// session ignores it.
pub struct IntervalTimer<T: Ticker> {
    tx: Sender<QuizEvent>,
    ticker: T,
    cancel: Option<Arc<AtomicBool>>,
}

impl<T: Ticker + Clone> IntervalTimer<T> {
    pub fn new(tx: Sender<QuizEvent>, ticker: T) -> Self {
        Self {
            tx,
            ticker,
            cancel: None,
        }
    }
}

impl<T: Ticker + Clone> Timer for IntervalTimer<T> {
    fn start(&mut self) {
        // restart resets the phase of the tick
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let ticker = self.ticker.clone();

        thread::spawn(move || loop {
            thread::sleep(ticker.interval());
            if cancelled.load(Ordering::Acquire) {
                break;
            }
            trace!("tick");
            if tx.send(QuizEvent::Tick).is_err() {
                break;
            }
        });

        self.cancel = Some(cancel);
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Release);
        }
    }

    fn is_running(&self) -> bool {
        self.cancel.is_some()
    }
}

impl<T: Ticker> Drop for IntervalTimer<T> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Release);
        }
    }
}

/// Timer for hosts that deliver ticks themselves; it only tracks calls.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer {
    running: bool,
    pub starts: usize,
    pub stops: usize,
}

impl Timer for ManualTimer {
    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// Runner that hands the driver one event at a time
pub struct Runner<E: QuizEventSource> {
    event_source: E,
    idle_timeout: Duration,
}

impl<E: QuizEventSource> Runner<E> {
    pub fn new(event_source: E, idle_timeout: Duration) -> Self {
        Self {
            event_source,
            idle_timeout,
        }
    }

    /// Blocks up to the idle timeout; `None` when nothing arrived or the source closed
    pub fn step(&self) -> Option<QuizEvent> {
        match self.event_source.recv_timeout(self.idle_timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
