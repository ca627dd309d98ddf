use std::ops::{Deref, DerefMut};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    /// One clock period elapsed while the tick schedule was armed.
    Tick,
    /// Nothing happened while the tick schedule was disarmed.
    Idle,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(GameEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(GameEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
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

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
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

/// Single-threaded event pump.
///
/// Input events and clock ticks come out of the same `step` call, so a tick
/// can never land in the middle of handling an input event. Ticks are
/// deadline based: input arriving between ticks does not push the next tick
/// back.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Option<Instant>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            next_tick: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Start emitting ticks, the first one a full interval from now.
    /// Re-arming a running schedule keeps its deadline.
    pub fn arm(&mut self) {
        if self.next_tick.is_none() {
            self.next_tick = Some(Instant::now() + self.ticker.interval());
        }
    }

    pub fn disarm(&mut self) {
        self.next_tick = None;
    }

    pub fn set_armed(&mut self, armed: bool) {
        if armed {
            self.arm();
        } else {
            self.disarm();
        }
    }

    /// Arm the schedule for the lifetime of the returned guard.
    pub fn schedule(&mut self) -> TickSchedule<'_, E, T> {
        self.arm();
        TickSchedule { runner: self }
    }

    /// Block until the next input event or tick deadline.
    pub fn step(&mut self) -> GameEvent {
        let interval = self.ticker.interval();
        match self.next_tick {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                // an overdue tick goes ahead of queued input
                if !timeout.is_zero() {
                    match self.event_source.recv_timeout(timeout) {
                        Ok(ev) => return ev,
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => std::thread::sleep(timeout),
                    }
                }
                self.next_tick = Some(deadline + interval);
                GameEvent::Tick
            }
            None => match self.event_source.recv_timeout(interval) {
                Ok(ev) => ev,
                Err(RecvTimeoutError::Timeout) => GameEvent::Idle,
                Err(RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(interval);
                    GameEvent::Idle
                }
            },
        }
    }
}

/// Scoped hold on the tick schedule. Dropping it disarms the runner, so no
/// tick can outlive the loop that owns it, whichever way that loop exits.
pub struct TickSchedule<'a, E: EventSource, T: Ticker> {
    runner: &'a mut Runner<E, T>,
}

impl<E: EventSource, T: Ticker> Deref for TickSchedule<'_, E, T> {
    type Target = Runner<E, T>;

    fn deref(&self) -> &Self::Target {
        self.runner
    }
}

impl<E: EventSource, T: Ticker> DerefMut for TickSchedule<'_, E, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.runner
    }
}

impl<E: EventSource, T: Ticker> Drop for TickSchedule<'_, E, T> {
    fn drop(&mut self) {
        self.runner.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    fn runner(
        interval_ms: u64,
    ) -> (
        mpsc::Sender<GameEvent>,
        Runner<TestEventSource, FixedTicker>,
    ) {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(interval_ms)),
        );
        (tx, runner)
    }

    #[test]
    fn step_returns_tick_when_armed() {
        let (_tx, mut runner) = runner(1);
        runner.arm();

        // With no events available, step should yield Tick
        match runner.step() {
            GameEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_returns_idle_when_disarmed() {
        let (_tx, mut runner) = runner(1);
        match runner.step() {
            GameEvent::Idle => {}
            other => panic!("expected Idle, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, mut runner) = runner(10);
        tx.send(GameEvent::Resize).unwrap();
        tx.send(GameEvent::Key(KeyEvent::new(
            KeyCode::Enter,
            KeyModifiers::NONE,
        )))
        .unwrap();
        runner.arm();

        assert!(matches!(runner.step(), GameEvent::Resize));
        assert!(matches!(runner.step(), GameEvent::Key(k) if k.code == KeyCode::Enter));
    }

    #[test]
    fn ticks_keep_their_deadline_under_input() {
        let (tx, mut runner) = runner(50);
        runner.arm();
        for _ in 0..5 {
            tx.send(GameEvent::Resize).unwrap();
        }
        let start = Instant::now();
        let mut events = 0;
        loop {
            match runner.step() {
                GameEvent::Tick => break,
                _ => events += 1,
            }
        }
        assert_eq!(events, 5);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn disconnected_source_still_ticks() {
        let (tx, mut runner) = runner(1);
        drop(tx);
        runner.arm();
        assert!(matches!(runner.step(), GameEvent::Tick));
    }

    #[test]
    fn schedule_guard_disarms_on_drop() {
        let (_tx, mut runner) = runner(1);
        {
            let mut schedule = runner.schedule();
            assert!(schedule.is_armed());
            assert!(matches!(schedule.step(), GameEvent::Tick));
        }
        assert!(!runner.is_armed());
    }

    #[test]
    fn schedule_guard_disarms_on_early_exit() {
        fn run(runner: &mut Runner<TestEventSource, FixedTicker>) -> Result<(), String> {
            let mut schedule = runner.schedule();
            if let GameEvent::Tick = schedule.step() {
                return Err("bail".into());
            }
            Ok(())
        }

        let (_tx, mut runner) = runner(1);
        assert!(run(&mut runner).is_err());
        assert!(!runner.is_armed());
    }

    #[test]
    fn set_armed_toggles() {
        let (_tx, mut runner) = runner(5);
        runner.set_armed(true);
        assert!(runner.is_armed());
        runner.set_armed(false);
        assert!(!runner.is_armed());
    }
}
