use std::time::Duration;

/// Remaining seconds at or below which each tick is announced
pub const LOW_TIME_SECS: u32 = 5;

const ONE_SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One whole second elapsed
    Tick { seconds_left: u32, low: bool },
    /// Reached zero while running; the countdown is stopped
    Expired,
}

/// Identity of one armed countdown. Any reset or stop invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

/// Per-question countdown driven by elapsed wall-clock time.
///
/// The countdown never schedules anything on its own; the owner feeds it
/// elapsed time through [`Countdown::advance`]. Every reset or stop bumps the
/// generation so a handle taken earlier stops matching.
#[derive(Debug, Clone)]
pub struct Countdown {
    seconds_left: u32,
    running: bool,
    carry: Duration,
    generation: u64,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            seconds_left: seconds,
            running: false,
            carry: Duration::ZERO,
            generation: 0,
        }
    }

    /// Stop and rewind to `seconds`
    pub fn reset(&mut self, seconds: u32) {
        self.seconds_left = seconds;
        self.running = false;
        self.carry = Duration::ZERO;
        self.generation += 1;
    }

    pub fn start(&mut self) -> TimerHandle {
        self.running = true;
        self.carry = Duration::ZERO;
        TimerHandle(self.generation)
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.carry = Duration::ZERO;
        self.generation += 1;
    }

    /// Change the remaining time without touching the running state
    pub fn set_seconds_left(&mut self, seconds: u32) {
        self.seconds_left = seconds;
        self.carry = Duration::ZERO;
    }

    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.running && handle.0 == self.generation
    }

    pub fn advance(&mut self, elapsed: Duration) -> Vec<CountdownEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        if self.seconds_left == 0 {
            self.stop();
            events.push(CountdownEvent::Expired);
            return events;
        }

        self.carry += elapsed;
        while self.carry >= ONE_SECOND {
            self.carry -= ONE_SECOND;
            self.seconds_left = self.seconds_left.saturating_sub(1);
            if self.seconds_left == 0 {
                self.stop();
                events.push(CountdownEvent::Expired);
                break;
            }
            events.push(CountdownEvent::Tick {
                seconds_left: self.seconds_left,
                low: self.seconds_left <= LOW_TIME_SECS,
            });
        }
        events
    }
}
