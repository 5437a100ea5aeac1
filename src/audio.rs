use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Sound effects the game asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Cue {
    Click,
    Correct,
    Incorrect,
    Tick,
}

/// Fire-and-forget sound output. Implementations swallow their own failures.
pub trait CueSink: Send {
    fn play(&self, cue: Cue);
}

/// Rings the terminal bell for the cues worth hearing; clicks stay silent
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl CueSink for TerminalBell {
    fn play(&self, cue: Cue) {
        ring(&mut io::stdout(), cue);
    }
}

fn ring<W: Write>(out: &mut W, cue: Cue) {
    if cue == Cue::Click {
        return;
    }
    if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
        tracing::debug!("bell for {cue} failed: {e}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl CueSink for Silent {
    fn play(&self, _cue: Cue) {}
}

/// Keeps every cue it is asked to play, for assertions in tests
#[derive(Debug, Default, Clone)]
pub struct RecordingCues {
    played: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingCues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut p) = self.played.lock() {
            p.clear();
        }
    }
}

impl CueSink for RecordingCues {
    fn play(&self, cue: Cue) {
        if let Ok(mut p) = self.played.lock() {
            p.push(cue);
        }
    }
}

/// A sink gated by the global sound switch
pub struct Audio {
    sink: Box<dyn CueSink>,
    enabled: bool,
}

impl Audio {
    pub fn new(sink: Box<dyn CueSink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(Silent), false)
    }

    pub fn play(&self, cue: Cue) {
        if self.enabled {
            self.sink.play(cue);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl std::fmt::Debug for Audio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Audio")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
