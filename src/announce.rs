//! Speech and sound cues fired by the app when a game changes state.
//!
//! Engines stay pure: the app diffs their `Progress` before and after each
//! operation and hands the resulting cues to an `Announcer`.

use crate::carousel::GameKind;
use crate::engine::Progress;
use std::io::Write;
use std::time::{Duration, Instant};

/// How long a spoken line stays on screen.
const CAPTION_TTL: Duration = Duration::from_millis(3000);
/// Runner plays a chirp every this many points.
const RUNNER_MILESTONE: u32 = 100;

/// Fire-and-forget side effects. A new utterance cancels the one in flight.
pub trait Announcer {
    fn speak(&mut self, text: &str);
    fn play_tone(&mut self, freq_hz: u32, duration: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Speak(&'static str),
    Tone { freq_hz: u32, duration: Duration },
}

impl Cue {
    const fn tone(freq_hz: u32, ms: u64) -> Self {
        Self::Tone {
            freq_hz,
            duration: Duration::from_millis(ms),
        }
    }

    pub fn play(&self, announcer: &mut dyn Announcer) {
        match *self {
            Self::Speak(text) => announcer.speak(text),
            Self::Tone { freq_hz, duration } => announcer.play_tone(freq_hz, duration),
        }
    }
}

fn farewell(kind: GameKind) -> &'static str {
    match kind {
        GameKind::Runner => "Ooh know! Game over!",
        GameKind::Snake | GameKind::Tetris => "Game over!",
    }
}

/// Cues for one state change of a game of `kind`.
pub fn cues(kind: GameKind, before: Progress, after: Progress) -> Vec<Cue> {
    let mut out = Vec::new();
    if after.status.is_game_over() && !before.status.is_game_over() {
        out.push(Cue::Speak(farewell(kind)));
        return out;
    }
    match kind {
        GameKind::Snake if after.score > before.score => out.push(Cue::tone(660, 80)),
        GameKind::Tetris if after.lines > before.lines => {
            // Higher chirp for multi-line clears.
            let extra = (after.lines - before.lines).saturating_sub(1);
            out.push(Cue::tone(880 + 110 * extra, 120));
        }
        GameKind::Runner
            if after.score / RUNNER_MILESTONE > before.score / RUNNER_MILESTONE =>
        {
            out.push(Cue::tone(990, 60));
        }
        _ => {}
    }
    out
}

/// Terminal announcer: speech becomes an on-screen caption, tones ring the bell.
#[derive(Debug, Default)]
pub struct Herald {
    caption: Option<(String, Instant)>,
    muted: bool,
}

impl Herald {
    pub fn new(muted: bool) -> Self {
        Self {
            caption: None,
            muted,
        }
    }

    /// Current caption, if it has not expired yet.
    pub fn caption(&self, now: Instant) -> Option<&str> {
        self.caption
            .as_ref()
            .filter(|(_, at)| now.saturating_duration_since(*at) < CAPTION_TTL)
            .map(|(text, _)| text.as_str())
    }

    pub fn hush(&mut self) {
        self.caption = None;
    }
}

impl Announcer for Herald {
    fn speak(&mut self, text: &str) {
        if let Some((old, _)) = self.caption.take() {
            log::debug!("cancelled utterance {old:?}");
        }
        log::info!("speak: {text}");
        self.caption = Some((text.to_string(), Instant::now()));
    }

    fn play_tone(&mut self, freq_hz: u32, duration: Duration) {
        log::debug!("tone {freq_hz} Hz for {} ms", duration.as_millis());
        if self.muted {
            return;
        }
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
            log::warn!("bell failed: {e}");
        }
    }
}
