use std::io::Write;

use crate::controller::CueEmitter;
use crate::pattern::BreathingPhase;

/// Rings the terminal bell on phase changes, twice when a full cycle wraps.
/// Write failures are dropped; a missed cue must not disturb the poll loop.
#[derive(Debug, Default)]
pub struct BellCue;

impl CueEmitter for BellCue {
    fn on_phase_transition(&mut self, _phase: &BreathingPhase) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn on_cycle_complete(&mut self, _completed_cycles: u64) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07\x07");
        let _ = out.flush();
    }
}

/// No-op emitter for --silent runs and headless drivers
#[derive(Debug, Default)]
pub struct SilentCue;

impl CueEmitter for SilentCue {
    fn on_phase_transition(&mut self, _phase: &BreathingPhase) {}

    fn on_cycle_complete(&mut self, _completed_cycles: u64) {}
}
