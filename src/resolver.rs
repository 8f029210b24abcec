use crate::pattern::BreathingPattern;

/// What one poll resolved to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollResult {
    pub phase_index: usize,
    /// Progress through the current phase, 0 to 1
    pub phase_fraction: f64,
    /// How many full cycles lie behind the current instant
    pub cycle_index: u64,
    /// True on the first poll that lands in a new phase or cycle
    pub transitioned: bool,
}

/// Maps total active time onto the repeating pattern. Remembers the previous
/// poll so a phase change is reported exactly once no matter how often the
/// host polls.
#[derive(Debug, Default)]
pub struct PhaseResolver {
    previous: Option<(usize, u64)>,
}

impl PhaseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous poll, so the next one reports a transition again
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn poll(&mut self, pattern: &BreathingPattern, total_elapsed: f64) -> PollResult {
        let cycle_secs = pattern.total_cycle_secs();
        let elapsed = total_elapsed.max(0.0);

        let cycle_index = (elapsed / cycle_secs).floor() as u64;
        let within_cycle = elapsed - cycle_index as f64 * cycle_secs;
        let (phase_index, phase_local) = pattern.resolve_phase_at(within_cycle);

        let phase_secs = pattern.phases()[phase_index].duration_secs as f64;
        let phase_fraction = (phase_local / phase_secs).clamp(0.0, 1.0);

        // Entering the very first phase counts as a transition too
        let transitioned = match self.previous {
            None => true,
            Some((prev_phase, prev_cycle)) => {
                prev_phase != phase_index || prev_cycle != cycle_index
            }
        };
        self.previous = Some((phase_index, cycle_index));

        PollResult {
            phase_index,
            phase_fraction,
            cycle_index,
            transitioned,
        }
    }
}
