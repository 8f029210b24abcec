use thiserror::Error;

/// What the breather should be doing during a phase
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::Display)]
pub enum PhaseKind {
    Inhale,
    Hold,
    Exhale,
    Rest,
    #[strum(to_string = "{0}")]
    Custom(String),
}

/// One segment of a breathing cycle with a fixed length
#[derive(Debug, Clone, PartialEq)]
pub struct BreathingPhase {
    pub kind: PhaseKind,
    pub duration_secs: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("a breathing pattern needs at least one phase")]
    Empty,
    #[error("phase `{0}` must last at least one second")]
    ZeroDurationPhase(String),
    #[error("could not parse `{0}` as a phase length")]
    BadPhaseLength(String),
    #[error("expected between 1 and 4 dash-separated phase lengths, got {0}")]
    UnsupportedShape(usize),
}

/// The ordered, repeating sequence of phases making up one breathing cycle
#[derive(Debug, Clone, PartialEq)]
pub struct BreathingPattern {
    name: String,
    phases: Vec<BreathingPhase>,
}

impl BreathingPattern {
    pub fn new(name: impl Into<String>, phases: Vec<BreathingPhase>) -> Result<Self, PatternError> {
        if phases.is_empty() {
            return Err(PatternError::Empty);
        }
        if let Some(phase) = phases.iter().find(|p| p.duration_secs == 0) {
            return Err(PatternError::ZeroDurationPhase(phase.kind.to_string()));
        }
        Ok(Self {
            name: name.into(),
            phases,
        })
    }

    /// Parse a `4-7-8` style dash string. The number of lengths picks the
    /// phase kinds: 1 = inhale only, 2 = inhale/exhale, 3 = inhale/hold/exhale,
    /// 4 = inhale/hold/exhale/rest.
    pub fn from_dash_string(input: &str) -> Result<Self, PatternError> {
        let lengths = input
            .split('-')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|_| PatternError::BadPhaseLength(part.trim().to_string()))
            })
            .collect::<Result<Vec<u32>, PatternError>>()?;

        let kinds: &[PhaseKind] = match lengths.len() {
            1 => &[PhaseKind::Inhale],
            2 => &[PhaseKind::Inhale, PhaseKind::Exhale],
            3 => &[PhaseKind::Inhale, PhaseKind::Hold, PhaseKind::Exhale],
            4 => &[
                PhaseKind::Inhale,
                PhaseKind::Hold,
                PhaseKind::Exhale,
                PhaseKind::Rest,
            ],
            n => return Err(PatternError::UnsupportedShape(n)),
        };

        let phases = kinds
            .iter()
            .zip(lengths.iter())
            .map(|(kind, secs)| BreathingPhase {
                kind: kind.clone(),
                duration_secs: *secs,
            })
            .collect();

        BreathingPattern::new(input.trim().to_string(), phases)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phases(&self) -> &[BreathingPhase] {
        &self.phases
    }

    pub fn total_cycle_secs(&self) -> f64 {
        self.phases
            .iter()
            .map(|p| p.duration_secs as f64)
            .sum()
    }

    /// Attribute an instant within one cycle to a phase. Intervals are
    /// half-open [start, end): a boundary instant belongs to the phase that
    /// starts there. Input outside [0, total_cycle_secs) is clamped; callers
    /// reduce via modulo first.
    pub fn resolve_phase_at(&self, elapsed_within_cycle: f64) -> (usize, f64) {
        let t = elapsed_within_cycle.clamp(0.0, self.total_cycle_secs());
        let mut start = 0.0;
        for (idx, phase) in self.phases.iter().enumerate() {
            let end = start + phase.duration_secs as f64;
            if t < end {
                return (idx, t - start);
            }
            start = end;
        }
        // t landed exactly on the cycle end, which wraps to the first phase
        (0, 0.0)
    }
}

/// Box breathing with four equal sides. The classic length is 4 seconds,
/// up to 7 for practiced breathers.
pub fn box_breathing(side_secs: u32) -> Result<BreathingPattern, PatternError> {
    BreathingPattern::new(
        format!("box {0}-{0}-{0}-{0}", side_secs),
        vec![
            BreathingPhase {
                kind: PhaseKind::Inhale,
                duration_secs: side_secs,
            },
            BreathingPhase {
                kind: PhaseKind::Hold,
                duration_secs: side_secs,
            },
            BreathingPhase {
                kind: PhaseKind::Exhale,
                duration_secs: side_secs,
            },
            BreathingPhase {
                kind: PhaseKind::Rest,
                duration_secs: side_secs,
            },
        ],
    )
}

/// The 4-7-8 relaxing breath
pub fn four_seven_eight() -> BreathingPattern {
    BreathingPattern {
        name: "4-7-8".to_string(),
        phases: vec![
            BreathingPhase {
                kind: PhaseKind::Inhale,
                duration_secs: 4,
            },
            BreathingPhase {
                kind: PhaseKind::Hold,
                duration_secs: 7,
            },
            BreathingPhase {
                kind: PhaseKind::Exhale,
                duration_secs: 8,
            },
        ],
    }
}

/// Long-exhale 6-2-8 variant for winding down
pub fn relaxing_breath() -> BreathingPattern {
    BreathingPattern {
        name: "relax 6-2-8".to_string(),
        phases: vec![
            BreathingPhase {
                kind: PhaseKind::Inhale,
                duration_secs: 6,
            },
            BreathingPhase {
                kind: PhaseKind::Hold,
                duration_secs: 2,
            },
            BreathingPhase {
                kind: PhaseKind::Exhale,
                duration_secs: 8,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_rejected() {
        assert_eq!(
            BreathingPattern::new("empty", vec![]).unwrap_err(),
            PatternError::Empty
        );
    }

    #[test]
    fn test_zero_duration_phase_rejected() {
        let err = BreathingPattern::new(
            "bad",
            vec![
                BreathingPhase {
                    kind: PhaseKind::Inhale,
                    duration_secs: 4,
                },
                BreathingPhase {
                    kind: PhaseKind::Hold,
                    duration_secs: 0,
                },
            ],
        )
        .unwrap_err();
        assert_eq!(err, PatternError::ZeroDurationPhase("Hold".to_string()));
    }

    #[test]
    fn test_total_cycle_secs() {
        assert_eq!(four_seven_eight().total_cycle_secs(), 19.0);
        assert_eq!(box_breathing(4).unwrap().total_cycle_secs(), 16.0);
    }

    #[test]
    fn test_resolve_phase_interior() {
        let pattern = four_seven_eight();

        let (idx, local) = pattern.resolve_phase_at(2.0);
        assert_eq!(idx, 0);
        assert_eq!(local, 2.0);

        let (idx, local) = pattern.resolve_phase_at(10.5);
        assert_eq!(idx, 1);
        assert_eq!(local, 6.5);

        let (idx, local) = pattern.resolve_phase_at(18.9);
        assert_eq!(idx, 2);
        assert!((local - 7.9).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_phase_boundary_belongs_to_next() {
        let pattern = four_seven_eight();

        assert_eq!(pattern.resolve_phase_at(0.0), (0, 0.0));
        assert_eq!(pattern.resolve_phase_at(4.0), (1, 0.0));
        assert_eq!(pattern.resolve_phase_at(11.0), (2, 0.0));
    }

    #[test]
    fn test_resolve_phase_partitions_cycle() {
        // Every sampled instant maps to exactly one phase with a local offset
        // inside that phase's length, and phase indexes never go backwards.
        let pattern = box_breathing(4).unwrap();
        let total = pattern.total_cycle_secs();
        let mut last_idx = 0;
        let mut t = 0.0;
        while t < total {
            let (idx, local) = pattern.resolve_phase_at(t);
            assert!(idx >= last_idx);
            assert!(local >= 0.0);
            assert!(local < pattern.phases()[idx].duration_secs as f64);
            last_idx = idx;
            t += 0.125;
        }
    }

    #[test]
    fn test_resolve_phase_clamps_out_of_range() {
        let pattern = four_seven_eight();
        assert_eq!(pattern.resolve_phase_at(-3.0), (0, 0.0));
        // Past the cycle end clamps to the end, which wraps to the first phase
        assert_eq!(pattern.resolve_phase_at(50.0), (0, 0.0));
    }

    #[test]
    fn test_from_dash_string_shapes() {
        let p = BreathingPattern::from_dash_string("4-7-8").unwrap();
        assert_eq!(p.phases().len(), 3);
        assert_eq!(p.phases()[0].kind, PhaseKind::Inhale);
        assert_eq!(p.phases()[1].kind, PhaseKind::Hold);
        assert_eq!(p.phases()[2].kind, PhaseKind::Exhale);
        assert_eq!(p.phases()[2].duration_secs, 8);

        let p = BreathingPattern::from_dash_string("5-5").unwrap();
        assert_eq!(p.phases()[0].kind, PhaseKind::Inhale);
        assert_eq!(p.phases()[1].kind, PhaseKind::Exhale);

        let p = BreathingPattern::from_dash_string("6").unwrap();
        assert_eq!(p.phases().len(), 1);
    }

    #[test]
    fn test_from_dash_string_errors() {
        assert_eq!(
            BreathingPattern::from_dash_string("4-x-8").unwrap_err(),
            PatternError::BadPhaseLength("x".to_string())
        );
        assert_eq!(
            BreathingPattern::from_dash_string("1-2-3-4-5").unwrap_err(),
            PatternError::UnsupportedShape(5)
        );
        assert_eq!(
            BreathingPattern::from_dash_string("4-0-8").unwrap_err(),
            PatternError::ZeroDurationPhase("Hold".to_string())
        );
    }

    #[test]
    fn test_custom_kind_display() {
        let kind = PhaseKind::Custom("sigh".to_string());
        assert_eq!(kind.to_string(), "sigh");
        assert_eq!(PhaseKind::Inhale.to_string(), "Inhale");
    }
}
