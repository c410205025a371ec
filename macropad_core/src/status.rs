//! Per-call results returned by the control channel and the scan loop.

/// Direction of a relative unit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Public status of a single `ControlChannel::on_sample` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Still in the startup reset/settle window; the sample was ignored.
    NotReady,
    /// The deferred reset burst was sent on this call.
    Reset { steps: u32 },
    /// Target level within the deadband of the current level; nothing sent.
    Deadband { target: u32 },
    /// `steps` unit actions sent; the channel now sits at `level`.
    Stepped {
        direction: Direction,
        steps: u32,
        level: u32,
    },
}

impl SampleOutcome {
    /// Number of unit actions emitted by this call.
    pub fn emitted(&self) -> u32 {
        match self {
            SampleOutcome::Reset { steps } | SampleOutcome::Stepped { steps, .. } => *steps,
            SampleOutcome::NotReady | SampleOutcome::Deadband { .. } => 0,
        }
    }
}
