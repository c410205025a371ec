//! Test and helper mocks for macropad_core

use crate::status::Direction;

/// A `StepOutput` that records every unit action, optionally failing after
/// a fixed number of successful ones.
#[derive(Debug, Default)]
pub struct RecordingSteps {
    log: Vec<Direction>,
    fail_after: Option<usize>,
}

impl RecordingSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` actions, then fail every following one.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn log(&self) -> &[Direction] {
        &self.log
    }

    pub fn ups(&self) -> usize {
        self.log.iter().filter(|d| **d == Direction::Up).count()
    }

    pub fn downs(&self) -> usize {
        self.log.iter().filter(|d| **d == Direction::Down).count()
    }

    pub fn total(&self) -> usize {
        self.log.len()
    }

    /// Net level change implied by the recorded actions.
    pub fn net(&self) -> i64 {
        self.ups() as i64 - self.downs() as i64
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    fn push(&mut self, d: Direction) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(n) = self.fail_after
            && self.log.len() >= n
        {
            return Err(Box::new(std::io::Error::other("step sink closed")));
        }
        self.log.push(d);
        Ok(())
    }
}

impl macropad_traits::StepOutput for RecordingSteps {
    fn increase(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push(Direction::Up)
    }

    fn decrease(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push(Direction::Down)
    }
}
