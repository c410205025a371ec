//! GUI+Tab window switching with a held GUI modifier.
//!
//! The first tap registers GUI and leaves it down so repeated taps walk the
//! window switcher; the scan loop releases it once no tap arrived for
//! `timeout`.

use std::time::{Duration, Instant};

use eyre::WrapErr;
use macropad_traits::{Chord, Key, KeyHost, Mods};

use crate::error::Result;
use crate::hw_error::to_report;

pub const DEFAULT_HOLD_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct ModifierHold {
    timeout: Duration,
    held_since_tap: Option<Instant>,
}

impl Default for ModifierHold {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_TIMEOUT)
    }
}

impl ModifierHold {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            held_since_tap: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held_since_tap.is_some()
    }

    /// Tap Tab (Shift+Tab for `Backward`) with GUI held, restarting the timer.
    pub fn tap<H: KeyHost + ?Sized>(
        &mut self,
        direction: TabDirection,
        host: &mut H,
        now: Instant,
    ) -> Result<()> {
        if self.held_since_tap.is_none() {
            host.register_mods(Mods::GUI)
                .map_err(|e| to_report(&*e))
                .wrap_err("holding GUI")?;
            // Held from here on, even if the tap below fails.
            self.held_since_tap = Some(now);
        }
        let sent = match direction {
            TabDirection::Forward => host.tap(Chord::plain(Key::Tab)),
            TabDirection::Backward => host
                .register_mods(Mods::SHIFT)
                .and_then(|()| host.tap(Chord::plain(Key::Tab)))
                .and_then(|()| host.unregister_mods(Mods::SHIFT)),
        };
        sent.map_err(|e| to_report(&*e))
            .wrap_err_with(|| format!("window switch {direction:?}"))?;
        self.held_since_tap = Some(now);
        Ok(())
    }

    /// Release GUI once `timeout` has passed since the last tap.
    /// Returns whether it was released on this call.
    pub fn poll<H: KeyHost + ?Sized>(&mut self, host: &mut H, now: Instant) -> Result<bool> {
        let Some(last) = self.held_since_tap else {
            return Ok(false);
        };
        if now.saturating_duration_since(last) < self.timeout {
            return Ok(false);
        }
        host.unregister_mods(Mods::GUI)
            .map_err(|e| to_report(&*e))
            .wrap_err("releasing GUI")?;
        self.held_since_tap = None;
        tracing::debug!("gui released");
        Ok(true)
    }
}
