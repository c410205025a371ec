//! The GP3 toggle switch: OS selection, base-layer toggle or MIDI gate.

/// Host operating system selected by the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OsMode {
    #[default]
    Linux,
    MacOs,
}

impl OsMode {
    /// Base layer of this OS's layer set.
    pub fn base_layer(self) -> u8 {
        match self {
            OsMode::Linux => 0,
            OsMode::MacOs => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OsMode::Linux => "linux",
            OsMode::MacOs => "macos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchRole {
    /// Level switch: active selects macOS, inactive Linux.
    OsSelect,
    /// Push button: each press flips between base layers 0 and 4.
    LayerToggle,
    /// Level switch: active enables note mode.
    MidiGate,
    Unused,
}

/// What the pad should do after a switch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchEvent {
    OsChanged(OsMode),
    ToggleLayer(u8),
    Gate(bool),
}

/// Edge detector for the switch pin.
#[derive(Debug, Clone)]
pub struct OsSwitch {
    role: SwitchRole,
    active_low: bool,
    active: bool,
    os: OsMode,
    base_layer: u8,
}

impl OsSwitch {
    /// Starts inactive: Linux, base layer 0, gate closed.
    pub fn new(role: SwitchRole, active_low: bool) -> Self {
        Self {
            role,
            active_low,
            active: false,
            os: OsMode::Linux,
            base_layer: 0,
        }
    }

    pub fn role(&self) -> SwitchRole {
        self.role
    }

    pub fn os(&self) -> OsMode {
        self.os
    }

    /// Whether the switch currently reads as active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed the current pin level; returns an event only on a transition.
    pub fn poll(&mut self, level_high: bool) -> Option<SwitchEvent> {
        if self.role == SwitchRole::Unused {
            return None;
        }
        let active = level_high != self.active_low;
        if active == self.active {
            return None;
        }
        self.active = active;
        let ev = match self.role {
            SwitchRole::OsSelect => {
                self.os = if active { OsMode::MacOs } else { OsMode::Linux };
                SwitchEvent::OsChanged(self.os)
            }
            SwitchRole::LayerToggle => {
                if !active {
                    return None;
                }
                self.base_layer = if self.base_layer == 0 { 4 } else { 0 };
                SwitchEvent::ToggleLayer(self.base_layer)
            }
            SwitchRole::MidiGate => SwitchEvent::Gate(active),
            SwitchRole::Unused => return None,
        };
        tracing::debug!(?ev, "switch");
        Some(ev)
    }
}
