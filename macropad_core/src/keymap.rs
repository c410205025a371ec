//! Key actions, OS-aware shortcut resolution and the per-profile keymaps.

use std::fmt;

use macropad_traits::{Chord, Key, KeyHost, Mods, StepOutput};

use crate::config::SliderMode;
use crate::led::LayerIndicator;
use crate::notes::ChordKind;
use crate::os_switch::{OsMode, SwitchRole};

/// What a key does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Plain key or fixed shortcut, handled by the host.
    Key(Chord),
    WorkspaceLeft,
    WorkspaceRight,
    MoveWindowLeft,
    MoveWindowRight,
    /// GUI+Tab with GUI held between taps.
    WindowNext,
    /// GUI+Shift+Tab with GUI held between taps.
    WindowPrev,
    /// Sleep blink, then the system sleep key.
    Sleep,
    /// Note or chord on the slider-selected base note.
    Note(ChordKind),
    /// Momentary layer; owned by the host.
    Layer(u8),
    /// Falls through to the layer below; owned by the host.
    Transparent,
}

impl Action {
    /// Chord for the OS-dependent navigation shortcuts.
    pub fn shortcut(self, os: OsMode) -> Option<Chord> {
        let (move_window, arrow) = match self {
            Action::WorkspaceLeft => (false, Key::Left),
            Action::WorkspaceRight => (false, Key::Right),
            Action::MoveWindowLeft => (true, Key::Left),
            Action::MoveWindowRight => (true, Key::Right),
            _ => return None,
        };
        // Moving a window adds Shift to the workspace chord on both systems
        let base = match os {
            OsMode::Linux => Mods::GUI | Mods::ALT,
            OsMode::MacOs => Mods::CTRL,
        };
        let mods = if move_window { base | Mods::SHIFT } else { base };
        Some(Chord::new(mods, arrow))
    }

    /// Human-readable label with shortcuts resolved for `os`.
    pub fn describe(self, os: OsMode) -> String {
        match self.shortcut(os) {
            Some(chord) => chord.to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Key(c) => write!(f, "{c}"),
            Action::WorkspaceLeft => f.write_str("workspace-left"),
            Action::WorkspaceRight => f.write_str("workspace-right"),
            Action::MoveWindowLeft => f.write_str("move-window-left"),
            Action::MoveWindowRight => f.write_str("move-window-right"),
            Action::WindowNext => f.write_str("GUI+Tab (hold)"),
            Action::WindowPrev => f.write_str("GUI+Shift+Tab (hold)"),
            Action::Sleep => f.write_str("Sleep"),
            Action::Note(c) => write!(f, "note:{}", c.name()),
            Action::Layer(n) => write!(f, "MO({n})"),
            Action::Transparent => f.write_str("___"),
        }
    }
}

const fn k(key: Key) -> Action {
    Action::Key(Chord::plain(key))
}

type Layer = (u8, &'static [Action]);

const T: Action = Action::Transparent;

const WORKSPACE: &[Layer] = &[
    // Linux
    (0, &[Action::Layer(1), Action::Layer(2), Action::WorkspaceLeft, Action::WorkspaceRight]),
    (1, &[T, Action::Layer(2), Action::MoveWindowLeft, Action::MoveWindowRight]),
    (2, &[Action::Layer(1), T, Action::WindowNext, Action::WindowPrev]),
    (3, &[T, T, Action::Sleep, Action::Sleep]),
    // macOS
    (4, &[Action::Layer(5), Action::Layer(6), Action::WorkspaceLeft, Action::WorkspaceRight]),
    (5, &[T, Action::Layer(6), Action::MoveWindowLeft, Action::MoveWindowRight]),
    (6, &[Action::Layer(5), T, Action::WindowNext, Action::WindowPrev]),
    (7, &[T, T, Action::Sleep, Action::Sleep]),
];

const TETRIS: &[Layer] = &[
    (0, &[k(Key::Left), k(Key::Up), k(Key::Right), k(Key::Down)]),
    (4, &[k(Key::LeftCtrl), k(Key::Space), k(Key::LeftAlt), k(Key::LeftShift)]),
];

const MIDI: &[Layer] = &[(
    0,
    &[
        Action::Note(ChordKind::Single),
        Action::Note(ChordKind::Major),
        Action::Note(ChordKind::Minor),
        Action::Note(ChordKind::Dominant7),
    ],
)];

const NUMPAD: &[Layer] = &[(
    0,
    &[
        k(Key::Digit(1)),
        k(Key::Digit(2)),
        k(Key::Digit(3)),
        k(Key::Digit(4)),
        k(Key::Digit(5)),
        k(Key::Digit(6)),
    ],
)];

/// Keymap variant with its slider, switch and LED behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Workspace navigation; Linux layers 0-3, macOS layers 4-7.
    #[default]
    Workspace,
    /// Arrow keys / modifier layers toggled by the switch; slider zooms.
    Tetris,
    /// Note and chord keys; the switch gates note mode.
    Midi,
    /// Plain digits.
    Numpad,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Workspace,
        Profile::Tetris,
        Profile::Midi,
        Profile::Numpad,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Workspace => "workspace",
            Profile::Tetris => "tetris",
            Profile::Midi => "midi",
            Profile::Numpad => "numpad",
        }
    }

    pub fn layers(self) -> &'static [(u8, &'static [Action])] {
        match self {
            Profile::Workspace => WORKSPACE,
            Profile::Tetris => TETRIS,
            Profile::Midi => MIDI,
            Profile::Numpad => NUMPAD,
        }
    }

    /// Action bound to `slot` on `layer`, if the layer exists.
    pub fn action(self, layer: u8, slot: usize) -> Option<Action> {
        self.layers()
            .iter()
            .find(|(n, _)| *n == layer)
            .and_then(|(_, keys)| keys.get(slot).copied())
    }

    pub fn slider_mode(self) -> SliderMode {
        match self {
            Profile::Workspace => SliderMode::Volume,
            Profile::Tetris => SliderMode::Zoom,
            Profile::Midi => SliderMode::Notes,
            Profile::Numpad => SliderMode::Off,
        }
    }

    pub fn switch_role(self) -> SwitchRole {
        match self {
            Profile::Workspace => SwitchRole::OsSelect,
            Profile::Tetris => SwitchRole::LayerToggle,
            Profile::Midi => SwitchRole::MidiGate,
            Profile::Numpad => SwitchRole::Unused,
        }
    }

    pub fn indicator(self) -> LayerIndicator {
        match self {
            Profile::Workspace => LayerIndicator::Workspace,
            Profile::Tetris => LayerIndicator::Tetris,
            Profile::Midi | Profile::Numpad => LayerIndicator::Dark,
        }
    }
}

/// Key chords the slider taps for one unit up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderChords {
    pub up: Chord,
    pub down: Chord,
}

impl SliderChords {
    pub const VOLUME: SliderChords = SliderChords {
        up: Chord::plain(Key::VolumeUp),
        down: Chord::plain(Key::VolumeDown),
    };
    pub const ZOOM: SliderChords = SliderChords {
        up: Chord::new(Mods::CTRL, Key::Equal),
        down: Chord::new(Mods::CTRL, Key::Minus),
    };
}

/// `StepOutput` that taps slider chords on a `KeyHost`.
pub struct KeySteps<'a, H: KeyHost + ?Sized> {
    host: &'a mut H,
    chords: SliderChords,
}

impl<'a, H: KeyHost + ?Sized> KeySteps<'a, H> {
    pub fn new(host: &'a mut H, chords: SliderChords) -> Self {
        Self { host, chords }
    }
}

impl<H: KeyHost + ?Sized> StepOutput for KeySteps<'_, H> {
    fn increase(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.host.tap(self.chords.up)
    }

    fn decrease(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.host.tap(self.chords.down)
    }
}
