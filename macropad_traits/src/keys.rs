//! Key and modifier vocabulary shared between the core and host adapters.

use std::fmt;
use std::ops::BitOr;

/// A basic keycode the host knows how to tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Tab,
    Space,
    Equal,
    Minus,
    VolumeUp,
    VolumeDown,
    SystemSleep,
    LeftCtrl,
    LeftShift,
    LeftAlt,
    /// Number row digit `0..=9`.
    Digit(u8),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Left => f.write_str("Left"),
            Key::Right => f.write_str("Right"),
            Key::Up => f.write_str("Up"),
            Key::Down => f.write_str("Down"),
            Key::Tab => f.write_str("Tab"),
            Key::Space => f.write_str("Space"),
            Key::Equal => f.write_str("="),
            Key::Minus => f.write_str("-"),
            Key::VolumeUp => f.write_str("VolumeUp"),
            Key::VolumeDown => f.write_str("VolumeDown"),
            Key::SystemSleep => f.write_str("Sleep"),
            Key::LeftCtrl => f.write_str("LCtrl"),
            Key::LeftShift => f.write_str("LShift"),
            Key::LeftAlt => f.write_str("LAlt"),
            Key::Digit(d) => write!(f, "{d}"),
        }
    }
}

/// Left-hand modifier mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mods(u8);

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const CTRL: Mods = Mods(1);
    pub const SHIFT: Mods = Mods(1 << 1);
    pub const ALT: Mods = Mods(1 << 2);
    pub const GUI: Mods = Mods(1 << 3);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: Mods) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Mods) -> Mods {
        Mods(self.0 | other.0)
    }

    #[inline]
    pub const fn difference(self, other: Mods) -> Mods {
        Mods(self.0 & !other.0)
    }
}

impl BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Mods) -> Mods {
        self.union(rhs)
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Mods::GUI, "GUI"),
            (Mods::CTRL, "Ctrl"),
            (Mods::SHIFT, "Shift"),
            (Mods::ALT, "Alt"),
        ];
        let mut first = true;
        for (m, name) in names {
            if self.contains(m) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A key tapped while a set of modifiers is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub mods: Mods,
    pub key: Key,
}

impl Chord {
    #[inline]
    pub const fn new(mods: Mods, key: Key) -> Self {
        Self { mods, key }
    }

    #[inline]
    pub const fn plain(key: Key) -> Self {
        Self {
            mods: Mods::NONE,
            key,
        }
    }
}

impl From<Key> for Chord {
    fn from(key: Key) -> Self {
        Chord::plain(key)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.mods, self.key)
        }
    }
}
