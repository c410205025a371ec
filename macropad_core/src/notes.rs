//! Slider-to-note mapping and chord keys for the MIDI keymap.

use std::collections::BTreeMap;

use eyre::WrapErr;
use macropad_traits::NoteOutput;

use crate::calibration::RawRange;
use crate::config::NoteCfg;
use crate::error::{BuildError, Result};
use crate::hw_error::to_report;

/// Highest valid MIDI note number.
pub const MIDI_NOTE_MAX: u8 = 127;
/// Base note before the slider is first read (middle C).
pub const DEFAULT_BASE_NOTE: u8 = 60;

/// Chord played by a note key, as semitone offsets from the base note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordKind {
    Single,
    Major,
    Minor,
    Dominant7,
}

impl ChordKind {
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordKind::Single => &[0],
            ChordKind::Major => &[0, 4, 7],
            ChordKind::Minor => &[0, 3, 7],
            ChordKind::Dominant7 => &[0, 4, 7, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordKind::Single => "note",
            ChordKind::Major => "major",
            ChordKind::Minor => "minor",
            ChordKind::Dominant7 => "dom7",
        }
    }
}

/// Maps raw slider counts onto `low_note..=high_note`.
#[derive(Debug, Clone, Copy)]
pub struct NoteRange {
    raw: RawRange,
    low: u8,
    high: u8,
}

impl NoteRange {
    pub fn new(raw_min: i32, raw_max: i32, low: u8, high: u8) -> std::result::Result<Self, BuildError> {
        let raw = RawRange::new(raw_min, raw_max)?;
        if high > MIDI_NOTE_MAX {
            return Err(BuildError::InvalidNoteRange("high note above 127"));
        }
        if low >= high {
            return Err(BuildError::InvalidNoteRange("low note must be below high note"));
        }
        Ok(Self { raw, low, high })
    }

    /// Base note for a raw sample; out-of-range samples clamp to the ends.
    pub fn base_note(&self, raw: i32) -> u8 {
        let span = u32::from(self.high - self.low);
        let offset = self.raw.to_level(raw, span);
        // offset <= span, so the sum stays <= high
        self.low + u8::try_from(offset).unwrap_or(self.high - self.low)
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }
}

/// Note keys driven by the slider-selected base note.
///
/// Each key slot remembers the notes it started, so a release always turns
/// off exactly those even if the slider moved while the key was down.
#[derive(Debug)]
pub struct NotePad {
    range: NoteRange,
    velocity: u8,
    channel: u8,
    base_note: u8,
    held: BTreeMap<usize, Vec<u8>>,
}

impl NotePad {
    pub fn new(cfg: &NoteCfg) -> std::result::Result<Self, BuildError> {
        let range = NoteRange::new(cfg.raw_min, cfg.raw_max, cfg.low_note, cfg.high_note)?;
        if cfg.velocity == 0 || cfg.velocity > MIDI_NOTE_MAX {
            return Err(BuildError::InvalidNoteRange("velocity must be in 1..=127"));
        }
        if cfg.channel > 15 {
            return Err(BuildError::InvalidNoteRange("channel must be in 0..=15"));
        }
        Ok(Self {
            range,
            velocity: cfg.velocity,
            channel: cfg.channel,
            base_note: DEFAULT_BASE_NOTE,
            held: BTreeMap::new(),
        })
    }

    /// Track the slider; returns the new base note when it changed.
    pub fn update(&mut self, raw: i32) -> Option<u8> {
        let note = self.range.base_note(raw);
        if note == self.base_note {
            return None;
        }
        tracing::trace!(raw, note, "base note");
        self.base_note = note;
        Some(note)
    }

    pub fn base_note(&self) -> u8 {
        self.base_note
    }

    /// Notes currently sounding for `slot`.
    pub fn held(&self, slot: usize) -> &[u8] {
        self.held.get(&slot).map_or(&[][..], Vec::as_slice)
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    /// Start `chord` on the current base note for key `slot`.
    ///
    /// A slot that is already sounding is released first. Notes that would
    /// exceed 127 are skipped.
    pub fn press<O: NoteOutput + ?Sized>(
        &mut self,
        slot: usize,
        chord: ChordKind,
        out: &mut O,
    ) -> Result<()> {
        if self.held.contains_key(&slot) {
            self.release(slot, out)?;
        }
        let mut started = Vec::with_capacity(chord.intervals().len());
        for &interval in chord.intervals() {
            let Some(note) = self.base_note.checked_add(interval).filter(|n| *n <= MIDI_NOTE_MAX)
            else {
                continue;
            };
            if let Err(e) = out.note_on(self.channel, note, self.velocity) {
                // Keep what already sounds so the release can stop it.
                if !started.is_empty() {
                    self.held.insert(slot, started);
                }
                return Err(to_report(&*e)).wrap_err_with(|| format!("note on {note}"));
            }
            started.push(note);
        }
        tracing::debug!(slot, chord = chord.name(), notes = ?started, "notes on");
        self.held.insert(slot, started);
        Ok(())
    }

    /// Stop every note started by `slot`; a no-op for idle slots.
    pub fn release<O: NoteOutput + ?Sized>(&mut self, slot: usize, out: &mut O) -> Result<()> {
        let Some(notes) = self.held.remove(&slot) else {
            return Ok(());
        };
        for (i, &note) in notes.iter().enumerate() {
            if let Err(e) = out.note_off(self.channel, note) {
                self.held.insert(slot, notes[i..].to_vec());
                return Err(to_report(&*e)).wrap_err_with(|| format!("note off {note}"));
            }
        }
        tracing::debug!(slot, notes = ?notes, "notes off");
        Ok(())
    }

    /// Stop everything that is sounding (e.g. when note mode is switched off).
    pub fn release_all<O: NoteOutput + ?Sized>(&mut self, out: &mut O) -> Result<()> {
        let slots: Vec<usize> = self.held.keys().copied().collect();
        for slot in slots {
            self.release(slot, out)?;
        }
        Ok(())
    }
}
