//! Fills a whole pad bank or all knobs of a programme in one go.

use std::str::FromStr;

use crate::config::{Config, KNOB_COUNT, PADS_PER_BANK};
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadBank {
    /// Pads 1 to 8.
    A,
    /// Pads 9 to 16.
    B,
}

impl PadBank {
    pub const fn first_slot(self) -> usize {
        match self {
            Self::A => 1,
            Self::B => PADS_PER_BANK + 1,
        }
    }

    pub fn slots(self) -> impl Iterator<Item = usize> {
        let first = self.first_slot();
        first..first + PADS_PER_BANK
    }
}

impl FromStr for PadBank {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Self::A),
            "b" | "B" => Ok(Self::B),
            other => Err(ParseError::InvalidValue {
                field: "bank".to_owned(),
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl Direction {
    pub const fn step(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(ParseError::InvalidValue {
                field: "direction".to_owned(),
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Chromatic,
    Major,
    MelodicMinor,
    HarmonicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
}

impl Scale {
    pub const ALL: [Self; 9] = [
        Self::Chromatic,
        Self::Major,
        Self::MelodicMinor,
        Self::HarmonicMinor,
        Self::Dorian,
        Self::Phrygian,
        Self::Lydian,
        Self::Mixolydian,
        Self::Locrian,
    ];

    /// Semitones above the root for the eight pads of a bank.
    pub const fn intervals(self) -> [i32; PADS_PER_BANK] {
        match self {
            Self::Chromatic => [0, 1, 2, 3, 4, 5, 6, 7],
            Self::Major => [0, 2, 4, 5, 7, 9, 11, 12],
            Self::MelodicMinor => [0, 2, 3, 5, 7, 8, 10, 12],
            Self::HarmonicMinor => [0, 2, 4, 5, 7, 8, 11, 12],
            Self::Dorian => [0, 2, 3, 5, 7, 9, 10, 12],
            Self::Phrygian => [0, 1, 3, 5, 7, 8, 10, 12],
            Self::Lydian => [0, 2, 4, 6, 7, 9, 11, 12],
            Self::Mixolydian => [0, 2, 4, 5, 7, 9, 10, 12],
            Self::Locrian => [0, 1, 3, 5, 6, 8, 10, 12],
        }
    }

    /// Notes of the scale from `root`. Going down walks the scale backwards,
    /// still starting on `root`.
    pub fn notes(self, root: i32, direction: Direction) -> [i32; PADS_PER_BANK] {
        let mut intervals = self.intervals();
        if direction == Direction::Down {
            intervals.reverse();
            let top = intervals[0];
            for interval in &mut intervals {
                *interval -= top;
            }
        }
        intervals.map(|interval| root + interval)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Chromatic => "chromatic",
            Self::Major => "major",
            Self::MelodicMinor => "melodic_minor",
            Self::HarmonicMinor => "harmonic_minor",
            Self::Dorian => "dorian",
            Self::Phrygian => "phrygian",
            Self::Lydian => "lydian",
            Self::Mixolydian => "mixolydian",
            Self::Locrian => "locrian",
        }
    }
}

impl FromStr for Scale {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scale| scale.name() == s)
            .ok_or_else(|| ParseError::InvalidValue {
                field: "scale".to_owned(),
                value: s.to_owned(),
            })
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Values counting up or down by one from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    pub start: i32,
    pub direction: Direction,
}

impl Sequence {
    pub const fn new(start: i32, direction: Direction) -> Self {
        Self { start, direction }
    }

    pub const fn value(&self, position: usize) -> i32 {
        self.start + position as i32 * self.direction.step()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteFill {
    pub scale: Scale,
    pub root: i32,
    pub direction: Direction,
}

/// What to write into the pads of a bank. `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PadAutofill {
    pub notes: Option<NoteFill>,
    pub cc: Option<Sequence>,
    pub pc: Option<Sequence>,
    pub mode: Option<i32>,
    pub toggle: Option<i32>,
    pub on_color: Option<i32>,
    pub off_color: Option<i32>,
}

impl PadAutofill {
    pub fn apply(&self, config: &mut Config, bank: PadBank) {
        let notes = self
            .notes
            .map(|fill| fill.scale.notes(fill.root, fill.direction));

        for (position, slot) in bank.slots().enumerate() {
            let Some(pad) = config.pad_mut(slot) else {
                continue;
            };
            if let Some(notes) = notes {
                pad.note = notes[position];
            }
            if let Some(cc) = self.cc {
                pad.cc = cc.value(position);
            }
            if let Some(pc) = self.pc {
                pad.pc = pc.value(position);
            }
            if let Some(mode) = self.mode {
                pad.mode = mode;
            }
            if let Some(toggle) = self.toggle {
                pad.toggle = toggle;
            }
            if let Some(on_color) = self.on_color {
                pad.on_color = on_color;
            }
            if let Some(off_color) = self.off_color {
                pad.off_color = off_color;
            }
        }
    }
}

/// What to write into the knobs. `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KnobAutofill {
    pub cc: Option<Sequence>,
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl KnobAutofill {
    pub fn apply(&self, config: &mut Config) {
        for position in 0..KNOB_COUNT {
            let Some(knob) = config.knob_mut(position + 1) else {
                continue;
            };
            if let Some(cc) = self.cc {
                knob.cc = cc.value(position);
            }
            if let Some(min) = self.min {
                knob.min = min;
            }
            if let Some(max) = self.max {
                knob.max = max;
            }
        }
    }
}
