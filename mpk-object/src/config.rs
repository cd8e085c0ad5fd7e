use crate::codec;
use crate::units::{self, TEXT_LEN};

pub const PAD_COUNT: usize = 16;
pub const PADS_PER_BANK: usize = 8;
pub const KNOB_COUNT: usize = 8;
pub const PROGRAMME_COUNT: usize = 8;

/// Default length of the zero padding in front of the terminator.
pub const DEFAULT_PADDING_LEN: usize = 2562;

pub mod pad_field {
    pub const NOTE: &str = "note";
    pub const CC: &str = "cc";
    pub const PC: &str = "pc";
    pub const MODE: &str = "mode";
    pub const TOGGLE: &str = "toggle";
    pub const ON_COLOR: &str = "on_color";
    pub const OFF_COLOR: &str = "off_color";

    /// In wire order.
    pub const PAD_FIELDS: &[&str] = &[NOTE, CC, PC, MODE, TOGGLE, ON_COLOR, OFF_COLOR];
}

pub mod knob_field {
    pub const CC: &str = "cc";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const MODE: &str = "mode";
    pub const NAME: &str = "name";

    /// Numeric fields in wire order, the name follows them.
    pub const KNOB_FIELDS: &[&str] = &[CC, MIN, MAX, MODE];
}

/// Field names with a value conversion beyond the stored byte.
pub const ARP_TEMPO: &str = "arp_tempo";
pub const TITLE: &str = "title";

/// One pad of bank A or B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pad {
    pub note: i32,
    pub cc: i32,
    pub pc: i32,
    /// 0 note, 1 program change, 2 CC.
    pub mode: i32,
    /// 0 momentary, 1 toggle.
    pub toggle: i32,
    pub on_color: i32,
    pub off_color: i32,
}

impl Pad {
    pub const WIDTH: usize = 7;

    pub const fn values(&self) -> [i32; Self::WIDTH] {
        [
            self.note,
            self.cc,
            self.pc,
            self.mode,
            self.toggle,
            self.on_color,
            self.off_color,
        ]
    }

    /// Builds a pad from the seven values of one wire group.
    pub const fn from_values(values: [i32; Self::WIDTH]) -> Self {
        let [note, cc, pc, mode, toggle, on_color, off_color] = values;
        Self {
            note,
            cc,
            pc,
            mode,
            toggle,
            on_color,
            off_color,
        }
    }

    pub fn get(&self, field: &str) -> Option<i32> {
        use pad_field::*;
        Some(match field {
            NOTE => self.note,
            CC => self.cc,
            PC => self.pc,
            MODE => self.mode,
            TOGGLE => self.toggle,
            ON_COLOR => self.on_color,
            OFF_COLOR => self.off_color,
            _ => return None,
        })
    }

    /// Returns `false` when there is no such field.
    pub fn set(&mut self, field: &str, value: i32) -> bool {
        use pad_field::*;
        let slot = match field {
            NOTE => &mut self.note,
            CC => &mut self.cc,
            PC => &mut self.pc,
            MODE => &mut self.mode,
            TOGGLE => &mut self.toggle,
            ON_COLOR => &mut self.on_color,
            OFF_COLOR => &mut self.off_color,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// One of the eight knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Knob {
    pub cc: i32,
    pub min: i32,
    pub max: i32,
    /// 0 absolute, 1 relative.
    pub mode: i32,
    pub name: [i32; TEXT_LEN],
}

impl Knob {
    pub const WIDTH: usize = 4 + TEXT_LEN;

    pub fn values(&self) -> [i32; Self::WIDTH] {
        let mut values = [0; Self::WIDTH];
        values[..4].copy_from_slice(&[self.cc, self.min, self.max, self.mode]);
        values[4..].copy_from_slice(&self.name);
        values
    }

    pub fn from_values(values: &[i32; Self::WIDTH]) -> Self {
        let mut name = [0; TEXT_LEN];
        name.copy_from_slice(&values[4..]);
        Self {
            cc: values[0],
            min: values[1],
            max: values[2],
            mode: values[3],
            name,
        }
    }

    pub fn name_string(&self) -> String {
        units::text_from_codes(&self.name)
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = units::text_to_codes(name);
    }

    pub fn get(&self, field: &str) -> Option<i32> {
        use knob_field::*;
        Some(match field {
            CC => self.cc,
            MIN => self.min,
            MAX => self.max,
            MODE => self.mode,
            _ => return None,
        })
    }

    /// Returns `false` when there is no such numeric field.
    pub fn set(&mut self, field: &str, value: i32) -> bool {
        use knob_field::*;
        let slot = match field {
            CC => &mut self.cc,
            MIN => &mut self.min,
            MAX => &mut self.max,
            MODE => &mut self.mode,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// A complete programme of the controller.
///
/// Values are kept as plain integers and are not range checked here, an out of
/// range value is only rejected when the programme is serialized. Pads and
/// knobs are addressed by their one based slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Target slot, 1 to 8.
    pub programme: i32,
    pub title: [i32; TEXT_LEN],

    /// One based.
    pub pad_channel: i32,
    pub pad_aftertouch: i32,
    /// One based.
    pub key_channel: i32,
    pub key_octave: i32,
    pub key_transpose: i32,
    pub transport: i32,

    pub arp_on: i32,
    pub arp_mode: i32,
    pub arp_time_div: i32,
    pub arp_clock: i32,
    pub arp_latch: i32,
    pub arp_swing: i32,
    pub arp_tempo_taps: i32,
    /// Flag and remainder, see [`units::tempo_bpm`].
    pub arp_tempo: [i32; 2],
    pub arp_octave: i32,
    pub arp_gate: i32,

    pub note_repeat_time_div: i32,
    pub note_repeat_on: i32,

    pub cv_trigger_source: i32,
    pub cv_note_priority: i32,
    pub cv_gate_mode: i32,
    pub cv_mod_source: i32,
    pub cv_bend_range: i32,
    pub cv_clock_in_div: i32,
    pub cv_clock_out_div: i32,

    pub scale_on: i32,
    pub scale_key: i32,
    pub scale_type: i32,
    pub scale_non_s_note: i32,

    pub chord_on: i32,
    pub chord_type: i32,
    pub chord_inversion: i32,

    pub joystick_x_mode: i32,
    pub joystick_x_cc1: i32,
    pub joystick_x_cc2: i32,
    pub joystick_y_mode: i32,
    pub joystick_y_cc1: i32,
    pub joystick_y_cc2: i32,

    pub(crate) pads: [Pad; PAD_COUNT],
    pub(crate) knobs: [Knob; KNOB_COUNT],
    pub(crate) sysex_pad: Vec<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            programme: 1,
            title: units::text_to_codes("RPR1"),
            pad_channel: 1,
            pad_aftertouch: 0,
            key_channel: 1,
            key_octave: 4,
            key_transpose: 12,
            transport: 0,
            arp_on: 0,
            arp_mode: 0,
            arp_time_div: 2,
            arp_clock: 1,
            arp_latch: 0,
            arp_swing: 0,
            arp_tempo_taps: 3,
            arp_tempo: [0, 120],
            arp_octave: 0,
            arp_gate: 50,
            note_repeat_time_div: 4,
            note_repeat_on: 0,
            cv_trigger_source: 0,
            cv_note_priority: 0,
            cv_gate_mode: 0,
            cv_mod_source: 0,
            cv_bend_range: 2,
            cv_clock_in_div: 2,
            cv_clock_out_div: 6,
            scale_on: 0,
            scale_key: 0,
            scale_type: 1,
            scale_non_s_note: 0,
            chord_on: 0,
            chord_type: 0,
            chord_inversion: 0,
            joystick_x_mode: 2,
            joystick_x_cc1: 14,
            joystick_x_cc2: 14,
            joystick_y_mode: 2,
            joystick_y_cc1: 15,
            joystick_y_cc2: 15,
            pads: default_pads(),
            knobs: default_knobs(),
            sysex_pad: vec![0; DEFAULT_PADDING_LEN],
        }
    }
}

// Bank A lights green over red, bank B blue over orange.
fn default_pads() -> [Pad; PAD_COUNT] {
    std::array::from_fn(|index| {
        let (on_color, off_color) = if index < PADS_PER_BANK { (6, 24) } else { (1, 28) };
        let index = index as i32;
        Pad {
            note: 36 + index,
            cc: 1 + index,
            pc: index,
            mode: 2,
            toggle: 1,
            on_color,
            off_color,
        }
    })
}

fn default_knobs() -> [Knob; KNOB_COUNT] {
    std::array::from_fn(|index| Knob {
        cc: 16 + index as i32,
        min: 0,
        max: 127,
        mode: 1,
        name: units::text_to_codes(&format!("QLINK{}", index + 1)),
    })
}

impl Config {
    /// The pad in `slot`, 1 to 16.
    pub fn pad(&self, slot: usize) -> Option<&Pad> {
        slot.checked_sub(1).and_then(|index| self.pads.get(index))
    }

    pub fn pad_mut(&mut self, slot: usize) -> Option<&mut Pad> {
        slot.checked_sub(1).and_then(|index| self.pads.get_mut(index))
    }

    /// Pads with their slot number, ascending.
    pub fn pads(&self) -> impl Iterator<Item = (usize, &Pad)> + '_ {
        self.pads.iter().enumerate().map(|(index, pad)| (index + 1, pad))
    }

    /// The knob in `slot`, 1 to 8.
    pub fn knob(&self, slot: usize) -> Option<&Knob> {
        slot.checked_sub(1).and_then(|index| self.knobs.get(index))
    }

    pub fn knob_mut(&mut self, slot: usize) -> Option<&mut Knob> {
        slot.checked_sub(1).and_then(|index| self.knobs.get_mut(index))
    }

    /// Knobs with their slot number, ascending.
    pub fn knobs(&self) -> impl Iterator<Item = (usize, &Knob)> + '_ {
        self.knobs.iter().enumerate().map(|(index, knob)| (index + 1, knob))
    }

    /// The zero padding in front of the terminator, as received.
    pub fn padding(&self) -> &[i32] {
        &self.sysex_pad
    }

    pub fn title_string(&self) -> String {
        units::text_from_codes(&self.title)
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = units::text_to_codes(title);
    }

    pub const fn tempo_bpm(&self) -> i32 {
        units::tempo_bpm(self.arp_tempo)
    }

    pub fn set_tempo_bpm(&mut self, bpm: i32) {
        self.arp_tempo = units::tempo_pair(bpm);
    }

    /// A copy of this programme targeting another slot.
    pub fn copied_to(&self, programme: i32) -> Self {
        Self {
            programme,
            ..self.clone()
        }
    }

    /// Reads a single value by its field name. The tempo is read in BPM.
    pub fn get(&self, name: &str) -> Option<i32> {
        if name == ARP_TEMPO {
            return Some(self.tempo_bpm());
        }
        codec::scalar_field(name).and_then(|field| field.read_scalar(self))
    }

    /// Writes a single value by its field name. The tempo is written in BPM.
    /// Returns `false` when there is no such field.
    pub fn set(&mut self, name: &str, value: i32) -> bool {
        if name == ARP_TEMPO {
            self.set_tempo_bpm(value);
            return true;
        }
        codec::scalar_field(name).is_some_and(|field| field.write_scalar(self, value))
    }

    /// Names accepted by [`Config::get`] and [`Config::set`], in wire order.
    pub fn value_names() -> impl Iterator<Item = &'static str> {
        codec::FIELDS
            .iter()
            .filter(|field| field.is_scalar() || field.name == ARP_TEMPO)
            .map(|field| field.name)
    }
}
