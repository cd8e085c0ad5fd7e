//! Mapping between a programme [`Config`] and its sysex frame.
//!
//! The layout lives in one ordered table, [`FIELDS`]. Parsing and serializing
//! walk the same table, so every field is read and written at the same offset
//! with the same conversion.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::config::{Config, Knob, Pad, KNOB_COUNT, PAD_COUNT};
use crate::error::{CodecError, MalformedReason};
use crate::units::{self, TEXT_LEN};

pub const START_SYSEX: [u8; 7] = [240, 71, 127, 84, 100, 22, 78];
pub const SYSEX_END: [u8; 4] = [16, 0, 2, 9];
pub const SYSEX_FINAL: u8 = 247;

/// Length of a frame as sent by the current firmware.
pub const FRAME_LEN: usize = 2902;

/// How a stored value becomes a wire byte and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Raw,
    /// Counted from 1 in the model, from 0 on the wire.
    OneBased,
}

impl Transform {
    pub const fn from_wire(self, byte: u8) -> i32 {
        match self {
            Self::Raw => byte as i32,
            Self::OneBased => units::channel_from_wire(byte),
        }
    }

    /// `None` when the value has no byte representation.
    pub fn to_wire(self, value: i32) -> Option<u8> {
        match self {
            Self::Raw => u8::try_from(value).ok(),
            Self::OneBased => units::channel_to_wire(value),
        }
    }
}

type Read = fn(&Config, &mut Vec<i32>);
type Write = fn(&mut Config, &[i32]);

#[derive(Clone, Copy)]
pub enum FieldKind {
    /// Fixed bytes which are written as is and skipped when parsing.
    Constant(&'static [u8]),
    Values {
        width: usize,
        transform: Transform,
        read: Read,
        write: Write,
    },
    /// Fills the frame up to the fields following it.
    Padding,
}

#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FieldKind::Constant(bytes) => format!("constant {bytes:?}"),
            FieldKind::Values {
                width, transform, ..
            } => format!("{width} x {transform:?}"),
            FieldKind::Padding => "padding".to_owned(),
        };
        write!(f, "{} ({})", self.name, kind)
    }
}

impl FieldSpec {
    /// `None` for the padding, whose width depends on the frame.
    pub const fn width(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Constant(bytes) => Some(bytes.len()),
            FieldKind::Values { width, .. } => Some(width),
            FieldKind::Padding => None,
        }
    }

    pub const fn is_scalar(&self) -> bool {
        matches!(self.kind, FieldKind::Values { width: 1, .. })
    }

    pub fn read_scalar(&self, config: &Config) -> Option<i32> {
        let FieldKind::Values { width: 1, read, .. } = self.kind else {
            return None;
        };
        let mut values = Vec::with_capacity(1);
        read(config, &mut values);
        values.first().copied()
    }

    pub fn write_scalar(&self, config: &mut Config, value: i32) -> bool {
        let FieldKind::Values {
            width: 1, write, ..
        } = self.kind
        else {
            return false;
        };
        write(config, &[value]);
        true
    }
}

macro_rules! constant {
    ($name:literal, $bytes:expr) => {
        FieldSpec {
            name: $name,
            kind: FieldKind::Constant($bytes),
        }
    };
}

macro_rules! scalar {
    ($name:ident) => {
        scalar!($name, Transform::Raw)
    };
    ($name:ident, $transform:expr) => {
        FieldSpec {
            name: stringify!($name),
            kind: FieldKind::Values {
                width: 1,
                transform: $transform,
                read: |config, out| out.push(config.$name),
                write: |config, values| config.$name = values[0],
            },
        }
    };
}

macro_rules! array {
    ($name:ident, $width:expr) => {
        FieldSpec {
            name: stringify!($name),
            kind: FieldKind::Values {
                width: $width,
                transform: Transform::Raw,
                read: |config, out| out.extend_from_slice(&config.$name),
                write: |config, values| config.$name.copy_from_slice(values),
            },
        }
    };
}

pub static FIELDS: &[FieldSpec] = &[
    constant!("start_sysex", &START_SYSEX),
    scalar!(programme),
    array!(title, TEXT_LEN),
    scalar!(pad_channel, Transform::OneBased),
    scalar!(pad_aftertouch),
    scalar!(key_channel, Transform::OneBased),
    scalar!(key_octave),
    scalar!(key_transpose),
    scalar!(transport),
    scalar!(arp_on),
    scalar!(arp_mode),
    scalar!(arp_time_div),
    scalar!(arp_clock),
    scalar!(arp_latch),
    scalar!(arp_swing),
    scalar!(arp_tempo_taps),
    array!(arp_tempo, 2),
    scalar!(arp_octave),
    scalar!(arp_gate),
    scalar!(note_repeat_time_div),
    scalar!(note_repeat_on),
    scalar!(cv_trigger_source),
    scalar!(cv_note_priority),
    scalar!(cv_gate_mode),
    scalar!(cv_mod_source),
    scalar!(cv_bend_range),
    scalar!(cv_clock_in_div),
    scalar!(cv_clock_out_div),
    scalar!(scale_on),
    scalar!(scale_key),
    scalar!(scale_type),
    scalar!(scale_non_s_note),
    scalar!(chord_on),
    scalar!(chord_type),
    scalar!(chord_inversion),
    scalar!(joystick_x_mode),
    scalar!(joystick_x_cc1),
    scalar!(joystick_x_cc2),
    scalar!(joystick_y_mode),
    scalar!(joystick_y_cc1),
    scalar!(joystick_y_cc2),
    FieldSpec {
        name: "pads",
        kind: FieldKind::Values {
            width: PAD_COUNT * Pad::WIDTH,
            transform: Transform::Raw,
            read: |config, out| {
                for pad in &config.pads {
                    out.extend_from_slice(&pad.values());
                }
            },
            write: |config, values| {
                for (pad, chunk) in config.pads.iter_mut().zip(values.chunks_exact(Pad::WIDTH)) {
                    if let Ok(group) = <[i32; Pad::WIDTH]>::try_from(chunk) {
                        *pad = Pad::from_values(group);
                    }
                }
            },
        },
    },
    FieldSpec {
        name: "knobs",
        kind: FieldKind::Values {
            width: KNOB_COUNT * Knob::WIDTH,
            transform: Transform::Raw,
            read: |config, out| {
                for knob in &config.knobs {
                    out.extend_from_slice(&knob.values());
                }
            },
            write: |config, values| {
                for (knob, chunk) in config
                    .knobs
                    .iter_mut()
                    .zip(values.chunks_exact(Knob::WIDTH))
                {
                    if let Ok(group) = <&[i32; Knob::WIDTH]>::try_from(chunk) {
                        *knob = Knob::from_values(group);
                    }
                }
            },
        },
    },
    constant!("sysex_end", &SYSEX_END),
    FieldSpec {
        name: "sysex_pad",
        kind: FieldKind::Padding,
    },
    constant!("sysex_final", &[SYSEX_FINAL]),
];

lazy_static! {
    static ref FIELD_INDEX: HashMap<&'static str, &'static FieldSpec> =
        FIELDS.iter().map(|field| (field.name, field)).collect();
}

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELD_INDEX.get(name).copied()
}

/// A single byte field, looked up by name.
pub fn scalar_field(name: &str) -> Option<&'static FieldSpec> {
    field(name).filter(|field| field.is_scalar())
}

/// Byte offset of a field, `None` for fields after the padding and unknown names.
pub fn offset_of(name: &str) -> Option<usize> {
    let mut offset = 0;
    for field in FIELDS {
        if field.name == name {
            return Some(offset);
        }
        offset += field.width()?;
    }
    None
}

/// Bytes before the padding, i.e. the shortest prefix a parse needs.
pub fn prefix_len() -> usize {
    FIELDS.iter().map_while(FieldSpec::width).sum()
}

fn fixed_width(fields: &[FieldSpec]) -> usize {
    fields.iter().filter_map(FieldSpec::width).sum()
}

/// Parses a device response.
///
/// `None` stands for a response that never arrived.
pub fn parse<B: AsRef<[u8]>>(response: Option<B>) -> Result<Config, CodecError> {
    let response = response.ok_or(CodecError::MalformedInput(MalformedReason::Absent))?;
    parse_frame(response.as_ref())
}

/// Parses a complete frame.
///
/// The preamble, end marker and terminator are not checked. The padding takes
/// everything between the end marker and the last byte, whatever its length.
pub fn parse_frame(frame: &[u8]) -> Result<Config, CodecError> {
    let mut config = Config::default();
    let mut cursor = 0;

    for (index, field) in FIELDS.iter().enumerate() {
        let needed = match field.width() {
            Some(width) => cursor + width,
            None => {
                let trailing = fixed_width(&FIELDS[index + 1..]);
                if frame.len() < cursor + trailing {
                    return Err(truncated(field.name, cursor + trailing, frame.len()));
                }
                frame.len() - trailing
            }
        };

        let bytes = frame
            .get(cursor..needed)
            .ok_or_else(|| truncated(field.name, needed, frame.len()))?;

        match field.kind {
            FieldKind::Constant(_) => {}
            FieldKind::Values {
                transform, write, ..
            } => {
                let values: Vec<i32> = bytes
                    .iter()
                    .map(|byte| transform.from_wire(*byte))
                    .collect();
                write(&mut config, &values);
            }
            FieldKind::Padding => {
                config.sysex_pad = bytes.iter().map(|byte| i32::from(*byte)).collect();
            }
        }

        cursor = needed;
    }

    Ok(config)
}

/// Serializes a programme into a frame ready to send.
pub fn serialize(config: &Config) -> Result<Vec<u8>, CodecError> {
    let mut frame = Vec::with_capacity(fixed_width(FIELDS) + config.sysex_pad.len());
    let mut values = Vec::new();

    for field in FIELDS {
        match field.kind {
            FieldKind::Constant(bytes) => frame.extend_from_slice(bytes),
            FieldKind::Values {
                transform, read, ..
            } => {
                values.clear();
                read(config, &mut values);
                for value in &values {
                    frame.push(to_byte(field.name, transform, *value)?);
                }
            }
            FieldKind::Padding => {
                for value in &config.sysex_pad {
                    frame.push(to_byte(field.name, Transform::Raw, *value)?);
                }
            }
        }
    }

    Ok(frame)
}

fn to_byte(field: &'static str, transform: Transform, value: i32) -> Result<u8, CodecError> {
    transform
        .to_wire(value)
        .ok_or(CodecError::OutOfRange { field, value })
}

const fn truncated(field: &'static str, needed: usize, len: usize) -> CodecError {
    CodecError::MalformedInput(MalformedReason::Truncated { field, needed, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_PADDING_LEN, PADS_PER_BANK};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn default_frame() -> Vec<u8> {
        serialize(&Config::default()).unwrap()
    }

    #[test]
    fn layout_offsets() {
        assert_eq!(offset_of("programme"), Some(7));
        assert_eq!(offset_of("title"), Some(8));
        assert_eq!(offset_of("pad_channel"), Some(24));
        assert_eq!(offset_of("arp_on"), Some(30));
        assert_eq!(offset_of("arp_tempo"), Some(37));
        assert_eq!(offset_of("note_repeat_time_div"), Some(41));
        assert_eq!(offset_of("cv_trigger_source"), Some(43));
        assert_eq!(offset_of("scale_on"), Some(50));
        assert_eq!(offset_of("chord_on"), Some(54));
        assert_eq!(offset_of("joystick_x_mode"), Some(57));
        assert_eq!(offset_of("pads"), Some(63));
        assert_eq!(offset_of("knobs"), Some(175));
        assert_eq!(offset_of("sysex_end"), Some(335));
        assert_eq!(offset_of("sysex_pad"), Some(339));
        assert_eq!(offset_of("sysex_final"), None);
        assert_eq!(prefix_len(), 339);
    }

    #[test]
    fn field_names_are_unique() {
        assert_eq!(FIELD_INDEX.len(), FIELDS.len());
        assert!(field("knobs").is_some());
        assert!(field("velocity").is_none());
    }

    #[test]
    fn defaults_serialize_to_a_full_frame() {
        let frame = default_frame();
        assert_eq!(frame.len(), FRAME_LEN);
        assert_eq!(&frame[..8], &[240, 71, 127, 84, 100, 22, 78, 1]);
        assert_eq!(&frame[335..339], &SYSEX_END);
        assert_eq!(frame.last(), Some(&247));
    }

    #[test]
    fn round_trip_defaults() {
        let config = Config::default();
        assert_eq!(parse_frame(&serialize(&config).unwrap()).unwrap(), config);
    }

    #[test]
    fn round_trip_every_field() {
        let mut config = Config::default();
        config.programme = 8;
        config.set_title("Every Field Set!");
        config.pad_channel = 10;
        config.key_channel = 16;
        config.key_octave = 7;
        config.key_transpose = 0;
        config.arp_swing = 25;
        config.arp_tempo = [1, 112];
        config.arp_octave = 3;
        config.cv_bend_range = 12;
        config.joystick_y_cc2 = 127;
        for (index, name) in Config::value_names().enumerate() {
            if !["pad_channel", "key_channel", "arp_tempo"].contains(&name) {
                assert!(config.set(name, (index * 7 % 256) as i32));
            }
        }
        for slot in 1..=PAD_COUNT {
            let pad = config.pad_mut(slot).unwrap();
            *pad = Pad::from_values(std::array::from_fn(|i| (slot * 10 + i) as i32));
        }
        for slot in 1..=KNOB_COUNT {
            let knob = config.knob_mut(slot).unwrap();
            knob.cc = 100 + slot as i32;
            knob.min = slot as i32;
            knob.max = 255;
            knob.set_name(&format!("Knob number {slot}"));
        }

        let frame = serialize(&config).unwrap();
        assert_eq!(parse_frame(&frame).unwrap(), config);
    }

    fn random_config(rng: &mut StdRng) -> Config {
        let mut config = Config::default();
        for name in Config::value_names() {
            if !["pad_channel", "key_channel", "arp_tempo"].contains(&name) {
                assert!(config.set(name, rng.gen_range(0..=255)));
            }
        }
        config.pad_channel = rng.gen_range(1..=256);
        config.key_channel = rng.gen_range(1..=256);
        config.arp_tempo = [rng.gen_range(0..=255), rng.gen_range(0..=255)];
        config.title = std::array::from_fn(|_| rng.gen_range(0..=255));
        for slot in 1..=PAD_COUNT {
            *config.pad_mut(slot).unwrap() =
                Pad::from_values(std::array::from_fn(|_| rng.gen_range(0..=255)));
        }
        for slot in 1..=KNOB_COUNT {
            *config.knob_mut(slot).unwrap() =
                Knob::from_values(&std::array::from_fn(|_| rng.gen_range(0..=255)));
        }
        let padding_len = rng.gen_range(0..=DEFAULT_PADDING_LEN);
        config.sysex_pad = (0..padding_len).map(|_| rng.gen_range(0..=255)).collect();
        config
    }

    #[test]
    fn random_programmes_survive_the_wire() {
        let mut rng = StdRng::seed_from_u64(0x4D50_4B32);
        for _ in 0..32 {
            let config = random_config(&mut rng);
            let frame = serialize(&config).unwrap();
            assert_eq!(frame.len(), prefix_len() + config.padding().len() + 1);
            assert_eq!(parse_frame(&frame).unwrap(), config);
        }
    }

    #[test]
    fn random_frames_serialize_back_unchanged() {
        let mut rng = StdRng::seed_from_u64(7);
        let end = offset_of("sysex_end").unwrap();
        for _ in 0..32 {
            let mut frame = default_frame();
            for byte in &mut frame[7..end] {
                *byte = rng.gen();
            }
            let last = frame.len() - 1;
            for byte in &mut frame[prefix_len()..last] {
                *byte = rng.gen_range(1..=255);
            }

            let config = parse_frame(&frame).unwrap();
            assert_eq!(serialize(&config).unwrap(), frame);
        }
    }

    #[test]
    fn wire_is_stable() {
        let mut frame = default_frame();
        for (offset, byte) in frame.iter_mut().enumerate().skip(7).take(328) {
            *byte = (offset % 128) as u8;
        }
        let config = parse_frame(&frame).unwrap();
        assert_eq!(serialize(&config).unwrap(), frame);
    }

    #[test]
    fn channels_are_offset_by_one() {
        let mut frame = default_frame();
        frame[24] = 0;
        frame[26] = 9;
        let config = parse_frame(&frame).unwrap();
        assert_eq!(config.pad_channel, 1);
        assert_eq!(config.key_channel, 10);

        let mut config = Config::default();
        config.pad_channel = 1;
        config.key_channel = 16;
        let frame = serialize(&config).unwrap();
        assert_eq!(frame[24], 0);
        assert_eq!(frame[26], 15);
    }

    #[test]
    fn channel_zero_is_out_of_range() {
        let mut config = Config::default();
        config.key_channel = 0;
        assert_eq!(
            serialize(&config),
            Err(CodecError::OutOfRange {
                field: "key_channel",
                value: 0
            })
        );
    }

    #[test]
    fn pads_partition_in_groups_of_seven() {
        let mut frame = default_frame();
        let pads = offset_of("pads").unwrap();
        frame[pads] = 36;
        frame[pads + PADS_PER_BANK * Pad::WIDTH] = 99;
        frame[pads + 15 * Pad::WIDTH + 6] = 5;

        let config = parse_frame(&frame).unwrap();
        assert_eq!(config.pad(1).unwrap().note, 36);
        assert_eq!(config.pad(9).unwrap().note, 99);
        assert_eq!(config.pad(16).unwrap().off_color, 5);
    }

    #[test]
    fn knobs_partition_in_groups_of_twenty() {
        let mut frame = default_frame();
        let knobs = offset_of("knobs").unwrap();
        let region = &mut frame[knobs..knobs + KNOB_COUNT * Knob::WIDTH];
        for (index, byte) in region.iter_mut().enumerate() {
            *byte = (index / Knob::WIDTH) as u8;
        }

        let config = parse_frame(&frame).unwrap();
        assert_eq!(config.knob(1).unwrap().values(), [0; Knob::WIDTH]);
        assert_eq!(config.knob(8).unwrap().values(), [7; Knob::WIDTH]);
        assert_eq!(config.knob(8).unwrap().cc, 7);
    }

    #[test]
    fn padding_follows_the_frame_length() {
        let mut frame = default_frame();
        frame.truncate(prefix_len());
        frame.extend_from_slice(&[0; 10]);
        frame.push(SYSEX_FINAL);

        let config = parse_frame(&frame).unwrap();
        assert_eq!(config.padding().len(), 10);
        assert_eq!(serialize(&config).unwrap(), frame);

        frame.truncate(prefix_len());
        frame.push(SYSEX_FINAL);
        let config = parse_frame(&frame).unwrap();
        assert!(config.padding().is_empty());
    }

    #[test]
    fn absent_response_is_malformed() {
        assert_eq!(
            parse(None::<&[u8]>),
            Err(CodecError::MalformedInput(MalformedReason::Absent))
        );
        assert!(parse(Some(default_frame())).is_ok());
    }

    #[test]
    fn truncated_response_is_malformed() {
        let frame = default_frame();
        let err = parse_frame(&frame[..10]).unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedInput(MalformedReason::Truncated {
                field: "title",
                needed: 24,
                len: 10
            })
        );
        assert!(err.is_recoverable());

        let err = parse_frame(&frame[..prefix_len()]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MalformedInput(MalformedReason::Truncated {
                field: "sysex_pad",
                ..
            })
        ));
        assert!(parse_frame(&[]).is_err());
    }

    #[test]
    fn out_of_range_pad_note() {
        let mut config = Config::default();
        config.pad_mut(3).unwrap().note = 300;
        let err = serialize(&config).unwrap_err();
        assert_eq!(
            err,
            CodecError::OutOfRange {
                field: "pads",
                value: 300
            }
        );
        assert!(!err.is_recoverable());

        config.pad_mut(3).unwrap().note = -1;
        assert!(serialize(&config).is_err());
    }

    #[test]
    fn constants_are_rewritten() {
        let mut frame = default_frame();
        frame[0] = 0;
        frame[336] = 1;
        let last = frame.len() - 1;
        frame[last] = 0;
        let frame = serialize(&parse_frame(&frame).unwrap()).unwrap();
        assert_eq!(&frame[..8], &[240, 71, 127, 84, 100, 22, 78, 1]);
        assert_eq!(&frame[335..339], &SYSEX_END);
        assert_eq!(frame[last], SYSEX_FINAL);
    }
}
