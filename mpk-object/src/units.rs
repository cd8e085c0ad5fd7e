//! Paired conversions between what is stored in a [`Config`](crate::config::Config)
//! and the numbers a user edits.
//!
//! Only the channel pair is applied by the codec itself. Every other field is
//! stored the way the device sends it, and the pairs here translate to and from
//! the values shown by an editor.

/// Number of character codes in a programme title or a knob name.
pub const TEXT_LEN: usize = 16;

pub const TEMPO_HIGH_STEP: i32 = 128;
pub const SWING_BASE: i32 = 50;
pub const KEY_OCTAVE_BASE: i32 = 4;
pub const KEY_TRANSPOSE_BASE: i32 = 12;

/// Channels travel zero based and are counted from 1 in the model.
pub const fn channel_from_wire(byte: u8) -> i32 {
    byte as i32 + 1
}

/// Inverse of [`channel_from_wire`]. `None` when the channel has no wire byte.
pub fn channel_to_wire(channel: i32) -> Option<u8> {
    channel
        .checked_sub(1)
        .and_then(|value| u8::try_from(value).ok())
}

/// The tempo pair is a flag byte for "add 128" followed by the remainder.
pub const fn tempo_bpm(pair: [i32; 2]) -> i32 {
    if pair[0] != 0 {
        pair[1] + TEMPO_HIGH_STEP
    } else {
        pair[1]
    }
}

pub const fn tempo_pair(bpm: i32) -> [i32; 2] {
    if bpm > TEMPO_HIGH_STEP {
        [1, bpm - TEMPO_HIGH_STEP]
    } else {
        [0, bpm]
    }
}

pub const fn swing_percent(stored: i32) -> i32 {
    stored + SWING_BASE
}

pub const fn swing_stored(percent: i32) -> i32 {
    percent - SWING_BASE
}

/// Arpeggiator octave range as shown on the device, 1 to 4.
pub const fn arp_octave_range(stored: i32) -> i32 {
    stored + 1
}

pub const fn arp_octave_stored(range: i32) -> i32 {
    range - 1
}

/// Keyboard octave as a signed shift around the centre octave.
pub const fn key_octave_shift(stored: i32) -> i32 {
    stored - KEY_OCTAVE_BASE
}

pub const fn key_octave_stored(shift: i32) -> i32 {
    shift + KEY_OCTAVE_BASE
}

/// Keyboard transpose in signed semitones.
pub const fn key_transpose_semitones(stored: i32) -> i32 {
    stored - KEY_TRANSPOSE_BASE
}

pub const fn key_transpose_stored(semitones: i32) -> i32 {
    semitones + KEY_TRANSPOSE_BASE
}

/// The bend range is stored one based, selectors index it from zero.
pub const fn bend_range_index(stored: i32) -> i32 {
    stored - 1
}

pub const fn bend_range_stored(index: i32) -> i32 {
    index + 1
}

/// Decodes Latin-1 character codes, dropping the zero padding at the end.
pub fn text_from_codes(codes: &[i32]) -> String {
    let used = codes
        .iter()
        .rposition(|code| *code != 0)
        .map_or(0, |last| last + 1);

    codes[..used]
        .iter()
        .map(|code| {
            u8::try_from(*code)
                .map(char::from)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect()
}

/// Encodes text as character codes, truncated to [`TEXT_LEN`] and zero padded.
///
/// Characters beyond Latin-1 keep their code point, so serializing them fails
/// instead of silently writing a different character.
pub fn text_to_codes(text: &str) -> [i32; TEXT_LEN] {
    let mut codes = [0; TEXT_LEN];
    for (code, c) in codes.iter_mut().zip(text.chars()) {
        *code = c as i32;
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_wire_is_zero_based() {
        assert_eq!(channel_from_wire(0), 1);
        assert_eq!(channel_from_wire(15), 16);
        assert_eq!(channel_to_wire(1), Some(0));
        assert_eq!(channel_to_wire(16), Some(15));
        assert_eq!(channel_to_wire(0), None);
        assert_eq!(channel_to_wire(257), None);
        assert_eq!(channel_to_wire(i32::MIN), None);
    }

    #[test]
    fn tempo_pair_splits_above_128() {
        assert_eq!(tempo_pair(120), [0, 120]);
        assert_eq!(tempo_pair(128), [0, 128]);
        assert_eq!(tempo_pair(129), [1, 1]);
        assert_eq!(tempo_pair(240), [1, 112]);
        for bpm in 30..=240 {
            assert_eq!(tempo_bpm(tempo_pair(bpm)), bpm);
        }
    }

    #[test]
    fn offsets_invert_each_other() {
        for value in -20..=150 {
            assert_eq!(swing_stored(swing_percent(value)), value);
            assert_eq!(arp_octave_stored(arp_octave_range(value)), value);
            assert_eq!(key_octave_stored(key_octave_shift(value)), value);
            assert_eq!(key_transpose_stored(key_transpose_semitones(value)), value);
            assert_eq!(bend_range_stored(bend_range_index(value)), value);
        }
        assert_eq!(swing_percent(0), 50);
        assert_eq!(key_octave_shift(4), 0);
        assert_eq!(key_transpose_semitones(12), 0);
        assert_eq!(bend_range_index(2), 1);
    }

    #[test]
    fn text_is_zero_padded() {
        let codes = text_to_codes("RPR1");
        assert_eq!(&codes[..4], &[82, 80, 82, 49]);
        assert!(codes[4..].iter().all(|code| *code == 0));
        assert_eq!(text_from_codes(&codes), "RPR1");
    }

    #[test]
    fn text_is_truncated_to_sixteen_characters() {
        let codes = text_to_codes("a name that is far too long");
        assert_eq!(text_from_codes(&codes), "a name that is f");
    }

    #[test]
    fn text_keeps_latin1() {
        assert_eq!(text_from_codes(&text_to_codes("Grüße")), "Grüße");
        assert_eq!(text_to_codes("€")[0], 0x20AC);
        assert_eq!(text_from_codes(&[0x20AC]), "\u{FFFD}");
    }
}
