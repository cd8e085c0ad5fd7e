use crate::codec;
use crate::config::{Config, PROGRAMME_COUNT};
use crate::error::{MpkObjectError, QueryError};

/// Types which can be sent to the device as a sysex message.
pub trait SysexCompatible {
    fn as_sysex(&self) -> Result<Vec<u8>, MpkObjectError>;
}

impl SysexCompatible for Config {
    fn as_sysex(&self) -> Result<Vec<u8>, MpkObjectError> {
        Ok(codec::serialize(self)?)
    }
}

/// Asks the device to dump one of its programmes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgrammeQuery {
    programme: u8,
}

impl ProgrammeQuery {
    const TEMPLATE: [u8; 14] = [240, 126, 6, 1, 127, 240, 71, 127, 84, 102, 0, 1, 1, 247];
    const PROGRAMME_INDEX: usize = 12;

    /// `programme` is the slot number, 1 to 8.
    pub fn new(programme: isize) -> Result<Self, QueryError> {
        match u8::try_from(programme) {
            Ok(slot) if (1..=PROGRAMME_COUNT as u8).contains(&slot) => Ok(Self { programme: slot }),
            _ => Err(QueryError::InvalidProgramme(programme)),
        }
    }

    pub const fn programme(&self) -> u8 {
        self.programme
    }
}

impl SysexCompatible for ProgrammeQuery {
    fn as_sysex(&self) -> Result<Vec<u8>, MpkObjectError> {
        let mut message = Self::TEMPLATE.to_vec();
        message[Self::PROGRAMME_INDEX] = self.programme;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_targets_slot() {
        let query = ProgrammeQuery::new(3).unwrap();
        assert_eq!(
            query.as_sysex().unwrap(),
            vec![240, 126, 6, 1, 127, 240, 71, 127, 84, 102, 0, 1, 3, 247]
        );
    }

    #[test]
    fn query_rejects_unknown_slots() {
        assert_eq!(ProgrammeQuery::new(0), Err(QueryError::InvalidProgramme(0)));
        assert_eq!(ProgrammeQuery::new(9), Err(QueryError::InvalidProgramme(9)));
        assert_eq!(ProgrammeQuery::new(-1), Err(QueryError::InvalidProgramme(-1)));
        assert!(ProgrammeQuery::new(8).is_ok());
    }

    #[test]
    fn config_is_sysex_compatible() {
        let sysex = Config::default().as_sysex().unwrap();
        assert_eq!(sysex.len(), codec::FRAME_LEN);

        let mut config = Config::default();
        config.arp_gate = 256;
        assert!(matches!(
            config.as_sysex(),
            Err(MpkObjectError::Codec(_))
        ));
    }
}
