#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::significant_drop_tightening
)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod autofill;
pub mod codec;
pub mod config;
pub mod error;
pub mod parse;
pub mod query;
pub mod types;
pub mod units;
pub mod value;

pub use api::Response;
pub use config::{Config, Knob, Pad};
pub use error::MpkObjectError;
pub use query::{ProgrammeQuery, SysexCompatible};
pub use types::CommandType;
pub use value::{MpkValue, MpkValueList};

use config::PROGRAMME_COUNT;
use error::QueryError;
use error_logger_macro::log_errors;
use parking_lot::Mutex;
use parse::{
    parse_command,
    types::{ObjectTypeSelector, ParsedValue},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, instrument, trace};

/// The eight programme slots of the controller and the assembler for incoming
/// sysex.
pub struct MpkObject {
    pub programmes: Arc<Mutex<[Config; PROGRAMME_COUNT]>>,
    pub sysex_in_buffer: Arc<Mutex<Vec<u8>>>,
    pub buffering_sysex: AtomicBool,
}

impl Default for MpkObject {
    fn default() -> Self {
        Self {
            programmes: Arc::new(Mutex::new(std::array::from_fn(|index| {
                Config::default().copied_to(index as i32 + 1)
            }))),
            sysex_in_buffer: Arc::new(Mutex::new(Vec::with_capacity(codec::FRAME_LEN))),
            buffering_sysex: AtomicBool::new(false),
        }
    }
}

impl MpkObject {
    const SYSEX_START: u8 = 0xF0;
    const SYSEX_END: u8 = 0xF7;

    /// Feeds one byte of incoming midi.
    ///
    /// Returns the slot which was updated once a frame is complete.
    /// Bytes outside of a sysex message are ordinary midi traffic. They are
    /// reported as [`MpkObjectError::StrayByte`] and only traced.
    #[instrument(skip(self), level = "trace")]
    pub fn handle_sysex_byte(&self, byte: u8) -> Result<Option<usize>, MpkObjectError> {
        if byte != Self::SYSEX_START && !self.buffering_sysex.load(Ordering::Acquire) {
            trace!(byte, "Stray byte outside of a sysex message.");
            return Err(MpkObjectError::StrayByte(byte));
        }

        let mut sysex_buffer = self.sysex_in_buffer.lock();

        if byte == Self::SYSEX_START {
            self.buffering_sysex.store(true, Ordering::Release);
            // Drop any previous incomplete message.
            sysex_buffer.clear();
        }

        sysex_buffer.push(byte);

        if byte != Self::SYSEX_END {
            return Ok(None);
        }

        self.buffering_sysex.store(false, Ordering::Release);
        let frame = std::mem::take(&mut *sysex_buffer);
        drop(sysex_buffer);

        Ok(Some(self.handle_sysex(&frame)?))
    }

    /// Parses a complete frame and stores it in the slot it names.
    ///
    /// The slot is only replaced when the whole frame parsed.
    #[instrument(skip(self, frame), fields(len = frame.len()))]
    #[log_errors(warn)]
    pub fn handle_sysex(&self, frame: &[u8]) -> Result<usize, MpkObjectError> {
        let config = codec::parse_frame(frame)?;
        let slot = self.set_programme(config)?;
        debug!(slot, "Programme received.");
        Ok(slot)
    }

    /// Builds the request for a programme dump.
    #[instrument]
    #[log_errors]
    pub fn prepare_query(programme: isize) -> Result<Vec<u8>, MpkObjectError> {
        ProgrammeQuery::new(programme)?.as_sysex()
    }

    /// Serializes the programme held in `programme`.
    #[instrument(skip(self))]
    #[log_errors]
    pub fn prepare_sysex(&self, programme: isize) -> Result<Vec<u8>, MpkObjectError> {
        let index = slot_index(programme)?;
        let programmes = self.programmes.lock();
        programmes[index].as_sysex()
    }

    #[instrument(skip(self))]
    #[log_errors]
    pub fn programme(&self, programme: isize) -> Result<Config, MpkObjectError> {
        let index = slot_index(programme)?;
        Ok(self.programmes.lock()[index].clone())
    }

    /// Stores a programme in the slot its `programme` field names.
    #[instrument(skip(self, config), fields(programme = config.programme))]
    #[log_errors]
    pub fn set_programme(&self, config: Config) -> Result<usize, MpkObjectError> {
        let index = slot_index(config.programme as isize)?;
        self.programmes.lock()[index] = config;
        Ok(index + 1)
    }

    /// Copies a programme into another slot, retargeting it.
    #[instrument(skip(self))]
    #[log_errors]
    pub fn copy_programme(&self, from: isize, to: isize) -> Result<(), MpkObjectError> {
        let source = slot_index(from)?;
        let target = slot_index(to)?;
        let mut programmes = self.programmes.lock();
        programmes[target] = programmes[source].copied_to(to as i32);
        Ok(())
    }

    #[instrument(skip(self))]
    #[log_errors]
    pub fn command(
        &self,
        selector: CommandType,
        values: &MpkValueList,
    ) -> Result<Response, MpkObjectError> {
        let tokens = parse_command(values, selector)?;
        let Some(ParsedValue::ObjectType(ObjectTypeSelector::Programme(programme))) =
            tokens.first().cloned()
        else {
            return Err(MpkObjectError::from(
                "Invalid format: The command needs a programme.",
            ));
        };

        let index = slot_index(programme as isize)?;
        let mut programmes = self.programmes.lock();
        api::handle(&mut programmes[index], &tokens, selector)
    }
}

fn slot_index(programme: isize) -> Result<usize, QueryError> {
    match usize::try_from(programme) {
        Ok(slot) if (1..=PROGRAMME_COUNT).contains(&slot) => Ok(slot - 1),
        _ => Err(QueryError::InvalidProgramme(programme)),
    }
}
