use crate::{
    error::{MpkEditorError, TransportError},
    file::{load_frame, save_frame},
    tracing_setup::{parse_level, LoggingState},
    transport::{MidirTransport, Transport, TransportSettings},
    utils::make_utf8_path_buf_respect_tilde,
};
use camino::Utf8PathBuf;
use error_logger_macro::log_errors;
use mpk_object::{
    autofill::{Direction, KnobAutofill, NoteFill, PadAutofill, PadBank, Scale, Sequence},
    config::{knob_field, pad_field},
    error::{CodecError, MalformedReason},
    units, CommandType, Config, MpkObject, MpkObjectError, MpkValue, MpkValueList, Response,
};
use std::{
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn, Level};

const USAGE: &str = "\
usage: mpk-editor [--verbose | --log-level <level>] <selector> ...

  pull <slot> <file>                                 receive a programme from the controller
  push <file>                                        send a programme to the controller
  show <file>                                        print every value of a programme
  get <file> <field> | pad <n> <field> | knob <n> <field>
  set <file> <field> <value> | pad <n> <field> <value> | knob <n> <field> <value>
  copy <file> <slot> <out>                           retarget a programme to another slot
  autofill <file> pads <a|b> <scale> <root> [down]
  autofill <file> knobs <cc-start> [down]
  request <slot>                                     print the request for a programme dump
  new <file> [slot]                                  write a factory default programme";

pub struct MpkEditor {
    pub inner: MpkObject,
    pub logging_state: Arc<LoggingState>,
    settings: TransportSettings,
    transport: Option<Box<dyn Transport>>,
}

impl MpkEditor {
    const SELECTOR_PULL: &'static str = "pull";
    const SELECTOR_PUSH: &'static str = "push";
    const SELECTOR_SHOW: &'static str = "show";
    const SELECTOR_GET: &'static str = "get";
    const SELECTOR_SET: &'static str = "set";
    const SELECTOR_COPY: &'static str = "copy";
    const SELECTOR_AUTOFILL: &'static str = "autofill";
    const SELECTOR_REQUEST: &'static str = "request";
    const SELECTOR_NEW: &'static str = "new";
    const SELECTOR_HELP: &'static str = "help";

    const FLAG_VERBOSE: &'static str = "--verbose";
    const FLAG_LOG_LEVEL: &'static str = "--log-level";

    /// The midi connection is opened on first use.
    pub fn new(logging_state: Arc<LoggingState>, settings: TransportSettings) -> Self {
        Self {
            inner: MpkObject::default(),
            logging_state,
            settings,
            transport: None,
        }
    }

    pub fn with_transport(
        logging_state: Arc<LoggingState>,
        settings: TransportSettings,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new(logging_state, settings)
        }
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    pub fn run(&mut self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let args = self.apply_flags(args)?;
        let Some((selector, rest)) = args.split_first() else {
            writeln!(out, "{USAGE}")?;
            return Ok(());
        };

        match selector.as_str() {
            Self::SELECTOR_PULL => self.pull(rest, out),
            Self::SELECTOR_PUSH => self.push(rest, out),
            Self::SELECTOR_SHOW => self.show(rest, out),
            Self::SELECTOR_GET => self.command(CommandType::Get, rest, out),
            Self::SELECTOR_SET => self.command(CommandType::Set, rest, out),
            Self::SELECTOR_COPY => self.copy(rest, out),
            Self::SELECTOR_AUTOFILL => self.autofill(rest, out),
            Self::SELECTOR_REQUEST => Self::request(rest, out),
            Self::SELECTOR_NEW => self.new_programme(rest, out),
            Self::SELECTOR_HELP => Ok(writeln!(out, "{USAGE}")?),
            _ => Err(MpkEditorError::from(format!("Invalid selector: {selector}. Possible selectors are pull, push, show, get, set, copy, autofill, request, new, help."))),
        }
    }

    /// Strips the logging flags, applying them on the way.
    fn apply_flags(&self, args: &[String]) -> Result<Vec<String>, MpkEditorError> {
        let mut remaining = Vec::with_capacity(args.len());
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let level = match arg.as_str() {
                Self::FLAG_VERBOSE => Level::DEBUG,
                Self::FLAG_LOG_LEVEL => iter
                    .next()
                    .and_then(|level| parse_level(level))
                    .ok_or_else(|| {
                        MpkEditorError::from(
                            "Invalid format: --log-level needs one of error, warn, info, debug or trace.",
                        )
                    })?,
                _ => {
                    remaining.push(arg.clone());
                    continue;
                }
            };
            self.logging_state.change_log_level(level)?;
            debug!("Log level changed to {level}.");
        }

        Ok(remaining)
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    fn pull(&mut self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let slot = slot_arg(args, 0)?;
        let path = path_arg(args, 1)?;

        let query = MpkObject::prepare_query(slot)?;
        let timeout = self.settings.timeout;
        let transport = connected(&mut self.transport, &self.settings)?;
        transport.send(&query)?;
        let received = receive_programme(transport, &self.inner, timeout)?;

        if received != slot as usize {
            warn!(requested = slot, received, "The controller answered with another programme.");
        }

        save_frame(&path, &self.inner.prepare_sysex(received as isize)?)?;
        info!("Programme {received} saved to {path}.");
        writeln!(out, "Pulled programme {received} into {path}.")?;
        Ok(())
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    fn push(&mut self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let (_, slot) = self.load(args, 0)?;
        let sysex = self.inner.prepare_sysex(slot as isize)?;

        connected(&mut self.transport, &self.settings)?.send(&sysex)?;
        info!("Programme {slot} sent.");
        writeln!(out, "Pushed programme {slot}.")?;
        Ok(())
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    fn show(&self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let (_, slot) = self.load(args, 0)?;
        let config = self.inner.programme(slot as isize)?;
        for line in describe(&config) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Runs a get or set on the programme in a file, the programme is implied.
    #[instrument(skip(self, out))]
    #[log_errors]
    fn command(
        &self,
        command_type: CommandType,
        args: &[String],
        out: &mut impl Write,
    ) -> Result<(), MpkEditorError> {
        let (path, slot) = self.load(args, 0)?;

        let mut values = MpkValueList::from(vec![
            MpkValue::Symbol(mpk_object::api::object_type::PROGRAMME.to_owned()),
            MpkValue::from(slot as isize),
        ]);
        values.extend(args[1..].iter().cloned().map(MpkValue::from));

        let response = self.inner.command(command_type, &values)?;
        match response {
            Response::Ok => {
                save_frame(&path, &self.inner.prepare_sysex(slot as isize)?)?;
                debug!("{values} written to {path}.");
            }
            Response::Common { value, .. } | Response::Element { value, .. } => {
                writeln!(out, "{value}")?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    fn copy(&self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let (_, from) = self.load(args, 0)?;
        let to = slot_arg(args, 1)?;
        let path = path_arg(args, 2)?;

        self.inner.copy_programme(from as isize, to)?;
        save_frame(&path, &self.inner.prepare_sysex(to)?)?;
        writeln!(out, "Copied programme {from} to programme {to} in {path}.")?;
        Ok(())
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    fn autofill(&self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let (path, slot) = self.load(args, 0)?;
        let mut config = self.inner.programme(slot as isize)?;

        match arg(args, 1, "pads or knobs")? {
            "pads" => {
                let bank = arg(args, 2, "a pad bank")?.parse::<PadBank>()?;
                let scale = arg(args, 3, "a scale")?.parse::<Scale>()?;
                let root = number_arg(args, 4, "a root note")?;
                let direction = direction_arg(args, 5)?;
                PadAutofill {
                    notes: Some(NoteFill {
                        scale,
                        root,
                        direction,
                    }),
                    ..PadAutofill::default()
                }
                .apply(&mut config, bank);
                writeln!(out, "Filled bank {bank:?} with {scale} from {root}.")?;
            }
            "knobs" => {
                let start = number_arg(args, 2, "a starting cc")?;
                let direction = direction_arg(args, 3)?;
                KnobAutofill {
                    cc: Some(Sequence::new(start, direction)),
                    ..KnobAutofill::default()
                }
                .apply(&mut config);
                writeln!(out, "Filled knobs with cc from {start}.")?;
            }
            other => {
                return Err(MpkEditorError::from(format!(
                    "Invalid format: {other} can not be autofilled. Try pads or knobs."
                )));
            }
        }

        self.inner.set_programme(config)?;
        save_frame(&path, &self.inner.prepare_sysex(slot as isize)?)?;
        Ok(())
    }

    #[instrument(skip(out))]
    #[log_errors]
    fn request(args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let query = MpkObject::prepare_query(slot_arg(args, 0)?)?;
        let bytes: Vec<String> = query.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", bytes.join(" "))?;
        Ok(())
    }

    #[instrument(skip(self, out))]
    #[log_errors]
    fn new_programme(&self, args: &[String], out: &mut impl Write) -> Result<(), MpkEditorError> {
        let path = path_arg(args, 0)?;
        let slot = if args.len() > 1 { slot_arg(args, 1)? } else { 1 };

        let slot = self.inner.set_programme(Config::default().copied_to(slot as i32))?;
        save_frame(&path, &self.inner.prepare_sysex(slot as isize)?)?;
        writeln!(out, "Wrote a default programme {slot} to {path}.")?;
        Ok(())
    }

    /// Loads the file named at `index` into its slot.
    fn load(&self, args: &[String], index: usize) -> Result<(Utf8PathBuf, usize), MpkEditorError> {
        let path = path_arg(args, index)?;
        let slot = self.inner.handle_sysex(&load_frame(&path)?)?;
        Ok((path, slot))
    }
}

fn connected<'a>(
    transport: &'a mut Option<Box<dyn Transport>>,
    settings: &TransportSettings,
) -> Result<&'a mut (dyn Transport + 'static), TransportError> {
    if transport.is_none() {
        *transport = Some(Box::new(MidirTransport::connect(settings)?));
    }
    transport.as_deref_mut().ok_or(TransportError::Disconnected)
}

/// Feeds incoming midi into the object until a programme is complete.
#[instrument(skip(transport, object))]
fn receive_programme(
    transport: &mut dyn Transport,
    object: &MpkObject,
    timeout: Duration,
) -> Result<usize, MpkEditorError> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let chunk = if remaining.is_zero() {
            None
        } else {
            transport.receive(remaining)?
        };

        let Some(chunk) = chunk else {
            return Err(CodecError::MalformedInput(MalformedReason::Absent).into());
        };

        for byte in chunk {
            // Clock bytes and other sysex replies may arrive before the dump.
            match object.handle_sysex_byte(byte) {
                Ok(Some(slot)) => return Ok(slot),
                Ok(None) | Err(MpkObjectError::StrayByte(_)) => {}
                Err(MpkObjectError::Codec(err)) if err.is_recoverable() => {
                    debug!("Skipping a message which is not a programme: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str, MpkEditorError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("Invalid format: Expected {what} at position {}.", index + 1).into())
}

fn path_arg(args: &[String], index: usize) -> Result<Utf8PathBuf, MpkEditorError> {
    Ok(make_utf8_path_buf_respect_tilde(arg(args, index, "a file")?))
}

fn slot_arg(args: &[String], index: usize) -> Result<isize, MpkEditorError> {
    let value = arg(args, index, "a programme slot")?;
    value
        .parse::<isize>()
        .map_err(|_| format!("Invalid value: {value} is not a programme slot.").into())
}

fn number_arg(args: &[String], index: usize, what: &str) -> Result<i32, MpkEditorError> {
    let value = arg(args, index, what)?;
    value
        .parse::<i32>()
        .map_err(|_| format!("Invalid value: {value} is not {what}.").into())
}

fn direction_arg(args: &[String], index: usize) -> Result<Direction, MpkEditorError> {
    args.get(index)
        .map_or(Ok(Direction::Up), |direction| direction.parse::<Direction>())
        .map_err(Into::into)
}

/// Every value of a programme, one line each.
pub fn describe(config: &Config) -> Vec<String> {
    let mut lines = vec![format!("title {}", config.title_string())];

    for name in Config::value_names() {
        let Some(value) = config.get(name) else {
            continue;
        };
        let line = match name {
            "arp_swing" => format!("{name} {value} ({}%)", units::swing_percent(value)),
            "arp_octave" => format!("{name} {value} ({} octaves)", units::arp_octave_range(value)),
            "key_octave" => format!("{name} {value} ({:+})", units::key_octave_shift(value)),
            "key_transpose" => {
                format!("{name} {value} ({:+} semitones)", units::key_transpose_semitones(value))
            }
            _ => format!("{name} {value}"),
        };
        lines.push(line);
    }

    for (slot, pad) in config.pads() {
        let fields: Vec<String> = pad_field::PAD_FIELDS
            .iter()
            .filter_map(|field| pad.get(field).map(|value| format!("{field} {value}")))
            .collect();
        lines.push(format!("pad {slot} {}", fields.join(" ")));
    }

    for (slot, knob) in config.knobs() {
        let fields: Vec<String> = knob_field::KNOB_FIELDS
            .iter()
            .filter_map(|field| knob.get(field).map(|value| format!("{field} {value}")))
            .collect();
        lines.push(format!(
            "knob {slot} {} {} {}",
            knob_field::NAME,
            knob.name_string(),
            fields.join(" ")
        ));
    }

    lines
}
