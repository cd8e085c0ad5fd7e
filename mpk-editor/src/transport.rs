//! Midi connection to the controller.
//!
//! The editor only ever talks sysex. Incoming messages are handed over from the
//! midi callback thread through a channel and picked up with a timeout.

use crate::error::TransportError;
use flume::{Receiver, RecvTimeoutError};
use midir::{Ignore, MidiIO, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const PORT_ENV_VAR: &str = "MPK_PORT";
pub const TIMEOUT_ENV_VAR: &str = "MPK_TIMEOUT_MS";

const CLIENT_NAME: &str = "mpk-editor";
const DEFAULT_PORT_FRAGMENTS: &[&str] = &["MPKmini", "MPK mini"];
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

pub trait Transport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// The next chunk of incoming midi, `None` when nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// A port is used when its name contains any of these.
    pub port_fragments: Vec<String>,
    pub timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            port_fragments: DEFAULT_PORT_FRAGMENTS
                .iter()
                .map(|fragment| (*fragment).to_owned())
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportSettings {
    #[instrument]
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(PORT_ENV_VAR).ok().as_deref(),
            std::env::var(TIMEOUT_ENV_VAR).ok().as_deref(),
        )
    }

    fn from_values(port: Option<&str>, timeout_ms: Option<&str>) -> Self {
        let mut settings = Self::default();

        if let Some(port) = port.filter(|port| !port.is_empty()) {
            settings.port_fragments = vec![port.to_owned()];
        }

        if let Some(timeout_ms) = timeout_ms {
            match timeout_ms.parse::<u64>() {
                Ok(ms) => settings.timeout = Duration::from_millis(ms),
                Err(_) => warn!(
                    "{TIMEOUT_ENV_VAR} must be a number of milliseconds, using the default of {} ms.",
                    DEFAULT_TIMEOUT.as_millis()
                ),
            }
        }

        settings
    }

    fn matches(&self, port_name: &str) -> bool {
        self.port_fragments
            .iter()
            .any(|fragment| port_name.contains(fragment.as_str()))
    }
}

pub struct MidirTransport {
    // Dropping the connection closes the input port.
    _input: MidiInputConnection<()>,
    output: MidiOutputConnection,
    from_device: Receiver<Vec<u8>>,
}

impl MidirTransport {
    #[instrument]
    pub fn connect(settings: &TransportSettings) -> Result<Self, TransportError> {
        let (sender, receiver) = flume::unbounded();

        let mut midi_in =
            MidiInput::new(CLIENT_NAME).map_err(|err| TransportError::Init(err.to_string()))?;
        // Sysex is ignored by default.
        midi_in.ignore(Ignore::None);
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|err| TransportError::Init(err.to_string()))?;

        let (in_port, in_name) = find_port(&midi_in, settings, "input")?;
        let (out_port, out_name) = find_port(&midi_out, settings, "output")?;

        let input = midi_in
            .connect(
                &in_port,
                CLIENT_NAME,
                move |_stamp, message, _data| {
                    // The receiver only goes away when the transport is dropped.
                    let _ = sender.send(message.to_vec());
                },
                (),
            )
            .map_err(|err| TransportError::Connect {
                port: in_name.clone(),
                reason: err.to_string(),
            })?;

        let output = midi_out
            .connect(&out_port, CLIENT_NAME)
            .map_err(|err| TransportError::Connect {
                port: out_name.clone(),
                reason: err.to_string(),
            })?;

        debug!(input = %in_name, output = %out_name, "Connected to the controller.");

        Ok(Self {
            _input: input,
            output,
            from_device: receiver,
        })
    }
}

fn find_port<T: MidiIO>(
    io: &T,
    settings: &TransportSettings,
    direction: &'static str,
) -> Result<(T::Port, String), TransportError> {
    io.ports()
        .into_iter()
        .find_map(|port| {
            let name = io.port_name(&port).ok()?;
            settings.matches(&name).then_some((port, name))
        })
        .ok_or_else(|| TransportError::PortNotFound {
            direction,
            fragments: settings.port_fragments.join(" or "),
        })
}

impl Transport for MidirTransport {
    #[instrument(skip(self, message), fields(len = message.len()))]
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.output
            .send(message)
            .map_err(|err| TransportError::Send(err.to_string()))
    }

    #[instrument(skip(self))]
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.from_device.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

/// Keeps what was sent and replays queued replies.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub sent: Vec<Vec<u8>>,
    pub replies: std::collections::VecDeque<Vec<u8>>,
}

#[cfg(test)]
impl Transport for MemoryTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.sent.push(message.to_vec());
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.replies.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_the_controller() {
        let settings = TransportSettings::from_values(None, None);
        assert_eq!(settings.timeout, Duration::from_secs(2));
        assert!(settings.matches("MPKmini2 MIDI 1"));
        assert!(settings.matches("MPK mini 3"));
        assert!(!settings.matches("Digitakt"));
    }

    #[test]
    fn settings_are_overridden() {
        let settings = TransportSettings::from_values(Some("Loopback"), Some("500"));
        assert_eq!(settings.timeout, Duration::from_millis(500));
        assert!(settings.matches("Loopback A"));
        assert!(!settings.matches("MPKmini2"));
    }

    #[test]
    fn bad_timeouts_fall_back() {
        let settings = TransportSettings::from_values(Some(""), Some("soon"));
        assert_eq!(settings, TransportSettings::default());
    }
}
