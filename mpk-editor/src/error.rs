use mpk_object::error::MpkObjectError;

/// Failures of the midi connection to the controller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Midi error: Failed to open the midi client: {0}")]
    Init(String),
    #[error("Midi error: No {direction} port matching {fragments} was found. Set MPK_PORT to pick another port.")]
    PortNotFound {
        direction: &'static str,
        fragments: String,
    },
    #[error("Midi error: Failed to connect to {port}: {reason}")]
    Connect { port: String, reason: String },
    #[error("Midi error: Failed to send to the controller: {0}")]
    Send(String),
    #[error("Midi error: The connection to the controller was closed.")]
    Disconnected,
}

/// Wrapper error type for all editor errors.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MpkEditorError {
    #[error("{0}")]
    Custom(String),
    #[error(transparent)]
    MpkObject(#[from] MpkObjectError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<&str> for MpkEditorError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

impl From<String> for MpkEditorError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}

// Lets the object layer errors which are not wrapped yet travel with `?`.
macro_rules! from_object_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for MpkEditorError {
                fn from(err: $error) -> Self {
                    Self::MpkObject(err.into())
                }
            }
        )*
    };
}

from_object_error!(
    mpk_object::error::CodecError,
    mpk_object::error::ParseError,
    mpk_object::error::QueryError,
);
