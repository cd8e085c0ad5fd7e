/// Why a device response could not be turned into a programme.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("no response was received from the device")]
    Absent,
    #[error("field {field} needs {needed} bytes but the response is {len} bytes long")]
    Truncated {
        field: &'static str,
        needed: usize,
        len: usize,
    },
}

/// Errors of the programme codec.
///
/// `MalformedInput` is recoverable by requesting the programme again,
/// `OutOfRange` has to be fixed in the model before serializing again.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed input: {0}.")]
    MalformedInput(MalformedReason),
    #[error("Out of range: {field} holds {value} which does not fit in a sysex byte.")]
    OutOfRange { field: &'static str, value: i32 },
}

impl CodecError {
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid programme: {0}. Programme slots are numbered from 1 to 8.")]
    InvalidProgramme(isize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format: The command needs a target. Try programme <1-8>.")]
    TargetMissing,
    #[error("Invalid target: {0}. The only target is programme.")]
    InvalidTarget(String),
    #[error("Invalid format: {0} must be followed by an integer index.")]
    IndexMissing(&'static str),
    #[error("Index out of range: {value} is not a valid {name}. It must be between {min} and {max}.")]
    IndexOutOfRange {
        name: &'static str,
        min: isize,
        max: isize,
        value: isize,
    },
    #[error("Invalid field: {0}.")]
    InvalidField(String),
    #[error("Invalid format: {0} needs a value to set.")]
    ValueMissing(String),
    #[error("Invalid value: {value} can not be assigned to {field}.")]
    InvalidValue { field: String, value: String },
    #[error("Invalid format: Unexpected token {0}.")]
    UnexpectedToken(String),
    #[error("Invalid format: The command ended unexpectedly.")]
    UnexpectedEnd,
    #[error("Invalid command type: {0}. Try get or set.")]
    InvalidCommandType(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GetError {
    #[error("Get error: {0} is not a readable field.")]
    InvalidField(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SetError {
    #[error("Set error: {0} is not a writable field.")]
    InvalidField(String),
    #[error("Set error: {0} needs a value.")]
    ValueMissing(String),
}

/// Wrapper error type for all errors of the programme object.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MpkObjectError {
    #[error("{0}")]
    Custom(String),
    #[error("Invalid input: Stray byte {0:#04X} received outside of a sysex message.")]
    StrayByte(u8),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Get(#[from] GetError),
    #[error(transparent)]
    Set(#[from] SetError),
}

impl From<&str> for MpkObjectError {
    fn from(s: &str) -> Self {
        Self::Custom(s.to_string())
    }
}

impl From<String> for MpkObjectError {
    fn from(s: String) -> Self {
        Self::Custom(s)
    }
}
