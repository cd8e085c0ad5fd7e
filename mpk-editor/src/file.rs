use crate::error::MpkEditorError;
use camino::Utf8Path;
use error_logger_macro::log_errors;
use mpk_object::codec::FRAME_LEN;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammeFileType {
    /// A raw programme frame as the controller sends it.
    Sysex,
}

impl FromStr for ProgrammeFileType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ".syx" | "syx" | ".sysex" | "sysex" => Ok(Self::Sysex),
            _ => Err(()),
        }
    }
}

#[instrument]
#[log_errors]
pub fn expect_our_file_types(ext: Option<&str>) -> Result<ProgrammeFileType, MpkEditorError> {
    let Ok(Some(file_type)) = ext.map(str::parse).transpose() else {
        return Err(MpkEditorError::from(
            "File Error: Invalid file type. Only .syx or .sysex files are allowed.",
        ));
    };

    Ok(file_type)
}

#[instrument]
#[log_errors]
pub fn load_frame(path: &Utf8Path) -> Result<Vec<u8>, MpkEditorError> {
    match expect_our_file_types(path.extension())? {
        ProgrammeFileType::Sysex => {
            if !path.is_file() {
                return Err(MpkEditorError::from(format!(
                    "Load Error: {path} does not exist or it is not a file."
                )));
            }

            let bytes = std::fs::read(path)?;
            if bytes.len() != FRAME_LEN {
                warn!(
                    len = bytes.len(),
                    "Load Warning: The file is not a standard {FRAME_LEN} byte frame."
                );
            }

            debug!("Programme loaded from {path} (sysex).");
            Ok(bytes)
        }
    }
}

#[instrument(skip(bytes), fields(len = bytes.len()))]
#[log_errors]
pub fn save_frame(path: &Utf8Path, bytes: &[u8]) -> Result<(), MpkEditorError> {
    match expect_our_file_types(path.extension())? {
        ProgrammeFileType::Sysex => {
            std::fs::write(path, bytes)?;
            debug!("Programme saved to {path} (sysex).");
            Ok(())
        }
    }
}
