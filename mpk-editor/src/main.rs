#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::significant_drop_tightening
)]

pub mod editor;
pub mod error;
pub mod file;
pub mod tracing_setup;
pub mod transport;
pub mod utils;

use editor::MpkEditor;
use std::process::ExitCode;
use tracing_setup::setup_logging;
use transport::TransportSettings;

fn main() -> ExitCode {
    let (subscriber, logging_state) = setup_logging();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {err}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut editor = MpkEditor::new(logging_state, TransportSettings::from_env());

    // Errors were logged where they happened.
    match editor.run(&args, &mut std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
