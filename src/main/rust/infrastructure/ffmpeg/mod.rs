mod command_builder;
mod process_launcher;

pub use command_builder::{CommandBuilder, DEFAULT_TRANSCODER};
pub use process_launcher::{LineSplitter, TokioProcessLauncher, DEFAULT_STOP_GRACE};
