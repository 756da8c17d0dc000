use std::path::PathBuf;

use thiserror::Error;
use vid_loop_finder_lib::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Video file not found: {}", .0.display())]
    VideoNotFound(PathBuf),

    #[error("Failed to load config file {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Analysis failed: {0}")]
    Analysis(#[from] Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn print_error_and_quit(e: eyre::Report) -> ! {
    #[allow(clippy::print_stderr)]
    let () = eprintln!("{:?}", e);
    std::process::exit(1);
}
