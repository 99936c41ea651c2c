use std::path::Path;
use std::process::{Command, ExitStatus};
use anyhow::Context;
use tracing::{debug, info};
use yolo_codebase::launch::LaunchCommand;
use yolo_codebase::GenericResult;

/// Runs the command in `work_dir` and blocks until it exits.
/// Output goes straight to this process' stdout and stderr
pub fn launch(command: &LaunchCommand, work_dir: &Path) -> GenericResult<ExitStatus> {
    info!("Starting {} in {}", command.program, work_dir.display());
    debug!("{}", command);
    Command::new(&command.program)
        .args(&command.args)
        .current_dir(work_dir)
        .status()
        .with_context(|| format!("Could not start '{}'", command.program))
}

/// Exit code of a finished child. Termination by a signal counts as 1
pub fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
