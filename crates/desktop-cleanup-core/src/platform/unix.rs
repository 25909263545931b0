use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::error::Error;

/// Replace this process with `sudo <exe> <args>`. Only returns on failure.
/// sudo keeps the working directory; the handoff path and configuration
/// variables travel as hidden arguments since sudo resets the environment.
pub fn relaunch_elevated(handoff: &Path) -> Result<(), Error> {
    let (exe, args) = super::current_invocation(handoff)?;
    info!("Re-executing {} through sudo", exe.display());
    let err = Command::new("sudo")
        .arg("--preserve-env=HOME")
        .arg(&exe)
        .args(&args)
        .exec();
    Err(Error::Elevation(format!("sudo: {}", err)))
}
