use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::error::Error;

/// `%PUBLIC%\Desktop`, falling back to the stock location.
pub fn public_desktop() -> PathBuf {
    // '\' is required after ':' or the join produces a drive-relative path
    let public = env::var_os("PUBLIC")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("C:\\").join("Users").join("Public"));
    public.join("Desktop")
}

fn quote_ps(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `-ArgumentList` joins its items with spaces without quoting them, so an
/// argument holding a space must carry its own command-line quotes.
fn quote_cmdline(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }
    let mut quoted = String::from("\"");
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.push_str(&"\\".repeat(backslashes * 2 + 1));
                backslashes = 0;
            }
            _ => {
                quoted.push_str(&"\\".repeat(backslashes));
                backslashes = 0;
            }
        }
        if c != '\\' {
            quoted.push(c);
        }
    }
    quoted.push_str(&"\\".repeat(backslashes * 2));
    quoted.push('"');
    quoted
}

/// Ask UAC for an elevated copy of this executable. `Start-Process` returns
/// once the new process is running and fails if the prompt is declined.
/// The elevated copy starts in System32 with a fresh environment, hence the
/// hidden context arguments.
pub fn relaunch_elevated(handoff: &Path) -> Result<(), Error> {
    let (exe, args) = super::current_invocation(handoff)?;
    let mut script = format!(
        "Start-Process -FilePath {} -Verb RunAs",
        quote_ps(&exe.to_string_lossy())
    );
    if !args.is_empty() {
        let quoted: Vec<String> = args.iter().map(|a| quote_ps(&quote_cmdline(a))).collect();
        script.push_str(&format!(" -ArgumentList {}", quoted.join(",")));
    }

    info!("Requesting administrator privileges for {}", exe.display());
    let status = Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Elevation(format!("Start-Process exited with {}", status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_cmdline() {
        assert_eq!(quote_cmdline("run"), "run");
        assert_eq!(
            quote_cmdline("--working-dir=C:\\Users\\Jo Doe"),
            "\"--working-dir=C:\\Users\\Jo Doe\""
        );
        assert_eq!(quote_cmdline("C:\\a b\\"), "\"C:\\a b\\\\\"");
        assert_eq!(quote_cmdline(""), "\"\"");
    }
}
