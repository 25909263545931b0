#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod unix;

use std::env;
use std::path::{Path, PathBuf};

use crate::config::RootConfig;
use crate::error::Error;

/// Hidden flags the elevated copy is started with, so it finds the same
/// handoff file and configuration as the process that asked for elevation.
pub const HANDOFF_PATH_FLAG: &str = "--handoff-path";
pub const WORKING_DIR_FLAG: &str = "--working-dir";
pub const CARRY_ENV_FLAG: &str = "--carry-env";

const RELAUNCH_FLAGS: [&str; 3] = [HANDOFF_PATH_FLAG, WORKING_DIR_FLAG, CARRY_ENV_FLAG];

/// Neither sudo nor UAC pass these through on their own.
const CARRIED_ENV_PREFIX: &str = "DESKTOP_CLEANUP__";
const CARRIED_ENV_VARS: [&str; 2] = ["TRACING_LEVEL", "LOG_FILE_PATH"];

/// Restart the program with higher privileges.
///
/// `Ok(())` means an elevated copy is on its way and the current process
/// should exit. An `Err` means escalation could not be started at all.
pub trait Relauncher {
    fn relaunch_elevated(&self, handoff: &Path) -> Result<(), Error>;
}

/// Relaunches the current executable with its original arguments.
#[derive(Debug, Default)]
pub struct ElevatedRelauncher;

impl Relauncher for ElevatedRelauncher {
    #[cfg(target_os = "windows")]
    fn relaunch_elevated(&self, handoff: &Path) -> Result<(), Error> {
        windows::relaunch_elevated(handoff)
    }

    #[cfg(not(target_os = "windows"))]
    fn relaunch_elevated(&self, handoff: &Path) -> Result<(), Error> {
        unix::relaunch_elevated(handoff)
    }
}

pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// The operator's home folder name, used as the label of the personal root.
pub fn home_label() -> String {
    home_dir()
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Desktop".to_string())
}

pub fn default_roots() -> Vec<RootConfig> {
    let personal = dirs::desktop_dir().unwrap_or_else(|| home_dir().join("Desktop"));
    let mut roots = vec![RootConfig {
        label: home_label(),
        path: personal.to_string_lossy().into_owned(),
        shared: false,
    }];
    if let Some(public) = public_desktop() {
        roots.push(RootConfig {
            label: crate::config::PUBLIC_LABEL.to_string(),
            path: public.to_string_lossy().into_owned(),
            shared: true,
        });
    }
    roots
}

#[cfg(target_os = "windows")]
fn public_desktop() -> Option<PathBuf> {
    Some(windows::public_desktop())
}

#[cfg(not(target_os = "windows"))]
fn public_desktop() -> Option<PathBuf> {
    None
}

fn current_invocation(handoff: &Path) -> Result<(PathBuf, Vec<String>), Error> {
    let exe = env::current_exe()?;
    let cwd = env::current_dir()?;
    let vars = env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
    let args = relaunch_args(env::args().skip(1), handoff, &cwd, vars);
    Ok((exe, args))
}

/// Arguments for the elevated copy: the hidden context flags first, then
/// the operator's own arguments with any earlier context flags removed.
pub fn relaunch_args<A, V>(args: A, handoff: &Path, cwd: &Path, vars: V) -> Vec<String>
where
    A: IntoIterator<Item = String>,
    V: IntoIterator<Item = (String, String)>,
{
    let mut out = vec![
        format!("{}={}", HANDOFF_PATH_FLAG, handoff.display()),
        format!("{}={}", WORKING_DIR_FLAG, cwd.display()),
    ];

    let mut carried: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(key, _)| {
            key.starts_with(CARRIED_ENV_PREFIX) || CARRIED_ENV_VARS.contains(&key.as_str())
        })
        .collect();
    carried.sort();
    for (key, value) in carried {
        out.push(format!("{}={}={}", CARRY_ENV_FLAG, key, value));
    }

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if RELAUNCH_FLAGS.contains(&arg.as_str()) {
            // value given as the next argument
            args.next();
            continue;
        }
        if RELAUNCH_FLAGS
            .iter()
            .any(|flag| arg.strip_prefix(flag).is_some_and(|rest| rest.starts_with('=')))
        {
            continue;
        }
        out.push(arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaunch_args_carry_context_first() {
        let args = relaunch_args(
            vec!["run".to_string()],
            Path::new("/srv/handoff.json"),
            Path::new("/home/u/work"),
            vec![
                ("DESKTOP_CLEANUP__HANDOFF_PATH".to_string(), "/srv/handoff.json".to_string()),
                ("TRACING_LEVEL".to_string(), "debug".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ],
        );

        assert_eq!(
            args,
            vec![
                "--handoff-path=/srv/handoff.json",
                "--working-dir=/home/u/work",
                "--carry-env=DESKTOP_CLEANUP__HANDOFF_PATH=/srv/handoff.json",
                "--carry-env=TRACING_LEVEL=debug",
                "run",
            ]
        );
    }

    #[test]
    fn test_relaunch_args_drop_earlier_context_flags() {
        let args = relaunch_args(
            vec![
                "--handoff-path".to_string(),
                "/old".to_string(),
                "--carry-env=A=b".to_string(),
                "list".to_string(),
            ],
            Path::new("/new"),
            Path::new("/cwd"),
            Vec::new(),
        );

        assert_eq!(args, vec!["--handoff-path=/new", "--working-dir=/cwd", "list"]);
    }
}
