pub mod cleaner;
pub mod config;
pub mod error;
pub mod handoff;
pub mod platform;
pub mod presenter;
pub mod resume;
pub mod scanner;
pub mod shortcut;

pub use cleaner::{FileMover, FsMover, ShortcutCleaner};
pub use config::{AppConfig, CleanupRoot, CleanupRoots};
pub use error::Error;
pub use handoff::HandoffFile;
pub use platform::{ElevatedRelauncher, Relauncher};
pub use presenter::{Presenter, SilentPresenter};
pub use resume::{CleanupOutcome, ResumeController, ResumeState, StartOutcome};
pub use shortcut::{ActiveSet, ShortcutRecord};
