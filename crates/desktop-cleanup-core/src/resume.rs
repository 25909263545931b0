use tracing::{error, info, warn};

use crate::cleaner::ShortcutCleaner;
use crate::error::Error;
use crate::handoff::HandoffFile;
use crate::platform::Relauncher;
use crate::presenter::Presenter;

/// Where this process stands in an escalation lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    /// No handoff pending. A permission failure may escalate once.
    Fresh,
    /// Started from a handoff; escalation was already spent.
    Resuming,
    /// Handoff written and relaunch requested; this process should exit.
    Escalating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Fresh,
    /// A malformed handoff was found and removed.
    DiscardedHandoff,
    /// A handoff was replayed to completion.
    Resumed { cleaned: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Completed { cleaned: usize },
    /// An elevated copy was launched to finish the job. Exit now.
    Relaunched,
}

pub struct ResumeController<P, R> {
    cleaner: ShortcutCleaner,
    handoff: HandoffFile,
    presenter: P,
    relauncher: R,
    state: ResumeState,
}

impl<P: Presenter, R: Relauncher> ResumeController<P, R> {
    pub fn new(cleaner: ShortcutCleaner, handoff: HandoffFile, presenter: P, relauncher: R) -> Self {
        Self {
            cleaner,
            handoff,
            presenter,
            relauncher,
            state: ResumeState::Fresh,
        }
    }

    pub fn state(&self) -> ResumeState {
        self.state
    }

    pub fn cleaner(&self) -> &ShortcutCleaner {
        &self.cleaner
    }

    pub fn handoff(&self) -> &HandoffFile {
        &self.handoff
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Process start. A pending handoff is loaded, shown with its marks and
    /// replayed without asking again.
    pub fn start(&mut self) -> Result<StartOutcome, Error> {
        self.state = ResumeState::Fresh;

        let restored = match self.handoff.load() {
            Ok(Some(set)) => set,
            Ok(None) => return Ok(StartOutcome::Fresh),
            Err(Error::CorruptHandoff(reason)) => {
                warn!("Ignoring corrupt handoff: {}", reason);
                self.cleaner.shortcuts_mut().clear();
                return Ok(StartOutcome::DiscardedHandoff);
            }
            Err(err) => return Err(self.surface(err)),
        };

        info!(
            "Resuming cleanup of {} marked shortcuts from {}",
            restored.marked_paths().len(),
            self.handoff.path().display()
        );
        self.state = ResumeState::Resuming;
        self.cleaner.replace_shortcuts(restored);
        self.presenter.show_elevated();
        self.presenter.render(self.cleaner.shortcuts().records());

        match self.process_marked()? {
            CleanupOutcome::Completed { cleaned } => Ok(StartOutcome::Resumed { cleaned }),
            // process_marked never escalates from Resuming
            CleanupOutcome::Relaunched => Ok(StartOutcome::Resumed { cleaned: 0 }),
        }
    }

    /// List the roots again and show the result.
    pub fn scan(&mut self) -> Result<usize, Error> {
        let found = match self.cleaner.scan() {
            Ok(set) => set.len(),
            Err(err) => return Err(self.surface(err)),
        };
        self.presenter.render(self.cleaner.shortcuts().records());
        Ok(found)
    }

    /// Clean whatever the operator has checked, in presented order.
    pub fn clean_up(&mut self) -> Result<CleanupOutcome, Error> {
        let checked = match self.presenter.checked_paths() {
            Ok(checked) => checked,
            Err(err) => return Err(self.surface(err.into())),
        };

        let mut unknown: Vec<&String> = checked
            .iter()
            .filter(|path| !self.cleaner.shortcuts().contains(path))
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            let err = Error::Lookup(unknown[0].clone());
            return Err(self.surface(err));
        }

        self.cleaner.shortcuts_mut().set_marks(&checked);
        self.process_marked()
    }

    fn process_marked(&mut self) -> Result<CleanupOutcome, Error> {
        let mut cleaned = 0;

        for path in self.cleaner.shortcuts().marked_paths() {
            match self.cleaner.clean(&path) {
                Ok(()) => {
                    self.presenter.remove_row(&path);
                    cleaned += 1;
                }
                Err(Error::PermissionDenied { path, source }) => {
                    return self.escalate_or_fail(path, source);
                }
                Err(err) => {
                    if self.state == ResumeState::Resuming {
                        self.end_lineage();
                    }
                    return Err(self.surface(err));
                }
            }
        }

        if self.state == ResumeState::Resuming {
            self.end_lineage();
            info!("Resumed cleanup finished, {} shortcuts moved", cleaned);
        }
        Ok(CleanupOutcome::Completed { cleaned })
    }

    fn escalate_or_fail(&mut self, path: String, source: std::io::Error) -> Result<CleanupOutcome, Error> {
        if self.state != ResumeState::Fresh {
            // Escalation is spent for this lineage.
            self.end_lineage();
            let err = Error::InsufficientPrivileges(format!("{}: {}", path, source));
            return Err(self.surface(err));
        }

        warn!("Permission denied moving {}, escalating", path);
        self.state = ResumeState::Escalating;
        if let Err(err) = self.handoff.save(self.cleaner.shortcuts()) {
            self.end_lineage();
            return Err(self.surface(err));
        }

        match self.relauncher.relaunch_elevated(self.handoff.path()) {
            Ok(()) => Ok(CleanupOutcome::Relaunched),
            Err(err) => {
                self.end_lineage();
                Err(self.surface(err))
            }
        }
    }

    /// Remove the handoff and go back to Fresh, so a later plain launch is
    /// not mistaken for a pending resume.
    fn end_lineage(&mut self) {
        if let Err(err) = self.handoff.delete() {
            error!(
                "Could not remove handoff file {}: {}",
                self.handoff.path().display(),
                err
            );
        }
        self.state = ResumeState::Fresh;
    }

    fn surface(&mut self, err: Error) -> Error {
        error!("{}", err);
        self.presenter.show_fatal_error(&err.to_string());
        err
    }
}
