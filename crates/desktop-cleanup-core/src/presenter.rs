use std::collections::HashSet;
use std::io;

use crate::shortcut::ShortcutRecord;

/// What the core needs from whatever shows the table to the operator.
///
/// Rows are always identified by path. Row indices are the presenter's own
/// business and go stale as soon as a row is removed.
pub trait Presenter {
    /// Show `rows` in order, with each checkbox set from `mark`.
    fn render(&mut self, rows: &[ShortcutRecord]);

    /// Paths of the rows the operator has checked.
    fn checked_paths(&mut self) -> io::Result<HashSet<String>>;

    fn remove_row(&mut self, path: &str);

    fn show_fatal_error(&mut self, message: &str);

    /// Called when this run is the elevated half of a resume.
    fn show_elevated(&mut self) {}
}

/// Presenter for headless runs: shows nothing, checks nothing.
pub struct SilentPresenter;

impl Presenter for SilentPresenter {
    fn render(&mut self, _rows: &[ShortcutRecord]) {}

    fn checked_paths(&mut self) -> io::Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    fn remove_row(&mut self, _path: &str) {}

    fn show_fatal_error(&mut self, _message: &str) {}
}
