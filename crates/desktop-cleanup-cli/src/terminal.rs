use chrono::Local;
use colored::*;
use std::collections::{BTreeSet, HashSet};
use std::io::{self, Write};

use desktop_cleanup_core::{Presenter, ShortcutRecord};

/// Presents the shortcut table on the terminal and reads the selection from stdin.
#[derive(Default)]
pub struct TerminalPresenter {
    rows: Vec<ShortcutRecord>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, rows: &[ShortcutRecord]) {
        self.rows = rows.to_vec();
        print_table(&self.rows);
    }

    fn checked_paths(&mut self) -> io::Result<HashSet<String>> {
        if self.rows.is_empty() {
            return Ok(HashSet::new());
        }

        let selected = loop {
            let input = prompt_line("Rows to clean (e.g. 1,3-5, all; empty for none): ")?;
            match parse_selection(&input, self.rows.len()) {
                Ok(selected) => break selected,
                Err(msg) => eprintln!("  {}", msg.yellow()),
            }
        };
        if selected.is_empty() {
            return Ok(HashSet::new());
        }

        let prompt = format!("Move {} shortcut(s) to the Unused folders?", selected.len());
        if !prompt_confirm(&prompt, Some(false))? {
            return Ok(HashSet::new());
        }

        Ok(selected
            .into_iter()
            .map(|row| self.rows[row - 1].path.clone())
            .collect())
    }

    fn remove_row(&mut self, path: &str) {
        if let Some(idx) = self.rows.iter().position(|r| r.path == path) {
            let row = self.rows.remove(idx);
            eprintln!("  {} {}", "✓".green(), row.name);
        }
    }

    fn show_fatal_error(&mut self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    fn show_elevated(&mut self) {
        println!("{}", "Desktop Cleanup (elevated)".cyan().bold());
    }
}

pub fn print_table(rows: &[ShortcutRecord]) {
    if rows.is_empty() {
        println!("{}", "No shortcuts found.".dimmed());
        return;
    }

    let name_width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(4).max(4);
    let header = format!(
        "{:>4}  {}  {:<name_width$}  {:<19}  {}",
        "#",
        "   ",
        "Name",
        "Accessed",
        "Location",
        name_width = name_width
    );
    println!("{}", header.bold());
    for (idx, row) in rows.iter().enumerate() {
        let check = if row.mark { "[x]" } else { "[ ]" };
        println!(
            "{:>4}  {}  {:<name_width$}  {:<19}  {}",
            idx + 1,
            check,
            row.name,
            row.accessed
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            row.parent.dimmed(),
            name_width = name_width
        );
    }
}

/// 1-based row numbers from input like `1,3-5`, `all`, or nothing.
pub fn parse_selection(input: &str, row_count: usize) -> Result<BTreeSet<usize>, String> {
    let input = input.trim();
    let mut selected = BTreeSet::new();

    if input.eq_ignore_ascii_case("all") {
        selected.extend(1..=row_count);
        return Ok(selected);
    }

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_row(a, row_count)?, parse_row(b, row_count)?),
            None => {
                let row = parse_row(part, row_count)?;
                (row, row)
            }
        };
        if start > end {
            return Err(format!("Range {} runs backwards", part));
        }
        selected.extend(start..=end);
    }

    Ok(selected)
}

fn parse_row(text: &str, row_count: usize) -> Result<usize, String> {
    let row: usize = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a row number", text.trim()))?;
    if row == 0 || row > row_count {
        return Err(format!("Row {} is out of range 1-{}", row, row_count));
    }
    Ok(row)
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    let mut input = String::new();
    print!("{}", prompt);
    io::stdout().flush()?;
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    loop {
        let input = match default {
            Some(true) => prompt_line(&format!("{} (Y/n): ", prompt))?,
            Some(false) | None => prompt_line(&format!("{} (y/N): ", prompt))?,
        };

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
