//! Line-oriented presenter for the command line subcommands

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::presenter::{Notice, NoticeLevel, Presenter, ProgressSink};

pub struct ConsolePresenter<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
    destination: Option<PathBuf>,
}

impl<R: BufRead, W: Write> ConsolePresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            assume_yes: false,
            destination: None,
        }
    }

    /// Skip confirmation prompts (`--yes`)
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Destination handed out when a copy asks for one
    pub fn with_destination(mut self, destination: PathBuf) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> ProgressSink for ConsolePresenter<R, W> {
    fn update(&mut self, current: usize, total: usize, status: &str) {
        let percentage = if total > 0 { current * 100 / total } else { 0 };
        writeln!(
            self.output,
            "  [{}/{}] {:>3}% {}",
            current,
            total,
            percentage,
            smart_truncate_path(status, 70)
        )
        .ok();
        self.output.flush().ok();
    }

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<R: BufRead, W: Write> Presenter for ConsolePresenter<R, W> {
    fn choose_directory(&mut self, _title: &str) -> Option<PathBuf> {
        self.destination.clone()
    }

    fn confirm(&mut self, title: &str, message: &str) -> bool {
        writeln!(self.output, "{}", title).ok();
        writeln!(self.output, "{}", message.trim_end()).ok();

        if self.assume_yes {
            return true;
        }

        write!(self.output, "Proceed? [y/N] ").ok();
        self.output.flush().ok();

        let mut answer = String::new();
        if self.input.read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn notify(&mut self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Warning => "warning: ",
            NoticeLevel::Error => "error: ",
        };
        writeln!(self.output, "{}{}", prefix, notice.title).ok();
        for line in notice.message.lines() {
            writeln!(self.output, "  {}", line).ok();
        }
    }
}

/// Shorten a long line by keeping the leading and trailing path components
pub fn smart_truncate_path(path: &str, max_len: usize) -> String {
    let char_count = path.chars().count();
    if char_count <= max_len {
        return path.to_string();
    }

    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() > 3 {
        let base = parts[..2].join("/");
        let end = parts[parts.len() - 2..].join("/");
        let compressed = format!("{}/.../{}", base, end);
        if compressed.chars().count() <= max_len {
            return compressed;
        }
    }

    let keep = max_len.saturating_sub(3);
    let tail: String = path
        .chars()
        .skip(char_count.saturating_sub(keep))
        .collect();
    format!("...{}", tail)
}
