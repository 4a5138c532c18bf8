//! Seams the presentation layer implements for the bulk operation engine

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Completion or error message shown once per operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receives per-item progress and exposes the user's cancel request.
///
/// `update` is called before each item; `is_cancelled` is polled before each
/// item, so a cancel takes effect with at most one item of latency.
pub trait ProgressSink {
    fn update(&mut self, current: usize, total: usize, status: &str);
    fn is_cancelled(&self) -> bool;
}

pub trait Presenter: ProgressSink {
    /// Ask for a destination folder; None aborts the operation
    fn choose_directory(&mut self, title: &str) -> Option<PathBuf>;
    fn confirm(&mut self, title: &str, message: &str) -> bool;
    fn notify(&mut self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current: usize,
    pub total: usize,
    pub status: String,
}

/// Progress sink for a worker thread. Updates go over an unbounded channel
/// to the UI loop, and the UI flips the shared flag to cancel.
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressUpdate>,
    cancelled: Arc<AtomicBool>,
}

impl ChannelProgress {
    pub fn new(sender: mpsc::UnboundedSender<ProgressUpdate>, cancelled: Arc<AtomicBool>) -> Self {
        Self { sender, cancelled }
    }
}

impl ProgressSink for ChannelProgress {
    fn update(&mut self, current: usize, total: usize, status: &str) {
        // The receiver only disappears when the UI is shutting down
        let _ = self.sender.send(ProgressUpdate {
            current,
            total,
            status: status.to_string(),
        });
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
