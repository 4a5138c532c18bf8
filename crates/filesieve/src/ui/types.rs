//! Types and enums used across the UI

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bulk::{BulkReport, OperationKind};
use crate::presenter::ProgressUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Browser,
    FilterInput,
    DirectoryInput,
    RenameInput,
    Confirm,
    Working,
    Notice,
    Preview,
    Help,
}

/// What the typed directory is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryPurpose {
    Browse,
    CopyDestination,
}

impl DirectoryPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            DirectoryPurpose::Browse => "Browse Folder",
            DirectoryPurpose::CopyDestination => "Select Destination Folder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameField {
    Pattern,
    Replacement,
}

/// A bulk operation running on a blocking worker
pub struct ActiveOperation {
    pub kind: OperationKind,
    pub handle: JoinHandle<BulkReport>,
    pub progress_rx: mpsc::UnboundedReceiver<ProgressUpdate>,
    pub cancelled: Arc<AtomicBool>,
    pub progress: Option<ProgressUpdate>,
}
