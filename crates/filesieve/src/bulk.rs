//! Bulk delete / rename / copy over a selection
//!
//! Every operation runs in two phases. Planning resolves the selection
//! against the catalog and fails fast on plan-level errors before anything
//! touches the filesystem. Execution walks the plan one item at a time,
//! reporting progress before each item and polling for cancellation, and
//! records per-item failures without stopping the batch.

use regex::{NoExpand, Regex};
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, ItemDescriptor, ItemKind};
use crate::error::{BulkError, ItemError};
use crate::presenter::{Notice, ProgressSink};
use crate::selection::Selection;

/// Error lines shown in a summary before collapsing the rest
pub const MAX_ERROR_LINES: usize = 5;
/// Rename lines shown in the confirmation prompt
pub const MAX_PREVIEW_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Delete,
    Rename,
    Copy,
}

impl OperationKind {
    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::Delete => "delete",
            OperationKind::Rename => "rename",
            OperationKind::Copy => "copy",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            OperationKind::Delete => "Deleted",
            OperationKind::Rename => "Renamed",
            OperationKind::Copy => "Copied",
        }
    }

    pub fn progress_title(&self) -> &'static str {
        match self {
            OperationKind::Delete => "Deleting Items",
            OperationKind::Rename => "Renaming Items",
            OperationKind::Copy => "Copying Items",
        }
    }

    pub fn complete_title(&self) -> &'static str {
        match self {
            OperationKind::Delete => "Delete Complete",
            OperationKind::Rename => "Rename Complete",
            OperationKind::Copy => "Copy Complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Delete {
        path: PathBuf,
        name: String,
        kind: ItemKind,
    },
    Rename {
        path: PathBuf,
        old_name: String,
        new_name: String,
    },
    Copy {
        path: PathBuf,
        name: String,
        kind: ItemKind,
        destination: PathBuf,
    },
}

enum Outcome {
    Done,
    /// Source vanished before we got to it, e.g. its parent folder was
    /// deleted earlier in the same batch
    Missing,
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::Delete { name, .. } | Action::Copy { name, .. } => name,
            Action::Rename { old_name, .. } => old_name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Action::Delete { path, .. } | Action::Rename { path, .. } | Action::Copy { path, .. } => {
                path
            }
        }
    }

    /// Progress text shown while this item is in flight
    pub fn status(&self) -> String {
        match self {
            Action::Delete { name, kind, .. } => format!("Deleting {}: {}", kind.label(), name),
            Action::Rename { old_name, .. } => format!("Renaming: {}", old_name),
            Action::Copy { name, kind, .. } => format!("Copying {}: {}", kind.label(), name),
        }
    }

    fn apply(&self) -> io::Result<Outcome> {
        if let Err(e) = fs::symlink_metadata(self.path()) {
            if e.kind() == io::ErrorKind::NotFound {
                return Ok(Outcome::Missing);
            }
        }

        match self {
            Action::Delete { path, kind, .. } => match kind {
                ItemKind::File => fs::remove_file(path)?,
                ItemKind::Folder => fs::remove_dir_all(path)?,
            },
            Action::Rename {
                path,
                old_name,
                new_name,
            } => {
                validate_file_name(new_name)?;
                let target = path.with_file_name(new_name);
                let case_only = old_name.to_lowercase() == new_name.to_lowercase();
                if occupied(&target) && !(case_only && same_entry(path, &target)) {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} already exists", new_name),
                    ));
                }
                fs::rename(path, &target)?;
            }
            Action::Copy {
                path,
                name,
                kind,
                destination,
            } => {
                let target = unique_destination(destination, name, *kind);
                match kind {
                    ItemKind::File => copy_file(path, &target)?,
                    ItemKind::Folder => {
                        if is_within(destination, path) {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidInput,
                                "cannot copy a folder into itself",
                            ));
                        }
                        copy_tree(path, &target)?;
                    }
                }
            }
        }

        Ok(Outcome::Done)
    }
}

/// Pattern substitution applied to base names. Matching is always
/// case-sensitive, whatever the filter's case setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameRule {
    pub pattern: String,
    pub replacement: String,
    pub use_regex: bool,
}

/// Compiled rename rule. Literal rules are escaped so both modes share the
/// same replace-all path; literal replacements never expand `$` groups.
pub struct Renamer {
    regex: Regex,
    replacement: String,
    literal: bool,
}

impl RenameRule {
    pub fn compile(&self) -> Result<Renamer, BulkError> {
        if self.pattern.is_empty() {
            return Err(BulkError::NoPattern);
        }

        let source = if self.use_regex {
            self.pattern.clone()
        } else {
            regex::escape(&self.pattern)
        };
        let regex = Regex::new(&source)?;

        Ok(Renamer {
            regex,
            replacement: self.replacement.clone(),
            literal: !self.use_regex,
        })
    }
}

impl Renamer {
    pub fn apply(&self, name: &str) -> String {
        if self.literal {
            self.regex
                .replace_all(name, NoExpand(self.replacement.as_str()))
                .into_owned()
        } else {
            self.regex
                .replace_all(name, self.replacement.as_str())
                .into_owned()
        }
    }
}

/// Precomputed per-item actions, ready for confirmation and execution
#[derive(Debug, Clone)]
pub struct Plan {
    kind: OperationKind,
    actions: Vec<Action>,
    files: usize,
    folders: usize,
    destination: Option<PathBuf>,
}

impl Plan {
    pub fn delete(catalog: &Catalog, selection: &Selection) -> Result<Self, BulkError> {
        let (files, folders) = partition_selected(catalog, selection, OperationKind::Delete)?;

        let actions = files
            .iter()
            .chain(folders.iter())
            .map(|item| Action::Delete {
                path: item.path.clone(),
                name: item.name.clone(),
                kind: item.kind,
            })
            .collect();

        Ok(Self {
            kind: OperationKind::Delete,
            actions,
            files: files.len(),
            folders: folders.len(),
            destination: None,
        })
    }

    /// Plans renames for every selected item whose name actually changes.
    ///
    /// Deeper paths come first so that renaming a folder never invalidates
    /// the paths of selected items inside it.
    pub fn rename(
        catalog: &Catalog,
        selection: &Selection,
        rule: &RenameRule,
    ) -> Result<Self, BulkError> {
        let selected: Vec<&ItemDescriptor> = catalog
            .items()
            .iter()
            .filter(|item| selection.contains(&item.path))
            .collect();
        if selected.is_empty() {
            return Err(BulkError::NoSelection(OperationKind::Rename.verb()));
        }
        let renamer = rule.compile()?;

        let mut actions: Vec<Action> = selected
            .into_iter()
            .filter_map(|item| {
                let new_name = renamer.apply(&item.name);
                (new_name != item.name).then(|| Action::Rename {
                    path: item.path.clone(),
                    old_name: item.name.clone(),
                    new_name,
                })
            })
            .collect();
        actions.sort_by_key(|a| std::cmp::Reverse(a.path().components().count()));

        let folders = actions
            .iter()
            .filter(|a| catalog.get(a.path()).is_some_and(ItemDescriptor::is_folder))
            .count();

        Ok(Self {
            kind: OperationKind::Rename,
            files: actions.len() - folders,
            folders,
            actions,
            destination: None,
        })
    }

    pub fn copy(
        catalog: &Catalog,
        selection: &Selection,
        destination: &Path,
    ) -> Result<Self, BulkError> {
        let (files, folders) = partition_selected(catalog, selection, OperationKind::Copy)?;

        let actions = files
            .iter()
            .chain(folders.iter())
            .map(|item| Action::Copy {
                path: item.path.clone(),
                name: item.name.clone(),
                kind: item.kind,
                destination: destination.to_path_buf(),
            })
            .collect();

        Ok(Self {
            kind: OperationKind::Copy,
            actions,
            files: files.len(),
            folders: folders.len(),
            destination: Some(destination.to_path_buf()),
        })
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// (files, folders)
    pub fn counts(&self) -> (usize, usize) {
        (self.files, self.folders)
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Title and body of the confirmation prompt
    pub fn confirmation(&self) -> (String, String) {
        match self.kind {
            OperationKind::Delete => {
                let mut msg = String::from("Are you sure you want to delete:\n");
                if self.files > 0 {
                    msg.push_str(&format!("  - {} file(s)\n", self.files));
                }
                if self.folders > 0 {
                    msg.push_str(&format!(
                        "  - {} folder(s) and their contents\n",
                        self.folders
                    ));
                }
                msg.push_str("\nThis action cannot be undone!");
                ("Confirm Delete".to_string(), msg)
            }
            OperationKind::Rename => {
                let mut lines: Vec<String> = self
                    .actions
                    .iter()
                    .take(MAX_PREVIEW_LINES)
                    .filter_map(|a| match a {
                        Action::Rename {
                            old_name, new_name, ..
                        } => Some(format!("{} → {}", old_name, new_name)),
                        _ => None,
                    })
                    .collect();
                if self.actions.len() > MAX_PREVIEW_LINES {
                    lines.push(format!(
                        "... and {} more",
                        self.actions.len() - MAX_PREVIEW_LINES
                    ));
                }
                (
                    "Confirm Rename".to_string(),
                    format!(
                        "Rename {} items?\n\n{}",
                        self.actions.len(),
                        lines.join("\n")
                    ),
                )
            }
            OperationKind::Copy => {
                let dest = self
                    .destination
                    .as_deref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default();
                let mut msg = format!("Copy to {}:\n", dest);
                if self.files > 0 {
                    msg.push_str(&format!("  - {} file(s)\n", self.files));
                }
                if self.folders > 0 {
                    msg.push_str(&format!("  - {} folder(s)\n", self.folders));
                }
                ("Confirm Copy".to_string(), msg)
            }
        }
    }

    /// Run the plan sequentially. Never fails as a whole: per-item errors
    /// are collected into the report and the loop moves on.
    pub fn execute(&self, sink: &mut dyn ProgressSink) -> BulkReport {
        let total = self.actions.len();
        let mut report = BulkReport {
            kind: self.kind,
            total,
            succeeded: 0,
            skipped: 0,
            errors: Vec::new(),
            cancelled: false,
            destination: self.destination.clone(),
        };

        tracing::info!(operation = self.kind.verb(), total, "bulk operation started");

        for (i, action) in self.actions.iter().enumerate() {
            if sink.is_cancelled() {
                report.cancelled = true;
                break;
            }

            sink.update(i + 1, total, &action.status());

            match action.apply() {
                Ok(Outcome::Done) => report.succeeded += 1,
                Ok(Outcome::Missing) => {
                    tracing::debug!(path = %action.path().display(), "already gone, skipping");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %action.path().display(), error = %e, "item failed");
                    report.errors.push(ItemError::new(action.name(), e));
                }
            }
        }

        tracing::info!(
            operation = self.kind.verb(),
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.errors.len(),
            cancelled = report.cancelled,
            "bulk operation finished"
        );

        report
    }
}

/// Outcome of one executed plan
#[derive(Debug, Clone)]
pub struct BulkReport {
    pub kind: OperationKind,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub errors: Vec<ItemError>,
    pub cancelled: bool,
    pub destination: Option<PathBuf>,
}

impl BulkReport {
    /// Items that were attempted, whatever the result
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.errors.len()
    }

    pub fn notice(&self) -> Notice {
        let title = self.kind.complete_title();

        let mut message = if self.errors.is_empty() {
            match (&self.kind, &self.destination) {
                (OperationKind::Copy, Some(dest)) => format!(
                    "Successfully copied {} items to:\n{}",
                    self.succeeded,
                    dest.display()
                ),
                _ => format!(
                    "Successfully {} {} items.",
                    self.kind.past_tense().to_lowercase(),
                    self.succeeded
                ),
            }
        } else {
            let mut lines: Vec<String> = self
                .errors
                .iter()
                .take(MAX_ERROR_LINES)
                .map(ItemError::to_string)
                .collect();
            if self.errors.len() > MAX_ERROR_LINES {
                lines.push(format!(
                    "... and {} more",
                    self.errors.len() - MAX_ERROR_LINES
                ));
            }
            format!(
                "{} {} items.\n\nErrors:\n{}",
                self.kind.past_tense(),
                self.succeeded,
                lines.join("\n")
            )
        };

        if self.skipped > 0 {
            message.push_str(&format!("\n\n{} item(s) were already gone.", self.skipped));
        }
        if self.cancelled {
            message.push_str(&format!(
                "\n\nCancelled after {} of {} items.",
                self.processed(),
                self.total
            ));
        }

        if self.errors.is_empty() {
            Notice::info(title, message)
        } else {
            Notice::warning(title, message)
        }
    }

    pub fn status_line(&self) -> String {
        match (&self.kind, &self.destination) {
            (OperationKind::Copy, Some(dest)) => {
                format!("Copied {} items to {}", self.succeeded, dest.display())
            }
            _ => format!("{} {} items", self.kind.past_tense(), self.succeeded),
        }
    }
}

/// Selected catalog items split into (files, folders), each in catalog order
fn partition_selected<'a>(
    catalog: &'a Catalog,
    selection: &Selection,
    kind: OperationKind,
) -> Result<(Vec<&'a ItemDescriptor>, Vec<&'a ItemDescriptor>), BulkError> {
    let (folders, files): (Vec<_>, Vec<_>) = catalog
        .items()
        .iter()
        .filter(|item| selection.contains(&item.path))
        .partition(|item| item.is_folder());

    if files.is_empty() && folders.is_empty() {
        return Err(BulkError::NoSelection(kind.verb()));
    }
    Ok((files, folders))
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// True when both paths name the same directory entry, as happens for
/// `photo.png` and `Photo.png` on a case-insensitive filesystem
fn same_entry(a: &Path, b: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let (Ok(a), Ok(b)) = (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
            return a.dev() == b.dev() && a.ino() == b.ino();
        }
        false
    }
    #[cfg(not(unix))]
    {
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

fn validate_file_name(name: &str) -> io::Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains(std::path::MAIN_SEPARATOR);
    if invalid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid file name {:?}", name),
        ));
    }
    Ok(())
}

/// True when `inner` is `outer` or lives somewhere below it
fn is_within(inner: &Path, outer: &Path) -> bool {
    let inner = fs::canonicalize(inner).unwrap_or_else(|_| inner.to_path_buf());
    let outer = fs::canonicalize(outer).unwrap_or_else(|_| outer.to_path_buf());
    inner.starts_with(outer)
}

/// First free name in `dir` for `name`: the name itself, then `stem_1.ext`,
/// `stem_2.ext`, ... for files and `name_1`, `name_2`, ... for folders.
pub fn unique_destination(dir: &Path, name: &str, kind: ItemKind) -> PathBuf {
    let candidate = dir.join(name);
    if !occupied(&candidate) {
        return candidate;
    }

    let (stem, ext) = match kind {
        ItemKind::File => split_extension(name),
        ItemKind::Folder => (name, ""),
    };

    let mut counter = 1usize;
    loop {
        let candidate = dir.join(format!("{}_{}{}", stem, counter, ext));
        if !occupied(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Split off the last extension, keeping its dot. Leading-dot names such as
/// `.bashrc` have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match Path::new(name).extension() {
        Some(ext) => {
            let split_at = name.len() - ext.len() - 1;
            name.split_at(split_at)
        }
        None => (name, ""),
    }
}

fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    // fs::copy carries permission bits along with the content
    fs::copy(src, dst)?;

    let metadata = fs::metadata(src)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    let file = File::options()
        .write(true)
        .open(dst)
        .or_else(|_| File::open(dst))?;
    file.set_times(times)
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if fs::metadata(&path)?.is_dir() {
            copy_tree(&path, &target)?;
        } else {
            copy_file(&path, &target)?;
        }
    }

    fs::set_permissions(dst, fs::metadata(src)?.permissions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemSize;
    use std::fs;
    use tempfile::TempDir;

    /// Records progress and cancels after a fixed number of updates
    #[derive(Default)]
    struct RecordingSink {
        updates: Vec<(usize, usize, String)>,
        cancel_after: Option<usize>,
    }

    impl ProgressSink for RecordingSink {
        fn update(&mut self, current: usize, total: usize, status: &str) {
            self.updates.push((current, total, status.to_string()));
        }

        fn is_cancelled(&self) -> bool {
            self.cancel_after
                .is_some_and(|limit| self.updates.len() >= limit)
        }
    }

    fn select(paths: &[PathBuf]) -> Selection {
        let mut selection = Selection::new();
        for path in paths {
            selection.toggle(path);
        }
        selection
    }

    fn create_files(root: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = root.join(name);
                fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect()
    }

    fn virtual_catalog(names: &[(&str, ItemKind)]) -> Catalog {
        Catalog::new(
            PathBuf::from("/data"),
            false,
            names
                .iter()
                .map(|(name, kind)| ItemDescriptor {
                    name: name.to_string(),
                    path: PathBuf::from("/data").join(name),
                    kind: *kind,
                    size: ItemSize::Bytes(0),
                    modified: None,
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let catalog = virtual_catalog(&[("a.txt", ItemKind::File)]);
        let selection = Selection::new();

        assert!(matches!(
            Plan::delete(&catalog, &selection),
            Err(BulkError::NoSelection("delete"))
        ));
        assert!(matches!(
            Plan::copy(&catalog, &selection, Path::new("/tmp")),
            Err(BulkError::NoSelection("copy"))
        ));
        assert!(matches!(
            Plan::rename(&catalog, &selection, &RenameRule::default()),
            Err(BulkError::NoSelection("rename"))
        ));
    }

    #[test]
    fn test_delete_plan_puts_files_first() {
        let catalog = virtual_catalog(&[
            ("dir_a", ItemKind::Folder),
            ("b.txt", ItemKind::File),
            ("dir_c", ItemKind::Folder),
            ("d.txt", ItemKind::File),
        ]);
        let selection = select(&catalog.items().iter().map(|i| i.path.clone()).collect::<Vec<_>>());

        let plan = Plan::delete(&catalog, &selection).unwrap();
        let names: Vec<&str> = plan.actions().iter().map(Action::name).collect();
        assert_eq!(names, vec!["b.txt", "d.txt", "dir_a", "dir_c"]);
        assert_eq!(plan.counts(), (2, 2));

        let (title, message) = plan.confirmation();
        assert_eq!(title, "Confirm Delete");
        assert!(message.contains("  - 2 file(s)\n"));
        assert!(message.contains("  - 2 folder(s) and their contents\n"));
    }

    #[test]
    fn test_rename_plan_drops_unchanged_names() {
        let catalog = virtual_catalog(&[("IMG_1.png", ItemKind::File), ("img_2.PNG", ItemKind::File)]);
        let selection = select(&catalog.items().iter().map(|i| i.path.clone()).collect::<Vec<_>>());
        let rule = RenameRule {
            pattern: "^IMG".to_string(),
            replacement: "Photo".to_string(),
            use_regex: true,
        };

        let plan = Plan::rename(&catalog, &selection, &rule).unwrap();
        assert_eq!(
            plan.actions(),
            &[Action::Rename {
                path: PathBuf::from("/data/IMG_1.png"),
                old_name: "IMG_1.png".to_string(),
                new_name: "Photo_1.png".to_string(),
            }]
        );
    }

    #[test]
    fn test_rename_plan_empty_when_nothing_changes() {
        let catalog = virtual_catalog(&[("a.txt", ItemKind::File)]);
        let selection = select(&[PathBuf::from("/data/a.txt")]);
        let rule = RenameRule {
            pattern: "zzz".to_string(),
            replacement: "y".to_string(),
            ..Default::default()
        };

        let plan = Plan::rename(&catalog, &selection, &rule).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_rename_rule_errors() {
        let catalog = virtual_catalog(&[("a.txt", ItemKind::File)]);
        let selection = select(&[PathBuf::from("/data/a.txt")]);

        let empty = RenameRule::default();
        assert!(matches!(
            Plan::rename(&catalog, &selection, &empty),
            Err(BulkError::NoPattern)
        ));

        let broken = RenameRule {
            pattern: "(".to_string(),
            use_regex: true,
            ..Default::default()
        };
        assert!(matches!(
            Plan::rename(&catalog, &selection, &broken),
            Err(BulkError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_rename_with_stale_selection_is_no_selection() {
        let catalog = virtual_catalog(&[("a.txt", ItemKind::File)]);
        let selection = select(&[PathBuf::from("/data/gone.txt")]);
        let rule = RenameRule {
            pattern: "a".to_string(),
            replacement: "b".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            Plan::rename(&catalog, &selection, &rule),
            Err(BulkError::NoSelection("rename"))
        ));
    }

    #[test]
    fn test_renamer_modes() {
        let literal = RenameRule {
            pattern: "a.b".to_string(),
            replacement: "$1".to_string(),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(literal.apply("a.b-axb-a.b"), "$1-axb-$1");

        let exact = RenameRule {
            pattern: "img".to_string(),
            replacement: "pic".to_string(),
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(exact.apply("IMG_1.png"), "IMG_1.png");
        assert_eq!(exact.apply("img_2.PNG"), "pic_2.PNG");

        let anchored = RenameRule {
            pattern: "^IMG".to_string(),
            replacement: "Photo".to_string(),
            use_regex: true,
            ..Default::default()
        }
        .compile()
        .unwrap();
        assert_eq!(anchored.apply("img_2.PNG"), "img_2.PNG");

        let groups = RenameRule {
            pattern: r"(\d+)\.txt$".to_string(),
            replacement: "${1}_old.txt".to_string(),
            use_regex: true,
        }
        .compile()
        .unwrap();
        assert_eq!(groups.apply("log42.txt"), "log42_old.txt");
    }

    #[test]
    fn test_rename_confirmation_truncates() {
        let names: Vec<String> = (0..12).map(|i| format!("x{}.txt", i)).collect();
        let entries: Vec<(&str, ItemKind)> =
            names.iter().map(|n| (n.as_str(), ItemKind::File)).collect();
        let catalog = virtual_catalog(&entries);
        let selection = select(&catalog.items().iter().map(|i| i.path.clone()).collect::<Vec<_>>());
        let rule = RenameRule {
            pattern: "x".to_string(),
            replacement: "y".to_string(),
            ..Default::default()
        };

        let plan = Plan::rename(&catalog, &selection, &rule).unwrap();
        let (title, message) = plan.confirmation();
        assert_eq!(title, "Confirm Rename");
        assert!(message.starts_with("Rename 12 items?\n\nx0.txt → y0.txt"));
        assert!(message.ends_with("... and 2 more"));
    }

    #[test]
    fn test_unique_destination_for_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        assert_eq!(
            unique_destination(dir, "report.txt", ItemKind::File),
            dir.join("report.txt")
        );

        fs::write(dir.join("report.txt"), b"1").unwrap();
        fs::write(dir.join("report_1.txt"), b"2").unwrap();
        assert_eq!(
            unique_destination(dir, "report.txt", ItemKind::File),
            dir.join("report_2.txt")
        );
    }

    #[test]
    fn test_unique_destination_for_folders() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::create_dir(dir.join("notes")).unwrap();
        fs::create_dir(dir.join("notes_1")).unwrap();

        assert_eq!(
            unique_destination(dir, "notes", ItemKind::Folder),
            dir.join("notes_2")
        );
    }

    #[test]
    fn test_unique_destination_fills_lowest_gap() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.tar.gz"), b"").unwrap();
        fs::write(dir.join("a.tar_2.gz"), b"").unwrap();

        assert_eq!(
            unique_destination(dir, "a.tar.gz", ItemKind::File),
            dir.join("a.tar_1.gz")
        );
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.txt"), ("report", ".txt"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("Makefile"), ("Makefile", ""));
    }

    #[test]
    fn test_delete_executes_and_reports_progress() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["a.txt", "b.txt"]);
        fs::create_dir_all(root.join("dir/inner")).unwrap();
        fs::write(root.join("dir/inner/x"), b"x").unwrap();

        let catalog = Catalog::scan(root, false).unwrap();
        let mut paths = files.clone();
        paths.push(root.join("dir"));
        let plan = Plan::delete(&catalog, &select(&paths)).unwrap();

        let mut sink = RecordingSink::default();
        let report = plan.execute(&mut sink);

        assert_eq!(report.succeeded, 3);
        assert!(report.errors.is_empty());
        assert!(!root.join("dir").exists());
        assert!(!files[0].exists());
        assert_eq!(
            sink.updates,
            vec![
                (1, 3, "Deleting file: a.txt".to_string()),
                (2, 3, "Deleting file: b.txt".to_string()),
                (3, 3, "Deleting folder: dir".to_string()),
            ]
        );
        assert_eq!(report.notice().message, "Successfully deleted 3 items.");
        assert_eq!(report.status_line(), "Deleted 3 items");
    }

    #[test]
    fn test_delete_continues_past_failures() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["a.txt", "b.txt", "c.txt"]);
        let catalog = Catalog::scan(root, false).unwrap();
        let plan = Plan::delete(&catalog, &select(&files)).unwrap();

        // b.txt turns into a non-empty folder behind the plan's back, so
        // unlinking it as a file fails regardless of privileges
        fs::remove_file(&files[1]).unwrap();
        fs::create_dir(&files[1]).unwrap();
        fs::write(files[1].join("keep"), b"keep").unwrap();

        let report = plan.execute(&mut RecordingSink::default());

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "b.txt");
        assert!(!files[2].exists());

        let notice = report.notice();
        assert_eq!(notice.level, crate::presenter::NoticeLevel::Warning);
        assert!(notice.message.starts_with("Deleted 2 items.\n\nErrors:\nb.txt: "));
    }

    #[test]
    fn test_cancel_stops_before_next_item() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["1.txt", "2.txt", "3.txt", "4.txt", "5.txt"]);
        let catalog = Catalog::scan(root, false).unwrap();
        let plan = Plan::delete(&catalog, &select(&files)).unwrap();

        let mut sink = RecordingSink {
            cancel_after: Some(2),
            ..Default::default()
        };
        let report = plan.execute(&mut sink);

        assert!(report.cancelled);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.succeeded, 2);
        assert!(!files[0].exists());
        assert!(!files[1].exists());
        assert!(files[2..].iter().all(|f| f.exists()));
        assert!(report
            .notice()
            .message
            .ends_with("Cancelled after 2 of 5 items."));
    }

    #[test]
    fn test_missing_items_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["a.txt", "b.txt"]);
        let catalog = Catalog::scan(root, false).unwrap();
        let plan = Plan::delete(&catalog, &select(&files)).unwrap();

        fs::remove_file(&files[0]).unwrap();
        let report = plan.execute(&mut RecordingSink::default());

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_rename_in_place_and_collision() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["IMG_1.png", "IMG_2.png", "Photo_2.png"]);
        let catalog = Catalog::scan(root, false).unwrap();
        let rule = RenameRule {
            pattern: "^IMG".to_string(),
            replacement: "Photo".to_string(),
            use_regex: true,
        };
        let plan = Plan::rename(&catalog, &select(&files[..2]), &rule).unwrap();

        let mut sink = RecordingSink::default();
        let report = plan.execute(&mut sink);

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "IMG_2.png");
        assert!(root.join("Photo_1.png").exists());
        assert!(root.join("IMG_2.png").exists());
        assert_eq!(fs::read(root.join("Photo_2.png")).unwrap(), b"Photo_2.png");
        assert_eq!(sink.updates[0].2, "Renaming: IMG_1.png");
    }

    #[test]
    fn test_rename_changing_only_case() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["photo.png"]);
        let catalog = Catalog::scan(root, false).unwrap();
        let rule = RenameRule {
            pattern: "^p".to_string(),
            replacement: "P".to_string(),
            use_regex: true,
        };

        let plan = Plan::rename(&catalog, &select(&files), &rule).unwrap();
        let report = plan.execute(&mut RecordingSink::default());

        assert_eq!(report.succeeded, 1);
        assert!(report.errors.is_empty());
        let names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Photo.png"]);
    }

    #[test]
    fn test_same_entry() {
        let temp_dir = TempDir::new().unwrap();
        let files = create_files(temp_dir.path(), &["a.txt", "b.txt"]);

        assert!(same_entry(&files[0], &files[0]));
        assert!(!same_entry(&files[0], &files[1]));
        assert!(!same_entry(&files[0], &temp_dir.path().join("missing")));
    }

    #[test]
    fn test_rename_rejects_path_separators() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files = create_files(root, &["a-b.txt"]);
        let catalog = Catalog::scan(root, false).unwrap();
        let rule = RenameRule {
            pattern: "-".to_string(),
            replacement: "/".to_string(),
            ..Default::default()
        };

        let plan = Plan::rename(&catalog, &select(&files), &rule).unwrap();
        let report = plan.execute(&mut RecordingSink::default());
        assert_eq!(report.errors.len(), 1);
        assert!(files[0].exists());
    }

    #[test]
    fn test_recursive_rename_handles_children_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("old_dir")).unwrap();
        fs::write(root.join("old_dir/old_file"), b"x").unwrap();

        let catalog = Catalog::scan(root, true).unwrap();
        let selection = select(&[root.join("old_dir"), root.join("old_dir/old_file")]);
        let rule = RenameRule {
            pattern: "old".to_string(),
            replacement: "new".to_string(),
            ..Default::default()
        };

        let plan = Plan::rename(&catalog, &selection, &rule).unwrap();
        assert_eq!(plan.actions()[0].name(), "old_file");
        assert_eq!(plan.counts(), (1, 1));

        let report = plan.execute(&mut RecordingSink::default());
        assert_eq!(report.succeeded, 2);
        assert!(root.join("new_dir/new_file").exists());
    }

    #[test]
    fn test_copy_with_collisions_and_folders() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(src.join("notes/sub")).unwrap();
        fs::write(src.join("notes/sub/n.txt"), b"note").unwrap();
        fs::write(src.join("report.txt"), b"new report").unwrap();
        fs::create_dir_all(dest.join("notes")).unwrap();
        fs::create_dir_all(dest.join("notes_1")).unwrap();
        fs::write(dest.join("report.txt"), b"old").unwrap();
        fs::write(dest.join("report_1.txt"), b"older").unwrap();

        let catalog = Catalog::scan(&src, false).unwrap();
        let selection = select(&[src.join("notes"), src.join("report.txt")]);
        let plan = Plan::copy(&catalog, &selection, &dest).unwrap();

        let (title, message) = plan.confirmation();
        assert_eq!(title, "Confirm Copy");
        assert!(message.starts_with(&format!("Copy to {}:\n", dest.display())));

        let mut sink = RecordingSink::default();
        let report = plan.execute(&mut sink);

        assert_eq!(report.succeeded, 2);
        assert_eq!(fs::read(dest.join("report_2.txt")).unwrap(), b"new report");
        assert_eq!(fs::read(dest.join("report.txt")).unwrap(), b"old");
        assert_eq!(fs::read(dest.join("notes_2/sub/n.txt")).unwrap(), b"note");
        assert_eq!(
            sink.updates,
            vec![
                (1, 2, "Copying file: report.txt".to_string()),
                (2, 2, "Copying folder: notes".to_string()),
            ]
        );
        assert!(report.notice().message.starts_with("Successfully copied 2 items to:\n"));
        // Sources stay put
        assert!(src.join("report.txt").exists());
    }

    #[test]
    fn test_copy_preserves_modified_time() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        let file = src.join("old.txt");
        fs::write(&file, b"old").unwrap();

        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_times(FileTimes::new().set_modified(past))
            .unwrap();

        let catalog = Catalog::scan(&src, false).unwrap();
        let plan = Plan::copy(&catalog, &select(&[file]), &dest).unwrap();
        plan.execute(&mut RecordingSink::default());

        let copied = fs::metadata(dest.join("old.txt")).unwrap();
        assert_eq!(copied.modified().unwrap(), past);
    }

    #[test]
    fn test_copy_folder_into_itself_fails() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("box/inner")).unwrap();

        let catalog = Catalog::scan(root, false).unwrap();
        let plan = Plan::copy(&catalog, &select(&[root.join("box")]), &root.join("box/inner")).unwrap();
        let report = plan.execute(&mut RecordingSink::default());

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "box");
    }

    #[test]
    fn test_error_summary_truncates() {
        let report = BulkReport {
            kind: OperationKind::Copy,
            total: 8,
            succeeded: 1,
            skipped: 0,
            errors: (0..7)
                .map(|i| ItemError::new(format!("f{}", i), "boom"))
                .collect(),
            cancelled: false,
            destination: Some(PathBuf::from("/dest")),
        };

        let notice = report.notice();
        assert_eq!(notice.title, "Copy Complete");
        let lines: Vec<&str> = notice.message.lines().collect();
        assert_eq!(lines[0], "Copied 1 items.");
        assert_eq!(lines[3], "f0: boom");
        assert_eq!(lines[7], "f4: boom");
        assert_eq!(lines[8], "... and 2 more");
        assert_eq!(report.status_line(), "Copied 1 items to /dest");
    }
}
