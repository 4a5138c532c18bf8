use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Folder => "folder",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ItemKind::File => "📄",
            ItemKind::Folder => "📁",
        }
    }
}

/// Size column of a catalog entry. Folders report their immediate child
/// count instead of a recursive byte total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "unit", content = "value")]
pub enum ItemSize {
    Bytes(u64),
    Children(usize),
    AccessDenied,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub kind: ItemKind,
    pub size: ItemSize,
    pub modified: Option<DateTime<Local>>,
}

impl ItemDescriptor {
    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }

    /// Byte size used for sorting; folders count as zero
    pub fn size_bytes(&self) -> u64 {
        match self.size {
            ItemSize::Bytes(bytes) => bytes,
            ItemSize::Children(_) | ItemSize::AccessDenied => 0,
        }
    }

    pub fn item_count(&self) -> usize {
        match self.size {
            ItemSize::Children(count) => count,
            ItemSize::Bytes(_) | ItemSize::AccessDenied => 0,
        }
    }

    pub fn size_display(&self) -> String {
        match self.size {
            ItemSize::Bytes(bytes) => format_size(bytes),
            ItemSize::Children(count) => format!("{} items", count),
            ItemSize::AccessDenied => "Access denied".to_string(),
        }
    }

    pub fn modified_display(&self) -> String {
        self.modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }

    /// Stat a single path into a descriptor
    pub fn describe(path: &Path) -> Result<Self, ScanError> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            // Dangling symlinks still show up in a listing; describe the link itself
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::symlink_metadata(path).map_err(|source| ScanError::Read {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(source) => {
                return Err(ScanError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let modified = metadata.modified().ok().map(DateTime::<Local>::from);
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let (kind, size) = if metadata.is_dir() {
            let size = match fs::read_dir(path) {
                Ok(rd) => ItemSize::Children(rd.count()),
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => ItemSize::AccessDenied,
                Err(source) => {
                    return Err(ScanError::Read {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };
            (ItemKind::Folder, size)
        } else {
            (ItemKind::File, ItemSize::Bytes(metadata.len()))
        };

        Ok(Self {
            name,
            path: path.to_path_buf(),
            kind,
            size,
            modified,
        })
    }
}

/// Snapshot of one directory's entries. Replaced wholesale on every scan.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    root: PathBuf,
    recursive: bool,
    items: Vec<ItemDescriptor>,
    index: HashMap<PathBuf, usize>,
}

impl Catalog {
    pub fn new(root: PathBuf, recursive: bool, items: Vec<ItemDescriptor>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.path.clone(), i))
            .collect();
        Self {
            root,
            recursive,
            items,
            index,
        }
    }

    pub fn scan<P: AsRef<Path>>(root: P, recursive: bool) -> Result<Self, ScanError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let items = if recursive {
            scan_recursive(root)?
        } else {
            scan_children(root)?
        };

        tracing::debug!(
            root = %root.display(),
            recursive,
            entries = items.len(),
            "catalog scanned"
        );

        Ok(Self::new(root.to_path_buf(), recursive, items))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn items(&self) -> &[ItemDescriptor] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&ItemDescriptor> {
        self.index.get(path).map(|&i| &self.items[i])
    }

    /// (files, folders)
    pub fn counts(&self) -> (usize, usize) {
        let folders = self.items.iter().filter(|i| i.is_folder()).count();
        (self.items.len() - folders, folders)
    }
}

fn scan_children(root: &Path) -> Result<Vec<ItemDescriptor>, ScanError> {
    let read_dir = fs::read_dir(root).map_err(|source| ScanError::Read {
        path: root.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ScanError::Read {
            path: root.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    paths.iter().map(|p| ItemDescriptor::describe(p)).collect()
}

fn scan_recursive(root: &Path) -> Result<Vec<ItemDescriptor>, ScanError> {
    let mut items = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                // Unreadable subfolders are skipped; the folder itself was
                // already recorded by its parent listing
                if e.io_error().map(|io| io.kind()) == Some(io::ErrorKind::PermissionDenied) {
                    tracing::warn!(error = %e, "skipping unreadable folder");
                    continue;
                }
                return Err(ScanError::Walk {
                    path: e.path().unwrap_or(root).to_path_buf(),
                    source: e,
                });
            }
        };
        items.push(ItemDescriptor::describe(entry.path())?);
    }

    Ok(items)
}

pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}
