use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::catalog::ItemDescriptor;

/// Paths chosen for the next bulk action.
///
/// Keyed by path rather than view position so membership survives
/// re-sorting and re-filtering. The bulk operations that operate "over the
/// view" only touch the items handed to them.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    members: HashSet<PathBuf>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &HashSet<PathBuf> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.contains(path)
    }

    /// Flip membership of one path. Returns whether it is now selected.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if self.members.remove(path) {
            false
        } else {
            self.members.insert(path.to_path_buf());
            true
        }
    }

    pub fn select_all<'a, I>(&mut self, view: I)
    where
        I: IntoIterator<Item = &'a ItemDescriptor>,
    {
        self.members
            .extend(view.into_iter().map(|item| item.path.clone()));
    }

    pub fn deselect_all<'a, I>(&mut self, view: I)
    where
        I: IntoIterator<Item = &'a ItemDescriptor>,
    {
        for item in view {
            self.members.remove(&item.path);
        }
    }

    pub fn invert<'a, I>(&mut self, view: I)
    where
        I: IntoIterator<Item = &'a ItemDescriptor>,
    {
        for item in view {
            self.toggle(&item.path);
        }
    }

    /// Drop everything, including members hidden by the current filter
    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn label(&self) -> String {
        let count = self.members.len();
        format!(
            "Selected: {} item{}",
            count,
            if count == 1 { "" } else { "s" }
        )
    }
}
