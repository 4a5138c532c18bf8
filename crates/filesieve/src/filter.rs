//! Filtering and sorting of a catalog into the displayed view
//!
//! Filtering is a pure function of the catalog and the filter state. The
//! result is a list of indices into the catalog, so the view can be re-sorted
//! without cloning descriptors and is simply recomputed after every scan.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::catalog::{Catalog, ItemDescriptor, ItemKind};
use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    #[default]
    All,
    Files,
    Folders,
}

impl TypeFilter {
    pub fn admits(&self, kind: ItemKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Files => kind == ItemKind::File,
            TypeFilter::Folders => kind == ItemKind::Folder,
        }
    }

    /// Cycle all -> files -> folders -> all
    pub fn next(&self) -> Self {
        match self {
            TypeFilter::All => TypeFilter::Files,
            TypeFilter::Files => TypeFilter::Folders,
            TypeFilter::Folders => TypeFilter::All,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Files => "files",
            TypeFilter::Folders => "folders",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub pattern: String,
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub type_filter: TypeFilter,
}

/// Compiled form of the name predicate
pub enum NameMatcher {
    Any,
    Literal { needle: String, case_sensitive: bool },
    Regex(Regex),
}

impl NameMatcher {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Any => true,
            NameMatcher::Literal {
                needle,
                case_sensitive: true,
            } => name.contains(needle.as_str()),
            NameMatcher::Literal {
                needle,
                case_sensitive: false,
            } => name.to_lowercase().contains(needle.as_str()),
            NameMatcher::Regex(re) => re.is_match(name),
        }
    }
}

impl FilterState {
    pub fn matcher(&self) -> Result<NameMatcher, FilterError> {
        if self.pattern.is_empty() {
            return Ok(NameMatcher::Any);
        }

        if self.use_regex {
            let re = RegexBuilder::new(&self.pattern)
                .case_insensitive(!self.case_sensitive)
                .build()?;
            Ok(NameMatcher::Regex(re))
        } else {
            let needle = if self.case_sensitive {
                self.pattern.clone()
            } else {
                self.pattern.to_lowercase()
            };
            Ok(NameMatcher::Literal {
                needle,
                case_sensitive: self.case_sensitive,
            })
        }
    }
}

/// Ordered subset of a catalog, held as catalog indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    indices: Vec<usize>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn items<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a ItemDescriptor> + 'a {
        let items = catalog.items();
        self.indices.iter().filter_map(move |&i| items.get(i))
    }

    pub fn get<'a>(&self, catalog: &'a Catalog, position: usize) -> Option<&'a ItemDescriptor> {
        self.indices
            .get(position)
            .and_then(|&i| catalog.items().get(i))
    }

    pub fn paths(&self, catalog: &Catalog) -> Vec<PathBuf> {
        self.items(catalog).map(|item| item.path.clone()).collect()
    }

    /// Stable sort by the given key. Reversal flips the comparison, so equal
    /// keys keep their relative order in both directions.
    pub fn sort(&mut self, catalog: &Catalog, sort: SortState) {
        let items = catalog.items();
        self.indices.sort_by(|&a, &b| {
            let ord = sort.column.compare(&items[a], &items[b]);
            if sort.reverse {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

/// Derive the view from the catalog. Preserves catalog order.
pub fn apply(catalog: &Catalog, filter: &FilterState) -> Result<FilteredView, FilterError> {
    let matcher = filter.matcher()?;

    let indices = catalog
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| filter.type_filter.admits(item.kind))
        .filter(|(_, item)| matcher.matches(&item.name))
        .map(|(i, _)| i)
        .collect();

    Ok(FilteredView { indices })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Type,
    #[default]
    Name,
    Size,
    Modified,
    Path,
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::Type,
        SortColumn::Name,
        SortColumn::Size,
        SortColumn::Modified,
        SortColumn::Path,
    ];

    pub fn compare(&self, a: &ItemDescriptor, b: &ItemDescriptor) -> Ordering {
        match self {
            SortColumn::Type => a.kind.label().cmp(b.kind.label()),
            SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortColumn::Size => a.size_bytes().cmp(&b.size_bytes()),
            SortColumn::Modified => a.modified.cmp(&b.modified),
            SortColumn::Path => a
                .path
                .to_string_lossy()
                .to_lowercase()
                .cmp(&b.path.to_string_lossy().to_lowercase()),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortColumn::Type => "Type",
            SortColumn::Name => "Name",
            SortColumn::Size => "Size",
            SortColumn::Modified => "Modified",
            SortColumn::Path => "Path",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub column: SortColumn,
    pub reverse: bool,
}

impl SortState {
    /// Clicking the active column flips direction; a new column starts ascending
    pub fn toggle(self, column: SortColumn) -> Self {
        if self.column == column {
            Self {
                column,
                reverse: !self.reverse,
            }
        } else {
            Self {
                column,
                reverse: false,
            }
        }
    }

    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.column.display_name(),
            if self.reverse { "▼" } else { "▲" }
        )
    }
}
