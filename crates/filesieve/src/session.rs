//! Application state shared by the TUI and the command line
//!
//! A `Session` owns the current folder, its catalog, the filter and sort
//! state, the derived view, the selection and the navigation history. The
//! presentation layers hold a session and drive it; nothing in here knows
//! about widgets.

use std::path::{Path, PathBuf};

use crate::bulk::{BulkReport, Plan, RenameRule};
use crate::catalog::{Catalog, ItemDescriptor};
use crate::error::{BulkError, ScanError};
use crate::filter::{self, FilterState, FilteredView, SortColumn, SortState};
use crate::navigation::{parent_of, History};
use crate::presenter::{Notice, Presenter};
use crate::selection::Selection;
use crate::settings::Settings;

pub struct Session {
    current_folder: Option<PathBuf>,
    recursive: bool,
    catalog: Catalog,
    filter: FilterState,
    sort: SortState,
    view: FilteredView,
    selection: Selection,
    history: History,
    status: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self {
            current_folder: None,
            recursive: settings.browse.recursive,
            catalog: Catalog::default(),
            filter: settings.initial_filter(),
            sort: settings.initial_sort(),
            view: FilteredView::default(),
            selection: Selection::new(),
            history: History::default(),
            status: String::from("Ready. Open a folder to begin."),
        }
    }

    pub fn current_folder(&self) -> Option<&Path> {
        self.current_folder.as_deref()
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    /// Items currently displayed, in display order
    pub fn visible(&self) -> Vec<&ItemDescriptor> {
        self.view.items(&self.catalog).collect()
    }

    pub fn visible_at(&self, position: usize) -> Option<&ItemDescriptor> {
        self.view.get(&self.catalog, position)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Jump to an unrelated folder. Forgets the back history.
    pub fn browse<P: AsRef<Path>>(&mut self, folder: P) -> Result<(), ScanError> {
        self.navigate(folder.as_ref().to_path_buf(), false)?;
        self.history.clear();
        Ok(())
    }

    /// Descend into a folder, remembering where we came from
    pub fn open_folder<P: AsRef<Path>>(&mut self, folder: P) -> Result<(), ScanError> {
        self.navigate(folder.as_ref().to_path_buf(), true)
    }

    /// Returns false when there is no history to go back to
    pub fn go_back(&mut self) -> Result<bool, ScanError> {
        let Some(previous) = self.history.pop() else {
            return Ok(false);
        };
        if let Err(e) = self.navigate(previous.clone(), false) {
            self.history.push(previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Returns false when already at a filesystem root
    pub fn go_up(&mut self) -> Result<bool, ScanError> {
        let Some(parent) = self.current_folder.as_deref().and_then(parent_of) else {
            return Ok(false);
        };
        self.navigate(parent, true)?;
        Ok(true)
    }

    pub fn can_go_up(&self) -> bool {
        self.current_folder
            .as_deref()
            .and_then(parent_of)
            .is_some()
    }

    fn navigate(&mut self, folder: PathBuf, add_to_history: bool) -> Result<(), ScanError> {
        let catalog = Catalog::scan(&folder, self.recursive)?;
        if add_to_history {
            if let Some(current) = self.current_folder.take() {
                self.history.push(current);
            }
        }
        self.current_folder = Some(folder);
        self.install(catalog);
        Ok(())
    }

    /// Rescan the current folder. On failure the old catalog stays.
    pub fn refresh(&mut self) -> Result<(), ScanError> {
        let Some(folder) = self.current_folder.clone() else {
            return Ok(());
        };
        let catalog = Catalog::scan(&folder, self.recursive)?;
        self.install(catalog);
        Ok(())
    }

    pub fn set_recursive(&mut self, recursive: bool) -> Result<(), ScanError> {
        let previous = self.recursive;
        self.recursive = recursive;
        if let Err(e) = self.refresh() {
            self.recursive = previous;
            return Err(e);
        }
        Ok(())
    }

    fn install(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.selection.clear();
        if !self.refilter() {
            // The old view indexes the old catalog; show nothing until the
            // pattern is fixed
            self.view = FilteredView::default();
        }

        let (files, folders) = self.catalog.counts();
        self.status = format!(
            "Loaded {} files and {} folders from {}",
            files,
            folders,
            self.catalog.root().display()
        );
        tracing::info!(
            folder = %self.catalog.root().display(),
            files,
            folders,
            "folder loaded"
        );
    }

    /// Replace the filter. Returns false if the pattern did not compile, in
    /// which case the previous view is kept and the status says why.
    pub fn set_filter(&mut self, filter: FilterState) -> bool {
        self.filter = filter;
        self.refilter()
    }

    pub fn update_filter(&mut self, update: impl FnOnce(&mut FilterState)) -> bool {
        update(&mut self.filter);
        self.refilter()
    }

    fn refilter(&mut self) -> bool {
        match filter::apply(&self.catalog, &self.filter) {
            Ok(mut view) => {
                view.sort(&self.catalog, self.sort);
                self.status = format!(
                    "Showing {} of {} items",
                    view.len(),
                    self.catalog.len()
                );
                self.view = view;
                true
            }
            Err(e) => {
                tracing::debug!(pattern = %self.filter.pattern, error = %e, "filter rejected");
                self.status = e.to_string();
                false
            }
        }
    }

    /// Sort by a column; the active column flips direction
    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort = self.sort.toggle(column);
        self.view.sort(&self.catalog, self.sort);
    }

    pub fn toggle(&mut self, path: &Path) -> bool {
        self.selection.toggle(path)
    }

    /// Toggle the item at a view position
    pub fn toggle_at(&mut self, position: usize) -> Option<bool> {
        let path = self.view.get(&self.catalog, position)?.path.clone();
        Some(self.selection.toggle(&path))
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.view.items(&self.catalog));
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all(self.view.items(&self.catalog));
    }

    pub fn invert_selection(&mut self) {
        self.selection.invert(self.view.items(&self.catalog));
    }

    pub fn plan_delete(&self) -> Result<Plan, BulkError> {
        Plan::delete(&self.catalog, &self.selection)
    }

    /// Rename follows the filter's regex flag but always matches case exactly
    pub fn plan_rename(&self, pattern: &str, replacement: &str) -> Result<Plan, BulkError> {
        let rule = RenameRule {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            use_regex: self.filter.use_regex,
        };
        Plan::rename(&self.catalog, &self.selection, &rule)
    }

    pub fn plan_copy(&self, destination: &Path) -> Result<Plan, BulkError> {
        Plan::copy(&self.catalog, &self.selection, destination)
    }

    /// Reload after a bulk operation and produce its summary
    pub fn complete(&mut self, report: &BulkReport) -> Notice {
        let reload = self.refresh();
        self.status = report.status_line();

        let mut notice = report.notice();
        if let Err(e) = reload {
            tracing::warn!(error = %e, "reload after bulk operation failed");
            notice.message.push_str(&format!("\n\nFailed to reload folder: {}", e));
        }
        notice
    }

    pub fn delete_selected<P: Presenter>(&mut self, presenter: &mut P) -> Option<BulkReport> {
        match self.plan_delete() {
            Ok(plan) => self.run_plan(plan, presenter),
            Err(e) => {
                presenter.notify(bulk_error_notice(&e));
                None
            }
        }
    }

    pub fn rename_selected<P: Presenter>(
        &mut self,
        presenter: &mut P,
        pattern: &str,
        replacement: &str,
    ) -> Option<BulkReport> {
        let plan = match self.plan_rename(pattern, replacement) {
            Ok(plan) => plan,
            Err(e) => {
                presenter.notify(bulk_error_notice(&e));
                return None;
            }
        };

        if plan.is_empty() {
            presenter.notify(no_changes_notice());
            return None;
        }

        self.run_plan(plan, presenter)
    }

    pub fn copy_selected<P: Presenter>(&mut self, presenter: &mut P) -> Option<BulkReport> {
        if self.selection.is_empty() {
            presenter.notify(bulk_error_notice(&BulkError::NoSelection("copy")));
            return None;
        }

        let destination = presenter.choose_directory("Select Destination Folder")?;

        match self.plan_copy(&destination) {
            Ok(plan) => self.run_plan(plan, presenter),
            Err(e) => {
                presenter.notify(bulk_error_notice(&e));
                None
            }
        }
    }

    fn run_plan<P: Presenter>(&mut self, plan: Plan, presenter: &mut P) -> Option<BulkReport> {
        let (title, message) = plan.confirmation();
        if !presenter.confirm(&title, &message) {
            return None;
        }

        let report = plan.execute(presenter);
        let notice = self.complete(&report);
        presenter.notify(notice);
        Some(report)
    }
}

pub fn bulk_error_notice(error: &BulkError) -> Notice {
    match error {
        BulkError::InvalidPattern(_) => Notice::error(error.title(), error.to_string()),
        BulkError::NoSelection(_) | BulkError::NoPattern => {
            Notice::warning(error.title(), error.to_string())
        }
    }
}

pub fn no_changes_notice() -> Notice {
    Notice::info("No Changes", "No items would be renamed with this pattern.")
}

pub fn scan_error_notice(error: &ScanError) -> Notice {
    Notice::error("Error", format!("Failed to load items: {}", error))
}
