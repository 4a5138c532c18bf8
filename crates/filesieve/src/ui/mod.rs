mod types;

pub use types::{DirectoryPurpose, RenameField, View};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::bulk::Plan;
use crate::error::BulkError;
use crate::filter::SortColumn;
use crate::presenter::{ChannelProgress, Notice, NoticeLevel};
use crate::preview::{self, Preview};
use crate::session::{bulk_error_notice, no_changes_notice, scan_error_notice, Session};
use types::ActiveOperation;

const THROBBER_CHARS: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];
const PAGE_SIZE: usize = 10;
const NAME_WIDTH: usize = 40;

pub struct App {
    session: Session,
    view: View,
    previous_view: View,
    list_state: ListState,
    /// Pattern being typed in the filter bar
    filter_input: String,
    /// Pattern to restore if filter editing is cancelled
    filter_backup: String,
    directory_input: String,
    directory_purpose: DirectoryPurpose,
    rename_pattern: String,
    rename_replacement: String,
    rename_field: RenameField,
    /// Plan awaiting confirmation
    pending_plan: Option<Plan>,
    active_operation: Option<ActiveOperation>,
    throbber_frame: usize,
    notice: Option<Notice>,
    preview: Option<Preview>,
    preview_scroll: u16,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            view: View::Browser,
            previous_view: View::Browser,
            list_state: ListState::default(),
            filter_input: String::new(),
            filter_backup: String::new(),
            directory_input: String::new(),
            directory_purpose: DirectoryPurpose::Browse,
            rename_pattern: String::new(),
            rename_replacement: String::new(),
            rename_field: RenameField::Pattern,
            pending_plan: None,
            active_operation: None,
            throbber_frame: 0,
            notice: None,
            preview: None,
            preview_scroll: 0,
        };
        app.clamp_selection();
        app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_busy(&self) -> bool {
        self.active_operation.is_some()
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    ) -> Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key) {
                        if let Some(op) = &self.active_operation {
                            op.cancelled.store(true, Ordering::Relaxed);
                        }
                        return Ok(());
                    }
                }
            }

            self.poll_operation().await;
        }
    }

    /// Returns true when the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.view {
            View::Browser => return self.handle_browser_key(key),
            View::FilterInput => match key.code {
                KeyCode::Esc => {
                    let backup = self.filter_backup.clone();
                    self.session.update_filter(|f| f.pattern = backup);
                    self.view = View::Browser;
                    self.clamp_selection();
                }
                KeyCode::Enter => {
                    self.view = View::Browser;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                    self.apply_filter_input();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                    self.apply_filter_input();
                }
                _ => {}
            },
            View::DirectoryInput => match key.code {
                KeyCode::Esc => {
                    self.view = View::Browser;
                }
                KeyCode::Enter => self.submit_directory(),
                KeyCode::Backspace => {
                    self.directory_input.pop();
                }
                KeyCode::Char(c) => {
                    self.directory_input.push(c);
                }
                _ => {}
            },
            View::RenameInput => match key.code {
                KeyCode::Esc => {
                    self.view = View::Browser;
                }
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    self.rename_field = match self.rename_field {
                        RenameField::Pattern => RenameField::Replacement,
                        RenameField::Replacement => RenameField::Pattern,
                    };
                }
                KeyCode::Enter => self.submit_rename(),
                KeyCode::Backspace => {
                    self.rename_input_mut().pop();
                }
                KeyCode::Char(c) => {
                    self.rename_input_mut().push(c);
                }
                _ => {}
            },
            View::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    if let Some(plan) = self.pending_plan.take() {
                        self.start_operation(plan);
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.pending_plan = None;
                    self.session.set_status("Cancelled");
                    self.view = View::Browser;
                }
                _ => {}
            },
            View::Working => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q')) {
                    if let Some(op) = &self.active_operation {
                        op.cancelled.store(true, Ordering::Relaxed);
                        self.session.set_status("Cancelling...");
                    }
                }
            }
            View::Notice => {
                self.notice = None;
                self.view = View::Browser;
            }
            View::Preview => match key.code {
                KeyCode::Down | KeyCode::Char('j') => {
                    self.preview_scroll = self.preview_scroll.saturating_add(1);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.preview_scroll = self.preview_scroll.saturating_sub(1);
                }
                KeyCode::PageDown => {
                    self.preview_scroll = self.preview_scroll.saturating_add(PAGE_SIZE as u16);
                }
                KeyCode::PageUp => {
                    self.preview_scroll = self.preview_scroll.saturating_sub(PAGE_SIZE as u16);
                }
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.preview = None;
                    self.view = View::Browser;
                }
                _ => {}
            },
            View::Help => {
                self.view = self.previous_view;
            }
        }
        false
    }

    fn handle_browser_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => {
                self.previous_view = View::Browser;
                self.view = View::Help;
            }
            KeyCode::Down | KeyCode::Char('j') => self.list_next(),
            KeyCode::Up | KeyCode::Char('k') => self.list_previous(),
            KeyCode::PageDown => self.list_page_down(),
            KeyCode::PageUp => self.list_page_up(),
            KeyCode::Home | KeyCode::Char('g') => self.list_top(),
            KeyCode::End | KeyCode::Char('G') => self.list_bottom(),
            KeyCode::Char(' ') => {
                if let Some(position) = self.list_state.selected() {
                    self.session.toggle_at(position);
                    self.list_next_no_wrap();
                }
            }
            KeyCode::Char('a') => self.session.select_all(),
            KeyCode::Char('A') => self.session.deselect_all(),
            KeyCode::Char('i') => self.session.invert_selection(),
            KeyCode::Char('/') => {
                self.filter_input = self.session.filter().pattern.clone();
                self.filter_backup = self.filter_input.clone();
                self.view = View::FilterInput;
            }
            KeyCode::Char('R') => {
                self.session.update_filter(|f| f.use_regex = !f.use_regex);
                self.clamp_selection();
            }
            KeyCode::Char('C') => {
                self.session
                    .update_filter(|f| f.case_sensitive = !f.case_sensitive);
                self.clamp_selection();
            }
            KeyCode::Char('t') => {
                self.session
                    .update_filter(|f| f.type_filter = f.type_filter.next());
                self.clamp_selection();
            }
            KeyCode::Char('s') => {
                let recursive = !self.session.is_recursive();
                let result = self.session.set_recursive(recursive);
                self.after_navigation(result);
            }
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.session.sort_by(SortColumn::ALL[index]);
            }
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Backspace => match self.session.go_back() {
                Ok(true) => self.after_navigation(Ok(())),
                Ok(false) => self.session.set_status("No previous folder"),
                Err(e) => self.after_navigation(Err(e)),
            },
            KeyCode::Char('u') => match self.session.go_up() {
                Ok(true) => self.after_navigation(Ok(())),
                Ok(false) => self.session.set_status("Already at the top folder"),
                Err(e) => self.after_navigation(Err(e)),
            },
            KeyCode::Char('o') => {
                self.open_directory_input(DirectoryPurpose::Browse);
            }
            KeyCode::F(5) => {
                let result = self.session.refresh();
                self.after_navigation(result);
            }
            KeyCode::Char('d') => match self.session.plan_delete() {
                Ok(plan) => self.confirm_plan(plan),
                Err(e) => self.show_notice(bulk_error_notice(&e)),
            },
            KeyCode::Char('r') => {
                if self.session.selection().is_empty() {
                    self.show_notice(bulk_error_notice(&BulkError::NoSelection("rename")));
                } else {
                    self.rename_field = RenameField::Pattern;
                    self.view = View::RenameInput;
                }
            }
            KeyCode::Char('c') => {
                if self.session.selection().is_empty() {
                    self.show_notice(bulk_error_notice(&BulkError::NoSelection("copy")));
                } else {
                    self.open_directory_input(DirectoryPurpose::CopyDestination);
                }
            }
            _ => {}
        }
        false
    }

    fn apply_filter_input(&mut self) {
        let pattern = self.filter_input.clone();
        self.session.update_filter(|f| f.pattern = pattern);
        self.clamp_selection();
    }

    fn rename_input_mut(&mut self) -> &mut String {
        match self.rename_field {
            RenameField::Pattern => &mut self.rename_pattern,
            RenameField::Replacement => &mut self.rename_replacement,
        }
    }

    fn open_directory_input(&mut self, purpose: DirectoryPurpose) {
        self.directory_purpose = purpose;
        self.directory_input = self
            .session
            .current_folder()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.view = View::DirectoryInput;
    }

    fn submit_directory(&mut self) {
        let path = PathBuf::from(shellexpand::tilde(self.directory_input.trim()).to_string());
        self.view = View::Browser;

        match self.directory_purpose {
            DirectoryPurpose::Browse => {
                let result = self.session.browse(&path);
                self.after_navigation(result);
            }
            DirectoryPurpose::CopyDestination => {
                if !path.is_dir() {
                    self.show_notice(Notice::error(
                        "Error",
                        format!("Not a folder: {}", path.display()),
                    ));
                    return;
                }
                match self.session.plan_copy(&path) {
                    Ok(plan) => self.confirm_plan(plan),
                    Err(e) => self.show_notice(bulk_error_notice(&e)),
                }
            }
        }
    }

    fn submit_rename(&mut self) {
        self.view = View::Browser;
        match self
            .session
            .plan_rename(&self.rename_pattern, &self.rename_replacement)
        {
            Ok(plan) if plan.is_empty() => self.show_notice(no_changes_notice()),
            Ok(plan) => self.confirm_plan(plan),
            Err(e) => self.show_notice(bulk_error_notice(&e)),
        }
    }

    fn activate_selected(&mut self) {
        let Some(item) = self
            .list_state
            .selected()
            .and_then(|position| self.session.visible_at(position))
        else {
            return;
        };
        let path = item.path.clone();

        if item.is_folder() {
            let result = self.session.open_folder(&path);
            self.after_navigation(result);
            return;
        }

        match preview::preview(&path) {
            Ok(preview) => {
                self.preview = Some(preview);
                self.preview_scroll = 0;
                self.view = View::Preview;
            }
            Err(e) => self.show_notice(Notice::error(
                "Preview Error",
                format!("Cannot preview file: {}", e),
            )),
        }
    }

    fn after_navigation(&mut self, result: Result<(), crate::error::ScanError>) {
        match result {
            Ok(()) => {
                self.list_state.select(None);
                self.clamp_selection();
            }
            Err(e) => {
                tracing::warn!(error = %e, "scan failed");
                self.session.set_status(format!("Error: {}", e));
                self.show_notice(scan_error_notice(&e));
            }
        }
    }

    fn confirm_plan(&mut self, plan: Plan) {
        self.pending_plan = Some(plan);
        self.view = View::Confirm;
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.view = View::Notice;
    }

    fn start_operation(&mut self, plan: Plan) {
        let kind = plan.kind();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut sink = ChannelProgress::new(progress_tx, cancelled.clone());

        let handle = tokio::task::spawn_blocking(move || plan.execute(&mut sink));

        self.active_operation = Some(ActiveOperation {
            kind,
            handle,
            progress_rx,
            cancelled,
            progress: None,
        });
        self.throbber_frame = 0;
        self.session.set_status(format!("{}...", kind.progress_title()));
        self.view = View::Working;
    }

    async fn poll_operation(&mut self) {
        let Some(op) = &mut self.active_operation else {
            return;
        };

        while let Ok(update) = op.progress_rx.try_recv() {
            op.progress = Some(update);
        }

        if !op.handle.is_finished() {
            self.throbber_frame = (self.throbber_frame + 1) % THROBBER_CHARS.len();
            return;
        }

        let Some(op) = self.active_operation.take() else {
            return;
        };
        match op.handle.await {
            Ok(report) => {
                let notice = self.session.complete(&report);
                self.list_state.select(None);
                self.clamp_selection();
                self.show_notice(notice);
            }
            Err(e) => {
                tracing::error!(operation = op.kind.verb(), error = %e, "worker failed");
                let message = format!("{} worker failed: {}", op.kind.progress_title(), e);
                self.session.set_status(message.clone());
                self.show_notice(Notice::error("Error", message));
            }
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.view().len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        match self.list_state.selected() {
            None => self.list_state.select(Some(0)),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            Some(_) => {}
        }
    }

    fn list_next(&mut self) {
        let count = self.session.view().len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= count - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn list_next_no_wrap(&mut self) {
        let count = self.session.view().len();
        if let Some(i) = self.list_state.selected() {
            if i + 1 < count {
                self.list_state.select(Some(i + 1));
            }
        }
    }

    fn list_previous(&mut self) {
        let count = self.session.view().len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn list_top(&mut self) {
        if !self.session.view().is_empty() {
            self.list_state.select(Some(0));
        }
    }

    fn list_bottom(&mut self) {
        let count = self.session.view().len();
        if count > 0 {
            self.list_state.select(Some(count - 1));
        }
    }

    fn list_page_down(&mut self) {
        let count = self.session.view().len();
        if count == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + PAGE_SIZE).min(count - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn list_page_up(&mut self) {
        if self.session.view().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(PAGE_SIZE),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Folder and filter state
                Constraint::Min(0),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);

        match self.view {
            View::Browser | View::FilterInput => self.render_browser(f, chunks[1]),
            View::DirectoryInput => self.render_directory_input(f, chunks[1]),
            View::RenameInput => self.render_rename_input(f, chunks[1]),
            View::Confirm => self.render_confirm(f, chunks[1]),
            View::Working => self.render_working(f, chunks[1]),
            View::Notice => self.render_notice(f, chunks[1]),
            View::Preview => self.render_preview(f, chunks[1]),
            View::Help => self.render_help(f, chunks[1]),
        }

        if self.view == View::FilterInput {
            self.render_filter_bar(f, chunks[2]);
        } else {
            self.render_status_bar(f, chunks[2]);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let folder = self
            .session
            .current_folder()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no folder)".to_string());
        let filter = self.session.filter();
        let on_off = |flag: bool| if flag { "on" } else { "off" };

        let lines = vec![
            Line::from(vec![
                Span::styled("Folder: ", Style::default().fg(Color::Yellow)),
                Span::raw(folder),
            ]),
            Line::from(vec![
                Span::styled("Filter: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("'{}'", filter.pattern),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(format!(
                    " | Regex: {} | Case: {} | Recursive: {} | Show: {} | Sort: {}",
                    on_off(filter.use_regex),
                    on_off(filter.case_sensitive),
                    on_off(self.session.is_recursive()),
                    filter.type_filter.display_name(),
                    self.session.sort().display_name()
                )),
            ]),
        ];

        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("filesieve"));
        f.render_widget(paragraph, area);
    }

    fn render_browser(&mut self, f: &mut Frame, area: Rect) {
        let session = &self.session;
        let show_path = session.is_recursive();

        let items: Vec<ListItem> = session
            .visible()
            .into_iter()
            .map(|item| {
                let check = if session.selection().contains(&item.path) {
                    "[x]"
                } else {
                    "[ ]"
                };
                let mut content = format!(
                    "{} {} {} {:>12}  {:<16}",
                    check,
                    item.kind.icon(),
                    fit(&item.name, NAME_WIDTH),
                    item.size_display(),
                    item.modified_display()
                );
                if show_path {
                    content.push_str("  ");
                    content.push_str(&item.path.display().to_string());
                }
                let style = if item.is_folder() {
                    Style::default().fg(Color::Blue)
                } else {
                    Style::default()
                };
                ListItem::new(content).style(style)
            })
            .collect();

        let title = format!(
            "Items | {} of {} shown | 1-5: sort {}",
            session.view().len(),
            session.catalog().len(),
            SortColumn::ALL
                .iter()
                .map(|c| c.display_name())
                .collect::<Vec<_>>()
                .join("/")
        );

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");

        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_directory_input(&self, f: &mut Frame, area: Rect) {
        let text = vec![
            Line::from(""),
            Line::from("Enter folder path:"),
            Line::from(""),
            Line::from(vec![
                Span::styled(&self.directory_input, Style::default().fg(Color::Cyan)),
                Span::raw("█"),
            ]),
            Line::from(""),
            Line::from("Press Enter to accept, Esc to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.directory_purpose.title()),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_rename_input(&self, f: &mut Frame, area: Rect) {
        let field_line = |label: &'static str, value: &str, active: bool| {
            let label_style = if active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let mut spans = vec![
                Span::styled(label, label_style),
                Span::styled(value.to_string(), Style::default().fg(Color::Cyan)),
            ];
            if active {
                spans.push(Span::raw("█"));
            }
            Line::from(spans)
        };

        let mode = format!(
            "Mode: {}, case sensitive",
            if self.session.filter().use_regex {
                "regex"
            } else {
                "literal"
            }
        );

        let text = vec![
            Line::from(""),
            Line::from(format!(
                "Rename {} selected item(s)",
                self.session.selection().len()
            )),
            Line::from(vec![Span::styled(mode, Style::default().fg(Color::Gray))]),
            Line::from(""),
            field_line(
                "Find:    ",
                &self.rename_pattern,
                self.rename_field == RenameField::Pattern,
            ),
            field_line(
                "Replace: ",
                &self.rename_replacement,
                self.rename_field == RenameField::Replacement,
            ),
            Line::from(""),
            Line::from("Tab: switch field | Enter: preview changes | Esc: cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Rename"))
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from("")];
        let mut title = "Confirm".to_string();

        if let Some(plan) = &self.pending_plan {
            let (plan_title, message) = plan.confirmation();
            lines.push(Line::from(vec![Span::styled(
                plan_title.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]));
            lines.push(Line::from(""));
            for line in message.lines() {
                lines.push(Line::from(line.to_string()));
            }
            title = plan_title;
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            "Press Y to confirm, N/Esc to cancel",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_working(&self, f: &mut Frame, area: Rect) {
        let Some(op) = &self.active_operation else {
            return;
        };
        let throbber = THROBBER_CHARS[self.throbber_frame % THROBBER_CHARS.len()];

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                format!("{} {}...", throbber, op.kind.progress_title()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];

        let ratio = match &op.progress {
            Some(progress) => {
                lines.push(Line::from(vec![
                    Span::styled("Item: ", Style::default().fg(Color::Gray)),
                    Span::styled(
                        format!("{} of {}", progress.current, progress.total),
                        Style::default().fg(Color::Cyan),
                    ),
                ]));
                lines.push(Line::from(progress.status.clone()));
                if progress.total > 0 {
                    progress.current as f64 / progress.total as f64
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        if op.cancelled.load(Ordering::Relaxed) {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![Span::styled(
                "Cancelling after the current item...",
                Style::default().fg(Color::Red),
            )]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from("Press Esc or c to cancel"));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(op.kind.progress_title()),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, chunks[0]);

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(ratio.clamp(0.0, 1.0));
        f.render_widget(gauge, chunks[1]);
    }

    fn render_notice(&self, f: &mut Frame, area: Rect) {
        let Some(notice) = &self.notice else {
            return;
        };
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                notice.title.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];
        lines.extend(notice.message.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            "Press any key to continue",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )]));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(notice.title.clone()),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    fn render_preview(&self, f: &mut Frame, area: Rect) {
        let Some(preview) = &self.preview else {
            return;
        };

        let paragraph = Paragraph::new(preview.text.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Preview: {}", preview.path.display())),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.preview_scroll, 0));

        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let section = |title: &'static str| {
            Line::from(vec![Span::styled(title, Style::default().fg(Color::Yellow))])
        };

        let help_text = vec![
            Line::from(vec![Span::styled(
                "filesieve - Keyboard Shortcuts",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            section("Navigation:"),
            Line::from("  j/↓ k/↑     Move down / up"),
            Line::from("  g/G         Jump to top / bottom"),
            Line::from("  Enter       Open folder or preview file"),
            Line::from("  Backspace   Back to previous folder"),
            Line::from("  u           Up to parent folder"),
            Line::from("  o           Browse to a folder"),
            Line::from("  F5          Refresh"),
            Line::from(""),
            section("Filter:"),
            Line::from("  /           Edit name pattern"),
            Line::from("  R           Toggle regex"),
            Line::from("  C           Toggle case sensitivity"),
            Line::from("  t           Cycle type filter (all/files/folders)"),
            Line::from("  s           Toggle recursive listing"),
            Line::from("  1-5         Sort by type/name/size/modified/path (again reverses)"),
            Line::from(""),
            section("Selection:"),
            Line::from("  Space       Toggle item"),
            Line::from("  a / A       Select / deselect all shown"),
            Line::from("  i           Invert selection of shown items"),
            Line::from(""),
            section("Actions:"),
            Line::from("  d           Delete selected"),
            Line::from("  r           Rename selected"),
            Line::from("  c           Copy selected"),
            Line::from(""),
            section("General:"),
            Line::from("  ?           Show this help"),
            Line::from("  q           Quit"),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Press any key to close",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            )]),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help (?)"))
            .wrap(Wrap { trim: true });

        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let help_text = match self.view {
            View::Browser => "Space: toggle | /: filter | d/r/c: delete/rename/copy | ?: help | q: quit",
            View::FilterInput => "",
            View::DirectoryInput => "Enter: accept | Esc: cancel",
            View::RenameInput => "Tab: switch field | Enter: continue | Esc: cancel",
            View::Confirm => "y: confirm | n/Esc: cancel",
            View::Working => "Esc/c: cancel",
            View::Notice => "Press any key to continue",
            View::Preview => "↑↓/jk: scroll | Esc: close",
            View::Help => "Press any key to close help",
        };

        let mut spans = Vec::new();
        if !self.session.status().is_empty() {
            spans.push(Span::styled(
                self.session.status(),
                Style::default().fg(Color::Yellow),
            ));
            spans.push(Span::raw(" | "));
        }
        spans.push(Span::styled(
            self.session.selection().label(),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(help_text, Style::default().fg(Color::Gray)));

        f.render_widget(Paragraph::new(vec![Line::from(spans)]), area);
    }

    fn render_filter_bar(&self, f: &mut Frame, area: Rect) {
        let filter_line = Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(Color::Cyan)),
            Span::styled(&self.filter_input, Style::default().fg(Color::Yellow)),
            Span::raw("█"),
            Span::styled(
                format!("  {} (Enter to keep, Esc to cancel)", self.session.status()),
                Style::default().fg(Color::Gray),
            ),
        ]);

        f.render_widget(Paragraph::new(vec![filter_line]), area);
    }
}

/// Pad or cut `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::fs;
    use tempfile::TempDir;

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn create_test_filesystem() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("IMG_1.png"), b"one").unwrap();
        fs::write(root.join("img_2.PNG"), b"two").unwrap();
        fs::create_dir(root.join("notes")).unwrap();
        fs::write(root.join("notes/todo.txt"), b"todo").unwrap();
        temp_dir
    }

    fn create_test_app(root: &std::path::Path) -> App {
        let mut session = Session::default();
        session.browse(root).unwrap();
        App::new(session)
    }

    async fn wait_for_operation(app: &mut App) {
        while app.is_busy() {
            app.poll_operation().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn test_fit_pads_and_cuts() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abcd", 4), "abcd");
    }

    #[test]
    fn test_quit_and_help() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        assert!(!press(&mut app, KeyCode::Char('?')));
        assert_eq!(app.view(), View::Help);
        // q closes help rather than quitting
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.view(), View::Browser);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_filter_input_is_live_and_cancellable() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.view(), View::FilterInput);
        type_text(&mut app, "img");
        assert_eq!(app.session().view().len(), 2);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::Browser);
        assert_eq!(app.session().filter().pattern, "");
        assert_eq!(app.session().view().len(), 3);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "notes");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().filter().pattern, "notes");
        assert_eq!(app.session().view().len(), 1);
    }

    #[test]
    fn test_space_toggles_and_advances() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.session().selection().len(), 1);
        assert_eq!(app.list_state.selected(), Some(1));

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.session().selection().len(), 3);
        press(&mut app, KeyCode::Char('i'));
        assert!(app.session().selection().is_empty());
    }

    #[test]
    fn test_enter_opens_folder_and_backspace_returns() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        // Catalog order sorted by name: IMG_1.png, img_2.PNG, notes
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.session().current_folder(),
            Some(temp_dir.path().join("notes").as_path())
        );
        assert_eq!(app.list_state.selected(), Some(0));

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.session().current_folder(), Some(temp_dir.path()));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.session().status(), "No previous folder");
    }

    #[test]
    fn test_enter_on_file_previews() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), View::Preview);
        assert_eq!(app.preview.as_ref().map(|p| p.text.as_str()), Some("one"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), View::Browser);
        assert!(app.preview.is_none());
    }

    #[test]
    fn test_bulk_without_selection_warns() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.view(), View::Notice);
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.title, "No Selection");
        assert_eq!(notice.message, "Please select items to rename.");

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.view(), View::Browser);
    }

    #[test]
    fn test_rename_with_no_changes() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.view(), View::RenameInput);
        type_text(&mut app, "zzz");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "y");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.view(), View::Notice);
        assert_eq!(app.notice.as_ref().unwrap().title, "No Changes");
    }

    #[test]
    fn test_declined_delete_changes_nothing() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.view(), View::Confirm);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.view(), View::Browser);
        assert!(temp_dir.path().join("IMG_1.png").exists());
        assert_eq!(app.session().status(), "Cancelled");
    }

    #[tokio::test]
    async fn test_delete_runs_on_worker() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.view(), View::Working);

        wait_for_operation(&mut app).await;

        assert_eq!(app.view(), View::Notice);
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.title, "Delete Complete");
        assert_eq!(notice.message, "Successfully deleted 3 items.");
        assert!(app.session().catalog().is_empty());
        assert!(app.session().selection().is_empty());
        assert_eq!(app.session().status(), "Deleted 3 items");
    }

    #[tokio::test]
    async fn test_copy_asks_for_destination() {
        let temp_dir = create_test_filesystem();
        let dest_dir = TempDir::new().unwrap();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view(), View::DirectoryInput);

        app.directory_input = dest_dir.path().display().to_string();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view(), View::Confirm);

        press(&mut app, KeyCode::Enter);
        wait_for_operation(&mut app).await;

        assert_eq!(app.view(), View::Notice);
        assert!(dest_dir.path().join("IMG_1.png").exists());
        assert!(temp_dir.path().join("IMG_1.png").exists());
    }

    #[test]
    fn test_copy_to_missing_folder_is_an_error() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('c'));
        app.directory_input = temp_dir.path().join("nope").display().to_string();
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.view(), View::Notice);
        assert_eq!(app.notice.as_ref().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_sort_keys_reorder_view() {
        let temp_dir = create_test_filesystem();
        let mut app = create_test_app(temp_dir.path());

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.session().visible()[0].name, "notes");
    }
}
