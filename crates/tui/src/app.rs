use std::{collections::HashMap, io, thread, time::Duration};

use academy_core::{
    grid::{
        ActiveGrid, CellPosition, GridAction, GridCells, GridConfig, GridKey, GridNavigator,
        KeyInput, SelectionRange,
    },
    intake::IntakeKind,
    models::{SchoolLevel, Weekday},
    pages::{CreateMode, Page},
    schedule::{MergeToggle, ScheduleView, SchedulePage},
    payment::PaymentPage,
    AppDocument, DocumentStore, EditError, Session, StoreEvent,
};
use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    editor::CellEditor,
    grids::{self, GridId, GridSource},
    modal::{ConfirmAction, Modal, PageKind, Prompt, PromptPurpose},
    view::{self, GridFrame, GridScroll, Theme},
};

const TICK_RATE: Duration = Duration::from_millis(250);
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

const GLOBAL_HELP: &str = "^S save  u undo  ^R redo  1-6 section  e/F2 edit  Del clear  q quit";

enum AppEvent {
    Input(Event),
    Tick,
}

/// Top-level tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Roster(SchoolLevel),
    Schedule,
    Payment,
    InOut,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Roster(SchoolLevel::Elementary),
        Section::Roster(SchoolLevel::Middle),
        Section::Roster(SchoolLevel::High),
        Section::Schedule,
        Section::Payment,
        Section::InOut,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Roster(SchoolLevel::Elementary) => "초등부",
            Section::Roster(SchoolLevel::Middle) => "중등부",
            Section::Roster(SchoolLevel::High) => "고등부",
            Section::Schedule => "시간표",
            Section::Payment => "입금명단",
            Section::InOut => "신입/중퇴",
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|section| *section == self)
            .unwrap_or(0)
    }

    fn help(self) -> &'static str {
        match self {
            Section::Roster(_) => {
                "A add class  X delete class  [ ] class  l level  n name  w teacher  S sort  f filter  o add student  x delete student"
            }
            Section::Schedule => {
                "< > page  N new  C copy  E rename  X delete page  m merge  v view  [ ] day/teacher  t/w/T teacher  r/R row  s time  d date"
            }
            Section::Payment => {
                "< > page  N new  C copy  E rename  X delete page  [ ] table  o add row  x delete row  n title  i import"
            }
            Section::InOut => {
                "A add table  X delete table  [ ] table  o add row  x delete row  n month  k kind"
            }
        }
    }
}

/// Screen area of one painted cell.
#[derive(Debug, Clone, Copy)]
struct CellHit {
    grid: GridId,
    area: Rect,
    position: CellPosition,
}

/// Interactive front-end over one [`Session`].
pub struct App {
    session: Session,
    store: DocumentStore,
    store_tx: mpsc::Sender<StoreEvent>,
    store_rx: Option<mpsc::Receiver<StoreEvent>>,
    section: Section,
    schedule_view: ScheduleView,
    payment_level: SchoolLevel,
    class_cursor: HashMap<SchoolLevel, u32>,
    level_filter: HashMap<SchoolLevel, u8>,
    inout_cursor: Option<u32>,
    navigators: HashMap<GridId, GridNavigator>,
    scrolls: HashMap<GridId, GridScroll>,
    active: ActiveGrid<GridId>,
    editor: Option<CellEditor>,
    modal: Option<Modal>,
    hits: Vec<CellHit>,
    status: String,
    loading: bool,
    ticks: usize,
    should_quit: bool,
    theme: Theme,
}

impl App {
    pub fn new(session: Session, store: DocumentStore) -> Self {
        let (store_tx, store_rx) = mpsc::channel(8);
        Self {
            session,
            store,
            store_tx,
            store_rx: Some(store_rx),
            section: Section::Schedule,
            schedule_view: ScheduleView::Day(Weekday::Mon),
            payment_level: SchoolLevel::Elementary,
            class_cursor: HashMap::new(),
            level_filter: HashMap::new(),
            inout_cursor: None,
            navigators: HashMap::new(),
            scrolls: HashMap::new(),
            active: ActiveGrid::new(),
            editor: None,
            modal: None,
            hits: Vec::new(),
            status: String::new(),
            loading: false,
            ticks: 0,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.loading = true;
        self.store.spawn_load(self.store_tx.clone());
        self.set_status(format!("Loading from {}", self.store.describe()));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);
        let mut store_rx = self
            .store_rx
            .take()
            .context("the event loop is already running")?;

        let result = self
            .event_loop(&mut terminal, &mut event_rx, &mut store_rx)
            .await;
        restore_terminal(&mut terminal)?;
        self.store_rx = Some(store_rx);
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        event_rx: &mut mpsc::Receiver<AppEvent>,
        store_rx: &mut mpsc::Receiver<StoreEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            tokio::select! {
                maybe_event = event_rx.recv() => match maybe_event {
                    Some(AppEvent::Input(event)) => self.handle_event(event),
                    Some(AppEvent::Tick) => self.handle_tick(),
                    None => break,
                },
                Some(event) = store_rx.recv() => self.handle_store_event(event),
            }
        }
        info!("event loop finished");
        Ok(())
    }

    fn handle_tick(&mut self) {
        if self.loading || self.session.is_saving() {
            self.ticks = self.ticks.wrapping_add(1);
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn alert(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.modal = Some(Modal::Alert {
            title: title.into(),
            message: message.into(),
        });
    }

    fn confirm(&mut self, message: impl Into<String>, action: ConfirmAction) {
        self.modal = Some(Modal::Confirm {
            message: message.into(),
            action,
        });
    }

    fn prompt(
        &mut self,
        title: &str,
        label: &str,
        initial: &str,
        purpose: PromptPurpose,
    ) {
        self.modal = Some(Modal::Prompt(Prompt::new(title, label, initial, purpose)));
    }

    fn handle_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Loaded(result) => {
                self.loading = false;
                self.navigators.clear();
                self.scrolls.clear();
                self.editor = None;
                self.active.deactivate();
                match self.session.apply_loaded(result) {
                    Ok(()) => self.set_status(format!("Loaded from {}", self.store.describe())),
                    Err(err) => {
                        self.set_status("Working on an empty document");
                        self.alert(
                            "Load failed",
                            format!("{err}\nStarting with an empty document."),
                        );
                    }
                }
                self.sync_active();
            }
            StoreEvent::Saved(result) => match self.session.finish_save(result) {
                Ok(saved_at) => self.set_status(format!(
                    "Saved at {}",
                    saved_at.with_timezone(&Local).format("%H:%M:%S")
                )),
                Err(err) => {
                    self.set_status("Save failed");
                    self.alert("Save failed", err.to_string());
                }
            },
        }
    }

    /// Route one terminal event.
    pub(crate) fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        self.sync_active();
        self.report_selection();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }
        if self.editor.is_some() {
            self.handle_editor_key(key);
            return;
        }
        if self.handle_global_shortcut(&key) {
            return;
        }
        if self.loading {
            self.set_status("Still loading");
            return;
        }
        if let Some(input) = grid_input(&key) {
            if let Some(id) = self.current_grid() {
                self.grid_key(id, input);
            }
            return;
        }
        if let KeyCode::Char(ch) = key.code {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                self.handle_command(ch);
            }
        }
    }

    fn handle_global_shortcut(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('r') => self.redo(),
                KeyCode::Char('c') => self.request_quit(),
                _ => return false,
            }
            return true;
        }
        if !key.modifiers.is_empty() && key.modifiers != KeyModifiers::SHIFT {
            return false;
        }
        match key.code {
            KeyCode::Char('u') => self.undo(),
            KeyCode::Char('q') => self.request_quit(),
            KeyCode::Char(digit @ '1'..='6') => {
                let index = digit as usize - '1' as usize;
                self.section = Section::ALL[index];
                self.set_status(self.section.title());
            }
            _ => return false,
        }
        true
    }

    fn save(&mut self) {
        self.finish_editing();
        if self.loading {
            self.set_status("Still loading");
            return;
        }
        let Some(snapshot) = self.session.begin_save() else {
            self.set_status("A save is already in progress");
            return;
        };
        self.store.spawn_save(snapshot, self.store_tx.clone());
        self.set_status(format!("Saving to {}", self.store.describe()));
    }

    fn undo(&mut self) {
        if self.session.undo() {
            self.set_status("Undone");
        } else {
            self.set_status("Nothing to undo");
        }
    }

    fn redo(&mut self) {
        self.finish_editing();
        if self.session.redo() {
            self.set_status("Redone");
        } else {
            self.set_status("Nothing to redo");
        }
    }

    fn request_quit(&mut self) {
        self.finish_editing();
        if self.session.is_dirty() {
            self.confirm("Unsaved changes will be lost. Quit anyway?", ConfirmAction::Quit);
        } else {
            self.should_quit = true;
        }
    }

    /// Apply a fallible edit through the session; rejections become an
    /// alert and leave the document as it was.
    fn apply_edit<R>(
        &mut self,
        edit: impl FnOnce(&mut AppDocument) -> Result<R, EditError>,
    ) -> Option<R> {
        match self.session.try_edit(edit) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%err, "edit rejected");
                self.alert("Not allowed", err.to_string());
                None
            }
        }
    }

    // ---- grid plumbing -------------------------------------------------

    fn filtered_classes(&self, level: SchoolLevel) -> Vec<u32> {
        let section = self.session.document().roster(level);
        match self.level_filter.get(&level) {
            Some(grade) => section
                .classes_at_levels(&[*grade])
                .into_iter()
                .map(|class| class.table_id)
                .collect(),
            None => section.classes.iter().map(|class| class.table_id).collect(),
        }
    }

    fn current_class(&self, level: SchoolLevel) -> Option<u32> {
        let classes = self.filtered_classes(level);
        self.class_cursor
            .get(&level)
            .filter(|id| classes.contains(id))
            .copied()
            .or_else(|| classes.first().copied())
    }

    fn current_inout_table(&self) -> Option<u32> {
        let tables = &self.session.document().inout.tables;
        self.inout_cursor
            .filter(|id| tables.iter().any(|table| table.id == *id))
            .or_else(|| tables.first().map(|table| table.id))
    }

    /// The schedule view, falling back when its teacher is gone.
    fn resolved_view(&self, page: &SchedulePage) -> ScheduleView {
        match self.schedule_view {
            ScheduleView::Teacher(id) if page.teacher(id).is_none() => page
                .teachers
                .first()
                .map(|teacher| ScheduleView::Teacher(teacher.id))
                .unwrap_or(ScheduleView::Day(Weekday::Mon)),
            view => view,
        }
    }

    /// The grid keyboard input goes to.
    fn current_grid(&self) -> Option<GridId> {
        let document = self.session.document();
        match self.section {
            Section::Roster(level) => self
                .current_class(level)
                .map(|class_id| GridId::Students { level, class_id }),
            Section::Schedule => document.schedule.current().map(|page| GridId::Schedule {
                page_id: page.page_id,
                view: self.resolved_view(page),
            }),
            Section::Payment => document.payment.current().map(|page| GridId::Payment {
                page_id: page.page_id,
                level: self.payment_level,
            }),
            Section::InOut => self
                .current_inout_table()
                .map(|table_id| GridId::InOut { table_id }),
        }
    }

    fn focused_position(&self) -> Option<CellPosition> {
        let id = self.current_grid()?;
        self.navigators.get(&id).and_then(GridNavigator::focused)
    }

    /// Record id of the focused row in the current flat table.
    fn focused_row_id(&self) -> Option<u32> {
        let id = self.current_grid()?;
        let position = self.focused_position()?;
        GridSource::resolve(self.session.document(), id)?.row_id(position.row)
    }

    /// Make the current grid live and drop state of grids that vanished.
    fn sync_active(&mut self) {
        let current = self.current_grid();
        if self
            .editor
            .as_ref()
            .is_some_and(|editor| Some(editor.grid) != current)
        {
            self.finish_editing();
        }
        match current {
            Some(id) => {
                if self.active.activate(id) {
                    debug!(?id, "grid activated");
                }
            }
            None => self.active.deactivate(),
        }
        let document = self.session.document();
        self.navigators
            .retain(|id, _| GridSource::resolve(document, *id).is_some());
        self.scrolls
            .retain(|id, _| GridSource::resolve(document, *id).is_some());
        let active = self.active.active().copied();
        for (id, navigator) in self.navigators.iter_mut() {
            navigator.set_active(Some(*id) == active);
        }
    }

    fn with_grid<R>(
        &mut self,
        id: GridId,
        apply: impl FnOnce(&mut GridNavigator, &GridSource<'_>) -> R,
    ) -> Option<R> {
        let source = GridSource::resolve(self.session.document(), id)?;
        let navigator = prepare_navigator(&mut self.navigators, &mut self.active, id, &source);
        Some(apply(navigator, &source))
    }

    fn grid_key(&mut self, id: GridId, input: KeyInput) {
        let action = self.with_grid(id, |navigator, source| {
            match navigator.editing().or_else(|| navigator.focused()) {
                Some(here) => navigator.handle_key(input, here.row, here.col, source),
                None if focus_first(navigator, source) => GridAction::Moved,
                None => GridAction::None,
            }
        });
        match action {
            Some(GridAction::Ignored) if input.key == GridKey::Escape => {
                if let Some(navigator) = self.navigators.get_mut(&id) {
                    navigator.clear_selection();
                }
            }
            Some(action) => self.apply_grid_action(id, action),
            None => {}
        }
    }

    fn apply_grid_action(&mut self, id: GridId, action: GridAction) {
        match action {
            GridAction::EditStarted(position) => {
                let text = GridSource::resolve(self.session.document(), id)
                    .map(|source| source.text(position.row, position.col))
                    .unwrap_or("");
                self.editor = Some(CellEditor::new(id, position, text));
            }
            GridAction::EditFinished(_) | GridAction::Moved => self.settle_editor(),
            GridAction::Clear(positions) => {
                if self
                    .apply_edit(|document| grids::clear_cells(document, id, &positions))
                    .is_some()
                {
                    self.set_status(format!("Cleared {} cell(s)", positions.len()));
                }
            }
            GridAction::None | GridAction::Ignored => {}
        }
    }

    /// Commit the editor once its navigator left edit mode.
    fn settle_editor(&mut self) {
        let still_editing = self.editor.as_ref().map(|editor| {
            self.navigators
                .get(&editor.grid)
                .and_then(GridNavigator::editing)
                == Some(editor.position)
        });
        if still_editing == Some(false) {
            if let Some(editor) = self.editor.take() {
                self.commit_editor(editor);
            }
        }
    }

    fn finish_editing(&mut self) {
        if let Some(editor) = self.editor.take() {
            if let Some(navigator) = self.navigators.get_mut(&editor.grid) {
                navigator.exit_edit_mode();
            }
            self.commit_editor(editor);
        }
    }

    fn commit_editor(&mut self, editor: CellEditor) {
        if !editor.is_changed() {
            return;
        }
        let text = editor.input.text().to_string();
        if self
            .apply_edit(|document| grids::apply_text(document, editor.grid, editor.position, &text))
            .is_some()
        {
            debug!(grid = ?editor.grid, row = editor.position.row, col = editor.position.col, "cell committed");
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('s') {
            self.save();
            return;
        }
        let forward = match key.code {
            KeyCode::Enter => Some(GridKey::Enter),
            KeyCode::Tab => Some(GridKey::Tab),
            KeyCode::Esc => Some(GridKey::Escape),
            KeyCode::Up => Some(GridKey::Up),
            KeyCode::Down => Some(GridKey::Down),
            KeyCode::Left if editor.input.at_start() => Some(GridKey::Left),
            KeyCode::Right if editor.input.at_end() => Some(GridKey::Right),
            _ => {
                editor.input.apply_key(&key);
                None
            }
        };
        let Some(grid_key) = forward else {
            return;
        };
        let grid = editor.grid;
        let mut input = KeyInput::plain(grid_key).at_boundary(true);
        if ctrl {
            input = input.with_ctrl();
        }
        if key.modifiers.contains(KeyModifiers::SHIFT) {
            input = input.with_shift();
        }
        self.grid_key(grid, input);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.modal.is_some() || self.loading {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(hit) = self.hit_at(mouse.column, mouse.row) else {
                    return;
                };
                // Clicking another cell ends editing the way a blur does.
                if self
                    .editor
                    .as_ref()
                    .is_some_and(|editor| (editor.grid, editor.position) != (hit.grid, hit.position))
                {
                    self.finish_editing();
                }
                self.select_grid(hit.grid);
                self.with_grid(hit.grid, |navigator, source| {
                    navigator.handle_mouse_down(hit.position.row, hit.position.col, source)
                });
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(hit) = self.hit_at(mouse.column, mouse.row) else {
                    return;
                };
                if self.active.is_active(&hit.grid) {
                    self.with_grid(hit.grid, |navigator, source| {
                        navigator.handle_mouse_enter(hit.position.row, hit.position.col, source)
                    });
                }
            }
            // Released anywhere, even outside every grid.
            MouseEventKind::Up(MouseButton::Left) => {
                for navigator in self.navigators.values_mut() {
                    navigator.handle_mouse_up();
                }
            }
            _ => {}
        }
    }

    fn hit_at(&self, column: u16, row: u16) -> Option<CellHit> {
        self.hits
            .iter()
            .find(|hit| {
                let area = hit.area;
                column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
            })
            .copied()
    }

    /// Point the section cursors at a clicked grid.
    fn select_grid(&mut self, id: GridId) {
        match id {
            GridId::Students { level, class_id } => {
                self.class_cursor.insert(level, class_id);
            }
            GridId::Payment { level, .. } => self.payment_level = level,
            GridId::InOut { table_id } => self.inout_cursor = Some(table_id),
            GridId::Schedule { .. } => {}
        }
        self.sync_active();
    }

    fn report_selection(&mut self) {
        let Some(id) = self.active.active().copied() else {
            return;
        };
        let change = self
            .navigators
            .get_mut(&id)
            .and_then(GridNavigator::take_selection_change);
        if let Some(Some(range)) = change {
            let (top, left, bottom, right) = range.bounds();
            if (top, left) != (bottom, right) {
                self.set_status(format!(
                    "Selected {} x {}",
                    bottom - top + 1,
                    right - left + 1
                ));
            }
        }
    }

    // ---- section commands ----------------------------------------------

    fn handle_command(&mut self, ch: char) {
        if ch == 'e' {
            if let Some(id) = self.current_grid() {
                self.grid_key(id, KeyInput::plain(GridKey::F2));
            }
            return;
        }
        match self.section {
            Section::Roster(level) => self.roster_command(level, ch),
            Section::Schedule => {
                if !self.page_command(PageKind::Schedule, ch) {
                    self.schedule_command(ch);
                }
            }
            Section::Payment => {
                if !self.page_command(PageKind::Payment, ch) {
                    self.payment_command(ch);
                }
            }
            Section::InOut => self.inout_command(ch),
        }
    }

    /// `(id, name, page count)` of the current page.
    fn current_page(&self, kind: PageKind) -> Option<(u32, String, usize)> {
        let document = self.session.document();
        match kind {
            PageKind::Schedule => {
                let section = &document.schedule;
                section
                    .current()
                    .map(|page| (page.id(), page.name().to_string(), section.pages.len()))
            }
            PageKind::Payment => {
                let section = &document.payment;
                section
                    .current()
                    .map(|page| (page.id(), page.name().to_string(), section.pages.len()))
            }
        }
    }

    fn page_command(&mut self, kind: PageKind, ch: char) -> bool {
        let Some((page_id, name, count)) = self.current_page(kind) else {
            return false;
        };
        match ch {
            '<' | ',' | '>' | '.' => {
                let offset = if matches!(ch, '<' | ',') { -1 } else { 1 };
                self.session.edit(|document| match kind {
                    PageKind::Schedule => document.schedule.cycle_page(offset),
                    PageKind::Payment => document.payment.cycle_page(offset),
                });
                if let Some((_, name, _)) = self.current_page(kind) {
                    self.set_status(format!("Page: {name}"));
                }
            }
            'N' => {
                let prefix = match kind {
                    PageKind::Schedule => SchedulePage::DEFAULT_NAME,
                    PageKind::Payment => PaymentPage::DEFAULT_NAME,
                };
                let initial = format!("{prefix}{}", count + 1);
                self.prompt(
                    "New page",
                    "Name of the empty page",
                    &initial,
                    PromptPurpose::NewPage {
                        kind,
                        mode: CreateMode::Empty,
                    },
                );
            }
            'C' => self.prompt(
                "Copy page",
                &format!("Name for the copy of {name}"),
                &format!("{name} copy"),
                PromptPurpose::NewPage {
                    kind,
                    mode: CreateMode::Copy,
                },
            ),
            'E' => self.prompt(
                "Rename page",
                "New page name",
                &name,
                PromptPurpose::RenamePage { kind, page_id },
            ),
            'X' => {
                if count <= 1 {
                    self.alert("Not allowed", EditError::LastPage.to_string());
                } else {
                    self.confirm(
                        format!("Delete page \"{name}\"?"),
                        ConfirmAction::DeletePage { kind, page_id },
                    );
                }
            }
            _ => return false,
        }
        true
    }

    fn schedule_command(&mut self, ch: char) {
        let Some(GridId::Schedule { page_id, view }) = self.current_grid() else {
            return;
        };
        let focused = self.focused_position();
        let document = self.session.document();
        let Some(page) = document.schedule.page(page_id) else {
            return;
        };
        let focused_teacher = view.teacher_at(page, focused.map(|pos| pos.col).unwrap_or(0));
        let teacher_name = focused_teacher
            .and_then(|id| page.teacher(id))
            .map(|teacher| teacher.name.clone())
            .unwrap_or_default();
        let focused_day = match view {
            ScheduleView::Day(day) => day,
            ScheduleView::Teacher(_) => focused
                .and_then(|pos| Weekday::from_index(pos.col))
                .unwrap_or(Weekday::Mon),
        };
        let settings = page.time_settings.clone();
        let day_date = page.day_dates.get(&focused_day).cloned().unwrap_or_default();
        let teachers: Vec<u32> = page.teachers.iter().map(|teacher| teacher.id).collect();

        match ch {
            'm' => self.toggle_merge(page_id, view),
            'v' => {
                self.schedule_view = match view {
                    ScheduleView::Day(_) => match focused_teacher.or(teachers.first().copied()) {
                        Some(id) => ScheduleView::Teacher(id),
                        None => view,
                    },
                    ScheduleView::Teacher(_) => ScheduleView::Day(focused_day),
                };
            }
            '[' | ']' => {
                let step: isize = if ch == '[' { -1 } else { 1 };
                self.schedule_view = match view {
                    ScheduleView::Day(day) => {
                        let next = (day.index() as isize + step).rem_euclid(7) as usize;
                        ScheduleView::Day(Weekday::from_index(next).unwrap_or(day))
                    }
                    ScheduleView::Teacher(id) => {
                        let index = teachers.iter().position(|t| *t == id).unwrap_or(0) as isize;
                        let len = teachers.len().max(1) as isize;
                        let next = (index + step).rem_euclid(len) as usize;
                        teachers
                            .get(next)
                            .map(|id| ScheduleView::Teacher(*id))
                            .unwrap_or(view)
                    }
                };
            }
            't' => self.prompt(
                "Add teacher",
                "Teacher name",
                "",
                PromptPurpose::AddTeacher { page_id },
            ),
            'w' => {
                if let Some(teacher_id) = focused_teacher {
                    self.prompt(
                        "Rename teacher",
                        "Teacher name",
                        &teacher_name,
                        PromptPurpose::RenameTeacher {
                            page_id,
                            teacher_id,
                        },
                    );
                }
            }
            'T' => {
                if let Some(teacher_id) = focused_teacher {
                    let label = if teacher_name.is_empty() {
                        "this teacher".to_string()
                    } else {
                        teacher_name
                    };
                    self.confirm(
                        format!("Delete {label} and every class in the column?"),
                        ConfirmAction::DeleteTeacher {
                            page_id,
                            teacher_id,
                        },
                    );
                }
            }
            'r' => {
                if self
                    .apply_edit(|document| {
                        grids::schedule_page_mut(document, page_id)?.insert_time_row();
                        Ok(())
                    })
                    .is_some()
                {
                    self.set_status("Time row added");
                }
            }
            'R' => match focused.and_then(|pos| view.slot_at(pos.row)) {
                Some(slot) => self.confirm(
                    format!("Delete time row {}?", slot + 1),
                    ConfirmAction::DeleteTimeRow { page_id, slot },
                ),
                None => self.set_status("Focus a time row first"),
            },
            's' => self.prompt(
                "Time settings",
                "Start hour (e.g. 오후 1)",
                &settings.start_hour,
                PromptPurpose::StartHour { page_id },
            ),
            'd' => self.prompt(
                "Day date",
                &format!("Date shown next to {focused_day}"),
                &day_date,
                PromptPurpose::DayDate {
                    page_id,
                    day: focused_day,
                },
            ),
            _ => {}
        }
    }

    fn toggle_merge(&mut self, page_id: u32, view: ScheduleView) {
        let id = GridId::Schedule { page_id, view };
        let selection = self.navigators.get(&id).and_then(GridNavigator::selection);
        let Some(toggle) = self.apply_edit(|document| {
            grids::schedule_page_mut(document, page_id)?.toggle_merge(view, selection)
        }) else {
            return;
        };
        let col = selection.map(|range| range.bounds().1).unwrap_or(0);
        let group = toggle.group();
        // The merge rewrote the geometry; land on the group's primary cell.
        self.active
            .request_focus(id, CellPosition::new(view.grid_row(group.start), col));
        match toggle {
            MergeToggle::Merged(group) => self.set_status(format!("Merged {} rows", group.rowspan)),
            MergeToggle::Unmerged(_) => self.set_status("Unmerged"),
        }
    }

    fn roster_command(&mut self, level: SchoolLevel, ch: char) {
        match ch {
            'A' => {
                let class_id = self.session.edit(|document| document.roster_mut(level).add_class());
                self.level_filter.remove(&level);
                self.class_cursor.insert(level, class_id);
                self.set_status("Class added");
                return;
            }
            '[' | ']' => {
                let classes = self.filtered_classes(level);
                if let Some(current) = self.current_class(level) {
                    let index = classes.iter().position(|id| *id == current).unwrap_or(0) as isize;
                    let step = if ch == '[' { -1 } else { 1 };
                    let next = (index + step).rem_euclid(classes.len() as isize) as usize;
                    if let Some(id) = classes.get(next) {
                        self.class_cursor.insert(level, *id);
                    }
                }
                return;
            }
            'f' => {
                let next = match self.level_filter.get(&level) {
                    None => Some(1),
                    Some(grade) if *grade < level.max_grade() => Some(grade + 1),
                    Some(_) => None,
                };
                match next {
                    Some(grade) => {
                        self.level_filter.insert(level, grade);
                        self.set_status(format!("Showing {grade}학년 only"));
                    }
                    None => {
                        self.level_filter.remove(&level);
                        self.set_status("Showing every level");
                    }
                }
                return;
            }
            'S' => {
                self.session
                    .edit(|document| document.roster_mut(level).sort_by_level());
                self.class_cursor.remove(&level);
                self.navigators
                    .retain(|id, _| !matches!(id, GridId::Students { level: l, .. } if *l == level));
                self.set_status("Classes sorted by level");
                return;
            }
            _ => {}
        }

        let Some(class_id) = self.current_class(level) else {
            if matches!(ch, 'X' | 'l' | 'n' | 'w' | 'o' | 'x') {
                self.set_status("No class yet. Press A to add one.");
            }
            return;
        };
        let Some(class) = self.session.document().roster(level).class(class_id).cloned() else {
            return;
        };
        match ch {
            'X' => {
                let label = if class.class_name.is_empty() {
                    "this class".to_string()
                } else {
                    class.class_name
                };
                self.confirm(
                    format!("Delete {label} and its students?"),
                    ConfirmAction::DeleteClass { level, class_id },
                );
            }
            'l' => {
                if let Some(grade) = self.apply_edit(|document| {
                    document.roster_mut(level).cycle_level(class_id, level)
                }) {
                    self.set_status(format!("Level {grade}"));
                }
            }
            'n' => self.prompt(
                "Class name",
                "Name of the class",
                &class.class_name,
                PromptPurpose::ClassName { level, class_id },
            ),
            'w' => self.prompt(
                "Class teacher",
                "Teacher in charge",
                &class.teacher,
                PromptPurpose::ClassTeacher { level, class_id },
            ),
            'o' => {
                if self
                    .apply_edit(|document| document.roster_mut(level).add_student(class_id))
                    .is_some()
                {
                    let rows = self.session.document().roster(level).students(class_id).len();
                    self.focus_new_row(GridId::Students { level, class_id }, rows);
                }
            }
            'x' => {
                if let Some(student_id) = self.focused_row_id() {
                    self.confirm(
                        "Delete this student?",
                        ConfirmAction::DeleteStudent {
                            level,
                            class_id,
                            student_id,
                        },
                    );
                }
            }
            _ => {}
        }
    }

    fn focus_new_row(&mut self, id: GridId, rows: usize) {
        if rows > 0 {
            self.active.request_focus(id, CellPosition::new(rows - 1, 0));
        }
        self.set_status("Row added");
    }

    fn payment_command(&mut self, ch: char) {
        let Some(GridId::Payment { page_id, level }) = self.current_grid() else {
            return;
        };
        match ch {
            '[' | ']' => {
                let index = SchoolLevel::ALL.iter().position(|l| *l == level).unwrap_or(0) as isize;
                let step = if ch == '[' { -1 } else { 1 };
                let next = (index + step).rem_euclid(SchoolLevel::ALL.len() as isize) as usize;
                self.payment_level = SchoolLevel::ALL[next];
            }
            'o' => {
                if let Some(rows) = self.apply_edit(|document| {
                    let page = grids::payment_page_mut(document, page_id)?;
                    page.add_row(level);
                    Ok(page.table(level).rows.len())
                }) {
                    self.focus_new_row(GridId::Payment { page_id, level }, rows);
                }
            }
            'x' => {
                if let Some(row_id) = self.focused_row_id() {
                    self.confirm(
                        "Delete this payment row?",
                        ConfirmAction::DeletePaymentRow {
                            page_id,
                            level,
                            row_id,
                        },
                    );
                }
            }
            'n' => {
                let title = self
                    .session
                    .document()
                    .payment
                    .page(page_id)
                    .map(|page| page.table(level).title.clone())
                    .unwrap_or_default();
                self.prompt(
                    "Table title",
                    &format!("Title of the {} table", level.label()),
                    &title,
                    PromptPurpose::PaymentTitle { page_id, level },
                );
            }
            'i' => self.confirm(
                "Append every roster student to this page?",
                ConfirmAction::ImportStudents,
            ),
            _ => {}
        }
    }

    fn inout_command(&mut self, ch: char) {
        if ch == 'A' {
            let table_id = self.session.edit(|document| document.inout.add_table());
            self.inout_cursor = Some(table_id);
            self.set_status("Table added");
            return;
        }
        let Some(table_id) = self.current_inout_table() else {
            if matches!(ch, 'X' | 'o' | 'x' | 'n' | 'k' | '[' | ']') {
                self.set_status("No table yet. Press A to add one.");
            }
            return;
        };
        match ch {
            'X' => self.confirm(
                "Delete this table and its rows?",
                ConfirmAction::DeleteInOutTable { table_id },
            ),
            '[' | ']' => {
                let tables: Vec<u32> = self
                    .session
                    .document()
                    .inout
                    .tables
                    .iter()
                    .map(|table| table.id)
                    .collect();
                let index = tables.iter().position(|id| *id == table_id).unwrap_or(0) as isize;
                let step = if ch == '[' { -1 } else { 1 };
                let next = (index + step).rem_euclid(tables.len() as isize) as usize;
                self.inout_cursor = tables.get(next).copied();
            }
            'o' => {
                if self
                    .apply_edit(|document| document.inout.add_row(table_id))
                    .is_some()
                {
                    let rows = self
                        .session
                        .document()
                        .inout
                        .table(table_id)
                        .map(|table| table.rows.len())
                        .unwrap_or(0);
                    self.focus_new_row(GridId::InOut { table_id }, rows);
                }
            }
            'x' => {
                if let Some(row_id) = self.focused_row_id() {
                    self.confirm(
                        "Delete this row?",
                        ConfirmAction::DeleteInOutRow { table_id, row_id },
                    );
                }
            }
            'n' => {
                let month = self
                    .session
                    .document()
                    .inout
                    .table(table_id)
                    .map(|table| table.month.clone())
                    .unwrap_or_default();
                self.prompt(
                    "Month",
                    "Month label (e.g. 3월)",
                    &month,
                    PromptPurpose::Month { table_id },
                );
            }
            'k' => {
                let kind = self
                    .session
                    .document()
                    .inout
                    .table(table_id)
                    .map(|table| table.kind.toggled())
                    .unwrap_or(IntakeKind::Joined);
                if self
                    .apply_edit(|document| document.inout.set_kind(table_id, kind))
                    .is_some()
                {
                    self.set_status(format!("Marked as {}", kind.label()));
                }
            }
            _ => {}
        }
    }

    // ---- dialogs ---------------------------------------------------------

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        match modal {
            Modal::Prompt(mut prompt) => match key.code {
                KeyCode::Esc => self.set_status("Cancelled"),
                KeyCode::Enter => self.submit_prompt(prompt),
                _ => {
                    prompt.input.apply_key(&key);
                    self.modal = Some(Modal::Prompt(prompt));
                }
            },
            Modal::Confirm { message, action } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.run_confirmed(action)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.set_status("Cancelled")
                }
                _ => self.modal = Some(Modal::Confirm { message, action }),
            },
            Modal::Alert { title, message } => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {}
                _ => self.modal = Some(Modal::Alert { title, message }),
            },
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let text = prompt.input.text().trim().to_string();
        match prompt.purpose {
            PromptPurpose::NewPage { kind, mode } => {
                if self
                    .apply_edit(|document| match kind {
                        PageKind::Schedule => document.schedule.create_page(&text, mode),
                        PageKind::Payment => document.payment.create_page(&text, mode),
                    })
                    .is_some()
                {
                    self.set_status(format!("Created page {text}"));
                }
            }
            PromptPurpose::RenamePage { kind, page_id } => {
                if self
                    .apply_edit(|document| match kind {
                        PageKind::Schedule => document.schedule.rename_page(page_id, &text),
                        PageKind::Payment => document.payment.rename_page(page_id, &text),
                    })
                    .is_some()
                {
                    self.set_status(format!("Renamed to {text}"));
                }
            }
            PromptPurpose::AddTeacher { page_id } => {
                if let Some(teacher_id) = self.apply_edit(|document| {
                    Ok(grids::schedule_page_mut(document, page_id)?.add_teacher(&text))
                }) {
                    if let ScheduleView::Teacher(_) = self.schedule_view {
                        self.schedule_view = ScheduleView::Teacher(teacher_id);
                    }
                    self.set_status("Teacher added");
                }
            }
            PromptPurpose::RenameTeacher {
                page_id,
                teacher_id,
            } => {
                self.apply_edit(|document| {
                    grids::schedule_page_mut(document, page_id)?.rename_teacher(teacher_id, &text)
                });
            }
            PromptPurpose::DayDate { page_id, day } => {
                self.apply_edit(|document| {
                    grids::schedule_page_mut(document, page_id)?.set_day_date(day, &text);
                    Ok(())
                });
            }
            PromptPurpose::StartHour { page_id } => {
                let minute = self.time_setting(page_id, |settings| settings.start_minute.clone());
                self.prompt(
                    "Time settings",
                    "Start minute (e.g. 00)",
                    &minute,
                    PromptPurpose::StartMinute {
                        page_id,
                        hour: text,
                    },
                );
            }
            PromptPurpose::StartMinute { page_id, hour } => {
                let interval = self.time_setting(page_id, |settings| settings.interval.clone());
                self.prompt(
                    "Time settings",
                    "Minutes per row (e.g. 30)",
                    &interval,
                    PromptPurpose::Interval {
                        page_id,
                        hour,
                        minute: text,
                    },
                );
            }
            PromptPurpose::Interval {
                page_id,
                hour,
                minute,
            } => {
                if self
                    .apply_edit(|document| {
                        grids::schedule_page_mut(document, page_id)?
                            .set_time_start(&hour, &minute, &text);
                        Ok(())
                    })
                    .is_some()
                {
                    self.set_status("Time settings updated");
                }
            }
            PromptPurpose::ClassName { level, class_id } => {
                self.apply_edit(|document| {
                    let section = document.roster_mut(level);
                    let teacher = section
                        .class(class_id)
                        .map(|class| class.teacher.clone())
                        .ok_or(EditError::UnknownTable(class_id))?;
                    section.set_class_info(class_id, &text, &teacher)
                });
            }
            PromptPurpose::ClassTeacher { level, class_id } => {
                self.apply_edit(|document| {
                    let section = document.roster_mut(level);
                    let name = section
                        .class(class_id)
                        .map(|class| class.class_name.clone())
                        .ok_or(EditError::UnknownTable(class_id))?;
                    section.set_class_info(class_id, &name, &text)
                });
            }
            PromptPurpose::PaymentTitle { page_id, level } => {
                self.apply_edit(|document| {
                    grids::payment_page_mut(document, page_id)?.set_title(level, &text);
                    Ok(())
                });
            }
            PromptPurpose::Month { table_id } => {
                self.apply_edit(|document| document.inout.set_month(table_id, &text));
            }
        }
    }

    fn time_setting(
        &self,
        page_id: u32,
        read: impl FnOnce(&academy_core::schedule::TimeSettings) -> String,
    ) -> String {
        self.session
            .document()
            .schedule
            .page(page_id)
            .map(|page| read(&page.time_settings))
            .unwrap_or_default()
    }

    fn run_confirmed(&mut self, action: ConfirmAction) {
        info!(?action, "confirmed");
        match action {
            ConfirmAction::DeletePage { kind, page_id } => {
                if self
                    .apply_edit(|document| match kind {
                        PageKind::Schedule => document.schedule.delete_page(page_id),
                        PageKind::Payment => document.payment.delete_page(page_id),
                    })
                    .is_some()
                {
                    self.set_status("Page deleted");
                }
            }
            ConfirmAction::DeleteTeacher {
                page_id,
                teacher_id,
            } => {
                if let Some(removed) = self.apply_edit(|document| {
                    grids::schedule_page_mut(document, page_id)?.delete_teacher(teacher_id)
                }) {
                    self.set_status(format!("Teacher deleted with {removed} cell(s)"));
                }
            }
            ConfirmAction::DeleteTimeRow { page_id, slot } => {
                if self
                    .apply_edit(|document| {
                        grids::schedule_page_mut(document, page_id)?.delete_time_row(slot)
                    })
                    .is_some()
                {
                    self.set_status("Time row deleted");
                }
            }
            ConfirmAction::DeleteClass { level, class_id } => {
                if self
                    .apply_edit(|document| document.roster_mut(level).delete_class(class_id))
                    .is_some()
                {
                    self.set_status("Class deleted");
                }
            }
            ConfirmAction::DeleteStudent {
                level,
                class_id,
                student_id,
            } => {
                self.apply_edit(|document| {
                    document
                        .roster_mut(level)
                        .delete_student(class_id, student_id)
                });
            }
            ConfirmAction::DeletePaymentRow {
                page_id,
                level,
                row_id,
            } => {
                self.apply_edit(|document| {
                    grids::payment_page_mut(document, page_id)?.delete_row(level, row_id)
                });
            }
            ConfirmAction::DeleteInOutTable { table_id } => {
                if self
                    .apply_edit(|document| document.inout.delete_table(table_id))
                    .is_some()
                {
                    self.set_status("Table deleted");
                }
            }
            ConfirmAction::DeleteInOutRow { table_id, row_id } => {
                self.apply_edit(|document| document.inout.delete_row(table_id, row_id));
            }
            ConfirmAction::ImportStudents => {
                match self
                    .session
                    .edit(|document| document.import_students_into_payment())
                {
                    Some(summary) => self.alert(
                        "Import finished",
                        format!(
                            "Imported {} students.\n초등 {} / 중등 {} / 고등 {}",
                            summary.total(),
                            summary.elementary,
                            summary.middle,
                            summary.high
                        ),
                    ),
                    None => self.set_status("No payment page to import into"),
                }
            }
            ConfirmAction::Quit => self.should_quit = true,
        }
    }

    // ---- drawing -----------------------------------------------------------

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        self.hits.clear();
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(5),
            ])
            .split(area);

        self.render_tabs(frame, rows[0]);
        if self.loading {
            let spinner = SPINNER[self.ticks % SPINNER.len()];
            let paragraph = Paragraph::new(format!("{spinner} Loading {}", self.store.describe()))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(paragraph, rows[1]);
        } else {
            match self.section {
                Section::Roster(level) => self.draw_roster(frame, rows[1], level),
                Section::Schedule => self.draw_schedule(frame, rows[1]),
                Section::Payment => self.draw_payment(frame, rows[1]),
                Section::InOut => self.draw_inout(frame, rows[1]),
            }
        }
        self.render_status(frame, rows[2]);

        if let Some(modal) = &self.modal {
            view::render_modal(frame, modal, &self.theme);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Section::ALL
            .iter()
            .enumerate()
            .map(|(index, section)| Line::from(format!("{} {}", index + 1, section.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Academy"))
            .select(self.section.index())
            .highlight_style(
                Style::default()
                    .fg(self.theme.on_accent)
                    .bg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    /// One-line page strip for the schedule and payment sections.
    fn page_strip(&self, kind: PageKind) -> Line<'static> {
        let document = self.session.document();
        let (names, current): (Vec<String>, u32) = match kind {
            PageKind::Schedule => (
                document.schedule.pages.iter().map(|p| p.name().to_string()).collect(),
                document.schedule.current().map(Page::id).unwrap_or(0),
            ),
            PageKind::Payment => (
                document.payment.pages.iter().map(|p| p.name().to_string()).collect(),
                document.payment.current().map(Page::id).unwrap_or(0),
            ),
        };
        let ids: Vec<u32> = match kind {
            PageKind::Schedule => document.schedule.pages.iter().map(Page::id).collect(),
            PageKind::Payment => document.payment.pages.iter().map(Page::id).collect(),
        };
        let mut spans = vec![Span::styled(
            "Pages: ",
            Style::default().fg(self.theme.muted),
        )];
        for (name, id) in names.into_iter().zip(ids) {
            let style = if id == current {
                Style::default()
                    .fg(self.theme.on_accent)
                    .bg(self.theme.accent_alt)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {name} "), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }

    fn draw_grid(&mut self, frame: &mut Frame, area: Rect, id: GridId, title: String) {
        let Some(source) = GridSource::resolve(self.session.document(), id) else {
            return;
        };
        let navigator = prepare_navigator(&mut self.navigators, &mut self.active, id, &source);
        let active = self.active.is_active(&id);
        let editor = self.editor.as_ref().filter(|editor| editor.grid == id);
        let scroll = self.scrolls.entry(id).or_default();
        let hits = view::render_grid(
            frame,
            area,
            GridFrame {
                title,
                source: &source,
                navigator,
                editor,
                active,
            },
            scroll,
            &self.theme,
        );
        self.hits.extend(
            hits.into_iter()
                .map(|(area, position)| CellHit { grid: id, area, position }),
        );
    }

    fn draw_roster(&mut self, frame: &mut Frame, area: Rect, level: SchoolLevel) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(20)])
            .split(area);

        let visible = self.filtered_classes(level);
        let current = self.current_class(level);
        let section = self.session.document().roster(level);
        let items: Vec<ListItem> = visible
            .iter()
            .filter_map(|id| section.class(*id))
            .map(|class| {
                let name = if class.class_name.is_empty() {
                    "(unnamed)"
                } else {
                    class.class_name.as_str()
                };
                let count = section.students(class.table_id).len();
                ListItem::new(format!(
                    "{}학년 {name} · {} ({count})",
                    class.current_level, class.teacher
                ))
            })
            .collect();
        let filter = match self.level_filter.get(&level) {
            Some(grade) => format!(" [{grade}학년]"),
            None => String::new(),
        };
        let mut state = ListState::default();
        state.select(current.and_then(|id| visible.iter().position(|v| *v == id)));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} classes{filter}", level.label())),
            )
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, columns[0], &mut state);

        match current.and_then(|id| section.class(id)).cloned() {
            Some(class) => {
                let title = format!(
                    "{} {}학년 {} · {}",
                    level.label(),
                    class.current_level,
                    class.class_name,
                    class.teacher
                );
                self.draw_grid(
                    frame,
                    columns[1],
                    GridId::Students {
                        level,
                        class_id: class.table_id,
                    },
                    title,
                );
            }
            None => self.draw_placeholder(frame, columns[1], "No class. Press A to add one."),
        }
    }

    fn draw_placeholder(&self, frame: &mut Frame, area: Rect, message: &str) {
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(self.theme.muted))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_schedule(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);
        frame.render_widget(Paragraph::new(self.page_strip(PageKind::Schedule)), rows[0]);

        let Some(id @ GridId::Schedule { page_id, view }) = self.current_grid() else {
            return;
        };
        let title = match self.session.document().schedule.page(page_id) {
            Some(page) => match view {
                ScheduleView::Day(day) => format!("{} · {}", page.page_name, page.day_label(day)),
                ScheduleView::Teacher(teacher_id) => {
                    let name = page
                        .teacher(teacher_id)
                        .map(|teacher| teacher.name.as_str())
                        .filter(|name| !name.is_empty())
                        .unwrap_or("(unnamed)");
                    format!("{} · {name}", page.page_name)
                }
            },
            None => String::new(),
        };
        self.draw_grid(frame, rows[1], id, title);
    }

    fn draw_payment(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);
        frame.render_widget(Paragraph::new(self.page_strip(PageKind::Payment)), rows[0]);

        let Some(page) = self.session.document().payment.current() else {
            return;
        };
        let page_id = page.page_id;
        let titles: Vec<String> = SchoolLevel::ALL
            .iter()
            .map(|level| {
                let table = page.table(*level);
                format!("{} · {} ({} rows)", level.label(), table.title, table.rows.len())
            })
            .collect();
        for ((level, title), area) in SchoolLevel::ALL.into_iter().zip(titles).zip(&rows[1..]) {
            self.draw_grid(frame, *area, GridId::Payment { page_id, level }, title);
        }
    }

    fn draw_inout(&mut self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(20)])
            .split(area);

        let current = self.current_inout_table();
        let tables = &self.session.document().inout.tables;
        let items: Vec<ListItem> = tables
            .iter()
            .map(|table| {
                let month = if table.month.is_empty() { "-" } else { table.month.as_str() };
                ListItem::new(format!(
                    "{month} {} ({})",
                    table.kind.label(),
                    table.rows.len()
                ))
            })
            .collect();
        let mut state = ListState::default();
        state.select(current.and_then(|id| tables.iter().position(|table| table.id == id)));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Tables"))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, columns[0], &mut state);

        let title = current
            .and_then(|id| self.session.document().inout.table(id))
            .map(|table| format!("{} {}", table.month, table.kind.label()));
        match (current, title) {
            (Some(table_id), Some(title)) => {
                self.draw_grid(frame, columns[1], GridId::InOut { table_id }, title)
            }
            _ => self.draw_placeholder(frame, columns[1], "No table. Press A to add one."),
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let mut state = vec![Span::styled(
            self.store.describe(),
            Style::default().fg(self.theme.muted),
        )];
        if self.session.is_saving() {
            let spinner = SPINNER[self.ticks % SPINNER.len()];
            state.push(Span::styled(
                format!("  {spinner} saving"),
                Style::default().fg(self.theme.warning),
            ));
        } else if let Some(saved) = self.session.last_saved() {
            state.push(Span::styled(
                format!(
                    "  last saved {}",
                    saved.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                ),
                Style::default().fg(self.theme.success),
            ));
        }
        if self.session.is_dirty() {
            state.push(Span::styled(
                "  * unsaved changes",
                Style::default().fg(self.theme.warning),
            ));
        }
        let help = if self.editor.is_some() {
            "Enter/Tab/Esc finish editing  arrows at the text edge move".to_string()
        } else {
            format!("{}  |  {GLOBAL_HELP}", self.section.help())
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.as_str()),
            Line::from(state),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Fetch or create the navigator of a grid, sized to its data, and hand it
/// any focus target posted for it.
fn prepare_navigator<'n>(
    navigators: &'n mut HashMap<GridId, GridNavigator>,
    active: &mut ActiveGrid<GridId>,
    id: GridId,
    source: &GridSource<'_>,
) -> &'n mut GridNavigator {
    let (rows, cols) = source.dimensions();
    let navigator = navigators
        .entry(id)
        .or_insert_with(|| GridNavigator::new(GridConfig::new(rows, cols)));
    navigator.resize(rows, cols);
    navigator.set_active(active.is_active(&id));
    if let Some(target) = active.take_focus_for(&id) {
        if navigator.focus_cell(target.row, target.col, source) {
            let end = source
                .merge_info(target.row, target.col)
                .map(|info| info.last_row())
                .unwrap_or(target.row);
            navigator.select(Some(SelectionRange::new(
                target,
                CellPosition::new(end, target.col),
            )));
        }
    }
    navigator
}

/// Focus the first reachable cell of a grid nobody has focused yet.
fn focus_first(navigator: &mut GridNavigator, source: &GridSource<'_>) -> bool {
    let (rows, cols) = source.dimensions();
    if cols == 0 {
        return false;
    }
    match (0..rows).find(|row| !source.skip_row(*row)) {
        Some(row) => {
            let row = source.merge_info(row, 0).map(|info| info.main_row).unwrap_or(row);
            navigator.focus_cell(row, 0, source)
        }
        None => false,
    }
}

/// Keys the grid engine understands outside edit mode.
fn grid_input(key: &KeyEvent) -> Option<KeyInput> {
    let grid_key = match key.code {
        KeyCode::Enter => GridKey::Enter,
        KeyCode::Tab => GridKey::Tab,
        KeyCode::F(2) => GridKey::F2,
        KeyCode::Delete | KeyCode::Backspace => GridKey::Delete,
        KeyCode::Esc => GridKey::Escape,
        KeyCode::Up => GridKey::Up,
        KeyCode::Down => GridKey::Down,
        KeyCode::Left => GridKey::Left,
        KeyCode::Right => GridKey::Right,
        _ => return None,
    };
    let mut input = KeyInput::plain(grid_key);
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        input = input.with_ctrl();
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        input = input.with_shift();
    }
    Some(input)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::store::FileStore;
    use anyhow::bail;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn shift(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::SHIFT))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_event(key(KeyCode::Char(ch)));
        }
    }

    fn app_with_store(store: DocumentStore) -> App {
        App::new(Session::new(AppDocument::default(), 50), store)
    }

    fn app() -> App {
        app_with_store(DocumentStore::File(FileStore::new("academy-test.json")))
    }

    fn first_cell(app: &App) -> String {
        let document = app.session.document();
        document
            .schedule
            .current()
            .and_then(|page| {
                page.teachers
                    .first()
                    .map(|teacher| page.cell(teacher.id, Weekday::Mon, 0).to_string())
            })
            .unwrap_or_default()
    }

    fn schedule_grid(app: &App) -> Option<GridId> {
        app.current_grid()
            .filter(|id| matches!(id, GridId::Schedule { .. }))
    }

    #[test]
    fn typed_text_commits_on_enter_and_undoes() -> Result<()> {
        let mut app = app();
        // The first key only focuses the grid; the name row is skipped.
        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.focused_position(), Some(CellPosition::new(1, 0)));

        app.handle_event(key(KeyCode::Char('e')));
        assert!(app.editor.is_some());
        type_text(&mut app, "국어 u");
        assert_eq!(first_cell(&app), "", "nothing lands before the commit");

        app.handle_event(key(KeyCode::Enter));
        assert!(app.editor.is_none());
        assert_eq!(first_cell(&app), "국어 u");
        assert!(app.session.is_dirty());

        app.handle_event(key(KeyCode::Char('u')));
        assert_eq!(first_cell(&app), "");
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('r'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(first_cell(&app), "국어 u");
        Ok(())
    }

    #[test]
    fn merged_group_is_stepped_over() -> Result<()> {
        let mut app = app();
        app.handle_event(key(KeyCode::Down));
        app.handle_event(shift(KeyCode::Down));
        app.handle_event(shift(KeyCode::Down));
        app.handle_event(key(KeyCode::Char('m')));
        assert_eq!(app.status, "Merged 3 rows");
        assert!(app.modal.is_none());

        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.focused_position(), Some(CellPosition::new(4, 0)));

        // A lone cell cannot be merged.
        app.handle_event(key(KeyCode::Char('m')));
        assert!(matches!(app.modal, Some(Modal::Alert { .. })));
        Ok(())
    }

    #[test]
    fn pages_are_created_and_the_last_one_is_kept() -> Result<()> {
        let mut app = app();
        app.handle_event(key(KeyCode::Char('N')));
        let Some(Modal::Prompt(prompt)) = &app.modal else {
            bail!("expected a name prompt");
        };
        assert_eq!(prompt.input.text(), "시간표2");
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.session.document().schedule.pages.len(), 2);

        app.handle_event(key(KeyCode::Char('X')));
        assert!(matches!(
            app.modal,
            Some(Modal::Confirm {
                action: ConfirmAction::DeletePage { .. },
                ..
            })
        ));
        app.handle_event(key(KeyCode::Char('y')));
        assert_eq!(app.session.document().schedule.pages.len(), 1);

        app.handle_event(key(KeyCode::Char('X')));
        assert!(matches!(app.modal, Some(Modal::Alert { .. })));
        app.handle_event(key(KeyCode::Esc));
        assert!(app.modal.is_none());
        assert_eq!(app.session.document().schedule.pages.len(), 1);
        Ok(())
    }

    #[test]
    fn quitting_with_changes_asks_first() {
        let mut clean = app();
        clean.handle_event(key(KeyCode::Char('q')));
        assert!(clean.should_quit);

        let mut app = app();
        app.handle_event(key(KeyCode::Char('4')));
        app.handle_event(key(KeyCode::Char('t')));
        type_text(&mut app, "Lee");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.session.is_dirty());

        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        app.handle_event(key(KeyCode::Char('n')));
        assert!(app.modal.is_none());
        assert!(!app.should_quit);

        app.handle_event(key(KeyCode::Char('q')));
        app.handle_event(key(KeyCode::Char('y')));
        assert!(app.should_quit);
    }

    #[test]
    fn roster_commands_follow_the_class_cursor() {
        let mut app = app();
        app.handle_event(key(KeyCode::Char('2')));
        assert_eq!(app.section, Section::Roster(SchoolLevel::Middle));
        app.handle_event(key(KeyCode::Char('o')));
        assert!(app.modal.is_none(), "no class yet");

        app.handle_event(key(KeyCode::Char('A')));
        app.handle_event(key(KeyCode::Char('A')));
        let classes = app.filtered_classes(SchoolLevel::Middle);
        assert_eq!(classes.len(), 2);
        assert_eq!(app.current_class(SchoolLevel::Middle), classes.last().copied());

        app.handle_event(key(KeyCode::Char('o')));
        app.handle_event(key(KeyCode::Char('o')));
        let class_id = classes[1];
        assert_eq!(
            app.session
                .document()
                .roster(SchoolLevel::Middle)
                .students(class_id)
                .len(),
            2
        );
        app.handle_event(key(KeyCode::Down));
        assert_eq!(app.focused_position(), Some(CellPosition::new(1, 0)));

        app.handle_event(key(KeyCode::Char('l')));
        app.handle_event(key(KeyCode::Char('f')));
        assert_eq!(app.level_filter.get(&SchoolLevel::Middle), Some(&1));
        assert_eq!(app.filtered_classes(SchoolLevel::Middle), vec![classes[0]]);
    }

    #[test]
    fn dragging_selects_a_column_range() -> Result<()> {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(80, 30))?;
        terminal.draw(|frame| app.draw(frame))?;

        let Some(id) = schedule_grid(&app) else {
            bail!("no schedule grid");
        };
        let centre = |row: usize| {
            app.hits
                .iter()
                .find(|hit| hit.grid == id && hit.position == CellPosition::new(row, 0))
                .map(|hit| (hit.area.x + 1, hit.area.y))
        };
        let (Some(top), Some(bottom)) = (centre(1), centre(3)) else {
            bail!("rows 1 and 3 were not painted");
        };

        let mouse = |kind: MouseEventKind, (column, row): (u16, u16)| {
            Event::Mouse(MouseEvent {
                kind,
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), top));
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), bottom));
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), (0, 0)));

        let selection = app.navigators.get(&id).and_then(GridNavigator::selection);
        assert_eq!(selection.map(|range| range.bounds()), Some((1, 0, 3, 0)));
        assert_eq!(app.status, "Selected 3 x 1");
        assert!(app.navigators.get(&id).is_some_and(|nav| !nav.is_selecting()));
        Ok(())
    }

    #[tokio::test]
    async fn save_round_trips_through_the_store_channel() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("academy.json");
        let mut app = app_with_store(DocumentStore::File(FileStore::new(&path)));

        app.handle_event(key(KeyCode::Char('6')));
        app.handle_event(key(KeyCode::Char('A')));
        assert!(app.session.is_dirty());

        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('s'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.session.is_saving());

        let event = app
            .store_rx
            .as_mut()
            .context("receiver taken")?
            .recv()
            .await
            .context("store channel closed")?;
        app.handle_store_event(event);
        assert!(!app.session.is_saving());
        assert!(!app.session.is_dirty());
        assert!(app.status.starts_with("Saved at"), "{}", app.status);

        let loaded = FileStore::new(&path).load().await?;
        assert_eq!(loaded.inout.tables.len(), 1);
        Ok(())
    }
}
