use std::{
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use routeplan_core::{
    CatalogError, CatalogSource, Category, Command, Effect, FileStore, Notice, NoticeBoard,
    NoticeLevel, Outcome, Place, PlaceId, Planner, SearchQuery,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};

use crate::drag::{DragSource, DragState};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_CITY_LEN: usize = 48;
const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 14;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
    info: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            info: Color::Blue,
        }
    }
}

impl Theme {
    fn notice_color(&self, level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Success => self.success,
            NoticeLevel::Info => self.info,
            NoticeLevel::Warning => self.warning,
            NoticeLevel::Error => self.danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    EditCity,
    ConfirmClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Search,
    Catalog,
    Route,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Search => Focus::Catalog,
            Focus::Catalog => Focus::Route,
            Focus::Route => Focus::Search,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Search => Focus::Route,
            Focus::Catalog => Focus::Search,
            Focus::Route => Focus::Catalog,
        }
    }
}

/// Single-line text field for the city.
#[derive(Debug, Clone, Default)]
struct CityInput {
    input: String,
    cursor: usize,
}

impl CityInput {
    fn new(value: &str) -> Self {
        let input: String = value.chars().take(MAX_CITY_LEN).collect();
        let cursor = input.chars().count();
        Self { input, cursor }
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = (self.cursor as isize + delta).clamp(0, self.len() as isize);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.len();
    }

    fn insert(&mut self, ch: char) {
        if self.len() >= MAX_CITY_LEN || ch.is_control() {
            return;
        }
        let idx = self.byte_index();
        self.input.insert(idx, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index();
        self.input.remove(idx);
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index();
            self.input.remove(idx);
        }
    }

    fn value(&self) -> &str {
        &self.input
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    CatalogLoaded {
        query: SearchQuery,
        result: Result<Vec<Place>, CatalogError>,
    },
}

struct UiState {
    mode: Mode,
    focus: Focus,
    city: CityInput,
    category: Category,
    catalog_list: ListState,
    route_list: ListState,
    catalog_area: Rect,
    route_area: Rect,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            mode: Mode::Browse,
            focus: Focus::Catalog,
            city: CityInput::default(),
            category: Category::default(),
            catalog_list: ListState::default(),
            route_list: ListState::default(),
            catalog_area: Rect::default(),
            route_area: Rect::default(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn query(&self) -> SearchQuery {
        SearchQuery::new(self.city.value().trim(), self.category)
    }

    fn move_list(list: &mut ListState, len: usize, delta: isize) {
        if len == 0 {
            list.select(None);
            return;
        }
        let current = list.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        list.select(Some(next as usize));
    }

    fn clamp_list(list: &mut ListState, len: usize) {
        match list.selected() {
            _ if len == 0 => list.select(None),
            Some(idx) if idx >= len => list.select(Some(len - 1)),
            None => list.select(Some(0)),
            _ => {}
        }
    }
}

/// Terminal frontend for the planner.
pub struct PlannerApp {
    planner: Planner<FileStore>,
    source: CatalogSource,
    notices: NoticeBoard,
    state: UiState,
    drag: Option<DragState>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl PlannerApp {
    pub fn new(planner: Planner<FileStore>, source: CatalogSource, notice_ttl: Duration) -> Self {
        Self {
            planner,
            source,
            notices: NoticeBoard::new(notice_ttl),
            state: UiState::default(),
            drag: None,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        terminal::size().context("terminal is not available")?;

        if let Some(notice) = self.planner.restore() {
            self.notices.post(notice);
        }
        let query = self.planner.query().clone();
        self.state.city = CityInput::new(&query.city);
        self.state.category = query.category;
        UiState::clamp_list(&mut self.state.route_list, self.planner.route().len());

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        self.submit_search();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                    self.notices.post(Notice::error(format!("Error: {err}")));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.notices.expire(Instant::now());
                true
            }
            Some(AppEvent::CatalogLoaded { query, result }) => {
                self.dispatch(Command::CatalogLoaded { query, result });
                self.state.catalog_list = ListState::default();
                UiState::clamp_list(&mut self.state.catalog_list, self.planner.catalog().len());
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, command: Command) {
        let outcome = self.planner.dispatch(command);
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: Outcome) {
        if let Some(notice) = outcome.notice {
            self.notices.post(notice);
        }
        if let Some(Effect::Fetch(query)) = outcome.effect {
            self.start_fetch(query);
        }
        UiState::clamp_list(&mut self.state.route_list, self.planner.route().len());
    }

    fn submit_search(&mut self) {
        let query = self.state.query();
        self.dispatch(Command::SubmitSearch(query));
    }

    fn start_fetch(&mut self, query: SearchQuery) {
        let query = self.source.resolve(&query);
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            let city = query.city.clone();
            self.dispatch(Command::CatalogLoaded {
                query,
                result: Err(CatalogError::FetchFailed { city }),
            });
            return;
        };
        info!(city = %query.city, category = %query.category, "Loading places");
        let source = self.source.clone();
        spawn(async move {
            let result = source.fetch(&query).await;
            let _ = sender.send(AppEvent::CatalogLoaded { query, result }).await;
        });
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => match self.state.mode {
                Mode::EditCity => self.handle_city_key(key),
                Mode::ConfirmClear => self.handle_confirm_key(key),
                Mode::Browse if self.drag.is_some() => self.handle_drag_key(key),
                Mode::Browse => self.handle_browse_key(key),
            },
            Event::Mouse(mouse) if self.state.mode == Mode::Browse => self.handle_mouse(mouse),
            Event::Mouse(_) => Ok(()),
            Event::Resize(_, _) => Ok(()),
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => Ok(()),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.should_quit = true
            }
            KeyCode::Tab => self.state.focus = self.state.focus.next(),
            KeyCode::BackTab => self.state.focus = self.state.focus.previous(),
            KeyCode::Char('/') | KeyCode::Char('c') => {
                self.state.focus = Focus::Search;
                self.state.mode = Mode::EditCity;
                self.state.city.move_end();
            }
            KeyCode::Char(']') => self.state.category = self.state.category.next(),
            KeyCode::Char('[') => self.state.category = self.state.category.previous(),
            KeyCode::Char('s') => self.submit_search(),
            KeyCode::Char('w') => self.dispatch(Command::Save),
            KeyCode::Char('x') => {
                if self.planner.route().is_empty() {
                    self.notices.post(Notice::info("Route is already empty"));
                } else {
                    self.state.mode = Mode::ConfirmClear;
                }
            }
            KeyCode::Esc => self.notices.dismiss(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Enter => match self.state.focus {
                Focus::Search => self.submit_search(),
                Focus::Catalog => {
                    if let Some(id) = self.catalog_cursor_id() {
                        self.dispatch(Command::Select(id));
                    }
                }
                Focus::Route => {}
            },
            KeyCode::Char('a') => {
                let target = match self.state.focus {
                    Focus::Catalog => self.catalog_cursor_id(),
                    _ => self.planner.selected().map(|place| place.id),
                };
                if let Some(id) = target {
                    self.dispatch(Command::Add(id));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete if self.state.focus == Focus::Route => {
                if let Some(id) = self.route_cursor_id() {
                    self.dispatch(Command::Remove(id));
                }
            }
            KeyCode::Char('J') if self.state.focus == Focus::Route => self.shift_route_entry(1),
            KeyCode::Char('K') if self.state.focus == Focus::Route => self.shift_route_entry(-1),
            KeyCode::Char(' ') if self.state.focus == Focus::Route => {
                if let Some(id) = self.route_cursor_id() {
                    self.drag = DragState::start(self.planner.route().ids(), id, DragSource::Keyboard);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_city_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.state.mode = Mode::Browse,
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.submit_search();
            }
            KeyCode::Left => self.state.city.move_cursor(-1),
            KeyCode::Right => self.state.city.move_cursor(1),
            KeyCode::Home => self.state.city.move_home(),
            KeyCode::End => self.state.city.move_end(),
            KeyCode::Backspace => self.state.city.backspace(),
            KeyCode::Delete => self.state.city.delete(),
            KeyCode::Tab => self.state.category = self.state.category.next(),
            KeyCode::BackTab => self.state.category = self.state.category.previous(),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.state.city.insert(ch)
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.state.mode = Mode::Browse;
                self.dispatch(Command::Clear);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.mode = Mode::Browse;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_drag_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.step_drag(1),
            KeyCode::Char('k') | KeyCode::Up => self.step_drag(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.finish_drag(),
            KeyCode::Esc => {
                self.drag = None;
                debug!("Drag cancelled");
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(row) = self.route_row_at(mouse.column, mouse.row) {
                    self.state.focus = Focus::Route;
                    self.state.route_list.select(Some(row));
                    if let Some(id) = self.route_cursor_id() {
                        self.drag =
                            DragState::start(self.planner.route().ids(), id, DragSource::Mouse);
                    }
                } else if let Some(row) = self.catalog_row_at(mouse.column, mouse.row) {
                    self.state.focus = Focus::Catalog;
                    self.state.catalog_list.select(Some(row));
                    if let Some(id) = self.catalog_cursor_id() {
                        self.dispatch(Command::Select(id));
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let area = self.state.route_area;
                let offset = self.state.route_list.offset();
                if let Some(drag) = self
                    .drag
                    .as_mut()
                    .filter(|drag| drag.source() == DragSource::Mouse)
                {
                    let pointer = f32::from(mouse.row) + offset as f32;
                    drag.hover(pointer, f32::from(area.y), 1.0);
                    let index = drag.index();
                    self.state.route_list.select(Some(index));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self
                    .drag
                    .as_ref()
                    .is_some_and(|drag| drag.source() == DragSource::Mouse)
                {
                    self.finish_drag();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn step_drag(&mut self, delta: isize) {
        if let Some(drag) = self.drag.as_mut() {
            drag.step(delta);
            let index = drag.index();
            self.state.route_list.select(Some(index));
        }
    }

    fn finish_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let dragged = drag.dragged();
        let order = drag.finish();
        self.dispatch(Command::Reorder(order));
        let index = self.planner.route().index_of(dragged);
        self.state.route_list.select(index);
    }

    fn shift_route_entry(&mut self, delta: isize) {
        let Some(from) = self.state.route_list.selected() else {
            return;
        };
        let Some(to) = from.checked_add_signed(delta) else {
            return;
        };
        if to >= self.planner.route().len() {
            return;
        }
        self.dispatch(Command::Move { from, to });
        self.state.route_list.select(Some(to));
    }

    fn move_cursor(&mut self, delta: isize) {
        match self.state.focus {
            Focus::Search => {}
            Focus::Catalog => UiState::move_list(
                &mut self.state.catalog_list,
                self.planner.catalog().len(),
                delta,
            ),
            Focus::Route => UiState::move_list(
                &mut self.state.route_list,
                self.planner.route().len(),
                delta,
            ),
        }
    }

    fn catalog_cursor_id(&self) -> Option<PlaceId> {
        let idx = self.state.catalog_list.selected()?;
        self.planner.catalog().get(idx).map(|place| place.id)
    }

    fn route_cursor_id(&self) -> Option<PlaceId> {
        let idx = self.state.route_list.selected()?;
        self.planner
            .route()
            .entries()
            .get(idx)
            .map(|entry| entry.place.id)
    }

    fn catalog_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let idx = hit_row(self.state.catalog_area, column, row)? + self.state.catalog_list.offset();
        (idx < self.planner.catalog().len()).then_some(idx)
    }

    fn route_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let idx = hit_row(self.state.route_area, column, row)? + self.state.route_list.offset();
        (idx < self.planner.route().len()).then_some(idx)
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            let message = Paragraph::new(format!(
                "Terminal too small ({}x{}); need at least {MIN_WIDTH}x{MIN_HEIGHT}",
                area.width, area.height
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(30),
                Constraint::Percentage(35),
            ])
            .split(rows[1]);

        self.render_search(frame, rows[0]);
        self.render_catalog(frame, body[0]);
        self.render_details(frame, body[1]);
        self.render_route(frame, body[2]);
        self.render_status(frame, rows[2]);

        if self.state.mode == Mode::ConfirmClear {
            self.render_confirm(frame, area);
        }
    }

    fn pane_block(&self, title: &str, focus: Focus) -> Block<'static> {
        let style = if self.state.focus == focus {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title.to_string())
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let editing = self.state.mode == Mode::EditCity;
        let city_style = if editing {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        let city_text = if self.state.city.value().is_empty() && !editing {
            format!("({})", self.source.default_city())
        } else {
            self.state.city.value().to_string()
        };

        let mut spans = vec![
            Span::styled("City: ", Style::default().fg(self.theme.muted)),
            Span::styled(city_text, city_style),
            Span::raw("   "),
            Span::styled("Category: ", Style::default().fg(self.theme.muted)),
            Span::styled(
                format!("‹ {} ›", self.state.category.label()),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
        ];
        if self.planner.is_loading() {
            spans.push(Span::styled(
                "Loading…",
                Style::default().fg(self.theme.warning),
            ));
        } else {
            spans.push(Span::styled(
                "[s] Search",
                Style::default().fg(self.theme.success),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans)).block(self.pane_block("Search", Focus::Search));
        frame.render_widget(paragraph, area);

        if editing {
            let prefix = "City: ".chars().count() + self.state.city.cursor;
            let x = area.x + 1 + prefix as u16;
            if x < area.x + area.width.saturating_sub(1) {
                frame.set_cursor(x, area.y + 1);
            }
        }
    }

    fn render_catalog(&mut self, frame: &mut Frame, area: Rect) {
        let block = self.pane_block(
            &format!("Places ({})", self.planner.catalog().len()),
            Focus::Catalog,
        );
        self.state.catalog_area = block.inner(area);

        if self.planner.catalog().is_empty() {
            let text = if self.planner.is_loading() {
                "Loading places…"
            } else {
                "Nothing found. Try another search"
            };
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(self.theme.muted))
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let selected = self.planner.selected().map(|place| place.id);
        let items: Vec<ListItem> = self
            .planner
            .catalog()
            .iter()
            .map(|place| {
                let marker = if self.planner.route().is_present(place.id) {
                    Span::styled("✓ ", Style::default().fg(self.theme.success))
                } else {
                    Span::raw("  ")
                };
                let name_style = if Some(place.id) == selected {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(place.name.clone(), name_style),
                    Span::styled(
                        format!("  ★{:.1} {}h", place.rating, place.hours),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut self.state.catalog_list);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(place) = self.planner.selected() else {
            let paragraph = Paragraph::new("Select a place to see details")
                .style(Style::default().fg(self.theme.muted))
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        };

        let label = Style::default().fg(self.theme.muted);
        let mut lines = vec![
            Line::from(Span::styled(
                place.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(place.description.clone(), label)),
            Line::from(""),
            Line::from(vec![
                Span::styled("Category: ", label),
                Span::raw(place.category.label()),
            ]),
            Line::from(vec![
                Span::styled("Address:  ", label),
                Span::raw(place.address.clone()),
            ]),
            Line::from(vec![
                Span::styled("Rating:   ", label),
                Span::raw(format!("{:.1}/5", place.rating)),
            ]),
            Line::from(vec![
                Span::styled("Visit:    ", label),
                Span::raw(format!("{} h", place.hours)),
            ]),
            Line::from(""),
        ];
        if self.planner.route().is_present(place.id) {
            lines.push(Line::from(Span::styled(
                "✓ Already in route",
                Style::default().fg(self.theme.success),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "[a] Add to route",
                Style::default().fg(self.theme.accent),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_route(&mut self, frame: &mut Frame, area: Rect) {
        let stats = self.planner.route().stats();
        let block = self.pane_block(&format!("Route ({})", stats.count), Focus::Route);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        self.state.route_area = parts[0];

        let stats_line = Line::from(vec![
            Span::raw("Places: "),
            Span::styled(
                stats.count.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" • Time: "),
            Span::styled(
                format!("{}h", stats.total_hours),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        frame.render_widget(Paragraph::new(stats_line), parts[1]);

        if self.planner.route().is_empty() {
            let paragraph = Paragraph::new("Add places from the list")
                .style(Style::default().fg(self.theme.muted))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, parts[0]);
            return;
        }

        let route = self.planner.route();
        let order: Vec<PlaceId> = match &self.drag {
            Some(drag) => drag.order().to_vec(),
            None => route.ids(),
        };
        let dragged = self.drag.as_ref().map(DragState::dragged);
        let items: Vec<ListItem> = order
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| route.get(*id).map(|entry| (idx, entry)))
            .map(|(idx, entry)| {
                let style = if Some(entry.place.id) == dragged {
                    Style::default()
                        .fg(self.theme.warning)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:>2}. ", idx + 1),
                        Style::default().fg(self.theme.accent),
                    ),
                    Span::styled(entry.place.name.clone(), style),
                    Span::styled(
                        format!("  {}h • ★{:.1}", entry.place.hours, entry.place.rating),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items).highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, parts[0], &mut self.state.route_list);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let line = match self.notices.current() {
            Some(notice) => Line::from(Span::styled(
                notice.text.clone(),
                Style::default().fg(self.theme.notice_color(notice.level)),
            )),
            None => Line::from(Span::styled(self.hint(), Style::default().fg(self.theme.muted))),
        };
        let paragraph = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn hint(&self) -> &'static str {
        match (self.state.mode, self.drag.is_some()) {
            (Mode::EditCity, _) => "Type a city • Tab category • Enter search • Esc done",
            (Mode::ConfirmClear, _) => "y confirm • n cancel",
            (Mode::Browse, true) => "j/k move • Space/Enter drop • Esc cancel",
            (Mode::Browse, false) => match self.state.focus {
                Focus::Search => "/ edit city • [ ] category • Enter search • Tab next pane • q quit",
                Focus::Catalog => "j/k move • Enter details • a add • w save • x clear • Tab next pane • q quit",
                Focus::Route => "j/k move • J/K shift • Space grab • d remove • w save • x clear • Tab next pane • q quit",
            },
        }
    }

    fn render_confirm(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(36, 5, area);
        frame.render_widget(Clear, modal);
        let paragraph = Paragraph::new(vec![
            Line::from("Clear the whole route?"),
            Line::from(Span::styled(
                "y / n",
                Style::default().fg(self.theme.warning),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.warning))
                .title("Confirm"),
        );
        frame.render_widget(paragraph, modal);
    }
}

fn hit_row(area: Rect, column: u16, row: u16) -> Option<usize> {
    let inside = column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height);
    inside.then(|| usize::from(row - area.y))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
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

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_input_edits_multibyte_text() {
        let mut input = CityInput::new("Mosc");
        input.insert('ó');
        input.insert('w');
        assert_eq!(input.value(), "Mosców");
        input.move_cursor(-2);
        input.backspace();
        assert_eq!(input.value(), "Mosów");
        input.move_home();
        input.delete();
        assert_eq!(input.value(), "osów");
        input.move_end();
        input.insert('\n');
        assert_eq!(input.value(), "osów");
    }

    #[test]
    fn city_input_respects_length_limit() {
        let mut input = CityInput::new(&"x".repeat(MAX_CITY_LEN + 5));
        assert_eq!(input.len(), MAX_CITY_LEN);
        input.insert('y');
        assert_eq!(input.len(), MAX_CITY_LEN);
    }

    #[test]
    fn hit_row_maps_inside_only() {
        let area = Rect::new(10, 5, 20, 4);
        assert_eq!(hit_row(area, 10, 5), Some(0));
        assert_eq!(hit_row(area, 29, 8), Some(3));
        assert_eq!(hit_row(area, 30, 6), None);
        assert_eq!(hit_row(area, 12, 9), None);
        assert_eq!(hit_row(area, 9, 6), None);
    }

    #[test]
    fn list_cursor_clamps() {
        let mut list = ListState::default();
        UiState::move_list(&mut list, 3, 5);
        assert_eq!(list.selected(), Some(2));
        UiState::move_list(&mut list, 3, -9);
        assert_eq!(list.selected(), Some(0));
        UiState::clamp_list(&mut list, 0);
        assert_eq!(list.selected(), None);
        UiState::clamp_list(&mut list, 2);
        assert_eq!(list.selected(), Some(0));
    }

    #[test]
    fn focus_cycles() {
        for focus in [Focus::Search, Focus::Catalog, Focus::Route] {
            assert_eq!(focus.next().previous(), focus);
        }
    }
}
