use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fleetyard_core::{
    Container, ErrorKind, FleetError, HazardLog, Location, ProductCatalog, Registry,
    SerialNumber, Ship, ShipId,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::form::{FormKind, FormModal, Request};

const MAX_FEED_LEN: usize = 50;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
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
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Ships,
    Cargo,
    Free,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Self::Ships => Self::Cargo,
            Self::Cargo => Self::Free,
            Self::Free => Self::Ships,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Ships => Self::Free,
            Self::Cargo => Self::Ships,
            Self::Free => Self::Cargo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusTone {
    Info,
    Success,
    Failure(ErrorKind),
    InputError,
}

struct FeedEntry {
    at: DateTime<Local>,
    message: String,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal frontend driving a [`Registry`].
pub struct FleetApp {
    registry: Registry,
    hazards: HazardLog,
    catalog: ProductCatalog,
    tick_rate: Duration,
    theme: Theme,
    focus: Pane,
    ship_cursor: usize,
    cargo_cursor: usize,
    free_cursor: usize,
    marked: Vec<SerialNumber>,
    form: Option<FormModal>,
    status: String,
    tone: StatusTone,
    feed: Vec<FeedEntry>,
    should_quit: bool,
}

impl FleetApp {
    pub fn new(
        registry: Registry,
        hazards: HazardLog,
        catalog: ProductCatalog,
        tick_rate: Duration,
    ) -> Self {
        Self {
            registry,
            hazards,
            catalog,
            tick_rate,
            theme: Theme::default(),
            focus: Pane::Ships,
            ship_cursor: 0,
            cargo_cursor: 0,
            free_cursor: 0,
            marked: Vec::new(),
            form: None,
            status: "Press s to add a ship, l/g/c to create containers".to_string(),
            tone: StatusTone::Info,
            feed: Vec::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx, self.tick_rate);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        info!(
            ships = self.registry.ships().len(),
            containers = self.registry.container_count(),
            "Session finished"
        );
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if self.form.is_some() {
                    self.handle_form_key(key);
                } else {
                    self.handle_key(key);
                }
                self.collect_hazards();
                true
            }
            Some(AppEvent::Input(_)) => true,
            Some(AppEvent::Tick) => {
                self.collect_hazards();
                true
            }
            None => false,
        }
    }

    fn collect_hazards(&mut self) {
        for event in self.hazards.drain() {
            self.feed.push(FeedEntry {
                at: event.raised_at.with_timezone(&Local),
                message: event.message,
            });
        }
        if self.feed.len() > MAX_FEED_LEN {
            let excess = self.feed.len() - MAX_FEED_LEN;
            self.feed.drain(..excess);
        }
    }

    fn set_status(&mut self, message: impl Into<String>, tone: StatusTone) {
        self.status = message.into();
        self.tone = tone;
    }

    fn report(&mut self, outcome: fleetyard_core::Result<String>) {
        match outcome {
            Ok(message) => self.set_status(message, StatusTone::Success),
            Err(err) => {
                debug!(%err, "Operation failed");
                let kind = err.kind();
                self.set_status(err.to_string(), StatusTone::Failure(kind));
            }
        }
        self.clamp_cursors();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('s') => self.open_form(FormKind::NewShip),
            KeyCode::Char('l') => self.open_form(FormKind::NewLiquid),
            KeyCode::Char('g') => self.open_form(FormKind::NewGas),
            KeyCode::Char('c') => self.open_form(FormKind::NewRefrigerated),
            KeyCode::Char('/') => self.open_form(FormKind::Find),
            KeyCode::Char('w') => match self.focused_container() {
                Some(serial) => self.open_form(FormKind::Load { serial }),
                None => self.set_status("Select a container to load", StatusTone::Info),
            },
            KeyCode::Char('e') => self.empty_focused(),
            KeyCode::Char(' ') => self.toggle_mark(),
            KeyCode::Char('p') => self.place_on_focused_ship(),
            KeyCode::Char('r') => self.remove_focused_cargo(),
            KeyCode::Char('x') => self.replace_focused_cargo(),
            KeyCode::Char('t') => match (self.focused_ship(), self.focused_cargo()) {
                (Some(source), Some(serial)) => {
                    self.open_form(FormKind::Transfer { source, serial })
                }
                _ => self.set_status("Select a container aboard a ship", StatusTone::Info),
            },
            KeyCode::Char('d') => self.remove_focused_ship(),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut submit = false;
        let mut cancel = false;
        if let Some(form) = self.form.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Enter if form.is_last_field() => submit = true,
                KeyCode::Enter | KeyCode::Tab | KeyCode::Down => form.move_focus(1),
                KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
                KeyCode::Left => form.move_cursor(-1),
                KeyCode::Right => form.move_cursor(1),
                KeyCode::Home => form.move_home(),
                KeyCode::End => form.move_end(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Delete => form.delete(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        form.insert(ch);
                    }
                }
                _ => {}
            }
        }

        if cancel {
            self.form = None;
            self.set_status("Cancelled", StatusTone::Info);
            return;
        }
        if submit {
            self.submit_form();
        }
    }

    fn open_form(&mut self, kind: FormKind) {
        self.form = Some(FormModal::new(kind));
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let request = match form.request(&self.catalog) {
            Ok(request) => request,
            Err(err) => {
                self.set_status(format!("{err:#}"), StatusTone::InputError);
                return;
            }
        };
        self.form = None;
        self.execute(request);
    }

    fn execute(&mut self, request: Request) {
        match request {
            Request::AddShip(config) => {
                let id = self.registry.add_ship(config);
                self.ship_cursor = self.registry.ships().len().saturating_sub(1);
                self.set_status(format!("Ship {id} added"), StatusTone::Success);
            }
            Request::CreateContainer(spec) => {
                let outcome = self.registry.create_container(spec).map(|serial| {
                    self.free_cursor = self.registry.free_containers().len().saturating_sub(1);
                    format!("Container {serial} created")
                });
                self.report(outcome);
            }
            Request::Load { serial, mass_kg } => {
                let outcome = self
                    .registry
                    .load_into(serial, mass_kg)
                    .map(|_| format!("Loaded {mass_kg}kg into {serial}"));
                self.report(outcome);
            }
            Request::Transfer {
                source,
                serial,
                destination,
            } => {
                let outcome = self
                    .registry
                    .transfer_between_ships(source, serial, destination)
                    .map(|_| format!("Moved {serial} from {source} to {destination}"));
                self.report(outcome);
            }
            Request::Find(serial) => self.reveal(serial),
        }
    }

    fn reveal(&mut self, serial: SerialNumber) {
        match self.registry.locate(serial) {
            Some(Location::Free) => {
                if let Some(index) = position_of(self.registry.free_containers(), serial) {
                    self.free_cursor = index;
                }
                self.focus = Pane::Free;
                self.set_status(format!("{serial} is in the free pool"), StatusTone::Success);
            }
            Some(Location::Ship(id)) => {
                if let Some(ship_index) = self.registry.ships().iter().position(|s| s.id() == id) {
                    self.ship_cursor = ship_index;
                    if let Some(index) =
                        position_of(self.registry.ships()[ship_index].containers(), serial)
                    {
                        self.cargo_cursor = index;
                    }
                }
                self.focus = Pane::Cargo;
                self.set_status(format!("{serial} is aboard ship {id}"), StatusTone::Success);
            }
            None => self.report(Err(FleetError::ContainerNotFound(serial))),
        }
    }

    fn empty_focused(&mut self) {
        let Some(serial) = self.focused_container() else {
            self.set_status("Select a container to empty", StatusTone::Info);
            return;
        };
        let outcome = self
            .registry
            .unload(serial)
            .map(|_| format!("Emptied {serial}"));
        self.report(outcome);
    }

    fn toggle_mark(&mut self) {
        let Some(serial) = self.focused_free() else {
            return;
        };
        match self.marked.iter().position(|s| *s == serial) {
            Some(index) => {
                self.marked.remove(index);
            }
            None => self.marked.push(serial),
        }
        self.move_cursor(1);
    }

    fn place_on_focused_ship(&mut self) {
        let Some(ship) = self.focused_ship() else {
            self.set_status("Add or select a ship first", StatusTone::Info);
            return;
        };
        let batch = if self.marked.is_empty() {
            match self.focused_free() {
                Some(serial) => vec![serial],
                None => {
                    self.set_status("Select or mark free containers", StatusTone::Info);
                    return;
                }
            }
        } else {
            std::mem::take(&mut self.marked)
        };

        let results = self.registry.place_many_on_ship(&batch, ship);
        let placed = results.iter().filter(|(_, result)| result.is_ok()).count();
        let failures: Vec<(SerialNumber, FleetError)> = results
            .into_iter()
            .filter_map(|(serial, result)| result.err().map(|err| (serial, err)))
            .collect();
        match failures.first() {
            None => self.set_status(
                format!("Placed {placed} container(s) on ship {ship}"),
                StatusTone::Success,
            ),
            Some((_, first)) => {
                let kind = first.kind();
                let detail = failures
                    .iter()
                    .map(|(serial, err)| format!("{serial}: {err}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                self.set_status(
                    format!("Placed {placed}, failed {}: {detail}", failures.len()),
                    StatusTone::Failure(kind),
                );
            }
        }
        self.clamp_cursors();
    }

    fn remove_focused_cargo(&mut self) {
        let (Some(ship), Some(serial)) = (self.focused_ship(), self.focused_cargo()) else {
            self.set_status("Select a container aboard a ship", StatusTone::Info);
            return;
        };
        let outcome = self
            .registry
            .remove_from_ship(ship, serial)
            .map(|_| format!("{serial} returned to the free pool"));
        self.report(outcome);
    }

    fn replace_focused_cargo(&mut self) {
        let (Some(ship), Some(old), Some(new)) =
            (self.focused_ship(), self.focused_cargo(), self.focused_free())
        else {
            self.set_status(
                "Select a container aboard and one in the free pool",
                StatusTone::Info,
            );
            return;
        };
        let outcome = self
            .registry
            .replace_on_ship(ship, old, new)
            .map(|outgoing| format!("{new} replaced {} on ship {ship}", outgoing.serial()));
        self.marked.retain(|s| *s != new);
        self.report(outcome);
    }

    fn remove_focused_ship(&mut self) {
        let Some(ship) = self.focused_ship() else {
            self.set_status("No ship selected", StatusTone::Info);
            return;
        };
        let outcome = self
            .registry
            .remove_ship(ship)
            .map(|_| format!("Ship {ship} removed, its containers are free"));
        self.report(outcome);
    }

    fn focused_ship(&self) -> Option<ShipId> {
        self.registry.ships().get(self.ship_cursor).map(Ship::id)
    }

    fn focused_ship_ref(&self) -> Option<&Ship> {
        self.registry.ships().get(self.ship_cursor)
    }

    fn focused_cargo(&self) -> Option<SerialNumber> {
        self.focused_ship_ref()
            .and_then(|ship| ship.containers().get(self.cargo_cursor))
            .map(Container::serial)
    }

    fn focused_free(&self) -> Option<SerialNumber> {
        self.registry
            .free_containers()
            .get(self.free_cursor)
            .map(Container::serial)
    }

    fn focused_container(&self) -> Option<SerialNumber> {
        match self.focus {
            Pane::Ships => None,
            Pane::Cargo => self.focused_cargo(),
            Pane::Free => self.focused_free(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.focus {
            Pane::Ships => (&mut self.ship_cursor, self.registry.ships().len()),
            Pane::Cargo => (
                &mut self.cargo_cursor,
                self.registry
                    .ships()
                    .get(self.ship_cursor)
                    .map(|ship| ship.containers().len())
                    .unwrap_or(0),
            ),
            Pane::Free => (
                &mut self.free_cursor,
                self.registry.free_containers().len(),
            ),
        };
        *cursor = step(*cursor, delta, len);
        if self.focus == Pane::Ships {
            self.cargo_cursor = 0;
        }
    }

    fn clamp_cursors(&mut self) {
        self.ship_cursor = clamp_index(self.ship_cursor, self.registry.ships().len());
        let cargo_len = self
            .focused_ship_ref()
            .map(|ship| ship.containers().len())
            .unwrap_or(0);
        self.cargo_cursor = clamp_index(self.cargo_cursor, cargo_len);
        self.free_cursor = clamp_index(self.free_cursor, self.registry.free_containers().len());
        let free = self.registry.free_containers();
        self.marked
            .retain(|serial| free.iter().any(|c| c.serial() == *serial));
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(8),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(22),
                Constraint::Percentage(26),
                Constraint::Percentage(26),
                Constraint::Percentage(26),
            ])
            .split(rows[1]);
        self.render_ships(frame, columns[0]);
        self.render_cargo(frame, columns[1]);
        self.render_free(frame, columns[2]);
        self.render_details(frame, columns[3]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);
        self.render_status(frame, bottom[0]);
        self.render_hazards(frame, bottom[1]);
        self.render_help(frame, rows[3]);

        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(
                "fleetyard",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {} ships · {} containers · {} free",
                    self.registry.ships().len(),
                    self.registry.container_count(),
                    self.registry.free_containers().len()
                ),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn pane_block(&self, title: String, pane: Pane) -> Block<'static> {
        let style = if self.focus == pane {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title)
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        block: Block<'static>,
        items: Vec<ListItem<'static>>,
        cursor: usize,
        active: bool,
    ) {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(cmp::min(cursor, items.len() - 1)));
        }
        let highlight = if active {
            Style::default()
                .bg(self.theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight)
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_ships(&self, frame: &mut Frame, area: Rect) {
        let items = self
            .registry
            .ships()
            .iter()
            .map(|ship| {
                let load = format!(
                    " {}/{}",
                    ship.containers().len(),
                    ship.max_containers()
                );
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} {}", ship.id(), ship.name()),
                        Style::default().fg(self.theme.primary_fg),
                    ),
                    Span::styled(load, Style::default().fg(self.theme.muted)),
                ]))
            })
            .collect();
        let block = self.pane_block("Ships".to_string(), Pane::Ships);
        self.render_list(
            frame,
            area,
            block,
            items,
            self.ship_cursor,
            self.focus == Pane::Ships,
        );
    }

    fn render_cargo(&self, frame: &mut Frame, area: Rect) {
        let (title, items) = match self.focused_ship_ref() {
            Some(ship) => (
                format!(
                    "Cargo {} · {}/{}kg",
                    ship.id(),
                    ship.total_weight_kg(),
                    ship.max_weight_kg()
                ),
                ship.containers()
                    .iter()
                    .map(|c| self.container_item(c, false))
                    .collect(),
            ),
            None => ("Cargo".to_string(), Vec::new()),
        };
        let block = self.pane_block(title, Pane::Cargo);
        self.render_list(
            frame,
            area,
            block,
            items,
            self.cargo_cursor,
            self.focus == Pane::Cargo,
        );
    }

    fn render_free(&self, frame: &mut Frame, area: Rect) {
        let items = self
            .registry
            .free_containers()
            .iter()
            .map(|c| self.container_item(c, self.marked.contains(&c.serial())))
            .collect();
        let title = if self.marked.is_empty() {
            "Free pool".to_string()
        } else {
            format!("Free pool · {} marked", self.marked.len())
        };
        let block = self.pane_block(title, Pane::Free);
        self.render_list(
            frame,
            area,
            block,
            items,
            self.free_cursor,
            self.focus == Pane::Free,
        );
    }

    fn container_item(&self, container: &Container, marked: bool) -> ListItem<'static> {
        let marker = if marked {
            Span::styled("* ", Style::default().fg(self.theme.warning))
        } else {
            Span::raw("  ")
        };
        ListItem::new(Line::from(vec![
            marker,
            Span::styled(
                container.summary(),
                Style::default().fg(self.theme.primary_fg),
            ),
        ]))
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let text = match self.focus {
            Pane::Ships => self.focused_ship_ref().map(ToString::to_string),
            Pane::Cargo | Pane::Free => self
                .focused_container()
                .and_then(|serial| self.registry.find_container(serial))
                .map(|found| found.container.to_string()),
        }
        .unwrap_or_else(|| "Nothing selected".to_string());
        let lines: Vec<Line> = text.lines().map(|l| Line::from(l.to_string())).collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let color = match self.tone {
            StatusTone::Info => self.theme.primary_fg,
            StatusTone::Success => self.theme.success,
            StatusTone::Failure(ErrorKind::Overfill) => self.theme.danger,
            StatusTone::Failure(ErrorKind::Capacity | ErrorKind::Weight) => self.theme.warning,
            StatusTone::Failure(ErrorKind::Validation) | StatusTone::InputError => {
                self.theme.warning
            }
            StatusTone::Failure(ErrorKind::NotFound) => self.theme.muted,
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            self.status.clone(),
            Style::default().fg(color),
        )))
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_hazards(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .feed
            .iter()
            .rev()
            .take(visible)
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        entry.at.format("%H:%M:%S ").to_string(),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(entry.message.clone(), Style::default().fg(self.theme.danger)),
                ])
            })
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Hazards"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = "s ship  l/g/c container  w load  e empty  ␣ mark  p place  r remove  x replace  t transfer  d drop ship  / find  Tab pane  q quit";
        frame.render_widget(
            Paragraph::new(Span::styled(help, Style::default().fg(self.theme.muted)))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_form(&self, frame: &mut Frame, form: &FormModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(64_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let height = (form.fields.len() as u16 * 2 + 4).min(frame_area.height.saturating_sub(2));
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let mut lines = Vec::new();
        for (index, field) in form.fields.iter().enumerate() {
            let focused = index == form.focus;
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            lines.push(Line::from(vec![
                Span::styled(field.label, label_style),
                Span::styled(
                    format!("  {}", field.hint),
                    Style::default().fg(self.theme.muted),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(field.input.clone()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next/submit  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title()));
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + form.cursor as u16).min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 2 + form.focus as u16 * 2;
        frame.set_cursor(cursor_x, cursor_y);
    }
}

fn position_of(containers: &[Container], serial: SerialNumber) -> Option<usize> {
    containers.iter().position(|c| c.serial() == serial)
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (cursor as isize + delta).clamp(0, len as isize - 1) as usize
}

fn clamp_index(cursor: usize, len: usize) -> usize {
    cmp::min(cursor, len.saturating_sub(1))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>, tick_rate: Duration) {
    thread::spawn(move || loop {
        match event::poll(tick_rate) {
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
    use fleetyard_core::{ContainerKind, ContainerSpec, ShipConfig};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> FleetApp {
        let hazards = HazardLog::new();
        let registry = Registry::new().with_notifier(hazards.clone());
        FleetApp::new(
            registry,
            hazards,
            ProductCatalog::default(),
            Duration::from_millis(250),
        )
    }

    fn type_text(app: &mut FleetApp, text: &str) {
        for ch in text.chars() {
            app.handle_form_key(key(KeyCode::Char(ch)));
        }
        app.handle_form_key(key(KeyCode::Enter));
    }

    fn spec(empty_mass_kg: u64) -> ContainerSpec {
        ContainerSpec {
            empty_mass_kg,
            height_cm: 200,
            depth_cm: 200,
            max_load_kg: 1000,
            kind: ContainerKind::Liquid { dangerous: true },
        }
    }

    #[test]
    fn ship_form_adds_a_ship() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('s')));
        for value in ["Aurora", "20", "2", "10"] {
            type_text(&mut app, value);
        }
        assert!(app.form.is_none());
        assert_eq!(app.registry.ships().len(), 1);
        assert_eq!(app.registry.ships()[0].name(), "Aurora");
        assert_eq!(app.tone, StatusTone::Success);
    }

    #[test]
    fn invalid_input_keeps_the_form_open() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('s')));
        for value in ["Aurora", "fast", "2", "10"] {
            type_text(&mut app, value);
        }
        assert!(app.form.is_some());
        assert_eq!(app.tone, StatusTone::InputError);
        assert!(app.registry.ships().is_empty());
    }

    #[test]
    fn marked_containers_are_placed_together() -> Result<()> {
        let mut app = app();
        app.registry.add_ship(ShipConfig {
            name: String::new(),
            max_speed_knots: 10.0,
            max_containers: 1,
            max_weight_tons: 10,
        });
        app.registry.create_container(spec(100))?;
        app.registry.create_container(spec(100))?;

        app.focus = Pane::Free;
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.marked.len(), 2);

        app.handle_key(key(KeyCode::Char('p')));
        assert_eq!(app.registry.ships()[0].containers().len(), 1);
        assert_eq!(app.registry.free_containers().len(), 1);
        assert_eq!(app.tone, StatusTone::Failure(ErrorKind::Capacity));
        assert!(app.marked.is_empty());
        Ok(())
    }

    #[test]
    fn overfill_lands_in_the_hazard_feed() -> Result<()> {
        let mut app = app();
        let serial = app.registry.create_container(spec(100))?;
        app.focus = Pane::Free;
        app.handle_key(key(KeyCode::Char('w')));
        assert!(matches!(
            app.form.as_ref().map(|f| f.kind),
            Some(FormKind::Load { serial: s }) if s == serial
        ));
        type_text(&mut app, "600");
        app.collect_hazards();

        assert_eq!(app.tone, StatusTone::Failure(ErrorKind::Overfill));
        assert_eq!(app.feed.len(), 1);
        assert!(app.feed[0].message.contains("600kg"));
        Ok(())
    }

    #[test]
    fn find_moves_focus_to_the_container() -> Result<()> {
        let mut app = app();
        let ship = app.registry.add_ship(ShipConfig {
            name: String::new(),
            max_speed_knots: 10.0,
            max_containers: 3,
            max_weight_tons: 10,
        });
        app.registry.create_container(spec(100))?;
        let target = app.registry.create_container(spec(100))?;
        app.registry.place_on_ship(target, ship)?;

        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, &target.to_string());
        assert_eq!(app.focus, Pane::Cargo);
        assert_eq!(app.focused_cargo(), Some(target));
        Ok(())
    }

    #[test]
    fn cursor_steps_stay_in_bounds() {
        assert_eq!(step(0, -1, 3), 0);
        assert_eq!(step(2, 1, 3), 2);
        assert_eq!(step(5, 1, 0), 0);
        assert_eq!(clamp_index(4, 2), 1);
    }
}
