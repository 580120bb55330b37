use std::{
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mdr_core::{
    config::LayoutConfig, AppConfig, BinView, BoundingBox, GameSnapshot, Language, OrbitLayout,
    Outcome, Point, SelectionGame, SelectionStart, StaticLayout, TileId, TileLayout,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    block_font,
    locale::{self, Messages},
};

const BANNER_TEXT: &str = "MDR";
const STATUS_HEIGHT: u16 = 5;
const BIN_HEIGHT: u16 = 6;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    lasso_bg: Color,
    success: Color,
    danger: Color,
    on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::Cyan,
            selection_fg: Color::Black,
            lasso_bg: Color::Rgb(0, 48, 64),
            success: Color::Green,
            danger: Color::Red,
            on_accent: Color::Black,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Pointer gesture in progress on the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    /// Drawing a selection rectangle.
    Selecting,
    /// Carrying the current selection toward a bin.
    Carrying { over_bin: Option<usize> },
}

/// Maps terminal cells inside the pool area onto container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    area: Rect,
    container: (f32, f32),
}

impl Viewport {
    fn new(area: Rect, layout: &LayoutConfig, pool_size: usize) -> Self {
        Self {
            area,
            container: layout.container_size(pool_size),
        }
    }

    fn scale(&self) -> (f32, f32) {
        (
            self.container.0 / f32::from(self.area.width.max(1)),
            self.container.1 / f32::from(self.area.height.max(1)),
        )
    }

    fn contains(&self, column: u16, row: u16) -> bool {
        contains(self.area, column, row)
    }

    /// Container point at the middle of a cell. Cells outside the area map
    /// outside the container.
    fn to_container(&self, column: u16, row: u16) -> Point {
        let (sx, sy) = self.scale();
        Point::new(
            (f32::from(column) - f32::from(self.area.x) + 0.5) * sx,
            (f32::from(row) - f32::from(self.area.y) + 0.5) * sy,
        )
    }

    /// Cell holding `point`, if it falls inside the area.
    fn to_cell(&self, point: Point) -> Option<(u16, u16)> {
        let (sx, sy) = self.scale();
        let column = (point.x / sx).floor();
        let row = (point.y / sy).floor();
        if column < 0.0
            || row < 0.0
            || column >= f32::from(self.area.width)
            || row >= f32::from(self.area.height)
        {
            return None;
        }
        Some((self.area.x + column as u16, self.area.y + row as u16))
    }

    /// Container box covering exactly the cells of `rect`.
    fn to_bounds(&self, rect: Rect) -> BoundingBox {
        let (sx, sy) = self.scale();
        BoundingBox::new(
            (f32::from(rect.x) - f32::from(self.area.x)) * sx,
            (f32::from(rect.y) - f32::from(self.area.y)) * sy,
            f32::from(rect.width) * sx,
            f32::from(rect.height) * sy,
        )
    }

    /// Cells covered by `bounds`, clipped to the area.
    fn to_rect(&self, bounds: BoundingBox) -> Option<Rect> {
        let (sx, sy) = self.scale();
        let left = (bounds.left / sx).floor().max(0.0);
        let top = (bounds.top / sy).floor().max(0.0);
        let right = (bounds.right() / sx).ceil().min(f32::from(self.area.width));
        let bottom = (bounds.bottom() / sy).ceil().min(f32::from(self.area.height));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(
            self.area.x + left as u16,
            self.area.y + top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }
}

/// A tile label as placed on screen this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DrawnTile {
    id: TileId,
    label: String,
    rect: Rect,
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}

/// Terminal front end for the selection game.
pub struct MdrApp {
    game: SelectionGame,
    orbit: OrbitLayout,
    language: Language,
    tick_rate: Duration,
    theme: Theme,
    viewport: Viewport,
    bin_areas: Vec<Rect>,
    gesture: Option<Gesture>,
    status: Option<String>,
    started: Instant,
    should_quit: bool,
}

impl MdrApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let layout = config.game.layout;
        let pool_size = config.game.pool_size;
        let game = SelectionGame::new(config.game).context("failed to start the game")?;
        Ok(Self {
            game,
            orbit: OrbitLayout::new(layout),
            language: config.ui.language,
            tick_rate: config.ui.tick_rate(),
            theme: Theme::default(),
            viewport: Viewport::new(Rect::default(), &layout, pool_size),
            bin_areas: Vec::new(),
            gesture: None,
            status: None,
            started: Instant::now(),
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx, self.tick_rate);
        info!(language = self.language.code(), "terminal session started");

        let result = self.event_loop(&mut terminal, &mut event_rx).await;
        restore_terminal(&mut terminal)?;
        if let Err(err) = &result {
            error!(?err, "terminal session failed");
        }
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        events: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            match events.recv().await {
                Some(AppEvent::Input(event)) => self.handle_input(event),
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }
            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn messages(&self) -> &'static Messages {
        locale::messages(self.language)
    }

    fn handle_tick(&mut self) {
        self.game.tick(self.started.elapsed());
    }

    fn handle_input(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.reset(),
            KeyCode::Enter if self.game.round().is_over() => self.reset(),
            KeyCode::Char('l') => {
                self.language = self.language.toggled();
                self.status = Some(self.messages().language_changed().to_string());
                info!(language = self.language.code(), "language switched");
            }
            KeyCode::Char(ch) => {
                if let Some(bin) = ch.to_digit(10).filter(|digit| *digit > 0) {
                    self.deposit(bin as usize - 1);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.game.round().is_over() || !self.viewport.contains(column, row) {
                    return;
                }
                let point = self.viewport.to_container(column, row);
                self.status = None;
                self.gesture = Some(match self.game.begin_selection(point) {
                    SelectionStart::Started => Gesture::Selecting,
                    SelectionStart::DragExisting => Gesture::Carrying { over_bin: None },
                });
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.gesture {
                Some(Gesture::Selecting) => {
                    let point = self.viewport.to_container(column, row);
                    self.game.update_selection(point);
                }
                Some(Gesture::Carrying { .. }) => {
                    self.gesture = Some(Gesture::Carrying {
                        over_bin: self.bin_at(column, row),
                    });
                }
                None => {}
            },
            MouseEventKind::Up(MouseButton::Left) => match self.gesture.take() {
                Some(Gesture::Selecting) => {
                    self.game.end_selection();
                    debug!(
                        selected = self.game.selection().len(),
                        "selection finished"
                    );
                }
                Some(Gesture::Carrying { .. }) => {
                    if let Some(bin) = self.bin_at(column, row) {
                        self.deposit(bin);
                    }
                }
                None => {}
            },
            _ => {}
        }
    }

    fn bin_at(&self, column: u16, row: u16) -> Option<usize> {
        self.bin_areas
            .iter()
            .position(|area| contains(*area, column, row))
    }

    fn deposit(&mut self, bin: usize) {
        match self.game.deposit(bin) {
            Ok(Some(receipt)) => {
                self.status = None;
                if let Some(outcome) = receipt.outcome {
                    info!(?outcome, "sequence finished");
                    match self.game.snapshot().to_json() {
                        Ok(json) => debug!(snapshot = %json, "final board"),
                        Err(err) => warn!(%err, "failed to serialize final board"),
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(%err, bin, "deposit rejected");
                self.status = Some(self.messages().rejection(&err));
            }
        }
    }

    fn reset(&mut self) {
        self.gesture = None;
        self.status = None;
        self.game.reset();
        info!("new sequence started");
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let snapshot = self.game.snapshot();
        let messages = self.messages();

        let banner = format!("{BANNER_TEXT} {:.0}%", snapshot.progress_percent);
        let banner_height = (block_font::FONT_HEIGHT + 3) as u16;
        let show_banner = area.height >= banner_height + BIN_HEIGHT + STATUS_HEIGHT + 10
            && area.width as usize >= block_font::width(&banner) + 2;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if show_banner { banner_height } else { 0 }),
                Constraint::Min(5),
                Constraint::Length(BIN_HEIGHT),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .split(area);

        if show_banner {
            self.render_banner(frame, layout[0], &banner);
        }
        self.render_pool(frame, layout[1], &snapshot, messages);
        self.render_bins(frame, layout[2], &snapshot, messages);
        self.render_status(frame, layout[3], &snapshot, messages);

        if let Some(outcome) = snapshot.outcome {
            self.render_outcome(frame, area, outcome, messages);
        }
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect, text: &str) {
        let content: Vec<Line> = block_font::render(text)
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let paragraph = Paragraph::new(content)
            .block(Block::default().borders(Borders::BOTTOM))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_pool(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        snapshot: &GameSnapshot,
        messages: &Messages,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(messages.title)
            .border_style(Style::default().fg(self.theme.accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let config = self.game.config();
        self.viewport = Viewport::new(inner, &config.layout, config.pool_size);
        let drawn = self.drawn_tiles();
        self.sync_hit_boxes(&drawn);

        let viewport = self.viewport;
        let buffer = frame.buffer_mut();
        if let Some(lasso) = snapshot
            .selection_box
            .and_then(|bounds| viewport.to_rect(bounds))
        {
            buffer.set_style(lasso, Style::default().bg(self.theme.lasso_bg));
        }

        let heavy = self.heavy_weight();
        for placed in &drawn {
            let Some(tile) = snapshot.tile(placed.id) else {
                continue;
            };
            let mut style = Style::default().fg(self.theme.primary_fg);
            if tile.weight >= heavy {
                style = style.add_modifier(Modifier::BOLD);
            }
            if tile.spawning {
                style = style.fg(self.theme.muted);
            }
            if tile.selected {
                style = style.bg(self.theme.selection_bg).fg(self.theme.selection_fg);
            }
            buffer.set_string(placed.rect.x, placed.rect.y, &placed.label, style);
        }
    }

    /// Labels that fit in the pool, placed on the cell under each tile's
    /// live orbit position.
    fn drawn_tiles(&self) -> Vec<DrawnTile> {
        let now = self.game.clock();
        self.game
            .tiles()
            .iter()
            .filter_map(|tile| {
                let bounds = self.orbit.bounds(tile, now)?;
                let cell = self.viewport.to_cell(bounds.center())?;
                let label = tile.value.to_string();
                let rect = label_rect(self.viewport.area, cell, label.chars().count() as u16)?;
                Some(DrawnTile {
                    id: tile.id,
                    label,
                    rect,
                })
            })
            .collect()
    }

    /// Hit-test against the cells the labels occupy on screen.
    fn sync_hit_boxes(&mut self, drawn: &[DrawnTile]) {
        let layout: StaticLayout = drawn
            .iter()
            .map(|tile| (tile.id, self.viewport.to_bounds(tile.rect)))
            .collect();
        self.game.set_layout(layout);
    }

    /// Tiles at or above this weight render bold.
    fn heavy_weight(&self) -> u32 {
        let weights = self.game.config().weights;
        weights.min + (weights.max - weights.min) / 2
    }

    fn render_bins(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        snapshot: &GameSnapshot,
        messages: &Messages,
    ) {
        let count = snapshot.bins.len().max(1) as u32;
        let constraints: Vec<Constraint> =
            (0..count).map(|_| Constraint::Ratio(1, count)).collect();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);
        self.bin_areas = columns.to_vec();

        let over_bin = match self.gesture {
            Some(Gesture::Carrying { over_bin }) => over_bin,
            _ => None,
        };
        for (bin, column) in snapshot.bins.iter().zip(columns.iter()) {
            let highlighted = over_bin == Some(bin.index);
            self.render_bin(frame, *column, bin, highlighted, messages);
        }
    }

    fn render_bin(
        &self,
        frame: &mut Frame,
        area: Rect,
        bin: &BinView,
        highlighted: bool,
        messages: &Messages,
    ) {
        let border = if highlighted {
            Style::default()
                .fg(self.theme.on_accent)
                .bg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {} {} ", messages.bin_title, bin.index + 1));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        match bin.fill_percent {
            Some(percent) => {
                let gauge = Gauge::default()
                    .gauge_style(Style::default().fg(self.theme.accent))
                    .ratio(f64::from(percent / 100.0).clamp(0.0, 1.0))
                    .label(format!("{percent:.0}%"));
                frame.render_widget(gauge, rows[0]);
            }
            None => {
                let score = Paragraph::new(format!("{} · {}", bin.values.len(), bin.score))
                    .style(Style::default().fg(self.theme.accent));
                frame.render_widget(score, rows[0]);
            }
        }

        let capacity = usize::from(rows[1].width) * usize::from(rows[1].height);
        let values = tail_values(&bin.values, capacity);
        let paragraph = Paragraph::new(values)
            .style(Style::default().fg(self.theme.primary_fg))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, rows[1]);
    }

    fn render_status(
        &self,
        frame: &mut Frame,
        area: Rect,
        snapshot: &GameSnapshot,
        messages: &Messages,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(messages.status_title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let primary = self
            .status
            .clone()
            .unwrap_or_else(|| messages.selection(snapshot.selected_count()));
        frame.render_widget(Paragraph::new(primary), rows[0]);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.theme.accent))
            .ratio(f64::from(snapshot.progress_percent / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "{} {:.0}%",
                messages.progress_title, snapshot.progress_percent
            ));
        frame.render_widget(gauge, rows[1]);

        let keys = Paragraph::new(Line::from(Span::styled(
            messages.keys,
            Style::default().fg(self.theme.muted),
        )));
        frame.render_widget(keys, rows[2]);
    }

    fn render_outcome(&self, frame: &mut Frame, area: Rect, outcome: Outcome, messages: &Messages) {
        let (title, body, button, color) = match outcome {
            Outcome::Won => (
                messages.success_title,
                messages.success_message,
                messages.success_button,
                self.theme.success,
            ),
            Outcome::Lost => (
                messages.failure_title,
                messages.failure_message,
                messages.failure_button,
                self.theme.danger,
            ),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(body.iter().map(|line| Line::from(*line)));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("[Enter] {button}"),
            Style::default()
                .fg(self.theme.on_accent)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )));

        let height = (lines.len() as u16 + 6).min(area.height);
        let popup = centered_rect(area.width.saturating_sub(8).min(72), height, area);
        frame.render_widget(Clear, popup);
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup);
    }
}

/// Cells for a `width`-wide label centered on `cell`, or `None` if it would
/// leave `area`.
fn label_rect(area: Rect, cell: (u16, u16), width: u16) -> Option<Rect> {
    let (column, row) = cell;
    let start = column.saturating_sub(width.saturating_sub(1) / 2).max(area.x);
    if width == 0 || start + width > area.right() || !contains(area, start, row) {
        return None;
    }
    Some(Rect::new(start, row, width, 1))
}

/// Most recent values that fit in `capacity` cells, space separated.
fn tail_values(values: &[u32], capacity: usize) -> String {
    let mut kept: Vec<String> = Vec::new();
    let mut used = 0;
    for value in values.iter().rev() {
        let label = value.to_string();
        let needed = label.len() + usize::from(!kept.is_empty());
        if used + needed > capacity {
            break;
        }
        used += needed;
        kept.push(label);
    }
    kept.reverse();
    kept.join(" ")
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
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
