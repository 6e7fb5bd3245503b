use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, Borders};

pub mod axis;
pub mod cache;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod controller;
pub mod loader;
pub mod logging;
pub mod scroll;
pub mod sequence;
pub mod widgets;

pub use axis::{Axis, AxisPolicy, Threshold};
pub use cache::CacheManager;
pub use checkpoint::{CheckpointState, CheckpointTrigger, SettleReport};
pub use cli::Args;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, LoadingConfig,
    Theme,
};
pub use controller::{ScrollBox, ScrollBoxSettings, ScrollBoxView};
pub use loader::{FetchError, ItemSource, LoadEvent, LoadOutcome, SimulatedSource};
pub use scroll::{near_end, Extent, ScrollBehavior, ScrollTarget};
pub use sequence::{ItemId, Sequence, SequenceError};

use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::scroll_list::ScrollList;
use widgets::viewport::{Viewport, SCROLL_STEP};

/// Application name used for config and cache directories
pub const APP_NAME: &str = "scrollbox";

/// Spinner advances once every this many ticks
const TICKS_PER_SPINNER_FRAME: usize = 4;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16), // resized (width, height)
    /// A fetch came back from the item source
    Loaded(LoadEvent),
    Exit,
    Crash(String),
}

impl From<LoadEvent> for AppEvent {
    fn from(event: LoadEvent) -> Self {
        AppEvent::Loaded(event)
    }
}

impl From<&LoadingConfig> for SimulatedSource {
    fn from(config: &LoadingConfig) -> Self {
        SimulatedSource::new(Duration::from_millis(config.latency_ms))
            .with_fail_every(config.fail_every)
    }
}

pub struct App<S = SimulatedSource> {
    events: UnboundedSender<AppEvent>,
    scroll_box: ScrollBox<S>,
    viewport: Viewport,
    theme: Theme,
    debug: DebugState,
    /// Finish threshold for the status line, if it is a number
    max: Option<u32>,
    ticks: usize,
    needs_settle: bool,
}

impl App<SimulatedSource> {
    /// App backed by the simulated source described by `config.loading`.
    pub fn from_config(events: UnboundedSender<AppEvent>, config: &AppConfig) -> Result<Self> {
        let source = SimulatedSource::from(&config.loading);
        Self::new(events, config, source)
    }
}

impl<S: ItemSource> App<S> {
    pub fn new(events: UnboundedSender<AppEvent>, config: &AppConfig, source: S) -> Result<Self> {
        let theme = Theme::from_config(&config.theme)?;
        let settings = config.scroll_settings();
        let max = settings.finish.value();
        let debug = DebugState {
            enabled: config.debug.enabled,
            ..Default::default()
        };
        let mut app = Self {
            events,
            scroll_box: ScrollBox::new(settings, source),
            viewport: Viewport::new(config.performance.animation_frames),
            theme,
            debug,
            max,
            ticks: 0,
            // the first frame gets a settle pass too, so a short list fills the screen
            needs_settle: true,
        };
        app.sync_viewport();
        Ok(app)
    }

    pub fn scroll_box(&self) -> &ScrollBox<S> {
        &self.scroll_box
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn debug(&self) -> &DebugState {
        &self.debug
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    /// Lay the viewport out for the current sequence, axis and trailing markers.
    fn sync_viewport(&mut self) {
        let view = self.scroll_box.view();
        self.viewport.set_content(
            view.axis,
            view.sequence.len() as u32,
            ScrollList::trailing_slots(&view),
        );
    }

    /// The container moved; let the scroll monitor decide whether to load.
    fn scrolled(&mut self) {
        self.debug.num_scroll_events += 1;
        if self.scroll_box.on_scroll(&self.viewport, &self.events) {
            self.sync_viewport();
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);
        let axis = self.scroll_box.axis();
        let (action, moved) = match event.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppEvent::Exit)
            }
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Char('l') | KeyCode::Right => (
                "scroll_forward",
                self.viewport.scroll_by(axis, SCROLL_STEP),
            ),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Char('h') | KeyCode::Left => {
                ("scroll_back", self.viewport.scroll_by(axis, -SCROLL_STEP))
            }
            KeyCode::PageDown => {
                let page = self.viewport.page(axis);
                ("page_forward", self.viewport.scroll_by(axis, page))
            }
            KeyCode::PageUp => {
                let page = self.viewport.page(axis);
                ("page_back", self.viewport.scroll_by(axis, -page))
            }
            KeyCode::Char('g') | KeyCode::Home => {
                ("scroll_to_start", self.viewport.scroll_to_start(axis))
            }
            KeyCode::Char('G') | KeyCode::End => ("scroll_to_end", self.viewport.scroll_to_end(axis)),
            _ => return None,
        };
        self.debug.last_action = action.to_string();
        if moved {
            self.scrolled();
        }
        None
    }

    pub fn event(&mut self, event: AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(&key),
            AppEvent::Resize(cols, rows) => {
                debug!(cols, rows, "terminal resized");
                self.needs_settle = true;
                None
            }
            AppEvent::Loaded(load) => {
                let outcome = self.scroll_box.complete_load(load);
                let loader = self.scroll_box.loader();
                self.debug.loads_started = loader.loads_started();
                self.debug.load_failures = loader.failures();
                self.debug.last_action = format!("{:?}", outcome);
                self.sync_viewport();
                self.needs_settle = true;
                None
            }
            // handled by the event loop
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Advance animations by one frame. Returns whether anything needs redrawing.
    pub fn tick(&mut self) -> bool {
        let mut redraw = false;
        if self.viewport.tick() {
            self.scrolled();
            redraw = true;
        }
        if self.scroll_box.is_loading() {
            self.ticks = self.ticks.wrapping_add(1);
            redraw |= self.ticks % TICKS_PER_SPINNER_FRAME == 0;
        }
        redraw
    }

    /// Settle pass for the frame just drawn: checkpoint auto-scroll and the
    /// end-of-content check. Returns whether another frame should be drawn.
    pub fn after_render(&mut self) -> bool {
        if !std::mem::take(&mut self.needs_settle) {
            return false;
        }
        let report = self.scroll_box.after_render(&mut self.viewport, &self.events);
        if let Some((item, axis)) = report.auto_scrolled {
            self.debug.last_action = format!("auto_scroll({} {})", item, axis);
            // check the end again once the scroll has moved the list
            self.needs_settle = true;
        }
        if report.load_started {
            self.sync_viewport();
        }
        report.auto_scrolled.is_some() || report.load_started
    }

    fn spinner_frame(&self) -> usize {
        self.ticks / TICKS_PER_SPINNER_FRAME
    }
}

impl<S: ItemSource> Widget for &mut App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let background_color = self.theme.get("background");
        Block::default()
            .style(Style::default().bg(background_color))
            .render(area, buf);

        let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let axis = self.scroll_box.axis();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("text_primary")))
            .title(format!(" scrollbox · {} ", axis.label()));
        let list_area = block.inner(layout[0]);
        block.render(layout[0], buf);

        self.viewport
            .set_visible_cells(list_area.width, list_area.height);
        self.sync_viewport();

        if self.debug.enabled {
            self.debug.listener = self.scroll_box.subscription().map(|s| s.id);
            self.debug.position = self.viewport.position(axis);
            self.debug.extent = self.viewport.extent(axis).total;
        }

        let view = self.scroll_box.view();
        ScrollList::new(view, &self.viewport, &self.theme)
            .with_spinner_frame(self.spinner_frame())
            .render(list_area, buf);

        let controls = Controls::from_view(&view, self.max).with_colors(
            self.theme.get("controls_bg"),
            self.theme.get("keybind_hints"),
        );
        (&controls).render(layout[1], buf);

        if self.debug.enabled {
            (&self.debug).render(layout[2], buf);
        }
    }
}
