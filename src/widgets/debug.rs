use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub num_scroll_events: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "scroll_forward") for debugging key handling.
    pub last_action: String,
    pub enabled: bool,
    pub loads_started: u64,
    pub load_failures: u64,
    /// Id of the attached scroll listener
    pub listener: Option<u64>,
    pub position: u32,
    pub extent: u32,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let listener = self
            .listener
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        Paragraph::new(format!(
            "events={} keys={} scrolls={} last_key={} last_action={} frames={} loads={} failed={} listener={} pos={}/{}",
            self.num_events,
            self.num_key_events,
            self.num_scroll_events,
            self.last_key_event_name,
            self.last_action,
            self.num_frames,
            self.loads_started,
            self.load_failures,
            listener,
            self.position,
            self.extent,
        ))
        .render(area, buf);
    }
}
