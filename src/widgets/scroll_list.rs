use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style, Stylize},
    widgets::{Block, Paragraph, Widget},
};

use crate::config::Theme;
use crate::controller::ScrollBoxView;
use crate::widgets::viewport::Viewport;

/// Braille spinner frames for the loading placeholder
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Item(u32),
    Loading,
    Finished,
}

/// Draws the items of a scroll box through its viewport.
pub struct ScrollList<'a> {
    view: ScrollBoxView<'a>,
    viewport: &'a Viewport,
    theme: &'a Theme,
    spinner_frame: usize,
}

impl<'a> ScrollList<'a> {
    pub fn new(view: ScrollBoxView<'a>, viewport: &'a Viewport, theme: &'a Theme) -> Self {
        Self {
            view,
            viewport,
            theme,
            spinner_frame: 0,
        }
    }

    pub fn with_spinner_frame(mut self, frame: usize) -> Self {
        self.spinner_frame = frame;
        self
    }

    /// Slots after the items: the loading placeholder, then the finished marker.
    pub fn trailing_slots(view: &ScrollBoxView<'_>) -> u32 {
        view.loading as u32 + view.finished as u32
    }

    fn slot(&self, index: u32) -> Option<Slot> {
        let items = self.view.sequence.len() as u32;
        if index < items {
            return self.view.sequence.get(index as usize).map(|&id| Slot::Item(id));
        }
        match (index - items, self.view.loading, self.view.finished) {
            (0, true, _) => Some(Slot::Loading),
            (0, false, true) | (1, true, true) => Some(Slot::Finished),
            _ => None,
        }
    }

    fn render_box(&self, rect: Rect, buf: &mut Buffer, bg: Color, label: String) {
        let style = Style::default().bg(bg).fg(self.theme.get("item_text"));
        Block::default().style(style).render(rect, buf);
        let middle = Rect::new(rect.x, rect.y + rect.height / 2, rect.width, 1);
        Paragraph::new(label)
            .style(style.bold())
            .centered()
            .render(middle, buf);
    }
}

impl Widget for ScrollList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (index, rect) in self.viewport.visible_slots(area) {
            match self.slot(index) {
                Some(Slot::Item(id)) => {
                    self.render_box(rect, buf, self.theme.get("item"), id.to_string())
                }
                Some(Slot::Loading) => {
                    let frame = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
                    self.render_box(rect, buf, self.theme.get("placeholder"), frame.to_string())
                }
                Some(Slot::Finished) => self.render_box(
                    rect,
                    buf,
                    self.theme.get("finished"),
                    "Finished".to_string(),
                ),
                None => {}
            }
        }
    }
}
