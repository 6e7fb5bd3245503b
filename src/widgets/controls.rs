use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

use crate::controller::ScrollBoxView;

const CONTROLS: [(&str, &str); 4] = [
    ("j/k", "Scroll"),
    ("PgDn", "Page"),
    ("g/G", "Start/End"),
    ("q", "Quit"),
];

/// Bottom strip: key hints on the left, list status on the right.
#[derive(Debug, Default)]
pub struct Controls {
    pub items: usize,
    pub max: Option<u32>,
    pub axis_label: &'static str,
    pub loading: bool,
    pub finished: bool,
    pub bg: Color,
    pub key_fg: Color,
}

impl Controls {
    pub fn from_view(view: &ScrollBoxView<'_>, max: Option<u32>) -> Self {
        Self {
            items: view.sequence.len(),
            max,
            axis_label: view.axis.label(),
            loading: view.loading,
            finished: view.finished,
            bg: Color::DarkGray,
            key_fg: Color::Cyan,
        }
    }

    pub fn with_colors(mut self, bg: Color, key_fg: Color) -> Self {
        self.bg = bg;
        self.key_fg = key_fg;
        self
    }

    pub fn status(&self) -> String {
        let max = self
            .max
            .map(|m| m.to_string())
            .unwrap_or_else(|| "?".to_string());
        let state = if self.finished {
            " · finished"
        } else if self.loading {
            " · loading"
        } else {
            ""
        };
        format!("Items: {}/{} · {}{}", self.items, max, self.axis_label, state)
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status = self.status();

        let mut constraints = CONTROLS.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));
        constraints.push(Constraint::Length(status.chars().count() as u16 + 1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let base_style = Style::default().bg(self.bg);

        for (i, (key, action)) in CONTROLS.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(Style::default().fg(self.key_fg).bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(base_style)
                .render(layout[j + 1], buf);
        }

        let fill_idx = CONTROLS.len() * 2;
        Paragraph::new("").style(base_style).render(layout[fill_idx], buf);
        Paragraph::new(status)
            .style(base_style.fg(Color::White))
            .right_aligned()
            .render(layout[fill_idx + 1], buf);
    }
}
