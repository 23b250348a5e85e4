// Vote tally chart: a bar per target, fed from the server's vote counts.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{BarChart, Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

const MAX_BAR_WIDTH: u16 = 9;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Vote Tally");
    let chart = &state.vote_chart;

    if chart.is_empty() {
        let paragraph = Paragraph::new("  No tally yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let data: Vec<(&str, u64)> = chart
        .labels
        .iter()
        .map(String::as_str)
        .zip(chart.values.iter().copied())
        .collect();

    let widget = BarChart::default()
        .block(block)
        .data(data.as_slice())
        .bar_width(bar_width(area.width, data.len()))
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow));
    frame.render_widget(widget, area);
}

/// Widest bar that lets every target fit inside the borders.
fn bar_width(area_width: u16, bars: usize) -> u16 {
    let inner = area_width.saturating_sub(2) as usize;
    let per_bar = inner / bars.max(1);
    (per_bar.saturating_sub(1) as u16).clamp(1, MAX_BAR_WIDTH)
}
