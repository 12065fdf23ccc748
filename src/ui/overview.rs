use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Spans,
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::data::DashboardData;
use crate::db::Store;
use crate::format::generate_y_axis;
use crate::models::{CardData, LatestInvoice, Revenue};
use crate::ui::{nav_key, render_help, Screen};

pub struct OverviewState {
    cards: CardData,
    revenue: Vec<Revenue>,
    latest: Vec<LatestInvoice>,
}

impl OverviewState {
    pub fn new(cards: CardData, revenue: Vec<Revenue>, latest: Vec<LatestInvoice>) -> Self {
        Self { cards, revenue, latest }
    }
}

pub enum OverviewAction {
    Navigate(Screen),
    Refresh,
    Quit,
}

pub async fn load_overview<S: Store>(data: &DashboardData<S>) -> Result<OverviewState> {
    let (cards, revenue, latest) = tokio::try_join!(
        data.fetch_card_data(),
        data.fetch_revenue(),
        data.fetch_latest_invoices(),
    )?;

    Ok(OverviewState::new(cards, revenue, latest))
}

/// Spread axis labels over `height` rows, top label on the first row and
/// the last label on the bottom row.
pub fn axis_lines(labels: &[String], height: u16) -> Vec<String> {
    let height = usize::from(height);
    if height == 0 {
        return Vec::new();
    }
    if labels.len() <= 1 || labels.len() > height {
        return labels.iter().take(height).cloned().collect();
    }

    let mut lines = vec![String::new(); height];
    let steps = labels.len() - 1;
    for (i, label) in labels.iter().enumerate() {
        let row = (i * (height - 1) + steps / 2) / steps;
        lines[row] = label.clone();
    }
    lines
}

pub fn render_overview<B: Backend>(frame: &mut Frame<B>, state: &OverviewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    render_cards(frame, &state.cards, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(chunks[1]);

    render_revenue(frame, &state.revenue, body[0]);
    render_latest(frame, &state.latest, body[1]);

    render_help(frame, "1 Overview | 2 Invoices | 3 Customers | R Refresh | Q Quit", chunks[2]);
}

fn render_cards<B: Backend>(frame: &mut Frame<B>, cards: &CardData, area: Rect) {
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4].as_ref())
        .split(area);

    let figures = [
        ("Collected", cards.total_paid_invoices.clone()),
        ("Pending", cards.total_pending_invoices.clone()),
        ("Total Invoices", cards.number_of_invoices.to_string()),
        ("Total Customers", cards.number_of_customers.to_string()),
    ];

    for ((title, value), slot) in figures.into_iter().zip(slots) {
        let card = Paragraph::new(value)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(card, slot);
    }
}

fn render_revenue<B: Backend>(frame: &mut Frame<B>, revenue: &[Revenue], area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(7), Constraint::Min(10)].as_ref())
        .split(area);

    if revenue.is_empty() {
        let empty = Paragraph::new("No data available.")
            .block(Block::default().borders(Borders::ALL).title("Recent Revenue"));
        frame.render_widget(empty, area);
        return;
    }

    let (labels, top) = generate_y_axis(revenue);

    // One row for the top border, one for the bottom border, one for month labels.
    let axis_area = Rect::new(
        columns[0].x,
        columns[0].y + 1,
        columns[0].width,
        columns[0].height.saturating_sub(3),
    );
    let axis: Vec<Spans> = axis_lines(&labels, axis_area.height)
        .into_iter()
        .map(Spans::from)
        .collect();
    frame.render_widget(
        Paragraph::new(axis).style(Style::default().fg(Color::Gray)),
        axis_area,
    );

    let bars: Vec<(&str, u64)> = revenue
        .iter()
        .map(|r| (r.month.as_str(), u64::try_from(r.revenue).unwrap_or(0)))
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Recent Revenue"))
        .data(&bars)
        .max(u64::try_from(top).unwrap_or(0).max(1))
        .bar_width(4)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::Blue).bg(Color::Blue))
        .label_style(Style::default().fg(Color::Gray));
    frame.render_widget(chart, columns[1]);
}

fn render_latest<B: Backend>(frame: &mut Frame<B>, latest: &[LatestInvoice], area: Rect) {
    let rows = latest.iter().map(|invoice| {
        Row::new(vec![
            Cell::from(invoice.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(invoice.email.clone()).style(Style::default().fg(Color::Gray)),
            Cell::from(invoice.amount.clone()),
        ])
    });

    let table = Table::new(rows)
        .block(Block::default().borders(Borders::ALL).title("Latest Invoices"))
        .widths(&[
            Constraint::Percentage(35),
            Constraint::Percentage(40),
            Constraint::Percentage(25),
        ]);
    frame.render_widget(table, area);
}

pub fn handle_input() -> Result<Option<OverviewAction>> {
    if let Event::Key(key) = event::read()? {
        if let Some(screen) = nav_key(key.code) {
            return Ok(Some(OverviewAction::Navigate(screen)));
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(OverviewAction::Quit)),
            KeyCode::Char('r') => return Ok(Some(OverviewAction::Refresh)),
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).rev().map(|k| format!("${k}K")).collect()
    }

    #[test]
    fn axis_spans_the_full_height() {
        let lines = axis_lines(&labels(3), 5);
        assert_eq!(lines, vec!["$2K", "", "$1K", "", "$0K"]);
    }

    #[test]
    fn axis_is_truncated_when_taller_than_the_area() {
        let lines = axis_lines(&labels(6), 4);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "$5K");
    }

    #[test]
    fn zero_height_axis_is_empty() {
        assert!(axis_lines(&labels(2), 0).is_empty());
    }
}
