use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// A one-line search box. Typing edits a draft; the query only changes
/// when the draft is committed.
pub struct SearchInputState {
    pub query: String,
    pub draft: String,
    pub editing: bool,
}

pub enum SearchEvent {
    /// The committed query changed
    Committed,
    Cancelled,
}

impl SearchInputState {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            draft: String::new(),
            editing: false,
        }
    }

    pub fn start_editing(&mut self) {
        self.draft = self.query.clone();
        self.editing = true;
    }

    pub fn handle_input(&mut self, key: KeyCode) -> Option<SearchEvent> {
        if !self.editing {
            return None;
        }

        match key {
            KeyCode::Char(c) => {
                self.draft.push(c);
            }
            KeyCode::Backspace => {
                self.draft.pop();
            }
            KeyCode::Enter => {
                self.editing = false;
                let trimmed = self.draft.trim().to_string();
                if trimmed != self.query {
                    self.query = trimmed;
                    return Some(SearchEvent::Committed);
                }
            }
            KeyCode::Esc => {
                self.editing = false;
                self.draft.clear();
                return Some(SearchEvent::Cancelled);
            }
            _ => {}
        }

        None
    }

    pub fn get_display_string(&self) -> String {
        if self.editing {
            format!("{}|", self.draft)
        } else if self.query.is_empty() {
            "Press / to search".to_string()
        } else {
            self.query.clone()
        }
    }
}

pub fn render_search_input<B: Backend>(
    frame: &mut Frame<B>,
    state: &SearchInputState,
    placeholder: &str,
    area: Rect,
) {
    let style = if state.editing {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if state.query.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let line = Spans::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Cyan)),
        Span::styled(state.get_display_string(), style),
    ]);

    let search = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title(placeholder.to_string()));
    frame.render_widget(search, area);
}
