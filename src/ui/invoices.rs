use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::actions::INVOICES_PATH;
use crate::data::DashboardData;
use crate::db::Store;
use crate::format::{format_currency, format_date_to_local, generate_pagination, PageItem};
use crate::models::{InvoiceStatus, InvoicesTable};
use crate::ui::cache::ViewCache;
use crate::ui::components::search_input::{render_search_input, SearchEvent, SearchInputState};
use crate::ui::{nav_key, render_help, Screen};

/// One rendered page of the invoice listing.
#[derive(Debug, Clone, Default)]
pub struct InvoicesPage {
    pub rows: Vec<InvoicesTable>,
    pub total_pages: i64,
}

pub struct InvoicesState {
    search: SearchInputState,
    page: i64,
    listing: InvoicesPage,
    table_state: TableState,
    confirm_delete: Option<String>,
    message: Option<String>,
}

impl InvoicesState {
    pub fn new() -> Self {
        Self {
            search: SearchInputState::new(),
            page: 1,
            listing: InvoicesPage::default(),
            table_state: TableState::default(),
            confirm_delete: None,
            message: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.search.query
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn set_listing(&mut self, listing: InvoicesPage) {
        let selected = self.table_state.selected().unwrap_or(0);
        self.table_state.select(if listing.rows.is_empty() {
            None
        } else {
            Some(selected.min(listing.rows.len() - 1))
        });
        // A deletion can leave the current page past the end.
        if self.page > listing.total_pages.max(1) {
            self.page = listing.total_pages.max(1);
        }
        self.listing = listing;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn next(&mut self) {
        if self.listing.rows.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.listing.rows.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.listing.rows.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(0) | None => self.listing.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// Returns false when already on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.page >= self.listing.total_pages {
            return false;
        }
        self.page += 1;
        self.table_state.select(Some(0));
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        self.table_state.select(Some(0));
        true
    }

    pub fn selected_invoice(&self) -> Option<&InvoicesTable> {
        self.table_state.selected().and_then(|i| self.listing.rows.get(i))
    }

    pub fn selected_invoice_id(&self) -> Option<String> {
        self.selected_invoice().map(|invoice| invoice.id.clone())
    }
}

pub enum InvoiceAction {
    Navigate(Screen),
    Reload,
    NewInvoice,
    EditInvoice(String),
    DeleteInvoice(String),
    Quit,
}

/// Cache key parameters for one listing page.
pub fn listing_params(query: &str, page: i64) -> String {
    format!("query={query}&page={page}")
}

/// The query a listing cache entry was rendered for.
fn listing_query(params: &str) -> Option<&str> {
    params
        .strip_prefix("query=")?
        .rsplit_once("&page=")
        .map(|(query, _)| query)
}

/// Load a listing page, from the cache when an earlier render is still valid.
///
/// Only pages of the current query stay cached; a new search drops the rest.
pub async fn load_listing<S: Store>(
    data: &DashboardData<S>,
    cache: &mut ViewCache<InvoicesPage>,
    query: &str,
    page: i64,
) -> Result<InvoicesPage> {
    let params = listing_params(query, page);
    if let Some(hit) = cache.get(INVOICES_PATH, &params) {
        return Ok(hit.clone());
    }

    let (rows, total_pages) = tokio::try_join!(
        data.fetch_filtered_invoices(query, page),
        data.fetch_invoices_pages(query),
    )?;

    let listing = InvoicesPage { rows, total_pages };
    cache.retain_params(INVOICES_PATH, |cached| listing_query(cached) == Some(query));
    cache.insert(INVOICES_PATH, &params, listing.clone());
    Ok(listing)
}

fn status_cell(status: InvoiceStatus) -> Cell<'static> {
    let style = match status {
        InvoiceStatus::Paid => Style::default().fg(Color::Green),
        InvoiceStatus::Pending => Style::default().fg(Color::Gray),
    };
    Cell::from(status.as_str()).style(style)
}

fn pagination_line(current: i64, total: i64) -> Spans<'static> {
    let mut spans = vec![Span::raw("Page ")];
    for item in generate_pagination(current, total) {
        let span = match item {
            PageItem::Page(n) if n == current => Span::styled(
                format!("[{n}]"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            PageItem::Page(n) => Span::raw(format!(" {n} ")),
            PageItem::Ellipsis => Span::raw(" ... "),
        };
        spans.push(span);
    }
    Spans::from(spans)
}

pub fn render_invoices<B: Backend>(frame: &mut Frame<B>, state: &mut InvoicesState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    render_search_input(frame, &state.search, "Search invoices...", chunks[0]);

    let header_cells = ["Customer", "Email", "Amount", "Date", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.listing.rows.iter().map(|invoice| {
        Row::new(vec![
            Cell::from(invoice.name.clone()),
            Cell::from(invoice.email.clone()),
            Cell::from(format_currency(i64::from(invoice.amount))),
            Cell::from(format_date_to_local(&invoice.date)),
            status_cell(invoice.status),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("Invoices").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ]);
    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    frame.render_widget(
        Paragraph::new(pagination_line(state.page, state.listing.total_pages)),
        chunks[2],
    );

    if let Some(message) = &state.message {
        frame.render_widget(
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Cyan)),
            chunks[3],
        );
    }

    let help = if state.confirm_delete.is_some() {
        "Delete this invoice? Y - Confirm | any other key - Cancel"
    } else if state.search.editing {
        "Enter - Search | Esc - Cancel"
    } else if state.selected_invoice().is_some() {
        "/ Search | Left/Right Page | N New | E Edit | D Delete | 1 Overview | 3 Customers | Q Quit"
    } else {
        "/ Search | N New | 1 Overview | 3 Customers | Q Quit"
    };
    render_help(frame, help, chunks[4]);
}

pub fn handle_input(state: &mut InvoicesState) -> Result<Option<InvoiceAction>> {
    if let Event::Key(key) = event::read()? {
        state.message = None;

        if let Some(id) = state.confirm_delete.take() {
            if key.code == KeyCode::Char('y') {
                return Ok(Some(InvoiceAction::DeleteInvoice(id)));
            }
            return Ok(None);
        }

        if state.search.editing {
            if let Some(SearchEvent::Committed) = state.search.handle_input(key.code) {
                state.page = 1;
                state.table_state.select(Some(0));
                return Ok(Some(InvoiceAction::Reload));
            }
            return Ok(None);
        }

        if let Some(screen) = nav_key(key.code) {
            return Ok(Some(InvoiceAction::Navigate(screen)));
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                return Ok(Some(InvoiceAction::Quit));
            }
            KeyCode::Char('/') => {
                state.search.start_editing();
            }
            KeyCode::Char('n') => {
                return Ok(Some(InvoiceAction::NewInvoice));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = state.selected_invoice_id() {
                    return Ok(Some(InvoiceAction::EditInvoice(id)));
                }
            }
            KeyCode::Char('d') => {
                state.confirm_delete = state.selected_invoice_id();
            }
            KeyCode::Right => {
                if state.next_page() {
                    return Ok(Some(InvoiceAction::Reload));
                }
            }
            KeyCode::Left => {
                if state.previous_page() {
                    return Ok(Some(InvoiceAction::Reload));
                }
            }
            KeyCode::Down => {
                state.next();
            }
            KeyCode::Up => {
                state.previous();
            }
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::seed::SeedData;

    fn listing(rows: usize, total_pages: i64) -> InvoicesPage {
        let row = InvoicesTable {
            id: String::new(),
            customer_id: "c".to_string(),
            name: "Name".to_string(),
            email: "name@example.com".to_string(),
            image_url: String::new(),
            date: chrono::Utc::now(),
            amount: 100,
            status: InvoiceStatus::Pending,
        };
        InvoicesPage {
            rows: (0..rows).map(|i| InvoicesTable { id: format!("inv-{i}"), ..row.clone() }).collect(),
            total_pages,
        }
    }

    #[test]
    fn paging_stays_within_bounds() {
        let mut state = InvoicesState::new();
        state.set_listing(listing(6, 2));

        assert!(!state.previous_page());
        assert!(state.next_page());
        assert_eq!(state.page(), 2);
        assert!(!state.next_page());
    }

    #[test]
    fn shrinking_listing_pulls_page_and_selection_back() {
        let mut state = InvoicesState::new();
        state.set_listing(listing(6, 3));
        state.next_page();
        state.next_page();
        state.previous();

        state.set_listing(listing(2, 2));
        assert_eq!(state.page(), 2);
        assert_eq!(state.selected_invoice_id().as_deref(), Some("inv-1"));
    }

    #[test]
    fn selection_wraps() {
        let mut state = InvoicesState::new();
        state.set_listing(listing(3, 1));

        state.previous();
        assert_eq!(state.selected_invoice_id().as_deref(), Some("inv-2"));
        state.next();
        assert_eq!(state.selected_invoice_id().as_deref(), Some("inv-0"));
    }

    #[test]
    fn listing_query_survives_ampersands() {
        assert_eq!(listing_query(&listing_params("a&page=1", 2)), Some("a&page=1"));
        assert_eq!(listing_query(&listing_params("", 1)), Some(""));
    }

    #[tokio::test]
    async fn new_search_drops_pages_of_other_queries() {
        let store = MemoryStore::new();
        store.seed(&SeedData::baseline(4).unwrap()).await.unwrap();
        let data = DashboardData::new(store);
        let mut cache = ViewCache::new();

        load_listing(&data, &mut cache, "", 1).await.unwrap();
        load_listing(&data, &mut cache, "", 2).await.unwrap();
        assert_eq!(cache.len(), 2);

        for query in ["paid", "pending", "delba", "lee"] {
            load_listing(&data, &mut cache, query, 1).await.unwrap();
        }
        assert_eq!(cache.len(), 1);
        assert!(cache.get(INVOICES_PATH, &listing_params("lee", 1)).is_some());
    }

    #[tokio::test]
    async fn listing_is_served_from_cache_until_invalidated() {
        let store = MemoryStore::new();
        store.seed(&SeedData::baseline(4).unwrap()).await.unwrap();
        let data = DashboardData::new(store.clone());
        let mut cache = ViewCache::new();

        let first = load_listing(&data, &mut cache, "", 1).await.unwrap();
        assert_eq!(first.rows.len(), 6);

        let newest = first.rows[0].id.clone();
        store.delete_invoice(&newest).await.unwrap();

        let cached = load_listing(&data, &mut cache, "", 1).await.unwrap();
        assert_eq!(cached.rows[0].id, newest);

        cache.invalidate(INVOICES_PATH);
        let fresh = load_listing(&data, &mut cache, "", 1).await.unwrap();
        assert_ne!(fresh.rows[0].id, newest);
    }
}
