pub mod cache;
pub mod components;
pub mod customers;
pub mod invoice_form;
pub mod invoices;
pub mod overview;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::actions::{ActionOutcome, Effects, InvoiceActions, INVOICES_PATH};
use crate::data::DashboardData;
use crate::db::Store;
use crate::validation::FormData;

use self::cache::ViewCache;
use self::customers::{handle_input as handle_customers_input, render_customers, CustomerAction, CustomersState};
use self::invoice_form::{
    handle_input as handle_invoice_form_input, render_invoice_form, InvoiceFormAction, InvoiceFormState,
};
use self::invoices::{
    handle_input as handle_invoices_input, load_listing, render_invoices, InvoiceAction, InvoicesPage,
    InvoicesState,
};
use self::overview::{handle_input as handle_overview_input, load_overview, render_overview, OverviewAction, OverviewState};

pub const OVERVIEW_PATH: &str = "/dashboard";
pub const CUSTOMERS_PATH: &str = "/dashboard/customers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Invoices,
    InvoiceForm,
    Customers,
}

impl Screen {
    pub fn path(self) -> &'static str {
        match self {
            Screen::Overview => OVERVIEW_PATH,
            Screen::Invoices => INVOICES_PATH,
            Screen::InvoiceForm => "/dashboard/invoices/form",
            Screen::Customers => CUSTOMERS_PATH,
        }
    }

    /// The screen a redirect path lands on. The form is never a redirect target.
    pub fn from_path(path: &str) -> Option<Screen> {
        [Screen::Overview, Screen::Invoices, Screen::Customers]
            .into_iter()
            .find(|screen| screen.path() == path)
    }
}

/// Number keys switch between the top-level screens.
pub fn nav_key(code: KeyCode) -> Option<Screen> {
    match code {
        KeyCode::Char('1') => Some(Screen::Overview),
        KeyCode::Char('2') => Some(Screen::Invoices),
        KeyCode::Char('3') => Some(Screen::Customers),
        _ => None,
    }
}

pub fn render_help<B: Backend>(frame: &mut Frame<B>, text: &str, area: Rect) {
    let help = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, area);
}

// Main application state
pub struct App<S> {
    data: DashboardData<S>,
    actions: InvoiceActions<S>,
    screen: Screen,
    cache: ViewCache<InvoicesPage>,
    overview_state: Option<OverviewState>,
    invoices_state: InvoicesState,
    invoice_form_state: Option<InvoiceFormState>,
    customers_state: CustomersState,
}

impl<S: Store> App<S> {
    pub fn new(data: DashboardData<S>, actions: InvoiceActions<S>) -> Self {
        Self {
            data,
            actions,
            screen: Screen::Overview,
            cache: ViewCache::new(),
            overview_state: None,
            invoices_state: InvoicesState::new(),
            invoice_form_state: None,
            customers_state: CustomersState::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Drop stale renderings, then follow the redirect if there is one.
    async fn apply_effects(&mut self, effects: &Effects) -> Result<()> {
        if let Some(path) = effects.revalidate {
            let dropped = self.cache.invalidate(path);
            tracing::debug!(path, dropped, "revalidated view");
        }

        match effects.redirect.and_then(Screen::from_path) {
            Some(screen) => self.show(screen).await,
            None => self.reload_current().await,
        }
    }

    pub async fn show(&mut self, screen: Screen) -> Result<()> {
        match screen {
            Screen::Overview => {
                self.overview_state = Some(load_overview(&self.data).await?);
            }
            Screen::Invoices => {
                self.reload_invoices().await?;
            }
            Screen::InvoiceForm => {
                let customers = self.data.fetch_customers().await?;
                self.invoice_form_state = Some(InvoiceFormState::new(customers));
            }
            Screen::Customers => {
                self.reload_customers().await?;
            }
        }
        self.screen = screen;
        Ok(())
    }

    async fn reload_current(&mut self) -> Result<()> {
        match self.screen {
            Screen::Invoices => self.reload_invoices().await,
            Screen::Customers => self.reload_customers().await,
            Screen::Overview => self.show(Screen::Overview).await,
            Screen::InvoiceForm => Ok(()),
        }
    }

    /// Load the current listing page. When the page no longer exists it is
    /// clamped to the last one and that page is loaded instead.
    async fn reload_invoices(&mut self) -> Result<()> {
        loop {
            let requested = self.invoices_state.page();
            let listing =
                load_listing(&self.data, &mut self.cache, self.invoices_state.query(), requested).await?;
            self.invoices_state.set_listing(listing);

            if self.invoices_state.page() == requested {
                return Ok(());
            }
        }
    }

    async fn reload_customers(&mut self) -> Result<()> {
        let customers = self.data.fetch_filtered_customers(self.customers_state.query()).await?;
        self.customers_state.set_customers(customers);
        Ok(())
    }

    async fn edit_invoice(&mut self, id: &str) -> Result<()> {
        let (invoice, customers) =
            tokio::try_join!(self.data.fetch_invoice_by_id(id), self.data.fetch_customers())?;

        match invoice {
            Some(invoice) => {
                self.invoice_form_state = Some(InvoiceFormState::from_existing(customers, invoice));
                self.screen = Screen::InvoiceForm;
            }
            None => {
                self.invoices_state.set_message("Invoice not found.");
            }
        }
        Ok(())
    }

    async fn submit(&mut self, form: FormData) -> Result<()> {
        let Some(form_state) = &mut self.invoice_form_state else {
            return Ok(());
        };

        let outcome = match form_state.invoice_id() {
            Some(id) => self.actions.update_invoice(id, &form).await,
            None => self.actions.create_invoice(&form).await,
        };

        match outcome {
            ActionOutcome::Completed(done) => {
                self.invoice_form_state = None;
                self.apply_effects(&done.effects).await?;
            }
            ActionOutcome::Failed(result) => {
                form_state.set_result(result);
            }
        }
        Ok(())
    }

    async fn delete(&mut self, id: &str) -> Result<()> {
        match self.actions.delete_invoice(id).await {
            ActionOutcome::Completed(done) => {
                self.apply_effects(&done.effects).await?;
                if let Some(message) = done.message {
                    self.invoices_state.set_message(message);
                }
            }
            ActionOutcome::Failed(result) => {
                self.invoices_state
                    .set_message(result.message.unwrap_or_else(|| "Delete failed.".to_string()));
            }
        }
        Ok(())
    }

    fn render<B: Backend>(&mut self, frame: &mut Frame<B>) {
        match self.screen {
            Screen::Overview => {
                if let Some(state) = &self.overview_state {
                    render_overview(frame, state);
                }
            }
            Screen::Invoices => render_invoices(frame, &mut self.invoices_state),
            Screen::InvoiceForm => {
                if let Some(state) = &mut self.invoice_form_state {
                    render_invoice_form(frame, state);
                }
            }
            Screen::Customers => render_customers(frame, &mut self.customers_state),
        }
    }

    /// Handle one key press. Returns true when the user asked to quit.
    async fn handle_input(&mut self) -> Result<bool> {
        match self.screen {
            Screen::Overview => match handle_overview_input()? {
                Some(OverviewAction::Quit) => return Ok(true),
                Some(OverviewAction::Refresh) => self.show(Screen::Overview).await?,
                Some(OverviewAction::Navigate(screen)) => self.show(screen).await?,
                None => {}
            },
            Screen::Invoices => match handle_invoices_input(&mut self.invoices_state)? {
                Some(InvoiceAction::Quit) => return Ok(true),
                Some(InvoiceAction::Navigate(screen)) => self.show(screen).await?,
                Some(InvoiceAction::Reload) => self.reload_invoices().await?,
                Some(InvoiceAction::NewInvoice) => self.show(Screen::InvoiceForm).await?,
                Some(InvoiceAction::EditInvoice(id)) => self.edit_invoice(&id).await?,
                Some(InvoiceAction::DeleteInvoice(id)) => self.delete(&id).await?,
                None => {}
            },
            Screen::InvoiceForm => {
                let Some(state) = &mut self.invoice_form_state else {
                    self.screen = Screen::Invoices;
                    return Ok(false);
                };
                match handle_invoice_form_input(state)? {
                    Some(InvoiceFormAction::Cancel) => {
                        self.invoice_form_state = None;
                        self.screen = Screen::Invoices;
                    }
                    Some(InvoiceFormAction::Submit(form)) => self.submit(form).await?,
                    None => {}
                }
            }
            Screen::Customers => match handle_customers_input(&mut self.customers_state)? {
                Some(CustomerAction::Quit) => return Ok(true),
                Some(CustomerAction::Navigate(screen)) => self.show(screen).await?,
                Some(CustomerAction::Reload) => self.reload_customers().await?,
                None => {}
            },
        }

        Ok(false)
    }
}

async fn run_app<B: Backend, S: Store>(terminal: &mut Terminal<B>, app: &mut App<S>) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.handle_input().await? {
            break;
        }
    }

    Ok(())
}

/// Take over the terminal and run the dashboard until the user quits.
pub async fn run<S: Store>(data: DashboardData<S>, actions: InvoiceActions<S>) -> Result<()> {
    let mut app = App::new(data, actions);
    app.show(Screen::Overview).await?;

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "dashboard stopped");
    }

    result
}
