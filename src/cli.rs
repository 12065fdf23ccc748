use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use crate::actions::{ActionOutcome, InvoiceActions};
use crate::auth;
use crate::config::Config;
use crate::data::DashboardData;
use crate::db::Store;
use crate::format::{format_currency, format_date_to_local};
use crate::seed;
use crate::validation::FormData;

/// bcrypt cost for the throwaway users of the in-memory demo store
pub const DEMO_BCRYPT_COST: u32 = 6;

/// Customers, invoices and revenue at a glance.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use a seeded in-process store instead of PostgreSQL
    #[arg(long, global = true)]
    pub in_memory: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the terminal dashboard (the default)
    Dashboard,
    /// Apply database migrations
    Migrate,
    /// Populate the database with baseline rows
    Seed,
    /// Show the overview cards
    Cards,
    /// Show monthly revenue
    Revenue,
    /// Show the five newest invoices
    Latest,
    /// Search invoices one page at a time
    Invoices(SearchArgs),
    /// Show one invoice as the edit form loads it
    Invoice { id: String },
    /// Create an invoice
    Create(InvoiceArgs),
    /// Update an invoice
    Update {
        id: String,
        #[command(flatten)]
        fields: InvoiceArgs,
    },
    /// Delete an invoice
    Delete { id: String },
    /// List customers with their invoice totals
    Customers {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Check a user's email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    #[arg(short, long, default_value = "")]
    pub query: String,
    #[arg(short, long, default_value_t = 1)]
    pub page: i64,
}

/// Raw form fields, validated by the action rather than by clap.
#[derive(Args)]
pub struct InvoiceArgs {
    #[arg(long)]
    pub customer_id: Option<String>,
    #[arg(long)]
    pub amount: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

impl InvoiceArgs {
    fn to_form(&self) -> FormData {
        let mut form = FormData::new();
        let fields = [
            ("customerId", &self.customer_id),
            ("amount", &self.amount),
            ("status", &self.status),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                form.insert(key, value.as_str());
            }
        }
        form
    }
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn report(outcome: ActionOutcome) -> Result<()> {
    match outcome {
        ActionOutcome::Completed(done) => {
            println!("{}", done.message.unwrap_or("Saved."));
            println!("invoice: {}", done.invoice_id);
            Ok(())
        }
        ActionOutcome::Failed(state) => {
            for (field, messages) in &state.errors {
                for message in messages {
                    eprintln!("{field}: {message}");
                }
            }
            bail!(state.message.unwrap_or_else(|| "Request failed.".to_string()))
        }
    }
}

/// Run a one-shot command against `store`.
pub async fn execute<S: Store>(store: S, config: &Config, command: Commands) -> Result<()> {
    let data = DashboardData::with_config(store.clone(), config);
    let actions = InvoiceActions::new(store.clone());

    match command {
        Commands::Dashboard => bail!("the dashboard is started from main"),
        Commands::Migrate => {
            tracing::warn!("the in-memory store has no schema to migrate");
        }
        Commands::Seed => {
            seed::run(&store, DEMO_BCRYPT_COST).await?;
        }
        Commands::Cards => {
            let cards = data.fetch_card_data().await?;
            let mut t = table(vec!["Collected", "Pending", "Total Invoices", "Total Customers"]);
            t.add_row(vec![
                cards.total_paid_invoices,
                cards.total_pending_invoices,
                cards.number_of_invoices.to_string(),
                cards.number_of_customers.to_string(),
            ]);
            println!("{t}");
        }
        Commands::Revenue => {
            let mut t = table(vec!["Month", "Revenue"]);
            for r in data.fetch_revenue().await? {
                t.add_row(vec![r.month, format_currency(i64::from(r.revenue) * 100)]);
            }
            println!("{t}");
        }
        Commands::Latest => {
            let mut t = table(vec!["Name", "Email", "Amount"]);
            for inv in data.fetch_latest_invoices().await? {
                t.add_row(vec![inv.name, inv.email, inv.amount]);
            }
            println!("{t}");
        }
        Commands::Invoices(args) => {
            let pages = data.fetch_invoices_pages(&args.query).await?;
            let mut t = table(vec!["Id", "Customer", "Email", "Amount", "Date", "Status"]);
            for inv in data.fetch_filtered_invoices(&args.query, args.page).await? {
                t.add_row(vec![
                    inv.id,
                    inv.name,
                    inv.email,
                    format_currency(i64::from(inv.amount)),
                    format_date_to_local(&inv.date),
                    inv.status.to_string(),
                ]);
            }
            println!("{t}");
            println!("page {} of {}", args.page.max(1), pages);
        }
        Commands::Invoice { id } => match data.fetch_invoice_by_id(&id).await? {
            Some(inv) => {
                let mut t = table(vec!["Id", "Customer", "Amount", "Status"]);
                t.add_row(vec![inv.id, inv.customer_id, format!("{:.2}", inv.amount), inv.status.to_string()]);
                println!("{t}");
            }
            None => bail!("invoice {id} not found"),
        },
        Commands::Create(fields) => report(actions.create_invoice(&fields.to_form()).await)?,
        Commands::Update { id, fields } => {
            report(actions.update_invoice(&id, &fields.to_form()).await)?
        }
        Commands::Delete { id } => report(actions.delete_invoice(&id).await)?,
        Commands::Customers { query } => {
            let mut t = table(vec!["Name", "Email", "Invoices", "Pending", "Paid"]);
            for c in data.fetch_filtered_customers(&query).await? {
                t.add_row(vec![c.name, c.email, c.total_invoices.to_string(), c.total_pending, c.total_paid]);
            }
            println!("{t}");
        }
        Commands::Login { email, password } => match auth::authenticate(&data, &email, &password).await? {
            Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
            None => bail!("Invalid credentials."),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["invoice_dashboard", "--in-memory"]).unwrap();
        assert!(cli.in_memory);
        assert!(cli.command.is_none());
    }

    #[test]
    fn invoice_fields_become_form_data() {
        let cli = Cli::try_parse_from([
            "invoice_dashboard",
            "create",
            "--customer-id",
            "cust-1",
            "--amount",
            "49.99",
        ])
        .unwrap();

        let Some(Commands::Create(fields)) = cli.command else {
            panic!("expected create");
        };
        let form = fields.to_form();
        assert_eq!(form.get("customerId"), Some("cust-1"));
        assert_eq!(form.get("amount"), Some("49.99"));
        assert_eq!(form.get("status"), None);
    }

    #[test]
    fn search_page_defaults_to_one() {
        let cli = Cli::try_parse_from(["invoice_dashboard", "invoices", "-q", "paid"]).unwrap();

        let Some(Commands::Invoices(args)) = cli.command else {
            panic!("expected invoices");
        };
        assert_eq!(args.query, "paid");
        assert_eq!(args.page, 1);
    }
}
