//! bank-dashboard - terminal front end
//!
//! ```text
//! ┌──────────┐    ┌─────────────┐    ┌───────────┐    ┌────────────┐
//! │  Config  │───▶│ SessionCore │───▶│ Dashboard │───▶│ Transfer   │
//! │  (YAML)  │    │ (token file)│    │ (accounts)│    │ Workflow   │
//! └──────────┘    └─────────────┘    └───────────┘    └────────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use bank_dashboard::config::AppConfig;
use bank_dashboard::credentials::{CredentialStore, FileCredentialStore};
use bank_dashboard::dashboard::{Dashboard, Gate};
use bank_dashboard::format::{format_account_number, format_currency, format_date};
use bank_dashboard::login::{LoginFlow, LoginForm};
use bank_dashboard::logging::init_logging;
use bank_dashboard::models::{AccountId, User};
use bank_dashboard::navigation::{TerminalNavigator, entry_route};
use bank_dashboard::session::SessionCore;
use bank_dashboard::transfer::TransferOutcome;
use bank_dashboard::{BankApi, HttpBankApi};

#[derive(Parser)]
#[command(name = "bank-dashboard", version, about, long_about = None)]
struct Cli {
    /// Config environment; reads config/<env>.yaml
    #[arg(long, default_value = "dev", global = true)]
    env: String,

    /// Override the API server URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exchange credentials for a token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Show who is logged in
    Status,
    /// List accounts and balances
    Accounts,
    /// Show transaction history for an account
    Transactions {
        /// Defaults to the first account
        #[arg(long)]
        account: Option<AccountId>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },
    /// Move money between two of your accounts
    Transfer {
        #[arg(long)]
        from: AccountId,
        #[arg(long)]
        to: AccountId,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        description: String,
    },
}

/// Wiring shared by every command
struct App {
    store: Arc<FileCredentialStore>,
    api: Arc<dyn BankApi>,
    navigator: Arc<TerminalNavigator>,
    session: Arc<SessionCore>,
}

impl App {
    fn new(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(FileCredentialStore::new(&config.credentials.path));
        let api: Arc<dyn BankApi> = Arc::new(
            HttpBankApi::new(&config.api.base_url, config.api_timeout(), store.clone())
                .context("Failed to build API client")?,
        );
        let navigator = Arc::new(TerminalNavigator::new());
        let session = Arc::new(SessionCore::new(store.clone(), api.clone(), navigator.clone()));
        Ok(Self {
            store,
            api,
            navigator,
            session,
        })
    }

    /// Resolve the session and load the dashboard, or fail when anonymous
    async fn dashboard(&self) -> Result<(Dashboard, User)> {
        self.session.initialize().await;
        let dashboard = Dashboard::new(
            self.api.clone(),
            self.navigator.clone(),
            self.session.clone(),
        );
        let user = match dashboard.gate(&self.session.state()) {
            Gate::Proceed(user) => user,
            Gate::Wait | Gate::Redirected => {
                bail!("Not logged in. Run `bank-dashboard login` first.")
            }
        };
        dashboard.load(&user).await;
        if let Some(banner) = dashboard.view().error {
            bail!(banner);
        }
        Ok((dashboard, user))
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let app = App::new(&config)?;

    match cli.command {
        Command::Login { email, password } => {
            let flow = LoginFlow::new(app.api.clone());
            let user = flow
                .submit(&LoginForm::new(email, password), &app.session)
                .await?;
            println!("Logged in as {} <{}>", user.full_name(), user.email);
        }
        Command::Logout => {
            app.session.logout();
            println!("Logged out");
        }
        Command::Status => {
            let store: &dyn CredentialStore = &*app.store;
            println!("Entry route: {}", entry_route(Some(store)));
            app.session.initialize().await;
            match app.session.user() {
                Some(user) => println!(
                    "Logged in as {} <{}> ({})",
                    user.full_name(),
                    user.email,
                    app.session.phase()
                ),
                None => println!("Not logged in ({})", app.session.phase()),
            }
        }
        Command::Accounts => {
            let (dashboard, user) = app.dashboard().await?;
            let view = dashboard.view();
            println!("Accounts for {}", user.full_name());
            for account in &view.accounts {
                println!(
                    "  #{:<4} {:<18} {:<16} {:>16}",
                    account.id,
                    account.account_type.label(),
                    format_account_number(&account.account_number),
                    format_currency(account.balance)
                );
            }
        }
        Command::Transactions {
            account,
            page,
            page_size,
        } => {
            let (dashboard, _user) = app.dashboard().await?;
            if let Some(id) = account {
                dashboard.select_account(id).await;
            }
            let view = dashboard.view();
            let Some(selected) = view.selected_account() else {
                bail!("No such account");
            };
            println!(
                "{} {} (page {} of {})",
                selected.account_type.label(),
                format_account_number(&selected.account_number),
                page,
                dashboard.transaction_pages(page_size).max(1)
            );
            for tx in dashboard.transactions_page(page, page_size) {
                println!(
                    "  {:<26} {:<10} {}{:>14}  {}",
                    format_date(&tx.transaction_date),
                    tx.kind.as_str(),
                    tx.direction().sign(),
                    format_currency(tx.amount),
                    tx.description
                );
            }
        }
        Command::Transfer {
            from,
            to,
            amount,
            description,
        } => {
            let (dashboard, _user) = app.dashboard().await?;
            let Some(workflow) = dashboard.open_transfer() else {
                bail!("Transfers need at least two accounts");
            };
            workflow.select_source(from);
            workflow.select_destination(to);
            workflow.set_amount(amount);
            workflow.set_description(description);
            info!(max = %workflow.max_amount(), "Available in source account");

            match dashboard.submit_transfer(&workflow).await {
                TransferOutcome::Completed => {
                    println!("Transfer successful");
                    for account in &dashboard.view().accounts {
                        println!(
                            "  #{:<4} {:>16}",
                            account.id,
                            format_currency(account.balance)
                        );
                    }
                }
                TransferOutcome::Invalid(errors) => {
                    for (field, message) in errors.iter() {
                        eprintln!("  {}: {}", field, message);
                    }
                    bail!("Transfer rejected");
                }
                TransferOutcome::Failed(message) => bail!(message),
                TransferOutcome::Busy => bail!("A transfer is already in progress"),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.env)
        .with_context(|| format!("Failed to load config for env '{}'", cli.env))?;
    config.apply_api_url(cli.api_url.clone());

    let _guard = init_logging(&config);
    info!(env = %cli.env, api = %config.api.base_url, "Starting bank-dashboard");

    run(cli, config).await
}
