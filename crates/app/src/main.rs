use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use engine::{
    Currency, Engine, MemoryCache, Money, NewBudgetCmd, NewProjectCmd, RecordPaymentCmd,
    TransferCmd, parse_ratios,
};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod cli;
mod settings;

use cli::{BudgetCommand, Cli, Command, PaymentCommand, ProjectCommand, UserCommand};

type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "patronage={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect(&settings.database).await?;
    if let Command::Migrate = cli.command {
        Migrator::up(&db, None).await?;
        tracing::info!("schema up to date");
        return Ok(());
    }

    let mut builder = Engine::builder()
        .database(db)
        .cache(Arc::new(MemoryCache::new()));
    // Bootstrapping creates the platform budget, so it cannot require one.
    if !matches!(cli.command, Command::Bootstrap(_)) {
        if let Some(token) = settings.ledger.platform_budget.as_deref() {
            builder = builder.platform_budget(token);
        }
    }
    let engine = builder.build().await?;

    run(&engine, cli.command).await
}

async fn connect(config: &Database) -> AppResult<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    let database = sea_orm::Database::connect(url).await?;
    if let Database::Memory = config {
        Migrator::up(&database, None).await?;
    }
    Ok(database)
}

fn parse_currency(raw: &str) -> AppResult<Currency> {
    Ok(Currency::try_from(raw.trim().to_ascii_uppercase().as_str())?)
}

async fn run(engine: &Engine, command: Command) -> AppResult<()> {
    match command {
        Command::Migrate => {}
        Command::Bootstrap(args) => {
            let budget = engine.bootstrap_platform(&args.name, &args.slug).await?;
            println!("platform budget {} (id {})", budget.token, budget.id);
            println!("set ledger.platform_budget = \"{}\" in settings", budget.token);
        }
        Command::User(user) => match user.command {
            UserCommand::Create(args) => {
                let user = engine.new_user(&args.nickname, &args.email).await?;
                println!("user {} (id {})", user.nickname, user.id);
            }
        },
        Command::Project(project) => match project.command {
            ProjectCommand::Create(args) => {
                let mut cmd = NewProjectCmd::new(args.name, args.slug)
                    .summary(args.summary)
                    .website(args.website)
                    .private(args.private);
                if let Some(cut) = args.cut {
                    cmd = cmd.processing_cut(cut);
                }
                let project = engine.new_project(cmd).await?;
                let root = engine.root_budgets(project.id).await?;
                println!("project {} (id {})", project.slug, project.id);
                for budget in root {
                    let code = engine.code_for_budget(budget.id, None).await?;
                    println!("  budget {} (id {}) code {}", budget.name, budget.id, code.token);
                }
            }
            ProjectCommand::Cut(args) => {
                let project = engine.set_processing_cut(args.project, args.percent).await?;
                println!("project {} cut {}%", project.slug, project.processing_cut);
            }
        },
        Command::Budget(budget) => match budget.command {
            BudgetCommand::Create(args) => {
                let mut cmd = NewBudgetCmd::new(args.name);
                if let Some(project_id) = args.project {
                    cmd = cmd.project_id(project_id);
                }
                if let Some(parent_id) = args.parent {
                    cmd = cmd.parent_id(parent_id);
                }
                if let Some(user_id) = args.user {
                    cmd = cmd.user_id(user_id);
                }
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let budget = engine.new_budget(cmd).await?;
                println!("budget {} (id {}) token {}", budget.name, budget.id, budget.token);
            }
        },
        Command::Code(args) => {
            let ratios = parse_ratios(&args.ratios)?;
            let code = engine.code_for(&args.budgets, &ratios, args.user).await?;
            println!("{}", code.token);
        }
        Command::Payment(payment) => match payment.command {
            PaymentCommand::Record(args) => {
                let currency = parse_currency(&args.currency)?;
                let amount = Money::parse(&args.amount, currency)?;
                let mut cmd = RecordPaymentCmd::new(
                    args.budget,
                    amount.minor(),
                    currency,
                    args.source,
                    Utc::now(),
                )
                .purpose(args.purpose)
                .remote(args.remote_name, args.remote_account);
                if let Some(code) = args.code {
                    cmd = cmd.code(code);
                }
                let payment = engine.record_payment(cmd).await?;
                print_payment(&payment);
            }
            PaymentCommand::Attach(args) => {
                let payment = engine.attach_code(args.payment, &args.code).await?;
                print_payment(&payment);
            }
            PaymentCommand::Pending => {
                for payment in engine.pending_payments().await? {
                    print_payment(&payment);
                }
            }
        },
        Command::Transfer(args) => {
            let currency = parse_currency(&args.currency)?;
            let amount = Money::parse(&args.amount, currency)?;
            let mut cmd = TransferCmd::new(args.from, args.to, amount.minor(), Utc::now());
            if let Some(purpose) = args.purpose {
                cmd = cmd.purpose(purpose);
            }
            let (credit, debit) = engine.transfer(cmd).await?;
            println!(
                "moved {} from budget {} to budget {}",
                Money::new(credit.amount, currency),
                debit.budget_id,
                credit.budget_id
            );
        }
        Command::Balance(args) => {
            let currency = parse_currency(&args.currency)?;
            let balance = engine.balance(args.budget).await?;
            println!("{}", Money::new(balance, currency));
            if args.history {
                for (months_ago, value) in engine
                    .balance_history(args.budget, Utc::now())
                    .await?
                    .into_iter()
                    .enumerate()
                {
                    println!("  -{months_ago}m {}", Money::new(value, currency));
                }
            }
        }
        Command::Stats(args) => {
            let currency = parse_currency(&args.currency)?;
            let stats = engine.project_statistics(args.project, Utc::now()).await?;
            println!("balance        {}", Money::new(stats.balance, currency));
            println!("monthly change {}", Money::new(stats.monthly_change, currency));
            for (months_ago, value) in stats.month_end_balances.iter().enumerate() {
                println!("  -{months_ago}m {}", Money::new(*value, currency));
            }
        }
        Command::Search(args) => {
            let found = engine.search(&args.term).await?;
            for project in &found.projects {
                println!("project {} (id {}) {}", project.slug, project.id, project.name);
            }
            for budget in &found.budgets {
                println!("budget {} (id {}) token {}", budget.name, budget.id, budget.token);
            }
            for payment in &found.payments {
                print_payment(payment);
            }
        }
    }
    Ok(())
}

fn print_payment(payment: &engine::Payment) {
    let state = if payment.pending { "pending" } else { "settled" };
    println!(
        "payment {} {} {} code {}",
        payment.id,
        Money::new(payment.amount, payment.currency),
        state,
        payment.code.as_deref().unwrap_or("-")
    );
}
