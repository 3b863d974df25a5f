use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "patronage")]
#[command(about = "Operator tool for the Patronage donation ledger")]
pub struct Cli {
    /// Settings file (TOML); defaults to `settings.toml` when present.
    #[arg(long, env = "PATRONAGE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Create the platform project and the budget collecting processing cuts.
    Bootstrap(BootstrapArgs),
    User(User),
    Project(Project),
    Budget(Budget),
    /// Return (creating on first use) the payment code for a split.
    Code(CodeArgs),
    Payment(Payment),
    /// Move funds between two budgets.
    Transfer(TransferArgs),
    /// Print a budget's balance.
    Balance(BalanceArgs),
    /// Print a project's balance statistics.
    Stats(StatsArgs),
    /// Find projects, budgets and payments mentioning a term.
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    #[arg(long, default_value = "Platform")]
    pub name: String,
    #[arg(long, default_value = "platform")]
    pub slug: String,
}

#[derive(Args, Debug)]
pub struct User {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
pub struct UserCreateArgs {
    #[arg(long)]
    pub nickname: String,
    #[arg(long, default_value = "")]
    pub email: String,
}

#[derive(Args, Debug)]
pub struct Project {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    Create(ProjectCreateArgs),
    /// Change the processing cut of a project.
    Cut(ProjectCutArgs),
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub slug: String,
    #[arg(long, default_value = "")]
    pub summary: String,
    #[arg(long, default_value = "")]
    pub website: String,
    /// Processing cut in percent.
    #[arg(long)]
    pub cut: Option<i64>,
    #[arg(long)]
    pub private: bool,
}

#[derive(Args, Debug)]
pub struct ProjectCutArgs {
    #[arg(long)]
    pub project: i64,
    #[arg(long)]
    pub percent: i64,
}

#[derive(Args, Debug)]
pub struct Budget {
    #[command(subcommand)]
    pub command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    Create(BudgetCreateArgs),
}

#[derive(Args, Debug)]
pub struct BudgetCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub project: Option<i64>,
    #[arg(long)]
    pub parent: Option<i64>,
    #[arg(long)]
    pub user: Option<i64>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct CodeArgs {
    /// Recipient budget id; repeat for every recipient.
    #[arg(long = "budget", required = true)]
    pub budgets: Vec<i64>,
    /// Percentage per budget, in the same order.
    #[arg(long = "ratio")]
    pub ratios: Vec<String>,
    #[arg(long)]
    pub user: Option<i64>,
}

#[derive(Args, Debug)]
pub struct Payment {
    #[command(subcommand)]
    pub command: PaymentCommand,
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommand {
    /// Record an incoming payment; it is routed right away when its code is known.
    Record(PaymentRecordArgs),
    /// Attach a code to a pending payment and route it.
    Attach(PaymentAttachArgs),
    /// List payments still waiting for a code.
    Pending,
}

#[derive(Args, Debug)]
pub struct PaymentRecordArgs {
    /// Budget the money arrives on.
    #[arg(long)]
    pub budget: i64,
    /// Amount in major units, e.g. `10.50`.
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
    #[arg(long, default_value = "")]
    pub purpose: String,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long, default_value = "manual")]
    pub source: String,
    #[arg(long, default_value = "")]
    pub remote_name: String,
    #[arg(long, default_value = "")]
    pub remote_account: String,
}

#[derive(Args, Debug)]
pub struct PaymentAttachArgs {
    #[arg(long)]
    pub payment: i64,
    #[arg(long)]
    pub code: String,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[arg(long)]
    pub from: i64,
    #[arg(long)]
    pub to: i64,
    /// Amount in major units.
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
    #[arg(long)]
    pub purpose: Option<String>,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    #[arg(long)]
    pub budget: i64,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
    /// Also print month-end balances.
    #[arg(long)]
    pub history: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[arg(long)]
    pub project: i64,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub term: String,
}
