//! Donation routing ledger.
//!
//! Money enters through [`Payment`]s, each carrying (or resolving) a payment
//! [`Code`] that names recipient budgets and their percentages. Processing a
//! payment splits its amount with the largest remainder method, keeps each
//! recipient project's processing cut on the platform budget and records every
//! movement as a pair of append-only [`Transaction`] legs.
//!
//! All persistent state goes through [`Engine`].

pub use allocator::{MAX_PERCENT, allocate, split_processing_cut};
pub use budgets::Budget;
pub use cache::{CacheKey, EntityCache, MemoryCache, NoCache};
pub use codes::{Code, canonicalize, parse_ratios};
pub use commands::{NewBudgetCmd, NewProjectCmd, RecordPaymentCmd, TransferCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, SearchResults, Statistics};
pub use payments::Payment;
pub use projects::{DEFAULT_PROCESSING_CUT, Project};
pub use transactions::Transaction;
pub use users::User;

mod allocator;
mod budgets;
mod cache;
mod codes;
mod commands;
mod currency;
mod error;
mod money;
mod ops;
mod payments;
mod projects;
pub mod tokens;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
