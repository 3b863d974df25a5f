//! Command structs for engine operations.
//!
//! These types group parameters for write operations (project/budget setup,
//! transfers, payment recording), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};

use crate::Currency;

/// Create a project together with its root budget.
#[derive(Clone, Debug)]
pub struct NewProjectCmd {
    pub name: String,
    pub slug: String,
    pub summary: String,
    pub website: String,
    /// Falls back to [`DEFAULT_PROCESSING_CUT`](crate::DEFAULT_PROCESSING_CUT).
    pub processing_cut: Option<i64>,
    pub private: bool,
    pub private_balance: bool,
}

impl NewProjectCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            summary: String::new(),
            website: String::new(),
            processing_cut: None,
            private: false,
            private_balance: true,
        }
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = website.into();
        self
    }

    #[must_use]
    pub fn processing_cut(mut self, percent: i64) -> Self {
        self.processing_cut = Some(percent);
        self
    }

    #[must_use]
    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}

/// Create a budget, optionally nested under a parent.
#[derive(Clone, Debug)]
pub struct NewBudgetCmd {
    pub name: String,
    pub project_id: Option<i64>,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    pub private: bool,
    pub private_balance: bool,
}

impl NewBudgetCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: None,
            user_id: None,
            parent_id: None,
            description: None,
            private: false,
            private_balance: true,
        }
    }

    #[must_use]
    pub fn project_id(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn parent_id(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Move funds between two budgets.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_budget_id: i64,
    pub to_budget_id: i64,
    pub amount: i64,
    pub purpose: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_budget_id: i64,
        to_budget_id: i64,
        amount: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from_budget_id,
            to_budget_id,
            amount,
            purpose: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// Record an incoming payment reported by an external source.
#[derive(Clone, Debug)]
pub struct RecordPaymentCmd {
    pub budget_id: i64,
    pub amount: i64,
    pub currency: Currency,
    pub purpose: String,
    /// Explicit code token; when absent the purpose is searched for one.
    pub code: Option<String>,
    pub remote_account: String,
    pub remote_name: String,
    pub remote_transaction_id: String,
    pub remote_bank_id: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl RecordPaymentCmd {
    #[must_use]
    pub fn new(
        budget_id: i64,
        amount: i64,
        currency: Currency,
        source: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            budget_id,
            amount,
            currency,
            purpose: String::new(),
            code: None,
            remote_account: String::new(),
            remote_name: String::new(),
            remote_transaction_id: String::new(),
            remote_bank_id: String::new(),
            source: source.into(),
            created_at,
        }
    }

    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn remote(mut self, name: impl Into<String>, account: impl Into<String>) -> Self {
        self.remote_name = name.into();
        self.remote_account = account.into();
        self
    }

    #[must_use]
    pub fn remote_ids(
        mut self,
        transaction_id: impl Into<String>,
        bank_id: impl Into<String>,
    ) -> Self {
        self.remote_transaction_id = transaction_id.into();
        self.remote_bank_id = bank_id.into();
        self
    }
}
