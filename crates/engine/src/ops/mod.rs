use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, DatabaseTransaction, prelude::*};

use crate::{EntityKind, LoanStatus, ResultEngine, audit_log, processing};

mod access;
mod deposits;
mod fund;
mod loans;
mod queries;

/// Days after disbursement before a still-unpaid loan counts as overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 90;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Owns nothing but the database handle; all state lives in storage and
/// every public operation is one transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Append one audit entry for a committed-to transition.
    ///
    /// Called inside the same transaction as the transition itself, so a
    /// failed operation never leaves an entry behind.
    async fn append_audit(
        &self,
        db_tx: &DatabaseTransaction,
        loan_id: &str,
        status: LoanStatus,
        actor: &str,
        note: String,
    ) -> ResultEngine<()> {
        let entry = audit_log::ActiveModel {
            id: ActiveValue::NotSet,
            loan_id: ActiveValue::Set(loan_id.to_string()),
            status: ActiveValue::Set(status.as_str().to_string()),
            actor: ActiveValue::Set(actor.to_string()),
            timestamp: ActiveValue::Set(Utc::now()),
            note: ActiveValue::Set(note),
        };
        entry.insert(db_tx).await?;
        Ok(())
    }

    /// Create the unprocessed marker consumed by the impact-tagging batch.
    async fn track_unprocessed(
        &self,
        db_tx: &DatabaseTransaction,
        kind: EntityKind,
        reference_id: &str,
    ) -> ResultEngine<()> {
        let row = processing::ActiveModel {
            entity_type: ActiveValue::Set(kind.as_str().to_string()),
            reference_id: ActiveValue::Set(reference_id.to_string()),
            processed: ActiveValue::Set(false),
            processed_at: ActiveValue::Set(None),
        };
        row.insert(db_tx).await?;
        Ok(())
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
