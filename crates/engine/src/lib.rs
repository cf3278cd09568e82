//! Ledger engine for nidhi, a community savings group service.
//!
//! The engine owns the loan lifecycle state machine, the per-group cash
//! fund, and the audit trail. Every lifecycle operation runs inside a single
//! database transaction: the loan mutation, the fund movement and the audit
//! entry either all commit or none of them do.

pub use audit_log::AuditEntry;
pub use deposits::Deposit;
pub use error::EngineError;
pub use loans::{Loan, LoanStatus};
pub use members::{Gender, Member};
pub use money::Amount;
pub use ops::{Engine, EngineBuilder, OVERDUE_AFTER_DAYS};
pub use processing::EntityKind;
pub use users::Role;

pub mod audit_log;
pub mod deposits;
mod error;
pub mod group_funds;
pub mod groups;
pub mod loans;
pub mod members;
mod money;
mod ops;
pub mod processing;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
