use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Status of a loan, as serialized over the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Disbursed,
    Repaid,
    Rejected,
}

pub mod loan {
    use super::*;

    /// Request body for a loan application.
    ///
    /// The borrowing member is the authenticated user's linked member; it is
    /// never taken from the payload.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanApply {
        /// Requested principal in minor units (paise).
        pub amount_minor: i64,
        pub purpose: Option<String>,
    }

    /// Request body for a repayment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RepaymentNew {
        pub amount_minor: i64,
    }

    /// A loan as returned by every lifecycle and query endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanView {
        pub id: String,
        pub member_id: String,
        pub amount_minor: i64,
        pub remaining_minor: i64,
        pub status: LoanStatus,
        pub purpose: Option<String>,
        pub application_date: NaiveDate,
        pub approval_date: Option<NaiveDate>,
        pub disbursement_date: Option<NaiveDate>,
        pub repayment_date: Option<NaiveDate>,
    }

    /// Response body for loan listings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoansResponse {
        pub loans: Vec<LoanView>,
    }
}

pub mod audit {
    use super::*;

    /// One audit trail entry.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuditEntryView {
        pub status: LoanStatus,
        pub actor: String,
        pub timestamp: DateTime<Utc>,
        pub note: String,
    }

    /// Response body for `GET /loans/{id}/history`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub loan_id: String,
        pub entries: Vec<AuditEntryView>,
    }
}

pub mod fund {
    use super::*;

    /// Current balance of a group's fund.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundView {
        pub group_id: String,
        pub balance_minor: i64,
    }
}

pub mod deposit {
    use super::*;

    /// Request body for recording a savings deposit.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount_minor: i64,
        pub deposit_type: String,
    }

    /// A recorded deposit.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositView {
        pub id: String,
        pub member_id: String,
        pub amount_minor: i64,
        pub deposit_type: String,
        pub deposit_date: NaiveDate,
    }
}

pub mod member {
    use super::*;

    /// A member, as listed by the overdue-borrowers report.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: String,
        pub name: String,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub group_id: String,
    }

    /// Response body for member listings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}
