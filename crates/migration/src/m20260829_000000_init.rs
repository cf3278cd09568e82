//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: authentication and the actor identity (role, member link)
//! - `groups`: savings groups
//! - `members`: group members
//! - `group_funds`: one cash-pool row per group, balance never negative
//! - `loans`: loan records with lifecycle status and dates
//! - `loan_audit_log`: append-only lifecycle transitions
//! - `saving_deposits`: recorded deposits feeding the group fund
//! - `processing_status`: unprocessed markers for the impact-tagging batch

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
    Role,
    MemberId,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    Name,
    Phone,
    Email,
    Gender,
    GroupId,
}

#[derive(Iden)]
enum GroupFunds {
    Table,
    GroupId,
    BalanceMinor,
}

#[derive(Iden)]
enum Loans {
    Table,
    Id,
    MemberId,
    AmountMinor,
    RemainingMinor,
    Status,
    Purpose,
    ApplicationDate,
    ApprovalDate,
    DisbursementDate,
    RepaymentDate,
}

#[derive(Iden)]
enum LoanAuditLog {
    Table,
    Id,
    LoanId,
    Status,
    Actor,
    Timestamp,
    Note,
}

#[derive(Iden)]
enum SavingDeposits {
    Table,
    Id,
    MemberId,
    AmountMinor,
    DepositType,
    DepositDate,
}

#[derive(Iden)]
enum ProcessingStatus {
    Table,
    EntityType,
    ReferenceId,
    Processed,
    ProcessedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Groups::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::Name).string().not_null())
                    .col(ColumnDef::new(Members::Phone).string())
                    .col(ColumnDef::new(Members::Email).string())
                    .col(ColumnDef::new(Members::Gender).string().not_null())
                    .col(ColumnDef::new(Members::GroupId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-members-group_id")
                            .from(Members::Table, Members::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-group_id")
                    .table(Members::Table)
                    .col(Members::GroupId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .col(ColumnDef::new(Users::MemberId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-member_id")
                            .from(Users::Table, Users::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Group funds
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupFunds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupFunds::GroupId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupFunds::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_funds-group_id")
                            .from(GroupFunds::Table, GroupFunds::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Loans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Loans::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Loans::MemberId).string().not_null())
                    .col(
                        ColumnDef::new(Loans::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Loans::RemainingMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Loans::Status).string().not_null())
                    .col(ColumnDef::new(Loans::Purpose).string())
                    .col(ColumnDef::new(Loans::ApplicationDate).date().not_null())
                    .col(ColumnDef::new(Loans::ApprovalDate).date())
                    .col(ColumnDef::new(Loans::DisbursementDate).date())
                    .col(ColumnDef::new(Loans::RepaymentDate).date())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-member_id")
                            .from(Loans::Table, Loans::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-member_id")
                    .table(Loans::Table)
                    .col(Loans::MemberId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-status-disbursement_date")
                    .table(Loans::Table)
                    .col(Loans::Status)
                    .col(Loans::DisbursementDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Loan audit log
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LoanAuditLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanAuditLog::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoanAuditLog::LoanId).string().not_null())
                    .col(ColumnDef::new(LoanAuditLog::Status).string().not_null())
                    .col(ColumnDef::new(LoanAuditLog::Actor).string().not_null())
                    .col(
                        ColumnDef::new(LoanAuditLog::Timestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LoanAuditLog::Note).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loan_audit_log-loan_id")
                            .from(LoanAuditLog::Table, LoanAuditLog::LoanId)
                            .to(Loans::Table, Loans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loan_audit_log-loan_id-timestamp")
                    .table(LoanAuditLog::Table)
                    .col(LoanAuditLog::LoanId)
                    .col(LoanAuditLog::Timestamp)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Saving deposits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SavingDeposits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavingDeposits::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SavingDeposits::MemberId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingDeposits::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingDeposits::DepositType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavingDeposits::DepositDate)
                            .date()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-saving_deposits-member_id")
                            .from(SavingDeposits::Table, SavingDeposits::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-saving_deposits-member_id")
                    .table(SavingDeposits::Table)
                    .col(SavingDeposits::MemberId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Processing status
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ProcessingStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcessingStatus::EntityType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProcessingStatus::ReferenceId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProcessingStatus::Processed)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProcessingStatus::ProcessedAt).timestamp())
                    .primary_key(
                        Index::create()
                            .col(ProcessingStatus::EntityType)
                            .col(ProcessingStatus::ReferenceId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProcessingStatus::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingDeposits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoanAuditLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupFunds::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        Ok(())
    }
}
