//! Savings deposit recording.

use chrono::Utc;
use sea_orm::{TransactionTrait, prelude::*};

use crate::{Amount, Deposit, EntityKind, ResultEngine, deposits};

use super::{Engine, with_tx};

impl Engine {
    /// Record a savings deposit and credit the member's group fund in the
    /// same transaction, then leave an unprocessed marker for the external
    /// impact-tagging batch.
    pub async fn record_deposit(
        &self,
        member_id: &str,
        amount: Amount,
        deposit_type: &str,
        actor: &str,
    ) -> ResultEngine<Deposit> {
        with_tx!(self, |db_tx| {
            self.require_actor(&db_tx, actor).await?;
            let member = self.require_member(&db_tx, member_id).await?;

            let deposit = Deposit::new(member_id, amount, deposit_type, Utc::now().date_naive())?;
            deposits::ActiveModel::from(&deposit).insert(&db_tx).await?;

            self.credit_fund(&db_tx, &member.group_id, amount).await?;
            self.track_unprocessed(&db_tx, EntityKind::Deposit, &deposit.id)
                .await?;

            Ok(deposit)
        })
    }
}
