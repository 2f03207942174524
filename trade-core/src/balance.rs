//! Balance ledger
//!
//! Records monetary movements as immutable balance transactions and keeps
//! each account's running available balance in step. Every operation
//! writes the record to the canonical log and to every participating real
//! account's own log in the same transaction; pseudo-accounts
//! ([`Party::Platform`], [`Party::Bank`]) keep no log and no balance here.
//!
//! Account loads happen before any write of an operation, per the
//! substrate's reads-before-writes contract; operations that touch no
//! balance (charge, refund) load nothing at all.

use crate::{
    error::{Error, Result},
    paths,
    types::{Account, BalanceKind, BalanceTransaction, Currency, Party, TransactionResult},
};
use chrono::Utc;
use docstore::Transaction;
use serde_json::json;
use uuid::Uuid;

/// Balance ledger
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceManager;

impl BalanceManager {
    /// Create a ledger
    pub fn new() -> Self {
        Self
    }

    /// Buyer pays the platform for an order.
    ///
    /// Writes the record only; no real account's balance moves (the
    /// platform's own funds are tracked outside this ledger).
    pub fn charge(
        &self,
        buyer: &str,
        order_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        let entry = new_entry(
            BalanceKind::Payment,
            currency,
            amount,
            Party::Account(buyer.to_string()),
            Party::Platform,
            Some(order_id),
            result,
        )?;
        self.append(&entry, tx)?;
        Ok(entry)
    }

    /// Platform pays the buyer back for an order.
    pub fn refund(
        &self,
        buyer: &str,
        order_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        let entry = new_entry(
            BalanceKind::PaymentRefund,
            currency,
            amount,
            Party::Platform,
            Party::Account(buyer.to_string()),
            Some(order_id),
            result,
        )?;
        self.append(&entry, tx)?;
        Ok(entry)
    }

    /// Move funds between two parties.
    ///
    /// When one side is the platform pseudo-account, only the real side's
    /// balance moves. Between two real accounts both balances move by the
    /// same amount in the same transaction, so the pair is atomic and
    /// symmetric.
    pub fn transfer(
        &self,
        from: Party,
        to: Party,
        order_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        self.move_funds(BalanceKind::Transfer, from, to, order_id, currency, amount, result, tx)
    }

    /// Reverse a transfer.
    ///
    /// Same loading and mutation shape as [`transfer`](Self::transfer);
    /// callers pass the reversed direction, so the account that had
    /// gained loses and vice versa.
    pub fn transfer_refund(
        &self,
        from: Party,
        to: Party,
        order_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        self.move_funds(
            BalanceKind::TransferRefund,
            from,
            to,
            order_id,
            currency,
            amount,
            result,
            tx,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn move_funds(
        &self,
        kind: BalanceKind,
        from: Party,
        to: Party,
        order_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        let entry = new_entry(kind, currency, amount, from, to, Some(order_id), result)?;

        match (&entry.from, &entry.to) {
            (Party::Account(sender), Party::Account(receiver)) => {
                // Both loads precede every write.
                let sender_account = self.load_account(sender, tx)?;
                let receiver_account = self.load_account(receiver, tx)?;
                self.append(&entry, tx)?;
                self.adjust(sender, &sender_account, currency, -amount, tx)?;
                self.adjust(receiver, &receiver_account, currency, amount, tx)?;
            }
            (_, Party::Account(receiver)) => {
                let receiver_account = self.load_account(receiver, tx)?;
                self.append(&entry, tx)?;
                self.adjust(receiver, &receiver_account, currency, amount, tx)?;
            }
            (Party::Account(sender), _) => {
                let sender_account = self.load_account(sender, tx)?;
                self.append(&entry, tx)?;
                self.adjust(sender, &sender_account, currency, -amount, tx)?;
            }
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "{:?} between pseudo-accounts {} and {}",
                    kind, entry.from, entry.to
                )));
            }
        }

        tracing::info!(
            kind = ?kind,
            from = %entry.from,
            to = %entry.to,
            %currency,
            amount,
            "funds moved"
        );
        Ok(entry)
    }

    /// Withdraw funds from an account towards the bank.
    pub fn payout(
        &self,
        account_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        let account = self.load_account(account_id, tx)?;
        let entry = new_entry(
            BalanceKind::Payout,
            currency,
            amount,
            Party::Account(account_id.to_string()),
            Party::Bank,
            None,
            result,
        )?;
        self.append(&entry, tx)?;
        self.adjust(account_id, &account, currency, -amount, tx)?;

        tracing::info!(account = %account_id, %currency, amount, "payout recorded");
        Ok(entry)
    }

    /// Return previously withdrawn funds to an account.
    pub fn payout_cancel(
        &self,
        account_id: &str,
        currency: Currency,
        amount: i64,
        result: TransactionResult,
        tx: &Transaction,
    ) -> Result<BalanceTransaction> {
        let account = self.load_account(account_id, tx)?;
        let entry = new_entry(
            BalanceKind::PayoutCancel,
            currency,
            amount,
            Party::Bank,
            Party::Account(account_id.to_string()),
            None,
            result,
        )?;
        self.append(&entry, tx)?;
        self.adjust(account_id, &account, currency, amount, tx)?;

        tracing::info!(account = %account_id, %currency, amount, "payout cancelled");
        Ok(entry)
    }

    /// Fan out one record to the canonical log and every participating
    /// real account's own log; never partial.
    fn append(&self, entry: &BalanceTransaction, tx: &Transaction) -> Result<()> {
        tx.set(&paths::balance_transaction(&entry.id), entry)?;
        for party in [&entry.from, &entry.to] {
            if let Some(id) = party.account_id() {
                tx.set(&paths::account_balance_transaction(id, &entry.id), entry)?;
            }
        }
        Ok(())
    }

    /// An account document, defaulted if never written before.
    fn load_account(&self, id: &str, tx: &Transaction) -> Result<Account> {
        Ok(tx.get(&paths::account(id))?.unwrap_or_default())
    }

    /// Patch one account's available balance for one currency.
    fn adjust(
        &self,
        id: &str,
        account: &Account,
        currency: Currency,
        delta: i64,
        tx: &Transaction,
    ) -> Result<()> {
        let updated = account.balance.available_for(currency) + delta;
        tx.merge(
            &paths::account(id),
            json!({"balance": {"available": {currency.code(): updated}}}),
        )?;
        Ok(())
    }
}

fn new_entry(
    kind: BalanceKind,
    currency: Currency,
    amount: i64,
    from: Party,
    to: Party,
    order_id: Option<&str>,
    result: TransactionResult,
) -> Result<BalanceTransaction> {
    if amount < 0 {
        return Err(Error::InvalidArgument(format!(
            "{:?} amount must be non-negative, got {}",
            kind, amount
        )));
    }
    let mut transaction_results = Vec::new();
    if !result.is_null() {
        transaction_results.push(result);
    }
    Ok(BalanceTransaction {
        id: Uuid::now_v7().to_string(),
        kind,
        currency,
        amount,
        from,
        to,
        order: order_id.map(str::to_string),
        transfer: None,
        payout: None,
        transaction_results,
        created_at: Utc::now(),
    })
}
