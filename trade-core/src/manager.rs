//! Transaction coordinator
//!
//! Wraps one external operation ("checkout this order") in a single
//! atomic transaction: verifies both delegates are configured, loads the
//! order inside the transaction, and hands control to a caller-supplied
//! step function. Any error the step raises propagates unchanged and
//! aborts the whole transaction.

use crate::{
    balance::BalanceManager,
    config::Config,
    delegate::{PaymentDelegate, TradeDelegate},
    error::{Error, Result},
    order::OrderManager,
    payout::PayoutManager,
    stock::StockManager,
    types::Order,
};
use docstore::{DocRef, DocStore, Transaction};
use std::future::Future;
use std::sync::Arc;

/// Transaction coordinator
pub struct Manager {
    store: DocStore,
    config: Config,
    payment_delegate: Option<Arc<dyn PaymentDelegate>>,
    trade_delegate: Option<Arc<dyn TradeDelegate>>,
    balance: BalanceManager,
    orders: OrderManager,
    payouts: PayoutManager,
}

impl Manager {
    /// Create a coordinator over a store
    pub fn new(store: DocStore, config: Config) -> Self {
        Self {
            store,
            config,
            payment_delegate: None,
            trade_delegate: None,
            balance: BalanceManager::new(),
            orders: OrderManager::new(),
            payouts: PayoutManager::new(),
        }
    }

    /// Inject the payment gateway delegate
    pub fn set_payment_delegate(&mut self, delegate: Arc<dyn PaymentDelegate>) {
        self.payment_delegate = Some(delegate);
    }

    /// Inject the fulfillment delegate
    pub fn set_trade_delegate(&mut self, delegate: Arc<dyn TradeDelegate>) {
        self.trade_delegate = Some(delegate);
    }

    /// The configured payment delegate
    pub fn payment_delegate(&self) -> Result<Arc<dyn PaymentDelegate>> {
        self.payment_delegate
            .clone()
            .ok_or_else(|| Error::InvalidArgument("manager requires a payment delegate".to_string()))
    }

    /// An allocator bound to the configured fulfillment delegate
    pub fn stock_manager(&self) -> Result<StockManager> {
        let delegate = self
            .trade_delegate
            .clone()
            .ok_or_else(|| Error::InvalidArgument("manager requires a trade delegate".to_string()))?;
        Ok(StockManager::new(
            delegate,
            self.config.allocation.default_number_of_fetch,
        ))
    }

    /// The balance ledger
    pub fn balance_manager(&self) -> &BalanceManager {
        &self.balance
    }

    /// The order fan-out helper
    pub fn order_manager(&self) -> &OrderManager {
        &self.orders
    }

    /// The payout helper
    pub fn payout_manager(&self) -> &PayoutManager {
        &self.payouts
    }

    /// Run one logical operation against an order in a single atomic
    /// transaction.
    ///
    /// Fails fast with `InvalidArgument` naming the missing delegate if
    /// either is unset. The step function receives the freshly loaded
    /// order, the caller's options, and the live transaction; it may be
    /// invoked again when the substrate retries a conflicted commit.
    pub async fn run_transaction<T, O, F, Fut>(
        &self,
        order_ref: &DocRef,
        options: O,
        step: F,
    ) -> Result<T>
    where
        O: Clone,
        F: Fn(Order, O, Transaction) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.payment_delegate.is_none() {
            return Err(Error::InvalidArgument(format!(
                "order {}: manager requires a payment delegate",
                order_ref
            )));
        }
        if self.trade_delegate.is_none() {
            return Err(Error::InvalidArgument(format!(
                "order {}: manager requires a trade delegate",
                order_ref
            )));
        }

        tracing::debug!(order = %order_ref, "transaction started");
        self.store
            .run(self.config.retry_policy(), |tx| {
                let options = options.clone();
                let step = &step;
                async move {
                    let order: Order = tx.get(order_ref)?.ok_or_else(|| {
                        Error::InvalidArgument(format!("unknown order {}", order_ref))
                    })?;
                    step(order, options, tx.clone()).await
                }
            })
            .await
    }
}
