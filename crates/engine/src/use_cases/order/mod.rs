//! Pickup-order queue.
//!
//! Owners manage their orders; customers look them up by code or id
//! without signing in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use grupa_domain::{
    DomainError, Order, OrderCode, OrderId, OrderName, OrderStatus, UserId,
    MAX_PREPARATION_MINUTES,
};
use serde::Serialize;

use crate::infrastructure::ports::{pick_index, ClockPort, OrderRepo, RandomPort, RepoError};

/// Attempts at drawing a code that no active order uses.
const MAX_CODE_ATTEMPTS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),
    #[error("Only the owner can change this order")]
    Forbidden,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<DomainError> for OrderError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidStateTransition(msg) | DomainError::Constraint(msg) => {
                Self::Conflict(msg)
            }
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// An order with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub is_ready: bool,
    pub status: OrderStatus,
}

impl OrderView {
    fn new(order: Order, now: DateTime<Utc>) -> Self {
        Self {
            is_ready: order.is_ready(),
            status: order.status(now),
            order,
        }
    }
}

pub struct OrderUseCases {
    orders: Arc<dyn OrderRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl OrderUseCases {
    pub fn new(
        orders: Arc<dyn OrderRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            orders,
            clock,
            random,
        }
    }

    /// The caller's orders, newest first.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<OrderView>, OrderError> {
        let now = self.clock.now();
        Ok(self
            .orders
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|order| OrderView::new(order, now))
            .collect())
    }

    pub async fn create(
        &self,
        user_id: UserId,
        time_in_minutes: i64,
        name: Option<String>,
    ) -> Result<OrderView, OrderError> {
        let minutes = u32::try_from(time_in_minutes)
            .ok()
            .filter(|m| (1..=MAX_PREPARATION_MINUTES).contains(m))
            .ok_or_else(|| {
                OrderError::InvalidInput(format!(
                    "Preparation time must be between 1 and {} minutes",
                    MAX_PREPARATION_MINUTES
                ))
            })?;
        let name = OrderName::optional(name)?;
        let now = self.clock.now();

        // The store enforces one active order per code, so a racing create
        // that takes the same code surfaces as a constraint violation.
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = OrderCode::generate(pick_index(self.random.as_ref()));
            if self.orders.find_active_by_code(&code).await?.is_some() {
                tracing::debug!(code = %code, "Order code in use, drawing another");
                continue;
            }

            let order = Order::open(user_id, name.clone(), code, minutes, now)?;
            match self.orders.save(&order).await {
                Ok(()) => {
                    tracing::info!(order_id = %order.id(), code = %order.code(), "Order created");
                    return Ok(OrderView::new(order, now));
                }
                Err(RepoError::ConstraintViolation(msg)) => {
                    tracing::debug!(
                        code = %order.code(),
                        error = %msg,
                        "Order code taken concurrently"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!("No free order code after {} attempts", MAX_CODE_ATTEMPTS);
        Err(OrderError::Conflict(
            "Could not allocate an order code, try again".to_string(),
        ))
    }

    /// Active order with this code. Malformed codes match nothing.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<OrderView>, OrderError> {
        let Ok(code) = OrderCode::parse(code) else {
            return Ok(None);
        };
        let now = self.clock.now();
        Ok(self
            .orders
            .find_active_by_code(&code)
            .await?
            .map(|order| OrderView::new(order, now)))
    }

    /// The order if it is still active.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<OrderView>, OrderError> {
        let now = self.clock.now();
        Ok(self
            .orders
            .get(id)
            .await?
            .filter(Order::is_active)
            .map(|order| OrderView::new(order, now)))
    }

    pub async fn close(&self, user_id: UserId, id: OrderId) -> Result<OrderView, OrderError> {
        let mut order = self.load_owned(user_id, id).await?;
        order.close();
        self.store(order).await
    }

    pub async fn mark_ready(&self, user_id: UserId, id: OrderId) -> Result<OrderView, OrderError> {
        let mut order = self.load_owned(user_id, id).await?;
        order.mark_ready(self.clock.now())?;
        self.store(order).await
    }

    pub async fn mark_delivered(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<OrderView, OrderError> {
        let mut order = self.load_owned(user_id, id).await?;
        order.mark_delivered(self.clock.now())?;
        self.store(order).await
    }

    /// Silence the ready chime. Anyone holding the order id may do this.
    pub async fn turn_off_sound(&self, id: OrderId) -> Result<OrderView, OrderError> {
        let mut order = self.load(id).await?;
        if order.turn_off_sound(self.clock.now()) {
            self.orders.save(&order).await?;
        }
        Ok(OrderView::new(order, self.clock.now()))
    }

    async fn store(&self, order: Order) -> Result<OrderView, OrderError> {
        self.orders.save(&order).await?;
        Ok(OrderView::new(order, self.clock.now()))
    }

    async fn load(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders.get(id).await?.ok_or(OrderError::NotFound(id))
    }

    async fn load_owned(&self, user_id: UserId, id: OrderId) -> Result<Order, OrderError> {
        let order = self.load(id).await?;
        if !order.is_owned_by(user_id) {
            tracing::debug!(order_id = %id, user_id = %user_id, "Caller does not own order");
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }
}
