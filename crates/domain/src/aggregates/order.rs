//! Order aggregate - a pickup-queue ticket.
//!
//! Lifecycle: `preparing` (or `overdue` once the estimate passes) → `ready`
//! → `delivered`. Closing takes the order off the public board at any point.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::DomainError;
use crate::value_objects::{OrderCode, OrderName};
use crate::{OrderId, UserId};

/// Longest preparation time accepted for a single order (24 hours).
pub const MAX_PREPARATION_MINUTES: u32 = 24 * 60;

/// Derived, time-dependent status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Preparing,
    Overdue,
    Ready,
    Delivered,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    #[serde(rename = "userId")]
    owner_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<OrderName>,
    code: OrderCode,
    created_at: DateTime<Utc>,
    est_ready_time: DateTime<Utc>,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ready_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    turn_off_sound_time: Option<DateTime<Utc>>,
}

/// Stored representation used to reconstitute an [`Order`].
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub owner_id: UserId,
    pub name: Option<OrderName>,
    pub code: OrderCode,
    pub created_at: DateTime<Utc>,
    pub est_ready_time: DateTime<Utc>,
    pub is_active: bool,
    pub ready_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub turn_off_sound_time: Option<DateTime<Utc>>,
}

impl Order {
    /// Open a new order that should be ready `preparation_minutes` from now.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the preparation time is zero or
    /// longer than a day.
    pub fn open(
        owner_id: UserId,
        name: Option<OrderName>,
        code: OrderCode,
        preparation_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if preparation_minutes == 0 || preparation_minutes > MAX_PREPARATION_MINUTES {
            return Err(DomainError::validation(format!(
                "Preparation time must be between 1 and {} minutes",
                MAX_PREPARATION_MINUTES
            )));
        }

        Ok(Self {
            id: OrderId::new(),
            owner_id,
            name,
            code,
            created_at: now,
            est_ready_time: now + Duration::minutes(i64::from(preparation_minutes)),
            is_active: true,
            ready_time: None,
            delivery_time: None,
            turn_off_sound_time: None,
        })
    }

    pub fn from_record(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            name: record.name,
            code: record.code,
            created_at: record.created_at,
            est_ready_time: record.est_ready_time,
            is_active: record.is_active,
            ready_time: record.ready_time,
            delivery_time: record.delivery_time,
            turn_off_sound_time: record.turn_off_sound_time,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> OrderId {
        self.id
    }

    #[inline]
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    #[inline]
    pub fn name(&self) -> Option<&OrderName> {
        self.name.as_ref()
    }

    #[inline]
    pub fn code(&self) -> &OrderCode {
        &self.code
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn est_ready_time(&self) -> DateTime<Utc> {
        self.est_ready_time
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn ready_time(&self) -> Option<DateTime<Utc>> {
        self.ready_time
    }

    #[inline]
    pub fn delivery_time(&self) -> Option<DateTime<Utc>> {
        self.delivery_time
    }

    #[inline]
    pub fn turn_off_sound_time(&self) -> Option<DateTime<Utc>> {
        self.turn_off_sound_time
    }

    pub fn is_ready(&self) -> bool {
        self.ready_time.is_some()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn status(&self, now: DateTime<Utc>) -> OrderStatus {
        if !self.is_active {
            OrderStatus::Closed
        } else if self.delivery_time.is_some() {
            OrderStatus::Delivered
        } else if self.is_ready() {
            OrderStatus::Ready
        } else if now >= self.est_ready_time {
            OrderStatus::Overdue
        } else {
            OrderStatus::Preparing
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn close(&mut self) {
        self.is_active = false;
    }

    /// Mark the order ready for pickup. The first ready time is kept.
    pub fn mark_ready(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::invalid_state_transition(
                "Closed orders cannot be marked as ready",
            ));
        }
        if self.ready_time.is_none() {
            self.ready_time = Some(now);
        }
        Ok(())
    }

    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::invalid_state_transition(
                "Closed orders cannot be delivered",
            ));
        }
        if !self.is_ready() {
            return Err(DomainError::invalid_state_transition(
                "Order must be ready before it is delivered",
            ));
        }
        if self.delivery_time.is_none() {
            self.delivery_time = Some(now);
        }
        Ok(())
    }

    /// Silence the ready chime on the customer screen. Returns `false` when
    /// it was already silenced.
    pub fn turn_off_sound(&mut self, now: DateTime<Utc>) -> bool {
        if self.turn_off_sound_time.is_some() {
            return false;
        }
        self.turn_off_sound_time = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    fn order(minutes: u32) -> Order {
        Order::open(
            UserId::new(),
            None,
            OrderCode::parse("AB3").unwrap(),
            minutes,
            now(),
        )
        .unwrap()
    }

    #[test]
    fn estimate_is_now_plus_minutes() {
        let o = order(15);
        assert_eq!(o.est_ready_time(), now() + Duration::minutes(15));
        assert!(o.is_active());
        assert!(!o.is_ready());
    }

    #[test]
    fn zero_or_excessive_minutes_rejected() {
        let code = OrderCode::parse("AB3").unwrap();
        assert!(Order::open(UserId::new(), None, code.clone(), 0, now()).is_err());
        assert!(Order::open(UserId::new(), None, code, MAX_PREPARATION_MINUTES + 1, now()).is_err());
    }

    #[test]
    fn status_follows_lifecycle() {
        let mut o = order(10);
        assert_eq!(o.status(now()), OrderStatus::Preparing);
        assert_eq!(o.status(now() + Duration::minutes(10)), OrderStatus::Overdue);

        o.mark_ready(now() + Duration::minutes(8)).unwrap();
        assert_eq!(o.status(now() + Duration::minutes(20)), OrderStatus::Ready);

        o.mark_delivered(now() + Duration::minutes(12)).unwrap();
        assert_eq!(o.status(now()), OrderStatus::Delivered);

        o.close();
        assert_eq!(o.status(now()), OrderStatus::Closed);
    }

    #[test]
    fn first_ready_time_is_kept() {
        let mut o = order(10);
        let first = now() + Duration::minutes(3);
        o.mark_ready(first).unwrap();
        o.mark_ready(first + Duration::minutes(1)).unwrap();
        assert_eq!(o.ready_time(), Some(first));
    }

    #[test]
    fn delivery_requires_ready() {
        let mut o = order(10);
        let err = o.mark_delivered(now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn closed_order_cannot_become_ready() {
        let mut o = order(10);
        o.close();
        assert!(o.mark_ready(now()).is_err());
    }

    #[test]
    fn sound_is_turned_off_once() {
        let mut o = order(10);
        assert!(o.turn_off_sound(now()));
        assert!(!o.turn_off_sound(now() + Duration::seconds(5)));
        assert_eq!(o.turn_off_sound_time(), Some(now()));
    }

    #[test]
    fn serializes_wire_fields() {
        let o = order(5);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["code"], "AB3");
        assert_eq!(json["isActive"], true);
        assert!(json.get("readyTime").is_none());
        assert!(json.get("estReadyTime").is_some());
    }
}
