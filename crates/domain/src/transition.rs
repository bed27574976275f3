//! The order state machine: validated status transitions over the store.

use chrono::Utc;
use common::OrderId;
use store::{Order, OrderStatus, OrderStore, StatusHistoryEntry, StoreError};

use crate::error::DomainError;

/// Who requested a transition. Recorded on the audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A named operator acting from the panel.
    Staff(String),

    /// An inline-button press on one of the message channels.
    Channel,

    /// Customer-facing automation with no named operator.
    System,
}

impl Actor {
    /// The name written to the history row; `None` means automated.
    fn name(&self) -> Option<String> {
        match self {
            Actor::Staff(name) => Some(name.clone()),
            Actor::Channel | Actor::System => None,
        }
    }

    fn note(&self) -> &'static str {
        match self {
            Actor::Staff(_) => "updated from the operator panel",
            Actor::Channel => "updated via channel action",
            Actor::System => "updated automatically",
        }
    }
}

/// Applies validated status transitions.
///
/// Shared by both entry surfaces so there is exactly one transition table
/// and one write path. Each successful transition commits status, the
/// matching timestamp and the audit row as one atomic store update.
pub struct TransitionService<S> {
    store: S,
}

impl<S: OrderStore> TransitionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Moves an order to `requested` on behalf of `actor`.
    ///
    /// Fails with [`DomainError::NotFound`] for unknown ids and
    /// [`DomainError::InvalidTransition`] when `requested` is not reachable
    /// from the current status under the order's service mode — including
    /// re-requests of an already-applied transition. When a concurrent
    /// writer wins the race, the rejection is computed against the
    /// now-current state, never silently overwritten.
    #[tracing::instrument(skip(self), fields(status = %requested))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        requested: OrderStatus,
        actor: Actor,
    ) -> Result<Order, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::NotFound(order_id))?;

        if !order.status.can_transition_to(requested, order.service_mode) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: requested,
                mode: order.service_mode,
            });
        }

        let now = Utc::now();
        let mut updated = order.clone();
        updated.status = requested;
        updated.stamp(requested, now);

        let history = StatusHistoryEntry {
            order_id,
            old_status: Some(order.status),
            new_status: requested,
            actor: actor.name(),
            note: actor.note().to_string(),
            changed_at: now,
        };

        match self.store.update_order(&updated, order.version, history).await {
            Ok(committed) => {
                metrics::counter!("order_transitions_total").increment(1);
                tracing::info!(
                    order = committed.number,
                    from = %order.status,
                    to = %requested,
                    "order status changed"
                );
                Ok(committed)
            }
            Err(StoreError::VersionConflict { .. }) => {
                let current = self
                    .store
                    .get_order(order_id)
                    .await?
                    .ok_or(DomainError::NotFound(order_id))?;
                Err(DomainError::InvalidTransition {
                    from: current.status,
                    to: requested,
                    mode: current.service_mode,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
