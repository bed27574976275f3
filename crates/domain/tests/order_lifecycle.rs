//! Integration tests for the order state machine over the in-memory store.

use common::{ChatId, Money};
use domain::{Actor, TransitionService};
use store::{
    InMemoryOrderStore, NewOrder, NewOrderItem, Order, OrderStatus, OrderStore, PaymentMethod,
    ServiceMode,
};

async fn seed_order(store: &InMemoryOrderStore, mode: ServiceMode) -> Order {
    store
        .create_order(NewOrder {
            customer_chat: ChatId::new(42),
            customer_name: "Lifecycle Customer".to_string(),
            customer_phone: "+998901234567".to_string(),
            service_mode: mode,
            payment_method: PaymentMethod::Cash,
            subtotal: Money::new(40_000),
            delivery_fee: Money::zero(),
            total: Money::new(40_000),
            address: None,
            location: None,
            items: vec![NewOrderItem::new("Plov", 2, Money::new(20_000))],
            note: "placed via lifecycle test".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn full_delivery_lifecycle() {
    let store = InMemoryOrderStore::new();
    let service = TransitionService::new(store.clone());
    let order = seed_order(&store, ServiceMode::Delivery).await;

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Ready,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
    ] {
        service
            .transition(order.id, status, Actor::Channel)
            .await
            .unwrap();
    }

    let finished = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(finished.status, OrderStatus::Delivered);
    assert!(finished.status.is_terminal());
    assert!(finished.confirmed_at.is_some());
    assert!(finished.ready_at.is_some());
    assert!(finished.delivered_at.is_some());
    // A delivery order never gets a pickup timestamp.
    assert!(finished.picked_up_at.is_none());

    let history = store.history(order.id).await.unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].old_status, None);
    assert_eq!(history[4].new_status, OrderStatus::Delivered);
    // The audit trail is totally ordered.
    for pair in history.windows(2) {
        assert!(pair[0].changed_at <= pair[1].changed_at);
        assert_eq!(Some(pair[0].new_status), pair[1].old_status);
    }
}

#[tokio::test]
async fn full_pickup_lifecycle() {
    let store = InMemoryOrderStore::new();
    let service = TransitionService::new(store.clone());
    let order = seed_order(&store, ServiceMode::Pickup).await;

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Ready,
        OrderStatus::PickedUp,
    ] {
        service
            .transition(order.id, status, Actor::Staff("chef".into()))
            .await
            .unwrap();
    }

    let finished = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(finished.status, OrderStatus::PickedUp);
    assert!(finished.picked_up_at.is_some());
    assert!(finished.delivered_at.is_none());
}

#[tokio::test]
async fn cancel_is_reachable_from_every_non_terminal_state() {
    for mode in [ServiceMode::Delivery, ServiceMode::Pickup] {
        let steps: &[OrderStatus] = match mode {
            ServiceMode::Delivery => &[
                OrderStatus::Confirmed,
                OrderStatus::Ready,
                OrderStatus::Enroute,
            ],
            ServiceMode::Pickup => &[OrderStatus::Confirmed, OrderStatus::Ready],
        };

        // Cancel after each prefix of the happy path.
        for prefix in 0..=steps.len() {
            let store = InMemoryOrderStore::new();
            let service = TransitionService::new(store.clone());
            let order = seed_order(&store, mode).await;

            for status in &steps[..prefix] {
                service
                    .transition(order.id, *status, Actor::Channel)
                    .await
                    .unwrap();
            }

            let cancelled = service
                .transition(order.id, OrderStatus::Cancelled, Actor::Channel)
                .await
                .unwrap();
            assert_eq!(cancelled.status, OrderStatus::Cancelled);
        }
    }
}

#[tokio::test]
async fn terminal_states_accept_nothing() {
    let store = InMemoryOrderStore::new();
    let service = TransitionService::new(store.clone());
    let order = seed_order(&store, ServiceMode::Pickup).await;

    service
        .transition(order.id, OrderStatus::Cancelled, Actor::Channel)
        .await
        .unwrap();

    for status in [
        OrderStatus::New,
        OrderStatus::Confirmed,
        OrderStatus::Ready,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
        OrderStatus::PickedUp,
        OrderStatus::Cancelled,
    ] {
        let result = service.transition(order.id, status, Actor::Channel).await;
        assert!(
            matches!(result, Err(domain::DomainError::InvalidTransition { .. })),
            "cancelled order accepted {status}"
        );
    }
}

#[tokio::test]
async fn racing_transitions_have_one_winner() {
    let store = InMemoryOrderStore::new();
    let order = seed_order(&store, ServiceMode::Pickup).await;

    // Two services race the same confirm from the same starting version.
    let a = TransitionService::new(store.clone());
    let b = TransitionService::new(store.clone());

    let (first, second) = tokio::join!(
        a.transition(order.id, OrderStatus::Confirmed, Actor::Channel),
        b.transition(order.id, OrderStatus::Cancelled, Actor::Channel),
    );

    // Exactly one of the two may fail; the store never loses an update.
    let winners = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert!(winners >= 1);

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    let history = store.history(order.id).await.unwrap();
    // Creation row plus one row per committed transition.
    assert_eq!(history.len(), 1 + winners);
    assert_eq!(history.last().unwrap().new_status, stored.status);
}
