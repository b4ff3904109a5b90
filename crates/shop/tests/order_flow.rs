//! End-to-end order lifecycle tests against the in-memory stores.

use std::sync::Arc;

use catalog::{InMemoryPartStore, Part, PartStore};
use common::{Money, PartId, SessionId, UserId};
use shop::{
    Identity, InMemoryOrderStore, InMemorySessionStore, OrderStatus, PasswordHasher, ShopError,
    ShopService, ValidationError,
};

struct MarkerHasher;

impl PasswordHasher for MarkerHasher {
    fn hash(&self, raw: &str) -> String {
        format!("hashed:{raw}")
    }

    fn verify(&self, raw: &str, hash: &str) -> bool {
        hash == format!("hashed:{raw}")
    }
}

type TestService = ShopService<InMemoryPartStore, InMemoryOrderStore, InMemorySessionStore>;

async fn setup() -> (TestService, InMemoryPartStore, InMemoryOrderStore) {
    let parts = InMemoryPartStore::with_parts([
        Part::new("HL-01", "LED headlight", Some(Money::new(120_000)), 5),
        Part::new("BP-02", "Front bumper", None, 4),
        Part::new("MR-03", "Side mirror", Some(Money::new(35_000)), 2),
    ])
    .await;
    let orders = InMemoryOrderStore::new();
    let sessions = InMemorySessionStore::new();
    let service = ShopService::new(
        parts.clone(),
        orders.clone(),
        sessions,
        Arc::new(MarkerHasher),
    );
    (service, parts, orders)
}

fn member() -> Identity {
    Identity::Member(UserId::new())
}

fn guest(name: &str, password: &str) -> Identity {
    Identity::Guest {
        name: name.to_string(),
        phone: "010-1234-5678".to_string(),
        email: "guest@example.com".to_string(),
        password: password.to_string(),
    }
}

fn headlight() -> PartId {
    PartId::new("HL-01")
}

#[tokio::test]
async fn confirm_cancel_reconfirm_moves_stock_exactly_once_each_way() {
    let (service, parts, _) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 3, false);
    let order = service.checkout_cart(&mut cart, member(), "").await.unwrap();

    // Creation never touches stock.
    assert_eq!(order.status(), OrderStatus::Requested);
    assert_eq!(parts.stock_of(&headlight()).await, Some(5));

    let order = service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert!(order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(2));

    // Saving the same status again moves nothing.
    let order = service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(parts.stock_of(&headlight()).await, Some(2));

    let order = service
        .transition_status(order.id(), OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(!order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(5));

    // Re-confirming a cancelled order deducts again.
    let order = service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert!(order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(2));
}

#[tokio::test]
async fn cancelling_an_unconfirmed_order_leaves_stock_alone() {
    let (service, parts, _) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 2, false);
    let order = service.checkout_cart(&mut cart, member(), "").await.unwrap();

    let order = service
        .transition_status(order.id(), OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Cancelled);
    assert!(!order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(5));
}

#[tokio::test]
async fn delivery_keeps_the_deduction_in_place() {
    let (service, parts, _) = setup().await;

    let order = service
        .buy_now(&headlight(), 2, member(), "")
        .await
        .unwrap();
    service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    let order = service
        .transition_status(order.id(), OrderStatus::Delivered)
        .await
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Delivered);
    assert!(order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(3));
}

#[tokio::test]
async fn pulling_a_confirmed_order_back_to_requested_restores_stock() {
    let (service, parts, _) = setup().await;

    let order = service
        .buy_now(&headlight(), 4, member(), "")
        .await
        .unwrap();
    service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(parts.stock_of(&headlight()).await, Some(1));

    let order = service
        .transition_status(order.id(), OrderStatus::Requested)
        .await
        .unwrap();
    assert_eq!(order.status(), OrderStatus::Requested);
    assert!(!order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(5));
}

#[tokio::test]
async fn oversold_confirmation_clamps_stock_at_zero() {
    let (service, parts, _) = setup().await;

    // Two orders for the same part go in while stock still covers each
    // individually; confirming both oversells.
    let first = service.buy_now(&headlight(), 4, member(), "").await.unwrap();
    let second = service.buy_now(&headlight(), 4, member(), "").await.unwrap();

    service
        .transition_status(first.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(parts.stock_of(&headlight()).await, Some(1));

    service
        .transition_status(second.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(parts.stock_of(&headlight()).await, Some(0));
}

#[tokio::test]
async fn checkout_refuses_inquiry_only_and_oversized_lines() {
    let (service, _, orders) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&PartId::new("BP-02"), 1, false);
    let result = service.checkout_cart(&mut cart, member(), "").await;
    assert!(matches!(
        result,
        Err(ShopError::Validation(ValidationError::InquiryOnlyItem { .. }))
    ));
    // The cart survives a refused checkout.
    assert_eq!(cart.quantity(&PartId::new("BP-02")), Some(1));

    let mut cart = service.load_cart(SessionId::new("s2")).await.unwrap();
    cart.add(&PartId::new("MR-03"), 5, false);
    let result = service.checkout_cart(&mut cart, member(), "").await;
    assert!(matches!(
        result,
        Err(ShopError::Validation(ValidationError::InsufficientStock {
            requested: 5,
            available: 2,
            ..
        }))
    ));

    assert_eq!(orders.order_count().await, 0);
}

#[tokio::test]
async fn checkout_revalidates_against_the_live_catalog() {
    let (service, parts, _) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 3, false);

    // Stock drops between browsing and submitting.
    parts
        .put(Part::new("HL-01", "LED headlight", Some(Money::new(120_000)), 1))
        .await
        .unwrap();

    let result = service.checkout_cart(&mut cart, member(), "").await;
    assert!(matches!(
        result,
        Err(ShopError::Validation(ValidationError::InsufficientStock {
            requested: 3,
            available: 1,
            ..
        }))
    ));
}

#[tokio::test]
async fn failed_insert_leaves_no_order_and_keeps_the_cart() {
    let (service, _, orders) = setup().await;
    orders.set_fail_after_items(Some(1)).await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 1, false);
    cart.add(&PartId::new("MR-03"), 1, false);

    let result = service.checkout_cart(&mut cart, member(), "").await;
    assert!(matches!(result, Err(ShopError::OrderStore(_))));
    assert_eq!(orders.order_count().await, 0);
    assert_eq!(cart.len(), 2);
}

#[tokio::test]
async fn checkout_snapshot_survives_later_catalog_changes() {
    let (service, parts, _) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 2, false);
    let order = service.checkout_cart(&mut cart, member(), "").await.unwrap();
    assert_eq!(order.total(), Money::new(240_000));

    // Reprice and delete the part; the stored order is untouched.
    parts
        .put(Part::new("HL-01", "LED headlight v2", Some(Money::new(999)), 5))
        .await
        .unwrap();
    parts.delete(&headlight()).await;

    let stored = service.get_order(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.total(), Money::new(240_000));
    assert_eq!(stored.items()[0].title, "LED headlight");
}

#[tokio::test]
async fn confirming_after_part_deletion_skips_the_missing_line() {
    let (service, parts, _) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 2, false);
    cart.add(&PartId::new("MR-03"), 1, false);
    let order = service.checkout_cart(&mut cart, member(), "").await.unwrap();

    parts.delete(&headlight()).await;

    let order = service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert!(order.stock_applied());
    assert_eq!(parts.stock_of(&PartId::new("MR-03")).await, Some(1));
}

#[tokio::test]
async fn direct_apply_and_transition_do_not_double_deduct() {
    let (service, parts, _) = setup().await;

    let order = service
        .buy_now(&headlight(), 2, member(), "")
        .await
        .unwrap();

    // A bulk admin action applies stock without changing status first.
    let order = service.apply_stock(order.id()).await.unwrap();
    assert!(order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(3));

    // The regular confirmation afterwards sees the guard and moves nothing.
    service
        .transition_status(order.id(), OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(parts.stock_of(&headlight()).await, Some(3));

    service
        .transition_status(order.id(), OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(parts.stock_of(&headlight()).await, Some(5));

    // Direct unapply after the restore is a no-op too.
    let order = service.unapply_stock(order.id()).await.unwrap();
    assert!(!order.stock_applied());
    assert_eq!(parts.stock_of(&headlight()).await, Some(5));
}

#[tokio::test]
async fn guest_flow_from_checkout_to_lookup() {
    let (service, _, _) = setup().await;

    let mut cart = service.load_cart(SessionId::new("s1")).await.unwrap();
    cart.add(&headlight(), 1, false);
    let order = service
        .checkout_cart(&mut cart, guest("Park", "hunter2"), "call before delivery")
        .await
        .unwrap();

    let found = service
        .guest_lookup("Park", "hunter2")
        .await
        .unwrap()
        .expect("guest order should be found");
    assert_eq!(found.id(), order.id());
    assert_eq!(found.memo(), "call before delivery");

    assert!(service.guest_lookup("Park", "wrong").await.unwrap().is_none());
    assert!(service.guest_lookup("Lee", "hunter2").await.unwrap().is_none());
}

#[tokio::test]
async fn guest_lookup_distinguishes_same_name_by_password() {
    let (service, _, _) = setup().await;

    let first = service
        .buy_now(&headlight(), 1, guest("Park", "alpha"), "")
        .await
        .unwrap();
    let second = service
        .buy_now(&headlight(), 1, guest("Park", "bravo"), "")
        .await
        .unwrap();

    let found_first = service.guest_lookup("Park", "alpha").await.unwrap().unwrap();
    assert_eq!(found_first.id(), first.id());

    let found_second = service.guest_lookup("Park", "bravo").await.unwrap().unwrap();
    assert_eq!(found_second.id(), second.id());
}

#[tokio::test]
async fn carts_are_scoped_per_session() {
    let (service, _, _) = setup().await;

    let mut cart_a = service.load_cart(SessionId::new("a")).await.unwrap();
    cart_a.add(&headlight(), 2, false);
    service.save_cart(&mut cart_a).await.unwrap();

    let cart_b = service.load_cart(SessionId::new("b")).await.unwrap();
    assert!(cart_b.is_empty());

    let reloaded = service.load_cart(SessionId::new("a")).await.unwrap();
    assert_eq!(reloaded.quantity(&headlight()), Some(2));
}
