use pretty_assertions::assert_eq;

use super::*;
use crate::models::{Category, Product, ProductVariant, Sale, SaleItem, Unit};

const T1: i64 = 1_700_000_000_000;
const T2: i64 = 1_700_000_360_000;

fn unit(id: i64, abbreviation: &str) -> Unit {
    Unit {
        id,
        name: format!("Unit {id}"),
        abbreviation: abbreviation.to_string(),
    }
}

fn category(id: i64, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: format!("Category {id}"),
        parent_id,
    }
}

fn product(id: i64, name: &str, updated_at: Option<i64>) -> Product {
    Product {
        id,
        label: format!("P-{id:04}"),
        name: name.to_string(),
        description: None,
        category_id: 1,
        unit_id: 1,
        price_cents: 1999,
        cost_cents: 1200,
        stock_on_hand: 10,
        active: true,
        updated_at,
    }
}

fn variant(id: i64, product_id: i64, updated_at: Option<i64>) -> ProductVariant {
    ProductVariant {
        id,
        product_id,
        color: Some("red".to_string()),
        size: Some("M".to_string()),
        price_cents: 2499,
        cost_cents: 1500,
        stock: 4,
        label: None,
        active: true,
        created_at: Some(T1),
        updated_at,
    }
}

fn sale(id: i64) -> Sale {
    Sale {
        id,
        customer_name: Some("Walk-in".to_string()),
        sold_at: T1,
        payment_method: "cash".to_string(),
        total_cents: 5997,
    }
}

fn item(id: i64, sale_id: i64, product_id: i64) -> SaleItem {
    SaleItem {
        id,
        sale_id,
        product_id,
        variant_id: None,
        quantity: 1,
        unit_price_cents: 1999,
        product_name: Some(format!("Product {product_id}")),
    }
}

const fn call(op: StoreOp, kind: Option<EntityKind>, id: Option<i64>) -> StoreCall {
    StoreCall { op, kind, id }
}

fn stores() -> (MemoryStore, MemoryStore) {
    (MemoryStore::new(Side::Cloud), MemoryStore::new(Side::Local))
}

/// One record of every kind on the cloud side, sale #42 with two items
fn seeded_cloud() -> MemoryStore {
    let cloud = MemoryStore::new(Side::Cloud);
    cloud.seed([unit(1, "kg")]);
    cloud.seed([category(1, None)]);
    cloud.seed([product(1, "Coffee", Some(T1))]);
    cloud.seed([variant(1, 1, Some(T1))]);
    cloud.seed([sale(42)]);
    cloud.seed_sale_items([item(7, 42, 1), item(8, 42, 1)]);
    cloud
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pull_touches_destination_in_dependency_order() {
    let cloud = seeded_cloud();
    let local = MemoryStore::new(Side::Local);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;
    assert!(result.success());

    let unit_kind = Some(EntityKind::Unit);
    let category_kind = Some(EntityKind::Category);
    let product_kind = Some(EntityKind::Product);
    let variant_kind = Some(EntityKind::ProductVariant);
    let sale_kind = Some(EntityKind::Sale);
    assert_eq!(
        service.local().journal(),
        vec![
            call(StoreOp::Connect, None, None),
            call(StoreOp::Begin, None, None),
            call(StoreOp::FindAll, unit_kind, None),
            call(StoreOp::Insert, unit_kind, Some(1)),
            call(StoreOp::Commit, None, None),
            call(StoreOp::Begin, None, None),
            call(StoreOp::FindAll, category_kind, None),
            call(StoreOp::Insert, category_kind, Some(1)),
            call(StoreOp::Commit, None, None),
            call(StoreOp::Begin, None, None),
            call(StoreOp::FindAll, product_kind, None),
            call(StoreOp::Insert, product_kind, Some(1)),
            call(StoreOp::Commit, None, None),
            call(StoreOp::Begin, None, None),
            call(StoreOp::FindAll, variant_kind, None),
            call(StoreOp::Insert, variant_kind, Some(1)),
            call(StoreOp::Commit, None, None),
            call(StoreOp::Begin, None, None),
            call(StoreOp::FindAll, sale_kind, None),
            call(StoreOp::Insert, sale_kind, Some(42)),
            call(StoreOp::InsertItem, sale_kind, Some(42)),
            call(StoreOp::InsertItem, sale_kind, Some(42)),
            call(StoreOp::Commit, None, None),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pull_into_empty_local_inserts_everything() {
    let service = SyncService::new(seeded_cloud(), MemoryStore::new(Side::Local));

    let result = service.sync_from_cloud().await;

    assert!(result.success());
    assert_eq!(result.message(), "Sync completed");
    assert_eq!(result.errors(), &[] as &[String]);
    let stats = result.stats();
    for kind in [
        EntityKind::Unit,
        EntityKind::Category,
        EntityKind::Product,
        EntityKind::ProductVariant,
        EntityKind::Sale,
    ] {
        assert_eq!(stats.inserted(kind), 1, "{kind}");
        assert_eq!(stats.updated(kind), 0, "{kind}");
    }
    assert_eq!(stats.counts(EntityKind::Customer), EntityCounts::default());
    assert_eq!(stats.total_operations(), 5);
    assert_eq!(
        service.local().records::<Product>(),
        service.cloud().records::<Product>()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_source_is_a_successful_no_op() {
    let (cloud, local) = stores();
    local.seed([unit(1, "kg")]);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert!(result.success());
    assert!(!result.has_errors());
    assert_eq!(result.stats().total_operations(), 0);
    assert_eq!(service.local().records::<Unit>(), vec![unit(1, "kg")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_product_failure_is_isolated() {
    let cloud = seeded_cloud();
    cloud.fail(StoreOp::FindAll, EntityKind::Product);
    let service = SyncService::new(cloud, MemoryStore::new(Side::Local));

    let result = service.sync_from_cloud().await;

    assert!(result.success());
    assert_eq!(result.errors().len(), 1);
    assert!(
        result.errors()[0].starts_with("failed to sync products: "),
        "{:?}",
        result.errors()
    );
    let stats = result.stats();
    assert_eq!(stats.inserted(EntityKind::Product), 0);
    assert_eq!(stats.inserted(EntityKind::ProductVariant), 1);
    assert_eq!(stats.inserted(EntityKind::Sale), 1);
    assert_eq!(service.local().sale_items(42).len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mid_phase_failure_rolls_the_phase_back() {
    let (cloud, local) = stores();
    cloud.seed([unit(1, "kg"), unit(2, "g"), unit(3, "l")]);
    cloud.seed([category(1, None)]);
    local.fail_record(StoreOp::Insert, EntityKind::Unit, 2);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert!(result.success());
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("failed to sync units: "));
    assert_eq!(result.stats().counts(EntityKind::Unit), EntityCounts::default());
    assert_eq!(service.local().records::<Unit>(), Vec::<Unit>::new());
    assert_eq!(result.stats().inserted(EntityKind::Category), 1);
    assert!(service
        .local()
        .journal()
        .contains(&call(StoreOp::Rollback, None, None)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_sale_item_rolls_back_the_sale() {
    let (cloud, local) = stores();
    cloud.seed([sale(42), sale(43)]);
    cloud.seed_sale_items([item(1, 42, 1), item(2, 43, 1)]);
    local.fail_record(StoreOp::InsertItem, EntityKind::Sale, 43);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert_eq!(result.errors().len(), 1);
    assert_eq!(service.local().records::<Sale>(), Vec::<Sale>::new());
    assert_eq!(service.local().sale_items(42), Vec::<SaleItem>::new());
    assert_eq!(result.stats().inserted(EntityKind::Sale), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_commit_rolls_back_and_later_phases_still_run() {
    let local = MemoryStore::new(Side::Local);
    // the second commit closes the categories phase
    local.fail_nth(StoreOp::Commit, 2);
    let service = SyncService::new(seeded_cloud(), local);

    let result = service.sync_from_cloud().await;

    assert!(result.success());
    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    assert!(result.errors()[0].starts_with("failed to sync categories: "));
    assert_eq!(
        result.stats().counts(EntityKind::Category),
        EntityCounts::default()
    );
    assert_eq!(service.local().records::<Category>(), Vec::<Category>::new());
    assert_eq!(result.stats().inserted(EntityKind::Unit), 1);
    assert_eq!(result.stats().inserted(EntityKind::Product), 1);
    assert_eq!(result.stats().inserted(EntityKind::ProductVariant), 1);
    assert_eq!(result.stats().inserted(EntityKind::Sale), 1);
    assert!(service.local().journal().windows(2).any(|pair| {
        *pair
            == [
                call(StoreOp::Commit, None, None),
                call(StoreOp::Rollback, None, None),
            ]
    }));

    let retry = service.sync_from_cloud().await;
    assert!(!retry.has_errors(), "{:?}", retry.errors());
    assert_eq!(retry.stats().inserted(EntityKind::Category), 1);
    assert_eq!(retry.stats().inserted(EntityKind::Product), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_begin_skips_only_that_phase() {
    let local = MemoryStore::new(Side::Local);
    // the third begin opens the products phase
    local.fail_nth(StoreOp::Begin, 3);
    let service = SyncService::new(seeded_cloud(), local);

    let result = service.sync_from_cloud().await;

    assert!(result.success());
    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    assert!(result.errors()[0].starts_with("failed to sync products: "));
    assert_eq!(result.stats().inserted(EntityKind::Product), 0);
    assert_eq!(service.local().records::<Product>(), Vec::<Product>::new());
    assert_eq!(result.stats().inserted(EntityKind::ProductVariant), 1);
    assert_eq!(result.stats().inserted(EntityKind::Sale), 1);

    let journal = service.local().journal();
    assert!(!journal.contains(&call(StoreOp::FindAll, Some(EntityKind::Product), None)));
    let commits = journal
        .iter()
        .filter(|entry| entry.op == StoreOp::Commit)
        .count();
    assert_eq!(commits, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_store_fails_the_pass() {
    let (cloud, local) = stores();
    cloud.seed([unit(1, "kg")]);
    cloud.fail_connection();
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert!(!result.success());
    assert!(result.message().starts_with("Sync failed: "));
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.stats().total_operations(), 0);
    assert!(result.finished_at().is_some());
    assert_eq!(service.local().journal(), Vec::<StoreCall>::new());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_pull_changes_nothing() {
    let service = SyncService::new(seeded_cloud(), MemoryStore::new(Side::Local));
    let first = service.sync_from_cloud().await;
    assert_eq!(first.stats().total_operations(), 5);

    let second = service.sync_from_cloud().await;

    assert!(second.success());
    let stats = second.stats();
    for kind in [
        EntityKind::Product,
        EntityKind::ProductVariant,
        EntityKind::Sale,
    ] {
        assert_eq!(stats.counts(kind), EntityCounts::default(), "{kind}");
    }
    // unstamped reference data is rewritten with identical values
    assert_eq!(stats.inserted(EntityKind::Unit), 0);
    assert_eq!(stats.updated(EntityKind::Unit), 1);
    assert_eq!(stats.updated(EntityKind::Category), 1);
    assert_eq!(stats.conflicts_resolved(), 0);
    assert_eq!(
        service.local().records::<Unit>(),
        service.cloud().records::<Unit>()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_newer_cloud_product_wins_and_push_is_a_no_op() {
    let (cloud, local) = stores();
    cloud.seed([product(1, "Coffee beans 1kg", Some(T2))]);
    local.seed([product(1, "Coffee", Some(T1))]);
    let service = SyncService::new(cloud, local);

    let pull = service.sync_from_cloud().await;

    assert_eq!(pull.stats().updated(EntityKind::Product), 1);
    assert_eq!(pull.stats().conflicts_resolved(), 1);
    assert_eq!(
        service.local().record::<Product>(1),
        Some(product(1, "Coffee beans 1kg", Some(T2)))
    );

    service.cloud().clear_journal();
    let push = service.sync_to_cloud().await;

    assert_eq!(push.stats().counts(EntityKind::Product), EntityCounts::default());
    assert_eq!(push.stats().conflicts_resolved(), 0);
    assert!(!service
        .cloud()
        .journal()
        .iter()
        .any(|entry| entry.op == StoreOp::Update && entry.kind == Some(EntityKind::Product)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_newer_local_copy_is_kept() {
    let (cloud, local) = stores();
    cloud.seed([product(1, "Coffee", Some(T1))]);
    cloud.seed([variant(5, 1, None)]);
    local.seed([product(1, "Coffee (edited offline)", Some(T2))]);
    local.seed([variant(5, 1, Some(T1))]);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert_eq!(result.stats().total_operations(), 0);
    assert_eq!(result.stats().conflicts_resolved(), 0);
    assert_eq!(
        service.local().record::<Product>(1).map(|p| p.name),
        Some("Coffee (edited offline)".to_string())
    );
    assert_eq!(
        service.local().record::<ProductVariant>(5).and_then(|v| v.updated_at),
        Some(T1)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unstamped_source_variant_overwrites_unstamped_dest_never() {
    let (cloud, local) = stores();
    let mut cloud_variant = variant(3, 1, None);
    cloud_variant.stock = 99;
    cloud.seed([cloud_variant]);
    local.seed([variant(3, 1, None)]);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert_eq!(result.stats().updated(EntityKind::ProductVariant), 0);
    assert_eq!(
        service.local().record::<ProductVariant>(3).map(|v| v.stock),
        Some(4)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_units_are_overwritten_unconditionally() {
    let (cloud, local) = stores();
    cloud.seed([unit(1, "kg")]);
    local.seed([unit(1, "KGM")]);
    let service = SyncService::new(cloud, local);

    let pull = service.sync_from_cloud().await;

    assert_eq!(pull.stats().updated(EntityKind::Unit), 1);
    assert_eq!(pull.stats().conflicts_resolved(), 0);
    assert_eq!(service.local().record::<Unit>(1), Some(unit(1, "kg")));

    // the other direction overwrites just as blindly
    service.local().seed([unit(1, "kilo")]);
    let push = service.sync_to_cloud().await;
    assert_eq!(push.stats().updated(EntityKind::Unit), 1);
    assert_eq!(service.cloud().record::<Unit>(1), Some(unit(1, "kilo")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_category_parent_is_overwritten() {
    let (cloud, local) = stores();
    cloud.seed([category(1, None), category(2, Some(1))]);
    local.seed([category(2, None)]);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert_eq!(result.stats().inserted(EntityKind::Category), 1);
    assert_eq!(result.stats().updated(EntityKind::Category), 1);
    assert_eq!(
        service.local().record::<Category>(2),
        Some(category(2, Some(1)))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sale_is_appended_once_with_all_items() {
    let (cloud, local) = stores();
    cloud.seed([sale(42)]);
    cloud.seed_sale_items([item(100, 42, 1), item(101, 42, 2), item(102, 42, 3)]);
    let service = SyncService::new(cloud, local);

    let first = service.sync_from_cloud().await;

    assert_eq!(first.stats().inserted(EntityKind::Sale), 1);
    assert_eq!(service.local().record::<Sale>(42), Some(sale(42)));
    let items = service.local().sale_items(42);
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item.sale_id == 42));
    assert_eq!(
        items.iter().map(|item| item.product_id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let second = service.sync_from_cloud().await;

    assert_eq!(second.stats().counts(EntityKind::Sale), EntityCounts::default());
    assert_eq!(service.local().sale_items(42), items);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_existing_sale_is_never_updated() {
    let (cloud, local) = stores();
    let mut corrected = sale(42);
    corrected.total_cents = 1;
    cloud.seed([corrected]);
    cloud.seed_sale_items([item(1, 42, 1)]);
    local.seed([sale(42)]);
    let service = SyncService::new(cloud, local);

    let result = service.sync_from_cloud().await;

    assert_eq!(result.stats().total_operations(), 0);
    assert_eq!(service.local().record::<Sale>(42), Some(sale(42)));
    assert_eq!(service.local().sale_items(42), Vec::<SaleItem>::new());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_destination_assigns_sale_item_ids() {
    let (cloud, local) = stores();
    cloud.seed([sale(42)]);
    cloud.seed_sale_items([item(500, 42, 1), item(501, 42, 2)]);
    local.seed([sale(7)]);
    local.seed_sale_items([item(1, 7, 1)]);
    let service = SyncService::new(cloud, local);

    service.sync_from_cloud().await;

    let ids: Vec<i64> = service
        .local()
        .sale_items(42)
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bidirectional_converges_both_sides() {
    let (cloud, local) = stores();
    cloud.seed([unit(1, "kg")]);
    cloud.seed([product(1, "Coffee", Some(T2))]);
    local.seed([unit(2, "l")]);
    local.seed([product(2, "Milk", Some(T1))]);
    local.seed([sale(9)]);
    local.seed_sale_items([item(1, 9, 2)]);
    let service = SyncService::new(cloud, local);

    let result = service.sync_bidirectional().await;

    assert!(result.success());
    assert_eq!(result.direction(), SyncDirection::Bidirectional);
    assert_eq!(
        service.cloud().records::<Unit>(),
        service.local().records::<Unit>()
    );
    assert_eq!(
        service.cloud().records::<Product>(),
        service.local().records::<Product>()
    );
    assert_eq!(service.cloud().sale_items(9).len(), 1);
    let stats = result.stats();
    assert_eq!(stats.inserted(EntityKind::Unit), 2);
    assert_eq!(stats.inserted(EntityKind::Product), 2);
    assert_eq!(stats.inserted(EntityKind::Sale), 1);
    assert_eq!(stats.conflicts_resolved(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bidirectional_skips_push_when_pull_cannot_start() {
    let (cloud, local) = stores();
    local.seed([unit(2, "l")]);
    local.fail_connection();
    let service = SyncService::new(cloud, local);

    let result = service.sync(SyncDirection::Bidirectional).await;

    assert!(!result.success());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(service.cloud().records::<Unit>(), Vec::<Unit>::new());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_dispatches_on_direction() {
    let (cloud, local) = stores();
    local.seed([unit(3, "m")]);
    let service = SyncService::new(cloud, local);

    let result = service.sync(SyncDirection::LocalToCloud).await;

    assert_eq!(result.direction(), SyncDirection::LocalToCloud);
    assert_eq!(service.cloud().record::<Unit>(3), Some(unit(3, "m")));
    assert_eq!(
        result.to_string(),
        "sync completed (local -> cloud): 1 operations, 0 errors"
    );
}
