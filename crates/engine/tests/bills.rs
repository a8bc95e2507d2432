use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, Statement};

use engine::bills::BillStatus;
use engine::{BillItemInput, BillListFilter, CreateBillCmd, Engine, EngineError, UpdateBillCmd};
use migration::MigratorTrait;

async fn engine_with_users(users: &[(&str, &str)]) -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, name) in users {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, name) VALUES (?, ?)",
            vec![(*id).into(), (*name).into()],
        ))
        .await
        .unwrap();
    }
    Engine::builder().database(db).build().await.unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn group_with_bob(engine: &Engine) -> String {
    let group = engine
        .create_group("Trip", Some("Weekend trip"), "alice")
        .await
        .unwrap();
    engine.add_member(&group.id, "alice", "bob").await.unwrap();
    group.id
}

#[tokio::test]
async fn create_bill_stores_items_and_owners() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let cmd = CreateBillCmd::new(&group_id, "alice", "Dinner", dec("45.50"), Utc::now())
        .description("Friday dinner")
        .item(BillItemInput::shared("pizza", dec("12.50")).quantity(2))
        .item(BillItemInput::personal("wine", dec("20.50"), ["bob"]));
    let detail = engine.create_bill(cmd).await.unwrap();

    assert_eq!(detail.bill.title, "Dinner");
    assert_eq!(detail.bill.total_amount, dec("45.50"));
    assert_eq!(detail.bill.paid_by, "alice");
    assert_eq!(detail.bill.status, "pending");
    assert_eq!(detail.items.len(), 2);

    let wine = detail.items.iter().find(|i| i.name == "wine").unwrap();
    assert!(!wine.is_shared);
    assert_eq!(wine.owner_ids, vec!["bob".to_string()]);

    let pizza = detail.items.iter().find(|i| i.name == "pizza").unwrap();
    assert!(pizza.is_shared);
    assert_eq!(pizza.quantity, 2);
    assert!(pizza.owner_ids.is_empty());
}

#[tokio::test]
async fn create_bill_rejects_total_item_mismatch() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let cmd = CreateBillCmd::new(&group_id, "alice", "Dinner", dec("50.00"), Utc::now())
        .item(BillItemInput::shared("pizza", dec("25.00")));
    let err = engine.create_bill(cmd).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(
            "total amount (50.00) does not match sum of items (25.00)".to_string()
        )
    );
}

#[tokio::test]
async fn create_bill_rejects_bad_items() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("eve", "Eve")]).await;
    let group_id = group_with_bob(&engine).await;

    // Personal item with no owners.
    let cmd = CreateBillCmd::new(&group_id, "alice", "Bad", dec("10.00"), Utc::now()).item(
        BillItemInput::personal("orphan", dec("10.00"), Vec::<String>::new()),
    );
    assert!(matches!(
        engine.create_bill(cmd).await.unwrap_err(),
        EngineError::Validation(_)
    ));

    // Owner who is not a group member.
    let cmd = CreateBillCmd::new(&group_id, "alice", "Bad", dec("10.00"), Utc::now())
        .item(BillItemInput::personal("outsider", dec("10.00"), ["eve"]));
    assert!(matches!(
        engine.create_bill(cmd).await.unwrap_err(),
        EngineError::Validation(_)
    ));

    // Non-positive amounts: a zero total and a zero item amount both fail
    // before anything is written.
    let cmd = CreateBillCmd::new(&group_id, "alice", "Bad", dec("0.00"), Utc::now())
        .item(BillItemInput::shared("free", dec("0.00")));
    assert!(matches!(
        engine.create_bill(cmd).await.unwrap_err(),
        EngineError::Validation(_)
    ));
    let cmd = CreateBillCmd::new(&group_id, "alice", "Bad", dec("10.00"), Utc::now())
        .item(BillItemInput::shared("pizza", dec("10.00")))
        .item(BillItemInput::shared("free", dec("0.00")));
    assert!(matches!(
        engine.create_bill(cmd).await.unwrap_err(),
        EngineError::Validation(_)
    ));
}

#[tokio::test]
async fn create_bill_requires_membership_of_caller_and_payer() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("eve", "Eve")]).await;
    let group_id = group_with_bob(&engine).await;

    let cmd = CreateBillCmd::new(&group_id, "eve", "Dinner", dec("10.00"), Utc::now())
        .item(BillItemInput::shared("pizza", dec("10.00")));
    assert!(matches!(
        engine.create_bill(cmd).await.unwrap_err(),
        EngineError::Unauthorized(_)
    ));

    let cmd = CreateBillCmd::new(&group_id, "alice", "Dinner", dec("10.00"), Utc::now())
        .paid_by("eve")
        .item(BillItemInput::shared("pizza", dec("10.00")));
    assert!(matches!(
        engine.create_bill(cmd).await.unwrap_err(),
        EngineError::Unauthorized(_)
    ));
}

#[tokio::test]
async fn item_edits_keep_bill_total_in_sync() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let detail = engine
        .create_bill(
            CreateBillCmd::new(&group_id, "alice", "Dinner", dec("30.00"), Utc::now())
                .item(BillItemInput::shared("pizza", dec("30.00"))),
        )
        .await
        .unwrap();
    let bill_id = detail.bill.id.clone();

    // Adding an item raises the total by its line total.
    let added = engine
        .add_bill_item(
            &bill_id,
            "alice",
            BillItemInput::shared("drinks", dec("5.00")).quantity(2),
        )
        .await
        .unwrap();
    let bill = engine.get_bill(&bill_id, "alice").await.unwrap();
    assert_eq!(bill.bill.total_amount, dec("40.00"));

    // Replacing an item adjusts by the delta.
    engine
        .update_bill_item(
            &bill_id,
            &added.id,
            "alice",
            BillItemInput::personal("drinks", dec("4.00"), ["bob"]),
        )
        .await
        .unwrap();
    let bill = engine.get_bill(&bill_id, "alice").await.unwrap();
    assert_eq!(bill.bill.total_amount, dec("34.00"));

    // Deleting takes the line total back off.
    engine
        .delete_bill_item(&bill_id, &added.id, "alice")
        .await
        .unwrap();
    let bill = engine.get_bill(&bill_id, "alice").await.unwrap();
    assert_eq!(bill.bill.total_amount, dec("30.00"));
    assert_eq!(bill.items.len(), 1);
}

#[tokio::test]
async fn update_bill_changes_only_provided_fields() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let detail = engine
        .create_bill(
            CreateBillCmd::new(&group_id, "alice", "Dinner", dec("30.00"), Utc::now())
                .description("Friday")
                .item(BillItemInput::shared("pizza", dec("30.00"))),
        )
        .await
        .unwrap();

    let updated = engine
        .update_bill(UpdateBillCmd::new(&detail.bill.id, "alice").title("Team dinner"))
        .await
        .unwrap();
    assert_eq!(updated.title, "Team dinner");
    assert_eq!(updated.description.as_deref(), Some("Friday"));
    assert_eq!(updated.total_amount, dec("30.00"));
}

#[tokio::test]
async fn only_payer_or_admin_may_edit() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]).await;
    let group_id = group_with_bob(&engine).await;
    engine
        .add_member(&group_id, "alice", "carol")
        .await
        .unwrap();

    // Paid by bob, a plain member.
    let detail = engine
        .create_bill(
            CreateBillCmd::new(&group_id, "bob", "Dinner", dec("30.00"), Utc::now())
                .item(BillItemInput::shared("pizza", dec("30.00"))),
        )
        .await
        .unwrap();

    // Carol is a member but neither payer nor admin.
    let err = engine
        .update_bill(UpdateBillCmd::new(&detail.bill.id, "carol").title("Hijacked"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    // The admin may edit someone else's bill.
    engine
        .update_bill(UpdateBillCmd::new(&detail.bill.id, "alice").title("Corrected"))
        .await
        .unwrap();
}

#[tokio::test]
async fn finalize_locks_the_bill() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let detail = engine
        .create_bill(
            CreateBillCmd::new(&group_id, "alice", "Dinner", dec("30.00"), Utc::now())
                .item(BillItemInput::shared("pizza", dec("30.00"))),
        )
        .await
        .unwrap();
    let bill_id = detail.bill.id.clone();

    engine.finalize_bill(&bill_id, "alice").await.unwrap();
    let bill = engine.get_bill(&bill_id, "alice").await.unwrap();
    assert_eq!(bill.bill.status, "finalized");

    // Finalizing again conflicts.
    let err = engine.finalize_bill(&bill_id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));

    // So does any further edit.
    let err = engine
        .update_bill(UpdateBillCmd::new(&bill_id, "alice").title("Too late"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    let err = engine
        .add_bill_item(&bill_id, "alice", BillItemInput::shared("late", dec("1.00")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    let err = engine.delete_bill(&bill_id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn finalize_requires_at_least_one_item() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let detail = engine
        .create_bill(
            CreateBillCmd::new(&group_id, "alice", "Dinner", dec("30.00"), Utc::now())
                .item(BillItemInput::shared("pizza", dec("30.00"))),
        )
        .await
        .unwrap();
    let bill_id = detail.bill.id.clone();
    let item_id = detail.items[0].id.clone();

    engine
        .delete_bill_item(&bill_id, &item_id, "alice")
        .await
        .unwrap();
    let err = engine.finalize_bill(&bill_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("cannot finalize a bill without items".to_string())
    );
}

#[tokio::test]
async fn list_group_bills_filters_and_orders() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let older = engine
        .create_bill(
            CreateBillCmd::new(
                &group_id,
                "alice",
                "Older",
                dec("10.00"),
                "2026-08-01T12:00:00Z".parse().unwrap(),
            )
            .item(BillItemInput::shared("a", dec("10.00"))),
        )
        .await
        .unwrap();
    let newer = engine
        .create_bill(
            CreateBillCmd::new(
                &group_id,
                "bob",
                "Newer",
                dec("20.00"),
                "2026-08-15T12:00:00Z".parse().unwrap(),
            )
            .item(BillItemInput::shared("b", dec("20.00"))),
        )
        .await
        .unwrap();
    engine
        .finalize_bill(&newer.bill.id, "bob")
        .await
        .unwrap();

    let all = engine
        .list_group_bills(&group_id, "alice", BillListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    // Most recent bill date first.
    assert_eq!(all[0].id, newer.bill.id);
    assert_eq!(all[1].id, older.bill.id);

    let pending_only = engine
        .list_group_bills(
            &group_id,
            "alice",
            BillListFilter::default().status(BillStatus::Pending),
        )
        .await
        .unwrap();
    assert_eq!(pending_only.len(), 1);
    assert_eq!(pending_only[0].id, older.bill.id);
}

#[tokio::test]
async fn delete_bill_removes_items_and_owner_rows() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group_id = group_with_bob(&engine).await;

    let detail = engine
        .create_bill(
            CreateBillCmd::new(&group_id, "alice", "Dinner", dec("30.00"), Utc::now())
                .item(BillItemInput::personal("wine", dec("30.00"), ["bob"])),
        )
        .await
        .unwrap();
    let bill_id = detail.bill.id.clone();

    engine.delete_bill(&bill_id, "alice").await.unwrap();
    let err = engine.get_bill(&bill_id, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("bill not found".to_string()));

    let bills = engine
        .list_group_bills(&group_id, "alice", BillListFilter::default())
        .await
        .unwrap();
    assert!(bills.is_empty());
}
