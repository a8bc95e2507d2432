//! Checks that engine results map onto the wire types with exact decimal
//! strings, not floats.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, Statement};

use engine::{BillItemInput, CalculateSettlementCmd, CreateBillCmd, Engine};
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

fn to_wire(result: engine::SettlementResult) -> api_types::settlement::SettlementResult {
    api_types::settlement::SettlementResult {
        group_id: result.group_id,
        bill_count: result.bill_count,
        total_amount: result.total_amount,
        balances: result
            .balances
            .into_iter()
            .map(|b| api_types::settlement::UserBalance {
                user_id: b.user_id,
                user_name: b.user_name,
                paid: b.paid,
                owes: b.owes,
                balance: b.balance,
            })
            .collect(),
        transactions: result
            .transactions
            .into_iter()
            .map(|t| api_types::settlement::Transaction {
                from_user_id: t.from_user_id,
                from_user_name: t.from_user_name,
                to_user_id: t.to_user_id,
                to_user_name: t.to_user_name,
                amount: t.amount,
            })
            .collect(),
    }
}

#[tokio::test]
async fn settlement_result_serializes_amounts_as_decimal_strings() {
    let engine = engine_with_users(&[("alice", "Alice"), ("bob", "Bob")]).await;
    let group = engine.create_group("Flat 7", None, "alice").await.unwrap();
    engine.add_member(&group.id, "alice", "bob").await.unwrap();

    let bill = engine
        .create_bill(
            CreateBillCmd::new(&group.id, "alice", "Groceries", dec("21.58"), Utc::now())
                .item(BillItemInput::shared("food", dec("21.58"))),
        )
        .await
        .unwrap();

    let result = engine
        .calculate_settlement(CalculateSettlementCmd::new(
            &group.id,
            "alice",
            [bill.bill.id],
        ))
        .await
        .unwrap();
    let wire = to_wire(result);

    let json = serde_json::to_value(&wire).unwrap();
    assert_eq!(json["bill_count"], 1);
    assert_eq!(json["total_amount"], "21.58");

    let alice = &json["balances"][0];
    assert_eq!(alice["user_id"], "alice");
    assert_eq!(alice["paid"], "21.58");
    assert_eq!(alice["owes"], "10.79");
    assert_eq!(alice["balance"], "10.79");

    let transfer = &json["transactions"][0];
    assert_eq!(transfer["from_user_id"], "bob");
    assert_eq!(transfer["to_user_id"], "alice");
    assert_eq!(transfer["amount"], "10.79");
}
