use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use engine::{
    Company, Contract, Engine, EngineError, GuardScope, NewCompany, NewContract, NewPurchase,
    PurchaseRequest, PurchaseWorkflow, Saved,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    (Engine::builder().database(db).build(), path)
}

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 9, 30, 0).unwrap()
}

fn company(name: &str) -> NewCompany {
    NewCompany {
        name: name.to_string(),
        reg_code: Some(format!("{name}-001")),
    }
}

async fn two_companies(engine: &Engine) -> (i32, i32) {
    let seller = engine.create_company(&company("Acme")).await.unwrap();
    let client = engine.create_company(&company("Globex")).await.unwrap();
    (seller, client)
}

fn new_contract(seller_id: i32, client_id: i32) -> NewContract {
    NewContract {
        seller_id,
        client_id,
        valid_from: at(1, 1),
        valid_to: at(12, 31),
        credit_amount: 1_000,
    }
}

#[tokio::test]
async fn company_crud() {
    let (engine, _db) = engine_with_db().await;

    let id = engine.create_company(&company("Acme")).await.unwrap();
    let mut stored = engine.company(id).await.unwrap();
    assert_eq!(stored.name, "Acme");
    assert_eq!(stored.reg_code.as_deref(), Some("Acme-001"));

    stored.name = "Acme Corp".to_string();
    stored.reg_code = None;
    engine.update_company(&stored).await.unwrap();
    assert_eq!(engine.company(id).await.unwrap(), stored);
    assert_eq!(engine.company_list().await.unwrap(), vec![stored]);

    engine.delete_company(id).await.unwrap();
    assert!(!engine.check_company_exist(id).await);
    assert!(matches!(
        engine.company(id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn missing_company_is_key_not_found() {
    let (engine, _db) = engine_with_db().await;

    let ghost = Company::with_id(
        77,
        NewCompany {
            name: "Ghost".to_string(),
            reg_code: None,
        },
    );
    assert!(matches!(
        engine.update_company(&ghost).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_company(77).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn save_company_creates_on_zero_id_and_updates_otherwise() {
    let (engine, _db) = engine_with_db().await;

    let draft = Company::with_id(0, company("Initech"));
    let created = engine.save_company(&draft).await.unwrap();
    assert!(created.is_created());

    let renamed = Company {
        id: created.id(),
        name: "Initrode".to_string(),
        reg_code: None,
    };
    assert_eq!(
        engine.save_company(&renamed).await.unwrap(),
        Saved::Updated(created.id())
    );
    assert_eq!(engine.company(created.id()).await.unwrap(), renamed);
}

#[tokio::test]
async fn contract_registration_checks_seller_then_client() {
    let (engine, _db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;

    assert_eq!(
        engine.register_contract(&new_contract(99, 98)).await,
        Err(EngineError::SellerNotExist)
    );
    assert_eq!(
        engine.register_contract(&new_contract(seller, 98)).await,
        Err(EngineError::ClientNotExist)
    );

    let reversed = NewContract {
        valid_from: at(12, 31),
        valid_to: at(1, 1),
        ..new_contract(seller, client)
    };
    assert!(matches!(
        engine.register_contract(&reversed).await,
        Err(EngineError::InvalidPeriod(_))
    ));
    assert!(engine.contract_list().await.unwrap().is_empty());

    let id = engine
        .register_contract(&new_contract(seller, client))
        .await
        .unwrap();
    let stored = engine.contract(id).await.unwrap();
    assert_eq!(stored, Contract::with_id(id, new_contract(seller, client)));
}

#[tokio::test]
async fn single_day_contract_is_valid() {
    let (engine, _db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;

    let same_instant = NewContract {
        valid_from: at(3, 1),
        valid_to: at(3, 1),
        ..new_contract(seller, client)
    };
    assert!(engine.register_contract(&same_instant).await.is_ok());
}

#[tokio::test]
async fn save_contract_upserts() {
    let (engine, _db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;

    let draft = Contract::with_id(0, new_contract(seller, client));
    let Saved::Created(id) = engine.save_contract(&draft).await.unwrap() else {
        panic!("expected a new contract");
    };

    let amended = Contract {
        id,
        credit_amount: 2_500,
        seller_id: client,
        client_id: seller,
        ..draft
    };
    assert_eq!(
        engine.save_contract(&amended).await.unwrap(),
        Saved::Updated(id)
    );
    assert_eq!(engine.contract(id).await.unwrap(), amended);

    let orphan = Contract {
        client_id: 404,
        ..amended.clone()
    };
    assert_eq!(
        engine.save_contract(&orphan).await,
        Err(EngineError::ClientNotExist)
    );

    let missing = Contract { id: 404, ..amended };
    assert!(matches!(
        engine.save_contract(&missing).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn history_distinguishes_empty_from_unknown() {
    let (engine, _db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;
    let contract_id = engine
        .register_contract(&new_contract(seller, client))
        .await
        .unwrap();

    assert_eq!(engine.purchase_history(contract_id).await, Ok(vec![]));
    assert!(matches!(
        engine.contract_purchase_history(contract_id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(
        engine.purchase_history(contract_id + 1).await,
        Err(EngineError::ContractNotFound)
    );
}

#[tokio::test]
async fn history_is_ordered_by_purchase_time() {
    let (engine, _db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;
    let contract_id = engine
        .register_contract(&new_contract(seller, client))
        .await
        .unwrap();

    for (purchased_at, credit_spent) in [(at(5, 1), 30), (at(2, 1), 10), (at(3, 1), 20)] {
        engine
            .create_purchase(&NewPurchase {
                contract_id,
                purchased_at,
                credit_spent,
            })
            .await
            .unwrap();
    }

    let history = engine.purchase_history(contract_id).await.unwrap();
    let spent: Vec<_> = history.iter().map(|p| p.credit_spent).collect();
    assert_eq!(spent, vec![10, 20, 30]);
    assert!(history.iter().all(|p| p.contract_id == contract_id));
    assert_eq!(engine.contract_purchase_sum(contract_id).await, 60);
}

#[tokio::test]
async fn purchase_sum_of_untouched_contract_is_zero() {
    let (engine, _db) = engine_with_db().await;

    assert_eq!(engine.contract_purchase_sum(1).await, 0);
    assert_eq!(engine.try_contract_purchase_sum(1).await, Ok(0));
}

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;
    let contract_id = engine
        .register_contract(&new_contract(seller, client))
        .await
        .unwrap();

    assert!(matches!(
        engine.delete_company(seller).await,
        Err(EngineError::Database(_))
    ));
    assert!(engine.check_company_exist(seller).await);

    engine.delete_contract(contract_id).await.unwrap();
    engine.delete_company(seller).await.unwrap();
}

#[tokio::test]
async fn storage_failures_read_as_missing_contract() {
    let (engine, db) = engine_with_db().await;
    let (seller, client) = two_companies(&engine).await;
    let contract_id = engine
        .register_contract(&new_contract(seller, client))
        .await
        .unwrap();
    let engine = Arc::new(engine);
    let workflow = PurchaseWorkflow::new(Arc::clone(&engine), GuardScope::PerContract);

    db.execute_unprepared("DROP TABLE purchases").await.unwrap();
    db.execute_unprepared("DROP TABLE contracts").await.unwrap();

    assert!(!engine.check_contract_exist(contract_id).await);
    assert_eq!(
        workflow
            .book(&PurchaseRequest {
                contract_id,
                datetime: at(6, 1),
                amount: 1,
            })
            .await,
        Err(EngineError::ContractNotFound)
    );
    assert_eq!(
        engine.purchase_history(contract_id).await,
        Err(EngineError::ContractNotFound)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_on_a_file_database() {
    let (engine, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let (seller, client) = two_companies(&engine).await;
    let contract_id = engine
        .register_contract(&NewContract {
            credit_amount: 25,
            ..new_contract(seller, client)
        })
        .await
        .unwrap();
    let workflow = Arc::new(PurchaseWorkflow::new(
        Arc::clone(&engine),
        GuardScope::PerContract,
    ));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let workflow = Arc::clone(&workflow);
        tasks.spawn(async move {
            workflow
                .book(&PurchaseRequest {
                    contract_id,
                    datetime: at(6, 1),
                    amount: 5,
                })
                .await
        });
    }

    let mut committed = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => committed += 1,
            Err(err) => assert_eq!(err, EngineError::InsufficientCredit),
        }
    }

    assert_eq!(committed, 5);
    assert_eq!(engine.try_contract_purchase_sum(contract_id).await, Ok(25));

    drop(workflow);
    drop(engine);
    let _ = std::fs::remove_file(path);
}
