use crate::db::connect;
use crate::entry::{self, DateChecks, EntryDraft};
use crate::user::{self, Role};
use sea_orm::DatabaseConnection;
use anyhow::Result;
use migration::MigratorTrait;
use chrono::Utc;
use uuid::Uuid;

/// Setup test database with migrations; `None` when no database is configured.
async fn setup_test_db() -> Result<Option<DatabaseConnection>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Some(db))
}

fn sample_entry(owner: Uuid) -> entry::Model {
    let draft = EntryDraft {
        customer_name: "Crud Customer".into(),
        mobile_number: "9000000001".into(),
        address: "1 Test Street".into(),
        organization: "Crud Org".into(),
        products: "Switches".into(),
        entry_type: "Customer".into(),
        category: "Government".into(),
        city: "Delhi".into(),
        state: "Delhi".into(),
        ..Default::default()
    };
    let now = Utc::now();
    draft
        .validate(DateChecks::ALL, now)
        .expect("valid draft")
        .into_model(Uuid::new_v4(), owner, now.into(), now.into())
}

/// Test user + entry CRUD operations
#[tokio::test]
async fn test_entry_crud() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let email = format!("crud_{}@example.com", Uuid::new_v4());
    let owner = user::create(&db, "crud-user", &email, Role::User, "hash".into()).await?;

    // Create
    let created = entry::insert(&db, sample_entry(owner.id)).await?;
    assert_eq!(created.created_by, owner.id);

    // Read (scoped)
    let mine = entry::find_scoped(&db, Some(owner.id)).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.id);

    // Update
    let mut changed = created.clone();
    changed.city = "Noida".into();
    let updated = entry::update(&db, changed).await?;
    assert_eq!(updated.city, "Noida");
    assert_eq!(entry::find_by_id(&db, created.id).await?.map(|e| e.city), Some("Noida".to_string()));

    // Username join
    let names = user::usernames_by_ids(&db, &[owner.id]).await?;
    assert_eq!(names.get(&owner.id).map(String::as_str), Some("crud-user"));

    // Delete
    assert!(entry::delete(&db, created.id).await?);
    assert!(!entry::delete(&db, created.id).await?);

    user::hard_delete(&db, owner.id).await?;
    Ok(())
}

/// Test batch insert writes every row in one statement
#[tokio::test]
async fn test_insert_many() -> Result<()> {
    let Some(db) = setup_test_db().await? else { return Ok(()) };

    let email = format!("batch_{}@example.com", Uuid::new_v4());
    let owner = user::create(&db, "batch-user", &email, Role::User, "hash".into()).await?;

    let rows: Vec<_> = (0..5).map(|_| sample_entry(owner.id)).collect();
    let written = entry::insert_many(&db, rows).await?;
    assert_eq!(written, 5);
    assert_eq!(entry::find_scoped(&db, Some(owner.id)).await?.len(), 5);

    // FK cascade removes the owner's entries
    user::hard_delete(&db, owner.id).await?;
    assert!(entry::find_scoped(&db, Some(owner.id)).await?.is_empty());
    Ok(())
}
