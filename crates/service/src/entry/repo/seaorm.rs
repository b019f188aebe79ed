use sea_orm::DatabaseConnection;
use uuid::Uuid;

use models::entry::{self, Model};

use crate::entry::policy::Scope;
use crate::entry::repository::EntryRepository;
use crate::errors::ServiceError;

pub struct SeaOrmEntryRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmEntryRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait::async_trait]
impl EntryRepository for SeaOrmEntryRepository {
    async fn insert(&self, e: Model) -> Result<Model, ServiceError> {
        Ok(entry::insert(&self.db, e).await?)
    }

    async fn insert_batch(&self, entries: Vec<Model>) -> Result<u64, ServiceError> {
        Ok(entry::insert_many(&self.db, entries).await?)
    }

    async fn find(&self, scope: Scope) -> Result<Vec<Model>, ServiceError> {
        Ok(entry::find_scoped(&self.db, scope.owner()).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Model>, ServiceError> {
        Ok(entry::find_by_id(&self.db, id).await?)
    }

    async fn replace(&self, e: Model) -> Result<Model, ServiceError> {
        Ok(entry::update(&self.db, e).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(entry::delete(&self.db, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::test_fixtures::stored_entry;
    use crate::test_support::get_db;
    use models::user::{self, Role};

    #[tokio::test]
    async fn scoped_find_and_replace_roundtrip() -> anyhow::Result<()> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmEntryRepository::new(db.clone());

        let email = format!("repo_{}@example.com", Uuid::new_v4());
        let owner = user::create(&db, "repo-user", &email, Role::User, "hash".into()).await?;

        let stored = repo.insert(stored_entry(owner.id, "Repo Customer")).await?;
        let mine = repo.find(Scope::OwnedBy(owner.id)).await?;
        assert_eq!(mine.len(), 1);

        let mut changed = stored.clone();
        changed.remarks = "call back".into();
        repo.replace(changed).await?;
        assert_eq!(repo.get(stored.id).await?.map(|e| e.remarks), Some("call back".to_string()));

        assert!(repo.delete(stored.id).await?);
        user::hard_delete(&db, owner.id).await?;
        Ok(())
    }
}
