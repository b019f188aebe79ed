use async_trait::async_trait;
use models::entry::Model;
use uuid::Uuid;

use super::policy::Scope;
use crate::errors::ServiceError;

/// Persistence seam for entries.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn insert(&self, entry: Model) -> Result<Model, ServiceError>;
    /// Writes the whole batch in one statement; an error means none of it was written.
    async fn insert_batch(&self, entries: Vec<Model>) -> Result<u64, ServiceError>;
    /// Entries in scope, oldest first.
    async fn find(&self, scope: Scope) -> Result<Vec<Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<Model>, ServiceError>;
    async fn replace(&self, entry: Model) -> Result<Model, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// In-memory repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryEntryRepository {
        rows: RwLock<Vec<Model>>,
        // customer names the "database" refuses, to exercise write failures
        rejected: RwLock<HashSet<String>>,
    }

    impl MemoryEntryRepository {
        pub async fn reject_customer(&self, name: &str) {
            self.rejected.write().await.insert(name.to_string());
        }

        pub async fn len(&self) -> usize { self.rows.read().await.len() }

        pub async fn is_empty(&self) -> bool { self.rows.read().await.is_empty() }

        async fn check(&self, entry: &Model) -> Result<(), ServiceError> {
            if self.rejected.read().await.contains(&entry.customer_name) {
                return Err(ServiceError::Db(format!("rejected row {}", entry.customer_name)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntryRepository for MemoryEntryRepository {
        async fn insert(&self, entry: Model) -> Result<Model, ServiceError> {
            self.check(&entry).await?;
            self.rows.write().await.push(entry.clone());
            Ok(entry)
        }

        async fn insert_batch(&self, entries: Vec<Model>) -> Result<u64, ServiceError> {
            for e in &entries {
                self.check(e).await?;
            }
            let n = entries.len() as u64;
            self.rows.write().await.extend(entries);
            Ok(n)
        }

        async fn find(&self, scope: Scope) -> Result<Vec<Model>, ServiceError> {
            let mut rows: Vec<Model> = self.rows.read().await.iter().filter(|e| scope.contains(e)).cloned().collect();
            rows.sort_by_key(|e| e.created_at);
            Ok(rows)
        }

        async fn get(&self, id: Uuid) -> Result<Option<Model>, ServiceError> {
            Ok(self.rows.read().await.iter().find(|e| e.id == id).cloned())
        }

        async fn replace(&self, entry: Model) -> Result<Model, ServiceError> {
            let mut rows = self.rows.write().await;
            let slot = rows
                .iter_mut()
                .find(|e| e.id == entry.id)
                .ok_or_else(|| ServiceError::not_found("Entry"))?;
            *slot = entry.clone();
            Ok(entry)
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|e| e.id != id);
            Ok(rows.len() < before)
        }
    }
}
