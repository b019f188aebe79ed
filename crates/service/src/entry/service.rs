use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use models::entry::{self, DateChecks, EntryDraft};
use models::errors::ModelError;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{BulkSummary, EntryInput, EntryPatch, EntryWithOwner, OwnerRef, Principal, RoleInfo};
use super::export::{self, ExportFile, SheetEncoder, COLUMNS, EXPORT_FILENAME, SHEET_NAME, XLSX_CONTENT_TYPE};
use super::policy::{authorize_mutation, scope_filter, Action};
use super::repository::EntryRepository;
use super::validator;
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;

/// Rows per multi-row insert during bulk import.
pub const BULK_BATCH_SIZE: usize = 500;

/// Entry use cases: validation, ownership checks and persistence.
pub struct EntryService {
    repo: Arc<dyn EntryRepository>,
    users: Arc<dyn AuthRepository>,
    encoder: Arc<dyn SheetEncoder>,
}

fn parse_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id.trim()).map_err(|_| ServiceError::Validation("Invalid entry ID".into()))
}

fn users_err(e: crate::auth::errors::AuthError) -> ServiceError {
    ServiceError::Db(e.to_string())
}

impl EntryService {
    pub fn new(repo: Arc<dyn EntryRepository>, users: Arc<dyn AuthRepository>, encoder: Arc<dyn SheetEncoder>) -> Self {
        Self { repo, users, encoder }
    }

    #[instrument(skip(self, input), fields(owner = %owner.user_id))]
    pub async fn create(&self, input: EntryInput, owner: &Principal) -> Result<entry::Model, ServiceError> {
        let now = Utc::now();
        let values = input.to_draft()?.validate(DateChecks::ALL, now)?;
        let model = values.into_model(Uuid::new_v4(), owner.user_id, now.into(), now.into());
        let saved = self.repo.insert(model).await?;
        info!(entry_id = %saved.id, "entry_created");
        Ok(saved)
    }

    /// Scoped entries with their owners' usernames.
    #[instrument(skip(self), fields(user = %requester.user_id))]
    pub async fn list(&self, requester: &Principal) -> Result<Vec<EntryWithOwner>, ServiceError> {
        let rows = self.repo.find(scope_filter(requester)).await?;
        let owner_ids: Vec<Uuid> = rows.iter().map(|e| e.created_by).collect::<HashSet<_>>().into_iter().collect();
        let names = self.users.usernames(&owner_ids).await.map_err(users_err)?;
        Ok(rows
            .into_iter()
            .map(|e| {
                let owner = names.get(&e.created_by).map(|username| OwnerRef { id: e.created_by, username: username.clone() });
                EntryWithOwner { entry: e, owner }
            })
            .collect())
    }

    #[instrument(skip(self, patch), fields(user = %requester.user_id))]
    pub async fn update(&self, id: &str, patch: EntryPatch, requester: &Principal) -> Result<entry::Model, ServiceError> {
        let id = parse_id(id)?;
        let existing = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Entry"))?;
        authorize_mutation(requester, Action::Update, &existing)?;

        let mut draft = existing.to_draft();
        let checks = patch.apply_to(&mut draft)?;
        let now = Utc::now();
        let values = draft.validate(checks, now)?;
        let saved = self.repo.replace(existing.apply(values, now.into())).await?;
        info!(entry_id = %saved.id, "entry_updated");
        Ok(saved)
    }

    #[instrument(skip(self), fields(user = %requester.user_id))]
    pub async fn delete(&self, id: &str, requester: &Principal) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        let existing = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Entry"))?;
        authorize_mutation(requester, Action::Delete, &existing)?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Entry"));
        }
        info!(entry_id = %id, "entry_deleted");
        Ok(())
    }

    /// Import many entries for one owner.
    ///
    /// A missing required field or an unparseable date anywhere aborts the whole
    /// call before any write. Records failing the schema constraints are skipped
    /// and listed in the summary; the rest go out in batches of
    /// [`BULK_BATCH_SIZE`]. A batch the store refuses is retried one record at a
    /// time.
    #[instrument(skip(self, inputs), fields(owner = %owner.user_id, received = inputs.len()))]
    pub async fn bulk_create(&self, inputs: Vec<EntryInput>, owner: &Principal) -> Result<BulkSummary, ServiceError> {
        if inputs.is_empty() {
            return Err(ServiceError::InvalidBatch);
        }
        let now = Utc::now();
        let mut drafts = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.iter().enumerate() {
            let parsed = Self::bulk_draft(input, now).map_err(|e| match e {
                ServiceError::Validation(msg) => ServiceError::Validation(format!("entries[{i}]: {msg}")),
                other => other,
            })?;
            drafts.push(parsed);
        }

        let mut summary = BulkSummary { received: inputs.len(), ..Default::default() };
        let mut pending = Vec::with_capacity(drafts.len());
        for (i, (draft, created_at)) in drafts.into_iter().enumerate() {
            match draft.validate(DateChecks::ALL, now) {
                Ok(values) => pending.push((i, values.into_model(Uuid::new_v4(), owner.user_id, created_at, now.into()))),
                Err(ModelError::Schema(errs)) => {
                    warn!(index = i, errors = ?errs, "bulk record skipped");
                    summary.reject(i, errs);
                }
                Err(e) => return Err(e.into()),
            }
        }

        for chunk in pending.chunks(BULK_BATCH_SIZE) {
            summary.batches += 1;
            let rows = chunk.iter().map(|(_, m)| m.clone()).collect();
            match self.repo.insert_batch(rows).await {
                Ok(n) => summary.inserted += n,
                Err(e) => {
                    warn!(batch = summary.batches, size = chunk.len(), error = %e, "batch insert failed; retrying per record");
                    for (i, m) in chunk {
                        match self.repo.insert(m.clone()).await {
                            Ok(_) => summary.inserted += 1,
                            Err(e) => {
                                warn!(index = *i, customer = %m.customer_name, error = %e, "bulk record rejected");
                                summary.reject(*i, vec![e.to_string()]);
                            }
                        }
                    }
                }
            }
        }
        summary.rejected.sort_by_key(|r| r.index);
        info!(inserted = summary.inserted, failed = summary.failed, batches = summary.batches, "bulk_import_done");
        Ok(summary)
    }

    /// Required fields first, then date formats, `createdAt` last.
    fn bulk_draft(input: &EntryInput, now: DateTime<Utc>) -> Result<(EntryDraft, DateTimeWithTimeZone), ServiceError> {
        let draft = input.to_draft()?;
        let created_at = validator::validate_date("createdAt", input.created_at.as_ref())?.unwrap_or_else(|| now.into());
        Ok((draft, created_at))
    }

    /// Scoped entries encoded as an xlsx workbook.
    #[instrument(skip(self), fields(user = %requester.user_id))]
    pub async fn export(&self, requester: &Principal) -> Result<ExportFile, ServiceError> {
        let rows: Vec<_> = self.repo.find(scope_filter(requester)).await?.iter().map(export::to_row).collect();
        let bytes = self.encoder.encode(SHEET_NAME, &COLUMNS, &rows)?;
        info!(rows = rows.len(), bytes = bytes.len(), "entries_exported");
        Ok(ExportFile { filename: EXPORT_FILENAME, content_type: XLSX_CONTENT_TYPE, rows: rows.len(), bytes })
    }

    /// Role of the stored user record (not the token claim).
    pub async fn role(&self, requester: &Principal) -> Result<RoleInfo, ServiceError> {
        let user = self
            .users
            .find_user_by_id(requester.user_id)
            .await
            .map_err(users_err)?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        Ok(RoleInfo { is_admin: user.role.is_admin() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use crate::entry::domain::RawField;
    use crate::entry::export::ExportRow;
    use crate::entry::repository::mock::MemoryEntryRepository;
    use models::user::Role;
    use serde_json::json;
    use std::sync::Mutex;

    /// Captures rows instead of producing a workbook.
    #[derive(Default)]
    struct RecordingEncoder {
        rows: Mutex<Vec<ExportRow>>,
    }

    impl SheetEncoder for RecordingEncoder {
        fn encode(&self, sheet_name: &str, header: &[&str], rows: &[ExportRow]) -> Result<Vec<u8>, ServiceError> {
            assert_eq!(sheet_name, SHEET_NAME);
            assert_eq!(header.len(), 14);
            *self.rows.lock().unwrap() = rows.to_vec();
            Ok(vec![rows.len() as u8])
        }
    }

    struct Fixture {
        svc: EntryService,
        repo: Arc<MemoryEntryRepository>,
        users: Arc<MockAuthRepository>,
        encoder: Arc<RecordingEncoder>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryEntryRepository::default());
        let users = Arc::new(MockAuthRepository::default());
        let encoder = Arc::new(RecordingEncoder::default());
        let svc = EntryService::new(repo.clone(), users.clone(), encoder.clone());
        Fixture { svc, repo, users, encoder }
    }

    async fn principal(users: &MockAuthRepository, name: &str, role: Role) -> Principal {
        let u = users.seed(name, role).await;
        Principal::new(u.id, role)
    }

    fn input(name: &str) -> EntryInput {
        serde_json::from_value(json!({
            "customerName": name,
            "mobileNumber": "9876543210",
            "address": "12 MG Road",
            "organization": "Asha Group",
            "products": "Routers",
            "type": "Customer",
            "category": "Private",
            "city": "Pune",
            "state": "Maharashtra"
        }))
        .unwrap()
    }

    fn patch(v: serde_json::Value) -> EntryPatch { serde_json::from_value(v).unwrap() }

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let saved = f.svc.create(input("Asha Traders"), &me).await.unwrap();
        assert_eq!(saved.created_by, me.user_id);
        assert_eq!(saved.status, entry::Status::NotFound);
        assert_eq!(saved.remarks, "");

        let listed = f.svc.list(&me).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entry, saved);
        assert_eq!(listed[0].owner.as_ref().map(|o| o.username.as_str()), Some("asha"));
    }

    #[tokio::test]
    async fn create_reports_first_missing_field() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut body = input("Asha Traders");
        body.city = None;
        match f.svc.create(body, &me).await {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, "City is required and must be a non-empty string."),
            other => panic!("unexpected {other:?}"),
        }
        assert!(f.repo.is_empty().await);
    }

    #[tokio::test]
    async fn create_collects_schema_errors() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut body = input("Asha Traders");
        body.mobile_number = Some(RawField::Text("12345".into()));
        body.category = Some(RawField::Text("Public".into()));
        let err = f.svc.create(body, &me).await.unwrap_err();
        let errs = err.schema_errors().expect("schema failure");
        assert_eq!(errs.len(), 2);
        assert!(errs[0].contains("10 digits"));
        assert!(errs[1].starts_with("Category"));
    }

    #[tokio::test]
    async fn list_is_scoped_for_users_and_complete_for_admins() {
        let f = fixture();
        let a = principal(&f.users, "asha", Role::User).await;
        let b = principal(&f.users, "bala", Role::User).await;
        let admin = principal(&f.users, "root", Role::Admin).await;
        f.svc.create(input("From A"), &a).await.unwrap();
        f.svc.create(input("From B"), &b).await.unwrap();

        let mine = f.svc.list(&a).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].entry.customer_name, "From A");
        assert_eq!(f.svc.list(&admin).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn owner_is_null_when_user_is_gone() {
        let f = fixture();
        let a = principal(&f.users, "asha", Role::User).await;
        f.svc.create(input("Orphan"), &a).await.unwrap();
        f.users.remove(a.user_id).await;
        let listed = f.svc.list(&a).await.unwrap();
        assert_eq!(listed[0].owner, None);
    }

    #[tokio::test]
    async fn update_changes_only_present_keys() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let saved = f.svc.create(input("Asha Traders"), &me).await.unwrap();

        // Back-date the stored row so the refresh is observable.
        let mut stale = saved.clone();
        stale.updated_at = (Utc::now() - chrono::Duration::hours(1)).into();
        let stale = f.repo.replace(stale).await.unwrap();

        let updated = f.svc.update(&saved.id.to_string(), patch(json!({ "city": "Mumbai" })), &me).await.unwrap();
        assert_eq!(updated.city, "Mumbai");
        assert!(updated.updated_at > stale.updated_at);

        let listed = f.svc.list(&me).await.unwrap();
        assert_eq!(listed.len(), 1);
        let mut expected = stale.clone();
        expected.city = "Mumbai".into();
        expected.updated_at = listed[0].entry.updated_at;
        assert_eq!(listed[0].entry, expected);
    }

    #[tokio::test]
    async fn update_null_clears_date_absent_keeps_it() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut body = input("Asha Traders");
        body.expected_closing_date = Some(RawField::Text("2099-01-01".into()));
        body.follow_up_date = Some(RawField::Text("2099-02-01".into()));
        let saved = f.svc.create(body, &me).await.unwrap();

        let updated = f
            .svc
            .update(&saved.id.to_string(), patch(json!({ "expectedClosingDate": null })), &me)
            .await
            .unwrap();
        assert_eq!(updated.expected_closing_date, None);
        assert_eq!(updated.follow_up_date, saved.follow_up_date);
    }

    #[tokio::test]
    async fn update_rejects_past_date_and_bad_enum() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let saved = f.svc.create(input("Asha Traders"), &me).await.unwrap();
        let err = f
            .svc
            .update(&saved.id.to_string(), patch(json!({ "followUpDate": "2001-01-01", "type": "Vendor" })), &me)
            .await
            .unwrap_err();
        assert_eq!(err.schema_errors().map(|e| e.len()), Some(2));
    }

    #[tokio::test]
    async fn update_error_paths() {
        let f = fixture();
        let owner = principal(&f.users, "asha", Role::User).await;
        let stranger = principal(&f.users, "bala", Role::User).await;
        let saved = f.svc.create(input("Asha Traders"), &owner).await.unwrap();

        assert!(matches!(f.svc.update("not-an-id", EntryPatch::default(), &owner).await, Err(ServiceError::Validation(_))));
        assert!(matches!(
            f.svc.update(&Uuid::new_v4().to_string(), EntryPatch::default(), &owner).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.update(&saved.id.to_string(), patch(json!({ "city": "Goa" })), &stranger).await,
            Err(ServiceError::Forbidden)
        ));
        let unchanged = f.repo.get(saved.id).await.unwrap().unwrap();
        assert_eq!(unchanged.city, "Pune");
    }

    #[tokio::test]
    async fn delete_requires_owner_or_admin() {
        let f = fixture();
        let owner = principal(&f.users, "asha", Role::User).await;
        let stranger = principal(&f.users, "bala", Role::User).await;
        let admin = principal(&f.users, "root", Role::Admin).await;
        let saved = f.svc.create(input("Asha Traders"), &owner).await.unwrap();
        let id = saved.id.to_string();

        assert!(matches!(f.svc.delete(&id, &stranger).await, Err(ServiceError::Forbidden)));
        assert_eq!(f.repo.len().await, 1);
        f.svc.delete(&id, &admin).await.unwrap();
        assert!(matches!(f.svc.delete(&id, &owner).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn bulk_with_one_invalid_element_writes_nothing() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut bad = input("Bad");
        bad.state = None;
        let err = f.svc.bulk_create(vec![input("One"), bad, input("Three")], &me).await.unwrap_err();
        match err {
            ServiceError::Validation(msg) => assert!(msg.starts_with("entries[1]: State is required")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(f.repo.is_empty().await);
    }

    #[tokio::test]
    async fn bulk_rejects_empty_array() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        assert!(matches!(f.svc.bulk_create(vec![], &me).await, Err(ServiceError::InvalidBatch)));
    }

    #[tokio::test]
    async fn bulk_inserts_in_batches() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let inputs: Vec<_> = (0..BULK_BATCH_SIZE + 3).map(|i| input(&format!("Customer {i}"))).collect();
        let summary = f.svc.bulk_create(inputs, &me).await.unwrap();
        assert_eq!(
            summary,
            BulkSummary { received: BULK_BATCH_SIZE + 3, inserted: (BULK_BATCH_SIZE + 3) as u64, failed: 0, batches: 2, rejected: vec![] }
        );
        assert_eq!(f.repo.len().await, BULK_BATCH_SIZE + 3);
    }

    #[tokio::test]
    async fn bulk_failed_batch_falls_back_per_record() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        f.repo.reject_customer("Poison").await;
        let summary = f.svc.bulk_create(vec![input("One"), input("Poison"), input("Three")], &me).await.unwrap();
        assert_eq!((summary.inserted, summary.failed), (2, 1));
        assert_eq!(summary.rejected[0].index, 1);
        assert_eq!(f.repo.len().await, 2);
    }

    #[tokio::test]
    async fn bulk_skips_schema_invalid_record_and_keeps_siblings() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut short_mobile = input("Short Mobile");
        short_mobile.mobile_number = Some(RawField::Text("987654321".into()));

        let summary = f.svc.bulk_create(vec![input("One"), short_mobile, input("Three")], &me).await.unwrap();
        assert_eq!((summary.received, summary.inserted, summary.failed, summary.batches), (3, 2, 1, 1));
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].index, 1);
        assert_eq!(summary.rejected[0].errors, vec!["Mobile number must be exactly 10 digits".to_string()]);

        let names: HashSet<_> = f.svc.list(&me).await.unwrap().into_iter().map(|e| e.entry.customer_name).collect();
        assert_eq!(names, HashSet::from(["One".to_string(), "Three".to_string()]));
    }

    #[tokio::test]
    async fn bulk_reports_missing_field_before_bad_created_at() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut bad = input("Bad");
        bad.city = None;
        bad.created_at = Some(RawField::Text("yesterday".into()));
        match f.svc.bulk_create(vec![bad], &me).await {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, "entries[0]: City is required and must be a non-empty string."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn bulk_honours_supplied_created_at() {
        let f = fixture();
        let me = principal(&f.users, "asha", Role::User).await;
        let mut old = input("Old");
        old.created_at = Some(RawField::Text("2020-05-01".into()));
        f.svc.bulk_create(vec![old], &me).await.unwrap();
        let listed = f.svc.list(&me).await.unwrap();
        assert_eq!(export::format_date(&listed[0].entry.created_at), "5/1/2020");
    }

    #[tokio::test]
    async fn export_is_scoped_and_substitutes_not_found() {
        let f = fixture();
        let a = principal(&f.users, "asha", Role::User).await;
        let b = principal(&f.users, "bala", Role::User).await;
        f.svc.create(input("From A"), &a).await.unwrap();
        f.svc.create(input("From B"), &b).await.unwrap();

        let file = f.svc.export(&a).await.unwrap();
        assert_eq!(file.filename, "entries.xlsx");
        assert_eq!(file.rows, 1);
        let rows = f.encoder.rows.lock().unwrap().clone();
        assert_eq!(rows[0].customer_name, "From A");
        assert_eq!(rows[0].remarks, "Not Found");
        assert_eq!(rows[0].expected_closing_date, "Not Found");
    }

    #[tokio::test]
    async fn admin_export_covers_every_owner() {
        let f = fixture();
        let a = principal(&f.users, "asha", Role::User).await;
        let b = principal(&f.users, "bala", Role::User).await;
        let admin = principal(&f.users, "root", Role::Admin).await;
        f.svc.create(input("From A"), &a).await.unwrap();
        f.svc.create(input("From B"), &b).await.unwrap();

        let file = f.svc.export(&admin).await.unwrap();
        assert_eq!(file.rows, 2);
        let names: HashSet<_> = f.encoder.rows.lock().unwrap().iter().map(|r| r.customer_name.clone()).collect();
        assert_eq!(names, HashSet::from(["From A".to_string(), "From B".to_string()]));
    }

    #[tokio::test]
    async fn role_reads_stored_user() {
        let f = fixture();
        let admin = principal(&f.users, "root", Role::Admin).await;
        assert!(f.svc.role(&admin).await.unwrap().is_admin);

        let ghost = Principal::new(Uuid::new_v4(), Role::User);
        assert!(matches!(f.svc.role(&ghost).await, Err(ServiceError::NotFound(_))));
    }
}
