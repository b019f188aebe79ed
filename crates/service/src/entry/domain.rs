//! Request and response shapes for the entry use cases.

use common::Patch;
use models::entry::{self, DateChecks, EntryDraft};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validator;
use crate::errors::ServiceError;

pub use crate::auth::domain::Principal;

/// A JSON value as sent by the client, kept apart from its string form so the
/// required-field check can tell `"x"` from `5`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Text(String),
    Other(serde_json::Value),
}

impl RawField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawField::Text(s) => Some(s),
            RawField::Other(_) => None,
        }
    }

    /// Lenient text: non-string scalars use their JSON rendering.
    pub fn to_text(&self) -> String {
        match self {
            RawField::Text(s) => s.trim().to_string(),
            RawField::Other(v) => v.to_string(),
        }
    }
}

/// Body of `POST /entry` and each element of `POST /entries`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    #[serde(default)]
    pub customer_name: Option<RawField>,
    #[serde(default)]
    pub mobile_number: Option<RawField>,
    #[serde(default)]
    pub address: Option<RawField>,
    #[serde(default)]
    pub organization: Option<RawField>,
    #[serde(default)]
    pub products: Option<RawField>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<RawField>,
    #[serde(default)]
    pub category: Option<RawField>,
    #[serde(default)]
    pub city: Option<RawField>,
    #[serde(default)]
    pub state: Option<RawField>,
    #[serde(default)]
    pub status: Option<RawField>,
    #[serde(default)]
    pub expected_closing_date: Option<RawField>,
    #[serde(default)]
    pub follow_up_date: Option<RawField>,
    #[serde(default)]
    pub remarks: Option<RawField>,
    /// Honoured by bulk import only.
    #[serde(default)]
    pub created_at: Option<RawField>,
}

fn text(field: &Option<RawField>) -> String {
    field.as_ref().map(RawField::to_text).unwrap_or_default()
}

impl EntryInput {
    /// Required fields in the order they are checked.
    pub fn required_fields(&self) -> [(&'static str, Option<&RawField>); 9] {
        [
            ("customerName", self.customer_name.as_ref()),
            ("mobileNumber", self.mobile_number.as_ref()),
            ("address", self.address.as_ref()),
            ("state", self.state.as_ref()),
            ("city", self.city.as_ref()),
            ("products", self.products.as_ref()),
            ("type", self.entry_type.as_ref()),
            ("organization", self.organization.as_ref()),
            ("category", self.category.as_ref()),
        ]
    }

    /// Required-field and date-format checks, then the trimmed draft.
    pub fn to_draft(&self) -> Result<EntryDraft, ServiceError> {
        validator::validate_required(&self.required_fields())?;
        let expected_closing_date = validator::validate_date("expectedClosingDate", self.expected_closing_date.as_ref())?;
        let follow_up_date = validator::validate_date("followUpDate", self.follow_up_date.as_ref())?;
        Ok(EntryDraft {
            customer_name: text(&self.customer_name),
            mobile_number: text(&self.mobile_number),
            address: text(&self.address),
            organization: text(&self.organization),
            products: text(&self.products),
            entry_type: text(&self.entry_type),
            category: text(&self.category),
            city: text(&self.city),
            state: text(&self.state),
            status: text(&self.status),
            expected_closing_date,
            follow_up_date,
            remarks: text(&self.remarks),
        })
    }
}

/// Body of `PUT /editentry/:id`. Missing keys keep the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default)]
    pub customer_name: Patch<String>,
    #[serde(default)]
    pub mobile_number: Patch<String>,
    #[serde(default)]
    pub address: Patch<String>,
    #[serde(default)]
    pub organization: Patch<String>,
    #[serde(default)]
    pub products: Patch<String>,
    #[serde(default, rename = "type")]
    pub entry_type: Patch<String>,
    #[serde(default)]
    pub category: Patch<String>,
    #[serde(default)]
    pub city: Patch<String>,
    #[serde(default)]
    pub state: Patch<String>,
    #[serde(default)]
    pub status: Patch<String>,
    #[serde(default)]
    pub expected_closing_date: Patch<String>,
    #[serde(default)]
    pub follow_up_date: Patch<String>,
    #[serde(default)]
    pub remarks: Patch<String>,
}

fn patch_text(target: &mut String, patch: &Patch<String>) {
    match patch {
        Patch::Absent => {}
        Patch::Null => target.clear(),
        Patch::Value(v) => *target = v.trim().to_string(),
    }
}

/// Returns whether a new date was written (and so must be checked against today).
fn patch_date(
    label: &str,
    target: &mut Option<DateTimeWithTimeZone>,
    patch: &Patch<String>,
) -> Result<bool, ServiceError> {
    match patch {
        Patch::Absent => Ok(false),
        Patch::Null => {
            *target = None;
            Ok(false)
        }
        Patch::Value(v) => {
            *target = validator::parse_date_text(label, v)?;
            Ok(target.is_some())
        }
    }
}

impl EntryPatch {
    /// Merge present keys into `draft`.
    ///
    /// `null` on a text field empties it: required fields then fail validation,
    /// `type` and `status` fall back to their defaults. `null` or `""` on a date
    /// clears it.
    pub fn apply_to(&self, draft: &mut EntryDraft) -> Result<DateChecks, ServiceError> {
        patch_text(&mut draft.customer_name, &self.customer_name);
        patch_text(&mut draft.mobile_number, &self.mobile_number);
        patch_text(&mut draft.address, &self.address);
        patch_text(&mut draft.organization, &self.organization);
        patch_text(&mut draft.products, &self.products);
        patch_text(&mut draft.entry_type, &self.entry_type);
        patch_text(&mut draft.category, &self.category);
        patch_text(&mut draft.city, &self.city);
        patch_text(&mut draft.state, &self.state);
        patch_text(&mut draft.status, &self.status);
        patch_text(&mut draft.remarks, &self.remarks);
        Ok(DateChecks {
            expected_closing_date: patch_date(
                "expectedClosingDate",
                &mut draft.expected_closing_date,
                &self.expected_closing_date,
            )?,
            follow_up_date: patch_date("followUpDate", &mut draft.follow_up_date, &self.follow_up_date)?,
        })
    }
}

/// Display join of an entry's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRef {
    pub id: Uuid,
    pub username: String,
}

/// List item: the stored entry plus its owner (null when the user is gone).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryWithOwner {
    #[serde(flatten)]
    pub entry: entry::Model,
    pub owner: Option<OwnerRef>,
}

/// A bulk element that was skipped, with every reason it was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub index: usize,
    pub errors: Vec<String>,
}

/// Outcome of a bulk import. `failed == rejected.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub received: usize,
    pub inserted: u64,
    pub failed: u64,
    pub batches: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl BulkSummary {
    pub(crate) fn reject(&mut self, index: usize, errors: Vec<String>) {
        self.failed += 1;
        self.rejected.push(RejectedRecord { index, errors });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub is_admin: bool,
}
