//! `entry` entity: one customer/sales lead, owned by the user in `created_by`.
//!
//! Field constraints live here, next to the table definition, so every write path
//! (single create, edit, bulk import) goes through the same checks before the row
//! reaches Postgres. [`EntryDraft::validate`] collects every violation instead of
//! stopping at the first one.

use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors, user};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryType {
    #[sea_orm(string_value = "Partner")]
    Partner,
    #[sea_orm(string_value = "Customer")]
    Customer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Category {
    #[sea_orm(string_value = "Private")]
    Private,
    #[sea_orm(string_value = "Government")]
    Government,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Status {
    #[sea_orm(string_value = "Interested")]
    Interested,
    #[sea_orm(string_value = "Not Interested")]
    #[serde(rename = "Not Interested")]
    NotInterested,
    #[sea_orm(string_value = "Maybe")]
    Maybe,
    #[sea_orm(string_value = "Not Found")]
    #[serde(rename = "Not Found")]
    NotFound,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Partner => "Partner",
            EntryType::Customer => "Customer",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Partner" => Some(EntryType::Partner),
            "Customer" => Some(EntryType::Customer),
            _ => None,
        }
    }
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Private => "Private",
            Category::Government => "Government",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Private" => Some(Category::Private),
            "Government" => Some(Category::Government),
            _ => None,
        }
    }
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Interested => "Interested",
            Status::NotInterested => "Not Interested",
            Status::Maybe => "Maybe",
            Status::NotFound => "Not Found",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Interested" => Some(Status::Interested),
            "Not Interested" => Some(Status::NotInterested),
            "Maybe" => Some(Status::Maybe),
            "Not Found" => Some(Status::NotFound),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_name: String,
    pub mobile_number: String,
    pub address: String,
    pub organization: String,
    pub products: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: Category,
    pub city: String,
    pub state: String,
    pub status: Status,
    pub expected_closing_date: Option<DateTimeWithTimeZone>,
    pub follow_up_date: Option<DateTimeWithTimeZone>,
    pub remarks: String,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::CreatedBy)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Owner.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Trimmed field values for one entry, before the constraint checks.
///
/// Enum fields stay as text here so an out-of-set value produces a field message
/// instead of a decode failure. An empty `entry_type` / `status` means "use the
/// default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDraft {
    pub customer_name: String,
    pub mobile_number: String,
    pub address: String,
    pub organization: String,
    pub products: String,
    pub entry_type: String,
    pub category: String,
    pub city: String,
    pub state: String,
    pub status: String,
    pub expected_closing_date: Option<DateTimeWithTimeZone>,
    pub follow_up_date: Option<DateTimeWithTimeZone>,
    pub remarks: String,
}

/// Which date fields are being written and must not lie in the past.
/// Dates carried over unchanged from a stored record are not re-checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateChecks {
    pub expected_closing_date: bool,
    pub follow_up_date: bool,
}

impl DateChecks {
    pub const ALL: DateChecks = DateChecks { expected_closing_date: true, follow_up_date: true };
}

/// Output of a successful [`EntryDraft::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntryValues {
    pub customer_name: String,
    pub mobile_number: String,
    pub address: String,
    pub organization: String,
    pub products: String,
    pub entry_type: EntryType,
    pub category: Category,
    pub city: String,
    pub state: String,
    pub status: Status,
    pub expected_closing_date: Option<DateTimeWithTimeZone>,
    pub follow_up_date: Option<DateTimeWithTimeZone>,
    pub remarks: String,
}

fn check_len(errors: &mut Vec<String>, label: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len == 0 && min > 0 {
        errors.push(format!("{label} is required"));
    } else if len < min {
        let unit = if min == 1 { "character" } else { "characters" };
        errors.push(format!("{label} must be at least {min} {unit}"));
    } else if len > max {
        errors.push(format!("{label} cannot exceed {max} characters"));
    }
}

fn is_mobile_number(s: &str) -> bool {
    s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Compared against the write instant: earlier today already counts as past.
fn is_past(date: &DateTimeWithTimeZone, now: DateTime<Utc>) -> bool {
    date.with_timezone(&Utc) < now
}

impl EntryDraft {
    pub fn validate(&self, checks: DateChecks, now: DateTime<Utc>) -> Result<EntryValues, errors::ModelError> {
        let mut errs = Vec::new();

        check_len(&mut errs, "Customer name", &self.customer_name, 1, 100);
        if !is_mobile_number(&self.mobile_number) {
            errs.push("Mobile number must be exactly 10 digits".to_string());
        }
        check_len(&mut errs, "Address", &self.address, 5, 200);
        check_len(&mut errs, "Organization", &self.organization, 1, 100);
        check_len(&mut errs, "Products", &self.products, 1, 100);

        let entry_type = if self.entry_type.is_empty() {
            Some(EntryType::Customer)
        } else {
            EntryType::parse(&self.entry_type)
        };
        if entry_type.is_none() {
            errs.push("Type must be either 'Partner' or 'Customer'".to_string());
        }
        let category = Category::parse(&self.category);
        if category.is_none() {
            errs.push("Category must be either 'Private' or 'Government'".to_string());
        }

        check_len(&mut errs, "City", &self.city, 1, 50);
        check_len(&mut errs, "State", &self.state, 2, 50);

        let status = if self.status.is_empty() {
            Some(Status::NotFound)
        } else {
            Status::parse(&self.status)
        };
        if status.is_none() {
            errs.push("Status must be either 'Interested', 'Not Interested', 'Maybe' or 'Not Found'".to_string());
        }

        if checks.expected_closing_date {
            if let Some(d) = &self.expected_closing_date {
                if is_past(d, now) {
                    errs.push("Expected closing date cannot be in the past".to_string());
                }
            }
        }
        if checks.follow_up_date {
            if let Some(d) = &self.follow_up_date {
                if is_past(d, now) {
                    errs.push("Follow-up date cannot be in the past".to_string());
                }
            }
        }
        if self.remarks.chars().count() > 500 {
            errs.push("Remarks cannot exceed 500 characters".to_string());
        }

        match (entry_type, category, status) {
            (Some(entry_type), Some(category), Some(status)) if errs.is_empty() => Ok(EntryValues {
                customer_name: self.customer_name.clone(),
                mobile_number: self.mobile_number.clone(),
                address: self.address.clone(),
                organization: self.organization.clone(),
                products: self.products.clone(),
                entry_type,
                category,
                city: self.city.clone(),
                state: self.state.clone(),
                status,
                expected_closing_date: self.expected_closing_date,
                follow_up_date: self.follow_up_date,
                remarks: self.remarks.clone(),
            }),
            _ => Err(errors::ModelError::Schema(errs)),
        }
    }
}

impl EntryValues {
    pub fn into_model(self, id: Uuid, created_by: Uuid, created_at: DateTimeWithTimeZone, updated_at: DateTimeWithTimeZone) -> Model {
        Model {
            id,
            customer_name: self.customer_name,
            mobile_number: self.mobile_number,
            address: self.address,
            organization: self.organization,
            products: self.products,
            entry_type: self.entry_type,
            category: self.category,
            city: self.city,
            state: self.state,
            status: self.status,
            expected_closing_date: self.expected_closing_date,
            follow_up_date: self.follow_up_date,
            remarks: self.remarks,
            created_by,
            created_at,
            updated_at,
        }
    }
}

impl Model {
    /// Current values as a draft, the starting point for a partial update.
    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            customer_name: self.customer_name.clone(),
            mobile_number: self.mobile_number.clone(),
            address: self.address.clone(),
            organization: self.organization.clone(),
            products: self.products.clone(),
            entry_type: self.entry_type.as_str().to_string(),
            category: self.category.as_str().to_string(),
            city: self.city.clone(),
            state: self.state.clone(),
            status: self.status.as_str().to_string(),
            expected_closing_date: self.expected_closing_date,
            follow_up_date: self.follow_up_date,
            remarks: self.remarks.clone(),
        }
    }

    /// Replace every mutable field; `id`, `created_by` and `created_at` are kept.
    pub fn apply(self, values: EntryValues, updated_at: DateTimeWithTimeZone) -> Model {
        values.into_model(self.id, self.created_by, self.created_at, updated_at)
    }
}

pub async fn insert(db: &DatabaseConnection, model: Model) -> Result<Model, errors::ModelError> {
    ActiveModel::from(model).reset_all().insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Multi-row insert in one statement. Returns the number of rows written.
pub async fn insert_many(db: &DatabaseConnection, models: Vec<Model>) -> Result<u64, errors::ModelError> {
    if models.is_empty() {
        return Ok(0);
    }
    let rows = models.into_iter().map(|m| ActiveModel::from(m).reset_all());
    Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// All entries, or only those owned by `owner`, oldest first.
pub async fn find_scoped(db: &DatabaseConnection, owner: Option<Uuid>) -> Result<Vec<Model>, errors::ModelError> {
    let mut q = Entity::find();
    if let Some(owner) = owner {
        q = q.filter(Column::CreatedBy.eq(owner));
    }
    q.order_by_asc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn update(db: &DatabaseConnection, model: Model) -> Result<Model, errors::ModelError> {
    ActiveModel::from(model).reset_all().update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
