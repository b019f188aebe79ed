use serde::Deserialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// `Admin` or `User`; defaults to `User`
    pub role: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub customer_name: String,
    pub mobile_number: String,
    pub address: String,
    pub organization: String,
    pub products: String,
    /// `Partner` or `Customer`
    #[serde(rename = "type")]
    pub entry_type: String,
    /// `Private` or `Government`
    pub category: String,
    pub city: String,
    pub state: String,
    /// `Interested`, `Not Interested`, `Maybe` or `Not Found`
    pub status: Option<String>,
    pub expected_closing_date: Option<String>,
    pub follow_up_date: Option<String>,
    pub remarks: Option<String>,
    /// Bulk import only
    pub created_at: Option<String>,
}

/// Every key optional; `null` clears dates.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatchRequest {
    pub customer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub organization: Option<String>,
    pub products: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub expected_closing_date: Option<String>,
    pub follow_up_date: Option<String>,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct RejectedRecordDoc { pub index: usize, pub errors: Vec<String> }

#[derive(ToSchema)]
pub struct BulkSummaryDoc {
    pub received: usize,
    pub inserted: u64,
    pub failed: u64,
    pub batches: usize,
    pub rejected: Vec<RejectedRecordDoc>,
}

#[derive(Deserialize, ToSchema)]
pub struct RoleResponseDoc {
    pub success: bool,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(ToSchema)]
pub struct OwnerDoc { pub id: Uuid, pub username: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::entries::create_entry,
        crate::routes::entries::fetch_entries,
        crate::routes::entries::delete_entry,
        crate::routes::entries::edit_entry,
        crate::routes::entries::export_entries,
        crate::routes::entries::bulk_upload,
        crate::routes::entries::user_role,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            EntryRequest,
            EntryPatchRequest,
            BulkSummaryDoc,
            RejectedRecordDoc,
            RoleResponseDoc,
            OwnerDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "entries")
    )
)]
pub struct ApiDoc;
