//! `/api` entry handlers. Every handler runs behind [`super::auth::require_bearer_token`],
//! which supplies the caller's [`Principal`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use common::types::ApiResponse;
use models::entry;
use service::entry::domain::{BulkSummary, EntryInput, EntryPatch, EntryWithOwner, Principal};
use service::errors::ServiceError;

use super::auth::ServerState;
use crate::errors::JsonApiError;

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub success: bool,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[utoipa::path(post, path = "/api/entry", tag = "entries", request_body = crate::openapi::EntryRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation failed"), (status = 401, description = "Unauthorized")))]
pub async fn create_entry(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<EntryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<entry::Model>>), JsonApiError> {
    let Json(input) = body.map_err(JsonApiError::bad_body)?;
    let saved = state.entries.create(input, &principal).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(saved, "Entry created successfully."))))
}

#[utoipa::path(get, path = "/api/fetch-entry", tag = "entries", responses((status = 200, description = "Entries visible to the caller"), (status = 401, description = "Unauthorized")))]
pub async fn fetch_entries(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<EntryWithOwner>>, JsonApiError> {
    let entries = state
        .entries
        .list(&principal)
        .await
        .map_err(|e| JsonApiError::service(e, "Failed to fetch entries"))?;
    Ok(Json(entries))
}

#[utoipa::path(delete, path = "/api/entry/{id}", tag = "entries", params(("id" = String, Path, description = "Entry id")), responses((status = 200, description = "Deleted"), (status = 400, description = "Invalid entry ID"), (status = 403, description = "Not the owner"), (status = 404, description = "Entry not found")))]
pub async fn delete_entry(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, JsonApiError> {
    state
        .entries
        .delete(&id, &principal)
        .await
        .map_err(|e| JsonApiError::service(e, "Error deleting entry"))?;
    Ok(Json(ApiResponse::acknowledged("Entry deleted successfully")))
}

#[utoipa::path(put, path = "/api/editentry/{id}", tag = "entries", params(("id" = String, Path, description = "Entry id")), request_body = crate::openapi::EntryPatchRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation failed"), (status = 403, description = "Not the owner"), (status = 404, description = "Entry not found")))]
pub async fn edit_entry(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<entry::Model>>, JsonApiError> {
    let Json(patch) = body.map_err(JsonApiError::bad_body)?;
    let updated = state
        .entries
        .update(&id, patch, &principal)
        .await
        .map_err(|e| JsonApiError::service(e, "Error updating entry"))?;
    Ok(Json(ApiResponse::ok(updated, "Entry updated successfully")))
}

#[utoipa::path(get, path = "/api/export", tag = "entries", responses((status = 200, description = "xlsx workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"), (status = 401, description = "Unauthorized")))]
pub async fn export_entries(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Response, JsonApiError> {
    let file = state
        .entries
        .export(&principal)
        .await
        .map_err(|e| JsonApiError::service(e, "Error exporting entries"))?;
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename={}", file.filename)),
    ];
    Ok((headers, file.bytes).into_response())
}

/// Anything other than a non-empty array is "Invalid data format"; element
/// failures are reported as "Failed to upload entries" with the reason in `error`.
#[utoipa::path(post, path = "/api/entries", tag = "entries", request_body = [crate::openapi::EntryRequest], responses((status = 201, description = "Uploaded", body = crate::openapi::BulkSummaryDoc), (status = 400, description = "Invalid data or failed upload")))]
pub async fn bulk_upload(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<Vec<EntryInput>>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<BulkSummary>>), JsonApiError> {
    let Json(inputs) = body.map_err(|rejection| {
        JsonApiError::new(StatusCode::BAD_REQUEST, ServiceError::InvalidBatch.to_string(), Some(rejection.body_text()))
    })?;
    let summary = state.entries.bulk_create(inputs, &principal).await.map_err(|e| match e {
        ServiceError::InvalidBatch => JsonApiError::from(e),
        ServiceError::Validation(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Failed to upload entries", Some(msg)),
        other => JsonApiError::new(StatusCode::BAD_REQUEST, "Failed to upload entries", Some(other.to_string())),
    })?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(summary, "Entries uploaded successfully!"))))
}

#[utoipa::path(get, path = "/api/user-role", tag = "entries", responses((status = 200, description = "Role flag", body = crate::openapi::RoleResponseDoc), (status = 404, description = "User not found")))]
pub async fn user_role(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<RoleResponse>, JsonApiError> {
    let info = state.entries.role(&principal).await?;
    Ok(Json(RoleResponse { success: true, is_admin: info.is_admin }))
}
