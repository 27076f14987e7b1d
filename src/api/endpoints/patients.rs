//! Read endpoints over stored patient records.

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::router::ApiContext;
use crate::api::types::ListQuery;
use crate::pipeline::StructuredRecord;

/// `GET /api/patients`
pub async fn list_patients(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StructuredRecord>>, ApiError> {
    let records = ctx.store.list_recent(query.limit)?;
    Ok(Json(records))
}

/// `GET /api/patient/:id`
///
/// The identifier may be a native record id, an extracted patientId, or
/// a first name; resolution order lives in the store.
pub async fn get_patient(
    State(ctx): State<ApiContext>,
    Path(identifier): Path<String>,
) -> Result<Json<StructuredRecord>, ApiError> {
    match ctx.store.find_by_identifier(&identifier)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::PatientNotFound),
    }
}
