use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    goal_id: Option<String>,
    #[serde(default)]
    goal_title: Option<String>,
    #[serde(default)]
    goal_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBody {
    #[serde(default)]
    spark_id: Option<String>,
    #[serde(default)]
    goal_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let sparks = state.service.list_sparks(&user, &goal_id)?;
    Ok(Json(json!({ "sparks": sparks })))
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let Json(body) = body?;

    let spark = state
        .service
        .generate_spark(
            &user,
            body.goal_id.as_deref().unwrap_or_default(),
            body.goal_title.as_deref().unwrap_or_default(),
            body.goal_description.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "spark": spark })))
}

pub async fn complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CompleteBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let Json(body) = body?;

    let completion = state.service.complete_spark(
        &user,
        body.spark_id.as_deref().unwrap_or_default(),
        body.goal_id.as_deref().unwrap_or_default(),
        body.session_id.as_deref().unwrap_or_default(),
        body.notes.as_deref(),
    )?;
    Ok(Json(json!({ "completion": completion })))
}
