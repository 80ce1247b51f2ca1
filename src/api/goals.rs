use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{double_option, AppState};
use crate::error::ApiResult;
use crate::service::GoalPatch;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(default)]
    status: Option<String>,
}

pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let goals = state.service.list_goals(&user)?;
    Ok(Json(json!({ "goals": goals })))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateGoalBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = state.caller(&headers).await?;
    let Json(body) = body?;

    let goal = state.service.create_goal(
        &user,
        body.title.as_deref().unwrap_or_default(),
        body.description.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(json!({ "goal": goal }))))
}

pub async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let goal = state.service.get_goal(&user, &id)?;
    Ok(Json(json!({ "goal": goal })))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateGoalBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let Json(body) = body?;

    let goal = state.service.update_goal(
        &user,
        &id,
        GoalPatch {
            title: body.title,
            description: body.description,
            status: body.status,
        },
    )?;
    Ok(Json(json!({ "goal": goal })))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    state.service.delete_goal(&user, &id)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn completed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = state.caller(&headers).await?;
    let (goal, completed) = state.service.completed_sparks(&user, &id)?;
    Ok(Json(json!({ "goal": goal, "completedSparks": completed })))
}
