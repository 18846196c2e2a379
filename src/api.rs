use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    app_state::AppState,
    error::{ApiError, ApiResult},
    models::{Progress, Roadmap, RoadmapSummary, Section, SectionRef, User},
    parser::RoadmapFormat,
    roadmap_service,
    session::{CurrentIdentity, Identity, MaybeIdentity},
};

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct GeneratePayload {
    #[serde(default)]
    prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    error: bool,
    id: String,
    markdown: String,
    title: String,
    description: String,
    sections: Vec<Section>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinePayload {
    #[serde(default)]
    table: String,
    #[serde(default)]
    user_prompt: String,
    title: Option<String>,
    description: Option<String>,
    format: Option<RoadmapFormat>,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    response: String,
    sections: Vec<Section>,
    title: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoadmapResponse {
    #[serde(flatten)]
    roadmap: Roadmap,
    progress: Progress,
}

impl From<Roadmap> for RoadmapResponse {
    fn from(roadmap: Roadmap) -> Self {
        let progress = roadmap.progress();
        Self { roadmap, progress }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    section_id: Option<String>,
    section_index: Option<usize>,
    completed: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    section: Section,
    progress: Progress,
}

#[derive(Deserialize)]
pub struct SaveVersionPayload {
    #[serde(default)]
    markdown: String,
    prompt: Option<String>,
    format: Option<RoadmapFormat>,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/generate", put(generate_handler).post(generate_handler))
        .route("/api/edit", put(refine_handler).post(refine_handler))
        .route("/api/roadmaps", get(list_roadmaps_handler))
        .route("/api/roadmaps/:id", get(get_roadmap_handler))
        .route("/api/roadmaps/:id/sections", patch(completion_handler))
        .route("/api/roadmaps/:id/versions", post(save_version_handler))
        .route("/api/health", get(health_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn generate_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Result<Json<GeneratePayload>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let user = current_user(&state, &identity).await?;
    let Json(payload) = payload.map_err(bad_json)?;

    if payload.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt field is required".to_string()));
    }
    info!("Generando roadmap para {}", user.email);

    let roadmap = roadmap_service::generate_roadmap(
        state.llm.as_ref(),
        state.store.as_ref(),
        &user,
        &payload.prompt,
    )
    .await?;

    Ok(Json(GenerateResponse {
        error: false,
        id: roadmap.id,
        markdown: roadmap.markdown_content,
        title: roadmap.title,
        description: roadmap.description,
        sections: roadmap.sections,
    }))
}

#[axum::debug_handler]
async fn refine_handler(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    payload: Result<Json<RefinePayload>, JsonRejection>,
) -> ApiResult<Json<RefineResponse>> {
    if state.config.refine_requires_auth {
        let identity = identity.ok_or(ApiError::Unauthenticated)?;
        current_user(&state, &identity).await?;
    }
    let Json(payload) = payload.map_err(bad_json)?;

    let refined = roadmap_service::refine_roadmap(
        state.llm.as_ref(),
        &payload.table,
        &payload.user_prompt,
        payload.format,
    )
    .await?;

    Ok(Json(RefineResponse {
        response: refined.markdown,
        sections: refined.sections,
        title: payload.title,
        description: payload.description,
    }))
}

#[axum::debug_handler]
async fn list_roadmaps_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> ApiResult<Json<Vec<RoadmapSummary>>> {
    let user = current_user(&state, &identity).await?;
    let roadmaps = state
        .store
        .list_roadmaps(&user.id)
        .await
        .map_err(ApiError::store)?;
    Ok(Json(roadmaps))
}

#[axum::debug_handler]
async fn get_roadmap_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<RoadmapResponse>> {
    let user = current_user(&state, &identity).await?;
    let roadmap = roadmap_service::load_owned(state.store.as_ref(), &user, &id).await?;
    Ok(Json(roadmap.into()))
}

#[axum::debug_handler]
async fn completion_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    payload: Result<Json<CompletionPayload>, JsonRejection>,
) -> ApiResult<Json<CompletionResponse>> {
    let user = current_user(&state, &identity).await?;
    let Json(payload) = payload.map_err(bad_json)?;

    let section = match (payload.section_id, payload.section_index) {
        (Some(section_id), _) => SectionRef::Id(section_id),
        (None, Some(index)) => SectionRef::Index(index),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "sectionId or sectionIndex is required".to_string(),
            ))
        }
    };

    let (section, progress) = roadmap_service::set_completion(
        state.store.as_ref(),
        &user,
        &id,
        &section,
        payload.completed,
    )
    .await?;

    Ok(Json(CompletionResponse { section, progress }))
}

#[axum::debug_handler]
async fn save_version_handler(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    payload: Result<Json<SaveVersionPayload>, JsonRejection>,
) -> ApiResult<Json<RoadmapResponse>> {
    let user = current_user(&state, &identity).await?;
    let Json(payload) = payload.map_err(bad_json)?;

    let roadmap = roadmap_service::save_version(
        state.store.as_ref(),
        &user,
        &id,
        &payload.markdown,
        payload.prompt.filter(|p| !p.trim().is_empty()),
        payload.format,
    )
    .await?;

    Ok(Json(roadmap.into()))
}

#[axum::debug_handler]
async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!("Error en el health check del almacén: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// --- Utilidades ---

async fn current_user(state: &AppState, identity: &Identity) -> ApiResult<User> {
    state
        .store
        .find_user_by_email(&identity.email)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| {
            info!("Usuario no encontrado para el email: {}", identity.email);
            ApiError::UserNotFound
        })
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}
