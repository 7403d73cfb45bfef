use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::articles;
use crate::llm::ChatMessage;
use crate::state::AppState;
use crate::uploads;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/agno_chat", post(agno_chat))
        .route("/api/presentation", post(presentation))
        .route("/api/project", post(project))
        .route("/api/info", post(info))
        .route("/api/chat/commercial", post(chat_commercial))
        .route("/api/context", post(get_context))
        .route("/api/query", post(query))
        .route("/api/upload", post(upload_file))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/:id", get(get_article))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommercialRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Bienvenue sur l'API Portfolio",
        "endpoints": {
            "health": "/api/health",
            "chat": "/api/chat",
            "context": "/api/context",
            "query": "/api/query",
            "upload": "/api/upload",
            "agno_chat": "/api/agno_chat",
            "presentation": "/api/presentation",
            "project": "/api/project",
            "info": "/api/info",
            "commercial": "/api/chat/commercial",
            "articles": "/api/articles"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Single-agent chat: knowledge context + the portfolio system prompt.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let context = state.knowledge.read().await.relevant_context(&req.message);

    let mut messages = vec![
        ChatMessage::system(state.prompts.system_prompt.clone()),
        ChatMessage::system(state.prompts.response_instructions.clone()),
    ];
    if !context.is_empty() {
        messages.push(ChatMessage::system(format!(
            "Contexte pertinent pour la question : {}",
            context
        )));
    }
    messages.push(ChatMessage::user(req.message.clone()));

    match state.llm.chat(messages, None).await {
        Ok(response) => Ok(Json(json!({
            "response": response,
            "context": context,
        }))),
        Err(e) => {
            error!("Error in chat: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

/// Team chat: routed through the agent roster with session continuity.
async fn agno_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<Value> {
    let context = state.knowledge.read().await.relevant_context(&req.message);
    let envelope = state
        .team
        .generate_response(&req.message, &context, req.session_id)
        .await;
    Json(json!(envelope))
}

async fn presentation(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<Value> {
    let tagged = format!("[PRÉSENTATION] {}", req.message);
    let context = state.knowledge.read().await.relevant_context(&req.message);
    let envelope = state.team.generate_response(&tagged, &context, None).await;
    Json(json!(envelope))
}

/// Project questions run through commercial qualification, so the
/// conversation can continue toward a meeting.
async fn project(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<Value> {
    let tagged = format!("[PROJET COMMERCIAL] {} - BESOIN DE QUALIFICATION", req.message);
    let context = state.knowledge.read().await.relevant_context(&tagged);
    let envelope = state
        .team
        .generate_response(&tagged, &context, req.session_id)
        .await;
    Json(json!(envelope))
}

async fn info(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<Value> {
    let tagged = format!("[INFO] {}", req.message);
    let context = state.knowledge.read().await.relevant_context(&req.message);
    let envelope = state.team.generate_response(&tagged, &context, None).await;
    Json(json!(envelope))
}

/// Commercial discussions keep their own session across turns.
async fn chat_commercial(
    State(state): State<AppState>,
    Json(req): Json<CommercialRequest>,
) -> Json<Value> {
    match &req.session_id {
        Some(id) => info!("Commercial call, session: {}", session_id_prefix(id)),
        None => info!("Commercial call, new session"),
    }

    let tagged = format!(
        "[COMMERCIAL] {} - BESOIN D'AIDE COMMERCIALE - QUALIFICATION DE PROJET",
        req.query
    );
    let envelope = state
        .team
        .generate_response(&tagged, &req.context, req.session_id)
        .await;
    Json(json!(envelope))
}

fn validate_upload_extension(filename: &str) -> Result<(), (StatusCode, Json<Value>)> {
    if !uploads::allowed_file(filename) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "File type not allowed" })),
        ));
    }
    Ok(())
}

/// First 8 characters of a session id for log lines. Ids are opaque
/// client strings, so this has to cut on char boundaries, not bytes.
fn session_id_prefix(id: &str) -> String {
    id.chars().take(8).collect()
}

async fn get_context(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<Value> {
    let context = state.knowledge.read().await.relevant_context(&req.message);
    Json(json!({ "context": context }))
}

/// Direct model answer, without the portfolio persona.
async fn query(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let messages = vec![
        ChatMessage::system(
            "Tu es un assistant utile qui répond aux questions de manière concise et précise.",
        ),
        ChatMessage::user(req.message),
    ];

    match state.llm.chat(messages, None).await {
        Ok(response) => Ok(Json(json!({ "response": response }))),
        Err(e) => {
            error!("Error in query: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Invalid multipart body: {}", e) })),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "No selected file" })),
                )
            })?;

        validate_upload_extension(&filename)?;

        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Failed to read file: {}", e) })),
            )
        })?;

        let saved = uploads::save_upload(&state.config.upload_dir, &filename, &data)
            .await
            .map_err(|e| {
                error!("Error in upload endpoint: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
            })?;

        // Plain-text uploads also feed the knowledge store.
        let is_text = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if is_text {
            if let Ok(content) = String::from_utf8(data.to_vec()) {
                state.knowledge.write().await.add(&content, &filename);
                info!("Added uploaded {} to knowledge base", filename);
            }
        }

        return Ok(Json(json!({
            "message": "File uploaded successfully",
            "filename": saved.file_name().map(|n| n.to_string_lossy().to_string()),
        })));
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No file part" })),
    ))
}

async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match articles::list_articles(&state.config.articles_dir) {
        Ok(list) => Ok(Json(json!(list))),
        Err(e) => {
            error!("Error listing articles: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match articles::get_article(&state.config.articles_dir, &id) {
        Ok(Some(article)) => Ok(Json(json!(article))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Article not found: {}", id) })),
        )),
        Err(e) => {
            error!("Error loading article {}: {}", id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_is_healthy() {
        let Json(body) = health_check().await;
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let Json(body) = root().await;
        assert_eq!(body["endpoints"]["health"], "/api/health");
        assert_eq!(body["endpoints"]["commercial"], "/api/chat/commercial");
    }

    #[test]
    fn test_session_id_prefix_handles_multibyte_ids() {
        // "€" is 3 bytes; a byte slice at 8 would land inside a char.
        assert_eq!(session_id_prefix("€€€€"), "€€€€");
        assert_eq!(session_id_prefix("éeéeéeéeée"), "éeéeéeée");
        assert_eq!(session_id_prefix("abcdefghij"), "abcdefgh");
        assert_eq!(session_id_prefix(""), "");
    }

    #[test]
    fn test_disallowed_extension_maps_to_400() {
        let (status, Json(body)) = validate_upload_extension("script.exe").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File type not allowed");

        assert!(validate_upload_extension("cv.pdf").is_ok());
        assert!(validate_upload_extension("notes.md").is_err());
    }
}
