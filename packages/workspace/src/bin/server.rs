use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use clap::Parser;
use futures::stream::{self, Stream};
use overlay_editor::{EditorError, Mutation, MutationOutcome, DEFAULT_HISTORY_DEPTH};
use overlay_model::{ElementId, NewScene, Scene, SceneId, ScenePatch};
use overlay_workspace::{
    config::DEFAULT_AUTOSAVE_DEBOUNCE_MS, Envelope, EventRegistry, FileSceneStore, LiveFrame,
    LiveSession, LiveTarget, LocalTransport, MemorySceneStore, SceneService, SceneStore,
    StorageError, Workspace, WorkspaceConfig, WorkspaceError,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "overlay_workspace=info,overlay_server=info,tower_http=info";

/// Overlay Studio server - scene storage, headless editor and live overlay feed
#[derive(Parser, Debug)]
#[command(name = "overlay-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, env = "OVERLAY_PORT", default_value_t = 3030)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "OVERLAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Directory holding one JSON file per scene (in-memory if omitted)
    #[arg(long, env = "OVERLAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Autosave quiet period in milliseconds
    #[arg(long, env = "OVERLAY_AUTOSAVE_MS", default_value_t = DEFAULT_AUTOSAVE_DEBOUNCE_MS)]
    autosave_ms: u64,

    /// Undo levels kept by the editor session
    #[arg(long, env = "OVERLAY_HISTORY_DEPTH", default_value_t = DEFAULT_HISTORY_DEPTH)]
    history_depth: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let config = WorkspaceConfig {
        autosave_debounce_ms: args.autosave_ms,
        history_depth: args.history_depth,
        ..WorkspaceConfig::default()
    };

    let storage: Arc<dyn SceneStore> = match &args.data_dir {
        Some(dir) => Arc::new(
            FileSceneStore::open(dir)
                .await
                .with_context(|| format!("failed to open scene directory {}", dir.display()))?,
        ),
        None => {
            warn!("no --data-dir given, scenes are kept in memory");
            Arc::new(MemorySceneStore::new())
        }
    };

    let transport = Arc::new(LocalTransport::new());
    tokio::spawn(log_events(transport.tap()));
    let registry = EventRegistry::new(transport.clone());
    let service = SceneService::new(storage, transport);

    if service.list().await?.is_empty() {
        let scene = service.create(NewScene::named("Main Scene")).await?;
        if let Some(id) = scene.id {
            service.activate(id).await?;
        }
        info!("created initial scene");
    }

    let editor = Workspace::open(config.clone(), service.clone(), &registry).await?;
    let live = LiveSession::start(&config, service.clone(), &registry, LiveTarget::Active).await?;

    let state = Arc::new(HttpState {
        service,
        editor: editor.clone(),
        live,
    });

    let app = Router::new()
        .route("/api/scenes", get(list_scenes_handler).post(create_scene_handler))
        .route(
            "/api/scenes/:id",
            put(update_scene_handler).delete(delete_scene_handler),
        )
        .route("/api/scenes/:id/activate", post(activate_scene_handler))
        .route("/api/events/:name", post(publish_event_handler))
        .route("/api/overlay", get(overlay_handler))
        .route("/api/overlay/stream", get(overlay_sse_handler))
        .route("/api/editor", get(editor_handler))
        .route("/api/editor/mutation", post(mutation_handler))
        .route("/api/editor/save", post(save_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, data_dir = ?args.data_dir, "overlay server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Pending edits are written before exit
    if let Err(err) = editor.flush().await {
        error!(error = %err, "failed to write pending edits on shutdown");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// Trace every envelope crossing the transport.
async fn log_events(mut tap: broadcast::Receiver<Envelope>) {
    loop {
        match tap.recv().await {
            Ok(envelope) => debug!(event = %envelope.event, "transport event"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("[events] tap lagged by {} messages", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// ============================================================================
// HTTP API
// ============================================================================

struct HttpState {
    service: SceneService,
    editor: Workspace,
    live: LiveSession,
}

struct ApiError(WorkspaceError);

impl From<WorkspaceError> for ApiError {
    fn from(err: WorkspaceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WorkspaceError::Storage(StorageError::NotFound(_))
            | WorkspaceError::Editor(EditorError::SceneNotFound(_)) => StatusCode::NOT_FOUND,
            WorkspaceError::Editor(EditorError::Model(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkspaceError::Editor(_) => StatusCode::BAD_REQUEST,
            WorkspaceError::NoCurrentScene | WorkspaceError::ActiveSceneDelete(_) => {
                StatusCode::CONFLICT
            }
            WorkspaceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- Scenes ---

async fn list_scenes_handler(State(state): State<Arc<HttpState>>) -> ApiResult<Json<Vec<Scene>>> {
    Ok(Json(state.service.list().await?))
}

async fn create_scene_handler(
    State(state): State<Arc<HttpState>>,
    Json(scene): Json<NewScene>,
) -> ApiResult<(StatusCode, Json<Scene>)> {
    let created = state.service.create(scene).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_scene_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<SceneId>,
    Json(patch): Json<ScenePatch>,
) -> ApiResult<Json<Scene>> {
    Ok(Json(state.service.update(id, patch).await?))
}

async fn delete_scene_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<SceneId>,
) -> ApiResult<Json<Value>> {
    if state.service.delete(id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(WorkspaceError::Storage(StorageError::NotFound(id)).into())
    }
}

async fn activate_scene_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<SceneId>,
) -> ApiResult<Json<Scene>> {
    Ok(Json(state.service.activate(id).await?))
}

// --- Upstream events ---

async fn publish_event_handler(
    State(state): State<Arc<HttpState>>,
    Path(name): Path<String>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    // scene-* events are only published by storage writes
    if name.starts_with("scene-") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("event name {name} is reserved") })),
        );
    }
    state.service.publish_event(&name, payload);
    (StatusCode::ACCEPTED, Json(json!({ "event": name })))
}

// --- Live overlay ---

async fn overlay_handler(State(state): State<Arc<HttpState>>) -> Json<LiveFrame> {
    Json(state.live.frame())
}

fn frame_event(frame: &LiveFrame) -> Event {
    let json = serde_json::to_string(frame).unwrap_or_default();
    Event::default().event("frame").data(json)
}

/// SSE endpoint streaming every live frame, starting with the current one
async fn overlay_sse_handler(
    State(state): State<Arc<HttpState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut frames = state.live.frames();
    let initial_event = frame_event(&frames.borrow_and_update());
    info!(scene = ?state.live.scene_id(), "starting overlay stream");

    let initial_stream = stream::once(async move { Ok(initial_event) });
    let frame_stream = stream::unfold(frames, |mut frames| async move {
        match frames.changed().await {
            Ok(()) => {
                let event = frame_event(&frames.borrow_and_update());
                Some((Ok(event), frames))
            }
            Err(_) => {
                info!("[SSE] live session closed");
                None
            }
        }
    });

    Sse::new(initial_stream.chain(frame_stream)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

// --- Headless editor ---

#[derive(Debug, Serialize)]
struct EditorView {
    scenes: Vec<Scene>,
    current_scene_id: Option<SceneId>,
    selection: Vec<ElementId>,
    can_undo: bool,
    can_redo: bool,
    revision: u64,
    saving: bool,
    pending_save: bool,
    last_save_error: Option<String>,
}

impl EditorView {
    fn of(editor: &Workspace) -> Self {
        let mut view = editor.read(|store| Self {
            scenes: store.scenes().to_vec(),
            current_scene_id: store.current_scene_id(),
            selection: store.selection().to_vec(),
            can_undo: store.history().can_undo(),
            can_redo: store.history().can_redo(),
            revision: store.revision(),
            saving: false,
            pending_save: false,
            last_save_error: None,
        });
        view.saving = editor.is_saving();
        view.pending_save = editor.has_pending_save();
        view.last_save_error = editor.last_save_error();
        view
    }
}

#[derive(Debug, Serialize)]
struct MutationResponse {
    outcome: MutationOutcome,
    editor: EditorView,
}

async fn editor_handler(State(state): State<Arc<HttpState>>) -> Json<EditorView> {
    Json(EditorView::of(&state.editor))
}

async fn mutation_handler(
    State(state): State<Arc<HttpState>>,
    Json(mutation): Json<Mutation>,
) -> ApiResult<Json<MutationResponse>> {
    debug!(?mutation, "applying editor mutation");
    let outcome = state.editor.apply(mutation)?;
    Ok(Json(MutationResponse {
        outcome,
        editor: EditorView::of(&state.editor),
    }))
}

async fn save_handler(State(state): State<Arc<HttpState>>) -> ApiResult<Json<EditorView>> {
    state.editor.force_save().await?;
    Ok(Json(EditorView::of(&state.editor)))
}
