use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use futures::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::broadcast::ChannelBroadcaster;
use crate::cards::CardColor;
use crate::orchestrator::{HealthStatus, RoomOrchestrator};
use crate::session::{DealSummary, DrawSummary, JoinSummary, PlaySummary, PublicView, RoomEvent};

use super::dto::{
    DealRequest, DrawRequest, JoinRequest, PhaseResponse, PlayRequest, ResetResponse,
};
use super::error::ApiError;

const LOG_TARGET: &str = "server::routes";
const EVENT_BUFFER: usize = 32;

#[derive(Clone)]
pub struct ServerContext {
    pub orchestrator: Arc<RoomOrchestrator>,
    pub broadcaster: Arc<ChannelBroadcaster>,
    pub shutdown: CancellationToken,
}

pub struct RoomServer {
    router: Router,
}

impl RoomServer {
    pub fn new(
        orchestrator: Arc<RoomOrchestrator>,
        broadcaster: Arc<ChannelBroadcaster>,
        shutdown: CancellationToken,
    ) -> Self {
        let context = Arc::new(ServerContext {
            orchestrator,
            broadcaster,
            shutdown,
        });

        let router = Router::new()
            .route("/room/:room_id/join", post(join_room))
            .route("/room/:room_id/start", post(start_game))
            .route("/room/:room_id/deal", post(shuffle_and_deal))
            .route("/room/:room_id/draw", post(draw_card))
            .route("/room/:room_id/play", post(play_card))
            .route("/room/:room_id/end", post(end_game))
            .route("/room/:room_id/reset", post(reset_room))
            .route("/room/:room_id", get(get_room))
            .route("/room/:room_id/events", get(room_events))
            .route("/healthz", get(healthz))
            .layer(Extension(context));

        Self { router }
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn join_room(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinSummary>, ApiError> {
    let summary = ctx.orchestrator.join(&room_id, &request.player).await?;
    Ok(Json(summary))
}

async fn start_game(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
) -> Result<Json<PhaseResponse>, ApiError> {
    let phase = ctx.orchestrator.start(&room_id).await?;
    Ok(Json(PhaseResponse { phase }))
}

/// The only hand-revealing response: hands go to the caller, never onto the
/// event feed.
async fn shuffle_and_deal(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
    Json(request): Json<DealRequest>,
) -> Result<Json<DealSummary>, ApiError> {
    let summary = ctx
        .orchestrator
        .shuffle_and_deal(&room_id, request.player_count, request.cards_per_player)
        .await?;
    Ok(Json(summary))
}

async fn draw_card(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
    Json(request): Json<DrawRequest>,
) -> Result<Json<DrawSummary>, ApiError> {
    let summary = ctx.orchestrator.draw(&room_id, &request.player).await?;
    Ok(Json(summary))
}

async fn play_card(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
    Json(request): Json<PlayRequest>,
) -> Result<Json<PlaySummary>, ApiError> {
    let declared_color = request
        .declared_color
        .as_deref()
        .map(str::parse::<CardColor>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let summary = ctx
        .orchestrator
        .play(&room_id, &request.player, &request.card, declared_color)
        .await?;
    Ok(Json(summary))
}

async fn end_game(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
) -> Result<Json<PhaseResponse>, ApiError> {
    let phase = ctx.orchestrator.end(&room_id).await?;
    Ok(Json(PhaseResponse { phase }))
}

async fn reset_room(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
) -> Json<ResetResponse> {
    ctx.orchestrator.reset(&room_id).await;
    Json(ResetResponse { status: "reset" })
}

async fn get_room(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
) -> Result<Json<PublicView>, ApiError> {
    ctx.orchestrator
        .inspect(&room_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("room {room_id} does not exist")))
}

async fn healthz(Extension(ctx): Extension<Arc<ServerContext>>) -> Json<HealthStatus> {
    Json(ctx.orchestrator.health())
}

/// SSE feed of a room's broadcast channel. Subscribing does not create the
/// room; events published before the subscription are not replayed.
async fn room_events(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Path(room_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = ctx.broadcaster.subscribe(&room_id);
    let stop = ctx.shutdown.clone();
    let (event_tx, event_rx) = mpsc::channel::<RoomEvent>(EVENT_BUFFER);

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = stop.cancelled() => break,
                received = updates.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            target = LOG_TARGET,
                            room_id = %room_id,
                            skipped,
                            "subscriber lagged behind the room feed"
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let stream = ReceiverStream::new(event_rx).map(|event| {
        let data = serde_json::to_string(&event)
            .unwrap_or_else(|err| json!({ "error": err.to_string() }).to_string());
        Ok::<Event, Infallible>(Event::default().event("room_event").data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text(":\n"),
    )
}
