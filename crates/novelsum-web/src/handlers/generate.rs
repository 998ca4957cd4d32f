use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use novelsum_core::{CoreError, GenerationTicket, ProgressEvent, generate_summaries};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Stream both summaries for the session's current document and params.
///
/// Refused with a JSON error before the stream opens when the session has
/// no readable document.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = state
        .sessions
        .get_mut(&id)
        .ok_or_else(ApiError::session_not_found)?
        .begin_generation()?;

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);

    tokio::spawn(async move {
        if let Err(e) = run_generation(state, id, ticket, tx.clone()).await {
            let _ = tx
                .send(Ok(sse_event("error", &ErrorEvent { message: e })))
                .await;
        }
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

async fn run_generation(
    state: Arc<AppState>,
    id: String,
    ticket: GenerationTicket,
    tx: mpsc::Sender<Result<Event, Infallible>>,
) -> Result<(), String> {
    // Cancel the pipeline if the client goes away
    let cancel = CancellationToken::new();
    let watcher = {
        let tx = tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tx.closed().await;
            cancel.cancel();
        })
    };

    let tx_progress = tx.clone();
    let result = generate_summaries(
        ticket.document.clone(),
        ticket.params,
        &state.neural,
        &state.graph_rank,
        move |event| send_progress_event(&tx_progress, &event),
        cancel,
    )
    .await;
    watcher.abort();

    let outputs = match result {
        Ok(outputs) => outputs,
        Err(CoreError::Cancelled) => {
            tracing::info!(session = %id, "client disconnected, generation abandoned");
            return Ok(());
        }
        Err(e) => {
            tracing::warn!(session = %id, error = %e, "generation failed");
            return Err(e.to_string());
        }
    };

    let stored = match state.sessions.get_mut(&id) {
        Some(mut session) => match session.record_summaries(&ticket, outputs.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::info!(session = %id, error = %e, "discarding summaries");
                false
            }
        },
        None => false,
    };

    send(
        &tx,
        "complete",
        &CompleteEvent {
            neural: outputs.neural,
            graph_rank: outputs.graph_rank,
            stored,
        },
    )
    .await
}

/// Convert a core ProgressEvent to an SSE event and send it without blocking.
fn send_progress_event(tx: &mpsc::Sender<Result<Event, Infallible>>, event: &ProgressEvent) {
    let sse = match event {
        ProgressEvent::NeuralStarted { .. } => sse_event(
            "progress",
            &ProgressEventJson {
                stage: "neural",
                message: NEURAL_PROGRESS,
            },
        ),
        ProgressEvent::NeuralComplete { summary, elapsed } => sse_event(
            "neural_summary",
            &SummaryEventJson {
                summary: summary.clone(),
                elapsed_ms: elapsed.as_millis() as u64,
            },
        ),
        ProgressEvent::GraphRankStarted { .. } => sse_event(
            "progress",
            &ProgressEventJson {
                stage: "graph_rank",
                message: GRAPH_PROGRESS,
            },
        ),
        ProgressEvent::GraphRankComplete { summary, elapsed } => sse_event(
            "graph_summary",
            &SummaryEventJson {
                summary: summary.clone(),
                elapsed_ms: elapsed.as_millis() as u64,
            },
        ),
    };
    let _ = tx.try_send(Ok(sse));
}

async fn send<T: serde::Serialize>(
    tx: &mpsc::Sender<Result<Event, Infallible>>,
    event_type: &str,
    data: &T,
) -> Result<(), String> {
    tx.send(Ok(sse_event(event_type, data)))
        .await
        .map_err(|_| "Client disconnected".to_string())
}
