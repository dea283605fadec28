use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use astra_res::{FrameSelector, ResError, ResFile};

use crate::routes::ws_handler::handle_ws_fetch;
use crate::state::app_state::{AppState, SignalInfo};
use crate::utils::conf_helper::get_cached_config;

#[derive(Serialize)]
pub struct ReaderSummary {
    pub id: String,
    pub signals_count: usize,
    pub profiles_count: usize,
    pub frames_count: usize,
    pub headers: Vec<String>,
}

/// Response for GET /readers/{id}/headers
#[derive(Serialize)]
pub struct ReaderHeaders {
    pub id: String,
    pub headers: Vec<String>,
    pub profiles: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct FileReadRequest {
    pub mode: String, // "online" | "offline"
    pub path: String,
}

#[derive(Serialize, Debug)]
pub struct FileReadResponse {
    pub id: String,
    pub name: String,
    pub path: String,
    pub source: String,
    pub headers: Option<Vec<String>>,
    pub desc: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ProfileQuery {
    pub index: Option<usize>,
    pub time: Option<f64>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub time: f64,
    pub radius: Vec<f64>,
    pub values: Vec<f64>,
}

/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/read-file", post(read_file))
        .route("/fetch/{signal}", get(ws_fetch))
        .route("/readers", get(list_readers))
        .route("/readers/{id}", delete(remove_reader))
        .route("/readers/{id}/headers", get(reader_headers))
        .route("/readers/{id}/profiles/{name}", get(reader_profile))
        .with_state(state)
}

fn exposed(names: &[String], skip_unnamed: bool) -> impl Iterator<Item = &String> {
    names
        .iter()
        .filter(move |name| !(skip_unnamed && name.starts_with('#')))
}

/// Picks a unique registered name for every exposed time signal, paired with
/// its catalog index. `taken` reports names already registered.
fn assign_signal_names<F>(names: &[String], skip_unnamed: bool, taken: F) -> Vec<(String, usize)>
where
    F: Fn(&str) -> bool,
{
    let mut assigned: Vec<(String, usize)> = Vec::new();
    for (index, base_name) in names.iter().enumerate() {
        if skip_unnamed && base_name.starts_with('#') {
            continue;
        }
        let is_taken = |name: &str| taken(name) || assigned.iter().any(|(a, _)| a == name);

        let mut final_name = base_name.clone();
        let mut i = 1;
        while is_taken(final_name.as_str()) {
            final_name = format!("{}_{}", base_name, i);
            i += 1;
        }
        assigned.push((final_name, index));
    }
    assigned
}

fn status_for(err: &ResError) -> StatusCode {
    match err {
        ResError::NameNotFound(_) => StatusCode::NOT_FOUND,
        ResError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =======================
/// HANDLERS
/// =======================

async fn read_file(
    State(state): State<AppState>,
    Json(request): Json<FileReadRequest>,
) -> Response {
    debug!("Reading file: mode={}, path={}", request.mode, request.path);

    // Decoding is blocking file I/O.
    let path = request.path.clone();
    let opened = tokio::task::spawn_blocking(move || ResFile::open(path)).await;
    let reader = match opened {
        Ok(Ok(r)) => Arc::new(r),
        Ok(Err(e)) => {
            error!("Failed to open file {}: {}", request.path, e);
            return StatusCode::UNPROCESSABLE_ENTITY.into_response();
        }
        Err(e) => {
            error!("Reader task failed for {}: {}", request.path, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    for diagnostic in reader.diagnostics() {
        warn!("{}: {:?}", request.path, diagnostic);
    }

    let file_id = Uuid::new_v4().to_string();
    let skip_unnamed = get_cached_config().configuration.skip_unnamed;
    let mut exposed_headers = Vec::new();
    let mut signals = state.signals.write().await;

    // Names must be unique across all opened files.
    let assigned = assign_signal_names(reader.time_names(), skip_unnamed, |name| {
        signals.contains_key(name)
    });
    for (final_name, index) in assigned {
        let base_name = reader.time_names()[index].clone();
        info!("Register signal: {} (original: {})", final_name, base_name);

        signals.insert(
            final_name.clone(),
            SignalInfo {
                reader: reader.clone(),
                reader_id: file_id.clone(),
                index,
                original_name: base_name,
            },
        );

        exposed_headers.push(final_name);
    }
    drop(signals);

    state
        .readers
        .write()
        .await
        .insert(file_id.clone(), reader.clone());

    let file_name = std::path::Path::new(&request.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let header = reader.header();
    let summary = reader.summary();

    Json(FileReadResponse {
        id: file_id,
        name: file_name,
        path: request.path.clone(),
        source: request.path,
        headers: Some(exposed_headers),
        desc: Some(format!("{} {} {}", summary.rd_name, summary.eq_name, summary.xline1)),
        tags: Some(vec![summary.version]),
        created_at: header.created().map(|d| d.to_string()),
        source_url: None,
    })
    .into_response()
}

async fn ws_fetch(
    State(state): State<AppState>,
    Path(signal_name): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let signal_info = {
        let signals = state.signals.read().await;
        signals.get(&signal_name).cloned()
    };

    let signal_info = match signal_info {
        Some(info) => info,
        None => {
            error!("Signal not found: {}", signal_name);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    ws.on_upgrade(move |socket| {
        handle_ws_fetch(
            socket,
            signal_info.reader,
            signal_info.index,
            signal_info.original_name,
        )
    })
}

async fn list_readers(State(state): State<AppState>) -> impl IntoResponse {
    let skip_unnamed = get_cached_config().configuration.skip_unnamed;
    let readers = state.readers.read().await;

    let mut out: Vec<ReaderSummary> = readers
        .iter()
        .map(|(id, reader)| ReaderSummary {
            id: id.clone(),
            signals_count: reader.signal_count(),
            profiles_count: reader.profile_count(),
            frames_count: reader.frame_count(),
            headers: exposed(reader.time_names(), skip_unnamed).cloned().collect(),
        })
        .collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));

    Json(out)
}

/// Drops a reader and every signal registered from it.
async fn remove_reader(
    State(state): State<AppState>,
    Path(reader_id): Path<String>,
) -> StatusCode {
    if state.readers.write().await.remove(&reader_id).is_none() {
        return StatusCode::NOT_FOUND;
    }

    let mut signals = state.signals.write().await;
    let before = signals.len();
    signals.retain(|_, info| info.reader_id != reader_id);
    info!(
        "Removed reader {} and {} signals",
        reader_id,
        before - signals.len()
    );
    StatusCode::NO_CONTENT
}

async fn reader_headers(
    State(state): State<AppState>,
    Path(reader_id): Path<String>,
) -> impl IntoResponse {
    let reader = match state.readers.read().await.get(&reader_id).cloned() {
        Some(reader) => reader,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    let skip_unnamed = get_cached_config().configuration.skip_unnamed;
    Json(ReaderHeaders {
        id: reader_id,
        headers: exposed(reader.time_names(), skip_unnamed).cloned().collect(),
        profiles: exposed(reader.rad_names(), skip_unnamed).cloned().collect(),
    })
    .into_response()
}

async fn reader_profile(
    State(state): State<AppState>,
    Path((reader_id, name)): Path<(String, String)>,
    Query(query): Query<ProfileQuery>,
) -> Response {
    let reader = match state.readers.read().await.get(&reader_id).cloned() {
        Some(reader) => reader,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    let at = match (query.index, query.time) {
        (Some(index), _) => FrameSelector::Index(index),
        (None, Some(time)) => FrameSelector::Time(time),
        (None, None) => return StatusCode::BAD_REQUEST.into_response(),
    };

    match reader.find_profile(name.as_str(), at) {
        Ok(view) => Json(ProfileResponse {
            name,
            time: view.time,
            radius: view.radius.to_vec(),
            values: view.values.to_vec(),
        })
        .into_response(),
        Err(e) => {
            debug!("Profile {} of {} not served: {}", name, reader_id, e);
            status_for(&e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposed_skips_synthetic_names() {
        let names: Vec<String> = ["#time", "<ne>", "#last", "Ip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let shown: Vec<&String> = exposed(&names, true).collect();
        assert_eq!(shown, ["<ne>", "Ip"]);
        assert_eq!(exposed(&names, false).count(), 4);
    }

    #[test]
    fn test_assign_signal_names_by_index() {
        let names: Vec<String> = ["#time", "<ne>", "Ip", "<ne>"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let assigned = assign_signal_names(&names, true, |name| name == "Ip");
        assert_eq!(
            assigned,
            vec![
                ("<ne>".to_string(), 1),
                ("Ip_1".to_string(), 2),
                ("<ne>_1".to_string(), 3),
            ]
        );

        let all = assign_signal_names(&names, false, |_| false);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], ("#time".to_string(), 0));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ResError::NameNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_for(&ResError::EndOfStream), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
