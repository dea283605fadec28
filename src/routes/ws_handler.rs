use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use astra_res::ResFile;

#[derive(Serialize)]
struct SignalPayload {
    timestamp: f64,
    value: f64,
    desc: String,
    seq: u64,
    end_flag: bool,
}

/// Streams every sample of one time signal, then an end marker.
pub async fn handle_ws_fetch(
    mut socket: WebSocket,
    reader: Arc<ResFile>,
    index: usize,
    signal_name: String,
) {
    info!("ws_fetch streaming started: {} (index {})", signal_name, index);

    let series = match reader.find_signal(index) {
        Ok(series) => series,
        Err(e) => {
            error!("find_signal failed for {}: {}", signal_name, e);
            return;
        }
    };

    let mut seq: u64 = 0;
    for (&timestamp, &value) in series.timestamps.iter().zip(series.values.iter()) {
        let payload = SignalPayload {
            timestamp,
            value,
            desc: String::new(),
            seq,
            end_flag: false,
        };

        let json = match serde_json::to_string(&payload) {
            Ok(j) => j,
            Err(e) => {
                error!("json serialize error: {}", e);
                return;
            }
        };

        if let Err(e) = socket.send(Message::Text(json.into())).await {
            warn!("ws send failed: {}", e);
            return;
        }

        seq += 1;
    }

    let end_payload = SignalPayload {
        timestamp: 0.0,
        value: 0.0,
        desc: String::new(),
        seq,
        end_flag: true,
    };

    if let Ok(json) = serde_json::to_string(&end_payload) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    info!("ws_fetch finished: {} ({} points)", signal_name, seq);
}
