// src/handlers/ws.rs
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::AppState;
use crate::PlayerId;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Client id from the query string, falling back to the `Client-Id` header.
pub fn client_id(params: &WsParams, headers: &HeaderMap) -> PlayerId {
    params
        .client_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| {
            headers
                .get("client-id")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

// GET /api/v1/games/{game_id}?client_id=...
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let client_id = client_id(&params, &headers);
    let service = state.ws.clone();

    ws.on_upgrade(move |socket| async move {
        service.handle_connection(socket, game_id, client_id).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_id_prefers_query() {
        let mut headers = HeaderMap::new();
        headers.insert("client-id", HeaderValue::from_static("from-header"));

        let params = WsParams {
            client_id: Some("from-query".into()),
        };
        assert_eq!(client_id(&params, &headers), "from-query");

        let params = WsParams {
            client_id: Some(String::new()),
        };
        assert_eq!(client_id(&params, &headers), "from-header");

        assert_eq!(client_id(&WsParams::default(), &HeaderMap::new()), "");
    }
}
