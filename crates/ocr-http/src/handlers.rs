//! The three routes: synchronous conversion, async submit, async poll.
//!
//! Bodies are decoded as [`serde_json::Value`] maps rather than strongly
//! typed structs — `image_data` must stay a single JSON string (base64
//! bytes) rather than growing per-field typing, matching this system's
//! choice to keep the wire shape intentionally narrow.

use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use ocr_core::{OcrAdapter, ServiceError, TaskServiceApi};
use ocr_workers::Notifier;
use serde_json::json;

use crate::error::{request_error_response, service_error_response, RequestError};

/// Handles shared by every request.
pub struct AppState {
    pub task_service: Arc<dyn TaskServiceApi>,
    pub ocr_adapter: OcrAdapter,
    pub ocr_notifier: Notifier,
    pub deletion_notifier: Notifier,
}

fn parse_image_data(body: &Bytes) -> Result<Vec<u8>, RequestError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| RequestError::InvalidJson)?;
    let encoded = value
        .get("image_data")
        .and_then(|v| v.as_str())
        .ok_or(RequestError::MissingField("image_data"))?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| RequestError::InvalidBase64)
}

fn parse_task_id(body: &Bytes) -> Result<String, RequestError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| RequestError::InvalidJson)?;
    value
        .get("task_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or(RequestError::MissingField("task_id"))
}

/// JSON success body plus status, ready for the transport layer to write
/// out. Kept as plain data so `server.rs` is the only place that touches
/// `hyper` response types directly.
pub struct JsonResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// `POST /image-sync`: runs OCR inline and returns the extracted text. No
/// task is created — this path never touches the coordinator.
pub async fn handle_image_sync(state: &AppState, body: Bytes) -> JsonResponse {
    let content = match parse_image_data(&body) {
        Ok(c) => c,
        Err(e) => {
            let (status, err) = request_error_response(&e);
            return JsonResponse {
                status: status.as_u16(),
                body: serde_json::to_value(err).unwrap(),
            };
        }
    };

    match state.ocr_adapter.apply_ocr(&content).await {
        Ok(text) => JsonResponse {
            status: 200,
            body: json!({ "text": text }),
        },
        Err(e) => {
            let (status, err) = service_error_response(&e);
            JsonResponse {
                status: status.as_u16(),
                body: serde_json::to_value(err).unwrap(),
            }
        }
    }
}

/// `POST /image`: creates a `pending` task and wakes the OCR pool. Returns
/// the `open_task_id` the caller polls `GET /image` with.
pub async fn handle_image_submit(state: &AppState, body: Bytes) -> JsonResponse {
    let content = match parse_image_data(&body) {
        Ok(c) => c,
        Err(e) => {
            let (status, err) = request_error_response(&e);
            return JsonResponse {
                status: status.as_u16(),
                body: serde_json::to_value(err).unwrap(),
            };
        }
    };

    match state.task_service.create_task(content).await {
        Ok(open_task_id) => {
            state.ocr_notifier.notify();
            JsonResponse {
                status: 200,
                body: json!({ "task_id": open_task_id }),
            }
        }
        Err(e) => {
            let (status, err) = service_error_response(&e);
            JsonResponse {
                status: status.as_u16(),
                body: serde_json::to_value(err).unwrap(),
            }
        }
    }
}

/// `GET /image`: polls a task by id. The deletion pool is woken
/// unconditionally after every call, whether or not this particular read
/// advanced the task's state — matching how the original service notifies
/// on every read rather than only on the `complete -> deleted` transition.
/// See DESIGN.md.
pub async fn handle_image_get(state: &AppState, body: Bytes) -> JsonResponse {
    let task_id = match parse_task_id(&body) {
        Ok(id) => id,
        Err(e) => {
            let (status, err) = request_error_response(&e);
            return JsonResponse {
                status: status.as_u16(),
                body: serde_json::to_value(err).unwrap(),
            };
        }
    };

    let result = state.task_service.get_task(&task_id).await;
    state.deletion_notifier.notify();

    match result {
        Ok(view) => JsonResponse {
            status: 200,
            body: json!({ "text": view.caption }),
        },
        // Both are informational, not failures: the HTTP contract renders
        // them identically as a literal "null" string, never a JSON null,
        // matching the coordinator's literal response shape.
        Err(ServiceError::TaskIsPending) | Err(ServiceError::TaskIsDeleted) => JsonResponse {
            status: 200,
            body: json!({ "text": "null" }),
        },
        Err(e) => {
            let (status, err) = service_error_response(&e);
            JsonResponse {
                status: status.as_u16(),
                body: serde_json::to_value(err).unwrap(),
            }
        }
    }
}

/// Fallback for anything not matching the three routes.
pub fn not_found() -> JsonResponse {
    let (status, err) = service_error_response(&ServiceError::NoRecordFound);
    JsonResponse {
        status: status.as_u16(),
        body: serde_json::to_value(err).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_core::TaskService;
    use ocr_store::{InMemoryImageStore, InMemoryTaskStore};

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xde, 0x00, 0x00, 0x00, 0x0c, 0x49, 0x44, 0x41, 0x54, 0x08, 0xd7, 0x63, 0xf8,
        0xcf, 0xc0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0x18, 0xdd, 0x8d, 0xb0, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    fn new_state_with_stores() -> (AppState, InMemoryTaskStore, InMemoryImageStore) {
        let (ocr_notifier, _ocr_rx) = Notifier::channel(100);
        let (deletion_notifier, _deletion_rx) = Notifier::channel(100);
        let tasks = InMemoryTaskStore::new();
        let images = InMemoryImageStore::new();
        let state = AppState {
            task_service: Arc::new(TaskService::new(tasks.clone(), images.clone())),
            ocr_adapter: OcrAdapter::new(),
            ocr_notifier,
            deletion_notifier,
        };
        (state, tasks, images)
    }

    fn new_state() -> AppState {
        new_state_with_stores().0
    }

    fn encode(body: &[u8]) -> Bytes {
        let encoded = base64::engine::general_purpose::STANDARD.encode(body);
        Bytes::from(json!({ "image_data": encoded }).to_string())
    }

    #[tokio::test]
    async fn submit_then_get_unknown_id_behaves_correctly() {
        let state = new_state();

        let resp = handle_image_get(
            &state,
            Bytes::from(json!({ "task_id": "does-not-exist" }).to_string()),
        )
        .await;
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn submit_creates_a_pending_task_pollable_immediately() {
        let state = new_state();

        let submit = handle_image_submit(&state, encode(PNG_1X1)).await;
        assert_eq!(submit.status, 200);
        let task_id = submit.body["task_id"].as_str().unwrap().to_string();

        let poll = handle_image_get(
            &state,
            Bytes::from(json!({ "task_id": task_id }).to_string()),
        )
        .await;
        assert_eq!(poll.status, 200);
        assert_eq!(poll.body["text"], "null");
    }

    #[tokio::test]
    async fn second_read_after_consume_also_renders_literal_null() {
        use ocr_store::{TaskFilter, TaskPatch, TaskStatus, TaskStore};

        let (state, tasks, _images) = new_state_with_stores();

        let submit = handle_image_submit(&state, encode(PNG_1X1)).await;
        let task_id = submit.body["task_id"].as_str().unwrap().to_string();

        // Simulate what the OCR worker does, bypassing the pool.
        let row = tasks
            .get(
                TaskFilter {
                    open_task_id: Some(task_id.clone()),
                    ..Default::default()
                },
                &[],
            )
            .await
            .unwrap();
        tasks
            .update(
                None,
                TaskPatch {
                    id: row.id,
                    task_status: Some(TaskStatus::Complete),
                    caption: Some("extracted text".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let first = handle_image_get(
            &state,
            Bytes::from(json!({ "task_id": task_id }).to_string()),
        )
        .await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["text"], "extracted text");

        let second = handle_image_get(
            &state,
            Bytes::from(json!({ "task_id": task_id }).to_string()),
        )
        .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["text"], "null");
    }

    #[tokio::test]
    async fn submit_rejects_non_image_bytes() {
        let state = new_state();
        let resp = handle_image_submit(&state, encode(b"not an image")).await;
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["error"], "unsupported_image_type");
    }

    #[tokio::test]
    async fn get_with_malformed_body_is_bad_request() {
        let state = new_state();
        let resp = handle_image_get(&state, Bytes::from_static(b"not json")).await;
        assert_eq!(resp.status, 400);
    }
}
