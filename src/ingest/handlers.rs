use std::sync::Arc;

use axum::extract::Multipart;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::handler::IngestHandler;
use super::types::PartDisposition;
use crate::error::IngestError;
use crate::journal::JournalFactory;

/// `POST /import`: walk the multipart stream and feed its lifecycle events
/// into the ingestion state machine.
pub async fn handle_import(
    Extension(factory): Extension<Arc<JournalFactory>>,
    mut multipart: Multipart,
) -> Response {
    let mut handler = IngestHandler::new(factory);

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!("multipart stream failed: {}", err);
                handler.on_teardown("multipart stream error");
                return error_response(&IngestError::Disconnected);
            }
        };

        let part = PartDisposition::new(
            field.name().unwrap_or("").to_string(),
            field.file_name().map(str::to_string),
        );
        if let Err(err) = handler.on_part_begin(&part) {
            return error_response(&err);
        }

        loop {
            match field.chunk().await {
                Ok(Some(bytes)) => {
                    if let Err(err) = handler.on_data(&bytes) {
                        handler.on_teardown("upload error");
                        return error_response(&err);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!("client went away mid-part: {}", err);
                    handler.on_teardown("client disconnected");
                    return error_response(&IngestError::Disconnected);
                }
            }
        }

        if let Err(err) = handler.on_part_end() {
            return error_response(&err);
        }
    }

    let body = handler.on_complete();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

/// `GET /health`.
pub async fn handle_health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Map the error taxonomy onto HTTP. Field-level rejections close the
/// connection; importer failures are server-side errors.
fn error_response(err: &IngestError) -> Response {
    let status = match err {
        IngestError::UnrecognisedField | IngestError::BadJournalName(_) => StatusCode::BAD_REQUEST,
        IngestError::Disconnected => StatusCode::BAD_REQUEST,
        IngestError::SchemaIncompatible { .. } | IngestError::Importer(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        [(header::CONNECTION, "close")],
        err.to_string(),
    )
        .into_response()
}
