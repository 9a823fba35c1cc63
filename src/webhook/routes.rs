//! Webhook endpoint handlers
//!
//! # Security
//!
//! Every body must carry an `X-Signature` header with the hex HMAC-SHA256 of
//! the raw body bytes. The body is kept as raw bytes until the signature is
//! checked, so re-serialized JSON can never pass verification. Bodies past
//! the size limit are hashed while streaming, never buffered whole.

use super::security::BodySignature;
use crate::{
    api::{self, webhook::InboundWebhook},
    consts,
    endpoints::{AppState, errors::ApiError, respond},
    models::request::RequestContext,
};
use futures::StreamExt;
use ntex::{http::error::PayloadError, util::BytesMut, web};
use serde_json::json;

/// Configures webhook routes.
///
/// # Routes
/// - `POST /webhook` - Signed message receiver
pub fn webhook(cfg: &mut web::ServiceConfig) {
    cfg.service(receive);
}

enum ReceivedBody {
    Complete(BytesMut),
    /// Past [`consts::WEBHOOK_MAX_BODY_BYTES`]; only the digest was kept,
    /// `None` when there is no secret to hash with
    Oversized(Option<BodySignature>),
}

/// Buffers the body up to the size limit. Past it, the rest of the stream is
/// still fed to the HMAC so the signature can be checked on every byte.
async fn read_body(
    mut payload: web::types::Payload,
    secret: Option<&str>,
) -> Result<ReceivedBody, PayloadError> {
    let mut body = BytesMut::new();
    let mut oversized: Option<Option<BodySignature>> = None;

    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;

        if let Some(digest) = oversized.as_mut() {
            if let Some(digest) = digest {
                digest.update(&chunk);
            }
            continue;
        }

        if body.len() + chunk.len() > consts::WEBHOOK_MAX_BODY_BYTES {
            let mut digest = secret.map(BodySignature::new);
            if let Some(digest) = digest.as_mut() {
                digest.update(&body);
                digest.update(&chunk);
            }
            body.clear();
            oversized = Some(digest);
        } else {
            body.extend_from_slice(&chunk);
        }
    }

    Ok(match oversized {
        Some(digest) => ReceivedBody::Oversized(digest),
        None => ReceivedBody::Complete(body),
    })
}

/// Webhook receiver endpoint (POST)
///
/// # Returns
/// - 200 `{"status":"ok"}` when the message was stored or already known
/// - 401 when the signature is missing or does not match
/// - 422 when the payload is not a valid message or is too large
/// - 500 when the store fails, so the sender retries
#[web::post("/webhook")]
pub async fn receive(
    ctx: RequestContext,
    req: web::HttpRequest,
    payload: web::types::Payload,
    app_state: web::types::State<AppState>,
) -> web::HttpResponse {
    let signature = req
        .headers()
        .get(consts::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let secret = app_state.webhook_secret.as_deref();

    let result = match read_body(payload, secret).await {
        Ok(ReceivedBody::Complete(body)) => api::webhook::ingest_webhook(
            &ctx,
            secret,
            InboundWebhook {
                raw_body: &body,
                signature,
            },
            &app_state.repo,
            &app_state.observer,
        )
        .await
        .map(|_| web::HttpResponse::Ok().json(&json!({ "status": "ok" })))
        .map_err(ApiError::from),
        Ok(ReceivedBody::Oversized(digest)) => Err(ApiError::from(
            api::webhook::reject_oversized(&ctx, digest, signature, &app_state.observer),
        )),
        Err(e) => {
            logfire::warn!(
                "Failed to read webhook body: {error}",
                error = e.to_string()
            );
            Err(ApiError::BadRequest(e.to_string()))
        }
    };

    respond(&req, &app_state, &ctx, result)
}

#[cfg(test)]
mod tests {
    use crate::{
        endpoints::testing::{SECRET, init_test_app, json_body, sqlite_state, state_with_repo},
        metric::WebhookResult,
        repo::{MessageRepo, MockMessageRepo},
        webhook::security,
    };
    use ntex::{http::StatusCode, web::test};
    use serde_json::json;

    const BODY: &[u8] = br#"{"message_id":"m_test_1","from":"+919876543210","to":"+14155550100","ts":"2025-01-15T10:00:00Z","text":"Hello Test"}"#;

    fn signed_request(body: &[u8]) -> test::TestRequest {
        let signature = security::sign(SECRET, body).unwrap();
        test::TestRequest::post()
            .uri("/webhook")
            .header("X-Signature", signature.as_str())
            .set_payload(body.to_vec())
    }

    #[ntex::test]
    async fn test_receive_accepts_and_deduplicates() {
        let (state, store, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        for _ in 0..2 {
            let response = test::call_service(&app, signed_request(BODY).to_request()).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().contains_key("x-request-id"));
            assert_eq!(json_body(response).await, json!({ "status": "ok" }));
        }

        let stats = store.get_stats(10).await.unwrap();
        assert_eq!(stats.total_messages, 1);
        assert_eq!(sink.webhook_count(WebhookResult::Created), 1);
        assert_eq!(sink.webhook_count(WebhookResult::Duplicate), 1);
        assert_eq!(sink.http_count("/webhook", 200), 2);
    }

    #[ntex::test]
    async fn test_receive_rejects_bad_signature() {
        let (state, store, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        let wrong = test::TestRequest::post()
            .uri("/webhook")
            .header("X-Signature", "123")
            .set_payload(BODY.to_vec())
            .to_request();
        let response = test::call_service(&app, wrong).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({ "detail": "invalid signature" }));

        let missing = test::TestRequest::post()
            .uri("/webhook")
            .set_payload(BODY.to_vec())
            .to_request();
        let response = test::call_service(&app, missing).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(store.get_stats(10).await.unwrap().total_messages, 0);
        assert_eq!(sink.webhook_count(WebhookResult::InvalidSignature), 2);
        assert_eq!(sink.http_count("/webhook", 401), 2);
    }

    #[ntex::test]
    async fn test_receive_without_configured_secret_is_unauthorized() {
        let (state, store, _) = sqlite_state(None).await;
        let app = init_test_app!(state);

        let response = test::call_service(&app, signed_request(BODY).to_request()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(store.get_stats(10).await.unwrap().total_messages, 0);
    }

    #[ntex::test]
    async fn test_receive_rejects_invalid_payload() {
        let (state, store, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        let body = br#"{"message_id":"m2","from":"919876543210","to":"+14155550100","ts":"2025-01-15T10:00:00Z"}"#;
        let response = test::call_service(&app, signed_request(body).to_request()).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("'from'"), "{detail}");

        let response = test::call_service(&app, signed_request(b"{not json").to_request()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(store.get_stats(10).await.unwrap().total_messages, 0);
        assert_eq!(sink.webhook_count(WebhookResult::ValidationError), 2);
    }

    #[ntex::test]
    async fn test_receive_text_length_boundary() {
        let (state, store, _) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        let at_limit = serde_json::to_vec(&json!({
            "message_id": "m_long_ok",
            "from": "+911",
            "to": "+14155550100",
            "ts": "2025-01-15T10:00:00Z",
            "text": "x".repeat(4096),
        }))
        .unwrap();
        let response = test::call_service(&app, signed_request(&at_limit).to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let over_limit = serde_json::to_vec(&json!({
            "message_id": "m_long_bad",
            "from": "+911",
            "to": "+14155550100",
            "ts": "2025-01-15T10:00:00Z",
            "text": "x".repeat(4097),
        }))
        .unwrap();
        let response = test::call_service(&app, signed_request(&over_limit).to_request()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert!(store.get_message_by_id("m_long_ok").await.unwrap().is_some());
        assert!(store.get_message_by_id("m_long_bad").await.unwrap().is_none());
    }

    #[ntex::test]
    async fn test_receive_storage_failure_is_server_error() {
        let mut mock_repo = MockMessageRepo::new();
        mock_repo
            .expect_insert_message()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("database is locked")));
        let (state, sink) = state_with_repo(Box::new(mock_repo), Some(SECRET));
        let app = init_test_app!(state);

        let response = test::call_service(&app, signed_request(BODY).to_request()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "detail": "internal server error" })
        );
        assert_eq!(sink.webhook_count(WebhookResult::PersistenceError), 1);
        assert_eq!(sink.http_count("/webhook", 500), 1);

        let errors: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| e.error.is_some())
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].result, Some(WebhookResult::PersistenceError));
    }

    #[ntex::test]
    async fn test_receive_oversized_unsigned_body_is_unauthorized() {
        let (state, store, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        let request = test::TestRequest::post()
            .uri("/webhook")
            .header("X-Signature", "bad")
            .set_payload(vec![b'x'; 300 * 1024])
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(json_body(response).await, json!({ "detail": "invalid signature" }));
        assert_eq!(sink.webhook_count(WebhookResult::InvalidSignature), 1);
        assert_eq!(sink.http_count("/webhook", 401), 1);
        assert_eq!(sink.events().len(), 2);
        assert_eq!(store.get_stats(10).await.unwrap().total_messages, 0);
    }

    #[ntex::test]
    async fn test_receive_oversized_signed_body_is_rejected() {
        let (state, _, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        let body = vec![b'x'; 300 * 1024];
        let response = test::call_service(&app, signed_request(&body).to_request()).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json_body(response).await,
            json!({ "detail": "body exceeds 262144 bytes" })
        );
        assert_eq!(sink.webhook_count(WebhookResult::ValidationError), 1);
        assert_eq!(sink.http_count("/webhook", 422), 1);
    }

    #[ntex::test]
    async fn test_receive_body_at_size_limit_is_read_whole() {
        let (state, _, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);

        // valid JSON padded with whitespace up to the limit
        let mut body = BODY.to_vec();
        body.resize(262_144, b' ');
        let response = test::call_service(&app, signed_request(&body).to_request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sink.webhook_count(WebhookResult::Created), 1);
    }

    #[ntex::test]
    async fn test_receive_uses_secret_verbatim() {
        let secret = " s3cret ";
        let (state, _, _) = sqlite_state(Some(secret)).await;
        let app = init_test_app!(state);

        let signature = security::sign(secret, BODY).unwrap();
        let request = test::TestRequest::post()
            .uri("/webhook")
            .header("X-Signature", signature.as_str())
            .set_payload(BODY.to_vec())
            .to_request();

        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);
    }

    #[ntex::test]
    async fn test_receive_echoes_inbound_request_id() {
        let (state, _, sink) = sqlite_state(Some(SECRET)).await;
        let app = init_test_app!(state);
        let request_id = "6f1c2b1e-9a3c-4d6e-8f00-1a2b3c4d5e6f";

        let request = signed_request(BODY)
            .header("X-Request-ID", request_id)
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some(request_id)
        );
        assert!(sink.events().iter().all(|e| e.request_id == request_id));
    }
}
