//! # Webhook Ingestion
//!
//! Orchestrates one inbound webhook call:
//! verify signature → validate payload → idempotent insert → log → count.
//!
//! Signature and validation failures end the call early and never touch the
//! store. Storage failures are reported as such and are not retried here;
//! the sender is expected to redeliver.

use crate::{
    consts,
    logger::{LogEvent, LogLevel},
    metric::{CounterName, WebhookResult},
    models::{message::InsertOutcome, request::RequestContext},
    repo, services,
    webhook::{schemas, security},
};
use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum IngestError {
    #[display("invalid signature")]
    InvalidSignature,
    #[display("{_0}")]
    Validation(schemas::ValidationError),
    #[display("persistence failure: {_0:#}")]
    Persistence(#[error(not(source))] anyhow::Error),
}

impl IngestError {
    pub fn result(&self) -> WebhookResult {
        match self {
            Self::InvalidSignature => WebhookResult::InvalidSignature,
            Self::Validation(_) => WebhookResult::ValidationError,
            Self::Persistence(_) => WebhookResult::PersistenceError,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidSignature => 401,
            Self::Validation(_) => 422,
            Self::Persistence(_) => 500,
        }
    }
}

/// Raw inbound webhook as received over HTTP
pub struct InboundWebhook<'a> {
    pub raw_body: &'a [u8],
    pub signature: Option<&'a str>,
}

fn report(
    observer: &services::ImplObservabilitySink,
    ctx: &RequestContext,
    level: LogLevel,
    status: u16,
    result: WebhookResult,
    configure: impl FnOnce(&mut LogEvent),
) {
    let mut event = LogEvent::new(
        level,
        "webhook processed",
        &ctx.request_id,
        &ctx.method,
        &ctx.path,
        status,
    );
    event.result = Some(result);
    configure(&mut event);

    observer.log_event(&event);
    observer.incr_counter(CounterName::WebhookRequests, &[("result", result.as_str())]);
}

fn reject(
    observer: &services::ImplObservabilitySink,
    ctx: &RequestContext,
    error: IngestError,
) -> IngestError {
    let level = match error {
        IngestError::Validation(_) => LogLevel::Warn,
        _ => LogLevel::Error,
    };

    report(observer, ctx, level, error.status(), error.result(), |event| {
        event.error = Some(error.to_string());
        if let IngestError::Validation(e) = &error {
            event.field = e.field();
        }
    });

    error
}

fn check_signature(
    observer: &services::ImplObservabilitySink,
    ctx: &RequestContext,
    secret_configured: bool,
    signature_ok: bool,
) -> Result<(), IngestError> {
    if signature_ok {
        return Ok(());
    }

    if !secret_configured {
        logfire::error!(
            "Webhook secret is not configured, rejecting {request_id}",
            request_id = ctx.request_id.clone()
        );
    }
    Err(reject(observer, ctx, IngestError::InvalidSignature))
}

/// Rejects a body larger than [`consts::WEBHOOK_MAX_BODY_BYTES`].
///
/// The signature is still checked first, over every received byte, so a
/// forged oversized request is reported as `invalid_signature`.
///
/// # Arguments
///
/// * `body_signature` - Digest of the whole body, `None` when no secret is configured
/// * `signature` - The `X-Signature` header, if any
pub fn reject_oversized(
    ctx: &RequestContext,
    body_signature: Option<security::BodySignature>,
    signature: Option<&str>,
    observer: &services::ImplObservabilitySink,
) -> IngestError {
    let secret_configured = body_signature.is_some();
    let signature_ok = body_signature.is_some_and(|digest| digest.matches(signature));
    if let Err(error) = check_signature(observer, ctx, secret_configured, signature_ok) {
        return error;
    }

    let too_large = schemas::ValidationError::BodyTooLarge {
        max: consts::WEBHOOK_MAX_BODY_BYTES,
    };
    reject(observer, ctx, IngestError::Validation(too_large))
}

/// Ingests one webhook call.
///
/// A duplicate `message_id` is a success: the caller sees the same
/// acknowledgement whether the message was created or already stored.
///
/// # Arguments
///
/// * `ctx` - Correlation data of the HTTP request
/// * `secret` - Shared webhook secret, `None` when not configured
/// * `inbound` - Untouched body bytes and the `X-Signature` header
/// * `repo` - Message Store
/// * `observer` - Log and counter sink
pub async fn ingest_webhook(
    ctx: &RequestContext,
    secret: Option<&str>,
    inbound: InboundWebhook<'_>,
    repo: &repo::ImplMessageRepo,
    observer: &services::ImplObservabilitySink,
) -> Result<InsertOutcome, IngestError> {
    let signature_ok = secret.is_some_and(|secret| {
        security::verify_signature(secret, inbound.raw_body, inbound.signature)
    });
    check_signature(observer, ctx, secret.is_some(), signature_ok)?;

    let message = schemas::validate(inbound.raw_body)
        .map_err(|e| reject(observer, ctx, IngestError::Validation(e)))?;

    let outcome = match repo.insert_message(&message).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let error = IngestError::Persistence(e);
            report(observer, ctx, LogLevel::Error, error.status(), error.result(), |event| {
                event.message_id = Some(message.message_id.clone());
                event.error = Some(error.to_string());
            });
            return Err(error);
        }
    };

    let result = match outcome {
        InsertOutcome::Created => WebhookResult::Created,
        InsertOutcome::Duplicate => WebhookResult::Duplicate,
    };
    report(observer, ctx, LogLevel::Info, 200, result, |event| {
        event.message_id = Some(message.message_id.clone());
        event.dup = Some(outcome.is_duplicate());
    });

    Ok(outcome)
}
