//! The inbound webhook surface: signature authentication, payload decoding,
//! and the liveness endpoint. Core logic starts only after a delivery has
//! been authenticated and classified.

use ring::hmac;
use rocket::data::{Data, ToByteUnit};
use rocket::http::{RawStr, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::events::{Context, Event};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

type HookResponse = status::Custom<Json<StatusResponse>>;

fn respond(code: Status, message: &'static str) -> HookResponse {
    status::Custom(code, Json(StatusResponse { status: message }))
}

pub struct EventHeaders {
    pub kind: Option<String>,
    pub signature: Option<String>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for EventHeaders {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, ()> {
        let headers = req.headers();
        Outcome::Success(Self {
            kind: headers.get_one("X-GitHub-Event").map(str::to_owned),
            signature: headers.get_one("X-Hub-Signature-256").map(str::to_owned),
        })
    }
}

#[rocket::post("/webhook", data = "<body>")]
pub async fn webhook(
    headers: EventHeaders,
    body: Data<'_>,
    context: &State<Context>,
) -> HookResponse {
    let raw = match body.open(2.mebibytes()).into_bytes().await {
        Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
        Ok(_) => return respond(Status::PayloadTooLarge, "payload too large"),
        Err(e) => {
            error!("failed to read webhook body: {e}");
            return respond(Status::BadRequest, "unreadable body");
        }
    };

    if !verify_signature(
        context.config.webhook_secret.as_deref(),
        &raw,
        headers.signature.as_deref(),
    ) {
        warn!("rejected webhook delivery with invalid signature");
        return respond(Status::Unauthorized, "invalid signature");
    }

    let Some(kind) = headers.kind else {
        return respond(Status::BadRequest, "missing event header");
    };
    if kind == "ping" {
        info!("received ping event");
        return respond(Status::Ok, "pong");
    }
    if raw.is_empty() {
        warn!("empty payload for {kind} event");
        return respond(Status::Ok, "ok");
    }

    let payload = match decode_payload(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            error!("failed to decode {kind} payload: {e}");
            return respond(Status::BadRequest, "invalid payload");
        }
    };

    match Event::parse(&kind, payload).execute(context).await {
        Ok(()) => respond(Status::Ok, "ok"),
        Err(e) => {
            error!("failed to process {kind} event: {e:#}");
            respond(Status::InternalServerError, "processing failed")
        }
    }
}

#[rocket::get("/health")]
pub fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "healthy" })
}

/// `X-Hub-Signature-256` check: hex HMAC-SHA256 of the raw body under the
/// shared secret. With no secret configured, deliveries are accepted as-is.
pub fn verify_signature(secret: Option<&str>, payload: &[u8], signature: Option<&str>) -> bool {
    let Some(secret) = secret else {
        warn!("no webhook secret configured, skipping signature verification");
        return true;
    };
    let Some(tag) = signature.and_then(|s| s.strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(tag) = hex::decode(tag) else {
        return false;
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, payload, &tag).is_ok()
}

/// Deliveries are normally JSON, but GitHub can also send form-encoded
/// bodies with the document under a single `payload` field.
pub fn decode_payload(raw: &[u8]) -> anyhow::Result<serde_json::Value> {
    if let Ok(value) = serde_json::from_slice(raw) {
        return Ok(value);
    }

    let text = std::str::from_utf8(raw)?;
    for pair in text.split('&') {
        if let Some(encoded) = pair.strip_prefix("payload=") {
            let decoded = RawStr::new(encoded)
                .url_decode()
                .map_err(|e| anyhow::anyhow!("payload field is not valid UTF-8: {e}"))?;
            return Ok(serde_json::from_str(&decoded)?);
        }
    }

    anyhow::bail!("body is neither JSON nor form data with a payload field")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        format!("sha256={}", hex::encode(hmac::sign(&key, payload)))
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"action":"opened"}"#;
        let signature = sign("test-secret-123", payload);
        assert!(verify_signature(
            Some("test-secret-123"),
            payload,
            Some(&signature)
        ));
    }

    #[test]
    fn rejects_bad_or_missing_signature() {
        let payload = br#"{"action":"opened"}"#;
        let signature = sign("other-secret", payload);
        assert!(!verify_signature(
            Some("test-secret-123"),
            payload,
            Some(&signature)
        ));
        assert!(!verify_signature(Some("test-secret-123"), payload, None));
        assert!(!verify_signature(
            Some("test-secret-123"),
            payload,
            Some("sha256=zz-not-hex")
        ));
    }

    #[test]
    fn no_secret_accepts_anything() {
        assert!(verify_signature(None, b"whatever", None));
    }

    #[test]
    fn decodes_json_body() {
        let value = decode_payload(br#"{"action":"created"}"#).unwrap();
        assert_eq!(value, json!({"action": "created"}));
    }

    #[test]
    fn decodes_form_encoded_body() {
        let body = b"payload=%7B%22action%22%3A%22created%22%7D&other=1";
        let value = decode_payload(body).unwrap();
        assert_eq!(value, json!({"action": "created"}));
    }

    #[test]
    fn rejects_garbage_body() {
        assert!(decode_payload(b"not json, no payload field").is_err());
    }
}
