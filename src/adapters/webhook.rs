use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::id::ProviderPaymentId,
        services::reconciler::ReconOutcome,
    },
    axum::{
        Json,
        extract::{Query, State},
    },
    serde::Deserialize,
    serde_json::Value,
};

#[derive(Debug, Default, Deserialize)]
pub struct WebhookQuery {
    pub id: Option<String>,
}

/// POST /webhooks/mercadopago
///
/// Acknowledges with 200 for everything the gateway cannot fix by retrying
/// (no reference, unknown record, configuration problems). Only a failed
/// gateway fetch or a failed durable write answers 5xx, which asks the
/// gateway to redeliver.
pub async fn gateway_webhook_handler(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    // The body is whatever the gateway felt like sending for this event
    // class; parse leniently and fall back to the query parameter.
    let parsed: Option<Value> = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str(&body).ok()
    };

    let Some(reference) = extract_payment_reference(query.id.as_deref(), parsed.as_ref()) else {
        tracing::info!("notification carries no payment reference, acknowledging");
        return Ok(Json(serde_json::json!({"status": "ignored"})));
    };

    let id = match ProviderPaymentId::new(reference) {
        Ok(id) => id,
        Err(e) => {
            tracing::info!(error = %e, "unusable payment reference, acknowledging");
            return Ok(Json(serde_json::json!({"status": "ignored"})));
        }
    };

    match state.reconciler.process(&id).await? {
        ReconOutcome::Ignored(reason) => Ok(Json(serde_json::json!({
            "status": "ignored",
            "reason": reason.as_str(),
        }))),
        ReconOutcome::Applied { domain, .. } => Ok(Json(serde_json::json!({
            "status": "applied",
            "domain": domain.as_str(),
        }))),
        ReconOutcome::Recorded { domain, status } => Ok(Json(serde_json::json!({
            "status": "recorded",
            "domain": domain.as_str(),
            "payment_status": status,
        }))),
    }
}

const ID_FIELDS: [&str; 3] = ["id", "payment_id", "data_id"];

/// Pulls the gateway payment id out of a notification. Priority, first match
/// wins: the `id` query parameter; body `id`/`payment_id`/`data_id` (string
/// or number); the same fields one level under `data`; the trailing path
/// segment of a URL-shaped `resource` field.
pub fn extract_payment_reference(query_id: Option<&str>, body: Option<&Value>) -> Option<String> {
    if let Some(id) = query_id {
        let id = id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }

    let body = body?;

    for field in ID_FIELDS {
        if let Some(found) = scalar_as_string(body.get(field)) {
            return Some(found);
        }
    }

    if let Some(data) = body.get("data") {
        for field in ID_FIELDS {
            if let Some(found) = scalar_as_string(data.get(field)) {
                return Some(found);
            }
        }
    }

    if let Some(resource) = body.get("resource").and_then(Value::as_str) {
        return trailing_segment(resource);
    }

    None
}

fn scalar_as_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn trailing_segment(resource: &str) -> Option<String> {
    let trimmed = resource.trim().trim_end_matches('/');
    let (_, tail) = trimmed.rsplit_once('/')?;
    if tail.is_empty() || tail.chars().any(char::is_whitespace) {
        return None;
    }
    Some(tail.to_string())
}
