use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};
use opentelemetry::KeyValue;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::ApiKey;
use crate::report::{RequestHeaders, normalize_request, parse_body};
use crate::telemetry::metrics::REPORT_REQUESTS_TOTAL;

#[tracing::instrument(
    name = "generate_report",
    skip_all,
    fields(report.type = tracing::field::Empty, report.recipients = tracing::field::Empty)
)]
pub async fn generate_report(
    State(state): State<AppState>,
    _key: ApiKey,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let data = parse_body(&body)?;
    let params = normalize_request(&data, &RequestHeaders::from_header_map(&headers))?;

    let span = tracing::Span::current();
    span.record("report.type", params.report_type());
    span.record(
        "report.recipients",
        params.recipients().map_or(0, |recipients| recipients.len()),
    );

    REPORT_REQUESTS_TOTAL.add(
        1,
        &[KeyValue::new("report.type", params.report_type().to_string())],
    );

    tracing::info!(
        generator = state.generator.name(),
        "Delegating report request"
    );

    let response = state.generator.generate(params).await?;
    Ok(response)
}
