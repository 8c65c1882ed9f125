use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use super::ReportParams;

/// External routine that turns normalized parameters into the endpoint's
/// HTTP response.
#[async_trait::async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, params: ReportParams) -> anyhow::Result<Response>;
    fn name(&self) -> &str;
}

/// Forwards parameters to the reporting backend as a flat JSON object and
/// relays its answer unchanged.
pub struct HttpReportGenerator {
    client: reqwest::Client,
    url: String,
}

impl HttpReportGenerator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ReportGenerator for HttpReportGenerator {
    #[tracing::instrument(
        name = "report_generator forward",
        skip(self, params),
        fields(
            report.type = %params.report_type(),
            server.url = %self.url,
            http.response.status_code = tracing::field::Empty,
        )
    )]
    async fn generate(&self, params: ReportParams) -> anyhow::Result<Response> {
        let upstream = self.client.post(&self.url).json(&params).send().await?;

        let status = upstream.status();
        let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
        let body = upstream.bytes().await?;

        tracing::Span::current().record("http.response.status_code", status.as_u16() as i64);
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "Report backend returned an error");
        }

        let mut response = (status, body).into_response();
        if let Some(content_type) = content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        Ok(response)
    }

    fn name(&self) -> &str {
        "http"
    }
}
