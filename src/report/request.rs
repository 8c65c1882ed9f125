use std::collections::BTreeSet;
use std::fmt;

use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{is_blank, normalize_list, normalize_timestamp, parse_timestamp, stringify};
use crate::error::{AppError, AppResult};

/// Wire value for availability reports. Existing callers send this exact
/// spelling.
pub const AVAILABILITY_REPORT: &str = "Avalibility";

pub const DEFAULT_USER_NAME: &str = "Unknown";

/// Forwarded `report_type` when the request omits it or sends null.
pub const ABSENT_REPORT_TYPE: &str = "None";

const EMAIL_HEADER: &str = "Email";
const USER_HEADER: &str = "User";

const INVALID_TIME_MESSAGE: &str = "Invalid time format. Use UNIX timestamp integers.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportType {
    Interface,
    Filesystem,
    Resource,
    Alert,
    Availability,
    Other(String),
}

impl ReportType {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::parse(s),
            None | Some(Value::Null) => Self::Other(ABSENT_REPORT_TYPE.to_string()),
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "interface" => Self::Interface,
            "filesystem" => Self::Filesystem,
            "Resource" => Self::Resource,
            "alert" => Self::Alert,
            AVAILABILITY_REPORT => Self::Availability,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Interface => "interface",
            Self::Filesystem => "filesystem",
            Self::Resource => "Resource",
            Self::Alert => "alert",
            Self::Availability => AVAILABILITY_REPORT,
            Self::Other(raw) => raw,
        }
    }

    /// Body key the metric identifiers are read from.
    fn metric_source(&self) -> Option<&'static str> {
        match self {
            Self::Interface | Self::Filesystem => Some("metric_name"),
            Self::Resource => Some("metric"),
            _ => None,
        }
    }

    /// Fields that must be present and non-empty before normalization.
    /// Unrecognized types still require `metric`.
    fn required_fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["hostname", "from_time", "to_time"];
        match self {
            Self::Alert | Self::Availability => {}
            Self::Interface | Self::Filesystem => fields.push("metric_name"),
            Self::Resource | Self::Other(_) => fields.push("metric"),
        }
        fields
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational headers sent alongside the body.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    pub email: Option<String>,
    pub user: Option<String>,
}

impl RequestHeaders {
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        Self {
            email: read(EMAIL_HEADER),
            user: read(USER_HEADER),
        }
    }
}

/// Parameters for interface, filesystem, Resource, alert and unrecognized
/// report types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReportParams {
    pub hostname: String,
    pub metric_name: Vec<String>,
    pub time_from: i64,
    pub time_to: i64,
    pub report_type: String,
    pub to_email: Option<BTreeSet<String>>,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityReportParams {
    pub time_from: i64,
    pub time_to: i64,
    pub report_type: String,
    pub group: Vec<String>,
    pub hostname: Vec<String>,
    pub to_email: Option<BTreeSet<String>>,
    pub client_group: Option<Vec<String>>,
}

/// Canonical parameter set handed to the report generator. Serializes as a
/// flat object with the generator's keyword names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportParams {
    Metric(MetricReportParams),
    Availability(AvailabilityReportParams),
}

impl ReportParams {
    pub fn report_type(&self) -> &str {
        match self {
            ReportParams::Metric(params) => &params.report_type,
            ReportParams::Availability(params) => &params.report_type,
        }
    }

    pub fn recipients(&self) -> Option<&BTreeSet<String>> {
        match self {
            ReportParams::Metric(params) => params.to_email.as_ref(),
            ReportParams::Availability(params) => params.to_email.as_ref(),
        }
    }
}

/// Decodes the raw request body into a JSON object.
pub fn parse_body(body: &[u8]) -> AppResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::Validation("Missing JSON body".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?;

    if is_blank(Some(&value)) {
        return Err(AppError::Validation("Missing JSON body".to_string()));
    }

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Validation(
            "JSON body must be an object".to_string(),
        )),
    }
}

/// Validates a decoded body and produces the generator parameters.
pub fn normalize_request(
    data: &Map<String, Value>,
    headers: &RequestHeaders,
) -> AppResult<ReportParams> {
    match ReportType::from_value(data.get("report_type")) {
        ReportType::Availability => {
            normalize_availability(data, headers).map(ReportParams::Availability)
        }
        report_type => normalize_metric(report_type, data, headers).map(ReportParams::Metric),
    }
}

fn normalize_availability(
    data: &Map<String, Value>,
    headers: &RequestHeaders,
) -> AppResult<AvailabilityReportParams> {
    let hostname = normalize_list(data.get("hostname"));
    let group = normalize_list(data.get("group"));
    let client_group = normalize_list(data.get("client_group"));
    let (time_from, time_to) = parse_time_range(data)?;

    Ok(AvailabilityReportParams {
        time_from,
        time_to,
        report_type: AVAILABILITY_REPORT.to_string(),
        group,
        hostname,
        to_email: resolve_recipients(headers.email.as_deref(), data.get("email_list")),
        client_group: (!client_group.is_empty()).then_some(client_group),
    })
}

fn normalize_metric(
    report_type: ReportType,
    data: &Map<String, Value>,
    headers: &RequestHeaders,
) -> AppResult<MetricReportParams> {
    let missing = missing_fields(data, &report_type.required_fields());
    if !missing.is_empty() {
        let prefix = if report_type == ReportType::Alert {
            "Missing required fields for alert report"
        } else {
            "Missing required fields"
        };
        return Err(AppError::Validation(format!(
            "{prefix}: {}",
            missing.join(", ")
        )));
    }

    let metric_name = report_type
        .metric_source()
        .map(|key| normalize_list(data.get(key)))
        .unwrap_or_default();

    let (time_from, time_to) = parse_time_range(data)?;

    Ok(MetricReportParams {
        hostname: data.get("hostname").map(stringify).unwrap_or_default(),
        metric_name,
        time_from,
        time_to,
        report_type: report_type.to_string(),
        to_email: resolve_recipients(headers.email.as_deref(), data.get("email_list")),
        user_name: headers
            .user
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
    })
}

fn missing_fields(data: &Map<String, Value>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| is_blank(data.get(*field)))
        .collect()
}

fn parse_time_range(data: &Map<String, Value>) -> AppResult<(i64, i64)> {
    let invalid = || AppError::Validation(INVALID_TIME_MESSAGE.to_string());
    let from = parse_timestamp(data.get("from_time")).ok_or_else(invalid)?;
    let to = parse_timestamp(data.get("to_time")).ok_or_else(invalid)?;
    Ok((normalize_timestamp(from), normalize_timestamp(to)))
}

/// Unions the header address with the body `email_list`. An empty union is
/// `None` so callers can tell "no recipients" apart from an empty list.
pub fn resolve_recipients(
    header_email: Option<&str>,
    email_list: Option<&Value>,
) -> Option<BTreeSet<String>> {
    let mut recipients: BTreeSet<String> = normalize_list(email_list).into_iter().collect();
    if let Some(email) = header_email.filter(|email| !email.is_empty()) {
        recipients.insert(email.to_string());
    }
    (!recipients.is_empty()).then_some(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn validation_message(result: AppResult<ReportParams>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_report_type_parse() {
        assert_eq!(ReportType::parse("interface"), ReportType::Interface);
        assert_eq!(ReportType::parse("Resource"), ReportType::Resource);
        assert_eq!(ReportType::parse("Avalibility"), ReportType::Availability);
        assert_eq!(
            ReportType::parse("Availability"),
            ReportType::Other("Availability".to_string())
        );
        assert_eq!(
            ReportType::from_value(Some(&json!(5))),
            ReportType::Other("5".to_string())
        );
    }

    #[test]
    fn test_absent_report_type_is_forwarded_as_none() {
        assert_eq!(ReportType::from_value(None).as_str(), "None");
        assert_eq!(ReportType::from_value(Some(&Value::Null)).as_str(), "None");

        let data = object(json!({
            "hostname": "web-01",
            "metric": "cpu",
            "from_time": 1,
            "to_time": 2,
        }));
        let params = normalize_request(&data, &RequestHeaders::default()).unwrap();
        assert_eq!(params.report_type(), "None");
    }

    #[test]
    fn test_interface_request_is_normalized() {
        let data = object(json!({
            "report_type": "interface",
            "hostname": "core-sw-01",
            "metric_name": "{Bits received, Bits sent}",
            "from_time": 1700000000000i64,
            "to_time": "1700086400",
        }));
        let headers = RequestHeaders {
            email: Some("noc@example.com".to_string()),
            user: Some("alice".to_string()),
        };

        let params = normalize_request(&data, &headers).unwrap();
        assert_eq!(
            params,
            ReportParams::Metric(MetricReportParams {
                hostname: "core-sw-01".to_string(),
                metric_name: vec!["Bits received".to_string(), "Bits sent".to_string()],
                time_from: 1700000000,
                time_to: 1700086400,
                report_type: "interface".to_string(),
                to_email: Some(BTreeSet::from(["noc@example.com".to_string()])),
                user_name: "alice".to_string(),
            })
        );
    }

    #[test]
    fn test_resource_reads_metric_key() {
        let data = object(json!({
            "report_type": "Resource",
            "hostname": "db-01",
            "metric": ["CPU utilization"],
            "from_time": 1,
            "to_time": 2,
        }));

        let ReportParams::Metric(params) =
            normalize_request(&data, &RequestHeaders::default()).unwrap()
        else {
            panic!("expected metric params");
        };
        assert_eq!(params.metric_name, vec!["CPU utilization"]);
        assert_eq!(params.user_name, DEFAULT_USER_NAME);
        assert!(params.to_email.is_none());
    }

    #[test]
    fn test_interface_missing_metric_name_lists_exact_fields() {
        let data = object(json!({
            "report_type": "interface",
            "hostname": "core-sw-01",
            "from_time": 1,
            "to_time": 2,
        }));

        let msg = validation_message(normalize_request(&data, &RequestHeaders::default()));
        assert_eq!(msg, "Missing required fields: metric_name");
    }

    #[test]
    fn test_missing_fields_are_listed_in_order() {
        let data = object(json!({ "report_type": "filesystem", "hostname": "" }));

        let msg = validation_message(normalize_request(&data, &RequestHeaders::default()));
        assert_eq!(
            msg,
            "Missing required fields: hostname, from_time, to_time, metric_name"
        );
    }

    #[test]
    fn test_alert_does_not_require_metric() {
        let data = object(json!({
            "report_type": "alert",
            "hostname": "edge-01",
            "from_time": 1700000000,
            "to_time": 1700003600,
        }));

        let ReportParams::Metric(params) =
            normalize_request(&data, &RequestHeaders::default()).unwrap()
        else {
            panic!("expected metric params");
        };
        assert!(params.metric_name.is_empty());
        assert_eq!(params.report_type, "alert");
    }

    #[test]
    fn test_alert_missing_fields_message() {
        let data = object(json!({ "report_type": "alert", "hostname": "edge-01" }));

        let msg = validation_message(normalize_request(&data, &RequestHeaders::default()));
        assert_eq!(
            msg,
            "Missing required fields for alert report: from_time, to_time"
        );
    }

    #[test]
    fn test_unrecognized_type_requires_metric_but_resolves_none() {
        let data = object(json!({
            "report_type": "latency",
            "hostname": "edge-01",
            "metric_name": "ignored",
            "from_time": 1,
            "to_time": 2,
        }));
        let msg = validation_message(normalize_request(&data, &RequestHeaders::default()));
        assert_eq!(msg, "Missing required fields: metric");

        let data = object(json!({
            "report_type": "latency",
            "hostname": "edge-01",
            "metric": "rtt",
            "from_time": 1,
            "to_time": 2,
        }));
        let ReportParams::Metric(params) =
            normalize_request(&data, &RequestHeaders::default()).unwrap()
        else {
            panic!("expected metric params");
        };
        assert!(params.metric_name.is_empty());
        assert_eq!(params.report_type, "latency");
    }

    #[test]
    fn test_invalid_time_is_rejected_after_field_check() {
        let data = object(json!({
            "report_type": "alert",
            "hostname": "edge-01",
            "from_time": "last week",
            "to_time": 2,
        }));

        let msg = validation_message(normalize_request(&data, &RequestHeaders::default()));
        assert_eq!(msg, INVALID_TIME_MESSAGE);
    }

    #[test]
    fn test_hostname_list_is_stringified_for_metric_reports() {
        let data = object(json!({
            "report_type": "alert",
            "hostname": ["a", "b"],
            "from_time": 1,
            "to_time": 2,
        }));

        let ReportParams::Metric(params) =
            normalize_request(&data, &RequestHeaders::default()).unwrap()
        else {
            panic!("expected metric params");
        };
        assert_eq!(params.hostname, r#"["a","b"]"#);
    }

    #[test]
    fn test_availability_request_is_normalized() {
        let data = object(json!({
            "report_type": "Avalibility",
            "hostname": "{web-01, web-02}",
            "group": "Linux servers",
            "client_group": ["ACME"],
            "email_list": "ops@example.com",
            "from_time": "1700000000000",
            "to_time": 1700086400000i64,
        }));

        let params = normalize_request(&data, &RequestHeaders::default()).unwrap();
        assert_eq!(
            params,
            ReportParams::Availability(AvailabilityReportParams {
                time_from: 1700000000,
                time_to: 1700086400,
                report_type: AVAILABILITY_REPORT.to_string(),
                group: vec!["Linux servers".to_string()],
                hostname: vec!["web-01".to_string(), "web-02".to_string()],
                to_email: Some(BTreeSet::from(["ops@example.com".to_string()])),
                client_group: Some(vec!["ACME".to_string()]),
            })
        );
    }

    #[test]
    fn test_availability_defaults_and_skips_field_check() {
        let data = object(json!({
            "report_type": "Avalibility",
            "from_time": 1,
            "to_time": 2,
        }));

        let ReportParams::Availability(params) =
            normalize_request(&data, &RequestHeaders::default()).unwrap()
        else {
            panic!("expected availability params");
        };
        assert!(params.hostname.is_empty());
        assert!(params.group.is_empty());
        assert!(params.client_group.is_none());
        assert!(params.to_email.is_none());
    }

    #[test]
    fn test_availability_requires_timestamps() {
        let data = object(json!({ "report_type": "Avalibility", "hostname": "web-01" }));

        let msg = validation_message(normalize_request(&data, &RequestHeaders::default()));
        assert_eq!(msg, INVALID_TIME_MESSAGE);
    }

    #[test]
    fn test_recipients_union_and_dedup() {
        let recipients =
            resolve_recipients(Some("a@x.com"), Some(&json!(["b@x.com", "a@x.com"]))).unwrap();
        assert_eq!(
            recipients,
            BTreeSet::from(["a@x.com".to_string(), "b@x.com".to_string()])
        );
    }

    #[test]
    fn test_recipients_empty_union_is_absent() {
        assert_eq!(resolve_recipients(None, Some(&json!([]))), None);
        assert_eq!(resolve_recipients(Some(""), None), None);
    }

    #[test]
    fn test_params_serialize_flat() {
        let params = ReportParams::Availability(AvailabilityReportParams {
            time_from: 1,
            time_to: 2,
            report_type: AVAILABILITY_REPORT.to_string(),
            group: vec![],
            hostname: vec!["h".to_string()],
            to_email: None,
            client_group: None,
        });

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "time_from": 1,
                "time_to": 2,
                "report_type": "Avalibility",
                "group": [],
                "hostname": ["h"],
                "to_email": null,
                "client_group": null,
            })
        );
    }

    #[test]
    fn test_parse_body() {
        assert!(matches!(
            parse_body(b""),
            Err(AppError::Validation(ref m)) if m == "Missing JSON body"
        ));
        assert!(matches!(
            parse_body(b"{}"),
            Err(AppError::Validation(ref m)) if m == "Missing JSON body"
        ));
        assert!(matches!(
            parse_body(b"{oops"),
            Err(AppError::Validation(ref m)) if m.starts_with("Invalid JSON body")
        ));
        assert!(matches!(parse_body(b"[1]"), Err(AppError::Validation(_))));
        assert_eq!(parse_body(br#"{"a": 1}"#).unwrap().len(), 1);
    }
}
