pub mod fields;
pub mod generator;
pub mod request;

pub use generator::{HttpReportGenerator, ReportGenerator};
pub use request::{
    AvailabilityReportParams, MetricReportParams, ReportParams, ReportType, RequestHeaders,
    normalize_request, parse_body,
};
