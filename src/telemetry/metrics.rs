use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("vector-report-api"));

// --- Domain Metrics ---

pub static REPORT_REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.requests.total")
        .with_description("Number of report requests delegated to the generator")
        .with_unit("{request}")
        .build()
});

pub static REPORT_REJECTIONS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("report.rejections.total")
        .with_description("Number of report requests answered with an error")
        .with_unit("{request}")
        .build()
});

pub static WORKBOOK_GENERATION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("workbook.generation.duration")
        .with_description("Time spent building and saving a workbook in seconds")
        .with_unit("s")
        .build()
});

pub static WORKBOOK_SHEETS: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("workbook.sheets")
        .with_description("Number of sheets written per workbook")
        .with_unit("{sheet}")
        .build()
});

// --- HTTP Metrics ---

pub static HTTP_REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("http.requests.total")
        .with_description("Total number of HTTP requests")
        .with_unit("{request}")
        .build()
});

pub static HTTP_REQUEST_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("http.request.duration")
        .with_description("HTTP request duration in milliseconds")
        .with_unit("ms")
        .with_boundaries(vec![
            1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
        ])
        .build()
});
