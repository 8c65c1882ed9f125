pub mod config;
pub mod error;
pub mod middleware;
pub mod report;
pub mod routes;
pub mod telemetry;
pub mod workbook;

use std::sync::Arc;

pub use config::Config;

use report::ReportGenerator;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<dyn ReportGenerator>,
}
