use std::sync::Arc;

use crate::database::store::Store;
use crate::error::Result;
use crate::models::report::PipelineReport;

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn pipeline(&self) -> Result<PipelineReport> {
        let report = self.store.pipeline_report().await?;
        tracing::debug!(
            total_jobs = report.total_jobs,
            total_applications = report.total_applications,
            "pipeline report generated"
        );
        Ok(report)
    }
}
