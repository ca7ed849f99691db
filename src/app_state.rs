// =============================================================================
// Central Application State
// =============================================================================
//
// Shared read-only by every request handler via `Arc<AppState>`. Nothing here
// is mutated after startup, so no locks are needed.
// =============================================================================

use crate::report::ReportService;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub runtime_config: RuntimeConfig,
    pub report_service: ReportService,
    /// Whether a secondary quote source was configured at startup.
    pub secondary_configured: bool,
}

impl AppState {
    pub fn new(
        runtime_config: RuntimeConfig,
        report_service: ReportService,
        secondary_configured: bool,
    ) -> Self {
        Self {
            runtime_config,
            report_service,
            secondary_configured,
        }
    }
}
