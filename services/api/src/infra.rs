use metrics_exporter_prometheus::PrometheusHandle;
use pr_reviewer::assignment::{
    AssignmentApi, AssignmentSettings, InMemoryReviewStore, SystemClock,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ServiceApi = AssignmentApi<InMemoryReviewStore, SystemClock>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire the engine to the in-process store and wall clock.
pub(crate) fn in_memory_api(settings: AssignmentSettings) -> ServiceApi {
    AssignmentApi::new(
        Arc::new(InMemoryReviewStore::new()),
        Arc::new(SystemClock),
        settings,
    )
}
