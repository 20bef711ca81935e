pub mod api;
pub mod counter;
pub mod error;
pub mod ident;
pub mod model;
pub mod relay;
pub mod scheduler;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::Router;
use partline_core::Module;

pub use error::ProductionError;
use scheduler::{ResetScheduler, SchedulerConfig};
use service::ProductionService;

/// Production module — identifier composition, serial counter and line relay.
pub struct ProductionModule {
    service: Arc<ProductionService>,
    scheduler: ResetScheduler,
}

impl ProductionModule {
    /// Wrap the service and start the reset scheduler. A reset missed while
    /// the process was down is applied before this returns.
    pub async fn start(service: ProductionService, scheduler: SchedulerConfig) -> Self {
        let service = Arc::new(service);
        let scheduler = ResetScheduler::start(service.counter().clone(), scheduler).await;
        Self { service, scheduler }
    }

    pub fn service(&self) -> &Arc<ProductionService> {
        &self.service
    }

    /// Stop background work.
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
    }
}

impl Module for ProductionModule {
    fn name(&self) -> &str {
        "production"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
