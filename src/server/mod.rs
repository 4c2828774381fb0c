use std::sync::Arc;
use std::time::Duration;

use axum::{Router, body::Body, http::Request, middleware::{self, Next}, response::Response};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::{
    billing::BillingService,
    config::{Config, InsightProvider},
    connectors::{
        AdPlatform, AdsConnector, CompetitiveIntel, SiteAnalyzer,
        mock::{MockAdsConnector, MockCompetitiveIntel, MockSiteAnalyzer},
        site::HttpSiteAnalyzer,
    },
    database::{DatabaseManager, DatabaseManagerImpl},
    error::AppError,
    health::HealthService,
    insights::{InsightGenerator, InsightService, LlmInsightGenerator},
    jobs::{Job, JobScheduler, ReportCleanupJob},
    metrics,
    reports::ReportService,
    routes::{
        create_billing_routes, create_health_routes, create_insight_routes, create_report_routes,
    },
    shutdown::ShutdownCoordinator,
};

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub database: Arc<dyn DatabaseManager>,
    pub billing_service: Arc<BillingService>,
    pub report_service: Arc<ReportService>,
    pub insight_service: Arc<InsightService>,
    pub health_service: Arc<HealthService>,
    pub shutdown_coordinator: Arc<ShutdownCoordinator>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        if config.metrics.enabled {
            match metrics::init_metrics_with_port(config.metrics.port) {
                Ok(_handle) => {
                    info!("Metrics server started on port {}", config.metrics.port);
                }
                Err(e) => {
                    error!(
                        "Failed to start metrics server on port {}: {}",
                        config.metrics.port, e
                    );
                    return Err(AppError::Internal(format!(
                        "Failed to start metrics server: {}",
                        e
                    )));
                }
            }
        }

        let database_impl = Arc::new(
            DatabaseManagerImpl::new_from_config(&config.database)
                .await
                .map_err(AppError::Database)?,
        );
        let database: Arc<dyn DatabaseManager> = database_impl.clone();

        let billing_service = Arc::new(BillingService::new(
            database.clone(),
            config.billing.clone(),
        ));

        let connector_timeout = Duration::from_secs(config.connectors.timeout_secs);
        let analyzer: Arc<dyn SiteAnalyzer> = if config.connectors.mock {
            Arc::new(MockSiteAnalyzer)
        } else {
            Arc::new(
                HttpSiteAnalyzer::new(connector_timeout, &config.connectors.user_agent)
                    .map_err(|e| AppError::Internal(format!("analyzer init failed: {e}")))?,
            )
        };

        // Ads and competitive-intelligence providers currently only ship
        // with mock backends; live integrations plug in behind the same
        // traits.
        if !config.connectors.mock {
            warn!("live ads/intel connectors are not configured; using mock data sources");
        }
        let ads_connectors: Vec<Arc<dyn AdsConnector>> = vec![
            Arc::new(MockAdsConnector::new(AdPlatform::Google)),
            Arc::new(MockAdsConnector::new(AdPlatform::Meta)),
        ];
        let intel: Arc<dyn CompetitiveIntel> = Arc::new(MockCompetitiveIntel);

        let report_service = Arc::new(ReportService::new(
            database.clone(),
            billing_service.clone(),
            analyzer,
            ads_connectors,
            intel,
            connector_timeout,
        ));

        let insight_primary: Option<Arc<dyn InsightGenerator>> = match config.insights.provider {
            InsightProvider::Template => None,
            InsightProvider::Llm => {
                match (&config.insights.llm_endpoint, &config.insights.llm_api_key) {
                    (Some(endpoint), Some(api_key)) => {
                        match LlmInsightGenerator::new(
                            endpoint.clone(),
                            api_key.clone(),
                            config.insights.llm_model.clone(),
                            connector_timeout,
                        ) {
                            Ok(generator) => Some(Arc::new(generator)),
                            Err(e) => {
                                warn!("LLM insight generator unavailable: {e}; using templates");
                                None
                            }
                        }
                    }
                    _ => {
                        warn!("insights.provider=llm but endpoint/api key missing; using templates");
                        None
                    }
                }
            }
        };
        let insight_service = Arc::new(InsightService::new(insight_primary));

        let health_service = Arc::new(HealthService::new());
        health_service.register(database_impl).await;

        let shutdown_coordinator = Arc::new(ShutdownCoordinator::new());

        Ok(Self {
            config: Arc::new(config),
            database,
            billing_service,
            report_service,
            insight_service,
            health_service,
            shutdown_coordinator,
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        self.database.migrate().await.map_err(AppError::Database)?;
        info!("Database migrations completed successfully");

        let mut scheduler = JobScheduler::with_shutdown_coordinator(
            self.config.jobs.clone(),
            self.shutdown_coordinator.subscribe(),
        );
        let cleanup_job: Arc<dyn Job> = Arc::new(ReportCleanupJob::new(
            self.database.clone(),
            self.config.jobs.report_cleanup.clone(),
        ));
        scheduler.start(vec![cleanup_job]).await?;

        let app = self.create_app();

        let listener = TcpListener::bind((self.config.server.host.as_str(), self.config.server.port))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!(
            "Server listening on http://{}",
            listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string())
        );

        let shutdown_coordinator = self.shutdown_coordinator.clone();
        tokio::spawn(async move {
            shutdown_coordinator.wait_for_shutdown_signal().await;
        });

        let mut shutdown_rx = self.shutdown_coordinator.subscribe();
        let serve_future = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            info!("Graceful shutdown initiated");
        });

        if let Err(e) = serve_future.await {
            error!("Server error: {}", e);
        }

        scheduler.stop().await;
        info!("Server shutdown complete");

        Ok(())
    }

    // Creates an application router
    pub fn create_app(&self) -> Router {
        let mut app = Router::new()
            .merge(create_health_routes())
            .nest("/api", create_report_routes())
            .nest("/api", create_billing_routes())
            .nest("/api", create_insight_routes())
            .with_state(self.clone());

        if self.config.metrics.enabled {
            app = app.layer(middleware::from_fn(metrics::metrics_middleware));
        }
        if self.config.logging.log_request {
            app = app.layer(middleware::from_fn(request_logger));
        }
        app
    }
}

/// Request/response logging middleware.
async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn create_test_server() -> Server {
        crate::test_utils::TestServerBuilder::new().build().await
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = create_test_server().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let server = create_test_server().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/api/nonexistent")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_report_request_is_400() {
        let server = create_test_server().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/api/reports/tracking-readiness")
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(
                r#"{"url": "not a url", "workspace_id": "ws-test"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
