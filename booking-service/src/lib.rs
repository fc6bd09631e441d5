pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod reports;
pub mod services;

use axum::{
    middleware::from_fn,
    routing::{delete, get, patch, post, put},
    Router,
};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use services::{Database, Notifier, SalesReportService};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub notifier: Notifier,
    pub reports: SalesReportService,
}

pub struct Application {
    port: u16,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        db.run_migrations().await?;

        services::init_metrics();

        let notifier = Notifier::smtp(config.smtp.clone())?;
        let reports = SalesReportService::new(db.clone());

        let state = AppState {
            db,
            config: config.clone(),
            notifier,
            reports,
        };

        let router = Router::new()
            .route("/health", get(handlers::health::health_check))
            .route("/ready", get(handlers::health::readiness_check))
            .route("/metrics", get(handlers::health::metrics_endpoint))
            // Bookings
            .route("/bookings", post(handlers::bookings::create_booking))
            .route("/bookings", get(handlers::bookings::list_bookings))
            .route("/bookings/:id", get(handlers::bookings::get_booking))
            .route("/bookings/:id", put(handlers::bookings::update_booking))
            .route("/bookings/:id", delete(handlers::bookings::delete_booking))
            .route("/bookings/:id/status", patch(handlers::bookings::update_status))
            .route(
                "/bookings/:id/tax-invoice",
                patch(handlers::bookings::set_tax_invoice),
            )
            .route("/bookings/:id/history", get(handlers::bookings::get_history))
            // Payments
            .route("/bookings/:id/payments", post(handlers::payments::record_payment))
            .route("/bookings/:id/payments", get(handlers::payments::list_payments))
            // Discounts and vouchers
            .route("/discounts", post(handlers::discounts::create_discount))
            .route("/discounts", get(handlers::discounts::list_discounts))
            .route("/discounts/preview", post(handlers::discounts::preview_voucher))
            .route("/discounts/:id", get(handlers::discounts::get_discount))
            .route("/discounts/:id", put(handlers::discounts::update_discount))
            .route("/discounts/:id", delete(handlers::discounts::delete_discount))
            // Zones
            .route("/zones", get(handlers::zones::list_zones))
            .route("/zones/:id", get(handlers::zones::get_zone))
            .route("/zones/:id", put(handlers::zones::update_zone))
            .route("/zones/:id/audit", get(handlers::zones::zone_audit))
            // Sales reports
            .route("/reports/sales", get(handlers::reports::run_report))
            .layer(from_fn(middleware::track_metrics))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state);

        Ok(Self {
            port: config.server.port,
            router,
        })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;

        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
