//! Services module for booking-service.

pub mod database;
pub mod metrics;
pub mod notifier;
pub mod reporting;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use notifier::{Notification, NotificationChannel, Notifier, SmtpChannel};
pub use reporting::SalesReportService;
