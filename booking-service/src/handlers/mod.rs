//! HTTP handlers for booking-service.

pub mod bookings;
pub mod discounts;
pub mod health;
pub mod payments;
pub mod reports;
pub mod zones;
