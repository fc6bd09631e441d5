//! Domain models for booking-service.

mod booking;
mod discount;
mod line_item;
mod payment;
mod product_line;
mod zone;

pub use booking::{
    Booking, BookingStatus, CreateBooking, ListBookingsFilter, PaymentStatus, StatusHistory,
    TransitionPlan, UpdateBooking,
};
pub use discount::{
    validate_discount_shape, CreateDiscountRequest, Discount, DiscountKind, DiscountScope,
    DiscountType, UpdateDiscount,
};
pub use line_item::{
    AccommodationLine, CreateAccommodationLine, NewAccommodationLine, PriceableItem, PricingRate,
};
pub use payment::{CreatePayment, Payment, SETTLED_STATUSES};
pub use product_line::{CreateProductLine, NewProductLine, ProductLine};
pub use zone::{DepositMode, SettingsAudit, UpdateZoneSettings, ZoneSettings};
