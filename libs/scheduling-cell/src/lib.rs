pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::*;
pub use store::SchedulingStore;

pub use services::booking::BookingCoordinator;
pub use services::holidays::HolidayCalendar;
pub use services::interval_control::IntervalControlService;
pub use services::ledger::BookingLedger;
pub use services::slots::SlotGeneratorService;
