pub mod availability;
pub mod booking;
pub mod calendar;
pub mod holidays;
pub mod interval_control;
pub mod ledger;
pub mod slots;
