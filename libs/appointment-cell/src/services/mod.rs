pub mod booking;
pub mod lifecycle;
pub mod notify;
pub mod sweep;
