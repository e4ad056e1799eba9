pub mod activity;
pub mod notify;
pub mod uploads;
