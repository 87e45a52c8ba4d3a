pub mod aggregate;
pub mod dispatch;
