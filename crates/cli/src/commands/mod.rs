pub mod chat;
pub mod logs;
pub mod onboard;
pub mod pricing;
pub mod status;
