pub mod config;
pub mod dispatch;
pub mod humanize;
pub mod observability;
pub mod pipeline;
pub mod record;
pub mod store;
