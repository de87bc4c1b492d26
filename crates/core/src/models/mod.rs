pub mod analytics;
pub mod chart;
pub mod coin;
pub mod holding;
pub mod notification;
pub mod settings;
pub mod state;
