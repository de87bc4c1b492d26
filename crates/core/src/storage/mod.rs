pub mod backing;
pub mod manager;
