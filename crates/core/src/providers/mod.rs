pub mod traits;

// API gateway implementations
pub mod coingecko;
