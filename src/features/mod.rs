//! Behavioral feature construction over the historical vote table

pub mod behavioral;

pub use behavioral::{enrich, BehavioralRates, HistoricalRates, NEUTRAL_RATE};
