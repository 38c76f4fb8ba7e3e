//! Daily earnings digest: fetches the earnings calendar for a date,
//! filters it by a configured watchlist, and posts formatted summaries
//! to a Discord webhook.

pub mod config;
pub mod models;
pub mod service;
