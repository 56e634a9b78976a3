//! Terminal dashboard for a crypto market REST API: live tables, charts with
//! EMA and Bollinger overlays, a watchlist, price alerts and a profit
//! simulator.

pub mod api;
pub mod config;
pub mod error;
pub mod ui;

pub use config::Config;
pub use error::{DashboardError, Result};
