//! Services Layer
//!
//! Business logic between the rendering layer and the backend API client.
//! Services fetch through [`crate::api::MarketApi`], shape the data the UI
//! needs, and feed the screening engine; they never format HTML or touch
//! presentation.
//!
//! # Services
//!
//! - `SectorService` - sector list, sector search, dragon-table loading,
//!   cumulative-gain stock lists
//! - `StockService` - per-stock money-flow series

pub mod sector_service;
pub mod stock_service;

pub use sector_service::{SectorService, SectorLoadResult, StockChange};
pub use stock_service::{MoneyFlowView, StockService};
