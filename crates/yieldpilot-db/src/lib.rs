//! YieldPilot storage layer.
//!
//! Defines the three stores the ranker talks to and two backends for them:
//!
//! - [`FlagStore`]: generic key/JSON feature-flag table (holds `ranking_weights`)
//! - [`MetricsRepository`]: per-listing metrics records (`rank_score`, `factors`, `updated_at`)
//! - [`AdjustedMetricsView`]: precomputed regulation-adjusted yield view
//!
//! [`MemoryStore`] keeps everything in process and backs tests and local runs.
//! [`PgStore`] talks to the Supabase Postgres database through `sqlx`.
//!
//! # Example
//!
//! ```rust,no_run
//! use yieldpilot_db::{MetricsRepository, PgStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PgStore::connect("postgres://localhost/yieldpilot", 5).await?;
//!     let first_page = store.fetch_page(None, 100).await?;
//!     println!("{} records", first_page.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{DbError, Result};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{AdjustedMetricsView, FlagStore, MetricsRepository};
