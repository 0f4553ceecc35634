pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod sort;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use errors::{AppError, StatsError};
pub use sort::{sort, SortOrder};
pub use state::AppState;
pub use stats::compute;
