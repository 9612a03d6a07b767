//! 수집-집계 모듈.

pub mod daily_rollup;
pub mod fx_refresh;
pub mod quote_collect;

pub use daily_rollup::{rollup_all, rollup_stock, RollupOutcome};
pub use fx_refresh::{load_snapshot, refresh_fx_rate};
pub use quote_collect::{build_samples, run_cycle};
