//! 프리미엄 추적을 위한 도메인 모델.

mod daily_stats;
mod fx_rate;
mod premium;
mod quote;
mod stock_link;

pub use daily_stats::*;
pub use fx_rate::*;
pub use premium::*;
pub use quote::*;
pub use stock_link::*;
