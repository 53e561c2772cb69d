pub mod constraints;
pub mod performance;
pub mod process;
pub mod quantities;
pub mod sentinels;
pub mod types;

pub use constraints::{guarded_ratio, RatioWindow};
pub use performance::{PerformanceEvaluator, PerformanceRecord};
pub use process::{Device, Polarity, ProcessConstants};
pub use types::*;
