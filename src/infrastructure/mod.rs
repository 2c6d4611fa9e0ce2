//! 基础设施层：持有稀缺资源与共享状态，只暴露能力

pub mod clock;
pub mod rate_limiter;
pub mod request_gate;

pub use clock::{Clock, FixedJitter, JitterSource, ManualClock, RandomJitter, SystemClock};
pub use rate_limiter::{BreakerState, BreakerTrip, RateLimitManager};
pub use request_gate::{GatePermit, RequestGate};
