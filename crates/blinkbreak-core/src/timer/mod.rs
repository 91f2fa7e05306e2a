mod scheduler;
mod session;
mod skip_limiter;

pub use scheduler::BreakScheduler;
pub use session::{BreakSession, SessionState, BREAK_DURATION_SECS};
pub use skip_limiter::{SkipCap, SkipLimiter, SKIP_WINDOW_SECS};
