//! Polling subdomain.
//!
//! Pure bookkeeping for the bounded retry loop; the loop itself (timers,
//! backend calls, cancellation) lives in the application layer.
//!
//! ```text
//!          submit
//!   [idle] ──────> [cached?] ── yes ──> [done]
//!                      │ no
//!                      v
//!                 [polling] ── ready ──────────> [done]
//!                   │  ^   └── failed ─────────> [failed]
//!                   │  └ pending (attempts left)
//!                   └── attempts exhausted ────> [timed_out]
//! ```

pub mod policy;
pub mod session;
pub mod verdict;
