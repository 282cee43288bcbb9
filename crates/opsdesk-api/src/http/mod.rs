//! CORS relay for browser front ends.
//!
//! Chat requests under `/glean/` go to the host named by `X-Glean-Backend`;
//! everything else goes to the issue tracker.

pub mod error;
pub mod relay;
pub mod router;
