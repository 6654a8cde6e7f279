//! Site classification, tracking and nudge gating.

mod gatekeeper;
mod host;
mod tracking;

pub use gatekeeper::{NudgeGatekeeper, NudgeKind, PendingNudge, DEFAULT_COOLDOWN_MS};
pub use host::{host_from_url, normalize_host, BlockList, BUILTIN_SITES};
pub use tracking::{SiteTracking, WatchOutcome, WatchSession};
