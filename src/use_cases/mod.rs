// Use cases layer: room workflows, match orchestration and leaderboards.

pub mod leaderboard;
pub mod orchestrator;
pub mod registry;
pub mod scheduler;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use orchestrator::{MatchOrchestrator, MatchSettings};
pub use registry::Registry;
pub use types::{Command, Notifier, PieceAction, ServerEvent};
