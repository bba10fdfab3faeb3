pub mod deep_link;
pub mod machine;
pub mod prompt;
pub mod runner;
pub mod store;
pub mod types;
pub mod view;

pub use deep_link::{deep_link_fragment, parse_deep_link, share_url};
pub use machine::{DebateEvent, IgnoredReason, Transition, apply, status_after};
pub use runner::{DebateRunner, StepOutcome, TurnOutcome};
pub use store::{DebateStore, DebateSummary, SqliteDebateStore};
pub use types::{DebateConfig, DebateMessage, DebateSession, DebateStatus, Participant};
pub use view::{Access, Controls, DebateView};
