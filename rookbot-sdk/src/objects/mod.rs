pub mod account;
pub mod challenge;
pub mod event;
pub mod roster;
pub mod variant;

pub use account::{Account, NowPlaying, OngoingGame};
pub use challenge::{ChallengeRequest, ChallengeSummary, DeclineReason, OpenChallenges};
pub use event::Event;
pub use roster::OnlineBot;
pub use variant::{PerfType, Variant, perf_type_of};
