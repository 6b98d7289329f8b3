//! Match orchestrator: the public entry points of the match core.
//!
//! [`MatchService`] drives one event at a time (submit, confirm, dispute,
//! resolve, expire, bye, manual rating change) through validation and the
//! state machine, then writes the match, bracket slots, participant totals,
//! profiles and history rows in a single commit.
//!
//! # Example
//!
//! ```
//! use cue_league::{
//!     LogNotifier, ManualClock, Match, MatchKind, MatchService, MemoryStore, Participant,
//!     StaticAuthority,
//! };
//! use cue_league::tournament::StaticRules;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! store.insert_participant(Participant::new(10, 1, 100)).await;
//! store.insert_participant(Participant::new(20, 1, 200)).await;
//! store
//!     .insert_match(Match::new(1, 1, MatchKind::Normal, Some(10), Some(20)))
//!     .await;
//!
//! let service = MatchService::new(
//!     store,
//!     Arc::new(StaticRules::default()),
//!     Arc::new(LogNotifier),
//!     Arc::new(StaticAuthority::default()),
//!     Arc::new(ManualClock::new(chrono::Utc::now())),
//! );
//!
//! service.submit_result(1, 100, 5, 2).await.unwrap();
//! let m = service.confirm_result(1, 200).await.unwrap();
//! assert_eq!(m.winner_id, Some(10));
//! # }
//! ```

pub mod errors;
pub mod manager;

pub use errors::{ServiceError, ServiceResult};
pub use manager::{ByeRequest, ExpireOutcome, MatchService, SweepReport};
