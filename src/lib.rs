//! Match engine - compatibility scoring, ranking and profile completion
//!
//! Scores pairs of dating profiles on a 0..=5 scale, retrieves and ranks
//! candidates for a requester, and walks profiles through an ordered set
//! of completion steps before they can be activated.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Matcher, MatchProfile, ProfileValidator, Scorer, SiteProfile};
pub use models::{Diet, Gender, MaritalStatus, Profile, Rank, RankMap, SmokingStatus};
