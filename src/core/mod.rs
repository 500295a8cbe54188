// Core algorithm exports
pub mod activation;
pub mod ages;
pub mod fields;
pub mod filters;
pub mod matcher;
pub mod retriever;
pub mod scoring;
pub mod validation;

pub use activation::{MatchProfile, SiteProfile};
pub use fields::{assign, assign_all, Field};
pub use filters::{matches_age_constraints, matches_query};
pub use matcher::{MatchError, MatchResult, Matcher};
pub use retriever::{build_candidate_query, CandidateRetriever};
pub use scoring::{view_of, Scorer};
pub use validation::{FieldError, ProfileError, ProfileValidator, ValidationReport};
