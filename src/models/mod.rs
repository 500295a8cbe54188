// Model exports
pub mod choices;
pub mod domain;
pub mod requests;
pub mod responses;

pub use choices::{Choice, Diet, Gender, MaritalStatus, Rank, RankMap, SmokingStatus};
pub use domain::{CandidateQuery, ExclusionSet, Profile, RankedProfile};
pub use requests::{ActivationStepRequest, BlockRequest, FindMatchesRequest, ProfileUpdateRequest};
pub use responses::{BlockResponse, ErrorResponse, FindMatchesResponse, HealthResponse, MatchSummary, ValidationResponse};
