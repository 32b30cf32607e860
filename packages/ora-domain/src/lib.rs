pub mod candidate;
pub mod intent;
pub mod language;
pub mod normalize;

pub use candidate::{Candidate, SourceMix, SourceType, content_key, normalize_content};
pub use intent::Intent;
pub use normalize::{Query, QueryRejectReason};
