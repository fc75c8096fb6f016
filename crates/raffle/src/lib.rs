//! Raffle engine: multi-key deduplication of reward redemptions and an
//! atomic, non-repeating random draw.

pub mod dedup;
pub mod engine;
pub mod store;
pub mod types;

pub use dedup::{dedup, identity_keys, DedupOutcome, IdentityKey};
pub use engine::{pick_uniform, DrawSession, RaffleEngine};
pub use store::RaffleStore;
pub use types::*;
