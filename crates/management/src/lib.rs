//! Campaign survey backend: campaigns, authoring sessions, responses,
//! rewards and raffle draws.
//!
//! Provides REST API endpoints for the campaign dashboard and the public
//! survey pages. Data stored in DashMap (development); swap to PostgreSQL for production.

pub mod handlers;
pub mod models;
pub mod router;
pub mod session;
pub mod store;

pub use handlers::{ApiError, ManagementState};
pub use router::management_router;
pub use session::AuthoringSession;
pub use store::ManagementStore;
