//! Management API router: mounts all campaign endpoints under /api/v1.

use crate::handlers::{self, ManagementState};
use axum::routing::{get, post, put};
use axum::Router;

/// Build the router with all endpoints.
/// Returns a Router that should be merged into the main app.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        // Campaigns
        .route(
            "/api/v1/campaigns",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route("/api/v1/campaigns/:id", get(handlers::get_campaign))
        .route(
            "/api/v1/campaigns/:id/activate",
            post(handlers::activate_campaign),
        )
        .route("/api/v1/campaigns/:id/end", post(handlers::end_campaign))
        // Authoring
        .route(
            "/api/v1/campaigns/:id/schema",
            get(handlers::get_schema).put(handlers::put_schema),
        )
        .route("/api/v1/campaigns/:id/window", put(handlers::put_window))
        // Responses
        .route(
            "/api/v1/campaigns/:id/responses",
            post(handlers::submit_response),
        )
        .route("/api/v1/campaigns/:id/stats", get(handlers::campaign_stats))
        // Rewards & raffle
        .route(
            "/api/v1/campaigns/:id/rewards",
            get(handlers::list_rewards).post(handlers::create_reward),
        )
        .route(
            "/api/v1/campaigns/:id/redemptions",
            post(handlers::create_redemption),
        )
        .route(
            "/api/v1/campaigns/:id/redemptions/dedup",
            get(handlers::dedup_summary),
        )
        .route(
            "/api/v1/campaigns/:id/rewards/:reward_id/draw",
            post(handlers::draw_winner),
        )
        .route("/api/v1/results/:code", get(handlers::lookup_result))
        .with_state(state)
}
