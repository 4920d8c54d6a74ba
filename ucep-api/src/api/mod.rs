//! HTTP API handlers for ucep-api
//!
//! One router fragment per resource, merged in [`crate::build_router`].

pub mod admin;
pub mod applications;
pub mod auth;
pub mod badges;
pub mod events;
pub mod health;
pub mod housing;
pub mod jobs;
pub mod matching;
pub mod scholarships;
pub mod users;

pub use admin::admin_routes;
pub use applications::application_routes;
pub use auth::auth_middleware;
pub use badges::badge_routes;
pub use events::event_routes;
pub use health::health_routes;
pub use housing::housing_routes;
pub use jobs::job_routes;
pub use matching::matching_routes;
pub use scholarships::scholarship_routes;
pub use users::user_routes;
