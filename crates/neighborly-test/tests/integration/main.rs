//! End-to-end tests over the full HTTP router. Most run on the in-memory
//! store; `postgres` runs against a real database when `TEST_DATABASE_URL`
//! is set.

mod admin;
mod auth_flow;
mod calendar;
mod clubs;
mod community;
mod helpers;
mod postgres;
mod residence_claim;
