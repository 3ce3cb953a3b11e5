//! Application services: every operation the HTTP layer exposes, with its
//! validation, authorization, store calls, audit entries and stale views.

pub mod admin;
pub mod allowed_email;
pub mod audit;
pub mod auth;
pub mod calendar;
pub mod club;
pub mod community;
pub mod context;
pub mod error;
pub mod profile;
pub mod residence;
pub mod view;
pub mod whitelist;

#[cfg(test)]
pub(crate) mod test_util;
