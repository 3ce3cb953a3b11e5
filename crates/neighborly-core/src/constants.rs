/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const AUTH_ROUTE_COMPONENT: &str = "auth";
pub const AUTH_ROUTE_PREFIX: &str = const_str::concat!(API_ROUTE_PREFIX, "/", AUTH_ROUTE_COMPONENT);

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Response header listing the views a mutation made stale.
pub const REVALIDATE_HEADER: &str = "x-revalidate";

/// The five streets that make up the neighborhood, in display order.
pub const STREET_NAMES: [&str; 5] = [
    "Symor Dr",
    "Brothers Pl",
    "Fanok Rd",
    "Hadley Way",
    "Herms Pl",
];

/// Maximum length of a free-text description.
pub const DESCRIPTION_MAX_LEN: usize = 5000;

/// Maximum length of a comment body.
pub const COMMENT_MAX_LEN: usize = 2000;

/// Maximum length of an event location.
pub const LOCATION_MAX_LEN: usize = 200;
