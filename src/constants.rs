pub const API_PREFIX: &str = "api";
pub const API_APP: &str = "recipe";

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 1;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_LINK_LENGTH: usize = 255;

/* price column: NUMERIC(5, 2) */
pub const PRICE_MAX_DIGITS: usize = 5;
pub const PRICE_DECIMAL_PLACES: usize = 2;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
