use crate::model::{HOUR_MS, MINUTE_MS, Ms};

/// Shortest reservation the engine admits (inclusive).
pub const MIN_RESERVATION_MS: Ms = 30 * MINUTE_MS;

/// Longest reservation the engine admits (inclusive).
pub const MAX_RESERVATION_MS: Ms = 8 * HOUR_MS;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_DESCRIPTION_LEN: usize = 4096;
pub const MAX_REQUESTER_LEN: usize = 128;
pub const MAX_NOTE_LEN: usize = 1024;
