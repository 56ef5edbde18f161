//! Authentication by shared code

use voltbay_api::Authenticated;
use voltbay_util::{Result, StationError};

use crate::CodeBook;

/// Match a keypad entry against the code book.
///
/// The admin code is checked first. A user code yields `user-<k>` where `k`
/// is its 1-based position in the current ordering, so the identity of a
/// code can change when earlier codes are removed. Pure: no side effects on
/// success or failure.
pub fn authenticate(codes: &CodeBook, presented: &str) -> Result<Authenticated> {
    if codes.is_admin(presented) {
        return Ok(Authenticated::admin());
    }

    codes
        .position_of(presented)
        .map(|index| Authenticated::user(index + 1))
        .ok_or(StationError::InvalidCode)
}

/// Membership check used to authorize a stop: any admin or user code passes.
pub fn validate_code(codes: &CodeBook, presented: &str) -> bool {
    codes.is_admin(presented) || codes.position_of(presented).is_some()
}
