//! Fixed size limits applied to stored session state. All counts are in
//! characters (Unicode scalar values) unless noted.

use crate::error::ValidationError;

/// Stored user turn.
pub const MAX_MESSAGE_CHARS: usize = 4000;
/// Clarifying question sent back to the user.
pub const MAX_QUESTION_CHARS: usize = 600;
/// Running conversation summary.
pub const MAX_SUMMARY_CHARS: usize = 1400;
pub const MAX_INCIDENT_SUMMARY_CHARS: usize = 1200;
pub const MAX_DOMAIN_CHARS: usize = 256;
pub const MAX_NOTES_CHARS: usize = 800;
/// Entries, not characters.
pub const MAX_TECH_STACK_ITEMS: usize = 24;
/// Session id accepted by the front door.
pub const MAX_SESSION_ID_CHARS: usize = 128;

/// Trimmed session id, or [`ValidationError::InvalidSessionId`] when it is
/// blank or longer than [`MAX_SESSION_ID_CHARS`].
pub fn checked_session_id(raw: &str) -> Result<&str, ValidationError> {
    let id = raw.trim();
    if id.is_empty() || id.chars().count() > MAX_SESSION_ID_CHARS {
        return Err(ValidationError::InvalidSessionId);
    }
    Ok(id)
}
