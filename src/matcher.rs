//! Substring checks used to classify console output.
//!
//! There is no explicit "prompt received" signal on a serial console, so every
//! decision the controller makes comes down to whether some marker appears in
//! the bytes collected during a read window.

use memchr::memmem;

/// Fragment of `ls /` output that means a working shell answered.
pub const SHELL_MARKER: &str = "sbin";

/// Appears after the user name in `id` output and bounds the identity match.
pub const SECONDARY_MARKER: &str = "gid";

/// Whether `marker` occurs contiguously anywhere in `buffer`.
pub fn contains(buffer: &[u8], marker: &str) -> bool {
    position(buffer, marker).is_some()
}

/// Byte offset of the first occurrence of `marker` in `buffer`.
pub fn position(buffer: &[u8], marker: &str) -> Option<usize> {
    memmem::find(buffer, marker.as_bytes())
}

/// The `(user)` fragment `id` prints for `username`.
pub fn identity_marker(username: &str) -> String {
    format!("({username})")
}

/// Whether `id` output in `buffer` shows `username` as the current user.
///
/// The identity marker must be present and come strictly before the
/// [`SECONDARY_MARKER`]; a missing secondary marker never counts as a match.
pub fn identity_confirmed(buffer: &[u8], username: &str) -> bool {
    let Some(identity) = position(buffer, &identity_marker(username)) else {
        return false;
    };
    let Some(secondary) = position(buffer, SECONDARY_MARKER) else {
        return false;
    };
    identity < secondary
}
