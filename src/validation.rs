//! Group name validation
//!
//! Group names come straight off the wire and are resolved to spool
//! directories, so they are validated before any filesystem access.

use crate::{NewsError, Result};

/// Validates a newsgroup name for spool lookup
///
/// Rules (RFC 977 group names, restricted to what the spool layout can
/// represent safely):
/// - must not contain `..` (directory traversal)
/// - only ASCII letters, digits, and `.` are allowed
///
/// # Examples
///
/// ```
/// use newsd::validation::validate_group_name;
///
/// assert!(validate_group_name("rush.general").is_ok());
/// assert!(validate_group_name("alt.test").is_ok());
/// assert!(validate_group_name("../etc").is_err());      // traversal
/// assert!(validate_group_name("alt/test").is_err());    // invalid char
/// ```
pub fn validate_group_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains("..") {
        return Err(NewsError::InvalidGroupName("illegal groupname".to_string()));
    }

    for ch in name.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '.') {
            return Err(NewsError::InvalidGroupName(
                "illegal chars in groupname".to_string(),
            ));
        }
    }

    Ok(())
}
