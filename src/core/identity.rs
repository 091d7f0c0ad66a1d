//! Local user and host identification
//!
//! Used for token fingerprints, default gist descriptions and as the git
//! identity fallback when no primary email is known.

/// Login name of the local user
pub fn user_name() -> String {
    whoami::username()
}

/// Host name of the local machine, `localhost` if it cannot be determined
pub fn host_name() -> String {
    whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string())
}
