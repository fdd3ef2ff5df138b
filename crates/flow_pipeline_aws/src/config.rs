//! Environment-variable configuration for the worker and client binaries.

/// Reads an environment variable, treating blank values as unset.
pub fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Reads a required environment variable, terminating the process with a
/// message when it is missing or blank. Binary bootstrap only.
pub fn require_env(name: &str) -> String {
    match optional_env(name) {
        Some(value) => value,
        None => {
            eprintln!("{name} must be configured");
            std::process::exit(1);
        }
    }
}
