//! Configuration utility functions.

use std::path::{Path, PathBuf};

use url::Url;

/// Resolve `location` against `base_uri`.
///
/// Absolute locations are returned as-is (normalized); relative ones are
/// joined onto the base. Returns `None` if the base is not an absolute URL.
///
/// # Examples
/// ```ignore
/// resolve_location("https://localhost/app/", "counter")   -> Some("https://localhost/app/counter")
/// resolve_location("https://localhost/app/", "/about")    -> Some("https://localhost/about")
/// resolve_location("invalid", "counter")                  -> None
/// ```
pub fn resolve_location(base_uri: &str, location: &str) -> Option<String> {
    let base = Url::parse(base_uri).ok()?;
    let resolved = base.join(location).ok()?;
    Some(resolved.to_string())
}

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

// ============================================================================
// tests
// ============================================================================
