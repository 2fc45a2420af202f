//! Background SDK version check
//!
//! Queries the package registry for the latest published version. The check
//! is strictly best-effort: any failure (network error, non-2xx status,
//! unparseable body) collapses to [`VersionCheckResult::Failed`] and a debug
//! log line. The recording path never depends on it.

use reqwest::Client;
use tracing::debug;

/// Current crate version (from Cargo.toml)
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default registry endpoint for the published SDK
pub const DEFAULT_REGISTRY_URL: &str = "https://crates.io/api/v1/crates/traceline";

/// Result of a version check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheckResult {
    /// A newer version is available
    UpdateAvailable { latest: String },
    /// Already on the latest (or newer) version
    UpToDate,
    /// Check failed; callers treat this as "no information"
    Failed,
}

/// Compare two semver-like version strings.
///
/// Returns `true` if `latest` is strictly newer than `current`. Pre-release
/// suffixes are ignored; an unparseable version is never "newer".
pub fn is_newer(current: &str, latest: &str) -> bool {
    let parse = |v: &str| -> Option<(u32, u32, u32)> {
        let v = v.strip_prefix('v').unwrap_or(v);
        let v = v.split('-').next()?;
        let mut parts = v.splitn(3, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        Some((major, minor, patch))
    };

    match (parse(current), parse(latest)) {
        (Some(c), Some(l)) => l > c,
        _ => false,
    }
}

/// Parse the latest stable version out of a crates.io style response
fn parse_registry_version(json: &serde_json::Value) -> Option<String> {
    let krate = json.get("crate")?;
    let version = krate
        .get("max_stable_version")
        .or_else(|| krate.get("max_version"))?
        .as_str()?;
    Some(version.to_string())
}

/// Query the registry for the latest published version
pub async fn check_latest(client: &Client, registry_url: &str) -> VersionCheckResult {
    let response = match client.get(registry_url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "Version check request failed");
            return VersionCheckResult::Failed;
        }
    };

    if !response.status().is_success() {
        debug!(status = %response.status(), "Version check returned non-success status");
        return VersionCheckResult::Failed;
    }

    let body = match response.json::<serde_json::Value>().await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "Version check response was not valid JSON");
            return VersionCheckResult::Failed;
        }
    };

    match parse_registry_version(&body) {
        Some(latest) if is_newer(CURRENT_VERSION, &latest) => {
            VersionCheckResult::UpdateAvailable { latest }
        }
        Some(_) => VersionCheckResult::UpToDate,
        None => {
            debug!("Version check response missing version field");
            VersionCheckResult::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_newer_basic() {
        assert!(is_newer("0.1.0", "0.2.0"));
        assert!(is_newer("0.1.0", "1.0.0"));
        assert!(is_newer("1.2.3", "1.2.4"));
        assert!(!is_newer("0.2.0", "0.1.0"));
        assert!(!is_newer("1.0.0", "1.0.0"));
    }

    #[test]
    fn test_is_newer_prefixes_and_prereleases() {
        assert!(is_newer("0.1.0", "v0.2.0"));
        assert!(is_newer("0.1.0-dev", "0.2.0"));
        assert!(!is_newer("0.2.0", "0.2.0-rc.1"));
    }

    #[test]
    fn test_is_newer_unparseable() {
        assert!(!is_newer("0.1.0", "latest"));
        assert!(!is_newer("garbage", "0.2.0"));
    }

    #[test]
    fn test_parse_registry_version() {
        let body = serde_json::json!({
            "crate": {"max_stable_version": "0.3.1", "max_version": "0.4.0-beta.1"}
        });
        assert_eq!(parse_registry_version(&body), Some("0.3.1".to_string()));

        let body = serde_json::json!({"crate": {"max_version": "0.4.0"}});
        assert_eq!(parse_registry_version(&body), Some("0.4.0".to_string()));

        let body = serde_json::json!({"ok": true});
        assert_eq!(parse_registry_version(&body), None);
    }
}
