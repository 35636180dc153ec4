//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to the crate root when run from elsewhere (cargo run -p, tests)
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Get required env var; error if missing or blank.
pub fn env_req(key: &str) -> anyhow::Result<String> {
    env_opt(key).ok_or_else(|| anyhow::anyhow!("missing env var {key}"))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw),
        Err(_) => default,
    }
}

/// Optional parsed value.
pub fn env_parse_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    init_env();
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_flag(raw: &str) -> bool {
    let v = raw.trim().to_ascii_lowercase();
    matches!(v.as_str(), "1" | "true" | "on" | "yes")
}

fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("KEY") || k.contains("TOKEN")
    {
        return if val.trim().is_empty() {
            String::new()
        } else {
            "***".to_string()
        };
    }

    let val_trim = val.trim();

    // Base URLs occasionally carry credentials as query parameters.
    if k.contains("URL") {
        if let Some((base, query)) = val_trim.split_once('?') {
            let scrubbed: Vec<String> = query
                .split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((name, _)) if name.to_ascii_lowercase().contains("key") => {
                        format!("{name}=***")
                    }
                    _ => pair.to_string(),
                })
                .collect();
            return format!("{base}?{}", scrubbed.join("&"));
        }
    }

    val_trim.to_string()
}

/// Validate required keys and log a consolidated, redacted snapshot of configuration.
/// Returns error if any required key is missing.
pub fn preflight_check(title: &str, required: &[&str], also_log: &[&str]) -> anyhow::Result<()> {
    init_env();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|k| env_opt(k).is_none())
        .collect();
    let snapshot: Vec<(String, String)> = also_log
        .iter()
        .map(|&k| {
            let v = env_opt(k).unwrap_or_default();
            (k.to_string(), redact_value(k, &v))
        })
        .collect();
    info!(target = "preflight", title, snapshot = ?snapshot, "configuration snapshot");
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(format!(
            "missing required env: {:?}",
            missing
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_spellings() {
        for raw in ["1", "true", "ON", " yes "] {
            assert!(parse_flag(raw), "{raw}");
        }
        for raw in ["0", "false", "off", "nope", ""] {
            assert!(!parse_flag(raw), "{raw}");
        }
    }

    #[test]
    fn redacts_keys_and_url_credentials() {
        assert_eq!(redact_value("TMDB_API_KEY", "abc123"), "***");
        assert_eq!(redact_value("OMDB_API_KEY", ""), "");
        assert_eq!(
            redact_value("OMDB_BASE_URL", "https://omdb.example/?apikey=zzz&r=json"),
            "https://omdb.example/?apikey=***&r=json"
        );
        assert_eq!(
            redact_value("HTTP_TIMEOUT_SECS", " 15 "),
            "15"
        );
    }

    #[test]
    fn parse_falls_back_on_garbage() {
        std::env::set_var("BOXOFFICE_TEST_PARSE", "not-a-number");
        assert_eq!(env_parse("BOXOFFICE_TEST_PARSE", 7u32), 7);
        std::env::set_var("BOXOFFICE_TEST_PARSE", " 42 ");
        assert_eq!(env_parse("BOXOFFICE_TEST_PARSE", 7u32), 42);
        std::env::remove_var("BOXOFFICE_TEST_PARSE");
        assert_eq!(env_parse_opt::<u32>("BOXOFFICE_TEST_PARSE"), None);
    }
}
