/// Prefixes a substituted path with the configured base URL. Absolute
/// URLs and a missing base pass through untouched.
pub fn join_base_url(base: Option<&str>, path: &str) -> String {
    let base = match base.map(str::trim) {
        Some(base) if !base.is_empty() => base,
        _ => return path.to_string(),
    };

    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
