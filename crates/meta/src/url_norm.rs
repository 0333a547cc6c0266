// ABOUTME: URL normalization used as the single source of cache keys.
// ABOUTME: Defaults the scheme to https and adds `www.` to bare apex domains.

use url::Url;

fn has_http_scheme(raw: &str) -> bool {
    let lower = raw
        .get(..8)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| raw.to_ascii_lowercase());
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Canonicalize a raw link target for cache keying.
///
/// Never fails: input that does not parse as a URL is returned unchanged.
pub fn normalize(raw: &str) -> String {
    let candidate = if has_http_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let mut parsed = match Url::parse(&candidate) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };

    let apex = parsed
        .host_str()
        .filter(|host| host.split('.').count() == 2)
        .map(|host| format!("www.{}", host));
    if let Some(host) = apex {
        if parsed.set_host(Some(&host)).is_err() {
            return raw.to_string();
        }
    }

    parsed.to_string()
}

/// Scheme, host and port of a URL, e.g. `https://www.example.com`.
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

/// Lowercased host of a URL.
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn adds_scheme_and_www() {
        assert_eq!(normalize("example.com"), "https://www.example.com/");
    }

    #[test]
    fn bare_and_full_spellings_match() {
        assert_eq!(
            normalize("example.com"),
            normalize("https://www.example.com/")
        );
        assert_eq!(normalize("https://example.com"), "https://www.example.com/");
    }

    #[test]
    fn keeps_existing_subdomains() {
        assert_eq!(
            normalize("docs.example.com/guide"),
            "https://docs.example.com/guide"
        );
        assert_eq!(
            normalize("https://www.example.com/a"),
            "https://www.example.com/a"
        );
    }

    #[test]
    fn keeps_http_scheme_case_insensitively() {
        assert_eq!(normalize("http://example.com/x"), "http://www.example.com/x");
        assert_eq!(normalize("HTTPS://example.com/x"), "https://www.example.com/x");
    }

    #[test]
    fn preserves_path_query_and_fragment() {
        assert_eq!(
            normalize("https://news.ycombinator.com/item?id=12345#top"),
            "https://news.ycombinator.com/item?id=12345#top"
        );
    }

    #[test]
    fn unparseable_input_returned_unchanged() {
        assert_eq!(normalize("http://[bad"), "http://[bad");
        assert_eq!(normalize("exa mple.com"), "exa mple.com");
    }

    #[test]
    fn ip_hosts_are_not_www_prefixed() {
        assert_eq!(
            normalize("http://127.0.0.1:8080/page"),
            "http://127.0.0.1:8080/page"
        );
    }

    #[test]
    fn origin_and_hostname() {
        assert_eq!(
            origin("https://www.example.com/a/b?c=d"),
            Some("https://www.example.com".to_string())
        );
        assert_eq!(
            origin("http://127.0.0.1:8080/x"),
            Some("http://127.0.0.1:8080".to_string())
        );
        assert_eq!(hostname("https://GitHub.com/x"), Some("github.com".to_string()));
        assert_eq!(origin("not a url"), None);
    }
}
