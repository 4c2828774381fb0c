//! Input fingerprinting for report deduplication.
//!
//! Semantically identical report requests must always hash identically, so
//! every fingerprint is computed over a canonical, order-independent
//! serialization of the type-specific input. The digest is a cache key,
//! not a security boundary.

use sha2::{Digest, Sha256};

use crate::reports::types::ReportType;

/// Compute the dedup fingerprint for a tracking-readiness report.
///
/// The normalized target URL is the only input; detected technologies are
/// derived data and must not affect the cache key.
pub fn tracking_fingerprint(url: &str) -> String {
    digest(ReportType::TrackingReadiness, url)
}

/// Compute the dedup fingerprint for a spend-baseline report.
///
/// Account ids are sorted before joining so that request ordering does not
/// change the digest.
pub fn spend_fingerprint(account_ids: &[String], days: u32) -> String {
    let mut ids: Vec<&str> = account_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    digest(
        ReportType::SpendBaseline,
        &format!("{}:{}", ids.join(","), days),
    )
}

/// Compute the dedup fingerprint for a competitor-snapshot report.
pub fn competitor_fingerprint(domain: &str) -> String {
    digest(ReportType::CompetitorSnapshot, &normalize_domain(domain))
}

fn digest(report_type: ReportType, canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(report_type.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Reduce a URL or host string to a bare domain: scheme, path, query, port
/// and a leading `www.` are stripped, and the result is lowercased.
pub fn normalize_domain(input: &str) -> String {
    let mut s = input.trim().to_ascii_lowercase();
    if let Some(idx) = s.find("://") {
        s = s[idx + 3..].to_string();
    }
    if let Some(idx) = s.find(['/', '?', '#']) {
        s.truncate(idx);
    }
    if let Some(idx) = s.find(':') {
        s.truncate(idx);
    }
    s.strip_prefix("www.").map(str::to_string).unwrap_or(s)
}

/// Stable identifier for an analyzed website, derived from its normalized
/// URL. Belongs to the URL-normalization contract so callers never need a
/// handle on the analyzer to compute it.
pub fn website_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_domain(url).as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = tracking_fingerprint("https://example.com");
        let b = tracking_fingerprint("https://example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_differs_by_type() {
        let tracking = tracking_fingerprint("example.com");
        let competitor = competitor_fingerprint("example.com");
        assert_ne!(tracking, competitor);
    }

    #[test]
    fn test_spend_fingerprint_order_independent() {
        let a = spend_fingerprint(
            &["acc-2".to_string(), "acc-1".to_string(), "acc-3".to_string()],
            90,
        );
        let b = spend_fingerprint(
            &["acc-3".to_string(), "acc-1".to_string(), "acc-2".to_string()],
            90,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_spend_fingerprint_sensitive_to_window() {
        let a = spend_fingerprint(&["acc-1".to_string()], 30);
        let b = spend_fingerprint(&["acc-1".to_string()], 90);
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize_domain_strips_scheme_and_path() {
        assert_eq!(
            normalize_domain("https://www.Example.com/pricing?x=1"),
            "example.com"
        );
        assert_eq!(normalize_domain("http://example.com:8080/a"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("sub.example.com/path"), "sub.example.com");
    }

    #[test]
    fn test_competitor_fingerprint_invariant_to_url_form() {
        let a = competitor_fingerprint("https://www.example.com/about");
        let b = competitor_fingerprint("example.com");
        assert_eq!(a, b);
    }

    #[test]
    fn test_website_id_stable_and_short() {
        let a = website_id("https://example.com/");
        let b = website_id("http://www.example.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, website_id("https://other.com"));
    }
}
