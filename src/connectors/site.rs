//! Minimal live site analyzer.
//!
//! Fetches the target page and detects well-known tracking snippets by
//! marker strings. Deep content/NLP analysis is intentionally out of
//! scope; anything this analyzer cannot see simply lowers the report's
//! evidence, it does not fail generation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{ConnectorError, SiteAnalyzer, SiteProfile};

/// Marker substrings that identify a technology in page source, together
/// with the category and display name we report it under.
const TECH_MARKERS: &[(&str, &str, &str)] = &[
    ("googletagmanager.com/gtm.js", "Tag Managers", "Google Tag Manager"),
    ("google-analytics.com/analytics.js", "Analytics", "Google Analytics"),
    ("googletagmanager.com/gtag/js", "Analytics", "Google Analytics 4"),
    ("cdn.mxpnl.com", "Analytics", "Mixpanel"),
    ("cdn.amplitude.com", "Analytics", "Amplitude"),
    ("static.hotjar.com", "Analytics", "Hotjar"),
    ("connect.facebook.net", "Advertising", "Facebook Pixel"),
    ("snap.licdn.com", "Advertising", "LinkedIn Insight"),
    ("analytics.tiktok.com", "Advertising", "TikTok Pixel"),
    ("cdn.cookielaw.org", "Privacy", "OneTrust"),
    ("consent.cookiebot.com", "Privacy", "Cookiebot"),
    ("cdn.shopify.com", "Ecommerce", "Shopify"),
    ("wp-content", "CMS", "WordPress"),
];

const PIXEL_MARKERS: &[(&str, &str)] = &[
    ("fbq(", "Facebook Pixel"),
    ("gtag(", "Google Analytics"),
    ("_linkedin_partner_id", "LinkedIn Insight"),
    ("ttq.load", "TikTok Pixel"),
    ("twq(", "Twitter Pixel"),
];

/// Site analyzer backed by a plain HTTP fetch.
pub struct HttpSiteAnalyzer {
    client: Client,
}

impl HttpSiteAnalyzer {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConnectorError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SiteAnalyzer for HttpSiteAnalyzer {
    async fn analyze(&self, url: &str) -> Result<SiteProfile, ConnectorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ConnectorError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Request(format!(
                "{url} returned status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::Request(e.to_string()))?;

        Ok(profile_from_html(url, &body))
    }
}

fn profile_from_html(url: &str, body: &str) -> SiteProfile {
    let lower = body.to_ascii_lowercase();

    let mut technologies: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (marker, category, name) in TECH_MARKERS {
        if lower.contains(marker) {
            let entry = technologies.entry(category.to_string()).or_default();
            if !entry.iter().any(|t| t == name) {
                entry.push(name.to_string());
            }
        }
    }

    let mut tracking_pixels = Vec::new();
    for (marker, name) in PIXEL_MARKERS {
        if lower.contains(marker) && !tracking_pixels.iter().any(|p| p == name) {
            tracking_pixels.push(name.to_string());
        }
    }

    SiteProfile {
        url: url.to_string(),
        title: extract_title(body),
        description: extract_meta_description(body),
        technologies,
        tracking_pixels,
        ..Default::default()
    }
}

fn extract_title(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = body[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title>")? + open_end;
    let title = body[open_end..close].trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn extract_meta_description(body: &str) -> Option<String> {
    // Good enough for meta tags in the common attribute order.
    let lower = body.to_ascii_lowercase();
    let meta_start = lower.find("name=\"description\"")?;
    let content_start = lower[meta_start..].find("content=\"")? + meta_start + 9;
    let content_end = body[content_start..].find('"')? + content_start;
    let description = body[content_start..content_end].trim();
    (!description.is_empty()).then(|| description.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html>
<head>
<title>Acme Rockets — Ship Faster</title>
<meta name="description" content="Rocket logistics for modern teams">
<script src="https://www.googletagmanager.com/gtm.js?id=GTM-XYZ"></script>
<script src="https://connect.facebook.net/en_US/fbevents.js"></script>
<script>fbq('init', '123'); gtag('config', 'G-1');</script>
</head>
<body>Welcome</body>
</html>"#;

    #[test]
    fn test_profile_from_html_detects_markers() {
        let profile = profile_from_html("https://acme.example", SAMPLE);

        assert_eq!(profile.title.as_deref(), Some("Acme Rockets — Ship Faster"));
        assert_eq!(
            profile.description.as_deref(),
            Some("Rocket logistics for modern teams")
        );
        assert_eq!(
            profile.technologies.get("Tag Managers"),
            Some(&vec!["Google Tag Manager".to_string()])
        );
        assert_eq!(
            profile.technologies.get("Advertising"),
            Some(&vec!["Facebook Pixel".to_string()])
        );
        assert!(profile.tracking_pixels.contains(&"Facebook Pixel".to_string()));
        assert!(profile.tracking_pixels.contains(&"Google Analytics".to_string()));
    }

    #[test]
    fn test_profile_from_empty_html() {
        let profile = profile_from_html("https://bare.example", "<html></html>");
        assert!(profile.title.is_none());
        assert!(profile.technologies.is_empty());
        assert!(profile.tracking_pixels.is_empty());
    }

    #[test]
    fn test_extract_title_handles_attributes() {
        let html = r#"<TITLE lang="en"> Spaced Title </TITLE>"#;
        assert_eq!(extract_title(html).as_deref(), Some("Spaced Title"));
    }
}
