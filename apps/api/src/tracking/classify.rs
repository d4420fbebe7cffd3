//! Request classification: client IP, device, browser and traffic source.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use url::Url;

const BOT_MARKERS: [&str; 9] = [
    "bot",
    "crawler",
    "spider",
    "headless",
    "slurp",
    "preview",
    "facebookexternalhit",
    "curl/",
    "python-requests",
];

const MAIL_HOSTS: [&str; 5] = [
    "mail.google.com",
    "outlook.live.com",
    "outlook.office.com",
    "mail.yahoo.com",
    "mail.proton.me",
];

/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn is_bot(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ua.is_empty() || BOT_MARKERS.iter().any(|m| ua.contains(m))
}

pub fn classify_device(user_agent: &str) -> &'static str {
    if is_bot(user_agent) {
        return "bot";
    }
    let ua = user_agent.to_ascii_lowercase();
    let android = ua.contains("android");
    if ua.contains("ipad") || ua.contains("tablet") || (android && !ua.contains("mobile")) {
        "tablet"
    } else if ua.contains("mobi") || ua.contains("iphone") || android {
        "mobile"
    } else {
        "desktop"
    }
}

/// Order matters: Chromium derivatives also advertise `Chrome/` and `Safari/`.
pub fn classify_browser(user_agent: &str) -> &'static str {
    if user_agent.contains("Edg/") || user_agent.contains("EdgA/") || user_agent.contains("EdgiOS/") {
        "edge"
    } else if user_agent.contains("OPR/") || user_agent.contains("Opera") {
        "opera"
    } else if user_agent.contains("SamsungBrowser/") {
        "samsung"
    } else if user_agent.contains("Firefox/") || user_agent.contains("FxiOS/") {
        "firefox"
    } else if user_agent.contains("Chrome/") || user_agent.contains("CriOS/") {
        "chrome"
    } else if user_agent.contains("Safari/") {
        "safari"
    } else {
        "other"
    }
}

/// Traffic source: explicit `utm_source`, else the referrer host, else `direct`.
/// Referrals from `own_host` count as direct.
pub fn classify_source(utm_source: Option<&str>, referrer: Option<&str>, own_host: Option<&str>) -> String {
    if let Some(utm) = utm_source.map(str::trim).filter(|s| !s.is_empty()) {
        return utm.to_ascii_lowercase();
    }

    let host = referrer
        .and_then(|r| Url::parse(r.trim()).ok())
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

    let host = match host {
        Some(h) => h,
        None => return "direct".to_string(),
    };
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if own_host.is_some_and(|own| own.strip_prefix("www.").unwrap_or(own).eq_ignore_ascii_case(&host)) {
        return "direct".to_string();
    }

    let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

    if MAIL_HOSTS.iter().any(|m| host == *m) {
        "email".to_string()
    } else if matches("linkedin.com") || matches("lnkd.in") {
        "linkedin".to_string()
    } else if host.starts_with("google.") || host.contains(".google.") {
        "google".to_string()
    } else if matches("github.com") {
        "github".to_string()
    } else if host.starts_with("indeed.") || host.contains(".indeed.") {
        "indeed".to_string()
    } else if matches("t.co") || matches("twitter.com") || matches("x.com") {
        "twitter".to_string()
    } else {
        host
    }
}

/// Host part of a configured base URL, used to detect self-referrals.
pub fn host_of(base_url: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
    const EDGE_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.2592.87";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
    const ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36";
    const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
    const LINKEDIN_PREVIEW: &str = "LinkedInBot/1.0 (compatible; Mozilla/5.0; Apache-HttpClient +http://www.linkedin.com)";

    #[test]
    fn test_device_classification() {
        assert_eq!(classify_device(CHROME_DESKTOP), "desktop");
        assert_eq!(classify_device(SAFARI_IPHONE), "mobile");
        assert_eq!(classify_device(ANDROID_PHONE), "mobile");
        assert_eq!(classify_device(ANDROID_TABLET), "tablet");
        assert_eq!(classify_device(GOOGLEBOT), "bot");
        assert_eq!(classify_device(""), "bot");
    }

    #[test]
    fn test_link_preview_fetchers_are_bots() {
        assert!(is_bot(LINKEDIN_PREVIEW));
        assert!(!is_bot(FIREFOX_LINUX));
    }

    #[test]
    fn test_browser_classification_prefers_derivatives() {
        assert_eq!(classify_browser(EDGE_DESKTOP), "edge");
        assert_eq!(classify_browser(CHROME_DESKTOP), "chrome");
        assert_eq!(classify_browser(SAFARI_IPHONE), "safari");
        assert_eq!(classify_browser(FIREFOX_LINUX), "firefox");
        assert_eq!(classify_browser("curl/8.0"), "other");
    }

    #[test]
    fn test_source_prefers_utm() {
        assert_eq!(
            classify_source(Some("Newsletter"), Some("https://www.linkedin.com/feed"), None),
            "newsletter"
        );
    }

    #[test]
    fn test_source_from_referrer_host() {
        assert_eq!(classify_source(None, Some("https://www.linkedin.com/in/x"), None), "linkedin");
        assert_eq!(classify_source(None, Some("https://lnkd.in/abc"), None), "linkedin");
        assert_eq!(classify_source(None, Some("https://www.google.co.uk/"), None), "google");
        assert_eq!(classify_source(None, Some("https://mail.google.com/mail/u/0"), None), "email");
        assert_eq!(classify_source(None, Some("https://t.co/xyz"), None), "twitter");
        assert_eq!(classify_source(None, Some("https://github.com/me"), None), "github");
        assert_eq!(classify_source(None, Some("https://www.example.org/jobs"), None), "example.org");
    }

    #[test]
    fn test_source_direct_cases() {
        assert_eq!(classify_source(None, None, None), "direct");
        assert_eq!(classify_source(Some("  "), Some("not a url"), None), "direct");
        assert_eq!(
            classify_source(None, Some("https://jobs.example.com/p/x"), Some("jobs.example.com")),
            "direct"
        );
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers, Some(peer)), "198.51.100.4");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");

        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://Jobs.Example.com/").as_deref(), Some("jobs.example.com"));
        assert_eq!(host_of("nope"), None);
    }
}
