//! User-agent classification.
//!
//! Ordered, case-insensitive substring rules; the first matching rule wins.

/// Device, browser and OS families derived from a user-agent string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub device_type: Option<&'static str>,
    pub browser: Option<&'static str>,
    pub os: Option<&'static str>,
}

const FALLBACK: &str = "Other";

const DEVICE_RULES: &[(&[&str], &str)] = &[
    (&["mobile", "android", "iphone", "ipad", "phone"], "mobile"),
    (&["tablet", "ipad"], "tablet"),
];

const BROWSER_RULES: &[(&[&str], &str)] = &[
    (&["chrome"], "Chrome"),
    (&["firefox"], "Firefox"),
    (&["safari"], "Safari"),
    (&["edge"], "Edge"),
    (&["opera"], "Opera"),
];

const OS_RULES: &[(&[&str], &str)] = &[
    (&["windows"], "Windows"),
    (&["macintosh", "mac os x"], "macOS"),
    (&["linux"], "Linux"),
    (&["android"], "Android"),
    (&["ios", "iphone", "ipad"], "iOS"),
];

fn first_match(haystack: &str, rules: &[(&[&str], &'static str)]) -> Option<&'static str> {
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| haystack.contains(n)))
        .map(|(_, label)| *label)
}

/// Classifies a user-agent string.
///
/// A missing or blank user agent leaves every field unset. Otherwise devices
/// default to `desktop` and browser/OS to `Other` when no rule matches.
pub fn parse(user_agent: Option<&str>) -> ClientInfo {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return ClientInfo::default();
    };

    let ua = ua.to_ascii_lowercase();

    ClientInfo {
        device_type: Some(first_match(&ua, DEVICE_RULES).unwrap_or("desktop")),
        browser: Some(first_match(&ua, BROWSER_RULES).unwrap_or(FALLBACK)),
        os: Some(first_match(&ua, OS_RULES).unwrap_or(FALLBACK)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

    #[test]
    fn test_missing_and_blank_user_agent() {
        assert_eq!(parse(None), ClientInfo::default());
        assert_eq!(parse(Some("")), ClientInfo::default());
        assert_eq!(parse(Some("   ")), ClientInfo::default());
    }

    #[test]
    fn test_chrome_on_windows() {
        let info = parse(Some(CHROME_WINDOWS));
        assert_eq!(info.device_type, Some("desktop"));
        assert_eq!(info.browser, Some("Chrome"));
        assert_eq!(info.os, Some("Windows"));
    }

    #[test]
    fn test_firefox_on_linux() {
        let info = parse(Some(FIREFOX_LINUX));
        assert_eq!(info.device_type, Some("desktop"));
        assert_eq!(info.browser, Some("Firefox"));
        assert_eq!(info.os, Some("Linux"));
    }

    #[test]
    fn test_iphone_matches_mac_os_x_first() {
        let info = parse(Some(SAFARI_IPHONE));
        assert_eq!(info.device_type, Some("mobile"));
        assert_eq!(info.browser, Some("Safari"));
        assert_eq!(info.os, Some("macOS"));
    }

    #[test]
    fn test_safari_on_mac() {
        let info = parse(Some(SAFARI_MAC));
        assert_eq!(info.device_type, Some("desktop"));
        assert_eq!(info.browser, Some("Safari"));
        assert_eq!(info.os, Some("macOS"));
    }

    #[test]
    fn test_tablet_keyword() {
        let info = parse(Some("SomeTablet Browser"));
        assert_eq!(info.device_type, Some("tablet"));
    }

    #[test]
    fn test_unmatched_families_fall_back_to_other() {
        let info = parse(Some("curl/8.4.0"));
        assert_eq!(info.device_type, Some("desktop"));
        assert_eq!(info.browser, Some("Other"));
        assert_eq!(info.os, Some("Other"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let info = parse(Some("FIREFOX on WINDOWS"));
        assert_eq!(info.browser, Some("Firefox"));
        assert_eq!(info.os, Some("Windows"));
    }
}
