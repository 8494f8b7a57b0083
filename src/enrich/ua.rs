//! User-agent parsing via ordered substring matching
//!
//! The rule order is part of the compatibility contract with existing
//! records and must not be rearranged: Chrome is checked before Safari,
//! Firefox and Edge (Chrome UAs also contain "Safari"), and the OS rules
//! run Windows, macOS, Linux, Android, iOS with the first match winning.
//! Unmatched fields fall back to "Unknown" and the device defaults to
//! Desktop.

use crate::models::{BrowserInfo, DeviceClass, OsInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAgent {
    pub browser: BrowserInfo,
    pub os: OsInfo,
    pub device: DeviceClass,
}

pub fn parse_user_agent(ua: &str) -> ParsedAgent {
    ParsedAgent {
        browser: parse_browser(ua),
        os: parse_os(ua),
        device: parse_device(ua),
    }
}

fn parse_browser(ua: &str) -> BrowserInfo {
    let (name, version) = if ua.contains("Chrome") {
        ("Chrome", digits_after(ua, "Chrome/"))
    } else if ua.contains("Safari") {
        ("Safari", digits_after(ua, "Version/"))
    } else if ua.contains("Firefox") {
        ("Firefox", digits_after(ua, "Firefox/"))
    } else if ua.contains("Edge") {
        ("Edge", digits_after(ua, "Edge/"))
    } else {
        return BrowserInfo {
            name: "Unknown".to_string(),
            version: "Unknown".to_string(),
        };
    };

    BrowserInfo {
        name: name.to_string(),
        version: version.unwrap_or_else(|| "Unknown".to_string()),
    }
}

fn parse_os(ua: &str) -> OsInfo {
    let (name, version) = if ua.contains("Windows") {
        ("Windows", windows_version(ua))
    } else if ua.contains("Mac OS X") {
        ("macOS", mac_version(ua))
    } else if ua.contains("Linux") {
        ("Linux", None)
    } else if ua.contains("Android") {
        ("Android", digits_after(ua, "Android "))
    } else if ua.contains("iOS") {
        ("iOS", digits_after(ua, "OS "))
    } else {
        return OsInfo {
            name: "Unknown".to_string(),
            version: "Unknown".to_string(),
        };
    };

    OsInfo {
        name: name.to_string(),
        version: version.unwrap_or_else(|| "Unknown".to_string()),
    }
}

fn parse_device(ua: &str) -> DeviceClass {
    if ua.contains("Mobile") {
        DeviceClass::Mobile
    } else if ua.contains("Tablet") {
        DeviceClass::Tablet
    } else {
        DeviceClass::Desktop
    }
}

/// NT version substrings map to marketing names.
fn windows_version(ua: &str) -> Option<String> {
    if ua.contains("Windows NT 10.0") {
        Some("10".to_string())
    } else if ua.contains("Windows NT 6.3") {
        Some("8.1".to_string())
    } else if ua.contains("Windows NT 6.2") {
        Some("8".to_string())
    } else {
        None
    }
}

/// Extract "x.y" from "Mac OS X x_y" or "Mac OS X x.y", normalizing the
/// separator to a dot.
fn mac_version(ua: &str) -> Option<String> {
    let rest = &ua[ua.find("Mac OS X ")? + "Mac OS X ".len()..];
    let major: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if major.is_empty() {
        return None;
    }
    let rest = &rest[major.len()..];
    let mut chars = rest.chars();
    match chars.next() {
        Some('_') | Some('.') => {}
        _ => return None,
    }
    let minor: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    if minor.is_empty() {
        return None;
    }
    Some(format!("{}.{}", major, minor))
}

/// The first run of digits immediately following `token`.
fn digits_after(ua: &str, token: &str) -> Option<String> {
    let start = ua.find(token)? + token.len();
    let digits: String = ua[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}
