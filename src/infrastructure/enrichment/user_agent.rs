//! User-Agent classification using woothee.

use woothee::parser::Parser;

pub const UNKNOWN_BROWSER: &str = "Unknown";
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Browser label and device class derived from a User-Agent header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub browser: String,
    /// `"mobile"`, `"desktop"`, or `"unknown"` for an empty header.
    pub device_type: String,
}

/// Classifies a raw User-Agent string.
///
/// An empty header yields `"Unknown"` / `"unknown"`. A header woothee cannot
/// identify still counts as a desktop client with an unknown browser.
pub fn parse_user_agent(ua: &str) -> UserAgentInfo {
    let ua = ua.trim();
    if ua.is_empty() {
        return UserAgentInfo {
            browser: UNKNOWN_BROWSER.to_string(),
            device_type: UNKNOWN_DEVICE.to_string(),
        };
    }

    let parser = Parser::new();
    let Some(result) = parser.parse(ua) else {
        return UserAgentInfo {
            browser: UNKNOWN_BROWSER.to_string(),
            device_type: "desktop".to_string(),
        };
    };

    let browser = if result.name.is_empty() || result.name == "UNKNOWN" {
        UNKNOWN_BROWSER.to_string()
    } else {
        result.name.to_string()
    };

    let device_type = match result.category {
        "smartphone" | "mobilephone" => "mobile",
        _ => "desktop",
    };

    UserAgentInfo {
        browser,
        device_type: device_type.to_string(),
    }
}
