//! Query parameters carried on redirect URLs.

use serde::Deserialize;

/// UTM attribution from the redirect query string. Other parameters are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}
