use serde::{Deserialize, Serialize};

/// Browser identity derived from the user-agent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserInfo {
    pub name: String,
    pub version: String,
}

/// Operating system identity derived from the user-agent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub version: String,
}

/// Device category derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Desktop => "Desktop",
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Tablet => "Tablet",
        }
    }
}

/// One persisted page view and its eventual dwell time.
///
/// `time_on_page` stays `None` until the close beacon arrives; a null dwell
/// must never be aggregated as zero. `last_updated` is set only by the dwell
/// patch. `page_id` is unique when present; an agent that never issued one
/// stores `None`, and such a record can never be patched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub user_id: String,
    pub session_id: String,
    pub page_id: Option<String>,
    /// Unix seconds, set server-side at creation.
    pub timestamp: i64,

    pub url: String,
    pub path: String,
    pub referrer: Option<String>,
    pub title: String,

    pub user_agent: String,
    pub browser: BrowserInfo,
    pub os: OsInfo,
    pub device: DeviceClass,

    pub screen_resolution: String,
    pub viewport_size: String,
    pub color_depth: i64,

    pub ip_address: Option<String>,
    pub country: Option<String>,

    pub page_load_time: Option<f64>,
    pub time_on_page: Option<i64>,
    pub last_updated: Option<i64>,

    pub language: String,
    pub timezone: String,
    pub is_dark_mode: bool,
}

/// Wire payload accepted by `POST /api/analytics`.
///
/// Deserialization is deliberately lenient: capture agents are best-effort
/// senders and a missing optional field must not fail the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestEvent {
    pub is_update: bool,
    pub page_id: Option<String>,
    pub time_on_page: Option<i64>,

    pub user_id: String,
    pub session_id: String,
    pub url: String,
    pub path: String,
    pub referrer: Option<String>,
    pub title: String,
    pub user_agent: Option<String>,
    pub screen_resolution: String,
    pub viewport_size: String,
    pub color_depth: i64,
    pub page_load_time: Option<f64>,
    pub language: String,
    pub timezone: String,
    pub is_dark_mode: bool,
}

/// Response body of the ingestion endpoint. Always delivered with HTTP 200,
/// including on internal failure - analytics faults never surface to the page.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl IngestResponse {
    pub fn created() -> Self {
        Self {
            success: true,
            action: Some("created".to_string()),
        }
    }

    pub fn updated() -> Self {
        Self {
            success: true,
            action: Some("updated".to_string()),
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            action: None,
        }
    }
}
