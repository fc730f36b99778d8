//! Device fingerprinting from vendor, SSID, channel and security evidence.
//!
//! Classification is a pure function of one observation's fields; the only
//! state retained is a last-result cache keyed by MAC so consumers can read
//! back the most recent fingerprint without recomputing.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;

// ---------------------------------------------------------------------------
// DeviceCategory
// ---------------------------------------------------------------------------

/// Inferred device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceCategory {
    /// Home/office router or generic AP.
    Router,
    /// Mesh system node.
    MeshNode,
    /// Range extender/repeater.
    Extender,
    /// Enterprise infrastructure.
    Enterprise,
    /// Phone or portable hotspot.
    Hotspot,
    /// IoT device with an AP interface.
    Iot,
    /// Network printer.
    Printer,
    /// Camera or doorbell.
    Camera,
    /// Streaming/media device.
    MediaDevice,
    /// Game console.
    GamingDevice,
    /// Could not be classified.
    Unknown,
}

impl DeviceCategory {
    /// Display icon for presentation layers.
    pub fn icon(self) -> &'static str {
        match self {
            DeviceCategory::Router => "📡",
            DeviceCategory::MeshNode => "🕸",
            DeviceCategory::Extender => "📶",
            DeviceCategory::Enterprise => "🏢",
            DeviceCategory::Hotspot => "📱",
            DeviceCategory::Iot => "💡",
            DeviceCategory::Printer => "🖨",
            DeviceCategory::Camera => "📷",
            DeviceCategory::MediaDevice => "📺",
            DeviceCategory::GamingDevice => "🎮",
            DeviceCategory::Unknown => "❓",
        }
    }

    /// Short description.
    pub fn description(self) -> &'static str {
        match self {
            DeviceCategory::Router => "home or office router",
            DeviceCategory::MeshNode => "mesh system node",
            DeviceCategory::Extender => "range extender",
            DeviceCategory::Enterprise => "enterprise access point",
            DeviceCategory::Hotspot => "phone or portable hotspot",
            DeviceCategory::Iot => "IoT device",
            DeviceCategory::Printer => "network printer",
            DeviceCategory::Camera => "camera or doorbell",
            DeviceCategory::MediaDevice => "media or streaming device",
            DeviceCategory::GamingDevice => "game console",
            DeviceCategory::Unknown => "unclassified device",
        }
    }
}

/// Fingerprinting result for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Inferred category.
    pub category: DeviceCategory,
    /// Classification confidence, 0-99.
    pub confidence: f64,
    /// Display icon.
    pub icon: String,
    /// Short description.
    pub description: String,
    /// Descriptive tags (band, channel class, security class, proximity).
    pub tags: Vec<String>,
    /// Which heuristics contributed.
    pub evidence: Vec<String>,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            category: DeviceCategory::Unknown,
            confidence: 0.0,
            icon: DeviceCategory::Unknown.icon().to_string(),
            description: DeviceCategory::Unknown.description().to_string(),
            tags: Vec::new(),
            evidence: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Static heuristic tables
// ---------------------------------------------------------------------------

const VENDOR_DEVICE_MAP: &[(&str, DeviceCategory, f64)] = &[
    ("cisco", DeviceCategory::Enterprise, 90.0),
    ("meraki", DeviceCategory::Enterprise, 90.0),
    ("aruba", DeviceCategory::Enterprise, 90.0),
    ("ruckus", DeviceCategory::Enterprise, 90.0),
    ("ubiquiti", DeviceCategory::Enterprise, 85.0),
    ("eero", DeviceCategory::MeshNode, 95.0),
    ("orbi", DeviceCategory::MeshNode, 95.0),
    ("velop", DeviceCategory::MeshNode, 95.0),
    ("google nest", DeviceCategory::MeshNode, 90.0),
    ("espressif", DeviceCategory::Iot, 90.0),
    ("tuya", DeviceCategory::Iot, 90.0),
    ("ring", DeviceCategory::Camera, 85.0),
    ("wyze", DeviceCategory::Camera, 85.0),
    ("hewlett", DeviceCategory::Printer, 85.0),
    ("epson", DeviceCategory::Printer, 85.0),
    ("brother", DeviceCategory::Printer, 85.0),
    ("roku", DeviceCategory::MediaDevice, 85.0),
    ("sonos", DeviceCategory::MediaDevice, 85.0),
    ("nintendo", DeviceCategory::GamingDevice, 85.0),
    ("sony interactive", DeviceCategory::GamingDevice, 85.0),
    ("samsung mobile", DeviceCategory::Hotspot, 80.0),
    ("oneplus", DeviceCategory::Hotspot, 80.0),
    ("xiaomi", DeviceCategory::Hotspot, 75.0),
    ("netgear", DeviceCategory::Router, 75.0),
    ("tp-link", DeviceCategory::Router, 75.0),
    ("linksys", DeviceCategory::Router, 75.0),
    ("asus", DeviceCategory::Router, 75.0),
    ("d-link", DeviceCategory::Router, 75.0),
    ("arris", DeviceCategory::Router, 70.0),
    ("technicolor", DeviceCategory::Router, 70.0),
    ("sagemcom", DeviceCategory::Router, 70.0),
];

const SSID_PATTERNS: &[(&str, DeviceCategory, f64, &str)] = &[
    (r"(?i)^DIRECT-.*HP", DeviceCategory::Printer, 92.0, "HP WiFi-Direct print SSID"),
    (r"(?i)^DIRECT-", DeviceCategory::MediaDevice, 70.0, "WiFi-Direct SSID"),
    (r"(?i)^HP-Print", DeviceCategory::Printer, 92.0, "HP print SSID"),
    (r"(?i)^EPSON", DeviceCategory::Printer, 88.0, "Epson print SSID"),
    (r"(?i)(iphone|ipad)", DeviceCategory::Hotspot, 90.0, "Apple hotspot SSID"),
    (r"(?i)(galaxy|android)", DeviceCategory::Hotspot, 85.0, "Android hotspot SSID"),
    (r"(?i)^(eero|orbi|deco|velop)", DeviceCategory::MeshNode, 90.0, "mesh-branded SSID"),
    (r"(?i)(_ext|-ext|_rpt|extender)$", DeviceCategory::Extender, 85.0, "extender-suffixed SSID"),
    (r"(?i)^(xfinitywifi|optimumwifi|spectrum|attwifi)", DeviceCategory::Hotspot, 80.0, "carrier hotspot SSID"),
    (r"(?i)^(ring|nest|wyze)", DeviceCategory::Camera, 80.0, "camera-branded SSID"),
    (r"(?i)^(chromecast|roku|firetv)", DeviceCategory::MediaDevice, 85.0, "streaming-device SSID"),
    (r"(?i)(corp|corporate|office|staff|employee)", DeviceCategory::Enterprise, 70.0, "corporate SSID keyword"),
];

const HOTSPOT_KEYWORDS: &[&str] = &["iphone", "android", "mobile", "hotspot", "mifi", "pocket"];

const ENTERPRISE_SSID_KEYWORDS: &[&str] =
    &["corp", "office", "staff", "employee", "internal", "secure"];

struct SsidRule {
    regex: Regex,
    category: DeviceCategory,
    confidence: f64,
    label: &'static str,
}

// ---------------------------------------------------------------------------
// DeviceFingerprinter
// ---------------------------------------------------------------------------

/// Heuristic device classifier.
#[derive(Debug)]
pub struct DeviceFingerprinter {
    ssid_rules: Vec<SsidRule>,
    cache: HashMap<String, Fingerprint>,
}

impl std::fmt::Debug for SsidRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsidRule")
            .field("pattern", &self.regex.as_str())
            .field("category", &self.category)
            .finish()
    }
}

impl DeviceFingerprinter {
    /// Create a fingerprinter, compiling the SSID pattern table.
    pub fn new() -> Result<Self> {
        let mut ssid_rules = Vec::with_capacity(SSID_PATTERNS.len());
        for (pattern, category, confidence, label) in SSID_PATTERNS {
            ssid_rules.push(SsidRule {
                regex: Regex::new(pattern)?,
                category: *category,
                confidence: *confidence,
                label,
            });
        }
        Ok(Self {
            ssid_rules,
            cache: HashMap::new(),
        })
    }

    /// Classify one device sighting.
    pub fn fingerprint(
        &mut self,
        mac: &str,
        ssid: &str,
        vendor: &str,
        channel: u16,
        signal_percent: f64,
        security: &str,
    ) -> Fingerprint {
        let mut category = DeviceCategory::Unknown;
        let mut confidence = 0.0;
        let mut evidence = Vec::new();

        // Vendor baseline
        let vendor_lc = vendor.to_ascii_lowercase();
        if !vendor_lc.is_empty() {
            for (keyword, cat, conf) in VENDOR_DEVICE_MAP {
                if vendor_lc.contains(keyword) {
                    category = *cat;
                    confidence = *conf;
                    evidence.push(format!("vendor match '{keyword}'"));
                    break;
                }
            }
        }

        // SSID patterns override when more confident, corroborate when close
        if !ssid.is_empty() {
            for rule in &self.ssid_rules {
                if rule.regex.is_match(ssid) {
                    if rule.confidence > confidence {
                        category = rule.category;
                        confidence = rule.confidence;
                        evidence.push(format!("ssid pattern: {}", rule.label));
                    } else if rule.category == category
                        && (confidence - rule.confidence).abs() <= 20.0
                    {
                        confidence = (confidence + 10.0).min(99.0);
                        evidence.push(format!("ssid corroboration: {}", rule.label));
                    }
                    break;
                }
            }
        }

        let mut tags = channel_tags(channel, signal_percent);
        tags.extend(security_tags(security));

        // Fallback heuristics when nothing matched
        if category == DeviceCategory::Unknown {
            let hint = format!("{} {}", vendor_lc, ssid.to_ascii_lowercase());
            if HOTSPOT_KEYWORDS.iter().any(|k| hint.contains(k)) {
                category = DeviceCategory::Hotspot;
                confidence = 60.0;
                evidence.push("hotspot keyword".to_string());
            } else if looks_enterprise(ssid, security, channel) {
                category = DeviceCategory::Enterprise;
                confidence = 50.0;
                evidence.push("enterprise heuristic".to_string());
            }
        }

        let result = Fingerprint {
            category,
            confidence,
            icon: category.icon().to_string(),
            description: category.description().to_string(),
            tags,
            evidence,
        };
        self.cache.insert(mac.to_string(), result.clone());
        result
    }

    /// Most recent fingerprint for a MAC, if any.
    pub fn last_result(&self, mac: &str) -> Option<&Fingerprint> {
        self.cache.get(mac)
    }

    /// Full reset of the read-back cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

fn channel_tags(channel: u16, signal_percent: f64) -> Vec<String> {
    let mut tags = Vec::new();
    match channel {
        1..=14 => {
            tags.push("2.4GHz".to_string());
            if matches!(channel, 1 | 6 | 11) {
                tags.push("common-channel".to_string());
            } else {
                tags.push("non-standard-channel".to_string());
            }
        }
        36..=64 => tags.push("5GHz-low".to_string()),
        100..=144 => {
            tags.push("5GHz-DFS".to_string());
            tags.push("likely-enterprise".to_string());
        }
        _ if channel > 14 => tags.push("5GHz-high".to_string()),
        _ => {}
    }
    if channel > 14 && signal_percent > 70.0 {
        tags.push("nearby".to_string());
    }
    tags
}

fn security_tags(security: &str) -> Vec<String> {
    let s = security.to_ascii_lowercase();
    let mut tags = Vec::new();
    if s.contains("wpa3") {
        tags.push("modern-security".to_string());
    }
    if s.contains("wep") {
        tags.push("legacy-security".to_string());
    }
    if crate::domain::security::is_open(&s) {
        tags.push("open-network".to_string());
    }
    tags
}

fn looks_enterprise(ssid: &str, security: &str, channel: u16) -> bool {
    let ssid_lc = ssid.to_ascii_lowercase();
    if ENTERPRISE_SSID_KEYWORDS.iter().any(|k| ssid_lc.contains(k)) {
        return true;
    }
    if security.to_ascii_lowercase().contains("802.1x") {
        return true;
    }
    // DFS channels are rarely used outside managed deployments
    (52..=144).contains(&channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp() -> DeviceFingerprinter {
        DeviceFingerprinter::new().unwrap()
    }

    #[test]
    fn vendor_sets_baseline() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:01", "HomeNet", "Cisco Systems", 36, 50.0, "WPA2");
        assert_eq!(result.category, DeviceCategory::Enterprise);
        assert_eq!(result.confidence, 90.0);
    }

    #[test]
    fn ssid_pattern_overrides_weaker_vendor() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:02", "John's iPhone", "Netgear", 11, 60.0, "WPA2");
        assert_eq!(result.category, DeviceCategory::Hotspot);
        assert_eq!(result.confidence, 90.0);
    }

    #[test]
    fn ssid_corroboration_boosts() {
        let mut f = fp();
        // eero vendor (95) + eero SSID pattern (90, within 20) => +10 capped
        let result = f.fingerprint("AA:00:00:00:00:03", "eero-living-room", "eero inc", 6, 50.0, "WPA2");
        assert_eq!(result.category, DeviceCategory::MeshNode);
        assert_eq!(result.confidence, 99.0);
    }

    #[test]
    fn dfs_channel_tags_enterprise() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:04", "Net", "", 116, 40.0, "WPA2");
        assert!(result.tags.iter().any(|t| t == "5GHz-DFS"));
        assert!(result.tags.iter().any(|t| t == "likely-enterprise"));
    }

    #[test]
    fn strong_five_ghz_is_nearby() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:05", "Net", "", 149, 85.0, "WPA2");
        assert!(result.tags.iter().any(|t| t == "nearby"));
    }

    #[test]
    fn open_network_tagged() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:06", "Cafe", "", 6, 50.0, "Open");
        assert!(result.tags.iter().any(|t| t == "open-network"));
    }

    #[test]
    fn hotspot_fallback() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:07", "my mobile hotspot", "", 6, 50.0, "WPA2");
        assert_eq!(result.category, DeviceCategory::Hotspot);
        assert_eq!(result.confidence, 60.0);
    }

    #[test]
    fn enterprise_fallback_via_dot1x() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:08", "Net", "", 6, 50.0, "WPA2 802.1X");
        assert_eq!(result.category, DeviceCategory::Enterprise);
        assert_eq!(result.confidence, 50.0);
    }

    #[test]
    fn unknown_degrades_cleanly() {
        let mut f = fp();
        let result = f.fingerprint("AA:00:00:00:00:09", "RandomNet", "", 6, 50.0, "WPA2");
        assert_eq!(result.category, DeviceCategory::Unknown);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn cache_read_back() {
        let mut f = fp();
        f.fingerprint("AA:00:00:00:00:0A", "eero-den", "eero inc", 6, 50.0, "WPA2");
        let cached = f.last_result("AA:00:00:00:00:0A").unwrap();
        assert_eq!(cached.category, DeviceCategory::MeshNode);
        assert!(f.last_result("FF:00:00:00:00:00").is_none());
    }
}
