//! Vendor lookup seam.
//!
//! Vendor identification is an injected, read-only service. The engine only
//! depends on the [`VendorLookup`] trait; callers may supply the built-in
//! [`StaticOuiTable`], the neutral [`NullVendorLookup`], or their own
//! implementation backed by a full OUI database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::observation::oui_prefix;

/// Device manufacturer category inferred from the OUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorCategory {
    /// Consumer router/AP vendors.
    Consumer,
    /// Enterprise infrastructure vendors.
    Enterprise,
    /// IoT device vendors.
    Iot,
    /// Mesh system vendors.
    Mesh,
    /// Phone vendors (tethering hotspots).
    Mobile,
    /// ISP-supplied gateway vendors.
    Isp,
    /// Not in the table.
    Unknown,
}

/// Result of a vendor lookup for one MAC address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorInfo {
    /// Vendor name, or "Unknown".
    pub name: String,
    /// The OUI prefix that matched (uppercase).
    pub prefix: String,
    /// Lookup confidence, 0-100.
    pub confidence: f64,
    /// Whether the prefix was found in the table.
    pub is_known: bool,
    /// Whether the MAC has the locally-administered bit set (randomized).
    pub is_locally_administered: bool,
    /// Manufacturer category.
    pub category: VendorCategory,
}

impl VendorInfo {
    /// A neutral "nothing known" result for the given MAC.
    pub fn unknown(mac: &str) -> Self {
        Self {
            name: "Unknown".to_string(),
            prefix: oui_prefix(mac),
            confidence: 0.0,
            is_known: false,
            is_locally_administered: is_locally_administered(mac),
            category: VendorCategory::Unknown,
        }
    }

    /// Additive spoof-risk adjustment based on vendor evidence, capped at 50.
    pub fn spoof_risk_adjustment(&self, claimed_vendor: &str, is_hidden: bool, rssi: f64) -> f64 {
        let mut adj: f64 = 0.0;
        if !self.is_known && is_hidden && rssi > -50.0 {
            adj += 25.0;
        }
        if !claimed_vendor.is_empty() && self.is_known {
            let claimed = claimed_vendor.to_ascii_lowercase();
            if !self.name.to_ascii_lowercase().contains(&claimed)
                && !claimed.contains(&self.name.to_ascii_lowercase())
            {
                adj += 15.0;
            }
        }
        if self.is_locally_administered && is_hidden {
            adj += 20.0;
        }
        if !self.is_known && rssi > -40.0 {
            adj += 10.0;
        }
        adj.min(50.0)
    }

    /// Additive rogue-risk adjustment based on vendor evidence, capped at 50.
    pub fn rogue_risk_adjustment(&self, is_hidden: bool, rssi: f64, channel: u16) -> f64 {
        const BACKHAUL: [u16; 8] = [36, 40, 44, 48, 149, 153, 157, 161];
        let mut adj: f64 = 0.0;
        if !self.is_known && is_hidden && rssi > -50.0 {
            adj += 30.0;
        }
        if self.is_locally_administered {
            adj += 15.0;
        }
        if !self.is_known && BACKHAUL.contains(&channel) {
            adj += 10.0;
        }
        adj.min(50.0)
    }
}

/// Whether a MAC has the locally-administered bit (0x02) set in its first
/// octet, which on infrastructure usually indicates a randomized address.
pub fn is_locally_administered(mac: &str) -> bool {
    mac.split([':', '-'])
        .next()
        .and_then(|octet| u8::from_str_radix(octet, 16).ok())
        .map(|b| b & 0x02 != 0)
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// VendorLookup -- injected service trait
// ---------------------------------------------------------------------------

/// Read-only vendor identification service.
pub trait VendorLookup: Send + Sync {
    /// Look up vendor information for a MAC address or BSSID.
    fn lookup(&self, mac: &str) -> VendorInfo;
}

/// Neutral implementation: every MAC resolves to an unknown vendor.
///
/// Locally-administered detection still works since it needs no table.
#[derive(Debug, Default, Clone)]
pub struct NullVendorLookup;

impl VendorLookup for NullVendorLookup {
    fn lookup(&self, mac: &str) -> VendorInfo {
        VendorInfo::unknown(mac)
    }
}

// ---------------------------------------------------------------------------
// StaticOuiTable
// ---------------------------------------------------------------------------

/// Built-in OUI table with a curated set of common infrastructure prefixes.
///
/// The table is assembled category by category in a fixed order (consumer,
/// mesh, enterprise, iot, mobile, isp); when a prefix appears in more than
/// one category the later category wins. This makes duplicate-prefix
/// resolution deterministic.
#[derive(Debug, Clone)]
pub struct StaticOuiTable {
    entries: HashMap<&'static str, (&'static str, VendorCategory)>,
}

const CONSUMER_OUIS: &[(&str, &str)] = &[
    ("00:14:BF", "Linksys"),
    ("00:1A:70", "Linksys"),
    ("48:F8:B3", "Linksys"),
    ("00:1B:2F", "Netgear"),
    ("00:26:F2", "Netgear"),
    ("9C:3D:CF", "Netgear"),
    ("A0:40:A0", "Netgear"),
    ("00:1D:7E", "TP-Link"),
    ("50:C7:BF", "TP-Link"),
    ("A4:2B:B0", "TP-Link"),
    ("EC:08:6B", "TP-Link"),
    ("00:1F:C6", "ASUS"),
    ("2C:56:DC", "ASUS"),
    ("AC:9E:17", "ASUS"),
    ("00:05:5D", "D-Link"),
    ("14:D6:4D", "D-Link"),
    ("C8:BE:19", "D-Link"),
];

const MESH_OUIS: &[(&str, &str)] = &[
    ("E4:F0:42", "eero"),
    ("F8:BB:BF", "eero"),
    ("60:B7:6E", "eero"),
    ("A4:11:6B", "Google Nest"),
    ("F4:F5:E8", "Google Nest"),
    ("1C:F2:9A", "Google Nest"),
    ("9C:3D:CF", "Netgear Orbi"),
    ("C0:3F:0E", "Netgear Orbi"),
    ("60:32:B1", "TP-Link Deco"),
    ("B0:95:75", "TP-Link Deco"),
    ("24:F5:A2", "Linksys Velop"),
    ("C4:41:1E", "Linksys Velop"),
];

const ENTERPRISE_OUIS: &[(&str, &str)] = &[
    ("00:18:0A", "Cisco Meraki"),
    ("88:15:44", "Cisco Meraki"),
    ("E0:55:3D", "Cisco Meraki"),
    ("00:0B:86", "Aruba"),
    ("24:DE:C6", "Aruba"),
    ("D8:C7:C8", "Aruba"),
    ("00:24:6C", "Aruba"),
    ("2C:C8:1B", "Ruckus"),
    ("58:93:96", "Ruckus"),
    ("F0:9F:C2", "Ubiquiti"),
    ("74:AC:B9", "Ubiquiti"),
    ("FC:EC:DA", "Ubiquiti"),
    ("18:E8:29", "Ubiquiti"),
];

const IOT_OUIS: &[(&str, &str)] = &[
    ("B4:E6:2D", "Ring"),
    ("64:9A:63", "Ring"),
    ("24:0A:C4", "Espressif"),
    ("30:AE:A4", "Espressif"),
    ("84:CC:A8", "Espressif"),
    ("2C:AA:8E", "Wyze"),
    ("7C:78:B2", "Wyze"),
    ("68:C6:3A", "Tuya"),
    ("50:8A:06", "Tuya"),
];

const MOBILE_OUIS: &[(&str, &str)] = &[
    ("14:F4:2A", "Samsung Mobile"),
    ("50:A4:C8", "Samsung Mobile"),
    ("E4:58:B8", "Samsung Mobile"),
    ("3C:06:30", "Apple"),
    ("A8:5C:2C", "Apple"),
    ("F0:18:98", "Apple"),
    ("C0:EE:FB", "OnePlus"),
    ("64:09:80", "Xiaomi"),
    ("AC:C1:EE", "Xiaomi"),
];

const ISP_OUIS: &[(&str, &str)] = &[
    ("00:1D:CE", "Arris"),
    ("90:B1:34", "Arris"),
    ("E8:65:D4", "Arris"),
    ("28:C6:8E", "Technicolor"),
    ("A0:1B:29", "Technicolor"),
    ("18:A6:F7", "Sagemcom"),
    ("7C:03:4C", "Sagemcom"),
    ("34:4B:50", "ZTE"),
    ("AC:64:17", "ZTE"),
];

impl StaticOuiTable {
    /// Build the combined table. Later categories overwrite earlier ones.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        let groups: [(&[(&str, &str)], VendorCategory); 6] = [
            (CONSUMER_OUIS, VendorCategory::Consumer),
            (MESH_OUIS, VendorCategory::Mesh),
            (ENTERPRISE_OUIS, VendorCategory::Enterprise),
            (IOT_OUIS, VendorCategory::Iot),
            (MOBILE_OUIS, VendorCategory::Mobile),
            (ISP_OUIS, VendorCategory::Isp),
        ];
        for (table, category) in groups {
            for (prefix, name) in table {
                entries.insert(*prefix, (*name, category));
            }
        }
        Self { entries }
    }

    /// Number of distinct prefixes in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticOuiTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorLookup for StaticOuiTable {
    fn lookup(&self, mac: &str) -> VendorInfo {
        if mac.is_empty() {
            return VendorInfo::unknown(mac);
        }
        let prefix = oui_prefix(mac);
        let randomized = is_locally_administered(mac);
        match self.entries.get(prefix.as_str()) {
            Some((name, category)) => VendorInfo {
                name: (*name).to_string(),
                prefix,
                confidence: if randomized { 30.0 } else { 100.0 },
                is_known: true,
                is_locally_administered: randomized,
                category: *category,
            },
            None => VendorInfo {
                name: "Unknown".to_string(),
                prefix,
                confidence: 0.0,
                is_known: false,
                is_locally_administered: randomized,
                category: VendorCategory::Unknown,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_prefix_resolves() {
        let table = StaticOuiTable::new();
        let info = table.lookup("E4:F0:42:11:22:33");
        assert!(info.is_known);
        assert_eq!(info.name, "eero");
        assert_eq!(info.category, VendorCategory::Mesh);
        assert_eq!(info.confidence, 100.0);
    }

    #[test]
    fn duplicate_prefix_last_category_wins() {
        // 9C:3D:CF is listed under both consumer (Netgear) and mesh (Orbi);
        // mesh is built after consumer so it wins.
        let table = StaticOuiTable::new();
        let info = table.lookup("9C:3D:CF:00:00:01");
        assert_eq!(info.category, VendorCategory::Mesh);
        assert_eq!(info.name, "Netgear Orbi");
    }

    #[test]
    fn unknown_prefix_degrades() {
        let table = StaticOuiTable::new();
        let info = table.lookup("DE:AD:BE:EF:00:01");
        assert!(!info.is_known);
        assert_eq!(info.category, VendorCategory::Unknown);
        assert_eq!(info.confidence, 0.0);
    }

    #[test]
    fn locally_administered_bit() {
        assert!(is_locally_administered("02:00:00:00:00:01"));
        assert!(is_locally_administered("A6:11:22:33:44:55"));
        assert!(!is_locally_administered("00:18:0A:11:22:33"));
    }

    #[test]
    fn randomized_known_prefix_has_low_confidence() {
        let table = StaticOuiTable::new();
        // 24:DE:C6 is Aruba but 0x24 has no LA bit; use a crafted LA variant
        let info = table.lookup("26:DE:C6:00:00:01");
        assert!(info.is_locally_administered);
        assert!(!info.is_known);
    }

    #[test]
    fn spoof_adjustment_caps_at_fifty() {
        let info = VendorInfo::unknown("A6:00:00:00:00:01");
        let adj = info.spoof_risk_adjustment("Cisco", true, -35.0);
        assert!(adj <= 50.0);
        assert!(adj > 0.0);
    }

    #[test]
    fn rogue_adjustment_for_backhaul_unknown() {
        let info = VendorInfo::unknown("DE:AD:BE:EF:00:01");
        let adj = info.rogue_risk_adjustment(true, -45.0, 149);
        assert!(adj >= 40.0);
        assert!(adj <= 50.0);
    }

    #[test]
    fn null_lookup_is_neutral() {
        let null = NullVendorLookup;
        let info = null.lookup("00:18:0A:11:22:33");
        assert!(!info.is_known);
        assert_eq!(info.name, "Unknown");
    }
}
