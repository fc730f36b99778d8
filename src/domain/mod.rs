//! Shared domain types: observations, vendor lookup, security ratings and
//! threat alerts.

pub mod alert;
pub mod observation;
pub mod security;
pub mod vendor;

pub use alert::{SpoofAlert, SpoofPattern, ThreatLevel};
pub use observation::{
    dbm_to_percent, oui_prefix, percent_to_dbm, Band, Observation, SignalQuality,
};
pub use security::{is_open, is_weak, security_strength, SecurityRating};
pub use vendor::{
    is_locally_administered, NullVendorLookup, StaticOuiTable, VendorCategory, VendorInfo,
    VendorLookup,
};
