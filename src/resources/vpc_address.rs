//! Declared VPC address resource

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// VPC address specification
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct VpcAddressSpec {
    /// Address name; the API assigns one when empty
    #[serde(default)]
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Resource labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Folder to create the address in; defaults to the provider folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// External IPv4 address request (changing it replaces the address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ipv4_address: Option<ExternalIpv4Spec>,
}

/// External IPv4 address request
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ExternalIpv4Spec {
    /// Availability zone of the address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    /// DDoS protection provider, e.g. `qrator`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddos_protection_provider: Option<String>,

    /// Outgoing SMTP capability, e.g. `direct`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_smtp_capability: Option<String>,
}

/// Computed attributes of a VPC address
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct VpcAddressStatus {
    pub folder_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Allocated external IPv4 address
    #[serde(default)]
    pub address: String,
    pub reserved: bool,
    pub used: bool,
}
