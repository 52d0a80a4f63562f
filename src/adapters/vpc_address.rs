//! VPC address adapter

use crate::api::{
    Address, AddressRequirements, CreateAddressRequest, ExternalIpv4Address,
    ExternalIpv4AddressSpec, UpdateAddressRequest,
};
use crate::fieldmask::FieldMask;
use crate::resources::{ExternalIpv4Spec, VpcAddressSpec, VpcAddressStatus};

fn expand_external_ipv4(spec: &ExternalIpv4Spec) -> ExternalIpv4AddressSpec {
    let requirements = AddressRequirements {
        ddos_protection_provider: spec.ddos_protection_provider.clone().unwrap_or_default(),
        outgoing_smtp_capability: spec.outgoing_smtp_capability.clone().unwrap_or_default(),
    };

    ExternalIpv4AddressSpec {
        address: String::new(),
        zone_id: spec.zone_id.clone().unwrap_or_default(),
        requirements: (requirements != AddressRequirements::default()).then_some(requirements),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn flatten_external_ipv4(address: &ExternalIpv4Address) -> ExternalIpv4Spec {
    let requirements = address.requirements.clone().unwrap_or_default();
    ExternalIpv4Spec {
        zone_id: non_empty(&address.zone_id),
        ddos_protection_provider: non_empty(&requirements.ddos_protection_provider),
        outgoing_smtp_capability: non_empty(&requirements.outgoing_smtp_capability),
    }
}

/// Build the create request for an address in `folder_id`
pub fn build_create_address_request(spec: &VpcAddressSpec, folder_id: &str) -> CreateAddressRequest {
    CreateAddressRequest {
        folder_id: folder_id.to_string(),
        name: spec.name.clone(),
        description: spec.description.clone(),
        labels: spec.labels.clone(),
        external_ipv4_address_spec: spec.external_ipv4_address.as_ref().map(expand_external_ipv4),
    }
}

pub fn build_update_address_request(
    address_id: &str,
    spec: &VpcAddressSpec,
    mask: FieldMask,
) -> UpdateAddressRequest {
    UpdateAddressRequest {
        address_id: address_id.to_string(),
        update_mask: mask,
        name: spec.name.clone(),
        description: spec.description.clone(),
        labels: spec.labels.clone(),
    }
}

/// Declared spec and computed status of a remote address. The declared
/// folder is carried over from `prior`.
pub fn flatten_address(address: &Address, prior: &VpcAddressSpec) -> (VpcAddressSpec, VpcAddressStatus) {
    let spec = VpcAddressSpec {
        name: address.name.clone(),
        description: address.description.clone(),
        labels: address.labels.clone(),
        folder_id: prior.folder_id.clone(),
        external_ipv4_address: address.external_ipv4_address.as_ref().map(flatten_external_ipv4),
    };

    let status = VpcAddressStatus {
        folder_id: address.folder_id.clone(),
        created_at: address.created_at,
        address: address
            .external_ipv4_address
            .as_ref()
            .map(|ip| ip.address.clone())
            .unwrap_or_default(),
        reserved: address.reserved,
        used: address.used,
    };

    (spec, status)
}
