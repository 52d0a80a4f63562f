//! VPC address reconciler

use tracing::{debug, info, instrument, warn};

use crate::adapters::{build_create_address_request, build_update_address_request, flatten_address};
use crate::api::CreateAddressMetadata;
use crate::changes::{changed_paths, changed_spec_fields};
use crate::error::{Error, Result, ResultExt};
use crate::fieldmask::{build_mask, ADDRESS_UPDATE_FIELDS};
use crate::metrics;
use crate::operation::with_timeout;
use crate::resources::{ResourceKind, VpcAddressSpec};
use crate::state::{ReadOutcome, VpcAddressState};

use super::{folder_moved, instrumented, validate_name, Context};

const KIND: ResourceKind = ResourceKind::VpcAddress;

/// Declared fields whose change requires a new address
pub const FORCE_NEW_FIELDS: &[&str] = &[
    "external_ipv4_address.zone_id",
    "external_ipv4_address.ddos_protection_provider",
    "external_ipv4_address.outgoing_smtp_capability",
];

/// Validate the address spec
pub fn validate(spec: &VpcAddressSpec) -> Result<()> {
    if !spec.name.is_empty() {
        validate_name("address", &spec.name)?;
    }
    if let Some(ip) = &spec.external_ipv4_address {
        if ip.zone_id.as_deref() == Some("") {
            return Err(Error::validation(
                "external_ipv4_address.zone_id must not be empty when set",
            ));
        }
    }
    Ok(())
}

/// Fill fields the API computes when they are left out of `desired`
pub fn with_computed_defaults(desired: &VpcAddressSpec, applied: &VpcAddressSpec) -> VpcAddressSpec {
    let mut merged = desired.clone();
    if merged.name.is_empty() {
        merged.name = applied.name.clone();
    }
    if merged.external_ipv4_address.is_none() {
        merged.external_ipv4_address = applied.external_ipv4_address.clone();
    } else if let (Some(ip), Some(prior)) = (
        merged.external_ipv4_address.as_mut(),
        applied.external_ipv4_address.as_ref(),
    ) {
        if ip.zone_id.is_none() {
            ip.zone_id = prior.zone_id.clone();
        }
        if ip.ddos_protection_provider.is_none() {
            ip.ddos_protection_provider = prior.ddos_protection_provider.clone();
        }
        if ip.outgoing_smtp_capability.is_none() {
            ip.outgoing_smtp_capability = prior.outgoing_smtp_capability.clone();
        }
    }
    merged
}

/// Declared fields that differ from the applied state and cannot be
/// changed in place
pub fn requires_replacement(
    ctx: &Context,
    state: &VpcAddressState,
    desired: &VpcAddressSpec,
) -> Result<Vec<&'static str>> {
    let desired = with_computed_defaults(desired, &state.spec);
    let mut fields = changed_paths(FORCE_NEW_FIELDS, &state.spec, &desired)?;
    if folder_moved(&ctx.config, desired.folder_id.as_deref(), &state.status.folder_id) {
        fields.push("folder_id");
    }
    Ok(fields)
}

/// Create the address and return its refreshed state. `identity` receives
/// the address ID as soon as the API assigns it.
#[instrument(skip_all, fields(name = %spec.name))]
pub async fn create(
    ctx: &Context,
    spec: &VpcAddressSpec,
    identity: &mut Option<String>,
) -> Result<VpcAddressState> {
    instrumented(KIND, "create", async {
        validate(spec)?;
        let folder_id = ctx.config.resolve_folder_id(spec.folder_id.as_deref())?;
        let request = build_create_address_request(spec, &folder_id);

        let address_id = with_timeout("create", ctx.config.timeouts.vpc_address.create, async {
            info!(folder_id = %folder_id, "Creating VPC address");
            let op = ctx
                .addresses
                .create_address(&request)
                .await
                .with_context(|| format!("creating VPC address {}", spec.name))?;
            let metadata: CreateAddressMetadata = op
                .metadata_as()
                .with_context(|| format!("creating VPC address {}", spec.name))?;
            *identity = Some(metadata.address_id.clone());

            ctx.operations
                .wait(op)
                .await
                .with_context(|| format!("creating VPC address {}", metadata.address_id))?;
            Ok(metadata.address_id)
        })
        .await?;

        info!(address_id = %address_id, "VPC address created");
        let state = VpcAddressState::new(address_id.clone(), spec.clone());
        match fetch(ctx, &state).await? {
            ReadOutcome::Present(state) => Ok(state),
            ReadOutcome::Removed => Err(Error::NotFound(format!(
                "VPC address {} disappeared after creation",
                address_id
            ))),
        }
    })
    .await
}

/// Refresh the address state from the API
#[instrument(skip_all, fields(address_id = %state.id))]
pub async fn read(ctx: &Context, state: &VpcAddressState) -> Result<ReadOutcome<VpcAddressState>> {
    instrumented(KIND, "read", fetch(ctx, state)).await
}

async fn fetch(ctx: &Context, state: &VpcAddressState) -> Result<ReadOutcome<VpcAddressState>> {
    let id = state.id.as_str();
    with_timeout("read", ctx.config.timeouts.vpc_address.read, async {
        let address = match ctx.addresses.get_address(id).await {
            Ok(address) => address,
            Err(e) if e.is_not_found() => {
                warn!(address_id = %id, "VPC address not found, dropping it from state");
                metrics::RESOURCES_REMOVED
                    .with_label_values(&[KIND.as_str()])
                    .inc();
                return Ok(ReadOutcome::Removed);
            }
            Err(e) => return Err(e.context(format!("reading VPC address {}", id))),
        };

        let (spec, status) = flatten_address(&address, &state.spec);
        debug!(address_id = %id, address = %status.address, used = status.used, "Refreshed VPC address");

        Ok(ReadOutcome::Present(VpcAddressState {
            id: id.to_string(),
            spec,
            status,
            partial: state.partial.clone(),
            tainted: state.tainted,
        }))
    })
    .await
}

/// Converge the address to `desired`. Returns `false` without any remote
/// call when no updatable field changed.
#[instrument(skip_all, fields(address_id = %state.id))]
pub async fn update(ctx: &Context, state: &mut VpcAddressState, desired: &VpcAddressSpec) -> Result<bool> {
    instrumented(KIND, "update", async {
        validate(desired)?;

        let replaced = requires_replacement(ctx, state, desired)?;
        if !replaced.is_empty() {
            return Err(Error::validation(format!(
                "VPC address {}: changing {} requires replacing the address",
                state.id,
                replaced.join(", ")
            )));
        }

        let desired = with_computed_defaults(desired, &state.spec);
        let changed = changed_spec_fields(ADDRESS_UPDATE_FIELDS, &state.spec, &desired)?;
        if changed.is_empty() {
            debug!("No declared field changed");
            state.spec = desired;
            return Ok(false);
        }

        let id = state.id.clone();
        let mask = build_mask(ADDRESS_UPDATE_FIELDS, &changed, "");
        let request = build_update_address_request(&id, &desired, mask);

        with_timeout("update", ctx.config.timeouts.vpc_address.update, async {
            info!(update_mask = %request.update_mask, "Updating VPC address");
            let op = ctx.addresses.update_address(&request).await?;
            ctx.operations.wait(op).await?;
            Ok(())
        })
        .await
        .with_context(|| format!("updating VPC address {}", id))?;

        state.spec = desired.clone();
        state.partial.clear();
        match fetch(ctx, state).await? {
            ReadOutcome::Present(refreshed) => *state = refreshed,
            ReadOutcome::Removed => {
                return Err(Error::NotFound(format!(
                    "VPC address {} disappeared during update",
                    id
                )))
            }
        }
        Ok(true)
    })
    .await
}

/// Delete the address. An address that is already gone counts as deleted.
#[instrument(skip_all, fields(address_id = %state.id))]
pub async fn delete(ctx: &Context, state: &VpcAddressState) -> Result<()> {
    instrumented(KIND, "delete", async {
        let id = state.id.as_str();
        with_timeout("delete", ctx.config.timeouts.vpc_address.delete, async {
            info!(address_id = %id, "Deleting VPC address");
            let op = match ctx.addresses.delete_address(id).await {
                Ok(op) => op,
                Err(e) if e.is_not_found() => {
                    info!(address_id = %id, "VPC address already deleted");
                    return Ok(());
                }
                Err(e) => return Err(e.context(format!("deleting VPC address {}", id))),
            };
            ctx.operations
                .wait(op)
                .await
                .with_context(|| format!("deleting VPC address {}", id))?;
            Ok(())
        })
        .await
    })
    .await
}
