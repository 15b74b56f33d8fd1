//! # Resource Tree Composition
//!
//! First composition stage: the REST API root and the fixed two-level
//! resource path under it. Every later stage holds a handle produced here —
//! methods attach to the leaf resource, deployments snapshot the tree.

use portico_core::config::ServiceSpec;
use portico_core::error::ComposeError;
use portico_plan::backend::ProvisioningBackend;
use portico_plan::handle::{ResourceHandle, RestApiHandle};

/// Handles produced by tree composition.
#[derive(Debug, Clone)]
pub struct ResourceTree {
    pub api: RestApiHandle,
    /// The `/{service}` segment resource.
    pub service: ResourceHandle,
    /// The `/{service}/{resource}` leaf that methods attach to.
    pub resource: ResourceHandle,
}

/// Create the API root and its two-level resource path.
pub fn compose_resource_tree(
    backend: &mut dyn ProvisioningBackend,
    spec: &ServiceSpec,
) -> Result<ResourceTree, ComposeError> {
    let api = backend.create_rest_api(&spec.api_name)?;
    let service = backend.create_resource(api.root(), &spec.service_segment)?;
    let resource = backend.create_resource(service.node, &spec.resource_segment)?;
    tracing::info!(api = %api.name, path = %resource.path, "composed resource tree");
    Ok(ResourceTree {
        api,
        service,
        resource,
    })
}
