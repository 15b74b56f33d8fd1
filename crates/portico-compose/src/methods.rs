//! # Method Integration
//!
//! Second composition stage: one method per declared operation, attached to
//! the leaf resource with API-key enforcement on every one. The handler
//! mapping is resolved in full before anything is created, so a missing
//! mapping fails with the operation's name and zero methods provisioned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use portico_core::config::ServiceSpec;
use portico_core::error::{ComposeError, ConfigurationError};
use portico_core::gateway::MethodOptions;
use portico_core::identifier::{HandlerRef, OperationName};
use portico_plan::backend::ProvisioningBackend;
use portico_plan::handle::{MethodHandle, ResourceHandle};

/// Operation-name to handler-address mapping.
///
/// Sorted by operation name, so iteration (and anything derived from it)
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerMap(BTreeMap<OperationName, HandlerRef>);

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        operation: OperationName,
        handler: HandlerRef,
    ) -> Option<HandlerRef> {
        self.0.insert(operation, handler)
    }

    pub fn get(&self, operation: &OperationName) -> Option<&HandlerRef> {
        self.0.get(operation)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OperationName, &HandlerRef)> {
        self.0.iter()
    }
}

impl FromIterator<(OperationName, HandlerRef)> for HandlerMap {
    fn from_iter<I: IntoIterator<Item = (OperationName, HandlerRef)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Attach every declared operation to the leaf resource.
///
/// # Errors
///
/// [`ConfigurationError::MissingHandler`] for the first declared operation
/// without a mapping. The mapping is checked before any method is created.
pub fn integrate_methods(
    backend: &mut dyn ProvisioningBackend,
    resource: &ResourceHandle,
    spec: &ServiceSpec,
    handlers: &HandlerMap,
) -> Result<Vec<MethodHandle>, ComposeError> {
    let mut resolved = Vec::with_capacity(spec.operations.len());
    for op in &spec.operations {
        match handlers.get(&op.name) {
            Some(handler) => resolved.push((op, handler)),
            None => {
                return Err(ConfigurationError::MissingHandler {
                    operation: op.name.clone(),
                }
                .into())
            }
        }
    }

    let mut methods = Vec::with_capacity(resolved.len());
    for (op, handler) in resolved {
        let method = backend.create_method(
            resource,
            op.verb,
            &op.name,
            handler,
            MethodOptions::credential_required(),
        )?;
        tracing::debug!(operation = %op.name, verb = %op.verb, handler = %handler, "integrated method");
        methods.push(method);
    }
    tracing::info!(count = methods.len(), path = %resource.path, "integrated methods");
    Ok(methods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_plan::memory::PlanBackend;
    use portico_plan::node::NodeRecord;

    use crate::tree::compose_resource_tree;

    // ---- fixtures ----

    fn standard_handlers() -> HandlerMap {
        let mut handlers = HandlerMap::new();
        handlers.insert(
            OperationName::new("listSomeResources").unwrap(),
            HandlerRef::new("handler://some-service/list-some-resources").unwrap(),
        );
        handlers
    }

    // ---- integration ----

    #[test]
    fn every_operation_becomes_a_key_required_method() {
        let mut backend = PlanBackend::new();
        let spec = ServiceSpec::standard();
        let tree = compose_resource_tree(&mut backend, &spec).unwrap();
        let methods =
            integrate_methods(&mut backend, &tree.resource, &spec, &standard_handlers()).unwrap();

        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].operation.as_str(), "listSomeResources");
        match &backend.node(methods[0].node).unwrap().record {
            NodeRecord::Method { options, .. } => assert!(options.api_key_required),
            other => panic!("expected method record, got {other:?}"),
        }
    }

    #[test]
    fn method_handles_carry_their_integration() {
        let mut backend = PlanBackend::new();
        let spec = ServiceSpec::standard();
        let tree = compose_resource_tree(&mut backend, &spec).unwrap();
        let methods =
            integrate_methods(&mut backend, &tree.resource, &spec, &standard_handlers()).unwrap();
        assert_eq!(
            methods[0].integration.address(),
            "handler://some-service/list-some-resources"
        );
    }

    #[test]
    fn missing_handler_fails_before_creating_anything() {
        let mut backend = PlanBackend::new();
        let spec = ServiceSpec::standard();
        let tree = compose_resource_tree(&mut backend, &spec).unwrap();
        let before = backend.node_count();

        let err =
            integrate_methods(&mut backend, &tree.resource, &spec, &HandlerMap::new()).unwrap_err();
        match err {
            ComposeError::Configuration(ConfigurationError::MissingHandler { operation }) => {
                assert_eq!(operation.as_str(), "listSomeResources");
            }
            other => panic!("expected missing handler, got {other:?}"),
        }
        assert_eq!(backend.node_count(), before);
    }

    #[test]
    fn handler_map_round_trips_and_rejects_invalid_entries() {
        let handlers = standard_handlers();
        let json = serde_json::to_string(&handlers).unwrap();
        let back: HandlerMap = serde_json::from_str(&json).unwrap();
        assert_eq!(handlers, back);

        // Deserialization routes through the validating constructors.
        let bad = "{\"not a name!\": \"handler://x/y\"}";
        assert!(serde_json::from_str::<HandlerMap>(bad).is_err());
    }
}
