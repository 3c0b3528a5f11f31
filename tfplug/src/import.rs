//! Import helpers

use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Writes the import ID into a single attribute of an otherwise empty
/// state, e.g. `terraform import equinix_metal_project.p <uuid>` sets `id`.
pub fn import_state_passthrough_id(
    attr_path: AttributePath,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    if attr_path.steps.is_empty() {
        response.diagnostics.push(Diagnostic::error(
            "Resource Import Passthrough Missing Attribute Path",
            "Resource ImportState path must be set to a valid attribute path.",
        ));
        return;
    }

    let mut state = DynamicValue::object();
    if let Err(e) = state.set_string(&attr_path, request.id.clone()) {
        response.diagnostics.push(
            Diagnostic::error("Failed to set import ID", e.to_string()).with_attribute(attr_path),
        );
        return;
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}
