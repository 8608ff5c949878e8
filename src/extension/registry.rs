//! Registry of UI extensions contributed by plugin archives.

use std::collections::HashMap;

use dashmap::DashMap;
use thiserror::Error;

/// The category of UI an archive provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiExtensionType {
    ContentViewer,
    ProcessorConfiguration,
    ControllerServiceConfiguration,
    ReportingTaskConfiguration,
}

impl std::fmt::Display for UiExtensionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UiExtensionType::ContentViewer => "content-viewer",
            UiExtensionType::ProcessorConfiguration => "processor-configuration",
            UiExtensionType::ControllerServiceConfiguration => "controller-service-configuration",
            UiExtensionType::ReportingTaskConfiguration => "reporting-task-configuration",
        };
        f.write_str(name)
    }
}

/// A single UI extension: the kind of UI and the context path serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiExtension {
    pub extension_type: UiExtensionType,
    pub context_path: String,
}

/// A second registration of the same extension kind for a coordinate.
#[derive(Debug, Clone, Error)]
#[error("Encountered duplicate {kind} UI for {coordinate}")]
pub struct ConflictError {
    pub coordinate: String,
    pub kind: UiExtensionType,
}

/// Mapping from component-type coordinates to the UI extensions that
/// configure them, from content types to viewer context paths, and from
/// context paths to the coordinates they serve.
///
/// All maps grow monotonically across load waves.
#[derive(Debug, Default)]
pub struct UiExtensionRegistry {
    by_coordinate: DashMap<String, Vec<UiExtension>>,
    mime_mappings: DashMap<String, String>,
    by_context_path: DashMap<String, Vec<String>>,
}

impl UiExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component-configuration UI for each coordinate. Fails with
    /// a conflict when a coordinate already has an extension of this kind;
    /// coordinates registered before the conflicting one stay registered.
    pub fn register_component_ui(
        &self,
        kind: UiExtensionType,
        context_path: &str,
        coordinates: &[String],
    ) -> Result<(), ConflictError> {
        for coordinate in coordinates {
            {
                let mut extensions = self.by_coordinate.entry(coordinate.clone()).or_default();
                if extensions.iter().any(|e| e.extension_type == kind) {
                    return Err(ConflictError {
                        coordinate: coordinate.clone(),
                        kind,
                    });
                }
                extensions.push(UiExtension {
                    extension_type: kind,
                    context_path: context_path.to_string(),
                });
            }

            self.by_context_path
                .entry(context_path.to_string())
                .or_default()
                .push(coordinate.clone());

            tracing::info!(
                kind = %kind,
                context_path = %context_path,
                coordinate = %coordinate,
                "Loading UI extension"
            );
        }
        Ok(())
    }

    /// Record content-type → viewer mappings. Additive: the first
    /// registration of a content type wins and later ones are logged.
    pub fn register_content_viewer(&self, context_path: &str, content_types: &[String]) {
        for content_type in content_types {
            match self.mime_mappings.entry(content_type.clone()) {
                dashmap::mapref::entry::Entry::Occupied(existing) => {
                    tracing::warn!(
                        content_type = %content_type,
                        existing = %existing.get(),
                        rejected = %context_path,
                        "Content type already has a viewer; keeping the first registration"
                    );
                }
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    tracing::info!(
                        content_type = %content_type,
                        context_path = %context_path,
                        "Registered content viewer"
                    );
                    slot.insert(context_path.to_string());
                }
            }
        }
    }

    /// UI extensions registered for a coordinate, in registration order.
    pub fn extensions_for(&self, coordinate: &str) -> Option<Vec<UiExtension>> {
        self.by_coordinate.get(coordinate).map(|e| e.clone())
    }

    /// Context path of the viewer registered for a content type.
    pub fn viewer_for_content_type(&self, content_type: &str) -> Option<String> {
        self.mime_mappings.get(content_type).map(|p| p.clone())
    }

    /// Snapshot of the full content-type → context-path mapping.
    pub fn mime_mappings(&self) -> HashMap<String, String> {
        self.mime_mappings
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Snapshot of the context-path → coordinates mapping.
    pub fn extension_mapping(&self) -> HashMap<String, Vec<String>> {
        self.by_context_path
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn coordinate_count(&self) -> usize {
        self.by_coordinate.len()
    }
}
