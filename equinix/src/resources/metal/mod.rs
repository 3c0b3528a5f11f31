//! Equinix Metal resources

pub mod resource_project;

pub use resource_project::ProjectResource;
