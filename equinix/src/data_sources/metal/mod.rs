//! Equinix Metal data sources

pub mod data_source_project;

pub use data_source_project::ProjectDataSource;
