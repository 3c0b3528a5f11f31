//! Equinix Metal v1 endpoints

pub mod projects;

pub use projects::{BgpConfig, BgpConfigRequest, Project, ProjectCreateRequest, ProjectUpdateRequest, ProjectsApi};

use crate::api::Client;

pub struct MetalApi<'a> {
    client: &'a Client,
}

impl<'a> MetalApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn projects(&self) -> ProjectsApi<'a> {
        ProjectsApi::new(self.client)
    }
}
