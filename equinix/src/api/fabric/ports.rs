//! Fabric port API implementation

use serde::{Deserialize, Serialize};

use crate::api::client::{Client, Service};
use crate::api::common::{Changelog, PatchOperation};
use crate::api::error::ApiError;

pub const PORTS_PATH: &str = "/fabric/v4/ports";

/// Port as returned by the API; the same shape is posted on create with
/// the server-side fields left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Port {
    #[serde(skip_serializing)]
    pub href: Option<String>,
    #[serde(skip_serializing)]
    pub uuid: Option<String>,
    #[serde(skip_serializing)]
    pub state: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity_source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lag_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_ports_speed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_ports_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_ports_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demarcation_point_ibx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PortLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<PortSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encapsulation: Option<PortEncapsulation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<PortAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<PortProject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redundancy: Option<PortRedundancy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<PortDevice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub physical_ports: Vec<PhysicalPort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<PortOrder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<PortNotification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_info: Vec<PortAdditionalInfo>,
    #[serde(rename = "changelog", alias = "changeLog", skip_serializing)]
    pub change_log: Option<Changelog>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metro_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_port_type: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortEncapsulation {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub encapsulation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_protocol_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ucm_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortRedundancy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortDevice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redundancy: Option<PortDeviceRedundancy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortDeviceRedundancy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicalPort {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<PortInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demarcation_point: Option<PortDemarcationPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortInterface {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortDemarcationPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ibx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cage_unique_space_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabinet_unique_space_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order: Option<PurchaseOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<OrderSignature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderSignature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<SignatureDelegate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatureDelegate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortNotification {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    pub registered_users: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortAdditionalInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Ports API for port operations
pub struct PortsApi<'a> {
    client: &'a Client,
}

impl<'a> PortsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /fabric/v4/ports
    pub async fn create(&self, request: &Port) -> Result<Port, ApiError> {
        self.client.post(Service::Fabric, PORTS_PATH, request).await
    }

    /// GET /fabric/v4/ports/{portId}
    pub async fn get(&self, id: &str) -> Result<Port, ApiError> {
        self.client
            .get(Service::Fabric, &format!("{}/{}", PORTS_PATH, id))
            .await
    }

    /// PATCH /fabric/v4/ports/{portId}
    pub async fn update(&self, id: &str, operations: &[PatchOperation]) -> Result<Port, ApiError> {
        self.client
            .patch(Service::Fabric, &format!("{}/{}", PORTS_PATH, id), &operations)
            .await
    }

    /// DELETE /fabric/v4/ports/{portId}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(Service::Fabric, &format!("{}/{}", PORTS_PATH, id))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "./ports_test.rs"]
mod ports_test;
