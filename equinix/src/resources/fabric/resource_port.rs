//! Fabric port resource implementation
//!
//! Ports are ordered asynchronously: the create call returns a port in
//! `PENDING` and the reservation completes later. The resource waits until
//! the port leaves `PENDING`; if the port never becomes readable the order
//! is still kept in state with a warning.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tfplug::context::Context;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::retry::{StateChangeConf, WaitError};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::timeouts::{timeouts_attribute, TimeoutOpts, Timeouts};
use tfplug::typed::{
    BoolValue, Int32Value, Int64Value, ListNestedObjectValueOf, ListValueOf, ObjectValueOf,
    StringValue, Value,
};
use tfplug::types::{Diagnostic, DynamicValue};

use super::{change_log_attribute, non_empty, ChangeLogModel, WaiterSettings};
use crate::api::common::PatchOperation;
use crate::api::fabric::ports::{
    OrderSignature, PhysicalPort, Port, PortAccount, PortAdditionalInfo, PortDemarcationPoint,
    PortDevice, PortDeviceRedundancy, PortEncapsulation, PortInterface, PortLocation,
    PortNotification, PortOrder, PortProject, PortRedundancy, PortSettings, PurchaseOrder,
    SignatureDelegate,
};
use crate::api::ApiError;
use crate::provider_data::{not_configured, EquinixProviderData};
use crate::resources::timeouts_of;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const STATE_PENDING: &str = "PENDING";
const DELETED_MARKER: &str = "tf-marker-for-deletion";

pub(crate) const CREATE_WAITER: WaiterSettings = WaiterSettings {
    pending: &[STATE_PENDING],
    target: &[
        "PROVISIONING",
        "PROVISIONED",
        "ADDED",
        "ACTIVE",
        "PENDING_CROSS_CONNECT",
    ],
    delay: Duration::from_secs(10),
    min_timeout: Duration::from_secs(5),
    not_found_checks: Some(6),
};

pub(crate) const DELETE_WAITER: WaiterSettings = WaiterSettings {
    pending: &["PROVISIONED", "ADDED", "ACTIVE"],
    target: &[DELETED_MARKER, "DELETED", "TO_BE_DELETED", "DEPROVISIONED"],
    delay: Duration::from_secs(10),
    min_timeout: Duration::from_secs(5),
    not_found_checks: None,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortResourceModel {
    pub id: StringValue,
    pub timeouts: ObjectValueOf<Timeouts>,
    pub r#type: StringValue,
    pub name: StringValue,
    pub connectivity_source_type: StringValue,
    pub location: ObjectValueOf<LocationModel>,
    pub settings: ObjectValueOf<SettingsModel>,
    pub encapsulation: ObjectValueOf<EncapsulationModel>,
    pub account: ObjectValueOf<AccountModel>,
    pub project: ObjectValueOf<ProjectModel>,
    pub redundancy: ObjectValueOf<RedundancyModel>,
    pub device: ObjectValueOf<DeviceModel>,
    pub lag_enabled: BoolValue,
    pub physical_ports: ListNestedObjectValueOf<PhysicalPortModel>,
    pub physical_ports_speed: Int32Value,
    pub physical_ports_type: StringValue,
    pub physical_ports_count: Int32Value,
    pub demarcation_point_ibx: StringValue,
    pub order: ObjectValueOf<OrderModel>,
    pub notifications: ListNestedObjectValueOf<NotificationModel>,
    pub additional_info: ListNestedObjectValueOf<AdditionalInfoModel>,
    pub change_log: ObjectValueOf<ChangeLogModel>,
    pub href: StringValue,
    pub uuid: StringValue,
    pub state: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationModel {
    pub metro_code: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsModel {
    pub package_type: StringValue,
    pub shared_port_type: BoolValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncapsulationModel {
    pub r#type: StringValue,
    pub tag_protocol_id: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountModel {
    pub account_number: Int64Value,
    pub account_name: StringValue,
    pub ucm_id: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectModel {
    pub project_id: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedundancyModel {
    pub priority: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceModel {
    pub name: StringValue,
    pub redundancy: ObjectValueOf<DeviceRedundancyModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRedundancyModel {
    pub priority: StringValue,
    pub group: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalPortModel {
    pub r#type: StringValue,
    pub interface: ObjectValueOf<InterfaceModel>,
    pub demarcation_point: ObjectValueOf<DemarcationPointModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceModel {
    pub r#type: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemarcationPointModel {
    pub ibx: StringValue,
    pub cage_unique_space_id: StringValue,
    pub cabinet_unique_space_id: StringValue,
    pub patch_panel: StringValue,
    pub connector_type: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderModel {
    pub purchase_order: ObjectValueOf<PurchaseOrderModel>,
    pub order_number: StringValue,
    pub order_id: StringValue,
    pub uuid: StringValue,
    pub customer_reference_id: StringValue,
    pub signature: ObjectValueOf<SignatureModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseOrderModel {
    pub number: StringValue,
    pub amount: StringValue,
    pub attachment_id: StringValue,
    pub r#type: StringValue,
    pub start_date: StringValue,
    pub end_date: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureModel {
    pub signatory: StringValue,
    pub delegate: ObjectValueOf<DelegateModel>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateModel {
    pub first_name: StringValue,
    pub last_name: StringValue,
    pub email: StringValue,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationModel {
    pub r#type: StringValue,
    pub registered_users: ListValueOf<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalInfoModel {
    pub key: StringValue,
    pub value: StringValue,
}

impl PortResourceModel {
    /// Copies the API view of the port into the model. Scalar attributes the
    /// API leaves empty keep their planned value.
    pub fn parse(&mut self, port: &Port) {
        self.id = port.uuid.clone().into();
        if let Some(port_type) = non_empty(&port.port_type) {
            self.r#type = Value::new(port_type);
        }
        if let Some(name) = non_empty(&port.name) {
            self.name = Value::new(name);
        }
        if let Some(source) = non_empty(&port.connectivity_source_type) {
            self.connectivity_source_type = Value::new(source);
        }
        self.lag_enabled = Value::new(port.lag_enabled.unwrap_or_default());
        if let Some(speed) = port.physical_ports_speed.filter(|s| *s > 0) {
            self.physical_ports_speed = Value::new(speed);
        }
        if let Some(ports_type) = non_empty(&port.physical_ports_type) {
            self.physical_ports_type = Value::new(ports_type);
        }
        if let Some(count) = port.physical_ports_count.filter(|c| *c > 0) {
            self.physical_ports_count = Value::new(count);
        }
        if let Some(ibx) = non_empty(&port.demarcation_point_ibx) {
            self.demarcation_point_ibx = Value::new(ibx);
        }
        self.href = port.href.clone().into();
        self.uuid = port.uuid.clone().into();
        self.state = port.state.clone().into();

        let location = port.location.clone().unwrap_or_default();
        self.location = ObjectValueOf::new(LocationModel {
            metro_code: location.metro_code.into(),
        });

        let settings = port.settings.clone().unwrap_or_default();
        self.settings = ObjectValueOf::new(SettingsModel {
            package_type: settings.package_type.into(),
            shared_port_type: Value::new(settings.shared_port_type.unwrap_or_default()),
        });

        if let Some(encapsulation) = &port.encapsulation {
            self.encapsulation = ObjectValueOf::new(EncapsulationModel {
                r#type: encapsulation.encapsulation_type.clone().into(),
                tag_protocol_id: encapsulation.tag_protocol_id.clone().into(),
            });
        }

        let account = port.account.clone().unwrap_or_default();
        self.account = ObjectValueOf::new(AccountModel {
            account_number: account.account_number.into(),
            account_name: account.account_name.into(),
            ucm_id: account.ucm_id.into(),
        });

        let project = port.project.clone().unwrap_or_default();
        self.project = ObjectValueOf::new(ProjectModel {
            project_id: project.project_id.into(),
        });

        let redundancy = port.redundancy.clone().unwrap_or_default();
        self.redundancy = ObjectValueOf::new(RedundancyModel {
            priority: redundancy.priority.into(),
        });

        if let Some(device) = &port.device {
            self.device = ObjectValueOf::new(DeviceModel {
                name: device.name.clone().into(),
                redundancy: ObjectValueOf::from_ptr(device.redundancy.as_ref().map(|r| {
                    DeviceRedundancyModel {
                        priority: r.priority.clone().into(),
                        group: non_empty(&r.group).into(),
                    }
                })),
            });
        }

        if !port.physical_ports.is_empty() {
            self.physical_ports = ListNestedObjectValueOf::from_slice(
                port.physical_ports.iter().map(parse_physical_port).collect(),
            );
        }

        self.order = ObjectValueOf::new(parse_order(&port.order.clone().unwrap_or_default()));

        if !port.notifications.is_empty() {
            self.notifications = ListNestedObjectValueOf::from_slice(
                port.notifications
                    .iter()
                    .map(|n| NotificationModel {
                        r#type: n.notification_type.clone().into(),
                        registered_users: ListValueOf::from_values(n.registered_users.clone()),
                    })
                    .collect(),
            );
        }

        if !port.additional_info.is_empty() {
            self.additional_info = ListNestedObjectValueOf::from_slice(
                port.additional_info
                    .iter()
                    .map(|info| AdditionalInfoModel {
                        key: info.key.clone().into(),
                        value: info.value.clone().into(),
                    })
                    .collect(),
            );
        }

        self.change_log = ObjectValueOf::new(
            port.change_log
                .as_ref()
                .map(ChangeLogModel::from)
                .unwrap_or_default(),
        );
    }
}

fn parse_physical_port(physical_port: &PhysicalPort) -> PhysicalPortModel {
    let demarcation = physical_port.demarcation_point.clone().unwrap_or_default();
    PhysicalPortModel {
        r#type: physical_port.port_type.clone().into(),
        interface: ObjectValueOf::from_ptr(
            physical_port
                .interface
                .as_ref()
                .map(|i| InterfaceModel {
                    r#type: non_empty(&i.interface_type).into(),
                }),
        ),
        demarcation_point: ObjectValueOf::new(DemarcationPointModel {
            ibx: demarcation.ibx.into(),
            cage_unique_space_id: demarcation.cage_unique_space_id.into(),
            cabinet_unique_space_id: demarcation.cabinet_unique_space_id.into(),
            patch_panel: demarcation.patch_panel.into(),
            connector_type: demarcation.connector_type.into(),
        }),
    }
}

fn parse_order(order: &PortOrder) -> OrderModel {
    let purchase_order = order.purchase_order.clone().unwrap_or_default();
    let signature = order.signature.clone().unwrap_or_default();
    let delegate = signature.delegate.unwrap_or_default();
    OrderModel {
        purchase_order: ObjectValueOf::new(PurchaseOrderModel {
            number: purchase_order.number.into(),
            amount: purchase_order.amount.into(),
            attachment_id: purchase_order.attachment_id.into(),
            r#type: purchase_order.order_type.into(),
            start_date: purchase_order.start_date.into(),
            end_date: purchase_order.end_date.into(),
        }),
        order_number: order.order_number.clone().into(),
        order_id: order.order_id.clone().into(),
        uuid: order.uuid.clone().into(),
        customer_reference_id: order.customer_reference_id.clone().into(),
        signature: ObjectValueOf::new(SignatureModel {
            signatory: signature.signatory.into(),
            delegate: ObjectValueOf::new(DelegateModel {
                first_name: delegate.first_name.into(),
                last_name: delegate.last_name.into(),
                email: delegate.email.into(),
            }),
        }),
    }
}

fn known(value: &StringValue) -> Option<String> {
    value.get().cloned()
}

/// Port order request built from the plan
pub fn build_create_request(plan: &PortResourceModel) -> Port {
    let mut request = Port {
        port_type: known(&plan.r#type),
        name: known(&plan.name),
        connectivity_source_type: known(&plan.connectivity_source_type),
        lag_enabled: Some(plan.lag_enabled.value_or_default()),
        physical_ports_speed: plan.physical_ports_speed.get().copied(),
        physical_ports_type: known(&plan.physical_ports_type),
        physical_ports_count: plan.physical_ports_count.get().copied(),
        demarcation_point_ibx: known(&plan.demarcation_point_ibx),
        ..Default::default()
    };

    if let Some(location) = plan.location.to_ptr() {
        request.location = Some(PortLocation {
            metro_code: known(&location.metro_code),
        });
    }
    if let Some(settings) = plan.settings.to_ptr() {
        request.settings = Some(PortSettings {
            package_type: known(&settings.package_type),
            shared_port_type: settings.shared_port_type.get().copied(),
        });
    }
    if let Some(encapsulation) = plan.encapsulation.to_ptr() {
        request.encapsulation = Some(PortEncapsulation {
            encapsulation_type: known(&encapsulation.r#type),
            tag_protocol_id: known(&encapsulation.tag_protocol_id),
        });
    }
    if let Some(account) = plan.account.to_ptr() {
        request.account = Some(PortAccount {
            account_number: account.account_number.get().copied(),
            account_name: known(&account.account_name),
            ucm_id: known(&account.ucm_id),
        });
    }
    if let Some(project) = plan.project.to_ptr() {
        request.project = Some(PortProject {
            project_id: known(&project.project_id),
        });
    }
    if let Some(redundancy) = plan.redundancy.to_ptr() {
        request.redundancy = Some(PortRedundancy {
            priority: known(&redundancy.priority),
        });
    }
    if let Some(device) = plan.device.to_ptr() {
        request.device = Some(PortDevice {
            name: known(&device.name),
            redundancy: device.redundancy.to_ptr().map(|r| PortDeviceRedundancy {
                priority: known(&r.priority),
                group: known(&r.group),
            }),
        });
    }

    request.physical_ports = plan
        .physical_ports
        .iter()
        .map(|p| PhysicalPort {
            port_type: known(&p.r#type),
            interface: p.interface.to_ptr().map(|i| PortInterface {
                interface_type: known(&i.r#type),
            }),
            demarcation_point: p.demarcation_point.to_ptr().map(|d| PortDemarcationPoint {
                ibx: known(&d.ibx),
                cage_unique_space_id: known(&d.cage_unique_space_id),
                cabinet_unique_space_id: known(&d.cabinet_unique_space_id),
                patch_panel: known(&d.patch_panel),
                connector_type: known(&d.connector_type),
            }),
        })
        .collect();

    if let Some(order) = plan.order.to_ptr() {
        let purchase_order = order.purchase_order.to_ptr().cloned().unwrap_or_default();
        let signature = order.signature.to_ptr().cloned().unwrap_or_default();
        let delegate = signature.delegate.to_ptr().cloned().unwrap_or_default();
        request.order = Some(PortOrder {
            purchase_order: Some(PurchaseOrder {
                number: known(&purchase_order.number),
                amount: known(&purchase_order.amount),
                attachment_id: known(&purchase_order.attachment_id),
                order_type: known(&purchase_order.r#type),
                start_date: known(&purchase_order.start_date),
                end_date: known(&purchase_order.end_date),
            }),
            order_number: known(&order.order_number),
            order_id: known(&order.order_id),
            uuid: None,
            customer_reference_id: known(&order.customer_reference_id),
            signature: Some(OrderSignature {
                signatory: known(&signature.signatory),
                delegate: Some(SignatureDelegate {
                    first_name: known(&delegate.first_name),
                    last_name: known(&delegate.last_name),
                    email: known(&delegate.email),
                }),
            }),
        });
    }

    request.notifications = plan
        .notifications
        .iter()
        .map(|n| PortNotification {
            notification_type: known(&n.r#type),
            registered_users: n.registered_users.to_vec(),
        })
        .collect();

    request.additional_info = plan
        .additional_info
        .iter()
        .map(|info| PortAdditionalInfo {
            key: known(&info.key),
            value: known(&info.value),
        })
        .collect();

    request
}

#[derive(Default)]
pub struct PortResource {
    provider_data: Option<EquinixProviderData>,
}

impl PortResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for a created or renamed port to leave `PENDING`.
    async fn wait_for_create_update(
        provider_data: &EquinixProviderData,
        ctx: &Context,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<Port>, WaitError> {
        let client = &*provider_data.client;
        let conf = CREATE_WAITER.apply(StateChangeConf::new(move || async move {
            match client.fabric().ports().get(id).await {
                Ok(port) => {
                    let state = port.state.clone().unwrap_or_default();
                    Ok((Some(port), state))
                }
                // The uuid only becomes readable a while after the order
                Err(e) if e.status() == Some(400) && e.message_contains("Invalid PortUUID") => {
                    Ok((None, STATE_PENDING.to_string()))
                }
                Err(e) => Err(e),
            }
        }))
        .timeout(timeout);

        provider_data.tune_waiter(conf).wait_for_state(ctx).await
    }

    async fn wait_for_delete(
        provider_data: &EquinixProviderData,
        ctx: &Context,
        id: &str,
        timeout: Duration,
    ) -> Result<Option<Port>, WaitError> {
        let client = &*provider_data.client;
        let conf = DELETE_WAITER.apply(StateChangeConf::new(move || async move {
            match client.fabric().ports().get(id).await {
                Ok(port) => {
                    let state = port.state.clone().unwrap_or_default();
                    Ok((Some(port), state))
                }
                Err(e) if e.is_gone() => Ok((Some(Port::default()), DELETED_MARKER.to_string())),
                Err(e) => Err::<(Option<Port>, String), ApiError>(e),
            }
        }))
        .timeout(timeout);

        provider_data.tune_waiter(conf).wait_for_state(ctx).await
    }
}

fn string_attr(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String).description(description)
}

fn computed_string(name: &str, description: &str) -> Attribute {
    string_attr(name, description).computed().build()
}

fn required_string(name: &str, description: &str) -> Attribute {
    string_attr(name, description).required().build()
}

fn order_attribute() -> Attribute {
    let purchase_order = AttributeBuilder::nested(
        "purchase_order",
        NestedType::single(vec![
            computed_string("number", "purchase order number"),
            computed_string("amount", "purchase order amount"),
            computed_string("attachment_id", "purchase order attachment id"),
            computed_string("type", "purchase order type"),
            computed_string("start_date", "purchase order start date"),
            computed_string("end_date", "purchase order end date"),
        ]),
    )
    .description("Purchase order details")
    .optional()
    .computed()
    .build();

    let delegate = AttributeBuilder::nested(
        "delegate",
        NestedType::single(vec![
            required_string("first_name", "First name of the signatory"),
            required_string("last_name", "Last name of the signatory"),
            required_string("email", "Email of the signatory"),
        ]),
    )
    .description("Delegate order details")
    .required()
    .build();

    let signature = AttributeBuilder::nested(
        "signature",
        NestedType::single(vec![
            required_string("signatory", "Port signature Type"),
            delegate,
        ]),
    )
    .description("Port order confirmation signature details")
    .required()
    .build();

    AttributeBuilder::nested(
        "order",
        NestedType::single(vec![
            purchase_order,
            required_string("order_number", "Order Reference Number"),
            required_string("order_id", "Order Identification"),
            string_attr(
                "uuid",
                "Equinix-assigned order identifier, this is a derived response attribute",
            )
            .optional()
            .computed()
            .build(),
            required_string("customer_reference_id", "Customer order reference Id"),
            signature,
        ]),
    )
    .description("Details of the Port Order such as purchaseOrder details and signature")
    .required()
    .build()
}

fn physical_ports_attribute() -> Attribute {
    let demarcation_point = AttributeBuilder::nested(
        "demarcation_point",
        NestedType::single(vec![
            required_string("ibx", "IBX Metro code for the physical port"),
            required_string("cage_unique_space_id", "Port cage unique space id"),
            required_string("cabinet_unique_space_id", "Port cabinet unique space id"),
            required_string("patch_panel", "Port patch panel"),
            required_string("connector_type", "Port connector type"),
        ]),
    )
    .description("Customer physical port")
    .required()
    .build();

    let interface = AttributeBuilder::nested(
        "interface",
        NestedType::single(vec![string_attr("type", "Interface type")
            .optional()
            .computed()
            .build()]),
    )
    .description("Physical port interface")
    .optional()
    .computed()
    .build();

    AttributeBuilder::nested(
        "physical_ports",
        NestedType::list(vec![
            required_string("type", "Physical Port type"),
            interface,
            demarcation_point,
        ]),
    )
    .description("Physical ports that will implement this port order")
    .required()
    .build()
}

fn device_attribute() -> Attribute {
    let redundancy = AttributeBuilder::nested(
        "redundancy",
        NestedType::single(vec![
            required_string("priority", "Device redundancy priority"),
            string_attr("group", "Device redundancy group")
                .optional()
                .build(),
        ]),
    )
    .description("Device redundancy settings")
    .optional()
    .build();

    AttributeBuilder::nested(
        "device",
        NestedType::single(vec![required_string("name", "Device name"), redundancy]),
    )
    .description("Device the port is placed on")
    .optional()
    .build()
}

#[async_trait]
impl Resource for PortResource {
    fn type_name(&self) -> &str {
        "equinix_fabric_port"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description(
                "Fabric V4 API compatible resource allows creation and management of Equinix Fabric Ports",
            )
            .attribute(
                string_attr("id", "The unique identifier of the resource")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(timeouts_attribute(TimeoutOpts::all()))
            .attribute(required_string("type", "Type of the port order request"))
            .attribute(
                string_attr("name", "Name of the port; the only attribute that can be updated in place")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(required_string(
                "connectivity_source_type",
                "Connection type that is used from the port after creation",
            ))
            .attribute(
                AttributeBuilder::nested(
                    "location",
                    NestedType::single(vec![required_string(
                        "metro_code",
                        "Metro code the port will be created in",
                    )]),
                )
                .description("Location details for the port order")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "settings",
                    NestedType::single(vec![
                        string_attr("package_type", "Port package type")
                            .optional()
                            .computed()
                            .build(),
                        AttributeBuilder::new("shared_port_type", AttributeType::Bool)
                            .description("Indicates whether this is a dedicated customer cage or a shared neutral cage")
                            .required()
                            .build(),
                    ]),
                )
                .description("Port order configuration settings")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "encapsulation",
                    NestedType::single(vec![
                        required_string("type", "Port encapsulation protocol type"),
                        required_string(
                            "tag_protocol_id",
                            "Port encapsulation tag protocol identifier",
                        ),
                    ]),
                )
                .description("Port encapsulation settings")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "account",
                    NestedType::single(vec![
                        AttributeBuilder::new("account_number", AttributeType::Number)
                            .description("Account number the port will be created for")
                            .required()
                            .build(),
                        computed_string("account_name", "Legal name of the accountholder."),
                        computed_string("ucm_id", "Enterprise datastore id"),
                    ]),
                )
                .description("Port order account details")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "project",
                    NestedType::single(vec![required_string(
                        "project_id",
                        "Project id the port will be created in",
                    )]),
                )
                .description("Port order project details")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "redundancy",
                    NestedType::single(vec![required_string(
                        "priority",
                        "Port redundancy priority value",
                    )]),
                )
                .description("Port redundancy settings")
                .required()
                .build(),
            )
            .attribute(device_attribute())
            .attribute(
                AttributeBuilder::new("lag_enabled", AttributeType::Bool)
                    .description("Boolean value to enable the created port with Link Aggregation Groups")
                    .required()
                    .build(),
            )
            .attribute(physical_ports_attribute())
            .attribute(
                AttributeBuilder::new("physical_ports_speed", AttributeType::Number)
                    .description("Physical Ports Speed in Mbps")
                    .required()
                    .build(),
            )
            .attribute(required_string("physical_ports_type", "Physical Ports Type"))
            .attribute(
                AttributeBuilder::new("physical_ports_count", AttributeType::Number)
                    .description("Number of physical ports in the Port Order")
                    .required()
                    .build(),
            )
            .attribute(
                string_attr("demarcation_point_ibx", "IBX of the port demarcation point")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(order_attribute())
            .attribute(
                AttributeBuilder::nested(
                    "notifications",
                    NestedType::list(vec![
                        required_string("type", "Notification Type"),
                        AttributeBuilder::new(
                            "registered_users",
                            AttributeType::List(Box::new(AttributeType::String)),
                        )
                        .description("Array of registered users that will receive this notification type on the port")
                        .required()
                        .build(),
                    ]),
                )
                .description("List of notification types and the registered users to receive those notification types")
                .required()
                .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "additional_info",
                    NestedType::list(vec![
                        required_string("key", "The key name of the key/value pair"),
                        required_string("value", "The value of the key/value pair"),
                    ]),
                )
                .description("List of key/value objects to provide additional context to the Port order")
                .optional()
                .build(),
            )
            .attribute(
                string_attr("href", "Equinix assigned URI of the port resource")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                string_attr("uuid", "Equinix assigned unique identifier of the port resource")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                string_attr("state", "Value representing provisioning status for the port resource")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(change_log_attribute("port resource"))
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let schema = self.schema(ctx, ResourceSchemaRequest).await.schema;
        ValidateResourceConfigResponse {
            diagnostics: schema.validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let mut plan: PortResourceModel = match request.planned_state.as_model() {
            Ok(plan) => plan,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read plan", e.to_string()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        tracing::debug!("Creating port {}", plan.r#type.as_str());
        let create_request = build_create_request(&plan);
        let port = match provider_data.client.fabric().ports().create(&create_request).await {
            Ok(port) => port,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed creating port", e.fabric_message()));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let uuid = port.uuid.clone().unwrap_or_default();
        tracing::info!("Created port {}", uuid);

        let timeout = timeouts_of(&plan.timeouts).create(DEFAULT_TIMEOUT);
        let checked = match Self::wait_for_create_update(provider_data, &ctx, &uuid, timeout).await {
            Ok(Some(checked)) => checked,
            Ok(None) => port,
            Err(e) if e.is_not_found() => {
                diagnostics.push(Diagnostic::warning(
                    "Port Order Created but Port Reservation Not Completed",
                    "This port will not be available for use until the order is completed. \
                     It cannot be used as an immediate dependency in a connection resource. \
                     Please check the order status in the Equinix Fabric portal.",
                ));
                port
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed creating port {}", uuid),
                    e.to_string(),
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        plan.parse(&checked);
        match DynamicValue::from_model(&plan) {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let mut state: PortResourceModel = match request.current_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                };
            }
        };

        let id = state.id.value_or_default();
        match provider_data.client.fabric().ports().get(&id).await {
            Ok(port) => {
                state.parse(&port);
                match DynamicValue::from_model(&state) {
                    Ok(new_state) => ReadResourceResponse {
                        new_state: Some(new_state),
                        diagnostics,
                    },
                    Err(e) => {
                        diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                        ReadResourceResponse {
                            new_state: Some(request.current_state),
                            diagnostics,
                        }
                    }
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Port {} not found, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed retrieving port {}", id),
                    e.fabric_message(),
                ));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let models = request
            .planned_state
            .as_model::<PortResourceModel>()
            .and_then(|plan| Ok((plan, request.prior_state.as_model::<PortResourceModel>()?)));
        let (mut plan, state) = match models {
            Ok(models) => models,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read plan", e.to_string()));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let id = state.id.value_or_default();
        if plan.name.as_str() == state.name.as_str() {
            diagnostics.push(Diagnostic::warning(
                "No configurable values have changed",
                "Terraform detected a config change, but it is just for a computed field(s). \
                 No update API call will be made.",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let operations = [PatchOperation::replace("/name", plan.name.as_str())];
        if let Err(e) = provider_data.client.fabric().ports().update(&id, &operations).await {
            diagnostics.push(Diagnostic::error(
                format!("Failed updating port {}", id),
                e.fabric_message(),
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let timeout = timeouts_of(&plan.timeouts).update(DEFAULT_TIMEOUT);
        let checked = match Self::wait_for_create_update(provider_data, &ctx, &id, timeout).await {
            Ok(Some(checked)) => checked,
            Ok(None) => Port::default(),
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed updating port {}", id),
                    e.to_string(),
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        plan.parse(&checked);
        match DynamicValue::from_model(&plan) {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to encode state", e.to_string()));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let state: PortResourceModel = match request.prior_state.as_model() {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read state", e.to_string()));
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = state.id.value_or_default();
        if let Err(e) = provider_data.client.fabric().ports().delete(&id).await {
            if !e.is_gone() {
                diagnostics.push(Diagnostic::error(
                    format!("Failed deleting port {}", id),
                    e.fabric_message(),
                ));
                return DeleteResourceResponse { diagnostics };
            }
        }

        let timeout = timeouts_of(&state.timeouts).delete(DEFAULT_TIMEOUT);
        if let Err(e) = Self::wait_for_delete(provider_data, &ctx, &id, timeout).await {
            diagnostics.push(Diagnostic::error(
                format!("Failed deleting port {}", id),
                e.to_string(),
            ));
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for PortResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match EquinixProviderData::from_configure(request.provider_data, "resource") {
            Ok(provider_data) => self.provider_data = Some(provider_data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[cfg(test)]
#[path = "./resource_port_test.rs"]
mod resource_port_test;
