//! ARM REST client tests against a local mock server.

use azure_vm_sample::azure::{ArmApi, ArmClient, ArmError, ManagementApi, StaticToken};
use azure_vm_sample::models::{ResourceGroup, VirtualMachine};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUB: &str = "sub1";
const VM_PATH: &str =
    "/subscriptions/sub1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/linuxVM";
const GROUP_PATH: &str = "/subscriptions/sub1/resourcegroups/rg";

fn api(server: &MockServer) -> ArmApi {
    let client = ArmClient::new(SUB, Arc::new(StaticToken::new("tok")))
        .expect("client should build")
        .with_base_url(&server.uri())
        .with_poll_interval(Duration::from_millis(10));
    ArmApi::new(client)
}

#[tokio::test]
async fn test_get_vm_sends_bearer_and_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .and(query_param("api-version", "2023-09-01"))
        .and(query_param("$expand", "instanceView"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(include_str!("../src/tests/test_data/vm_get_response.json"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let vm = api(&server).get_vm("rg", "linuxVM").await.expect("get_vm");
    assert_eq!(vm.name.as_deref(), Some("linuxVM"));
    assert_eq!(vm.os_disk_size_gb(), Some(30));
    assert_eq!(vm.power_state(), Some("running"));
}

#[tokio::test]
async fn test_put_waits_for_async_operation() {
    let server = MockServer::start().await;
    let op_url = format!("{}/operations/op1", server.uri());
    Mock::given(method("PUT"))
        .and(path(GROUP_PATH))
        .and(query_param("api-version", "2021-04-01"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Azure-AsyncOperation", op_url.as_str())
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"location": "westus"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(GROUP_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "/subscriptions/sub1/resourceGroups/rg",
            "name": "rg",
            "location": "westus"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = api(&server)
        .create_resource_group("rg", &ResourceGroup::new("westus"))
        .await
        .expect("create_resource_group");
    assert_eq!(group.name.as_deref(), Some("rg"));
    assert_eq!(group.id.as_deref(), Some("/subscriptions/sub1/resourceGroups/rg"));
}

#[tokio::test]
async fn test_failed_operation_is_an_error() {
    let server = MockServer::start().await;
    let op_url = format!("{}/operations/op2", server.uri());
    Mock::given(method("POST"))
        .and(path(format!("{VM_PATH}/deallocate")))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Azure-AsyncOperation", op_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": {"code": "OperationNotAllowed", "message": "VM is locked"}
        })))
        .mount(&server)
        .await;

    let err = api(&server)
        .deallocate_vm("rg", "linuxVM")
        .await
        .expect_err("operation failed remotely");
    match err {
        ArmError::Operation {
            status, message, ..
        } => {
            assert_eq!(status, "Failed");
            assert_eq!(message, "VM is locked");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_action_polls_location() {
    let server = MockServer::start().await;
    let loc_url = format!("{}/locations/loc1", server.uri());
    Mock::given(method("POST"))
        .and(path(format!("{VM_PATH}/powerOff")))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", loc_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/locations/loc1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    api(&server)
        .power_off_vm("rg", "linuxVM")
        .await
        .expect("power_off_vm");
}

#[tokio::test]
async fn test_error_envelope_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": "OperationNotAllowed",
                "message": "Disk resizing is allowed only when the VM is deallocated."
            }
        })))
        .mount(&server)
        .await;

    let err = api(&server)
        .update_vm(
            "rg",
            "linuxVM",
            &azure_vm_sample::models::VmUpdate::os_disk_size(266),
        )
        .await
        .expect_err("conflict");
    assert_eq!(err.http_status(), Some(409));
    match err {
        ArmError::Status { code, method, .. } => {
            assert_eq!(code, "OperationNotAllowed");
            assert_eq!(method, "PATCH");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_list_follows_next_link() {
    let server = MockServer::start().await;
    let next = format!("{}/page2", server.uri());
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub1/providers/Microsoft.Compute/virtualMachines"))
        .and(query_param("api-version", "2023-09-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "vm1", "location": "westus"}],
            "nextLink": next
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "vm2", "location": "eastus"}, {"name": "vm3", "location": "eastus"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vms: Vec<VirtualMachine> = api(&server).list_all_vms().await.expect("list_all_vms");
    let names: Vec<_> = vms.iter().filter_map(|vm| vm.name.as_deref()).collect();
    assert_eq!(names, vec!["vm1", "vm2", "vm3"]);
}

#[tokio::test]
async fn test_repeated_next_link_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "nextLink": format!("{}/page", server.uri())
        })))
        .mount(&server)
        .await;

    let client = ArmClient::new(SUB, Arc::new(StaticToken::new("tok"))).expect("client");
    let err = client
        .get_all_pages::<VirtualMachine>(&format!("{}/page", server.uri()))
        .await
        .expect_err("loop must be detected");
    assert!(err.to_string().contains("NextLinkNotUnique"));
}

#[tokio::test]
async fn test_list_accepts_gallery_image_vms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subscriptions/sub1/providers/Microsoft.Compute/virtualMachines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "name": "galleryVM",
                    "location": "westus",
                    "properties": {"storageProfile": {"imageReference": {
                        "id": "/subscriptions/s/resourceGroups/g/providers/Microsoft.Compute/galleries/gal/images/img/versions/1.0.0"
                    }}}
                },
                {
                    "name": "linuxVM",
                    "location": "westus",
                    "properties": {"storageProfile": {"imageReference": {
                        "publisher": "Canonical",
                        "offer": "UbuntuServer",
                        "sku": "16.04.0-LTS",
                        "version": "latest"
                    }}}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vms = api(&server).list_all_vms().await.expect("list_all_vms");
    assert_eq!(vms.len(), 2);
    let gallery = vms[0]
        .properties
        .storage_profile
        .as_ref()
        .and_then(|sp| sp.image_reference.as_ref())
        .expect("gallery image reference");
    assert!(gallery.id.as_deref().unwrap_or_default().contains("/galleries/gal/"));
    assert_eq!(gallery.publisher, None);
}

#[tokio::test]
async fn test_get_network_interface_reads_id() {
    let server = MockServer::start().await;
    let nic_path =
        "/subscriptions/sub1/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/nic-linuxVM";
    Mock::given(method("GET"))
        .and(path(nic_path))
        .and(query_param("api-version", "2023-09-01"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": nic_path,
            "name": "nic-linuxVM",
            "location": "westus",
            "properties": {
                "provisioningState": "Succeeded",
                "ipConfigurations": [{
                    "name": "ipconfig-linuxVM",
                    "properties": {
                        "privateIPAllocationMethod": "Dynamic",
                        "subnet": {"id": "/subnets/sub"}
                    }
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let nic = api(&server)
        .get_network_interface("rg", "nic-linuxVM")
        .await
        .expect("get_network_interface");
    assert_eq!(nic.id.as_deref(), Some(nic_path));
    assert_eq!(nic.properties.provisioning_state.as_deref(), Some("Succeeded"));
}
