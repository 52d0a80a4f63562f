//! In-memory management API shared by the integration tests
//!
//! Every mutating call returns a pending operation that completes on the
//! first poll. Calls are recorded so tests can assert exactly what was sent.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use yc_resource_provider::api::{
    Address, AddressService, Cluster, CreateAddressRequest, CreateClusterRequest,
    CreateTopicRequest, CreateUserRequest, ExternalIpv4Address, KafkaService, ListTopicsResponse,
    ListUsersResponse, Operation, OperationService, Status, Topic, UpdateAddressRequest,
    UpdateClusterRequest, UpdateTopicRequest, UpdateUserRequest, User,
};
use yc_resource_provider::config::{PollConfig, ProviderConfig};
use yc_resource_provider::reconcilers::Context;
use yc_resource_provider::resources::{
    ExternalIpv4Spec, KafkaClusterSpec, KafkaConfigSpec, KafkaPermissionSpec, KafkaServiceSpec,
    KafkaTopicSpec, KafkaUserSpec, ResourcesSpec, VpcAddressSpec,
};
use yc_resource_provider::{Error, Result};

pub const FOLDER_ID: &str = "folder1";

#[derive(Default)]
struct Cloud {
    clusters: BTreeMap<String, Cluster>,
    topics: BTreeMap<String, Vec<Topic>>,
    users: BTreeMap<String, Vec<User>>,
    passwords: BTreeMap<(String, String), String>,
    addresses: BTreeMap<String, Address>,
    operations: BTreeMap<String, Operation>,
    calls: Vec<String>,
    failing: HashSet<String>,
    next_id: u64,
}

impl Cloud {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    /// Start an operation for `call`; it fails when `call` was marked failing
    fn start(&mut self, call: &str, metadata: Option<serde_json::Value>) -> Operation {
        self.calls.push(call.to_string());
        let id = self.next_id("op");
        let pending = Operation {
            id: id.clone(),
            description: call.to_string(),
            done: false,
            metadata: metadata.clone(),
            ..Default::default()
        };
        let error = self.failing.contains(call).then(|| Status {
            code: 13,
            message: format!("{} failed", call),
            details: vec![],
        });
        self.operations.insert(
            id,
            Operation {
                done: true,
                error,
                ..pending.clone()
            },
        );
        pending
    }

    fn cluster_mut(&mut self, cluster_id: &str) -> Result<&mut Cluster> {
        self.clusters
            .get_mut(cluster_id)
            .ok_or_else(|| Error::NotFound(format!("cluster {}", cluster_id)))
    }
}

/// Fake cloud implementing every service trait
pub struct FakeCloud {
    cloud: Mutex<Cloud>,
    page_size: usize,
}

impl FakeCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cloud: Mutex::new(Cloud::default()),
            page_size: 2,
        })
    }

    /// Operations started by `call` (e.g. `update_user:alice`) finish with an error
    pub fn fail(&self, call: &str) {
        self.cloud.lock().unwrap().failing.insert(call.to_string());
    }

    /// Undo [`FakeCloud::fail`]
    pub fn recover(&self, call: &str) {
        self.cloud.lock().unwrap().failing.remove(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.cloud.lock().unwrap().calls.clone()
    }

    /// Recorded calls starting with `prefix`
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    /// Recorded calls that change something remotely
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.starts_with("create_") || c.starts_with("update_") || c.starts_with("delete_")
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.cloud.lock().unwrap().calls.clear();
    }

    pub fn cluster(&self, cluster_id: &str) -> Option<Cluster> {
        self.cloud.lock().unwrap().clusters.get(cluster_id).cloned()
    }

    pub fn topic_names(&self, cluster_id: &str) -> Vec<String> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .topics
            .get(cluster_id)
            .map(|topics| topics.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn user(&self, cluster_id: &str, name: &str) -> Option<User> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .users
            .get(cluster_id)
            .and_then(|users| users.iter().find(|u| u.name == name).cloned())
    }

    pub fn password(&self, cluster_id: &str, name: &str) -> Option<String> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .passwords
            .get(&(cluster_id.to_string(), name.to_string()))
            .cloned()
    }

    pub fn address(&self, address_id: &str) -> Option<Address> {
        self.cloud.lock().unwrap().addresses.get(address_id).cloned()
    }

    /// Remove a cluster behind the provider's back
    pub fn drop_cluster(&self, cluster_id: &str) {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.clusters.remove(cluster_id);
        cloud.topics.remove(cluster_id);
        cloud.users.remove(cluster_id);
    }

    /// Remove an address behind the provider's back
    pub fn drop_address(&self, address_id: &str) {
        self.cloud.lock().unwrap().addresses.remove(address_id);
    }

    /// Add a topic behind the provider's back
    pub fn insert_topic(&self, topic: Topic) {
        let mut cloud = self.cloud.lock().unwrap();
        cloud
            .topics
            .entry(topic.cluster_id.clone())
            .or_default()
            .push(topic);
    }

    fn page<T: Clone>(&self, items: &[T], page_token: &str) -> Result<(Vec<T>, String)> {
        let start: usize = if page_token.is_empty() {
            0
        } else {
            page_token
                .parse()
                .map_err(|_| Error::validation(format!("bad page token {}", page_token)))?
        };
        let end = (start + self.page_size).min(items.len());
        let next = if end < items.len() {
            end.to_string()
        } else {
            String::new()
        };
        Ok((items[start.min(end)..end].to_vec(), next))
    }
}

#[async_trait]
impl KafkaService for FakeCloud {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.calls.push("get_cluster".to_string());
        cloud
            .clusters
            .get(cluster_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("cluster {}", cluster_id)))
    }

    async fn create_cluster(&self, request: &CreateClusterRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let id = cloud.next_id("cluster");
        let cluster = Cluster {
            id: id.clone(),
            folder_id: request.folder_id.clone(),
            created_at: None,
            name: request.name.clone(),
            description: request.description.clone(),
            labels: request.labels.clone(),
            environment: request.environment,
            config: Some(request.config_spec.clone()),
            network_id: request.network_id.clone(),
            health: "ALIVE".to_string(),
            status: "RUNNING".to_string(),
            security_group_ids: request.security_group_ids.clone(),
        };
        let topics = request
            .topic_specs
            .iter()
            .map(|spec| Topic {
                name: spec.name.clone(),
                cluster_id: id.clone(),
                partitions: spec.partitions,
                replication_factor: spec.replication_factor,
                topic_config: spec.topic_config.clone(),
            })
            .collect();
        let users = request
            .user_specs
            .iter()
            .map(|spec| User {
                name: spec.name.clone(),
                cluster_id: id.clone(),
                permissions: spec.permissions.clone(),
            })
            .collect();
        for spec in &request.user_specs {
            cloud
                .passwords
                .insert((id.clone(), spec.name.clone()), spec.password.clone());
        }
        cloud.clusters.insert(id.clone(), cluster);
        cloud.topics.insert(id.clone(), topics);
        cloud.users.insert(id.clone(), users);

        Ok(cloud.start(
            "create_cluster",
            Some(json!({
                "@type": "type.googleapis.com/yandex.cloud.mdb.kafka.v1.CreateClusterMetadata",
                "clusterId": id,
            })),
        ))
    }

    async fn update_cluster(&self, request: &UpdateClusterRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let mask = request.update_mask.clone();
        let cluster = cloud.cluster_mut(&request.cluster_id)?;
        if mask.contains("name") {
            cluster.name = request.name.clone();
        }
        if mask.contains("description") {
            cluster.description = request.description.clone();
        }
        if mask.contains("labels") {
            cluster.labels = request.labels.clone();
        }
        if mask.contains("security_group_ids") {
            cluster.security_group_ids = request.security_group_ids.clone();
        }
        if mask.paths.iter().any(|p| p.starts_with("config_spec.")) {
            cluster.config = Some(request.config_spec.clone());
        }
        Ok(cloud.start("update_cluster", None))
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        if cloud.clusters.remove(cluster_id).is_none() {
            return Err(Error::NotFound(format!("cluster {}", cluster_id)));
        }
        cloud.topics.remove(cluster_id);
        cloud.users.remove(cluster_id);
        Ok(cloud.start("delete_cluster", None))
    }

    async fn list_topics(
        &self,
        cluster_id: &str,
        _page_size: i64,
        page_token: &str,
    ) -> Result<ListTopicsResponse> {
        let topics = {
            let mut cloud = self.cloud.lock().unwrap();
            cloud.calls.push("list_topics".to_string());
            if !cloud.clusters.contains_key(cluster_id) {
                return Err(Error::NotFound(format!("cluster {}", cluster_id)));
            }
            cloud.topics.get(cluster_id).cloned().unwrap_or_default()
        };
        let (topics, next_page_token) = self.page(&topics, page_token)?;
        Ok(ListTopicsResponse {
            topics,
            next_page_token,
        })
    }

    async fn create_topic(&self, request: &CreateTopicRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let spec = &request.topic_spec;
        let topics = cloud.topics.entry(request.cluster_id.clone()).or_default();
        if topics.iter().any(|t| t.name == spec.name) {
            return Err(Error::Api {
                status: 409,
                message: format!("topic {} already exists", spec.name),
            });
        }
        topics.push(Topic {
            name: spec.name.clone(),
            cluster_id: request.cluster_id.clone(),
            partitions: spec.partitions,
            replication_factor: spec.replication_factor,
            topic_config: spec.topic_config.clone(),
        });
        Ok(cloud.start(&format!("create_topic:{}", spec.name), None))
    }

    async fn update_topic(&self, request: &UpdateTopicRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let topic = cloud
            .topics
            .get_mut(&request.cluster_id)
            .and_then(|topics| topics.iter_mut().find(|t| t.name == request.topic_name))
            .ok_or_else(|| Error::NotFound(format!("topic {}", request.topic_name)))?;
        topic.partitions = request.topic_spec.partitions;
        topic.replication_factor = request.topic_spec.replication_factor;
        topic.topic_config = request.topic_spec.topic_config.clone();
        Ok(cloud.start(&format!("update_topic:{}", request.topic_name), None))
    }

    async fn delete_topic(&self, cluster_id: &str, topic_name: &str) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let topics = cloud.topics.entry(cluster_id.to_string()).or_default();
        let before = topics.len();
        topics.retain(|t| t.name != topic_name);
        if topics.len() == before {
            return Err(Error::NotFound(format!("topic {}", topic_name)));
        }
        Ok(cloud.start(&format!("delete_topic:{}", topic_name), None))
    }

    async fn list_users(
        &self,
        cluster_id: &str,
        _page_size: i64,
        page_token: &str,
    ) -> Result<ListUsersResponse> {
        let users = {
            let mut cloud = self.cloud.lock().unwrap();
            cloud.calls.push("list_users".to_string());
            if !cloud.clusters.contains_key(cluster_id) {
                return Err(Error::NotFound(format!("cluster {}", cluster_id)));
            }
            cloud.users.get(cluster_id).cloned().unwrap_or_default()
        };
        let (users, next_page_token) = self.page(&users, page_token)?;
        Ok(ListUsersResponse {
            users,
            next_page_token,
        })
    }

    async fn create_user(&self, request: &CreateUserRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let spec = &request.user_spec;
        cloud
            .users
            .entry(request.cluster_id.clone())
            .or_default()
            .push(User {
                name: spec.name.clone(),
                cluster_id: request.cluster_id.clone(),
                permissions: spec.permissions.clone(),
            });
        cloud.passwords.insert(
            (request.cluster_id.clone(), spec.name.clone()),
            spec.password.clone(),
        );
        Ok(cloud.start(&format!("create_user:{}", spec.name), None))
    }

    async fn update_user(&self, request: &UpdateUserRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let call = format!("update_user:{}", request.user_name);
        let failing = cloud.failing.contains(&call);
        let user = cloud
            .users
            .get_mut(&request.cluster_id)
            .and_then(|users| users.iter_mut().find(|u| u.name == request.user_name))
            .ok_or_else(|| Error::NotFound(format!("user {}", request.user_name)))?;
        if !failing && request.update_mask.contains("permissions") {
            user.permissions = request.permissions.clone();
        }
        if !failing && request.update_mask.contains("password") {
            cloud.passwords.insert(
                (request.cluster_id.clone(), request.user_name.clone()),
                request.password.clone(),
            );
        }
        Ok(cloud.start(&call, None))
    }

    async fn delete_user(&self, cluster_id: &str, user_name: &str) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let users = cloud.users.entry(cluster_id.to_string()).or_default();
        let before = users.len();
        users.retain(|u| u.name != user_name);
        if users.len() == before {
            return Err(Error::NotFound(format!("user {}", user_name)));
        }
        Ok(cloud.start(&format!("delete_user:{}", user_name), None))
    }
}

#[async_trait]
impl AddressService for FakeCloud {
    async fn get_address(&self, address_id: &str) -> Result<Address> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.calls.push("get_address".to_string());
        cloud
            .addresses
            .get(address_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("address {}", address_id)))
    }

    async fn create_address(&self, request: &CreateAddressRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let id = cloud.next_id("address");
        let name = if request.name.is_empty() {
            format!("{}-name", id)
        } else {
            request.name.clone()
        };
        let external = request
            .external_ipv4_address_spec
            .as_ref()
            .map(|spec| ExternalIpv4Address {
                address: "203.0.113.10".to_string(),
                zone_id: if spec.zone_id.is_empty() {
                    "ru-central1-a".to_string()
                } else {
                    spec.zone_id.clone()
                },
                requirements: spec.requirements.clone(),
            });
        cloud.addresses.insert(
            id.clone(),
            Address {
                id: id.clone(),
                folder_id: request.folder_id.clone(),
                created_at: None,
                name,
                description: request.description.clone(),
                labels: request.labels.clone(),
                external_ipv4_address: external,
                reserved: true,
                used: false,
            },
        );
        Ok(cloud.start(
            "create_address",
            Some(json!({
                "@type": "type.googleapis.com/yandex.cloud.vpc.v1.CreateAddressMetadata",
                "addressId": id,
            })),
        ))
    }

    async fn update_address(&self, request: &UpdateAddressRequest) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        let mask = request.update_mask.clone();
        let address = cloud
            .addresses
            .get_mut(&request.address_id)
            .ok_or_else(|| Error::NotFound(format!("address {}", request.address_id)))?;
        if mask.contains("name") {
            address.name = request.name.clone();
        }
        if mask.contains("description") {
            address.description = request.description.clone();
        }
        if mask.contains("labels") {
            address.labels = request.labels.clone();
        }
        Ok(cloud.start("update_address", None))
    }

    async fn delete_address(&self, address_id: &str) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        if cloud.addresses.remove(address_id).is_none() {
            return Err(Error::NotFound(format!("address {}", address_id)));
        }
        Ok(cloud.start("delete_address", None))
    }
}

#[async_trait]
impl OperationService for FakeCloud {
    async fn get_operation(&self, operation_id: &str) -> Result<Operation> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.calls.push("get_operation".to_string());
        cloud
            .operations
            .get(operation_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("operation {}", operation_id)))
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub fn fast_config() -> ProviderConfig {
    ProviderConfig {
        token: "test-token".to_string(),
        folder_id: Some(FOLDER_ID.to_string()),
        poll: PollConfig {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(4),
        },
        ..Default::default()
    }
}

pub fn context(cloud: &Arc<FakeCloud>) -> Context {
    Context::new(cloud.clone(), fast_config())
}

pub fn topic(name: &str, partitions: i64) -> KafkaTopicSpec {
    KafkaTopicSpec {
        name: name.to_string(),
        partitions,
        replication_factor: 1,
        topic_config: None,
    }
}

pub fn user(name: &str, password: &str, grants: &[(&str, &str)]) -> KafkaUserSpec {
    KafkaUserSpec {
        name: name.to_string(),
        password: password.to_string(),
        permissions: grants
            .iter()
            .map(|(topic_name, role)| KafkaPermissionSpec {
                topic_name: topic_name.to_string(),
                role: role.to_string(),
            })
            .collect(),
    }
}

pub fn cluster_spec(name: &str) -> KafkaClusterSpec {
    KafkaClusterSpec {
        name: name.to_string(),
        network_id: "net1".to_string(),
        environment: "PRODUCTION".to_string(),
        description: String::new(),
        labels: BTreeMap::new(),
        subnet_ids: vec![],
        folder_id: None,
        security_group_ids: Default::default(),
        config: KafkaConfigSpec {
            version: "2.8".to_string(),
            zones: vec!["ru-central1-a".to_string()],
            brokers_count: 1,
            assign_public_ip: false,
            kafka: KafkaServiceSpec {
                resources: ResourcesSpec {
                    resource_preset_id: "s2.micro".to_string(),
                    disk_size: 17179869184,
                    disk_type_id: "network-ssd".to_string(),
                },
                kafka_config: None,
            },
            zookeeper: None,
        },
        topics: vec![],
        users: vec![],
    }
}

pub fn address_spec(name: &str) -> VpcAddressSpec {
    VpcAddressSpec {
        name: name.to_string(),
        external_ipv4_address: Some(ExternalIpv4Spec {
            zone_id: Some("ru-central1-a".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
