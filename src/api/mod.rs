//! Management API seam
//!
//! The reconcilers only see these traits. [`RestClient`] implements them
//! over the public REST endpoints; tests substitute an in-memory cloud.

mod http;
mod types;

pub use http::*;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Page size used by every list call
pub const DEFAULT_PAGE_SIZE: i64 = 1000;

/// Managed Kafka clusters, topics and users
#[async_trait]
pub trait KafkaService: Send + Sync {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster>;

    async fn create_cluster(&self, request: &CreateClusterRequest) -> Result<Operation>;

    async fn update_cluster(&self, request: &UpdateClusterRequest) -> Result<Operation>;

    async fn delete_cluster(&self, cluster_id: &str) -> Result<Operation>;

    async fn list_topics(
        &self,
        cluster_id: &str,
        page_size: i64,
        page_token: &str,
    ) -> Result<ListTopicsResponse>;

    async fn create_topic(&self, request: &CreateTopicRequest) -> Result<Operation>;

    async fn update_topic(&self, request: &UpdateTopicRequest) -> Result<Operation>;

    async fn delete_topic(&self, cluster_id: &str, topic_name: &str) -> Result<Operation>;

    async fn list_users(
        &self,
        cluster_id: &str,
        page_size: i64,
        page_token: &str,
    ) -> Result<ListUsersResponse>;

    async fn create_user(&self, request: &CreateUserRequest) -> Result<Operation>;

    async fn update_user(&self, request: &UpdateUserRequest) -> Result<Operation>;

    async fn delete_user(&self, cluster_id: &str, user_name: &str) -> Result<Operation>;
}

/// VPC addresses
#[async_trait]
pub trait AddressService: Send + Sync {
    async fn get_address(&self, address_id: &str) -> Result<Address>;

    async fn create_address(&self, request: &CreateAddressRequest) -> Result<Operation>;

    async fn update_address(&self, request: &UpdateAddressRequest) -> Result<Operation>;

    async fn delete_address(&self, address_id: &str) -> Result<Operation>;
}

/// Long-running operation status
#[async_trait]
pub trait OperationService: Send + Sync {
    async fn get_operation(&self, operation_id: &str) -> Result<Operation>;
}

/// Fetch every topic of a cluster, following continuation tokens
pub async fn list_all_topics(kafka: &dyn KafkaService, cluster_id: &str) -> Result<Vec<Topic>> {
    let mut topics = Vec::new();
    let mut page_token = String::new();
    loop {
        let page = kafka
            .list_topics(cluster_id, DEFAULT_PAGE_SIZE, &page_token)
            .await?;
        topics.extend(page.topics);
        if page.next_page_token.is_empty() {
            break;
        }
        page_token = page.next_page_token;
    }
    Ok(topics)
}

/// Fetch every user of a cluster, following continuation tokens
pub async fn list_all_users(kafka: &dyn KafkaService, cluster_id: &str) -> Result<Vec<User>> {
    let mut users = Vec::new();
    let mut page_token = String::new();
    loop {
        let page = kafka
            .list_users(cluster_id, DEFAULT_PAGE_SIZE, &page_token)
            .await?;
        users.extend(page.users);
        if page.next_page_token.is_empty() {
            break;
        }
        page_token = page.next_page_token;
    }
    Ok(users)
}
