//! REST implementation of the management API traits

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::Endpoints;
use crate::error::{Error, Result};

use super::types::*;
use super::{AddressService, KafkaService, OperationService};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body for logging and strip non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull the human-readable message out of an API error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_log(body))
}

/// Append path segments to an endpoint, percent-encoding each one.
///
/// Empty and dot-only segments are refused: the URL parser would drop or
/// resolve them and the request would land on a parent resource.
fn endpoint_url(base: &str, prefix: &[&str], segments: &[&str]) -> Result<Url> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || s.chars().all(|c| c == '.'))
    {
        return Err(Error::validation(format!("Invalid URL path segment '{}'", bad)));
    }
    let mut url = Url::parse(base)
        .map_err(|e| Error::config(format!("Invalid endpoint '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::config(format!("Endpoint '{}' cannot carry a path", base)))?
        .pop_if_empty()
        .extend(prefix)
        .extend(segments);
    Ok(url)
}

/// HTTP client for the management API
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    endpoints: Endpoints,
    token: String,
}

impl RestClient {
    /// Create a new client authenticating with a bearer token
    pub fn new(endpoints: Endpoints, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("yc-resource-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoints,
            token: token.into(),
        })
    }

    fn kafka_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint_url(&self.endpoints.mdb, &["managed-kafka", "v1"], segments)
    }

    fn vpc_url(&self, segments: &[&str]) -> Result<Url> {
        endpoint_url(&self.endpoints.vpc, &["vpc", "v1"], segments)
    }

    fn operation_url(&self, operation_id: &str) -> Result<Url> {
        endpoint_url(&self.endpoints.operation, &["operations"], &[operation_id])
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client.request(method, url.clone()).bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &Url) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() == 404 {
            return Err(Error::NotFound(format!("{} ({})", url, error_message(&body))));
        }

        if !status.is_success() {
            error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if body.is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Result<Url>) -> Result<T> {
        let url = url?;
        self.send(self.request(Method::GET, &url), &url).await
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: Result<Url>,
        page_size: i64,
        page_token: &str,
    ) -> Result<T> {
        let url = url?;
        let mut request = self
            .request(Method::GET, &url)
            .query(&[("pageSize", page_size.to_string())]);
        if !page_token.is_empty() {
            request = request.query(&[("pageToken", page_token)]);
        }
        self.send(request, &url).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: Result<Url>, body: &B) -> Result<T> {
        let url = url?;
        self.send(self.request(Method::POST, &url).json(body), &url).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(&self, url: Result<Url>, body: &B) -> Result<T> {
        let url = url?;
        self.send(self.request(Method::PATCH, &url).json(body), &url).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: Result<Url>) -> Result<T> {
        let url = url?;
        self.send(self.request(Method::DELETE, &url), &url).await
    }
}

#[async_trait]
impl KafkaService for RestClient {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        self.get(self.kafka_url(&["clusters", cluster_id])).await
    }

    async fn create_cluster(&self, request: &CreateClusterRequest) -> Result<Operation> {
        self.post(self.kafka_url(&["clusters"]), request).await
    }

    async fn update_cluster(&self, request: &UpdateClusterRequest) -> Result<Operation> {
        let url = self.kafka_url(&["clusters", &request.cluster_id]);
        self.patch(url, request).await
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<Operation> {
        self.delete(self.kafka_url(&["clusters", cluster_id])).await
    }

    async fn list_topics(
        &self,
        cluster_id: &str,
        page_size: i64,
        page_token: &str,
    ) -> Result<ListTopicsResponse> {
        let url = self.kafka_url(&["clusters", cluster_id, "topics"]);
        self.get_page(url, page_size, page_token).await
    }

    async fn create_topic(&self, request: &CreateTopicRequest) -> Result<Operation> {
        let url = self.kafka_url(&["clusters", &request.cluster_id, "topics"]);
        self.post(url, request).await
    }

    async fn update_topic(&self, request: &UpdateTopicRequest) -> Result<Operation> {
        let url = self.kafka_url(&["clusters", &request.cluster_id, "topics", &request.topic_name]);
        self.patch(url, request).await
    }

    async fn delete_topic(&self, cluster_id: &str, topic_name: &str) -> Result<Operation> {
        self.delete(self.kafka_url(&["clusters", cluster_id, "topics", topic_name]))
            .await
    }

    async fn list_users(
        &self,
        cluster_id: &str,
        page_size: i64,
        page_token: &str,
    ) -> Result<ListUsersResponse> {
        let url = self.kafka_url(&["clusters", cluster_id, "users"]);
        self.get_page(url, page_size, page_token).await
    }

    async fn create_user(&self, request: &CreateUserRequest) -> Result<Operation> {
        let url = self.kafka_url(&["clusters", &request.cluster_id, "users"]);
        self.post(url, request).await
    }

    async fn update_user(&self, request: &UpdateUserRequest) -> Result<Operation> {
        let url = self.kafka_url(&["clusters", &request.cluster_id, "users", &request.user_name]);
        self.patch(url, request).await
    }

    async fn delete_user(&self, cluster_id: &str, user_name: &str) -> Result<Operation> {
        self.delete(self.kafka_url(&["clusters", cluster_id, "users", user_name]))
            .await
    }
}

#[async_trait]
impl AddressService for RestClient {
    async fn get_address(&self, address_id: &str) -> Result<Address> {
        self.get(self.vpc_url(&["addresses", address_id])).await
    }

    async fn create_address(&self, request: &CreateAddressRequest) -> Result<Operation> {
        self.post(self.vpc_url(&["addresses"]), request).await
    }

    async fn update_address(&self, request: &UpdateAddressRequest) -> Result<Operation> {
        let url = self.vpc_url(&["addresses", &request.address_id]);
        self.patch(url, request).await
    }

    async fn delete_address(&self, address_id: &str) -> Result<Operation> {
        self.delete(self.vpc_url(&["addresses", address_id])).await
    }
}

#[async_trait]
impl OperationService for RestClient {
    async fn get_operation(&self, operation_id: &str) -> Result<Operation> {
        self.get(self.operation_url(operation_id)).await
    }
}
