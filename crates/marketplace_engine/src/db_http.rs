use marketplace_core::{PortfolioPost, PostId};
use serde_json::json;

use crate::http::{AccessToken, RemoteSettings, Reply, RestClient, SettingsError, TransportError};
use crate::service::DatabaseService;
use crate::wire::{decode_posts, error_reason};
use crate::SyncError;

const POSTS_TABLE: &str = "rest/v1/portfolio_posts";
const LIKE_RPC: &str = "rest/v1/rpc/like_post";
const COMMENTS_TABLE: &str = "rest/v1/comments";
const SHARES_TABLE: &str = "rest/v1/shares";

/// `DatabaseService` over the hosted REST interface of the post store.
#[derive(Debug, Clone)]
pub struct HttpDatabaseService {
    rest: RestClient,
}

impl HttpDatabaseService {
    pub fn new(settings: &RemoteSettings, token: AccessToken) -> Result<Self, SettingsError> {
        Ok(Self {
            rest: RestClient::new(settings, token)?,
        })
    }

    async fn insert(&self, path: &str, body: serde_json::Value) -> Result<(), SyncError> {
        let url = self.rest.endpoint(path, &[]).map_err(network)?;
        let reply = self.rest.post_json(url, &body).await.map_err(network)?;
        check(&reply)
    }
}

#[async_trait::async_trait]
impl DatabaseService for HttpDatabaseService {
    async fn portfolio_posts(&self) -> Result<Vec<PortfolioPost>, SyncError> {
        let url = self
            .rest
            .endpoint(
                POSTS_TABLE,
                &[("select", "*"), ("order", "created_at.desc")],
            )
            .map_err(network)?;
        let reply = self.rest.get(url).await.map_err(network)?;
        check(&reply)?;
        decode_posts(&reply.body)
            .map_err(|err| SyncError::server(reply.status, format!("malformed response: {err}")))
    }

    async fn like_post(&self, post_id: &PostId) -> Result<(), SyncError> {
        self.insert(LIKE_RPC, json!({ "post_id": post_id.as_str() }))
            .await
    }

    async fn add_comment(&self, post_id: &PostId, body: &str) -> Result<(), SyncError> {
        self.insert(
            COMMENTS_TABLE,
            json!({ "post_id": post_id.as_str(), "body": body }),
        )
        .await
    }

    async fn share_post(&self, post_id: &PostId) -> Result<(), SyncError> {
        self.insert(SHARES_TABLE, json!({ "post_id": post_id.as_str() }))
            .await
    }
}

fn network(err: TransportError) -> SyncError {
    SyncError::Network(err.0)
}

fn check(reply: &Reply) -> Result<(), SyncError> {
    if reply.is_success() {
        return Ok(());
    }
    let message = error_reason(&reply.body).unwrap_or_else(|| reply.text());
    Err(SyncError::server(reply.status, message))
}
