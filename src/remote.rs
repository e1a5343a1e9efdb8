use crate::config::RemoteConfig;
use crate::models::{Activity, AppData};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("remote responded with status {0}")]
    Status(StatusCode),
    #[error("remote payload is not a competition document: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("remote returned something other than a competition document")]
    NotADocument,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    history: Vec<Value>,
}

/// Client for the spreadsheet web app (`?action=` GETs, `{"action": ..}` POSTs).
#[derive(Debug, Clone)]
pub struct RemoteMirror {
    client: Client,
    url: String,
}

impl RemoteMirror {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `Ok(None)` when the remote holds no document yet.
    pub async fn load(&self) -> Result<Option<AppData>, RemoteError> {
        let value: Value = self.get(&[("action", "load")]).await?;
        if value.is_null() || value.get("success").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        let Some(object) = value.as_object() else {
            return Err(RemoteError::NotADocument);
        };
        if object.contains_key("error") || !object.contains_key("participants") {
            return Err(RemoteError::NotADocument);
        }
        let mut data: AppData = serde_json::from_value(value)?;
        data.normalize();
        Ok(Some(data))
    }

    pub async fn save(&self, data: &AppData) -> Result<(), RemoteError> {
        self.post(&json!({ "action": "save", "data": data })).await
    }

    pub async fn log_activity(&self, activity: &Activity) -> Result<(), RemoteError> {
        self.post(&json!({ "action": "logActivity", "activity": activity }))
            .await
    }

    pub async fn participant_history(&self, participant: &str) -> Result<Vec<Value>, RemoteError> {
        let envelope: HistoryEnvelope = self
            .get(&[("action", "getHistory"), ("participant", participant)])
            .await?;
        Ok(envelope.history)
    }

    pub async fn competition_history(&self) -> Result<Vec<Value>, RemoteError> {
        let envelope: HistoryEnvelope = self.get(&[("action", "getAllHistory")]).await?;
        Ok(envelope.history)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let response = self.client.get(&self.url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn post(&self, body: &Value) -> Result<(), RemoteError> {
        let response = self.client.post(&self.url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(())
    }
}

type Snapshot = (AppData, Vec<Activity>);

/// Feeds snapshots to the mirror one at a time, in the order they were committed.
#[derive(Debug, Clone)]
pub struct Replicator {
    sender: mpsc::UnboundedSender<Snapshot>,
}

impl Replicator {
    pub fn spawn(mirror: Arc<RemoteMirror>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Snapshot>();
        tokio::spawn(async move {
            while let Some((data, activities)) = receiver.recv().await {
                match mirror.save(&data).await {
                    Ok(()) => debug!("mirrored document to {}", mirror.url),
                    Err(err) => warn!("failed to mirror document: {err}"),
                }
                for activity in &activities {
                    if let Err(err) = mirror.log_activity(activity).await {
                        warn!("failed to mirror activity: {err}");
                    }
                }
            }
        });
        Self { sender }
    }

    pub fn send(&self, data: AppData, activities: Vec<Activity>) {
        if self.sender.send((data, activities)).is_err() {
            warn!("replication worker has stopped; snapshot dropped");
        }
    }
}
