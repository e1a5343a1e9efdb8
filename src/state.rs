use crate::competition::CompetitionError;
use crate::errors::AppError;
use crate::models::AppData;
use crate::remote::{RemoteMirror, Replicator};
use crate::storage::persist_data;
use chrono::{DateTime, Local};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub mirror: Option<Arc<RemoteMirror>>,
    replicator: Option<Replicator>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData, mirror: Option<Arc<RemoteMirror>>) -> Self {
        let replicator = mirror.as_ref().map(|mirror| Replicator::spawn(Arc::clone(mirror)));
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            mirror,
            replicator,
        }
    }

    /// Applies `change` to a copy under the lock and commits it only once the
    /// local file is written, then queues it for the remote mirror.
    pub async fn mutate<T, F>(&self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut AppData, DateTime<Local>) -> Result<T, CompetitionError>,
    {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let output = change(&mut next, Local::now())?;
        let activities = std::mem::take(&mut next.pending_activities);

        persist_data(&self.data_path, &next).await?;
        *data = next;

        if let Some(replicator) = &self.replicator {
            replicator.send(data.clone(), activities);
        }
        Ok(output)
    }
}
