//! Queue domain service.
//!
//! Loads one directory snapshot and ranks it with the service clock's idea of
//! "now". The snapshot may be stale by the time it is rendered.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{QueueQuery, UserDirectoryError, UserDirectoryRepository};
use crate::domain::{Error, QueueEntry, UserId, rank_queue};

fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        other => Error::internal(format!("user directory error: {other}")),
    }
}

/// Queue service implementing the queue driving port.
#[derive(Clone)]
pub struct QueueService<D> {
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<D> QueueService<D> {
    /// Create a queue service over the user directory.
    pub fn new(directory: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self { directory, clock }
    }
}

#[async_trait]
impl<D> QueueQuery for QueueService<D>
where
    D: UserDirectoryRepository,
{
    async fn purchase_queue(
        &self,
        current_user: Option<UserId>,
    ) -> Result<Vec<QueueEntry>, Error> {
        let candidates = self
            .directory
            .queue_snapshot()
            .await
            .map_err(map_directory_error)?;
        Ok(rank_queue(candidates, self.clock.utc(), current_user))
    }
}
