//! Background worker executing accepted soft-delete requests.
//!
//! Handlers enqueue a [`DeleteRequest`] and answer immediately; the worker applies it
//! later through [`LinkRepository::soft_delete`]. Failures are logged and not retried.
//! The queue is unbounded, so a slow backend grows the backlog instead of stalling
//! the request that submits to it.
//!
//! On shutdown the queue is closed, requests already accepted are drained, and only
//! then does the worker exit, so an orderly stop never abandons an accepted delete.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::entities::OwnerId;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// One accepted request to soft-delete a set of codes for an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub codes: Vec<String>,
    pub owner_id: OwnerId,
}

/// Sending side of the delete queue, cheap to clone into every request handler.
#[derive(Debug, Clone)]
pub struct DeleteQueue {
    sender: mpsc::UnboundedSender<DeleteRequest>,
}

impl DeleteQueue {
    /// Hands a request to the worker without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the worker has been shut down.
    pub fn submit(&self, request: DeleteRequest) -> Result<(), AppError> {
        self.sender.send(request).map_err(|_| {
            AppError::internal(
                "Delete queue is closed",
                json!({ "reason": "worker stopped" }),
            )
        })
    }

    /// Returns true once the worker stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Owner of the running worker task.
pub struct DeleteWorker {
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl DeleteWorker {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn<R>(repository: Arc<R>) -> (DeleteQueue, DeleteWorker)
    where
        R: LinkRepository + ?Sized + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();

        let join = tokio::spawn(run_delete_worker(receiver, shutdown_rx, repository));

        (DeleteQueue { sender }, DeleteWorker { shutdown, join })
    }

    /// Stops accepting requests, drains the queue and waits for the worker to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.join.await {
            error!(error = %e, "Delete worker terminated abnormally");
        }
    }
}

/// Processes delete requests until shutdown is signalled or every sender is gone.
pub async fn run_delete_worker<R>(
    mut rx: mpsc::UnboundedReceiver<DeleteRequest>,
    mut shutdown: oneshot::Receiver<()>,
    repository: Arc<R>,
) where
    R: LinkRepository + ?Sized,
{
    info!("Delete worker started");

    loop {
        tokio::select! {
            biased;
            request = rx.recv() => match request {
                Some(request) => process(repository.as_ref(), request).await,
                None => break,
            },
            _ = &mut shutdown => {
                rx.close();
                let mut drained = 0usize;
                while let Some(request) = rx.recv().await {
                    process(repository.as_ref(), request).await;
                    drained += 1;
                }
                info!(drained, "Delete queue drained");
                break;
            }
        }
    }

    info!("Delete worker stopped");
}

async fn process<R>(repository: &R, request: DeleteRequest)
where
    R: LinkRepository + ?Sized,
{
    match repository
        .soft_delete(&request.codes, &request.owner_id)
        .await
    {
        Ok(affected) => debug!(
            owner_id = %request.owner_id,
            requested = request.codes.len(),
            affected,
            "Soft delete applied"
        ),
        Err(e) => error!(
            owner_id = %request.owner_id,
            codes = ?request.codes,
            error = %e,
            "Soft delete failed"
        ),
    }
}
