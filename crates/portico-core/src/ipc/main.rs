//! Host-side handler registry

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::renderer::{IpcReceiver, IpcRequest};
use crate::error::{Error, Result};

/// Metadata about the caller of a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeEvent {
    pub sender_id: Uuid,
    pub request_id: Uuid,
}

type Handler = Arc<dyn Fn(InvokeEvent, Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Registry of channel handlers living in the host process
#[derive(Default)]
pub struct IpcMain {
    handlers: RwLock<HashMap<String, Handler>>,
}

impl std::fmt::Debug for IpcMain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcMain")
            .field("channels", &self.channels())
            .finish()
    }
}

impl IpcMain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `channel`. Only one handler per channel is allowed.
    pub fn handle<F, Fut>(&self, channel: &str, handler: F) -> Result<()>
    where
        F: Fn(InvokeEvent, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| Error::Other("IPC handler registry poisoned".to_string()))?;

        if handlers.contains_key(channel) {
            return Err(Error::HandlerAlreadyRegistered(channel.to_string()));
        }

        let handler: Handler = Arc::new(move |event, args| handler(event, args).boxed());
        handlers.insert(channel.to_string(), handler);
        debug!(channel, "registered ipc handler");
        Ok(())
    }

    /// Remove the handler for `channel`, returning whether one existed
    pub fn remove_handler(&self, channel: &str) -> bool {
        match self.handlers.write() {
            Ok(mut handlers) => handlers.remove(channel).is_some(),
            Err(_) => false,
        }
    }

    /// Registered channel names, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.handlers.read() {
            Ok(handlers) => handlers.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Run the handler for `channel` in its own task and wait for the result.
    ///
    /// Handler failures, including panics, come back as [`Error::RemoteCall`]
    /// and never take down the host.
    pub async fn dispatch(&self, event: InvokeEvent, channel: &str, args: Vec<Value>) -> Result<Value> {
        let handler = {
            let handlers = self
                .handlers
                .read()
                .map_err(|_| Error::Other("IPC handler registry poisoned".to_string()))?;
            handlers
                .get(channel)
                .cloned()
                .ok_or_else(|| Error::NoHandler(channel.to_string()))?
        };

        let outcome = tokio::spawn(handler(event, args)).await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(channel, error = %e, "ipc handler failed");
                Err(Error::RemoteCall {
                    channel: channel.to_string(),
                    message: e.to_string(),
                })
            }
            Err(join) => {
                warn!(channel, error = %join, "ipc handler panicked");
                Err(Error::RemoteCall {
                    channel: channel.to_string(),
                    message: "handler panicked".to_string(),
                })
            }
        }
    }

    /// Service requests from one UI context until its transport closes
    pub fn serve(self: &Arc<Self>, mut receiver: IpcReceiver) -> JoinHandle<()> {
        let ipc = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let ipc = Arc::clone(&ipc);
                tokio::spawn(async move {
                    let IpcRequest {
                        id,
                        sender,
                        channel,
                        args,
                        reply,
                    } = request;
                    let event = InvokeEvent {
                        sender_id: sender,
                        request_id: id,
                    };
                    let outcome = ipc.dispatch(event, &channel, args).await;
                    let _ = reply.send(outcome);
                });
            }
            debug!("ipc transport closed");
        })
    }
}
