//! UI-side half of the IPC transport

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A single invocation travelling from a UI context to the host
#[derive(Debug)]
pub struct IpcRequest {
    pub id: Uuid,
    pub sender: Uuid,
    pub channel: String,
    pub args: Vec<Value>,
    pub(crate) reply: oneshot::Sender<Result<Value>>,
}

/// Host-side end of a window's transport
pub type IpcReceiver = mpsc::UnboundedReceiver<IpcRequest>;

/// Client used by UI code to invoke host handlers
#[derive(Debug, Clone)]
pub struct IpcRenderer {
    sender: Uuid,
    tx: mpsc::UnboundedSender<IpcRequest>,
}

/// Create the transport pair for one UI context
pub fn channel(sender: Uuid) -> (IpcRenderer, IpcReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (IpcRenderer { sender, tx }, rx)
}

impl IpcRenderer {
    /// Id of the window this client belongs to
    pub fn sender_id(&self) -> Uuid {
        self.sender
    }

    /// Invoke `channel` on the host and wait for its single result
    pub async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value> {
        let (reply, response) = oneshot::channel();
        let request = IpcRequest {
            id: Uuid::new_v4(),
            sender: self.sender,
            channel: channel.to_string(),
            args,
            reply,
        };
        trace!(channel, request_id = %request.id, "ipc invoke");

        self.tx.send(request).map_err(|_| Error::TransportClosed)?;
        response.await.map_err(|_| Error::TransportClosed)?
    }

    /// Whether the host end is still listening
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}
