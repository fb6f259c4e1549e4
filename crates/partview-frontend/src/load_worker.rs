//! Background document loading.
//!
//! Every request runs on its own thread and reports back through a channel
//! that the app drains at the start of each frame. Stale results are filtered
//! by the viewer, not here.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use partview_core::{DocumentSource, LoadError, LoadTicket, LoadedAsset, load_document};

/// Outcome of one load request
pub struct LoadResult {
    pub ticket: LoadTicket,
    pub result: Result<LoadedAsset, LoadError>,
}

/// Callback used to wake the UI when a result arrives
pub type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct LoadWorker {
    source: Arc<dyn DocumentSource>,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    notify: Notify,
}

impl LoadWorker {
    pub fn new(source: Arc<dyn DocumentSource>, notify: Notify) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            source,
            sender,
            receiver,
            notify,
        }
    }

    /// Start loading the ticket's document in the background.
    pub fn spawn(&self, ticket: LoadTicket) -> std::io::Result<()> {
        let source = self.source.clone();
        let sender = self.sender.clone();
        let notify = self.notify.clone();

        std::thread::Builder::new()
            .name(format!("partview-load-{}", ticket.id))
            .spawn(move || {
                let result = load_document(source.as_ref(), &ticket.reference);
                if sender.send(LoadResult { ticket, result }).is_err() {
                    tracing::debug!("Load finished after the app shut down");
                    return;
                }
                notify();
            })?;
        Ok(())
    }

    /// Results that arrived since the last call, in arrival order.
    pub fn drain(&self) -> Vec<LoadResult> {
        self.receiver.try_iter().collect()
    }
}
