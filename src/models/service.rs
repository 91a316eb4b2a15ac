use std::{sync::Arc, thread};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;

use crate::core::error::LoadError;
use crate::core::events::{EventSink, LoadEvent};
use crate::core::sequencer::{LoadRequest, LoadSequencer, LoadedModel};

pub type LoadResult = Result<LoadedModel, LoadError>;

struct LoadJob {
    request: LoadRequest,
    reply: oneshot::Sender<LoadResult>,
}

/// Completion handle for one queued load.
#[derive(Debug)]
pub struct LoadTicket {
    receiver: oneshot::Receiver<LoadResult>,
}

impl LoadTicket {
    /// Blocks the calling thread. Must not be called from inside an async runtime.
    pub fn wait(self) -> LoadResult {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(LoadError::ServiceStopped))
    }

    pub async fn completion(self) -> LoadResult {
        self.receiver
            .await
            .unwrap_or(Err(LoadError::ServiceStopped))
    }
}

/// Serializes loads onto one worker thread. When several requests are waiting,
/// only the newest runs; the others resolve as superseded.
#[derive(Debug)]
pub struct LoadService {
    sender: Sender<LoadJob>,
    inflight: Arc<Inflight>,
}

impl Clone for LoadService {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            inflight: self.inflight.clone(),
        }
    }
}

/// Count of queued plus running jobs.
#[derive(Debug, Default)]
struct Inflight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Inflight {
    fn begin(&self) {
        *self.count.lock() += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

impl std::fmt::Debug for LoadJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadJob")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl LoadService {
    pub fn new(sequencer: Arc<LoadSequencer>, events: Arc<dyn EventSink>) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let inflight = Arc::new(Inflight::default());
        let worker_inflight = inflight.clone();
        thread::Builder::new()
            .name("gltf-load-worker".into())
            .spawn(move || worker_loop(receiver, sequencer, events, worker_inflight))
            .context("spawn load worker")?;
        Ok(Self { sender, inflight })
    }

    pub fn queue(&self, request: LoadRequest) -> Result<LoadTicket, LoadError> {
        let (reply, receiver) = oneshot::channel();
        self.inflight.begin();
        if self.sender.send(LoadJob { request, reply }).is_err() {
            self.inflight.finish();
            return Err(LoadError::ServiceStopped);
        }
        Ok(LoadTicket { receiver })
    }

    /// Blocks until every queued job has completed or been superseded.
    pub fn wait_idle(&self) {
        let mut count = self.inflight.count.lock();
        while *count > 0 {
            self.inflight.idle.wait(&mut count);
        }
    }
}

fn worker_loop(
    receiver: Receiver<LoadJob>,
    sequencer: Arc<LoadSequencer>,
    events: Arc<dyn EventSink>,
    inflight: Arc<Inflight>,
) {
    for mut job in receiver.iter() {
        for newer in receiver.try_iter() {
            supersede(job, events.as_ref());
            inflight.finish();
            job = newer;
        }

        let result = sequencer.load_model(&job.request);
        if let Err(error) = &result {
            tracing::debug!("Load of {} ended with: {error}", job.request.source_url);
        }
        // The caller may have dropped its ticket.
        let _ = job.reply.send(result);
        inflight.finish();
    }
    tracing::debug!("Load worker stopped");
}

fn supersede(job: LoadJob, events: &dyn EventSink) {
    let url = job.request.source_url;
    events.emit(&LoadEvent::RequestSuperseded { url: url.clone() });
    let _ = job.reply.send(Err(LoadError::Superseded { url }));
}
