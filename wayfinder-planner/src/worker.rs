//! Mailbox task that owns a [`Session`] and runs its commands one at a time.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::map::MapSurface;
use crate::session::{Session, SessionError, SessionSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCmd {
    Submit(String),
    Reevaluate,
}

/// Address of a running session worker.
///
/// A command is refused with [`SessionError::Busy`] while the previous one
/// is still being handled; nothing queues behind an outstanding request.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCmd>,
    busy: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn submit(&self, prompt: impl Into<String>) -> Result<(), SessionError> {
        self.dispatch(SessionCmd::Submit(prompt.into()))
    }

    pub fn reevaluate(&self) -> Result<(), SessionError> {
        self.dispatch(SessionCmd::Reevaluate)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn dispatch(&self, cmd: SessionCmd) -> Result<(), SessionError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(?cmd, "session.command.refused");
            return Err(SessionError::Busy);
        }
        if let Err(err) = self.tx.try_send(cmd) {
            self.busy.store(false, Ordering::Release);
            tracing::warn!(error = %err, "session.command.undeliverable");
            return Err(SessionError::Busy);
        }
        Ok(())
    }
}

/// Spawn the worker. It stops once every [`SessionHandle`] is dropped.
pub fn spawn_session<S, M>(mut session: Session<S, M>) -> (SessionHandle, JoinHandle<()>)
where
    S: SessionSink + 'static,
    M: MapSurface + 'static,
{
    let (tx, mut rx) = mpsc::channel::<SessionCmd>(1);
    let busy = Arc::new(AtomicBool::new(false));
    let handle = SessionHandle {
        tx,
        busy: busy.clone(),
    };

    let task = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let result = match &cmd {
                SessionCmd::Submit(prompt) => session.submit(prompt).await,
                SessionCmd::Reevaluate => session.reevaluate().await,
            };
            match result {
                Ok(locations) => {
                    tracing::info!(?cmd, markers = locations.len(), "session.command.done")
                }
                Err(err) => tracing::info!(?cmd, error = %err, "session.command.rejected"),
            }
            busy.store(false, Ordering::Release);
        }
        tracing::debug!("session.worker.stopped");
    });

    (handle, task)
}
