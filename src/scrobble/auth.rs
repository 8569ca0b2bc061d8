//! Desktop auth flow as a background task.
//!
//! Get a token, show the approval URL, then poll `auth.getSession` until the
//! user approves, the caller cancels, or the deadline passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::ScrobbleError;
use super::service::{ScrobbleService, SessionPoll};

#[derive(Debug)]
pub enum AuthEvent {
    /// Show this URL; the user approves access there.
    AwaitingApproval { url: String },
    Authorized { user: String },
    Failed(ScrobbleError),
    Cancelled,
}

impl AuthEvent {
    /// Whether the task is over once this event is seen.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthEvent::AwaitingApproval { .. })
    }
}

pub struct AuthTask {
    service: Arc<dyn ScrobbleService>,
    retry_interval: Duration,
    timeout: Duration,
}

/// Owned by whoever started the login. Dropping it cancels the task.
pub struct AuthHandle {
    cancel: CancellationToken,
    events: UnboundedReceiver<AuthEvent>,
    task: JoinHandle<()>,
}

impl AuthHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next event if one is ready; never blocks.
    pub fn try_next(&mut self) -> Option<AuthEvent> {
        self.events.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<AuthEvent> {
        self.events.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AuthHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl AuthTask {
    pub fn new(service: Arc<dyn ScrobbleService>, retry_interval: Duration, timeout: Duration) -> Self {
        Self {
            service,
            retry_interval,
            timeout,
        }
    }

    pub fn spawn(self, runtime: &Handle) -> AuthHandle {
        let cancel = CancellationToken::new();
        let (tx, events) = mpsc::unbounded_channel();

        let token = cancel.clone();
        let task = runtime.spawn(async move {
            let last = self.run(&tx, token).await;
            match &last {
                AuthEvent::Authorized { user } => info!(user = %user, "Last.fm authorized"),
                AuthEvent::Failed(e) => warn!(error = %e, "Last.fm authorization failed"),
                _ => debug!(event = ?last, "Last.fm authorization ended"),
            }
            let _ = tx.send(last);
        });

        AuthHandle {
            cancel,
            events,
            task,
        }
    }

    async fn run(self, tx: &UnboundedSender<AuthEvent>, cancel: CancellationToken) -> AuthEvent {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return AuthEvent::Cancelled,
            _ = &mut deadline => return AuthEvent::Failed(ScrobbleError::Timeout),
            r = self.service.begin_auth() => match r {
                Ok(t) => t,
                Err(e) => return AuthEvent::Failed(e),
            },
        };
        let _ = tx.send(AuthEvent::AwaitingApproval {
            url: token.url.clone(),
        });

        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return AuthEvent::Cancelled,
                _ = &mut deadline => return AuthEvent::Failed(ScrobbleError::Timeout),
                r = self.service.poll_session(&token.token) => r,
            };

            match polled {
                Ok(SessionPoll::Authorized(session)) => {
                    return match self.service.persist_token(&session) {
                        Ok(()) => AuthEvent::Authorized { user: session.name },
                        Err(e) => AuthEvent::Failed(e),
                    };
                }
                Ok(SessionPoll::Pending) => debug!("token not approved yet"),
                Err(e) => return AuthEvent::Failed(e),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return AuthEvent::Cancelled,
                _ = &mut deadline => return AuthEvent::Failed(ScrobbleError::Timeout),
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }
}
