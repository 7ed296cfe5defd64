//! # Service Mailboxes
//!
//! A [`ServiceActor`] serves exactly one ledger id. It is one tokio task
//! reading from two sources: its mpsc mailbox and the transport topic of
//! its ledger. Messages are handled strictly one after another.
//!
//! ```text
//!  transport topic (ledger id) ──┐
//!                                ├──→ [ServiceActor task] ──→ Handler
//!  ServiceHandle::send ──mpsc────┘          │
//!                                           └── supports / id queries
//! ```
//!
//! On start the actor writes its handler's supported messages to
//! `world/handler/supports` on its ledger, so registry lookups see what it
//! accepts. Handler errors are logged and never stop the loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lw_01_ledger::LedgerService;
use lw_02_inventory::HANDLER_SUPPORTS_PATH;
use parking_lot::{Mutex, RwLock};
use shared_bus::{topic_for, Subscription, Transport};
use shared_types::{GameMessage, LedgerId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::domain::{HandlerError, SupportedMessages};
use crate::handlers::LocalHandler;
use crate::logger::ComponentLogger;
use crate::ports::Handler;

/// Mailbox depth per service.
pub const MAILBOX_CAPACITY: usize = 256;

/// What a mailbox accepts.
#[derive(Debug)]
pub enum ServiceCommand {
    /// Handle a message.
    Deliver(GameMessage),
    /// Reply with the handler's supported messages.
    GetSupportedMessages(oneshot::Sender<SupportedMessages>),
    /// Reply with the served ledger id.
    GetServiceId(oneshot::Sender<LedgerId>),
}

/// Cloneable address of a running service.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    id: LedgerId,
    sender: mpsc::Sender<ServiceCommand>,
}

impl ServiceHandle {
    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    /// Queue a message. Returns once it is in the mailbox.
    pub async fn send(&self, message: GameMessage) -> Result<(), HandlerError> {
        self.sender
            .send(ServiceCommand::Deliver(message))
            .await
            .map_err(|_| HandlerError::MailboxClosed(self.id.clone()))
    }

    pub async fn supported_messages(
        &self,
        timeout: Duration,
    ) -> Result<SupportedMessages, HandlerError> {
        self.ask(ServiceCommand::GetSupportedMessages, timeout).await
    }

    pub async fn service_id(&self, timeout: Duration) -> Result<LedgerId, HandlerError> {
        self.ask(ServiceCommand::GetServiceId, timeout).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn ask<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ServiceCommand,
        timeout: Duration,
    ) -> Result<T, HandlerError> {
        let (reply, answer) = oneshot::channel();
        let closed = || HandlerError::MailboxClosed(self.id.clone());

        tokio::time::timeout(timeout, async {
            self.sender.send(command(reply)).await.map_err(|_| closed())?;
            answer.await.map_err(|_| closed())
        })
        .await
        .map_err(|_| HandlerError::Timeout(timeout))?
    }
}

/// One handler serving one ledger id.
pub struct ServiceActor {
    id: LedgerId,
    handler: Arc<dyn Handler>,
    ledgers: Arc<dyn LedgerService>,
    transport: Arc<dyn Transport>,
    mailbox: mpsc::Receiver<ServiceCommand>,
    log: ComponentLogger,
}

impl ServiceActor {
    /// Create the actor and its handle. Nothing runs until [`ServiceActor::start`].
    pub fn new(
        id: LedgerId,
        handler: Arc<dyn Handler>,
        ledgers: Arc<dyn LedgerService>,
        transport: Arc<dyn Transport>,
    ) -> (Self, ServiceHandle) {
        let (sender, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
        let log = ComponentLogger::named("service").child(&id);
        let handle = ServiceHandle {
            id: id.clone(),
            sender,
        };
        let actor = Self {
            id,
            handler,
            ledgers,
            transport,
            mailbox,
            log,
        };
        (actor, handle)
    }

    /// Declare capabilities, subscribe to the ledger topic and spawn the loop.
    pub async fn start(
        self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, HandlerError> {
        let supported = self.handler.supported_messages().await;
        self.ledgers
            .set_data(
                &self.id,
                HANDLER_SUPPORTS_PATH,
                serde_json::to_value(&supported).map_err(lw_01_ledger::LedgerError::from)?,
            )
            .await?;

        let subscription = self.transport.subscribe(&topic_for(&self.id));
        let span = self.log.span();
        info!(
            parent: &span,
            service = %self.id,
            supported = ?supported.names(),
            "[lw-03] Service started"
        );
        Ok(tokio::spawn(
            self.run(subscription, shutdown).instrument(span),
        ))
    }

    async fn run(mut self, mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                command = self.mailbox.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => {
                        debug!(service = %self.id, "[lw-03] All handles dropped");
                        break;
                    }
                },
                envelope = subscription.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope.message).await,
                    None => {
                        warn!(service = %self.id, "[lw-03] Transport subscription closed");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(service = %self.id, "[lw-03] Service stopped");
    }

    async fn on_command(&self, command: ServiceCommand) {
        match command {
            ServiceCommand::Deliver(message) => self.dispatch(message).await,
            ServiceCommand::GetSupportedMessages(reply) => {
                let _ = reply.send(self.handler.supported_messages().await);
            }
            ServiceCommand::GetServiceId(reply) => {
                let _ = reply.send(self.id.clone());
            }
        }
    }

    async fn dispatch(&self, message: GameMessage) {
        let message_type = message.message_type();
        debug!(service = %self.id, %message_type, object = %message.object(), "[lw-03] Handling");
        if let Err(e) = self.handler.handle(&message).await {
            error!(
                service = %self.id,
                %message_type,
                error = %e,
                "[lw-03] Handler failed"
            );
        }
    }
}

/// Running services by ledger id. At most one per id.
pub struct ServiceRegistry {
    ledgers: Arc<dyn LedgerService>,
    transport: Arc<dyn Transport>,
    shutdown: watch::Receiver<bool>,
    services: RwLock<HashMap<LedgerId, ServiceHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ServiceRegistry {
    pub fn new(
        ledgers: Arc<dyn LedgerService>,
        transport: Arc<dyn Transport>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            ledgers,
            transport,
            shutdown,
            services: RwLock::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start `handler` as the service for `id`.
    ///
    /// Fails with `DuplicateService` while another service for `id` runs.
    pub async fn start_service(
        &self,
        id: LedgerId,
        handler: Arc<dyn Handler>,
    ) -> Result<ServiceHandle, HandlerError> {
        let (actor, handle) = ServiceActor::new(
            id.clone(),
            handler,
            self.ledgers.clone(),
            self.transport.clone(),
        );

        {
            let mut services = self.services.write();
            if services.get(&id).is_some_and(|h| !h.is_closed()) {
                return Err(HandlerError::DuplicateService(id));
            }
            services.insert(id.clone(), handle.clone());
        }

        match actor.start(self.shutdown.clone()).await {
            Ok(task) => {
                self.tasks.lock().push(task);
                Ok(handle)
            }
            Err(e) => {
                self.services.write().remove(&id);
                Err(e)
            }
        }
    }

    pub fn get(&self, id: &LedgerId) -> Option<ServiceHandle> {
        self.services.read().get(id).cloned()
    }

    /// In-process handler for a running service.
    pub fn local_handler(&self, id: &LedgerId, supports_timeout: Duration) -> Option<LocalHandler> {
        self.get(id)
            .map(|handle| LocalHandler::with_timeout(handle, supports_timeout))
    }

    pub fn ids(&self) -> Vec<LedgerId> {
        self.services.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Wait for every service task to finish. Call after signalling shutdown.
    pub async fn join_all(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "[lw-03] Service task panicked");
            }
        }
    }
}
