//! # Prize Handler
//!
//! Serves a location holding one spawned object. Picking the object up runs
//! the court's validator; on success the object turns into the prize, goes
//! to the player and a fresh object spawns in its place.
//!
//! ```text
//!  request(object) ─→ current object? ─→ player has prize? ─→ validator
//!                                                                 │
//!      reply " " ←─ track winner ←─ owner := player ←─ prize ←─ respawn ←─ remove
//! ```
//!
//! Any rejection before the removal leaves every ledger untouched and is
//! answered with `error on pick up: <reason> - try again`. A failed respawn
//! is fatal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lw_01_ledger::{LedgerService, Transaction};
use lw_02_inventory::{InventoryLedger, ObjectLedger};
use lw_03_handlers::{attach_handler, ComponentLogger, Handler, HandlerError, SupportedMessages};
use shared_bus::Transport;
use shared_types::{GameMessage, LedgerId, MessageType, RequestObjectTransferMessage, Tip};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::domain::{
    winner_path, CourtError, FatalError, PrizeConfig, PrizeCounter, WinnerRecord, PRIZE_PATH,
};
use crate::ports::PrizeValidator;
use crate::response::ResponseSender;

/// Reply text of a successful pickup.
pub const PRIZE_SUCCESS_MESSAGE: &str = " ";

pub struct PrizeHandler {
    ledgers: Arc<dyn LedgerService>,
    transport: Arc<dyn Transport>,
    config: PrizeConfig,
    id: LedgerId,
    validator: Option<Arc<dyn PrizeValidator>>,
    spawn_lock: Mutex<()>,
    fatal: mpsc::Sender<FatalError>,
    log: ComponentLogger,
}

impl PrizeHandler {
    /// Open the handler ledger `<name>-prize-handler`.
    pub async fn new(
        ledgers: Arc<dyn LedgerService>,
        transport: Arc<dyn Transport>,
        config: PrizeConfig,
        validator: Option<Arc<dyn PrizeValidator>>,
        fatal: mpsc::Sender<FatalError>,
    ) -> Result<Self, CourtError> {
        let name = format!("{}-prize-handler", config.name);
        let ledger = ledgers.find_or_create_passphrase_ledger(&name).await?;
        if ledger.resolve(PRIZE_PATH).is_none() {
            ledgers
                .append_transactions(
                    &ledger.id,
                    vec![Transaction::set_data(PRIZE_PATH, &PrizeCounter::default())?],
                )
                .await?;
        }

        Ok(Self {
            ledgers,
            transport,
            config,
            id: ledger.id,
            validator,
            spawn_lock: Mutex::new(()),
            fatal,
            log: ComponentLogger::named(name),
        })
    }

    /// Serve the location and make sure an object is waiting there.
    pub async fn setup(&self) -> Result<(), CourtError> {
        attach_handler(self.ledgers.as_ref(), &self.config.location, &self.id).await?;
        self.spawn().instrument(self.log.span()).await?;
        Ok(())
    }

    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    pub fn config(&self) -> &PrizeConfig {
        &self.config
    }

    pub fn messages() -> SupportedMessages {
        SupportedMessages::new().with(MessageType::RequestObjectTransfer)
    }

    fn location(&self) -> InventoryLedger {
        InventoryLedger::new(self.ledgers.clone(), self.config.location.clone())
    }

    /// Spawned object currently at the location, empty when none.
    pub async fn current_object(&self) -> Result<LedgerId, CourtError> {
        Ok(self.location().did_for_name(&self.config.spawn.name).await?)
    }

    pub async fn prize_count(&self) -> Result<u64, CourtError> {
        let snapshot = self.ledgers.require_ledger(&self.id).await?;
        Ok(snapshot
            .resolve_as::<PrizeCounter>(PRIZE_PATH)?
            .unwrap_or_default()
            .count)
    }

    /// Put a new object at the location unless one is there.
    ///
    /// The object ledger is named by the location tip, so every node serving
    /// this court spawns the same object.
    pub async fn spawn(&self) -> Result<Option<LedgerId>, CourtError> {
        let _guard = self.spawn_lock.lock().await;

        let location = self.location();
        if !location.did_for_name(&self.config.spawn.name).await?.is_empty() {
            debug!(location = %self.config.location, "[lw-05] Object already spawned");
            return Ok(None);
        }

        let tip = location.snapshot().await?.tip;
        let ledger = self
            .ledgers
            .find_or_create_passphrase_ledger(&tip.to_hex())
            .await?;
        if ledger.height > 0 {
            ObjectLedger::new(self.ledgers.clone(), ledger.id.clone())
                .reset()
                .await?;
        }
        self.config
            .spawn
            .apply(self.ledgers.clone(), ledger.id.clone())
            .await?;
        location.add(&ledger.id).await?;

        info!(
            object = %ledger.id,
            location = %self.config.location,
            "[lw-05] Object spawned"
        );
        Ok(Some(ledger.id))
    }

    /// Re-run [`PrizeHandler::spawn`] every `every` until shutdown.
    pub fn start_backup_respawn(
        self: &Arc<Self>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let handler = Arc::clone(self);
        let span = self.log.span();
        tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(every);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = handler.spawn().await {
                                warn!(error = %e, "[lw-05] Backup respawn failed");
                            }
                        }
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                debug!("[lw-05] Backup respawn stopped");
            }
            .instrument(span),
        )
    }

    async fn handle_transfer(&self, request: &RequestObjectTransferMessage) -> Result<(), CourtError> {
        let current = self
            .current_object()
            .await
            .map_err(|e| rejected("could not fetch prize did", e))?;
        if request.object != current {
            return Err(CourtError::rejected("current object has changed"));
        }

        let player_inventory = InventoryLedger::new(self.ledgers.clone(), request.to.clone());
        let existing = player_inventory
            .did_for_name(&self.config.prize.name)
            .await
            .map_err(|e| rejected("could not fetch player inventory", e))?;
        if !existing.is_empty() {
            return Err(CourtError::rejected("prize already exists in player inventory"));
        }

        if let Some(validator) = &self.validator {
            match validator.validate(request).await {
                Ok(true) => {}
                Ok(false) => return Err(CourtError::rejected("could not validate: not valid")),
                Err(e) => return Err(CourtError::rejected(format!("could not validate: {e}"))),
            }
        }

        self.location()
            .remove(&request.object)
            .await
            .map_err(|e| rejected("could not remove object from location", e))?;

        self.spawn().await.map_err(|e| FatalError::RespawnFailed {
            component: self.log.name().to_string(),
            location: self.config.location.clone(),
            reason: e.to_string(),
        })?;

        let object = ObjectLedger::new(self.ledgers.clone(), request.object.clone());
        object
            .reset()
            .await
            .map_err(|e| rejected("generating prize failed", e))?;
        self.config
            .prize
            .apply(self.ledgers.clone(), request.object.clone())
            .await
            .map_err(|e| rejected("generating prize failed", e))?;

        let player_auths = self
            .ledgers
            .authentications(&request.to)
            .await
            .map_err(|e| rejected("could not fetch player authentications", e))?;
        let prize = object
            .change_owner(player_auths)
            .await
            .map_err(|e| rejected("could not update object ownership", e))?;

        let player_tip = self.ledgers.require_ledger(&request.to).await?.tip;
        self.track_prize_distribution(prize.tip, player_tip)
            .await
            .map_err(|e| CourtError::rejected(format!("could not distribute prize: {e}")))?;

        if let Some(validator) = &self.validator {
            if let Err(e) = validator.cleanup(request).await {
                error!(error = %e, "[lw-05] Error on cleanup");
            }
        }
        Ok(())
    }

    async fn track_prize_distribution(&self, prize: Tip, player: Tip) -> Result<u64, CourtError> {
        let n = self.prize_count().await? + 1;
        self.ledgers
            .append_transactions(
                &self.id,
                vec![
                    Transaction::set_data(PRIZE_PATH, &PrizeCounter { count: n })?,
                    Transaction::set_data(winner_path(n), &WinnerRecord { player, prize })?,
                ],
            )
            .await?;
        Ok(n)
    }
}

fn rejected(reason: &str, cause: impl std::fmt::Display) -> CourtError {
    debug!(reason, cause = %cause, "[lw-05] Pickup failed");
    CourtError::rejected(reason)
}

#[async_trait]
impl Handler for PrizeHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        let GameMessage::RequestObjectTransfer(request) = message else {
            return Err(HandlerError::UnsupportedMessageType);
        };

        async {
            let sender =
                ResponseSender::for_request(self.ledgers.as_ref(), self.transport.clone(), request)
                    .await;
            match self.handle_transfer(request).await {
                Ok(()) => {
                    info!(object = %request.object, to = %request.to, "[lw-05] Prize awarded");
                    sender.send(PRIZE_SUCCESS_MESSAGE).await
                }
                Err(CourtError::Fatal(fatal)) => {
                    error!(error = %fatal, "[lw-05] Respawn failed");
                    if self.fatal.send(fatal.clone()).await.is_err() {
                        error!("[lw-05] Fatal channel closed");
                    }
                    Err(CourtError::Fatal(fatal).into())
                }
                Err(e) => {
                    warn!(object = %request.object, to = %request.to, error = %e, "[lw-05] Pickup rejected");
                    sender
                        .reject(&format!("error on pick up: {e} - try again"))
                        .await;
                    Ok(())
                }
            }
        }
        .instrument(self.log.span())
        .await
    }

    async fn supported_messages(&self) -> SupportedMessages {
        Self::messages()
    }
}
