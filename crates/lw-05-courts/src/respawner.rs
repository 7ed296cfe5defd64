//! # Artifact Respawner
//!
//! Keeps exactly one artifact somewhere among the court's spawn locations.
//!
//! ```text
//!   respawner tip ──sha256──→ rng ──→ name, inscriptions, forger, location
//!                                          │
//!                                          ▼
//!            artifact ledger (passphrase = tip) ──→ location inventory
//!                                          │
//!               first commit on it ────────┘──→ spawn the next one
//! ```
//!
//! Every draw is seeded from the respawner's own tip, and every spawn moves
//! that tip, so nodes replaying the same history spawn the same artifacts.
//!
//! The spawn locations are served by an [`ArtifactSpawnHandler`], which
//! hands artifacts out through the ordinary remove handshake.

use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::{LedgerService, Transaction};
use lw_02_inventory::{create_object_on_ledger, InventoryLedger, ObjectLedger, HANDLER_PATH};
use lw_03_handlers::{attach_handler, ComponentLogger, Handler, HandlerError, SupportedMessages};
use lw_04_transfer::{TransferConfig, UnrestrictedRemoveHandler};
use serde_json::Value;
use shared_bus::Transport;
use shared_types::{GameMessage, LedgerId, Tip};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::domain::{
    generate_artifact, seed_from_tip, ArtifactSpawnConfig, CourtError, FatalError, LastSpawn,
    RESPAWN_LAST_PATH,
};

/// Serves the artifact spawn locations.
pub struct ArtifactSpawnHandler {
    id: LedgerId,
    remove: UnrestrictedRemoveHandler,
    log: ComponentLogger,
}

impl ArtifactSpawnHandler {
    /// Open the handler ledger `<court>-artifact-spawn-handler`.
    pub async fn new(
        ledgers: Arc<dyn LedgerService>,
        transport: Arc<dyn Transport>,
        transfer: TransferConfig,
        court: &str,
    ) -> Result<Self, CourtError> {
        let name = format!("{court}-artifact-spawn-handler");
        let ledger = ledgers.find_or_create_passphrase_ledger(&name).await?;
        Ok(Self {
            id: ledger.id,
            remove: UnrestrictedRemoveHandler::with_config(ledgers, transport, transfer),
            log: ComponentLogger::named(name),
        })
    }

    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    /// Attach to every location. A location served by some other handler is
    /// a conflict.
    pub async fn attach(
        &self,
        ledgers: &dyn LedgerService,
        locations: &[LedgerId],
    ) -> Result<(), CourtError> {
        for location in locations {
            match ledgers.resolve(location, HANDLER_PATH).await? {
                Some(Value::String(existing))
                    if !existing.is_empty() && existing != self.id.as_str() =>
                {
                    return Err(CourtError::HandlerConflict {
                        location: location.clone(),
                        existing,
                    });
                }
                _ => attach_handler(ledgers, location, &self.id).await?,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Handler for ArtifactSpawnHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        self.remove.handle(message).instrument(self.log.span()).await
    }

    async fn supported_messages(&self) -> SupportedMessages {
        UnrestrictedRemoveHandler::messages()
    }
}

/// A spawned artifact and the tip it had when it was put in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawned {
    pub record: LastSpawn,
    pub tip: Tip,
}

pub struct ArtifactRespawner {
    ledgers: Arc<dyn LedgerService>,
    config: ArtifactSpawnConfig,
    id: LedgerId,
    fatal: mpsc::Sender<FatalError>,
    log: ComponentLogger,
}

impl ArtifactRespawner {
    const PASSPHRASE: &'static str = "artifact-respawner";

    pub async fn new(
        ledgers: Arc<dyn LedgerService>,
        config: ArtifactSpawnConfig,
        fatal: mpsc::Sender<FatalError>,
    ) -> Result<Self, CourtError> {
        let ledger = ledgers
            .find_or_create_passphrase_ledger(Self::PASSPHRASE)
            .await?;
        Ok(Self {
            ledgers,
            config,
            id: ledger.id,
            fatal,
            log: ComponentLogger::named(Self::PASSPHRASE),
        })
    }

    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    /// The most recently spawned artifact, if any.
    pub async fn last_spawn(&self) -> Result<Option<LastSpawn>, CourtError> {
        let snapshot = self.ledgers.require_ledger(&self.id).await?;
        Ok(snapshot.resolve_as::<LastSpawn>(RESPAWN_LAST_PATH)?)
    }

    /// Draw and place the next artifact.
    pub async fn spawn(&self) -> Result<Spawned, CourtError> {
        let tip = self.ledgers.require_ledger(&self.id).await?.tip;
        let mut rng = seed_from_tip(tip.as_bytes());
        let artifact = generate_artifact(
            &mut rng,
            &self.config.pool,
            &self.config.forgers,
            &self.config.locations,
        )?;

        let ledger = self
            .ledgers
            .find_or_create_passphrase_ledger(&tip.to_hex())
            .await?;
        if ledger.height > 0 {
            ObjectLedger::new(self.ledgers.clone(), ledger.id.clone())
                .reset()
                .await?;
        }
        let object =
            create_object_on_ledger(self.ledgers.clone(), ledger.id.clone(), &artifact.name)
                .await?;
        for (key, value) in &artifact.inscriptions {
            object.set_inscription(key, value).await?;
        }
        let placed_tip = object.snapshot().await?.tip;

        InventoryLedger::new(self.ledgers.clone(), artifact.location.clone())
            .add(object.id())
            .await?;

        let record = LastSpawn {
            id: object.id().clone(),
            location: artifact.location,
        };
        self.ledgers
            .append_transactions(
                &self.id,
                vec![Transaction::set_data(RESPAWN_LAST_PATH, &record)?],
            )
            .await?;

        info!(
            artifact = %record.id,
            name = %artifact.name,
            location = %record.location,
            "[lw-05] Artifact spawned"
        );
        Ok(Spawned {
            record,
            tip: placed_tip,
        })
    }

    /// The last artifact when it still sits where it was put, else a new one.
    async fn current_or_spawn(&self) -> Result<Spawned, CourtError> {
        if let Some(last) = self.last_spawn().await? {
            let location = InventoryLedger::new(self.ledgers.clone(), last.location.clone());
            if location.exists(&last.id).await? {
                let tip = self.ledgers.require_ledger(&last.id).await?.tip;
                debug!(artifact = %last.id, "[lw-05] Reusing last artifact");
                return Ok(Spawned { record: last, tip });
            }
        }
        self.spawn().await
    }

    /// Make sure an artifact is out, then spawn the next one each time the
    /// current one is touched. Stops on shutdown or after a failed spawn,
    /// which is reported on the fatal channel.
    pub async fn start(
        self: &Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, CourtError> {
        let mut commits = self.ledgers.subscribe_commits();
        let mut watched = self.current_or_spawn().instrument(self.log.span()).await?;

        let respawner = Arc::clone(self);
        let span = self.log.span();
        Ok(tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        event = commits.recv() => match event {
                            Ok(event)
                                if event.id == watched.record.id
                                    && event.previous_tip == Some(watched.tip) =>
                            {
                                debug!(artifact = %event.id, "[lw-05] Artifact taken");
                                match respawner.spawn().await {
                                    Ok(next) => watched = next,
                                    Err(e) => {
                                        respawner.fail(&watched.record, e).await;
                                        break;
                                    }
                                }
                            }
                            Ok(_) => {}
                            Err(RecvError::Lagged(skipped)) => {
                                warn!(skipped, "[lw-05] Respawner fell behind on commits");
                            }
                            Err(RecvError::Closed) => break,
                        },
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                debug!("[lw-05] Respawner stopped");
            }
            .instrument(span),
        ))
    }

    async fn fail(&self, last: &LastSpawn, e: CourtError) {
        let fatal = FatalError::RespawnFailed {
            component: self.log.name().to_string(),
            location: last.location.clone(),
            reason: e.to_string(),
        };
        error!(error = %fatal, "[lw-05] Respawn failed");
        if self.fatal.send(fatal).await.is_err() {
            error!("[lw-05] Fatal channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactInscriptions, ArtifactSpec, ArtifactsConfig, FORGED_BY};
    use lw_01_ledger::InMemoryLedger;
    use lw_02_inventory::create_object;
    use shared_bus::InMemoryTransport;
    use shared_types::{Address, TransferredObjectMessage};
    use std::time::Duration;

    struct World {
        ledgers: Arc<InMemoryLedger>,
        locations: Vec<LedgerId>,
        fatal: mpsc::Receiver<FatalError>,
        fatal_tx: mpsc::Sender<FatalError>,
    }

    async fn world() -> World {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let mut locations = Vec::new();
        for name in ["north shrine", "south shrine"] {
            locations.push(ledgers.find_or_create_passphrase_ledger(name).await.unwrap().id);
        }
        let (fatal_tx, fatal) = mpsc::channel(4);
        World {
            ledgers,
            locations,
            fatal,
            fatal_tx,
        }
    }

    fn config(w: &World) -> ArtifactSpawnConfig {
        ArtifactSpawnConfig {
            court: "summer".into(),
            locations: w.locations.clone(),
            forgers: vec!["the smith".into(), "the tinker".into()],
            pool: ArtifactsConfig {
                artifacts: vec![ArtifactSpec {
                    origin_auth: Address::from("0xorigin"),
                    inscriptions: ArtifactInscriptions {
                        kind: "ring".into(),
                        material: "gold".into(),
                        age: "old".into(),
                        weight: "light".into(),
                        forged_by: "the smith".into(),
                    },
                }],
                names_pool: vec!["ring".into(), "crown".into()],
            },
        }
    }

    async fn respawner(w: &World, config: ArtifactSpawnConfig) -> Arc<ArtifactRespawner> {
        Arc::new(
            ArtifactRespawner::new(w.ledgers.clone(), config, w.fatal_tx.clone())
                .await
                .unwrap(),
        )
    }

    async fn wait_for_new_spawn(respawner: &ArtifactRespawner, previous: &LedgerId) -> LastSpawn {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(last) = respawner.last_spawn().await.unwrap() {
                    if &last.id != previous {
                        return last;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_spawn_follows_respawner_tip() {
        let w = world().await;
        let respawner = respawner(&w, config(&w)).await;
        let tip = w.ledgers.require_ledger(respawner.id()).await.unwrap().tip;
        let cfg = config(&w);
        let mut rng = seed_from_tip(tip.as_bytes());
        let expected = generate_artifact(&mut rng, &cfg.pool, &cfg.forgers, &cfg.locations).unwrap();

        let spawned = respawner.spawn().await.unwrap();

        assert_eq!(spawned.record.location, expected.location);
        let artifact = ObjectLedger::new(w.ledgers.clone(), spawned.record.id.clone());
        assert_eq!(artifact.name().await.unwrap(), expected.name);
        assert_eq!(artifact.inscriptions().await.unwrap(), expected.inscriptions);
        assert!(artifact.inscriptions().await.unwrap().contains_key(FORGED_BY));
        assert!(InventoryLedger::new(w.ledgers.clone(), expected.location.clone())
            .exists(&spawned.record.id)
            .await
            .unwrap());
        assert_eq!(respawner.last_spawn().await.unwrap(), Some(spawned.record));
    }

    #[tokio::test]
    async fn test_touching_the_artifact_spawns_the_next() {
        let w = world().await;
        let respawner = respawner(&w, config(&w)).await;
        let (_shutdown_tx, shutdown) = watch::channel(false);
        let task = respawner.start(shutdown).await.unwrap();

        let first = respawner.last_spawn().await.unwrap().unwrap();
        w.ledgers
            .set_ownership(
                &first.id,
                vec![w.ledgers.node_address(), Address::from("0xplayer")],
            )
            .await
            .unwrap();

        let second = wait_for_new_spawn(&respawner, &first.id).await;
        assert_ne!(second.id, first.id);
        assert!(!task.is_finished());
    }

    #[tokio::test]
    async fn test_start_reuses_artifact_still_in_place() {
        let w = world().await;
        let first = respawner(&w, config(&w)).await;
        let spawned = first.spawn().await.unwrap();

        let restarted = respawner(&w, config(&w)).await;
        let (shutdown_tx, shutdown) = watch::channel(false);
        let task = restarted.start(shutdown).await.unwrap();

        assert_eq!(restarted.last_spawn().await.unwrap(), Some(spawned.record));
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_respawn_is_fatal() {
        let mut w = world().await;
        let mut broken = config(&w);
        broken.pool.names_pool = vec!["bad/name".into()];
        let respawner = respawner(&w, broken).await;

        let placed = create_object(w.ledgers.clone(), "artifact-ring").await.unwrap();
        InventoryLedger::new(w.ledgers.clone(), w.locations[0].clone())
            .add(placed.id())
            .await
            .unwrap();
        let record = LastSpawn {
            id: placed.id().clone(),
            location: w.locations[0].clone(),
        };
        w.ledgers
            .append_transactions(
                respawner.id(),
                vec![Transaction::set_data(RESPAWN_LAST_PATH, &record).unwrap()],
            )
            .await
            .unwrap();

        let (_shutdown_tx, shutdown) = watch::channel(false);
        let task = respawner.start(shutdown).await.unwrap();
        placed.set_description("taken").await.unwrap();

        let fatal = tokio::time::timeout(Duration::from_secs(1), w.fatal.recv())
            .await
            .unwrap()
            .unwrap();
        let FatalError::RespawnFailed { location, .. } = fatal;
        assert_eq!(location, w.locations[0]);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_spawn_handler_refuses_foreign_locations() {
        let w = world().await;
        let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
        let handler = ArtifactSpawnHandler::new(
            w.ledgers.clone(),
            transport,
            TransferConfig::default(),
            "summer",
        )
        .await
        .unwrap();

        handler.attach(w.ledgers.as_ref(), &w.locations).await.unwrap();
        handler.attach(w.ledgers.as_ref(), &w.locations).await.unwrap();
        assert_eq!(
            w.ledgers.resolve(&w.locations[0], HANDLER_PATH).await.unwrap(),
            Some(serde_json::json!(handler.id().as_str()))
        );

        let taken = w.ledgers.find_or_create_passphrase_ledger("taken").await.unwrap();
        attach_handler(w.ledgers.as_ref(), &taken.id, &"did:world:0xother".into())
            .await
            .unwrap();
        let err = handler.attach(w.ledgers.as_ref(), &[taken.id]).await.unwrap_err();
        assert!(matches!(err, CourtError::HandlerConflict { .. }));
    }

    #[tokio::test]
    async fn test_spawn_handler_only_hands_out() {
        let w = world().await;
        let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
        let handler = ArtifactSpawnHandler::new(
            w.ledgers.clone(),
            transport,
            TransferConfig::default(),
            "summer",
        )
        .await
        .unwrap();

        let notice = TransferredObjectMessage {
            from: w.locations[0].clone(),
            to: w.locations[1].clone(),
            object: "did:world:0xobject".into(),
            message: String::new(),
            error: String::new(),
        };
        assert!(handler.handle(&notice.into()).await.is_err());
        assert!(handler
            .supported_messages()
            .await
            .contains(shared_types::MessageType::RequestObjectTransfer));
    }
}
