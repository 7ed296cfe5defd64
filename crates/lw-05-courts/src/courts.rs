//! Starts every court described by the loaded content.

use std::sync::Arc;

use lw_01_ledger::LedgerService;
use lw_03_handlers::{Handler, ServiceRegistry};
use lw_04_transfer::TransferConfig;
use shared_bus::Transport;
use shared_types::LedgerId;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::altar::AltarValidator;
use crate::domain::{
    ArtifactSpawnConfig, CourtContent, CourtError, CourtsConfig, ElementCombinerConfig,
    FatalError, PrizeConfig, ValidatorConfig,
};
use crate::element_combiner::ElementCombinerHandler;
use crate::element_prize::ElementPrizeValidator;
use crate::pedestal::PedestalValidator;
use crate::ports::PrizeValidator;
use crate::prize::PrizeHandler;
use crate::respawner::{ArtifactRespawner, ArtifactSpawnHandler};

/// Shared wiring handed to each court as it starts.
pub struct CourtContext<'a> {
    pub ledgers: Arc<dyn LedgerService>,
    pub transport: Arc<dyn Transport>,
    pub registry: &'a ServiceRegistry,
    pub shutdown: watch::Receiver<bool>,
    pub fatal: mpsc::Sender<FatalError>,
    pub config: CourtsConfig,
    pub transfer: TransferConfig,
}

/// Running courts: their handler ids and background tasks.
pub struct Courts {
    handlers: Vec<LedgerId>,
    tasks: Vec<JoinHandle<()>>,
}

impl Courts {
    pub async fn start(ctx: CourtContext<'_>, content: CourtContent) -> Result<Self, CourtError> {
        content.validate()?;
        let mut courts = Courts {
            handlers: Vec::new(),
            tasks: Vec::new(),
        };

        for combiner in content.element_combiners {
            courts.start_combiner(&ctx, combiner).await?;
        }
        if let Some(artifacts) = content.artifacts {
            courts.start_artifacts(&ctx, artifacts).await?;
        }
        for prize in content.prizes {
            courts.start_prize(&ctx, prize).await?;
        }

        info!(handlers = courts.handlers.len(), "[lw-05] Courts started");
        Ok(courts)
    }

    async fn start_combiner(
        &mut self,
        ctx: &CourtContext<'_>,
        config: ElementCombinerConfig,
    ) -> Result<(), CourtError> {
        let handler =
            ElementCombinerHandler::new(ctx.ledgers.clone(), ctx.transport.clone(), config).await?;
        handler.setup().await?;
        let id = handler.id().clone();
        self.serve(ctx, id, Arc::new(handler)).await
    }

    async fn start_artifacts(
        &mut self,
        ctx: &CourtContext<'_>,
        config: ArtifactSpawnConfig,
    ) -> Result<(), CourtError> {
        let handler = ArtifactSpawnHandler::new(
            ctx.ledgers.clone(),
            ctx.transport.clone(),
            ctx.transfer.clone(),
            &config.court,
        )
        .await?;
        handler.attach(ctx.ledgers.as_ref(), &config.locations).await?;
        let id = handler.id().clone();
        self.serve(ctx, id, Arc::new(handler)).await?;

        let respawner =
            Arc::new(ArtifactRespawner::new(ctx.ledgers.clone(), config, ctx.fatal.clone()).await?);
        self.tasks.push(respawner.start(ctx.shutdown.clone()).await?);
        Ok(())
    }

    async fn start_prize(
        &mut self,
        ctx: &CourtContext<'_>,
        config: PrizeConfig,
    ) -> Result<(), CourtError> {
        let validator: Option<Arc<dyn PrizeValidator>> = match &config.validator {
            None => None,
            Some(ValidatorConfig::Altars { altars }) => Some(Arc::new(AltarValidator::new(
                ctx.ledgers.clone(),
                altars.clone(),
            ))),
            Some(ValidatorConfig::Element {
                winning_element,
                fail_message,
            }) => Some(Arc::new(ElementPrizeValidator::new(
                ctx.ledgers.clone(),
                *winning_element,
                fail_message.clone(),
            ))),
            Some(ValidatorConfig::Pedestals { pedestals }) => Some(Arc::new(
                PedestalValidator::new(ctx.ledgers.clone(), pedestals.clone()),
            )),
        };

        let handler = Arc::new(
            PrizeHandler::new(
                ctx.ledgers.clone(),
                ctx.transport.clone(),
                config,
                validator,
                ctx.fatal.clone(),
            )
            .await?,
        );
        self.serve(ctx, handler.id().clone(), handler.clone()).await?;
        handler.setup().await?;
        self.tasks.push(
            handler.start_backup_respawn(ctx.config.backup_respawn_interval(), ctx.shutdown.clone()),
        );
        Ok(())
    }

    async fn serve(
        &mut self,
        ctx: &CourtContext<'_>,
        id: LedgerId,
        handler: Arc<dyn Handler>,
    ) -> Result<(), CourtError> {
        ctx.registry.start_service(id.clone(), handler).await?;
        self.handlers.push(id);
        Ok(())
    }

    /// Handler ledgers of every running court.
    pub fn ids(&self) -> &[LedgerId] {
        &self.handlers
    }

    /// Wait for background tasks. Call after signalling shutdown.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "[lw-05] Court task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Element, ElementCombination, ObjectTemplate};
    use crate::pedestal::PEDESTAL_MISSING_MESSAGE;
    use lw_01_ledger::InMemoryLedger;
    use lw_02_inventory::InventoryLedger;
    use lw_03_handlers::find_handler_or_broadcast;
    use shared_bus::{inventory_topic_for, InMemoryTransport};
    use shared_types::{GameMessage, RequestObjectTransferMessage};
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_serves_each_court() {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
        let (shutdown_tx, shutdown) = watch::channel(false);
        let (fatal, _fatal_rx) = mpsc::channel(4);
        let registry = ServiceRegistry::new(ledgers.clone(), transport.clone(), shutdown.clone());

        let meadow = ledgers.find_or_create_passphrase_ledger("meadow").await.unwrap();
        let grove = ledgers.find_or_create_passphrase_ledger("grove").await.unwrap();
        let content = CourtContent {
            prizes: vec![PrizeConfig {
                name: "spring".into(),
                location: meadow.id.clone(),
                spawn: ObjectTemplate::named("wire"),
                prize: ObjectTemplate::named("medal"),
                validator: Some(ValidatorConfig::Element {
                    winning_element: 300,
                    fail_message: "not yet".into(),
                }),
            }],
            element_combiners: vec![ElementCombinerConfig {
                name: "grove".into(),
                location: grove.id.clone(),
                elements: vec![
                    Element { id: 100, description: String::new(), skip_origin_validation: false },
                    Element { id: 300, description: String::new(), skip_origin_validation: false },
                ],
                combinations: vec![ElementCombination { from: vec![100, 100], to: 300 }],
                failure_element: None,
            }],
            artifacts: None,
        };

        let courts = Courts::start(
            CourtContext {
                ledgers: ledgers.clone(),
                transport,
                registry: &registry,
                shutdown,
                fatal,
                config: CourtsConfig::default(),
                transfer: TransferConfig::default(),
            },
            content,
        )
        .await
        .unwrap();

        assert_eq!(courts.ids().len(), 2);
        assert_eq!(registry.len(), 2);
        assert!(!InventoryLedger::new(ledgers.clone(), meadow.id.clone())
            .did_for_name("wire")
            .await
            .unwrap()
            .is_empty());

        shutdown_tx.send(true).unwrap();
        courts.join().await;
        registry.join_all().await;
    }

    #[tokio::test]
    async fn test_pedestal_prize_refuses_player_without_pages() {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
        let (shutdown_tx, shutdown) = watch::channel(false);
        let (fatal, _fatal_rx) = mpsc::channel(4);
        let registry = ServiceRegistry::new(ledgers.clone(), transport.clone(), shutdown.clone());

        let meadow = ledgers.find_or_create_passphrase_ledger("meadow").await.unwrap();
        let pedestal = ledgers.find_or_create_passphrase_ledger("pedestal").await.unwrap();
        let player = ledgers.find_or_create_passphrase_ledger("player").await.unwrap();
        let content = CourtContent {
            prizes: vec![PrizeConfig {
                name: "spring".into(),
                location: meadow.id.clone(),
                spawn: ObjectTemplate::named("feather"),
                prize: ObjectTemplate::named("crown"),
                validator: Some(ValidatorConfig::Pedestals {
                    pedestals: [(pedestal.id.clone(), "the first verse".to_string())].into(),
                }),
            }],
            ..Default::default()
        };
        let courts = Courts::start(
            CourtContext {
                ledgers: ledgers.clone(),
                transport: transport.clone(),
                registry: &registry,
                shutdown,
                fatal,
                config: CourtsConfig::default(),
                transfer: TransferConfig::default(),
            },
            content,
        )
        .await
        .unwrap();

        let feather = InventoryLedger::new(ledgers.clone(), meadow.id.clone())
            .did_for_name("feather")
            .await
            .unwrap();
        let mut replies = transport.subscribe(&inventory_topic_for(&player.id));
        find_handler_or_broadcast(ledgers.as_ref(), transport.clone(), &meadow.id)
            .await
            .unwrap()
            .handle(
                &RequestObjectTransferMessage {
                    from: meadow.id.clone(),
                    to: player.id.clone(),
                    object: feather.clone(),
                }
                .into(),
            )
            .await
            .unwrap();

        let envelope = tokio::time::timeout(Duration::from_secs(2), replies.recv())
            .await
            .unwrap()
            .unwrap();
        let GameMessage::TransferredObject(reply) = envelope.message else {
            panic!("unexpected reply {:?}", envelope.message);
        };
        assert_eq!(
            reply.error,
            format!("error on pick up: could not validate: {PEDESTAL_MISSING_MESSAGE} - try again")
        );

        shutdown_tx.send(true).unwrap();
        courts.join().await;
        registry.join_all().await;
    }

    #[tokio::test]
    async fn test_invalid_content_starts_nothing() {
        let ledgers = Arc::new(InMemoryLedger::with_random_key());
        let transport: Arc<dyn Transport> = Arc::new(InMemoryTransport::new());
        let (_shutdown_tx, shutdown) = watch::channel(false);
        let (fatal, _fatal_rx) = mpsc::channel(4);
        let registry = ServiceRegistry::new(ledgers.clone(), transport.clone(), shutdown.clone());

        let content = CourtContent {
            element_combiners: vec![ElementCombinerConfig {
                name: "empty".into(),
                location: "did:world:0xgrove".into(),
                elements: Vec::new(),
                combinations: Vec::new(),
                failure_element: None,
            }],
            ..Default::default()
        };
        let result = Courts::start(
            CourtContext {
                ledgers,
                transport,
                registry: &registry,
                shutdown,
                fatal,
                config: CourtsConfig::default(),
                transfer: TransferConfig::default(),
            },
            content,
        )
        .await;

        assert!(matches!(result, Err(CourtError::Content(_))));
        assert!(registry.is_empty());
    }
}
