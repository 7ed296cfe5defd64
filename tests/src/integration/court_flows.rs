//! # Court Flow Tests
//!
//! Courts started by the runtime from loaded content, exercised through the
//! handlers they attach to their locations.
//!
//! ## Test Categories
//!
//! 1. **Prize**: content file to awarded prize and respawned object
//! 2. **Element prize**: refusal reply for a player without the element
//! 3. **Artifacts**: picking up an artifact places the next one

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use lw_01_ledger::LedgerService;
    use lw_02_inventory::{InventoryLedger, ObjectLedger};
    use lw_05_courts::{
        ArtifactInscriptions, ArtifactSpawnConfig, ArtifactSpec, ArtifactsConfig, CourtContent,
        ObjectTemplate, PrizeConfig, StaticContentLoader, TomlContentLoader, ValidatorConfig,
    };
    use shared_bus::{inventory_topic_for, Transport};
    use shared_types::{Address, GameMessage, LedgerId, TransferredObjectMessage};

    use crate::integration::{eventually, player, request_transfer, runtime};

    async fn named(ledgers: Arc<dyn LedgerService>, inventory: LedgerId, name: &str) -> LedgerId {
        InventoryLedger::new(ledgers, inventory)
            .did_for_name(name)
            .await
            .unwrap()
    }

    /// `object` is listed in `inventory`, under `name` when one is given.
    async fn listed_as(
        ledgers: Arc<dyn LedgerService>,
        inventory: LedgerId,
        name: &'static str,
        object: LedgerId,
    ) -> bool {
        let inventory = InventoryLedger::new(ledgers, inventory);
        if name.is_empty() {
            inventory.exists(&object).await.unwrap()
        } else {
            inventory.did_for_name(name).await.unwrap() == object
        }
    }

    async fn respawned(
        ledgers: Arc<dyn LedgerService>,
        inventory: LedgerId,
        name: &'static str,
        previous: LedgerId,
    ) -> bool {
        let current = named(ledgers, inventory, name).await;
        !current.is_empty() && current != previous
    }

    // =========================================================================
    // PRIZE
    // =========================================================================

    #[tokio::test]
    async fn test_prize_court_from_content_file() {
        let mut runtime = runtime();
        let ledgers = runtime.infrastructure().ledger_service();
        let meadow = ledgers.find_or_create_passphrase_ledger("meadow").await.unwrap().id;
        let (player, player_key) = player(&ledgers).await;
        runtime
            .infrastructure()
            .serve_inventory(player.clone())
            .await
            .unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[prizes]]
name = "spring"
location = "{meadow}"
spawn = {{ name = "wire" }}
prize = {{ name = "medal", description = "a shiny medal" }}
"#
        )
        .unwrap();
        runtime
            .start(&TomlContentLoader::new(file.path()))
            .await
            .unwrap();

        let wire = named(ledgers.clone(), meadow.clone(), "wire").await;
        assert!(!wire.is_empty());

        request_transfer(&runtime, &meadow, &player, &wire).await;

        assert!(
            eventually(|| listed_as(ledgers.clone(), player.clone(), "medal", wire.clone())).await
        );
        let medal = ObjectLedger::new(ledgers.clone(), wire.clone());
        assert_eq!(medal.description().await.unwrap(), "a shiny medal");
        assert_eq!(
            medal.authentications().await.unwrap(),
            vec![player_key.address()]
        );
        assert!(eventually(|| respawned(ledgers.clone(), meadow.clone(), "wire", wire.clone())).await);
        runtime.shutdown().await;
    }

    // =========================================================================
    // ELEMENT PRIZE
    // =========================================================================

    #[tokio::test]
    async fn test_element_prize_refuses_player_without_element() {
        let mut runtime = runtime();
        let ledgers = runtime.infrastructure().ledger_service();
        let summit = ledgers.find_or_create_passphrase_ledger("summit").await.unwrap().id;
        // No service for the player: replies arrive on its inventory topic.
        let (player, _) = player(&ledgers).await;
        let mut replies = runtime
            .infrastructure()
            .transport()
            .subscribe(&inventory_topic_for(&player));

        let content = CourtContent {
            prizes: vec![PrizeConfig {
                name: "winter".into(),
                location: summit.clone(),
                spawn: ObjectTemplate::named("crystal"),
                prize: ObjectTemplate::named("crown"),
                validator: Some(ValidatorConfig::Element {
                    winning_element: 300,
                    fail_message: "bring the third element".into(),
                }),
            }],
            ..Default::default()
        };
        runtime
            .start(&StaticContentLoader::new(content))
            .await
            .unwrap();

        let crystal = named(ledgers.clone(), summit.clone(), "crystal").await;
        let tip = ledgers.require_ledger(&crystal).await.unwrap().tip;
        request_transfer(&runtime, &summit, &player, &crystal).await;

        let envelope = tokio::time::timeout(Duration::from_secs(2), replies.recv())
            .await
            .unwrap()
            .unwrap();
        let reply: TransferredObjectMessage = match envelope.message {
            GameMessage::TransferredObject(msg) => msg,
            other => panic!("unexpected reply {other:?}"),
        };
        assert!(reply.is_error());
        assert_eq!(
            reply.error,
            "error on pick up: could not validate: bring the third element - try again"
        );
        assert_eq!(named(ledgers.clone(), summit.clone(), "crystal").await, crystal);
        assert_eq!(ledgers.require_ledger(&crystal).await.unwrap().tip, tip);
        runtime.shutdown().await;
    }

    // =========================================================================
    // ARTIFACTS
    // =========================================================================

    fn artifact_content(locations: Vec<LedgerId>) -> CourtContent {
        CourtContent {
            artifacts: Some(ArtifactSpawnConfig {
                court: "summer".into(),
                locations,
                forgers: vec!["the smith".into()],
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
                    names_pool: vec!["ring".into(), "crown".into(), "torc".into()],
                },
            }),
            ..Default::default()
        }
    }

    async fn artifacts_at(ledgers: Arc<dyn LedgerService>, locations: Vec<LedgerId>) -> Vec<LedgerId> {
        let mut found = Vec::new();
        for location in locations {
            let listed = InventoryLedger::new(ledgers.clone(), location)
                .all()
                .await
                .unwrap();
            found.extend(listed.into_keys());
        }
        found
    }

    async fn other_artifact_placed(
        ledgers: Arc<dyn LedgerService>,
        locations: Vec<LedgerId>,
        taken: LedgerId,
    ) -> bool {
        artifacts_at(ledgers, locations)
            .await
            .iter()
            .any(|id| id != &taken)
    }

    #[tokio::test]
    async fn test_artifact_pickup_places_the_next_artifact() {
        let mut runtime = runtime();
        let ledgers = runtime.infrastructure().ledger_service();
        let mut shrines = Vec::new();
        for name in ["north shrine", "south shrine"] {
            shrines.push(ledgers.find_or_create_passphrase_ledger(name).await.unwrap().id);
        }
        let (player, _) = player(&ledgers).await;
        runtime
            .infrastructure()
            .serve_inventory(player.clone())
            .await
            .unwrap();

        runtime
            .start(&StaticContentLoader::new(artifact_content(shrines.clone())))
            .await
            .unwrap();

        let placed = artifacts_at(ledgers.clone(), shrines.clone()).await;
        assert_eq!(placed.len(), 1);
        let first = placed[0].clone();
        let mut shrine = None;
        for location in &shrines {
            if InventoryLedger::new(ledgers.clone(), location.clone())
                .exists(&first)
                .await
                .unwrap()
            {
                shrine = Some(location.clone());
            }
        }
        let shrine = shrine.unwrap();

        request_transfer(&runtime, &shrine, &player, &first).await;

        assert!(
            eventually(|| listed_as(ledgers.clone(), player.clone(), "", first.clone())).await
        );
        assert!(
            eventually(|| other_artifact_placed(ledgers.clone(), shrines.clone(), first.clone())).await
        );
        runtime.shutdown().await;
    }
}
