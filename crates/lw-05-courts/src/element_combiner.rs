//! # Element Combiner
//!
//! A location where players offer elements in a bowl and get a new element
//! back. Each player has their own inventory at the location.
//!
//! ```text
//!  drop element ──TransferredObject──→ validate origin ──invalid──→ destroy
//!                                          │
//!                                          ▼
//!                          bowl += element, element → handler
//!
//!  submit offering ──RequestObjectTransfer(bowl)──→ look up combination
//!                                          │
//!                 nothing / blocked ←──────┼──────→ bowl becomes the result
//!                 (bowl discarded)                   and goes to the player
//! ```
//!
//! The bowl ledger is named by the inventory tip, so nodes serving the same
//! location agree on it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lw_01_ledger::{verify_ownership_at, LedgerService};
use lw_02_inventory::{
    create_object_on_ledger, Interaction, InventoryLedger, ObjectLedger, DESCRIPTION_PATH,
    PER_PLAYER_INVENTORY_PATH,
};
use lw_03_handlers::{attach_handler, ComponentLogger, Handler, HandlerError, SupportedMessages};
use serde_json::{json, Value};
use shared_bus::Transport;
use shared_types::{
    Address, GameMessage, LedgerId, MessageType, RequestObjectTransferMessage,
    TransferredObjectMessage,
};
use tracing::{debug, info, warn, Instrument};

use crate::domain::{
    element_id, CourtError, Element, ElementCombinationMap, ElementCombinerConfig,
    BLOCKED_ELEMENT,
};
use crate::origin::validate_element_origin;
use crate::response::ResponseSender;

pub const BOWL_NAME: &str = "bowl";
pub const BOWL_DESCRIPTION: &str = "inside the bowl you have prepared:";
const BOWL_PLAYER_PATH: &str = "player";
const BOWL_ELEMENTS_PATH: &str = "elements";

pub const COMBINATION_SUCCESS_MESSAGE: &str =
    "Your offering has been accepted, a new element is now yours.";
pub const COMBINATION_BLOCKED_MESSAGE: &str = "The Fae are especially susceptible to silver therefore transmuting elements into silver can not be allowed. Your offering has not been deemed worthy.";

fn combination_error(reason: impl std::fmt::Display) -> CourtError {
    CourtError::rejected(format!("error combining: {reason} - try again"))
}

fn combination_failure(name: &str) -> CourtError {
    CourtError::rejected(format!(
        "The {} gave you nothing for your offering. It must not have been deemed acceptable.",
        title_case(name)
    ))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c.is_whitespace();
    }
    out
}

/// Outcome of looking up a set of ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combination<'a> {
    Element(&'a Element),
    Blocked,
    Nothing,
}

pub struct ElementCombinerHandler {
    ledgers: Arc<dyn LedgerService>,
    transport: Arc<dyn Transport>,
    name: String,
    location: LedgerId,
    id: LedgerId,
    elements: HashMap<i64, Element>,
    combinations: ElementCombinationMap,
    min_required: usize,
    failure_element: Option<i64>,
    log: ComponentLogger,
}

impl ElementCombinerHandler {
    /// Open the handler ledger `element-combiner-<name>`.
    pub async fn new(
        ledgers: Arc<dyn LedgerService>,
        transport: Arc<dyn Transport>,
        config: ElementCombinerConfig,
    ) -> Result<Self, CourtError> {
        let passphrase = format!("element-combiner-{}", config.name);
        let ledger = ledgers.find_or_create_passphrase_ledger(&passphrase).await?;

        Ok(Self {
            min_required: config.min_required(),
            combinations: ElementCombinationMap::new(&config.combinations),
            elements: config.elements.into_iter().map(|e| (e.id, e)).collect(),
            failure_element: config.failure_element,
            ledgers,
            transport,
            name: config.name,
            location: config.location,
            id: ledger.id,
            log: ComponentLogger::named(passphrase),
        })
    }

    /// Give players their own inventory at the location and serve it.
    pub async fn setup(&self) -> Result<(), CourtError> {
        self.ledgers
            .set_data(&self.location, PER_PLAYER_INVENTORY_PATH, json!(true))
            .await?;
        attach_handler(self.ledgers.as_ref(), &self.location, &self.id).await?;
        Ok(())
    }

    pub fn id(&self) -> &LedgerId {
        &self.id
    }

    pub fn messages() -> SupportedMessages {
        SupportedMessages::new()
            .with(MessageType::TransferredObject)
            .with(MessageType::RequestObjectTransfer)
    }

    pub fn min_required(&self) -> usize {
        self.min_required
    }

    /// Result of combining `ids`, in any order.
    pub fn find_combined_element(&self, ids: &[i64]) -> Combination<'_> {
        match self.combinations.find(ids) {
            Some(BLOCKED_ELEMENT) => return Combination::Blocked,
            Some(id) => {
                if let Some(element) = self.elements.get(&id) {
                    return Combination::Element(element);
                }
            }
            None => {}
        }
        self.failure_element
            .and_then(|id| self.elements.get(&id))
            .map_or(Combination::Nothing, Combination::Element)
    }

    fn origin_auths(&self) -> Vec<Address> {
        vec![self.ledgers.node_address()]
    }

    async fn is_valid_element(&self, object: &ObjectLedger) -> Result<bool, CourtError> {
        let name = object.name().await?;
        let id = element_id(&name).unwrap_or_default();
        let Some(element) = self.elements.get(&id) else {
            return Err(CourtError::rejected(format!("element {id} not found")));
        };
        if element.skip_origin_validation {
            debug!(object = %object.id(), "[lw-05] Skipping origin validation");
            return Ok(true);
        }
        validate_element_origin(self.ledgers.as_ref(), object.id(), &self.origin_auths()).await
    }

    /// Put an offered element in the player's bowl.
    pub async fn receive_element(&self, msg: &TransferredObjectMessage) -> Result<(), CourtError> {
        if msg.is_error() {
            return Ok(());
        }
        let target = InventoryLedger::find(self.ledgers.clone(), msg.to.clone()).await?;
        let incoming = ObjectLedger::new(self.ledgers.clone(), msg.object.clone());

        if !self.is_valid_element(&incoming).await? {
            info!(object = %msg.object, "[lw-05] Invalid element destroyed");
            incoming.change_owner(Vec::new()).await?;
            return Ok(());
        }

        let bowl = self.find_or_create_bowl(&target, &msg.from).await?;
        let name = incoming.name().await?;
        bowl.update_path(
            &format!("{BOWL_ELEMENTS_PATH}/{name}"),
            json!(msg.object.as_str()),
        )
        .await?;
        let description = bowl.description().await?;
        bowl.set_description(&format!("{description}\n  > {name}"))
            .await?;

        let handler_auths = self.ledgers.authentications(&self.id).await?;
        incoming.change_owner(handler_auths).await?;
        target.force_add(bowl.id()).await?;

        debug!(object = %msg.object, bowl = %bowl.id(), "[lw-05] Element added to bowl");
        Ok(())
    }

    async fn find_or_create_bowl(
        &self,
        target: &InventoryLedger,
        player: &LedgerId,
    ) -> Result<ObjectLedger, CourtError> {
        let existing = target.did_for_name(BOWL_NAME).await?;
        if !existing.is_empty() {
            let snapshot = self.ledgers.require_ledger(&existing).await?;
            if verify_ownership_at(self.ledgers.as_ref(), &snapshot, 0, &self.origin_auths()).await? {
                return Ok(ObjectLedger::new(self.ledgers.clone(), existing));
            }
            debug!(bowl = %existing, "[lw-05] Existing bowl is not ours, replacing");
        }

        let tip = target.snapshot().await?.tip;
        let ledger = self
            .ledgers
            .find_or_create_passphrase_ledger(&tip.to_hex())
            .await?;
        let bowl = ObjectLedger::new(self.ledgers.clone(), ledger.id.clone());
        if ledger.height > 0 {
            bowl.reset().await?;
        }

        bowl.set_name(BOWL_NAME).await?;
        bowl.add_interaction(&Interaction::PickUpObject {
            command: "submit offering".into(),
            object: ledger.id.clone(),
        })
        .await?;
        bowl.add_interaction(&Interaction::GetValue {
            command: format!("look at {BOWL_NAME}"),
            ledger: ledger.id.clone(),
            path: DESCRIPTION_PATH.into(),
        })
        .await?;
        bowl.set_description(BOWL_DESCRIPTION).await?;
        bowl.update_path(BOWL_PLAYER_PATH, json!(player.as_str()))
            .await?;
        Ok(bowl)
    }

    /// Combine the bowl's elements and hand the result to the player.
    pub async fn pick_up_bowl(&self, request: &RequestObjectTransferMessage) -> Result<(), CourtError> {
        let inventory = InventoryLedger::new(self.ledgers.clone(), request.from.clone());
        let bowl_id = inventory
            .did_for_name(BOWL_NAME)
            .await
            .map_err(|_| combination_error("could not fetch current inventory"))?;
        if bowl_id.is_empty() {
            return Err(combination_error("no elements to combine"));
        }
        if bowl_id != request.object {
            return Err(combination_error(format!("wrong object did for {BOWL_NAME}")));
        }

        let bowl = ObjectLedger::new(self.ledgers.clone(), bowl_id.clone());
        let player = bowl
            .get_path(BOWL_PLAYER_PATH)
            .await
            .map_err(|_| combination_error("could not fetch object"))?;
        if player.as_ref().and_then(Value::as_str) != Some(request.to.as_str()) {
            return Err(combination_error("incorrect player did for object"));
        }
        let player_auths = self
            .ledgers
            .authentications(&request.to)
            .await
            .map_err(|_| combination_error("could not fetch player ledger"))?;

        let Some(Value::Object(elements)) = bowl
            .get_path(BOWL_ELEMENTS_PATH)
            .await
            .map_err(|_| combination_error("could not fetch object"))?
        else {
            return Err(combination_error("no elements to combine"));
        };
        let ids: Vec<i64> = elements
            .keys()
            .map(|name| element_id(name).unwrap_or_default())
            .collect();
        if ids.len() < self.min_required {
            return Err(CourtError::rejected(format!(
                "A proper offering must include {} elements.",
                self.min_required
            )));
        }

        let element = match self.find_combined_element(&ids) {
            Combination::Element(element) => element,
            Combination::Blocked => {
                self.discard(&inventory, &bowl_id).await;
                return Err(CourtError::rejected(COMBINATION_BLOCKED_MESSAGE));
            }
            Combination::Nothing => {
                self.discard(&inventory, &bowl_id).await;
                return Err(combination_failure(&self.name));
            }
        };
        debug!(bowl = %bowl_id, ?ids, element = %element.name(), "[lw-05] Combining");

        let player_inventory = InventoryLedger::new(self.ledgers.clone(), request.to.clone());
        let existing = player_inventory
            .did_for_name(&element.name())
            .await
            .map_err(|_| combination_error("could not fetch player inventory"))?;
        if !existing.is_empty() {
            return Err(combination_error(format!(
                "can not pick up {}, one already exists in your inventory",
                element.name()
            )));
        }

        inventory
            .remove(&bowl_id)
            .await
            .map_err(|_| combination_error("could not remove object from location"))?;
        let update_failed = |_| combination_error("could not update new element");
        bowl.reset().await.map_err(update_failed)?;
        let result = create_object_on_ledger(self.ledgers.clone(), bowl_id, &element.name())
            .await
            .map_err(update_failed)?;
        result
            .set_description(&element.description)
            .await
            .map_err(update_failed)?;
        result
            .change_owner(player_auths)
            .await
            .map_err(update_failed)?;

        info!(element = %element.name(), player = %request.to, "[lw-05] Element combined");
        Ok(())
    }

    async fn discard(&self, inventory: &InventoryLedger, bowl: &LedgerId) {
        if let Err(e) = inventory.remove(bowl).await {
            warn!(bowl = %bowl, error = %e, "[lw-05] Could not remove bowl from location");
        }
    }
}

#[async_trait]
impl Handler for ElementCombinerHandler {
    async fn handle(&self, message: &GameMessage) -> Result<(), HandlerError> {
        async {
            match message {
                GameMessage::TransferredObject(msg) => {
                    self.receive_element(msg).await.map_err(HandlerError::from)
                }
                GameMessage::RequestObjectTransfer(request) => {
                    let sender = ResponseSender::for_request(
                        self.ledgers.as_ref(),
                        self.transport.clone(),
                        request,
                    )
                    .await;
                    match self.pick_up_bowl(request).await {
                        Ok(()) => sender.send(COMBINATION_SUCCESS_MESSAGE).await,
                        Err(CourtError::Rejected(reason)) => {
                            debug!(bowl = %request.object, reason, "[lw-05] Offering refused");
                            sender.reject(&reason).await;
                            Ok(())
                        }
                        Err(e) => {
                            warn!(bowl = %request.object, error = %e, "[lw-05] Offering failed");
                            sender.reject(&combination_error(&e).to_string()).await;
                            Ok(())
                        }
                    }
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
