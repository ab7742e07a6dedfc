use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::collision::{CollisionMap, Position};
use crate::config::Tuning;
use crate::input::{Direction, MoveKeys};
use crate::interaction::{resolve_target, InteractError, Interaction, Target};
use crate::item::{Ingredient, Item, ItemId, ItemIdAllocator, PlatedIngredient, ProcessingState};
use crate::layout::{KitchenLayout, LayoutError, StationKind};
use crate::notice::Notice;
use crate::processing::{CompletedTask, ProcessKind, Processor};

// ============================================================================
// Player & Counters
// ============================================================================

#[derive(Debug, Clone)]
pub struct Player {
    pub position: Position,
    pub facing: Direction,
    /// Single-item hand. An item here is referenced by no counter.
    pub holding: Option<Item>,
    keys: MoveKeys,
}

impl Player {
    fn new(spawn: Position) -> Self {
        Self {
            position: spawn,
            facing: Direction::Down,
            holding: None,
            keys: MoveKeys::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CounterSlot {
    pub item: Option<Item>,
}

impl CounterSlot {
    pub fn is_occupied(&self) -> bool {
        self.item.is_some()
    }
}

/// Things that happened during a tick or interaction that the renderer
/// should hear about beyond the next snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum KitchenEvent {
    ItemProcessed {
        counter: usize,
        kind: ProcessKind,
        consumed: ItemId,
        item: ItemId,
        ingredient: Ingredient,
        state: ProcessingState,
    },
    ProcessingAbandoned {
        counter: usize,
        kind: ProcessKind,
    },
}

// ============================================================================
// Snapshot (plain data for the renderer)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub item_type: &'static str,
    /// "raw", "chopped", "cooked", or "none" for plates
    pub state: &'static str,
    pub ingredients: Vec<PlatedIngredient>,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            item_type: item.type_name(),
            state: item.state().map_or("none", |s| s.as_str()),
            ingredients: item
                .as_plate()
                .map(|p| p.ingredients().to_vec())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub direction: u8,
    pub holding: Option<ItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterView {
    pub id: usize,
    pub occupied: bool,
    pub item: Option<ItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingView {
    pub kind: ProcessKind,
    pub counter: usize,
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeView {
    pub kind: &'static str,
    pub message: String,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KitchenSnapshot {
    pub tick: u64,
    pub player: PlayerView,
    pub counters: Vec<CounterView>,
    pub processing: Option<ProcessingView>,
    pub notice: Option<NoticeView>,
    pub served: u32,
}

// ============================================================================
// Kitchen
// ============================================================================

/// One kitchen session: the whole mutable simulation state for one player.
///
/// Everything is synchronous. The host feeds held keys with
/// [`Kitchen::set_keys`], interaction triggers with [`Kitchen::interact`],
/// and elapsed time with [`Kitchen::tick`].
pub struct Kitchen {
    layout: Arc<KitchenLayout>,
    tuning: Tuning,
    collision: CollisionMap,
    player: Player,
    counters: Vec<CounterSlot>,
    processor: Processor,
    notice: Option<Notice>,
    ids: ItemIdAllocator,
    rng: StdRng,
    served: u32,
    tick: u64,
    events: Vec<KitchenEvent>,
}

fn pantry_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl Kitchen {
    pub fn new(layout: Arc<KitchenLayout>, tuning: Tuning) -> Result<Self, LayoutError> {
        let collision = layout.collision_map(tuning.player_size);
        if collision.collides(layout.spawn) {
            return Err(LayoutError::SpawnBlocked(layout.id.clone()));
        }

        let rng = pantry_rng(tuning.rng_seed);

        Ok(Self {
            player: Player::new(layout.spawn),
            counters: vec![CounterSlot::default(); layout.counters.len()],
            processor: Processor::new(&tuning),
            notice: None,
            ids: ItemIdAllocator::new(),
            rng,
            served: 0,
            tick: 0,
            events: Vec::new(),
            collision,
            layout,
            tuning,
        })
    }

    /// Return to the initial state, including a re-seeded pantry. Item ids
    /// keep counting so the renderer never sees an id reused.
    pub fn reset(&mut self) {
        self.player = Player::new(self.layout.spawn);
        self.counters = vec![CounterSlot::default(); self.layout.counters.len()];
        self.processor.clear();
        self.rng = pantry_rng(self.tuning.rng_seed);
        self.notice = None;
        self.served = 0;
        self.events.clear();
        info!("Kitchen '{}' reset", self.layout.id);
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    pub fn set_keys(&mut self, keys: MoveKeys) {
        self.player.keys = keys;
    }

    pub fn drain_events(&mut self) -> Vec<KitchenEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Simulation tick
    // ========================================================================

    pub fn tick(&mut self, elapsed: Duration) {
        self.tick += 1;

        self.update_movement(elapsed);

        if let Some(done) = self.processor.advance(elapsed) {
            self.finish_processing(done);
        }

        if let Some(notice) = &mut self.notice {
            if notice.tick(elapsed) {
                self.notice = None;
            }
        }
    }

    fn update_movement(&mut self, elapsed: Duration) {
        let Some((dx, dy)) = self.player.keys.direction() else {
            return;
        };

        self.player.facing = Direction::from_velocity(dx, dy);
        let distance = self.tuning.player_speed * elapsed.as_secs_f32();
        self.player.position = self.collision.sweep(self.player.position, dx, dy, distance);
    }

    /// Replace the processed item with a fresh one in the next state.
    fn finish_processing(&mut self, done: CompletedTask) {
        let Some(slot) = self.counters.get_mut(done.counter) else {
            return;
        };

        let food = slot.item.as_ref().and_then(|item| item.as_food().map(|f| (item.id, f)));
        let Some((consumed, (ingredient, _))) = food else {
            warn!(
                "{} finished on counter {} but no food was there",
                done.kind.as_str(),
                done.counter
            );
            return;
        };

        let state = done.kind.output_state();
        let item = Item::food(self.ids.allocate(), ingredient, state);
        let id = item.id;
        slot.item = Some(item);

        info!(
            "Counter {}: {} {} -> {} (item {} replaces {})",
            done.counter,
            done.kind.as_str(),
            ingredient.as_str(),
            state.as_str(),
            id.0,
            consumed.0
        );

        self.events.push(KitchenEvent::ItemProcessed {
            counter: done.counter,
            kind: done.kind,
            consumed,
            item: id,
            ingredient,
            state,
        });
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    /// Interact with whatever is nearest in priority order. A failure also
    /// replaces the current notice.
    pub fn interact(&mut self) -> Result<Interaction, InteractError> {
        let target = resolve_target(
            &self.layout,
            &self.player.position,
            self.tuning.interaction_radius,
        );

        let result = match target {
            Some(Target::Station(StationKind::Pantry)) => self.take_from_pantry(),
            Some(Target::Station(StationKind::Chopping)) => {
                self.start_processing(StationKind::Chopping, ProcessKind::Chop)
            }
            Some(Target::Station(StationKind::Cooking)) => {
                self.start_processing(StationKind::Cooking, ProcessKind::Cook)
            }
            Some(Target::Station(StationKind::PlateDispenser)) => self.take_plate(),
            Some(Target::Station(StationKind::Serving)) => self.serve(),
            Some(Target::Counter(index)) => self.use_counter(index),
            None => Err(InteractError::NothingNearby),
        };

        match &result {
            Ok(interaction) => debug!("Interaction: {:?}", interaction),
            Err(e) => {
                debug!("Interaction failed: {}", e);
                self.notice = Some(Notice::new(*e, self.tuning.notice_duration()));
            }
        }

        result
    }

    fn take_from_pantry(&mut self) -> Result<Interaction, InteractError> {
        if self.player.holding.is_some() {
            return Err(InteractError::HandsFull);
        }

        let ingredient = match self.tuning.pantry_stock.as_slice() {
            [only] => *only,
            stock => stock.choose(&mut self.rng).copied().unwrap_or(Ingredient::Onion),
        };

        let item = Item::food(self.ids.allocate(), ingredient, ProcessingState::Raw);
        let id = item.id;
        self.player.holding = Some(item);

        Ok(Interaction::TookIngredient { item: id, ingredient })
    }

    fn take_plate(&mut self) -> Result<Interaction, InteractError> {
        if self.player.holding.is_some() {
            return Err(InteractError::HandsFull);
        }

        let plate = Item::plate(self.ids.allocate());
        let id = plate.id;
        self.player.holding = Some(plate);

        Ok(Interaction::TookPlate { item: id })
    }

    fn start_processing(
        &mut self,
        station: StationKind,
        kind: ProcessKind,
    ) -> Result<Interaction, InteractError> {
        let nothing = match kind {
            ProcessKind::Chop => InteractError::NothingToChop,
            ProcessKind::Cook => InteractError::NothingToCook,
        };

        if self.processor.is_busy() {
            return Err(InteractError::AlreadyProcessing);
        }

        let counter = self.layout.processing_counter(station).ok_or(nothing)?;
        let (ingredient, state) = self
            .counters
            .get(counter)
            .and_then(|slot| slot.item.as_ref())
            .and_then(Item::as_food)
            .ok_or(nothing)?;

        let required = kind.input_state();
        if state < required {
            return Err(InteractError::ChopFirst);
        }
        if state > required {
            return Err(InteractError::AlreadyProcessed(state));
        }

        if !self.processor.start(kind, counter) {
            return Err(InteractError::AlreadyProcessing);
        }

        info!(
            "Started {} of {} on counter {}",
            kind.as_str(),
            ingredient.as_str(),
            counter
        );

        Ok(Interaction::StartedProcessing { kind, counter })
    }

    fn serve(&mut self) -> Result<Interaction, InteractError> {
        match &self.player.holding {
            None => return Err(InteractError::NothingToServe),
            Some(item) => match item.as_plate() {
                None => return Err(InteractError::NeedsPlate),
                Some(plate) if plate.is_empty() => return Err(InteractError::NothingToServe),
                Some(_) => {}
            },
        }

        let Some(plate) = self.player.holding.take() else {
            return Err(InteractError::NothingToServe);
        };
        let ingredients: Vec<Ingredient> = plate
            .as_plate()
            .map(|p| p.ingredients().iter().map(|i| i.ingredient).collect())
            .unwrap_or_default();

        self.served += 1;
        info!(
            "Served plate {} with {:?} ({} served)",
            plate.id.0, ingredients, self.served
        );

        Ok(Interaction::Served {
            plate: plate.id,
            ingredients,
        })
    }

    fn use_counter(&mut self, index: usize) -> Result<Interaction, InteractError> {
        let counter_occupied = self
            .counters
            .get(index)
            .is_some_and(CounterSlot::is_occupied);

        match (self.player.holding.is_some(), counter_occupied) {
            (true, false) => {
                let Some(item) = self.player.holding.take() else {
                    return Err(InteractError::NothingToPickUp);
                };
                let id = item.id;
                match self.counters.get_mut(index) {
                    Some(slot) => slot.item = Some(item),
                    None => {
                        self.player.holding = Some(item);
                        return Err(InteractError::NothingNearby);
                    }
                }
                Ok(Interaction::Placed { item: id, counter: index })
            }
            (false, true) => {
                let item = self
                    .take_from_counter(index)
                    .ok_or(InteractError::NothingToPickUp)?;
                let id = item.id;
                self.player.holding = Some(item);
                Ok(Interaction::PickedUp { item: id, counter: index })
            }
            (true, true) => self.plate_on_counter(index),
            (false, false) => Err(InteractError::NothingToPickUp),
        }
    }

    /// Both hand and counter are full: combine a plate with food, whichever
    /// side each is on.
    fn plate_on_counter(&mut self, index: usize) -> Result<Interaction, InteractError> {
        let (Some(held), Some(on_counter)) = (
            self.player.holding.as_ref(),
            self.counters.get(index).and_then(|s| s.item.as_ref()),
        ) else {
            return Err(InteractError::CounterOccupied);
        };

        match (held.as_plate(), on_counter.as_food(), held.as_food(), on_counter.as_plate()) {
            // Plate in hand, food on the counter
            (Some(plate), Some((ingredient, state)), _, _) => {
                plate.can_add(ingredient, state)?;
                let plate_id = held.id;

                self.take_from_counter(index);
                if let Some(plate) = self.player.holding.as_mut().and_then(Item::as_plate_mut) {
                    plate.add(ingredient, state)?;
                }
                Ok(Interaction::Plated {
                    plate: plate_id,
                    ingredient,
                })
            }
            // Food in hand, plate on the counter
            (_, _, Some((ingredient, state)), Some(plate)) => {
                plate.can_add(ingredient, state)?;
                let plate_id = on_counter.id;

                self.player.holding = None;
                if let Some(plate) = self
                    .counters
                    .get_mut(index)
                    .and_then(|s| s.item.as_mut())
                    .and_then(Item::as_plate_mut)
                {
                    plate.add(ingredient, state)?;
                }
                Ok(Interaction::Plated {
                    plate: plate_id,
                    ingredient,
                })
            }
            _ => Err(InteractError::CounterOccupied),
        }
    }

    /// Remove an item from a counter. A task working on that counter is
    /// abandoned and the item keeps its current state.
    fn take_from_counter(&mut self, index: usize) -> Option<Item> {
        let item = self.counters.get_mut(index)?.item.take()?;

        if let Some(task) = self.processor.abandon_on(index) {
            info!(
                "Abandoned {} on counter {} at {:.0}%",
                task.kind.as_str(),
                index,
                task.progress() * 100.0
            );
            self.events.push(KitchenEvent::ProcessingAbandoned {
                counter: index,
                kind: task.kind,
            });
        }

        Some(item)
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    pub fn snapshot(&self) -> KitchenSnapshot {
        KitchenSnapshot {
            tick: self.tick,
            player: PlayerView {
                x: self.player.position.x,
                y: self.player.position.y,
                direction: self.player.facing as u8,
                holding: self.player.holding.as_ref().map(ItemView::from),
            },
            counters: self
                .counters
                .iter()
                .enumerate()
                .map(|(id, slot)| CounterView {
                    id,
                    occupied: slot.is_occupied(),
                    item: slot.item.as_ref().map(ItemView::from),
                })
                .collect(),
            processing: self.processor.active().map(|task| ProcessingView {
                kind: task.kind,
                counter: task.counter,
                progress: task.progress(),
            }),
            notice: self.notice.as_ref().map(|n| NoticeView {
                kind: n.error.kind(),
                message: n.error.to_string(),
                remaining_ms: n.remaining.as_millis() as u64,
            }),
            served: self.served,
        }
    }
}
