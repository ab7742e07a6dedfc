//! Interaction targets, outcomes and failures.

use serde::Serialize;
use thiserror::Error;

use crate::collision::{within_reach, Position};
use crate::item::{Ingredient, ItemId, PlateError, ProcessingState};
use crate::layout::{KitchenLayout, StationKind};
use crate::processing::ProcessKind;

/// Player-facing interaction failures. The display text is what the player sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InteractError {
    #[error("Hands full!")]
    HandsFull,
    #[error("Counter occupied!")]
    CounterOccupied,
    #[error("Nothing to pick up!")]
    NothingToPickUp,
    #[error("Nothing to chop!")]
    NothingToChop,
    #[error("Nothing to cook!")]
    NothingToCook,
    #[error("Chop it first!")]
    ChopFirst,
    #[error("Already {}!", .0.as_str())]
    AlreadyProcessed(ProcessingState),
    #[error("Already processing!")]
    AlreadyProcessing,
    #[error("Nothing nearby!")]
    NothingNearby,
    #[error("Only chopped or cooked food goes on a plate!")]
    CannotPlate,
    #[error("Plate is full!")]
    PlateFull,
    #[error("Plate already has {}!", .0.as_str())]
    AlreadyOnPlate(Ingredient),
    #[error("Put it on a plate first!")]
    NeedsPlate,
    #[error("Nothing to serve!")]
    NothingToServe,
}

impl InteractError {
    /// Stable identifier for the renderer.
    pub fn kind(&self) -> &'static str {
        match self {
            InteractError::HandsFull => "hands_full",
            InteractError::CounterOccupied => "counter_occupied",
            InteractError::NothingToPickUp => "nothing_to_pick_up",
            InteractError::NothingToChop => "nothing_to_chop",
            InteractError::NothingToCook => "nothing_to_cook",
            InteractError::ChopFirst => "chop_first",
            InteractError::AlreadyProcessed(_) => "already_processed",
            InteractError::AlreadyProcessing => "already_processing",
            InteractError::NothingNearby => "nothing_nearby",
            InteractError::CannotPlate => "cannot_plate",
            InteractError::PlateFull => "plate_full",
            InteractError::AlreadyOnPlate(_) => "already_on_plate",
            InteractError::NeedsPlate => "needs_plate",
            InteractError::NothingToServe => "nothing_to_serve",
        }
    }
}

impl From<PlateError> for InteractError {
    fn from(err: PlateError) -> Self {
        match err {
            PlateError::NotProcessed => InteractError::CannotPlate,
            PlateError::Full => InteractError::PlateFull,
            PlateError::Duplicate(ingredient) => InteractError::AlreadyOnPlate(ingredient),
        }
    }
}

/// What the player is interacting with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Station(StationKind),
    Counter(usize),
}

/// Resolve the interaction target in priority order: stations in
/// [`StationKind::PRIORITY`] order, then counters in list order.
pub fn resolve_target(layout: &KitchenLayout, position: &Position, radius: f32) -> Option<Target> {
    if let Some(station) = layout
        .stations()
        .iter()
        .find(|s| within_reach(position, &s.position, radius))
    {
        return Some(Target::Station(station.kind));
    }

    layout
        .counters
        .iter()
        .position(|c| within_reach(position, &c.position, radius))
        .map(Target::Counter)
}

/// Successful interaction results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Interaction {
    TookIngredient {
        item: ItemId,
        ingredient: Ingredient,
    },
    TookPlate {
        item: ItemId,
    },
    StartedProcessing {
        kind: ProcessKind,
        counter: usize,
    },
    Placed {
        item: ItemId,
        counter: usize,
    },
    PickedUp {
        item: ItemId,
        counter: usize,
    },
    Plated {
        plate: ItemId,
        ingredient: Ingredient,
    },
    Served {
        plate: ItemId,
        ingredients: Vec<Ingredient>,
    },
}
