use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Ingredients
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ingredient {
    Onion,
    Tomato,
    Meat,
}

impl Ingredient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ingredient::Onion => "onion",
            Ingredient::Tomato => "tomato",
            Ingredient::Meat => "meat",
        }
    }
}

/// Ingredient processing ladder. Only ever moves Raw -> Chopped -> Cooked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingState {
    Raw,
    Chopped,
    Cooked,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Raw => "raw",
            ProcessingState::Chopped => "chopped",
            ProcessingState::Cooked => "cooked",
        }
    }

    /// Whether food in this state may go onto a plate.
    pub fn is_plateable(&self) -> bool {
        matches!(self, ProcessingState::Chopped | ProcessingState::Cooked)
    }
}

// ============================================================================
// Items
// ============================================================================

/// Stable identifier the renderer uses to find an item's visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

/// One ingredient sitting on a plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatedIngredient {
    pub ingredient: Ingredient,
    pub state: ProcessingState,
}

pub const MAX_PLATE_INGREDIENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlateError {
    #[error("ingredient is raw")]
    NotProcessed,
    #[error("plate is full")]
    Full,
    #[error("plate already holds {}", .0.as_str())]
    Duplicate(Ingredient),
}

/// Ordered set of up to three distinct ingredients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plate {
    ingredients: Vec<PlatedIngredient>,
}

impl Plate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_add(&self, ingredient: Ingredient, state: ProcessingState) -> Result<(), PlateError> {
        if !state.is_plateable() {
            return Err(PlateError::NotProcessed);
        }
        if self.len() >= MAX_PLATE_INGREDIENTS {
            return Err(PlateError::Full);
        }
        if self.contains(ingredient) {
            return Err(PlateError::Duplicate(ingredient));
        }
        Ok(())
    }

    pub fn add(&mut self, ingredient: Ingredient, state: ProcessingState) -> Result<(), PlateError> {
        self.can_add(ingredient, state)?;
        self.ingredients.push(PlatedIngredient { ingredient, state });
        Ok(())
    }

    pub fn contains(&self, ingredient: Ingredient) -> bool {
        self.ingredients.iter().any(|p| p.ingredient == ingredient)
    }

    pub fn ingredients(&self) -> &[PlatedIngredient] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Food {
        ingredient: Ingredient,
        state: ProcessingState,
    },
    Plate(Plate),
}

/// A simulation item. Owned by exactly one holder (player hand or counter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
}

impl Item {
    pub fn food(id: ItemId, ingredient: Ingredient, state: ProcessingState) -> Self {
        Self {
            id,
            kind: ItemKind::Food { ingredient, state },
        }
    }

    pub fn plate(id: ItemId) -> Self {
        Self {
            id,
            kind: ItemKind::Plate(Plate::new()),
        }
    }

    /// Type name shown to the renderer: the ingredient, or "plate".
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ItemKind::Food { ingredient, .. } => ingredient.as_str(),
            ItemKind::Plate(_) => "plate",
        }
    }

    /// Processing state, `None` for plates.
    pub fn state(&self) -> Option<ProcessingState> {
        match &self.kind {
            ItemKind::Food { state, .. } => Some(*state),
            ItemKind::Plate(_) => None,
        }
    }

    pub fn as_food(&self) -> Option<(Ingredient, ProcessingState)> {
        match &self.kind {
            ItemKind::Food { ingredient, state } => Some((*ingredient, *state)),
            ItemKind::Plate(_) => None,
        }
    }

    pub fn as_plate(&self) -> Option<&Plate> {
        match &self.kind {
            ItemKind::Plate(plate) => Some(plate),
            ItemKind::Food { .. } => None,
        }
    }

    pub fn as_plate_mut(&mut self) -> Option<&mut Plate> {
        match &mut self.kind {
            ItemKind::Plate(plate) => Some(plate),
            ItemKind::Food { .. } => None,
        }
    }
}

/// Hands out item ids for one kitchen session.
#[derive(Debug, Clone)]
pub struct ItemIdAllocator {
    next: u32,
}

impl ItemIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next = id.0 + 1;
        id
    }
}

impl Default for ItemIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
