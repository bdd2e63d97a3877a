//! Cart state machine

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Product};
use crate::error::CartError;

/// One cart line: a product plus how many of it are in the bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub amount: u32,
}

impl CartItem {
    pub fn subtotal(&self) -> u64 {
        self.product.price * u64::from(self.amount)
    }
}

/// Cart contents, owned by the application and mutated only through
/// [`apply`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartItem>,
}

impl CartState {
    pub fn total_price(&self) -> u64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn total_count(&self) -> u32 {
        self.items.iter().map(|item| item.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.product.id == id)
    }
}

/// A user action against the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CartCommand {
    AddItem { id: String },
    IncreaseAmount { id: String },
    DecreaseAmount { id: String },
    RemoveItem { id: String },
    Clear,
}

/// Pure state transition: `(state, command) -> state'`.
///
/// The catalog resolves product ids for `AddItem`; every other command
/// operates on lines already in the cart. Decreasing a line to zero
/// removes it, removing an absent line is a no-op.
pub fn apply(
    catalog: &Catalog,
    mut state: CartState,
    command: CartCommand,
) -> Result<CartState, CartError> {
    match command {
        CartCommand::AddItem { id } => match state.position(&id) {
            Some(idx) => state.items[idx].amount += 1,
            None => {
                let product = catalog
                    .get(&id)
                    .ok_or_else(|| CartError::UnknownProduct(id.clone()))?
                    .clone();
                state.items.push(CartItem { product, amount: 1 });
            }
        },
        CartCommand::IncreaseAmount { id } => {
            if let Some(idx) = state.position(&id) {
                state.items[idx].amount += 1;
            }
        }
        CartCommand::DecreaseAmount { id } => {
            if let Some(idx) = state.position(&id) {
                state.items[idx].amount -= 1;
                if state.items[idx].amount == 0 {
                    state.items.remove(idx);
                }
            }
        }
        CartCommand::RemoveItem { id } => {
            if let Some(idx) = state.position(&id) {
                state.items.remove(idx);
            }
        }
        CartCommand::Clear => state.items.clear(),
    }
    Ok(state)
}
