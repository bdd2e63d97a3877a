//! Cart view projection

use serde::Serialize;

use crate::state::CartState;

/// One rendered cart line
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CartLine {
    pub id: String,
    pub title: String,
    pub image: String,
    pub price: u64,
    pub amount: u32,
    pub subtotal: u64,
}

/// Pure projection of cart state for rendering.
///
/// Holds structured data only; turning prices into display strings is the
/// renderer's business.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_price: u64,
    pub total_count: u32,
}

impl CartView {
    pub fn project(state: &CartState) -> Self {
        let lines = state
            .items
            .iter()
            .map(|item| CartLine {
                id: item.product.id.clone(),
                title: item.product.title.clone(),
                image: item.product.image.clone(),
                price: item.product.price,
                amount: item.amount,
                subtotal: item.subtotal(),
            })
            .collect();

        Self {
            lines,
            total_price: state.total_price(),
            total_count: state.total_count(),
        }
    }
}
