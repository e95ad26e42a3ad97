//! HTTP handlers, one module per screen of the POS.

pub mod categories;
pub mod dashboard;
pub mod health;
pub mod pos;
pub mod products;
pub mod reports;
pub mod sales;
pub mod settings;

use serde::Deserialize;

use kasir_core::PageRequest;

use crate::AppState;

/// `?page=&per_page=` of a listing. A missing `per_page` falls back to the
/// configured page size.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn resolve(self, state: &AppState) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(state.config.page_size),
        )
    }
}
