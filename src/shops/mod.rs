//! Per-shop extraction rules.
//!
//! A shop is described entirely by data: a `ShopProfile` names the shop, lists
//! its catalog base URLs with their pagination rules, and carries the
//! `SelectorSet` used on catalog and product pages. One generic engine
//! (`pipeline::ShopParser`) consumes any profile.

mod catalog;
mod profile;
mod selectors;

pub use catalog::{CatalogTarget, CatalogUrlConfig, PaginationRule, PaginationStep};
pub use profile::{builtin_profiles, load_profiles, select_profiles, ParseMode, ShopProfile};
pub use selectors::{
    CompiledDetailSelectors, CompiledSelectors, DetailSelectors, SelectorSet, VariantAxisSelector,
};
