//! Selector sets and their compiled form.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error_handling::ConfigurationError;
use crate::utils::{compile_optional_selector, compile_selector};

/// CSS queries locating listing fields on catalog pages and product pages.
///
/// `product_container`, `name` and `product_link` are required. `name`,
/// `product_link`, `price` and `image` are evaluated inside each container.
/// Undeclared optional selectors mean the field is never populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub product_container: String,
    pub name: String,
    pub product_link: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub detail: DetailSelectors,
}

/// Queries evaluated against a product's own page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailSelectors {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub variants: Vec<VariantAxisSelector>,
}

/// One variant axis: every element matching `selector` is a value of `axis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAxisSelector {
    pub axis: String,
    pub selector: String,
}

/// A `SelectorSet` with every query parsed.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub product_container: Selector,
    pub name: Selector,
    pub product_link: Selector,
    pub price: Option<Selector>,
    pub image: Option<Selector>,
    pub detail: CompiledDetailSelectors,
}

#[derive(Debug, Clone)]
pub struct CompiledDetailSelectors {
    pub description: Option<Selector>,
    pub price: Option<Selector>,
    pub material: Option<Selector>,
    pub images: Option<Selector>,
    pub variants: Vec<(String, Selector)>,
}

impl CompiledDetailSelectors {
    /// True when the profile declares at least one detail field.
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.price.is_none()
            && self.material.is_none()
            && self.images.is_none()
            && self.variants.is_empty()
    }
}

impl SelectorSet {
    /// Parses every selector, failing on the first missing or invalid one.
    pub fn compile(&self, shop: &str) -> Result<CompiledSelectors, ConfigurationError> {
        let detail = &self.detail;
        let variants = detail
            .variants
            .iter()
            .map(|v| {
                let field = format!("detail.variants[{}]", v.axis);
                compile_optional_selector(shop, &field, Some(&v.selector))?
                    .map(|selector| (v.axis.clone(), selector))
                    .ok_or_else(|| ConfigurationError::InvalidSelector {
                        shop: shop.to_string(),
                        field,
                        selector: v.selector.clone(),
                        reason: "empty selector".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledSelectors {
            product_container: compile_selector(
                shop,
                "product_container",
                &self.product_container,
            )?,
            name: compile_selector(shop, "name", &self.name)?,
            product_link: compile_selector(shop, "product_link", &self.product_link)?,
            price: compile_optional_selector(shop, "price", self.price.as_deref())?,
            image: compile_optional_selector(shop, "image", self.image.as_deref())?,
            detail: CompiledDetailSelectors {
                description: compile_optional_selector(
                    shop,
                    "detail.description",
                    detail.description.as_deref(),
                )?,
                price: compile_optional_selector(shop, "detail.price", detail.price.as_deref())?,
                material: compile_optional_selector(
                    shop,
                    "detail.material",
                    detail.material.as_deref(),
                )?,
                images: compile_optional_selector(
                    shop,
                    "detail.images",
                    detail.images.as_deref(),
                )?,
                variants,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> SelectorSet {
        SelectorSet {
            product_container: ".card".into(),
            name: ".title".into(),
            product_link: "a".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_set_compiles_without_optional_fields() {
        let compiled = minimal().compile("alpha").unwrap();
        assert!(compiled.price.is_none());
        assert!(compiled.image.is_none());
        assert!(compiled.detail.is_empty());
    }

    #[test]
    fn test_missing_container_is_configuration_error() {
        let mut set = minimal();
        set.product_container = String::new();
        let err = set.compile("alpha").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingSelector {
                shop: "alpha".into(),
                field: "product_container"
            }
        );
    }

    #[test]
    fn test_blank_variant_selector_is_rejected() {
        let mut set = minimal();
        set.detail.variants.push(VariantAxisSelector {
            axis: "size".into(),
            selector: " ".into(),
        });
        assert!(matches!(
            set.compile("alpha"),
            Err(ConfigurationError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_detail_selectors_deserialize_with_defaults() {
        let json = r#"{
            "product_container": ".card",
            "name": ".title",
            "product_link": "a",
            "detail": { "description": ".desc", "variants": [{"axis": "color", "selector": ".color li"}] }
        }"#;
        let set: SelectorSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.detail.description.as_deref(), Some(".desc"));
        assert!(set.detail.material.is_none());
        let compiled = set.compile("alpha").unwrap();
        assert_eq!(compiled.detail.variants.len(), 1);
        assert!(!compiled.detail.is_empty());
    }
}
