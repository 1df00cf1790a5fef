//! Product catalog with browse filters

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use crate::domain::aggregates::Product;
use crate::domain::services::brands::BrandAliasTable;
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort { #[default] Newest, PriceAsc, PriceDesc, Name }

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
}

#[derive(Clone, Debug, Default)]
pub struct ProductCatalog {
    products: BTreeMap<String, Product>,
}

impl ProductCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self { products: products.into_iter().map(|p| (p.id().to_string(), p)).collect() }
    }

    pub fn seeded() -> Self {
        let now = Utc::now();
        let drafts = vec![
            Product::create("nike-air-max-90", "Air Max 90", "Nike", Money::npr(14_500))
                .with_category("Lifestyle").with_description("Waffle sole and visible Air cushioning.")
                .with_sizes(&["39", "40", "41", "42", "43", "44"]).with_colors(&["White", "Black", "Infrared"])
                .with_image("/images/nike-air-max-90.jpg").with_stock(24).created(now - Duration::days(40)),
            Product::create("jordan-1-mid", "Air Jordan 1 Mid", "Jordan", Money::npr(16_800))
                .with_category("Basketball").with_description("Classic high-top leather silhouette.")
                .with_sizes(&["40", "41", "42", "43", "44", "45"]).with_colors(&["Chicago", "Black Toe"])
                .with_image("/images/jordan-1-mid.jpg").with_stock(12).created(now - Duration::days(12)),
            Product::create("nike-pegasus-40", "Pegasus 40", "Nike", Money::npr(12_500))
                .with_category("Running").with_description("Everyday road running trainer.")
                .with_compare_at(Money::npr(13_900))
                .with_sizes(&["39", "40", "41", "42", "43"]).with_colors(&["Black", "Volt"])
                .with_image("/images/nike-pegasus-40.jpg").with_stock(30).created(now - Duration::days(60)),
            Product::create("adidas-ultraboost-22", "Ultraboost 22", "Adidas", Money::npr(18_000))
                .with_category("Running").with_description("Responsive Boost midsole with Primeknit upper.")
                .with_sizes(&["40", "41", "42", "43", "44"]).with_colors(&["Core Black", "Cloud White"])
                .with_image("/images/adidas-ultraboost-22.jpg").with_stock(15).created(now - Duration::days(25)),
            Product::create("adidas-samba-og", "Samba OG", "Adidas", Money::npr(9_500))
                .with_category("Lifestyle").with_description("Terrace classic with gum sole.")
                .with_sizes(&["38", "39", "40", "41", "42", "43"]).with_colors(&["White", "Black"])
                .with_image("/images/adidas-samba-og.jpg").with_stock(40).created(now - Duration::days(5)),
            Product::create("puma-suede-classic", "Suede Classic XXI", "Puma", Money::npr(3_500))
                .with_category("Lifestyle").with_description("Soft suede upper since 1968.")
                .with_sizes(&["38", "39", "40", "41", "42"]).with_colors(&["Peacoat", "Red"])
                .with_image("/images/puma-suede-classic.jpg").with_stock(50).created(now - Duration::days(90)),
            Product::create("puma-rs-x", "RS-X Efekt", "Puma", Money::npr(7_200))
                .with_category("Lifestyle").with_description("Chunky running-system inspired sneaker.")
                .with_sizes(&["40", "41", "42", "43"]).with_colors(&["Grey", "White"])
                .with_image("/images/puma-rs-x.jpg").with_stock(18).created(now - Duration::days(18)),
            Product::create("new-balance-574", "574 Core", "New Balance", Money::npr(8_900))
                .with_category("Lifestyle").with_description("ENCAP midsole everyday sneaker.")
                .with_sizes(&["39", "40", "41", "42", "43", "44"]).with_colors(&["Grey", "Navy"])
                .with_image("/images/new-balance-574.jpg").with_stock(22).created(now - Duration::days(33)),
            Product::create("converse-chuck-70", "Chuck 70 Hi", "Converse", Money::npr(6_000))
                .with_category("Lifestyle").with_description("Premium canvas high-top.")
                .with_sizes(&["37", "38", "39", "40", "41", "42"]).with_colors(&["Black", "Parchment"])
                .with_image("/images/converse-chuck-70.jpg").with_stock(35).created(now - Duration::days(70)),
            Product::create("vans-old-skool", "Old Skool", "Vans", Money::npr(6_500))
                .with_category("Skate").with_description("Low-top with the side stripe.")
                .with_sizes(&["38", "39", "40", "41", "42", "43"]).with_colors(&["Black/White"])
                .with_image("/images/vans-old-skool.jpg").with_stock(0).created(now - Duration::days(100)),
        ];
        Self::new(drafts.into_iter().filter_map(|p| p.publish().ok()))
    }

    pub fn get(&self, id: &str) -> Option<&Product> { self.products.get(id) }
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Product> { self.products.get_mut(id) }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    pub fn brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = self.products.values().map(|p| p.brand()).collect();
        brands.sort_unstable();
        brands.dedup();
        brands
    }

    /// Active products matching every filter in `query`. Brand filters go
    /// through the alias table, so `brand=nike` also lists Jordan.
    pub fn search(&self, query: &ProductQuery, aliases: &BrandAliasTable) -> Vec<&Product> {
        let needle = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()).map(str::to_lowercase);
        let mut hits: Vec<&Product> = self.products.values()
            .filter(|p| p.is_active())
            .filter(|p| query.brand.as_deref().map_or(true, |b| aliases.matches(p.brand(), b)))
            .filter(|p| query.category.as_deref().map_or(true, |c| p.category().eq_ignore_ascii_case(c)))
            .filter(|p| query.min_price.map_or(true, |min| p.price().amount() >= min))
            .filter(|p| query.max_price.map_or(true, |max| p.price().amount() <= max))
            .filter(|p| needle.as_deref().map_or(true, |n| {
                p.name().to_lowercase().contains(n) || p.brand().to_lowercase().contains(n) || p.description().to_lowercase().contains(n)
            }))
            .collect();

        match query.sort {
            ProductSort::Newest => hits.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            ProductSort::PriceAsc => hits.sort_by(|a, b| a.price().amount().cmp(&b.price().amount())),
            ProductSort::PriceDesc => hits.sort_by(|a, b| b.price().amount().cmp(&a.price().amount())),
            ProductSort::Name => hits.sort_by(|a, b| a.name().cmp(b.name())),
        }
        hits
    }
}
