//! In-memory provider for tests and local development.
//!
//! Enabled by the `mock` feature. Items are held in a plain map; queries
//! filter on metadata equality, sort by a named field, and paginate. Tiered
//! items are denied to viewers without the matching capability, which makes
//! the gated-view paths testable without a real backend.

use std::collections::BTreeMap;

use crate::provider::{
    AccessVerdict, ContentItem, ContentProvider, QueryParams, QueryResult, SortDirection,
    TypeConfig, Viewer,
};

/// In-memory [`ContentProvider`].
pub struct MockProvider {
    id: String,
    label: String,
    configs: BTreeMap<String, TypeConfig>,
    items: Vec<ContentItem>,
    detail_templates: BTreeMap<String, String>,
    card_templates: BTreeMap<String, String>,
}

impl MockProvider {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            label: id.to_owned(),
            configs: BTreeMap::new(),
            items: Vec::new(),
            detail_templates: BTreeMap::new(),
            card_templates: BTreeMap::new(),
        }
    }

    /// Register an artifact type with its configuration.
    #[must_use]
    pub fn with_type(mut self, config: TypeConfig) -> Self {
        self.configs.insert(config.id.clone(), config);
        self
    }

    /// Add an item.
    #[must_use]
    pub fn with_item(mut self, item: ContentItem) -> Self {
        self.items.push(item);
        self
    }

    /// Ship a detail-view template for a type.
    #[must_use]
    pub fn with_detail_template(mut self, item_type: &str, template: &str) -> Self {
        self.detail_templates
            .insert(item_type.to_owned(), template.to_owned());
        self
    }

    /// Ship a listing-card template for a type.
    #[must_use]
    pub fn with_card_template(mut self, item_type: &str, template: &str) -> Self {
        self.card_templates
            .insert(item_type.to_owned(), template.to_owned());
        self
    }

    /// Shorthand for a minimal type configuration.
    #[must_use]
    pub fn simple_type(id: &str, singular: &str, plural: &str) -> TypeConfig {
        TypeConfig {
            id: id.to_owned(),
            singular: singular.to_owned(),
            plural: plural.to_owned(),
            slug_base: id.to_owned(),
            filter_fields: Vec::new(),
            sort_fields: vec!["title".to_owned(), "slug".to_owned()],
            card_layout: None,
            detail_fields: Vec::new(),
        }
    }

    /// Shorthand for a minimal item.
    #[must_use]
    pub fn simple_item(item_type: &str, slug: &str, title: &str) -> ContentItem {
        ContentItem {
            item_type: item_type.to_owned(),
            slug: slug.to_owned(),
            title: title.to_owned(),
            url: format!("/{item_type}/{slug}"),
            content: String::new(),
            metadata: BTreeMap::new(),
            tier: None,
        }
    }

    fn matches_filters(item: &ContentItem, filters: &BTreeMap<String, String>) -> bool {
        filters.iter().all(|(key, expected)| {
            item.metadata
                .get(key)
                .is_some_and(|value| match value {
                    serde_json::Value::String(s) => s == expected,
                    other => other.to_string() == *expected,
                })
        })
    }

    fn sort_key<'a>(item: &'a ContentItem, field: &str) -> &'a str {
        match field {
            "slug" => &item.slug,
            _ => &item.title,
        }
    }
}

impl ContentProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn types(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    fn type_config(&self, item_type: &str) -> Option<TypeConfig> {
        self.configs.get(item_type).cloned()
    }

    fn query(&self, item_type: &str, params: &QueryParams) -> QueryResult {
        let mut matching: Vec<&ContentItem> = self
            .items
            .iter()
            .filter(|item| item.item_type == item_type)
            .filter(|item| Self::matches_filters(item, &params.filters))
            .collect();

        let field = params.orderby.as_deref().unwrap_or("title");
        matching.sort_by(|a, b| {
            let ordering = Self::sort_key(a, field).cmp(Self::sort_key(b, field));
            match params.order {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len();
        let per_page = params.per_page.max(1);
        let page = params.page.max(1);
        let pages = total.div_ceil(per_page);
        let items = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        QueryResult {
            items,
            total,
            page,
            per_page,
            pages,
        }
    }

    fn get_item(&self, item_type: &str, slug: &str) -> Option<ContentItem> {
        self.items
            .iter()
            .find(|item| item.item_type == item_type && item.slug == slug)
            .cloned()
    }

    fn check_access(&self, item: &ContentItem, viewer: &Viewer) -> AccessVerdict {
        match item.tier.as_deref() {
            None => AccessVerdict::allow(),
            Some("premium") if viewer.premium => AccessVerdict::allow(),
            Some(tier) if viewer.authenticated && tier != "premium" => AccessVerdict::allow(),
            Some(tier) => AccessVerdict::deny(
                format!("{tier} tier required"),
                Some(tier.to_owned()),
            ),
        }
    }

    fn detail_template(&self, item_type: &str) -> Option<String> {
        self.detail_templates.get(item_type).cloned()
    }

    fn card_template(&self, item_type: &str) -> Option<String> {
        self.card_templates.get(item_type).cloned()
    }
}
