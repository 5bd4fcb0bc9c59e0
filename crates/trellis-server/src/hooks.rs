//! Extension hooks.
//!
//! Deployments register closures at startup to shape listings and access
//! decisions without forking the engine. Hooks run in registration order.

use std::fmt;
use std::sync::Arc;

use trellis_provider::{ContentItem, QueryParams};

use crate::access::Session;

/// Context handed to access-override hooks.
#[derive(Clone, Debug)]
pub struct AccessContext {
    /// Canonical route of the page being evaluated.
    pub route: String,
    /// Declared access level of the page.
    pub access_level: String,
    /// Session performing the request.
    pub session: Session,
}

type QueryFilterFn = dyn Fn(QueryParams, &str) -> QueryParams + Send + Sync;
type ItemFilterFn = dyn Fn(Vec<ContentItem>, &str) -> Vec<ContentItem> + Send + Sync;
type AccessOverrideFn = dyn Fn(&AccessContext) -> Option<bool> + Send + Sync;

/// Registered hook lists.
#[derive(Clone, Default)]
pub struct Hooks {
    query_filters: Vec<Arc<QueryFilterFn>>,
    item_filters: Vec<Arc<ItemFilterFn>>,
    access_overrides: Vec<Arc<AccessOverrideFn>>,
}

impl Hooks {
    /// Register a hook that rewrites listing query parameters.
    ///
    /// The second argument is the content type being listed.
    pub fn add_query_filter<F>(&mut self, hook: F)
    where
        F: Fn(QueryParams, &str) -> QueryParams + Send + Sync + 'static,
    {
        self.query_filters.push(Arc::new(hook));
    }

    /// Register a hook that rewrites a page of listing results.
    pub fn add_item_filter<F>(&mut self, hook: F)
    where
        F: Fn(Vec<ContentItem>, &str) -> Vec<ContentItem> + Send + Sync + 'static,
    {
        self.item_filters.push(Arc::new(hook));
    }

    /// Register a hook consulted when built-in access evaluation denies.
    ///
    /// Returning `Some(true)` grants access; `None` defers to the next hook.
    /// `Some(false)` is treated the same as `None` so a hook cannot widen a
    /// denial it did not create.
    pub fn add_access_override<F>(&mut self, hook: F)
    where
        F: Fn(&AccessContext) -> Option<bool> + Send + Sync + 'static,
    {
        self.access_overrides.push(Arc::new(hook));
    }

    /// Run every query-filter hook over `params`.
    #[must_use]
    pub fn apply_query_filters(&self, mut params: QueryParams, item_type: &str) -> QueryParams {
        for hook in &self.query_filters {
            params = hook(params, item_type);
        }
        params
    }

    /// Run every item-filter hook over `items`.
    #[must_use]
    pub fn apply_item_filters(
        &self,
        mut items: Vec<ContentItem>,
        item_type: &str,
    ) -> Vec<ContentItem> {
        for hook in &self.item_filters {
            items = hook(items, item_type);
        }
        items
    }

    /// Whether any override hook grants access for `context`.
    #[must_use]
    pub fn access_granted(&self, context: &AccessContext) -> bool {
        self.access_overrides
            .iter()
            .any(|hook| hook(context) == Some(true))
    }

    /// Whether no hooks are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_filters.is_empty()
            && self.item_filters.is_empty()
            && self.access_overrides.is_empty()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("query_filters", &self.query_filters.len())
            .field("item_filters", &self.item_filters.len())
            .field("access_overrides", &self.access_overrides.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_query_filters_run_in_order() {
        let mut hooks = Hooks::default();
        hooks.add_query_filter(|mut params, _| {
            params.per_page = 5;
            params
        });
        hooks.add_query_filter(|mut params, _| {
            params.per_page *= 2;
            params
        });

        let params = hooks.apply_query_filters(QueryParams::default(), "report");
        assert_eq!(params.per_page, 10);
    }

    #[test]
    fn test_item_filters_see_item_type() {
        let mut hooks = Hooks::default();
        hooks.add_item_filter(|items, item_type| {
            if item_type == "report" {
                Vec::new()
            } else {
                items
            }
        });

        let item = ContentItem {
            item_type: "report".to_owned(),
            slug: "q1".to_owned(),
            title: "Q1".to_owned(),
            url: "/reports/q1/".to_owned(),
            content: String::new(),
            metadata: std::collections::BTreeMap::new(),
            tier: None,
        };

        assert!(hooks.apply_item_filters(vec![item.clone()], "report").is_empty());
        assert_eq!(hooks.apply_item_filters(vec![item], "note").len(), 1);
    }

    #[test]
    fn test_override_false_does_not_grant() {
        let mut hooks = Hooks::default();
        hooks.add_access_override(|_| Some(false));

        let context = AccessContext {
            route: "/p/".to_owned(),
            access_level: "premium".to_owned(),
            session: Session::default(),
        };
        assert!(!hooks.access_granted(&context));
    }

    #[test]
    fn test_any_override_true_grants() {
        let mut hooks = Hooks::default();
        hooks.add_access_override(|_| None);
        hooks.add_access_override(|_| Some(true));

        let context = AccessContext {
            route: "/p/".to_owned(),
            access_level: "premium".to_owned(),
            session: Session::default(),
        };
        assert!(hooks.access_granted(&context));
    }
}
