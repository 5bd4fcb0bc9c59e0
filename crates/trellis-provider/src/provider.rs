//! Content provider contract.
//!
//! A provider serves externally stored content items of one or more artifact
//! types. The engine never looks inside a provider: it queries items for
//! listing pages, fetches single items for detail routes, and asks the
//! provider to judge access. Storage, query execution, and tiering rules are
//! entirely the provider's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single content item returned by a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Artifact type this item belongs to.
    pub item_type: String,
    /// URL-safe identifier, unique within the type.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Canonical URL of the item's detail view.
    pub url: String,
    /// Item body (provider-rendered or raw, provider's choice).
    #[serde(default)]
    pub content: String,
    /// Free-form metadata for cards, filters, and templates.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Access tier required to view the full item, if any.
    #[serde(default)]
    pub tier: Option<String>,
}

/// Presentation and query configuration for one artifact type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConfig {
    /// Type identifier (matches `Page::artifact_type`).
    pub id: String,
    /// Singular display label ("Report").
    pub singular: String,
    /// Plural display label ("Reports").
    pub plural: String,
    /// First URL segment of detail routes (`/{slug_base}/{slug}`).
    pub slug_base: String,
    /// Metadata fields that may appear in listing filters.
    #[serde(default)]
    pub filter_fields: Vec<String>,
    /// Fields accepted in `QueryParams::orderby`.
    #[serde(default)]
    pub sort_fields: Vec<String>,
    /// Card layout name for listing views.
    #[serde(default)]
    pub card_layout: Option<String>,
    /// Metadata fields shown on the detail view.
    #[serde(default)]
    pub detail_fields: Vec<String>,
}

/// Result of a provider access check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessVerdict {
    /// Whether the viewer may see the full item.
    pub allowed: bool,
    /// Human-readable denial reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Tier the viewer would need.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

impl AccessVerdict {
    /// Unconditional allow.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            tier: None,
        }
    }

    /// Denial with a reason and the tier that would grant access.
    #[must_use]
    pub fn deny(reason: impl Into<String>, tier: Option<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            tier,
        }
    }
}

/// Sort direction for listing queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Parameters of a listing query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Metadata equality filters, passed through from the page's front
    /// matter plus request parameters.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    /// Sort field; provider default when `None`.
    #[serde(default)]
    pub orderby: Option<String>,
    /// Sort direction.
    #[serde(default)]
    pub order: SortDirection,
    /// 1-based page number.
    pub page: usize,
    /// Items per page.
    pub per_page: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            filters: BTreeMap::new(),
            orderby: None,
            order: SortDirection::Asc,
            page: 1,
            per_page: 10,
        }
    }
}

/// One page of listing results.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Items on this page, in query order.
    pub items: Vec<ContentItem>,
    /// Total matching items across all pages.
    pub total: usize,
    /// 1-based page number echoed back.
    pub page: usize,
    /// Page size echoed back.
    pub per_page: usize,
    /// Total page count.
    pub pages: usize,
}

/// The viewer on whose behalf an access check runs.
///
/// A deliberately small projection of the server session: providers judge
/// tiers, they do not manage identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Viewer {
    /// Whether the request carries an authenticated session.
    pub authenticated: bool,
    /// Whether the session holds the premium capability.
    pub premium: bool,
    /// Stable user identifier, when authenticated.
    pub user_id: Option<String>,
}

/// A pluggable source of externally stored content.
///
/// Implementations must be cheap to call concurrently; the registry shares
/// one instance across all requests.
pub trait ContentProvider: Send + Sync {
    /// Stable provider identifier.
    fn id(&self) -> &str;

    /// Display label for the status report.
    fn label(&self) -> &str;

    /// Artifact types this provider serves.
    fn types(&self) -> Vec<String>;

    /// Configuration for one of this provider's types.
    fn type_config(&self, item_type: &str) -> Option<TypeConfig>;

    /// Run a listing query.
    ///
    /// An unknown type or an empty result set both yield an empty
    /// [`QueryResult`]; queries never fail the request.
    fn query(&self, item_type: &str, params: &QueryParams) -> QueryResult;

    /// Fetch a single item by slug.
    fn get_item(&self, item_type: &str, slug: &str) -> Option<ContentItem>;

    /// Judge whether a viewer may see the full item.
    fn check_access(&self, item: &ContentItem, viewer: &Viewer) -> AccessVerdict;

    /// Template name for the detail view, when the provider ships one.
    fn detail_template(&self, _item_type: &str) -> Option<String> {
        None
    }

    /// Template name for listing cards, when the provider ships one.
    fn card_template(&self, _item_type: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_access_verdict_allow() {
        let verdict = AccessVerdict::allow();
        assert!(verdict.allowed);
        assert!(verdict.reason.is_none());
        assert!(verdict.tier.is_none());
    }

    #[test]
    fn test_access_verdict_deny_carries_reason_and_tier() {
        let verdict = AccessVerdict::deny("subscription required", Some("premium".to_owned()));
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("subscription required"));
        assert_eq!(verdict.tier.as_deref(), Some("premium"));
    }

    #[test]
    fn test_query_params_defaults() {
        let params = QueryParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 10);
        assert_eq!(params.order, SortDirection::Asc);
        assert!(params.filters.is_empty());
        assert!(params.orderby.is_none());
    }

    #[test]
    fn test_access_verdict_serialization_skips_none() {
        let json = serde_json::to_value(AccessVerdict::allow()).unwrap();
        assert_eq!(json["allowed"], true);
        assert!(json.get("reason").is_none());
        assert!(json.get("tier").is_none());
    }
}
