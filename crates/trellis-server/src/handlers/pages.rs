//! Content endpoint.
//!
//! One catch-all route serves pages, listings, artifact details, and gated
//! views as JSON. Dispatch priority is artifact, then page, then the front
//! page; see [`crate::dispatch`].

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use trellis_content::Page;
use trellis_provider::{ContentItem, QueryParams, SortDirection};

use crate::access::{AccessDecision, Session, evaluate_access};
use crate::dispatch::{RouteTarget, classify_path, slug_base_index};
use crate::error::ServerError;
use crate::render::{
    Crumb, artifact_breadcrumbs, compute_etag, page_breadcrumbs, render_markdown,
};
use crate::state::AppState;

/// Pagination and ordering query parameters for listing pages.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingQuery {
    page: Option<usize>,
    per_page: Option<usize>,
    orderby: Option<String>,
    order: Option<String>,
}

/// Page metadata.
#[derive(Serialize)]
struct PageMeta {
    /// Page title.
    title: String,
    /// Canonical route.
    route: String,
    /// Page description (from front matter).
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Artifact type for listing pages.
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    artifact_type: Option<String>,
    /// Declared access level.
    access_level: String,
}

impl From<&Page> for PageMeta {
    fn from(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            route: page.route.clone(),
            description: page.description.clone(),
            artifact_type: page.artifact_type.clone(),
            access_level: page.access_level.clone(),
        }
    }
}

/// One listing card.
#[derive(Serialize)]
struct ItemCard {
    title: String,
    slug: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<String>,
}

impl From<ContentItem> for ItemCard {
    fn from(item: ContentItem) -> Self {
        Self {
            title: item.title,
            slug: item.slug,
            url: item.url,
            tier: item.tier,
        }
    }
}

/// Listing block embedded in a listing-page response.
#[derive(Serialize)]
struct ListingBlock {
    items: Vec<ItemCard>,
    total: usize,
    page: usize,
    per_page: usize,
    pages: usize,
    /// Card template shipped by the provider, falling back to the type's
    /// configured card layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    card_template: Option<String>,
}

/// Response for a page or listing view.
#[derive(Serialize)]
struct PageResponse {
    view: &'static str,
    meta: PageMeta,
    breadcrumbs: Vec<Crumb>,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    listing: Option<ListingBlock>,
}

/// Response for an artifact detail view.
#[derive(Serialize)]
struct ArtifactResponse {
    view: &'static str,
    #[serde(rename = "type")]
    item_type: String,
    slug: String,
    title: String,
    url: String,
    breadcrumbs: Vec<Crumb>,
    content: String,
    /// Detail template shipped by the provider, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<String>,
}

/// Response when access evaluation denies.
///
/// Gated views are ordinary responses, not errors.
#[derive(Serialize)]
struct GatedResponse {
    view: &'static str,
    title: String,
    reason: String,
    required_tier: String,
}

/// Handle GET / (front page).
pub(crate) async fn get_front_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServerError> {
    get_content_impl(String::new(), state, query, headers)
}

/// Handle GET /{path} for every content path.
pub(crate) async fn get_content(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServerError> {
    get_content_impl(path, state, query, headers)
}

/// Shared implementation for content dispatch.
#[allow(clippy::needless_pass_by_value)]
fn get_content_impl(
    path: String,
    state: Arc<AppState>,
    query: ListingQuery,
    headers: HeaderMap,
) -> Result<axum::response::Response, ServerError> {
    let session = Session::from_headers(&headers);
    let slug_bases = slug_base_index(&state.registry);

    match classify_path(&path, &slug_bases) {
        RouteTarget::Artifact { item_type, slug } => {
            artifact_view(&state, &session, &item_type, &slug, &headers)
        }
        RouteTarget::Page { route } => page_view(&state, &session, &route, &query, &headers),
        RouteTarget::FrontPage => page_view(&state, &session, "/", &query, &headers),
    }
}

fn artifact_view(
    state: &AppState,
    session: &Session,
    item_type: &str,
    slug: &str,
    headers: &HeaderMap,
) -> Result<axum::response::Response, ServerError> {
    let provider = state
        .registry
        .get(item_type)
        .ok_or_else(|| ServerError::NotFound(format!("{item_type}/{slug}")))?;
    let item = provider
        .get_item(item_type, slug)
        .ok_or_else(|| ServerError::NotFound(format!("{item_type}/{slug}")))?;

    let verdict = provider.check_access(&item, &session.viewer());
    if !verdict.allowed {
        let response = GatedResponse {
            view: "gated",
            title: item.title.clone(),
            reason: verdict
                .reason
                .unwrap_or_else(|| "access restricted".to_owned()),
            required_tier: verdict.tier.unwrap_or_default(),
        };
        return Ok(Json(response).into_response());
    }

    let config = provider
        .type_config(item_type)
        .ok_or_else(|| ServerError::TemplateMissing(format!("type config for {item_type}")))?;
    let content = render_markdown(&item.content);
    let breadcrumbs = artifact_breadcrumbs(&config.plural, &config.slug_base, &item.title);

    let response = ArtifactResponse {
        view: "detail",
        item_type: item.item_type,
        slug: item.slug,
        title: item.title,
        url: item.url,
        breadcrumbs,
        content,
        template: provider.detail_template(item_type),
        tier: item.tier,
    };
    cacheable_json(state, session, headers, &response)
}

fn page_view(
    state: &AppState,
    session: &Session,
    route: &str,
    query: &ListingQuery,
    headers: &HeaderMap,
) -> Result<axum::response::Response, ServerError> {
    let tree = state.site.tree();
    let page = if route == "/" {
        tree.front_page()
    } else {
        tree.get(route)
    }
    .ok_or_else(|| ServerError::NotFound(route.to_owned()))?;

    if let AccessDecision::Deny {
        reason,
        required_tier,
    } = evaluate_access(&page.access_level, session, &state.hooks, route)
    {
        let response = GatedResponse {
            view: "gated",
            title: page.title.clone(),
            reason,
            required_tier,
        };
        return Ok(Json(response).into_response());
    }

    let listing = page
        .artifact_type
        .as_deref()
        .map(|item_type| run_listing(state, page, item_type, query));

    let response = PageResponse {
        view: if listing.is_some() { "listing" } else { "page" },
        meta: PageMeta::from(page),
        breadcrumbs: page_breadcrumbs(&tree, route),
        content: render_markdown(&page.body),
        listing,
    };
    cacheable_json(state, session, headers, &response)
}

/// Query the provider behind a listing page.
///
/// A listing whose type has no registered provider renders with an empty
/// item list rather than failing the whole page.
fn run_listing(
    state: &AppState,
    page: &Page,
    item_type: &str,
    query: &ListingQuery,
) -> ListingBlock {
    let mut params = QueryParams {
        filters: page.filter.clone(),
        ..QueryParams::default()
    };
    if let Some(p) = query.page {
        params.page = p.max(1);
    }
    if let Some(per) = query.per_page {
        params.per_page = per.clamp(1, 100);
    }
    params.orderby = query.orderby.clone();
    params.order = match query.order.as_deref() {
        Some(o) if o.eq_ignore_ascii_case("desc") => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    let params = state.hooks.apply_query_filters(params, item_type);

    let Some(provider) = state.registry.get(item_type) else {
        tracing::warn!(
            item_type = %item_type,
            route = %page.route,
            "Listing page has no provider for its type, rendering empty"
        );
        return ListingBlock {
            items: Vec::new(),
            total: 0,
            page: params.page,
            per_page: params.per_page,
            pages: 0,
            card_template: None,
        };
    };

    let result = provider.query(item_type, &params);
    let items = state.hooks.apply_item_filters(result.items, item_type);
    let card_template = provider
        .card_template(item_type)
        .or_else(|| provider.type_config(item_type).and_then(|c| c.card_layout));

    ListingBlock {
        items: items.into_iter().map(ItemCard::from).collect(),
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        pages: result.pages,
        card_template,
    }
}

/// Serialize a response with ETag, Last-Modified, and Cache-Control headers,
/// honoring If-None-Match.
///
/// Authenticated sessions skip conditional caching so gated state changes
/// take effect immediately.
fn cacheable_json<T: Serialize>(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    response: &T,
) -> Result<axum::response::Response, ServerError> {
    let body = serde_json::to_string(response)
        .map_err(|e| ServerError::TemplateMissing(format!("response encoding: {e}")))?;

    if session.authenticated {
        return Ok((
            [(header::CONTENT_TYPE, "application/json".to_owned())],
            body,
        )
            .into_response());
    }

    let etag = compute_etag(&state.version, &body);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let built_at = i64::try_from(state.site.snapshot().built_at()).unwrap_or(0);
    let last_modified = DateTime::from_timestamp(built_at, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (header::ETAG, etag),
            (header::LAST_MODIFIED, last_modified),
            (header::CACHE_CONTROL, "private, max-age=60".to_owned()),
        ],
        body,
    )
        .into_response())
}
