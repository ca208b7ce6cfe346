//! Page-number pagination for GitHub list endpoints.
//!
//! Traversals request `page=1, 2, ...` one at a time and stop on the first
//! short page. Pull request listings can also stop early on a time
//! boundary, since GitHub returns them newest first.

use crate::auth::InstallationTokenSource;
use crate::client::GitHubClient;
use crate::errors::{GitHubError, GitHubResult};
use crate::observability::TracingHooks;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use url::Url;

/// Page sizing for one kind of listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    /// `per_page` sent to GitHub.
    pub per_page: u32,
    /// A page with fewer records than this is the last one.
    pub full_page: usize,
}

impl PageSize {
    /// Organization members.
    pub const MEMBERS: PageSize = PageSize::new(100);
    /// Organization repositories.
    pub const REPOSITORIES: PageSize = PageSize::new(100);
    /// Pull requests of a repository.
    pub const PULL_REQUESTS: PageSize = PageSize::new(20);
    /// Reviews of a pull request.
    pub const REVIEWS: PageSize = PageSize::new(100);

    /// Full-page size is one less than `per_page` to tolerate an off-by-one
    /// page from the API.
    pub const fn new(per_page: u32) -> Self {
        Self {
            per_page,
            full_page: per_page as usize - 1,
        }
    }

    /// Returns true if a page of `len` records ends the traversal.
    pub fn is_short(&self, len: usize) -> bool {
        len < self.full_page
    }
}

/// Pagination parameters for list requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationParams {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page (max 100).
    pub per_page: Option<u32>,
}

impl PaginationParams {
    /// Creates new pagination parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets items per page.
    pub fn per_page(mut self, per_page: u32) -> Self {
        // GitHub API limits to 100
        self.per_page = Some(per_page.min(100));
        self
    }

    /// Converts to query parameters.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(per_page) = self.per_page {
            params.push(("per_page".to_string(), per_page.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        params
    }

    /// Appends these parameters to a URL.
    pub fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in self.to_query() {
            pairs.append_pair(&k, &v);
        }
    }
}

/// Builds the first-page-independent URL for a listing.
///
/// `fixed` query pairs come first, then `per_page`.
pub fn list_url(
    client: &GitHubClient,
    path: &str,
    fixed: &[(&str, &str)],
    size: PageSize,
) -> GitHubResult<Url> {
    let endpoint = client.endpoint(path);
    let mut url = Url::parse(&endpoint).map_err(|e| {
        GitHubError::configuration(format!("Invalid URL {}", endpoint)).with_cause(e)
    })?;
    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in fixed {
            pairs.append_pair(k, v);
        }
    }
    PaginationParams::new().per_page(size.per_page).apply(&mut url);
    Ok(url)
}

/// Returns `base` with `page=<page>` appended.
pub fn page_url(base: &Url, page: u32) -> String {
    let mut url = base.clone();
    PaginationParams::new().page(page).apply(&mut url);
    url.into()
}

/// Per-traversal cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// Page to request next (1-indexed).
    pub page: u32,
    /// Creation time of the last record on the latest page, when tracked.
    pub last_created_at: Option<DateTime<Utc>>,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page: 1,
            last_created_at: None,
        }
    }
}

impl PageCursor {
    /// Moves to the next page.
    pub fn advance(&mut self) {
        self.page += 1;
    }
}

/// Stops a traversal once records are no newer than `base`.
pub struct TimeBoundary<T> {
    base: DateTime<Utc>,
    created_at: fn(&T) -> Option<DateTime<Utc>>,
}

impl<T> TimeBoundary<T> {
    /// Creates a boundary reading each record's timestamp with `created_at`.
    pub fn new(base: DateTime<Utc>, created_at: fn(&T) -> Option<DateTime<Utc>>) -> Self {
        Self { base, created_at }
    }

    /// The cutoff.
    pub fn base(&self) -> DateTime<Utc> {
        self.base
    }

    /// Records the last record's timestamp in `cursor` and reports whether
    /// the traversal is done.
    fn crossed(&self, page: &[T], cursor: &mut PageCursor) -> bool {
        cursor.last_created_at = page.last().and_then(self.created_at);
        match cursor.last_created_at {
            Some(created) => self.base >= created,
            None => false,
        }
    }
}

/// A sequential walk over every page of one listing.
pub struct Traversal<'a, T> {
    client: &'a GitHubClient,
    source: &'a dyn InstallationTokenSource,
    base_url: Url,
    size: PageSize,
    label: String,
    boundary: Option<TimeBoundary<T>>,
}

impl<'a, T: DeserializeOwned> Traversal<'a, T> {
    /// Creates a traversal over `base_url`.
    pub fn new(
        client: &'a GitHubClient,
        source: &'a dyn InstallationTokenSource,
        base_url: Url,
        size: PageSize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source,
            base_url,
            size,
            label: label.into(),
            boundary: None,
        }
    }

    /// Adds a time boundary.
    pub fn with_boundary(mut self, boundary: TimeBoundary<T>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Fetches and decodes pages until a stop condition holds.
    ///
    /// Any failure discards what was accumulated.
    pub async fn collect(self) -> GitHubResult<Vec<T>> {
        let mut cursor = PageCursor::default();
        let mut records = Vec::new();

        loop {
            let url = page_url(&self.base_url, cursor.page);
            let body = self.client.get(&url, self.source).await?;
            let page: Vec<T> = serde_json::from_slice(&body).map_err(|e| {
                GitHubError::decode(format!("{} page {}", self.label, cursor.page), e)
            })?;

            TracingHooks::on_page_fetched(&self.label, cursor.page, page.len());

            if self.size.is_short(page.len()) {
                records.extend(page);
                break;
            }

            let crossed = self
                .boundary
                .as_ref()
                .map_or(false, |b| b.crossed(&page, &mut cursor));
            records.extend(page);
            if crossed {
                tracing::debug!(
                    label = %self.label,
                    page = cursor.page,
                    "Reached time boundary, stopping traversal"
                );
                break;
            }

            cursor.advance();
        }

        Ok(records)
    }
}
