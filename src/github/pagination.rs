//! Paginated listing over GitHub's `Link` header
//!
//! GitHub paginates list endpoints with `page`/`per_page` query parameters
//! and advertises further pages in an RFC 5988 `Link` header:
//!
//! ```text
//! <https://api.github.com/gists?page=2>; rel="next", <https://api.github.com/gists?page=5>; rel="last"
//! ```
//!
//! The walker stops at the first of: no `rel="next"` link, the page limit,
//! or a failed page. A failed page discards everything fetched so far.

use std::ops::ControlFlow;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::LINK;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::{GistError, Result};
use crate::github::client::GitHubClient;
use crate::github::error_handler::classify_response;
use crate::github::transport::ApiRequest;

/// Matches the `page` query parameter of a link target
static PAGE_PARAM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&]page=(\d+)").expect("Invalid regex pattern for page parameter")
});

/// Extract the page number of the link with relation `rel`
///
/// Returns `None` when no segment carries `rel="<rel>"` or when its URL has
/// no `page` parameter.
pub fn parse_link_header(header: &str, rel: &str) -> Option<u32> {
    let relation = format!("rel=\"{}\"", rel);

    let segment = header
        .split(", ")
        .find(|segment| segment.contains(&relation))?;
    let link = segment.split(';').next()?.trim();

    PAGE_PARAM_PATTERN
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Position and bounds of a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Page requested next (1-based)
    pub current_page: u32,
    /// Maximum number of pages to fetch
    pub page_limit: u32,
    /// Items requested per page
    pub per_page: u32,
}

impl PageCursor {
    /// GitHub's upper bound for `per_page`
    pub const MAX_PER_PAGE: u32 = 100;

    /// Start at page 1; `per_page` is clamped to 1..=100 and `page_limit` to at least 1
    pub fn new(per_page: u32, page_limit: u32) -> Self {
        Self {
            current_page: 1,
            page_limit: page_limit.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(Self::MAX_PER_PAGE, 2)
    }
}

/// Walks the pages of a list endpoint
pub struct Paginator<'a> {
    client: &'a GitHubClient,
    cursor: PageCursor,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a GitHubClient, cursor: PageCursor) -> Self {
        Self { client, cursor }
    }

    /// Feed every item of every page to `visit` until it breaks or pages run out
    ///
    /// Returns the number of pages fetched.
    #[instrument(skip(self, request, visit), fields(url = %request.url))]
    pub async fn walk<T, F>(&self, request: ApiRequest, mut visit: F) -> Result<u32>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> ControlFlow<()>,
    {
        let mut cursor = self.cursor;
        let mut fetched = 0;

        loop {
            let page_request = request
                .clone()
                .query("page", cursor.current_page)
                .query("per_page", cursor.per_page);

            let response = self.client.send(page_request).await?;
            if !response.is_success() {
                if fetched == 0 {
                    return Err(classify_response(&response));
                }
                warn!(
                    page = cursor.current_page,
                    status = %response.status,
                    "page failed, discarding listing"
                );
                return Err(GistError::PageAborted {
                    page: cursor.current_page,
                    status: response.status.as_u16(),
                });
            }

            let items: Vec<T> = response.json()?;
            fetched += 1;
            debug!(page = cursor.current_page, items = items.len(), "fetched page");

            for item in items {
                if visit(item).is_break() {
                    return Ok(fetched);
                }
            }

            let next = response
                .header(LINK)
                .and_then(|link| parse_link_header(link, "next"));

            match next {
                Some(page) if fetched < cursor.page_limit => cursor.current_page = page,
                Some(_) => {
                    debug!(page_limit = cursor.page_limit, "page limit reached");
                    return Ok(fetched);
                }
                None => return Ok(fetched),
            }
        }
    }

    /// Gather the items of every page
    pub async fn collect<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.walk(request, |item| {
            items.push(item);
            ControlFlow::Continue(())
        })
        .await?;
        Ok(items)
    }
}
