//! Pagination handling for the Veeam APIs.
//!
//! Backup & Replication pages with `limit`/`skip` and reports a total;
//! Microsoft 365 returns a `_links.next.href` until the last page.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProtocolError, QueryError, QueryResult};
use crate::query::JsonSource;
use crate::types::TargetConfig;

/// How consecutive pages are requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaginationStrategy {
    /// `{data, pagination: {total}}` pages addressed by `skip`.
    Offset,
    /// `{results, _links: {next: {href}}}` pages chained by link.
    Link,
}

/// One decoded page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
    /// Total record count reported by offset pages.
    pub total: Option<u64>,
    /// Next page reference reported by link pages.
    pub next: Option<String>,
}

impl Page {
    /// Parse an offset page. Missing keys read as an empty page with total 0.
    ///
    /// `total` is accepted as an integer, an integral float or a numeric
    /// string.
    pub fn from_offset(body: Value) -> Self {
        let total = match body.pointer("/pagination/total") {
            None | Some(Value::Null) => 0,
            Some(value) => read_total(value).unwrap_or_else(|| {
                warn!(total = %value, "Unreadable pagination total, treating as 0");
                0
            }),
        };
        Self {
            records: take_array(body, "data"),
            total: Some(total),
            next: None,
        }
    }

    /// Parse a link page. Missing `results` reads as an empty page.
    pub fn from_link(body: Value) -> Self {
        let next = body
            .pointer("/_links/next/href")
            .and_then(Value::as_str)
            .filter(|href| !href.is_empty())
            .map(str::to_string);
        Self {
            records: take_array(body, "results"),
            total: None,
            next,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_total(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn take_array(mut body: Value, key: &str) -> Vec<Value> {
    match body.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Collects every page of a listing endpoint.
#[derive(Clone, Debug)]
pub struct Paginator {
    strategy: PaginationStrategy,
    page_limit: u32,
}

impl Paginator {
    pub fn new(strategy: PaginationStrategy, page_limit: u32) -> Self {
        Self {
            strategy,
            page_limit,
        }
    }

    pub fn for_target(target: &TargetConfig) -> Self {
        Self::new(target.pagination(), target.page_limit)
    }

    pub fn strategy(&self) -> PaginationStrategy {
        self.strategy
    }

    /// Fetch all pages starting at `start` and concatenate their records in
    /// server order.
    ///
    /// `start` carries the caller's query parameters; `limit` is added when
    /// absent. Relative next links resolve against `base`.
    pub async fn fetch_all<S>(
        &self,
        source: &S,
        base: &Url,
        start: Url,
        timeout: Option<Duration>,
    ) -> QueryResult<Vec<Value>>
    where
        S: JsonSource + ?Sized,
    {
        let start = self.with_default_limit(start);
        match self.strategy {
            PaginationStrategy::Offset => self.fetch_offset(source, start, timeout).await,
            PaginationStrategy::Link => self.fetch_link(source, base, start, timeout).await,
        }
    }

    async fn fetch_offset<S>(&self, source: &S, start: Url, timeout: Option<Duration>) -> QueryResult<Vec<Value>>
    where
        S: JsonSource + ?Sized,
    {
        let params: Vec<(String, String)> = start
            .query_pairs()
            .filter(|(k, _)| k != "skip")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut records: Vec<Value> = Vec::new();
        loop {
            let mut url = start.clone();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(params.iter())
                .append_pair("skip", &records.len().to_string());

            let page = Page::from_offset(source.get_json(&url, timeout).await?);
            let total = page.total.unwrap_or(0);
            let received = page.len();
            records.extend(page.records);

            debug!(url = %url, received, collected = records.len(), total, "Fetched page");

            if records.len() as u64 >= total {
                break;
            }
            if received == 0 {
                warn!(
                    url = %url,
                    collected = records.len(),
                    total,
                    "Empty page before reaching reported total, stopping"
                );
                break;
            }
        }

        Ok(records)
    }

    async fn fetch_link<S>(
        &self,
        source: &S,
        base: &Url,
        start: Url,
        timeout: Option<Duration>,
    ) -> QueryResult<Vec<Value>>
    where
        S: JsonSource + ?Sized,
    {
        let mut records: Vec<Value> = Vec::new();
        let mut url = start;
        loop {
            let page = Page::from_link(source.get_json(&url, timeout).await?);
            records.extend(page.records);

            debug!(url = %url, collected = records.len(), "Fetched page");

            match page.next {
                Some(href) => url = resolve_link(base, &href)?,
                None => break,
            }
        }

        Ok(records)
    }

    fn with_default_limit(&self, mut url: Url) -> Url {
        if !url.query_pairs().any(|(k, _)| k == "limit") {
            url.query_pairs_mut()
                .append_pair("limit", &self.page_limit.to_string());
        }
        url
    }
}

/// Resolve a next-page reference. Absolute links are used verbatim but must
/// stay on the origin of `base`, since the request carries the bearer token.
fn resolve_link(base: &Url, href: &str) -> QueryResult<Url> {
    let url = base.join(href).map_err(|e| {
        QueryError::Protocol(ProtocolError::InvalidUrl {
            url: href.to_string(),
            message: e.to_string(),
        })
    })?;

    if url.origin() != base.origin() {
        warn!(base = %base, next = %url, "Next link points to another origin, refusing to follow");
        return Err(QueryError::Protocol(ProtocolError::InvalidUrl {
            url: url.to_string(),
            message: format!("next link leaves origin {}", base.origin().ascii_serialization()),
        }));
    }

    Ok(url)
}
