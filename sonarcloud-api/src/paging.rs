//! Pagination over SonarCloud search endpoints
//!
//! `issues/search` and `hotspots/search` both page with `p` (1-based) and `ps`, but they
//! disagree on where the totals live. Issues answer with a `paging` object and, on older
//! servers, flat `total`/`p`/`ps` keys; hotspots answer with `paging` only. A single
//! [`PageEnvelope`] models both shapes and the precedence between them is resolved in
//! [`PageEnvelope::total_results`] and [`PageEnvelope::effective_page_size`].
//!
//! Findings on each page are kept as raw JSON text and handed to the caller untouched.

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::client::Transport;
use crate::{SonarError, truncate_response};

/// Page size requested when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// The structured `paging` object.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Total number of results across all pages
    #[serde(alias = "total")]
    pub result_count: Option<u64>,
    /// Page size the service actually used
    pub page_size: Option<u32>,
    /// 1-based index of this page
    pub page_index: Option<u32>,
}

/// One decoded search response.
///
/// Every field is optional because the two endpoint families populate different ones.
/// Unknown keys (`components`, `rules`, `facets`, ...) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    /// Structured paging information
    pub paging: Option<Paging>,
    /// Flat total result count
    #[serde(alias = "total")]
    pub total_results: Option<u64>,
    /// Flat page size
    #[serde(alias = "ps")]
    pub page_size: Option<u32>,
    /// Flat 1-based page index
    #[serde(alias = "p")]
    pub page_index: Option<u32>,
    /// Issue fragments, verbatim
    #[serde(default)]
    pub issues: Vec<Box<RawValue>>,
    /// Hotspot fragments, verbatim
    #[serde(default)]
    pub hotspots: Vec<Box<RawValue>>,
}

impl PageEnvelope {
    /// Total result count: `paging` wins over the flat field when it carries one.
    #[must_use]
    pub fn total_results(&self) -> Option<u64> {
        self.paging
            .and_then(|paging| paging.result_count)
            .or(self.total_results)
    }

    /// Page size the service applied: the flat field first, then `paging`.
    ///
    /// Zero is treated as absent in both places.
    #[must_use]
    pub fn effective_page_size(&self) -> Option<u32> {
        self.page_size
            .filter(|size| *size > 0)
            .or_else(|| {
                self.paging
                    .and_then(|paging| paging.page_size)
                    .filter(|size| *size > 0)
            })
    }

    /// Page index echoed back by the service, if any.
    #[must_use]
    pub fn reported_page_index(&self) -> Option<u32> {
        self.paging
            .and_then(|paging| paging.page_index)
            .or(self.page_index)
    }

    /// Take the issue fragments out of this page.
    #[must_use]
    pub fn take_issues(&mut self) -> Vec<Box<RawValue>> {
        std::mem::take(&mut self.issues)
    }

    /// Take the hotspot fragments out of this page.
    #[must_use]
    pub fn take_hotspots(&mut self) -> Vec<Box<RawValue>> {
        std::mem::take(&mut self.hotspots)
    }
}

/// What a completed paginated fetch saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    /// Pages fetched (and handed to the callback)
    pub pages: u32,
    /// Total result count reported by the last page
    pub total_results: u64,
}

/// Number of pages for `total` results at `page_size` per page, never less than one.
///
/// `page_size` must be non-zero; callers get it from
/// [`PageEnvelope::effective_page_size`], which never yields zero.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    total.div_ceil(u64::from(page_size.max(1))).max(1)
}

/// Append the paging parameters to an API path that may or may not carry a query.
#[must_use]
pub fn paged_path(api_path: &str, page: u32, page_size: u32) -> String {
    let separator = if api_path.contains('?') { '&' } else { '?' };
    format!("{api_path}{separator}p={page}&ps={page_size}")
}

/// Fetch every page of a search and hand each decoded page to `on_page`.
///
/// Pages are requested one at a time starting at 1. After each page the number of pages
/// is recomputed from the totals in that response, and the loop continues while the
/// next page number is within range. `on_page` runs to completion before the next
/// request is made, so it may freely mutate caller state.
///
/// # Errors
///
/// Returns the transport error for a failed request, [`SonarError::Decode`] when a body
/// is not a search response, and [`SonarError::Schema`] when a page lacks a resolvable
/// total or page size. Nothing is retried and later pages are never requested.
pub async fn fetch_all_pages<T, F>(
    transport: &T,
    api_path: &str,
    page_size: u32,
    mut on_page: F,
) -> Result<PageSummary, SonarError>
where
    T: Transport,
    F: FnMut(PageEnvelope),
{
    if page_size == 0 {
        return Err(SonarError::InvalidConfig(
            "Page size must be at least 1".to_string(),
        ));
    }

    let mut page: u32 = 1;

    loop {
        let response = transport
            .get_text(&paged_path(api_path, page, page_size))
            .await?;

        let envelope: PageEnvelope =
            serde_json::from_str(&response).map_err(|source| SonarError::Decode {
                api_path: api_path.to_string(),
                page,
                source,
            })?;

        let total = envelope
            .total_results()
            .ok_or_else(|| schema_error("total result count", api_path, page, &response))?;
        let effective_size = envelope
            .effective_page_size()
            .ok_or_else(|| schema_error("page size", api_path, page, &response))?;
        let pages = total_pages(total, effective_size);

        if effective_size != page_size {
            debug!("{api_path}: requested page size {page_size}, service used {effective_size}");
        }
        if let Some(reported) = envelope.reported_page_index()
            && reported != page
        {
            warn!("{api_path}: requested page {page} but service reported page {reported}");
        }

        debug!("Retrieved page {page}/{pages} of {api_path} ({total} total)");
        on_page(envelope);

        if u64::from(page) >= pages {
            info!("Fetched {page} page(s) from {api_path} ({total} total results)");
            return Ok(PageSummary {
                pages: page,
                total_results: total,
            });
        }

        page = page.checked_add(1).ok_or_else(|| {
            SonarError::InvalidResponse(format!(
                "{api_path} reports {pages} pages, more than can be requested"
            ))
        })?;
    }
}

fn schema_error(missing: &'static str, api_path: &str, page: u32, response: &str) -> SonarError {
    SonarError::Schema {
        missing,
        api_path: api_path.to_string(),
        page,
        response: truncate_response(response),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves canned bodies in order and records every requested path.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, SonarError>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<String, SonarError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn ok(bodies: Vec<String>) -> Self {
            Self::new(bodies.into_iter().map(Ok).collect())
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("lock").clone()
        }
    }

    impl Transport for ScriptedTransport {
        async fn get_text(&self, api_path: &str) -> Result<String, SonarError> {
            self.requests
                .lock()
                .expect("lock")
                .push(api_path.to_string());
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err(SonarError::InvalidResponse("no more responses".into())))
        }
    }

    /// An issues page in the `paging` shape with `count` numbered fragments.
    pub(crate) fn issues_page(total: u64, page_size: u32, start: u64, count: u64) -> String {
        let issues: Vec<String> = (start..start + count)
            .map(|n| format!(r#"{{"key":"issue-{n}","type":"VULNERABILITY"}}"#))
            .collect();
        let index = start / u64::from(page_size.max(1)) + 1;
        format!(
            r#"{{"paging":{{"pageIndex":{index},"pageSize":{page_size},"total":{total}}},"issues":[{}],"components":[]}}"#,
            issues.join(",")
        )
    }

    #[test]
    fn test_paged_path_separator() {
        assert_eq!(paged_path("server/version", 1, 500), "server/version?p=1&ps=500");
        assert_eq!(
            paged_path("issues/search?projects=a", 3, 100),
            "issues/search?projects=a&p=3&ps=100"
        );
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(1200, 500), 3);
        assert_eq!(total_pages(1000, 500), 2);
        assert_eq!(total_pages(1, 500), 1);
        assert_eq!(total_pages(0, 500), 1);
        assert_eq!(total_pages(u64::MAX, 1), u64::MAX);
    }

    #[test]
    fn test_envelope_paging_shape() {
        let envelope: PageEnvelope = serde_json::from_str(
            r#"{"paging":{"pageIndex":2,"pageSize":100,"total":250},"hotspots":[{"key":"h"}]}"#,
        )
        .expect("should decode");

        assert_eq!(envelope.total_results(), Some(250));
        assert_eq!(envelope.effective_page_size(), Some(100));
        assert_eq!(envelope.reported_page_index(), Some(2));
        assert_eq!(envelope.hotspots.len(), 1);
        assert!(envelope.issues.is_empty());
    }

    #[test]
    fn test_envelope_flat_shape() {
        let envelope: PageEnvelope =
            serde_json::from_str(r#"{"total":7,"p":1,"ps":5,"issues":[1,2]}"#)
                .expect("should decode");

        assert!(envelope.paging.is_none());
        assert_eq!(envelope.total_results(), Some(7));
        assert_eq!(envelope.effective_page_size(), Some(5));
        assert_eq!(envelope.reported_page_index(), Some(1));
    }

    #[test]
    fn test_envelope_long_key_names() {
        let envelope: PageEnvelope = serde_json::from_str(
            r#"{"totalResults":3,"pageSize":10,"paging":{"resultCount":4,"pageSize":20}}"#,
        )
        .expect("should decode");

        assert_eq!(envelope.total_results(), Some(4));
        assert_eq!(envelope.effective_page_size(), Some(10));
    }

    #[test]
    fn test_paging_total_takes_precedence() {
        let envelope: PageEnvelope = serde_json::from_str(
            r#"{"total":999,"ps":100,"paging":{"pageIndex":1,"pageSize":100,"total":42}}"#,
        )
        .expect("should decode");

        assert_eq!(envelope.total_results(), Some(42));
    }

    #[test]
    fn test_zero_page_size_falls_back_to_paging() {
        let envelope: PageEnvelope =
            serde_json::from_str(r#"{"ps":0,"paging":{"pageSize":50,"total":10}}"#)
                .expect("should decode");
        assert_eq!(envelope.effective_page_size(), Some(50));

        let envelope: PageEnvelope =
            serde_json::from_str(r#"{"ps":0,"paging":{"pageSize":0,"total":10}}"#)
                .expect("should decode");
        assert_eq!(envelope.effective_page_size(), None);
    }

    #[test]
    fn test_fragments_kept_verbatim() {
        let envelope: PageEnvelope = serde_json::from_str(
            r#"{"paging":{"pageSize":1,"total":1},"issues":[{"b": 2,  "a":[1, 2],"unknown":null}]}"#,
        )
        .expect("should decode");

        assert_eq!(
            envelope.issues[0].get(),
            r#"{"b": 2,  "a":[1, 2],"unknown":null}"#
        );
    }

    #[tokio::test]
    async fn test_three_pages_for_1200_results() {
        let transport = ScriptedTransport::ok(vec![
            issues_page(1200, 500, 0, 500),
            issues_page(1200, 500, 500, 500),
            issues_page(1200, 500, 1000, 200),
        ]);

        let mut sizes = Vec::new();
        let summary = fetch_all_pages(&transport, "issues/search?projects=p", 500, |page| {
            sizes.push(page.issues.len());
        })
        .await
        .expect("fetch should succeed");

        assert_eq!(sizes, vec![500, 500, 200]);
        assert_eq!(
            summary,
            PageSummary {
                pages: 3,
                total_results: 1200
            }
        );
        assert_eq!(
            transport.requests(),
            vec![
                "issues/search?projects=p&p=1&ps=500",
                "issues/search?projects=p&p=2&ps=500",
                "issues/search?projects=p&p=3&ps=500",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_result_set_still_one_page() {
        let transport = ScriptedTransport::ok(vec![
            r#"{"paging":{"pageIndex":1,"pageSize":500,"total":0},"hotspots":[]}"#.to_string(),
        ]);

        let mut calls = 0;
        let summary = fetch_all_pages(&transport, "hotspots/search", 500, |page| {
            calls += 1;
            assert!(page.hotspots.is_empty());
        })
        .await
        .expect("fetch should succeed");

        assert_eq!(calls, 1);
        assert_eq!(summary.pages, 1);
        assert_eq!(transport.requests(), vec!["hotspots/search?p=1&ps=500"]);
    }

    #[tokio::test]
    async fn test_clamped_page_size_is_honored() {
        // Asked for 500 per page, service caps at 100.
        let transport = ScriptedTransport::ok(vec![
            issues_page(250, 100, 0, 100),
            issues_page(250, 100, 100, 100),
            issues_page(250, 100, 200, 50),
        ]);

        let mut calls = 0;
        fetch_all_pages(&transport, "issues/search", 500, |_| calls += 1)
            .await
            .expect("fetch should succeed");

        assert_eq!(calls, 3);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_totals_is_schema_error() {
        let transport = ScriptedTransport::ok(vec![r#"{"issues":[{"key":"A"}]}"#.to_string()]);

        let mut calls = 0;
        let result = fetch_all_pages(&transport, "issues/search", 500, |_| calls += 1).await;

        match result {
            Err(SonarError::Schema {
                missing,
                api_path,
                page,
                response,
            }) => {
                assert_eq!(missing, "total result count");
                assert_eq!(api_path, "issues/search");
                assert_eq!(page, 1);
                assert!(response.contains("\"key\":\"A\""));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
        assert_eq!(calls, 0);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_page_size_is_schema_error() {
        let transport = ScriptedTransport::ok(vec![r#"{"total":10,"issues":[]}"#.to_string()]);

        let result = fetch_all_pages(&transport, "issues/search", 500, |_| {}).await;

        assert!(matches!(
            result,
            Err(SonarError::Schema {
                missing: "page size",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_schema_error_truncates_response() {
        let padding = "x".repeat(2000);
        let transport =
            ScriptedTransport::ok(vec![format!(r#"{{"issues":[],"padding":"{padding}"}}"#)]);

        let result = fetch_all_pages(&transport, "issues/search", 500, |_| {}).await;

        match result {
            Err(SonarError::Schema { response, .. }) => {
                assert_eq!(response.chars().count(), 503);
                assert!(response.ends_with("..."));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let transport = ScriptedTransport::ok(vec!["<html>maintenance</html>".to_string()]);

        let result = fetch_all_pages(&transport, "issues/search", 500, |_| {}).await;

        assert!(matches!(result, Err(SonarError::Decode { page: 1, .. })));
    }

    #[tokio::test]
    async fn test_transport_error_stops_fetch() {
        let transport = ScriptedTransport::new(vec![
            Ok(issues_page(1200, 500, 0, 500)),
            Err(SonarError::EmptyResponse {
                status: 500,
                url: "https://sonarcloud.io/api/issues/search?p=2&ps=500".to_string(),
            }),
            Ok(issues_page(1200, 500, 1000, 200)),
        ]);

        let mut calls = 0;
        let result = fetch_all_pages(&transport, "issues/search", 500, |_| calls += 1).await;

        assert!(matches!(
            result,
            Err(SonarError::EmptyResponse { status: 500, .. })
        ));
        assert_eq!(calls, 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_requested_page_size_rejected() {
        let transport = ScriptedTransport::ok(vec![]);

        let result = fetch_all_pages(&transport, "issues/search", 0, |_| {}).await;

        assert!(matches!(result, Err(SonarError::InvalidConfig(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_pages_arrive_in_order() {
        let bodies: Vec<String> = (1..=4)
            .map(|p| {
                format!(
                    r#"{{"paging":{{"pageIndex":{p},"pageSize":2,"total":7}},"issues":[{{"page":{p}}}]}}"#
                )
            })
            .collect();
        let transport = ScriptedTransport::ok(bodies);

        let mut seen = Vec::new();
        fetch_all_pages(&transport, "issues/search", 2, |page| {
            seen.push(page.reported_page_index().expect("page index"));
        })
        .await
        .expect("fetch should succeed");

        assert_eq!(seen, vec![1, 2, 3, 4]);
    }
}

// ============================================================================
// Property-Based Testing with Proptest
// ============================================================================
