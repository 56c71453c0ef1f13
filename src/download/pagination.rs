//! Offset-based pagination over listing endpoints.

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::api::{DeviantArtApi, PageResponse};
use crate::error::{Error, Result};

/// One fetched batch.
#[derive(Debug)]
pub struct Page<T> {
    /// Offset this page was requested at.
    pub offset: u64,
    pub results: Vec<T>,
    pub has_more: bool,
    /// Server-chosen offset of the following page.
    pub next_offset: Option<u64>,
}

/// Walks a listing endpoint page by page.
///
/// The server is the offset authority: the walker always continues at the
/// `next_offset` it was given. It stops when the server reports no more
/// results or returns an empty batch, and pauses between pages. A batch that
/// claims more results without an offset is still returned; the call after it
/// fails with [`Error::Protocol`].
pub struct PageWalker<'a, T> {
    api: &'a DeviantArtApi,
    url: String,
    params: Vec<(String, String)>,
    offset: u64,
    limit: u32,
    pause: Duration,
    started: bool,
    stalled: bool,
    finished: bool,
    _entry: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> PageWalker<'a, T> {
    pub fn new(
        api: &'a DeviantArtApi,
        url: impl Into<String>,
        offset: u64,
        limit: u32,
        pause: Duration,
    ) -> Self {
        Self {
            api,
            url: url.into(),
            params: Vec::new(),
            offset,
            limit,
            pause,
            started: false,
            stalled: false,
            finished: false,
            _entry: PhantomData,
        }
    }

    /// Add a query parameter sent with every page.
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Offset the next page will be requested at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Page<T>>> {
        if self.finished {
            return Ok(None);
        }

        if self.stalled {
            self.finished = true;
            return Err(Error::Protocol {
                url: self.url.clone(),
                message: format!("has_more without next_offset after offset {}", self.offset),
            });
        }

        if self.started {
            sleep(self.pause).await;
        }
        self.started = true;

        let mut params = self.params.clone();
        params.push(("offset".to_string(), self.offset.to_string()));
        params.push(("limit".to_string(), self.limit.to_string()));

        let response: PageResponse<T> = self.api.request(&self.url, &params).await?;

        if response.results.is_empty() {
            tracing::info!("No results from {} at offset {}", self.url, self.offset);
            self.finished = true;
            return Ok(None);
        }

        let page = Page {
            offset: self.offset,
            results: response.results,
            has_more: response.has_more,
            next_offset: response.next_offset,
        };

        match (page.has_more, page.next_offset) {
            (true, Some(next)) => self.offset = next,
            // Hand out the batch, fail on the following call.
            (true, None) => self.stalled = true,
            (false, _) => self.finished = true,
        }

        Ok(Some(page))
    }

    /// Drain every remaining page into one list.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page.results);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FriendEntry, RetryPolicy};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_api(server: &MockServer) -> DeviantArtApi {
        DeviantArtApi::new(
            &server.uri(),
            "id".into(),
            "secret".into(),
            RetryPolicy::new(2, Duration::ZERO, Duration::ZERO),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn friends(names: &[&str], has_more: bool, next_offset: Option<u64>) -> serde_json::Value {
        json!({
            "results": names.iter().map(|n| json!({"user": {"username": n}})).collect::<Vec<_>>(),
            "has_more": has_more,
            "next_offset": next_offset,
        })
    }

    #[tokio::test]
    async fn test_follows_server_offsets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(friends(
                &["alice", "bob"],
                true,
                Some(7),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("offset", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(friends(
                &["carol"],
                false,
                None,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server);
        let walker: PageWalker<FriendEntry> =
            PageWalker::new(&api, format!("{}/list", server.uri()), 0, 2, Duration::ZERO);
        let names: Vec<String> = walker
            .collect_all()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.user.username)
            .collect();

        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_stops_when_has_more_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(friends(
                &["alice"],
                false,
                Some(24),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server);
        let mut walker: PageWalker<FriendEntry> = PageWalker::new(
            &api,
            format!("{}/list", server.uri()),
            0,
            24,
            Duration::ZERO,
        );

        let page = walker.next_page().await.unwrap().unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(!page.has_more);
        assert!(walker.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_graceful_stop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("username", "alice"))
            .and(query_param("offset", "48"))
            .respond_with(ResponseTemplate::new(200).set_body_json(friends(&[], true, Some(72))))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_api(&server);
        let mut walker: PageWalker<FriendEntry> = PageWalker::new(
            &api,
            format!("{}/list", server.uri()),
            48,
            24,
            Duration::ZERO,
        )
        .with_param("username", "alice");

        assert!(walker.next_page().await.unwrap().is_none());
        assert!(walker.next_page().await.unwrap().is_none());
        assert_eq!(walker.offset(), 48);
    }

    #[tokio::test]
    async fn test_has_more_without_offset_yields_batch_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(friends(
                &["alice"],
                true,
                None,
            )))
            .mount(&server)
            .await;

        let api = test_api(&server);
        let mut walker: PageWalker<FriendEntry> = PageWalker::new(
            &api,
            format!("{}/list", server.uri()),
            0,
            24,
            Duration::ZERO,
        );

        let page = walker.next_page().await.unwrap().unwrap();
        assert_eq!(page.results[0].user.username, "alice");
        assert_eq!(page.next_offset, None);

        assert!(matches!(
            walker.next_page().await,
            Err(Error::Protocol { .. })
        ));
        assert!(walker.next_page().await.unwrap().is_none());
    }
}
