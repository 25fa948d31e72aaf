//! The collection pipeline.
//!
//! 1. **Homepage**: make sure `homepage.html` is cached, then pull the
//!    trending links out of it
//! 2. **Articles**: for each link, make sure `<slug>.html` is cached and
//!    extract its record
//! 3. **Output**: once every article is done, write the records as JSON
//!
//! Articles run through an ordered buffered stream, so with `concurrency > 1`
//! several pages are fetched at once but records still come out in trending
//! order. Under [`FailurePolicy::Abort`] the first failing article ends the
//! run before anything is written.

use crate::cache::{PageCache, PageStore};
use crate::config::{CachePolicy, CollectorConfig, FailurePolicy};
use crate::error::{CollectError, CollectResult, ConfigError};
use crate::fetcher::Fetch;
use crate::models::{ArticleLink, ArticleRecord, HOMEPAGE_KEY};
use crate::outputs::json;
use crate::scrapers::{extract_article, extract_trending_links};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Drives one collection run: homepage, trending links, article pages, JSON.
pub struct Collector<F, S> {
    fetcher: F,
    cache: PageCache<S>,
    base: Url,
    homepage_url: Url,
    homepage_policy: CachePolicy,
    article_policy: CachePolicy,
    concurrency: usize,
    failure_policy: FailurePolicy,
}

impl<F: Fetch, S: PageStore> Collector<F, S> {
    /// Build a collector from a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used for every page not already in the cache
    /// * `store` - Backing storage for cached pages
    /// * `config` - Site URLs, cache and failure policies, concurrency
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation or its URLs
    /// cannot be parsed.
    pub fn new(fetcher: F, store: S, config: &CollectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            cache: PageCache::new(store),
            base: config.base()?,
            homepage_url: config.homepage_url()?,
            homepage_policy: config.homepage_policy()?,
            article_policy: config.cache_policy()?,
            concurrency: config.concurrency,
            failure_policy: config.failure_policy,
        })
    }

    pub fn cache(&self) -> &PageCache<S> {
        &self.cache
    }

    /// Cache the homepage if needed and return its trending links.
    #[instrument(level = "info", skip(self), fields(url = %self.homepage_url))]
    pub async fn homepage_links(&self) -> CollectResult<Vec<ArticleLink>> {
        self.cache
            .ensure(
                &self.fetcher,
                HOMEPAGE_KEY,
                self.homepage_url.as_str(),
                self.homepage_policy,
            )
            .await?;
        let markup = self.cache.read(HOMEPAGE_KEY).await?;
        extract_trending_links(&markup).map_err(|source| CollectError::Extract {
            page: HOMEPAGE_KEY.to_string(),
            source,
        })
    }

    /// Cache one article page if needed and extract its record.
    ///
    /// # Arguments
    ///
    /// * `link` - An href from the trending list, site-relative or absolute
    ///
    /// # Returns
    ///
    /// The article's record, or an error if the link has no slug, resolves to
    /// another site, cannot be fetched, or does not match the article layout.
    #[instrument(level = "info", skip(self), fields(%link))]
    pub async fn collect_article(&self, link: &ArticleLink) -> CollectResult<ArticleRecord> {
        let key = link
            .cache_key()
            .ok_or_else(|| CollectError::InvalidLink(link.to_string()))?;
        let url = self
            .base
            .join(link.as_str())
            .map_err(|source| CollectError::Url {
                link: link.to_string(),
                source,
            })?;
        if url.origin() != self.base.origin() {
            return Err(CollectError::ForeignLink {
                link: link.to_string(),
                url: url.to_string(),
            });
        }

        self.cache
            .ensure(&self.fetcher, &key, url.as_str(), self.article_policy)
            .await?;
        let markup = self.cache.read(&key).await?;

        match extract_article(&markup) {
            Ok(record) => {
                info!(title = %record.title, "Collected article");
                Ok(record)
            }
            Err(source) => {
                debug!(preview = %truncate_for_log(&markup, 300), "Article markup did not match");
                Err(CollectError::Extract { page: key, source })
            }
        }
    }

    /// Collect every trending article, in trending order.
    ///
    /// With [`FailurePolicy::Abort`] the first failing article ends the run;
    /// with [`FailurePolicy::Skip`] it is logged and left out.
    #[instrument(level = "info", skip(self), fields(concurrency = self.concurrency))]
    pub async fn collect(&self) -> CollectResult<Vec<ArticleRecord>> {
        let links = self.homepage_links().await?;
        let total = links.len();

        let articles = stream::iter(links.iter())
            .map(|link| async move { (link, self.collect_article(link).await) })
            .buffered(self.concurrency);

        let records: Vec<ArticleRecord> = match self.failure_policy {
            FailurePolicy::Abort => articles.map(|(_, result)| result).try_collect::<Vec<_>>().await?,
            FailurePolicy::Skip => {
                articles
                    .filter_map(|(link, result)| async move {
                        match result {
                            Ok(record) => Some(record),
                            Err(e) => {
                                warn!(%link, error = %e, "Skipping article");
                                None
                            }
                        }
                    })
                    .collect()
                    .await
            }
        };

        info!(
            total,
            collected = records.len(),
            skipped = total - records.len(),
            "Finished collecting articles"
        );
        Ok(records)
    }

    /// Collect everything, then write the JSON document to `output`.
    ///
    /// Nothing is written unless collection succeeds.
    ///
    /// # Arguments
    ///
    /// * `output` - Path of the JSON file, replaced if it exists
    ///
    /// # Returns
    ///
    /// The number of records written.
    #[instrument(level = "info", skip(self), fields(output = %output.display()))]
    pub async fn run(&self, output: &Path) -> CollectResult<usize> {
        let records = self.collect().await?;
        json::write_records(&records, output).await?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileStore;
    use crate::cache::memory::MemoryStore;
    use crate::error::{ExtractError, FetchError};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const HOMEPAGE: &str = include_str!("../fixtures/homepage.html");
    const STM: &str = include_str!("../fixtures/stm-blue-line-extension-delayed.html");
    const QUEBEC: &str = include_str!("../fixtures/quebec-tables-french-services-bill.html");
    const HABS: &str = include_str!("../fixtures/canadiens-edge-bruins-in-overtime.html");
    const NO_AUTHOR: &str = include_str!("../fixtures/article_missing_author.html");

    const HOMEPAGE_URL: &str = "https://montrealgazette.com/category/news/";
    const STM_URL: &str =
        "https://montrealgazette.com/news/local-news/stm-blue-line-extension-delayed";
    const QUEBEC_URL: &str =
        "https://montrealgazette.com/news/quebec/quebec-tables-french-services-bill";
    const HABS_URL: &str =
        "https://montrealgazette.com/sports/hockey/nhl/canadiens/canadiens-edge-bruins-in-overtime";

    struct Page {
        status: u16,
        body: &'static str,
        delay: Duration,
    }

    /// Serves canned pages by URL and records every request.
    #[derive(Default)]
    struct FixtureFetcher {
        pages: HashMap<String, Page>,
        requests: Mutex<Vec<String>>,
    }

    impl FixtureFetcher {
        fn site() -> Self {
            Self::default()
                .page(HOMEPAGE_URL, HOMEPAGE)
                .page(STM_URL, STM)
                .page(QUEBEC_URL, QUEBEC)
                .page(HABS_URL, HABS)
        }

        fn page(mut self, url: &str, body: &'static str) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    status: 200,
                    body,
                    delay: Duration::ZERO,
                },
            );
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    status,
                    body: "",
                    delay: Duration::ZERO,
                },
            );
            self
        }

        fn delay(mut self, url: &str, delay: Duration) -> Self {
            if let Some(page) = self.pages.get_mut(url) {
                page.delay = delay;
            }
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetch for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            let page = self.pages.get(url).ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            })?;
            tokio::time::sleep(page.delay).await;
            if page.status != 200 {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::from_u16(page.status).unwrap(),
                });
            }
            Ok(page.body.to_string())
        }
    }

    fn config(yaml: &str) -> CollectorConfig {
        CollectorConfig::from_yaml(yaml).unwrap()
    }

    fn titles(records: &[ArticleRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_run_writes_records_in_trending_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trending.json");
        let collector =
            Collector::new(FixtureFetcher::site(), MemoryStore::new(), &config("")).unwrap();

        let count = collector.run(&output).await.unwrap();
        assert_eq!(count, 3);

        let written: Vec<ArticleRecord> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written[0], crate::scrapers::extract_article(STM).unwrap());
        assert_eq!(
            titles(&written),
            vec![
                "STM Blue Line extension delayed again",
                "Quebec tables bill on French-language services",
                "Canadiens edge Bruins in overtime",
            ]
        );
        assert_eq!(written[2].author, "Stu Cowan");
        assert_eq!(
            written[1].blurb,
            "The legislation would tighten rules on services offered in other languages."
        );
    }

    #[tokio::test]
    async fn test_cached_pages_are_not_fetched_again() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trending.json");
        let cache_dir = dir.path().join("cache");

        let first = Collector::new(FixtureFetcher::site(), FileStore::new(&cache_dir), &config(""))
            .unwrap();
        first.run(&output).await.unwrap();
        assert_eq!(first.fetcher.requests().len(), 4);
        assert!(cache_dir.join("homepage.html").exists());
        assert!(cache_dir.join("canadiens-edge-bruins-in-overtime.html").exists());

        let second =
            Collector::new(FixtureFetcher::site(), FileStore::new(&cache_dir), &config(""))
                .unwrap();
        let records = second.collect().await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(second.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_homepage_refetches_only_homepage() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let first = Collector::new(FixtureFetcher::site(), FileStore::new(&cache_dir), &config(""))
            .unwrap();
        first.collect().await.unwrap();

        let second = Collector::new(
            FixtureFetcher::site(),
            FileStore::new(&cache_dir),
            &config("refresh_homepage: true"),
        )
        .unwrap();
        second.collect().await.unwrap();
        assert_eq!(second.fetcher.requests(), vec![HOMEPAGE_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_author_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trending.json");
        let fetcher = FixtureFetcher::site().page(QUEBEC_URL, NO_AUTHOR);
        let collector = Collector::new(fetcher, MemoryStore::new(), &config("")).unwrap();

        let err = collector.run(&output).await.unwrap_err();
        match err {
            CollectError::Extract { page, source } => {
                assert_eq!(page, "quebec-tables-french-services-bill.html");
                assert!(matches!(source, ExtractError::Missing { element: "published by", .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!output.exists());
        assert!(!collector.fetcher.requests().contains(&HABS_URL.to_string()));
    }

    #[tokio::test]
    async fn test_homepage_http_error_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trending.json");
        let fetcher = FixtureFetcher::site().status(HOMEPAGE_URL, 503);
        let collector = Collector::new(fetcher, MemoryStore::new(), &config("")).unwrap();

        let err = collector.run(&output).await.unwrap_err();
        assert!(matches!(err, CollectError::Fetch(FetchError::Status { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE));
        assert!(!output.exists());
        assert_eq!(collector.fetcher.requests(), vec![HOMEPAGE_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_article_http_error_stops_remaining_links() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trending.json");
        let fetcher = FixtureFetcher::site().status(STM_URL, 403);
        let collector = Collector::new(fetcher, MemoryStore::new(), &config("")).unwrap();

        assert!(collector.run(&output).await.is_err());
        assert!(!output.exists());
        assert_eq!(
            collector.fetcher.requests(),
            vec![HOMEPAGE_URL.to_string(), STM_URL.to_string()]
        );
    }

    #[tokio::test]
    async fn test_skip_policy_omits_failed_article() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("trending.json");
        let fetcher = FixtureFetcher::site()
            .page(QUEBEC_URL, NO_AUTHOR)
            .status(HABS_URL, 500);
        let collector =
            Collector::new(fetcher, MemoryStore::new(), &config("failure_policy: skip")).unwrap();

        let count = collector.run(&output).await.unwrap();
        assert_eq!(count, 1);
        let written: Vec<ArticleRecord> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(titles(&written), vec!["STM Blue Line extension delayed again"]);
    }

    #[tokio::test]
    async fn test_skip_policy_still_fails_on_homepage() {
        let fetcher = FixtureFetcher::site().page(HOMEPAGE_URL, "<html><body></body></html>");
        let collector =
            Collector::new(fetcher, MemoryStore::new(), &config("failure_policy: skip")).unwrap();

        let err = collector.collect().await.unwrap_err();
        assert!(matches!(err, CollectError::Extract { page, .. } if page == HOMEPAGE_KEY));
    }

    #[tokio::test]
    async fn test_concurrent_collection_preserves_order() {
        let fetcher = FixtureFetcher::site()
            .delay(STM_URL, Duration::from_millis(60))
            .delay(QUEBEC_URL, Duration::from_millis(30));
        let collector =
            Collector::new(fetcher, MemoryStore::new(), &config("concurrency: 3")).unwrap();

        let records = collector.collect().await.unwrap();
        assert_eq!(
            titles(&records),
            vec![
                "STM Blue Line extension delayed again",
                "Quebec tables bill on French-language services",
                "Canadiens edge Bruins in overtime",
            ]
        );
        // Requests still start in list order
        let requests = collector.fetcher.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[1], STM_URL);
    }

    #[tokio::test]
    async fn test_duplicate_links_fetch_once_under_concurrency() {
        let homepage = r#"
            <div class="list-widget list-widget-trending"><ol>
              <li><div class="article-card__details"><a href="/sports/hockey/nhl/canadiens/canadiens-edge-bruins-in-overtime">A</a></div></li>
              <li><div class="article-card__details"><a href="/sports/hockey/nhl/canadiens/canadiens-edge-bruins-in-overtime">B</a></div></li>
            </ol></div>
        "#;
        let fetcher = FixtureFetcher::site()
            .page(HOMEPAGE_URL, homepage)
            .delay(HABS_URL, Duration::from_millis(20));
        let collector =
            Collector::new(fetcher, MemoryStore::new(), &config("concurrency: 2")).unwrap();

        let records = collector.collect().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], records[1]);
        assert_eq!(collector.fetcher.requests(), vec![HOMEPAGE_URL, HABS_URL]);
        assert_eq!(collector.cache().store().writes(), 2);
    }

    #[tokio::test]
    async fn test_link_without_slug_is_rejected() {
        let collector =
            Collector::new(FixtureFetcher::site(), MemoryStore::new(), &config("")).unwrap();
        let err = collector
            .collect_article(&ArticleLink::new("/"))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::InvalidLink(_)));
    }

    #[tokio::test]
    async fn test_protocol_relative_link_to_other_host_is_rejected() {
        let collector =
            Collector::new(FixtureFetcher::site(), MemoryStore::new(), &config("")).unwrap();
        let err = collector
            .collect_article(&ArticleLink::new("//evil.example/x/y"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectError::ForeignLink { ref url, .. } if url == "https://evil.example/x/y"
        ));
        assert!(collector.fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_absolute_link_on_same_site_is_accepted() {
        let collector =
            Collector::new(FixtureFetcher::site(), MemoryStore::new(), &config("")).unwrap();
        let record = collector
            .collect_article(&ArticleLink::new(HABS_URL))
            .await
            .unwrap();

        assert_eq!(record.title, "Canadiens edge Bruins in overtime");
        assert_eq!(collector.fetcher.requests(), vec![HABS_URL]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Collector::new(
            FixtureFetcher::site(),
            MemoryStore::new(),
            &config("concurrency: 0"),
        );
        assert!(matches!(result, Err(ConfigError::Concurrency)));
    }
}
