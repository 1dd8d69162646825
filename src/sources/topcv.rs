use async_trait::async_trait;
use metrics::counter;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::ListingSource;
use crate::config::CrawlerConfig;
use crate::constants::{DEFAULT_CRAWLED_SALARY, TOPCV_SOURCE};
use crate::error::{PipelineError, Result};
use crate::types::RawRecord;

/// Crawls the paginated "best jobs" listing on TopCV
pub struct TopCvSource {
    client: reqwest::Client,
    config: CrawlerConfig,
}

impl TopCvSource {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "{}{}?page={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.listing_path,
            page
        )
    }

    async fn fetch_page(&self, page: u32) -> Result<String> {
        let url = self.page_url(page);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    fn delay(&self) -> Duration {
        let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
        let millis = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        Duration::from_millis(millis)
    }
}

#[async_trait]
impl ListingSource for TopCvSource {
    fn source_name(&self) -> &'static str {
        TOPCV_SOURCE
    }

    #[instrument(skip(self), fields(max_pages = self.config.max_pages))]
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();

        for page in 1..=self.config.max_pages {
            let html = match self.fetch_page(page).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Request for page {} failed, stopping crawl: {}", page, e);
                    counter!("jobs_crawl_errors_total").increment(1);
                    break;
                }
            };

            let listing = parse_listing_page(&html, &self.config.base_url)?;
            if listing.item_count == 0 {
                if page == 1 {
                    warn!("No listings found on the first page");
                } else {
                    info!("Page {} is empty, crawl complete", page);
                }
                break;
            }

            info!(
                "Page {}: {} items, {} with links",
                page,
                listing.item_count,
                listing.records.len()
            );
            counter!("jobs_crawl_pages_total").increment(1);
            counter!("jobs_crawl_records_total").increment(listing.records.len() as u64);
            records.extend(listing.records);

            if page < self.config.max_pages {
                tokio::time::sleep(self.delay()).await;
            }
        }

        info!("Crawled {} records from {}", records.len(), TOPCV_SOURCE);
        Ok(records)
    }
}

/// Listings extracted from one page
#[derive(Debug, Default)]
pub struct ListingPage {
    /// `.job-ta` items on the page, including ones skipped for lacking a link
    pub item_count: usize,
    pub records: Vec<RawRecord>,
}

struct ListingSelectors {
    item: Selector,
    avatar_title: Selector,
    span_title: Selector,
    link: Selector,
    company: Selector,
    salary: Selector,
    address: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            item: selector(".job-ta")?,
            avatar_title: selector("div.avatar a img[title]")?,
            span_title: selector("h3.title span[data-original-title]")?,
            link: selector("h3.title a[href]")?,
            company: selector("span.company-name")?,
            salary: selector("label.title-salary")?,
            address: selector("label.address")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PipelineError::Source {
        source_name: TOPCV_SOURCE.to_string(),
        message: format!("invalid selector '{}': {}", css, e),
    })
}

/// Extracts the job cards of one listing page. Items without a link are
/// counted but not returned.
pub fn parse_listing_page(html: &str, base_url: &str) -> Result<ListingPage> {
    let selectors = ListingSelectors::new()?;
    let document = Html::parse_document(html);
    let base_url = base_url.trim_end_matches('/');

    let mut page = ListingPage::default();
    for item in document.select(&selectors.item) {
        page.item_count += 1;

        let Some(href) = item
            .select(&selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
        else {
            debug!("Skipping listing without link");
            continue;
        };
        let external_link = if href.starts_with('/') {
            format!("{}{}", base_url, href)
        } else {
            href.to_string()
        };

        let job_title = item
            .select(&selectors.avatar_title)
            .next()
            .and_then(|img| img.value().attr("title"))
            .or_else(|| {
                item.select(&selectors.span_title)
                    .next()
                    .and_then(|span| span.value().attr("data-original-title"))
            })
            .map(|t| t.trim().to_string());

        let salary = first_text(&item, &selectors.salary)
            .unwrap_or_else(|| DEFAULT_CRAWLED_SALARY.to_string());

        page.records.push(RawRecord {
            job_title,
            company: first_text(&item, &selectors.company),
            salary: Some(salary),
            address: first_text(&item, &selectors.address),
            external_link,
        });
    }
    Ok(page)
}

/// Text of the first match with each text node trimmed and joined
fn first_text(item: &ElementRef, selector: &Selector) -> Option<String> {
    item.select(selector).next().map(|el| {
        el.text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<String>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html><body>
      <div class="job-ta">
        <div class="avatar"><a href="/x"><img title="Senior Python Developer" src="a.png"></a></div>
        <h3 class="title"><a href="/viec-lam/senior-python-123.html"><span>Senior Python Developer</span></a></h3>
        <span class="company-name"> Acme JSC </span>
        <label class="title-salary">15 - 25 triệu</label>
        <label class="address"><span>Hà Nội: Cầu Giấy</span></label>
      </div>
      <div class="job-ta">
        <h3 class="title">
          <a href="https://other.example.com/job/9"><span data-original-title="QA Engineer">QA...</span></a>
        </h3>
      </div>
      <div class="job-ta">
        <h3 class="title"><span>No link here</span></h3>
      </div>
    </body></html>
    "#;

    #[test]
    fn test_parse_listing_page() {
        let page = parse_listing_page(PAGE, "https://www.topcv.vn").unwrap();
        assert_eq!(page.item_count, 3);
        assert_eq!(page.records.len(), 2);

        let first = &page.records[0];
        assert_eq!(first.job_title.as_deref(), Some("Senior Python Developer"));
        assert_eq!(
            first.external_link,
            "https://www.topcv.vn/viec-lam/senior-python-123.html"
        );
        assert_eq!(first.company.as_deref(), Some("Acme JSC"));
        assert_eq!(first.salary.as_deref(), Some("15 - 25 triệu"));
        assert_eq!(first.address.as_deref(), Some("Hà Nội: Cầu Giấy"));
    }

    #[test]
    fn test_fallbacks_for_missing_fields() {
        let page = parse_listing_page(PAGE, "https://www.topcv.vn/").unwrap();
        let second = &page.records[1];
        assert_eq!(second.job_title.as_deref(), Some("QA Engineer"));
        assert_eq!(second.external_link, "https://other.example.com/job/9");
        assert_eq!(second.company, None);
        assert_eq!(second.address, None);
        assert_eq!(second.salary.as_deref(), Some("Thoả thuận"));
    }

    #[test]
    fn test_empty_page() {
        let page = parse_listing_page("<html><body><p>nothing</p></body></html>", "https://www.topcv.vn").unwrap();
        assert_eq!(page.item_count, 0);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_page_url() {
        let source = TopCvSource::new(CrawlerConfig {
            base_url: "https://www.topcv.vn/".to_string(),
            ..CrawlerConfig::default()
        })
        .unwrap();
        assert_eq!(source.page_url(2), "https://www.topcv.vn/viec-lam-tot-nhat?page=2");
        assert_eq!(source.source_name(), "topcv");
    }

    #[test]
    fn test_delay_within_bounds() {
        let source = TopCvSource::new(CrawlerConfig {
            min_delay_ms: 10,
            max_delay_ms: 20,
            ..CrawlerConfig::default()
        })
        .unwrap();
        for _ in 0..20 {
            let delay = source.delay().as_millis();
            assert!((10..=20).contains(&delay));
        }
    }
}
