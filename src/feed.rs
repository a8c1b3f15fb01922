//! HTTP feed fetcher: downloads a feed and parses it as RSS 2.0, falling back to Atom.
//!
//! Items are flattened into [`FeedItem`] bags using the field names feed templates
//! conventionally use (`title`, `link`, `pubDate`, `isoDate`, `content`,
//! `contentSnippet`, ...). Fields the source document lacks are left out, so
//! templates render them as empty text.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use feed_readme_core::contract::{Feed, FeedItem, FeedSource};
use feed_readme_core::error::FeedError;
use reqwest::Client;
use tracing::{debug, error, info, warn};

/// [`FeedSource`] over plain HTTP(S).
pub struct HttpFeedSource {
    http: Client,
}

impl HttpFeedSource {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Feed, FeedError> {
        info!(url, "Fetching feed");
        let resp = self.http.get(url).send().await.map_err(|e| {
            error!(error = ?e, url, "Failed to fetch feed");
            FeedError::Request(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            error!(status = %status, url, "Feed server returned error status");
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;
        debug!(url, bytes = body.len(), "Feed downloaded");
        parse_feed(&body)
    }
}

/// Parse raw feed bytes as RSS, then as Atom.
pub fn parse_feed(bytes: &[u8]) -> Result<Feed, FeedError> {
    let rss_err = match rss::Channel::read_from(bytes) {
        Ok(channel) => {
            let items: Vec<FeedItem> = channel.items().iter().map(rss_item).collect();
            info!(kind = "rss", items = items.len(), "Parsed feed");
            return Ok(Feed {
                title: non_empty(channel.title()),
                items: Some(items),
            });
        }
        Err(e) => e,
    };
    debug!(error = %rss_err, "Not an RSS document, trying Atom");

    match atom_syndication::Feed::read_from(bytes) {
        Ok(feed) => {
            let items: Vec<FeedItem> = feed.entries().iter().map(atom_entry).collect();
            info!(kind = "atom", items = items.len(), "Parsed feed");
            Ok(Feed {
                title: non_empty(&feed.title().value),
                items: Some(items),
            })
        }
        Err(atom_err) => {
            warn!(rss_error = %rss_err, atom_error = %atom_err, "Feed is neither RSS nor Atom");
            Err(FeedError::Parse(format!("rss: {rss_err}; atom: {atom_err}")))
        }
    }
}

fn rss_item(item: &rss::Item) -> FeedItem {
    let mut out = FeedItem::new();
    insert_opt(&mut out, "title", item.title());
    insert_opt(&mut out, "link", item.link());
    insert_opt(&mut out, "author", item.author());
    insert_opt(&mut out, "comments", item.comments());
    insert_opt(&mut out, "summary", item.description());

    if let Some(pub_date) = non_empty_opt(item.pub_date()) {
        out.insert("pubDate", pub_date.as_str());
        if let Some(iso) = iso_date_rfc2822(&pub_date) {
            out.insert("isoDate", iso);
        }
    }

    if let Some(guid) = item.guid() {
        insert_opt(&mut out, "guid", Some(guid.value()));
        insert_opt(&mut out, "id", Some(guid.value()));
    }

    // content:encoded wins over description, like most readers
    let content = non_empty_opt(item.content()).or_else(|| non_empty_opt(item.description()));
    if let Some(content) = content {
        out.insert("contentSnippet", content_snippet(&content));
        out.insert("content", content);
    }

    if let Some(dc) = item.dublin_core_ext() {
        if let Some(creator) = dc.creators().iter().find(|c| !c.is_empty()) {
            out.insert("creator", creator.as_str());
        }
    }

    let categories: Vec<String> = item
        .categories()
        .iter()
        .map(|c| c.name().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !categories.is_empty() {
        out.insert("categories", categories);
    }
    out
}

fn atom_entry(entry: &atom_syndication::Entry) -> FeedItem {
    let mut out = FeedItem::new();
    insert_opt(&mut out, "title", Some(entry.title().value.as_str()));
    insert_opt(&mut out, "id", Some(entry.id()));

    let link = entry
        .links()
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| entry.links().first());
    if let Some(link) = link {
        insert_opt(&mut out, "link", Some(link.href()));
    }

    let date = entry.published().unwrap_or(entry.updated());
    out.insert("pubDate", date.to_rfc2822());
    out.insert(
        "isoDate",
        date.with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    );

    if let Some(author) = entry.authors().first() {
        insert_opt(&mut out, "author", Some(author.name()));
        insert_opt(&mut out, "creator", Some(author.name()));
    }

    let summary = entry.summary().map(|s| s.value.clone());
    if let Some(summary) = non_empty_opt(summary.as_deref()) {
        out.insert("summary", summary.as_str());
    }

    let content = entry
        .content()
        .and_then(|c| non_empty_opt(c.value()))
        .or(summary);
    if let Some(content) = content {
        out.insert("contentSnippet", content_snippet(&content));
        out.insert("content", content);
    }

    let categories: Vec<String> = entry
        .categories()
        .iter()
        .map(|c| c.term().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !categories.is_empty() {
        out.insert("categories", categories);
    }
    out
}

/// RFC 2822 date → ISO 8601 UTC with milliseconds (`2024-01-02T03:04:05.000Z`).
pub fn iso_date_rfc2822(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|d| {
            d.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .ok()
}

/// Markup stripped, whitespace collapsed around line breaks and trimmed.
pub fn content_snippet(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn non_empty_opt(s: Option<&str>) -> Option<String> {
    s.and_then(non_empty)
}

fn insert_opt(item: &mut FeedItem, name: &str, value: Option<&str>) {
    if let Some(v) = non_empty_opt(value) {
        item.insert(name, v);
    }
}
