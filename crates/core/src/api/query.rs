//! `action=query` and `list=random` responses.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::endpoint::strip_format;
use crate::fetch::Response;
use crate::html::html_to_markdown;
use crate::media::{COMMONS, media_url};
use crate::page::underscore;
use crate::{Page, Result, WikiError};

#[derive(Debug, Deserialize)]
struct QueryDocument {
    query: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    pages: Vec<QueryPage>,
    #[serde(default)]
    random: Vec<RandomPage>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    pageid: Option<u64>,
    title: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    pageimage: Option<String>,
    thumbnail: Option<Value>,
    pageprops: Option<PageProps>,
    fullurl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    wikibase_item: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RandomPage {
    id: Option<u64>,
    title: Option<String>,
}

impl Page {
    /// Store an `action=query` response and set the attributes it carries.
    ///
    /// Replaces `images` with the query's `qimage` / `qthumb`. A missing or
    /// invalid page is [`WikiError::NotFound`].
    pub fn apply_query(&mut self, response: Response) -> Result<()> {
        let document: Option<QueryDocument> = self.decode(&response);
        let query = strip_format(&response.query);
        self.requests.query = Some(response);

        let Some(document) = document else {
            return Ok(());
        };
        let data = document.query.ok_or_else(|| WikiError::NotFound(query.clone()))?;
        let page = data.pages.into_iter().next().ok_or_else(|| WikiError::NotFound(query.clone()))?;

        if page.missing || page.invalid {
            return Err(WikiError::NotFound(query));
        }

        if let Some(extract) = page.extract.filter(|e| !e.is_empty()) {
            let extext = html_to_markdown(&extract);
            let extext = extext.trim();
            if !extext.is_empty() {
                self.extext = Some(extext.to_string());
            }
            self.extract = Some(extract);
        }

        self.images.clear();

        if let Some(pageimage) = page.pageimage {
            self.pageimage = Some(media_url(&pageimage, COMMONS));
            self.images.insert("qimage".to_string(), Value::String(pageimage));
        }

        if let Some(thumbnail) = page.thumbnail {
            if let Some(source) = thumbnail.get("source").and_then(Value::as_str) {
                self.thumbnail = Some(source.to_string());
            }
            self.images.insert("qthumb".to_string(), thumbnail);
        }

        self.pageid = page.pageid;

        if let Some(wikibase) = page.pageprops.and_then(|p| p.wikibase_item) {
            self.set_wikibase(&wikibase);
        }

        self.random = data.random.into_iter().next().and_then(|r| r.title);

        if self.title.is_none() {
            self.title = page.title.map(|t| underscore(&t));
        }

        if let Some(url) = page.fullurl {
            self.set_url(url);
        }

        Ok(())
    }

    /// Set page id and, when unset, title from a `list=random` response.
    pub fn apply_random(&mut self, response: &Response) -> Result<()> {
        let Some(document) = self.decode::<QueryDocument>(response) else {
            return Ok(());
        };

        let Some(random) = document.query.and_then(|q| q.random.into_iter().next()) else {
            warn!(query = %response.query, "random query returned no pages");
            return Ok(());
        };

        self.pageid = random.id;
        if self.title.is_none() {
            self.title = random.title.map(|t| underscore(&t));
        }

        Ok(())
    }
}
