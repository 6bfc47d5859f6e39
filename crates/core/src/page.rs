//! The article record and the requests that populate it.
//!
//! A [`Page`] starts from a title, a page id, or a Wikidata id and is filled
//! in by up to five requests: `action=query`, `action=parse`, the REST
//! mobile-text endpoint, `wbgetentities`, and a second `wbgetentities` that
//! resolves entity-valued claims to labels. Each response is cached on the
//! page, and a repeated call is a logged no-op.
//!
//! # Example
//!
//! ```rust,no_run
//! use wikipage_core::Page;
//!
//! # #[tokio::main]
//! # async fn main() -> wikipage_core::Result<()> {
//! let mut page = Page::new("Ada Lovelace")?;
//! page.get().await?;
//! page.show();
//! println!("{:?}", page.description);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::endpoint::{EntityTarget, Site, Target, WIKIDATA_PROPS};
use crate::fetch::{FetchConfig, Fetcher, Response};
use crate::infobox::Infobox;
use crate::{Result, WikiError};

/// Most ids `wbgetentities` accepts in one request.
pub const MAX_ENTITY_IDS: usize = 50;

/// Raw responses kept on the page, one slot per request kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Requests {
    /// `action=query` (`g_query`).
    pub query: Option<Response>,
    /// `action=parse` (`g_parse`).
    pub parse: Option<Response>,
    /// REST mobile-text (`g_rest`).
    pub rest: Option<Response>,
    /// `wbgetentities` for the page entity (`g_wikidata`).
    pub wikidata: Option<Response>,
    /// `wbgetentities` for claim labels, one per batch of ids (`g_claims`).
    pub claims: Vec<Response>,
}

/// Configuration for a [`Page`].
///
/// # Example
///
/// ```rust
/// use wikipage_core::PageConfig;
///
/// let config = PageConfig::builder().title("Tour Eiffel").lang("fr").silent(true).build();
/// assert_eq!(config.lang, "fr");
/// ```
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Article title; spaces become underscores.
    pub title: Option<String>,
    /// Wikipedia page id.
    pub pageid: Option<u64>,
    /// Wikidata entity id (`Q...`).
    pub wikibase: Option<String>,
    /// Language code (default: `en`).
    pub lang: String,
    /// Language variant, e.g. `zh-tw`.
    pub variant: Option<String>,
    /// Custom wiki host instead of `{lang}.wikipedia.org`.
    pub wiki: Option<String>,
    /// Suppress [`Page::show`] output.
    pub silent: bool,
    /// Verbose diagnostics.
    pub verbose: bool,
    /// HTTP settings.
    pub fetch: FetchConfig,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: None,
            pageid: None,
            wikibase: None,
            lang: "en".to_string(),
            variant: None,
            wiki: None,
            silent: false,
            verbose: false,
            fetch: FetchConfig::default(),
        }
    }
}

impl PageConfig {
    /// Creates a new builder for PageConfig.
    pub fn builder() -> PageConfigBuilder {
        PageConfigBuilder::new()
    }
}

/// Builder for PageConfig.
pub struct PageConfigBuilder {
    config: PageConfig,
}

impl PageConfigBuilder {
    pub fn new() -> Self {
        Self { config: PageConfig::default() }
    }

    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.config.title = Some(value.into());
        self
    }

    pub fn pageid(mut self, value: u64) -> Self {
        self.config.pageid = Some(value);
        self
    }

    pub fn wikibase(mut self, value: impl Into<String>) -> Self {
        self.config.wikibase = Some(value.into());
        self
    }

    pub fn lang(mut self, value: impl Into<String>) -> Self {
        self.config.lang = value.into();
        self
    }

    pub fn variant(mut self, value: impl Into<String>) -> Self {
        self.config.variant = Some(value.into());
        self
    }

    pub fn wiki(mut self, value: impl Into<String>) -> Self {
        self.config.wiki = Some(value.into());
        self
    }

    pub fn silent(mut self, value: bool) -> Self {
        self.config.silent = value;
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.config.verbose = value;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    pub fn proxy(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.proxy = Some(value.into());
        self
    }

    pub fn build(self) -> PageConfig {
        self.config
    }
}

impl Default for PageConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An article assembled from the query, parse, REST and Wikidata APIs.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: Option<String>,
    #[serde(flatten)]
    pub site: Site,
    pub pageid: Option<u64>,
    pub wikibase: Option<String>,
    pub wikidata_url: Option<String>,
    pub url: Option<String>,
    pub urlraw: Option<String>,
    pub description: Option<String>,
    pub label: Option<String>,
    pub extract: Option<String>,
    pub extext: Option<String>,
    pub image: Option<String>,
    pub image_infobox: Option<String>,
    pub image_wikidata: Option<String>,
    pub pageimage: Option<String>,
    pub thumbnail: Option<String>,
    /// Image data by source: `qimage`, `qthumb`, `pimage`, `rimage`, `rthumb`, `wimage`.
    pub images: BTreeMap<String, Value>,
    pub infobox: Option<Infobox>,
    pub links: Vec<String>,
    pub parsetree: Option<String>,
    pub wikitext: Option<String>,
    pub lead: Option<String>,
    pub modified: Option<String>,
    /// A random title, returned with every query request.
    pub random: Option<String>,
    /// Unresolved entity claims: entity id to property label.
    pub claims: BTreeMap<String, String>,
    /// Selected Wikidata property values by property id.
    pub props: BTreeMap<String, Vec<Value>>,
    /// Resolved Wikidata values by property label.
    pub wikidata: BTreeMap<String, Value>,
    /// Set when a response could not be decoded.
    pub fatal: bool,
    pub silent: bool,
    pub verbose: bool,
    #[serde(skip)]
    pub requests: Requests,
    #[serde(skip)]
    fetcher: Fetcher,
}

impl Page {
    /// A page on English Wikipedia addressed by title.
    pub fn new(title: &str) -> Result<Self> {
        Self::with_config(PageConfig::builder().title(title).build())
    }

    pub fn with_config(config: PageConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch)?;

        Ok(Self {
            title: config.title.filter(|t| !t.is_empty()).map(|t| underscore(&t)),
            site: Site { lang: config.lang, variant: config.variant, wiki: config.wiki },
            pageid: config.pageid,
            wikibase: config.wikibase,
            wikidata_url: None,
            url: None,
            urlraw: None,
            description: None,
            label: None,
            extract: None,
            extext: None,
            image: None,
            image_infobox: None,
            image_wikidata: None,
            pageimage: None,
            thumbnail: None,
            images: BTreeMap::new(),
            infobox: None,
            links: Vec::new(),
            parsetree: None,
            wikitext: None,
            lead: None,
            modified: None,
            random: None,
            claims: BTreeMap::new(),
            props: BTreeMap::new(),
            wikidata: BTreeMap::new(),
            fatal: false,
            silent: config.silent,
            verbose: config.verbose,
            requests: Requests::default(),
            fetcher,
        })
    }

    pub fn lang(&self) -> &str {
        &self.site.lang
    }

    /// Set timeout for entire requests in seconds (0 waits forever).
    pub fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        self.fetcher.set_timeout(seconds)
    }

    fn has_identifier(&self) -> bool {
        self.title.is_some() || self.pageid.is_some() || self.wikibase.is_some()
    }

    fn target(&self, operation: &'static str) -> Result<Target<'_>> {
        match (self.pageid, self.title.as_deref()) {
            (Some(id), _) => Ok(Target::PageId(id)),
            (None, Some(title)) => Ok(Target::Title(title)),
            (None, None) => Err(WikiError::MissingIdentifier { operation, needs: "title or pageid" }),
        }
    }

    /// Make every request needed to populate the page.
    ///
    /// Without any identifier a random article is chosen first. A page known
    /// only by its Wikidata id asks Wikidata first, so the title is known for
    /// the other requests.
    pub async fn get(&mut self) -> Result<()> {
        if !self.has_identifier() {
            self.get_random().await?;
        }

        if self.wikidata_first() {
            self.get_wikidata().await?;
            self.get_query().await?;
            self.get_parse().await?;
        } else {
            self.get_query().await?;
            self.get_parse().await?;
            self.get_wikidata().await?;
        }

        Ok(())
    }

    /// `action=query`: extract, extext, page image, thumbnail, page id,
    /// wikibase, canonical URL and a random title.
    pub async fn get_query(&mut self) -> Result<()> {
        if self.requests.query.is_some() {
            info!("Request cached in g_query.");
            return Ok(());
        }

        let url = self.site.query_url(self.target("get_query")?);
        let response = self.fetcher.fetch(&url).await?;
        self.apply_query(response)
    }

    /// `action=parse`: infobox, infobox image, interwiki links, page id,
    /// parse tree, wikibase and wikitext.
    pub async fn get_parse(&mut self) -> Result<()> {
        if self.requests.parse.is_some() {
            info!("Request cached in g_parse.");
            return Ok(());
        }

        let url = self.site.parse_url(self.target("get_parse")?);
        let response = self.fetcher.fetch(&url).await?;
        self.apply_parse(response)
    }

    /// REST mobile-text: description, images, lead HTML, modified date and
    /// canonical URL.
    pub async fn get_rest(&mut self) -> Result<()> {
        if self.requests.rest.is_some() {
            info!("Request cached in g_rest.");
            return Ok(());
        }

        let title = self
            .title
            .as_deref()
            .ok_or(WikiError::MissingIdentifier { operation: "get_rest", needs: "a title" })?;
        let url = self.site.rest_url("page/mobile-text", title)?;
        let response = self.fetcher.fetch(&url).await?;
        self.apply_rest(response)
    }

    /// `wbgetentities`: claims, description, image, label, modified date,
    /// properties and title; then resolves claim labels.
    pub async fn get_wikidata(&mut self) -> Result<()> {
        if self.requests.wikidata.is_some() {
            info!("Request cached in g_wikidata.");
            return Ok(());
        }

        let url = if let Some(wikibase) = &self.wikibase {
            self.site.wikidata_url(EntityTarget::Ids(wikibase), WIKIDATA_PROPS)
        } else if let Some(title) = &self.title {
            self.site.wikidata_url(EntityTarget::SiteTitle(title), WIKIDATA_PROPS)
        } else {
            warn!("get_wikidata: need wikibase or lang and title");
            return Ok(());
        };

        let response = self.fetcher.fetch(&url).await?;
        self.apply_wikidata(response)?;

        if !self.claims.is_empty() {
            self.get_claims().await?;
        }

        Ok(())
    }

    /// Resolve entity-valued claims to labels, e.g. `{Q298: country}`
    /// becomes `country: Chile`.
    pub async fn get_claims(&mut self) -> Result<()> {
        if self.claims.is_empty() {
            return Ok(());
        }
        if !self.requests.claims.is_empty() {
            info!("Request cached in g_claims.");
            return Ok(());
        }

        // g_claims is filled only once every batch has arrived.
        let mut responses = Vec::new();
        for url in self.claims_urls() {
            responses.push(self.fetcher.fetch(&url).await?);
        }

        for response in responses {
            self.apply_claims(response)?;
        }

        Ok(())
    }

    /// Label requests for the entity ids in `claims`, [`MAX_ENTITY_IDS`] per request.
    pub fn claims_urls(&self) -> Vec<String> {
        let ids: Vec<&str> = self.claims.keys().map(String::as_str).collect();
        ids.chunks(MAX_ENTITY_IDS)
            .map(|chunk| self.site.wikidata_url(EntityTarget::Ids(&chunk.join("|")), "labels"))
            .collect()
    }

    /// A page known only by its Wikidata id asks Wikidata before the
    /// query and parse APIs.
    fn wikidata_first(&self) -> bool {
        self.wikibase.is_some() && self.title.is_none()
    }

    /// `list=random`: a random article's page id and, if unset, its title.
    pub async fn get_random(&mut self) -> Result<()> {
        let url = self.site.random_url();
        let response = self.fetcher.fetch(&url).await?;
        self.apply_random(&response)
    }

    /// Decode a response body, marking the page fatal if it is not the
    /// expected JSON.
    pub(crate) fn decode<T: DeserializeOwned>(&mut self, response: &Response) -> Option<T> {
        match serde_json::from_str(&response.response) {
            Ok(data) => Some(data),
            Err(e) => {
                self.fatal = true;
                error!(query = %response.query, "Could not load query response: {}", e);
                None
            }
        }
    }

    /// Keep `image` from the first source that has one; a different image
    /// from a later source goes to that source's alternate slot.
    pub(crate) fn merge_image(&mut self, url: String, alternate: ImageSource) {
        match &self.image {
            None => self.image = Some(url),
            Some(current) if *current == url => {}
            Some(_) => match alternate {
                ImageSource::Infobox => self.image_infobox = Some(url),
                ImageSource::Wikidata => self.image_wikidata = Some(url),
            },
        }
    }

    pub(crate) fn set_wikibase(&mut self, wikibase: &str) {
        self.wikibase = Some(wikibase.to_string());
        self.wikidata_url = Some(crate::media::wikidata_url(wikibase));
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.urlraw = Some(format!("{}?action=raw", url));
        self.url = Some(url);
    }

    /// Add a Wikidata value under `label`, turning repeated labels into lists.
    pub(crate) fn update_wikidata(&mut self, label: &str, value: Value) {
        match self.wikidata.get_mut(label) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.wikidata.insert(label.to_string(), value);
            }
        }
    }
}

/// Which source supplied an image, for [`Page::merge_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageSource {
    Infobox,
    Wikidata,
}

/// Titles are stored with underscores, as they appear in URLs.
pub(crate) fn underscore(title: &str) -> String {
    title.replace(' ', "_")
}
