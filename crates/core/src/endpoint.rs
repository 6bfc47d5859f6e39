//! Request URL construction for the MediaWiki action API, the REST API and
//! the Wikidata entity API.
//!
//! Every action API URL ends in `&format=json`, which [`strip_format`]
//! removes again when a URL is quoted in an error message.

use serde::Serialize;
use url::{Url, form_urlencoded};

use crate::{Result, WikiError};

/// Host serving the Wikidata entity API.
pub const WIKIDATA_HOST: &str = "www.wikidata.org";

/// Default `props` for `wbgetentities`.
pub const WIKIDATA_PROPS: &str = "info|claims|descriptions|labels|sitelinks";

const QUERY_PARAMS: &str = "action=query&exintro&formatversion=2&inprop=url&list=random&pithumbsize=240\
&ppprop=wikibase_item&prop=extracts|info|pageimages|pageprops&redirects&rnlimit=1&rnnamespace=0";

const PARSE_PARAMS: &str = "action=parse&formatversion=2&contentmodel=text&disableeditsection\
&disablelimitreport&disabletoc&prop=text|iwlinks|parsetree|wikitext|displaytitle|properties&redirects";

const RANDOM_PARAMS: &str = "action=query&formatversion=2&list=random&rnlimit=1&rnnamespace=0";

const REVISIONS_PARAMS: &str = "action=query&formatversion=2&prop=revisions&rvprop=content&rvslots=main&redirects";

/// How a page is addressed in the action API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Title(&'a str),
    PageId(u64),
}

/// How an entity is addressed in `wbgetentities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTarget<'a> {
    /// One or more entity ids joined with `|`.
    Ids(&'a str),
    /// A page title on the `{lang}wiki` site.
    SiteTitle(&'a str),
}

/// The wiki a page lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    /// Language code, also the subdomain of the default host.
    pub lang: String,
    /// Language variant passed through as `variant=`.
    pub variant: Option<String>,
    /// Custom host replacing `{lang}.wikipedia.org`.
    pub wiki: Option<String>,
}

impl Default for Site {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Site {
    pub fn new(lang: &str) -> Self {
        Self { lang: lang.to_string(), variant: None, wiki: None }
    }

    /// Host name serving the action and REST APIs.
    pub fn host(&self) -> String {
        match &self.wiki {
            Some(wiki) => {
                let wiki = wiki.trim_start_matches("https://").trim_start_matches("http://");
                wiki.trim_end_matches('/').to_string()
            }
            None => format!("{}.wikipedia.org", self.lang),
        }
    }

    /// `action=query` for extracts, page info, page images and page props.
    pub fn query_url(&self, target: Target<'_>) -> String {
        let params = format!("{}&{}", QUERY_PARAMS, target_param(target, "titles", "pageids"));
        self.action_url(&self.host(), &params, true)
    }

    /// `action=parse` for wikitext, parse tree, interwiki links and properties.
    pub fn parse_url(&self, target: Target<'_>) -> String {
        let params = format!("{}&{}", PARSE_PARAMS, target_param(target, "page", "pageid"));
        self.action_url(&self.host(), &params, true)
    }

    /// One random article from the main namespace.
    pub fn random_url(&self) -> String {
        self.action_url(&self.host(), RANDOM_PARAMS, true)
    }

    /// `action=wbgetentities` on Wikidata with the given `props`.
    pub fn wikidata_url(&self, target: EntityTarget<'_>, props: &str) -> String {
        let mut params = format!(
            "action=wbgetentities&formatversion=2&languages={}&props={}&redirects=yes",
            encode(&self.lang),
            props
        );

        match target {
            EntityTarget::Ids(ids) => {
                params.push_str("&ids=");
                params.push_str(&encode_list(ids.split('|')));
            }
            EntityTarget::SiteTitle(title) => {
                params.push_str(&format!("&sites={}wiki&titles={}", encode(&self.lang), encode(title)));
            }
        }

        self.action_url(WIKIDATA_HOST, &params, false)
    }

    /// REST API URL `https://{host}/api/rest_v1/{path}/{title}`.
    ///
    /// The title is percent-encoded as a single path segment, so titles
    /// containing `/` stay one segment.
    pub fn rest_url(&self, path: &str, title: &str) -> Result<String> {
        let base = format!("https://{}/api/rest_v1/", self.host());
        let mut url = Url::parse(&base).map_err(|e| WikiError::InvalidUrl(format!("{}: {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| WikiError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()))
            .push(title);

        Ok(url.to_string())
    }

    /// Revision content of several pages at once, for lead summaries.
    pub fn revisions_url<'a>(&self, titles: impl IntoIterator<Item = &'a str>) -> String {
        let params = format!("{}&titles={}", REVISIONS_PARAMS, encode_list(titles));
        self.action_url(&self.host(), &params, true)
    }

    fn action_url(&self, host: &str, params: &str, with_variant: bool) -> String {
        let mut url = format!("https://{}/w/api.php?{}", host, params);

        if with_variant && let Some(variant) = &self.variant {
            url.push_str("&variant=");
            url.push_str(&encode(variant));
        }

        url.push_str("&format=json");
        url
    }
}

/// Remove the `format` parameter from a request URL for display.
pub fn strip_format(query: &str) -> String {
    query.replace("&format=json", "")
}

fn target_param(target: Target<'_>, title_key: &str, id_key: &str) -> String {
    match target {
        Target::Title(title) => format!("{}={}", title_key, encode(title)),
        Target::PageId(id) => format!("{}={}", id_key, id),
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn encode_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values.into_iter().map(encode).collect::<Vec<_>>().join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host() {
        assert_eq!(Site::default().host(), "en.wikipedia.org");
        assert_eq!(Site::new("fr").host(), "fr.wikipedia.org");
    }

    #[test]
    fn test_custom_wiki_host() {
        let site = Site { wiki: Some("https://wiki.example.org/".to_string()), ..Site::default() };
        assert_eq!(site.host(), "wiki.example.org");
        assert!(site.random_url().starts_with("https://wiki.example.org/w/api.php?"));
    }

    #[test]
    fn test_query_url_title() {
        let url = Site::default().query_url(Target::Title("Ada_Lovelace"));
        assert!(url.starts_with("https://en.wikipedia.org/w/api.php?action=query&exintro"));
        assert!(url.contains("prop=extracts|info|pageimages|pageprops"));
        assert!(url.contains("&titles=Ada_Lovelace"));
        assert!(url.ends_with("&format=json"));
    }

    #[test]
    fn test_query_url_pageid() {
        let url = Site::default().query_url(Target::PageId(736));
        assert!(url.contains("&pageids=736"));
        assert!(!url.contains("titles="));
    }

    #[test]
    fn test_parse_url_encodes_title() {
        let url = Site::default().parse_url(Target::Title("AT&T"));
        assert!(url.contains("&page=AT%26T"));
        assert!(url.contains("action=parse"));
    }

    #[test]
    fn test_variant_appended() {
        let site = Site { lang: "zh".to_string(), variant: Some("zh-tw".to_string()), wiki: None };
        let url = site.parse_url(Target::PageId(1));
        assert!(url.ends_with("&variant=zh-tw&format=json"));
    }

    #[test]
    fn test_wikidata_url_by_id() {
        let url = Site::default().wikidata_url(EntityTarget::Ids("Q42|Q5"), WIKIDATA_PROPS);
        assert!(url.starts_with("https://www.wikidata.org/w/api.php?action=wbgetentities"));
        assert!(url.contains("&ids=Q42|Q5"));
        assert!(url.contains("languages=en"));
    }

    #[test]
    fn test_wikidata_url_by_site_title() {
        let url = Site::new("de").wikidata_url(EntityTarget::SiteTitle("Douglas_Adams"), "labels");
        assert!(url.contains("&sites=dewiki&titles=Douglas_Adams"));
        assert!(url.contains("props=labels"));
    }

    #[test]
    fn test_wikidata_url_ignores_variant() {
        let site = Site { variant: Some("sr-el".to_string()), ..Site::new("sr") };
        let url = site.wikidata_url(EntityTarget::Ids("Q1"), "labels");
        assert!(!url.contains("variant="));
    }

    #[test]
    fn test_rest_url_encodes_single_segment() {
        let url = Site::default().rest_url("page/mobile-text", "AC/DC").unwrap();
        assert_eq!(url, "https://en.wikipedia.org/api/rest_v1/page/mobile-text/AC%2FDC");
    }

    #[test]
    fn test_revisions_url_joins_titles() {
        let url = Site::default().revisions_url(["Rust", "Go (game)"]);
        assert!(url.contains("&titles=Rust|Go+%28game%29"));
    }

    #[test]
    fn test_strip_format() {
        let url = Site::default().random_url();
        assert!(!strip_format(&url).contains("format=json"));
    }
}
