//! Compact pretty-print of a page's state.
//!
//! Every attribute with a value becomes one `key: value` line, in key order.
//! Long strings, maps and lists are summarized so a page fits on a screen.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::Page;
use crate::fetch::Response;

const MAX_LEN: usize = 72;
const PAD: usize = 8;

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid spaces regex"));

/// Truncate `tail` so that `key: tail` stays within the line width.
fn ptrunc(key: &str, tail: &str) -> String {
    let key_len = key.chars().count();
    let tail_len = tail.chars().count();

    let mut text: String = tail.chars().take(MAX_LEN.saturating_sub(key_len + PAD)).collect();
    if key_len + tail_len + PAD >= MAX_LEN {
        text.push_str("...");
    }
    text
}

fn show_text(key: &str, value: &str) -> Option<String> {
    let value = value.trim().replace('\n', "");
    let value = SPACES.replace_all(&value, " ").into_owned();

    if value.is_empty() {
        return None;
    }

    let len = value.chars().count();
    if len > MAX_LEN && !value.starts_with("http") {
        Some(ptrunc(key, &format!("<str({})> {}", len, value)))
    } else {
        Some(value)
    }
}

fn show_keys<'a>(key: &str, keys: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut keys: Vec<&str> = keys.collect();
    if keys.is_empty() {
        return None;
    }
    keys.sort_unstable();
    Some(ptrunc(key, &format!("<dict({})> {{{}}}", keys.len(), keys.join(", "))))
}

fn show_list(len: usize) -> Option<String> {
    if len == 0 { None } else { Some(format!("<list({})>", len)) }
}

fn show_request(key: &str, request: Option<&Response>) -> Option<String> {
    request.and_then(|_| show_keys(key, ["query", "response", "info"].into_iter()))
}

impl Page {
    /// Displayed value of every attribute that has one, by attribute name.
    pub fn fields(&self) -> BTreeMap<&'static str, String> {
        let texts: [(&'static str, Option<&str>); 22] = [
            ("description", self.description.as_deref()),
            ("extext", self.extext.as_deref()),
            ("extract", self.extract.as_deref()),
            ("image", self.image.as_deref()),
            ("image_infobox", self.image_infobox.as_deref()),
            ("image_wikidata", self.image_wikidata.as_deref()),
            ("label", self.label.as_deref()),
            ("lang", Some(self.site.lang.as_str())),
            ("lead", self.lead.as_deref()),
            ("modified", self.modified.as_deref()),
            ("pageimage", self.pageimage.as_deref()),
            ("parsetree", self.parsetree.as_deref()),
            ("random", self.random.as_deref()),
            ("thumbnail", self.thumbnail.as_deref()),
            ("title", self.title.as_deref()),
            ("url", self.url.as_deref()),
            ("urlraw", self.urlraw.as_deref()),
            ("variant", self.site.variant.as_deref()),
            ("wiki", self.site.wiki.as_deref()),
            ("wikibase", self.wikibase.as_deref()),
            ("wikidata_url", self.wikidata_url.as_deref()),
            ("wikitext", self.wikitext.as_deref()),
        ];

        let mut fields: BTreeMap<&'static str, String> = texts
            .into_iter()
            .filter_map(|(key, value)| value.and_then(|v| show_text(key, v)).map(|v| (key, v)))
            .collect();

        let summaries = [
            ("claims", show_keys("claims", self.claims.keys().map(String::as_str))),
            ("images", show_keys("images", self.images.keys().map(String::as_str))),
            (
                "infobox",
                self.infobox.as_ref().and_then(|i| show_keys("infobox", i.keys().map(String::as_str))),
            ),
            ("props", show_keys("props", self.props.keys().map(String::as_str))),
            ("wikidata", show_keys("wikidata", self.wikidata.keys().map(String::as_str))),
            ("links", show_list(self.links.len())),
            ("g_query", show_request("g_query", self.requests.query.as_ref())),
            ("g_parse", show_request("g_parse", self.requests.parse.as_ref())),
            ("g_rest", show_request("g_rest", self.requests.rest.as_ref())),
            ("g_wikidata", show_request("g_wikidata", self.requests.wikidata.as_ref())),
            ("g_claims", show_list(self.requests.claims.len())),
            ("pageid", self.pageid.map(|id| id.to_string())),
            ("fatal", self.fatal.then(|| "true".to_string())),
            ("verbose", self.verbose.then(|| "true".to_string())),
        ];

        fields.extend(summaries.into_iter().filter_map(|(key, value)| value.map(|v| (key, v))));
        fields
    }

    /// Header line naming the page and its language.
    pub fn header(&self) -> String {
        let thing = match (&self.title, &self.wikibase, self.pageid) {
            (Some(title), _, _) => title.clone(),
            (None, Some(wikibase), _) => wikibase.rsplit('/').next().unwrap_or(wikibase).to_string(),
            (None, None, Some(pageid)) => pageid.to_string(),
            (None, None, None) => String::new(),
        };

        let lang = match &self.site.variant {
            Some(variant) => format!("{}/{}", self.site.lang, variant),
            None => self.site.lang.clone(),
        };

        format!("{} ({})", thing, lang)
    }

    /// Header plus a braced block of `key: value` lines.
    pub fn render(&self) -> String {
        let mut out = vec![self.header(), "{".to_string()];
        out.extend(self.fields().into_iter().map(|(key, value)| format!("  {}: {}", key, value)));
        out.push("}".to_string());
        out.join("\n")
    }

    /// Print [`Page::render`] to stderr unless the page is silent.
    pub fn show(&self) {
        if !self.silent {
            eprintln!("{}", self.render());
        }
    }
}
