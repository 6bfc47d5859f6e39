//! Lead summaries of several articles from one revisions query.
//!
//! Revision content comes either from the query API or from a saved JSON
//! document, and each page's wikitext is reduced to its lead with
//! [`extract_lead`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoint::Site;
use crate::fetch::{Fetcher, fetch_file};
use crate::lead::extract_lead;
use crate::{Result, WikiError};

/// Output formats for a list of summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    /// `= Title =` headings followed by the lead.
    #[default]
    Text,
    /// JSON array of `{title, wikitext}` objects.
    Json,
    /// JSON array of key/value maps built from `key = value` lines.
    Dict,
}

/// One page's title and raw revision content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub title: String,
    pub content: String,
}

/// One page's title and lead wikitext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub title: String,
    pub wikitext: String,
}

#[derive(Debug, Deserialize)]
struct RevisionsDocument {
    query: RevisionsQuery,
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    #[serde(default)]
    pages: PageList,
}

/// `query.pages` is a list with formatversion 2 and a map keyed by page id
/// otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageList {
    List(Vec<RevisionPage>),
    Map(BTreeMap<String, RevisionPage>),
}

impl Default for PageList {
    fn default() -> Self {
        PageList::List(Vec::new())
    }
}

impl PageList {
    fn into_pages(self) -> Vec<RevisionPage> {
        match self {
            PageList::List(pages) => pages,
            PageList::Map(pages) => pages.into_values().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RevisionPage {
    title: Option<String>,
    #[serde(default)]
    revisions: Vec<Value>,
}

fn revision_content(revision: &Value) -> Option<&str> {
    revision
        .pointer("/slots/main/content")
        .or_else(|| revision.pointer("/slots/main/*"))
        .or_else(|| revision.get("content"))
        .or_else(|| revision.get("*"))
        .and_then(Value::as_str)
}

/// Titles and latest revision content of every page in a revisions query.
///
/// Pages without a title or revision content (missing or invalid titles)
/// are left out with a warning.
pub fn parse_revisions(json: &str) -> Result<Vec<Revision>> {
    let document: RevisionsDocument =
        serde_json::from_str(json).map_err(|e| WikiError::UnexpectedShape(format!("revisions query: {}", e)))?;

    let revisions = document
        .query
        .pages
        .into_pages()
        .into_iter()
        .filter_map(|page| {
            let Some(title) = page.title else {
                warn!("Page without a title skipped");
                return None;
            };
            let Some(content) = page.revisions.first().and_then(revision_content) else {
                warn!(title = %title, "Page without revisions skipped");
                return None;
            };
            Some(Revision { title, content: content.to_string() })
        })
        .collect();

    Ok(revisions)
}

/// Lead summaries of every page in a revisions query, skipping empty leads.
pub fn parse_summaries(json: &str) -> Result<Vec<Summary>> {
    let summaries = parse_revisions(json)?
        .into_iter()
        .filter_map(|revision| {
            let wikitext = extract_lead(&revision.content);
            if wikitext.is_empty() {
                debug!(title = %revision.title, "Empty lead skipped");
                None
            } else {
                Some(Summary { title: revision.title, wikitext })
            }
        })
        .collect();

    Ok(summaries)
}

/// Fetch the revisions query for `titles` and return its raw body.
pub async fn fetch_revisions<'a>(
    titles: impl IntoIterator<Item = &'a str>, site: &Site, fetcher: &Fetcher,
) -> Result<String> {
    let url = site.revisions_url(titles);
    let response = fetcher.fetch(&url).await?;
    Ok(response.response)
}

/// Lead summaries of `titles` fetched from the query API.
pub async fn from_api<'a>(
    titles: impl IntoIterator<Item = &'a str>, site: &Site, fetcher: &Fetcher,
) -> Result<Vec<Summary>> {
    parse_summaries(&fetch_revisions(titles, site, fetcher).await?)
}

/// Lead summaries from a saved revisions query document.
pub fn from_file(path: &str) -> Result<Vec<Summary>> {
    parse_summaries(&fetch_file(path)?)
}

/// Key/value view of a summary.
///
/// Every lead line containing `=` contributes a key (spaces and `|` removed)
/// and a trimmed value. `title` and `wikitext` are set last.
pub fn to_dict(summary: &Summary) -> BTreeMap<String, String> {
    let mut dict = BTreeMap::new();

    for line in summary.wikitext.lines().filter(|line| line.contains('=')) {
        let mut terms = line.splitn(3, '=');
        let key: String = terms
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| *c != ' ' && *c != '|')
            .collect();
        let value = terms.next().unwrap_or_default().trim().to_string();
        dict.insert(key, value);
    }

    dict.insert("title".to_string(), summary.title.clone());
    dict.insert("wikitext".to_string(), summary.wikitext.clone());
    dict
}

/// Render summaries in the requested format.
pub fn format_summaries(summaries: &[Summary], format: SummaryFormat) -> Result<String> {
    match format {
        SummaryFormat::Text => Ok(summaries
            .iter()
            .map(|s| format!("\n= {} =\n\n{}\n", s.title, s.wikitext))
            .collect()),
        SummaryFormat::Json => Ok(serde_json::to_string(summaries)?),
        SummaryFormat::Dict => {
            let dicts: Vec<_> = summaries.iter().map(to_dict).collect();
            Ok(serde_json::to_string(&dicts)?)
        }
    }
}
