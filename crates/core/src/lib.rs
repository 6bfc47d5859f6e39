pub mod api;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod html;
pub mod infobox;
pub mod lead;
pub mod media;
pub mod page;
pub mod show;
pub mod summary;

pub use api::{WIKIPROPS, property_label};
pub use endpoint::{EntityTarget, Site, Target};
pub use error::{Result, WikiError};
pub use fetch::{FetchConfig, Fetcher, Response, ResponseInfo};
pub use fetch::{fetch_file, fetch_stdin};
#[doc(hidden)]
pub use html::{absolutize_links, html_to_markdown, html_to_text, snip_html};
pub use infobox::{Infobox, get_infobox};
pub use lead::{LeadScanner, LineMark, classify, extract_lead, render_marks};
pub use media::{media_url, wikidata_url};
pub use page::{MAX_ENTITY_IDS, Page, PageConfig, PageConfigBuilder, Requests};
pub use summary::{Revision, Summary, SummaryFormat, format_summaries, parse_revisions, parse_summaries};
