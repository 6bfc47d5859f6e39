use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wikipage_core::summary::fetch_revisions;
use wikipage_core::{
    FetchConfig, Fetcher, Page, PageConfig, Site, SummaryFormat, fetch_file, fetch_stdin, format_summaries,
    parse_revisions, parse_summaries, render_marks,
};

mod echo;

use echo::{format_size, print_banner, print_info, print_step, print_success, print_timing};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which API a `page` run is limited to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Only {
    Query,
    Parse,
    Rest,
    Wikidata,
    Random,
}

impl FromStr for Only {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "parse" => Ok(Self::Parse),
            "rest" => Ok(Self::Rest),
            "wikidata" => Ok(Self::Wikidata),
            "random" => Ok(Self::Random),
            _ => Err(format!(
                "Invalid API: {}. Valid options: query, parse, rest, wikidata, random",
                s
            )),
        }
    }
}

/// Output format for lead summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LeadFormat(SummaryFormat);

impl FromStr for LeadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self(SummaryFormat::Text)),
            "json" => Ok(Self(SummaryFormat::Json)),
            "dict" => Ok(Self(SummaryFormat::Dict)),
            _ => Err(format!("Invalid format: {}. Valid options: text, json, dict", s)),
        }
    }
}

/// Fetch Wikipedia and Wikidata page data, and extract lead wikitext
#[derive(Parser, Debug)]
#[command(name = "wikipage")]
#[command(author = "Wikipage Contributors")]
#[command(version = VERSION)]
#[command(about = "Fetch Wikipedia and Wikidata page data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors and suppress page output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    silent: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page from the query, parse, REST and Wikidata APIs
    Page(PageArgs),
    /// Extract the lead wikitext of one or more articles
    Lead(LeadArgs),
}

#[derive(Args, Debug)]
struct SiteArgs {
    /// Wikipedia language code
    #[arg(short, long, default_value = "en", value_name = "LANG")]
    lang: String,

    /// Language variant, e.g. zh-tw
    #[arg(long, value_name = "VARIANT")]
    variant: Option<String>,

    /// Custom wiki host instead of {lang}.wikipedia.org
    #[arg(long, value_name = "HOST")]
    wiki: Option<String>,

    /// HTTP timeout in seconds (0 waits forever)
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Proxy URL for every request
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,
}

impl SiteArgs {
    fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig { timeout: self.timeout, proxy: self.proxy.clone(), ..Default::default() };
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    fn site(&self) -> Site {
        Site { lang: self.lang.clone(), variant: self.variant.clone(), wiki: self.wiki.clone() }
    }
}

#[derive(Args, Debug)]
struct PageArgs {
    /// Article title (a random article when no identifier is given)
    #[arg(value_name = "TITLE")]
    title: Option<String>,

    /// Wikipedia page id
    #[arg(long, value_name = "ID")]
    pageid: Option<u64>,

    /// Wikidata entity id, e.g. Q7259
    #[arg(long, value_name = "QID")]
    wikibase: Option<String>,

    /// Only call one API (query, parse, rest, wikidata, random)
    #[arg(long, value_name = "API")]
    only: Option<Only>,

    /// Print the page as JSON instead of the summary view
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    site: SiteArgs,
}

#[derive(Args, Debug)]
struct LeadArgs {
    /// Article titles, a saved revisions query JSON file, or "-" for stdin
    #[arg(value_name = "TITLES", required = true)]
    titles: Vec<String>,

    /// Output format (text, json, dict)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: LeadFormat,

    /// Show how each wikitext line was classified instead of the lead
    #[arg(long)]
    marks: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    site: SiteArgs,
}

fn init_tracing(verbose: bool, silent: bool) {
    let default = if verbose {
        "debug"
    } else if silent {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_page(args: PageArgs, verbose: bool, silent: bool) -> anyhow::Result<()> {
    let mut builder = PageConfig::builder()
        .lang(args.site.lang.clone())
        .silent(silent)
        .verbose(verbose)
        .timeout(args.site.timeout);

    if let Some(title) = &args.title {
        builder = builder.title(title.clone());
    }
    if let Some(pageid) = args.pageid {
        builder = builder.pageid(pageid);
    }
    if let Some(wikibase) = &args.wikibase {
        builder = builder.wikibase(wikibase.clone());
    }
    if let Some(variant) = &args.site.variant {
        builder = builder.variant(variant.clone());
    }
    if let Some(wiki) = &args.site.wiki {
        builder = builder.wiki(wiki.clone());
    }
    if let Some(proxy) = &args.site.proxy {
        builder = builder.proxy(proxy.clone());
    }
    if let Some(user_agent) = &args.site.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    let mut page = Page::with_config(builder.build()).context("Failed to set up page")?;
    debug!(only = ?args.only, "fetching page");

    let started = Instant::now();
    match args.only {
        None => page.get().await,
        Some(Only::Query) => page.get_query().await,
        Some(Only::Parse) => page.get_parse().await,
        Some(Only::Rest) => page.get_rest().await,
        Some(Only::Wikidata) => page.get_wikidata().await,
        Some(Only::Random) => page.get_random().await,
    }
    .context("Failed to fetch page")?;

    if verbose {
        print_timing("Requests", started.elapsed());
        eprintln!();
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&page).context("Failed to serialize page")?
        );
    } else if !silent {
        println!("{}", page.render());
    }

    Ok(())
}

async fn run_lead(args: LeadArgs, verbose: bool) -> anyhow::Result<()> {
    let first = args.titles.first().map(String::as_str).unwrap_or_default();

    let json = if first == "-" {
        if verbose {
            print_step(1, 3, "Reading from stdin");
        }
        fetch_stdin().context("Failed to read from stdin")?
    } else if Path::new(first).is_file() {
        if verbose {
            print_step(1, 3, &format!("Reading from file {}", first.bright_white()));
        }
        fetch_file(first).with_context(|| format!("Failed to read file: {}", first))?
    } else {
        if verbose {
            print_step(1, 3, &format!("Fetching {} titles", args.titles.len()));
        }
        let fetcher = Fetcher::new(args.site.fetch_config()).context("Failed to build HTTP client")?;
        fetch_revisions(args.titles.iter().map(String::as_str), &args.site.site(), &fetcher)
            .await
            .context("Failed to fetch revisions")?
    };

    debug!(bytes = json.len(), "revisions loaded");

    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(json.len()).bright_white());
        eprintln!();
        print_step(2, 3, "Extracting leads");
    }

    let output: String = if args.marks {
        parse_revisions(&json)
            .context("Failed to read revisions")?
            .iter()
            .map(|revision| format!("\n= {} =\n\n{}\n", revision.title, render_marks(&revision.content)))
            .collect()
    } else {
        let summaries = parse_summaries(&json).context("Failed to read revisions")?;
        if verbose {
            eprintln!(
                "  {} {}",
                "Summaries:".dimmed(),
                summaries.len().to_string().bright_white()
            );
            eprintln!();
        }
        format_summaries(&summaries, args.format.0).context("Failed to format summaries")?
    };

    if verbose {
        print_step(3, 3, "Writing output");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.silent);

    if cli.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    match cli.command {
        Command::Page(args) => run_page(args, cli.verbose, cli.silent).await,
        Command::Lead(args) => run_lead(args, cli.verbose).await,
    }
}
