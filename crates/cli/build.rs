use std::{env, fs, path::PathBuf};

fn site_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(-l --lang <LANG> "Wikipedia language code").default_value("en"))
        .arg(clap::arg!(--variant <VARIANT> "Language variant, e.g. zh-tw"))
        .arg(clap::arg!(--wiki <HOST> "Custom wiki host instead of {lang}.wikipedia.org"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds (0 waits forever)").default_value("30"))
        .arg(clap::arg!(--proxy <URL> "Proxy URL for every request"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let page = site_args(
        clap::Command::new("page")
            .about("Fetch one page from the query, parse, REST and Wikidata APIs")
            .arg(clap::arg!([TITLE] "Article title (a random article when no identifier is given)"))
            .arg(clap::arg!(--pageid <ID> "Wikipedia page id"))
            .arg(clap::arg!(--wikibase <QID> "Wikidata entity id, e.g. Q7259"))
            .arg(
                clap::arg!(--only <API> "Only call one API")
                    .value_parser(["query", "parse", "rest", "wikidata", "random"]),
            )
            .arg(clap::arg!(--json "Print the page as JSON instead of the summary view")),
    );

    let lead = site_args(
        clap::Command::new("lead")
            .about("Extract the lead wikitext of one or more articles")
            .arg(clap::arg!(<TITLES>... "Article titles, a saved revisions query JSON file, or '-' for stdin"))
            .arg(
                clap::arg!(-f --format <FORMAT> "Output format (text, json, dict)")
                    .default_value("text")
                    .value_parser(["text", "json", "dict"]),
            )
            .arg(clap::arg!(--marks "Show how each wikitext line was classified instead of the lead"))
            .arg(
                clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                    .value_parser(clap::value_parser!(std::path::PathBuf)),
            ),
    );

    let mut cmd = clap::Command::new("wikipage")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Wikipage Contributors")
        .about("Fetch Wikipedia and Wikidata page data")
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .arg(clap::arg!(-s --silent "Only log errors and suppress page output").global(true))
        .subcommand(page)
        .subcommand(lead);

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "wikipage", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "wikipage", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "wikipage", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "wikipage", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
