mod debug_report;

use anyhow::Context as _;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, IsTerminal, Read};
use unimatch::{Matcher, MatcherOptions, Rule, SimpleTokenizer, TokenAttr, Tokenize};

/// Run phrase and regex rules over text and show the merged, pruned matches.
#[derive(Parser, Debug)]
#[command(name = "unimatch", version)]
struct Cli {
    /// Literal phrase rule (repeatable).
    #[arg(long = "phrase", value_name = "CATEGORY=TEXT", value_parser = parse_rule_arg)]
    phrases: Vec<(String, String)>,

    /// Regex rule (repeatable).
    #[arg(long = "regex", value_name = "CATEGORY=PATTERN", value_parser = parse_rule_arg)]
    regexes: Vec<(String, String)>,

    /// Token attribute phrases are compared on (ORTH, LOWER, UPPER, ...).
    #[arg(long, value_name = "NAME", default_value = "LOWER", value_parser = parse_attr)]
    attr: TokenAttr,

    /// Keep overlapping matches.
    #[arg(long)]
    no_prune: bool,

    /// Force ANSI color output.
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long)]
    no_color: bool,

    /// Input text. Read from stdin when omitted.
    #[arg(trailing_var_arg = true)]
    text: Vec<String>,
}

fn parse_rule_arg(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((category, pattern)) if !category.is_empty() && !pattern.is_empty() => {
            Ok((category.to_string(), pattern.to_string()))
        }
        _ => Err(format!("expected CATEGORY=PATTERN, got '{value}'")),
    }
}

fn parse_attr(value: &str) -> Result<TokenAttr, String> {
    value.parse().map_err(|err: unimatch::MatchError| err.to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input = if cli.text.is_empty() { read_stdin_input()? } else { cli.text.join(" ") };
    if input.trim().is_empty() {
        Cli::command().error(ErrorKind::MissingRequiredArgument, "no input provided").exit();
    }
    if cli.phrases.is_empty() && cli.regexes.is_empty() {
        Cli::command().error(ErrorKind::MissingRequiredArgument, "at least one --phrase or --regex is required").exit();
    }

    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    let options = MatcherOptions { phrase_attr: cli.attr, prune: !cli.no_prune, ..MatcherOptions::default() };
    let mut matcher = Matcher::new(options);
    let rules = cli
        .phrases
        .into_iter()
        .map(|(category, text)| Rule::literal(category, text))
        .chain(cli.regexes.into_iter().map(|(category, pattern)| Rule::regex(category, pattern)));
    matcher.add(rules).context("failed to register rules")?;
    log::info!("registered {} rules", matcher.len());

    let doc = SimpleTokenizer.tokenize(&input);
    let run = matcher.find_with_metrics(&doc);
    let spans = matcher.to_spans(&doc, &run.matches, true).context("failed to materialize spans")?;
    debug_report::print_run(&matcher, &doc, &run, &spans, color);
    Ok(())
}

fn read_stdin_input() -> anyhow::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
    Ok(buffer)
}
