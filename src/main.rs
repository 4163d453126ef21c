use clap::{Arg, Command};
use log::LevelFilter;
use std::path::Path;
use std::process;
use std::time::Duration;

use phishscope::analyzer::{AnalysisInput, AnalysisResult, Analyzer};
use phishscope::config::RuleConfig;
use phishscope::error::AnalysisError;
use phishscope::Verdict;

#[tokio::main]
async fn main() {
    let matches = Command::new("phishscope")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule-based multi-layer URL threat scoring")
        .arg(
            Arg::new("urls")
                .value_name("URL")
                .help("One or more URLs to analyze")
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("YAML rule-table override")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .value_name("FILE")
                .help("Local HTML file to analyze as the page content (single URL only)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Emit results as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .help("Skip DNS and WHOIS enrichment")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-lookup enrichment timeout")
                .default_value("5")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config = match matches.get_one::<String>("config") {
        Some(path) => match RuleConfig::load_from_file(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading rule configuration: {e}");
                process::exit(1);
            }
        },
        None => RuleConfig::default(),
    };

    let timeout_seconds: u64 = match matches.get_one::<String>("timeout").unwrap().parse() {
        Ok(seconds) => seconds,
        Err(_) => {
            eprintln!("Error: --timeout expects a number of seconds");
            process::exit(1);
        }
    };

    let urls: Vec<&String> = matches.get_many::<String>("urls").unwrap().collect();

    let html_content = match matches.get_one::<String>("html") {
        Some(path) => {
            if urls.len() > 1 {
                eprintln!("Error: --html only applies when a single URL is given");
                process::exit(1);
            }
            match std::fs::read_to_string(path) {
                Ok(content) => Some(content),
                Err(e) => {
                    eprintln!("Error reading HTML file {path}: {e}");
                    process::exit(1);
                }
            }
        }
        None => None,
    };

    let mut analyzer = Analyzer::new(config);
    if !matches.get_flag("offline") {
        analyzer = analyzer.with_network(Duration::from_secs(timeout_seconds));
    }

    let as_json = matches.get_flag("json");
    let mut any_phishing = false;
    let mut any_invalid = false;

    for url in urls {
        let mut input = AnalysisInput::new(url.clone());
        input.html_content = html_content.clone();

        match analyzer.analyze(&input).await {
            Ok(result) => {
                if result.verdict == Verdict::ConfirmedPhishing {
                    any_phishing = true;
                }
                if as_json {
                    match serde_json::to_string_pretty(&result) {
                        Ok(json) => println!("{json}"),
                        Err(e) => eprintln!("Error serializing result: {e}"),
                    }
                } else {
                    print_report(&result);
                }
            }
            Err(AnalysisError::InvalidUrl { url, reason }) => {
                eprintln!("{url}: analysis failed, check URL format ({reason})");
                any_invalid = true;
            }
            Err(e) => {
                eprintln!("{url}: {e}");
                any_invalid = true;
            }
        }
    }

    if any_invalid {
        process::exit(2);
    }
    if any_phishing {
        process::exit(1);
    }
}

fn print_report(result: &AnalysisResult) {
    println!("URL: {}", result.url);
    println!(
        "Risk: {}/100  Verdict: {}  Threat: {}  Confidence: {}%",
        result.risk_score, result.verdict, result.threat_level, result.confidence
    );

    println!("Layers:");
    for (name, layer) in &result.layers {
        println!(
            "  {:<16} {:>3}  {:?}",
            name, layer.score, layer.status
        );
        for finding in &layer.findings {
            println!("    - {finding}");
        }
    }

    println!("Red flags:");
    for flag in &result.red_flags {
        println!("  ! {flag}");
    }

    println!("Recommendations:");
    for recommendation in &result.recommendations {
        println!("  > {recommendation}");
    }
    println!();
}
