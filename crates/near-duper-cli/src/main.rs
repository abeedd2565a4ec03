mod commands;
mod logging;
mod progress;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, GroupArgs};
use dotenv::dotenv;
use near_duper_core::config::IgnoreSet;
use near_duper_core::deletion::{self, DeletionMode, DeletionReport};
use near_duper_core::grouping::{self, Candidate};
use near_duper_core::protocol::{batch, scanner};
use near_duper_core::retention::{self, RetentionDecision};
use near_duper_core::{AppConfig, CompareEngine, DocumentKind, Group};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match near_duper_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Compare { input }) => {
            if let Err(err) = run_compare(&config, input) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Groups(group_args)) => {
            if let Err(err) = run_groups(&config, &group_args) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Clean { groups, reviewed }) => {
            if let Err(err) = run_clean(&config, &groups, reviewed) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn open_input(input: Option<&PathBuf>) -> io::Result<Box<dyn Read>> {
    Ok(match input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    })
}

fn run_compare(config: &AppConfig, input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let records = batch::read_records(open_input(input.as_ref())?)?;
    info!("Read {} comparison records", records.len());

    let engine = CompareEngine::new(config.clone());
    let reply = batch::answer(&engine, &records, &CliReporter::new())?;
    if reply.cancelled {
        warn!(
            "Batch cancelled, returning {} of {} results",
            reply.responses.len(),
            records.len()
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    batch::write_responses(&reply.responses, &mut out)?;
    writeln!(out)?;
    Ok(())
}

/// Scanner groups plus any clustered SIMILAR groups, filtered and ordered.
fn load_groups(config: &AppConfig, args: &GroupArgs) -> Result<(Vec<Group>, PathBuf), Box<dyn std::error::Error>> {
    let scan_root = args
        .scan_root
        .clone()
        .or_else(|| config.scan_root.as_ref().map(PathBuf::from))
        .ok_or("no scan root given; pass --scan-root or set scan_root in Config.toml")?;

    let reader: Box<dyn BufRead> = Box::new(BufReader::new(open_input(args.input.as_ref())?));
    let parsed = scanner::parse_stream(reader)?;
    if !parsed.malformed.is_empty() {
        warn!("{} malformed scanner lines skipped", parsed.malformed.len());
    }
    let mut groups = parsed.groups;

    if !args.cluster.is_empty() {
        let candidates: Vec<Candidate> = args
            .cluster
            .iter()
            .filter_map(|path| match DocumentKind::from_path(path) {
                Some(kind) => Some(Candidate::new(path.clone(), kind)),
                None => {
                    warn!("Not an office document, skipping: {}", path.display());
                    None
                }
            })
            .collect();
        let engine = CompareEngine::new(config.clone());
        groups.extend(grouping::cluster_similar(&engine, &candidates, &CliReporter::new())?);
    }

    let ignore = IgnoreSet::new(&config.ignore_patterns);
    Ok((grouping::classify(groups, &ignore), scan_root))
}

fn print_decision(index: usize, decision: &RetentionDecision) {
    let label = if decision.is_exact() {
        decision.classification.to_string().red()
    } else {
        decision.classification.to_string().yellow()
    };
    println!(
        "[{}] {} {:.2}  {} reclaimable",
        index,
        label,
        decision.similarity,
        format!("{} bytes", decision.reclaimable_bytes).cyan()
    );
    println!("    {} {}", "keep  ".green(), decision.keep.path.display());
    for member in &decision.delete {
        println!(
            "    {} {} ({:.2})",
            "delete".red(),
            member.path.display(),
            member.similarity
        );
    }
}

fn run_groups(config: &AppConfig, args: &GroupArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (groups, scan_root) = load_groups(config, args)?;

    let decisions: Vec<RetentionDecision> = groups
        .iter()
        .filter_map(|g| retention::plan(g, &scan_root))
        .collect();
    for (i, decision) in decisions.iter().enumerate() {
        print_decision(i + 1, decision);
    }

    let exact = decisions.iter().filter(|d| d.is_exact()).count();
    info!(
        "{} exact groups, {} similar groups, {} reclaimable",
        format!("{}", exact).red(),
        format!("{}", decisions.len() - exact).yellow(),
        format!("{} bytes", retention::total_reclaimable(&decisions)).cyan(),
    );
    Ok(())
}

fn run_clean(
    config: &AppConfig,
    args: &GroupArgs,
    reviewed: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (groups, scan_root) = load_groups(config, args)?;

    let report = match reviewed {
        Some(n) => {
            let group = n
                .checked_sub(1)
                .and_then(|i| groups.get(i))
                .ok_or_else(|| format!("no group numbered {}", n))?;
            let decision = retention::plan(group, &scan_root)
                .ok_or_else(|| format!("group {} has nothing to delete", n))?;
            print_decision(n, &decision);
            if !prompt_confirm("Delete the files marked above?", Some(false))? {
                return Ok(());
            }
            deletion::execute(&decision, DeletionMode::Reviewed)?
        }
        None => {
            let decisions = retention::plan_bulk(&groups, &scan_root);
            let files: usize = decisions.iter().map(|d| d.delete.len()).sum();
            if files == 0 {
                info!("No exact duplicates to delete");
                return Ok(());
            }
            let prompt = format!(
                "Delete {} exact duplicate files, freeing {} bytes?",
                files,
                retention::total_reclaimable(&decisions)
            );
            if !prompt_confirm(&prompt, Some(false))? {
                return Ok(());
            }
            deletion::execute_bulk(&decisions)
        }
    };

    print_report(&report);
    Ok(())
}

fn print_report(report: &DeletionReport) {
    for (path, outcome) in &report.entries {
        if let deletion::DeletionOutcome::Failed { reason } = outcome {
            eprintln!("  {} {}: {}", "failed".red(), path.display(), reason);
        }
    }
    info!(
        "{} deleted, {} already gone, {} failed, {} freed",
        format!("{}", report.deleted()).green(),
        format!("{}", report.vanished()).yellow(),
        format!("{}", report.failed()).red(),
        format!("{} bytes", report.freed_bytes()).cyan(),
    );
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    confirm_from(&mut io::stdin().lock(), &mut io::stderr(), prompt, default)
}

/// y/N loop over any reader. End of input is an error rather than a silent
/// "no", since it means nobody could answer.
fn confirm_from<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: Option<bool>,
) -> io::Result<bool> {
    let mut answer = String::new();

    loop {
        answer.clear();

        match default {
            Some(true) => write!(output, "{} (Y/n): ", prompt)?,
            Some(false) | None => write!(output, "{} (y/N): ", prompt)?,
        }
        output.flush()?;

        if input.read_line(&mut answer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no confirmation possible: stdin is closed (pass the scanner stream with --input)",
            ));
        }

        match answer.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
