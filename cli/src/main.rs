//! itemmatch CLI: driving adapter for the itemmatch criteria engine.
//!
//! Subcommands:
//! - `eval <criteria> <item> [--strict] [--trace]`: evaluate criteria against an item
//! - `check <criteria> [--strict]`: compile criteria and report diagnostics
//! - `flatten <item>`: print the flattened nested data of an item
//! - `route <rules> <item> [--strict]`: print the first matching rule name

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use itemmatch::config::{load_criteria, load_item, load_rule_set};
use itemmatch::{flatten, ItemView, Strictness};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "itemmatch")]
#[command(about = "Match items against criteria files", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate criteria against an item
    Eval {
        /// Criteria file (YAML, or JSON by extension)
        criteria: PathBuf,
        /// Item file (YAML, or JSON by extension)
        item: PathBuf,
        /// Fail on malformed criteria instead of dropping them
        #[arg(long)]
        strict: bool,
        /// Print each criterion's evaluation
        #[arg(long)]
        trace: bool,
    },
    /// Compile criteria and report diagnostics
    Check {
        /// Criteria file
        criteria: PathBuf,
        /// Fail on malformed criteria instead of dropping them
        #[arg(long)]
        strict: bool,
    },
    /// Print the flattened nested data of an item
    Flatten {
        /// Item file
        item: PathBuf,
    },
    /// Print the name of the first rule the item matches
    Route {
        /// Rule set file: `rules: { <name>: <criteria> }`
        rules: PathBuf,
        /// Item file
        item: PathBuf,
        /// Fail on malformed criteria instead of dropping them
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> anyhow::Result<String> {
    match command {
        Commands::Eval {
            criteria,
            item,
            strict,
            trace,
        } => cmd_eval(&criteria, &item, strictness(strict), trace),
        Commands::Check { criteria, strict } => cmd_check(&criteria, strictness(strict)),
        Commands::Flatten { item } => cmd_flatten(&item),
        Commands::Route {
            rules,
            item,
            strict,
        } => cmd_route(&rules, &item, strictness(strict)),
    }
}

fn strictness(strict: bool) -> Strictness {
    if strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(
    criteria_path: &Path,
    item_path: &Path,
    strictness: Strictness,
    trace: bool,
) -> anyhow::Result<String> {
    let criteria = load_criteria(criteria_path, strictness)
        .with_context(|| format!("loading criteria from {}", criteria_path.display()))?;
    let item = load_item(item_path)
        .with_context(|| format!("loading item from {}", item_path.display()))?;

    if trace {
        let trace = criteria.trace(&item);
        info!(matched = trace.matched(), outcome = %trace.outcome, "evaluated with trace");
        return Ok(format!("{trace}\n"));
    }
    let outcome = criteria.evaluate(&item);
    info!(matched = outcome.is_match(), %outcome, "evaluated");
    let verdict = if outcome.is_match() { "match" } else { "no match" };
    Ok(format!("{verdict}\n"))
}

fn cmd_check(criteria_path: &Path, strictness: Strictness) -> anyhow::Result<String> {
    let criteria = load_criteria(criteria_path, strictness)
        .with_context(|| format!("loading criteria from {}", criteria_path.display()))?;

    debug!(
        criteria = criteria.len(),
        dropped = criteria.diagnostics().len(),
        "checked criteria"
    );
    let mut out = format!("ok: {} criteria compiled\n", criteria.len());
    for diagnostic in criteria.diagnostics() {
        writeln!(out, "dropped: {diagnostic}")?;
    }
    Ok(out)
}

fn cmd_flatten(item_path: &Path) -> anyhow::Result<String> {
    let item = load_item(item_path)
        .with_context(|| format!("loading item from {}", item_path.display()))?;
    let record = item.raw_data().map(flatten).unwrap_or_default();
    debug!(
        entries = record.len(),
        fallback = record.fallback_path(),
        "flattened item"
    );

    let mut out = String::new();
    for (path, value) in record.entries() {
        writeln!(out, "{path} = {value}")?;
    }
    match record.fallback_path() {
        Some(path) => writeln!(out, "fallback: {path}")?,
        None => writeln!(out, "fallback: (none)")?,
    }
    Ok(out)
}

fn cmd_route(rules_path: &Path, item_path: &Path, strictness: Strictness) -> anyhow::Result<String> {
    let rules = load_rule_set(rules_path, strictness)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;
    let item = load_item(item_path)
        .with_context(|| format!("loading item from {}", item_path.display()))?;

    let rule = rules.first_match(&item);
    info!(rules = rules.len(), rule, "routed item");
    let name = rule.unwrap_or("(no match)");
    Ok(format!("{name}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("itemmatch-cli-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const SWORD: &str = r"
material: DIAMOND_SWORD
name: Excalibur
custom-model-data: [7.9]
nbt:
  tag:
    level: 5
  PublicBukkitValues:
    Internal: '{ownerUUID=abc123}'
";

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_eval_flags() {
        let cli = Cli::try_parse_from(["itemmatch", "-v", "eval", "c.yaml", "i.yaml", "--trace"])
            .unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Eval {
                strict: false,
                trace: true,
                ..
            }
        ));
    }

    #[test]
    fn eval_match_and_no_match() {
        let item = write_temp("sword.yaml", SWORD);
        let hit = write_temp("hit.yaml", "material: diamond_*\nnbt-value: tag.level=5\n");
        let miss = write_temp("miss.yaml", "material: diamond_*\nnbt-value: tag.level=6\n");

        let out = cmd_eval(&hit, &item, Strictness::Lenient, false).unwrap();
        assert_eq!(out, "match\n");
        let out = cmd_eval(&miss, &item, Strictness::Lenient, false).unwrap();
        assert_eq!(out, "no match\n");
    }

    #[test]
    fn eval_trace_lists_steps() {
        let item = write_temp("sword-trace.yaml", SWORD);
        let criteria = write_temp("trace.yaml", "name: Durandal\ncustom-model-data: 7\n");
        let out = cmd_eval(&criteria, &item, Strictness::Lenient, true).unwrap();
        assert!(out.contains("[FAIL] name: expected Durandal, actual Excalibur"));
        assert!(out.contains("[pass] custom-model-data: expected 7, actual 7"));
        assert!(out.ends_with("no match (1/2 criteria passed)\n"));
    }

    #[test]
    fn check_reports_diagnostics() {
        let criteria = write_temp("check.yaml", "material: stone\ncustom-model-data: seven\n");
        let out = cmd_check(&criteria, Strictness::Lenient).unwrap();
        assert!(out.starts_with("ok: 1 criteria compiled\n"));
        assert!(out.contains("dropped: criterion \"custom-model-data\""));

        let err = cmd_check(&criteria, Strictness::Strict).unwrap_err();
        assert!(format!("{err:#}").contains("custom-model-data"));
    }

    #[test]
    fn flatten_prints_paths_and_fallback() {
        let item = write_temp("sword-flat.yaml", SWORD);
        let out = cmd_flatten(&item).unwrap();
        assert_eq!(
            out,
            "tag.level = 5\nPublicBukkitValues.Internal = {ownerUUID=abc123}\nfallback: PublicBukkitValues.Internal\n"
        );
    }

    #[test]
    fn route_prints_rule_or_no_match() {
        let item = write_temp("sword-route.yaml", SWORD);
        let rules = write_temp(
            "rules.yaml",
            "rules:\n  owned:\n    nbt-value: owner*=abc*\n  stone:\n    material: stone\n",
        );
        assert_eq!(cmd_route(&rules, &item, Strictness::Lenient).unwrap(), "owned\n");

        let stone = write_temp("stone.yaml", "material: STONE\n");
        let rules = write_temp("rules-none.yaml", "rules:\n  dirt:\n    material: dirt\n");
        assert_eq!(cmd_route(&rules, &stone, Strictness::Lenient).unwrap(), "(no match)\n");
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            std::io::Write::write(&mut *self.0.lock().unwrap(), buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn commands_emit_tracing_events() {
        let item = write_temp("sword-log.yaml", SWORD);
        let rules = write_temp("rules-log.yaml", "rules:\n  swords:\n    material: \"*_sword\"\n");
        let criteria = write_temp("log.yaml", "material: stone\n");

        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            cmd_route(&rules, &item, Strictness::Lenient).unwrap();
            cmd_eval(&criteria, &item, Strictness::Lenient, false).unwrap();
            cmd_flatten(&item).unwrap();
        });

        let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("routed item"), "{logs}");
        assert!(logs.contains("rule=\"swords\""), "{logs}");
        assert!(logs.contains("evaluated"), "{logs}");
        assert!(logs.contains("matched=false"), "{logs}");
        assert!(logs.contains("flattened item"), "{logs}");
    }

    #[test]
    fn missing_file_error_has_context() {
        let err = cmd_flatten(Path::new("/nonexistent/item.yaml")).unwrap_err();
        assert!(format!("{err:#}").starts_with("loading item from /nonexistent/item.yaml"));
    }
}
