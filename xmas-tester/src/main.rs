mod logic;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use logic::reports::{generate_console_report, generate_json_report, generate_markdown_report};
use logic::scenarios::SCENARIOS;
use logic::{
    LogicTester, ScenarioResult, TesterData, get_scenario, list_scenarios, resolve_seed_inputs,
};
use util::split_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Pretty-printed array of scenario results
    Json,
    /// Summary plus per-run sections
    Markdown,
    /// Colored summary with timings
    Console,
}

impl ReportFormat {
    fn render(
        self,
        out: &mut dyn Write,
        results: &[ScenarioResult],
        elapsed: Duration,
    ) -> Result<()> {
        match (self, results.is_empty()) {
            (Self::Json, true) => writeln!(out, "[]")?,
            (Self::Json, false) => generate_json_report(out, results)?,
            (Self::Markdown, true) => writeln!(
                out,
                "# Xtreme Xmas Scenario Results\n\n_No scenarios executed._"
            )?,
            (Self::Markdown, false) => generate_markdown_report(out, results)?,
            (Self::Console, true) => writeln!(out, "No scenarios executed.")?,
            (Self::Console, false) => generate_console_report(out, results, elapsed)?,
        }
        if self == Self::Console {
            writeln!(out)?;
            writeln!(out, "🏁 Total time: {elapsed:?}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
#[command(name = "xmas-tester", version = "0.1.0")]
#[command(about = "Scenario-driven QA runner for the Xtreme Xmas day progression engine")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x-prefixed hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rules JSON overriding the bundled economy and calendar settings
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        let mut out = open_output(args.output.as_deref())?;
        write_scenario_catalog(&mut out)?;
        out.flush()?;
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    if args.verbose {
        let labels: Vec<String> = seed_infos.iter().map(logic::SeedInfo::label).collect();
        println!("🎲 Seeds: {}", labels.join(", "));
    }
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let data = TesterData::from_rules_path(args.rules.as_deref())?;
    if let (true, Some(rules)) = (args.verbose, data.rules_override()) {
        println!(
            "📐 Rules override: {} calendar days, {} starting tokens",
            rules.calendar_days, rules.starting_reroll_tokens
        );
    }

    let results = run_logic_scenarios(&args, &scenarios, &seeds, data);
    let mut out = open_output(args.output.as_deref())?;
    args.report.render(&mut out, &results, start_time.elapsed())?;
    out.flush()?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

/// Report sink: the `--output` file when given, stdout otherwise.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(stdout())));
    };
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn write_scenario_catalog(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:25} - {description}")?;
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "🎄 Xtreme Xmas Scenario Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for scenario in SCENARIOS {
            if !scenarios.iter().any(|s| s == scenario.key) {
                scenarios.push(scenario.key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    data: TesterData,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(data, args.verbose);
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}
