use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use delve_bench::report;
use delve_bench::runner::BenchmarkRunner;
use delve_bench::scenes;
use delve_core::config::{load_config_file, CaveConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut baseline_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut overrides: Vec<String> = Vec::new();
    let mut regression_threshold = 10.0f64;
    let mut chunk_count = 200u32;
    let mut seed: Option<u64> = None;
    let mut ascii = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--baseline" => baseline_path = Some(PathBuf::from(value_of(&args, &mut i))),
            "--output" => output_path = Some(PathBuf::from(value_of(&args, &mut i))),
            "--config" => config_path = Some(PathBuf::from(value_of(&args, &mut i))),
            "--set" => overrides.push(value_of(&args, &mut i).to_string()),
            "--regression-threshold" => {
                regression_threshold = parse_value(&args, &mut i, "--regression-threshold");
            }
            "--chunks" => chunk_count = parse_value(&args, &mut i, "--chunks"),
            "--seed" => seed = Some(parse_value(&args, &mut i, "--seed")),
            "--ascii" => ascii = true,
            "--help" | "-h" => {
                eprintln!("Usage: delve-bench [OPTIONS]");
                eprintln!("  --baseline <path>              Load baseline JSON for comparison");
                eprintln!("  --output <path>                Save current results as JSON baseline");
                eprintln!(
                    "  --regression-threshold <pct>   Regression threshold percentage (default: 10)"
                );
                eprintln!("  --chunks <n>                   Chunks per scene (default: 200)");
                eprintln!("  --seed <n>                     World seed; 0 picks one per scene (default: 1)");
                eprintln!("  --config <path>                Base generator config (RON)");
                eprintln!("  --set <key=value>              Override one config field (repeatable)");
                eprintln!("  --ascii                        Print the last chunk of each scene");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut base = match &config_path {
        Some(path) => match load_config_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {e}");
                process::exit(1);
            }
        },
        None => CaveConfig {
            seed: 1,
            ..CaveConfig::default()
        },
    };
    for assignment in &overrides {
        if let Err(e) = base.apply_assignment(assignment) {
            eprintln!("ERROR: --set {assignment}: {e}");
            process::exit(1);
        }
    }
    if let Some(seed) = seed {
        base.seed = seed;
    }
    let (base, issues) = base.sanitize();
    if !issues.is_empty() {
        log::warn!("{} config values were corrected", issues.len());
    }

    let runner = BenchmarkRunner::new(chunk_count);
    let mut results = Vec::new();

    for scene in scenes::standard_scenes(&base) {
        let (result, last) = runner.run_scene(&scene);
        if ascii {
            if let Some(chunk) = last {
                println!("\n### {} (chunk {})\n", scene.name, chunk.depth());
                println!("```\n{}```", chunk.to_ascii());
            }
        }
        results.push(result);
    }

    // Print markdown summary
    println!("\n## Benchmark Results\n");
    println!("{}", report::format_markdown(&results));

    if let Some(ref path) = output_path {
        let baseline = report::Baseline {
            timestamp: timestamp(),
            results: results.clone(),
        };
        if let Err(e) = report::save_baseline(path, &baseline) {
            eprintln!("ERROR: failed to save baseline to {}: {e}", path.display());
            process::exit(1);
        }
        log::info!("Saved baseline to {}", path.display());
    }

    if let Some(ref path) = baseline_path {
        if let Some(baseline) = report::load_baseline(path) {
            let regressions = report::compare(&results, &baseline, regression_threshold);
            println!(
                "{}",
                report::format_comparison(&regressions, regression_threshold)
            );
            if !regressions.is_empty() {
                eprintln!(
                    "ERROR: {} regressions detected, exiting with code 1",
                    regressions.len()
                );
                process::exit(1);
            }
        } else {
            log::warn!("Baseline file not found: {}", path.display());
        }
    }

    log::info!("Benchmark complete.");
}

/// The argument after `args[*i]`, advancing past it.
fn value_of<'a>(args: &'a [String], i: &mut usize) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(value) => value,
        None => {
            eprintln!("Missing value for {}", args[*i - 1]);
            process::exit(1);
        }
    }
}

fn parse_value<T: FromStr>(args: &[String], i: &mut usize, flag: &str) -> T {
    let text = value_of(args, i);
    match text.parse() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("Invalid {flag} value: {text}");
            process::exit(1);
        }
    }
}

/// Seconds since the epoch, without pulling in a date crate.
fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("bench-{secs}")
}
