//! repair CLI — drive program representations from the shell
//!
//! Commands:
//!   repair sanity   — check the original program against its tests
//!   repair localize — compute and print fault localization
//!   repair mutate   — apply edits and print the resulting source
//!   repair evaluate — apply edits, run every test, persist the cache
//!   repair cache    — inspect or clear the persisted test cache

use repair_core::rep::LocalizationEntry;
use repair_core::{
    Edit, EvalContext, LineProgram, RepairConfig, Representation, TestCache, Variant,
};
use std::env;
use std::error::Error;
use std::path::Path;
use std::process;

type CliResult = Result<(), Box<dyn Error>>;

/// Files with this extension are loaded as binary snapshots
const SNAPSHOT_EXTENSION: &str = "snap";

fn print_usage() {
    println!(
        r#"
repair-core {} — program representations for search-based repair

Usage: repair <command> [options]

Commands:
  sanity   <config> <source>                     Check the original against its tests
  localize <config> <source> [--full] [--sample <n>]
                                                 Print fault localization weights
  mutate   <config> <source> <edit>... [--save <snapshot>]
                                                 Apply edits and print the source
  evaluate <config> <source> [edit...]           Apply edits and run every test
  cache    <config> [stats|clear]                Inspect or clear the test cache

Edits are written d(<atom>), a(<dst>,<src>) or s(<a>,<b>).
A <source> ending in .{} is loaded as a saved snapshot.

Examples:
  repair sanity repair.json gcd.s
  repair mutate repair.json gcd.s "d(5)" "a(3,7)"
  repair evaluate repair.json gcd.s "s(2,4)"
  repair cache repair.json clear
"#,
        env!("CARGO_PKG_VERSION"),
        SNAPSHOT_EXTENSION
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "sanity" => cmd_sanity(&args[2..]),
        "localize" => cmd_localize(&args[2..]),
        "mutate" => cmd_mutate(&args[2..]),
        "evaluate" => cmd_evaluate(&args[2..]),
        "cache" => cmd_cache(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("  Error: {}", e);
        process::exit(1);
    }
}

fn load_context(config_path: &str) -> Result<EvalContext, Box<dyn Error>> {
    let config = RepairConfig::load(config_path)?;
    Ok(EvalContext::new(config))
}

fn is_snapshot(path: &str) -> bool {
    Path::new(path).extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXTENSION)
}

/// Parse a source file, or restore a snapshot when the path says so
fn load_variant(ctx: EvalContext, path: &str) -> Result<Variant<LineProgram>, Box<dyn Error>> {
    if is_snapshot(path) {
        return Ok(Variant::load_binary(ctx, Path::new(path))?);
    }
    let text = std::fs::read_to_string(path)?;
    Ok(Variant::from_source(ctx, &text)?)
}

fn parse_edits(args: &[String]) -> Result<Vec<Edit>, Box<dyn Error>> {
    let mut edits = Vec::with_capacity(args.len());
    for arg in args {
        edits.push(arg.parse::<Edit>()?);
    }
    Ok(edits)
}

/// Localization is only computed for fresh sources; snapshots carry their own
fn prepare(variant: &mut Variant<LineProgram>, path: &str) -> CliResult {
    if !is_snapshot(path) {
        variant.compute_fault_localization()?;
    }
    Ok(())
}

fn print_entries(entries: &[LocalizationEntry]) {
    for entry in entries {
        println!("  {:>6}  {:.4}", entry.atom.get(), entry.weight);
    }
}

fn cmd_sanity(args: &[String]) -> CliResult {
    if args.len() < 2 {
        eprintln!("Usage: repair sanity <config> <source>");
        return Ok(());
    }
    let ctx = load_context(&args[0])?;
    let mut variant = load_variant(ctx.clone(), &args[1])?;
    variant.sanity_check()?;
    println!("\n  Sanity check passed: {} atoms", variant.max_atom());
    println!("  {}", ctx.stats().summary());
    persist_cache(&ctx);
    Ok(())
}

fn cmd_localize(args: &[String]) -> CliResult {
    if args.len() < 2 {
        eprintln!("Usage: repair localize <config> <source> [--full] [--sample <n>]");
        return Ok(());
    }
    let full = args[2..].iter().any(|a| a == "--full");
    let samples: usize = match args[2..].iter().position(|a| a == "--sample") {
        Some(i) => args
            .get(i + 3)
            .ok_or("--sample needs a count")?
            .parse()?,
        None => 0,
    };
    let ctx = load_context(&args[0])?;
    let mut variant = load_variant(ctx.clone(), &args[1])?;
    prepare(&mut variant, &args[1])?;

    let entries = if full {
        variant.get_full_localization()
    } else {
        variant.get_localization()
    };
    println!(
        "\n  Fault localization for '{}' ({} of {} atoms):",
        variant.name(),
        entries.len(),
        variant.max_atom()
    );
    println!("  {}", "-".repeat(20));
    print_entries(&entries);

    if samples > 0 {
        let mut rng = ctx.config().rng();
        let picks: Vec<String> = (0..samples)
            .filter_map(|_| variant.localization().choose(&mut rng))
            .map(|id| id.to_string())
            .collect();
        println!("\n  Sampled sites (seed {}): {}", ctx.config().seed, picks.join(" "));
    }
    Ok(())
}

fn cmd_mutate(args: &[String]) -> CliResult {
    if args.len() < 2 {
        eprintln!("Usage: repair mutate <config> <source> <edit>... [--save <snapshot>]");
        return Ok(());
    }
    let mut rest: Vec<String> = args[2..].to_vec();
    let save_to = match rest.iter().position(|a| a == "--save") {
        Some(i) => {
            let target = rest.get(i + 1).cloned().ok_or("--save needs a path")?;
            rest.drain(i..i + 2);
            Some(target)
        }
        None => None,
    };

    let ctx = load_context(&args[0])?;
    let mut variant = load_variant(ctx, &args[1])?;
    prepare(&mut variant, &args[1])?;
    for edit in parse_edits(&rest)? {
        variant.apply(&edit)?;
    }

    if let Some(target) = save_to {
        variant.save_binary(Path::new(&target))?;
    }
    print!("{}", variant.output_source());
    Ok(())
}

fn cmd_evaluate(args: &[String]) -> CliResult {
    if args.len() < 2 {
        eprintln!("Usage: repair evaluate <config> <source> [edit...]");
        return Ok(());
    }
    let ctx = load_context(&args[0])?;
    let mut variant = load_variant(ctx.clone(), &args[1])?;
    for edit in parse_edits(&args[2..])? {
        variant.apply(&edit)?;
    }

    println!("\n  Evaluating '{}' ({})", variant.name(), variant.digest().short());
    println!("  {}", "-".repeat(40));
    let mut passed = 0;
    let tests = ctx.config().all_tests();
    for &test in &tests {
        let outcome = variant.test_case(test)?;
        if outcome.passed() {
            passed += 1;
        }
        println!("  {:<6} {}", test.to_string(), outcome);
    }
    println!("  {}", "-".repeat(40));
    println!("  Passed {}/{}", passed, tests.len());
    println!("  {}", ctx.stats().summary());
    persist_cache(&ctx);
    Ok(())
}

fn cmd_cache(args: &[String]) -> CliResult {
    if args.is_empty() {
        eprintln!("Usage: repair cache <config> [stats|clear]");
        return Ok(());
    }
    let config = RepairConfig::load(&args[0])?;
    let mut cache = TestCache::restore(&config.cache_path);

    match args.get(1).map(|s| s.as_str()) {
        None | Some("stats") => {
            println!("\n  Test cache {}", cache.path().display());
            println!("  {}", "=".repeat(40));
            println!("  Entries: {}", cache.len());
        }
        Some("clear") => {
            let dropped = cache.len();
            cache.clear();
            cache.persist()?;
            println!("  Cleared {} entries from {}", dropped, cache.path().display());
        }
        Some(other) => {
            eprintln!("  Unknown cache action: {}", other);
            eprintln!("Usage: repair cache <config> [stats|clear]");
        }
    }
    Ok(())
}

fn persist_cache(ctx: &EvalContext) {
    if !ctx.config().use_cache {
        return;
    }
    if let Err(e) = ctx.cache().persist() {
        eprintln!("  Failed to save test cache: {}", e);
    }
}
