use crate::cmd::open_store;
use crate::output::{print_heading, print_json};
use clap::Subcommand;
use memory_core::{
    pattern::{PatternData, PatternRecord},
    time::format_relative,
    types::PatternType,
    MemoryStore,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum PatternSubcommand {
    /// Record a pattern, merging into an existing one with the same key
    Learn {
        /// api-patterns, error-handling, ui-patterns, database-patterns
        pattern_type: String,
        key: String,
        /// The pattern itself (signature, shape, snippet name)
        #[arg(long, short = 'p')]
        pattern: Option<String>,
        #[arg(long, short = 'd')]
        description: Option<String>,
        #[arg(long, short = 'e')]
        example: Option<String>,
        /// When to apply it
        #[arg(long, short = 'u')]
        usage: Option<String>,
    },
    /// Show every type, one type in detail, or a single pattern
    Show {
        pattern_type: Option<String>,
        key: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: PatternSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        PatternSubcommand::Learn {
            pattern_type,
            key,
            pattern,
            description,
            example,
            usage,
        } => {
            let data = PatternData {
                pattern,
                description,
                example,
                usage,
            };
            learn(&store, pattern_type.parse()?, &key, data, json)
        }
        PatternSubcommand::Show { pattern_type, key } => match (pattern_type, key) {
            (None, _) => show_all(&store, json),
            (Some(t), None) => show_type(&store, t.parse()?, json),
            (Some(t), Some(k)) => show_one(&store, t.parse()?, &k, json),
        },
    }
}

fn learn(
    store: &MemoryStore,
    pattern_type: PatternType,
    key: &str,
    data: PatternData,
    json: bool,
) -> anyhow::Result<()> {
    let record = store.learn_pattern(pattern_type, key, data)?;

    if json {
        return print_json(&serde_json::json!({
            "patternType": pattern_type,
            "key": key.trim(),
            "pattern": record,
        }));
    }
    println!("Learned pattern '{}' in {pattern_type}", key.trim());
    Ok(())
}

fn show_all(store: &MemoryStore, json: bool) -> anyhow::Result<()> {
    let all = store.all_patterns()?;
    let total: usize = all.iter().map(|(_, m)| m.len()).sum();

    if json {
        let mut patterns = serde_json::Map::new();
        for (t, m) in &all {
            patterns.insert(t.to_string(), serde_json::to_value(m)?);
        }
        return print_json(&serde_json::json!({ "patterns": patterns, "count": total }));
    }

    println!();
    print_heading("All Patterns");
    for (pattern_type, patterns) in &all {
        println!("\n{pattern_type}: {}", count_label(patterns.len()));
        for key in patterns.keys() {
            println!("  • {key}");
        }
    }
    if total > 0 {
        println!(
            "\nTotal: {} across {} types",
            count_label(total),
            PatternType::all().len()
        );
    } else {
        println!("\nNo patterns learned yet");
    }
    println!();
    Ok(())
}

fn show_type(store: &MemoryStore, pattern_type: PatternType, json: bool) -> anyhow::Result<()> {
    let patterns = store.get_patterns(pattern_type)?;

    if json {
        return print_json(&serde_json::json!({
            "patternType": pattern_type,
            "patterns": patterns,
            "count": patterns.len(),
        }));
    }

    let now = store.now();
    println!();
    print_heading(&format!("{pattern_type} ({})", patterns.len()));
    if patterns.is_empty() {
        println!("\nNo patterns learned yet");
    }
    for (i, (key, record)) in patterns.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "-".repeat(70));
        }
        print_record(key, record, now);
    }
    println!();
    Ok(())
}

fn show_one(
    store: &MemoryStore,
    pattern_type: PatternType,
    key: &str,
    json: bool,
) -> anyhow::Result<()> {
    let record = store.get_pattern(pattern_type, key)?;

    if json {
        return print_json(&serde_json::json!({
            "patternType": pattern_type,
            "key": key,
            "pattern": record,
        }));
    }
    print_record(key, &record, store.now());
    println!();
    Ok(())
}

fn print_record(key: &str, record: &PatternRecord, now: chrono::DateTime<chrono::Utc>) {
    println!("\n{key}");
    if let Some(d) = &record.description {
        println!("\nDescription:\n  {d}");
    }
    if let Some(p) = &record.pattern {
        println!("\nPattern:\n  {p}");
    }
    if let Some(e) = &record.example {
        println!("\nExample:");
        for line in e.lines() {
            println!("  {line}");
        }
    }
    if let Some(u) = &record.usage {
        println!("\nUsage:\n  {u}");
    }
    println!("\nLearned: {}", format_relative(record.learned_at, now));
}

fn count_label(n: usize) -> String {
    if n == 1 {
        "1 pattern".to_string()
    } else {
        format!("{n} patterns")
    }
}
