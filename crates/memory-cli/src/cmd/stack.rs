use crate::cmd::open_store;
use crate::output::{print_heading, print_json};
use clap::Args;
use memory_core::{
    techstack::{display_label, TechStack},
    time::{format_date, format_relative},
    MemoryStore,
};
use std::collections::BTreeMap;
use std::path::Path;

/// With no field flags, shows the recorded stack.
#[derive(Args)]
pub struct StackArgs {
    #[arg(long)]
    framework: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    runtime: Option<String>,
    #[arg(long)]
    database: Option<String>,
    #[arg(long)]
    orm: Option<String>,
    #[arg(long)]
    state_management: Option<String>,
    #[arg(long)]
    styling: Option<String>,
    #[arg(long)]
    testing: Option<String>,
    #[arg(long)]
    build_tool: Option<String>,
    #[arg(long)]
    package_manager: Option<String>,
    #[arg(long)]
    deployment: Option<String>,
    #[arg(long)]
    cicd: Option<String>,
    /// Any other field, as key=value (repeatable)
    #[arg(long = "custom", value_parser = parse_custom)]
    custom: Vec<(String, String)>,
}

impl StackArgs {
    fn into_fields(self) -> BTreeMap<String, String> {
        let known = [
            ("framework", self.framework),
            ("language", self.language),
            ("runtime", self.runtime),
            ("database", self.database),
            ("orm", self.orm),
            ("stateManagement", self.state_management),
            ("styling", self.styling),
            ("testing", self.testing),
            ("buildTool", self.build_tool),
            ("packageManager", self.package_manager),
            ("deployment", self.deployment),
            ("cicd", self.cicd),
        ];
        let mut fields: BTreeMap<String, String> = known
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect();
        fields.extend(self.custom);
        fields
    }
}

fn parse_custom(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

pub fn run(root: &Path, args: StackArgs, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let fields = args.into_fields();
    if fields.is_empty() {
        return show(&store, json);
    }

    let stack = store.update_tech_stack(fields.clone())?;
    if json {
        return print_json(&stack);
    }
    println!("Tech stack updated");
    for (field, value) in &fields {
        println!("  {}: {value}", display_label(field));
    }
    Ok(())
}

fn show(store: &MemoryStore, json: bool) -> anyhow::Result<()> {
    let stack = store.get_tech_stack()?;
    if json {
        return print_json(&stack);
    }

    println!();
    print_heading("Tech Stack");
    match &stack {
        Some(stack) if !stack.fields.is_empty() => print_stack(store, stack),
        _ => println!("\nNo tech stack recorded yet"),
    }
    println!();
    Ok(())
}

fn print_stack(store: &MemoryStore, stack: &TechStack) {
    let rows = stack.ordered_fields();
    let width = rows
        .iter()
        .map(|(k, _)| display_label(k).chars().count())
        .max()
        .unwrap_or(0);
    println!();
    for (field, value) in rows {
        let label = format!("{}:", display_label(field));
        println!("{label:<w$} {value}", w = width + 1);
    }
    if let Some(at) = stack.last_updated {
        println!(
            "\nLast updated: {} ({})",
            format_date(at, store.config().offset()),
            format_relative(at, store.now())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_pairs() {
        assert_eq!(
            parse_custom("apiClient=TanStack Query").unwrap(),
            ("apiClient".to_string(), "TanStack Query".to_string())
        );
        assert_eq!(parse_custom("k=a=b").unwrap().1, "a=b");
        assert!(parse_custom("novalue").is_err());
        assert!(parse_custom("=x").is_err());
    }
}
