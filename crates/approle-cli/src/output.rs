use anyhow::Result;
use approle_core::{ApplyOutcome, Modification};
use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Human readable report of one modification, one line per change.
pub fn report_lines(modification: &Modification) -> Vec<String> {
    let app = &modification.display_name;
    if modification.is_empty() {
        return vec![format!("No modifications required for the '{app}' application.")];
    }

    let additions = modification.additions.iter().map(|a| {
        format!(
            "Assigning the '{}' role to the '{}' group for the '{app}' application.",
            a.role.role_value, a.group.group_display_name
        )
    });
    let deletions = modification.deletions.iter().map(|d| {
        format!(
            "Removing the '{}' role from the '{}' group for the '{app}' application.",
            d.role.role.role_value, d.group.group_display_name
        )
    });
    additions.chain(deletions).collect()
}

pub fn print_modifications(
    modifications: &[Modification],
    format: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for line in modifications.iter().flat_map(report_lines) {
                println!("{line}");
            }
            if dry_run {
                println!("{}", "Dry run: no changes were applied.".yellow());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(modifications)?);
        }
        OutputFormat::Table => {
            print_table(modifications);
            if dry_run {
                println!("{}", "Dry run: no changes were applied.".yellow());
            }
        }
    }
    Ok(())
}

fn print_table(modifications: &[Modification]) {
    let rows = table_rows(modifications);
    if rows.is_empty() {
        println!("No modifications required.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Application", "Action", "Group", "Role"]);
    for row in rows {
        builder.push_record(row);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn table_rows(modifications: &[Modification]) -> Vec<[String; 4]> {
    let mut rows = Vec::new();
    for m in modifications {
        for a in &m.additions {
            rows.push([
                m.display_name.clone(),
                "add".to_string(),
                a.group.group_display_name.clone(),
                a.role.role_value.clone(),
            ]);
        }
        for d in &m.deletions {
            rows.push([
                m.display_name.clone(),
                "remove".to_string(),
                d.group.group_display_name.clone(),
                d.role.role.role_value.clone(),
            ]);
        }
    }
    rows
}

/// Prints every failed operation to stderr.
pub fn print_failures(outcomes: &[ApplyOutcome]) {
    for outcome in outcomes {
        for failure in outcome.failures() {
            if let Some(err) = failure.error() {
                print_error(&format!("{}: {err}", outcome.display_name));
            }
        }
    }
}
