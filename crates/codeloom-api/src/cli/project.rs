//! `loom project` commands.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use codeloom_infra::filesystem::export_project;

use crate::state::AppState;

/// Display a user's project: files, technologies and libraries.
pub async fn show_project(state: &AppState, user: &str, json: bool) -> Result<()> {
    let project = state.project_service.load_or_default(user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Project for {}",
        style("▸").cyan().bold(),
        style(user).bold()
    );
    println!();
    println!(
        "  Technologies: {}",
        project
            .technologies
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    let libraries = if project.installed_libraries.is_empty() {
        style("none".to_string()).dim().to_string()
    } else {
        project
            .installed_libraries
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("  Libraries:    {libraries}");
    println!();

    if project.files.is_empty() {
        println!("  {}", style("No files yet. Start with 'loom chat'.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("File").fg(Color::White),
        Cell::new("Lines").fg(Color::White),
        Cell::new("Bytes").fg(Color::White),
    ]);
    for file in &project.files {
        table.add_row(vec![
            Cell::new(&file.name).fg(Color::Cyan),
            Cell::new(file.content.lines().count()),
            Cell::new(file.content.len()),
        ]);
    }
    println!("{table}");
    println!();

    Ok(())
}

/// Reset a user's project to the default.
pub async fn reset_project(state: &AppState, user: &str, json: bool) -> Result<()> {
    state.project_service.reset(user).await?;

    if json {
        println!("{}", serde_json::json!({"reset": true, "user": user}));
    } else {
        println!("  {} Project for {} reset", style("✓").green(), style(user).bold());
    }
    Ok(())
}

/// Write every project file under `dir`.
pub async fn export(state: &AppState, user: &str, dir: &Path, json: bool) -> Result<()> {
    let project = state.project_service.load_or_default(user).await?;
    let written = export_project(&project, dir).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"exported": written, "dir": dir.display().to_string()})
        );
    } else {
        println!(
            "  {} Exported {} file(s) to {}",
            style("✓").green(),
            written,
            style(dir.display()).cyan()
        );
    }
    Ok(())
}

/// Remove one file from a user's project.
pub async fn remove_file(state: &AppState, user: &str, file: &str, json: bool) -> Result<()> {
    let project = state.project_service.delete_file(user, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!(
            "  {} Removed {} ({} file(s) left)",
            style("✓").green(),
            style(file).cyan(),
            project.files.len()
        );
    }
    Ok(())
}
