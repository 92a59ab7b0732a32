//! `loom key` commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use crate::state::AppState;

/// Mint a key and print it once.
pub async fn create_key(state: &AppState, user: &str, name: &str, json: bool) -> Result<()> {
    let key = state.api_keys.create_key(user, name).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"user": user, "name": name, "key": key})
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} API key for {} (save this -- it won't be shown again):",
        style("🔑").bold(),
        style(user).bold()
    );
    println!();
    println!("  {}", style(&key).yellow().bold());
    println!();
    Ok(())
}

/// List keys issued to a user (without secrets).
pub async fn list_keys(state: &AppState, user: &str, json: bool) -> Result<()> {
    let keys = state.api_keys.list_keys(user).await?;

    if json {
        let rows: Vec<_> = keys
            .iter()
            .map(|k| {
                serde_json::json!({
                    "id": k.id.to_string(),
                    "name": k.name,
                    "created_at": k.created_at,
                    "last_used_at": k.last_used_at,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!("  {}", style(format!("No keys for {user}.")).dim());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Last used").fg(Color::White),
    ]);
    for k in &keys {
        table.add_row(vec![
            Cell::new(k.id),
            Cell::new(&k.name).fg(Color::Cyan),
            Cell::new(&k.created_at),
            Cell::new(k.last_used_at.as_deref().unwrap_or("never")),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Revoke a key; it stops authenticating immediately.
pub async fn revoke_key(state: &AppState, id: &Uuid, json: bool) -> Result<()> {
    if !state.api_keys.revoke(id).await? {
        anyhow::bail!("no API key with id {id}");
    }

    if json {
        println!("{}", serde_json::json!({"id": id.to_string(), "revoked": true}));
    } else {
        println!("  {} Revoked key {}", style("✓").green().bold(), style(id).dim());
    }
    Ok(())
}
