//! CLI handlers for `dayplan prompt` subcommands.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_core::cache;
use dayplan_db::models::{CacheEntry, RequestKind};
use dayplan_db::queries::cache_entries;

use crate::PromptCommands;

pub async fn run_prompt_command(command: PromptCommands, pool: &PgPool, owner: Uuid) -> Result<()> {
    match command {
        PromptCommands::Add { kind, text } => cmd_add(pool, owner, &kind, &text).await,
        PromptCommands::List { kind, limit } => cmd_list(pool, owner, kind.as_deref(), limit).await,
    }
}

async fn cmd_add(pool: &PgPool, owner: Uuid, kind: &str, text: &str) -> Result<()> {
    let kind: RequestKind = kind.parse()?;
    let mut conn = pool.acquire().await?;
    let (entry, created) = cache::capture_input(&mut conn, owner, kind, text).await?;

    if created {
        println!("Stored {} input {}", entry.request_kind, entry.id);
    } else {
        println!(
            "Already stored as {} (seen {} times)",
            entry.id,
            entry.use_count + 1
        );
    }
    Ok(())
}

async fn cmd_list(pool: &PgPool, owner: Uuid, kind: Option<&str>, limit: i64) -> Result<()> {
    let kind = kind.map(str::parse::<RequestKind>).transpose()?;
    let entries = cache_entries::list_for_owner(pool, owner, kind, limit).await?;

    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", render_entry(entry));
    }
    Ok(())
}

/// One line per entry: time, kind, state and the first line of the content.
fn render_entry(entry: &CacheEntry) -> String {
    let state = if entry.request_kind.is_user_input() {
        "input"
    } else if entry.is_resolved() {
        "resolved"
    } else {
        "pending"
    };
    let first_line = entry.raw_content.lines().next().unwrap_or_default();
    let preview: String = first_line.chars().take(60).collect();
    let ellipsis = if first_line.chars().count() > 60 { "..." } else { "" };
    format!(
        "{}  {:<10} {:<8} x{:<3} {preview}{ellipsis}",
        entry.created_at.format("%Y-%m-%d %H:%M"),
        entry.request_kind.to_string(),
        state,
        entry.use_count,
    )
}
