use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::actions::perform;
use crate::config::Config;
use crate::debounce::{QueryController, ResultSet};
use crate::fetch::search_sources;
use crate::list::{build_list, ListEntry};
use crate::types::Action;

// ─── Command line ──────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "vault-tree-search", version, about = "Search several Obsidian vaults at once")]
pub struct Cli {
    /// Comma-separated plugin sockets, e.g. `/tmp/raycast-Work.sock,/tmp/raycast-Home.sock`.
    /// Defaults to every `/tmp/raycast-*.sock`.
    #[arg(long, env = "TREE_SEARCH_SOCKETS")]
    pub sockets: Option<String>,

    /// Per-vault request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Quiet period before a typed query fires, in milliseconds.
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one search and print the matches.
    Query {
        text: String,
        /// Print the raw per-vault results as JSON.
        #[arg(long)]
        json: bool,
        /// Perform an action instead of listing, e.g. `2.1` for row 2, action 1.
        #[arg(long, value_name = "ROW.ACTION")]
        run: Option<String>,
    },
    /// Search as you type: every stdin line replaces the current search text.
    Watch,
    /// List the configured vaults.
    Sources,
}

impl Cli {
    pub fn config(&self) -> Config {
        let mut config = Config::from_sockets(self.sockets.as_deref());
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.debounce_ms {
            config.quiet = Duration::from_millis(ms);
        }
        config
    }
}

pub async fn dispatch(command: Command, config: Config) -> Result<()> {
    if config.endpoints.is_empty() {
        bail!("No vault sockets configured; pass --sockets or set TREE_SEARCH_SOCKETS");
    }
    match command {
        Command::Query { text, json, run } => query(&config, &text, json, run.as_deref()).await,
        Command::Watch => watch(config).await,
        Command::Sources => {
            let mut out = std::io::stdout().lock();
            for endpoint in &config.endpoints {
                writeln!(out, "{}\t{}", endpoint.name, endpoint.socket.display())?;
            }
            Ok(())
        }
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// One-shot search. Lists the rows, prints JSON, or performs a selected action.
pub async fn query(config: &Config, text: &str, json: bool, run: Option<&str>) -> Result<()> {
    let results = search_sources(text, config).await;
    let list = build_list(&results);

    if let Some(selector) = run {
        return perform(select_action(&list, selector)?);
    }

    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &results)?;
        writeln!(out)?;
    } else {
        write_list(&mut out, &list)?;
    }
    Ok(())
}

/// Interactive search driven by stdin lines. Prints each committed result set.
pub async fn watch(config: Config) -> Result<()> {
    let search_config = Arc::new(config.clone());
    let mut controller = QueryController::new(config.quiet, move |query: String| {
        let config = Arc::clone(&search_config);
        async move { search_sources(&query, &config).await }
    });
    let mut committed = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting = false;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let text = line.trim_end();
                    awaiting = !text.is_empty();
                    controller.input(text);
                }
                None => break,
            },
            changed = committed.changed() => {
                changed?;
                awaiting = false;
                print_committed(&mut committed)?;
            }
        }
    }

    // Input closed while a query was still scheduled or running.
    if awaiting
        && tokio::time::timeout(config.quiet + config.timeout, committed.changed())
            .await
            .is_ok()
    {
        print_committed(&mut committed)?;
    }
    Ok(())
}

fn print_committed(committed: &mut watch::Receiver<Option<Arc<ResultSet>>>) -> Result<()> {
    let Some(set) = committed.borrow_and_update().clone() else {
        return Ok(());
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "── {} ──", set.query)?;
    write_list(&mut out, &build_list(&set.sources))?;
    Ok(())
}

// ─── Output helpers ────────────────────────────────────────────────────────────

/// Print numbered rows, each followed by its numbered actions.
pub fn write_list(out: &mut impl Write, list: &[ListEntry]) -> std::io::Result<()> {
    if list.is_empty() {
        writeln!(out, "No results")?;
    }
    for (row, entry) in list.iter().enumerate() {
        match entry.icon {
            None => writeln!(out, "{:>3}. ⚠️  {}", row + 1, entry.title)?,
            Some(icon) => {
                let tag = if entry.source_tag.is_empty() {
                    String::new()
                } else {
                    format!("{} ", entry.source_tag)
                };
                writeln!(out, "{:>3}. {tag}{}{}", row + 1, icon.glyph(), entry.title)?;
            }
        }
        for (n, action) in entry.actions.iter().enumerate() {
            match action.shortcut {
                Some(shortcut) => writeln!(out, "       {}) {} [{shortcut}]", n + 1, action.title)?,
                None => writeln!(out, "       {}) {}", n + 1, action.title)?,
            }
        }
    }
    Ok(())
}

/// Resolve a one-based `ROW.ACTION` selector against the printed list.
pub fn select_action<'a>(list: &'a [ListEntry], selector: &str) -> Result<&'a Action> {
    let (row, action) = selector
        .split_once('.')
        .with_context(|| format!("Expected ROW.ACTION, got {selector:?}"))?;
    let row: usize = row.trim().parse().with_context(|| format!("Invalid row {row:?}"))?;
    let action: usize = action
        .trim()
        .parse()
        .with_context(|| format!("Invalid action {action:?}"))?;

    let entry = row
        .checked_sub(1)
        .and_then(|i| list.get(i))
        .with_context(|| format!("No row {row}; {} rows listed", list.len()))?;
    action
        .checked_sub(1)
        .and_then(|i| entry.actions.get(i))
        .with_context(|| format!("Row {row} has no action {action}"))
}
