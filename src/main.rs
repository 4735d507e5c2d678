// ==========================================
// 库存盘点对账系统 - 命令行入口
// ==========================================
// 职责: 解析命令 → 调用 StockCheckApi → 打印视图
// 说明: 日志写 stderr，命令输出写 stdout
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use stockcheck::app::{get_default_db_path, AppState};
use stockcheck::engine::{
    EngineError, EngineResult, ExportScope, ReaderScanSource, ScanSession, ScanSink,
    StockCheckView,
};
use stockcheck::i18n::{self, t, t_with_args};
use stockcheck::{logging, FieldKey, ListTab, ScanOutcome, StockCheckApi};

#[derive(Parser)]
#[command(name = "stockcheck")]
#[command(about = "Offline stock-check: import a CSV, filter, scan, export", long_about = None)]
struct Cli {
    /// SQLite database path (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Message language (en, zh-CN)
    #[arg(long, global = true, default_value = "en")]
    lang: String,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an inventory CSV (replaces the current dataset and clears scans)
    Import {
        /// CSV / TSV / semicolon-delimited file
        path: PathBuf,
    },

    /// Show or edit the column mapping
    Map {
        /// Bind a field to a column, e.g. --set stock="Stock #" (empty column unbinds)
        #[arg(long = "set", value_name = "FIELD=COLUMN")]
        assignments: Vec<String>,
    },

    /// Change the active filter
    Filter {
        /// Condition value, or "All"
        #[arg(long)]
        condition: Option<String>,

        /// Make (empty for all)
        #[arg(long)]
        make: Option<String>,

        /// Model (empty for all)
        #[arg(long)]
        model: Option<String>,
    },

    /// Switch the list tab (missing, scanned, all)
    Tab { tab: String },

    /// Show counters and the current list
    Status {
        /// Search by stock number or make/model/calibre
        #[arg(short, long, default_value = "")]
        search: String,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record one or more scanned stock numbers
    Scan {
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Read codes from stdin (barcode scanner in keyboard mode) until EOF or Ctrl-C
    Session,

    /// Export the current filter (or the whole dataset) with a status column
    Export {
        /// Export every row instead of the current filter
        #[arg(long)]
        all: bool,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Clear all scans for the current dataset
    Reset,

    /// Remove the dataset, mapping and scans from this device
    Clear,

    /// Read or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one setting, or all effective settings as JSON
    Get { key: Option<String> },

    /// Change a setting
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    i18n::set_locale(&cli.lang);

    let db_path = match &cli.db {
        Some(p) => p.to_string_lossy().to_string(),
        None => get_default_db_path(),
    };
    tracing::debug!(version = stockcheck::VERSION, db_path = %db_path, "启动");

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let api = state.stockcheck_api.clone();

    match cli.command {
        Commands::Import { path } => {
            let summary = api
                .import_file(&path)
                .await
                .with_context(|| format!("import {}", path.display()))?;
            println!("{}", summary.message);
            if !summary.mapping_complete() {
                print_mapping(&api).await?;
            } else {
                print_view(&api.view("").await?);
            }
        }
        Commands::Map { assignments } => {
            if assignments.is_empty() {
                print_mapping(&api).await?;
            } else {
                let (mut mapping, _) = api.get_mapping().await?;
                for assignment in &assignments {
                    let (field, column) = assignment
                        .split_once('=')
                        .ok_or_else(|| anyhow!("expected FIELD=COLUMN, got {:?}", assignment))?;
                    let key = FieldKey::parse(field)
                        .ok_or_else(|| anyhow!("unknown field {:?}", field))?;
                    mapping.set(key, Some(column.trim().to_string()));
                }
                let view = api.save_mapping(mapping).await?;
                println!("{}", t("mapping.saved"));
                print_view(&view);
            }
        }
        Commands::Filter {
            condition,
            make,
            model,
        } => {
            let mut view = None;
            if let Some(condition) = condition {
                view = Some(api.set_condition(&condition).await?);
            }
            if let Some(make) = make {
                view = Some(api.set_make(&make).await?);
            }
            if let Some(model) = model {
                view = Some(api.set_model(&model).await?);
            }
            let view = match view {
                Some(v) => {
                    println!("{}", t("filter.updated"));
                    v
                }
                None => api.view("").await?,
            };
            print_view(&view);
        }
        Commands::Tab { tab } => {
            let tab = ListTab::parse(&tab)
                .ok_or_else(|| anyhow!("unknown tab {:?} (missing, scanned, all)", tab))?;
            print_view(&api.set_tab(tab).await?);
        }
        Commands::Status { search, json } => {
            let view = api.view(&search).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_view(&view);
            }
        }
        Commands::Scan { codes } => {
            let mut last = None;
            for code in &codes {
                let report = api.record_scan(code).await?;
                println!("{}", report.message);
                last = Some(report.view);
            }
            if let Some(view) = last {
                print_counters(&view);
            }
        }
        Commands::Session => run_session(api).await?,
        Commands::Export { all, out } => {
            let scope = if all {
                ExportScope::All
            } else {
                ExportScope::Filtered
            };
            let file = api.export(scope).await?;
            let path = out.join(&file.filename);
            std::fs::write(&path, file.content.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
            println!(
                "{}",
                t_with_args(
                    "export.saved",
                    &[
                        ("rows", file.rows.to_string().as_str()),
                        ("path", path.display().to_string().as_str()),
                    ],
                )
            );
        }
        Commands::Reset => {
            let view = api.reset_scans().await?;
            println!("{}", t("reset.done"));
            print_counters(&view);
        }
        Commands::Clear => {
            api.clear_dataset().await?;
            println!("{}", t("clear.done"));
        }
        Commands::Config { action } => match action {
            ConfigAction::Get { key: None } => {
                let snapshot: serde_json::Value =
                    serde_json::from_str(&state.config_manager.get_config_snapshot()?)?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            ConfigAction::Get { key: Some(key) } => {
                let value = state
                    .config_manager
                    .get_effective_value(&key)?
                    .ok_or_else(|| anyhow!("unknown config key {:?}", key))?;
                println!("{}", value);
            }
            ConfigAction::Set { key, value } => {
                state.config_manager.set_config_value(&key, &value)?;
                println!(
                    "{}",
                    t_with_args(
                        "config.updated",
                        &[("key", key.as_str()), ("value", value.trim())],
                    )
                );
            }
        },
    }

    Ok(())
}

// ==========================================
// 扫码会话
// ==========================================

/// 会话处理方: 记录扫码并即时打印结果
struct ConsoleSink {
    api: Arc<StockCheckApi>,
}

#[async_trait]
impl ScanSink for ConsoleSink {
    async fn on_scan(&self, code: &str) -> EngineResult<ScanOutcome> {
        let report = self
            .api
            .record_scan(code)
            .await
            .map_err(|e| EngineError::Other(anyhow::Error::new(e)))?;
        println!("{}", report.message);
        print_counters(&report.view);
        Ok(report.outcome)
    }
}

async fn run_session(api: Arc<StockCheckApi>) -> anyhow::Result<()> {
    // 映射未完成时不进入会话
    let view = api.view("").await?;
    if view.dataset.is_none() {
        println!("{}", view.info_line);
        return Ok(());
    }
    if view.needs_mapping {
        println!("{}", t("view.needs_mapping"));
        return Ok(());
    }
    print_counters(&view);

    let debounce = Duration::from_millis(api.scan_debounce_ms().await?);
    let sink = Arc::new(ConsoleSink { api });
    let source = ReaderScanSource::stdin()?;
    let mut session = ScanSession::spawn(source, sink, debounce);
    println!("{}", t("scan.session_started"));

    tokio::select! {
        _ = session.closed() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("收到 Ctrl-C");
        }
    }

    let report = session.stop().await?;
    println!(
        "{}",
        t_with_args(
            "scan.session_stopped",
            &[
                ("dispatched", report.dispatched.to_string().as_str()),
                ("recorded", report.recorded.to_string().as_str()),
                ("suppressed", report.suppressed.to_string().as_str()),
            ],
        )
    );
    Ok(())
}

// ==========================================
// 输出
// ==========================================

async fn print_mapping(api: &StockCheckApi) -> anyhow::Result<()> {
    let (mapping, headers) = api.get_mapping().await?;
    println!("Columns: {}", headers.join(", "));
    for key in FieldKey::ALL {
        println!("  {:<10} {}", key.as_str(), mapping.get(key).unwrap_or("-"));
    }
    Ok(())
}

fn print_counters(view: &StockCheckView) {
    println!(
        "{}",
        t_with_args(
            "view.counters",
            &[
                ("expected", view.counters.expected.to_string().as_str()),
                ("scanned", view.counters.scanned.to_string().as_str()),
                ("missing", view.counters.missing.to_string().as_str()),
            ],
        )
    );
    if !view.status_line.is_empty() {
        println!("{}", view.status_line);
    }
}

fn print_view(view: &StockCheckView) {
    println!("{}", view.info_line);
    if view.dataset.is_none() {
        return;
    }
    if view.needs_mapping {
        println!("{}", t("view.needs_mapping"));
        return;
    }

    println!("{}", view.filter_summary);
    print_counters(view);
    println!("[{}]", view.tab);
    for row in &view.rows {
        if row.meta.is_empty() {
            println!("  {:<8} {}", row.status.to_string(), row.stock);
        } else {
            println!("  {:<8} {}  {}", row.status.to_string(), row.stock, row.meta);
        }
    }
}
