use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use predicate_logic::config::{ConfigError, QueryConfig};
use predicate_logic::repl::{Outcome, Session};

#[derive(Parser, Debug)]
#[command(name = "predicate-logic")]
#[command(about = "Parse boolean predicate queries into trees, logic strings and predicates")]
#[command(version)]
struct Args {
    /// JSON配置文件路径
    #[arg(short, long, default_value = "query_config.json")]
    config: PathBuf,

    /// 解析单条查询后退出
    #[arg(short, long)]
    query: Option<String>,
}

/// 初始化日志, 默认级别 warn, 可通过 RUST_LOG 覆盖
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// 加载配置, 失败时使用默认配置
fn load_config(path: &Path) -> QueryConfig {
    match QueryConfig::from_json_file(path) {
        Ok(config) => {
            info!(path = %path.display(), operators = config.operators.len(), "loaded query config");
            config
        }
        Err(ConfigError::NotFound(_)) => {
            debug!(path = %path.display(), "no config file, using defaults");
            QueryConfig::default()
        }
        Err(e) => {
            warn!(error = %e, "无法加载JSON配置文件, 使用默认配置");
            QueryConfig::default()
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = load_config(&args.config);
    let mut session = Session::new(&config).context("invalid operator configuration")?;

    if let Some(query) = args.query {
        if let Outcome::Output(text) = session.execute(&query)? {
            println!("{text}");
        }
        return Ok(());
    }

    run_repl(&mut session)
}

fn run_repl(session: &mut Session) -> Result<()> {
    println!("--- Predicate Logic: 查询解析器 ---");
    println!("输入 :help 查看可用命令, :quit 退出\n");

    let mut editor = DefaultEditor::new().context("无法初始化行编辑器")?;

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.as_str())?;
                }
                match session.execute(&line)? {
                    Outcome::Output(text) if text.is_empty() => {}
                    Outcome::Output(text) => println!("{text}\n"),
                    Outcome::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("读取输入失败"),
        }
    }

    Ok(())
}
