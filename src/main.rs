//! # clash-forge
//!
//! 根据提供者、地区关键词与代理组策略生成完整的 Clash 配置文件。
//!
//! ## 功能
//! - 按提供者拆分或按地区合并生成地区代理组（带节点过滤正则）
//! - 解析自定义组与手动选择组，组装主组成员并避免重复
//! - 展开自定义规则与规则集引用
//! - 产物写入、备份轮转、失败回滚与定时更新
//! - HTTP 服务：订阅地址、状态查询、手动更新与签名校验的 webhook
//!
//! ## 使用
//! ```bash
//! # 生成配置（默认读取 config/config.ini）
//! clash-forge generate
//!
//! # 输出到标准输出，任何警告都视为失败
//! clash-forge generate --stdout --strict
//!
//! # 只检查配置，不写文件
//! clash-forge check
//!
//! # 过期则更新一次 / 守护模式
//! clash-forge update
//! clash-forge update --daemon
//!
//! # 查看产物状态
//! clash-forge status --json
//!
//! # 启动 HTTP 服务，同时按 update_interval 定时更新
//! clash-forge serve --schedule
//! ```

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod group;
mod profile;
mod region;
mod rule;
mod server;
mod service;

use config::Settings;
use profile::OutputFormat;
use service::{ProfileStore, Status, UpdateOutcome, Updater};

/// 默认设置文件路径
const DEFAULT_CONFIG: &str = "config/config.ini";

// ========================================
// CLI 参数定义
// ========================================

/// Clash 配置生成工具
#[derive(Parser)]
#[command(name = "clash-forge")]
#[command(version)]
#[command(about = "Synthesize Clash proxy profiles from provider, region and group settings")]
struct Cli {
    /// 设置文件路径
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// 显示调试日志
    #[arg(long, global = true)]
    debug: bool,

    /// 子命令
    #[command(subcommand)]
    command: Commands,
}

/// 支持的子命令
#[derive(Subcommand)]
enum Commands {
    /// 生成配置文件
    Generate {
        /// 输出路径（默认使用设置中的 files.output）
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// 输出格式
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// 输出到标准输出而不是文件
        #[arg(long)]
        stdout: bool,

        /// 任何警告都视为失败
        #[arg(long)]
        strict: bool,
    },
    /// 检查设置与模板，打印诊断，不写文件
    Check {
        /// 任何警告都视为失败
        #[arg(long)]
        strict: bool,
    },
    /// 产物过期时重新生成（带备份与回滚）
    Update {
        /// 以守护模式循环运行
        #[arg(long)]
        daemon: bool,

        /// 忽略过期检查，立即更新
        #[arg(long)]
        force: bool,
    },
    /// 显示产物状态
    Status {
        /// JSON 格式输出
        #[arg(long)]
        json: bool,
    },
    /// 启动 HTTP 服务
    Serve {
        /// 监听地址（默认使用设置中的 server.host）
        #[arg(long)]
        host: Option<String>,

        /// 监听端口（默认使用设置中的 server.port）
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// 同时在后台按 update_interval 定时更新
        #[arg(long)]
        schedule: bool,
    },
}

// ========================================
// 主函数
// ========================================

fn main() {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logging(cli.debug);

    // 执行对应的子命令
    let result = match cli.command {
        Commands::Generate {
            output,
            format,
            stdout,
            strict,
        } => run_generate(&cli.config, output, format, stdout, strict),
        Commands::Check { strict } => run_check(&cli.config, strict),
        Commands::Update { daemon, force } => run_update(&cli.config, daemon, force),
        Commands::Status { json } => run_status(&cli.config, json),
        Commands::Serve {
            host,
            port,
            schedule,
        } => run_serve(&cli.config, host, port, schedule),
    };

    // 处理错误
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// 初始化日志：RUST_LOG 优先，否则按 --debug 决定级别
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).with_context(|| format!("Failed to load settings {}", path.display()))
}

// ========================================
// 子命令实现
// ========================================

/// 生成配置
fn run_generate(
    config: &Path,
    output: Option<PathBuf>,
    format: OutputFormat,
    stdout: bool,
    strict: bool,
) -> Result<()> {
    let mut settings = load_settings(config)?;
    if let Some(path) = output {
        settings.files.output = path;
    }

    let rendered = service::render(&settings, format, strict)?;

    if stdout {
        print!("{}", rendered.text);
        return Ok(());
    }

    let store = ProfileStore::from_settings(&settings.files);
    store.write(&rendered.text)?;

    println!("Profile written: {}", store.output().display());
    println!("  format:       {}", format);
    println!("  bytes:        {}", rendered.text.len());
    println!("  proxy groups: {}", rendered.group_count);
    println!("  rules:        {}", rendered.rule_count);
    if !rendered.diagnostics.is_empty() {
        println!(
            "  diagnostics:  {} ({} warning(s))",
            rendered.diagnostics.len(),
            rendered.diagnostics.warnings().count()
        );
    }
    Ok(())
}

/// 检查配置
fn run_check(config: &Path, strict: bool) -> Result<()> {
    let settings = load_settings(config)?;
    let rendered = service::render(&settings, OutputFormat::Yaml, false)?;

    for diag in rendered.diagnostics.entries() {
        println!("{:<8}{}", format!("{:?}", diag.severity()), diag);
    }

    let warnings = rendered.diagnostics.warnings().count();
    println!(
        "\nOK: {} proxy groups, {} rules, {} warning(s)",
        rendered.group_count, rendered.rule_count, warnings
    );

    if strict && warnings > 0 {
        anyhow::bail!("{} warning(s) reported in strict mode", warnings);
    }
    Ok(())
}

/// 执行更新
fn run_update(config: &Path, daemon: bool, force: bool) -> Result<()> {
    let updater = Updater::new(config);
    if daemon {
        return updater.run_daemon();
    }

    match updater.run_once(force)? {
        UpdateOutcome::Fresh => println!("Profile is still fresh, nothing to do."),
        UpdateOutcome::Updated {
            groups,
            rules,
            backup,
        } => {
            println!("Profile updated: {} proxy groups, {} rules", groups, rules);
            if let Some(path) = backup {
                println!("Previous profile backed up to: {}", path.display());
            }
        }
    }
    Ok(())
}

/// 显示状态
fn run_status(config: &Path, json: bool) -> Result<()> {
    let settings = load_settings(config)?;
    let status = Status::collect(&settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", status);
    }
    Ok(())
}

/// 启动 HTTP 服务
fn run_serve(config: &Path, host: Option<String>, port: Option<u16>, schedule: bool) -> Result<()> {
    let settings = load_settings(config)?;
    let host = host.unwrap_or(settings.server.host);
    let port = port.unwrap_or(settings.server.port);

    let updater = Arc::new(Updater::new(config));
    if schedule {
        let daemon = Arc::clone(&updater);
        thread::spawn(move || {
            if let Err(e) = daemon.run_daemon() {
                tracing::error!("scheduled updates stopped: {:#}", e);
            }
        });
    }

    let state = server::AppState::new(updater, &settings.server.webhook_secret);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(server::run(state, &host, port))
}
