// ============================================================================
// MarkFlow - CLI 模块
// ============================================================================
//
// 文件: src/cli/mod.rs
// 职责: CLI 命令行接口模块入口和路由
// 边界:
//   - ✅ CLI 结构定义和命令枚举
//   - ✅ 命令行参数解析配置
//   - ✅ 命令路由分发
//   - ✅ 清单加载的公共入口
//   - ❌ 不应包含具体命令实现逻辑
//   - ❌ 不应包含业务逻辑处理
//
// ============================================================================

pub mod analyze;
pub mod init;
pub mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

use crate::manifest::Manifest;
use crate::models::config::{Config, DependencyMergePolicy, RuntimeArgs};
use crate::utils::logger::Logger;
use crate::{t, tf};
use analyze::{handle_analyze, AnalyzeArgs};
use init::{handle_init, InitArgs};
use run::{run, RunArgs};

/// MarkFlow - Marker-driven code generation scheduler
#[derive(Debug, Parser)]
#[command(name = "markflow")]
#[command(about = "Marker-driven dependency resolution and code generation scheduler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Global verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Interface language (zh_cn, en_us)
    #[arg(short, long, global = true)]
    pub language: Option<String>,

    /// Package scopes to scan (repeatable, overrides config)
    #[arg(short = 'p', long = "package", global = true)]
    pub packages: Vec<String>,

    /// Process test-only declarations
    #[arg(long, global = true)]
    pub test_mode: bool,

    /// Dependency merge policy for units sharing a key (union, first_wins)
    #[arg(long, global = true)]
    pub merge_policy: Option<String>,

    /// Exit successfully even when some declarations fail
    #[arg(long, global = true)]
    pub allow_partial: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Commands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze units, stages and cycles without running handlers
    Analyze(AnalyzeArgs),
    /// Initialize configuration file
    Init(InitArgs),
    /// Process a manifest and run all handlers
    Run(RunArgs),
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Build runtime args to override config
    let runtime_args = build_runtime_args(&cli)?;
    // Merge runtime args to global config
    Config::merge_runtime_args(runtime_args)?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args),
        Commands::Init(args) => handle_init(args).map(|_| ()),
        Commands::Run(args) => run(args),
    }
}

/// Build runtime args from CLI arguments
fn build_runtime_args(cli: &Cli) -> Result<RuntimeArgs> {
    let merge_policy = cli
        .merge_policy
        .as_deref()
        .map(DependencyMergePolicy::from_str)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    Ok(RuntimeArgs {
        verbose: if cli.verbose { Some(true) } else { None },
        colored: if cli.no_color { Some(false) } else { None },
        test_mode: if cli.test_mode { Some(true) } else { None },
        merge_policy,
        allow_partial: if cli.allow_partial { Some(true) } else { None },
        packages: if cli.packages.is_empty() {
            None
        } else {
            Some(cli.packages.clone())
        },
        language: cli.language.clone(),
    })
}

/// 加载清单文件或目录，并报告结构错误
pub(crate) fn load_manifest(path: &Path, config: &Config) -> Result<Manifest> {
    if !path.exists() {
        anyhow::bail!(tf!("error.path_not_exist", path.display()));
    }

    Logger::verbose(tf!("manifest.loading", path.display()));
    let manifest = Manifest::load(path, config)
        .with_context(|| tf!("error.load_manifest", path.display()))?;

    Logger::verbose(tf!(
        "manifest.loaded",
        manifest.sources.len(),
        manifest.markers.len(),
        manifest.declarations.len()
    ));
    if !manifest.failures.is_empty() {
        Logger::warn(tf!("manifest.malformed", manifest.failures.len()));
    }
    if manifest.markers.is_empty() {
        Logger::warn(t!("manifest.no_markers"));
    }

    Ok(manifest)
}
