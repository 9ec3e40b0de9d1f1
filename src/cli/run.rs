// ============================================================================
// MarkFlow - CLI Run 命令
// ============================================================================
//
// 文件: src/cli/run.rs
// 职责: 完整处理运行命令的 CLI 接口层
// 边界:
//   - ✅ 命令行参数定义和解析
//   - ✅ 调用核心处理器执行处理
//   - ✅ 结果输出（表格/JSON）与退出状态
//   - ❌ 不应包含处理流程逻辑
//   - ❌ 不应包含数据模型定义
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::load_manifest;
use crate::core::{InjectionContext, MarkerProcessor, ProcessorOptions};
use crate::manifest::{build_registry, ManifestScanner};
use crate::models::config::Config;
use crate::ui::summary::render_processing_report;
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 处理清单并运行所有处理器
#[derive(Debug, Args)]
pub struct RunArgs {
    /// 清单文件或包含清单的目录
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// 输出格式 (table, json)
    #[arg(short = 'f', long, default_value = "table")]
    pub format: String,

    /// 显示失败详情
    #[arg(short = 'd', long)]
    pub detail: bool,

    /// 显示生成片段
    #[arg(short = 'g', long)]
    pub show_generated: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = Config::snapshot()?;
    let json = args.format == "json";

    if !json {
        Logger::info(tf!("run.start", args.path.display()));
    }

    let manifest = load_manifest(&args.path, &config)?;
    let registry = build_registry(&manifest)?;
    let scanner = ManifestScanner::new(&manifest);
    let mut types = InjectionContext::new();

    let options = ProcessorOptions::from_config(&config);
    Logger::verbose(tf!(
        "run.options",
        options.merge_policy,
        options.test_mode,
        options.packages.join(", ")
    ));

    let report = MarkerProcessor::new(registry, options).process(&scanner, &mut types)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_processing_report(&report, args.detail || config.output.verbose, args.show_generated);
    }

    if report.is_success() {
        if !json {
            Logger::success(t!("run.completed"));
        }
        return Ok(());
    }

    if config.processing.allow_partial {
        if !json {
            Logger::warn(tf!("run.partial", report.statistics.failed));
        }
        return Ok(());
    }

    anyhow::bail!(tf!("run.failed", report.statistics.failed))
}
