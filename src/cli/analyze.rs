// ============================================================================
// MarkFlow - CLI Analyze 命令
// ============================================================================
//
// 文件: src/cli/analyze.rs
// 职责: 依赖计划分析命令的 CLI 接口层
// 边界:
//   - ✅ 命令行参数定义和解析
//   - ✅ 调用核心处理器生成依赖计划
//   - ✅ 结果格式化输出（表格/JSON）
//   - ❌ 不应包含依赖分析算法逻辑
//   - ❌ 不应包含清单解析逻辑
//   - ❌ 不应包含数据模型定义
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::load_manifest;
use crate::core::{InjectionContext, MarkerProcessor, ProcessingPlan, ProcessorOptions};
use crate::manifest::{build_registry, ManifestScanner};
use crate::models::config::Config;
use crate::ui::summary::{join_keys, print_cycles_table};
use crate::utils::constants::{icons, HEAVY_RULE, LIGHT_RULE};
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 分析标记单元的依赖关系
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// 清单文件或包含清单的目录
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// 输出格式 (table, json)
    #[arg(short = 'f', long, default_value = "table")]
    pub format: String,

    /// 显示依赖详情
    #[arg(short = 'd', long)]
    pub detail: bool,
}

pub fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = Config::snapshot()?;
    let json = args.format == "json";

    if !json {
        Logger::info(t!("cli.analyze.start"));
    }

    let manifest = load_manifest(&args.path, &config)?;
    let registry = build_registry(&manifest)?;
    let scanner = ManifestScanner::new(&manifest);
    let mut types = InjectionContext::new();

    let plan = MarkerProcessor::new(registry, ProcessorOptions::from_config(&config))
        .plan(&scanner, &mut types)?;

    // 输出结果
    match args.format.as_str() {
        "json" => {
            let json_output = serde_json::to_string_pretty(&plan)?;
            println!("{}", json_output);
        }
        _ => print_table_format(&plan, config.output.verbose, args.detail),
    }

    Ok(())
}

fn print_table_format(plan: &ProcessingPlan, verbose: bool, detail: bool) {
    Logger::info(format!("\n{} {}", icons::ANALYZE, t!("output.analysis_result")));
    Logger::info(HEAVY_RULE);

    // 统计信息
    let discovery_order: Vec<String> = plan.discovery_order.iter().map(ToString::to_string).collect();
    Logger::info(format!(
        "{} {}",
        icons::MARKER,
        tf!("output.discovery_order", discovery_order.join(" → "))
    ));
    Logger::info(format!("{} {}", icons::UNIT, tf!("output.total_units", plan.units.len())));
    Logger::info(format!("{} {}", icons::STAGE, tf!("output.total_stages", plan.stages.len())));
    if plan.skipped_test_only > 0 {
        Logger::info(format!(
            "{} {}",
            icons::SKIP,
            tf!("output.skipped_test_only", plan.skipped_test_only)
        ));
    }

    // 循环依赖检查
    if plan.cycles.is_empty() {
        Logger::info(format!("\n{} {}", icons::SUCCESS, t!("output.no_cycles")));
    } else {
        print_cycles_table(&plan.cycles, detail);
        if !plan.relaxed.is_empty() {
            Logger::warn(tf!("summary.relaxed", join_keys(&plan.relaxed)));
        }
    }

    // 处理阶段
    if !plan.stages.is_empty() {
        Logger::info(format!("\n{} {}", icons::STAGE, t!("output.stages")));
        Logger::info(LIGHT_RULE);
        for (stage_idx, stage) in plan.stages.iter().enumerate() {
            Logger::info(tf!("output.stage_info", stage_idx + 1, stage.len()));
            for key in stage {
                let Some(unit) = plan.units.iter().find(|u| &u.key == key) else {
                    continue;
                };

                if !detail {
                    // 简洁模式：只显示单元名
                    Logger::info(format!("  {} {}", icons::UNIT, key));
                    continue;
                }

                // 详细模式：显示依赖与反向依赖
                if unit.dependencies.is_empty() {
                    Logger::info(format!("  {} {} ({})", icons::UNIT, key, t!("output.no_dependencies")));
                } else {
                    Logger::info(format!(
                        "  {} {} ({})",
                        icons::UNIT,
                        key,
                        tf!("output.depends_on_count", unit.dependencies.len())
                    ));
                    for dep in &unit.dependencies {
                        let unknown = plan
                            .unresolved
                            .get(key)
                            .is_some_and(|deps| deps.contains(dep));
                        if unknown {
                            Logger::info(format!("    {} {} ({})", icons::DEPENDENCY, dep, t!("output.unknown_unit")));
                        } else {
                            Logger::info(format!("    {} {}", icons::DEPENDENCY, dep));
                        }
                    }
                }
                if !unit.dependents.is_empty() {
                    Logger::info(format!(
                        "    {} {}",
                        icons::ARROW,
                        tf!("output.required_by", join_keys(&unit.dependents))
                    ));
                }

                if verbose {
                    for item in &unit.items {
                        Logger::info(format!("    {}", item));
                    }
                }
            }
            Logger::info("");
        }
    }

    // 发现阶段失败
    let failures: Vec<_> = plan.discovery_failures.iter().chain(plan.rejected.iter()).collect();
    if !failures.is_empty() {
        Logger::info(format!("{} {}", icons::ERROR, tf!("summary.failures", failures.len())));
        Logger::info(LIGHT_RULE);
        for failure in failures {
            Logger::info(format!("  {}", failure));
        }
    }

    Logger::info(format!("{} {}", icons::INFO, t!("output.usage_tip")));
}
