// ============================================================================
// MarkFlow - 处理结果汇总组件
// ============================================================================
//
// 文件: src/ui/summary.rs
// 职责: 处理结果汇总显示
// 边界:
//   - ✅ 处理统计信息格式化输出
//   - ✅ 循环依赖表格显示
//   - ✅ 失败明细与入口状态显示
//   - ✅ 生成片段列表显示
//   - ✅ 国际化文本支持
//   - ❌ 不应包含处理流程
//   - ❌ 不应包含文件操作
//
// ============================================================================

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::core::collab::GeneratedFragment;
use crate::core::fixpoint::EntryState;
use crate::core::report::{EntrySummary, ProcessingReport, ProcessingStatistics};
use crate::models::failure::ProcessingFailure;
use crate::models::unit::UnitKey;
use crate::utils::colors::Colors;
use crate::utils::constants::{icons, HEAVY_RULE, LIGHT_RULE};
use crate::utils::logger::Logger;
use crate::utils::styles::TextStyles;
use crate::{t, tf};

// ============================================================================
// 处理汇总显示
// ============================================================================

/// 渲染完整的处理报告
pub fn render_processing_report(report: &ProcessingReport, detail: bool, show_generated: bool) {
    render_statistics(&report.statistics);

    if !report.plan.cycles.is_empty() {
        print_cycles_table(&report.plan.cycles, detail);
    }
    if !report.plan.relaxed.is_empty() {
        Logger::warn(tf!("summary.relaxed", join_keys(&report.plan.relaxed)));
    }

    print_entries_table(&report.entries);

    let failures = report.permanent_failures();
    if !failures.is_empty() {
        print_failures_table(&failures, detail);
    }

    if show_generated {
        print_generated(&report.generated);
    }

    let _ = io::stdout().flush();
}

/// 渲染统计信息
pub fn render_statistics(stats: &ProcessingStatistics) {
    let summary_lines = vec![
        "".to_string(),
        format!("{} {}", icons::SUMMARY, TextStyles::bold(&t!("summary.title"))),
        HEAVY_RULE.to_string(),
        format!("{} {}", icons::MARKER, tf!("summary.total_markers", stats.total_markers)),
        format!("{} {}", icons::UNIT, tf!("summary.total_units", stats.total_units, stats.total_delegates)),
        format!("{} {}", icons::STAGE, tf!("summary.total_stages", stats.total_stages)),
        format!("{} {}", icons::SUCCESS, tf!("summary.processed", stats.processed)),
        format!("{} {}", icons::ERROR, tf!("summary.failed", stats.failed)),
        format!("{} {}", icons::SKIP, tf!("summary.skipped_test_only", stats.skipped_test_only)),
        format!("{} {}", icons::EXEC, tf!("summary.rounds", stats.rounds)),
        format!(
            "{} {}",
            icons::TIME,
            tf!("summary.duration", format!("{:.2}", stats.duration_ms as f64 / 1000.0))
        ),
    ];

    for line in summary_lines {
        Logger::info(line);
    }
}

// ============================================================================
// 明细表格
// ============================================================================

/// 打印循环依赖表格
pub fn print_cycles_table(cycles: &[Vec<UnitKey>], detail: bool) {
    Logger::info("");
    Logger::info(format!("{} {}", icons::WARNING, t!("summary.cycles")));
    Logger::info(LIGHT_RULE);

    for (index, cycle) in cycles.iter().enumerate() {
        Logger::info(tf!("summary.cycle_header", index + 1));
        if detail {
            for (i, key) in cycle.iter().enumerate() {
                let next = &cycle[(i + 1) % cycle.len()];
                Logger::info(format!("    {} {} {}", key, icons::ARROW, next));
            }
        } else {
            Logger::info(format!("    {}", join_keys(cycle)));
        }
    }
}

/// 打印各处理入口状态
fn print_entries_table(entries: &[EntrySummary]) {
    if entries.is_empty() {
        return;
    }

    Logger::info("");
    Logger::info(format!("{} {}", icons::MARKER, t!("summary.entries")));
    Logger::info(LIGHT_RULE);

    for entry in entries {
        let state = match entry.state {
            EntryState::Complete => Colors::success(&entry.state.to_string()),
            EntryState::Stalled => Colors::error(&entry.state.to_string()),
            _ => Colors::warn(&entry.state.to_string()),
        };
        Logger::info(tf!(
            "summary.entry_line",
            entry.marker,
            state,
            entry.processed,
            entry.delegates,
            entry.passes
        ));
    }
}

/// 打印永久失败，按失败类型分组
fn print_failures_table(failures: &[&ProcessingFailure], detail: bool) {
    Logger::info("");
    Logger::info(format!("{} {}", icons::ERROR, tf!("summary.failures", failures.len())));
    Logger::info(LIGHT_RULE);

    let mut groups: BTreeMap<&'static str, Vec<&ProcessingFailure>> = BTreeMap::new();
    for &failure in failures {
        groups.entry(failure_kind(failure)).or_default().push(failure);
    }

    for (kind, group) in groups {
        Logger::info(format!("{} ({})", Colors::error(kind), group.len()));
        for failure in group {
            if detail {
                Logger::info(format!("    {}", failure));
            } else {
                Logger::info(format!("    {}", failure.declaration()));
            }
        }
    }
}

fn failure_kind(failure: &ProcessingFailure) -> &'static str {
    match failure {
        ProcessingFailure::DependencyCheck { .. } => "dependency_check",
        ProcessingFailure::Injection { .. } => "injection",
        ProcessingFailure::Incomplete { .. } => "incomplete",
        ProcessingFailure::Structural { .. } => "structural",
    }
}

/// 打印生成片段
fn print_generated(generated: &[GeneratedFragment]) {
    Logger::info("");
    Logger::info(format!("{} {}", icons::GENERATED, tf!("summary.generated", generated.len())));
    Logger::info(LIGHT_RULE);
    for fragment in generated {
        Logger::info(format!("  {}", fragment.content));
    }
}

pub(crate) fn join_keys(keys: &[UnitKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&format!(" {} ", icons::ARROW))
}
