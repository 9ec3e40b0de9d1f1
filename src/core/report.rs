// ============================================================================
// MarkFlow - 处理结果报告
// ============================================================================
//
// 文件: src/core/report.rs
// 职责: 单次处理运行的结果与计划数据结构
// 边界:
//   - ✅ 处理入口汇总
//   - ✅ 处理报告与统计信息
//   - ✅ 依赖计划（不执行处理器）
//   - ✅ 数据序列化
//   - ❌ 不应包含处理流程
//   - ❌ 不应包含输出格式化
//
// ============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::collab::GeneratedFragment;
use crate::core::fixpoint::EntryState;
use crate::models::failure::ProcessingFailure;
use crate::models::marker::MarkerType;
use crate::models::unit::UnitKey;

/// 单个处理入口的结果汇总
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub marker: MarkerType,
    pub state: EntryState,
    /// 累计不动点轮数
    pub passes: usize,
    /// 登记的委托数
    pub delegates: usize,
    /// 成功处理的委托数
    pub processed: usize,
    /// 处理器调用总次数
    pub attempts: usize,
    /// 永久失败
    pub failures: Vec<ProcessingFailure>,
}

/// 单元在计划中的描述
#[derive(Debug, Clone, Serialize)]
pub struct UnitPlan {
    pub key: UnitKey,
    /// 归入该单元的声明
    pub items: Vec<String>,
    /// 依赖（包括未知单元）
    pub dependencies: Vec<UnitKey>,
    /// 依赖该单元的单元
    pub dependents: Vec<UnitKey>,
}

/// 依赖计划：发现、合并、排序后的结果，不执行处理器
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingPlan {
    /// 标记的发现顺序
    pub discovery_order: Vec<MarkerType>,
    /// 合并后的单元（按插入顺序）
    pub units: Vec<UnitPlan>,
    /// 分阶段排序结果
    pub stages: Vec<Vec<UnitKey>>,
    /// 扁平化的处理顺序
    pub order: Vec<UnitKey>,
    /// 为打破循环而被强制释放的单元
    pub relaxed: Vec<UnitKey>,
    /// 循环依赖
    pub cycles: Vec<Vec<UnitKey>>,
    /// 指向未知单元的依赖
    pub unresolved: BTreeMap<UnitKey, Vec<UnitKey>>,
    /// 发现阶段的结构错误
    pub discovery_failures: Vec<ProcessingFailure>,
    /// 依赖检查失败而被丢弃的委托
    pub rejected: Vec<ProcessingFailure>,
    /// 因非测试模式而跳过的声明数
    pub skipped_test_only: usize,
}

/// 统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingStatistics {
    pub total_markers: usize,
    pub total_delegates: usize,
    pub total_units: usize,
    pub total_stages: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped_test_only: usize,
    /// 执行的全局轮次
    pub rounds: usize,
    pub duration_ms: u64,
}

/// 单次处理运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub plan: ProcessingPlan,
    pub entries: Vec<EntrySummary>,
    pub generated: Vec<GeneratedFragment>,
    pub statistics: ProcessingStatistics,
}

impl ProcessingReport {
    /// 所有永久失败：结构错误 + 各入口错误集合（含依赖检查失败）
    pub fn permanent_failures(&self) -> Vec<&ProcessingFailure> {
        self.plan
            .discovery_failures
            .iter()
            .chain(self.entries.iter().flat_map(|entry| entry.failures.iter()))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.permanent_failures().is_empty()
    }

    pub fn entry(&self, marker: &MarkerType) -> Option<&EntrySummary> {
        self.entries.iter().find(|entry| &entry.marker == marker)
    }

    /// 某单元在处理顺序中的位置
    pub fn position(&self, key: &UnitKey) -> Option<usize> {
        self.plan.order.iter().position(|k| k == key)
    }
}
