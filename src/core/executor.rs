// ============================================================================
// MarkFlow - 不动点执行驱动
// ============================================================================
//
// 文件: src/core/executor.rs
// 职责: 按处理顺序提交单元，再对剩余委托执行多轮不动点重试
// 边界:
//   - ✅ 按阶段顺序的首轮处理
//   - ✅ 各入口不动点循环（按发现顺序）
//   - ✅ 跨入口的多轮重试
//   - ❌ 不包含依赖分析逻辑
//   - ❌ 不包含排序算法
//   - ❌ 不包含输出格式化
//
// ============================================================================

use crate::core::collab::{ProcessingContext, TypeRegistry};
use crate::core::entry::HandlerEntry;
use crate::core::fixpoint::EntryState;
use crate::core::graph::ProcessingOrder;
use crate::core::merge::UnitMergeTable;
use crate::models::unit::SortUnit;

/// 执行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// 首轮按顺序处理成功的委托数
    pub processed_in_order: usize,
    /// 不动点阶段处理成功的委托数
    pub processed_in_retries: usize,
    /// 执行的全局轮次
    pub rounds: usize,
}

impl ExecutionOutcome {
    pub fn processed(&self) -> usize {
        self.processed_in_order + self.processed_in_retries
    }
}

/// 不动点执行驱动
pub struct UnitExecutor<'a> {
    entries: &'a mut [HandlerEntry],
    ctx: &'a mut ProcessingContext,
    types: &'a mut dyn TypeRegistry,
}

impl<'a> UnitExecutor<'a> {
    pub fn new(
        entries: &'a mut [HandlerEntry],
        ctx: &'a mut ProcessingContext,
        types: &'a mut dyn TypeRegistry,
    ) -> Self {
        Self {
            entries,
            ctx,
            types,
        }
    }

    /// 执行全部单元直至不动点
    pub fn execute(&mut self, table: &UnitMergeTable, order: &ProcessingOrder) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome {
            processed_in_order: self.execute_stages(table, order),
            ..Default::default()
        };

        let (rounds, processed) = self.settle();
        outcome.rounds = rounds;
        outcome.processed_in_retries = processed;

        tracing::debug!(
            in_order = outcome.processed_in_order,
            in_retries = outcome.processed_in_retries,
            rounds,
            "execution settled"
        );
        outcome
    }

    /// 按阶段顺序提交所有单元
    fn execute_stages(&mut self, table: &UnitMergeTable, order: &ProcessingOrder) -> usize {
        let mut processed = 0;
        for (stage_idx, stage) in order.stages.iter().enumerate() {
            tracing::trace!(stage = stage_idx + 1, units = stage.len(), "executing stage");
            for key in stage {
                if let Some(unit) = table.get(key) {
                    processed += self.execute_unit(unit);
                }
            }
        }
        processed
    }

    /// 提交单元中的每个条目，失败不会中断本轮
    fn execute_unit(&mut self, unit: &SortUnit) -> usize {
        let mut processed = 0;
        for item in &unit.items {
            let Some(entry) = self.entries.get_mut(item.entry) else {
                continue;
            };
            if entry.process_delegate(item.index, self.ctx, self.types) {
                processed += 1;
            }
        }
        processed
    }

    /// 依次对各入口执行不动点循环；有进展且仍有停滞入口时再来一轮
    fn settle(&mut self) -> (usize, usize) {
        let mut rounds = 0;
        let mut processed = 0;

        loop {
            rounds += 1;
            let mut progressed = false;
            for entry in self.entries.iter_mut() {
                let outcome = entry.process_all_delegates(self.ctx, self.types);
                if outcome.removed > 0 {
                    progressed = true;
                    processed += outcome.removed;
                }
            }

            let stalled = self
                .entries
                .iter()
                .any(|entry| entry.state() == EntryState::Stalled);
            if !progressed || !stalled {
                break;
            }
            tracing::debug!(round = rounds, "stalled entries remain, starting another round");
        }

        (rounds, processed)
    }
}
