// ============================================================================
// MarkFlow - 不动点重试状态机
// ============================================================================
//
// 文件: src/core/fixpoint.rs
// 职责: 处理入口的重试直至不动点的通用驱动
// 边界:
//   - ✅ 入口状态定义与状态迁移
//   - ✅ 多轮处理直至全部完成或停滞
//   - ❌ 不应包含依赖图逻辑
//   - ❌ 不应包含处理器调用细节
//
// ============================================================================

use serde::Serialize;

/// 处理入口状态
///
/// `Pending → Retrying → {Complete, Stalled}`，有进展时 `Retrying` 自循环，
/// 新一轮开始时 `Stalled → Retrying`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// 尚未执行不动点循环
    Pending,
    /// 正在重试
    Retrying,
    /// 一轮未移除任何委托，剩余委托视为失败
    Stalled,
    /// 全部委托处理成功
    Complete,
}

impl EntryState {
    /// 开始一次不动点循环
    pub fn begin(self, remaining: usize) -> EntryState {
        match self {
            EntryState::Complete => EntryState::Complete,
            _ if remaining == 0 => EntryState::Complete,
            _ => EntryState::Retrying,
        }
    }

    /// 根据一轮的结果迁移状态
    pub fn after_pass(self, removed: usize, remaining: usize) -> EntryState {
        match self {
            EntryState::Complete => EntryState::Complete,
            _ if remaining == 0 => EntryState::Complete,
            _ if removed == 0 => EntryState::Stalled,
            _ => EntryState::Retrying,
        }
    }

    /// 是否为循环终止状态
    pub fn is_settled(self) -> bool {
        matches!(self, EntryState::Complete | EntryState::Stalled)
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntryState::Pending => "pending",
            EntryState::Retrying => "retrying",
            EntryState::Stalled => "stalled",
            EntryState::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// 一次不动点循环的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointOutcome {
    /// 执行的轮数
    pub passes: usize,
    /// 本次循环移除（成功）的数量
    pub removed: usize,
    /// 循环结束时的状态
    pub state: EntryState,
}

/// 反复对 `pending` 中的元素执行 `step`，移除返回 true 的元素，
/// 直到全部移除或某一轮没有移除任何元素。
pub fn run_to_fixed_point<T, F>(
    pending: &mut Vec<T>,
    state: &mut EntryState,
    mut step: F,
) -> FixedPointOutcome
where
    F: FnMut(&T) -> bool,
{
    let initial = pending.len();
    let mut passes = 0;

    *state = state.begin(pending.len());

    while !state.is_settled() {
        passes += 1;
        let before = pending.len();
        pending.retain(|item| !step(item));
        let removed = before - pending.len();
        *state = state.after_pass(removed, pending.len());

        tracing::trace!(pass = passes, removed, remaining = pending.len(), state = %state, "fixed-point pass");
    }

    FixedPointOutcome {
        passes,
        removed: initial - pending.len(),
        state: *state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn always_failing_items_stall_after_one_pass() {
        let mut pending = vec!["a", "b", "c"];
        let mut state = EntryState::Pending;
        let mut attempts = 0;

        let outcome = run_to_fixed_point(&mut pending, &mut state, |_| {
            attempts += 1;
            false
        });

        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.removed, 0);
        assert_eq!(state, EntryState::Stalled);
        assert_eq!(attempts, 3);
        assert_eq!(pending, vec!["a", "b", "c"]);
    }

    #[test]
    fn dependent_item_succeeds_in_a_later_pass() {
        // c 只有在 a 和 b 都运行过之后才能成功
        let mut pending = vec!["c", "a", "b"];
        let mut state = EntryState::Pending;
        let mut done: HashSet<&str> = HashSet::new();

        let outcome = run_to_fixed_point(&mut pending, &mut state, |item| {
            let ok = match *item {
                "c" => done.contains("a") && done.contains("b"),
                _ => true,
            };
            if ok {
                done.insert(*item);
            }
            ok
        });

        assert!(outcome.passes <= 3);
        assert_eq!(outcome.passes, 2);
        assert_eq!(state, EntryState::Complete);
        assert!(pending.is_empty());
    }

    #[test]
    fn empty_input_completes_without_passes() {
        let mut pending: Vec<u8> = Vec::new();
        let mut state = EntryState::Pending;
        let outcome = run_to_fixed_point(&mut pending, &mut state, |_| true);
        assert_eq!(outcome.passes, 0);
        assert_eq!(state, EntryState::Complete);
    }

    #[test]
    fn stalled_state_retries_when_restarted() {
        let mut pending = vec![1, 2];
        let mut state = EntryState::Stalled;
        let outcome = run_to_fixed_point(&mut pending, &mut state, |n| *n == 1);

        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.passes, 2);
        assert_eq!(state, EntryState::Stalled);
        assert_eq!(pending, vec![2]);
    }

    #[test]
    fn transitions_follow_pass_outcomes() {
        assert_eq!(EntryState::Pending.begin(3), EntryState::Retrying);
        assert_eq!(EntryState::Pending.begin(0), EntryState::Complete);
        assert_eq!(EntryState::Retrying.after_pass(1, 2), EntryState::Retrying);
        assert_eq!(EntryState::Retrying.after_pass(0, 2), EntryState::Stalled);
        assert_eq!(EntryState::Retrying.after_pass(2, 0), EntryState::Complete);
        assert_eq!(EntryState::Complete.begin(1), EntryState::Complete);
    }
}
