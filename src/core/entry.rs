// ============================================================================
// MarkFlow - 处理入口
// ============================================================================
//
// 文件: src/core/entry.rs
// 职责: 单个标记类型的处理器、规则与委托集合
// 边界:
//   - ✅ 委托登记与待处理集合维护
//   - ✅ 单个委托的提交处理
//   - ✅ 委托集合的不动点重试
//   - ✅ 错误集合汇总
//   - ❌ 不应包含规则排序逻辑
//   - ❌ 不应包含依赖图逻辑
//
// ============================================================================

use crate::core::collab::{MarkerHandler, ProcessingContext, TypeRegistry};
use crate::core::delegate::ProcessingDelegate;
use crate::core::fixpoint::{run_to_fixed_point, EntryState, FixedPointOutcome};
use crate::core::report::EntrySummary;
use crate::models::failure::ProcessingFailure;
use crate::models::marker::{MarkerDef, MarkerType, OrderingRule};

/// 单个标记类型的处理入口
pub struct HandlerEntry {
    def: MarkerDef,
    handler: Box<dyn MarkerHandler>,
    rules: Vec<OrderingRule>,
    delegates: Vec<ProcessingDelegate>,
    /// 尚未成功处理的委托下标，保持登记顺序
    pending: Vec<usize>,
    /// 依赖检查失败的声明，不参与重试
    rejected: Vec<ProcessingFailure>,
    state: EntryState,
    passes: usize,
}

impl HandlerEntry {
    pub fn new(def: MarkerDef, handler: Box<dyn MarkerHandler>, rules: Vec<OrderingRule>) -> Self {
        Self {
            def,
            handler,
            rules,
            delegates: Vec::new(),
            pending: Vec::new(),
            rejected: Vec::new(),
            state: EntryState::Pending,
            passes: 0,
        }
    }

    pub fn marker(&self) -> &MarkerType {
        &self.def.marker
    }

    pub fn def(&self) -> &MarkerDef {
        &self.def
    }

    pub fn handler(&self) -> &dyn MarkerHandler {
        self.handler.as_ref()
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// 累计执行的不动点轮数
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn delegates(&self) -> &[ProcessingDelegate] {
        &self.delegates
    }

    pub fn delegate(&self, index: usize) -> Option<&ProcessingDelegate> {
        self.delegates.get(index)
    }

    /// 待处理的委托
    pub fn pending(&self) -> impl Iterator<Item = &ProcessingDelegate> {
        self.pending.iter().map(move |&index| &self.delegates[index])
    }

    /// 登记委托，返回其下标
    pub fn add_delegate(&mut self, delegate: ProcessingDelegate) -> usize {
        let index = self.delegates.len();
        self.delegates.push(delegate);
        self.pending.push(index);
        index
    }

    /// 记录依赖检查失败
    pub fn reject(&mut self, failure: ProcessingFailure) {
        self.rejected.push(failure);
    }

    /// 处理单个委托（按依赖顺序的首轮处理）
    pub fn process_delegate(
        &mut self,
        index: usize,
        ctx: &mut ProcessingContext,
        types: &mut dyn TypeRegistry,
    ) -> bool {
        let Some(delegate) = self.delegates.get_mut(index) else {
            return false;
        };
        let processed = delegate.process(self.handler.as_mut(), ctx, types);
        if processed {
            self.pending.retain(|&pending| pending != index);
        } else {
            self.retire_permanent_failures();
        }
        processed
    }

    /// 将不可恢复失败的委托移出待处理集合，记入永久失败
    fn retire_permanent_failures(&mut self) {
        let delegates = &self.delegates;
        let rejected = &mut self.rejected;
        self.pending.retain(|&index| {
            let delegate = &delegates[index];
            match delegate.last_failure() {
                Some(failure) if delegate.is_permanently_failed() => {
                    rejected.push(failure.clone());
                    false
                }
                _ => true,
            }
        });
    }

    /// 对剩余委托反复处理直至不动点
    pub fn process_all_delegates(
        &mut self,
        ctx: &mut ProcessingContext,
        types: &mut dyn TypeRegistry,
    ) -> FixedPointOutcome {
        let delegates = &mut self.delegates;
        let handler = self.handler.as_mut();

        let outcome = run_to_fixed_point(&mut self.pending, &mut self.state, |&index| {
            delegates[index].process(&mut *handler, &mut *ctx, &mut *types)
        });
        self.passes += outcome.passes;
        self.retire_permanent_failures();

        tracing::debug!(
            marker = %self.def.marker,
            passes = outcome.passes,
            removed = outcome.removed,
            remaining = self.pending.len(),
            state = %outcome.state,
            "entry reached fixed point"
        );
        outcome
    }

    /// 当前错误集合：依赖检查失败 + 剩余委托最近一次的失败
    pub fn errors(&self) -> Vec<ProcessingFailure> {
        let mut errors = self.rejected.clone();
        errors.extend(
            self.pending()
                .map(|delegate| {
                    delegate
                        .last_failure()
                        .cloned()
                        .unwrap_or_else(|| ProcessingFailure::incomplete(&delegate.declaration().id))
                }),
        );
        errors
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.rejected.is_empty()
    }

    /// 汇总状态：存在永久失败时不报告为完成
    fn summary_state(&self) -> EntryState {
        match self.state {
            EntryState::Complete if !self.rejected.is_empty() => EntryState::Stalled,
            state => state,
        }
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            marker: self.def.marker.clone(),
            state: self.summary_state(),
            passes: self.passes,
            delegates: self.delegates.len(),
            processed: self.delegates.iter().filter(|d| d.is_processed()).count(),
            attempts: self.delegates.iter().map(ProcessingDelegate::attempts).sum(),
            failures: self.errors(),
        }
    }
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("marker", &self.def.marker)
            .field("rules", &self.rules)
            .field("delegates", &self.delegates.len())
            .field("pending", &self.pending.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collab::{DependencyControl, InjectableView, InjectionContext};
    use crate::models::declaration::{Declaration, DeclarationId, ElementKind, MarkerInstance, TypeName};
    use crate::models::unit::UnitKey;

    /// 始终失败的处理器
    struct RefusingHandler;

    impl MarkerHandler for RefusingHandler {
        fn check_dependencies(
            &self,
            _control: &mut DependencyControl,
            _view: &InjectableView<'_>,
            _marker: &MarkerInstance,
            _ctx: &ProcessingContext,
        ) -> Result<Vec<UnitKey>, ProcessingFailure> {
            Ok(Vec::new())
        }

        fn handle(
            &mut self,
            view: &InjectableView<'_>,
            _marker: &MarkerInstance,
            _ctx: &mut ProcessingContext,
        ) -> Result<bool, ProcessingFailure> {
            Err(ProcessingFailure::injection(&view.declaration.id, "unsatisfied"))
        }
    }

    /// 处理时报告结构错误
    struct StructuralHandler;

    impl MarkerHandler for StructuralHandler {
        fn check_dependencies(
            &self,
            _control: &mut DependencyControl,
            _view: &InjectableView<'_>,
            _marker: &MarkerInstance,
            _ctx: &ProcessingContext,
        ) -> Result<Vec<UnitKey>, ProcessingFailure> {
            Ok(Vec::new())
        }

        fn handle(
            &mut self,
            view: &InjectableView<'_>,
            _marker: &MarkerInstance,
            _ctx: &mut ProcessingContext,
        ) -> Result<bool, ProcessingFailure> {
            Err(ProcessingFailure::structural(&view.declaration.id, "cannot generate"))
        }
    }

    /// 只有当其 `awaits` 中的类型全部生成后才成功
    struct AwaitingHandler;

    impl MarkerHandler for AwaitingHandler {
        fn check_dependencies(
            &self,
            _control: &mut DependencyControl,
            _view: &InjectableView<'_>,
            _marker: &MarkerInstance,
            _ctx: &ProcessingContext,
        ) -> Result<Vec<UnitKey>, ProcessingFailure> {
            Ok(Vec::new())
        }

        fn handle(
            &mut self,
            view: &InjectableView<'_>,
            marker: &MarkerInstance,
            ctx: &mut ProcessingContext,
        ) -> Result<bool, ProcessingFailure> {
            let ready = marker
                .list_attribute("awaits")
                .iter()
                .all(|name| ctx.is_generated(&TypeName::new(name.as_str()).unwrap()));
            if ready {
                ctx.emit(crate::core::collab::GeneratedFragment {
                    owner: view.owner().clone(),
                    marker: marker.marker.clone(),
                    content: String::new(),
                });
            }
            Ok(ready)
        }
    }

    fn delegate(owner: &str, awaits: &str) -> ProcessingDelegate {
        let marker = MarkerInstance::new(MarkerType::new("Gen")).with_attribute("awaits", awaits);
        let declaration = Declaration::new(DeclarationId::of_type(TypeName::new(owner).unwrap()))
            .with_marker(marker.clone());
        ProcessingDelegate::new(declaration, ElementKind::Type, marker)
    }

    #[test]
    fn always_failing_entry_stalls_with_every_delegate_in_error_set() {
        let mut entry = HandlerEntry::new(
            MarkerDef::new(MarkerType::new("Gen")),
            Box::new(RefusingHandler),
            Vec::new(),
        );
        entry.add_delegate(delegate("org.a.A", ""));
        entry.add_delegate(delegate("org.a.B", ""));

        let mut ctx = ProcessingContext::default();
        let mut types = InjectionContext::new();
        let outcome = entry.process_all_delegates(&mut ctx, &mut types);

        assert_eq!(outcome.passes, 1);
        assert_eq!(entry.state(), EntryState::Stalled);
        let errors = entry.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ProcessingFailure::Injection { .. })));
    }

    #[test]
    fn entry_completes_once_transitive_effects_settle() {
        let mut entry = HandlerEntry::new(
            MarkerDef::new(MarkerType::new("Gen")),
            Box::new(AwaitingHandler),
            Vec::new(),
        );
        entry.add_delegate(delegate("org.a.C", "org.a.A, org.a.B"));
        entry.add_delegate(delegate("org.a.A", ""));
        entry.add_delegate(delegate("org.a.B", ""));

        let mut ctx = ProcessingContext::default();
        let mut types = InjectionContext::new();
        let outcome = entry.process_all_delegates(&mut ctx, &mut types);

        assert!(outcome.passes <= 3);
        assert_eq!(entry.state(), EntryState::Complete);
        assert!(entry.errors().is_empty());
        assert_eq!(entry.summary().processed, 3);
    }

    #[test]
    fn rejected_delegates_are_reported_but_not_retried() {
        let mut entry = HandlerEntry::new(
            MarkerDef::new(MarkerType::new("Gen")),
            Box::new(AwaitingHandler),
            Vec::new(),
        );
        entry.reject(ProcessingFailure::dependency_check("org.a.X", "unknown"));

        let mut ctx = ProcessingContext::default();
        let mut types = InjectionContext::new();
        entry.process_all_delegates(&mut ctx, &mut types);

        assert_eq!(entry.state(), EntryState::Complete);
        assert!(!entry.is_complete());
        assert_eq!(entry.errors().len(), 1);

        let summary = entry.summary();
        assert_eq!(summary.state, EntryState::Stalled);
        assert_eq!(summary.failures.len(), 1);
    }

    #[test]
    fn unrecoverable_handler_failures_become_permanent() {
        let mut entry = HandlerEntry::new(
            MarkerDef::new(MarkerType::new("Gen")),
            Box::new(StructuralHandler),
            Vec::new(),
        );
        let index = entry.add_delegate(delegate("org.a.A", ""));

        let mut ctx = ProcessingContext::default();
        let mut types = InjectionContext::new();
        assert!(!entry.process_delegate(index, &mut ctx, &mut types));

        assert_eq!(entry.pending().count(), 0);
        let errors = entry.errors();
        assert!(matches!(errors.as_slice(), [ProcessingFailure::Structural { .. }]));

        entry.process_all_delegates(&mut ctx, &mut types);
        assert_eq!(entry.delegates()[index].attempts(), 1);
        assert_eq!(entry.summary().state, EntryState::Stalled);
    }
}
