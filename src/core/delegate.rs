// ============================================================================
// MarkFlow - 处理委托
// ============================================================================
//
// 文件: src/core/delegate.rs
// 职责: 每个 (声明, 标记) 对应的处理工作单元
// 边界:
//   - ✅ 委托身份（所属类型）定义
//   - ✅ 依赖的惰性计算与缓存
//   - ✅ 提交处理与失败记录
//   - ❌ 不应包含重试策略
//   - ❌ 不应包含依赖排序逻辑
//
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use crate::core::collab::{
    DependencyControl, InjectableView, MarkerHandler, ProcessingContext, TypeRegistry,
};
use crate::models::declaration::{Declaration, ElementKind, MarkerInstance};
use crate::models::failure::ProcessingFailure;
use crate::models::unit::UnitKey;

/// 处理委托
///
/// 身份为所属类型：同一类型上的多个标记（或同一类型成员上的标记）视为同一身份，
/// 最终归入同一单元。
#[derive(Debug, Clone)]
pub struct ProcessingDelegate {
    declaration: Declaration,
    kind: ElementKind,
    marker: MarkerInstance,
    masquerade: UnitKey,
    dependencies: Option<BTreeSet<UnitKey>>,
    processed: bool,
    attempts: usize,
    last_failure: Option<ProcessingFailure>,
}

impl ProcessingDelegate {
    pub fn new(declaration: Declaration, kind: ElementKind, marker: MarkerInstance) -> Self {
        let owner = declaration.owner().clone();
        Self {
            declaration,
            kind,
            marker,
            masquerade: UnitKey::new(owner),
            dependencies: None,
            processed: false,
            attempts: 0,
            last_failure: None,
        }
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn marker(&self) -> &MarkerInstance {
        &self.marker
    }

    /// 在依赖图中代表的单元键
    pub fn masquerade(&self) -> &UnitKey {
        &self.masquerade
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn last_failure(&self) -> Option<&ProcessingFailure> {
        self.last_failure.as_ref()
    }

    /// 最近一次失败不可恢复，不再重试
    pub fn is_permanently_failed(&self) -> bool {
        self.last_failure
            .as_ref()
            .is_some_and(|failure| !failure.is_recoverable())
    }

    /// 所需依赖，首次调用时通过处理器计算并缓存
    ///
    /// 处理器返回的任何失败都视为依赖检查失败。
    pub fn required_dependencies(
        &mut self,
        handler: &dyn MarkerHandler,
        ctx: &ProcessingContext,
    ) -> Result<BTreeSet<UnitKey>, ProcessingFailure> {
        if let Some(dependencies) = &self.dependencies {
            return Ok(dependencies.clone());
        }

        let mut control = DependencyControl::new(self.declaration.owner().clone());
        let view = InjectableView::dependency_check(&self.declaration, self.kind);

        let dependencies: BTreeSet<UnitKey> = handler
            .check_dependencies(&mut control, &view, &self.marker, ctx)
            .map_err(|failure| match failure {
                ProcessingFailure::DependencyCheck { .. } => failure,
                other => ProcessingFailure::dependency_check(&self.declaration.id, other.to_string()),
            })?
            .into_iter()
            .collect();

        self.masquerade = UnitKey::new(control.masquerade().clone());
        self.dependencies = Some(dependencies.clone());
        Ok(dependencies)
    }

    /// 提交处理，成功返回 true；可恢复的失败被记录在委托上，等待下一轮重试
    pub fn process(
        &mut self,
        handler: &mut dyn MarkerHandler,
        ctx: &mut ProcessingContext,
        types: &mut dyn TypeRegistry,
    ) -> bool {
        if self.processed {
            return true;
        }
        if self.is_permanently_failed() {
            return false;
        }

        let owner = self.declaration.owner().clone();
        types.add_type(&owner);
        let injector = types.injector(&owner);
        self.attempts += 1;

        let view = InjectableView::committed(&self.declaration, self.kind, injector.as_ref());
        let outcome = handler.handle(&view, &self.marker, ctx);

        match outcome {
            Ok(true) => {
                self.processed = true;
                self.last_failure = None;
            }
            Ok(false) => {
                self.last_failure = Some(ProcessingFailure::incomplete(&self.declaration.id));
            }
            Err(failure) => {
                tracing::debug!(
                    declaration = %self.declaration.id,
                    attempt = self.attempts,
                    %failure,
                    "delegate processing failed"
                );
                self.last_failure = Some(failure);
            }
        }

        self.processed
    }
}

impl PartialEq for ProcessingDelegate {
    fn eq(&self, other: &Self) -> bool {
        self.declaration.owner() == other.declaration.owner()
    }
}

impl Eq for ProcessingDelegate {}

impl fmt::Display for ProcessingDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.marker.marker, self.declaration.id)
    }
}
