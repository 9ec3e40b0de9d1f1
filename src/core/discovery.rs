// ============================================================================
// MarkFlow - 声明发现与委托构建
// ============================================================================
//
// 文件: src/core/discovery.rs
// 职责: 按发现顺序扫描声明，构建处理委托并登记排序单元
// 边界:
//   - ✅ 声明结构校验
//   - ✅ 测试专用声明过滤
//   - ✅ 类型登记与依赖检查
//   - ✅ 委托登记与单元合并表写入
//   - ❌ 不应包含排序算法
//   - ❌ 不应包含提交处理逻辑
//
// ============================================================================

use std::collections::{BTreeSet, HashSet};

use crate::core::collab::{MarkerScanner, ProcessingContext, TypeRegistry};
use crate::core::delegate::ProcessingDelegate;
use crate::core::entry::HandlerEntry;
use crate::core::merge::UnitMergeTable;
use crate::models::config::DependencyMergePolicy;
use crate::models::declaration::{Declaration, DeclarationId, ElementKind, MarkerInstance};
use crate::models::failure::ProcessingFailure;
use crate::models::marker::MarkerType;
use crate::models::unit::{DelegateRef, SortUnit};

/// 发现阶段结果
#[derive(Debug)]
pub struct DiscoveryReport {
    /// 合并后的排序单元
    pub table: UnitMergeTable,
    /// 结构错误
    pub failures: Vec<ProcessingFailure>,
    /// 登记的委托总数
    pub delegates: usize,
    /// 依赖检查失败的委托数
    pub rejected: usize,
    /// 因非测试模式跳过的声明数
    pub skipped_test_only: usize,
}

/// 校验声明结构，返回该声明上的目标标记实例
fn validate(
    declaration: &Declaration,
    marker: &MarkerType,
    kind: ElementKind,
) -> Result<MarkerInstance, ProcessingFailure> {
    let DeclarationId {
        kind: declared,
        member,
        ..
    } = &declaration.id;

    if *declared != kind {
        return Err(ProcessingFailure::structural(
            &declaration.id,
            format!("scanned as {kind} but declared as {declared}"),
        ));
    }

    let member_missing = member.as_deref().map_or(true, str::is_empty);
    if kind != ElementKind::Type && member_missing {
        return Err(ProcessingFailure::structural(
            &declaration.id,
            format!("{kind} declaration without a member name"),
        ));
    }

    declaration.marker(marker).cloned().ok_or_else(|| {
        ProcessingFailure::structural(&declaration.id, format!("missing marker {marker}"))
    })
}

/// 按入口顺序发现声明
///
/// 依赖检查失败的委托记录在所属入口的错误集合中，不进入合并表。
pub fn discover(
    entries: &mut [HandlerEntry],
    scanner: &dyn MarkerScanner,
    types: &mut dyn TypeRegistry,
    ctx: &ProcessingContext,
    policy: DependencyMergePolicy,
) -> DiscoveryReport {
    let mut report = DiscoveryReport {
        table: UnitMergeTable::new(policy),
        failures: scanner.structural_failures(),
        delegates: 0,
        rejected: 0,
        skipped_test_only: 0,
    };

    for (entry_index, entry) in entries.iter_mut().enumerate() {
        let marker = entry.marker().clone();
        let targets = entry.def().resolve_targets();
        for target in &targets.unrecognized {
            tracing::warn!(%marker, target = %target, "unrecognized marker target dropped");
        }

        let mut seen: HashSet<DeclarationId> = HashSet::new();

        for kind in targets.kinds {
            for declaration in scanner.scan(&marker, kind, &ctx.packages) {
                let instance = match validate(&declaration, &marker, kind) {
                    Ok(instance) => instance,
                    Err(failure) => {
                        tracing::warn!(%failure, "malformed declaration skipped");
                        report.failures.push(failure);
                        continue;
                    }
                };

                if declaration.test_only && !ctx.test_mode {
                    tracing::trace!(declaration = %declaration.id, "test-only declaration skipped");
                    report.skipped_test_only += 1;
                    continue;
                }

                if !seen.insert(declaration.id.clone()) {
                    continue;
                }

                types.add_type(declaration.owner());

                let mut delegate = ProcessingDelegate::new(declaration, kind, instance);
                let dependencies: BTreeSet<_> =
                    match delegate.required_dependencies(entry.handler(), ctx) {
                        Ok(dependencies) => dependencies,
                        Err(failure) => {
                            tracing::warn!(%failure, "delegate dropped");
                            entry.reject(failure);
                            report.rejected += 1;
                            continue;
                        }
                    };

                let key = delegate.masquerade().clone();
                tracing::debug!(
                    %marker,
                    declaration = %delegate.declaration().id,
                    unit = %key,
                    dependencies = dependencies.len(),
                    "delegate discovered"
                );

                let index = entry.add_delegate(delegate);
                report.delegates += 1;
                report.table.add(SortUnit::with_item(
                    key,
                    DelegateRef {
                        entry: entry_index,
                        index,
                    },
                    dependencies,
                ));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collab::{
        DependencyControl, InjectableView, InjectionContext, MarkerHandler,
    };
    use crate::models::declaration::TypeName;
    use crate::models::marker::MarkerDef;
    use crate::models::unit::UnitKey;

    struct FixedScanner {
        declarations: Vec<Declaration>,
    }

    impl MarkerScanner for FixedScanner {
        fn scan(&self, marker: &MarkerType, kind: ElementKind, _scopes: &[String]) -> Vec<Declaration> {
            self.declarations
                .iter()
                .filter(|d| d.has_marker(marker) && d.id.kind == kind)
                .cloned()
                .collect()
        }
    }

    /// 依赖取自 `requires` 属性，`broken` 属性触发依赖检查失败
    struct AttributeHandler;

    impl MarkerHandler for AttributeHandler {
        fn check_dependencies(
            &self,
            _control: &mut DependencyControl,
            view: &InjectableView<'_>,
            marker: &MarkerInstance,
            _ctx: &ProcessingContext,
        ) -> Result<Vec<UnitKey>, ProcessingFailure> {
            if marker.attribute("broken").is_some() {
                return Err(ProcessingFailure::injection(&view.declaration.id, "broken"));
            }
            Ok(marker
                .list_attribute("requires")
                .into_iter()
                .map(|name| UnitKey::new(TypeName::new(name).unwrap()))
                .collect())
        }

        fn handle(
            &mut self,
            _view: &InjectableView<'_>,
            _marker: &MarkerInstance,
            _ctx: &mut ProcessingContext,
        ) -> Result<bool, ProcessingFailure> {
            Ok(true)
        }
    }

    fn ty(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    fn gen_marker() -> MarkerInstance {
        MarkerInstance::new(MarkerType::new("Gen"))
    }

    fn entry(targets: Option<&[&str]>) -> HandlerEntry {
        let mut def = MarkerDef::new(MarkerType::new("Gen"));
        if let Some(targets) = targets {
            def = def.with_targets(targets.iter().copied());
        }
        HandlerEntry::new(def, Box::new(AttributeHandler), Vec::new())
    }

    fn run(entries: &mut [HandlerEntry], declarations: Vec<Declaration>, test_mode: bool) -> DiscoveryReport {
        let scanner = FixedScanner { declarations };
        let mut types = InjectionContext::new();
        let ctx = ProcessingContext::new(Vec::new(), test_mode);
        discover(entries, &scanner, &mut types, &ctx, DependencyMergePolicy::Union)
    }

    #[test]
    fn members_of_one_type_merge_into_one_unit() {
        let mut entries = [entry(None)];
        let report = run(
            &mut entries,
            vec![
                Declaration::new(DeclarationId::of_type(ty("org.a.Foo")))
                    .with_marker(gen_marker().with_attribute("requires", "org.a.Bar")),
                Declaration::new(DeclarationId::of_member(ty("org.a.Foo"), ElementKind::Field, "f"))
                    .with_marker(gen_marker().with_attribute("requires", "org.a.Baz")),
            ],
            false,
        );

        assert_eq!(report.delegates, 2);
        assert_eq!(report.table.len(), 1);
        let unit = report.table.iter().next().unwrap();
        assert_eq!(unit.items.len(), 2);
        assert_eq!(unit.dependencies.len(), 2);
    }

    #[test]
    fn malformed_declarations_are_skipped_without_aborting() {
        let mut entries = [entry(Some(&["field"]))];
        let report = run(
            &mut entries,
            vec![
                Declaration::new(DeclarationId {
                    owner: ty("org.a.Foo"),
                    kind: ElementKind::Field,
                    member: None,
                })
                .with_marker(gen_marker()),
                Declaration::new(DeclarationId::of_member(ty("org.a.Bar"), ElementKind::Field, "x"))
                    .with_marker(gen_marker()),
            ],
            false,
        );

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], ProcessingFailure::Structural { .. }));
        assert_eq!(report.delegates, 1);
    }

    #[test]
    fn test_only_declarations_depend_on_mode() {
        let declarations = vec![
            Declaration::new(DeclarationId::of_type(ty("org.a.Mock")))
                .with_marker(gen_marker())
                .with_test_only(true),
        ];

        let mut entries = [entry(Some(&["type"]))];
        let skipped = run(&mut entries, declarations.clone(), false);
        assert_eq!(skipped.skipped_test_only, 1);
        assert!(skipped.table.is_empty());

        let mut entries = [entry(Some(&["type"]))];
        let included = run(&mut entries, declarations, true);
        assert_eq!(included.table.len(), 1);
    }

    #[test]
    fn failed_dependency_check_drops_delegate_permanently() {
        let mut entries = [entry(Some(&["type"]))];
        let report = run(
            &mut entries,
            vec![Declaration::new(DeclarationId::of_type(ty("org.a.Foo")))
                .with_marker(gen_marker().with_attribute("broken", "yes"))],
            false,
        );

        assert_eq!(report.rejected, 1);
        assert!(report.table.is_empty());
        let errors = entries[0].errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ProcessingFailure::DependencyCheck { .. }));
    }

    #[test]
    fn unrecognized_targets_fall_back_to_all_kinds() {
        let mut entries = [entry(Some(&["package"]))];
        let report = run(
            &mut entries,
            vec![Declaration::new(DeclarationId::of_member(ty("org.a.Foo"), ElementKind::Method, "m"))
                .with_marker(gen_marker())],
            false,
        );
        assert_eq!(report.delegates, 1);
    }
}
