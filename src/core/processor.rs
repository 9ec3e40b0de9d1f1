// ============================================================================
// MarkFlow - 标记处理器
// ============================================================================
//
// 文件: src/core/processor.rs
// 职责: 串联注册表、发现、合并、排序与执行，完成一次处理运行
// 边界:
//   - ✅ 处理选项定义与从配置构建
//   - ✅ 完整处理流程编排
//   - ✅ 只分析不执行的依赖计划
//   - ✅ 统计信息汇总
//   - ❌ 不应包含 CLI 参数处理
//   - ❌ 不应包含输出格式化
//
// 算法设计:
// 1. 注册表求解规则偏序，得到入口发现顺序
// 2. 按发现顺序扫描声明，构建委托并写入单元合并表
// 3. 由合并后的单元构建依赖图，计算容忍循环的处理顺序
// 4. 按顺序提交单元，再执行多轮不动点重试
//
// ============================================================================

use std::time::Instant;

use crate::core::collab::{MarkerScanner, ProcessingContext, TypeRegistry};
use crate::core::discovery::{discover, DiscoveryReport};
use crate::core::entry::HandlerEntry;
use crate::core::executor::UnitExecutor;
use crate::core::graph::{DependencyGraph, ProcessingOrder};
use crate::core::registry::HandlerRegistry;
use crate::core::report::{ProcessingPlan, ProcessingReport, ProcessingStatistics, UnitPlan};
use crate::models::config::{Config, DependencyMergePolicy};
use crate::models::failure::{ProcessingFailure, RegistryError};

/// 单次运行的处理选项
#[derive(Debug, Clone, Default)]
pub struct ProcessorOptions {
    /// 扫描的包范围
    pub packages: Vec<String>,
    /// 是否处理测试专用声明
    pub test_mode: bool,
    /// 相同单元键的依赖合并方式
    pub merge_policy: DependencyMergePolicy,
}

impl ProcessorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            packages: config.scan.packages.clone(),
            test_mode: config.processing.test_mode,
            merge_policy: config.processing.merge_policy,
        }
    }

    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_merge_policy(mut self, merge_policy: DependencyMergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }
}

/// 发现与排序完成、尚未执行的中间状态
struct Prepared {
    entries: Vec<HandlerEntry>,
    ctx: ProcessingContext,
    discovery: DiscoveryReport,
    graph: DependencyGraph,
    order: ProcessingOrder,
}

impl Prepared {
    fn plan(&self) -> ProcessingPlan {
        let units = self
            .discovery
            .table
            .iter()
            .map(|unit| UnitPlan {
                key: unit.key.clone(),
                items: unit
                    .items
                    .iter()
                    .filter_map(|item| {
                        self.entries
                            .get(item.entry)
                            .and_then(|entry| entry.delegate(item.index))
                            .map(ToString::to_string)
                    })
                    .collect(),
                dependencies: unit.dependencies.iter().cloned().collect(),
                dependents: self.graph.dependents_of(&unit.key).into_iter().cloned().collect(),
            })
            .collect();

        let rejected: Vec<ProcessingFailure> = self
            .entries
            .iter()
            .flat_map(|entry| entry.errors())
            .filter(|failure| matches!(failure, ProcessingFailure::DependencyCheck { .. }))
            .collect();

        ProcessingPlan {
            discovery_order: self.entries.iter().map(|e| e.marker().clone()).collect(),
            units,
            stages: self.order.stages.clone(),
            order: self.order.order(),
            relaxed: self.order.relaxed.clone(),
            cycles: self.graph.cycles(),
            unresolved: self.graph.unresolved().clone(),
            discovery_failures: self.discovery.failures.clone(),
            rejected,
            skipped_test_only: self.discovery.skipped_test_only,
        }
    }
}

/// 标记处理器：持有注册表，单次运行后即被消耗
pub struct MarkerProcessor {
    registry: HandlerRegistry,
    options: ProcessorOptions,
}

impl MarkerProcessor {
    pub fn new(registry: HandlerRegistry, options: ProcessorOptions) -> Self {
        Self { registry, options }
    }

    fn prepare(
        self,
        scanner: &dyn MarkerScanner,
        types: &mut dyn TypeRegistry,
    ) -> Result<Prepared, RegistryError> {
        let mut entries = self.registry.build_entries()?;
        let ctx = ProcessingContext::new(self.options.packages, self.options.test_mode);

        let discovery = discover(&mut entries, scanner, types, &ctx, self.options.merge_policy);
        let graph = DependencyGraph::build(discovery.table.units());
        let order = graph.processing_order();

        tracing::debug!(
            markers = entries.len(),
            delegates = discovery.delegates,
            units = discovery.table.len(),
            stages = order.stages.len(),
            relaxed = order.relaxed.len(),
            "processing order computed"
        );

        Ok(Prepared {
            entries,
            ctx,
            discovery,
            graph,
            order,
        })
    }

    /// 只执行发现与排序，返回依赖计划
    pub fn plan(
        self,
        scanner: &dyn MarkerScanner,
        types: &mut dyn TypeRegistry,
    ) -> Result<ProcessingPlan, RegistryError> {
        Ok(self.prepare(scanner, types)?.plan())
    }

    /// 执行完整的处理运行
    pub fn process(
        self,
        scanner: &dyn MarkerScanner,
        types: &mut dyn TypeRegistry,
    ) -> Result<ProcessingReport, RegistryError> {
        let start_time = Instant::now();

        let mut prepared = self.prepare(scanner, types)?;
        let plan = prepared.plan();

        let outcome = UnitExecutor::new(&mut prepared.entries, &mut prepared.ctx, types)
            .execute(&prepared.discovery.table, &prepared.order);

        let entries: Vec<_> = prepared.entries.iter().map(HandlerEntry::summary).collect();
        let generated = prepared.ctx.into_generated();

        let mut statistics = ProcessingStatistics {
            total_markers: entries.len(),
            total_delegates: prepared.discovery.delegates,
            total_units: plan.units.len(),
            total_stages: plan.stages.len(),
            processed: entries.iter().map(|e| e.processed).sum(),
            failed: 0,
            skipped_test_only: plan.skipped_test_only,
            rounds: outcome.rounds,
            duration_ms: 0,
        };

        let mut report = ProcessingReport {
            plan,
            entries,
            generated,
            statistics: ProcessingStatistics::default(),
        };
        statistics.failed = report.permanent_failures().len();
        statistics.duration_ms = start_time.elapsed().as_millis() as u64;
        report.statistics = statistics;

        tracing::info!(
            processed = report.statistics.processed,
            failed = report.statistics.failed,
            rounds = report.statistics.rounds,
            duration_ms = report.statistics.duration_ms,
            "processing finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collab::{
        DependencyControl, GeneratedFragment, InjectableView, InjectionContext, MarkerHandler,
    };
    use crate::models::declaration::{
        Declaration, DeclarationId, ElementKind, MarkerInstance, TypeName,
    };
    use crate::models::marker::{MarkerDef, MarkerType};
    use crate::models::unit::UnitKey;

    struct ListScanner(Vec<Declaration>);

    impl MarkerScanner for ListScanner {
        fn scan(&self, marker: &MarkerType, kind: ElementKind, _scopes: &[String]) -> Vec<Declaration> {
            self.0
                .iter()
                .filter(|d| d.has_marker(marker) && d.id.kind == kind)
                .cloned()
                .collect()
        }
    }

    /// 依赖来自 `requires`，只有依赖全部生成后才成功
    struct StrictHandler;

    impl MarkerHandler for StrictHandler {
        fn check_dependencies(
            &self,
            _control: &mut DependencyControl,
            _view: &InjectableView<'_>,
            marker: &MarkerInstance,
            _ctx: &ProcessingContext,
        ) -> Result<Vec<UnitKey>, ProcessingFailure> {
            Ok(marker
                .list_attribute("requires")
                .into_iter()
                .map(|name| UnitKey::new(TypeName::new(name).unwrap()))
                .collect())
        }

        fn handle(
            &mut self,
            view: &InjectableView<'_>,
            marker: &MarkerInstance,
            ctx: &mut ProcessingContext,
        ) -> Result<bool, ProcessingFailure> {
            for name in marker.list_attribute("requires") {
                if !ctx.is_generated(&TypeName::new(name.as_str()).unwrap()) {
                    return Err(ProcessingFailure::injection(&view.declaration.id, name));
                }
            }
            ctx.emit(GeneratedFragment {
                owner: view.owner().clone(),
                marker: marker.marker.clone(),
                content: format!("{}", view.owner()),
            });
            Ok(true)
        }
    }

    fn declaration(owner: &str, requires: &str) -> Declaration {
        Declaration::new(DeclarationId::of_type(TypeName::new(owner).unwrap()))
            .with_marker(MarkerInstance::new(MarkerType::new("Gen")).with_attribute("requires", requires))
    }

    fn processor() -> MarkerProcessor {
        let mut registry = HandlerRegistry::new();
        registry
            .register(MarkerDef::new(MarkerType::new("Gen")).with_targets(["type"]), Box::new(StrictHandler))
            .unwrap();
        MarkerProcessor::new(registry, ProcessorOptions::default())
    }

    #[test]
    fn dependencies_are_generated_first() {
        let scanner = ListScanner(vec![declaration("org.a.B", "org.a.A"), declaration("org.a.A", "")]);
        let mut types = InjectionContext::new();
        let report = processor().process(&scanner, &mut types).unwrap();

        assert!(report.is_success());
        let owners: Vec<&str> = report.generated.iter().map(|f| f.owner.as_str()).collect();
        assert_eq!(owners, ["org.a.A", "org.a.B"]);
        assert_eq!(report.statistics.processed, 2);
        assert_eq!(report.statistics.rounds, 1);
    }

    #[test]
    fn cycles_are_reported_but_do_not_abort() {
        let scanner = ListScanner(vec![
            declaration("org.a.A", "org.a.B"),
            declaration("org.a.B", "org.a.A"),
        ]);
        let mut types = InjectionContext::new();
        let report = processor().process(&scanner, &mut types).unwrap();

        assert_eq!(report.plan.cycles.len(), 1);
        assert_eq!(report.plan.order.len(), 2);
        assert!(!report.plan.relaxed.is_empty());
        assert!(!report.is_success());
        assert_eq!(report.statistics.failed, 2);
    }

    #[test]
    fn plan_does_not_run_handlers() {
        let scanner = ListScanner(vec![declaration("org.a.B", "org.a.A"), declaration("org.a.A", "")]);
        let mut types = InjectionContext::new();
        let plan = processor().plan(&scanner, &mut types).unwrap();

        assert_eq!(plan.units.len(), 2);
        assert_eq!(plan.units[1].dependents, vec![UnitKey::new(TypeName::new("org.a.B").unwrap())]);
        assert_eq!(plan.stages.len(), 2);
    }
}
