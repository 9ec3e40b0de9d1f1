// ============================================================================
// MarkFlow - Core 核心模块
// ============================================================================
//
// 文件: src/core/mod.rs
// 职责: 核心业务逻辑模块入口和导出
// 边界:
//   - ✅ 核心子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体业务实现
//   - ❌ 不应包含 CLI 相关逻辑
//   - ❌ 不应包含 UI 相关逻辑
//
// ============================================================================

pub mod collab;
pub mod delegate;
pub mod discovery;
pub mod entry;
pub mod executor;
pub mod fixpoint;
pub mod graph;
pub mod merge;
pub mod processor;
pub mod registry;
pub mod report;

// 重新导出常用类型
pub use collab::{
    DependencyControl, GeneratedFragment, InjectableView, InjectionContext, Injector,
    MarkerHandler, MarkerScanner, ProcessingContext, TypeRegistry,
};
pub use entry::HandlerEntry;
pub use fixpoint::EntryState;
pub use graph::{DependencyGraph, ProcessingOrder};
pub use merge::UnitMergeTable;
pub use processor::{MarkerProcessor, ProcessorOptions};
pub use registry::HandlerRegistry;
pub use report::{EntrySummary, ProcessingPlan, ProcessingReport, ProcessingStatistics};
