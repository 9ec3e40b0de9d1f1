// ============================================================================
// MarkFlow - 数据模型模块
// ============================================================================
//
// 文件: src/models/mod.rs
// 职责: 数据模型模块入口和导出
// 边界:
//   - ✅ 模型子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod config;
pub mod declaration;
pub mod failure;
pub mod marker;
pub mod unit;

pub use config::{Config, DependencyMergePolicy, RuntimeArgs};
pub use declaration::{Declaration, DeclarationId, ElementKind, MarkerInstance, TypeName};
pub use failure::{ProcessingFailure, RegistryError, TypeNameError};
pub use marker::{MarkerDef, MarkerType, OrderingRule, RelativeOrder};
pub use unit::{DelegateRef, SortUnit, UnitKey};
