// ============================================================================
// MarkFlow - 清单模块
// ============================================================================
//
// 文件: src/manifest/mod.rs
// 职责: 声明式清单的加载、扫描与处理器实现
// 边界:
//   - ✅ 子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含引擎核心逻辑
//   - ❌ 不应包含 CLI 相关逻辑
//
// ============================================================================

pub mod handler;
pub mod loader;
pub mod scanner;

pub use handler::{build_registry, ManifestHandler};
pub use loader::{Manifest, ManifestError, ManifestFormat, MarkerSpec};
pub use scanner::{scope_matches, ManifestScanner};
