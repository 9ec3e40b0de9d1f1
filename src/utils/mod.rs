// ============================================================================
// MarkFlow - 工具模块
// ============================================================================
//
// 文件: src/utils/mod.rs
// 职责: 终端输出相关的通用工具
// 边界:
//   - ✅ 子模块导出
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod colors;
pub mod constants;
pub mod logger;
pub mod styles;
