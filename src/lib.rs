// ============================================================================
// MarkFlow - 库入口
// ============================================================================
//
// 文件: src/lib.rs
// 职责: 模块声明与对外导出
// 边界:
//   - ✅ 顶层模块声明
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod cli;
pub mod core;
pub mod i18n;
pub mod manifest;
pub mod models;
pub mod ui;
pub mod utils;
