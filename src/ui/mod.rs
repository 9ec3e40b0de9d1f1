// ============================================================================
// MarkFlow - UI 模块
// ============================================================================
//
// 文件: src/ui/mod.rs
// 职责: 终端结果展示组件入口
// 边界:
//   - ✅ 子模块导出
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod summary;
