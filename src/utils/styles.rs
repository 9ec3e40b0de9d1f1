// ============================================================================
// MarkFlow - 文本样式工具
// ============================================================================
//
// 文件: src/utils/styles.rs
// 职责: 终端文本样式格式化
// 边界:
//   - ✅ 文本样式代码定义（粗体）
//   - ✅ 文本样式格式化
//   - ❌ 不应包含颜色相关功能
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

use crate::models::config::Config;

/// ANSI 文本样式代码
pub mod ansi_styles {
    /// 重置所有样式
    pub const RESET: &str = "\x1b[0m";

    /// 粗体
    pub const BOLD: &str = "\x1b[1m";
}

/// 文本样式工具函数
pub struct TextStyles;

impl TextStyles {
    /// 为文本添加样式
    pub fn stylize(text: &str, style: &str) -> String {
        if !Config::get_colored() {
            return text.to_string();
        }
        format!("{}{}{}", style, text, ansi_styles::RESET)
    }

    /// 粗体文本
    pub fn bold(text: &str) -> String {
        Self::stylize(text, ansi_styles::BOLD)
    }
}
