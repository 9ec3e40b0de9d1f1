// ============================================================================
// MarkFlow - 常量定义
// ============================================================================
//
// 文件: src/utils/constants.rs
// 职责: 应用程序常量定义
// 边界:
//   - ✅ 应用程序常量定义
//   - ✅ 像素图标字符定义
//   - ✅ 分隔线定义
//   - ❌ 不应包含动态配置
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

/// 应用名称常量
pub const APP_NAME: &str = "MARKFLOW";

/// 日志过滤环境变量
pub const LOG_ENV: &str = "MARKFLOW_LOG";

/// 标题分隔线
pub const HEAVY_RULE: &str = "═══════════════════════════════════════";

/// 小节分隔线
pub const LIGHT_RULE: &str = "───────────────────────────────────────";

/// 像素风格图标
pub mod icons {
    /// 成功图标
    pub const SUCCESS: &str = "✓";
    /// 错误图标
    pub const ERROR: &str = "✗";
    /// 警告图标
    pub const WARNING: &str = "!";
    /// 信息图标
    pub const INFO: &str = "i";
    /// 单元图标
    pub const UNIT: &str = "●";
    /// 阶段图标
    pub const STAGE: &str = "▪";
    /// 标记图标
    pub const MARKER: &str = "◆";
    /// 分析图标
    pub const ANALYZE: &str = "◇";
    /// 初始化图标
    pub const INIT: &str = "◈";
    /// 执行图标
    pub const EXEC: &str = "▸";
    /// 依赖图标
    pub const DEPENDENCY: &str = "◦";
    /// 时间图标
    pub const TIME: &str = "⧖";
    /// 箭头图标
    pub const ARROW: &str = "→";
    /// 汇总图标
    pub const SUMMARY: &str = "◈";
    /// 跳过图标
    pub const SKIP: &str = "○";
    /// 生成图标
    pub const GENERATED: &str = "▓";
}
