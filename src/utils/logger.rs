// ============================================================================
// MarkFlow - 日志工具
// ============================================================================
//
// 文件: src/utils/logger.rs
// 职责: 面向用户的终端消息输出
// 边界:
//   - ✅ 消息级别前缀与颜色
//   - ✅ 详细模式下的附加消息
//   - ✅ 控制台输出控制
//   - ❌ 不应包含业务逻辑
//   - ❌ 不应包含结构化诊断日志（由 tracing 负责）
//
// ============================================================================

use super::colors::Colors;
use super::constants::APP_NAME;
use crate::models::config::Config;

/// 简单的日志工具
pub struct Logger;

impl Logger {
    fn tag() -> String {
        format!("[{}]", APP_NAME)
    }

    pub fn info<S: AsRef<str>>(msg: S) {
        println!("{} {}", Colors::info(&Self::tag()), msg.as_ref());
    }

    /// 警告与详细信息写入 stderr，stdout 只保留命令结果
    pub fn warn<S: AsRef<str>>(msg: S) {
        eprintln!("{} {}", Colors::warn("[WARN]"), msg.as_ref());
    }

    pub fn error<S: AsRef<str>>(msg: S) {
        eprintln!("{} {}", Colors::error("[ERROR]"), msg.as_ref());
    }

    pub fn success<S: AsRef<str>>(msg: S) {
        println!("{} {}", Colors::success(&Self::tag()), msg.as_ref());
    }

    /// 仅在详细模式下输出
    pub fn verbose<S: AsRef<str>>(msg: S) {
        if Config::get_verbose() {
            eprintln!("{} {}", Colors::secondary(&Self::tag()), msg.as_ref());
        }
    }
}
