// ============================================================================
// MarkFlow - 程序入口
// ============================================================================
//
// 文件: src/main.rs
// 职责: 日志初始化、配置加载与 CLI 启动
// 边界:
//   - ✅ tracing 订阅器初始化
//   - ✅ 全局配置初始化
//   - ✅ 顶层错误输出与退出码
//   - ❌ 不应包含命令实现逻辑
//
// ============================================================================

use markflow::cli::run_cli;
use markflow::models::config::Config;
use markflow::utils::constants::LOG_ENV;
use markflow::utils::logger::Logger;
use tracing_subscriber::EnvFilter;

fn main() {
    // 诊断日志输出到 stderr，由 MARKFLOW_LOG 控制级别
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = Config::initialize() {
        Logger::error(format!("{:#}", e));
        std::process::exit(1);
    }

    if let Err(e) = run_cli() {
        Logger::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
