// ============================================================================
// MarkFlow - 中文翻译表
// ============================================================================
//
// 文件: src/i18n/zh_cn.rs
// 职责: 中文翻译内容定义
// 边界:
//   - ✅ 中文翻译字符串定义
//   - ✅ 翻译键值对维护
//   - ❌ 不应包含翻译逻辑
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

/// 中文翻译表
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // 清单加载
    ("manifest.loading", "加载清单: {}"),
    ("manifest.loaded", "已加载 {} 个清单文件: {} 个标记, {} 个声明"),
    ("manifest.malformed", "{} 个声明格式错误，将作为结构错误报告"),
    ("manifest.no_markers", "清单未定义任何标记，无需处理"),
    // run 命令
    ("run.start", "开始处理标记: {}"),
    ("run.options", "合并策略: {}, 测试模式: {}, 扫描范围: [{}]"),
    ("run.completed", "所有声明处理成功"),
    ("run.partial", "{} 个声明处理失败，已允许部分结果，继续执行"),
    ("run.failed", "{} 个声明永久失败"),
    // analyze 命令
    ("cli.analyze.start", "开始分析标记依赖..."),
    ("output.analysis_result", "依赖计划"),
    ("output.discovery_order", "发现顺序: {}"),
    ("output.total_units", "单元总数: {}"),
    ("output.total_stages", "处理阶段: {}"),
    ("output.skipped_test_only", "跳过的测试专用声明: {}"),
    ("output.no_cycles", "未发现循环依赖"),
    ("output.stages", "处理阶段"),
    ("output.stage_info", "阶段 {} ({} 个单元):"),
    ("output.no_dependencies", "无依赖"),
    ("output.depends_on_count", "依赖 {} 个单元"),
    ("output.unknown_unit", "未知单元"),
    ("output.required_by", "被依赖: {}"),
    ("output.usage_tip", "使用 --detail 查看依赖详情，或使用 -f json 输出机器可读格式"),
    // 汇总
    ("summary.title", "处理汇总"),
    ("summary.total_markers", "标记: {}"),
    ("summary.total_units", "单元: {} ({} 个委托)"),
    ("summary.total_stages", "阶段: {}"),
    ("summary.processed", "已处理: {}"),
    ("summary.failed", "失败: {}"),
    ("summary.skipped_test_only", "跳过（测试专用）: {}"),
    ("summary.rounds", "重试轮次: {}"),
    ("summary.duration", "耗时: {}s"),
    ("summary.cycles", "循环依赖"),
    ("summary.cycle_header", "循环 {}:"),
    ("summary.relaxed", "为打破循环放宽了以下单元的顺序约束: {}"),
    ("summary.entries", "标记入口"),
    ("summary.entry_line", "{} {}: 已处理 {}/{}，共 {} 轮"),
    ("summary.failures", "失败 ({})"),
    ("summary.generated", "生成片段 ({})"),
    // init 命令
    ("init.start", "初始化 MarkFlow 项目文件..."),
    ("init.file_exists", "文件已存在，保留: {}"),
    ("init.use_force_hint", "使用 --force 覆盖已存在的文件"),
    ("init.file_created", "已创建: {}"),
    ("init.next_steps", "编辑 [scan] packages 设置扫描范围，然后运行: markflow run <清单>"),
    ("init.next_steps_sample", "运行示例: markflow run {}"),
    ("init.create_failed", "写入失败: {}"),
    // 错误
    ("error.path_not_exist", "路径不存在: {}"),
    ("error.load_manifest", "加载清单失败: {}"),
];
