// ============================================================================
// MarkFlow - 配置数据模型
// ============================================================================
//
// 文件: src/models/config.rs
// 职责: 配置文件数据结构定义和操作
// 边界:
//   - ✅ 配置文件数据结构定义
//   - ✅ 配置序列化/反序列化
//   - ✅ 配置默认值
//   - ✅ 配置文件读写操作
//   - ✅ CLI 运行时参数合并
//   - ❌ 不应包含配置应用逻辑
//   - ❌ 不应包含 CLI 参数处理
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// 全局配置管理器
static GLOBAL_CONFIG: std::sync::OnceLock<Arc<RwLock<Config>>> = std::sync::OnceLock::new();

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "markflow.toml";

/// 测试模式环境变量
pub const TEST_MODE_ENV: &str = "MARKFLOW_TEST_MODE";

/// MarkFlow 配置文件结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 扫描配置
    pub scan: ScanConfig,
    /// 处理配置
    pub processing: ProcessingConfig,
    /// 输出配置
    pub output: OutputConfig,
    /// 国际化配置
    pub i18n: I18nConfig,
}

/// 扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 扫描的包范围（空表示全部）
    pub packages: Vec<String>,
    /// 清单文件名模式
    pub manifest_patterns: Vec<String>,
    /// 排除扫描的目录或文件模式
    pub ignore: Vec<String>,
}

/// 处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// 是否为测试模式（处理仅测试可用的声明）
    pub test_mode: bool,
    /// 相同键单元的依赖合并策略
    pub merge_policy: DependencyMergePolicy,
    /// 存在永久失败时是否仍视为成功
    pub allow_partial: bool,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 是否详细输出
    pub verbose: bool,
    /// 是否彩色输出
    pub colored: bool,
}

/// 国际化配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// 界面语言
    pub language: String,
}

/// 相同键单元合并时的依赖处理方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DependencyMergePolicy {
    /// 合并双方依赖
    #[default]
    Union,
    /// 保留先注册单元的依赖
    FirstWins,
}

impl DependencyMergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyMergePolicy::Union => "union",
            DependencyMergePolicy::FirstWins => "first_wins",
        }
    }

    /// 从字符串解析合并策略
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "union" => Ok(DependencyMergePolicy::Union),
            "first_wins" => Ok(DependencyMergePolicy::FirstWins),
            _ => Err(format!(
                "unsupported merge policy: {}, expected union or first_wins",
                s
            )),
        }
    }
}

impl std::fmt::Display for DependencyMergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CLI 运行时参数（用于覆盖配置文件）
#[derive(Debug, Clone, Default)]
pub struct RuntimeArgs {
    pub verbose: Option<bool>,
    pub colored: Option<bool>,
    pub test_mode: Option<bool>,
    pub merge_policy: Option<DependencyMergePolicy>,
    pub allow_partial: Option<bool>,
    pub packages: Option<Vec<String>>,
    pub language: Option<String>,
}

/// 配置默认值 trait - 不依赖全局配置初始化
pub trait ConfigDefaults {
    /// 获取默认清单文件名模式
    fn default_manifest_patterns() -> Vec<String> {
        vec![
            "*.markers.yaml".to_string(),
            "*.markers.yml".to_string(),
            "*.markers.json".to_string(),
            "*.markers.toml".to_string(),
        ]
    }

    /// 获取默认忽略模式
    fn default_ignore_patterns() -> Vec<String> {
        vec![".git".to_string(), "target".to_string()]
    }

    /// 获取默认测试模式（受环境变量控制）
    fn default_test_mode() -> bool {
        std::env::var(TEST_MODE_ENV)
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }

    /// 获取默认是否详细输出
    fn default_verbose() -> bool {
        false
    }

    /// 获取默认是否彩色输出
    fn default_colored() -> bool {
        true
    }

    /// 获取默认语言
    fn default_language() -> String {
        "en_us".to_string()
    }
}

impl ConfigDefaults for Config {}

impl Config {
    /// 初始化全局配置（程序启动时调用）
    pub fn initialize() -> anyhow::Result<()> {
        let config = Self::load_config(Path::new(CONFIG_FILE_NAME))?;
        GLOBAL_CONFIG
            .set(Arc::new(RwLock::new(config)))
            .map_err(|_| anyhow::anyhow!("Global config already initialized"))?;
        Ok(())
    }

    /// 加载配置文件，不存在时使用默认配置
    pub fn load_config(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let mut config: Config = toml::from_str(&content)?;
            // 环境变量始终可以打开测试模式
            config.processing.test_mode |= Self::default_test_mode();
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 合并运行时参数
    pub fn merge_runtime_args(args: RuntimeArgs) -> anyhow::Result<()> {
        let global_config = Self::global()?;
        let mut config = global_config
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire config write lock"))?;
        config.apply_runtime_args(args);
        Ok(())
    }

    /// 将运行时参数应用到当前配置
    pub fn apply_runtime_args(&mut self, args: RuntimeArgs) {
        if let Some(verbose) = args.verbose {
            self.output.verbose = verbose;
        }
        if let Some(colored) = args.colored {
            self.output.colored = colored;
        }
        if let Some(test_mode) = args.test_mode {
            self.processing.test_mode = test_mode;
        }
        if let Some(merge_policy) = args.merge_policy {
            self.processing.merge_policy = merge_policy;
        }
        if let Some(allow_partial) = args.allow_partial {
            self.processing.allow_partial = allow_partial;
        }
        if let Some(packages) = args.packages {
            self.scan.packages = packages;
        }
        if let Some(language) = args.language {
            self.i18n.language = language;
        }
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, config_path: &PathBuf) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// 生成默认配置模板
    pub fn generate_default_template() -> Self {
        let mut config = Self::default();
        config.scan.packages = vec!["org.example".to_string()];
        config
    }

    /// 生成默认配置模板并保存到文件
    pub fn create_default_config_file(config_path: &PathBuf) -> anyhow::Result<()> {
        let default_config = Self::generate_default_template();
        default_config.save_to_file(config_path)?;
        Ok(())
    }

    fn global() -> anyhow::Result<&'static Arc<RwLock<Config>>> {
        GLOBAL_CONFIG
            .get()
            .ok_or_else(|| anyhow::anyhow!("Global config not initialized"))
    }

    /// 获取全局配置快照
    pub fn snapshot() -> anyhow::Result<Config> {
        let config = Self::global()?
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire config read lock"))?;
        Ok(config.clone())
    }

    /// 获取界面语言
    pub fn get_language() -> anyhow::Result<String> {
        Ok(Self::snapshot()?.i18n.language)
    }

    /// 获取详细输出设置（带默认值）
    pub fn get_verbose() -> bool {
        match Self::snapshot() {
            Ok(config) => config.output.verbose,
            _ => Self::default_verbose(),
        }
    }

    /// 获取是否彩色输出（带默认值）
    pub fn get_colored() -> bool {
        match Self::snapshot() {
            Ok(config) => config.output.colored,
            _ => Self::default_colored(),
        }
    }

    /// 检查路径是否应该被忽略
    pub fn should_ignore_path(&self, path: &str) -> bool {
        self.scan.ignore.iter().any(|pattern| {
            let matches_glob = glob::Pattern::new(pattern)
                .map(|glob_pattern| glob_pattern.matches(path))
                .unwrap_or(false);
            matches_glob || path.split(['/', '\\']).any(|segment| segment == pattern)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            processing: ProcessingConfig::default(),
            output: OutputConfig::default(),
            i18n: I18nConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            manifest_patterns: Config::default_manifest_patterns(),
            ignore: Config::default_ignore_patterns(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            test_mode: Config::default_test_mode(),
            merge_policy: DependencyMergePolicy::default(),
            allow_partial: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: Config::default_verbose(),
            colored: Config::default_colored(),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            language: Config::default_language(),
        }
    }
}
