// ============================================================================
// MarkFlow - 初始化命令处理
// ============================================================================
//
// 文件: src/cli/init.rs
// 职责: 生成起步所需的配置文件与示例标记清单
// 边界:
//   - ✅ 默认 markflow.toml 生成
//   - ✅ 可选的示例清单（含排序规则与依赖）
//   - ✅ 已存在文件的保留与 --force 覆盖
//   - ❌ 不应包含配置文件格式定义
//   - ❌ 不应包含清单解析逻辑
//
// ============================================================================

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::config::{Config, CONFIG_FILE_NAME};
use crate::utils::constants::icons;
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 示例清单文件名，匹配默认的 `*.markers.*` 模式
pub const SAMPLE_MANIFEST_NAME: &str = "sample.markers.yaml";

/// 示例清单：Builder 排在 Model 之后发现，Account 依赖 User
pub const SAMPLE_MANIFEST: &str = r#"markers:
  - name: Model
    targets: [type]
  - name: Builder
    targets: [type]
    after: [Model]

declarations:
  - owner: org.example.User
    markers:
      - name: Model
      - name: Builder
  - owner: org.example.Account
    markers:
      - name: Model
        attributes:
          requires: org.example.User
"#;

/// 初始化命令参数
#[derive(Debug, Args)]
pub struct InitArgs {
    /// 配置文件路径
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// 强制覆盖已存在的文件
    #[arg(short, long)]
    pub force: bool,

    /// 在配置文件旁生成示例标记清单
    #[arg(long)]
    pub sample: bool,
}

/// 单个文件的写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Kept,
}

/// 处理初始化命令
pub fn handle_init(args: InitArgs) -> Result<Vec<WriteOutcome>> {
    Logger::info(format!("{} {}", icons::INIT, t!("init.start")));

    let mut outcomes = vec![write_file(&args.config, args.force, |path| {
        Config::create_default_config_file(&path.to_path_buf())
    })?];

    let sample = sample_path(&args.config);
    if args.sample {
        outcomes.push(write_file(&sample, args.force, |path| {
            fs::write(path, SAMPLE_MANIFEST).map_err(Into::into)
        })?);
    }

    if outcomes.contains(&WriteOutcome::Kept) {
        Logger::info(t!("init.use_force_hint"));
    }
    if args.sample {
        Logger::info(tf!("init.next_steps_sample", sample.display()));
    } else {
        Logger::info(t!("init.next_steps"));
    }

    Ok(outcomes)
}

/// 示例清单与配置文件放在同一目录
fn sample_path(config: &Path) -> PathBuf {
    config
        .parent()
        .map(|dir| dir.join(SAMPLE_MANIFEST_NAME))
        .unwrap_or_else(|| PathBuf::from(SAMPLE_MANIFEST_NAME))
}

fn write_file<F>(path: &Path, force: bool, write: F) -> Result<WriteOutcome>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if path.exists() && !force {
        Logger::warn(tf!("init.file_exists", path.display()));
        return Ok(WriteOutcome::Kept);
    }

    write(path).with_context(|| tf!("init.create_failed", path.display()))?;
    Logger::success(tf!("init.file_created", path.display()));
    Ok(WriteOutcome::Created)
}
