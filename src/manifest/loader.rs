// ============================================================================
// MarkFlow - 清单加载器
// ============================================================================
//
// 文件: src/manifest/loader.rs
// 职责: 从 YAML / JSON / TOML 清单文件或目录加载标记定义与声明
// 边界:
//   - ✅ 按扩展名选择解析格式
//   - ✅ 目录遍历与清单文件匹配
//   - ✅ 原始声明到声明模型的转换（结构错误不影响其他声明）
//   - ✅ 多文件合并与一致性校验
//   - ❌ 不应包含扫描范围过滤
//   - ❌ 不应包含处理器逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::config::Config;
use crate::models::declaration::{Declaration, DeclarationId, ElementKind, MarkerInstance, TypeName};
use crate::models::failure::ProcessingFailure;
use crate::models::marker::{MarkerDef, MarkerType, OrderingRule};

/// 清单错误
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported manifest format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("no manifest files found under {}", .0.display())]
    NoManifests(PathBuf),

    #[error("failed to walk {}: {message}", .path.display())]
    Walk { path: PathBuf, message: String },

    #[error("marker {0} is defined in more than one manifest")]
    DuplicateMarker(MarkerType),

    #[error("declaration {declaration} uses undefined marker {marker}")]
    UnknownMarker {
        declaration: String,
        marker: MarkerType,
    },
}

/// 清单中的标记定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub name: MarkerType,
    #[serde(default)]
    pub targets: Option<Vec<String>>,
    /// 必须在这些标记之前发现
    #[serde(default)]
    pub before: Vec<MarkerType>,
    /// 必须在这些标记之后发现
    #[serde(default)]
    pub after: Vec<MarkerType>,
}

impl MarkerSpec {
    pub fn def(&self) -> MarkerDef {
        MarkerDef {
            marker: self.name.clone(),
            targets: self.targets.clone(),
        }
    }

    pub fn rules(&self) -> Vec<OrderingRule> {
        self.before
            .iter()
            .cloned()
            .map(OrderingRule::before)
            .chain(self.after.iter().cloned().map(OrderingRule::after))
            .collect()
    }
}

/// 未经校验的声明，类型名与粒度在转换时校验
#[derive(Debug, Clone, Deserialize)]
struct RawDeclaration {
    owner: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    member: Option<String>,
    #[serde(default)]
    markers: Vec<MarkerInstance>,
    #[serde(default)]
    test_only: bool,
}

impl RawDeclaration {
    fn describe(&self) -> String {
        match &self.member {
            Some(member) => format!("{}#{}", self.owner, member),
            None => self.owner.clone(),
        }
    }

    fn into_declaration(self) -> Result<Declaration, ProcessingFailure> {
        let owner = TypeName::new(self.owner.as_str())
            .map_err(|e| ProcessingFailure::structural(self.describe(), e.to_string()))?;

        let kind = match self.kind.as_deref() {
            None => ElementKind::Type,
            Some(kind) => ElementKind::parse(kind).ok_or_else(|| {
                ProcessingFailure::structural(self.describe(), format!("unknown element kind: {kind}"))
            })?,
        };

        Ok(Declaration {
            id: DeclarationId {
                owner,
                kind,
                member: self.member,
            },
            markers: self.markers,
            test_only: self.test_only,
        })
    }
}

/// 单个清单文件的结构
#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    markers: Vec<MarkerSpec>,
    #[serde(default)]
    declarations: Vec<RawDeclaration>,
}

/// 已加载的清单
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// 标记定义（按文件与声明顺序）
    pub markers: Vec<MarkerSpec>,
    /// 通过结构校验的声明
    pub declarations: Vec<Declaration>,
    /// 结构错误的声明
    pub failures: Vec<ProcessingFailure>,
    /// 来源文件
    pub sources: Vec<PathBuf>,
}

/// 清单文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
    Toml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "yaml" | "yml" => Some(ManifestFormat::Yaml),
            "json" => Some(ManifestFormat::Json),
            "toml" => Some(ManifestFormat::Toml),
            _ => None,
        }
    }
}

impl Manifest {
    /// 加载单个文件或目录下所有匹配的清单
    pub fn load(path: &Path, config: &Config) -> Result<Self, ManifestError> {
        let files = if path.is_dir() {
            discover_manifest_files(path, config)?
        } else {
            vec![path.to_path_buf()]
        };

        let mut manifest = Manifest::default();
        for file in files {
            manifest.merge_file(&file)?;
        }
        manifest.validate()?;
        Ok(manifest)
    }

    /// 从字符串解析清单
    pub fn parse(content: &str, format: ManifestFormat, origin: &Path) -> Result<Self, ManifestError> {
        let mut manifest = Manifest::default();
        manifest.merge(parse_file(content, format, origin)?, origin)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ManifestError> {
        let format = ManifestFormat::from_path(path)
            .ok_or_else(|| ManifestError::UnsupportedFormat(path.to_path_buf()))?;
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = parse_file(&content, format, path)?;
        self.merge(file, path)
    }

    fn merge(&mut self, file: ManifestFile, origin: &Path) -> Result<(), ManifestError> {
        for spec in file.markers {
            if self.markers.iter().any(|m| m.name == spec.name) {
                return Err(ManifestError::DuplicateMarker(spec.name));
            }
            self.markers.push(spec);
        }

        for raw in file.declarations {
            match raw.into_declaration() {
                Ok(declaration) => self.declarations.push(declaration),
                Err(failure) => {
                    tracing::warn!(origin = %origin.display(), %failure, "malformed declaration in manifest");
                    self.failures.push(failure);
                }
            }
        }

        self.sources.push(origin.to_path_buf());
        Ok(())
    }

    /// 所有声明使用的标记都必须有定义
    fn validate(&self) -> Result<(), ManifestError> {
        let defined: HashSet<&MarkerType> = self.markers.iter().map(|m| &m.name).collect();
        for declaration in &self.declarations {
            if let Some(instance) = declaration.markers.iter().find(|m| !defined.contains(&m.marker)) {
                return Err(ManifestError::UnknownMarker {
                    declaration: declaration.id.to_string(),
                    marker: instance.marker.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn marker(&self, name: &MarkerType) -> Option<&MarkerSpec> {
        self.markers.iter().find(|m| &m.name == name)
    }
}

fn parse_file(content: &str, format: ManifestFormat, origin: &Path) -> Result<ManifestFile, ManifestError> {
    let parse_error = |message: String| ManifestError::Parse {
        path: origin.to_path_buf(),
        message,
    };

    match format {
        ManifestFormat::Yaml => {
            // 空文件视为空清单
            if content.trim().is_empty() {
                return Ok(ManifestFile::default());
            }
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))
        }
        ManifestFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        ManifestFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// 遍历目录，查找匹配清单模式的文件（按路径排序）
pub fn discover_manifest_files(root: &Path, config: &Config) -> Result<Vec<PathBuf>, ManifestError> {
    let patterns: Vec<glob::Pattern> = config
        .scan
        .manifest_patterns
        .iter()
        .filter_map(|pattern| match glob::Pattern::new(pattern) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "invalid manifest pattern ignored");
                None
            }
        })
        .collect();

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let relative_path = e
                .path()
                .strip_prefix(root)
                .unwrap_or(e.path())
                .to_string_lossy();
            // 检查忽略模式（完全跳过，不进入子目录）
            relative_path.is_empty() || !config.should_ignore_path(&relative_path)
        })
    {
        let entry = entry.map_err(|e| ManifestError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if patterns.iter().any(|pattern| pattern.matches(&file_name)) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(ManifestError::NoManifests(root.to_path_buf()));
    }

    Ok(files)
}
