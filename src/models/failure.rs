// ============================================================================
// MarkFlow - 处理失败模型
// ============================================================================
//
// 文件: src/models/failure.rs
// 职责: 结构化的处理失败与引擎错误定义
// 边界:
//   - ✅ 依赖检查失败 / 注入失败 / 结构错误分类
//   - ✅ 处理器注册错误定义
//   - ✅ 可恢复性判定
//   - ❌ 不应包含失败处理流程
//   - ❌ 不应包含日志输出
//
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::models::marker::MarkerType;

/// 单个委托的处理失败
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingFailure {
    /// 处理器无法确定依赖，立即失败且不重试
    #[error("dependency check failed for {declaration}: {reason}")]
    DependencyCheck { declaration: String, reason: String },

    /// 处理器暂时无法完成注入，下一轮重试
    #[error("injection failed for {declaration}: {reason}")]
    Injection { declaration: String, reason: String },

    /// 处理器返回未完成，下一轮重试
    #[error("processing of {declaration} did not complete")]
    Incomplete { declaration: String },

    /// 声明结构错误，仅影响该声明
    #[error("malformed declaration {declaration}: {reason}")]
    Structural { declaration: String, reason: String },
}

impl ProcessingFailure {
    pub fn dependency_check(declaration: impl ToString, reason: impl Into<String>) -> Self {
        Self::DependencyCheck {
            declaration: declaration.to_string(),
            reason: reason.into(),
        }
    }

    pub fn injection(declaration: impl ToString, reason: impl Into<String>) -> Self {
        Self::Injection {
            declaration: declaration.to_string(),
            reason: reason.into(),
        }
    }

    pub fn incomplete(declaration: impl ToString) -> Self {
        Self::Incomplete {
            declaration: declaration.to_string(),
        }
    }

    pub fn structural(declaration: impl ToString, reason: impl Into<String>) -> Self {
        Self::Structural {
            declaration: declaration.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否可在后续轮次重试
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Injection { .. } | Self::Incomplete { .. })
    }

    pub fn declaration(&self) -> &str {
        match self {
            Self::DependencyCheck { declaration, .. }
            | Self::Injection { declaration, .. }
            | Self::Incomplete { declaration }
            | Self::Structural { declaration, .. } => declaration,
        }
    }
}

/// 类型名校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeNameError {
    #[error("type name is empty")]
    Empty,

    #[error("malformed type name '{0}'")]
    Malformed(String),
}

/// 处理器注册表错误，在发现阶段之前中止整个运行
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("marker {0} is registered more than once")]
    DuplicateMarker(MarkerType),

    #[error("ordering rules form a cycle: {}", format_cycle(.0))]
    RuleCycle(Vec<MarkerType>),
}

fn format_cycle(markers: &[MarkerType]) -> String {
    markers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
