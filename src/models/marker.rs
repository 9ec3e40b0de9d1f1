// ============================================================================
// MarkFlow - 标记数据模型
// ============================================================================
//
// 文件: src/models/marker.rs
// 职责: 标记类型、标记目标与相对顺序规则定义
// 边界:
//   - ✅ 标记类型值对象定义
//   - ✅ 标记目标粒度解析
//   - ✅ 相对顺序规则定义
//   - ❌ 不应包含规则排序算法
//   - ❌ 不应包含处理器注册逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::declaration::ElementKind;

/// 标记类型（按名称区分）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerType(String);

impl MarkerType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// 标记定义：标记类型 + 声明的适用目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerDef {
    /// 标记类型
    #[serde(rename = "name")]
    pub marker: MarkerType,
    /// 声明的目标（None 表示未限制）
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

/// 目标解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargets {
    /// 生效的粒度（去重，保持声明顺序）
    pub kinds: Vec<ElementKind>,
    /// 无法识别的目标名
    pub unrecognized: Vec<String>,
}

impl MarkerDef {
    /// 未限制目标的标记定义
    pub fn new(marker: MarkerType) -> Self {
        Self {
            marker,
            targets: None,
        }
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    /// 解析适用粒度
    ///
    /// 未声明目标，或声明的目标全部无法识别时，回退到全部四种粒度。
    pub fn resolve_targets(&self) -> ResolvedTargets {
        let declared = match &self.targets {
            Some(targets) => targets,
            None => {
                return ResolvedTargets {
                    kinds: ElementKind::ALL.to_vec(),
                    unrecognized: Vec::new(),
                }
            }
        };

        let mut kinds = Vec::new();
        let mut unrecognized = Vec::new();
        for target in declared {
            match ElementKind::parse(target) {
                Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Some(_) => {}
                None => unrecognized.push(target.clone()),
            }
        }

        if kinds.is_empty() {
            kinds = ElementKind::ALL.to_vec();
        }

        ResolvedTargets {
            kinds,
            unrecognized,
        }
    }
}

/// 相对顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeOrder {
    /// 必须在关联标记之前
    Before,
    /// 必须在关联标记之后
    After,
}

/// 相对顺序规则：本标记相对于 `relative_to` 的顺序
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingRule {
    pub relative_to: MarkerType,
    pub order: RelativeOrder,
}

impl OrderingRule {
    pub fn before(marker: MarkerType) -> Self {
        Self {
            relative_to: marker,
            order: RelativeOrder::Before,
        }
    }

    pub fn after(marker: MarkerType) -> Self {
        Self {
            relative_to: marker,
            order: RelativeOrder::After,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_targets_default_to_all_kinds() {
        let def = MarkerDef::new(MarkerType::new("Any"));
        assert_eq!(def.resolve_targets().kinds, ElementKind::ALL.to_vec());
    }

    #[test]
    fn unrecognized_targets_are_reported_and_defaulted() {
        let def = MarkerDef::new(MarkerType::new("Odd")).with_targets(["package", "annotation"]);
        let resolved = def.resolve_targets();
        assert_eq!(resolved.kinds, ElementKind::ALL.to_vec());
        assert_eq!(resolved.unrecognized, vec!["package", "annotation"]);
    }

    #[test]
    fn duplicate_targets_collapse() {
        let def = MarkerDef::new(MarkerType::new("Inject"))
            .with_targets(["field", "method", "field", "bogus"]);
        let resolved = def.resolve_targets();
        assert_eq!(resolved.kinds, vec![ElementKind::Field, ElementKind::Method]);
        assert_eq!(resolved.unrecognized, vec!["bogus"]);
    }
}
