// ============================================================================
// MarkFlow - 排序单元数据模型
// ============================================================================
//
// 文件: src/models/unit.rs
// 职责: 依赖图节点（排序单元）数据结构定义
// 边界:
//   - ✅ 单元键（伪装身份）定义
//   - ✅ 单元条目与依赖集合
//   - ✅ 条目合并与依赖合并基础操作
//   - ❌ 不应包含合并表逻辑
//   - ❌ 不应包含排序算法
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::models::declaration::TypeName;

/// 单元键：单元在依赖图中所代表的声明（可被伪装为其他类型）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitKey(TypeName);

impl UnitKey {
    pub fn new(type_name: TypeName) -> Self {
        Self(type_name)
    }

    pub fn type_name(&self) -> &TypeName {
        &self.0
    }
}

impl From<TypeName> for UnitKey {
    fn from(value: TypeName) -> Self {
        Self(value)
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 指向某个处理入口中某个委托的引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DelegateRef {
    /// 处理入口下标
    pub entry: usize,
    /// 入口内委托下标
    pub index: usize,
}

/// 依赖图节点
#[derive(Debug, Clone, Serialize)]
pub struct SortUnit {
    /// 伪装身份
    pub key: UnitKey,
    /// 归入该单元的委托
    pub items: Vec<DelegateRef>,
    /// 依赖的其他单元
    pub dependencies: BTreeSet<UnitKey>,
    /// 硬依赖标志（预留，用于区分必需边与建议边）
    pub hard: bool,
}

impl SortUnit {
    pub fn new(key: UnitKey) -> Self {
        Self {
            key,
            items: Vec::new(),
            dependencies: BTreeSet::new(),
            hard: false,
        }
    }

    pub fn with_item(key: UnitKey, item: DelegateRef, dependencies: BTreeSet<UnitKey>) -> Self {
        Self {
            key,
            items: vec![item],
            dependencies,
            hard: false,
        }
    }

    pub fn hard(mut self) -> Self {
        self.hard = true;
        self
    }
}

impl fmt::Display for SortUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deps: Vec<String> = self.dependencies.iter().map(ToString::to_string).collect();
        write!(f, "{} => [{}]", self.key, deps.join(", "))
    }
}
