// ============================================================================
// MarkFlow - 声明数据模型
// ============================================================================
//
// 文件: src/models/declaration.rs
// 职责: 扫描器提供的声明及其身份标识
// 边界:
//   - ✅ 声明粒度（类型/构造器/字段/方法）定义
//   - ✅ 全限定类型名值对象及校验
//   - ✅ 声明身份值对象定义
//   - ✅ 标记实例数据结构定义
//   - ❌ 不应包含扫描逻辑
//   - ❌ 不应包含处理器调用逻辑
//   - ❌ 不应包含依赖图逻辑
//
// ============================================================================

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::models::failure::TypeNameError;
use crate::models::marker::MarkerType;

/// 全限定类型名的合法格式
static TYPE_NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn type_name_pattern() -> &'static Regex {
    TYPE_NAME_PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
            .expect("type name pattern is a valid regex")
    })
}

/// 声明粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// 类型声明
    Type,
    /// 构造器声明
    Constructor,
    /// 字段声明
    Field,
    /// 方法声明
    Method,
}

impl ElementKind {
    /// 全部粒度，未声明目标的标记默认适用于全部粒度
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Type,
        ElementKind::Constructor,
        ElementKind::Field,
        ElementKind::Method,
    ];

    /// 获取粒度名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Type => "type",
            ElementKind::Constructor => "constructor",
            ElementKind::Field => "field",
            ElementKind::Method => "method",
        }
    }

    /// 从字符串解析粒度，无法识别时返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "type" => Some(ElementKind::Type),
            "constructor" => Some(ElementKind::Constructor),
            "field" => Some(ElementKind::Field),
            "method" => Some(ElementKind::Method),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 全限定类型名，例如 `org.app.UserService`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(String);

impl TypeName {
    /// 创建并校验类型名
    pub fn new(name: impl Into<String>) -> Result<Self, TypeNameError> {
        let name = name.into();
        if name.is_empty() {
            Err(TypeNameError::Empty)
        } else if type_name_pattern().is_match(&name) {
            Ok(Self(name))
        } else {
            Err(TypeNameError::Malformed(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 包名部分（最后一个 `.` 之前），顶层类型返回空字符串
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(pos) => &self.0[..pos],
            None => "",
        }
    }

    /// 简单类型名（最后一个 `.` 之后）
    pub fn simple_name(&self) -> &str {
        match self.0.rfind('.') {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for TypeName {
    type Error = TypeNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeName::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 声明身份：所属类型 + 粒度 + 成员名
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclarationId {
    /// 所属类型（类型声明即其自身）
    pub owner: TypeName,
    /// 声明粒度
    pub kind: ElementKind,
    /// 成员名（类型声明为空）
    #[serde(default)]
    pub member: Option<String>,
}

impl DeclarationId {
    pub fn of_type(owner: TypeName) -> Self {
        Self {
            owner,
            kind: ElementKind::Type,
            member: None,
        }
    }

    pub fn of_member(owner: TypeName, kind: ElementKind, member: impl Into<String>) -> Self {
        Self {
            owner,
            kind,
            member: Some(member.into()),
        }
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}#{} ({})", self.owner, member, self.kind),
            None => write!(f, "{} ({})", self.owner, self.kind),
        }
    }
}

/// 声明上的一个标记实例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerInstance {
    /// 标记类型
    #[serde(rename = "name")]
    pub marker: MarkerType,
    /// 标记属性
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl MarkerInstance {
    pub fn new(marker: MarkerType) -> Self {
        Self {
            marker,
            attributes: BTreeMap::new(),
        }
    }

    /// 设置属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// 读取逗号分隔的列表属性
    pub fn list_attribute(&self, key: &str) -> Vec<String> {
        self.attribute(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 扫描器提供的声明，只读输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// 声明身份
    #[serde(flatten)]
    pub id: DeclarationId,
    /// 标记实例
    #[serde(default)]
    pub markers: Vec<MarkerInstance>,
    /// 是否仅在测试模式下处理
    #[serde(default)]
    pub test_only: bool,
}

impl Declaration {
    pub fn new(id: DeclarationId) -> Self {
        Self {
            id,
            markers: Vec::new(),
            test_only: false,
        }
    }

    pub fn with_marker(mut self, marker: MarkerInstance) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_test_only(mut self, test_only: bool) -> Self {
        self.test_only = test_only;
        self
    }

    /// 所属类型
    pub fn owner(&self) -> &TypeName {
        &self.id.owner
    }

    /// 查找指定类型的标记实例
    pub fn marker(&self, marker: &MarkerType) -> Option<&MarkerInstance> {
        self.markers.iter().find(|m| &m.marker == marker)
    }

    pub fn has_marker(&self, marker: &MarkerType) -> bool {
        self.marker(marker).is_some()
    }
}
