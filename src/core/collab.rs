// ============================================================================
// MarkFlow - 外部协作者接口
// ============================================================================
//
// 文件: src/core/collab.rs
// 职责: 引擎与扫描器 / 处理器 / 类型注册表之间的接口定义
// 边界:
//   - ✅ 扫描器、标记处理器、类型注册表 trait 定义
//   - ✅ 依赖控制（伪装）与声明视图定义
//   - ✅ 处理上下文与生成产物收集
//   - ✅ 内存类型注册表默认实现
//   - ❌ 不应包含具体扫描实现
//   - ❌ 不应包含具体代码生成逻辑
//
// ============================================================================

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::declaration::{Declaration, ElementKind, MarkerInstance, TypeName};
use crate::models::failure::ProcessingFailure;
use crate::models::marker::MarkerType;
use crate::models::unit::UnitKey;

/// 标记扫描器：按标记类型和粒度返回匹配的声明，对同一输入必须是确定性的
pub trait MarkerScanner {
    fn scan(&self, marker: &MarkerType, kind: ElementKind, scopes: &[String]) -> Vec<Declaration>;

    /// 扫描时无法解析的声明
    fn structural_failures(&self) -> Vec<ProcessingFailure> {
        Vec::new()
    }
}

/// 标记处理器
pub trait MarkerHandler {
    /// 计算声明所需的依赖单元，可通过 `control` 将自身伪装为其他类型
    fn check_dependencies(
        &self,
        control: &mut DependencyControl,
        view: &InjectableView<'_>,
        marker: &MarkerInstance,
        ctx: &ProcessingContext,
    ) -> Result<Vec<UnitKey>, ProcessingFailure>;

    /// 执行生成，返回 `Ok(false)` 表示暂时无法完成
    fn handle(
        &mut self,
        view: &InjectableView<'_>,
        marker: &MarkerInstance,
        ctx: &mut ProcessingContext,
    ) -> Result<bool, ProcessingFailure>;
}

/// 类型注册表
pub trait TypeRegistry {
    /// 登记一个已发现的类型，重复登记无副作用
    fn add_type(&mut self, type_name: &TypeName);

    /// 获取类型的注入器
    fn injector(&self, type_name: &TypeName) -> Option<Injector>;
}

/// 类型的注入器上下文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Injector {
    pub type_name: TypeName,
    /// 生成代码中持有该类型实例的变量名
    pub variable: String,
}

/// 内存类型注册表
#[derive(Debug, Default)]
pub struct InjectionContext {
    injectors: BTreeMap<TypeName, Injector>,
}

impl InjectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.injectors.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.injectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injectors.is_empty()
    }
}

impl TypeRegistry for InjectionContext {
    fn add_type(&mut self, type_name: &TypeName) {
        if self.injectors.contains_key(type_name) {
            return;
        }
        let variable = format!(
            "inj{}_{}",
            self.injectors.len(),
            type_name.simple_name().to_lowercase()
        );
        self.injectors.insert(
            type_name.clone(),
            Injector {
                type_name: type_name.clone(),
                variable,
            },
        );
    }

    fn injector(&self, type_name: &TypeName) -> Option<Injector> {
        self.injectors.get(type_name).cloned()
    }
}

/// 依赖控制：允许处理器声明其单元以其他类型的身份参与依赖图
#[derive(Debug, Clone)]
pub struct DependencyControl {
    masquerade: TypeName,
}

impl DependencyControl {
    pub fn new(natural: TypeName) -> Self {
        Self { masquerade: natural }
    }

    pub fn masquerade_as(&mut self, type_name: TypeName) {
        self.masquerade = type_name;
    }

    pub fn masquerade(&self) -> &TypeName {
        &self.masquerade
    }
}

/// 处理器看到的声明视图
///
/// 依赖检查时没有注入器；提交处理时携带类型注册表提供的注入器。
#[derive(Debug, Clone, Copy)]
pub struct InjectableView<'a> {
    pub declaration: &'a Declaration,
    pub kind: ElementKind,
    pub injector: Option<&'a Injector>,
}

impl<'a> InjectableView<'a> {
    pub fn dependency_check(declaration: &'a Declaration, kind: ElementKind) -> Self {
        Self {
            declaration,
            kind,
            injector: None,
        }
    }

    pub fn committed(declaration: &'a Declaration, kind: ElementKind, injector: Option<&'a Injector>) -> Self {
        Self {
            declaration,
            kind,
            injector,
        }
    }

    pub fn owner(&self) -> &TypeName {
        self.declaration.owner()
    }

    pub fn is_committed(&self) -> bool {
        self.injector.is_some()
    }
}

/// 处理器产出的生成片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFragment {
    pub owner: TypeName,
    pub marker: MarkerType,
    pub content: String,
}

/// 单次处理运行的上下文
#[derive(Debug, Clone, Default)]
pub struct ProcessingContext {
    /// 扫描的包范围
    pub packages: Vec<String>,
    /// 是否为测试模式
    pub test_mode: bool,
    generated: Vec<GeneratedFragment>,
}

impl ProcessingContext {
    pub fn new(packages: Vec<String>, test_mode: bool) -> Self {
        Self {
            packages,
            test_mode,
            generated: Vec::new(),
        }
    }

    pub fn emit(&mut self, fragment: GeneratedFragment) {
        self.generated.push(fragment);
    }

    pub fn generated(&self) -> &[GeneratedFragment] {
        &self.generated
    }

    /// 某类型是否已有生成片段
    pub fn is_generated(&self, owner: &TypeName) -> bool {
        self.generated.iter().any(|fragment| &fragment.owner == owner)
    }

    pub fn into_generated(self) -> Vec<GeneratedFragment> {
        self.generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injection_context_registers_each_type_once() {
        let mut types = InjectionContext::new();
        let foo = TypeName::new("org.app.Foo").unwrap();
        types.add_type(&foo);
        types.add_type(&foo);

        assert_eq!(types.len(), 1);
        assert_eq!(types.injector(&foo).unwrap().variable, "inj0_foo");
        assert!(types.injector(&TypeName::new("org.app.Bar").unwrap()).is_none());
    }

    #[test]
    fn dependency_control_defaults_to_natural_type() {
        let natural = TypeName::new("org.app.Foo").unwrap();
        let mut control = DependencyControl::new(natural.clone());
        assert_eq!(control.masquerade(), &natural);

        let other = TypeName::new("org.app.Bar").unwrap();
        control.masquerade_as(other.clone());
        assert_eq!(control.masquerade(), &other);
    }
}
