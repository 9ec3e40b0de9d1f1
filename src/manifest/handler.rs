// ============================================================================
// MarkFlow - 清单处理器
// ============================================================================
//
// 文件: src/manifest/handler.rs
// 职责: 由标记属性驱动的参考处理器，以及从清单构建处理器注册表
// 边界:
//   - ✅ `requires` / `masquerade_as` 依赖声明
//   - ✅ `awaits` / `fail` 生成条件
//   - ✅ 生成片段输出
//   - ✅ 清单到注册表的转换
//   - ❌ 不应包含真实代码生成
//
// ============================================================================

use crate::core::collab::{
    DependencyControl, GeneratedFragment, InjectableView, MarkerHandler, ProcessingContext,
};
use crate::core::registry::HandlerRegistry;
use crate::manifest::loader::Manifest;
use crate::models::declaration::{MarkerInstance, TypeName};
use crate::models::failure::{ProcessingFailure, RegistryError};
use crate::models::unit::UnitKey;

/// 所需依赖（逗号分隔的类型名）
pub const ATTR_REQUIRES: &str = "requires";
/// 在依赖图中伪装成的类型
pub const ATTR_MASQUERADE_AS: &str = "masquerade_as";
/// 处理前必须已经生成的类型（逗号分隔）
pub const ATTR_AWAITS: &str = "awaits";
/// 强制注入失败，值作为失败原因
pub const ATTR_FAIL: &str = "fail";

/// 由标记属性驱动的处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestHandler;

impl MarkerHandler for ManifestHandler {
    fn check_dependencies(
        &self,
        control: &mut DependencyControl,
        view: &InjectableView<'_>,
        marker: &MarkerInstance,
        _ctx: &ProcessingContext,
    ) -> Result<Vec<UnitKey>, ProcessingFailure> {
        let declaration = &view.declaration.id;

        if let Some(target) = marker.attribute(ATTR_MASQUERADE_AS) {
            let target = TypeName::new(target)
                .map_err(|e| ProcessingFailure::dependency_check(declaration, e.to_string()))?;
            control.masquerade_as(target);
        }

        marker
            .list_attribute(ATTR_REQUIRES)
            .into_iter()
            .map(|name| {
                TypeName::new(name)
                    .map(UnitKey::new)
                    .map_err(|e| ProcessingFailure::dependency_check(declaration, e.to_string()))
            })
            .collect()
    }

    fn handle(
        &mut self,
        view: &InjectableView<'_>,
        marker: &MarkerInstance,
        ctx: &mut ProcessingContext,
    ) -> Result<bool, ProcessingFailure> {
        let declaration = &view.declaration.id;

        if let Some(reason) = marker.attribute(ATTR_FAIL) {
            return Err(ProcessingFailure::injection(declaration, reason));
        }

        let waiting: Vec<String> = marker
            .list_attribute(ATTR_AWAITS)
            .into_iter()
            .filter(|name| {
                TypeName::new(name.as_str())
                    .map(|type_name| !ctx.is_generated(&type_name))
                    .unwrap_or(true)
            })
            .collect();
        if !waiting.is_empty() {
            return Err(ProcessingFailure::injection(
                declaration,
                format!("waiting for {}", waiting.join(", ")),
            ));
        }

        let variable = view
            .injector
            .map(|injector| injector.variable.as_str())
            .unwrap_or("_");
        ctx.emit(GeneratedFragment {
            owner: view.owner().clone(),
            marker: marker.marker.clone(),
            content: format!("{} {} -> {}", marker.marker, declaration, variable),
        });
        Ok(true)
    }
}

/// 为清单中的每个标记注册一个清单处理器
pub fn build_registry(manifest: &Manifest) -> Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();
    for spec in &manifest.markers {
        registry.register_with_rules(spec.def(), Box::new(ManifestHandler), spec.rules())?;
    }
    Ok(registry)
}
