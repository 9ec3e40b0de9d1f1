// ============================================================================
// MarkFlow - 清单扫描器
// ============================================================================
//
// 文件: src/manifest/scanner.rs
// 职责: 基于已加载清单的标记扫描器实现
// 边界:
//   - ✅ 按标记与粒度筛选声明
//   - ✅ 包范围匹配（相等 / 前缀 / glob）
//   - ✅ 结构错误转交发现阶段
//   - ❌ 不应包含清单文件解析
//
// ============================================================================

use crate::core::collab::MarkerScanner;
use crate::manifest::loader::Manifest;
use crate::models::declaration::{Declaration, ElementKind, TypeName};
use crate::models::failure::ProcessingFailure;
use crate::models::marker::MarkerType;

/// 判断类型是否落在某个扫描范围内
///
/// 范围可以是包名（`org.app`）、包前缀（`org` 匹配 `org.app.Foo`），
/// 或者匹配全限定名的 glob 模式（`org.*.Foo`）。
pub fn scope_matches(scope: &str, type_name: &TypeName) -> bool {
    let package = type_name.package();
    if package == scope || package.starts_with(&format!("{scope}.")) {
        return true;
    }

    if scope.contains(['*', '?', '[']) {
        return glob::Pattern::new(scope)
            .map(|pattern| pattern.matches(type_name.as_str()))
            .unwrap_or(false);
    }

    false
}

/// 清单扫描器
#[derive(Debug, Clone, Default)]
pub struct ManifestScanner {
    declarations: Vec<Declaration>,
    failures: Vec<ProcessingFailure>,
}

impl ManifestScanner {
    pub fn new(manifest: &Manifest) -> Self {
        Self {
            declarations: manifest.declarations.clone(),
            failures: manifest.failures.clone(),
        }
    }
}

impl MarkerScanner for ManifestScanner {
    fn scan(&self, marker: &MarkerType, kind: ElementKind, scopes: &[String]) -> Vec<Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.id.kind == kind && d.has_marker(marker))
            .filter(|d| scopes.is_empty() || scopes.iter().any(|s| scope_matches(s, d.owner())))
            .cloned()
            .collect()
    }

    fn structural_failures(&self) -> Vec<ProcessingFailure> {
        self.failures.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::loader::ManifestFormat;
    use std::path::Path;

    fn ty(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    #[test]
    fn scopes_match_package_prefix_and_glob() {
        assert!(scope_matches("org.app", &ty("org.app.Foo")));
        assert!(scope_matches("org", &ty("org.app.Foo")));
        assert!(!scope_matches("org.ap", &ty("org.app.Foo")));
        assert!(scope_matches("org.*.Foo", &ty("org.app.Foo")));
        assert!(!scope_matches("com.app", &ty("org.app.Foo")));
    }

    #[test]
    fn scan_filters_by_marker_kind_and_scope() {
        let manifest = Manifest::parse(
            r#"{
                "markers": [{"name": "Gen"}, {"name": "Other"}],
                "declarations": [
                    {"owner": "org.app.A", "markers": [{"name": "Gen"}]},
                    {"owner": "org.app.B", "kind": "method", "member": "run", "markers": [{"name": "Gen"}]},
                    {"owner": "com.lib.C", "markers": [{"name": "Gen"}]},
                    {"owner": "org.app.D", "markers": [{"name": "Other"}]}
                ]
            }"#,
            ManifestFormat::Json,
            Path::new("m.json"),
        )
        .unwrap();
        let scanner = ManifestScanner::new(&manifest);
        let marker = MarkerType::new("Gen");

        let all = scanner.scan(&marker, ElementKind::Type, &[]);
        assert_eq!(all.len(), 2);

        let scoped = scanner.scan(&marker, ElementKind::Type, &["org.app".to_string()]);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].owner().as_str(), "org.app.A");

        assert_eq!(scanner.scan(&marker, ElementKind::Method, &[]).len(), 1);
    }
}
