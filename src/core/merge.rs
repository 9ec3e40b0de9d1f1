// ============================================================================
// MarkFlow - 单元合并表
// ============================================================================
//
// 文件: src/core/merge.rs
// 职责: 将解析到同一单元键的排序单元合并为一个
// 边界:
//   - ✅ 按单元键合并条目
//   - ✅ 依赖合并策略（并集 / 首次为准）
//   - ✅ 保持插入顺序
//   - ❌ 不应包含依赖图构建
//   - ❌ 不应包含排序算法
//
// ============================================================================

use std::collections::HashMap;

use crate::models::config::DependencyMergePolicy;
use crate::models::unit::{SortUnit, UnitKey};

/// 单元合并表：每个单元键只保留一个单元
#[derive(Debug, Default)]
pub struct UnitMergeTable {
    units: Vec<SortUnit>,
    index: HashMap<UnitKey, usize>,
    policy: DependencyMergePolicy,
}

impl UnitMergeTable {
    pub fn new(policy: DependencyMergePolicy) -> Self {
        Self {
            units: Vec::new(),
            index: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DependencyMergePolicy {
        self.policy
    }

    /// 加入单元；键已存在时追加条目并按策略合并依赖
    pub fn add(&mut self, unit: SortUnit) {
        let Some(&position) = self.index.get(&unit.key) else {
            self.index.insert(unit.key.clone(), self.units.len());
            self.units.push(unit);
            return;
        };

        let existing = &mut self.units[position];
        existing.items.extend(unit.items);
        if self.policy == DependencyMergePolicy::Union {
            existing.dependencies.extend(unit.dependencies);
            existing.hard |= unit.hard;
        }
        tracing::trace!(unit = %existing.key, items = existing.items.len(), "unit merged");
    }

    pub fn get(&self, key: &UnitKey) -> Option<&SortUnit> {
        self.index.get(key).map(|&i| &self.units[i])
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.index.contains_key(key)
    }

    /// 单元在插入顺序中的位置
    pub fn position(&self, key: &UnitKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SortUnit> {
        self.units.iter()
    }

    pub fn units(&self) -> &[SortUnit] {
        &self.units
    }
}

impl<'a> IntoIterator for &'a UnitMergeTable {
    type Item = &'a SortUnit;
    type IntoIter = std::slice::Iter<'a, SortUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::declaration::TypeName;
    use crate::models::unit::DelegateRef;
    use std::collections::BTreeSet;

    fn key(name: &str) -> UnitKey {
        UnitKey::new(TypeName::new(name).unwrap())
    }

    fn unit(name: &str, index: usize, deps: &[&str]) -> SortUnit {
        SortUnit::with_item(
            key(name),
            DelegateRef { entry: 0, index },
            deps.iter().map(|d| key(d)).collect::<BTreeSet<_>>(),
        )
    }

    #[test]
    fn same_key_merges_items_in_order() {
        let mut table = UnitMergeTable::default();
        table.add(unit("org.a.U", 0, &["org.a.X"]));
        table.add(unit("org.a.V", 1, &[]));
        table.add(unit("org.a.U", 2, &["org.a.Y"]));

        assert_eq!(table.len(), 2);
        let merged = table.get(&key("org.a.U")).unwrap();
        let items: Vec<usize> = merged.items.iter().map(|r| r.index).collect();
        assert_eq!(items, [0, 2]);
        assert_eq!(table.position(&key("org.a.V")), Some(1));
    }

    #[test]
    fn union_policy_combines_dependencies() {
        let mut table = UnitMergeTable::new(DependencyMergePolicy::Union);
        table.add(unit("org.a.U", 0, &["org.a.X"]));
        table.add(unit("org.a.U", 1, &["org.a.Y"]).hard());

        let merged = table.get(&key("org.a.U")).unwrap();
        assert_eq!(merged.dependencies.len(), 2);
        assert!(merged.hard);
    }

    #[test]
    fn first_wins_policy_keeps_first_dependencies() {
        let mut table = UnitMergeTable::new(DependencyMergePolicy::FirstWins);
        table.add(unit("org.a.U", 0, &["org.a.X"]));
        table.add(unit("org.a.U", 1, &["org.a.Y"]));

        let merged = table.get(&key("org.a.U")).unwrap();
        assert_eq!(merged.dependencies.iter().collect::<Vec<_>>(), [&key("org.a.X")]);
        assert_eq!(merged.items.len(), 2);
    }

    #[test]
    fn merging_is_idempotent_on_keys() {
        let mut table = UnitMergeTable::default();
        for i in 0..5 {
            table.add(unit("org.a.U", i, &["org.a.X"]));
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key("org.a.U")).unwrap().items.len(), 5);
    }
}
