// ============================================================================
// MarkFlow - 依赖图与排序引擎
// ============================================================================
//
// 文件: src/core/graph.rs
// 职责: 单元依赖图构建、反向依赖索引与容忍循环的处理顺序计算
// 边界:
//   - ✅ 正向依赖（单元 -> 所需单元）与反向依赖索引
//   - ✅ 循环依赖检测（Tarjan 强连通分量）
//   - ✅ 分阶段处理顺序计算，遇到循环时逐个释放
//   - ❌ 不应包含委托处理逻辑
//   - ❌ 不应包含单元合并逻辑
//
// 算法设计:
// 1. 节点按单元插入顺序加入 petgraph 图，边方向为 依赖 -> 依赖方
// 2. 未知单元的依赖保留在单元上，但不参与排序
// 3. 每一轮按插入顺序收集所有依赖均已入阶段的单元作为一个阶段
// 4. 某一轮没有可入阶段的单元时（存在循环），在剩余依赖全部位于自身强连通
//    分量内的单元中释放剩余依赖最少的一个，并记录为放宽
//
// ============================================================================

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};

use crate::models::unit::{SortUnit, UnitKey};

/// 处理顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingOrder {
    /// 分阶段结果，同一阶段内按插入顺序
    pub stages: Vec<Vec<UnitKey>>,
    /// 为打破循环而强制释放的单元
    pub relaxed: Vec<UnitKey>,
}

impl ProcessingOrder {
    /// 扁平化的处理顺序
    pub fn order(&self) -> Vec<UnitKey> {
        self.stages.iter().flatten().cloned().collect()
    }

    /// 是否因循环而放宽过依赖约束
    pub fn is_relaxed(&self) -> bool {
        !self.relaxed.is_empty()
    }
}

/// 单元依赖图
#[derive(Debug)]
pub struct DependencyGraph {
    /// 边方向：依赖 -> 依赖方，节点下标即插入顺序
    graph: DiGraph<UnitKey, ()>,
    index: HashMap<UnitKey, NodeIndex>,
    /// 单元 -> 所需的已知单元（去重、去自环）
    forward: Vec<Vec<usize>>,
    /// 单元 -> 依赖它的单元
    reverse: Vec<Vec<usize>>,
    /// 指向未知单元的依赖
    unresolved: BTreeMap<UnitKey, Vec<UnitKey>>,
}

impl DependencyGraph {
    /// 从合并后的单元构建依赖图
    pub fn build(units: &[SortUnit]) -> Self {
        let mut graph = DiGraph::with_capacity(units.len(), 0);
        let mut index = HashMap::with_capacity(units.len());
        for unit in units {
            let node = graph.add_node(unit.key.clone());
            index.insert(unit.key.clone(), node);
        }

        let mut forward = vec![Vec::new(); units.len()];
        let mut unresolved = BTreeMap::new();

        for (position, unit) in units.iter().enumerate() {
            let this = NodeIndex::new(position);
            for dependency in &unit.dependencies {
                let Some(&dep) = index.get(dependency) else {
                    unresolved
                        .entry(unit.key.clone())
                        .or_insert_with(Vec::new)
                        .push(dependency.clone());
                    continue;
                };
                if !graph.contains_edge(dep, this) {
                    graph.add_edge(dep, this, ());
                }
                if dep != this {
                    forward[position].push(dep.index());
                }
            }
        }

        // 反向索引在全部单元就绪之后一次性构建
        let mut reverse = vec![Vec::new(); units.len()];
        for (position, dependencies) in forward.iter().enumerate() {
            for &dep in dependencies {
                reverse[dep].push(position);
            }
        }

        if !unresolved.is_empty() {
            tracing::debug!(units = unresolved.len(), "units depend on unknown keys");
        }

        Self {
            graph,
            index,
            forward,
            reverse,
            unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn contains(&self, key: &UnitKey) -> bool {
        self.index.contains_key(key)
    }

    fn key(&self, position: usize) -> &UnitKey {
        &self.graph[NodeIndex::new(position)]
    }

    /// 单元所需的已知单元
    pub fn dependencies_of(&self, key: &UnitKey) -> Vec<&UnitKey> {
        self.index
            .get(key)
            .map(|node| {
                self.forward[node.index()]
                    .iter()
                    .map(|&p| self.key(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 依赖该单元的单元（按插入顺序）
    pub fn dependents_of(&self, key: &UnitKey) -> Vec<&UnitKey> {
        self.index
            .get(key)
            .map(|node| {
                self.reverse[node.index()]
                    .iter()
                    .map(|&p| self.key(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 指向未知单元的依赖
    pub fn unresolved(&self) -> &BTreeMap<UnitKey, Vec<UnitKey>> {
        &self.unresolved
    }

    /// 检测循环依赖，成员按插入顺序排列
    pub fn cycles(&self) -> Vec<Vec<UnitKey>> {
        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || scc
                        .first()
                        .is_some_and(|&node| self.graph.contains_edge(node, node))
            })
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| n.index()).collect();
                members.sort_unstable();
                members
            })
            .collect();
        cycles.sort();

        cycles
            .into_iter()
            .map(|members| members.into_iter().map(|p| self.key(p).clone()).collect())
            .collect()
    }

    /// 每个单元所属强连通分量的编号
    fn components(&self) -> Vec<usize> {
        let mut component = vec![0; self.len()];
        for (id, scc) in tarjan_scc(&self.graph).into_iter().enumerate() {
            for node in scc {
                component[node.index()] = id;
            }
        }
        component
    }

    /// 计算处理顺序，从不失败
    pub fn processing_order(&self) -> ProcessingOrder {
        let total = self.len();
        let component = self.components();
        let mut staged = vec![false; total];
        let mut remaining = total;
        let mut order = ProcessingOrder::default();

        while remaining > 0 {
            // 检查是否所有依赖都已在前面的阶段中
            let mut current_stage: Vec<usize> = (0..total)
                .filter(|&p| !staged[p] && self.forward[p].iter().all(|&dep| staged[dep]))
                .collect();

            if current_stage.is_empty() {
                // 没有单元可以入阶段，说明存在循环依赖；
                // 只有被同一循环阻塞的单元才能被释放
                let blocking = |p: usize| self.forward[p].iter().filter(|&&dep| !staged[dep]).count();
                let in_own_cycle = |p: usize| {
                    self.forward[p]
                        .iter()
                        .all(|&dep| staged[dep] || component[dep] == component[p])
                };
                let unstaged = || (0..total).filter(|&p| !staged[p]);
                let Some(released) = unstaged()
                    .filter(|&p| in_own_cycle(p))
                    .min_by_key(|&p| (blocking(p), p))
                    .or_else(|| unstaged().min_by_key(|&p| (blocking(p), p)))
                else {
                    break;
                };
                tracing::debug!(unit = %self.key(released), "cycle relaxed");
                order.relaxed.push(self.key(released).clone());
                current_stage.push(released);
            }

            for &p in &current_stage {
                staged[p] = true;
            }
            remaining -= current_stage.len();

            tracing::trace!(stage = order.stages.len() + 1, units = current_stage.len(), "stage computed");
            order
                .stages
                .push(current_stage.into_iter().map(|p| self.key(p).clone()).collect());
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::declaration::TypeName;
    use std::collections::BTreeSet;

    fn key(name: &str) -> UnitKey {
        UnitKey::new(TypeName::new(format!("org.g.{name}")).unwrap())
    }

    fn unit(name: &str, deps: &[&str]) -> SortUnit {
        let mut unit = SortUnit::new(key(name));
        unit.dependencies = deps.iter().map(|d| key(d)).collect::<BTreeSet<_>>();
        unit
    }

    fn names(keys: &[UnitKey]) -> Vec<&str> {
        keys.iter().map(|k| k.type_name().simple_name()).collect()
    }

    #[test]
    fn chain_is_staged_in_dependency_order() {
        let units = vec![unit("C", &["B"]), unit("B", &["A"]), unit("A", &[])];
        let graph = DependencyGraph::build(&units);
        let order = graph.processing_order();

        assert_eq!(order.stages.len(), 3);
        assert_eq!(names(&order.order()), ["A", "B", "C"]);
        assert!(!order.is_relaxed());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn independent_units_share_a_stage_in_insertion_order() {
        let units = vec![unit("B", &[]), unit("A", &[]), unit("C", &["A", "B"])];
        let order = DependencyGraph::build(&units).processing_order();

        assert_eq!(order.stages.len(), 2);
        assert_eq!(names(&order.stages[0]), ["B", "A"]);
        assert_eq!(names(&order.stages[1]), ["C"]);
    }

    #[test]
    fn reverse_map_lists_dependents() {
        let units = vec![unit("A", &[]), unit("B", &["A"]), unit("C", &["A"])];
        let graph = DependencyGraph::build(&units);

        let dependents: Vec<&UnitKey> = graph.dependents_of(&key("A"));
        assert_eq!(dependents, [&key("B"), &key("C")]);
        assert_eq!(graph.dependencies_of(&key("B")), [&key("A")]);
        assert!(graph.dependents_of(&key("Missing")).is_empty());
    }

    #[test]
    fn unknown_dependencies_and_self_edges_do_not_block() {
        let units = vec![unit("A", &["Ghost", "A"]), unit("B", &["A"])];
        let graph = DependencyGraph::build(&units);
        let order = graph.processing_order();

        assert_eq!(names(&order.order()), ["A", "B"]);
        assert_eq!(graph.unresolved()[&key("A")], vec![key("Ghost")]);
        assert_eq!(graph.cycles(), vec![vec![key("A")]]);
        assert!(!order.is_relaxed());
    }

    #[test]
    fn cycle_is_broken_by_releasing_one_unit() {
        let units = vec![
            unit("A", &["B"]),
            unit("B", &["A"]),
            unit("C", &["A"]),
            unit("D", &[]),
        ];
        let graph = DependencyGraph::build(&units);
        let order = graph.processing_order();

        assert_eq!(names(&order.order()), ["D", "A", "B", "C"]);
        assert_eq!(order.relaxed, vec![key("A")]);
        assert_eq!(graph.cycles(), vec![vec![key("A"), key("B")]]);
    }

    #[test]
    fn units_waiting_on_a_cycle_are_not_released_early() {
        let units = vec![unit("C", &["A"]), unit("A", &["B"]), unit("B", &["A"])];
        let graph = DependencyGraph::build(&units);
        let order = graph.processing_order();

        assert_eq!(names(&order.order()), ["A", "C", "B"]);
        assert_eq!(order.relaxed, vec![key("A")]);
        assert_eq!(graph.cycles(), vec![vec![key("A"), key("B")]]);
    }

    #[test]
    fn order_is_deterministic() {
        let units = vec![
            unit("A", &["C"]),
            unit("B", &["A"]),
            unit("C", &["B"]),
            unit("D", &["C"]),
        ];
        let first = DependencyGraph::build(&units).processing_order();
        let second = DependencyGraph::build(&units).processing_order();
        assert_eq!(first, second);
        assert_eq!(first.order().len(), 4);
    }
}
