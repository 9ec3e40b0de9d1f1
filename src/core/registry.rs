// ============================================================================
// MarkFlow - 处理器注册表
// ============================================================================
//
// 文件: src/core/registry.rs
// 职责: 标记处理器注册与相对顺序规则求解
// 边界:
//   - ✅ 处理器注册与重复检测
//   - ✅ 顺序规则构建为偏序图
//   - ✅ 规则循环检测（Tarjan 强连通分量）
//   - ✅ 稳定拓扑排序得到发现顺序
//   - ❌ 不应包含声明扫描逻辑
//   - ❌ 不应包含单元依赖图逻辑
//
// 算法设计:
// 1. 每个已注册标记作为一个节点，节点下标即注册顺序
// 2. `X after Y` 生成边 Y -> X，`X before Y` 生成边 X -> Y
// 3. tarjan_scc 检测循环（自环同样视为循环）
// 4. 以注册顺序为最小堆键的 Kahn 排序，保证结果稳定
//
// ============================================================================

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::core::collab::MarkerHandler;
use crate::core::entry::HandlerEntry;
use crate::models::failure::RegistryError;
use crate::models::marker::{MarkerDef, MarkerType, OrderingRule, RelativeOrder};

struct Registration {
    def: MarkerDef,
    handler: Box<dyn MarkerHandler>,
    rules: Vec<OrderingRule>,
}

/// 处理器注册表
#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册不带顺序规则的处理器
    pub fn register(
        &mut self,
        def: MarkerDef,
        handler: Box<dyn MarkerHandler>,
    ) -> Result<(), RegistryError> {
        self.register_with_rules(def, handler, Vec::new())
    }

    /// 注册处理器及其相对顺序规则
    pub fn register_with_rules(
        &mut self,
        def: MarkerDef,
        handler: Box<dyn MarkerHandler>,
        rules: Vec<OrderingRule>,
    ) -> Result<(), RegistryError> {
        if self.contains(&def.marker) {
            return Err(RegistryError::DuplicateMarker(def.marker));
        }
        tracing::debug!(marker = %def.marker, rules = rules.len(), "handler registered");
        self.registrations.push(Registration { def, handler, rules });
        Ok(())
    }

    pub fn contains(&self, marker: &MarkerType) -> bool {
        self.registrations.iter().any(|r| &r.def.marker == marker)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// 已注册的标记（注册顺序）
    pub fn markers(&self) -> impl Iterator<Item = &MarkerType> {
        self.registrations.iter().map(|r| &r.def.marker)
    }

    /// 构建规则偏序图，节点权重为注册下标
    fn rule_graph(&self) -> DiGraph<usize, ()> {
        let mut graph = DiGraph::new();
        let index: HashMap<&MarkerType, NodeIndex> = self
            .registrations
            .iter()
            .enumerate()
            .map(|(i, r)| (&r.def.marker, graph.add_node(i)))
            .collect();

        for registration in &self.registrations {
            let this = index[&registration.def.marker];
            for rule in &registration.rules {
                let Some(&other) = index.get(&rule.relative_to) else {
                    tracing::warn!(
                        marker = %registration.def.marker,
                        relative_to = %rule.relative_to,
                        "ordering rule names an unregistered marker, ignored"
                    );
                    continue;
                };
                match rule.order {
                    RelativeOrder::Before => graph.add_edge(this, other, ()),
                    RelativeOrder::After => graph.add_edge(other, this, ()),
                };
            }
        }

        graph
    }

    /// 计算发现顺序（注册下标序列）
    fn resolve_order(&self) -> Result<Vec<usize>, RegistryError> {
        let graph = self.rule_graph();

        for scc in tarjan_scc(&graph) {
            let cyclic = scc.len() > 1
                || scc
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node));
            if cyclic {
                let mut members: Vec<usize> = scc.iter().map(|&node| graph[node]).collect();
                members.sort_unstable();
                let markers = members
                    .into_iter()
                    .map(|i| self.registrations[i].def.marker.clone())
                    .collect();
                return Err(RegistryError::RuleCycle(markers));
            }
        }

        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for next in graph.neighbors_directed(NodeIndex::new(i), Direction::Outgoing) {
                let j = graph[next];
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        Ok(order)
    }

    /// 按发现顺序返回标记，不消耗注册表
    pub fn discovery_order(&self) -> Result<Vec<MarkerType>, RegistryError> {
        Ok(self
            .resolve_order()?
            .into_iter()
            .map(|i| self.registrations[i].def.marker.clone())
            .collect())
    }

    /// 按发现顺序构建处理入口
    pub fn build_entries(self) -> Result<Vec<HandlerEntry>, RegistryError> {
        let order = self.resolve_order()?;
        let mut slots: Vec<Option<Registration>> =
            self.registrations.into_iter().map(Some).collect();

        Ok(order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .map(|r| HandlerEntry::new(r.def, r.handler, r.rules))
            .collect())
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.markers()).finish()
    }
}
