//! 分类树算法
//!
//! 扁平分类表与树形结构之间的转换、祖先链检查和子树收集。
//! 所有遍历都不依赖"数据无环"的前提，损坏的父级链会被报告而不是死循环。

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::error::{CatalogError, Result};
use crate::models::{Category, CategoryNode, ModelSummary};

/// 由扁平分类表物化森林
///
/// 按 `parent_id` 分组后递归挂载子节点，每层按 (sort, id) 升序。
/// 父节点不存在的孤儿节点作为根节点处理。
pub fn build_forest<'a, I, F>(categories: I, model_of: F) -> Vec<CategoryNode>
where
    I: IntoIterator<Item = &'a Category>,
    F: Fn(i64) -> Option<ModelSummary>,
{
    let categories: Vec<&Category> = categories.into_iter().collect();
    let ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();

    let mut groups: HashMap<Option<i64>, Vec<&Category>> = HashMap::new();
    for category in categories {
        let parent = category.parent_id.filter(|p| ids.contains(p));
        groups.entry(parent).or_default().push(category);
    }
    for siblings in groups.values_mut() {
        siblings.sort_by_key(|c| (c.sort, c.id));
    }

    attach(None, &mut groups, &model_of)
}

// 每个分组只会被取走一次，环上的节点因此不可达，不会无限递归
fn attach<F>(
    parent: Option<i64>,
    groups: &mut HashMap<Option<i64>, Vec<&Category>>,
    model_of: &F,
) -> Vec<CategoryNode>
where
    F: Fn(i64) -> Option<ModelSummary>,
{
    let Some(siblings) = groups.remove(&parent) else {
        return Vec::new();
    };

    siblings
        .into_iter()
        .map(|category| {
            let model = category.model_id.and_then(model_of);
            let mut node = CategoryNode::leaf(category, model);
            node.children = attach(Some(category.id), groups, model_of);
            node
        })
        .collect()
}

/// 按名称或描述过滤森林（不区分大小写）
///
/// 节点自身匹配时保留并继续过滤其子节点；自身不匹配但有后代匹配时只保留匹配的分支。
pub fn filter_forest(nodes: &[CategoryNode], query: &str) -> Vec<CategoryNode> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return nodes.to_vec();
    }
    filter_by(nodes, &|node: &CategoryNode| {
        node.name.to_lowercase().contains(&query)
            || node.description.to_lowercase().contains(&query)
    })
}

fn filter_by<P>(nodes: &[CategoryNode], matches: &P) -> Vec<CategoryNode>
where
    P: Fn(&CategoryNode) -> bool,
{
    nodes
        .iter()
        .filter_map(|node| {
            let children = filter_by(&node.children, matches);
            if matches(node) || !children.is_empty() {
                Some(CategoryNode {
                    children,
                    ..node.clone()
                })
            } else {
                None
            }
        })
        .collect()
}

/// 剪掉未启用的节点及其整棵子树
pub fn prune_inactive(nodes: Vec<CategoryNode>) -> Vec<CategoryNode> {
    nodes
        .into_iter()
        .filter(|node| node.is_active)
        .map(|mut node| {
            node.children = prune_inactive(std::mem::take(&mut node.children));
            node
        })
        .collect()
}

/// 先序展开森林
pub fn flatten(nodes: &[CategoryNode]) -> Vec<&CategoryNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&CategoryNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }
    out
}

/// 判断 `candidate` 是否为 `node_id` 自身或其后代
///
/// 从 `candidate` 沿父级链向上迭代，步数上限为节点总数，超出即视为父级链损坏。
pub fn is_self_or_descendant(
    categories: &BTreeMap<i64, Category>,
    node_id: i64,
    candidate: i64,
) -> Result<bool> {
    let bound = categories.len() + 1;
    let mut current = Some(candidate);
    let mut steps = 0usize;

    while let Some(id) = current {
        if id == node_id {
            return Ok(true);
        }
        steps += 1;
        if steps > bound {
            return Err(CatalogError::CorruptedTree(candidate));
        }
        current = categories.get(&id).and_then(|c| c.parent_id);
    }

    Ok(false)
}

/// 收集以 `root` 为根的整棵子树的 id（含自身，广度优先）
pub fn subtree_ids(categories: &BTreeMap<i64, Category>, root: i64) -> Vec<i64> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for category in categories.values() {
        if let Some(parent) = category.parent_id {
            children.entry(parent).or_default().push(category.id);
        }
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        out.push(id);
        if let Some(kids) = children.get(&id) {
            queue.extend(kids.iter().copied());
        }
    }
    out
}

/// 某父节点下的直接子节点，按 (sort, id) 升序
pub fn siblings_of(categories: &BTreeMap<i64, Category>, parent_id: Option<i64>) -> Vec<&Category> {
    let mut siblings: Vec<&Category> = categories
        .values()
        .filter(|c| c.parent_id == parent_id)
        .collect();
    siblings.sort_by_key(|c| (c.sort, c.id));
    siblings
}
