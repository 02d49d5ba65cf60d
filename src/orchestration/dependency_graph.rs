//! # Task Dependency Graph
//!
//! Arena-backed dependency graph over a team's open tasks. Nodes are indexed
//! positions into the arena; edges are index lists in both directions.
//! Critical-path computation runs a single memoized pass in topological order
//! and reconstructs the actual node sequence. Cycle detection is explicit and
//! happens before any path computation.

use std::collections::HashMap;

use crate::models::TeamTask;

/// A cycle among task ids; computation refuses to proceed past one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dependency cycle among tasks {task_ids:?}")]
pub struct CycleError {
    pub task_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub task_id: i64,
    pub duration_hours: f64,
    /// Indices of predecessor nodes.
    pub dependencies: Vec<usize>,
    /// Indices of successor nodes (reverse edge set).
    pub dependents: Vec<usize>,
}

/// The longest dependency chain by summed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalPath {
    /// Task ids in execution order.
    pub task_ids: Vec<i64>,
    pub duration_hours: f64,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<i64, usize>,
}

impl DependencyGraph {
    /// Build the graph from a set of tasks. Dependency references pointing
    /// outside the set (completed or foreign tasks) are ignored; only edges
    /// between tasks in the set constrain the schedule.
    pub fn build(tasks: &[TeamTask]) -> Self {
        let index: HashMap<i64, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.task_id, i))
            .collect();

        let mut nodes: Vec<GraphNode> = tasks
            .iter()
            .map(|t| GraphNode {
                task_id: t.task_id,
                duration_hours: t.estimated_hours.unwrap_or(0.0),
                dependencies: Vec::new(),
                dependents: Vec::new(),
            })
            .collect();

        for (i, task) in tasks.iter().enumerate() {
            for dep_id in &task.depends_on {
                if let Some(&dep_idx) = index.get(dep_id) {
                    nodes[i].dependencies.push(dep_idx);
                    nodes[dep_idx].dependents.push(i);
                }
            }
        }

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &GraphNode {
        &self.nodes[idx]
    }

    pub fn index_of(&self, task_id: i64) -> Option<usize> {
        self.index.get(&task_id).copied()
    }

    /// Number of direct dependents of a task.
    pub fn dependent_count(&self, task_id: i64) -> usize {
        self.index_of(task_id)
            .map(|idx| self.nodes[idx].dependents.len())
            .unwrap_or(0)
    }

    /// Kahn's algorithm. Returns node indices with every predecessor ordered
    /// before its successors, or the ids stuck in a cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>, CycleError> {
        let mut indegree: Vec<usize> = self.nodes.iter().map(|n| n.dependencies.len()).collect();
        let mut ready: Vec<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(idx) = ready.pop() {
            order.push(idx);
            for &dependent in &self.nodes[idx].dependents {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.push(dependent);
                }
            }
        }

        if order.len() != self.nodes.len() {
            let task_ids = indegree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| self.nodes[i].task_id)
                .collect();
            return Err(CycleError { task_ids });
        }
        Ok(order)
    }

    /// Longest path by summed duration, with the node sequence reconstructed.
    ///
    /// One pass in topological order: each node's earliest finish is its
    /// duration plus the max finish among predecessors; the argmax predecessor
    /// is recorded for path reconstruction. Empty graphs yield an empty path.
    pub fn critical_path(&self) -> Result<CriticalPath, CycleError> {
        let order = self.topological_order()?;
        if order.is_empty() {
            return Ok(CriticalPath {
                task_ids: Vec::new(),
                duration_hours: 0.0,
            });
        }

        let mut finish = vec![0.0_f64; self.nodes.len()];
        let mut best_pred: Vec<Option<usize>> = vec![None; self.nodes.len()];

        for &idx in &order {
            let mut longest_pred = 0.0_f64;
            for &dep in &self.nodes[idx].dependencies {
                if finish[dep] > longest_pred {
                    longest_pred = finish[dep];
                    best_pred[idx] = Some(dep);
                }
            }
            finish[idx] = longest_pred + self.nodes[idx].duration_hours;
        }

        let end = (0..self.nodes.len())
            .max_by(|&a, &b| finish[a].total_cmp(&finish[b]))
            .expect("graph is non-empty");

        let mut path = Vec::new();
        let mut cursor = Some(end);
        while let Some(idx) = cursor {
            path.push(self.nodes[idx].task_id);
            cursor = best_pred[idx];
        }
        path.reverse();

        Ok(CriticalPath {
            task_ids: path,
            duration_hours: finish[end],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{TaskPriority, TaskStatus};

    fn task(task_id: i64, hours: f64, depends_on: Vec<i64>) -> TeamTask {
        let now = Utc::now();
        TeamTask {
            task_id,
            team_id: 1,
            deal_id: None,
            title: format!("task {task_id}"),
            description: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::NotStarted,
            estimated_hours: Some(hours),
            actual_hours: None,
            assignee_id: None,
            depends_on,
            due_date: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn chain_path_is_full_sequence() {
        let tasks = vec![
            task(1, 4.0, vec![]),
            task(2, 8.0, vec![1]),
            task(3, 2.0, vec![2]),
        ];
        let path = DependencyGraph::build(&tasks).critical_path().unwrap();
        assert_eq!(path.task_ids, vec![1, 2, 3]);
        assert_eq!(path.duration_hours, 14.0);
    }

    #[test]
    fn diamond_takes_the_longer_branch() {
        // 1 -> {2 (10h), 3 (2h)} -> 4
        let tasks = vec![
            task(1, 1.0, vec![]),
            task(2, 10.0, vec![1]),
            task(3, 2.0, vec![1]),
            task(4, 1.0, vec![2, 3]),
        ];
        let path = DependencyGraph::build(&tasks).critical_path().unwrap();
        assert_eq!(path.task_ids, vec![1, 2, 4]);
        assert_eq!(path.duration_hours, 12.0);
    }

    #[test]
    fn cycle_is_detected_not_recursed() {
        let tasks = vec![task(1, 1.0, vec![2]), task(2, 1.0, vec![1])];
        let err = DependencyGraph::build(&tasks).critical_path().unwrap_err();
        assert_eq!(err.task_ids.len(), 2);
    }

    #[test]
    fn cycle_reachable_from_two_entry_points_is_detected() {
        // Two independent roots feed the same 3-4-5 cycle.
        let tasks = vec![
            task(1, 1.0, vec![]),
            task(2, 1.0, vec![]),
            task(3, 1.0, vec![1, 5]),
            task(4, 1.0, vec![3, 2]),
            task(5, 1.0, vec![4]),
        ];
        let err = DependencyGraph::build(&tasks).critical_path().unwrap_err();
        assert!(err.task_ids.contains(&3));
        assert!(err.task_ids.contains(&4));
        assert!(err.task_ids.contains(&5));
    }

    #[test]
    fn external_dependencies_are_ignored() {
        let tasks = vec![task(1, 1.0, vec![99]), task(2, 2.0, vec![1])];
        let path = DependencyGraph::build(&tasks).critical_path().unwrap();
        assert_eq!(path.task_ids, vec![1, 2]);
    }

    #[test]
    fn empty_graph_has_empty_path() {
        let path = DependencyGraph::build(&[]).critical_path().unwrap();
        assert!(path.task_ids.is_empty());
        assert_eq!(path.duration_hours, 0.0);
    }
}
