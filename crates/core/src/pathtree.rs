//! Install-path collision detection.
//!
//! Every deployable item of a build claims a location inside the component
//! root. Claims are inserted into one shared tree of path segments, each
//! node tagged with the environment type and platform classifier the claim
//! applies under. A claim is rejected when the exact location is already
//! taken, or when it would nest inside (or swallow) another claimed
//! location -- a deployable target must be self-contained.

use std::collections::BTreeSet;

/// Outcome classification of a single insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    Added,
    /// Two independent items claim the exact same location.
    Identical,
    /// An ancestor or descendant of the location is already claimed.
    NotSelfContained,
}

#[derive(Debug, Clone)]
pub struct InsertOutcome {
    pub node: usize,
    pub status: InsertStatus,
    pub message: Option<String>,
}

impl InsertOutcome {
    pub fn is_added(&self) -> bool {
        self.status == InsertStatus::Added
    }
}

#[derive(Debug)]
struct PathNode {
    segment: String,
    environment_type: String,
    classifier: String,
    is_target: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena-backed forest of path segments under a synthetic root. Nodes
/// reference each other by index; parent links are used to reconstruct the
/// full path for diagnostics.
#[derive(Debug)]
pub struct PathTree {
    nodes: Vec<PathNode>,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![PathNode {
                segment: String::new(),
                environment_type: String::new(),
                classifier: String::new(),
                is_target: false,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Inserts a claim for `path` under every combination of the given
    /// environment types and classifiers. Empty sets stand for the single
    /// wildcard entry `""`. The first non-`Added` outcome aborts the
    /// remaining combinations and is returned.
    pub fn insert(
        &mut self,
        environment_types: &BTreeSet<String>,
        classifiers: &BTreeSet<String>,
        path: &str,
    ) -> InsertOutcome {
        let wildcard = [String::new()];
        let environments: Vec<&str> = if environment_types.is_empty() {
            wildcard.iter().map(String::as_str).collect()
        } else {
            environment_types.iter().map(String::as_str).collect()
        };
        let classifiers: Vec<&str> = if classifiers.is_empty() {
            wildcard.iter().map(String::as_str).collect()
        } else {
            classifiers.iter().map(String::as_str).collect()
        };

        let mut last = InsertOutcome {
            node: 0,
            status: InsertStatus::Added,
            message: None,
        };
        for environment in &environments {
            for classifier in &classifiers {
                last = self.insert_single(environment, classifier, path);
                if !last.is_added() {
                    return last;
                }
            }
        }
        last
    }

    fn insert_single(&mut self, environment: &str, classifier: &str, path: &str) -> InsertOutcome {
        let mut current = 0usize;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_or_insert(current, segment, environment, classifier);
        }

        if self.nodes[current].is_target {
            let message = format!(
                "path '{}'{} is already claimed by another item",
                self.full_path(current),
                scope_suffix(environment, classifier)
            );
            return InsertOutcome {
                node: current,
                status: InsertStatus::Identical,
                message: Some(message),
            };
        }

        self.nodes[current].is_target = true;

        let mut ancestor = self.nodes[current].parent;
        while let Some(index) = ancestor {
            if self.nodes[index].is_target {
                let message = format!(
                    "path '{}' is not self-contained: ancestor '{}' is already a claimed target",
                    self.full_path(current),
                    self.full_path(index)
                );
                return InsertOutcome {
                    node: current,
                    status: InsertStatus::NotSelfContained,
                    message: Some(message),
                };
            }
            ancestor = self.nodes[index].parent;
        }

        if let Some(descendant) = self.find_target_descendant(current) {
            let message = format!(
                "path '{}' is not self-contained: descendant '{}' is already a claimed target",
                self.full_path(current),
                self.full_path(descendant)
            );
            return InsertOutcome {
                node: current,
                status: InsertStatus::NotSelfContained,
                message: Some(message),
            };
        }

        InsertOutcome {
            node: current,
            status: InsertStatus::Added,
            message: None,
        }
    }

    /// A child matches when segment and environment type are equal and the
    /// classifiers are equal or either side is blank (blank = wildcard).
    fn child_or_insert(
        &mut self,
        parent: usize,
        segment: &str,
        environment: &str,
        classifier: &str,
    ) -> usize {
        let found = self.nodes[parent].children.iter().copied().find(|&child| {
            let node = &self.nodes[child];
            node.segment == segment
                && node.environment_type == environment
                && (node.classifier == classifier
                    || node.classifier.is_empty()
                    || classifier.is_empty())
        });
        if let Some(child) = found {
            return child;
        }

        let index = self.nodes.len();
        self.nodes.push(PathNode {
            segment: segment.to_string(),
            environment_type: environment.to_string(),
            classifier: classifier.to_string(),
            is_target: false,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    fn find_target_descendant(&self, index: usize) -> Option<usize> {
        let mut stack: Vec<usize> = self.nodes[index].children.clone();
        while let Some(child) = stack.pop() {
            if self.nodes[child].is_target {
                return Some(child);
            }
            stack.extend(self.nodes[child].children.iter().copied());
        }
        None
    }

    fn full_path(&self, index: usize) -> String {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(node) = current {
            if node != 0 {
                segments.push(self.nodes[node].segment.as_str());
            }
            current = self.nodes[node].parent;
        }
        segments.reverse();
        segments.join("/")
    }
}

fn scope_suffix(environment: &str, classifier: &str) -> String {
    match (environment.is_empty(), classifier.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!(" [environment '{environment}']"),
        (true, false) => format!(" [classifier '{classifier}']"),
        (false, false) => {
            format!(" [environment '{environment}', classifier '{classifier}']")
        }
    }
}
