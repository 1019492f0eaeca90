//! Rebuilds the directory structure of a result list for display.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::SelectedEntry;

/// A directory in the result tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    pub directories: BTreeMap<String, TreeNode>,
    /// `(file name, entry identifier)` pairs.
    pub files: Vec<(String, u64)>,
}

impl TreeNode {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of files in this node and below.
    pub fn file_count(&self) -> usize {
        self.files.len()
            + self
                .directories
                .values()
                .map(TreeNode::file_count)
                .sum::<usize>()
    }
}

/// The results grouped by the directories between the search root and each file.
///
/// Built from `SelectedEntry::relative_path_segments`, so only directories that
/// contain at least one result appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTree {
    root: TreeNode,
}

impl ResultTree {
    pub fn build(root_path: &Path, entries: &[Arc<SelectedEntry>]) -> Self {
        let root_name = root_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.display().to_string());
        let mut root = TreeNode::named(root_name);

        for entry in entries {
            let mut node = &mut root;
            for segment in entry.relative_path_segments() {
                node = node
                    .directories
                    .entry(segment.clone())
                    .or_insert_with(|| TreeNode::named(segment.clone()));
            }
            node.files.push((entry.file_name(), entry.identifier()));
        }

        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Follows `segments` from the root.
    pub fn find(&self, segments: &[String]) -> Option<&TreeNode> {
        segments
            .iter()
            .try_fold(&self.root, |node, segment| node.directories.get(segment))
    }

    /// Renders an ASCII tree: directories first, then files, each by name.
    pub fn render(&self) -> String {
        let mut result = format!("{}/\n", self.root.name);
        Self::render_children(&self.root, &mut result, "");
        result
    }

    fn render_children(node: &TreeNode, result: &mut String, prefix: &str) {
        let mut files: Vec<&str> = node.files.iter().map(|(name, _)| name.as_str()).collect();
        files.sort_unstable();

        let total = node.directories.len() + files.len();
        let mut index = 0;

        for child in node.directories.values() {
            index += 1;
            let is_last = index == total;
            let connector = if is_last { "└── " } else { "├── " };
            result.push_str(&format!("{prefix}{connector}📁 {}\n", child.name));

            let new_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            Self::render_children(child, result, &new_prefix);
        }

        for name in files {
            index += 1;
            let connector = if index == total { "└── " } else { "├── " };
            result.push_str(&format!("{prefix}{connector}📄 {name}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FsMetadata;
    use std::path::PathBuf;

    fn entries(root: &str, paths: &[&str]) -> Vec<Arc<SelectedEntry>> {
        paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                Arc::new(SelectedEntry::new(
                    i as u64,
                    Path::new(root),
                    PathBuf::from(path),
                    Arc::new(FsMetadata),
                ))
            })
            .collect()
    }

    #[test]
    fn test_build_groups_files_by_segments() {
        let list = entries(
            "/photos",
            &["/photos/a.jpg", "/photos/2023/b.jpg", "/photos/2023/summer/c.jpg"],
        );
        let tree = ResultTree::build(Path::new("/photos"), &list);

        assert_eq!(tree.root().name, "photos");
        assert_eq!(tree.root().file_count(), 3);
        assert_eq!(tree.root().files, vec![("a.jpg".to_string(), 0)]);

        let summer = tree
            .find(&["2023".to_string(), "summer".to_string()])
            .unwrap();
        assert_eq!(summer.files, vec![("c.jpg".to_string(), 2)]);
        assert!(tree.find(&["2024".to_string()]).is_none());
    }

    #[test]
    fn test_render_lists_directories_before_files() {
        let list = entries("/p", &["/p/z.txt", "/p/docs/readme.md", "/p/a.txt"]);
        let tree = ResultTree::build(Path::new("/p"), &list);

        let expected = "p/\n\
                        ├── 📁 docs\n\
                        │   └── 📄 readme.md\n\
                        ├── 📄 a.txt\n\
                        └── 📄 z.txt\n";
        assert_eq!(tree.render(), expected);
    }

    #[test]
    fn test_empty_results_render_root_only() {
        let tree = ResultTree::build(Path::new("/p"), &[]);
        assert_eq!(tree.render(), "p/\n");
        assert_eq!(tree.root().file_count(), 0);
    }
}
