mod catalog;
mod transform;

use serde::{Deserialize, Serialize};

pub use catalog::Catalog;
pub use transform::transform_chapter;

/// One entry of a curriculum concept tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TreeNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_targets: Vec<TreeNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter: String,
    pub title: String,
    #[serde(default)]
    pub sources: String,
    pub data: TreeNode,
}
