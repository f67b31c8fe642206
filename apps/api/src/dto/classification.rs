use classgate_application::CatalogEntry;
use classgate_core::AppError;
use classgate_domain::ClassificationNode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// API representation of a classification node.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/classification-node-response.ts"
)]
pub struct ClassificationNodeResponse {
    pub code: String,
    pub parent_code: Option<String>,
    pub section: String,
    pub title: Option<String>,
}

impl From<ClassificationNode> for ClassificationNodeResponse {
    fn from(node: ClassificationNode) -> Self {
        Self {
            code: node.code().as_str().to_owned(),
            parent_code: node.parent_code().map(|code| code.as_str().to_owned()),
            section: node.section().as_str().to_owned(),
            title: node.title().map(ToOwned::to_owned),
        }
    }
}

/// A node listed while browsing the tree.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalog-entry-response.ts"
)]
pub struct CatalogEntryResponse {
    pub code: String,
    pub parent_code: Option<String>,
    pub section: String,
    pub title: Option<String>,
    /// `false` when the node only leads to accessible descendants.
    pub accessible: bool,
}

impl From<CatalogEntry> for CatalogEntryResponse {
    fn from(entry: CatalogEntry) -> Self {
        let node = ClassificationNodeResponse::from(entry.node);
        Self {
            code: node.code,
            parent_code: node.parent_code,
            section: node.section,
            title: node.title,
            accessible: entry.accessible,
        }
    }
}

/// Codes in one subtree.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/descendant-codes-response.ts"
)]
pub struct DescendantCodesResponse {
    pub code: String,
    pub include_self: bool,
    pub codes: Vec<String>,
}

/// One node of an import batch.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/classification-node-input.ts"
)]
pub struct ClassificationNodeInput {
    pub code: String,
    pub parent_code: Option<String>,
    /// Defaults to the first character of the code.
    pub section: Option<String>,
    pub title: Option<String>,
}

impl TryFrom<ClassificationNodeInput> for ClassificationNode {
    type Error = AppError;

    fn try_from(input: ClassificationNodeInput) -> Result<Self, Self::Error> {
        let section = match input.section.filter(|value| !value.trim().is_empty()) {
            Some(section) => section,
            None => input
                .code
                .trim()
                .chars()
                .next()
                .map(String::from)
                .unwrap_or_default(),
        };

        let parent_code = input.parent_code.filter(|value| !value.trim().is_empty());
        ClassificationNode::new(input.code, parent_code, section, input.title)
    }
}

/// Incoming payload for tree import.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/import-classification-tree-request.ts"
)]
pub struct ImportClassificationTreeRequest {
    pub nodes: Vec<ClassificationNodeInput>,
}

impl ImportClassificationTreeRequest {
    /// Converts every input node, failing on the first invalid one.
    pub fn into_nodes(self) -> Result<Vec<ClassificationNode>, AppError> {
        self.nodes
            .into_iter()
            .map(ClassificationNode::try_from)
            .collect()
    }
}

/// Result of a tree import.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/import-classification-tree-response.ts"
)]
pub struct ImportClassificationTreeResponse {
    pub written: usize,
}
