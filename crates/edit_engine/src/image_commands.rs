//! Image commands for inserting void image blocks

use crate::command::resolve_selection;
use crate::{Command, CommandResult, RestoreState};
use doc_model::{validate_url, Block, DocumentTree, ImageNode, Run, Selection};
use serde::{Deserialize, Serialize};

/// Insert a void image after the block holding the caret.
///
/// The caret advances past the image; when the image would become the last
/// body child an empty paragraph is appended behind it so editing can
/// continue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertImage {
    pub url: String,
}

impl InsertImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Command for InsertImage {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> crate::Result<CommandResult> {
        validate_url(&self.url)
            .map_err(|e| crate::EditError::InvalidCommand(format!("Invalid image URL: {}", e)))?;

        let resolved = resolve_selection(tree, selection)?;
        let top_id = tree
            .top_level_of(resolved.end.block_id)
            .ok_or_else(|| {
                crate::EditError::ExecutionFailed("Selection outside the body".to_string())
            })?;
        let body_index = tree.body_index_of(top_id).ok_or_else(|| {
            crate::EditError::ExecutionFailed("Selection outside the body".to_string())
        })?;

        let mut new_tree = tree.clone();
        let image_index = body_index + 1;
        new_tree.insert_body_image(image_index, ImageNode::new(&self.url));

        // Land the caret on the block after the image.
        let after_index = image_index + 1;
        let caret_block = match new_tree.body().get(after_index).copied() {
            Some(next_id)
                if new_tree
                    .get_block(next_id)
                    .map(|b| b.kind.holds_inline_content())
                    .unwrap_or(false) =>
            {
                next_id
            }
            _ => {
                let para_id = new_tree.insert_body_block(after_index, Block::paragraph());
                new_tree.insert_run(Run::new(""), para_id, None)?;
                para_id
            }
        };

        Ok(CommandResult {
            tree: new_tree,
            selection: Selection::at_start_of(caret_block),
            inverse: Box::new(RestoreState {
                tree: tree.clone(),
                selection: *selection,
            }),
        })
    }

    fn display_name(&self) -> &str {
        "Insert Image"
    }

    fn clone_box(&self) -> Box<dyn Command> {
        Box::new(self.clone())
    }
}
