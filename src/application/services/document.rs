//! Document loading
//!
//! Reads a TOML node description through the filesystem boundary and builds
//! the document tree.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{NodeSpec, TreeArena, TreeBuilder};
use crate::infrastructure::traits::FileSystem;

/// Service for loading annotated documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    strict_expressions: bool,
}

impl DocumentService {
    /// Create a new document service.
    pub fn new(fs: Arc<dyn FileSystem>, strict_expressions: bool) -> Self {
        Self {
            fs,
            strict_expressions,
        }
    }

    /// Load and build the document at `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<TreeArena> {
        let problem = if !self.fs.exists(path) {
            Some("file not found")
        } else if !self.fs.is_file(path) {
            Some("not a file")
        } else {
            None
        };
        if let Some(message) = problem {
            return Err(ApplicationError::Document {
                path: path.to_path_buf(),
                message: message.to_string(),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        self.parse(&content, path)
    }

    /// Build a document from TOML `content`; `origin` is used in error messages.
    pub fn parse(&self, content: &str, origin: &Path) -> ApplicationResult<TreeArena> {
        let spec: NodeSpec = toml::from_str(content).map_err(|e| ApplicationError::Document {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        let tree = TreeBuilder::new()
            .strict_expressions(self.strict_expressions)
            .build(&spec)?;
        debug!("loaded {}: {} nodes", origin.display(), tree.len());
        Ok(tree)
    }
}
