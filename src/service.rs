/*!
 * Request/response contracts for listing directories and reading files
 *
 * Transports (HTTP, stdio, ...) only need to move these JSON shapes.
 */

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::ContentProvider;
use crate::error::{ConcatError, Result};
use crate::policy::normalize;
use crate::types::PathEntry;
use crate::utils::file_name_of;
use crate::walker::DirectoryWalker;
use crate::ensure;

/// List directory request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDirectoryRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

/// List directory response: `{success, entries}` or `{success, error}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDirectoryResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<PathEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListDirectoryResponse {
    pub fn ok(entries: Vec<PathEntry>) -> Self {
        Self {
            success: true,
            entries: Some(entries),
            error: None,
        }
    }

    pub fn err(error: &ConcatError) -> Self {
        Self {
            success: false,
            entries: None,
            error: Some(error.to_string()),
        }
    }
}

/// Read file request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFileRequest {
    pub path: String,
}

/// Read file response: `{success, content}` or `{success, error}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadFileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadFileResponse {
    pub fn ok(content: String) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
        }
    }

    pub fn err(error: &ConcatError) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.to_string()),
        }
    }
}

/// Serves list and read requests on top of a [`DirectoryWalker`]
#[derive(Debug, Clone)]
pub struct FileService {
    walker: DirectoryWalker,
}

impl FileService {
    pub fn new(walker: DirectoryWalker) -> Self {
        Self { walker }
    }

    pub fn walker(&self) -> &DirectoryWalker {
        &self.walker
    }

    /// Handle a list directory request
    pub fn list_directory(&self, request: &ListDirectoryRequest) -> ListDirectoryResponse {
        let result = (|| -> Result<Vec<PathEntry>> {
            ensure!(!request.path.trim().is_empty(), Validation, "No path provided");
            self.walker.list(Path::new(request.path.trim()), request.recursive)
        })();

        match result {
            Ok(entries) => ListDirectoryResponse::ok(entries),
            Err(e) => {
                log::warn!("List directory failed for {}: {}", request.path, e);
                ListDirectoryResponse::err(&e)
            }
        }
    }

    /// Handle a read file request
    pub fn read_file(&self, request: &ReadFileRequest) -> ReadFileResponse {
        match self.read_text(Path::new(request.path.trim())) {
            Ok(content) => ReadFileResponse::ok(content),
            Err(e) => {
                log::warn!("Read file failed for {}: {}", request.path, e);
                ReadFileResponse::err(&e)
            }
        }
    }

    /// Handle a JSON-encoded request, dispatching on `op` (`list` or `read`)
    pub fn handle_json(&self, op: &str, body: &str) -> Result<String> {
        let response = match op {
            "list" => {
                let request: ListDirectoryRequest = serde_json::from_str(body)?;
                serde_json::to_string(&self.list_directory(&request))?
            }
            "read" => {
                let request: ReadFileRequest = serde_json::from_str(body)?;
                serde_json::to_string(&self.read_file(&request))?
            }
            other => {
                return Err(ConcatError::Validation(format!("Unknown operation: {other}")));
            }
        };
        Ok(response)
    }

    /// Read a text file after policy, type and kind checks
    pub fn read_text(&self, path: &Path) -> Result<String> {
        ensure!(!path.as_os_str().is_empty(), Validation, "No path provided");

        let path = normalize(path);
        if !self.walker.policy().is_allowed(&path) {
            return Err(ConcatError::AccessDenied(path));
        }
        if !self.walker.classifier().is_text_file(&file_name_of(&path)) {
            return Err(ConcatError::NotText(path));
        }

        self.walker.check_target(&path)?;
        let metadata = fs::metadata(&path).map_err(|e| ConcatError::from_io(&path, e))?;
        if metadata.is_dir() {
            return Err(ConcatError::IsDirectory(path));
        }

        let content = fs::read_to_string(&path).map_err(|e| ConcatError::from_io(&path, e))?;
        log::debug!("Read file {} ({} bytes)", path.display(), content.len());
        Ok(content)
    }
}

impl ContentProvider for FileService {
    fn fetch(&self, path: &Path) -> Result<String> {
        self.read_text(path)
    }
}
