//! Storage Gateway: the shell's only route to files and window chrome.
//!
//! Every operation is a request/response pair. Responses carry `ok`; an
//! `ok = false` response without an `error` means the user cancelled a
//! dialog, with an `error` it means the IO failed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{CoreError, CoreResult};

/// Filter shown in file dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Filters offered by the open dialog.
    pub fn open_defaults() -> Vec<FileFilter> {
        vec![
            FileFilter::new("All Files", &["*"]),
            FileFilter::new(
                "Text Files",
                &["txt", "md", "js", "html", "css", "json", "py", "java", "cpp", "c"],
            ),
        ]
    }

    /// Filters offered by the save-as dialog.
    pub fn save_defaults() -> Vec<FileFilter> {
        vec![
            FileFilter::new("All Files", &["*"]),
            FileFilter::new("Text Files", &["txt", "md"]),
            FileFilter::new("JavaScript", &["js"]),
            FileFilter::new("HTML", &["html"]),
            FileFilter::new("CSS", &["css"]),
            FileFilter::new("JSON", &["json"]),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFileRequest {
    pub filters: Vec<FileFilter>,
}

impl Default for OpenFileRequest {
    fn default() -> Self {
        Self {
            filters: FileFilter::open_defaults(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFileResponse {
    pub ok: bool,
    pub path: Option<PathBuf>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub error: Option<String>,
}

/// Save request. Without a `path` the gateway asks for one (save-as).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFileRequest {
    pub path: Option<PathBuf>,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFileResponse {
    pub ok: bool,
    pub path: Option<PathBuf>,
    /// Set when a save-as chose a new file name
    pub name: Option<String>,
    pub error: Option<String>,
}

/// Result of a markdown-file or folder pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickResponse {
    pub ok: bool,
    pub path: Option<PathBuf>,
    pub is_file: bool,
    pub is_directory: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendLineRequest {
    pub content: String,
    pub save_path: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub add_newline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendLineResponse {
    pub ok: bool,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Window chrome buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowCommand {
    Minimize,
    /// Toggles between maximized and restored
    Maximize,
    Close,
}

/// How a failed response should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Cancelled,
    Io(String),
}

impl Failure {
    /// Classifies the `error` of a response whose `ok` is false.
    pub fn from_error(error: Option<String>) -> Self {
        match error {
            Some(e) => Failure::Io(e),
            None => Failure::Cancelled,
        }
    }

    /// A cancel is `Ok(None)`; an IO failure is a gateway error.
    pub fn into_result<T>(self) -> CoreResult<Option<T>> {
        match self {
            Failure::Cancelled => Ok(None),
            Failure::Io(e) => Err(CoreError::Gateway(e)),
        }
    }
}

/// File and window services the shell depends on.
#[allow(async_fn_in_trait)]
pub trait StorageGateway {
    /// Shows the open dialog and reads the chosen file.
    async fn open_file_dialog(&mut self, request: OpenFileRequest) -> OpenFileResponse;

    /// Writes a document, asking for a path when the request has none.
    async fn save_file(&mut self, request: SaveFileRequest) -> SaveFileResponse;

    /// Asks for an existing markdown file.
    async fn pick_markdown_file(&mut self) -> PickResponse;

    /// Asks for a folder.
    async fn pick_folder(&mut self) -> PickResponse;

    /// Appends one captured line to an export file.
    async fn append_line_content(&mut self, request: AppendLineRequest) -> AppendLineResponse;

    /// Forwards a window chrome command.
    async fn window(&mut self, command: WindowCommand);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_camel_case() {
        let request = AppendLineRequest {
            content: "hello".into(),
            save_path: Some(PathBuf::from("/tmp")),
            target_file: None,
            add_newline: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["savePath"], "/tmp");
        assert_eq!(json["addNewline"], true);
        assert!(json["targetFile"].is_null());

        let pick: PickResponse =
            serde_json::from_str(r#"{"ok":true,"path":"/x.md","isFile":true,"isDirectory":false,"error":null}"#)
                .unwrap();
        assert!(pick.is_file);
        assert_eq!(pick.path, Some(PathBuf::from("/x.md")));
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(Failure::from_error(None), Failure::Cancelled);
        assert_eq!(
            Failure::from_error(Some("denied".into())),
            Failure::Io("denied".into())
        );

        assert!(matches!(Failure::Cancelled.into_result::<()>(), Ok(None)));
        assert!(matches!(
            Failure::Io("denied".into()).into_result::<()>(),
            Err(CoreError::Gateway(e)) if e == "denied"
        ));
    }

    #[test]
    fn test_open_defaults() {
        let filters = OpenFileRequest::default().filters;
        assert_eq!(filters[0].name, "All Files");
        assert!(filters[1].extensions.iter().any(|e| e == "py"));
    }
}
