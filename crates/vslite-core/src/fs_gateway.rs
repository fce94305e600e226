//! Filesystem-backed Storage Gateway.
//!
//! Reads and writes go through `tokio::fs`. Choosing a path is delegated to a
//! `FileDialogs` implementation, so the same gateway serves a desktop front
//! end or a scripted session.

use chrono::{Local, Utc};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use crate::gateway::{
    AppendLineRequest, AppendLineResponse, FileFilter, OpenFileRequest, OpenFileResponse,
    PickResponse, SaveFileRequest, SaveFileResponse, StorageGateway, WindowCommand,
};

/// Chooses paths on the user's behalf. `None` means the dialog was cancelled.
pub trait FileDialogs {
    fn pick_open(&mut self, filters: &[FileFilter]) -> Option<PathBuf>;
    fn pick_save(&mut self, default_name: &str, filters: &[FileFilter]) -> Option<PathBuf>;
    fn pick_markdown(&mut self) -> Option<PathBuf>;
    fn pick_folder(&mut self) -> Option<PathBuf>;
}

/// Dialogs answered from a queue of preset picks.
///
/// Each dialog takes the next answer; an empty queue cancels.
#[derive(Debug, Clone, Default)]
pub struct QueuedDialogs {
    answers: VecDeque<Option<PathBuf>>,
}

impl QueuedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a path for the next dialog.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.answers.push_back(Some(path.into()));
    }

    /// Queues a cancel for the next dialog.
    pub fn push_cancel(&mut self) {
        self.answers.push_back(None);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    fn next(&mut self) -> Option<PathBuf> {
        self.answers.pop_front().flatten()
    }
}

impl FileDialogs for QueuedDialogs {
    fn pick_open(&mut self, _filters: &[FileFilter]) -> Option<PathBuf> {
        self.next()
    }

    fn pick_save(&mut self, _default_name: &str, _filters: &[FileFilter]) -> Option<PathBuf> {
        self.next()
    }

    fn pick_markdown(&mut self) -> Option<PathBuf> {
        self.next()
    }

    fn pick_folder(&mut self) -> Option<PathBuf> {
        self.next()
    }
}

/// Tracked window chrome state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowState {
    pub minimized: bool,
    pub maximized: bool,
    pub closed: bool,
}

impl WindowState {
    fn apply(&mut self, command: WindowCommand) {
        match command {
            WindowCommand::Minimize => self.minimized = true,
            WindowCommand::Maximize => self.maximized = !self.maximized,
            WindowCommand::Close => self.closed = true,
        }
    }
}

/// Heading used for new export files unless configured otherwise.
pub const DEFAULT_HEADER_TITLE: &str = "Saved Content";

/// Storage Gateway over the local filesystem.
#[derive(Debug)]
pub struct FsGateway<D: FileDialogs> {
    dialogs: D,
    window: WindowState,
    header_title: String,
}

impl<D: FileDialogs> FsGateway<D> {
    pub fn new(dialogs: D) -> Self {
        Self {
            dialogs,
            window: WindowState::default(),
            header_title: DEFAULT_HEADER_TITLE.to_string(),
        }
    }

    /// Sets the heading written at the top of new export files.
    pub fn with_header_title(mut self, title: impl Into<String>) -> Self {
        self.header_title = title.into();
        self
    }

    pub fn dialogs_mut(&mut self) -> &mut D {
        &mut self.dialogs
    }

    pub fn window_state(&self) -> WindowState {
        self.window
    }

    async fn pick(path: Option<PathBuf>) -> PickResponse {
        let Some(path) = path else {
            return PickResponse::default();
        };

        match tokio::fs::metadata(&path).await {
            Ok(meta) => PickResponse {
                ok: true,
                path: Some(path),
                is_file: meta.is_file(),
                is_directory: meta.is_dir(),
                error: None,
            },
            Err(e) => {
                tracing::error!("Cannot inspect {}: {}", path.display(), e);
                PickResponse {
                    error: Some(e.to_string()),
                    ..PickResponse::default()
                }
            }
        }
    }

    async fn append(&self, request: &AppendLineRequest) -> io::Result<PathBuf> {
        let path = match (&request.target_file, &request.save_path) {
            (Some(target), _) => target.clone(),
            (None, Some(dir)) => dir.join(export_file_name()),
            (None, None) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "no save path or target file configured",
                ))
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut text = if tokio::fs::try_exists(&path).await? {
            tokio::fs::read_to_string(&path).await?
        } else {
            export_header(&self.header_title)
        };

        if request.add_newline {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&request.content);
            text.push_str("\n\n");
        } else {
            text.push_str(&request.content);
        }

        tokio::fs::write(&path, text).await?;
        Ok(path)
    }
}

/// Name of a generated export file, e.g. `saved-content-2024-05-01T09-30-00-123Z.md`.
pub fn export_file_name() -> String {
    format!(
        "saved-content-{}.md",
        Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

/// First lines of a new export file.
pub fn export_header(title: &str) -> String {
    format!(
        "# {}\n\nCreated: {}\n\n",
        title,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

impl<D: FileDialogs> StorageGateway for FsGateway<D> {
    async fn open_file_dialog(&mut self, request: OpenFileRequest) -> OpenFileResponse {
        let Some(path) = self.dialogs.pick_open(&request.filters) else {
            return OpenFileResponse::default();
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => OpenFileResponse {
                ok: true,
                name: file_name(&path),
                path: Some(path),
                content: Some(content),
                error: None,
            },
            Err(e) => {
                tracing::error!("Error reading {}: {}", path.display(), e);
                OpenFileResponse {
                    error: Some(e.to_string()),
                    ..OpenFileResponse::default()
                }
            }
        }
    }

    async fn save_file(&mut self, request: SaveFileRequest) -> SaveFileResponse {
        let (path, renamed) = match request.path {
            Some(path) => (path, false),
            None => {
                let filters = FileFilter::save_defaults();
                match self.dialogs.pick_save(&request.name, &filters) {
                    Some(path) => (path, true),
                    None => return SaveFileResponse::default(),
                }
            }
        };

        match tokio::fs::write(&path, &request.content).await {
            Ok(()) => SaveFileResponse {
                ok: true,
                name: if renamed { file_name(&path) } else { None },
                path: Some(path),
                error: None,
            },
            Err(e) => {
                tracing::error!("Error saving {}: {}", path.display(), e);
                SaveFileResponse {
                    error: Some(e.to_string()),
                    ..SaveFileResponse::default()
                }
            }
        }
    }

    async fn pick_markdown_file(&mut self) -> PickResponse {
        let path = self.dialogs.pick_markdown();
        Self::pick(path).await
    }

    async fn pick_folder(&mut self) -> PickResponse {
        let path = self.dialogs.pick_folder();
        Self::pick(path).await
    }

    async fn append_line_content(&mut self, request: AppendLineRequest) -> AppendLineResponse {
        match self.append(&request).await {
            Ok(path) => AppendLineResponse {
                ok: true,
                file_path: Some(path),
                error: None,
            },
            Err(e) => {
                tracing::error!("Error saving line content: {}", e);
                AppendLineResponse {
                    ok: false,
                    file_path: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn window(&mut self, command: WindowCommand) {
        tracing::debug!("Window command {:?}", command);
        self.window.apply(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn gateway() -> FsGateway<QueuedDialogs> {
        FsGateway::new(QueuedDialogs::new())
    }

    fn line(content: &str, add_newline: bool) -> AppendLineRequest {
        AppendLineRequest {
            content: content.into(),
            save_path: None,
            target_file: None,
            add_newline,
        }
    }

    #[test]
    fn test_export_file_name_shape() {
        let name = export_file_name();
        assert!(name.starts_with("saved-content-"));
        assert!(name.ends_with("Z.md"));
        assert!(!name.contains(':'));
        // saved-content-YYYY-MM-DDTHH-MM-SS-mmmZ.md
        assert_eq!(name.len(), "saved-content-".len() + 24 + ".md".len());
    }

    #[tokio::test]
    async fn test_append_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let mut gw = gateway();

        let mut request = line("hello", false);
        request.save_path = Some(dir.path().join("exports"));
        let response = gw.append_line_content(request).await;

        assert!(response.ok);
        let path = response.file_path.unwrap();
        assert_eq!(path.parent(), Some(dir.path().join("exports").as_path()));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Saved Content\n\nCreated: "));
        assert!(text.ends_with("\n\nhello"));
    }

    #[tokio::test]
    async fn test_append_newline_rules() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("notes.md");
        std::fs::write(&target, "start").unwrap();
        let mut gw = gateway();

        let mut request = line("one", true);
        request.target_file = Some(target.clone());
        assert!(gw.append_line_content(request).await.ok);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "start\none\n\n");

        let mut request = line("two", false);
        request.target_file = Some(target.clone());
        // A target file wins over a save path
        request.save_path = Some(dir.path().join("elsewhere"));
        assert!(gw.append_line_content(request).await.ok);
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "start\none\n\ntwo"
        );
        assert!(!dir.path().join("elsewhere").exists());
    }

    #[tokio::test]
    async fn test_append_without_destination_fails() {
        let response = gateway().append_line_content(line("x", false)).await;
        assert!(!response.ok);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_custom_header_title() {
        let dir = tempdir().unwrap();
        let mut gw = gateway().with_header_title("Journal");
        let mut request = line("x", true);
        request.target_file = Some(dir.path().join("j.md"));
        gw.append_line_content(request).await;

        let text = std::fs::read_to_string(dir.path().join("j.md")).unwrap();
        assert!(text.starts_with("# Journal\n"));
        assert!(text.ends_with("\n\nx\n\n"));
    }

    #[tokio::test]
    async fn test_open_and_cancel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.py");
        std::fs::write(&path, "print(1)").unwrap();

        let mut gw = gateway();
        gw.dialogs_mut().push(&path);
        gw.dialogs_mut().push_cancel();
        gw.dialogs_mut().push(dir.path().join("missing.txt"));

        let opened = gw.open_file_dialog(OpenFileRequest::default()).await;
        assert!(opened.ok);
        assert_eq!(opened.name.as_deref(), Some("a.py"));
        assert_eq!(opened.content.as_deref(), Some("print(1)"));

        let cancelled = gw.open_file_dialog(OpenFileRequest::default()).await;
        assert!(!cancelled.ok && cancelled.error.is_none());

        let failed = gw.open_file_dialog(OpenFileRequest::default()).await;
        assert!(!failed.ok && failed.error.is_some());
    }

    #[tokio::test]
    async fn test_save_as_reports_name() {
        let dir = tempdir().unwrap();
        let mut gw = gateway();
        gw.dialogs_mut().push(dir.path().join("out.js"));

        let response = gw
            .save_file(SaveFileRequest {
                path: None,
                name: "Untitled-1".into(),
                content: "let x;".into(),
            })
            .await;

        assert!(response.ok);
        assert_eq!(response.name.as_deref(), Some("out.js"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.js")).unwrap(),
            "let x;"
        );

        // Existing path: no dialog, no rename
        let response = gw
            .save_file(SaveFileRequest {
                path: Some(dir.path().join("out.js")),
                name: "out.js".into(),
                content: "let y;".into(),
            })
            .await;
        assert!(response.ok);
        assert!(response.name.is_none());
    }

    #[tokio::test]
    async fn test_pick_reports_kind() {
        let dir = tempdir().unwrap();
        let mut gw = gateway();
        gw.dialogs_mut().push(dir.path());

        let pick = gw.pick_folder().await;
        assert!(pick.ok && pick.is_directory && !pick.is_file);

        let pick = gw.pick_markdown_file().await;
        assert!(!pick.ok && pick.error.is_none());
    }

    #[tokio::test]
    async fn test_window_maximize_toggles() {
        let mut gw = gateway();
        gw.window(WindowCommand::Maximize).await;
        assert!(gw.window_state().maximized);
        gw.window(WindowCommand::Maximize).await;
        assert!(!gw.window_state().maximized);
        gw.window(WindowCommand::Close).await;
        assert!(gw.window_state().closed);
    }
}
