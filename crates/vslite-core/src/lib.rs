//! # VSLite Core
//!
//! Document, tab and editor-binding state for the VSLite shell.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Shell                             │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐│
//! │  │  Tab Strip  │ │   Keymap    │ │    Line Export      ││
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘│
//! │         │                                  │             │
//! │  ┌──────┴──────────────┐   ┌───────────────┴──────────┐ │
//! │  │  Document Registry  │◄──│  Editor Binding          │ │
//! │  └─────────────────────┘   │  (one shared editor)     │ │
//! │                            └──────────────────────────┘ │
//! │                   Storage Gateway                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry owns document content. A single editor component shows the
//! active document; its edits are pumped back to whichever document is bound.
//! File IO goes through the `StorageGateway` trait.

use std::time::Duration;

pub mod binding;
pub mod command;
pub mod component;
pub mod config;
pub mod document;
pub mod event;
pub mod export;
pub mod fs_gateway;
pub mod gateway;
pub mod keymap;
pub mod shell;
pub mod sidebar;
pub mod tabs;

pub use binding::{EditorBinding, EditorSender, StatusBar, Surface};
pub use command::Command;
pub use component::{BufferEditor, EditorComponent, KeyDisposition};
pub use config::Config;
pub use document::{Document, DocumentId, DocumentKind, DocumentRegistry};
pub use event::{EventBus, EventHandler, ShellEvent};
pub use export::{ExportConfig, ExportSettings, LineExport};
pub use fs_gateway::{FileDialogs, FsGateway, QueuedDialogs};
pub use gateway::{StorageGateway, WindowCommand};
pub use keymap::{Key, KeyPress, Keymap, Modifiers};
pub use shell::{SaveOutcome, SaveTicket, Shell};
pub use sidebar::{Sidebar, SidebarPanel};
pub use tabs::{TabClick, TabStrip, TabView};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("No active document")]
    NoActiveDocument,

    #[error("Editor not ready after {0:?}")]
    EditorNotReady(Duration),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Sample not found: {0}")]
    SampleNotFound(String),

    #[error("Storage gateway error: {0}")]
    Gateway(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for CoreError {
    fn from(e: config::ConfigError) -> Self {
        CoreError::Config(e.to_string())
    }
}
