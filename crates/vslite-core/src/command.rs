//! Shell commands.
//!
//! Menu items, accelerators and the file tree all resolve to a `Command`;
//! `Shell::execute` is the single place that carries them out.

use serde::{Deserialize, Serialize};

use crate::gateway::WindowCommand;
use crate::sidebar::SidebarPanel;

/// Actions the shell can perform on request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Command {
    // File commands
    NewFile,
    OpenFile,
    Save,
    CloseTab,
    Quit,

    // Edit commands
    Undo,
    Redo,

    // Explorer
    OpenSample { key: String },
    SelectPanel(SidebarPanel),

    // Window chrome
    Window(WindowCommand),
}

impl Command {
    /// Returns the command's display name.
    pub fn display_name(&self) -> &str {
        match self {
            Command::NewFile => "New File",
            Command::OpenFile => "Open File",
            Command::Save => "Save",
            Command::CloseTab => "Close Tab",
            Command::Quit => "Exit",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::OpenSample { .. } => "Open Sample",
            Command::SelectPanel(panel) => panel.title(),
            Command::Window(WindowCommand::Minimize) => "Minimize",
            Command::Window(WindowCommand::Maximize) => "Maximize",
            Command::Window(WindowCommand::Close) => "Close Window",
        }
    }

    /// Parses a command id as written in the keyboard config.
    pub fn parse(s: &str) -> Option<Self> {
        let cmd = match s {
            "file.new" => Command::NewFile,
            "file.open" => Command::OpenFile,
            "file.save" => Command::Save,
            "tab.close" => Command::CloseTab,
            "app.quit" => Command::Quit,
            "edit.undo" => Command::Undo,
            "edit.redo" => Command::Redo,
            "window.minimize" => Command::Window(WindowCommand::Minimize),
            "window.maximize" => Command::Window(WindowCommand::Maximize),
            "window.close" => Command::Window(WindowCommand::Close),
            _ => {
                let key = s.strip_prefix("sample.")?;
                Command::OpenSample {
                    key: key.to_string(),
                }
            }
        };
        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_name() {
        assert_eq!(Command::Save.display_name(), "Save");
        assert_eq!(
            Command::SelectPanel(SidebarPanel::Git).display_name(),
            "SOURCE CONTROL"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("file.save"), Some(Command::Save));
        assert_eq!(
            Command::parse("sample.readme"),
            Some(Command::OpenSample {
                key: "readme".into()
            })
        );
        assert_eq!(Command::parse("editor.fold"), None);
    }
}
