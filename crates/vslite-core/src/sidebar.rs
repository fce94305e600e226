//! Activity bar panels and the explorer's file tree.
//!
//! The tree is a fixed set of bundled samples, not a view of the disk.
//! Clicking a file node opens its sample in a tab.

use serde::{Deserialize, Serialize};

/// Activity bar panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidebarPanel {
    #[default]
    Explorer,
    Search,
    Git,
    Debug,
    Extensions,
}

impl SidebarPanel {
    /// All panels in activity bar order.
    pub const ALL: [SidebarPanel; 5] = [
        SidebarPanel::Explorer,
        SidebarPanel::Search,
        SidebarPanel::Git,
        SidebarPanel::Debug,
        SidebarPanel::Extensions,
    ];

    /// Returns the sidebar heading for this panel.
    pub fn title(&self) -> &'static str {
        match self {
            SidebarPanel::Explorer => "EXPLORER",
            SidebarPanel::Search => "SEARCH",
            SidebarPanel::Git => "SOURCE CONTROL",
            SidebarPanel::Debug => "RUN AND DEBUG",
            SidebarPanel::Extensions => "EXTENSIONS",
        }
    }
}

/// A bundled sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub key: &'static str,
    pub name: &'static str,
    pub language: &'static str,
    pub content: &'static str,
}

const WELCOME_MD: &str = "# Welcome to VSLite

A lightweight code editor shell.

## Features

- Familiar tabbed layout
- Syntax-aware editing
- No installation needed
- File management

Start writing some code!
";

const SAMPLE_JS: &str = r#"// JavaScript sample

function greetUser(name) {
    console.log(`Hello, ${name}!`);
    return `Welcome to VSLite, ${name}!`;
}

// Call the function
const message = greetUser("Developer");
console.log(message);

// Async example
async function fetchData() {
    try {
        const response = await fetch("https://api.example.com/data");
        const data = await response.json();
        return data;
    } catch (error) {
        console.error("Error fetching data:", error);
    }
}"#;

const README_MD: &str = "# VSLite

A small code editor modeled on the look and basic behavior of a full IDE.

## Features

### Done
- Tabbed editing
- Basic file operations
- Language modes by extension
- Line export to markdown

### In progress
- Folder management
- Search
- Extensions

## Usage

1. Start the application
2. Open or create a file
3. Start coding!
";

/// Bundled samples, keyed by the file tree.
pub const SAMPLES: [Sample; 3] = [
    Sample {
        key: "welcome",
        name: "Welcome.md",
        language: "markdown",
        content: WELCOME_MD,
    },
    Sample {
        key: "sample",
        name: "sample.js",
        language: "javascript",
        content: SAMPLE_JS,
    },
    Sample {
        key: "readme",
        name: "README.md",
        language: "markdown",
        content: README_MD,
    },
];

/// Looks up a bundled sample by key.
pub fn sample(key: &str) -> Option<&'static Sample> {
    SAMPLES.iter().find(|s| s.key == key)
}

/// A tree structure of folders and sample files.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// Top-level nodes
    pub roots: Vec<FileNode>,
}

impl FileTree {
    /// The explorer's fixed tree.
    pub fn samples() -> Self {
        Self {
            roots: vec![
                FileNode::folder(
                    "Project Files",
                    vec![FileNode::file("Welcome.md", "welcome"), FileNode::file("sample.js", "sample")],
                ),
                FileNode::file("README.md", "readme"),
            ],
        }
    }

    /// Lists every node depth-first, with its nesting depth.
    pub fn flatten(&self) -> Vec<(usize, &FileNode)> {
        let mut out = Vec::new();
        for node in &self.roots {
            Self::flatten_node(node, 0, &mut out);
        }
        out
    }

    fn flatten_node<'a>(node: &'a FileNode, depth: usize, out: &mut Vec<(usize, &'a FileNode)>) {
        out.push((depth, node));
        for child in &node.children {
            Self::flatten_node(child, depth + 1, out);
        }
    }
}

impl Default for FileTree {
    fn default() -> Self {
        Self::samples()
    }
}

/// A node in the file tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Display name
    pub name: String,

    /// Node type
    pub kind: NodeKind,

    /// Sample opened by clicking a file node
    pub sample: Option<String>,

    /// Child nodes (for folders)
    pub children: Vec<FileNode>,
}

impl FileNode {
    fn file(name: &str, sample: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::File,
            sample: Some(sample.to_string()),
            children: Vec::new(),
        }
    }

    fn folder(name: &str, children: Vec<FileNode>) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Directory,
            sample: None,
            children,
        }
    }

    /// Returns true if this is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Returns the icon name for this node.
    pub fn icon(&self) -> &'static str {
        match self.kind {
            NodeKind::Directory => "folder",
            NodeKind::File => "file-code",
        }
    }
}

/// Type of file tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// Sidebar state: the selected panel and the explorer tree.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    panel: SidebarPanel,
    tree: FileTree,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a panel. Returns true if the selection changed.
    pub fn select(&mut self, panel: SidebarPanel) -> bool {
        let changed = self.panel != panel;
        self.panel = panel;
        changed
    }

    pub fn panel(&self) -> SidebarPanel {
        self.panel
    }

    pub fn title(&self) -> &'static str {
        self.panel.title()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }
}
