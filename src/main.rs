//! # VSLite
//!
//! A lightweight code editor shell: tabbed documents over one shared editor,
//! plus line export that appends a chosen line to a markdown file.
//!
//! This binary drives the shell headlessly.
//!
//! ## Quick Start
//!
//! ```bash
//! # Open files and list the tabs
//! cargo run -- notes.md main.py
//!
//! # Export every line read from stdin into a folder of markdown files
//! printf 'first\nsecond\n' | cargo run -- --trigger-line 1 --save-path ./notes
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vslite_core::keymap::{Key, KeyPress, Modifiers};
use vslite_core::{BufferEditor, Config, EditorBinding, FsGateway, QueuedDialogs, Shell};

/// VSLite - a lightweight code editor shell
#[derive(Parser, Debug)]
#[command(name = "vslite")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to open, in tab order
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Line number that triggers line export (0 disables)
    #[arg(short, long, value_name = "LINE")]
    trigger_line: Option<usize>,

    /// Folder that receives generated export files
    #[arg(short, long, value_name = "DIR")]
    save_path: Option<PathBuf>,

    /// Markdown file that exported lines are appended to
    #[arg(long, value_name = "FILE")]
    target_file: Option<PathBuf>,

    /// Export each line as its own paragraph (Ctrl+Enter)
    #[arg(short, long)]
    paragraph: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the export settings, including the adopted target file, back
    /// to the config file
    #[arg(short, long)]
    remember: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting VSLite v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Cannot load {}: {}", path.display(), e))?,
        None => Config::load(),
    };

    if let Some(line) = args.trigger_line {
        config.export.trigger_line = line;
    }
    if let Some(path) = &args.save_path {
        config.export.save_path = Some(path.clone());
    }
    if let Some(path) = &args.target_file {
        config.export.target_file = Some(path.clone());
    }
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    // The editor component loads in the background, like a web view would
    let (editor_tx, binding) = EditorBinding::loading(config.editor.ready_timeout());
    let undo_limit = config.editor.undo_limit;
    tokio::spawn(async move {
        if editor_tx
            .send(Box::new(BufferEditor::with_undo_limit(undo_limit)))
            .is_err()
        {
            tracing::warn!("Shell dropped before the editor loaded");
        }
    });

    let mut dialogs = QueuedDialogs::new();
    for file in &args.files {
        dialogs.push(file);
    }

    let gateway = FsGateway::new(dialogs).with_header_title(config.export.header_title.clone());
    let mut shell = Shell::new(config, binding, gateway);
    shell.start().await;

    for file in &args.files {
        if let Err(e) = shell.open_file().await {
            tracing::error!("Cannot open {}: {}", file.display(), e);
        }
    }

    let trigger = shell.export().config().trigger_line();
    if shell.export().config().enabled() {
        let stdin = BufReader::new(tokio::io::stdin());
        let count = export_lines(&mut shell, stdin, trigger, args.paragraph).await?;
        if let Some(target) = shell.export().config().target_file() {
            println!("Exported {} lines to {}", count, target.display());
        }
        if args.remember {
            let path = match &args.config {
                Some(path) => path.clone(),
                None => Config::default_path()?,
            };
            shell.save_config_to(&path)?;
            tracing::info!("Export settings saved to {}", path.display());
        }
    }

    print_summary(&shell);
    Ok(())
}

/// Types lines into a new document, one line per trigger-line Enter.
///
/// Blank lines are skipped: Enter on a blank trigger line inserts a newline
/// and would leave the caret below the trigger line for every later line.
async fn export_lines<R>(
    shell: &mut Shell<FsGateway<QueuedDialogs>>,
    input: R,
    trigger: usize,
    paragraph: bool,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    shell.new_file().await;
    for _ in 1..trigger {
        shell.handle_key(KeyPress::plain(Key::Enter)).await?;
    }

    let enter = if paragraph {
        KeyPress::new(Key::Enter, Modifiers::CTRL)
    } else {
        KeyPress::plain(Key::Enter)
    };

    let mut exported = 0;
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            tracing::debug!("Skipping blank input line");
            continue;
        }
        shell.type_text(&line).await;
        shell.handle_key(enter).await?;
        exported += 1;
    }
    Ok(exported)
}

fn print_summary(shell: &Shell<FsGateway<QueuedDialogs>>) {
    for tab in shell.tabs().tabs() {
        let marker = if tab.active { "*" } else { " " };
        println!("{} {}", marker, tab.label);
    }
    let status = shell.status();
    println!("{} | {} | {}", status.file_info, status.language_mode, status.cursor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vslite_core::EditorComponent;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["vslite"]);
        assert!(args.files.is_empty());
        assert!(args.trigger_line.is_none());
        assert!(!args.paragraph);
    }

    #[test]
    fn test_args_with_export() {
        let args = Args::parse_from([
            "vslite",
            "a.md",
            "b.js",
            "--trigger-line",
            "3",
            "--save-path",
            "notes",
            "-p",
        ]);
        assert_eq!(args.files, vec![PathBuf::from("a.md"), PathBuf::from("b.js")]);
        assert_eq!(args.trigger_line, Some(3));
        assert_eq!(args.save_path, Some(PathBuf::from("notes")));
        assert!(args.paragraph);
    }

    async fn export_shell(dir: &std::path::Path, trigger: usize) -> Shell<FsGateway<QueuedDialogs>> {
        let mut config = Config::default();
        config.export.trigger_line = trigger;
        config.export.save_path = Some(dir.to_path_buf());
        let binding = EditorBinding::ready_with(
            Box::new(BufferEditor::new()),
            std::time::Duration::from_millis(50),
        );
        let mut shell = Shell::new(config, binding, FsGateway::new(QueuedDialogs::new()));
        shell.start().await;
        shell
    }

    #[tokio::test]
    async fn test_blank_input_lines_do_not_stop_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = export_shell(dir.path(), 1).await;

        let input: &[u8] = b"a\n\n   \nb\n";
        let count = export_lines(&mut shell, input, 1, false).await.unwrap();
        assert_eq!(count, 2);

        let target = shell.export().config().target_file().unwrap().to_path_buf();
        let text = std::fs::read_to_string(target).unwrap();
        assert!(text.ends_with("\n\nab"), "got {:?}", text);
        assert_eq!(shell.binding().editor().unwrap().value(), "");
    }

    #[tokio::test]
    async fn test_paragraph_export_below_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut shell = export_shell(dir.path(), 3).await;

        let input: &[u8] = b"one\n\ntwo\n";
        export_lines(&mut shell, input, 3, true).await.unwrap();

        let target = shell.export().config().target_file().unwrap().to_path_buf();
        let text = std::fs::read_to_string(target).unwrap();
        assert!(text.ends_with("\n\none\n\ntwo\n\n"), "got {:?}", text);
        assert_eq!(shell.binding().editor().unwrap().value(), "\n\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\ntrigger_line = 2\nsave_path = \"/tmp/a\"\n").unwrap();

        let args = Args::parse_from([
            "vslite",
            "--config",
            path.to_str().unwrap(),
            "--save-path",
            "/tmp/b",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.export.trigger_line, 2);
        assert_eq!(config.export.save_path, Some(PathBuf::from("/tmp/b")));
    }
}
