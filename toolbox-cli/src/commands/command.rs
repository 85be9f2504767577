//! Listing and running sub-plugin commands

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::{Session, terminal_app};
use crate::config::ToolboxConfig;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Namespaced command id, e.g. `random:generate-random-string`
    pub command_id: String,

    /// Vault path of the note to treat as active
    #[arg(long)]
    pub active: Option<String>,

    /// Files offered to commands that ask for files
    #[arg(long = "attach", value_name = "PATH")]
    pub attachments: Vec<PathBuf>,
}

/// Print every registered command
pub async fn list(config: &ToolboxConfig) -> Result<()> {
    let session = Session::open(config.settings_path.clone(), terminal_app(config)).await?;
    println!("{}", commands_table(&session));
    session.close().await;
    Ok(())
}

fn commands_table(session: &Session) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Command").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
    ]);

    let commands = session.toolbox.commands();
    for id in commands.ids() {
        let name = commands
            .get(&id)
            .map(|command| command.name.clone())
            .unwrap_or_default();
        table.add_row(vec![Cell::new(id), Cell::new(name)]);
    }
    table
}

/// Run one command, then wait for its background work and pending saves
pub async fn run(args: RunArgs, config: &ToolboxConfig) -> Result<()> {
    let mut app = terminal_app(config).with_attachments(args.attachments);
    if let Some(active) = args.active {
        app = app.with_active_file(active);
    }
    let session = Session::open(config.settings_path.clone(), app).await?;
    let result = execute(&args.command_id, &session);
    session.close().await;
    result
}

pub fn execute(command_id: &str, session: &Session) -> Result<()> {
    if !session.toolbox.execute_command(command_id)? {
        bail!("{command_id} cannot run right now");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::testing::captured_app;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    async fn session_with(
        dir: &TempDir,
        enabled: &[&str],
        app: crate::terminal::TerminalApp,
    ) -> Session {
        let mut session = Session::open(dir.path().join("data.json"), app)
            .await
            .unwrap();
        for id in enabled {
            session.toolbox.set_sub_plugin_enabled(id, true).unwrap();
        }
        session
    }

    #[test]
    fn test_run_args_parsing() {
        let cli = TestCli::parse_from([
            "test",
            "gyazo:gyazo-upload",
            "--attach",
            "a.png",
            "--attach",
            "b.png",
        ]);
        assert_eq!(cli.args.command_id, "gyazo:gyazo-upload");
        assert_eq!(
            cli.args.attachments,
            vec![PathBuf::from("a.png"), PathBuf::from("b.png")]
        );
        assert!(cli.args.active.is_none());

        let cli = TestCli::parse_from([
            "test",
            "copy-wiki-link:copy-wiki-link",
            "--active",
            "a.md",
        ]);
        assert_eq!(cli.args.active.as_deref(), Some("a.md"));
    }

    #[tokio::test]
    async fn test_copy_wiki_link_prints_link() {
        let dir = TempDir::new().unwrap();
        let (app, stdout, stderr) = captured_app("");
        let app = app.with_active_file("daily/2024-01-01.md");
        let session = session_with(&dir, &["copy-wiki-link"], app).await;

        execute("copy-wiki-link:copy-wiki-link", &session).unwrap();
        session.close().await;

        assert_eq!(stdout.text(), "[[2024-01-01]]\n");
        assert!(stderr.text().contains("2024-01-01.md"));
    }

    #[tokio::test]
    async fn test_inapplicable_command_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (app, stdout, _stderr) = captured_app("");
        let session = session_with(&dir, &["copy-wiki-link"], app).await;

        let err = execute("copy-wiki-link:copy-wiki-link", &session).unwrap_err();
        assert!(err.to_string().contains("cannot run right now"));
        assert!(stdout.text().is_empty());
    }

    #[tokio::test]
    async fn test_random_string_is_printed() {
        let dir = TempDir::new().unwrap();
        let (app, stdout, _stderr) = captured_app("");
        let session = session_with(&dir, &["random"], app).await;

        execute("random:generate-random-string", &session).unwrap();
        session.close().await;

        let copied = stdout.text();
        assert_eq!(copied.trim_end().len(), 8);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dir = TempDir::new().unwrap();
        let (app, _stdout, _stderr) = captured_app("");
        let session = session_with(&dir, &[], app).await;
        assert!(execute("nope:nothing", &session).is_err());
    }
}
