//! Sub-plugin management commands

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use serde_json::Value;
use toolbox_core::ToolboxError;
use toolbox_plugin_api::{SettingKind, SettingsContainer};

use super::{Session, terminal_app};
use crate::config::ToolboxConfig;

#[derive(Args, Debug)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

#[derive(Subcommand, Debug)]
pub enum PluginCommands {
    /// List every built-in sub-plugin
    List,
    /// Enable a sub-plugin
    Enable {
        /// Sub-plugin id
        id: String,
    },
    /// Disable a sub-plugin
    Disable {
        /// Sub-plugin id
        id: String,
    },
    /// Show a sub-plugin's settings
    Settings {
        /// Sub-plugin id
        id: String,
    },
    /// Change one setting of a sub-plugin
    Set {
        /// Sub-plugin id
        id: String,
        /// Setting key, as shown by `plugin settings`
        key: String,
        /// New value; JSON literals are parsed, anything else is text
        value: String,
    },
}

/// Run plugin command
pub async fn run(args: PluginArgs, config: &ToolboxConfig) -> Result<()> {
    let mut session = Session::open(config.settings_path.clone(), terminal_app(config)).await?;
    let result = execute(args.command, &mut session);
    session.close().await;
    result
}

pub fn execute(command: PluginCommands, session: &mut Session) -> Result<()> {
    match command {
        PluginCommands::List => {
            list_plugins(session);
            Ok(())
        }
        PluginCommands::Enable { id } => set_enabled(session, &id, true),
        PluginCommands::Disable { id } => set_enabled(session, &id, false),
        PluginCommands::Settings { id } => show_settings(session, &id),
        PluginCommands::Set { id, key, value } => {
            session
                .toolbox
                .update_setting(&id, &key, &parse_value(&value))?;
            println!("Updated {key} of {id}");
            Ok(())
        }
    }
}

fn list_plugins(session: &Session) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);

    for info in session.toolbox.sub_plugins() {
        let status = match (info.enabled, info.running) {
            (true, true) => Cell::new("✓ enabled").fg(Color::Green),
            (true, false) => Cell::new("✗ failed").fg(Color::Red),
            (false, _) => Cell::new("○ disabled"),
        };
        table.add_row(vec![
            Cell::new(&info.id),
            Cell::new(&info.name),
            status,
            Cell::new(&info.description),
        ]);
    }

    println!("{table}");
}

fn set_enabled(session: &mut Session, id: &str, on: bool) -> Result<()> {
    let Some(name) = session.toolbox.registry().get(id).map(|entry| entry.name.clone()) else {
        bail!("Unknown sub-plugin: {id}");
    };
    session.toolbox.set_sub_plugin_enabled(id, on)?;
    if on {
        println!("Enabled {name}");
    } else {
        println!("Disabled {name}");
    }
    Ok(())
}

fn show_settings(session: &Session, id: &str) -> Result<()> {
    let container = match session.toolbox.display_settings(id) {
        Ok(container) => container,
        Err(ToolboxError::NotRunning(_)) => {
            bail!("{id} is not running; enable it with 'toolbox plugin enable {id}'")
        }
        Err(e) => return Err(e.into()),
    };
    if container.is_empty() {
        println!("{id} has no settings");
        return Ok(());
    }
    println!("{}", settings_table(&container));
    Ok(())
}

fn settings_table(container: &SettingsContainer) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Key").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);
    for item in container.items() {
        table.add_row(vec![
            Cell::new(&item.key),
            Cell::new(&item.name),
            Cell::new(render_value(&item.kind)),
            Cell::new(item.description.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// Secrets only ever show whether they are set
fn render_value(kind: &SettingKind) -> String {
    match kind {
        SettingKind::Text { value } => value.clone(),
        SettingKind::Number { value } => value.to_string(),
        SettingKind::Toggle { value } => (if *value { "on" } else { "off" }).to_string(),
        SettingKind::Secret { is_set: true } => "(set)".to_string(),
        SettingKind::Secret { is_set: false } => "(not set)".to_string(),
        SettingKind::Info => String::new(),
    }
}

/// `12`, `true` and `"quoted"` are JSON; anything else is plain text
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::testing::captured_app;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_plugin_args_parsing() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(subcommand)]
            cmd: PluginCommands,
        }

        let cli = TestCli::parse_from(["test", "list"]);
        assert!(matches!(cli.cmd, PluginCommands::List));

        let cli = TestCli::parse_from(["test", "enable", "random"]);
        assert!(matches!(cli.cmd, PluginCommands::Enable { id } if id == "random"));

        let cli = TestCli::parse_from(["test", "disable", "gyazo"]);
        assert!(matches!(cli.cmd, PluginCommands::Disable { id } if id == "gyazo"));

        let cli = TestCli::parse_from(["test", "set", "random", "strLength", "12"]);
        assert!(matches!(
            cli.cmd,
            PluginCommands::Set { id, key, value }
                if id == "random" && key == "strLength" && value == "12"
        ));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("12"), json!(12));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("\"12\""), json!("12"));
        assert_eq!(parse_value("webp"), json!("webp"));
        assert_eq!(parse_value("YYMMDD-HHmmss"), json!("YYMMDD-HHmmss"));
    }

    #[test]
    fn test_render_value_hides_secrets() {
        assert_eq!(render_value(&SettingKind::Secret { is_set: true }), "(set)");
        assert_eq!(render_value(&SettingKind::Toggle { value: false }), "off");
        assert_eq!(render_value(&SettingKind::Number { value: 8 }), "8");
    }

    #[tokio::test]
    async fn test_enable_set_and_reopen() {
        let dir = TempDir::new().unwrap();
        let settings = dir.path().join("data.json");

        let (app, _stdout, _stderr) = captured_app("");
        let mut session = Session::open(settings.clone(), app).await.unwrap();
        execute(
            PluginCommands::Enable {
                id: "random".to_string(),
            },
            &mut session,
        )
        .unwrap();
        execute(
            PluginCommands::Set {
                id: "random".to_string(),
                key: "strLength".to_string(),
                value: "16".to_string(),
            },
            &mut session,
        )
        .unwrap();
        assert_eq!(session.close().await, 2);

        let (app, _stdout, _stderr) = captured_app("");
        let session = Session::open(settings, app).await.unwrap();
        assert!(session.toolbox.is_running("random"));
        let container = session.toolbox.display_settings("random").unwrap();
        assert_eq!(
            render_value(&container.get("strLength").unwrap().kind),
            "16"
        );
    }

    #[tokio::test]
    async fn test_unknown_and_stopped_sub_plugins() {
        let dir = TempDir::new().unwrap();
        let (app, _stdout, _stderr) = captured_app("");
        let mut session = Session::open(dir.path().join("data.json"), app)
            .await
            .unwrap();

        let err = execute(
            PluginCommands::Enable {
                id: "nope".to_string(),
            },
            &mut session,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown sub-plugin"));

        let err = execute(
            PluginCommands::Settings {
                id: "gyazo".to_string(),
            },
            &mut session,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not running"));
        assert_eq!(session.close().await, 0);
    }
}
