//! Wiki link getter: copy a wiki link to the active note

use toolbox_plugin_api::{
    Command, MinimalPlugin, PluginContext, PluginError, SettingItem, SettingsContainer,
};

pub const ID: &str = "copy-wiki-link";

#[derive(Debug, Default)]
pub struct CopyWikiLink;

impl MinimalPlugin for CopyWikiLink {
    fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        let app = ctx.app().clone();
        ctx.add_command(Command::with_check(
            "copy-wiki-link",
            "Copy wiki link",
            move |checking| {
                let Some(file) = app.active_file() else {
                    return Ok(false);
                };
                if checking {
                    return Ok(true);
                }

                let link = app.wiki_link(&file);
                app.write_clipboard(&link)?;
                app.notice(&format!("Copy wiki link of {}", file.name()));
                Ok(true)
            },
        ))?;
        ctx.log_debug("CopyWikiLink loaded");
        Ok(())
    }

    fn display_settings(&self, container: &mut SettingsContainer) {
        container.add(SettingItem::info("about", "Copy wiki link"));
    }
}
