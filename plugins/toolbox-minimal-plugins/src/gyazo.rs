//! Gyazo: upload picked images and copy embeddable links

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use toolbox_plugin_api::{
    App, Command, FormField, HttpClient, HttpReply, ImportedFile, MinimalPlugin, PluginContext,
    PluginError, SettingItem, SettingsContainer,
};

use crate::shared::{ERROR_PREFIX, decode, read_slice, spawn_reported, text_value};

pub const ID: &str = "gyazo";
pub const UPLOAD_URL: &str = "https://upload.gyazo.com/api/upload";
const APP_NAME: &str = "Obsidian";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GyazoSettings {
    pub access_token: String,
}

pub fn default_data() -> Value {
    json!({ "accessToken": "" })
}

pub fn validate(value: &Value) -> Result<GyazoSettings, String> {
    decode(value)
}

/// Successful upload reply
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    pub image_id: String,
    pub permalink_url: String,
    pub thumb_url: String,
    pub url: String,
    #[serde(rename = "type")]
    pub image_type: String,
}

impl UploadResult {
    /// Image linking to its Gyazo page
    pub fn embed(&self) -> String {
        format!("[![]({})]({})", self.url, self.permalink_url)
    }
}

/// Error reply from the API
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFailure {
    pub message: String,
    pub request: String,
    pub method: String,
}

#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded(UploadResult),
    Rejected(UploadFailure),
    Unexpected(Value),
}

pub fn classify(reply: HttpReply) -> UploadOutcome {
    if reply.status == 200 {
        if let Ok(result) = serde_json::from_value(reply.body.clone()) {
            return UploadOutcome::Uploaded(result);
        }
    }
    match serde_json::from_value(reply.body.clone()) {
        Ok(failure) => UploadOutcome::Rejected(failure),
        Err(_) => UploadOutcome::Unexpected(reply.body),
    }
}

pub fn upload_form(file: &ImportedFile, access_token: &str) -> Vec<FormField> {
    vec![
        FormField::file("imagedata", file),
        FormField::text("access_token", access_token),
        FormField::text("app", APP_NAME),
    ]
}

async fn upload_all(
    app: Arc<dyn App>,
    http: Arc<dyn HttpClient>,
    files: Vec<ImportedFile>,
    access_token: String,
) -> Result<(), PluginError> {
    let mut links = Vec::new();
    for file in &files {
        let outcome = http
            .post_form(UPLOAD_URL, upload_form(file, &access_token))
            .await
            .map(classify);
        match outcome {
            Ok(UploadOutcome::Uploaded(result)) => {
                tracing::debug!(plugin = ID, image_id = %result.image_id, "Uploaded");
                app.notice(&format!("{} uploaded!", file.name));
                links.push(result.embed());
            }
            Ok(UploadOutcome::Rejected(failure)) => {
                tracing::warn!(
                    plugin = ID,
                    message = %failure.message,
                    request = %failure.request,
                    method = %failure.method,
                    "Upload rejected"
                );
                app.notice(&format!(
                    "{ERROR_PREFIX} failed to upload {}: {}",
                    file.name, failure.message
                ));
            }
            Ok(UploadOutcome::Unexpected(body)) => {
                tracing::warn!(plugin = ID, body = %body, "Unexpected upload reply");
                app.notice(&format!("{ERROR_PREFIX} Unexpected error uploading {}", file.name));
            }
            Err(e) => {
                tracing::warn!(plugin = ID, error = %e, "Upload request failed");
                app.notice(&format!("{ERROR_PREFIX} Unexpected error uploading {}", file.name));
            }
        }
    }

    if links.is_empty() {
        return Ok(());
    }
    app.write_clipboard(&links.join("\n"))?;
    app.notice(if links.len() == 1 {
        "Copy link!"
    } else {
        "Copy links!"
    });
    Ok(())
}

#[derive(Debug, Default)]
pub struct Gyazo {
    settings: GyazoSettings,
}

impl MinimalPlugin for Gyazo {
    fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        self.settings = ctx.load_settings(validate)?;

        let app = ctx.app().clone();
        let slice = ctx.settings().clone();
        ctx.add_command(Command::new("gyazo-upload", "Upload to Gyazo", move || {
            let settings = read_slice(&slice, validate)?;
            if settings.access_token.is_empty() {
                return Err(PluginError::invalid_input("Gyazo access token is not set"));
            }
            let http = app.http().ok_or_else(|| PluginError::unsupported("http"))?;

            let files = app.pick_files();
            if files.is_empty() {
                return Ok(());
            }
            if let Some(file) = files.iter().find(|file| !file.is_image()) {
                app.notice(&format!("{ERROR_PREFIX}: {} is not an image file.", file.name));
                return Ok(());
            }

            spawn_reported(
                &app,
                ID,
                "failed to upload to Gyazo".to_string(),
                upload_all(Arc::clone(&app), http, files, settings.access_token),
            );
            Ok(())
        }))?;
        ctx.log_debug("Gyazo loaded");
        Ok(())
    }

    fn display_settings(&self, container: &mut SettingsContainer) {
        container.add(SettingItem::secret(
            "accessToken",
            "Access Token",
            !self.settings.access_token.is_empty(),
        ));
    }

    fn on_setting_changed(
        &mut self,
        key: &str,
        value: &Value,
        ctx: &mut PluginContext,
    ) -> Result<(), PluginError> {
        if key != "accessToken" {
            return Err(PluginError::UnknownSetting(key.to_string()));
        }
        let next = GyazoSettings {
            access_token: text_value(key, value)?.trim().to_string(),
        };
        ctx.store_settings(&next)?;
        self.settings = next;
        Ok(())
    }
}
