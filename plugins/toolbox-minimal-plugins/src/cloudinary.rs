//! Cloudinary: signed image uploads with resized, reformatted links

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use toolbox_plugin_api::{
    App, Command, FormField, HttpClient, HttpReply, ImportedFile, MinimalPlugin, PluginContext,
    PluginError, SettingItem, SettingsContainer, SettingsSlice,
};
use url::Url;

use crate::shared::{
    ERROR_PREFIX, decode, int_value, read_slice, spawn_reported, text_value,
};

pub const ID: &str = "cloudinary";
const SIGNATURE_ALGORITHM: &str = "sha256";

fn default_width() -> i64 {
    600
}

fn default_format() -> String {
    "webp".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudinarySettings {
    #[serde(default = "default_width")]
    pub default_width: i64,
    #[serde(default = "default_format")]
    pub default_format: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Default for CloudinarySettings {
    fn default() -> Self {
        Self {
            default_width: default_width(),
            default_format: default_format(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

impl CloudinarySettings {
    fn has_credentials(&self) -> bool {
        !(self.cloud_name.is_empty() || self.api_key.is_empty() || self.api_secret.is_empty())
    }
}

pub fn default_data() -> Value {
    json!({
        "defaultWidth": 600,
        "defaultFormat": "webp",
        "cloudName": "",
        "apiKey": "",
        "apiSecret": ""
    })
}

pub fn validate(value: &Value) -> Result<CloudinarySettings, String> {
    decode(value)
}

pub fn upload_url(cloud_name: &str) -> String {
    format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload")
}

/// Hex SHA-256 of the signed parameters followed by the API secret
pub fn sign(timestamp: i64, api_secret: &str) -> String {
    hex::encode(Sha256::digest(format!("timestamp={timestamp}{api_secret}")))
}

/// What gets uploaded
#[derive(Debug, Clone)]
pub enum UploadSource {
    File(ImportedFile),
    /// Publicly reachable URL Cloudinary fetches itself
    Url(String),
}

impl UploadSource {
    pub fn file_name(&self) -> String {
        match self {
            Self::File(file) => file.name.clone(),
            Self::Url(url) => file_name_from_url(url).unwrap_or_default(),
        }
    }

    fn field(&self) -> FormField {
        match self {
            Self::File(file) => FormField::file("file", file),
            Self::Url(url) => FormField::text("file", url),
        }
    }
}

pub fn upload_form(
    source: &UploadSource,
    settings: &CloudinarySettings,
    timestamp: i64,
) -> Vec<FormField> {
    vec![
        source.field(),
        FormField::text("api_key", &settings.api_key),
        FormField::text("timestamp", timestamp.to_string()),
        FormField::text("signature", sign(timestamp, &settings.api_secret)),
        FormField::text("signature_algorithm", SIGNATURE_ALGORITHM),
    ]
}

/// `secure_url` of a successful reply, or the reason it failed
pub fn secure_url(reply: &HttpReply) -> Result<String, String> {
    if reply.status == 200 {
        if let Some(url) = reply.body.get("secure_url").and_then(Value::as_str) {
            return Ok(url.to_string());
        }
    }
    match reply
        .body
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        Some(message) => Err(message.to_string()),
        None => Err(format!("unexpected reply (status {})", reply.status)),
    }
}

/// Insert `w_<width>` after the third path segment and swap the extension
pub fn format_url(secure_url: &str, width: i64, extension: &str) -> Result<String, PluginError> {
    let mut url = Url::parse(secure_url)
        .map_err(|e| PluginError::Upload(format!("invalid url {secure_url}: {e}")))?;
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| segments.map(str::to_string).collect())
        .unwrap_or_default();

    let split = segments.len().min(3);
    let mut path = segments[..split].to_vec();
    path.push(format!("w_{width}"));
    path.extend_from_slice(&segments[split..]);
    url.set_path(&format!("/{}", path.join("/")));

    Ok(replace_extension(url.as_str(), extension))
}

/// Length of a trailing `.[a-z]+` extension, dot included
fn extension_len(name: &str) -> Option<usize> {
    let dot = name.rfind('.')?;
    let extension = &name[dot + 1..];
    (!extension.is_empty() && extension.bytes().all(|b| b.is_ascii_lowercase()))
        .then_some(name.len() - dot)
}

fn replace_extension(url: &str, extension: &str) -> String {
    match extension_len(url) {
        Some(len) if !extension.is_empty() => {
            format!("{}.{extension}", &url[..url.len() - len])
        }
        _ => url.to_string(),
    }
}

/// File name with a trailing lowercase extension removed
pub fn strip_extension(name: &str) -> &str {
    match extension_len(name) {
        Some(len) => &name[..name.len() - len],
        None => name,
    }
}

/// Last path segment of a public URL
pub fn file_name_from_url(public_url: &str) -> Option<String> {
    let url = Url::parse(public_url).ok()?;
    url.path_segments()?.next_back().map(str::to_string)
}

async fn upload(
    app: Arc<dyn App>,
    http: Arc<dyn HttpClient>,
    settings: CloudinarySettings,
    source: UploadSource,
) -> Result<(), PluginError> {
    let form = upload_form(&source, &settings, Utc::now().timestamp());
    let reply = http.post_form(&upload_url(&settings.cloud_name), form).await?;
    let uploaded = secure_url(&reply).map_err(PluginError::Upload)?;
    let url = format_url(&uploaded, settings.default_width, &settings.default_format)?;
    tracing::debug!(plugin = ID, url = %url, "Uploaded");

    let file_name = source.file_name();
    let basename = strip_extension(&file_name);
    app.write_clipboard(&format!("![{basename}]({url})"))?;
    app.notice(&format!("Copy link for {basename}!"));
    Ok(())
}

/// Everything an upload command needs, checked before any work is spawned
fn prepare(
    app: &Arc<dyn App>,
    slice: &SettingsSlice,
) -> Result<(CloudinarySettings, Arc<dyn HttpClient>), PluginError> {
    let settings = read_slice(slice, validate)?;
    if !settings.has_credentials() {
        return Err(PluginError::invalid_input(
            "Cloudinary cloud name, API key and API secret must be set",
        ));
    }
    let http = app.http().ok_or_else(|| PluginError::unsupported("http"))?;
    Ok((settings, http))
}

fn spawn_upload(
    app: &Arc<dyn App>,
    http: &Arc<dyn HttpClient>,
    settings: &CloudinarySettings,
    source: UploadSource,
) {
    let what = format!("failed to upload {}", source.file_name());
    let task = upload(Arc::clone(app), Arc::clone(http), settings.clone(), source);
    spawn_reported(app, ID, what, task);
}

#[derive(Debug, Default)]
pub struct Cloudinary {
    settings: CloudinarySettings,
}

impl MinimalPlugin for Cloudinary {
    fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        self.settings = ctx.load_settings(validate)?;

        let app = ctx.app().clone();
        let slice = ctx.settings().clone();
        ctx.add_command(Command::new(
            "cloudinary-upload-dialog",
            "Upload to Cloudinary",
            move || {
                let (settings, http) = prepare(&app, &slice)?;
                for file in app.pick_files() {
                    if !file.is_image() {
                        app.notice(&format!("{ERROR_PREFIX}: {} is not an image file.", file.name));
                        continue;
                    }
                    spawn_upload(&app, &http, &settings, UploadSource::File(file));
                }
                Ok(())
            },
        ))?;

        let app = ctx.app().clone();
        let slice = ctx.settings().clone();
        ctx.add_command(Command::new(
            "cloudinary-upload-clipboard",
            "Upload to Cloudinary from public URL",
            move || {
                let (settings, http) = prepare(&app, &slice)?;
                let Some(public_url) = app.prompt("Public URL") else {
                    return Ok(());
                };
                let public_url = public_url.trim().to_string();
                if public_url.is_empty() {
                    return Ok(());
                }
                if Url::parse(&public_url).is_err() {
                    return Err(PluginError::invalid_input(format!(
                        "not a valid URL: {public_url}"
                    )));
                }
                spawn_upload(&app, &http, &settings, UploadSource::Url(public_url));
                Ok(())
            },
        ))?;

        ctx.log_debug("Cloudinary loaded");
        Ok(())
    }

    fn display_settings(&self, container: &mut SettingsContainer) {
        container
            .add(SettingItem::number(
                "defaultWidth",
                "Default width (px)",
                self.settings.default_width,
            ))
            .add(SettingItem::text(
                "defaultFormat",
                "Default format",
                &self.settings.default_format,
            ))
            .add(SettingItem::text(
                "cloudName",
                "Cloud name",
                &self.settings.cloud_name,
            ))
            .add(SettingItem::secret(
                "apiKey",
                "API key",
                !self.settings.api_key.is_empty(),
            ))
            .add(SettingItem::secret(
                "apiSecret",
                "API secret",
                !self.settings.api_secret.is_empty(),
            ));
    }

    fn on_setting_changed(
        &mut self,
        key: &str,
        value: &Value,
        ctx: &mut PluginContext,
    ) -> Result<(), PluginError> {
        let mut next = self.settings.clone();
        match key {
            "defaultWidth" => next.default_width = int_value(key, value)?,
            "defaultFormat" => {
                let format = text_value(key, value)?;
                let format = format.trim();
                next.default_format = format.strip_prefix('.').unwrap_or(format).to_string();
            }
            "cloudName" => next.cloud_name = text_value(key, value)?.trim().to_string(),
            "apiKey" => next.api_key = text_value(key, value)?.trim().to_string(),
            "apiSecret" => next.api_secret = text_value(key, value)?.trim().to_string(),
            _ => return Err(PluginError::UnknownSetting(key.to_string())),
        }

        ctx.store_settings(&next)?;
        self.settings = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, fixture};
    use toolbox_plugin_api::mock::{MockApp, MockHttpClient};

    const SECURE_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1570979139/sample.jpg";

    fn configured() -> Value {
        json!({
            "defaultWidth": 600,
            "defaultFormat": "webp",
            "cloudName": "demo",
            "apiKey": "key",
            "apiSecret": "abcd"
        })
    }

    fn loaded(http: &Arc<MockHttpClient>, data: Value) -> Fixture {
        let app = MockApp::new().with_http(Arc::clone(http));
        let mut f = fixture(ID, data, app);
        Cloudinary::default().on_load(&mut f.ctx).unwrap();
        f
    }

    #[test]
    fn test_default_data_matches_defaults() {
        assert_eq!(validate(&default_data()), Ok(CloudinarySettings::default()));
    }

    #[test]
    fn test_validate_requires_credentials() {
        let settings =
            validate(&json!({ "cloudName": "c", "apiKey": "k", "apiSecret": "s" })).unwrap();
        assert_eq!(settings.default_width, 600);
        assert_eq!(settings.default_format, "webp");
        assert!(validate(&json!({ "cloudName": "c", "apiKey": "k" })).is_err());
    }

    #[test]
    fn test_sign() {
        assert_eq!(
            sign(1315060510, "abcd"),
            "5652e549a70bdc03f73a633a23b7d3f3b067d72fff26dd15b25997f46fdf6439"
        );
    }

    #[test]
    fn test_upload_form_fields() {
        let settings = validate(&configured()).unwrap();
        let source = UploadSource::Url("https://example.com/cat.png".to_string());
        let fields = upload_form(&source, &settings, 1315060510);

        let pairs: Vec<(&str, Option<&str>)> = fields
            .iter()
            .map(|field| (field.name.as_str(), field.as_text()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("file", Some("https://example.com/cat.png")),
                ("api_key", Some("key")),
                ("timestamp", Some("1315060510")),
                (
                    "signature",
                    Some("5652e549a70bdc03f73a633a23b7d3f3b067d72fff26dd15b25997f46fdf6439")
                ),
                ("signature_algorithm", Some("sha256")),
            ]
        );
    }

    #[test]
    fn test_format_url() {
        assert_eq!(
            format_url(SECURE_URL, 600, "webp").unwrap(),
            "https://res.cloudinary.com/demo/image/upload/w_600/v1570979139/sample.webp"
        );
        assert!(format_url("not a url", 600, "webp").is_err());
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("cat.png"), "cat");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("PHOTO.JPG"), "PHOTO.JPG");
        assert_eq!(strip_extension("noext"), "noext");
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://example.com/images/cat.png"),
            Some("cat.png".to_string())
        );
        assert_eq!(file_name_from_url("nope"), None);
    }

    #[test]
    fn test_secure_url_from_reply() {
        let ok = HttpReply {
            status: 200,
            body: json!({ "secure_url": SECURE_URL }),
        };
        assert_eq!(secure_url(&ok), Ok(SECURE_URL.to_string()));

        let rejected = HttpReply {
            status: 401,
            body: json!({ "error": { "message": "Invalid Signature" } }),
        };
        assert_eq!(secure_url(&rejected), Err("Invalid Signature".to_string()));

        let odd = HttpReply {
            status: 502,
            body: Value::Null,
        };
        assert!(secure_url(&odd).unwrap_err().contains("502"));
    }

    #[tokio::test]
    async fn test_dialog_upload_copies_markdown_image() {
        let http = Arc::new(MockHttpClient::new());
        http.queue_reply(200, json!({ "secure_url": SECURE_URL }));
        let f = loaded(&http, configured());
        f.app.set_picked_files(vec![
            ImportedFile::new("notes.txt", "text/plain", vec![]),
            ImportedFile::new("cat.png", "image/png", vec![1, 2]),
        ]);

        f.command("cloudinary-upload-dialog").run().unwrap();
        assert_eq!(f.app.pending_tasks(), 1);
        f.app.run_tasks().await;

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            f.app.clipboard(),
            Some(
                "![cat](https://res.cloudinary.com/demo/image/upload/w_600/v1570979139/sample.webp)"
                    .to_string()
            )
        );
        assert_eq!(
            f.app.notices(),
            vec![
                "[ERROR in Toolbox]: notes.txt is not an image file.",
                "Copy link for cat!"
            ]
        );
    }

    #[tokio::test]
    async fn test_public_url_upload() {
        let http = Arc::new(MockHttpClient::new());
        http.queue_reply(200, json!({ "secure_url": SECURE_URL }));
        let f = loaded(&http, configured());
        f.app
            .set_prompt_answer(Some(" https://example.com/img/dog.jpeg ".to_string()));

        f.command("cloudinary-upload-clipboard").run().unwrap();
        f.app.run_tasks().await;

        let requests = http.requests();
        assert_eq!(
            requests[0].1[0].as_text(),
            Some("https://example.com/img/dog.jpeg")
        );
        assert_eq!(f.app.notices(), vec!["Copy link for dog!"]);
    }

    #[test]
    fn test_public_url_cancel_and_invalid() {
        let http = Arc::new(MockHttpClient::new());
        let f = loaded(&http, configured());

        f.command("cloudinary-upload-clipboard").run().unwrap();
        assert_eq!(f.app.pending_tasks(), 0);

        f.app.set_prompt_answer(Some("not a url".to_string()));
        assert!(matches!(
            f.command("cloudinary-upload-clipboard").run(),
            Err(PluginError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_upload_is_noticed() {
        let http = Arc::new(MockHttpClient::new());
        http.queue_reply(401, json!({ "error": { "message": "Invalid Signature" } }));
        let f = loaded(&http, configured());
        f.app
            .set_picked_files(vec![ImportedFile::new("cat.png", "image/png", vec![])]);

        f.command("cloudinary-upload-dialog").run().unwrap();
        f.app.run_tasks().await;

        assert!(f.app.clipboard().is_none());
        let notices = f.app.notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("failed to upload cat.png"));
        assert!(notices[0].contains("Invalid Signature"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let http = Arc::new(MockHttpClient::new());
        let f = loaded(&http, default_data());
        assert!(matches!(
            f.command("cloudinary-upload-dialog").run(),
            Err(PluginError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_setting_changes() {
        let mut f = fixture(ID, default_data(), MockApp::new());
        let mut plugin = Cloudinary::default();
        plugin.on_load(&mut f.ctx).unwrap();

        assert!(
            plugin
                .on_setting_changed("defaultWidth", &json!("wide"), &mut f.ctx)
                .is_err()
        );
        assert_eq!(f.saves(), 0);

        plugin
            .on_setting_changed("defaultWidth", &json!("800"), &mut f.ctx)
            .unwrap();
        plugin
            .on_setting_changed("defaultFormat", &json!(" .png "), &mut f.ctx)
            .unwrap();
        plugin
            .on_setting_changed("apiSecret", &json!("s3cret"), &mut f.ctx)
            .unwrap();

        assert_eq!(f.saves(), 3);
        let data = f.data().unwrap();
        assert_eq!(data["defaultWidth"], json!(800));
        assert_eq!(data["defaultFormat"], json!("png"));

        let mut container = SettingsContainer::new();
        plugin.display_settings(&mut container);
        let rendered = serde_json::to_string(&container).unwrap();
        assert!(!rendered.contains("s3cret"));
    }
}
