//! Multipart uploads over reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use toolbox_plugin_api::{FormField, FormValue, HttpClient, HttpReply, PluginError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

fn upload_error(e: reqwest::Error) -> PluginError {
    PluginError::Upload(e.to_string())
}

fn build_form(fields: Vec<FormField>) -> Result<Form, PluginError> {
    let mut form = Form::new();
    for field in fields {
        form = match field.value {
            FormValue::Text(text) => form.text(field.name, text),
            FormValue::File {
                file_name,
                mime_type,
                bytes,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(upload_error)?;
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}

/// JSON body, or the raw text as a JSON string when it isn't JSON
fn decode_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post_form(&self, url: &str, fields: Vec<FormField>) -> Result<HttpReply, PluginError> {
        let form = build_form(fields)?;
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(upload_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(upload_error)?;
        tracing::debug!(url = %url, status, "Form posted");
        Ok(HttpReply {
            status,
            body: decode_body(text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolbox_plugin_api::ImportedFile;

    #[test]
    fn test_form_accepts_text_and_files() {
        let image = ImportedFile::new("cat.png", "image/png", vec![1, 2, 3]);
        let form = build_form(vec![
            FormField::text("access_token", "t"),
            FormField::file("imagedata", &image),
        ]);
        assert!(form.is_ok());
    }

    #[test]
    fn test_form_rejects_bad_mime_type() {
        let odd = ImportedFile::new("x", "not a mime type", vec![]);
        let result = build_form(vec![FormField::file("file", &odd)]);
        assert!(matches!(result, Err(PluginError::Upload(_))));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(
            decode_body(r#"{"url":"u"}"#.to_string()),
            json!({ "url": "u" })
        );
        assert_eq!(
            decode_body("Bad Gateway".to_string()),
            json!("Bad Gateway")
        );
    }
}
