//! Random Generator: copy a random string built from configurable classes

use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use toolbox_plugin_api::{
    Command, MinimalPlugin, PluginContext, PluginError, SettingItem, SettingsContainer,
};

use crate::shared::{bool_value, decode, int_value, read_slice, text_value};

pub const ID: &str = "random";

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomSettings {
    pub str_length: u32,
    pub use_lowercase_alphabet: bool,
    pub use_uppercase_alphabet: bool,
    pub use_number: bool,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

impl Default for RandomSettings {
    fn default() -> Self {
        Self {
            str_length: 8,
            use_lowercase_alphabet: true,
            use_uppercase_alphabet: false,
            use_number: true,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl RandomSettings {
    /// Characters enabled by the class toggles
    pub fn alphabet(&self) -> Vec<char> {
        let classes = [
            (self.use_lowercase_alphabet, LOWERCASE),
            (self.use_uppercase_alphabet, UPPERCASE),
            (self.use_number, DIGITS),
        ];
        classes
            .iter()
            .filter(|(enabled, _)| *enabled)
            .flat_map(|(_, chars)| chars.chars())
            .collect()
    }
}

pub fn default_data() -> Value {
    json!({
        "strLength": 8,
        "useLowercaseAlphabet": true,
        "useUppercaseAlphabet": false,
        "useNumber": true,
        "prefix": "",
        "suffix": ""
    })
}

pub fn validate(value: &Value) -> Result<RandomSettings, String> {
    let settings: RandomSettings = decode(value)?;
    if settings.str_length == 0 {
        return Err("strLength must be a positive integer".to_string());
    }
    Ok(settings)
}

/// `prefix + random + suffix`, drawing `str_length` symbols from `rng`
pub fn generate<R: Rng + ?Sized>(
    settings: &RandomSettings,
    rng: &mut R,
) -> Result<String, PluginError> {
    let alphabet = settings.alphabet();
    if alphabet.is_empty() {
        return Err(PluginError::invalid_input(
            "enable at least one of a - z, A - Z or 0 - 9",
        ));
    }

    let body: String = (0..settings.str_length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect();
    Ok(format!("{}{}{}", settings.prefix, body, settings.suffix))
}

#[derive(Debug, Default)]
pub struct RandomGenerator {
    settings: RandomSettings,
}

impl MinimalPlugin for RandomGenerator {
    fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        self.settings = ctx.load_settings(validate)?;

        let app = ctx.app().clone();
        let slice = ctx.settings().clone();
        ctx.add_command(Command::new(
            "generate-random-string",
            "Generate random string",
            move || {
                let settings = read_slice(&slice, validate)?;
                let text = generate(&settings, &mut OsRng)?;
                app.write_clipboard(&text)?;
                app.notice(&format!("Copy {text}"));
                Ok(())
            },
        ))?;
        ctx.log_debug("RandomGenerator loaded");
        Ok(())
    }

    fn display_settings(&self, container: &mut SettingsContainer) {
        container
            .add(SettingItem::number(
                "strLength",
                "Length",
                i64::from(self.settings.str_length),
            ))
            .add(SettingItem::toggle(
                "useLowercaseAlphabet",
                "a - z",
                self.settings.use_lowercase_alphabet,
            ))
            .add(SettingItem::toggle(
                "useUppercaseAlphabet",
                "A - Z",
                self.settings.use_uppercase_alphabet,
            ))
            .add(SettingItem::toggle("useNumber", "0 - 9", self.settings.use_number))
            .add(SettingItem::text("prefix", "Prefix", &self.settings.prefix))
            .add(SettingItem::text("suffix", "Suffix", &self.settings.suffix));
    }

    fn on_setting_changed(
        &mut self,
        key: &str,
        value: &Value,
        ctx: &mut PluginContext,
    ) -> Result<(), PluginError> {
        let mut next = self.settings.clone();
        match key {
            "strLength" => {
                next.str_length = int_value(key, value)
                    .ok()
                    .and_then(|length| u32::try_from(length).ok())
                    .filter(|length| *length > 0)
                    .ok_or_else(|| {
                        PluginError::invalid_input("Length must be a positive integer")
                    })?;
            }
            "useLowercaseAlphabet" => next.use_lowercase_alphabet = bool_value(key, value)?,
            "useUppercaseAlphabet" => next.use_uppercase_alphabet = bool_value(key, value)?,
            "useNumber" => next.use_number = bool_value(key, value)?,
            "prefix" => next.prefix = text_value(key, value)?,
            "suffix" => next.suffix = text_value(key, value)?,
            _ => return Err(PluginError::UnknownSetting(key.to_string())),
        }

        ctx.store_settings(&next)?;
        self.settings = next;
        Ok(())
    }
}
