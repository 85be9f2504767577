//! Selection read from stdin

use std::io::Read;
use std::sync::OnceLock;

use toolbox_plugin_api::Editor;

use super::{SharedInput, SharedOutput, TerminalApp, lock};

/// The selection is the rest of stdin, read on first use. Replacing it
/// prints the replacement to stdout.
pub struct StdinEditor {
    input: SharedInput,
    stdout: SharedOutput,
    selection: OnceLock<String>,
}

impl StdinEditor {
    pub fn new(input: SharedInput, stdout: SharedOutput) -> Self {
        Self {
            input,
            stdout,
            selection: OnceLock::new(),
        }
    }
}

impl Editor for StdinEditor {
    fn selection(&self) -> String {
        self.selection
            .get_or_init(|| {
                let mut text = String::new();
                if let Err(e) = lock(&self.input).read_to_string(&mut text) {
                    tracing::warn!(error = %e, "Failed to read selection");
                }
                text.trim_end_matches(['\r', '\n']).to_string()
            })
            .clone()
    }

    fn replace_selection(&self, text: &str) {
        if let Err(e) = TerminalApp::write_line(&self.stdout, text) {
            tracing::warn!(error = %e, "Failed to print replacement");
        }
    }
}
