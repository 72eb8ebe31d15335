//! Loads and renders the embedded `.j2` installer template.
//!
//! Grounded in `cargo-dist/src/backend/templates.rs`'s `Templates` struct:
//! templates are baked into the binary via `include_dir!` rather than read
//! from disk at runtime, rendered through a single `minijinja::Environment`,
//! and newline-normalized afterward via `newline_converter::dos2unix` so the
//! output is byte-identical regardless of the host that built the binary.
//! binstaller only ever renders one template, so the directory-tree walking
//! machinery the teacher needs for its five installer flavors is collapsed
//! down to a single lookup.

use include_dir::{include_dir, Dir};
use minijinja::Environment;
use newline_converter::dos2unix;
use serde::Serialize;

use crate::errors::DistResult;

const TEMPLATE_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Key for the one template this crate renders.
pub const TEMPLATE_INSTALLER_SH: &str = "installer.sh.j2";

/// The fixed POSIX shell library embedded in every generated installer,
/// never passed through Jinja: it contains no per-spec variation, so
/// templating it would only risk mangling shell syntax that happens to
/// look like `{{ }}`.
pub const RUNTIME_LIB_SH: &str = include_str!("../../templates/runtime.sh");

/// Holds the loaded `Environment` templates are rendered through.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Load templates baked into the binary.
    pub fn new() -> DistResult<Self> {
        let mut env = Environment::new();
        env.set_debug(true);
        for file in TEMPLATE_DIR.files() {
            let path = file.path().to_string_lossy().into_owned();
            let contents = file
                .contents_utf8()
                .expect("embedded templates are UTF-8 source files");
            env.add_template_owned(path, contents.to_string())
                .expect("embedded jinja2 templates must be well-formed");
        }
        Ok(Templates { env })
    }

    /// Render `TEMPLATE_INSTALLER_SH` against `val`, normalizing newlines.
    pub fn render_installer(&self, val: &impl Serialize) -> DistResult<String> {
        let template = self.env.get_template(TEMPLATE_INSTALLER_SH)?;
        let rendered = template.render(val)?;
        Ok(dos2unix(&rendered).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_embedded_templates_without_panicking() {
        Templates::new().expect("templates must load");
    }
}
