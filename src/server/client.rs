use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

use crate::languages;

const CLIENT_TEMPLATE: &str = include_str!("templates/client.html.tera");

/// Single-page UI talking to the `/api` routes.
pub(crate) fn render_client_html(languages: &[String]) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert(
        "languages_json",
        &serde_json::to_string(&languages::language_options(languages))?,
    );
    Tera::one_off(CLIENT_TEMPLATE, &context, false)
        .with_context(|| "failed to render client template")
}
