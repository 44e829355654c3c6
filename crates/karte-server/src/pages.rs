//! Server-rendered HTML.
//!
//! The index page is a `minijinja` template embedded at compile time.
//! Templates ending in `.html` are auto-escaped, so chat content is safe to
//! interpolate.

use karte_types::{ChatMessage, Pin, PinCategory};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::error::ApiError;
use crate::server::ServerError;

/// The embedded index template.
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// The browser script served at `/static/app.js`.
pub const APP_JS: &str = include_str!("../static/app.js");

/// Compiled page templates.
pub struct Pages {
    env: Environment<'static>,
}

/// A category option in the confirm form.
#[derive(Serialize)]
struct CategoryOption {
    value: &'static str,
    label: String,
}

impl Pages {
    /// Compile the embedded templates.
    pub fn new() -> Result<Self, ServerError> {
        let mut env = Environment::new();
        env.add_template_owned("index.html", INDEX_TEMPLATE.to_owned())
            .map_err(|e| ServerError::Setup(format!("index template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the index page.
    pub fn index(
        &self,
        messages: &[ChatMessage],
        pins: &[Pin],
        google_maps_api_key: &str,
    ) -> Result<String, ApiError> {
        let categories: Vec<CategoryOption> = PinCategory::ALL
            .iter()
            .map(|c| CategoryOption {
                value: c.as_str(),
                label: c.title(),
            })
            .collect();

        self.env
            .get_template("index.html")
            .map_err(|e| ApiError::Internal(format!("missing index template: {e}")))?
            .render(context! {
                messages => messages,
                pins => pins,
                categories => categories,
                google_maps_api_key => google_maps_api_key,
            })
            .map_err(|e| ApiError::Internal(format!("index render failed: {e}")))
    }
}
