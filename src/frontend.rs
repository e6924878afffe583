//! Index page bootstrap.

use crate::config::ConfigError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::response::Html;
use std::path::Path as FsPath;
use tracing::{debug, instrument};

const SELECTED_GAME_ID: &str = "{{selected_game_id}}";
const AUTOGENERATED_GAME_ID: &str = "{{autogenerated_game_id}}";
const ANALYTICS_ID: &str = "{{analytics_id}}";

/// The index template, loaded once at startup.
#[derive(Debug, Clone)]
pub struct IndexPage {
    template: String,
    analytics_id: String,
}

impl IndexPage {
    /// Wraps an in-memory template.
    pub fn new(template: impl Into<String>, analytics_id: Option<String>) -> Self {
        Self {
            template: template.into(),
            analytics_id: analytics_id.unwrap_or_default(),
        }
    }

    /// Reads `index.html` from `frontend_dir`.
    #[instrument(skip_all, fields(dir = %frontend_dir.as_ref().display()))]
    pub fn load(
        frontend_dir: impl AsRef<FsPath>,
        analytics_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = frontend_dir.as_ref().join("index.html");
        let template = std::fs::read_to_string(&path).map_err(|e| {
            ConfigError::new(format!("Failed to read template {}: {}", path.display(), e))
        })?;
        debug!(bytes = template.len(), "Loaded index template");
        Ok(Self::new(template, analytics_id))
    }

    /// Fills in the template placeholders in a single pass over the
    /// template. Substituted values are never scanned again.
    pub fn render(&self, selected_game_id: &str, autogenerated_game_id: &str) -> String {
        let placeholders = [
            (SELECTED_GAME_ID, selected_game_id),
            (AUTOGENERATED_GAME_ID, autogenerated_game_id),
            (ANALYTICS_ID, self.analytics_id.as_str()),
        ];

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            match placeholders
                .iter()
                .find(|(placeholder, _)| tail.starts_with(*placeholder))
            {
                Some((placeholder, value)) => {
                    out.push_str(&escape_html(value));
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    out.push_str("{{");
                    rest = &tail[2..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// GET /
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Html<String> {
    render_for(&state, "")
}

/// GET /{id}
#[instrument(skip(state))]
pub async fn index_for_game(State(state): State<AppState>, Path(id): Path<String>) -> Html<String> {
    render_for(&state, &id)
}

fn render_for(state: &AppState, selected: &str) -> Html<String> {
    let autogenerated = state.corpus().autogenerate_id(state.store());
    Html(state.index().render(selected, &autogenerated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_and_escapes() {
        let page = IndexPage::new(
            "<p>{{selected_game_id}}|{{autogenerated_game_id}}|{{analytics_id}}</p>",
            Some("UA-1".to_string()),
        );
        assert_eq!(
            page.render("<x>", "otter"),
            "<p>&lt;x&gt;|otter|UA-1</p>"
        );
    }

    #[test]
    fn test_values_are_not_substituted_twice() {
        let page = IndexPage::new(
            "sel={{selected_game_id}};auto={{autogenerated_game_id}}",
            None,
        );
        assert_eq!(
            page.render("{{autogenerated_game_id}}", "wombat"),
            "sel={{autogenerated_game_id}};auto=wombat"
        );
    }

    #[test]
    fn test_unknown_braces_are_kept() {
        let page = IndexPage::new("{{other}} {{selected_game_id}}{", None);
        assert_eq!(page.render("otter", ""), "{{other}} otter{");
    }

    #[test]
    fn test_missing_analytics_id_renders_empty() {
        let page = IndexPage::new("[{{analytics_id}}]", None);
        assert_eq!(page.render("", ""), "[]");
    }
}
