//! HTML views served to the Teams client.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::config::Config;

const HOME_TEMPLATE: &str = "home";
const TAB_TEMPLATE: &str = "tab";
const CONFIG_TEMPLATE: &str = "config";

/// Settings handed to `microsoftTeams.pages.config.setConfig` when the tab is saved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSettings {
    pub website_url: String,
    pub content_url: String,
    pub entity_id: String,
    pub suggested_display_name: String,
}

impl TabSettings {
    pub fn from_config(config: &Config) -> Self {
        let tab_url = config.tab_url();
        Self {
            website_url: tab_url.clone(),
            content_url: tab_url,
            entity_id: config.tab.entity_id.clone(),
            suggested_display_name: config.tab.display_name.clone(),
        }
    }
}

pub struct Views {
    registry: Handlebars<'static>,
    teams_js_url: String,
    display_name: String,
    tab_settings: TabSettings,
}

impl Views {
    pub fn new(config: &Config) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        for (name, source) in [
            (HOME_TEMPLATE, include_str!("templates/home.hbs")),
            (TAB_TEMPLATE, include_str!("templates/tab.hbs")),
            (CONFIG_TEMPLATE, include_str!("templates/config.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .with_context(|| format!("Failed to register {} template", name))?;
        }

        Ok(Self {
            registry,
            teams_js_url: config.tab.teams_js_url.clone(),
            display_name: config.tab.display_name.clone(),
            tab_settings: TabSettings::from_config(config),
        })
    }

    /// Transcript page. `transcript` is rendered as-is (HTML-escaped).
    pub fn home(&self, transcript: &str) -> Result<String> {
        self.render(
            HOME_TEMPLATE,
            &json!({
                "teams_js_url": self.teams_js_url,
                "transcript": transcript,
            }),
        )
    }

    pub fn tab(&self) -> Result<String> {
        self.render(
            TAB_TEMPLATE,
            &json!({
                "teams_js_url": self.teams_js_url,
                "display_name": self.display_name,
            }),
        )
    }

    pub fn config_page(&self) -> Result<String> {
        // Inlined into a <script> block, so keep "</script>" out of the JSON.
        let tab_settings = serde_json::to_string(&self.tab_settings)
            .context("Failed to serialize tab settings")?
            .replace('<', "\\u003c");

        self.render(
            CONFIG_TEMPLATE,
            &json!({
                "teams_js_url": self.teams_js_url,
                "display_name": self.display_name,
                "tab_settings": tab_settings,
            }),
        )
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String> {
        self.registry
            .render(name, data)
            .with_context(|| format!("Failed to render {} view", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views() -> Views {
        let mut config = Config::default();
        config.server.public_base_url = "https://bot.example.com".to_string();
        Views::new(&config).unwrap()
    }

    #[test]
    fn test_home_renders_transcript() {
        let html = views().home("Format: WEBVTT").unwrap();
        assert!(html.contains(r#"<pre id="transcript">Format: WEBVTT</pre>"#));
    }

    #[test]
    fn test_home_escapes_transcript() {
        let html = views().home("Format: <v Ada>Hi</v>").unwrap();
        assert!(html.contains("Format: &lt;v Ada&gt;Hi&lt;/v&gt;"));
        assert!(!html.contains("<v Ada>"));
    }

    #[test]
    fn test_tab_renders_display_name() {
        let html = views().tab().unwrap();
        assert!(html.contains("<h2>Botatwork MOM</h2>"));
        assert!(html.contains("/home?meetingId="));
    }

    #[test]
    fn test_config_page_points_at_tab() {
        let html = views().config_page().unwrap();
        assert!(html.contains(r#""contentUrl":"https://bot.example.com/tab""#));
        assert!(html.contains(r#""websiteUrl":"https://bot.example.com/tab""#));
        assert!(html.contains(r#""entityId":"BotMeetingTab""#));
        assert!(html.contains(r#""suggestedDisplayName":"Botatwork MOM""#));
        assert!(html.contains("teams-js/2.19.0"));
    }

    #[test]
    fn test_config_page_keeps_script_closed() {
        let mut config = Config::default();
        config.tab.display_name = "</script><b>x".to_string();
        let html = Views::new(&config).unwrap().config_page().unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }
}
