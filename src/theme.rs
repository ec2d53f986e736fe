//! Light/dark theme toggle.
//!
//! The published site has a single toggle button that flips a `data-theme`
//! attribute on `<html>`, swaps the button glyph, and remembers the choice in
//! `localStorage`. This module holds that behavior as a small state machine
//! so it can be tested without a browser, plus the HTML the pages embed.
//!
//! ## Ports
//!
//! The three browser globals the toggle touches are traits:
//!
//! | Port | Browser counterpart |
//! |------|---------------------|
//! | [`PreferenceStore`] | `localStorage.getItem` / `setItem` |
//! | [`ColorSchemeHint`] | `matchMedia("(prefers-color-scheme: dark)")` |
//! | [`ThemeSurface`] | `document.documentElement.dataset.theme`, button text |
//!
//! ## Initial state
//!
//! ```text
//! stored preference  →  OS color-scheme hint  →  light
//! ```
//!
//! Resolving the initial state never writes to the store; only an explicit
//! toggle persists.

use maud::{Markup, PreEscaped, html};
use std::collections::HashMap;
use std::fmt;

/// Storage key holding the theme name.
pub const STORAGE_KEY: &str = "theme";
/// Attribute set on the document root.
pub const THEME_ATTRIBUTE: &str = "data-theme";
/// `id` of the toggle button.
pub const BUTTON_ID: &str = "theme-toggle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a stored value. Anything unrecognized is treated as absent.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// Button glyph: the icon shows what a click switches to.
    pub fn glyph(self) -> &'static str {
        match self {
            Theme::Light => "\u{1F319}",
            Theme::Dark => "\u{2600}\u{FE0F}",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent key-value storage.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// The OS-level color scheme signal. `None` when the platform gives none.
pub trait ColorSchemeHint {
    fn prefers_dark(&self) -> Option<bool>;
}

/// The visible document state the toggle drives.
pub trait ThemeSurface {
    fn set_theme_attribute(&mut self, theme: Theme);
    fn set_icon(&mut self, glyph: &str);
}

/// In-memory store, for hosts without persistent storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Resolve the theme to show on page load.
pub fn resolve_initial(store: &impl PreferenceStore, hint: &impl ColorSchemeHint) -> Theme {
    if let Some(theme) = store.get(STORAGE_KEY).as_deref().and_then(Theme::parse) {
        return theme;
    }
    match hint.prefers_dark() {
        Some(true) => Theme::Dark,
        _ => Theme::Light,
    }
}

/// The toggle controller: owns the store and the surface for one page view.
pub struct ThemeToggle<S, D> {
    store: S,
    surface: D,
    current: Theme,
}

impl<S: PreferenceStore, D: ThemeSurface> ThemeToggle<S, D> {
    /// Resolve the initial theme and paint it. Does not persist.
    pub fn init(store: S, hint: &impl ColorSchemeHint, mut surface: D) -> Self {
        let current = resolve_initial(&store, hint);
        surface.set_theme_attribute(current);
        surface.set_icon(current.glyph());
        Self {
            store,
            surface,
            current,
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Flip the theme, repaint, persist. Returns the new theme.
    pub fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        self.surface.set_theme_attribute(self.current);
        self.surface.set_icon(self.current.glyph());
        self.store.set(STORAGE_KEY, self.current.as_str());
        self.current
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// Tear down, e.g. to hand the store to the next page view.
    pub fn into_parts(self) -> (S, D) {
        (self.store, self.surface)
    }
}

/// The toggle button as initially rendered for `theme`.
pub fn toggle_button(theme: Theme) -> Markup {
    html! {
        button #(BUTTON_ID) type="button" aria-label="Toggle dark mode" title="Toggle dark mode" {
            (theme.glyph())
        }
    }
}

/// Inline script for `<head>`: applies the theme before first paint and
/// wires the button. Mirrors [`resolve_initial`] and [`ThemeToggle::toggle`].
pub fn init_script() -> Markup {
    let script = format!(
        r#"(function () {{
  var key = "{key}", attr = "{attr}";
  var glyphs = {{ light: "{light}", dark: "{dark}" }};
  var stored = null;
  try {{ stored = localStorage.getItem(key); }} catch (e) {{}}
  var theme = stored === "light" || stored === "dark" ? stored
    : (window.matchMedia && window.matchMedia("(prefers-color-scheme: dark)").matches ? "dark" : "light");
  document.documentElement.setAttribute(attr, theme);
  document.addEventListener("DOMContentLoaded", function () {{
    var button = document.getElementById("{button}");
    if (!button) return;
    button.textContent = glyphs[theme];
    button.addEventListener("click", function () {{
      theme = theme === "dark" ? "light" : "dark";
      document.documentElement.setAttribute(attr, theme);
      button.textContent = glyphs[theme];
      try {{ localStorage.setItem(key, theme); }} catch (e) {{}}
    }});
  }});
}})();"#,
        key = STORAGE_KEY,
        attr = THEME_ATTRIBUTE,
        light = Theme::Light.glyph(),
        dark = Theme::Dark.glyph(),
        button = BUTTON_ID,
    );
    html! {
        script { (PreEscaped(script)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hint(Option<bool>);

    impl ColorSchemeHint for Hint {
        fn prefers_dark(&self) -> Option<bool> {
            self.0
        }
    }

    /// Records every paint so tests can check the visible state.
    #[derive(Default)]
    struct RecordingSurface {
        attribute: Option<Theme>,
        icon: String,
        paints: usize,
    }

    impl ThemeSurface for RecordingSurface {
        fn set_theme_attribute(&mut self, theme: Theme) {
            self.attribute = Some(theme);
            self.paints += 1;
        }

        fn set_icon(&mut self, glyph: &str) {
            self.icon = glyph.to_string();
        }
    }

    fn stored(theme: &str) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.set(STORAGE_KEY, theme);
        store
    }

    // =========================================================================
    // resolve_initial() tests
    // =========================================================================

    #[test]
    fn stored_preference_wins_over_hint() {
        assert_eq!(resolve_initial(&stored("light"), &Hint(Some(true))), Theme::Light);
        assert_eq!(resolve_initial(&stored("dark"), &Hint(Some(false))), Theme::Dark);
    }

    #[test]
    fn hint_used_when_nothing_stored() {
        let store = MemoryStore::default();
        assert_eq!(resolve_initial(&store, &Hint(Some(true))), Theme::Dark);
        assert_eq!(resolve_initial(&store, &Hint(Some(false))), Theme::Light);
    }

    #[test]
    fn defaults_to_light_without_signal() {
        assert_eq!(resolve_initial(&MemoryStore::default(), &Hint(None)), Theme::Light);
    }

    #[test]
    fn garbage_stored_value_is_ignored() {
        assert_eq!(resolve_initial(&stored("sepia"), &Hint(Some(true))), Theme::Dark);
    }

    // =========================================================================
    // ThemeToggle tests
    // =========================================================================

    #[test]
    fn init_paints_without_persisting() {
        let toggle = ThemeToggle::init(
            MemoryStore::default(),
            &Hint(Some(true)),
            RecordingSurface::default(),
        );
        assert_eq!(toggle.current(), Theme::Dark);
        assert_eq!(toggle.surface().attribute, Some(Theme::Dark));
        assert_eq!(toggle.surface().icon, Theme::Dark.glyph());
        let (store, _) = toggle.into_parts();
        assert_eq!(store.get(STORAGE_KEY), None);
    }

    #[test]
    fn toggle_flips_repaints_and_persists() {
        let mut toggle = ThemeToggle::init(
            MemoryStore::default(),
            &Hint(None),
            RecordingSurface::default(),
        );
        assert_eq!(toggle.toggle(), Theme::Dark);
        assert_eq!(toggle.surface().attribute, Some(Theme::Dark));
        assert_eq!(toggle.surface().icon, Theme::Dark.glyph());
        assert_eq!(toggle.surface().paints, 2);

        let (store, _) = toggle.into_parts();
        assert_eq!(store.get(STORAGE_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn two_toggles_return_to_original() {
        let mut toggle = ThemeToggle::init(
            stored("dark"),
            &Hint(Some(false)),
            RecordingSurface::default(),
        );
        toggle.toggle();
        toggle.toggle();
        assert_eq!(toggle.current(), Theme::Dark);
        assert_eq!(toggle.surface().attribute, Some(Theme::Dark));
    }

    #[test]
    fn choice_survives_reload() {
        let mut first_view = ThemeToggle::init(
            MemoryStore::default(),
            &Hint(Some(false)),
            RecordingSurface::default(),
        );
        first_view.toggle();
        let (store, _) = first_view.into_parts();

        // The OS hint disagrees; the stored choice must still win.
        let reloaded = ThemeToggle::init(store, &Hint(Some(false)), RecordingSurface::default());
        assert_eq!(reloaded.current(), Theme::Dark);
        assert_eq!(reloaded.surface().attribute, Some(Theme::Dark));
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn toggle_button_markup() {
        let html = toggle_button(Theme::Light).into_string();
        assert!(html.starts_with("<button id=\"theme-toggle\" type=\"button\""));
        assert!(html.contains(Theme::Light.glyph()));
        assert!(html.ends_with("</button>"));
    }

    #[test]
    fn init_script_uses_shared_constants() {
        let html = init_script().into_string();
        assert!(html.starts_with("<script>"));
        assert!(html.contains("var key = \"theme\", attr = \"data-theme\""));
        assert!(html.contains("getElementById(\"theme-toggle\")"));
        assert!(html.contains("prefers-color-scheme: dark"));
    }
}
