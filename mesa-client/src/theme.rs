//! Theme resolver
//!
//! Pure deep-merge of the café's sparse server-side theme patch over
//! compiled-in defaults. The resolved theme is the single source of
//! truth pushed into presentation variables; saving writes the full
//! merged document back (last writer wins, no conflict resolution).

use crate::error::ClientResult;
use crate::store::StoreGateway;
use shared::models::{
    Fonts, GeneralColors, StatusColors, TableColors, Theme, ThemePatch,
};
use std::sync::Arc;
use tokio::sync::watch;

/// The platform-administration tenant always renders with the fixed
/// admin theme, regardless of its stored document.
pub const ADMIN_CAFE_ID: &str = "mesa-admin";

/// Compiled-in default theme.
pub fn defaults() -> Theme {
    Theme {
        general: GeneralColors {
            primary: "#6f4e37".into(),
            secondary: "#d2a679".into(),
            background: "#faf6f0".into(),
            surface: "#ffffff".into(),
            text: "#2b211a".into(),
        },
        tables: TableColors {
            free: "#8bc34a".into(),
            occupied: "#e57373".into(),
        },
        statuses: StatusColors {
            new: "#42a5f5".into(),
            preparing: "#ffb74d".into(),
            ready: "#66bb6a".into(),
            served: "#9e9e9e".into(),
        },
        fonts: Fonts {
            heading: "Playfair Display".into(),
            body: "Inter".into(),
        },
        card_radius: 12,
        logo_url: None,
        background_url: None,
        overlay_opacity: 40,
        hide_manager_entry: false,
    }
}

/// Fixed alternate theme for the admin tenant.
pub fn admin_theme() -> Theme {
    Theme {
        general: GeneralColors {
            primary: "#1a237e".into(),
            secondary: "#3949ab".into(),
            background: "#eceff1".into(),
            surface: "#ffffff".into(),
            text: "#102027".into(),
        },
        fonts: Fonts {
            heading: "IBM Plex Sans".into(),
            body: "IBM Plex Sans".into(),
        },
        card_radius: 4,
        hide_manager_entry: true,
        ..defaults()
    }
}

/// Resolve the complete theme for a café.
pub fn resolve(cafe_id: &str, patch: Option<&ThemePatch>) -> Theme {
    if cafe_id == ADMIN_CAFE_ID {
        return admin_theme();
    }
    let mut theme = defaults();
    let Some(patch) = patch else {
        return theme;
    };
    if let Some(general) = &patch.general {
        merge(&mut theme.general.primary, &general.primary);
        merge(&mut theme.general.secondary, &general.secondary);
        merge(&mut theme.general.background, &general.background);
        merge(&mut theme.general.surface, &general.surface);
        merge(&mut theme.general.text, &general.text);
    }
    if let Some(tables) = &patch.tables {
        merge(&mut theme.tables.free, &tables.free);
        merge(&mut theme.tables.occupied, &tables.occupied);
    }
    if let Some(statuses) = &patch.statuses {
        merge(&mut theme.statuses.new, &statuses.new);
        merge(&mut theme.statuses.preparing, &statuses.preparing);
        merge(&mut theme.statuses.ready, &statuses.ready);
        merge(&mut theme.statuses.served, &statuses.served);
    }
    if let Some(fonts) = &patch.fonts {
        merge(&mut theme.fonts.heading, &fonts.heading);
        merge(&mut theme.fonts.body, &fonts.body);
    }
    if let Some(radius) = patch.card_radius {
        theme.card_radius = radius;
    }
    if patch.logo_url.is_some() {
        theme.logo_url = patch.logo_url.clone();
    }
    if patch.background_url.is_some() {
        theme.background_url = patch.background_url.clone();
    }
    if let Some(opacity) = patch.overlay_opacity {
        theme.overlay_opacity = opacity;
    }
    if let Some(hide) = patch.hide_manager_entry {
        theme.hide_manager_entry = hide;
    }
    theme
}

fn merge(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Expand a complete theme into the full document stored server-side.
pub fn to_full_patch(theme: &Theme, cafe_id: &str) -> ThemePatch {
    ThemePatch {
        cafe_id: cafe_id.to_string(),
        general: Some(shared::models::GeneralColorsPatch {
            primary: Some(theme.general.primary.clone()),
            secondary: Some(theme.general.secondary.clone()),
            background: Some(theme.general.background.clone()),
            surface: Some(theme.general.surface.clone()),
            text: Some(theme.general.text.clone()),
        }),
        tables: Some(shared::models::TableColorsPatch {
            free: Some(theme.tables.free.clone()),
            occupied: Some(theme.tables.occupied.clone()),
        }),
        statuses: Some(shared::models::StatusColorsPatch {
            new: Some(theme.statuses.new.clone()),
            preparing: Some(theme.statuses.preparing.clone()),
            ready: Some(theme.statuses.ready.clone()),
            served: Some(theme.statuses.served.clone()),
        }),
        fonts: Some(shared::models::FontsPatch {
            heading: Some(theme.fonts.heading.clone()),
            body: Some(theme.fonts.body.clone()),
        }),
        card_radius: Some(theme.card_radius),
        logo_url: theme.logo_url.clone(),
        background_url: theme.background_url.clone(),
        overlay_opacity: Some(theme.overlay_opacity),
        hide_manager_entry: Some(theme.hide_manager_entry),
    }
}

/// Theme commands and the reactive resolved-theme channel
pub struct ThemeService {
    gateway: Arc<dyn StoreGateway>,
    tx: Arc<watch::Sender<Theme>>,
}

impl ThemeService {
    pub fn new(gateway: Arc<dyn StoreGateway>, tx: Arc<watch::Sender<Theme>>) -> Self {
        Self { gateway, tx }
    }

    /// Receiver for the presentation layer; the current value is always
    /// the latest resolved theme.
    pub fn watch(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }

    /// Persist an edited theme: merge over defaults, store the full
    /// merged document, and push the resolved value immediately (the
    /// realtime echo is an idempotent re-push).
    pub async fn save(&self, cafe_id: &str, patch: ThemePatch) -> ClientResult<Theme> {
        let resolved = resolve(cafe_id, Some(&patch));
        let stored = self
            .gateway
            .upsert_theme(to_full_patch(&resolved, cafe_id))
            .await?;
        let resolved = resolve(cafe_id, Some(&stored));
        let _ = self.tx.send(resolved.clone());
        tracing::info!(cafe_id = %cafe_id, "Theme saved");
        Ok(resolved)
    }
}
