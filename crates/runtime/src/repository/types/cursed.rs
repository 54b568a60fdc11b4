//! Persisted shape of a cursed loot item.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wardrobe_core::{CursedItem, CursedKind, Precedence, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursedDocument {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub in_pool: bool,
    #[serde(default)]
    pub applied: Option<Timestamp>,
    #[serde(default)]
    pub release: Option<Timestamp>,
    #[serde(default)]
    pub precedence: Precedence,
    #[serde(default)]
    pub can_override: bool,
    pub kind: CursedKind,
}

impl From<&CursedItem> for CursedDocument {
    fn from(item: &CursedItem) -> Self {
        Self {
            id: item.id,
            label: item.label.clone(),
            in_pool: item.in_pool,
            applied: item.applied,
            release: item.release,
            precedence: item.precedence,
            can_override: item.can_override,
            kind: item.kind,
        }
    }
}

impl CursedDocument {
    /// Converts into a domain item. A half-set or inverted application
    /// window is reset to inactive.
    pub fn into_item(self) -> Option<CursedItem> {
        if self.id.is_nil() {
            tracing::warn!(label = %self.label, "cursed item without id dropped");
            return None;
        }
        let mut item = CursedItem::new(self.label, self.kind)
            .with_precedence(self.precedence);
        item.id = self.id;
        item.in_pool = self.in_pool;
        item.can_override = self.can_override;

        match (self.applied, self.release) {
            (Some(applied), Some(release)) if item.activate(applied, release) => {}
            (None, None) => {}
            _ => tracing::warn!(id = %item.id, "inconsistent cursed item window reset"),
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use wardrobe_core::GagType;

    #[test]
    fn half_set_window_is_reset() {
        let mut doc = CursedDocument::from(&CursedItem::new(
            "mimic",
            CursedKind::Gag(GagType::DuctTape),
        ));
        doc.applied = Some(Utc::now());
        let item = doc.into_item().unwrap();
        assert!(!item.is_active());
        assert!(item.release.is_none());
    }

    #[test]
    fn active_window_is_kept() {
        let now = Utc::now();
        let mut source = CursedItem::new("mimic", CursedKind::Gag(GagType::DuctTape));
        assert!(source.activate(now, now + TimeDelta::minutes(10)));
        let item = CursedDocument::from(&source).into_item().unwrap();
        assert_eq!(item, source);
    }
}
