//! Tab state for the notes front end.
//!
//! Rendering is declarative: each panel asks [`TabState::is_visible`] instead
//! of toggling elements by lookup.

/// Closed set of panels in the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    Config,
    DataCenter,
    ImportNotes,
    #[default]
    Notes,
    ProvidedBackups,
}

impl Tab {
    /// Tabs in display order.
    pub const ALL: [Tab; 5] = [
        Tab::Config,
        Tab::DataCenter,
        Tab::ImportNotes,
        Tab::Notes,
        Tab::ProvidedBackups,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Config => "Config",
            Self::DataCenter => "Data Center",
            Self::ImportNotes => "Import Notes",
            Self::Notes => "Notes",
            Self::ProvidedBackups => "Provided Backups",
        }
    }

    /// Parses a tab button label. Matching ignores case and surrounding space.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|tab| tab.label().eq_ignore_ascii_case(label))
    }
}

/// Current tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabState {
    active: Tab,
}

impl TabState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(self) -> Tab {
        self.active
    }

    /// Switches to `tab`; returns whether the selection changed.
    pub fn select(&mut self, tab: Tab) -> bool {
        let changed = self.active != tab;
        self.active = tab;
        changed
    }

    /// Switches by button label; unknown labels leave the state unchanged.
    pub fn select_label(&mut self, label: &str) -> Option<Tab> {
        let tab = Tab::from_label(label)?;
        self.select(tab);
        Some(tab)
    }

    pub fn is_visible(self, tab: Tab) -> bool {
        self.active == tab
    }
}

#[cfg(test)]
mod tests {
    use super::{Tab, TabState};

    #[test]
    fn starts_on_notes_tab() {
        let state = TabState::new();
        assert_eq!(state.active(), Tab::Notes);
        assert!(state.is_visible(Tab::Notes));
        assert!(!state.is_visible(Tab::Config));
    }

    #[test]
    fn exactly_one_tab_is_visible_after_each_transition() {
        let mut state = TabState::new();
        for tab in Tab::ALL {
            state.select(tab);
            let visible = Tab::ALL.iter().filter(|t| state.is_visible(**t)).count();
            assert_eq!(visible, 1);
            assert_eq!(state.active(), tab);
        }
    }

    #[test]
    fn select_reports_changes() {
        let mut state = TabState::new();
        assert!(!state.select(Tab::Notes));
        assert!(state.select(Tab::ImportNotes));
    }

    #[test]
    fn labels_round_trip_and_unknown_labels_are_ignored() {
        for tab in Tab::ALL {
            assert_eq!(Tab::from_label(tab.label()), Some(tab));
        }
        assert_eq!(Tab::from_label(" data center "), Some(Tab::DataCenter));

        let mut state = TabState::new();
        assert_eq!(state.select_label("Settings"), None);
        assert_eq!(state.active(), Tab::Notes);
        assert_eq!(state.select_label("Provided Backups"), Some(Tab::ProvidedBackups));
    }
}
