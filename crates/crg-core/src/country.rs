//! Preset jurisdictions and the client-side selector over them.

/// A preset jurisdiction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub name: &'static str,
    pub code: &'static str,
    pub region: &'static str,
    pub status: &'static str,
}

const fn country(name: &'static str, code: &'static str, region: &'static str, status: &'static str) -> Country {
    Country { name, code, region, status }
}

pub const PRESET_COUNTRIES: &[Country] = &[
    country("United States", "US", "North America", "Complex"),
    country("United Arab Emirates", "AE", "Middle East", "Crypto-Friendly"),
    country("Singapore", "SG", "Asia", "Regulated"),
    country("Switzerland", "CH", "Europe", "Crypto Valley"),
    country("Hong Kong", "HK", "Asia", "Emerging Hub"),
    country("United Kingdom", "GB", "Europe", "Strict"),
    country("El Salvador", "SV", "Latin America", "Legal Tender"),
    country("Malta", "MT", "Europe", "Blockchain Island"),
    country("European Union (MiCA)", "EU", "Europe", "Comprehensive"),
    country("Japan", "JP", "Asia", "Strict"),
    country("South Korea", "KR", "Asia", "Strict"),
    country("Germany", "DE", "Europe", "Tax-Friendly"),
];

/// Presets whose name or region contains `term`, case-insensitively.
pub fn filter_countries(term: &str) -> Vec<&'static Country> {
    let term = term.to_lowercase();
    PRESET_COUNTRIES
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&term) || c.region.to_lowercase().contains(&term))
        .collect()
}

/// Search box plus highlighted row over the preset catalogue
#[derive(Debug, Clone, Default)]
pub struct CountrySelector {
    search: String,
    selected: usize,
}

impl CountrySelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.selected = 0;
    }

    pub fn push_char(&mut self, c: char) {
        self.search.push(c);
        self.selected = 0;
    }

    pub fn pop_char(&mut self) {
        self.search.pop();
        self.selected = 0;
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.selected = 0;
    }

    pub fn filtered(&self) -> Vec<&'static Country> {
        filter_countries(&self.search)
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.filtered().is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn nav_down(&mut self) {
        let len = self.filtered().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Typed text offered as an ad hoc jurisdiction when no preset matches.
    pub fn custom_candidate(&self) -> Option<&str> {
        let trimmed = self.search.trim();
        if !trimmed.is_empty() && self.filtered().is_empty() {
            Some(trimmed)
        } else {
            None
        }
    }

    /// Jurisdiction chosen by Enter: the highlighted preset, else the custom text.
    pub fn confirm(&self) -> Option<String> {
        let filtered = self.filtered();
        if let Some(country) = filtered.get(self.selected) {
            return Some(country.name.to_string());
        }
        self.custom_candidate().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_lists_all_presets() {
        assert_eq!(filter_countries("").len(), 12);
    }

    #[test]
    fn test_filter_matches_region_case_insensitive() {
        let names: Vec<&str> = filter_countries("ASIA").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Singapore", "Hong Kong", "Japan", "South Korea"]);
    }

    #[test]
    fn test_filter_matches_name_substring() {
        let names: Vec<&str> = filter_countries("united").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["United States", "United Arab Emirates", "United Kingdom"]);
    }

    #[test]
    fn test_custom_candidate_only_without_matches() {
        let mut selector = CountrySelector::new();
        selector.set_search("Malta");
        assert_eq!(selector.custom_candidate(), None);
        assert_eq!(selector.confirm().as_deref(), Some("Malta"));

        selector.set_search("  Brazil ");
        assert_eq!(selector.custom_candidate(), Some("Brazil"));
        assert_eq!(selector.confirm().as_deref(), Some("Brazil"));
        assert_eq!(selector.selected_index(), None);
    }

    #[test]
    fn test_blank_search_without_matches_offers_nothing() {
        let mut selector = CountrySelector::new();
        selector.set_search("   ");
        assert!(selector.filtered().is_empty());
        assert!(selector.custom_candidate().is_none());
    }

    #[test]
    fn test_navigation_clamps_and_resets_on_edit() {
        let mut selector = CountrySelector::new();
        selector.set_search("europe");
        for _ in 0..20 {
            selector.nav_down();
        }
        assert_eq!(selector.selected_index(), Some(selector.filtered().len() - 1));
        selector.push_char('x');
        assert_eq!(selector.selected_index(), None);
        selector.pop_char();
        assert_eq!(selector.selected_index(), Some(0));
        assert_eq!(selector.confirm().as_deref(), Some("Switzerland"));
    }
}
