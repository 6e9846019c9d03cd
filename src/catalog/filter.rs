//! Derived views: tab/search filtering and per-category grouping.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{ALL_CATEGORY, LOCAL_SEARCH_ENGINE};
use crate::models::{Category, RgbColor, Site};

/// A search engine selectable in the search bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchEngine {
    /// Identifier stored in the layout settings.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Query URL with a `{query}` placeholder; `None` for the local engine.
    pub url_template: Option<&'static str>,
}

/// Engines offered by the search bar. The first one filters locally.
pub const SEARCH_ENGINES: &[SearchEngine] = &[
    SearchEngine {
        id: LOCAL_SEARCH_ENGINE,
        name: "This page",
        url_template: None,
    },
    SearchEngine {
        id: "google",
        name: "Google",
        url_template: Some("https://www.google.com/search?q={query}"),
    },
    SearchEngine {
        id: "bing",
        name: "Bing",
        url_template: Some("https://www.bing.com/search?q={query}"),
    },
    SearchEngine {
        id: "duckduckgo",
        name: "DuckDuckGo",
        url_template: Some("https://duckduckgo.com/?q={query}"),
    },
];

/// Looks up a search engine by id.
pub fn search_engine(id: &str) -> Option<&'static SearchEngine> {
    SEARCH_ENGINES.iter().find(|engine| engine.id == id)
}

/// URL to open for `query` on an external engine.
///
/// `None` for the local engine, unknown engines and blank queries.
pub fn external_search_url(engine_id: &str, query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let template = search_engine(engine_id)?.url_template?;
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    Some(template.replace("{query}", &encoded))
}

/// Sites visible for a tab and search query, in their original order.
///
/// A site passes when its category is not hidden, the tab is "All" or the
/// site's category, and, for the local engine with a non-blank query, the
/// query is a case-insensitive substring of name + description. External
/// engines bypass the text filter entirely.
pub fn filter_sites<'a>(
    sites: &'a [Site],
    hidden: &BTreeSet<String>,
    active_tab: &str,
    query: &str,
    engine_id: &str,
) -> Vec<&'a Site> {
    let needle = query.trim().to_lowercase();
    let text_filter = engine_id == LOCAL_SEARCH_ENGINE && !needle.is_empty();

    sites
        .iter()
        .filter(|site| !hidden.contains(&site.category))
        .filter(|site| active_tab == ALL_CATEGORY || site.category == active_tab)
        .filter(|site| {
            !text_filter
                || format!("{}{}", site.name, site.description)
                    .to_lowercase()
                    .contains(&needle)
        })
        .collect()
}

/// One category section of the "All" view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteGroup<'a> {
    /// Category name.
    pub category: &'a str,
    /// Category color.
    pub color: RgbColor,
    /// Sites in the group, in their filtered order.
    pub sites: Vec<&'a Site>,
}

/// Groups already-filtered sites by category, in stored category order.
///
/// Hidden and empty categories produce no group.
pub fn group_sites<'a>(
    categories: &'a [Category],
    colors: &BTreeMap<String, RgbColor>,
    hidden: &BTreeSet<String>,
    sites: &[&'a Site],
    fallback_color: RgbColor,
) -> Vec<SiteGroup<'a>> {
    categories
        .iter()
        .filter(|category| !hidden.contains(&category.name))
        .filter_map(|category| {
            let members: Vec<&Site> = sites
                .iter()
                .copied()
                .filter(|site| site.category == category.name)
                .collect();
            (!members.is_empty()).then(|| SiteGroup {
                category: &category.name,
                color: colors.get(&category.name).copied().unwrap_or(fallback_color),
                sites: members,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, description: &str, category: &str) -> Site {
        Site::new(name, format!("https://{}.example", name.to_lowercase()), category)
            .with_id(name)
            .with_description(description)
    }

    fn sample() -> Vec<Site> {
        vec![
            site("GitHub", "Code hosting", "Dev"),
            site("Reddit", "Front page", "Fun"),
            site("Docs", "Rust std docs", "Dev"),
            site("YouTube", "Videos", "Fun"),
        ]
    }

    fn ids(sites: &[&Site]) -> Vec<String> {
        sites.iter().map(|s| s.id.to_string()).collect()
    }

    #[test]
    fn test_all_tab_no_query_returns_everything_in_order() {
        let sites = sample();
        let filtered = filter_sites(&sites, &BTreeSet::new(), ALL_CATEGORY, "", LOCAL_SEARCH_ENGINE);
        assert_eq!(ids(&filtered), ["GitHub", "Reddit", "Docs", "YouTube"]);
    }

    #[test]
    fn test_tab_filter() {
        let sites = sample();
        let filtered = filter_sites(&sites, &BTreeSet::new(), "Dev", "", LOCAL_SEARCH_ENGINE);
        assert_eq!(ids(&filtered), ["GitHub", "Docs"]);
    }

    #[test]
    fn test_hidden_categories_excluded_even_on_their_tab() {
        let sites = sample();
        let hidden = BTreeSet::from(["Fun".to_string()]);

        let all = filter_sites(&sites, &hidden, ALL_CATEGORY, "", LOCAL_SEARCH_ENGINE);
        assert_eq!(ids(&all), ["GitHub", "Docs"]);

        let tab = filter_sites(&sites, &hidden, "Fun", "", LOCAL_SEARCH_ENGINE);
        assert!(tab.is_empty());
    }

    #[test]
    fn test_local_query_matches_name_and_description() {
        let sites = sample();
        let hidden = BTreeSet::new();

        let by_name = filter_sites(&sites, &hidden, ALL_CATEGORY, "git", LOCAL_SEARCH_ENGINE);
        assert_eq!(ids(&by_name), ["GitHub"]);

        let by_description = filter_sites(&sites, &hidden, ALL_CATEGORY, "  RUST ", LOCAL_SEARCH_ENGINE);
        assert_eq!(ids(&by_description), ["Docs"]);

        // The concatenation is searched, so a query may span both fields
        let spanning = filter_sites(&sites, &hidden, ALL_CATEGORY, "tubevid", LOCAL_SEARCH_ENGINE);
        assert_eq!(ids(&spanning), ["YouTube"]);
    }

    #[test]
    fn test_external_engine_bypasses_text_filter() {
        let sites = sample();
        let filtered = filter_sites(&sites, &BTreeSet::new(), ALL_CATEGORY, "git", "google");
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_external_search_url() {
        assert_eq!(
            external_search_url("duckduckgo", "rust lang"),
            Some("https://duckduckgo.com/?q=rust+lang".to_string())
        );
        assert_eq!(external_search_url(LOCAL_SEARCH_ENGINE, "rust"), None);
        assert_eq!(external_search_url("google", "   "), None);
        assert_eq!(external_search_url("altavista", "rust"), None);
    }

    #[test]
    fn test_group_sites_follows_category_order() {
        let sites = sample();
        let categories = vec![
            Category::new("Fun").unwrap(),
            Category::new("Empty").unwrap(),
            Category::new("Dev").unwrap(),
        ];
        let colors = BTreeMap::from([("Dev".to_string(), RgbColor::new(1, 1, 1))]);
        let filtered = filter_sites(&sites, &BTreeSet::new(), ALL_CATEGORY, "", LOCAL_SEARCH_ENGINE);

        let groups = group_sites(&categories, &colors, &BTreeSet::new(), &filtered, RgbColor::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Fun");
        assert_eq!(ids(&groups[0].sites), ["Reddit", "YouTube"]);
        assert_eq!(groups[0].color, RgbColor::default());
        assert_eq!(groups[1].category, "Dev");
        assert_eq!(groups[1].color, RgbColor::new(1, 1, 1));
    }

    #[test]
    fn test_group_sites_skips_hidden() {
        let sites = sample();
        let categories = vec![Category::new("Dev").unwrap(), Category::new("Fun").unwrap()];
        let hidden = BTreeSet::from(["Dev".to_string()]);
        let refs: Vec<&Site> = sites.iter().collect();

        let groups = group_sites(&categories, &BTreeMap::new(), &hidden, &refs, RgbColor::default());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, "Fun");
    }
}
