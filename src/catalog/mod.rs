//! The live catalog and its mutation operations.
//!
//! [`CatalogStore`] owns sites, categories, category colors, the hidden
//! category set, layout settings, branding, theme and custom fonts. Every
//! mutation goes through an explicit method that
//!
//! - keeps the invariants (sites only reference existing categories,
//!   every category has a color, orders are contiguous),
//! - records which persisted fields it touched (see [`TrackedField`]),
//! - notifies subscribers with a [`CatalogEvent`].
//!
//! The store is a plain owned value driven by a single writer; it performs
//! no I/O. Persistence is layered on top by
//! [`CatalogSession`](crate::services::persistence::CatalogSession).

pub mod filter;
pub mod ordering;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{ALL_CATEGORY, BRAND_COLOR};
use crate::error::{CatalogError, Result};
use crate::models::{
    merge_fields, AppConfig, CatalogSnapshot, Category, CategoryColorAssigner, CustomFont,
    LayoutSettings, RgbColor, Site, SiteId, ThemeMode, TrackedField,
};

pub use filter::{external_search_url, SearchEngine, SiteGroup, SEARCH_ENGINES};
pub use ordering::{reorder, Direction, DragState, Identified, OrderedCollection};

/// A change notification delivered to subscribers after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A site was created or replaced.
    SiteUpserted(SiteId),
    /// A site was deleted.
    SiteDeleted(SiteId),
    /// Sites changed order.
    SitesReordered,
    /// A category was created.
    CategoryAdded(String),
    /// A category and its sites were deleted.
    CategoryDeleted {
        /// The deleted category.
        name: String,
        /// Ids of the sites deleted with it.
        removed_sites: Vec<SiteId>,
    },
    /// A category was hidden or shown.
    CategoryVisibilityChanged {
        /// The category.
        name: String,
        /// Whether it is now hidden.
        hidden: bool,
    },
    /// A category's color changed.
    CategoryColorChanged(String),
    /// Categories changed order.
    CategoriesReordered,
    /// Layout, branding, theme or fonts changed.
    SettingsChanged(TrackedField),
    /// A snapshot was merged in; lists the fields it replaced.
    Imported(Vec<TrackedField>),
}

/// Callback invoked with every [`CatalogEvent`].
pub type Listener = Box<dyn FnMut(&CatalogEvent) + Send>;

/// The in-memory catalog aggregate.
pub struct CatalogStore {
    sites: OrderedCollection<Site>,
    categories: OrderedCollection<Category>,
    category_colors: BTreeMap<String, RgbColor>,
    hidden_categories: BTreeSet<String>,
    layout: LayoutSettings,
    config: AppConfig,
    theme: ThemeMode,
    custom_fonts: Vec<CustomFont>,
    assigner: CategoryColorAssigner,
    dirty: BTreeSet<TrackedField>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogStore")
            .field("sites", &self.sites.len())
            .field("categories", &self.categories.len())
            .field("hidden_categories", &self.hidden_categories)
            .field("dirty", &self.dirty)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// Creates an empty catalog with default settings.
    pub fn new() -> Self {
        Self {
            sites: OrderedCollection::default(),
            categories: OrderedCollection::default(),
            category_colors: BTreeMap::new(),
            hidden_categories: BTreeSet::new(),
            layout: LayoutSettings::default(),
            config: AppConfig::default(),
            theme: ThemeMode::default(),
            custom_fonts: Vec::new(),
            assigner: CategoryColorAssigner::default(),
            dirty: BTreeSet::new(),
            listeners: Vec::new(),
        }
    }

    /// Hydrates a catalog from persisted state.
    ///
    /// Fields missing from `snapshot` keep their defaults. Loading is not a
    /// mutation: only fields the normalization pass had to repair (missing
    /// categories, unassigned colors) are left dirty.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut store = Self::new();
        if let Some(sites) = snapshot.sites {
            store.replace_sites(sites);
        }
        if let Some(categories) = snapshot.categories {
            store.replace_categories(categories);
        }
        if let Some(colors) = snapshot.category_colors {
            store.category_colors = colors;
        }
        if let Some(hidden) = snapshot.hidden_categories {
            store.hidden_categories = hidden.into_iter().collect();
        }
        if let Some(layout) = snapshot.layout {
            store.layout = layout;
        }
        if let Some(config) = snapshot.config {
            store.config = config;
        }
        if let Some(theme) = snapshot.theme {
            store.theme = theme;
        }
        if let Some(fonts) = snapshot.custom_fonts {
            store.custom_fonts = fonts;
        }

        store.dirty = store.normalize();
        store
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Sites in display order.
    pub fn sites(&self) -> &[Site] {
        self.sites.as_slice()
    }

    /// Site by id.
    pub fn site(&self, id: &SiteId) -> Option<&Site> {
        self.sites.get(id)
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[Category] {
        self.categories.as_slice()
    }

    /// Whether a category with `name` exists.
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains(&name.to_string())
    }

    /// Category name to color.
    pub fn category_colors(&self) -> &BTreeMap<String, RgbColor> {
        &self.category_colors
    }

    /// Color a category is drawn with; "All" is always the brand color.
    pub fn category_color(&self, name: &str) -> RgbColor {
        self.assigner.color_of(name, &self.category_colors)
    }

    /// Names of hidden categories.
    pub fn hidden_categories(&self) -> &BTreeSet<String> {
        &self.hidden_categories
    }

    /// Whether a category is hidden.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden_categories.contains(name)
    }

    /// Grid and card settings.
    pub fn layout(&self) -> &LayoutSettings {
        &self.layout
    }

    /// Branding.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Theme preference.
    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    /// Uploaded fonts.
    pub fn custom_fonts(&self) -> &[CustomFont] {
        &self.custom_fonts
    }

    // ------------------------------------------------------------------
    // Site operations
    // ------------------------------------------------------------------

    /// Creates a site, or replaces the site with the same id in place.
    ///
    /// New sites are appended at the end. Returns `true` if a site was
    /// replaced.
    pub fn upsert_site(&mut self, mut site: Site) -> Result<bool> {
        if !self.has_category(&site.category) {
            return Err(CatalogError::UnknownCategory(site.category));
        }

        let id = site.id.clone();
        let existing_order = self.sites.get(&id).map(|existing| existing.order);
        let replaced = match existing_order {
            Some(order) => {
                site.order = order;
                self.sites.upsert(site)
            }
            None => {
                self.sites.upsert(site);
                self.sites.renumber();
                false
            }
        };

        debug!(site = %id, replaced, "Upserted site");
        self.touch(&[TrackedField::Sites]);
        self.emit(&CatalogEvent::SiteUpserted(id));
        Ok(replaced)
    }

    /// Deletes a site, returning it.
    pub fn delete_site(&mut self, id: &SiteId) -> Result<Site> {
        let removed = self
            .sites
            .remove(id)
            .ok_or_else(|| CatalogError::SiteNotFound(id.clone()))?;
        self.sites.renumber();

        debug!(site = %id, "Deleted site");
        self.touch(&[TrackedField::Sites]);
        self.emit(&CatalogEvent::SiteDeleted(id.clone()));
        Ok(removed)
    }

    /// Moves a site into the slot of another (drag commit).
    pub fn reorder_sites(&mut self, source: &SiteId, target: &SiteId) -> bool {
        let moved = self.sites.reorder(source, target);
        if moved {
            self.touch(&[TrackedField::Sites]);
            self.emit(&CatalogEvent::SitesReordered);
        }
        moved
    }

    /// Ends a site drag gesture and commits it if it landed on another site.
    pub fn commit_site_drag(&mut self, drag: &mut DragState<SiteId>) -> bool {
        match drag.end() {
            Some((source, target)) => self.reorder_sites(&source, &target),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Category operations
    // ------------------------------------------------------------------

    /// Creates a category at the end of the list.
    ///
    /// Existing categories are left untouched (returns `false`). The new
    /// category gets a palette color if it has none.
    pub fn upsert_category(&mut self, name: &str) -> Result<bool> {
        let category = Category::new(name)?;
        if self.has_category(&category.name) {
            return Ok(false);
        }

        let name = category.name.clone();
        self.categories.upsert(category);
        self.categories.renumber();
        self.ensure_colors();

        debug!(category = %name, "Added category");
        self.touch(&[TrackedField::Categories, TrackedField::CategoryColors]);
        self.emit(&CatalogEvent::CategoryAdded(name));
        Ok(true)
    }

    /// Deletes a category together with every site in it.
    ///
    /// Returns the deleted sites. Either everything goes or, for an unknown
    /// category, nothing changes.
    pub fn delete_category(&mut self, name: &str) -> Result<Vec<Site>> {
        let key = name.to_string();
        if !self.categories.contains(&key) {
            return Err(CatalogError::CategoryNotFound(key));
        }

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.sites.len());
        for site in std::mem::take(&mut self.sites).into_vec() {
            if site.category == key {
                removed.push(site);
            } else {
                kept.push(site);
            }
        }
        self.sites = OrderedCollection::new(kept);
        self.sites.renumber();

        self.categories.remove(&key);
        self.categories.renumber();
        self.category_colors.remove(&key);
        let was_hidden = self.hidden_categories.remove(&key);

        debug!(category = %key, removed = removed.len(), "Deleted category");
        let mut fields = vec![
            TrackedField::Sites,
            TrackedField::Categories,
            TrackedField::CategoryColors,
        ];
        if was_hidden {
            fields.push(TrackedField::HiddenCategories);
        }
        self.touch(&fields);
        self.emit(&CatalogEvent::CategoryDeleted {
            name: key,
            removed_sites: removed.iter().map(|site| site.id.clone()).collect(),
        });
        Ok(removed)
    }

    /// Flips a category between hidden and shown, returning the new state.
    pub fn toggle_category_visibility(&mut self, name: &str) -> Result<bool> {
        let key = name.to_string();
        if !self.categories.contains(&key) {
            return Err(CatalogError::CategoryNotFound(key));
        }

        let hidden = if self.hidden_categories.remove(&key) {
            false
        } else {
            self.hidden_categories.insert(key.clone());
            true
        };

        self.touch(&[TrackedField::HiddenCategories]);
        self.emit(&CatalogEvent::CategoryVisibilityChanged { name: key, hidden });
        Ok(hidden)
    }

    /// Overrides a category's color.
    pub fn set_category_color(&mut self, name: &str, color: RgbColor) -> Result<()> {
        let key = name.to_string();
        if !self.categories.contains(&key) {
            return Err(CatalogError::CategoryNotFound(key));
        }

        self.category_colors.insert(key.clone(), color);
        self.touch(&[TrackedField::CategoryColors]);
        self.emit(&CatalogEvent::CategoryColorChanged(key));
        Ok(())
    }

    /// Swaps the category at `index` with its neighbour in `direction`.
    ///
    /// No-op at either boundary.
    pub fn reorder_categories(&mut self, index: usize, direction: Direction) -> bool {
        let moved = self.categories.swap_adjacent(index, direction);
        if moved {
            self.touch(&[TrackedField::Categories]);
            self.emit(&CatalogEvent::CategoriesReordered);
        }
        moved
    }

    /// Moves a category into the slot of another (drag commit).
    pub fn reorder_categories_by_name(&mut self, source: &str, target: &str) -> bool {
        let moved = self
            .categories
            .reorder(&source.to_string(), &target.to_string());
        if moved {
            self.touch(&[TrackedField::Categories]);
            self.emit(&CatalogEvent::CategoriesReordered);
        }
        moved
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Replaces the layout settings.
    pub fn set_layout(&mut self, layout: LayoutSettings) {
        self.layout = layout;
        self.touch(&[TrackedField::Layout]);
        self.emit(&CatalogEvent::SettingsChanged(TrackedField::Layout));
    }

    /// Merges a partial layout over the current one.
    pub fn merge_layout(&mut self, patch: &Map<String, Value>) -> Result<()> {
        let merged = merge_fields(&self.layout, patch)?;
        self.set_layout(merged);
        Ok(())
    }

    /// Replaces the branding record.
    pub fn set_config(&mut self, config: AppConfig) {
        self.config = config;
        self.touch(&[TrackedField::Config]);
        self.emit(&CatalogEvent::SettingsChanged(TrackedField::Config));
    }

    /// Sets the theme preference.
    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
        self.touch(&[TrackedField::Theme]);
        self.emit(&CatalogEvent::SettingsChanged(TrackedField::Theme));
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// Sites shown for a tab, search query and search engine.
    ///
    /// See [`filter::filter_sites`] for the exact rules.
    pub fn filtered_sites(&self, active_tab: &str, query: &str, engine_id: &str) -> Vec<&Site> {
        filter::filter_sites(
            self.sites.as_slice(),
            &self.hidden_categories,
            active_tab,
            query,
            engine_id,
        )
    }

    /// The "All" view: filtered sites grouped by category in stored order.
    pub fn grouped_sites(&self, query: &str, engine_id: &str) -> Vec<SiteGroup<'_>> {
        let filtered = self.filtered_sites(ALL_CATEGORY, query, engine_id);
        filter::group_sites(
            self.categories.as_slice(),
            &self.category_colors,
            &self.hidden_categories,
            &filtered,
            BRAND_COLOR,
        )
    }

    /// Tabs for the category bar: "All" followed by visible categories.
    pub fn tabs(&self) -> Vec<&str> {
        std::iter::once(ALL_CATEGORY)
            .chain(
                self.categories
                    .iter()
                    .filter(|category| !self.is_hidden(&category.name))
                    .map(|category| category.name.as_str()),
            )
            .collect()
    }

    /// Full snapshot of the catalog, for export and persistence.
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            sites: Some(self.sites.as_slice().to_vec()),
            categories: Some(self.categories.as_slice().to_vec()),
            category_colors: Some(self.category_colors.clone()),
            hidden_categories: Some(self.hidden_categories.iter().cloned().collect()),
            layout: Some(self.layout.clone()),
            config: Some(self.config.clone()),
            theme: Some(self.theme),
            custom_fonts: Some(self.custom_fonts.clone()),
        }
    }

    /// Current value of one persisted field, as written to storage.
    pub fn field_value(&self, field: TrackedField) -> serde_json::Result<Value> {
        match field {
            TrackedField::Sites => serde_json::to_value(self.sites.as_slice()),
            TrackedField::Categories => serde_json::to_value(self.categories.as_slice()),
            TrackedField::CategoryColors => serde_json::to_value(&self.category_colors),
            TrackedField::HiddenCategories => serde_json::to_value(&self.hidden_categories),
            TrackedField::Layout => serde_json::to_value(&self.layout),
            TrackedField::Config => serde_json::to_value(&self.config),
            TrackedField::Theme => serde_json::to_value(self.theme),
            TrackedField::CustomFonts => serde_json::to_value(&self.custom_fonts),
        }
    }

    // ------------------------------------------------------------------
    // Observation and dirty tracking
    // ------------------------------------------------------------------

    /// Registers a callback for every future [`CatalogEvent`].
    pub fn subscribe(&mut self, listener: impl FnMut(&CatalogEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Fields mutated since they were last marked clean.
    pub fn dirty_fields(&self) -> &BTreeSet<TrackedField> {
        &self.dirty
    }

    /// Marks a field as successfully persisted.
    pub fn mark_clean(&mut self, field: TrackedField) {
        self.dirty.remove(&field);
    }

    // ------------------------------------------------------------------
    // Crate-internal replacement, used by the import reconciler
    // ------------------------------------------------------------------

    pub(crate) fn replace_sites(&mut self, mut sites: Vec<Site>) {
        sites.sort_by_key(|site| site.order);
        let mut collection = OrderedCollection::default();
        for site in sites {
            collection.upsert(site);
        }
        collection.renumber();
        self.sites = collection;
    }

    pub(crate) fn replace_categories(&mut self, mut categories: Vec<Category>) {
        categories.sort_by_key(|category| category.order);
        let mut collection = OrderedCollection::default();
        for category in categories {
            if !collection.contains(&category.name) {
                collection.upsert(category);
            }
        }
        collection.renumber();
        self.categories = collection;
    }

    pub(crate) fn replace_category_colors(&mut self, colors: BTreeMap<String, RgbColor>) {
        self.category_colors = colors;
    }

    pub(crate) fn replace_hidden_categories(&mut self, hidden: Vec<String>) {
        self.hidden_categories = hidden.into_iter().collect();
    }

    pub(crate) fn replace_layout(&mut self, layout: LayoutSettings) {
        self.layout = layout;
    }

    pub(crate) fn replace_config(&mut self, config: AppConfig) {
        self.config = config;
    }

    pub(crate) fn replace_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
    }

    pub(crate) fn replace_custom_fonts(&mut self, fonts: Vec<CustomFont>) {
        self.custom_fonts = fonts;
    }

    /// Restores the invariants after wholesale replacement.
    ///
    /// Categories referenced by sites but missing are appended, hidden
    /// entries for unknown categories are dropped, and every category gets
    /// a color. Returns the fields that had to change.
    pub(crate) fn normalize(&mut self) -> BTreeSet<TrackedField> {
        let mut changed = BTreeSet::new();

        let missing: Vec<String> = self
            .sites
            .iter()
            .map(|site| site.category.clone())
            .filter(|name| !self.categories.contains(name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for name in missing {
            match Category::new(&name) {
                Ok(category) => {
                    debug!(category = %name, "Restoring category referenced by sites");
                    self.categories.upsert(category);
                    changed.insert(TrackedField::Categories);
                }
                Err(_) => {
                    let dropped = self.sites.retain(|site| site.category != name);
                    debug!(category = %name, dropped, "Dropping sites with an invalid category");
                    changed.insert(TrackedField::Sites);
                }
            }
        }
        if changed.contains(&TrackedField::Categories) {
            self.categories.renumber();
        }
        if changed.contains(&TrackedField::Sites) {
            self.sites.renumber();
        }

        let known: BTreeSet<String> = self.categories.iter().map(|c| c.name.clone()).collect();
        let hidden_before = self.hidden_categories.len();
        self.hidden_categories.retain(|name| known.contains(name));
        if self.hidden_categories.len() != hidden_before {
            changed.insert(TrackedField::HiddenCategories);
        }

        if self.ensure_colors() {
            changed.insert(TrackedField::CategoryColors);
        }

        changed
    }

    pub(crate) fn touch(&mut self, fields: &[TrackedField]) {
        self.dirty.extend(fields.iter().copied());
    }

    pub(crate) fn emit(&mut self, event: &CatalogEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    /// Assigns palette colors to uncolored categories; `true` if any changed.
    fn ensure_colors(&mut self) -> bool {
        let colors = self
            .assigner
            .ensure_colors(self.categories.as_slice(), &self.category_colors);
        let changed = colors != self.category_colors;
        self.category_colors = colors;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn store_with(categories: &[&str], sites: &[(&str, &str)]) -> CatalogStore {
        let mut store = CatalogStore::new();
        for name in categories {
            store.upsert_category(name).unwrap();
        }
        for (id, category) in sites {
            let site = Site::new(*id, format!("https://{id}.example"), *category).with_id(*id);
            store.upsert_site(site).unwrap();
        }
        store
    }

    fn site_ids(sites: &[&Site]) -> Vec<String> {
        sites.iter().map(|s| s.id.to_string()).collect()
    }

    #[test]
    fn test_upsert_site_requires_category() {
        let mut store = CatalogStore::new();
        let err = store
            .upsert_site(Site::new("GitHub", "https://github.com", "Dev"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCategory(name) if name == "Dev"));
        assert!(store.sites().is_empty());
    }

    #[test]
    fn test_upsert_site_replaces_in_place() {
        let mut store = store_with(&["Dev"], &[("a", "Dev"), ("b", "Dev"), ("c", "Dev")]);

        let edited = Site::new("Renamed", "https://b.example", "Dev").with_id("b");
        assert!(store.upsert_site(edited).unwrap());

        let sites = store.filtered_sites(ALL_CATEGORY, "", "local");
        assert_eq!(site_ids(&sites), ["a", "b", "c"]);
        assert_eq!(store.site(&"b".into()).unwrap().name, "Renamed");
        assert_eq!(store.site(&"b".into()).unwrap().order, 1);
    }

    #[test]
    fn test_delete_site() {
        let mut store = store_with(&["Dev"], &[("a", "Dev"), ("b", "Dev")]);
        let removed = store.delete_site(&"a".into()).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(store.sites()[0].order, 0);
        assert!(matches!(
            store.delete_site(&"a".into()),
            Err(CatalogError::SiteNotFound(_))
        ));
    }

    #[test]
    fn test_delete_category_cascades() {
        let mut store = store_with(
            &["Dev", "Fun"],
            &[("a", "Dev"), ("b", "Fun"), ("c", "Dev"), ("d", "Fun")],
        );
        store.toggle_category_visibility("Dev").unwrap();

        let removed = store.delete_category("Dev").unwrap();

        assert_eq!(removed.len(), 2);
        assert!(!store.has_category("Dev"));
        assert!(!store.category_colors().contains_key("Dev"));
        assert!(!store.is_hidden("Dev"));
        let remaining = store.filtered_sites(ALL_CATEGORY, "", "local");
        assert_eq!(site_ids(&remaining), ["b", "d"]);
        assert!(remaining.iter().all(|site| site.category != "Dev"));
    }

    #[test]
    fn test_delete_unknown_category_changes_nothing() {
        let mut store = store_with(&["Dev"], &[("a", "Dev")]);
        store.dirty.clear();

        assert!(matches!(
            store.delete_category("Nope"),
            Err(CatalogError::CategoryNotFound(_))
        ));
        assert_eq!(store.sites().len(), 1);
        assert!(store.dirty_fields().is_empty());
    }

    #[test]
    fn test_upsert_category_assigns_color_once() {
        let mut store = CatalogStore::new();
        assert!(store.upsert_category("Dev").unwrap());
        let color = store.category_color("Dev");

        assert!(!store.upsert_category(" Dev ").unwrap());
        assert_eq!(store.categories().len(), 1);
        assert_eq!(store.category_color("Dev"), color);
        assert_eq!(store.category_color(ALL_CATEGORY), BRAND_COLOR);
        assert!(store.upsert_category("All").is_err());
    }

    #[test]
    fn test_toggle_visibility() {
        let mut store = store_with(&["Dev", "Fun"], &[("a", "Dev"), ("b", "Fun")]);

        assert!(store.toggle_category_visibility("Fun").unwrap());
        assert_eq!(store.tabs(), [ALL_CATEGORY, "Dev"]);
        assert_eq!(site_ids(&store.filtered_sites(ALL_CATEGORY, "", "local")), ["a"]);

        assert!(!store.toggle_category_visibility("Fun").unwrap());
        assert_eq!(store.filtered_sites(ALL_CATEGORY, "", "local").len(), 2);
        assert!(store.toggle_category_visibility("Nope").is_err());
    }

    #[test]
    fn test_reorder_categories_adjacent() {
        let mut store = store_with(&["A", "B", "C"], &[]);

        assert!(!store.reorder_categories(0, Direction::Up));
        assert!(!store.reorder_categories(2, Direction::Down));
        assert!(store.reorder_categories(1, Direction::Up));

        let names: Vec<_> = store.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert_eq!(store.categories()[0].order, 0);
    }

    #[test]
    fn test_site_drag_commits_on_end_only() {
        let mut store = store_with(&["Dev"], &[("a", "Dev"), ("b", "Dev"), ("c", "Dev")]);
        let mut drag = DragState::default();

        drag.start("a".into());
        drag.hover(Some("c".into()));
        assert_eq!(site_ids(&store.filtered_sites(ALL_CATEGORY, "", "local")), ["a", "b", "c"]);

        assert!(store.commit_site_drag(&mut drag));
        assert_eq!(site_ids(&store.filtered_sites(ALL_CATEGORY, "", "local")), ["b", "c", "a"]);
        let orders: Vec<i64> = store.sites().iter().map(|s| s.order).collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[test]
    fn test_grouped_sites() {
        let mut store = store_with(
            &["Dev", "Empty", "Fun"],
            &[("a", "Fun"), ("b", "Dev"), ("c", "Fun")],
        );
        store.reorder_categories(2, Direction::Up);

        let groups = store.grouped_sites("", "local");
        let layout: Vec<(&str, Vec<String>)> = groups
            .iter()
            .map(|g| (g.category, site_ids(&g.sites)))
            .collect();

        assert_eq!(
            layout,
            [
                ("Dev", vec!["b".to_string()]),
                ("Fun", vec!["a".to_string(), "c".to_string()])
            ]
        );
    }

    #[test]
    fn test_subscribers_see_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut store = CatalogStore::new();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        store.upsert_category("Dev").unwrap();
        store.delete_category("Dev").unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], CatalogEvent::CategoryAdded("Dev".to_string()));
        assert_eq!(
            seen[1],
            CatalogEvent::CategoryDeleted {
                name: "Dev".to_string(),
                removed_sites: Vec::new()
            }
        );
    }

    #[test]
    fn test_dirty_tracking() {
        let mut store = store_with(&["Dev"], &[]);
        assert!(store.dirty_fields().contains(&TrackedField::Categories));
        assert!(store.dirty_fields().contains(&TrackedField::CategoryColors));

        store.mark_clean(TrackedField::Categories);
        store.mark_clean(TrackedField::CategoryColors);
        store.set_theme(ThemeMode::Dark);

        assert_eq!(
            store.dirty_fields().iter().copied().collect::<Vec<_>>(),
            [TrackedField::Theme]
        );
    }

    #[test]
    fn test_from_snapshot_repairs_invariants() {
        let snapshot = CatalogSnapshot {
            sites: Some(vec![
                Site::new("b", "https://b.example", "Fun").with_id("b"),
                Site::new("a", "https://a.example", "Dev").with_id("a"),
            ]),
            categories: Some(vec![Category::new("Dev").unwrap()]),
            hidden_categories: Some(vec!["Ghost".to_string()]),
            ..CatalogSnapshot::default()
        };

        let store = CatalogStore::from_snapshot(snapshot);

        assert!(store.has_category("Fun"));
        assert!(store.hidden_categories().is_empty());
        assert_eq!(store.category_colors().len(), 2);
        assert!(store.dirty_fields().contains(&TrackedField::Categories));
        assert!(store.dirty_fields().contains(&TrackedField::CategoryColors));
        assert!(!store.dirty_fields().contains(&TrackedField::Sites));
    }

    #[test]
    fn test_field_value_matches_snapshot_keys() {
        let store = store_with(&["Dev"], &[("a", "Dev")]);
        let snapshot = serde_json::to_value(store.snapshot()).unwrap();

        for field in TrackedField::ALL {
            assert_eq!(store.field_value(field).unwrap(), snapshot[field.key()]);
        }
    }
}
