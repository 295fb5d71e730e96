//! Route and last-search persistence.

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    models::{Category, SearchQuery},
    route::{Route, RouteEntry},
    storage::KeyValueStore,
};

/// Storage key of the route snapshot.
pub const ROUTE_KEY: &str = "travelRoute";
/// Storage key of the last search.
pub const LAST_SEARCH_KEY: &str = "lastSearch";
/// Newest record layout this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

const DISPLAY_TIMESTAMP: &str = "%d.%m.%Y, %H:%M:%S";

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn display_now() -> String {
    Local::now().format(DISPLAY_TIMESTAMP).to_string()
}

/// Serialized form of a saved route.
///
/// `total_places` and `total_hours` are display data written at save time;
/// they are never read back into the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSnapshot {
    /// Record layout version.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Entries in visiting order.
    #[serde(default)]
    pub route: Vec<RouteEntry>,
    /// Local time of the save, formatted for display.
    #[serde(default)]
    pub saved_at: String,
    /// Entry count at save time.
    #[serde(default)]
    pub total_places: usize,
    /// Visit hours at save time.
    #[serde(default)]
    pub total_hours: u32,
}

impl RouteSnapshot {
    /// Capture the current route.
    pub fn capture(route: &Route) -> Self {
        let stats = route.stats();
        Self {
            schema_version: SCHEMA_VERSION,
            route: route.entries().to_vec(),
            saved_at: display_now(),
            total_places: stats.count,
            total_hours: stats.total_hours,
        }
    }

    /// Rebuild the route; positions and totals are re-derived from the entries.
    pub fn into_route(self) -> Route {
        Route::from_entries(self.route)
    }
}

/// Serialized form of the last search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSearch {
    /// Record layout version.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// City as typed.
    #[serde(default)]
    pub city: String,
    /// Category key; unknown or missing values fall back to the default category.
    #[serde(default)]
    pub category: Option<String>,
    /// Local time of the search, formatted for display.
    #[serde(default)]
    pub date: String,
}

impl LastSearch {
    fn capture(query: &SearchQuery) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            city: query.city.clone(),
            category: Some(query.category.key().to_string()),
            date: display_now(),
        }
    }

    /// Convert to a search query, defaulting unknown categories.
    pub fn into_query(self) -> SearchQuery {
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => Category::default(),
            Some(name) => name.parse().unwrap_or_else(|err| {
                warn!("Stored search has {err}; using default category");
                Category::default()
            }),
        };
        SearchQuery {
            city: self.city,
            category,
        }
    }
}

fn check_version(version: u32, key: &str) -> Result<()> {
    if version > SCHEMA_VERSION {
        bail!("record {key} has unsupported schema version {version} (newest supported {SCHEMA_VERSION})");
    }
    Ok(())
}

/// Reads and writes persisted planner records through a key-value store.
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist the route, returning the written snapshot.
    pub fn save_route(&self, route: &Route) -> Result<RouteSnapshot> {
        let snapshot = RouteSnapshot::capture(route);
        let serialized =
            serde_json::to_string_pretty(&snapshot).context("failed to serialize route")?;
        self.store
            .set(ROUTE_KEY, &serialized)
            .context("failed to store route")?;
        debug!(places = snapshot.total_places, hours = snapshot.total_hours, "Route saved");
        Ok(snapshot)
    }

    /// Load the saved route, if any.
    pub fn load_route(&self) -> Result<Option<Route>> {
        let Some(raw) = self.store.get(ROUTE_KEY).context("failed to read route")? else {
            return Ok(None);
        };
        let snapshot: RouteSnapshot =
            serde_json::from_str(&raw).context("failed to parse stored route")?;
        check_version(snapshot.schema_version, ROUTE_KEY)?;
        Ok(Some(snapshot.into_route()))
    }

    /// Forget the saved route.
    pub fn clear_route(&self) -> Result<()> {
        self.store
            .remove(ROUTE_KEY)
            .context("failed to remove stored route")
    }

    /// Persist the search form.
    pub fn save_last_search(&self, query: &SearchQuery) -> Result<()> {
        let record = LastSearch::capture(query);
        let serialized =
            serde_json::to_string(&record).context("failed to serialize last search")?;
        self.store
            .set(LAST_SEARCH_KEY, &serialized)
            .context("failed to store last search")
    }

    /// Load the previous search, if any.
    pub fn load_last_search(&self) -> Result<Option<SearchQuery>> {
        let Some(raw) = self
            .store
            .get(LAST_SEARCH_KEY)
            .context("failed to read last search")?
        else {
            return Ok(None);
        };
        let record: LastSearch =
            serde_json::from_str(&raw).context("failed to parse stored search")?;
        check_version(record.schema_version, LAST_SEARCH_KEY)?;
        Ok(Some(record.into_query()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog,
        storage::{FileStore, MemoryStore},
    };
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_route() -> Route {
        let mut route = Route::new();
        for place in catalog::generate("Paris", Category::Museums).into_iter().take(3) {
            route.add(place);
        }
        route
    }

    #[test]
    fn route_round_trip_through_files() -> Result<()> {
        let dir = tempdir()?;
        let route = sample_route();

        let snapshot = Persistence::new(FileStore::new(dir.path())).save_route(&route)?;
        assert_eq!(snapshot.total_places, 3);
        assert_eq!(snapshot.total_hours, 7);
        assert!(!snapshot.saved_at.is_empty());

        let fresh = Persistence::new(FileStore::new(dir.path()));
        let loaded = fresh.load_route()?.expect("saved route");
        assert_eq!(loaded.ids(), route.ids());
        let hours = |r: &Route| r.entries().iter().map(|e| e.place.hours).collect::<Vec<_>>();
        assert_eq!(hours(&loaded), hours(&route));
        assert_eq!(loaded, route);
        Ok(())
    }

    #[test]
    fn stored_totals_are_ignored() -> Result<()> {
        let store = MemoryStore::new();
        let persistence = Persistence::new(&store);
        let route = sample_route();
        persistence.save_route(&route)?;

        let mut value: serde_json::Value =
            serde_json::from_str(&store.get(ROUTE_KEY)?.unwrap_or_default())?;
        value["totalPlaces"] = json!(99);
        value["totalHours"] = json!(1000);
        value["route"][0]["position"] = json!(42);
        store.set(ROUTE_KEY, &value.to_string())?;

        let loaded = persistence.load_route()?.expect("saved route");
        assert_eq!(loaded.stats().count, 3);
        assert_eq!(loaded.stats().total_hours, 7);
        let positions: Vec<usize> = loaded.entries().iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn snapshot_without_version_or_route_loads_empty() -> Result<()> {
        let store = MemoryStore::new();
        store.set(ROUTE_KEY, "{\"savedAt\":\"01.01.2024, 10:00:00\"}")?;
        let loaded = Persistence::new(&store).load_route()?.expect("record");
        assert!(loaded.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_or_newer_records_error() -> Result<()> {
        let store = MemoryStore::new();
        let persistence = Persistence::new(&store);

        store.set(ROUTE_KEY, "{not json")?;
        assert!(persistence.load_route().is_err());

        store.set(ROUTE_KEY, "{\"schemaVersion\":2,\"route\":[]}")?;
        assert!(persistence.load_route().is_err());

        store.set(LAST_SEARCH_KEY, "[1,2]")?;
        assert!(persistence.load_last_search().is_err());
        Ok(())
    }

    #[test]
    fn last_search_defaults() -> Result<()> {
        let store = MemoryStore::new();
        let persistence = Persistence::new(&store);
        assert_eq!(persistence.load_last_search()?, None);

        store.set(LAST_SEARCH_KEY, "{}")?;
        assert_eq!(persistence.load_last_search()?, Some(SearchQuery::default()));

        store.set(LAST_SEARCH_KEY, "{\"city\":\"Kazan\",\"category\":\"nightlife\"}")?;
        assert_eq!(
            persistence.load_last_search()?,
            Some(SearchQuery::new("Kazan", Category::Historic))
        );

        let query = SearchQuery::new("Tver", Category::Architecture);
        persistence.save_last_search(&query)?;
        assert_eq!(persistence.load_last_search()?, Some(query));
        Ok(())
    }

    #[test]
    fn clear_removes_record() -> Result<()> {
        let store = MemoryStore::new();
        let persistence = Persistence::new(&store);
        persistence.save_route(&sample_route())?;
        persistence.clear_route()?;
        assert!(persistence.load_route()?.is_none());
        Ok(())
    }

    #[test]
    fn write_failure_is_reported() {
        let store = MemoryStore::new();
        store.set_read_only(true);
        let err = Persistence::new(&store)
            .save_route(&sample_route())
            .expect_err("read-only store");
        assert!(err.to_string().contains("failed to store route"));
    }
}
