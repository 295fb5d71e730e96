//! Planner state and command dispatch.
//!
//! Every user action becomes a [`Command`]. [`Planner::dispatch`] applies it to
//! the owned state and answers with an [`Outcome`]: an optional notice for the
//! user and an optional [`Effect`] the frontend must carry out (the catalog
//! fetch is asynchronous and completes with [`Command::CatalogLoaded`]).

use tracing::{debug, error, info, warn};

use crate::{
    catalog::CatalogError,
    models::{Place, PlaceId, SearchQuery},
    notice::Notice,
    persistence::Persistence,
    route::{AddOutcome, Route},
    storage::KeyValueStore,
};

/// A user action or completion event.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start loading the catalog for a query.
    SubmitSearch(SearchQuery),
    /// A catalog fetch finished.
    CatalogLoaded {
        /// Query the fetch actually ran, with a blank city already resolved.
        query: SearchQuery,
        /// Places, or the reason the fetch failed.
        result: Result<Vec<Place>, CatalogError>,
    },
    /// Show details for a catalog place.
    Select(PlaceId),
    /// Append a catalog place to the route.
    Add(PlaceId),
    /// Remove a place from the route.
    Remove(PlaceId),
    /// Replace the route order.
    Reorder(Vec<PlaceId>),
    /// Move the route entry at index `from` to index `to`.
    Move {
        /// Current index.
        from: usize,
        /// Target index, clamped to the route.
        to: usize,
    },
    /// Persist the route.
    Save,
    /// Empty the route and forget the saved copy.
    Clear,
}

/// Side effect requested by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the catalog for the query and report back with [`Command::CatalogLoaded`].
    Fetch(SearchQuery),
}

/// Result of dispatching a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Message for the user.
    pub notice: Option<Notice>,
    /// Work for the frontend.
    pub effect: Option<Effect>,
}

impl Outcome {
    fn none() -> Self {
        Self::default()
    }

    fn notice(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            effect: None,
        }
    }
}

/// Owned application state.
pub struct Planner<S> {
    persistence: Persistence<S>,
    query: SearchQuery,
    catalog: Vec<Place>,
    selected: Option<PlaceId>,
    route: Route,
    loading: bool,
}

impl<S: KeyValueStore> Planner<S> {
    /// Fresh planner with an empty route and default search.
    pub fn new(persistence: Persistence<S>) -> Self {
        Self {
            persistence,
            query: SearchQuery::default(),
            catalog: Vec::new(),
            selected: None,
            route: Route::new(),
            loading: false,
        }
    }

    /// Restore the saved route and last search.
    ///
    /// Unreadable records are logged and leave the corresponding state at its default.
    pub fn restore(&mut self) -> Option<Notice> {
        let mut notice = None;
        match self.persistence.load_route() {
            Ok(Some(route)) => {
                info!(places = route.len(), "Restored saved route");
                if !route.is_empty() {
                    notice = Some(Notice::info(format!(
                        "Loaded saved route ({} places)",
                        route.len()
                    )));
                }
                self.route = route;
            }
            Ok(None) => {}
            Err(err) => warn!("Ignoring saved route: {err:#}"),
        }
        match self.persistence.load_last_search() {
            Ok(Some(query)) => {
                debug!(city = %query.city, category = %query.category, "Restored last search");
                self.query = query;
            }
            Ok(None) => {}
            Err(err) => warn!("Ignoring saved search: {err:#}"),
        }
        notice
    }

    /// Apply a command.
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        match command {
            Command::SubmitSearch(query) => self.submit_search(query),
            Command::CatalogLoaded { query, result } => self.catalog_loaded(query, result),
            Command::Select(id) => {
                if self.catalog.iter().any(|place| place.id == id) {
                    self.selected = Some(id);
                }
                Outcome::none()
            }
            Command::Add(id) => self.add(id),
            Command::Remove(id) => {
                if self.route.remove(id) {
                    info!(%id, remaining = self.route.len(), "Removed place from route");
                }
                Outcome::none()
            }
            Command::Reorder(order) => {
                self.route.reorder(&order);
                debug!(places = self.route.len(), "Route reordered");
                Outcome::none()
            }
            Command::Move { from, to } => {
                if self.route.move_entry(from, to) {
                    debug!(from, to, "Route entry moved");
                }
                Outcome::none()
            }
            Command::Save => self.save(),
            Command::Clear => self.clear(),
        }
    }

    fn submit_search(&mut self, query: SearchQuery) -> Outcome {
        if self.loading {
            debug!("Search ignored while a fetch is in flight");
            return Outcome::none();
        }
        self.loading = true;
        self.query = query.clone();
        info!(city = %query.city, category = %query.category, "Search submitted");
        Outcome {
            notice: None,
            effect: Some(Effect::Fetch(query)),
        }
    }

    fn catalog_loaded(
        &mut self,
        query: SearchQuery,
        result: Result<Vec<Place>, CatalogError>,
    ) -> Outcome {
        self.loading = false;
        match result {
            Ok(places) => {
                info!(count = places.len(), city = %query.city, "Catalog loaded");
                if let Some(selected) = self.selected {
                    if !places.iter().any(|place| place.id == selected) {
                        self.selected = None;
                    }
                }
                self.catalog = places;
                let record = SearchQuery::new(query.city.trim(), query.category);
                match self.persistence.save_last_search(&record) {
                    Ok(()) => Outcome::none(),
                    Err(err) => {
                        error!("Failed to remember search: {err:#}");
                        Outcome::notice(Notice::error("Failed to remember search"))
                    }
                }
            }
            Err(err) => {
                error!(?err, "Catalog load failed");
                Outcome::notice(Notice::error(format!("Failed to load places: {err}")))
            }
        }
    }

    fn add(&mut self, id: PlaceId) -> Outcome {
        let Some(place) = self.catalog.iter().find(|place| place.id == id).cloned() else {
            return Outcome::none();
        };
        let name = place.name.clone();
        match self.route.add(place) {
            AddOutcome::Added(position) => {
                info!(%id, position, "Added place to route");
                Outcome::notice(Notice::success(format!("\"{name}\" added to route")))
            }
            AddOutcome::AlreadyPresent => {
                Outcome::notice(Notice::info("This place is already in the route"))
            }
        }
    }

    fn save(&mut self) -> Outcome {
        match self.persistence.save_route(&self.route) {
            Ok(snapshot) => {
                info!(places = snapshot.total_places, saved_at = %snapshot.saved_at, "Route saved");
                Outcome::notice(Notice::success("Route saved!"))
            }
            Err(err) => {
                error!("Route save failed: {err:#}");
                Outcome::notice(Notice::error("Failed to save route"))
            }
        }
    }

    fn clear(&mut self) -> Outcome {
        self.route.clear();
        match self.persistence.clear_route() {
            Ok(()) => {
                info!("Route cleared");
                Outcome::notice(Notice::warning("Route cleared"))
            }
            Err(err) => {
                error!("Failed to remove saved route: {err:#}");
                Outcome::notice(Notice::error(
                    "Route cleared, but the saved copy could not be removed",
                ))
            }
        }
    }

    /// Current (or last submitted) search.
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Places from the most recent successful fetch.
    pub fn catalog(&self) -> &[Place] {
        &self.catalog
    }

    /// The route.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Place whose details are shown.
    pub fn selected(&self) -> Option<&Place> {
        let id = self.selected?;
        self.catalog.iter().find(|place| place.id == id)
    }

    /// Whether a catalog fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Persistence adapter.
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }
}
