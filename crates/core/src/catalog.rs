//! Mock catalog of places, generated per city and category.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    models::{Category, Place, PlaceId, SearchQuery},
};

/// Errors raised while producing a catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The category name is not one of the known values.
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    /// The simulated fetch reported a failure.
    #[error("failed to load places for {city}")]
    FetchFailed {
        /// City the fetch was issued for.
        city: String,
    },
}

struct Template {
    name: &'static str,
    description: &'static str,
    hours: u32,
}

const fn template(name: &'static str, description: &'static str, hours: u32) -> Template {
    Template {
        name,
        description,
        hours,
    }
}

const HISTORIC: [Template; 5] = [
    template("Kremlin", "Historic fortress in the city centre", 3),
    template("Old Town", "Historic quarter with period architecture", 2),
    template("History Museum", "Exhibition on the history of the region", 2),
    template("Archaeological Park", "Excavations of an ancient settlement", 1),
    template("Founders' Monument", "Monumental sculpture group", 1),
];

const CULTURAL: [Template; 5] = [
    template("Main Theatre", "Academic drama theatre", 3),
    template("Philharmonic Hall", "Classical music concert hall", 2),
    template("Art Gallery", "Contemporary art", 2),
    template("Palace of Culture", "Concerts and exhibitions", 2),
    template("Literary Museum", "Exhibition about local writers", 1),
];

const ARCHITECTURE: [Template; 5] = [
    template("Skyscraper", "Modern high-rise building", 1),
    template("Cathedral", "Architectural landmark", 2),
    template("Pedestrian Bridge", "Engineering structure", 1),
    template("Palace Square", "Architectural ensemble", 1),
    template("Railway Station", "Historic station building", 1),
];

const MUSEUMS: [Template; 5] = [
    template("Art Museum", "Collection of paintings", 2),
    template("Science Centre", "Interactive exhibits", 3),
    template("Local History Museum", "Nature and history of the region", 2),
    template("Memorial Complex", "Historical exhibition", 2),
    template("Contemporary Art Exhibition", "Avant-garde works", 1),
];

fn templates(category: Category) -> &'static [Template] {
    match category {
        Category::Historic => &HISTORIC,
        Category::Cultural => &CULTURAL,
        Category::Architecture => &ARCHITECTURE,
        Category::Museums => &MUSEUMS,
    }
}

/// Generate a fresh catalog using the thread-local RNG.
///
/// Ids and ratings differ on every call; the shape (count, names, hours) does not.
pub fn generate(city: &str, category: Category) -> Vec<Place> {
    generate_with(&mut rand::thread_rng(), city, category)
}

/// Generate a catalog with a caller-supplied RNG.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, city: &str, category: Category) -> Vec<Place> {
    templates(category)
        .iter()
        .map(|template| Place {
            id: PlaceId::new(),
            name: format!("{} ({city})", template.name),
            description: template.description.to_string(),
            category,
            rating: random_rating(rng),
            hours: template.hours,
            address: format!("{city}, Central District"),
        })
        .collect()
}

/// Generate a catalog for a category given by name.
pub fn generate_named(city: &str, category: &str) -> Result<Vec<Place>, CatalogError> {
    let category = category.parse::<Category>()?;
    Ok(generate(city, category))
}

// One of 4.0, 4.1, ..., 4.9 with equal weight.
fn random_rating<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    f32::from(rng.gen_range(40u8..50)) / 10.0
}

/// Simulated remote source for catalogs.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    delay: Duration,
    failure_rate: f64,
    default_city: String,
}

impl CatalogSource {
    /// Create a source with explicit settings.
    pub fn new(delay: Duration, failure_rate: f64, default_city: impl Into<String>) -> Self {
        Self {
            delay,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            default_city: default_city.into(),
        }
    }

    /// Build a source from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_millis(config.fetch_delay_ms),
            config.fetch_failure_rate,
            config.default_city.clone(),
        )
    }

    /// City used when the query leaves it blank.
    pub fn default_city(&self) -> &str {
        &self.default_city
    }

    /// The query a fetch actually runs: trimmed city, or the default city when blank.
    pub fn resolve(&self, query: &SearchQuery) -> SearchQuery {
        SearchQuery::new(query.city_or(&self.default_city), query.category)
    }

    /// Wait for the configured delay, then generate the catalog.
    pub async fn fetch(&self, query: &SearchQuery) -> Result<Vec<Place>, CatalogError> {
        let city = query.city_or(&self.default_city).to_string();
        debug!(city = %city, category = %query.category, "Fetching catalog");
        tokio::time::sleep(self.delay).await;

        if self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate) {
            warn!(city = %city, "Simulated catalog fetch failed");
            return Err(CatalogError::FetchFailed { city });
        }

        Ok(generate(&city, query.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn paris_museums_matches_templates() {
        let places = generate("Paris", Category::Museums);
        assert_eq!(places.len(), 5);
        for place in &places {
            assert!(place.name.contains("Paris"), "{}", place.name);
            assert!((4.0..5.0).contains(&place.rating), "rating {}", place.rating);
            assert!([1, 2, 3].contains(&place.hours));
            assert_eq!(place.category, Category::Museums);
            assert_eq!(place.address, "Paris, Central District");
        }
        let hours: Vec<u32> = places.iter().map(|p| p.hours).collect();
        assert_eq!(hours, vec![2, 3, 2, 2, 1]);
    }

    #[test]
    fn every_category_has_five_templates() {
        for category in Category::ALL {
            assert_eq!(generate("Oslo", category).len(), 5);
        }
    }

    #[test]
    fn regeneration_changes_identity_not_shape() {
        let first = generate("Rome", Category::Historic);
        let second = generate("Rome", Category::Historic);
        let names = |places: &[Place]| places.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
        assert!(first.iter().zip(&second).all(|(a, b)| a.id != b.id));
    }

    #[test]
    fn ratings_have_one_decimal() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let rating = random_rating(&mut rng);
            assert!((4.0..5.0).contains(&rating));
            let scaled = rating * 10.0;
            assert!((scaled - scaled.round()).abs() < 1e-3);
        }
    }

    #[test]
    fn every_tenth_is_equally_likely() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut buckets = [0u32; 10];
        for _ in 0..2000 {
            let tenth = (random_rating(&mut rng) * 10.0).round() as usize - 40;
            buckets[tenth] += 1;
        }
        for (tenth, count) in buckets.iter().enumerate() {
            assert!((120..280).contains(count), "4.{tenth} drawn {count} times");
        }
    }

    #[test]
    fn resolve_fills_blank_city() {
        let source = CatalogSource::new(Duration::from_millis(1), 0.0, "Moscow");
        assert_eq!(
            source.resolve(&SearchQuery::new("   ", Category::Museums)),
            SearchQuery::new("Moscow", Category::Museums)
        );
        assert_eq!(
            source.resolve(&SearchQuery::new(" Paris ", Category::Museums)),
            SearchQuery::new("Paris", Category::Museums)
        );
    }

    #[test]
    fn unknown_category_name_is_rejected() {
        assert_eq!(
            generate_named("Paris", "nightlife"),
            Err(CatalogError::UnknownCategory("nightlife".to_string()))
        );
        assert_eq!(generate_named("Paris", "cultural").map(|p| p.len()), Ok(5));
    }

    #[tokio::test]
    async fn fetch_uses_default_city_for_blank_query() {
        let source = CatalogSource::new(Duration::from_millis(1), 0.0, "Moscow");
        let places = source
            .fetch(&SearchQuery::new("  ", Category::Cultural))
            .await
            .unwrap();
        assert_eq!(places.len(), 5);
        assert!(places.iter().all(|p| p.name.ends_with("(Moscow)")));
    }

    #[tokio::test]
    async fn fetch_can_fail_without_retry() {
        let source = CatalogSource::new(Duration::from_millis(1), 1.0, "Moscow");
        let result = source
            .fetch(&SearchQuery::new("Lima", Category::Historic))
            .await;
        assert_eq!(
            result,
            Err(CatalogError::FetchFailed {
                city: "Lima".to_string()
            })
        );
    }
}
