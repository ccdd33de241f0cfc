//! # Recommendation Service
//!
//! Coordinates both recommendation strategies for a request of three seed
//! titles:
//!
//! Content:
//! 1. Resolve the seed titles within the featured item subset
//! 2. Merge the seeds' similarity rankings (content source)
//! 3. Drop the seeds, cut the pool window, collapse duplicates, cut to top N
//!
//! Collaborative:
//! 1. Resolve the seed titles within the catalog
//! 2. Rank items by the votes of the virtual user's neighbours
//! 3. Cut to top N + 1, drop the seeds, cut to top N
//!
//! Everything built at construction time is immutable and shared through
//! `Arc`; each request builds its own utility matrix and filter pipeline.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use data_loader::{CatalogStore, Item, ItemId, RatingStore, UserId};
use pipeline::filters::{DuplicateFilter, SeedExclusionFilter, WindowFilter};
use pipeline::{FeatureBuilder, FeaturedCatalog, FilterPipeline};
use predictor::RatingPredictor;
use sources::{
    Candidate, CandidateSource, CollaborativeSource, ContentSource, SEED_COUNT, SeedContext,
    SourceError, VirtualUser,
};

use crate::config::RecommenderConfig;
use crate::error::{RecommendError, Result};

/// One recommended item
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    /// Cosine similarity (content) or neighbour votes (collaborative)
    pub score: f64,
    pub source: CandidateSource,
    pub explanation: String,
}

/// Service object answering seed-based recommendation requests
#[derive(Clone)]
pub struct RecommendationService {
    catalog: Arc<CatalogStore>,
    working_ratings: Arc<RatingStore>,
    featured: Arc<FeaturedCatalog>,
    content: ContentSource,
    collaborative: CollaborativeSource,
    config: Arc<RecommenderConfig>,
}

impl RecommendationService {
    /// Build the service once from the shared stores and the rating model.
    ///
    /// Builds the featured subset and its similarity index, restricts the
    /// working ratings to the selectable items and picks a virtual user id
    /// that no real user has.
    pub fn new(
        catalog: Arc<CatalogStore>,
        ratings: Arc<RatingStore>,
        predictor: Arc<dyn RatingPredictor>,
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let featured = FeatureBuilder::new()
            .with_subset_size(config.subset_size)
            .build(&catalog)?;
        let content = ContentSource::new(featured.item_ids(), &featured.feature_texts())
            .with_pool_size(config.content_pool_size);

        let working_ratings = if config.selectable_items.is_empty() {
            ratings.clone()
        } else {
            let selectable = config.selectable_items.iter().copied().collect();
            Arc::new(ratings.for_users_who_rated(&selectable))
        };

        let virtual_user_id = resolve_virtual_user_id(config.virtual_user_id, &ratings);
        let collaborative = CollaborativeSource::new(
            predictor,
            VirtualUser::new(virtual_user_id).with_ratings(config.virtual_ratings),
        )
        .with_k(config.similar_users)
        .with_neighbors_per_seed(config.neighbors_per_seed);

        info!(
            "Recommendation service ready in {:?}: {} featured items, {} working ratings from {} users",
            start.elapsed(),
            featured.len(),
            working_ratings.len(),
            working_ratings.users().len()
        );

        Ok(Self {
            catalog,
            working_ratings,
            featured: Arc::new(featured),
            content,
            collaborative,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Items eligible as content seeds, in catalog order
    pub fn featured(&self) -> &FeaturedCatalog {
        &self.featured
    }

    pub fn virtual_user_id(&self) -> UserId {
        self.collaborative.virtual_user().id()
    }

    /// Titles of the items most similar in content to the three seeds
    pub fn recommend_content(&self, seeds: &[String; SEED_COUNT], top_n: usize) -> Result<Vec<String>> {
        Ok(titles(self.recommend_content_detailed(seeds, top_n)?))
    }

    /// Titles of the items favoured by users who resemble the seeds.
    ///
    /// Seeds resolve against the whole catalog, not just the featured
    /// subset, so `subset_size` does not limit this strategy.
    pub fn recommend_collaborative(
        &self,
        seeds: &[String; SEED_COUNT],
        top_n: usize,
    ) -> Result<Vec<String>> {
        Ok(titles(self.recommend_collaborative_detailed(seeds, top_n)?))
    }

    #[instrument(skip(self, seeds))]
    pub fn recommend_content_detailed(
        &self,
        seeds: &[String; SEED_COUNT],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let start = Instant::now();
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let context = self.resolve_seeds(seeds, |title| {
            self.featured.find_by_title(title).map(|item| item.item_id)
        })?;

        let excluded = self.excluded_items(&context);
        let candidates = self
            .content
            .get_candidates_excluding(&context.seed_items, &excluded)
            .map_err(|e| self.source_error(e, &context))?;

        let pipeline = FilterPipeline::new()
            .add_filter(SeedExclusionFilter::by_id().with_titles(self.catalog.clone()))
            .add_filter(WindowFilter::new(self.config.content_pool_size - 1))
            .add_filter(DuplicateFilter)
            .add_filter(WindowFilter::new(top_n));
        let ranked = pipeline.apply(candidates, &context)?;

        let recommendations = self.to_recommendations(ranked, &context);
        info!(
            "Content recommendations: {} items in {:?}",
            recommendations.len(),
            start.elapsed()
        );
        Ok(recommendations)
    }

    #[instrument(skip(self, seeds))]
    pub fn recommend_collaborative_detailed(
        &self,
        seeds: &[String; SEED_COUNT],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let start = Instant::now();
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let context = self.resolve_seeds(seeds, |title| {
            self.catalog.first_by_title(title).map(|item| item.id)
        })?;

        let candidates = match self
            .collaborative
            .get_candidates(&context.seed_items, &self.working_ratings)
        {
            Ok(candidates) => candidates,
            Err(SourceError::EmptyCandidatePool) => {
                warn!("No similar users found for {:?}, returning no recommendations", seeds);
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.source_error(e, &context)),
        };

        let pipeline = FilterPipeline::new()
            .add_filter(WindowFilter::new(top_n + 1))
            .add_filter(SeedExclusionFilter::by_id().with_titles(self.catalog.clone()))
            .add_filter(WindowFilter::new(top_n));
        let ranked = pipeline.apply(candidates, &context)?;

        let recommendations = self.to_recommendations(ranked, &context);
        info!(
            "Collaborative recommendations: {} items in {:?}",
            recommendations.len(),
            start.elapsed()
        );
        Ok(recommendations)
    }

    /// Case-insensitive title search, exact matches first, then catalog order
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&Item> {
        let query = query.to_lowercase();
        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for item in self.catalog.items() {
            let title = item.title.to_lowercase();
            if title == query {
                exact.push(item);
            } else if title.contains(&query) {
                partial.push(item);
            }
        }
        exact.into_iter().chain(partial).take(limit).collect()
    }

    /// Whether an item can be used as a content seed
    pub fn is_content_seed(&self, item_id: ItemId) -> bool {
        self.content.position_of(item_id).is_some()
    }

    /// Map each seed title to an id with `lookup`
    fn resolve_seeds<F>(&self, seeds: &[String; SEED_COUNT], lookup: F) -> Result<SeedContext>
    where
        F: Fn(&str) -> Option<ItemId>,
    {
        let mut seed_items = [0; SEED_COUNT];
        for (slot, title) in seed_items.iter_mut().zip(seeds) {
            *slot = lookup(title.as_str()).ok_or_else(|| RecommendError::ItemNotFound {
                title: title.clone(),
            })?;
            let matches = self.catalog.positions_of_title(title).len();
            if matches > 1 {
                warn!(
                    "Title '{}' matches {} catalog items, using item {}",
                    title, matches, *slot
                );
            }
        }
        Ok(SeedContext::new(seed_items, seeds.clone()))
    }

    /// Seeds plus every catalog item sharing a seed's title
    fn excluded_items(&self, context: &SeedContext) -> HashSet<ItemId> {
        let items = self.catalog.items();
        let namesakes = context.seed_titles.iter().flat_map(|title| {
            self.catalog
                .positions_of_title(title)
                .iter()
                .map(|&position| items[position].id)
        });
        context.seed_items.iter().copied().chain(namesakes).collect()
    }

    fn source_error(&self, err: SourceError, context: &SeedContext) -> RecommendError {
        match err {
            SourceError::UnknownItem { item_id } => {
                let title = context
                    .seed_items
                    .iter()
                    .position(|&id| id == item_id)
                    .map(|i| context.seed_titles[i].clone())
                    .unwrap_or_else(|| item_id.to_string());
                RecommendError::ItemNotFound { title }
            }
            other => RecommendError::Source(other),
        }
    }

    fn to_recommendations(
        &self,
        candidates: Vec<Candidate>,
        context: &SeedContext,
    ) -> Vec<Recommendation> {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let title = self.catalog.title_of(candidate.item_id)?.to_string();
                let explanation = match (
                    candidate.metadata.seed_position,
                    candidate.metadata.neighbor_votes,
                ) {
                    (Some(seed), _) => format!(
                        "similarity {:.3} to '{}'",
                        candidate.base_score, context.seed_titles[seed]
                    ),
                    (None, Some(votes)) => format!("favourite of {} similar users", votes),
                    (None, None) => format!("score {:.3}", candidate.base_score),
                };
                Some(Recommendation {
                    item_id: candidate.item_id,
                    title,
                    score: candidate.base_score,
                    source: candidate.source,
                    explanation,
                })
            })
            .collect()
    }
}

/// The configured id, or one past the largest real user id if it is taken
fn resolve_virtual_user_id(preferred: UserId, ratings: &RatingStore) -> UserId {
    if !ratings.contains_user(preferred) {
        return preferred;
    }
    let fallback = ratings
        .max_user_id()
        .map(|max| max.saturating_add(1))
        .unwrap_or(preferred);
    warn!(
        "Virtual user id {} belongs to a real user, using {} instead",
        preferred, fallback
    );
    fallback
}

fn titles(recommendations: Vec<Recommendation>) -> Vec<String> {
    recommendations.into_iter().map(|r| r.title).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Rating;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn movie(id: ItemId, title: &str, keywords: &[&str], cast: &[&str], director: &str, genres: &[&str]) -> Item {
        Item::new(id, title, strings(genres))
            .with_plot_keywords(strings(keywords))
            .with_cast(strings(cast))
            .with_director(director)
    }

    fn build_catalog() -> CatalogStore {
        CatalogStore::from_items(vec![
            movie(1, "Alien", &["spaceship", "monster"], &["Sigourney Weaver"], "Ridley Scott", &["Horror", "SciFi"]),
            movie(2, "Aliens", &["spaceship", "monster", "marines"], &["Sigourney Weaver"], "James Cameron", &["Action", "SciFi"]),
            movie(3, "Predator", &["jungle", "monster"], &["Arnold Schwarzenegger"], "John McTiernan", &["Action", "SciFi"]),
            movie(4, "Heat", &["heist", "los angeles"], &["Al Pacino", "Robert De Niro"], "Michael Mann", &["Crime"]),
            movie(5, "Ronin", &["heist"], &["Robert De Niro"], "John Frankenheimer", &["Crime", "Action"]),
            movie(6, "Up", &["balloon"], &["Ed Asner"], "Pete Docter", &["Animation"]),
            movie(7, "Coco", &["music", "afterlife"], &["Anthony Gonzalez"], "Lee Unkrich", &["Animation"]),
            movie(8, "Terminator", &["cyborg", "time travel"], &["Arnold Schwarzenegger"], "James Cameron", &["Action", "SciFi"]),
        ])
    }

    fn build_ratings() -> RatingStore {
        let rows = [
            (1, 1, 5.0), (1, 2, 5.0), (1, 8, 5.0), (1, 4, 1.0),
            (2, 1, 5.0), (2, 3, 4.0), (2, 8, 5.0), (2, 6, 1.0),
            (3, 2, 4.0), (3, 3, 5.0), (3, 5, 5.0), (3, 7, 2.0),
            (4, 4, 5.0), (4, 5, 4.0), (4, 6, 1.0),
            (5, 6, 5.0), (5, 7, 4.0), (5, 1, 1.0),
            // Flat ratings carry no signal
            (6, 4, 3.0), (6, 6, 3.0),
        ];
        RatingStore::from_ratings(rows.iter().map(|&(u, i, r)| Rating::new(u, i, r)))
    }

    /// Lower user ids are predicted to like every item more
    struct RankByIdPredictor;

    impl RatingPredictor for RankByIdPredictor {
        fn predict(&self, user_id: UserId, _item_id: ItemId) -> f32 {
            5.0 - user_id as f32 * 0.1
        }
    }

    fn build_service(config: RecommenderConfig) -> RecommendationService {
        RecommendationService::new(
            Arc::new(build_catalog()),
            Arc::new(build_ratings()),
            Arc::new(RankByIdPredictor),
            config,
        )
        .unwrap()
    }

    fn seeds(a: &str, b: &str, c: &str) -> [String; 3] {
        [a.to_string(), b.to_string(), c.to_string()]
    }

    // ============================================================================
    // Content
    // ============================================================================

    #[test]
    fn test_content_excludes_seeds_and_respects_top_n() {
        let service = build_service(RecommenderConfig::default());
        let seed_titles = seeds("Alien", "Aliens", "Predator");

        for top_n in 1..=6 {
            let titles = service.recommend_content(&seed_titles, top_n).unwrap();
            assert!(titles.len() <= top_n);
            assert!(titles.iter().all(|t| !seed_titles.contains(t)));
        }
    }

    #[test]
    fn test_content_ranks_closest_item_first() {
        let service = build_service(RecommenderConfig::default());
        let titles = service
            .recommend_content(&seeds("Alien", "Aliens", "Predator"), 1)
            .unwrap();
        assert_eq!(titles, vec!["Terminator"]);
    }

    #[test]
    fn test_content_results_have_no_duplicates_and_descend() {
        let service = build_service(RecommenderConfig::default());
        let recs = service
            .recommend_content_detailed(&seeds("Heat", "Up", "Coco"), 10)
            .unwrap();

        let mut ids: Vec<ItemId> = recs.iter().map(|r| r.item_id).collect();
        assert_eq!(ids.len(), 5);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(recs.iter().all(|r| r.source == CandidateSource::Content));
    }

    #[test]
    fn test_content_is_deterministic() {
        let service = build_service(RecommenderConfig::default());
        let seed_titles = seeds("Heat", "Ronin", "Terminator");
        let first = service.recommend_content(&seed_titles, 5).unwrap();
        let second = build_service(RecommenderConfig::default())
            .recommend_content(&seed_titles, 5)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_title_is_item_not_found() {
        let service = build_service(RecommenderConfig::default());
        let result = service.recommend_content(&seeds("Alien", "Jaws", "Heat"), 5);
        assert!(matches!(
            result,
            Err(RecommendError::ItemNotFound { ref title }) if title == "Jaws"
        ));

        let result = service.recommend_collaborative(&seeds("Jaws", "Alien", "Heat"), 5);
        assert!(matches!(result, Err(RecommendError::ItemNotFound { .. })));
    }

    #[test]
    fn test_seed_outside_featured_subset_is_item_not_found() {
        let config = RecommenderConfig {
            subset_size: 4,
            ..RecommenderConfig::default()
        };
        let service = build_service(config);
        assert!(!service.is_content_seed(8));

        let result = service.recommend_content(&seeds("Alien", "Aliens", "Terminator"), 3);
        assert!(matches!(
            result,
            Err(RecommendError::ItemNotFound { ref title }) if title == "Terminator"
        ));

        // The collaborative strategy resolves against the whole catalog
        assert!(service
            .recommend_collaborative(&seeds("Alien", "Aliens", "Terminator"), 3)
            .is_ok());
    }

    #[test]
    fn test_duplicate_seeds_are_allowed() {
        let service = build_service(RecommenderConfig::default());
        let titles = service
            .recommend_content(&seeds("Alien", "Alien", "Aliens"), 10)
            .unwrap();
        assert!(!titles.iter().any(|t| t == "Alien" || t == "Aliens"));
        assert_eq!(titles.len(), 6);
    }

    #[test]
    fn test_duplicate_catalog_titles_use_first_match() {
        let mut catalog = build_catalog();
        catalog.insert_item(movie(9, "Heat", &["remake"], &["Nobody"], "Someone Else", &["Drama"]));
        let service = RecommendationService::new(
            Arc::new(catalog),
            Arc::new(build_ratings()),
            Arc::new(RankByIdPredictor),
            RecommenderConfig::default(),
        )
        .unwrap();

        let recs = service
            .recommend_content_detailed(&seeds("Heat", "Up", "Coco"), 10)
            .unwrap();
        // Item 4 is the seed; its namesake is excluded by title as well
        assert!(recs.iter().all(|r| r.item_id != 4 && r.item_id != 9));
    }

    #[test]
    fn test_namesakes_do_not_shrink_the_content_window() {
        let mut items = vec![movie(1, "A", &["alpha"], &[], "Dir A", &[])];
        items.extend((2..=5).map(|id| movie(id, "A", &["alpha"], &[], "Dir A", &[])));
        items.push(movie(6, "B", &["bravo"], &[], "Dir B", &[]));
        items.push(movie(7, "C", &["charlie"], &[], "Dir C", &[]));
        // Each extra filler keyword lowers the similarity to "A"
        for i in 0..60 {
            let fillers: Vec<String> = (0..=i).map(|j| format!("m{}x{}", i, j)).collect();
            let mut keywords = vec!["alpha"];
            keywords.extend(fillers.iter().map(String::as_str));
            items.push(movie(100 + i, &format!("M{}", i), &keywords, &[], &format!("Dir M{}", i), &[]));
        }
        let service = RecommendationService::new(
            Arc::new(CatalogStore::from_items(items)),
            Arc::new(build_ratings()),
            Arc::new(RankByIdPredictor),
            RecommenderConfig::default(),
        )
        .unwrap();

        let recs = service
            .recommend_content_detailed(&seeds("A", "B", "C"), 49)
            .unwrap();
        assert_eq!(recs.len(), 49);
        assert!(recs.iter().all(|r| r.score > 0.0));
        assert_eq!(recs.last().map(|r| r.title.as_str()), Some("M48"));
    }

    // ============================================================================
    // Collaborative
    // ============================================================================

    #[test]
    fn test_collaborative_list_is_not_repadded() {
        let service = build_service(RecommenderConfig::default());
        // Votes: Alien 2, Terminator 2, Aliens 1, Heat 1, Up 1, Predator 1, Ronin 1.
        // The top 3 hold two seeds, which leaves one title.
        let titles = service
            .recommend_collaborative(&seeds("Alien", "Aliens", "Predator"), 2)
            .unwrap();
        assert_eq!(titles, vec!["Terminator"]);
    }

    #[test]
    fn test_collaborative_ranks_by_neighbour_votes() {
        let service = build_service(RecommenderConfig::default());
        let recs = service
            .recommend_collaborative_detailed(&seeds("Alien", "Aliens", "Predator"), 5)
            .unwrap();

        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Terminator", "Heat", "Up"]);
        assert_eq!(recs[0].score, 2.0);
        assert!(recs.iter().all(|r| r.source == CandidateSource::Collaborative));
    }

    #[test]
    fn test_collaborative_k_limits_voters() {
        let config = RecommenderConfig {
            similar_users: 2,
            ..RecommenderConfig::default()
        };
        let service = build_service(config);
        let titles = service
            .recommend_collaborative(&seeds("Alien", "Aliens", "Predator"), 5)
            .unwrap();
        assert_eq!(titles, vec!["Terminator"]);
    }

    #[test]
    fn test_collaborative_is_deterministic() {
        let seed_titles = seeds("Heat", "Up", "Alien");
        let first = build_service(RecommenderConfig::default())
            .recommend_collaborative(&seed_titles, 4)
            .unwrap();
        let second = build_service(RecommenderConfig::default())
            .recommend_collaborative(&seed_titles, 4)
            .unwrap();
        assert_eq!(first, second);
        assert!(first.len() <= 4);
        assert!(first.iter().all(|t| !seed_titles.contains(t)));
    }

    #[test]
    fn test_empty_candidate_pool_is_an_empty_list() {
        let ratings = RatingStore::from_ratings(vec![
            Rating::new(1, 1, 3.0),
            Rating::new(1, 2, 3.0),
        ]);
        let service = RecommendationService::new(
            Arc::new(build_catalog()),
            Arc::new(ratings),
            Arc::new(RankByIdPredictor),
            RecommenderConfig::default(),
        )
        .unwrap();

        let titles = service
            .recommend_collaborative(&seeds("Alien", "Aliens", "Predator"), 5)
            .unwrap();
        assert!(titles.is_empty());
    }

    #[test]
    fn test_selectable_items_restrict_working_users() {
        // Only users who rated Coco: users 3 and 5
        let config = RecommenderConfig {
            selectable_items: vec![7],
            ..RecommenderConfig::default()
        };
        let service = build_service(config);
        let recs = service
            .recommend_collaborative_detailed(&seeds("Alien", "Aliens", "Predator"), 5)
            .unwrap();
        assert!(recs.iter().all(|r| r.item_id != 8));
    }

    // ============================================================================
    // Service
    // ============================================================================

    #[test]
    fn test_zero_top_n_is_empty() {
        let service = build_service(RecommenderConfig::default());
        let seed_titles = seeds("Alien", "Aliens", "Predator");
        assert!(service.recommend_content(&seed_titles, 0).unwrap().is_empty());
        assert!(service.recommend_collaborative(&seed_titles, 0).unwrap().is_empty());
    }

    #[test]
    fn test_virtual_user_id_avoids_real_users() {
        assert_eq!(build_service(RecommenderConfig::default()).virtual_user_id(), 200_000);

        let config = RecommenderConfig {
            virtual_user_id: 5,
            ..RecommenderConfig::default()
        };
        assert_eq!(build_service(config).virtual_user_id(), 7);
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let result = RecommendationService::new(
            Arc::new(CatalogStore::new()),
            Arc::new(RatingStore::new()),
            Arc::new(RankByIdPredictor),
            RecommenderConfig::default(),
        );
        assert!(matches!(result, Err(RecommendError::EmptyCatalog)));
    }

    #[test]
    fn test_search_titles_exact_first() {
        let service = build_service(RecommenderConfig::default());
        let hits: Vec<ItemId> = service.search_titles("ALIEN", 10).iter().map(|i| i.id).collect();
        assert_eq!(hits, vec![1, 2]);

        let hits: Vec<ItemId> = service.search_titles("o", 2).iter().map(|i| i.id).collect();
        assert_eq!(hits.len(), 2);
    }
}
