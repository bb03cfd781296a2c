//! Read-side helpers over loaded catalog rows.

use chrono::{Datelike, Utc};
use cinepick_models::movie::title_case;
use cinepick_models::MovieRecord;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

pub const ANY_GENRE: &str = "Any Genre";
pub const SEARCH_LIMIT: usize = 10;
pub const RECOMMEND_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against title and description.
    pub text: Option<String>,
    pub min_year: i32,
    pub max_year: i32,
    pub min_rating: f64,
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            min_year: 1900,
            max_year: Utc::now().year(),
            min_rating: 0.0,
            limit: SEARCH_LIMIT,
        }
    }
}

/// Highest-rated matches first, one row per `movie_url`. Rows without a numeric year never match.
pub fn search(records: &[MovieRecord], query: &SearchQuery) -> Vec<MovieRecord> {
    let needle = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);

    let matches = records.iter().filter(|r| {
        let in_years = r
            .year_number()
            .map(|y| y >= query.min_year && y <= query.max_year)
            .unwrap_or(false);
        let text_hit = match &needle {
            Some(n) => {
                r.title.to_lowercase().contains(n) || r.description.to_lowercase().contains(n)
            }
            None => true,
        };
        in_years && text_hit && r.rating >= query.min_rating
    });

    top_rated(matches, query.limit)
}

/// Top-rated rows in `genre` (`None` or "Any Genre" means all).
pub fn recommend(records: &[MovieRecord], genre: Option<&str>, limit: usize) -> Vec<MovieRecord> {
    top_rated(records.iter().filter(|r| genre_matches(r, genre)), limit)
}

/// One random row in `genre`, if any.
pub fn pick_random<R: Rng + ?Sized>(
    records: &[MovieRecord],
    genre: Option<&str>,
    rng: &mut R,
) -> Option<MovieRecord> {
    let candidates: Vec<&MovieRecord> =
        records.iter().filter(|r| genre_matches(r, genre)).collect();
    candidates.choose(rng).map(|r| (*r).clone())
}

/// Distinct genre names, title-cased and sorted.
pub fn genres(records: &[MovieRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.genres().map(title_case))
        .filter(|g| !g.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn genre_matches(record: &MovieRecord, genre: Option<&str>) -> bool {
    match genre.map(str::trim) {
        None | Some("") => true,
        Some(g) if g.eq_ignore_ascii_case(ANY_GENRE) || g.eq_ignore_ascii_case("any") => true,
        // Catalog genres are stored as slugs ("science-fiction"), display names use spaces.
        Some(g) => record.matches_genre(g) || record.matches_genre(&g.replace(' ', "-")),
    }
}

fn top_rated<'a>(records: impl Iterator<Item = &'a MovieRecord>, limit: usize) -> Vec<MovieRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&MovieRecord> =
        records.filter(|r| seen.insert(r.movie_url.as_str())).collect();
    unique.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
    unique.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn movie(
        url: &str,
        title: &str,
        year: &str,
        rating: f64,
        genre: &str,
        description: &str,
    ) -> MovieRecord {
        MovieRecord {
            title: title.to_string(),
            year: year.to_string(),
            rating,
            genre: genre.to_string(),
            description: description.to_string(),
            image_path: None,
            large_image_path: None,
            movie_url: url.to_string(),
        }
    }

    fn catalog() -> Vec<MovieRecord> {
        vec![
            movie("/film/heat/", "Heat", "1995", 4.3, "crime, action", "Details"),
            movie(
                "/film/alien/",
                "Alien",
                "1979",
                4.4,
                "science-fiction, horror",
                "In space no one can hear you scream.",
            ),
            movie("/film/up/", "Up", "2009", 4.0, "animation", "Details"),
            movie("/film/mystery/", "Mystery", "Unknown", 4.9, "drama", "Details"),
            movie("/film/heat/", "Heat (dup)", "1995", 1.0, "crime", "Details"),
        ]
    }

    #[test]
    fn test_search_filters_and_sorts() {
        let results = search(&catalog(), &SearchQuery::default());
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alien", "Heat", "Up"]);
    }

    #[test]
    fn test_search_text_matches_description() {
        let query = SearchQuery {
            text: Some("SCREAM".to_string()),
            ..SearchQuery::default()
        };
        let results = search(&catalog(), &query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Alien");
    }

    #[test]
    fn test_search_year_and_rating_bounds() {
        let query = SearchQuery {
            min_year: 1990,
            min_rating: 4.1,
            ..SearchQuery::default()
        };
        let results = search(&catalog(), &query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Heat");
    }

    #[test]
    fn test_recommend_by_genre() {
        let results = recommend(&catalog(), Some("Science Fiction"), RECOMMEND_LIMIT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Alien");

        let any = recommend(&catalog(), Some(ANY_GENRE), 2);
        let titles: Vec<&str> = any.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Mystery", "Alien"]);
    }

    #[test]
    fn test_pick_random_respects_genre() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let pick = pick_random(&catalog(), Some("animation"), &mut rng).unwrap();
            assert_eq!(pick.title, "Up");
        }
        assert!(pick_random(&catalog(), Some("western"), &mut rng).is_none());
    }

    #[test]
    fn test_genres_are_title_cased_and_unique() {
        assert_eq!(
            genres(&catalog()),
            vec!["Action", "Animation", "Crime", "Drama", "Horror", "Science Fiction"]
        );
    }
}
