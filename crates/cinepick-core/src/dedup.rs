// Key-based deduplication over `movie_url`.

use cinepick_models::MovieRecord;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Collapse rows sharing a `movie_url` into the first one seen. Later
/// duplicates contribute their genre names to the kept row.
pub fn collapse_by_key(records: Vec<MovieRecord>) -> Vec<MovieRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<MovieRecord> = Vec::with_capacity(records.len());
    let mut collapsed = 0;

    for record in records {
        match index.get(&record.movie_url) {
            Some(&pos) => {
                collapsed += 1;
                let genres: Vec<String> = record.genres().map(str::to_string).collect();
                for genre in genres {
                    unique[pos].add_genre(&genre);
                }
            }
            None => {
                index.insert(record.movie_url.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    if collapsed > 0 {
        debug!(
            collapsed = collapsed,
            unique = unique.len(),
            "collapse_by_key: merged duplicate movie_url rows"
        );
    }
    unique
}

/// Existing rows first and untouched; incoming rows appended only when their key is new.
/// Returns the merged rows and how many incoming rows were added.
pub fn merge_existing_wins(
    existing: Vec<MovieRecord>,
    incoming: Vec<MovieRecord>,
) -> (Vec<MovieRecord>, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.movie_url.clone()).collect();
    let mut merged = existing;
    let before = merged.len();
    let mut skipped_existing = 0;

    for record in collapse_by_key(incoming) {
        if seen.insert(record.movie_url.clone()) {
            merged.push(record);
        } else {
            skipped_existing += 1;
        }
    }

    let added = merged.len() - before;
    debug!(
        "merge_existing_wins: existing={}, added={}, skipped_existing={}",
        before, added, skipped_existing
    );
    (merged, added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(url: &str, genre: &str) -> MovieRecord {
        MovieRecord {
            title: url.trim_matches('/').to_string(),
            year: "2000".to_string(),
            rating: 1.0,
            genre: genre.to_string(),
            description: "Details".to_string(),
            image_path: None,
            large_image_path: None,
            movie_url: url.to_string(),
        }
    }

    #[test]
    fn test_collapse_merges_genres_into_first() {
        let rows = collapse_by_key(vec![
            movie("/film/a/", "action"),
            movie("/film/b/", "drama"),
            movie("/film/a/", "thriller"),
            movie("/film/a/", "action"),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].movie_url, "/film/a/");
        assert_eq!(rows[0].genre, "action, thriller");
        assert_eq!(rows[1].movie_url, "/film/b/");
    }

    #[test]
    fn test_merge_existing_wins() {
        let mut kept = movie("/film/a/", "action");
        kept.description = "Fetched.".to_string();

        let (merged, added) = merge_existing_wins(
            vec![kept.clone()],
            vec![
                movie("/film/a/", "comedy"),
                movie("/film/c/", "comedy"),
                movie("/film/c/", "drama"),
            ],
        );

        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], kept);
        assert_eq!(merged[1].genre, "comedy, drama");
    }
}
