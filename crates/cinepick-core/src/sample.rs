use cinepick_models::{MovieRecord, PLACEHOLDER_DESCRIPTION};

/// Built-in catalog written when a run produces nothing usable.
pub fn sample_catalog() -> Vec<MovieRecord> {
    vec![
        MovieRecord {
            title: "The Shawshank Redemption".to_string(),
            year: "1994".to_string(),
            rating: 9.3,
            genre: "Drama".to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            image_path: None,
            large_image_path: None,
            movie_url: "/film/the-shawshank-redemption/".to_string(),
        },
        MovieRecord {
            title: "The Godfather".to_string(),
            year: "1972".to_string(),
            rating: 9.2,
            genre: "Crime, Drama".to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            image_path: None,
            large_image_path: None,
            movie_url: "/film/the-godfather/".to_string(),
        },
    ]
}
