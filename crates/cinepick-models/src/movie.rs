use serde::{Deserialize, Deserializer, Serialize};

pub const LETTERBOXD_BASE_URL: &str = "https://letterboxd.com";

/// Description stored by the bulk scrape until the detail page is fetched.
pub const PLACEHOLDER_DESCRIPTION: &str = "Details";
/// Produced by detail extraction when the page carries no tagline, synopsis or cast.
pub const NO_DESCRIPTION: &str = "No description available";
/// Returned by the detail fetcher when the page could not be loaded.
pub const DESCRIPTION_ERROR: &str = "Error loading description";

/// One cataloged film. `movie_url` is the primary key.
///
/// Field order matches the catalog header:
/// `title,year,rating,genre,description,image_path,large_image_path,movie_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    #[serde(deserialize_with = "lenient_year")]
    pub year: String,
    #[serde(deserialize_with = "lenient_rating", default)]
    pub rating: f64,
    #[serde(default)]
    pub genre: String,
    #[serde(default = "placeholder_description")]
    pub description: String,
    #[serde(deserialize_with = "optional_path", default)]
    pub image_path: Option<String>,
    #[serde(deserialize_with = "optional_path", default)]
    pub large_image_path: Option<String>,
    pub movie_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionState {
    Placeholder,
    Fetched,
    FetchError,
}

impl MovieRecord {
    pub fn letterboxd_url(&self) -> String {
        letterboxd_url(&self.movie_url)
    }

    pub fn description_state(&self) -> DescriptionState {
        DescriptionState::of(&self.description)
    }

    pub fn needs_details(&self) -> bool {
        self.description_state() == DescriptionState::Placeholder
    }

    /// Genre names in stored order, trimmed, empty entries dropped.
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre.split(',').map(str::trim).filter(|g| !g.is_empty())
    }

    /// Case-insensitive substring match against the genre field.
    pub fn matches_genre(&self, genre: &str) -> bool {
        let needle = genre.trim().to_lowercase();
        !needle.is_empty() && self.genre.to_lowercase().contains(&needle)
    }

    /// Appends `genre` unless already listed (case-insensitive).
    pub fn add_genre(&mut self, genre: &str) {
        let genre = genre.trim();
        if genre.is_empty() || self.genres().any(|g| g.eq_ignore_ascii_case(genre)) {
            return;
        }
        if self.genre.trim().is_empty() {
            self.genre = genre.to_string();
        } else {
            self.genre = format!("{}, {}", self.genre, genre);
        }
    }

    /// Leading run of digits in `year`, if any ("1994" -> 1994, "Unknown" -> None).
    pub fn year_number(&self) -> Option<i32> {
        let digits: String = self
            .year
            .trim()
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Genre field with each name title-cased:
    /// "science-fiction, drama" -> "Science Fiction, Drama".
    pub fn display_genre(&self) -> String {
        self.genres().map(title_case).collect::<Vec<_>>().join(", ")
    }
}

impl DescriptionState {
    pub fn of(description: &str) -> Self {
        let trimmed = description.trim();
        if trimmed.is_empty() || trimmed == PLACEHOLDER_DESCRIPTION || trimmed == NO_DESCRIPTION {
            DescriptionState::Placeholder
        } else if trimmed == DESCRIPTION_ERROR {
            DescriptionState::FetchError
        } else {
            DescriptionState::Fetched
        }
    }
}

pub fn letterboxd_url(movie_url: &str) -> String {
    if movie_url.starts_with("http://") || movie_url.starts_with("https://") {
        return movie_url.to_string();
    }
    if movie_url.starts_with('/') {
        format!("{}{}", LETTERBOXD_BASE_URL, movie_url)
    } else {
        format!("{}/{}", LETTERBOXD_BASE_URL, movie_url)
    }
}

/// "science-fiction" -> "Science Fiction"
pub fn title_case(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn placeholder_description() -> String {
    PLACEHOLDER_DESCRIPTION.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Number(f64),
    Text(String),
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Number(n)) => n,
        Some(RawField::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    };
    Ok(if value.is_finite() && value >= 0.0 { value } else { 0.0 })
}

fn lenient_year<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let year = match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Number(n)) if n.fract() == 0.0 => format!("{}", n as i64),
        Some(RawField::Number(n)) => n.to_string(),
        Some(RawField::Text(s)) => s.trim().to_string(),
        None => String::new(),
    };
    Ok(if year.is_empty() { "Unknown".to_string() } else { year })
}

// Legacy catalogs wrote missing paths as "None" or "nan".
fn optional_path<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !matches!(s.as_str(), "None" | "nan" | "NaN" | "null")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, genre: &str) -> MovieRecord {
        MovieRecord {
            title: "Heat".to_string(),
            year: "1995".to_string(),
            rating: 4.2,
            genre: genre.to_string(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            image_path: None,
            large_image_path: None,
            movie_url: url.to_string(),
        }
    }

    #[test]
    fn test_letterboxd_url_is_derived_from_movie_url() {
        let movie = record("/film/heat-1995/", "crime");
        assert_eq!(movie.letterboxd_url(), "https://letterboxd.com/film/heat-1995/");
    }

    #[test]
    fn test_description_states() {
        assert_eq!(DescriptionState::of("Details"), DescriptionState::Placeholder);
        assert_eq!(DescriptionState::of("No description available"), DescriptionState::Placeholder);
        assert_eq!(DescriptionState::of("Error loading description"), DescriptionState::FetchError);
        assert_eq!(DescriptionState::of("Two men bond."), DescriptionState::Fetched);
    }

    #[test]
    fn test_add_genre_skips_duplicates() {
        let mut movie = record("/film/heat-1995/", "crime");
        movie.add_genre("thriller");
        movie.add_genre("Crime");
        assert_eq!(movie.genre, "crime, thriller");
        assert_eq!(movie.display_genre(), "Crime, Thriller");
    }

    #[test]
    fn test_year_number() {
        let mut movie = record("/film/heat-1995/", "crime");
        assert_eq!(movie.year_number(), Some(1995));
        movie.year = "Unknown".to_string();
        assert_eq!(movie.year_number(), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("science-fiction"), "Science Fiction");
        assert_eq!(title_case("DRAMA"), "Drama");
    }

    #[test]
    fn test_legacy_csv_row_loads() {
        let data = "title,year,rating,genre,description,image_path,movie_url\n\
                    Sample Movie,2023,,Drama,Details,None,/film/sample-movie/\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<MovieRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, "2023");
        assert_eq!(rows[0].rating, 0.0);
        assert_eq!(rows[0].image_path, None);
        assert_eq!(rows[0].large_image_path, None);
        assert!(rows[0].needs_details());
    }
}
