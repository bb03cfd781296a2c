//! HTML → structured data for Letterboxd listing and film pages.
//!
//! Every field is read through an ordered list of [`FieldStrategy`] values;
//! the first strategy yielding a non-empty value wins. Missing elements are
//! never errors, they fall through to the next strategy or to a default.

use cinepick_models::movie::letterboxd_url;
use cinepick_models::{DetailResult, LETTERBOXD_BASE_URL, NO_DESCRIPTION};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

/// Where a strategy reads its value from once the selector matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Whitespace-collapsed text content.
    Text,
    /// The named attribute.
    Attr(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldStrategy {
    /// CSS selector relative to the scope; `None` reads from the scope element itself.
    pub selector: Option<&'static str>,
    pub source: FieldSource,
}

impl FieldStrategy {
    pub const fn text(selector: &'static str) -> Self {
        Self {
            selector: Some(selector),
            source: FieldSource::Text,
        }
    }

    pub const fn attr(selector: &'static str, name: &'static str) -> Self {
        Self {
            selector: Some(selector),
            source: FieldSource::Attr(name),
        }
    }

    pub const fn own_attr(name: &'static str) -> Self {
        Self {
            selector: None,
            source: FieldSource::Attr(name),
        }
    }

    /// First non-empty value among the elements this strategy matches under `scope`.
    pub fn extract(&self, scope: ElementRef<'_>) -> Option<String> {
        self.extract_where(scope, |_| true)
    }

    /// Like [`FieldStrategy::extract`], skipping values `accept` rejects.
    pub fn extract_where(
        &self,
        scope: ElementRef<'_>,
        accept: impl Fn(&str) -> bool,
    ) -> Option<String> {
        match self.selector {
            None => self.read(scope).filter(|v| accept(v)),
            Some(css) => {
                let selector = parse_selector(css)?;
                scope
                    .select(&selector)
                    .find_map(|el| self.read(el).filter(|v| accept(v)))
            }
        }
    }

    /// Every non-empty value this strategy matches under `scope`, in document order.
    pub fn extract_all(&self, scope: ElementRef<'_>) -> Vec<String> {
        match self.selector {
            None => self.read(scope).into_iter().collect(),
            Some(css) => match parse_selector(css) {
                Some(selector) => scope.select(&selector).filter_map(|el| self.read(el)).collect(),
                None => Vec::new(),
            },
        }
    }

    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        let value = match self.source {
            FieldSource::Text => collapse_whitespace(&el.text().collect::<String>()),
            FieldSource::Attr(name) => el.value().attr(name).map(|v| v.trim().to_string())?,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Try each strategy in order and return the first hit.
pub fn first_match(scope: ElementRef<'_>, chain: &[FieldStrategy]) -> Option<String> {
    chain.iter().find_map(|strategy| strategy.extract(scope))
}

/// Try each strategy in order; a rejected value falls through to the next strategy.
pub fn first_match_where(
    scope: ElementRef<'_>,
    chain: &[FieldStrategy],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    chain
        .iter()
        .find_map(|strategy| strategy.extract_where(scope, &accept))
}

/// False for the site's empty-poster placeholder and inline data URIs.
pub fn is_real_poster(src: &str) -> bool {
    !src.contains("empty-poster") && !src.starts_with("data:")
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!(selector = css, "Invalid selector: {:?}", e);
            None
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Listing page ------------------------------------------------------------

/// Containers tried in order; the first selector matching anything defines the items.
pub const LISTING_ITEMS: &[&str] = &["li.poster-container", "li.griditem", "div.film-poster"];

pub const LISTING_TITLE: &[FieldStrategy] = &[
    FieldStrategy::attr("div.film-poster", "data-film-name"),
    FieldStrategy::own_attr("data-film-name"),
    FieldStrategy::attr("[data-item-name]", "data-item-name"),
    FieldStrategy::attr("img", "alt"),
];

pub const LISTING_LINK: &[FieldStrategy] = &[
    FieldStrategy::attr("a.frame", "href"),
    FieldStrategy::attr("div.film-poster", "data-target-link"),
    FieldStrategy::attr("div.film-poster", "data-film-link"),
    FieldStrategy::own_attr("data-target-link"),
    FieldStrategy::own_attr("data-film-link"),
    FieldStrategy::attr("[data-item-link]", "data-item-link"),
];

/// Label carrying "Title (Year)".
pub const LISTING_YEAR_LABEL: &[FieldStrategy] = &[
    FieldStrategy::text("span.frame-title"),
    FieldStrategy::attr("a.frame", "data-original-title"),
    FieldStrategy::attr("[data-item-full-display-name]", "data-item-full-display-name"),
];

/// Tooltip carrying "Title (Year) Rating".
pub const LISTING_RATING_TOOLTIP: &[FieldStrategy] = &[
    FieldStrategy::attr("a.frame", "data-original-title"),
    FieldStrategy::attr("a.frame", "title"),
    FieldStrategy::own_attr("data-original-title"),
];

pub const LISTING_POSTER: &[FieldStrategy] = &[
    FieldStrategy::attr("img", "src"),
    FieldStrategy::attr("img", "data-src"),
];

/// A film as it appears on a genre listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieSummary {
    pub title: String,
    pub year: String,
    pub rating: f64,
    pub poster_url: Option<String>,
    pub movie_url: String,
}

/// Parse up to `cap` films from a listing page, in page order.
pub fn extract_listing(html: &str, cap: usize) -> Vec<MovieSummary> {
    let document = Html::parse_document(html);
    let mut summaries = Vec::new();
    if cap == 0 {
        return summaries;
    }

    let Some(items) = LISTING_ITEMS
        .iter()
        .filter_map(|css| parse_selector(css))
        .map(|selector| document.select(&selector).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
    else {
        debug!("Listing page contained no poster items");
        return summaries;
    };

    let mut skipped = 0;
    for item in items {
        if summaries.len() >= cap {
            break;
        }

        let Some(link) = first_match(item, LISTING_LINK) else {
            skipped += 1;
            continue;
        };

        let title = first_match(item, LISTING_TITLE).unwrap_or_else(|| "Unknown".to_string());
        let year = first_match(item, LISTING_YEAR_LABEL)
            .map(|label| parse_year(&label))
            .unwrap_or_else(|| "Unknown".to_string());
        let rating = first_match(item, LISTING_RATING_TOOLTIP)
            .map(|tooltip| parse_rating(&tooltip))
            .unwrap_or(0.0);
        let poster_url =
            first_match_where(item, LISTING_POSTER, is_real_poster).map(|src| absolute_url(&src));

        trace!(title = %title, year = %year, rating = rating, "Listing item parsed");
        summaries.push(MovieSummary {
            title,
            year,
            rating,
            poster_url,
            movie_url: site_relative(&link),
        });
    }

    if skipped > 0 {
        debug!(skipped = skipped, "Skipped listing items without a film link");
    }
    summaries
}

/// Year from the last parenthesised token of at least four characters; `"Unknown"` otherwise.
pub fn parse_year(label: &str) -> String {
    let Some(open) = label.rfind('(') else {
        return "Unknown".to_string();
    };
    let rest = &label[open + 1..];
    let token = match rest.find(')') {
        Some(close) => rest[..close].trim(),
        None => return "Unknown".to_string(),
    };
    if token.chars().count() >= 4 {
        token.to_string()
    } else {
        "Unknown".to_string()
    }
}

/// Rating from the text after the last `)`; anything unparsable, negative or non-finite is 0.0.
pub fn parse_rating(tooltip: &str) -> f64 {
    let tail = tooltip.rsplit(')').next().unwrap_or("").trim();
    match tail.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// `/film/heat-1995/` for absolute site links, unchanged for relative ones.
pub fn site_relative(link: &str) -> String {
    let link = link.trim();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = link.strip_prefix(scheme) {
            return match rest.find('/') {
                Some(idx) => rest[idx..].to_string(),
                None => "/".to_string(),
            };
        }
    }
    if link.starts_with('/') {
        link.to_string()
    } else {
        format!("/{}", link)
    }
}

/// Resolve protocol-relative and site-relative URLs against the Letterboxd origin.
pub fn absolute_url(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{}", src)
    } else if src.starts_with('/') {
        format!("{}{}", LETTERBOXD_BASE_URL, src)
    } else {
        src.to_string()
    }
}

// Film detail page --------------------------------------------------------

pub const DETAIL_TAGLINE: &[FieldStrategy] =
    &[FieldStrategy::text("h4.tagline"), FieldStrategy::text(".tagline")];

pub const DETAIL_SYNOPSIS: &[FieldStrategy] = &[
    FieldStrategy::text("div.review .truncate p"),
    FieldStrategy::text("div.film-text-content p"),
    FieldStrategy::attr("meta[name=\"description\"]", "content"),
];

pub const DETAIL_CAST: &[FieldStrategy] = &[
    FieldStrategy::text("#tab-cast a.text-slug"),
    FieldStrategy::text(".cast-list a"),
];

pub const DETAIL_LARGE_IMAGE: &[FieldStrategy] = &[
    FieldStrategy::attr("div.film-poster img", "src"),
    FieldStrategy::attr("meta[property=\"og:image\"]", "content"),
    FieldStrategy::attr("link[rel=\"image_src\"]", "href"),
];

pub const DETAIL_CANONICAL: &[FieldStrategy] = &[
    FieldStrategy::attr("link[rel=\"canonical\"]", "href"),
    FieldStrategy::attr("meta[property=\"og:url\"]", "content"),
];

pub const MAX_CAST: usize = 10;

const SEPARATOR: &str = "<br><br>";

/// Parse a film page into its description, large poster and canonical URL.
pub fn extract_detail(html: &str, movie_url: &str) -> DetailResult {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let tagline = first_match(root, DETAIL_TAGLINE);
    let synopsis = first_match(root, DETAIL_SYNOPSIS);
    let cast: Vec<String> = DETAIL_CAST
        .iter()
        .map(|strategy| strategy.extract_all(root))
        .find(|names| !names.is_empty())
        .unwrap_or_default()
        .into_iter()
        .take(MAX_CAST)
        .collect();

    let large_image_url =
        first_match_where(root, DETAIL_LARGE_IMAGE, is_real_poster).map(|src| absolute_url(&src));
    let canonical = first_match(root, DETAIL_CANONICAL)
        .map(|href| absolute_url(&href))
        .unwrap_or_else(|| letterboxd_url(movie_url));

    DetailResult {
        description: assemble_description(tagline.as_deref(), synopsis.as_deref(), &cast),
        large_image_url,
        letterboxd_url: canonical,
    }
}

/// `<i>tagline</i><br><br>synopsis<br><br><b>Cast:</b> a, b`, omitting absent parts.
pub fn assemble_description(
    tagline: Option<&str>,
    synopsis: Option<&str>,
    cast: &[String],
) -> String {
    let mut parts = Vec::new();
    if let Some(tagline) = tagline.map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(format!("<i>{}</i>", tagline));
    }
    if let Some(synopsis) = synopsis.map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(synopsis.to_string());
    }
    if !cast.is_empty() {
        parts.push(format!("<b>Cast:</b> {}", cast.join(", ")));
    }

    if parts.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

#[cfg(test)]
mod tests;
