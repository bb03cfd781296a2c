use super::*;

fn poster(name: &str, link: &str, label: &str, tooltip: &str, img: &str) -> String {
    format!(
        r#"<li class="poster-container">
             <div class="film-poster" data-film-name="{name}" data-target-link="{link}">
               <img src="{img}" alt="{name}">
               <a href="{link}" class="frame" data-original-title="{tooltip}">
                 <span class="frame-title">{label}</span>
               </a>
             </div>
           </li>"#
    )
}

fn listing_page(items: &[String]) -> String {
    format!(
        "<html><body><ul class=\"poster-list\">{}</ul></body></html>",
        items.join("\n")
    )
}

#[test]
fn test_parse_rating_from_tooltip() {
    assert_eq!(parse_rating("Movie Title (1994) 4.5"), 4.5);
    assert_eq!(parse_rating("Movie Title (1994)"), 0.0);
    assert_eq!(parse_rating("Movie Title (1994) ★★★★"), 0.0);
    assert_eq!(parse_rating("Movie Title (1994) -2"), 0.0);
    assert_eq!(parse_rating("Movie Title (1994) NaN"), 0.0);
    assert_eq!(parse_rating(""), 0.0);
}

#[test]
fn test_parse_year_from_label() {
    assert_eq!(parse_year("Movie Title (1994)"), "1994");
    assert_eq!(parse_year("Movie Title"), "Unknown");
    assert_eq!(parse_year("M (Redux) (1979)"), "1979");
    assert_eq!(parse_year("Short (99)"), "Unknown");
    assert_eq!(parse_year("Unclosed (1994"), "Unknown");
}

#[test]
fn test_extract_listing_reads_all_fields() {
    let html = listing_page(&[poster(
        "Heat",
        "/film/heat-1995/",
        "Heat (1995)",
        "Heat (1995) 4.3",
        "https://a.ltrbxd.com/heat-0-70-0-105.jpg",
    )]);

    let movies = extract_listing(&html, 10);

    assert_eq!(movies.len(), 1);
    let heat = &movies[0];
    assert_eq!(heat.title, "Heat");
    assert_eq!(heat.year, "1995");
    assert_eq!(heat.rating, 4.3);
    assert_eq!(heat.movie_url, "/film/heat-1995/");
    assert_eq!(heat.poster_url.as_deref(), Some("https://a.ltrbxd.com/heat-0-70-0-105.jpg"));
}

#[test]
fn test_extract_listing_caps_and_keeps_page_order() {
    let items: Vec<String> = (1..=5)
        .map(|i| {
            poster(
                &format!("Film {}", i),
                &format!("/film/film-{}/", i),
                &format!("Film {} (200{})", i, i),
                &format!("Film {} (200{}) 3.{}", i, i, i),
                "https://a.ltrbxd.com/p.jpg",
            )
        })
        .collect();

    let movies = extract_listing(&listing_page(&items), 3);

    let urls: Vec<&str> = movies.iter().map(|m| m.movie_url.as_str()).collect();
    assert_eq!(urls, vec!["/film/film-1/", "/film/film-2/", "/film/film-3/"]);
}

#[test]
fn test_extract_listing_skips_items_without_link() {
    let html = listing_page(&[
        r#"<li class="poster-container">
             <div class="film-poster" data-film-name="Orphan"><img src="x.jpg"></div>
           </li>"#
            .to_string(),
        poster(
            "Heat",
            "/film/heat-1995/",
            "Heat (1995)",
            "Heat (1995) 4.3",
            "https://a.ltrbxd.com/p.jpg",
        ),
    ]);

    let movies = extract_listing(&html, 10);

    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "Heat");
}

#[test]
fn test_extract_listing_defaults_missing_parts() {
    let html = listing_page(&[r#"<li class="poster-container">
             <div class="film-poster" data-film-name="Nameless">
               <img src="https://s.ltrbxd.com/static/img/empty-poster-70.png">
               <a href="https://letterboxd.com/film/nameless/" class="frame"></a>
             </div>
           </li>"#
        .to_string()]);

    let movies = extract_listing(&html, 10);

    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].year, "Unknown");
    assert_eq!(movies[0].rating, 0.0);
    assert_eq!(movies[0].poster_url, None);
    assert_eq!(movies[0].movie_url, "/film/nameless/");
}

#[test]
fn test_extract_listing_falls_back_to_film_poster_roots() {
    let html = r#"<html><body>
        <div class="film-poster" data-film-name="Alien" data-target-link="/film/alien/">
          <img src="//a.ltrbxd.com/alien.jpg">
        </div>
    </body></html>"#;

    let movies = extract_listing(html, 10);

    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "Alien");
    assert_eq!(movies[0].movie_url, "/film/alien/");
    assert_eq!(movies[0].poster_url.as_deref(), Some("https://a.ltrbxd.com/alien.jpg"));
}

#[test]
fn test_extract_listing_empty_page() {
    assert!(extract_listing("<html><body><p>Nothing here</p></body></html>", 10).is_empty());
    assert!(extract_listing("", 10).is_empty());
}

#[test]
fn test_assemble_description_orders_parts() {
    let description = assemble_description(Some("A tale."), Some("Two men bond."), &[]);
    assert_eq!(description, "<i>A tale.</i><br><br>Two men bond.");

    let tagline_at = description.find("A tale.").unwrap();
    let synopsis_at = description.find("Two men bond.").unwrap();
    assert!(tagline_at < synopsis_at);
}

#[test]
fn test_assemble_description_with_cast() {
    let cast = vec!["Al Pacino".to_string(), "Robert De Niro".to_string()];
    assert_eq!(
        assemble_description(None, Some("Cops and robbers."), &cast),
        "Cops and robbers.<br><br><b>Cast:</b> Al Pacino, Robert De Niro"
    );
    assert_eq!(assemble_description(None, None, &cast), "<b>Cast:</b> Al Pacino, Robert De Niro");
}

#[test]
fn test_assemble_description_empty() {
    assert_eq!(assemble_description(None, None, &[]), "No description available");
    assert_eq!(assemble_description(Some("  "), Some(""), &[]), "No description available");
}

#[test]
fn test_extract_detail_full_page() {
    let html = r#"<html><head>
        <link rel="canonical" href="https://letterboxd.com/film/the-godfather/">
        <meta property="og:image" content="https://a.ltrbxd.com/og.jpg">
      </head><body>
        <section class="film-header">
          <div class="film-poster"><img src="https://a.ltrbxd.com/godfather-0-230-0-345.jpg"></div>
        </section>
        <h4 class="tagline">An offer you can't refuse.</h4>
        <div class="review body-text">
          <div class="truncate"><p>Spanning the years 1945 to 1955,
            a chronicle of the Corleone family.</p></div>
        </div>
        <div id="tab-cast">
          <a class="text-slug" href="/actor/marlon-brando/">Marlon Brando</a>
          <a class="text-slug" href="/actor/al-pacino/">Al Pacino</a>
        </div>
      </body></html>"#;

    let detail = extract_detail(html, "/film/the-godfather/");

    assert_eq!(
        detail.description,
        "<i>An offer you can't refuse.</i><br><br>Spanning the years 1945 to 1955, \
         a chronicle of the Corleone family.<br><br><b>Cast:</b> Marlon Brando, Al Pacino"
    );
    assert_eq!(
        detail.large_image_url.as_deref(),
        Some("https://a.ltrbxd.com/godfather-0-230-0-345.jpg")
    );
    assert_eq!(detail.letterboxd_url, "https://letterboxd.com/film/the-godfather/");
    assert!(!detail.is_error());
}

#[test]
fn test_extract_detail_uses_fallback_chains() {
    let html = r#"<html><head>
        <meta name="description" content="A meta synopsis.">
        <link rel="image_src" href="https://a.ltrbxd.com/src.jpg">
      </head><body></body></html>"#;

    let detail = extract_detail(html, "/film/quiet/");

    assert_eq!(detail.description, "A meta synopsis.");
    assert_eq!(detail.large_image_url.as_deref(), Some("https://a.ltrbxd.com/src.jpg"));
    assert_eq!(detail.letterboxd_url, "https://letterboxd.com/film/quiet/");
}

#[test]
fn test_extract_detail_synopsis_priority() {
    let html = r#"<html><head><meta name="description" content="Meta text."></head><body>
        <div class="film-text-content"><p>Secondary text.</p></div>
      </body></html>"#;

    assert_eq!(extract_detail(html, "/film/x/").description, "Secondary text.");
}

#[test]
fn test_extract_detail_caps_cast() {
    let names: String = (1..=14)
        .map(|i| format!(r#"<a class="text-slug">Actor {}</a>"#, i))
        .collect();
    let html = format!(r#"<html><body><div id="tab-cast">{}</div></body></html>"#, names);

    let detail = extract_detail(&html, "/film/crowd/");

    assert!(detail.description.contains("Actor 10"));
    assert!(!detail.description.contains("Actor 11"));
}

#[test]
fn test_extract_detail_empty_page() {
    let detail = extract_detail("<html><body></body></html>", "/film/void/");
    assert_eq!(detail.description, "No description available");
    assert_eq!(detail.large_image_url, None);
}

#[test]
fn test_first_match_respects_order() {
    let document = Html::parse_document(
        r#"<html><body><p class="a">first</p><p class="b">second</p></body></html>"#,
    );
    let root = document.root_element();

    let chain = [
        FieldStrategy::text("p.missing"),
        FieldStrategy::text("p.b"),
        FieldStrategy::text("p.a"),
    ];
    assert_eq!(first_match(root, &chain).as_deref(), Some("second"));
    assert_eq!(first_match(root, &[FieldStrategy::text("p.none")]), None);
}

#[test]
fn test_site_relative_links() {
    assert_eq!(site_relative("https://letterboxd.com/film/heat-1995/"), "/film/heat-1995/");
    assert_eq!(site_relative("/film/heat-1995/"), "/film/heat-1995/");
    assert_eq!(site_relative("film/heat-1995/"), "/film/heat-1995/");
}

#[test]
fn test_listing_poster_skips_placeholder_for_lazy_source() {
    let html = listing_page(&[r#"<li class="poster-container">
         <div class="film-poster" data-film-name="Heat">
           <img src="https://s.ltrbxd.com/static/img/empty-poster-70.png"
                data-src="https://a.ltrbxd.com/heat.jpg">
           <a href="/film/heat/" class="frame" data-original-title="Heat (1995) 4.3">
             <span class="frame-title">Heat (1995)</span>
           </a>
         </div>
       </li>"#
        .to_string()]);

    let movies = extract_listing(&html, 10);

    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].poster_url.as_deref(), Some("https://a.ltrbxd.com/heat.jpg"));
}

#[test]
fn test_listing_poster_placeholder_only_is_none() {
    let html = listing_page(&[poster(
        "Heat",
        "/film/heat/",
        "Heat (1995)",
        "Heat (1995) 4.3",
        "https://s.ltrbxd.com/static/img/empty-poster-70.png",
    )]);

    let movies = extract_listing(&html, 10);

    assert_eq!(movies[0].poster_url, None);
}

#[test]
fn test_detail_large_image_skips_placeholder() {
    let html = r#"<html><head>
        <meta property="og:image" content="https://a.ltrbxd.com/heat-large.jpg">
        </head><body>
        <div class="film-poster">
          <img src="https://s.ltrbxd.com/static/img/empty-poster-230.png">
        </div>
        </body></html>"#;

    let detail = extract_detail(html, "/film/heat/");

    assert_eq!(detail.large_image_url.as_deref(), Some("https://a.ltrbxd.com/heat-large.jpg"));
}

#[test]
fn test_first_match_where_falls_through_rejected_values() {
    let document = Html::parse_fragment(r#"<div><img src="skip-me" data-src="keep-me"></div>"#);
    let chain = [FieldStrategy::attr("img", "src"), FieldStrategy::attr("img", "data-src")];

    let value = first_match_where(document.root_element(), &chain, |v| v != "skip-me");

    assert_eq!(value.as_deref(), Some("keep-me"));
}
