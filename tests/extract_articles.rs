// tests/extract_articles.rs
use news_service::crawl::extract::ArticleExtractor;
use news_service::ArticleRecord;
use url::Url;

fn origin() -> Url {
    Url::parse("https://daily.example.org/front").unwrap()
}

#[test]
fn fixture_page_yields_one_record_per_article() {
    let html: &str = include_str!("fixtures/front_page.html");
    let out = ArticleExtractor::default().extract(html, &origin());

    assert_eq!(
        out,
        vec![
            ArticleRecord::new(
                "Harbor reopens after storm",
                "Ferries resume service on Monday & crews clear debris.",
                "daily.example.org",
            ),
            // no description element -> empty string, not an error
            ArticleRecord::new("Council approves budget", "", "daily.example.org"),
            // no heading link -> empty title, still kept
            ArticleRecord::new("", "Letters to the editor.", "daily.example.org"),
        ]
    );
}

#[test]
fn page_without_articles_yields_nothing() {
    let html = "<html><body><div><h2><a>Not an article</a></h2><p>x</p></div></body></html>";
    assert!(ArticleExtractor::default().extract(html, &origin()).is_empty());
}

#[test]
fn garbage_input_is_not_a_failure() {
    let out = ArticleExtractor::default().extract("<<<article>>>", &origin());
    assert!(out.iter().all(|r| r.source == "daily.example.org"));
}

#[test]
fn custom_selectors_are_honoured() {
    let html = r#"
        <div class="card"><span class="hl">Custom title</span><em>Teaser</em></div>
        <div class="card"><span class="hl">Second</span></div>
    "#;
    let ex = ArticleExtractor::new("div.card", "span.hl", "em").unwrap();
    let out = ex.extract(html, &origin());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].title, "Custom title");
    assert_eq!(out[0].description, "Teaser");
    assert_eq!(out[1].description, "");
}

#[test]
fn duplicate_articles_are_kept() {
    let html = "<article><h2><a>Same</a></h2></article><article><h2><a>Same</a></h2></article>";
    let out = ArticleExtractor::default().extract(html, &origin());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], out[1]);
}
