//! Sitemap discovery tests against a mock site

use movie_harvester::discovery::{load_or_discover, SitemapSource, UrlCache, UrlSource};
use movie_harvester::url::ContentFilter;
use reqwest::Client;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source(server: &MockServer, paths: &[&str]) -> SitemapSource {
    let filter = ContentFilter::new(&["movie".to_string(), "tv".to_string()], "tv").unwrap();
    SitemapSource::new(
        Client::new(),
        &server.uri(),
        paths.iter().map(|p| p.to_string()).collect(),
        filter,
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xml")
        .set_body_string(body)
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|l| format!("<url><loc>{}</loc></url>", l))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

fn index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|l| format!("<sitemap><loc>{}</loc></sitemap>", l))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

#[tokio::test]
async fn test_nested_index_filtered_and_deduplicated() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(index(&[
            format!("{}/sitemap-movies.xml", base),
            format!("{}/sitemap-nested.xml", base),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-nested.xml"))
        .respond_with(xml(index(&[
            format!("{}/sitemap-tv.xml", base),
            // Cycles back to the root; must not be fetched twice
            format!("{}/sitemap.xml", base),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-movies.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/movie/heat-1995", base),
            format!("{}/movie", base),
            format!("{}/genre/action", base),
            format!("{}/movie/heat-1995", base),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-tv.xml"))
        .respond_with(xml(urlset(&[
            format!("{}/tv/lost-42", base),
            format!("{}/tv/lost-42/watch", base),
        ])))
        .mount(&server)
        .await;

    let urls = source(&server, &["/sitemap.xml"]).discover().await;

    assert_eq!(
        urls,
        vec![format!("{}/movie/heat-1995", base), format!("{}/tv/lost-42", base)]
    );
}

#[tokio::test]
async fn test_falls_through_to_next_candidate() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/post-sitemap.xml"))
        .respond_with(xml(urlset(&[format!("{}/blog/hello", base)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie-sitemap.xml"))
        .respond_with(xml(urlset(&[format!("{}/movie/a", base)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/never.xml"))
        .respond_with(xml(urlset(&[format!("{}/movie/b", base)])))
        .expect(0)
        .mount(&server)
        .await;

    let urls = source(
        &server,
        &["/sitemap.xml", "/post-sitemap.xml", "/movie-sitemap.xml", "/never.xml"],
    )
    .discover()
    .await;

    assert_eq!(urls, vec![format!("{}/movie/a", base)]);
}

#[tokio::test]
async fn test_all_candidates_failing_yields_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(xml(format!("<urlset><url><loc>{}/movie/a</url>", server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let urls = source(&server, &["/sitemap.xml", "/broken.xml"]).discover().await;
    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_cache_written_once_and_reused() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(urlset(&[format!("{}/movie/a", base), format!("{}/tv/b", base)])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = UrlCache::new(dir.path().join("movie_urls_cache.json"), None);
    let source = source(&server, &["/sitemap.xml"]);

    let first = load_or_discover(&cache, &source, false).await.unwrap();
    let second = load_or_discover(&cache, &source, false).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(cache.load().unwrap(), Some(first));
}
