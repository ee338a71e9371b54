//! Emitted response headers and body.

use anyhow::Result;
use http::StatusCode;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use viewpress::render::RenderService;
use viewpress::templating::RenderOptions;
use viewpress::test_utils::ViewFixture;

use crate::get;

#[tokio::test]
async fn test_content_length_is_byte_length() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "<%= greeting %>")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let greeting = "héllo wörld ✓ 日本";
    let response = service
        .render(&get("/"), http::Response::builder(), "index.html", RenderOptions::new().local("greeting", greeting))
        .await?;

    assert!(greeting.len() > greeting.chars().count());
    assert_eq!(response.headers()[CONTENT_LENGTH], greeting.len().to_string().as_str());
    assert_eq!(response.body().len(), greeting.len());
    assert_eq!(std::str::from_utf8(response.body())?, greeting);
    Ok(())
}

#[tokio::test]
async fn test_existing_response_parts_are_kept() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("feed.xml", "<rss><%= title %></rss>")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let builder = http::Response::builder()
        .status(StatusCode::CREATED)
        .header(CONTENT_TYPE, "application/rss+xml; charset=latin1")
        .header("cache-control", "no-store");
    let response = service
        .render(&get("/feed"), builder, "feed.xml", RenderOptions::new().local("title", "News"))
        .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/rss+xml; charset=utf-8");
    assert_eq!(response.headers()["cache-control"], "no-store");
    assert_eq!(response.body(), b"<rss>News</rss>");
    Ok(())
}

#[tokio::test]
async fn test_default_content_type() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "ok")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let response = service.render(&get("/"), http::Response::builder(), "index.html", RenderOptions::new()).await?;
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(response.headers()[CONTENT_LENGTH], "2");
    Ok(())
}
