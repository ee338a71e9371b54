//! Compiled-template cache behavior.

use anyhow::Result;
use viewpress::config::RenderConfig;
use viewpress::render::RenderService;
use viewpress::templating::RenderOptions;
use viewpress::test_utils::ViewFixture;

use crate::get;

#[tokio::test]
async fn test_cached_view_is_not_reread() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi <%= name %>")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let options = RenderOptions::new().local("name", "Ann");
    let first = service.render_to_string(&get("/"), "index.html", options.clone()).await?;

    // Neither an edit nor a deletion is observed once the view is cached
    fixture.write("index.html", "Bye <%= name %>")?;
    let second = service.render_to_string(&get("/"), "index.html", options.clone()).await?;
    fixture.remove("index.html")?;
    let third = service.render_to_string(&get("/"), "index.html", options).await?;

    assert_eq!(first, "Hi Ann");
    assert_eq!(second, "Hi Ann");
    assert_eq!(third, "Hi Ann");

    let stats = service.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.entries, 1);
    Ok(())
}

#[tokio::test]
async fn test_cached_view_renders_fresh_locals() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi <%= name %>")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let ann = service
        .render_to_string(&get("/"), "index.html", RenderOptions::new().local("name", "Ann"))
        .await?;
    let bob = service
        .render_to_string(&get("/"), "index.html", RenderOptions::new().local("name", "Bob"))
        .await?;

    assert_eq!(ann, "Hi Ann");
    assert_eq!(bob, "Hi Bob");
    Ok(())
}

#[tokio::test]
async fn test_cache_disabled_observes_edits() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "one")?;
    let config = RenderConfig {
        cache: false,
        ..fixture.config_without_layout()
    };
    let service = RenderService::new(config)?;

    let first = service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?;
    fixture.write("index.html", "two")?;
    let second = service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?;

    assert_eq!(first, "one");
    assert_eq!(second, "two");
    assert_eq!(service.cache_stats().entries, 0);
    assert_eq!(service.cache_stats().hits, 0);
    Ok(())
}

#[tokio::test]
async fn test_partial_edits_need_cache_clear() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "<%- partial('nav.html') %>")?;
    fixture.write("nav.html", "old nav")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    assert_eq!(service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?, "old nav");

    fixture.write("nav.html", "new nav")?;
    assert_eq!(service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?, "old nav");

    service.clear_cache();
    assert_eq!(service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?, "new nav");
    Ok(())
}

#[tokio::test]
async fn test_layout_is_cached_too() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi")?;
    fixture.write("layout.html", "[<%- body %>]")?;
    let service = RenderService::new(fixture.config())?;

    service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?;
    service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await?;

    let stats = service.cache_stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.hit_rate(), 50.0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_first_renders_agree() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi <%= n %>")?;
    let service = std::sync::Arc::new(RenderService::new(fixture.config_without_layout())?);

    let mut handles = Vec::new();
    for n in 0..8 {
        let service = std::sync::Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .render_to_string(&get("/"), "index.html", RenderOptions::new().local("n", n))
                .await
        }));
    }

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await??, format!("Hi {}", n));
    }
    assert_eq!(service.cache_stats().entries, 1);
    Ok(())
}
