//! Fatal render failures.

use anyhow::Result;
use http::request::Parts;
use serde_json::Value;
use viewpress::config::RenderConfig;
use viewpress::core::{FileOperation, RenderError};
use viewpress::render::RenderService;
use viewpress::templating::RenderOptions;
use viewpress::test_utils::ViewFixture;

use crate::get;

#[tokio::test]
async fn test_missing_view_produces_no_response() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("layout.html", "<%- body %>")?;
    let service = RenderService::new(fixture.config())?;

    let result = service.render(&get("/"), http::Response::builder(), "missing.html", RenderOptions::new()).await;

    match result {
        Err(RenderError::ViewRead {
            view,
            source,
        }) => {
            assert_eq!(view, "missing.html");
            assert_eq!(source.operation, FileOperation::Read);
            assert!(source.is_not_found());
            assert_eq!(source.file_path, fixture.root.join("missing.html"));
        }
        Err(other) => panic!("expected ViewRead, got {:?}", other),
        Ok(response) => panic!("expected no response, got status {}", response.status()),
    }
    assert_eq!(service.cache_stats().entries, 0);
    Ok(())
}

#[tokio::test]
async fn test_panicking_helper_is_execution_error() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi <%= user %>")?;
    let service = RenderService::builder(fixture.config_without_layout())
        .helper_fn("user", |_: &Parts| -> Value { panic!("session store down") })
        .build()?;

    let result = service.render(&get("/"), http::Response::builder(), "index.html", RenderOptions::new()).await;

    match result {
        Err(RenderError::Execution {
            view,
            message,
            ..
        }) => {
            assert_eq!(view, "index.html");
            assert!(message.contains("session store down"));
        }
        Err(other) => panic!("expected Execution, got {:?}", other),
        Ok(response) => panic!("expected no response, got status {}", response.status()),
    }
    Ok(())
}

#[tokio::test]
async fn test_view_outside_root_is_rejected() -> Result<()> {
    let fixture = ViewFixture::new()?;
    std::fs::write(fixture.base_dir().join("secret.html"), "secret")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let err = service
        .render_to_string(&get("/"), "../secret.html", RenderOptions::new())
        .await
        .unwrap_err();
    match err {
        RenderError::ViewRead {
            source,
            ..
        } => assert_eq!(source.operation, FileOperation::Validate),
        other => panic!("expected ViewRead, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_undefined_variable_is_execution_error() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi <%= nmae %>")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let err = service
        .render_to_string(&get("/"), "index.html", RenderOptions::new().local("name", "Ann"))
        .await
        .unwrap_err();
    match &err {
        RenderError::Execution {
            view,
            suggestions,
            ..
        } => {
            assert_eq!(view, "index.html");
            assert!(suggestions.contains(&"name".to_string()));
        }
        other => panic!("expected Execution, got {:?}", other),
    }
    assert!(err.format_with_context().contains("Did you mean"));
    Ok(())
}

#[tokio::test]
async fn test_unclosed_region_is_compile_error() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "line 1\nline 2 <%= name\n")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let err = service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await.unwrap_err();
    assert!(matches!(err, RenderError::Compile { line: Some(2), .. }), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn test_layout_failure_is_reported_for_layout() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "fine")?;
    fixture.write("layout.html", "<%- body %><%= missing_in_layout %>")?;
    let service = RenderService::new(fixture.config())?;

    let err = service.render_to_string(&get("/"), "index.html", RenderOptions::new()).await.unwrap_err();
    assert!(matches!(err, RenderError::Execution { .. }));
    assert_eq!(err.view(), Some("layout.html"));
    Ok(())
}

#[test]
fn test_empty_delimiter_is_config_error() {
    let config = RenderConfig {
        open: String::new(),
        ..RenderConfig::default()
    };
    assert!(matches!(RenderService::new(config), Err(RenderError::Config { .. })));
}
