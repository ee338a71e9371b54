//! Locals precedence: caller options, helpers, filters and the request.

use anyhow::Result;
use http::request::Parts;
use serde_json::{Value, json};
use std::collections::HashMap;
use viewpress::render::RenderService;
use viewpress::templating::RenderOptions;
use viewpress::test_utils::ViewFixture;

use crate::get;

fn shout(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value.as_str().ok_or_else(|| tera::Error::msg("shout expects a string"))?;
    Ok(Value::String(format!("{}!", text.to_uppercase())))
}

#[tokio::test]
async fn test_caller_option_beats_helper() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "<%= title %> - <%= sitename %>")?;

    let service = RenderService::builder(fixture.config_without_layout())
        .helper_value("title", json!("Default Title"))
        .helper_value("sitename", json!("NodeBlog"))
        .build()?;

    let out = service
        .render_to_string(&get("/"), "index.html", RenderOptions::new().local("title", "Caller Title"))
        .await?;
    assert_eq!(out, "Caller Title - NodeBlog");
    Ok(())
}

#[tokio::test]
async fn test_filter_beats_caller_option() -> Result<()> {
    let fixture = ViewFixture::new()?;
    // `shout` as a variable would be the caller's string; it is not a local at all
    fixture.write("index.html", "<% if shout is defined %>local<% else %>filter<% endif %>:<%= name | shout %>")?;

    let service = RenderService::builder(fixture.config_without_layout()).filter("shout", shout).build()?;
    let options = RenderOptions::new().local("shout", "caller value").local("name", "ann");
    let out = service.render_to_string(&get("/"), "index.html", options).await?;

    assert_eq!(out, "filter:ANN!");
    Ok(())
}

#[tokio::test]
async fn test_filter_shadowed_helper_is_never_called() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "<%= name | shout %>")?;

    let service = RenderService::builder(fixture.config_without_layout())
        .filter("shout", shout)
        .helper_fn("shout", |_: &Parts| -> Value { panic!("helper must not run") })
        .build()?;
    let out = service
        .render_to_string(&get("/"), "index.html", RenderOptions::new().local("name", "ann"))
        .await?;
    assert_eq!(out, "ANN!");
    Ok(())
}

#[tokio::test]
async fn test_filter_callable_as_function() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "<%= shout(value=name) %>")?;

    let service = RenderService::builder(fixture.config_without_layout()).filter("shout", shout).build()?;
    let out = service
        .render_to_string(&get("/"), "index.html", RenderOptions::new().local("name", "ann"))
        .await?;
    assert_eq!(out, "ANN!");
    Ok(())
}

#[tokio::test]
async fn test_helper_fn_and_request_snapshot() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write(
        "index.html",
        "<%= request.method %> <%- request.path %>?<%= request.query %> <%= is_admin %>",
    )?;

    let service = RenderService::builder(fixture.config_without_layout())
        .helper_fn("is_admin", |req: &Parts| json!(req.uri.path().starts_with("/admin")))
        .build()?;

    let out = service.render_to_string(&get("/admin/users?page=3"), "index.html", RenderOptions::new()).await?;
    assert_eq!(out, "GET /admin/users?page=3 true");

    let out = service.render_to_string(&get("/blog"), "index.html", RenderOptions::new()).await?;
    assert_eq!(out, "GET /blog? false");
    Ok(())
}

#[tokio::test]
async fn test_scope_is_an_ordinary_local() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "<%= scope.user %>")?;
    let service = RenderService::new(fixture.config_without_layout())?;

    let options = RenderOptions::new().local("scope", json!({"user": "Ann"}));
    assert_eq!(service.render_to_string(&get("/"), "index.html", options).await?, "Ann");
    Ok(())
}
