use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::tempdir;

use crate::config::ConfigError;
use crate::kernel::error::Error;
use crate::kernel::tests::support::{config, configured_app, get, AuditPlugin, PostsController};
use crate::kernel::{Application, KernelState, Manifest};
use crate::model::{CollectionDefinition, ModelDefinition, ModelError};
use crate::registry::{ComponentKind, Plugin, RegistryError};
use crate::routing::{Handler, Request};

#[test]
fn test_configure_only_once() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = Application::new();
    assert_eq!(app.state(), KernelState::Unconfigured);
    assert!(matches!(app.settings(), Err(Error::Config(ConfigError::NotSet))));

    let settings = app.configure(config(dir.path(), json!({}))).expect("configure failed");
    assert_eq!(settings.root_dir, dir.path());
    assert_eq!(app.state(), KernelState::Configured);

    let second = app.configure(config(dir.path(), json!({ "port": 9000 })));
    assert!(matches!(second, Err(Error::Config(ConfigError::AlreadySet))));
    assert_eq!(app.settings().unwrap().port, 0, "The first configuration stays in effect");
}

#[test]
fn test_registration_before_configure_is_rejected() {
    let mut app = Application::new();
    let handler = Handler::terminal(|_request: Request| async { "x" });

    assert!(matches!(app.register_middleware(handler), Err(Error::Config(ConfigError::NotSet))));
    assert!(matches!(
        app.register_helper("upper", |_args: &[Value]| Value::Null),
        Err(Error::Config(ConfigError::NotSet))
    ));
    assert!(app.middleware().is_empty());
    assert!(app.helpers().is_empty());
}

#[test]
fn test_sensitive_keys_read_as_absent() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({ "db": { "client": "memory" } }));

    assert_eq!(app.get_config("port"), Some(&json!(0)));
    assert!(app.get_config("secret").is_none());
    assert!(app.get_config("db").is_none());
    assert_eq!(app.settings().unwrap().secret.as_deref(), Some("s3cret"));

    assert!(app.update_config("port", 4000).unwrap());
    assert_eq!(app.get_config("port"), Some(&json!(4000)));
    assert!(!app.update_config("neverSet", 1).unwrap());
    assert!(app.get_config("neverSet").is_none());
}

#[test]
fn test_middleware_and_helpers_after_configure() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));

    app.register_middleware(Handler::terminal(|_request: Request| async { "x" }).named("auth"))
        .unwrap();
    app.register_helper("upper", |args: &[Value]| {
        Value::from(args.first().and_then(Value::as_str).unwrap_or_default().to_uppercase())
    })
    .unwrap();

    assert_eq!(app.middleware().len(), 1);
    assert_eq!(app.middleware()[0].name(), "auth");
    assert_eq!(app.helpers(), vec!["upper"]);
}

#[tokio::test]
async fn test_boot_registers_everything_in_order() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));

    let manifest = Manifest::new()
        .model("Post", ModelDefinition::new("posts"))
        .model("User", ModelDefinition::new("users"))
        .collection("Feed", CollectionDefinition::of("Post"))
        .controller::<PostsController>("Posts")
        .plugin(|_config| Ok(Arc::new(AuditPlugin { label: "main".to_string() }) as Arc<dyn Plugin>))
        .routes("posts", |app| {
            let index = app.action("Posts", "index")?;
            app.get("/posts", index)?;
            let create = app.action("Posts", "create")?;
            app.post("/posts", create)
        });

    let summary = app.boot(manifest).await.expect("boot failed");
    assert_eq!(app.state(), KernelState::Started);
    assert_eq!(summary.models, vec!["Post", "User"]);
    assert_eq!(summary.collections, vec!["Feed"]);
    assert_eq!(summary.plugins, vec!["audit"]);
    assert_eq!(summary.routes, 2);
    assert_eq!(summary.controllers.len(), 1);
    assert_eq!(summary.controllers[0].name, "Posts");
    assert_eq!(summary.controllers[0].methods, vec!["index", "create"]);

    assert_eq!(app.get_model("Post").unwrap().table_name(), "posts");
    assert_eq!(app.get_collection("Feed").unwrap().model().name(), "Post");
    assert_eq!(app.persistence().map(|store| store.client()), Some("memory"));
    assert!(app.orm().is_some());
}

#[tokio::test]
async fn test_router_serves_controller_actions_and_services() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));
    app.register_helper("shout", |args: &[Value]| {
        Value::from(format!("{}!", args.first().and_then(Value::as_str).unwrap_or_default()))
    })
    .unwrap();

    let table = Handler::try_terminal(|request: Request| async move {
        let services = crate::kernel::Services::from_request(&request)?;
        let model = services.model("Post")?;
        let shout = services.helper("shout").map(|helper| helper(&[Value::from(model.table_name())]));
        Ok(axum::response::IntoResponse::into_response(
            shout.and_then(|value| value.as_str().map(str::to_string)).unwrap_or_default(),
        ))
    });
    let manifest = Manifest::new()
        .model("Post", ModelDefinition::new("posts"))
        .controller::<PostsController>("Posts")
        .routes("posts", move |app| {
            let index = app.action("Posts", "index")?;
            app.get("/posts", index)?;
            app.get("/table", table)
        });
    app.boot(manifest).await.expect("boot failed");

    let router = app.router().expect("router should be available after boot");
    assert_eq!(get(router.clone(), "/posts").await, (axum::http::StatusCode::OK, "all posts".to_string()));
    assert_eq!(get(router, "/table").await.1, "posts!");
}

#[tokio::test]
async fn test_duplicate_model_name_aborts_boot() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));
    let manifest = Manifest::new()
        .model("Post", ModelDefinition::new("posts"))
        .model("Post", ModelDefinition::new("articles"));

    let err = app.boot(manifest).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("LoadModels"), "Unexpected error: {}", message);
    assert!(
        matches!(err, Error::KernelLifecycleError { source: Some(ref source), .. }
            if matches!(**source, Error::Registry(RegistryError::DuplicateName { .. })))
    );
}

#[tokio::test]
async fn test_registry_lookups_after_boot() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({ "serverless": true }));
    let manifest = Manifest::new()
        .model("Post", ModelDefinition::new("posts"))
        .controller::<PostsController>("Posts")
        .plugin(|_config| Ok(Arc::new(AuditPlugin { label: "main".to_string() }) as Arc<dyn Plugin>));
    app.boot(manifest).await.expect("boot failed");

    let err = app.get_model("Nope").unwrap_err();
    assert_eq!(err.to_string(), "Registry error: Model<Nope> not found");

    let dup = app.add_model("Post", ModelDefinition::new("posts")).unwrap_err();
    assert!(matches!(
        dup,
        Error::Registry(RegistryError::DuplicateName { kind: ComponentKind::Model, .. })
    ));

    assert!(app.has_controller("Posts", "index"));
    assert!(!app.has_controller("Posts", "destroy"));
    assert!(!app.has_controller("Missing", "index"));
    assert!(app.get_controller("Posts").is_ok());
    assert!(app.action("Posts", "destroy").is_err());

    assert_eq!(app.get_plugin_as::<AuditPlugin>("audit").map(|p| p.label.as_str()), Some("main"));
    assert!(app.get_plugin_as::<AuditPlugin>("other").is_none());
    assert!(matches!(
        app.get_plugin("other"),
        Err(Error::Registry(RegistryError::NotFound { kind: ComponentKind::Plugin, .. }))
    ));
}

#[tokio::test]
async fn test_duplicate_plugin_name_aborts_boot() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));
    let manifest = Manifest::new()
        .plugin(|_config| Ok(Arc::new(AuditPlugin { label: "a".to_string() }) as Arc<dyn Plugin>))
        .plugin(|_config| Ok(Arc::new(AuditPlugin { label: "b".to_string() }) as Arc<dyn Plugin>));

    let err = app.boot(manifest).await.unwrap_err();
    assert!(err.to_string().contains("LoadPlugins"), "Unexpected error: {}", err);
}

#[tokio::test]
async fn test_collection_over_unknown_model_fails() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));
    let manifest = Manifest::new().collection("Feed", CollectionDefinition::of("Ghost"));

    let err = app.boot(manifest).await.unwrap_err();
    assert!(err.to_string().contains("LoadCollections"), "Unexpected error: {}", err);
}

fn slugged(slug: Option<&str>) -> serde_json::Map<String, Value> {
    let mut attributes = serde_json::Map::new();
    attributes.insert("title".to_string(), json!("Hello"));
    if let Some(slug) = slug {
        attributes.insert("slug".to_string(), json!(slug));
    }
    attributes
}

#[tokio::test]
async fn test_booted_store_enforces_unique_slugs() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let mut app = configured_app(dir.path(), json!({}));
    let manifest = Manifest::new()
        .model("Post", ModelDefinition::new("posts"))
        .model("Tag", ModelDefinition::new("tags").with_unique("label"));
    app.boot(manifest).await.expect("boot failed");

    let posts = app.get_model("Post").unwrap();
    posts.forge(slugged(Some("hello"))).save().await.expect("first save failed");
    let err = posts.forge(slugged(Some("hello"))).save().await.unwrap_err();
    assert!(
        matches!(err, ModelError::PersistenceRace { ref table, ref column, .. } if table == "posts" && column == "slug"),
        "Unexpected error: {:?}",
        err
    );

    // Rows without a slug never clash
    posts.forge(slugged(None)).save().await.unwrap();
    posts.forge(slugged(None)).save().await.unwrap();

    let tags = app.get_model("Tag").unwrap();
    let mut rust = slugged(None);
    rust.insert("label".to_string(), json!("rust"));
    tags.forge(rust.clone()).save().await.unwrap();
    let err = tags.forge(rust).save().await.unwrap_err();
    assert!(matches!(err, ModelError::PersistenceRace { ref column, .. } if column == "label"));
}
