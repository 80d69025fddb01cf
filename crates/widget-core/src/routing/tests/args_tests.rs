use crate::routing::args::to_router_path;
use crate::routing::tests::support::{call_log, recorder, terminal};
use crate::routing::{normalize, Handler, RouteArg, RouteArgs, RouteDefinition, RouteError, Verb};

fn names(chain: &[Handler]) -> Vec<&str> {
    chain.iter().map(Handler::name).collect()
}

fn kernel() -> Handler {
    recorder("kernel", call_log())
}

#[test]
fn test_single_handler_gets_kernel_first() {
    let log = call_log();
    let chain = normalize(terminal(log).into(), Some(&kernel()));
    assert_eq!(names(&chain), vec!["kernel", "handler"]);
}

#[test]
fn test_single_middleware_is_paired_with_kernel() {
    let log = call_log();
    let args: RouteArgs = (recorder("auth", log.clone()), terminal(log)).into();
    let chain = normalize(args, Some(&kernel()));
    assert_eq!(names(&chain), vec!["auth", "kernel", "handler"]);
}

#[test]
fn test_middleware_list_gets_kernel_appended() {
    let log = call_log();
    let args: RouteArgs = (
        vec![recorder("auth", log.clone()), recorder("load", log.clone())],
        terminal(log),
    )
        .into();
    let chain = normalize(args, Some(&kernel()));
    assert_eq!(names(&chain), vec!["auth", "load", "kernel", "handler"]);
}

#[test]
fn test_other_arity_passes_through_unchanged() {
    let log = call_log();
    let args = RouteArgs::from(vec![
        RouteArg::Handler(recorder("a", log.clone())),
        RouteArg::Handler(recorder("b", log.clone())),
        RouteArg::Handler(terminal(log)),
    ]);
    assert_eq!(args.len(), 3);
    let chain = normalize(args, Some(&kernel()));
    assert_eq!(names(&chain), vec!["a", "b", "handler"]);

    let empty = normalize(RouteArgs::default(), Some(&kernel()));
    assert!(empty.is_empty());
}

#[test]
fn test_no_kernel_middleware_only_flattens() {
    let log = call_log();
    let args: RouteArgs = (vec![recorder("auth", log.clone())], terminal(log)).into();
    let chain = normalize(args, None);
    assert_eq!(names(&chain), vec!["auth", "handler"]);
}

#[test]
fn test_route_definition_validation() {
    let log = call_log();
    let err = RouteDefinition::new(Verb::Get, "posts", vec![terminal(log.clone())]).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPath { ref path } if path == "posts"));

    let err = RouteDefinition::new(Verb::Post, "/posts", Vec::new()).unwrap_err();
    assert!(matches!(err, RouteError::EmptyChain { .. }));

    let route = RouteDefinition::new(Verb::Post, "/posts", vec![terminal(log)]).unwrap();
    assert_eq!(route.handler_names(), vec!["handler"]);
    assert!(route.verb.is_write());
    assert!(!Verb::Get.is_write());
    assert_eq!(Verb::Post.to_string(), "POST");
}

#[test]
fn test_router_path_conversion() {
    assert_eq!(to_router_path("/posts/:slug"), "/posts/{slug}");
    assert_eq!(to_router_path("/users/:id/posts/:post"), "/users/{id}/posts/{post}");
    assert_eq!(to_router_path("/plain"), "/plain");
    assert_eq!(to_router_path("/"), "/");
    assert_eq!(to_router_path("/files/*"), "/files/{*wildcard}");
    assert_eq!(to_router_path("/assets/*rest"), "/assets/{*rest}");
}

#[test]
fn test_patterns_the_router_refuses_are_rejected() {
    let log = call_log();
    for path in ["/posts/:", "/files/*/meta", "/posts/:id?", "/a{b}", "/posts/{}"] {
        let err = RouteDefinition::new(Verb::Get, path, vec![terminal(log.clone())]).unwrap_err();
        assert!(
            matches!(err, RouteError::InvalidPattern { path: ref rejected, .. } if rejected == path),
            "{} should be rejected, got {:?}",
            path,
            err
        );
    }

    let route = RouteDefinition::new(Verb::Get, "/posts/{id}", vec![terminal(log)]).unwrap();
    assert_eq!(route.router_path(), "/posts/{id}");
}

#[test]
fn test_capture_name_conflicts() {
    let log = call_log();
    let route = |path: &str| RouteDefinition::new(Verb::Get, path, vec![terminal(log.clone())]).unwrap();

    let by_id = route("/posts/:id");
    assert!(by_id.conflicts_with(&route("/posts/:slug")));
    assert!(by_id.conflicts_with(&route("/posts/:slug/edit")));
    assert!(by_id.conflicts_with(&route("/posts/*")));

    assert!(!by_id.conflicts_with(&route("/posts/:id")));
    assert!(!by_id.conflicts_with(&route("/posts/{id}/edit")));
    assert!(!by_id.conflicts_with(&route("/posts/new")));
    assert!(!by_id.conflicts_with(&route("/users/:slug")));
}
