//! Integration tests for `RouteCreator` / `Route`
//!
//! Covers method dispatch and the fallback, global then local middleware ordering,
//! context construction, and how failures from every step reach the error handler.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use apiroute::exchange::{ApiRequest, ApiResponse};
use apiroute::middleware::{shared, SharedMiddleware};
use apiroute::route::{sync, RouteCreator};
use apiroute::runtime_config::RuntimeConfig;
use apiroute::{AllowedMethod, Failure, StepResult};
use common::fixtures::{
    create_context, create_middleware, get, message_error_handler, simple, unimplemented_method,
    CallLog, Counter, Ctx,
};
use serde_json::json;
use tracing_util::TestTracing;

async fn send(route: &apiroute::Route<Ctx>, req: ApiRequest) -> ApiResponse {
    let res = ApiResponse::new();
    route.handle(req, res.clone()).await;
    res
}

#[tokio::test]
async fn test_get_handler_receives_context() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .get(|_req: ApiRequest, res: ApiResponse, ctx: Ctx| async move {
            res.status(200).json(json!({ "value": ctx.value }));
            Ok(())
        })
        .build();

    let res = send(&route, get(None)).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.body(), Some(json!({ "value": 1 })));
}

#[tokio::test]
async fn test_unregistered_method_uses_fallback() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .get(|_req: ApiRequest, res: ApiResponse, ctx: Ctx| async move {
            res.status(200).json(json!({ "value": ctx.value }));
            Ok(())
        })
        .build();

    let res = send(&route, ApiRequest::new("POST", "/test")).await;
    assert_eq!(res.status_code(), 405);
    assert_eq!(res.body(), Some(json!({ "message": "Unimplemented" })));
}

#[tokio::test]
async fn test_methods_outside_allowed_set_use_fallback() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .get(|_req: ApiRequest, res: ApiResponse, _ctx: Ctx| async move {
            res.status(200);
            Ok(())
        })
        .build();

    for method in ["OTHER", "HEAD", "OPTIONS", ""] {
        let res = send(&route, ApiRequest::new(method, "/test")).await;
        assert_eq!(res.status_code(), 405, "method {method:?}");
    }
}

#[tokio::test]
async fn test_each_method_runs_only_its_handler() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();

    let mut builder = simple().build().route();
    for (method, status) in AllowedMethod::ALL.into_iter().zip(200u16..) {
        let log = log.clone();
        builder = builder.on(method, move |_req: ApiRequest, res: ApiResponse, _ctx: Ctx| {
            let log = log.clone();
            async move {
                log.push(method.as_str());
                res.status(status);
                Ok(())
            }
        });
    }
    let route = builder.build();
    assert_eq!(route.methods().count(), AllowedMethod::COUNT);

    for (method, status) in ["GET", "POST", "PUT", "PATCH", "DELETE"].into_iter().zip(200u16..) {
        let res = send(&route, ApiRequest::new(method, "/test")).await;
        assert_eq!(res.status_code(), status, "method {method}");
    }
    assert_eq!(log.calls(), vec!["get", "post", "put", "patch", "delete"]);
}

#[tokio::test]
async fn test_method_matching_ignores_case() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .delete(|_req: ApiRequest, res: ApiResponse, _ctx: Ctx| async move {
            res.status(204);
            Ok(())
        })
        .build();

    for method in ["delete", "DELETE", "Delete"] {
        let res = send(&route, ApiRequest::new(method, "/test")).await;
        assert_eq!(res.status_code(), 204, "method {method}");
    }
}

#[tokio::test]
async fn test_try_on_rejects_unknown_method() {
    let route = simple().build().route();
    match route.try_on("TRACE", sync(unimplemented_method)) {
        Ok(_) => panic!("TRACE is not routable"),
        Err(err) => assert_eq!(err.method, "TRACE"),
    }

    let route = simple()
        .build()
        .route()
        .try_on("put", |_req: ApiRequest, res: ApiResponse, _ctx: Ctx| async move {
            res.status(201);
            Ok(())
        })
        .map_err(|e| e.to_string())
        .unwrap_or_else(|e| panic!("put is routable: {e}"))
        .build();
    let res = send(&route, ApiRequest::new("PUT", "/test")).await;
    assert_eq!(res.status_code(), 201);
}

#[tokio::test]
async fn test_global_middleware_runs_before_local() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();

    let creator = simple()
        .middleware(create_middleware(&log, "A", "fail A"))
        .middleware(create_middleware(&log, "B", "fail B"))
        .build();
    let handler_log = log.clone();
    let route = creator
        .route()
        .middleware(create_middleware(&log, "C", "fail C"))
        .middleware(create_middleware(&log, "D", "fail D"))
        .get(move |_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| {
            let log = handler_log.clone();
            async move {
                log.push("handler");
                Ok(())
            }
        })
        .build();
    assert_eq!(route.middleware_len(), 4);

    send(&route, get(None)).await;
    assert_eq!(log.calls(), vec!["A", "B", "C", "D", "handler"]);
}

#[tokio::test]
async fn test_routes_share_global_middleware_only() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();
    let creator = simple().middleware(create_middleware(&log, "global", "")).build();

    let first = creator
        .route()
        .middleware(create_middleware(&log, "first", ""))
        .build();
    let second = creator.route().build();

    send(&first, get(None)).await;
    send(&second, get(None)).await;
    assert_eq!(log.calls(), vec!["global", "first", "global"]);
    assert_eq!(creator.global_middleware_len(), 1);
}

#[tokio::test]
async fn test_shared_middleware_lists() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();
    let stack: Vec<SharedMiddleware<ApiRequest, ApiResponse>> = vec![
        shared(create_middleware(&log, "auth", "")),
        shared(create_middleware(&log, "audit", "")),
    ];

    let route = simple()
        .middlewares(stack.clone())
        .build()
        .route()
        .middlewares(stack)
        .build();
    assert_eq!(route.middleware_len(), 4);

    send(&route, get(None)).await;
    assert_eq!(log.calls(), vec!["auth", "audit", "auth", "audit"]);
}

#[tokio::test]
async fn test_middleware_failure_reaches_error_handler() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();
    let route = simple()
        .middleware(create_middleware(&log, "A", "fail A"))
        .handle_error(message_error_handler)
        .build()
        .route()
        .get(|_req: ApiRequest, res: ApiResponse, ctx: Ctx| async move {
            res.json(json!({ "value": ctx.value }));
            Ok(())
        })
        .build();

    let res = send(&route, get(Some("fail A"))).await;
    assert_eq!(res.body(), Some(json!({ "message": "Failure" })));
}

#[tokio::test]
async fn test_failure_stops_the_rest_of_the_chain() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();
    let contexts = Counter::default();
    let counted = contexts.clone();
    let handler_log = log.clone();

    let route = RouteCreator::builder(
        move |req: &ApiRequest, res: &ApiResponse| {
            counted.hit();
            create_context(req, res)
        },
        sync(unimplemented_method),
    )
    .runtime_config(RuntimeConfig::default())
    .middleware(create_middleware(&log, "A", "fail A"))
    .middleware(create_middleware(&log, "B", "fail B"))
    .handle_error(message_error_handler)
    .build()
    .route()
    .middleware(create_middleware(&log, "C", "fail C"))
    .get(move |_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| {
        let log = handler_log.clone();
        async move {
            log.push("handler");
            Ok(())
        }
    })
    .build();

    send(&route, get(Some("fail B"))).await;
    assert_eq!(log.calls(), vec!["A", "B"]);
    assert_eq!(contexts.get(), 0);
}

#[tokio::test]
async fn test_context_is_built_once_after_middleware() {
    let _tracing = TestTracing::init();
    let log = CallLog::default();
    let context_log = log.clone();

    let route = RouteCreator::builder(
        move |req: &ApiRequest, res: &ApiResponse| {
            context_log.push("context");
            create_context(req, res)
        },
        sync(unimplemented_method),
    )
    .runtime_config(RuntimeConfig::default())
    .middleware(create_middleware(&log, "A", ""))
    .build()
    .route()
    .middleware(create_middleware(&log, "B", ""))
    .build();

    let res = send(&route, get(None)).await;
    assert_eq!(log.calls(), vec!["A", "B", "context"]);
    assert_eq!(res.status_code(), 405);
}

#[tokio::test]
async fn test_handler_string_failure_reaches_error_handler() {
    let _tracing = TestTracing::init();
    let route = simple()
        .handle_error(message_error_handler)
        .build()
        .route()
        .get(|_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| async move {
            Err(Failure::from("Body failed"))
        })
        .build();

    let res = send(&route, get(None)).await;
    assert_eq!(res.body(), Some(json!({ "message": "Body failed" })));
}

#[tokio::test]
async fn test_unrecognised_failure_is_unknown_error() {
    let _tracing = TestTracing::init();
    let route = simple()
        .handle_error(message_error_handler)
        .build()
        .route()
        .get(|_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| async move {
            Err(Failure::new(42_i32))
        })
        .build();

    let res = send(&route, get(None)).await;
    assert_eq!(res.body(), Some(json!({ "message": "Unknown error" })));
}

#[derive(Debug)]
struct Marker;

#[tokio::test]
async fn test_error_handler_receives_the_same_values() {
    let _tracing = TestTracing::init();
    let marker = Arc::new(Marker);
    let rejected = Arc::clone(&marker);
    let seen: Arc<Mutex<Option<(ApiRequest, ApiResponse, bool)>>> = Arc::default();
    let sink = Arc::clone(&seen);

    let route = simple()
        .middleware(apiroute::init_middleware(
            move |_req: ApiRequest, _res: ApiResponse, next: apiroute::Next| {
                next.reject(Failure::new(Arc::clone(&rejected)));
            },
        ))
        .handle_error(move |req: ApiRequest, res: ApiResponse, err: Failure| {
            let same = err
                .downcast_ref::<Arc<Marker>>()
                .is_some_and(|m| Arc::ptr_eq(m, &marker));
            *sink.lock().unwrap() = Some((req, res, same));
        })
        .build()
        .route()
        .build();

    let req = get(None);
    let res = ApiResponse::new();
    route.handle(req.clone(), res.clone()).await;

    let (seen_req, seen_res, same) = seen.lock().unwrap().take().expect("handler ran");
    assert!(same, "failure value must be passed through unchanged");
    assert!(seen_req.same_request(&req));
    assert!(seen_res.same_response(&res));
}

#[tokio::test]
async fn test_failure_without_error_handler_is_swallowed() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .get(|_req: ApiRequest, res: ApiResponse, _ctx: Ctx| async move {
            res.status(202).json(json!({ "partial": true }));
            Err(Failure::from("late failure"))
        })
        .build();
    assert!(!simple().build().has_error_handler());

    let res = send(&route, get(None)).await;
    assert_eq!(res.status_code(), 202);
    assert_eq!(res.body(), Some(json!({ "partial": true })));
}

#[tokio::test]
async fn test_error_handler_not_called_on_success() {
    let _tracing = TestTracing::init();
    let errors = Counter::default();
    let counted = errors.clone();
    let route = simple()
        .handle_error(move |_req: ApiRequest, _res: ApiResponse, _err: Failure| counted.hit())
        .build()
        .route()
        .get(|_req: ApiRequest, res: ApiResponse, _ctx: Ctx| async move {
            res.status(200);
            Ok(())
        })
        .build();

    send(&route, get(None)).await;
    send(&route, ApiRequest::new("POST", "/test")).await;
    assert_eq!(errors.get(), 0);
}

#[tokio::test]
async fn test_context_failure_reaches_error_handler() {
    let _tracing = TestTracing::init();
    let handled = Counter::default();
    let counted = handled.clone();

    let route = RouteCreator::builder(
        |_req: &ApiRequest, _res: &ApiResponse| -> Result<Ctx, Failure> {
            Err(Failure::from("no session"))
        },
        sync(unimplemented_method),
    )
    .runtime_config(RuntimeConfig::default())
    .handle_error(message_error_handler)
    .build()
    .route()
    .get(move |_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| {
        let counted = counted.clone();
        async move {
            counted.hit();
            Ok(())
        }
    })
    .build();

    let res = send(&route, get(None)).await;
    assert_eq!(res.body(), Some(json!({ "message": "no session" })));
    assert_eq!(handled.get(), 0);
}

#[tokio::test]
async fn test_fallback_receives_context() {
    let _tracing = TestTracing::init();
    let route = RouteCreator::builder(
        create_context,
        |_req: ApiRequest, res: ApiResponse, ctx: Ctx| async move {
            res.status(405).json(json!({ "value": ctx.value }));
            Ok(())
        },
    )
    .runtime_config(RuntimeConfig::default())
    .build()
    .route()
    .build();

    let res = send(&route, ApiRequest::new("PATCH", "/test")).await;
    assert_eq!(res.status_code(), 405);
    assert_eq!(res.body(), Some(json!({ "value": 1 })));
}

#[tokio::test]
async fn test_sync_handler() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .post(sync(|req: ApiRequest, res: ApiResponse, _ctx: Ctx| {
            res.status(201).json(json!({ "echo": req.body().cloned() }));
            Ok(())
        }))
        .build();

    let req = ApiRequest::new("POST", "/items").with_body(json!({ "name": "x" }));
    let res = send(&route, req).await;
    assert_eq!(res.status_code(), 201);
    assert_eq!(res.body(), Some(json!({ "echo": { "name": "x" } })));
}

#[tokio::test]
async fn test_handler_panic_reaches_error_handler() {
    let _tracing = TestTracing::init();
    let route = simple()
        .handle_error(message_error_handler)
        .build()
        .route()
        .get(sync(|_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| -> StepResult {
            panic!("handler exploded")
        }))
        .build();

    let res = send(&route, get(None)).await;
    assert_eq!(res.body(), Some(json!({ "message": "handler exploded" })));
}

#[tokio::test]
async fn test_panics_propagate_when_catching_disabled() {
    let handled = Counter::default();
    let counted = handled.clone();
    let route = simple()
        .runtime_config(RuntimeConfig::default().with_catch_panics(false))
        .handle_error(move |_req: ApiRequest, _res: ApiResponse, _err: Failure| counted.hit())
        .build()
        .route()
        .get(sync(|_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| -> StepResult {
            panic!("handler exploded")
        }))
        .build();

    let err = tokio::spawn(route.handle(get(None), ApiResponse::new()))
        .await
        .expect_err("panic escapes the route");
    assert!(err.is_panic());
    assert_eq!(handled.get(), 0);
}

#[tokio::test]
async fn test_error_handler_panic_propagates() {
    let route = simple()
        .handle_error(|_req: ApiRequest, _res: ApiResponse, _err: Failure| {
            panic!("error handler exploded")
        })
        .build()
        .route()
        .get(|_req: ApiRequest, _res: ApiResponse, _ctx: Ctx| async move {
            Err(Failure::from("handler failed"))
        })
        .build();

    let err = tokio::spawn(route.handle(get(None), ApiResponse::new()))
        .await
        .expect_err("error handler panic is not caught");
    assert!(err.is_panic());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_independent() {
    let route = simple()
        .handle_error(message_error_handler)
        .build()
        .route()
        .post(|req: ApiRequest, res: ApiResponse, ctx: Ctx| async move {
            let n = req.body().and_then(|b| b.as_i64()).unwrap_or_default();
            // Finish out of order.
            tokio::time::sleep(Duration::from_millis((32 - n as u64) % 7)).await;
            if n % 5 == 0 {
                return Err(Failure::from(format!("rejected {n}")));
            }
            res.status(200).json(json!({ "n": n + ctx.value }));
            Ok(())
        })
        .build();

    let mut tasks = Vec::new();
    for n in 0..32_i64 {
        let route = route.clone();
        let res = ApiResponse::new();
        let req = ApiRequest::new("POST", "/items").with_body(json!(n));
        let out = res.clone();
        tasks.push((n, out, tokio::spawn(route.handle(req, res))));
    }

    for (n, res, task) in tasks {
        task.await.expect("request task");
        if n % 5 == 0 {
            assert_eq!(res.body(), Some(json!({ "message": format!("rejected {n}") })));
        } else {
            assert_eq!(res.body(), Some(json!({ "n": n + 1 })));
        }
    }
}

#[tokio::test]
async fn test_http_round_trip() {
    let _tracing = TestTracing::init();
    let route = simple()
        .build()
        .route()
        .patch(|req: ApiRequest, res: ApiResponse, _ctx: Ctx| async move {
            res.set_header("x-request-id", req.request_id().to_string());
            res.status(200).json(json!({ "path": req.path() }));
            Ok(())
        })
        .build();

    let id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let incoming = http::Request::builder()
        .method(http::Method::PATCH)
        .uri("/items/7?verbose=1")
        .header("X-Request-Id", id)
        .body(Some(json!({ "name": "x" })))
        .expect("valid request");

    let res = send(&route, ApiRequest::from_http(incoming)).await;
    let out = res.to_http().expect("valid response");

    assert_eq!(out.status(), http::StatusCode::OK);
    assert_eq!(out.headers()["x-request-id"], id);
    assert_eq!(out.headers()["content-type"], "application/json");
    let body: serde_json::Value = serde_json::from_slice(out.body()).expect("json body");
    assert_eq!(body, json!({ "path": "/items/7" }));
}

/// Response type owned by an embedding framework.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }
}

#[tokio::test]
async fn test_foreign_request_and_response_types() {
    let _tracing = TestTracing::init();
    type Req = Arc<http::Request<()>>;

    let creator = RouteCreator::builder(
        |req: &Req, _res: &Recorder| Ok::<_, Failure>(req.uri().path().to_string()),
        sync(|_req: Req, res: Recorder, path: String| {
            res.push(format!("fallback {path}"));
            Ok(())
        }),
    )
    .runtime_config(RuntimeConfig::default())
    .middleware(|_req: Req, res: Recorder| async move {
        res.push("middleware");
        Ok(())
    })
    .build();
    let route = creator
        .route()
        .put(|_req: Req, res: Recorder, path: String| async move {
            res.push(format!("put {path}"));
            Ok(())
        })
        .build();

    let res = Recorder::default();
    for method in [http::Method::PUT, http::Method::GET] {
        let req = http::Request::builder()
            .method(method)
            .uri("/things")
            .body(())
            .expect("valid request");
        route.handle(Arc::new(req), res.clone()).await;
    }

    assert_eq!(
        *res.0.lock().unwrap(),
        vec!["middleware", "put /things", "middleware", "fallback /things"]
    );
}
