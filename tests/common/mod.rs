#![allow(dead_code)]

pub mod fixtures {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use apiroute::exchange::{ApiRequest, ApiResponse};
    use apiroute::middleware::{init_middleware, Adapted, Next};
    use apiroute::route::{sync, RouteCreator, RouteCreatorBuilder};
    use apiroute::runtime_config::RuntimeConfig;
    use apiroute::{Failure, StepResult};
    use serde_json::json;

    /// Ordered record of which steps ran.
    #[derive(Clone, Default)]
    pub struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        pub fn push(&self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_string());
        }

        pub fn calls(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Shared counter for "how many times did this run".
    #[derive(Clone, Default)]
    pub struct Counter(Arc<AtomicUsize>);

    impl Counter {
        pub fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    pub struct Ctx {
        pub value: i64,
    }

    pub fn create_context(_req: &ApiRequest, _res: &ApiResponse) -> Result<Ctx, Failure> {
        Ok(Ctx { value: 1 })
    }

    pub fn unimplemented_method(_req: ApiRequest, res: ApiResponse, _ctx: Ctx) -> StepResult {
        res.status(405).json(json!({ "message": "Unimplemented" }));
        Ok(())
    }

    /// Error handler that reports the failure's message, like a typical API would.
    pub fn message_error_handler(_req: ApiRequest, res: ApiResponse, err: Failure) {
        let message = if let Some(e) = err.as_anyhow() {
            e.to_string()
        } else if let Some(m) = err.message() {
            m.to_string()
        } else {
            "Unknown error".to_string()
        };
        res.json(json!({ "message": message }));
    }

    /// Creator with the default fixtures and no middleware or error handler.
    pub fn simple() -> RouteCreatorBuilder<Ctx> {
        RouteCreator::builder(create_context, sync(unimplemented_method))
            .runtime_config(RuntimeConfig::default())
    }

    /// Callback-style middleware that records `name` and fails with
    /// `anyhow!("Failure")` when the request body is the string `fail_on`.
    pub fn create_middleware(
        log: &CallLog,
        name: &'static str,
        fail_on: &'static str,
    ) -> Adapted<impl Fn(ApiRequest, ApiResponse, Next) + Send + Sync + 'static> {
        let log = log.clone();
        init_middleware(move |req: ApiRequest, _res: ApiResponse, next: Next| {
            log.push(name);
            if req.body_str() == Some(fail_on) {
                next.reject(anyhow::anyhow!("Failure"));
            } else {
                next.resolve();
            }
        })
    }

    pub fn get(body: Option<&str>) -> ApiRequest {
        let req = ApiRequest::new("GET", "/test");
        match body {
            Some(b) => req.with_body(json!(b)),
            None => req,
        }
    }
}
