//! Example: wiring a small service graph with a nested request scope.

use std::sync::Arc;

use vessel_rs::{key, Bindings, Dispose, Injector, Lifetime, RecipeError, Teardown};

struct Config {
    dsn: String,
}

struct Pool {
    dsn: String,
}

impl Teardown for Pool {
    fn teardown(&self) -> Result<(), RecipeError> {
        println!("closing pool for {}", self.dsn);
        Ok(())
    }
}

struct AuditLog {
    pool: Arc<Pool>,
}

impl AuditLog {
    fn record(&self, line: &str) {
        println!("[audit {}] {}", self.pool.dsn, line);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut bindings = Bindings::new();
    bindings.instance(Config {
        dsn: "postgres://localhost/app".into(),
    });
    bindings.managed::<Pool, _>(
        vec![key::<Config>()],
        Lifetime::PerContainer,
        Some(Dispose::Always),
        |d| {
            let config = d.arg::<Config>(0)?;
            Ok(Pool {
                dsn: config.dsn.clone(),
            })
        },
    );
    bindings.bind::<AuditLog, _>(vec![key::<Pool>()], |d| {
        Ok(AuditLog {
            pool: d.arg::<Pool>(0)?,
        })
    });

    let injector = Injector::new(bindings)?;
    let audit = injector.resolve::<AuditLog>()?;
    audit.record("application started");

    // Request scope: overrides nothing, borrows the application's pool.
    let request = injector.nested(Bindings::new())?;
    let per_request = request.resolve::<AuditLog>()?;
    per_request.record("request handled");
    request.dispose()?;

    injector.dispose()?;
    Ok(())
}
