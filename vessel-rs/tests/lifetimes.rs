//! Lifetime semantics through the typed facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vessel_rs::{key, Bindings, Injector};

struct Config {
    url: String,
}

struct Repo {
    config: Arc<Config>,
}

struct Service {
    repo: Arc<Repo>,
}

fn wired() -> Bindings {
    let mut bindings = Bindings::new();
    bindings.bind::<Config, _>(Vec::new(), |_| {
        Ok(Config {
            url: "memory://test".into(),
        })
    });
    bindings.bind::<Repo, _>(vec![key::<Config>()], |d| {
        Ok(Repo {
            config: d.arg::<Config>(0)?,
        })
    });
    bindings.bind::<Service, _>(vec![key::<Repo>()], |d| {
        Ok(Service {
            repo: d.arg::<Repo>(0)?,
        })
    });
    bindings
}

#[test]
fn per_call_yields_distinct_instances() {
    let injector = Injector::new(wired()).unwrap();
    let first = injector.resolve::<Config>().unwrap();
    let second = injector.resolve::<Config>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn per_container_yields_the_same_instance() {
    let mut bindings = Bindings::new();
    bindings.singleton::<Config, _>(Vec::new(), |_| {
        Ok(Config {
            url: "memory://shared".into(),
        })
    });

    let injector = Injector::new(bindings).unwrap();
    let first = injector.resolve::<Config>().unwrap();
    let second = injector.resolve::<Config>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn dependencies_inject_across_levels() {
    let injector = Injector::new(wired()).unwrap();
    let service = injector.resolve::<Service>().unwrap();
    assert_eq!(service.repo.config.url, "memory://test");
}

#[test]
fn per_call_dependency_is_fresh_each_resolution() {
    let injector = Injector::new(wired()).unwrap();
    let first = injector.resolve::<Service>().unwrap();
    let second = injector.resolve::<Service>().unwrap();
    assert!(!Arc::ptr_eq(&first.repo, &second.repo));
    assert!(!Arc::ptr_eq(&first.repo.config, &second.repo.config));
}

#[test]
fn per_container_dependency_is_shared_between_resolutions() {
    let mut bindings = Bindings::new();
    bindings.singleton::<Config, _>(Vec::new(), |_| {
        Ok(Config {
            url: "memory://shared".into(),
        })
    });
    bindings.bind::<Repo, _>(vec![key::<Config>()], |d| {
        Ok(Repo {
            config: d.arg::<Config>(0)?,
        })
    });

    let injector = Injector::new(bindings).unwrap();
    let first = injector.resolve::<Repo>().unwrap();
    let second = injector.resolve::<Repo>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.config, &second.config));
}

#[test]
fn typed_factory_behaves_like_resolution() {
    let injector = Injector::new(wired()).unwrap();
    let factory = injector.factory::<Config>().unwrap();
    let first = factory.call().unwrap();
    let second = factory.call().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn first_creation_races_to_one_instance() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut bindings = Bindings::new();
    let counter = Arc::clone(&calls);
    bindings.singleton::<Config, _>(Vec::new(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Config {
            url: "memory://raced".into(),
        })
    });

    let injector = Injector::new(bindings).unwrap();
    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for _ in 0..8 {
            handles.push(scope.spawn(|| injector.resolve::<Config>().unwrap()));
        }
        let first = injector.resolve::<Config>().unwrap();
        for handle in handles {
            let resolved = handle.join().unwrap();
            assert!(Arc::ptr_eq(&first, &resolved));
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
