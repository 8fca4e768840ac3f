//! Nested containers: inheritance, overrides, and cross-level resolution.

use std::sync::Arc;

use vessel_rs::{key, Bindings, Injector, Lifetime};

struct Config {
    url: String,
}

struct Repo {
    config: Arc<Config>,
}

struct Service {
    repo: Arc<Repo>,
}

fn config_bindings(url: &str) -> Bindings {
    let url = url.to_owned();
    let mut bindings = Bindings::new();
    bindings.bind::<Config, _>(Vec::new(), move |_| Ok(Config { url: url.clone() }));
    bindings
}

#[test]
fn child_resolves_inherited_binding() {
    let root = Injector::new(config_bindings("memory://root")).unwrap();
    let child = root.nested(Bindings::new()).unwrap();
    let config = child.resolve::<Config>().unwrap();
    assert_eq!(config.url, "memory://root");
}

#[test]
fn dependencies_resolve_across_levels() {
    let root = Injector::new(config_bindings("memory://root")).unwrap();

    let mut mid = Bindings::new();
    mid.bind::<Repo, _>(vec![key::<Config>()], |d| {
        Ok(Repo {
            config: d.arg::<Config>(0)?,
        })
    });
    let mid = root.nested(mid).unwrap();

    let mut leaf = Bindings::new();
    leaf.bind::<Service, _>(vec![key::<Repo>()], |d| {
        Ok(Service {
            repo: d.arg::<Repo>(0)?,
        })
    });
    let leaf = mid.nested(leaf).unwrap();

    let service = leaf.resolve::<Service>().unwrap();
    assert_eq!(service.repo.config.url, "memory://root");
}

#[test]
fn override_fully_replaces_the_parent_binding() {
    let root = Injector::new(config_bindings("memory://root")).unwrap();
    let child = root.nested(config_bindings("memory://child")).unwrap();

    assert_eq!(child.resolve::<Config>().unwrap().url, "memory://child");
    assert_eq!(root.resolve::<Config>().unwrap().url, "memory://root");
}

#[test]
fn per_container_binding_shares_the_parent_instance() {
    let mut bindings = Bindings::new();
    bindings.singleton::<Config, _>(Vec::new(), |_| {
        Ok(Config {
            url: "memory://root".into(),
        })
    });
    let root = Injector::new(bindings).unwrap();
    let child = root.nested(Bindings::new()).unwrap();

    // First touch from the child still creates and caches in the owner.
    let from_child = child.resolve::<Config>().unwrap();
    let from_root = root.resolve::<Config>().unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_root));
}

#[test]
fn overriding_child_gets_its_own_singleton() {
    let mut root_bindings = Bindings::new();
    root_bindings.singleton::<Config, _>(Vec::new(), |_| {
        Ok(Config {
            url: "memory://root".into(),
        })
    });
    let root = Injector::new(root_bindings).unwrap();

    let mut child_bindings = Bindings::new();
    child_bindings.bind_full::<Config, _>(Vec::new(), Lifetime::PerContainer, None, |_| {
        Ok(Config {
            url: "memory://child".into(),
        })
    });
    let child = root.nested(child_bindings).unwrap();

    let from_root = root.resolve::<Config>().unwrap();
    let from_child = child.resolve::<Config>().unwrap();
    assert!(!Arc::ptr_eq(&from_root, &from_child));
    assert_eq!(from_root.url, "memory://root");
    assert_eq!(from_child.url, "memory://child");
}

#[test]
fn siblings_do_not_see_each_others_overrides() {
    let root = Injector::new(config_bindings("memory://root")).unwrap();
    let first = root.nested(config_bindings("memory://first")).unwrap();
    let second = root.nested(Bindings::new()).unwrap();

    assert_eq!(first.resolve::<Config>().unwrap().url, "memory://first");
    assert_eq!(second.resolve::<Config>().unwrap().url, "memory://root");
}

#[test]
fn child_missing_dependency_fails_at_construction() {
    let root = Injector::new(Bindings::new()).unwrap();

    let mut child = Bindings::new();
    child.bind::<Repo, _>(vec![key::<Config>()], |d| {
        Ok(Repo {
            config: d.arg::<Config>(0)?,
        })
    });
    assert!(root.nested(child).is_err());
}
