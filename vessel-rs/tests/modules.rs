//! Module installation: one subsystem's bindings registered as a group.

use std::sync::Arc;

use vessel_rs::{key, Bindings, Injector, Module};

struct Config {
    url: String,
}

struct Repo {
    config: Arc<Config>,
}

struct StorageModule {
    url: &'static str,
}

impl Module for StorageModule {
    fn register_into(&mut self, bindings: &mut Bindings) {
        let url = self.url.to_owned();
        bindings.bind::<Config, _>(Vec::new(), move |_| Ok(Config { url: url.clone() }));
        bindings.bind::<Repo, _>(vec![key::<Config>()], |d| {
            Ok(Repo {
                config: d.arg::<Config>(0)?,
            })
        });
    }
}

#[test]
fn module_registers_its_bindings() {
    let mut module = StorageModule {
        url: "memory://module",
    };
    let mut bindings = Bindings::new();
    bindings.install(&mut module);

    let injector = Injector::new(bindings).unwrap();
    let repo = injector.resolve::<Repo>().unwrap();
    assert_eq!(repo.config.url, "memory://module");
}
