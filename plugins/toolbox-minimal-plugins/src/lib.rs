//! toolbox-minimal-plugins - the sub-plugins the toolbox ships
//!
//! Each module holds one sub-plugin: its settings type, its default data
//! and its [`MinimalPlugin`](toolbox_plugin_api::MinimalPlugin) impl.
//! [`registry`] lists them all for the lifecycle manager.

pub mod cloudinary;
pub mod copy_wiki_link;
pub mod gyazo;
pub mod note_refactor;
pub mod random_generator;
pub mod shared;

use std::sync::{Arc, LazyLock};

use toolbox_core::{Registry, RegistryEntry};

pub use cloudinary::Cloudinary;
pub use copy_wiki_link::CopyWikiLink;
pub use gyazo::Gyazo;
pub use note_refactor::NoteRefactor;
pub use random_generator::RandomGenerator;

static REGISTRY: LazyLock<Arc<Registry>> = LazyLock::new(|| {
    Arc::new(Registry::new([
        RegistryEntry::new(
            copy_wiki_link::ID,
            "Wiki link getter",
            "Copy wiki link",
            || Box::new(CopyWikiLink),
        ),
        RegistryEntry::new(
            note_refactor::ID,
            "Note refactor",
            "Replace current selection with wiki link",
            || Box::new(NoteRefactor::default()),
        )
        .with_default_data(note_refactor::default_data()),
        RegistryEntry::new(
            cloudinary::ID,
            "Cloudinary",
            "Upload images to Cloudinary instead of storing them locally in your vault",
            || Box::new(Cloudinary::default()),
        )
        .with_default_data(cloudinary::default_data()),
        RegistryEntry::new(
            gyazo::ID,
            "Gyazo",
            "Upload images to Gyazo instead of storing them locally in your vault",
            || Box::new(Gyazo::default()),
        )
        .with_default_data(gyazo::default_data()),
        RegistryEntry::new(
            random_generator::ID,
            "Random Generator",
            "Generate random strings",
            || Box::new(RandomGenerator::default()),
        )
        .with_default_data(random_generator::default_data()),
    ]))
});

/// Every built-in sub-plugin
pub fn registry() -> Arc<Registry> {
    Arc::clone(&REGISTRY)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    use serde_json::Value;
    use toolbox_plugin_api::mock::MockApp;
    use toolbox_plugin_api::{
        Command, PluginContext, SaveRequestBus, SettingsSlice, SharedSettings, SubPluginEntry,
        Subscription, ToolboxSettings, read_settings,
    };

    /// A context wired to an in-memory store that counts save requests
    pub struct Fixture {
        pub ctx: PluginContext,
        pub app: Arc<MockApp>,
        pub store: SharedSettings,
        saves: Arc<AtomicUsize>,
        _subscription: Subscription,
    }

    impl Fixture {
        pub fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        /// Current data of the fixture's sub-plugin
        pub fn data(&self) -> Option<Value> {
            read_settings(&self.store).data(self.ctx.id()).cloned()
        }

        pub fn command(&self, id: &str) -> &Command {
            self.ctx
                .list_commands()
                .iter()
                .find(|command| command.id == id)
                .unwrap_or_else(|| panic!("command {id} not registered"))
        }
    }

    /// `Value::Null` leaves the entry without data
    pub fn fixture(id: &str, data: Value, app: MockApp) -> Fixture {
        let entry = SubPluginEntry {
            on: true,
            data: (!data.is_null()).then_some(data),
        };
        let store: SharedSettings = Arc::new(RwLock::new(ToolboxSettings {
            minimal_plugins: BTreeMap::from([(id.to_string(), entry)]),
        }));

        let bus = SaveRequestBus::new();
        let saves = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&saves);
        let subscription = bus.on(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let app = Arc::new(app);
        let ctx = PluginContext::new(id, app.clone(), SettingsSlice::new(&store, id), bus);
        Fixture {
            ctx,
            app,
            store,
            saves,
            _subscription: subscription,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_every_sub_plugin() {
        assert_eq!(
            registry().ids(),
            vec!["copy-wiki-link", "note-refactor", "cloudinary", "gyazo", "random"]
        );
    }

    #[test]
    fn test_only_wiki_link_getter_has_no_default_data() {
        let registry = registry();
        for entry in registry.iter() {
            assert_eq!(
                entry.default_data().is_none(),
                entry.id == copy_wiki_link::ID,
                "{}",
                entry.id
            );
        }
    }

    #[test]
    fn test_constructors_build_fresh_instances() {
        let registry = registry();
        for entry in registry.iter() {
            let _plugin = entry.construct();
        }
    }
}
