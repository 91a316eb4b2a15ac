use std::sync::{Arc, Weak};

use anyhow::Result;

use crate::core::error::LoadError;
use crate::core::events::{EventSink, LoadEvent};
use crate::core::sequencer::{Collaborators, LoadRequest, LoadSequencer, LoadedModel};
use crate::core::settings::LoaderSettings;
use crate::models::{LoadService, LoadTicket, ModelCache};
use crate::ui::RuntimePanel;

/// Fetches a glTF model by URL and keeps the most recent one attached to the scene.
pub struct UrlGltfComponent {
    settings: LoaderSettings,
    sequencer: Arc<LoadSequencer>,
    service: LoadService,
    events: Arc<dyn EventSink>,
}

impl UrlGltfComponent {
    pub fn new(settings: LoaderSettings, collaborators: Collaborators) -> Result<Arc<Self>> {
        let cache = ModelCache::new(settings.cache_root()?, settings.cache_key);
        let events = collaborators.events.clone();
        let sequencer = Arc::new(LoadSequencer::new(cache, collaborators));
        let service = LoadService::new(sequencer.clone(), events.clone())?;
        Ok(Arc::new(Self {
            settings,
            sequencer,
            service,
            events,
        }))
    }

    pub fn loaded_model(&self) -> Option<LoadedModel> {
        self.sequencer.loaded_model()
    }

    /// Wires the runtime panel, or loads the configured URL when runtime
    /// loading is off. Only the automatic load yields a ticket.
    pub fn start(self: &Arc<Self>, panel: RuntimePanel) -> Option<LoadTicket> {
        if self.settings.runtime_loading {
            if let Err(error) = self.setup_runtime_ui(panel) {
                tracing::debug!("Runtime UI setup failed: {error}");
            }
            return None;
        }

        match self.settings.source_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => self.load_model_from_url(url),
            _ => {
                tracing::warn!("No source URL configured; nothing to load");
                None
            }
        }
    }

    fn setup_runtime_ui(self: &Arc<Self>, panel: RuntimePanel) -> Result<(), LoadError> {
        let (Some(field), Some(button)) = (panel.url_field.clone(), panel.load_button.clone())
        else {
            let reason = panel
                .missing_reference()
                .unwrap_or("runtime panel incomplete")
                .to_string();
            self.events.emit(&LoadEvent::UiUnavailable {
                reason: reason.clone(),
            });
            return Err(LoadError::Configuration(reason));
        };

        let component: Weak<Self> = Arc::downgrade(self);
        button.on_click(move || {
            if let Some(component) = component.upgrade() {
                // Completion is observed through events.
                let _ = component.trigger_from_ui(&field.text());
            }
        });
        Ok(())
    }

    /// Blocks until all queued loads have finished.
    pub fn wait_idle(&self) {
        self.service.wait_idle();
    }

    /// Rejects blank input with a warning; otherwise starts a load.
    pub fn trigger_from_ui(&self, url_text: &str) -> Option<LoadTicket> {
        let url = url_text.trim();
        if url.is_empty() {
            self.events.emit(&LoadEvent::EmptyUrlSubmitted);
            return None;
        }
        self.load_model_from_url(url)
    }

    /// Queues a load. Failures are reported through events and the ticket,
    /// never returned to the trigger.
    pub fn load_model_from_url(&self, url: &str) -> Option<LoadTicket> {
        let request = LoadRequest::new(url, self.settings.use_cache);
        match self.service.queue(request) {
            Ok(ticket) => Some(ticket),
            Err(error) => {
                tracing::error!("Failed to download and load model: {error}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use crossbeam_channel::Receiver;
    use reqwest::Url;

    use super::*;
    use crate::core::events::ChannelSink;
    use crate::models::Fetcher;
    use crate::scene::{GltfSourceLoader, InMemoryScene, SceneGraph};
    use crate::ui::{LoadButton, TextField};

    const DUCK_URL: &str = "https://example.com/assets/duck.glb";

    #[derive(Default)]
    struct StubFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Fetcher for StubFetcher {
        fn fetch(
            &self,
            _url: &Url,
            sink: &mut dyn Write,
            _progress: &mut dyn FnMut(u64, Option<u64>),
        ) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("HTTP status 500 Internal Server Error"));
            }
            sink.write_all(b"glTF")?;
            Ok(4)
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        fetcher: Arc<StubFetcher>,
        scene: Arc<InMemoryScene>,
        events: Receiver<LoadEvent>,
        component: Arc<UrlGltfComponent>,
    }

    fn fixture(configure: impl FnOnce(&mut LoaderSettings), fail: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = LoaderSettings {
            cache_dir: Some(dir.path().to_path_buf()),
            ..LoaderSettings::default()
        };
        configure(&mut settings);

        let fetcher = Arc::new(StubFetcher {
            fail,
            ..StubFetcher::default()
        });
        let scene = Arc::new(InMemoryScene::new());
        let (sender, events) = crossbeam_channel::unbounded();
        let component = UrlGltfComponent::new(
            settings,
            Collaborators {
                fetcher: fetcher.clone(),
                scene: scene.clone(),
                loader: Arc::new(GltfSourceLoader),
                events: Arc::new(ChannelSink::new(sender)),
            },
        )
        .unwrap();
        Fixture {
            dir,
            fetcher,
            scene,
            events,
            component,
        }
    }

    #[test]
    fn start_loads_configured_url() {
        let fx = fixture(|s| s.source_url = Some(DUCK_URL.into()), false);
        let model = fx.component.start(RuntimePanel::default()).unwrap().wait().unwrap();

        assert_eq!(model.local_path, fx.dir.path().join("duck.glb"));
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fx.scene.node_count(), 1);
        assert_eq!(fx.component.loaded_model(), Some(model));
    }

    #[test]
    fn start_without_url_does_nothing() {
        let fx = fixture(|_| {}, false);
        assert!(fx.component.start(RuntimePanel::default()).is_none());
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duck_scenario_downloads_once_then_hits_cache() {
        let fx = fixture(|_| {}, false);

        let first = fx.component.load_model_from_url(DUCK_URL).unwrap().wait().unwrap();
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read(fx.dir.path().join("duck.glb")).unwrap(), b"glTF");

        let second = fx.component.load_model_from_url(DUCK_URL).unwrap().wait().unwrap();
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.local_path, first.local_path);
        assert_ne!(second.node, first.node);
        assert_eq!(fx.scene.node_count(), 1);
    }

    #[test]
    fn blank_input_is_rejected_with_warning() {
        let fx = fixture(|_| {}, false);
        assert!(fx.component.trigger_from_ui("").is_none());
        assert!(fx.component.trigger_from_ui("   ").is_none());

        let warnings: Vec<_> = fx.events.try_iter().collect();
        assert_eq!(
            warnings,
            vec![LoadEvent::EmptyUrlSubmitted, LoadEvent::EmptyUrlSubmitted]
        );
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.scene.node_count(), 0);
    }

    #[test]
    fn ui_input_is_trimmed_before_loading() {
        let fx = fixture(|_| {}, false);
        let model = fx
            .component
            .trigger_from_ui(&format!("  {DUCK_URL}\n"))
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(model.source_url, DUCK_URL);
    }

    #[test]
    fn runtime_mode_wires_button_to_field() {
        let fx = fixture(|s| s.runtime_loading = true, false);
        let field = Arc::new(TextField::new());
        let button = Arc::new(LoadButton::new());

        assert!(fx
            .component
            .start(RuntimePanel::new(field.clone(), button.clone()))
            .is_none());
        assert_eq!(button.listener_count(), 1);

        field.set_text(DUCK_URL);
        button.click();

        let attached = std::iter::from_fn(|| fx.events.recv_timeout(Duration::from_secs(10)).ok())
            .find(|event| matches!(event, LoadEvent::ModelAttached { .. }));
        assert!(attached.is_some());
        assert_eq!(fx.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runtime_mode_without_button_reports_configuration_error() {
        let fx = fixture(|s| s.runtime_loading = true, false);
        let panel = RuntimePanel {
            url_field: Some(Arc::new(TextField::new())),
            load_button: None,
        };

        assert!(fx.component.start(panel).is_none());
        assert_eq!(
            fx.events.try_recv().unwrap(),
            LoadEvent::UiUnavailable {
                reason: "load button not assigned".into()
            }
        );
    }

    #[test]
    fn transport_failure_reports_error_and_creates_nothing() {
        let fx = fixture(|_| {}, true);
        let result = fx.component.load_model_from_url(DUCK_URL).unwrap().wait();

        assert!(matches!(result, Err(LoadError::Transport { .. })));
        assert!(!fx.dir.path().join("duck.glb").exists());
        assert_eq!(fx.scene.node_count(), 0);
        assert!(fx
            .events
            .try_iter()
            .any(|event| matches!(event, LoadEvent::DownloadFailed { .. })));
    }
}
