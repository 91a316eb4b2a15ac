use std::{
    io::{self, BufRead},
    sync::Arc,
};

use anyhow::{Context, Result};
use gltf_url_loader::{
    output::logs, Collaborators, GltfSourceLoader, HttpFetcher, InMemoryScene, LoadButton,
    LoaderSettings, RuntimePanel, SceneGraph, TextField, TracingSink, UrlGltfComponent,
};
use tracing::metadata::LevelFilter;

fn setup_logging() {
    let filter = std::env::var("GLTF_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> Result<()> {
    setup_logging();

    let settings = LoaderSettings::load().context("load settings")?;
    tracing::info!(
        "Cache {} at {}",
        if settings.use_cache { "enabled" } else { "disabled" },
        settings.cache_root()?.display()
    );

    let scene = Arc::new(InMemoryScene::new());
    let component = UrlGltfComponent::new(
        settings.clone(),
        Collaborators {
            fetcher: Arc::new(HttpFetcher::new()?),
            scene: scene.clone(),
            loader: Arc::new(GltfSourceLoader),
            events: Arc::new(TracingSink),
        },
    )?;

    let field = Arc::new(TextField::new());
    let button = Arc::new(LoadButton::new());
    let ticket = component.start(RuntimePanel::new(field.clone(), button.clone()));

    if let Some(ticket) = ticket {
        // Errors were already logged by the worker.
        if let Ok(model) = ticket.wait() {
            report(&scene, &model.local_path);
        }
        return Ok(());
    }

    if !settings.runtime_loading {
        return Ok(());
    }

    tracing::info!("Enter a glTF URL per line; Ctrl-D to quit");
    for line in io::stdin().lock().lines() {
        let line = line.context("read stdin")?;
        field.set_text(line);
        button.click();
    }

    component.wait_idle();
    if let Some(model) = component.loaded_model() {
        report(&scene, &model.local_path);
    }
    tracing::debug!("{} log lines buffered", logs::snapshot().len());
    Ok(())
}

fn report(scene: &InMemoryScene, path: &std::path::Path) {
    tracing::info!(
        "Scene holds {} node(s); current model at {}",
        scene.node_count(),
        path.display()
    );
}
