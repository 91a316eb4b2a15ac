use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Source of the URL a user typed.
pub trait UrlField: Send + Sync {
    fn text(&self) -> String;
}

#[derive(Debug, Default)]
pub struct TextField {
    text: RwLock<String>,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }
}

impl UrlField for TextField {
    fn text(&self) -> String {
        self.text.read().clone()
    }
}

type ClickListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct LoadButton {
    listeners: Mutex<Vec<ClickListener>>,
}

impl LoadButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_click<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Invokes every listener and returns how many ran.
    pub fn click(&self) -> usize {
        // Listeners run outside the lock so they may register further listeners.
        let listeners: Vec<ClickListener> = self.listeners.lock().clone();
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl std::fmt::Debug for LoadButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadButton")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// UI references used in runtime loading mode. Either may be unassigned.
#[derive(Clone, Default)]
pub struct RuntimePanel {
    pub url_field: Option<Arc<dyn UrlField>>,
    pub load_button: Option<Arc<LoadButton>>,
}

impl RuntimePanel {
    pub fn new(url_field: Arc<dyn UrlField>, load_button: Arc<LoadButton>) -> Self {
        Self {
            url_field: Some(url_field),
            load_button: Some(load_button),
        }
    }

    /// Names the first missing reference, if any.
    pub fn missing_reference(&self) -> Option<&'static str> {
        match (&self.url_field, &self.load_button) {
            (None, None) => Some("URL field and load button not assigned"),
            (None, Some(_)) => Some("URL field not assigned"),
            (Some(_), None) => Some("load button not assigned"),
            (Some(_), Some(_)) => None,
        }
    }
}
