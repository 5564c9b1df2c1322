//! Routing of pushed events to view refresh callbacks.

use crate::models::NotificationEvent;
use crate::notices::Notices;
use crate::utils::format::format_currency;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Console views that can be reloaded in response to a pushed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Dashboard,
    Donations,
    Documents,
    Events,
    Expenses,
    Reports,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Donations => "donations",
            Section::Documents => "documents",
            Section::Events => "events",
            Section::Expenses => "expenses",
            Section::Reports => "reports",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

/// Tracks which sections are on screen and which callbacks reload them.
///
/// A callback only runs when its section is visible at dispatch time.
pub struct Dispatcher {
    visible: RwLock<HashSet<Section>>,
    callbacks: RwLock<HashMap<Section, Vec<RefreshCallback>>>,
    notices: Notices,
}

impl Dispatcher {
    pub fn new(notices: Notices, visible: impl IntoIterator<Item = Section>) -> Self {
        Self {
            visible: RwLock::new(visible.into_iter().collect()),
            callbacks: RwLock::new(HashMap::new()),
            notices,
        }
    }

    pub fn show(&self, section: Section) {
        if let Ok(mut visible) = self.visible.write() {
            visible.insert(section);
        }
    }

    pub fn hide(&self, section: Section) {
        if let Ok(mut visible) = self.visible.write() {
            visible.remove(&section);
        }
    }

    /// Make `section` the only visible one.
    pub fn navigate_to(&self, section: Section) {
        if let Ok(mut visible) = self.visible.write() {
            visible.clear();
            visible.insert(section);
        }
    }

    pub fn is_visible(&self, section: Section) -> bool {
        self.visible
            .read()
            .map(|visible| visible.contains(&section))
            .unwrap_or(false)
    }

    pub fn on_refresh<F>(&self, section: Section, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks
                .entry(section)
                .or_default()
                .push(Arc::new(callback));
        }
    }

    /// Handle one raw text frame. Malformed payloads are logged and dropped.
    pub fn handle_text(&self, payload: &str) -> Vec<Section> {
        match NotificationEvent::parse(payload) {
            Ok(event) => self.dispatch(&event),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed notification");
                Vec::new()
            }
        }
    }

    /// Apply an event and return the sections that were refreshed.
    pub fn dispatch(&self, event: &NotificationEvent) -> Vec<Section> {
        tracing::debug!(kind = event.kind(), "Notification received");

        let targets: &[Section] = match event {
            NotificationEvent::DonationCreated {
                amount,
                donation_type,
                ..
            } => {
                let message = match donation_type {
                    Some(kind) => format!("New donation: {} ({})", format_currency(*amount), kind),
                    None => format!("New donation: {}", format_currency(*amount)),
                };
                self.notices.info(message);
                &[Section::Dashboard, Section::Donations]
            }
            NotificationEvent::EventCreated { name, .. } => {
                self.notices.info(format!("New event: {}", name));
                &[Section::Events]
            }
            NotificationEvent::Welcome { message } | NotificationEvent::Echo { message } => {
                tracing::debug!(kind = event.kind(), message = ?message, "Server message");
                &[]
            }
            NotificationEvent::Unknown => &[],
        };

        targets
            .iter()
            .copied()
            .filter(|section| self.is_visible(*section))
            .filter(|section| self.refresh(*section))
            .collect()
    }

    fn refresh(&self, section: Section) -> bool {
        // Run callbacks outside the lock so they may register more.
        let callbacks: Vec<RefreshCallback> = self
            .callbacks
            .read()
            .ok()
            .and_then(|callbacks| callbacks.get(&section).cloned())
            .unwrap_or_default();

        if callbacks.is_empty() {
            return false;
        }

        tracing::debug!(section = %section, "Refreshing section");
        for callback in &callbacks {
            callback();
        }
        true
    }
}
