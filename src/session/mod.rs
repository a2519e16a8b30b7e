//! Per-session state and the registry that owns it.

mod registry;

use std::collections::HashMap;
use std::fmt;

use crate::pages::Page;

pub use registry::{SessionRegistry, SharedSession};

/// Views selectable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Welcome,
    Chatbot,
    PatientData,
}

impl View {
    pub const ALL: [View; 3] = [View::Welcome, View::Chatbot, View::PatientData];

    /// Label shown in the view selector.
    pub fn title(self) -> &'static str {
        match self {
            View::Welcome => "Welcome",
            View::Chatbot => "Chatbot - Spontaneous Intracranial Hypotension SME",
            View::PatientData => crate::pages::patient_data::TITLE,
        }
    }

    /// Stable form value for the view.
    pub fn key(self) -> &'static str {
        match self {
            View::Welcome => "welcome",
            View::Chatbot => "chatbot",
            View::PatientData => "mimic-iii",
        }
    }

    pub fn from_key(key: &str) -> Option<View> {
        View::ALL.into_iter().find(|view| view.key() == key)
    }
}

/// State of one user's session, passed explicitly into every handler.
#[derive(Default)]
pub struct SessionState {
    pub logged_in: bool,
    pub role: Option<String>,
    pub selected_view: View,
    /// Page controllers built so far, at most one per view.
    pub loaded_pages: HashMap<View, Box<dyn Page>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_in(&mut self, role: String) {
        self.logged_in = true;
        self.role = Some(role);
    }

    /// Clears the login but keeps loaded pages and their cached data.
    pub fn log_out(&mut self) {
        self.logged_in = false;
        self.role = None;
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("logged_in", &self.logged_in)
            .field("role", &self.role)
            .field("selected_view", &self.selected_view)
            .field("loaded_pages", &self.loaded_pages.keys().collect::<Vec<_>>())
            .finish()
    }
}
