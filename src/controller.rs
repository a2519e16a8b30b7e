//! Event driven application controller.
//!
//! Each user interaction becomes an [`Event`]. Events are drained from a
//! queue in order, each one updating the [`SessionState`] and producing a
//! fresh [`Rendered`] view of the whole page. Auth and retrieval stay in
//! their own modules; this layer only sequences them.

use std::collections::VecDeque;
use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use crate::auth::{authenticate, AuthResult, Credentials};
use crate::config::{AppConfig, MIMIC_III_DATASET};
use crate::pages::{render_guarded, Block, PatientDataPage};
use crate::session::{SessionState, View};

pub const LOGIN_PROMPT: &str = "Please login to view all projects and functionality";

#[derive(Debug, Clone)]
pub enum Event {
    LoginSubmitted(Credentials),
    LogoutRequested,
    ViewSelected(View),
    /// Re-render without changing state.
    Refresh,
}

/// Login area and view selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sidebar {
    pub logged_in: bool,
    pub role: Option<String>,
    /// Error from the login attempt handled in this turn, shown verbatim.
    pub login_error: Option<String>,
    pub selected_view: View,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sidebar: Sidebar,
    pub body: Vec<Block>,
}

pub struct Controller {
    config: Arc<AppConfig>,
    client: Client,
    preview_rows: usize,
}

impl Controller {
    pub fn new(config: Arc<AppConfig>, client: Client, preview_rows: usize) -> Self {
        Self {
            config,
            client,
            preview_rows,
        }
    }

    /// Processes `events` in order against `session` and returns the view
    /// rendered after the last one. A successful login queues a refresh so the
    /// whole page is rendered again with the new login state.
    pub async fn dispatch(
        &self,
        session: &mut SessionState,
        events: impl IntoIterator<Item = Event>,
    ) -> Rendered {
        let mut queue: VecDeque<Event> = events.into_iter().collect();
        let mut rendered = None;

        while let Some(event) = queue.pop_front() {
            let mut login_error = None;

            match event {
                Event::LoginSubmitted(credentials) => {
                    if session.logged_in {
                        info!("Ignoring login submission for an active login");
                    } else {
                        let endpoint = self.config.user_auth_api.as_str();
                        match authenticate(&self.client, &credentials, endpoint).await {
                            AuthResult::Role(role) => {
                                session.log_in(role);
                                queue.push_back(Event::Refresh);
                                continue;
                            }
                            AuthResult::Error(message) => login_error = Some(message),
                        }
                    }
                }
                Event::LogoutRequested => {
                    info!("Session logged out");
                    session.log_out();
                }
                Event::ViewSelected(view) => session.selected_view = view,
                Event::Refresh => {}
            }

            rendered = Some(self.render(session, login_error).await);
        }

        match rendered {
            Some(rendered) => rendered,
            None => self.render(session, None).await,
        }
    }

    async fn render(&self, session: &mut SessionState, login_error: Option<String>) -> Rendered {
        let body = match session.selected_view {
            View::Welcome => vec![Block::Text("Welcome Page".to_string())],
            View::Chatbot => vec![Block::Text("Chatbot".to_string())],
            View::PatientData => self.render_patient_data(session).await,
        };

        Rendered {
            sidebar: Sidebar {
                logged_in: session.logged_in,
                role: session.role.clone(),
                login_error,
                selected_view: session.selected_view,
            },
            body,
        }
    }

    async fn render_patient_data(&self, session: &mut SessionState) -> Vec<Block> {
        let logged_in = session.logged_in;

        if !session.loaded_pages.contains_key(&View::PatientData) {
            let Some(path) = self.config.dataset_path(MIMIC_III_DATASET) else {
                warn!("No dataset path configured for '{}'", MIMIC_III_DATASET);
                return vec![Block::Error(format!(
                    "No dataset path configured for {}",
                    MIMIC_III_DATASET
                ))];
            };
            let page = PatientDataPage::new(
                path,
                self.config.storage_bucket.clone(),
                self.preview_rows,
            );
            session.loaded_pages.insert(View::PatientData, Box::new(page));
        }

        match session.loaded_pages.get_mut(&View::PatientData) {
            Some(page) => {
                page.set_login_status(logged_in);
                render_guarded(page.as_mut()).await
            }
            None => Vec::new(),
        }
    }
}
