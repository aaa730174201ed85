use std::fmt::Write as _;
use uuid::Uuid;

use super::{ApiClient, ClientError, Session, TodoPatch};
use crate::model::{Todo, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    /// No usable session. Nothing else happens until the user logs in.
    RedirectToLogin,
}

/// Draft for the "add todo" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
}

/// The todo dashboard. Every mutation is followed by a fresh list from the
/// server; the local list is never patched in place.
pub struct Dashboard {
    api: ApiClient,
    session: Session,
    user: Option<UserProfile>,
    todos: Vec<Todo>,
    pub form: TodoForm,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self {
            api,
            session,
            user: None,
            todos: Vec::new(),
            form: TodoForm::default(),
            last_error: None,
        }
    }

    pub async fn mount(&mut self) -> View {
        if !self.session.is_active() {
            return View::RedirectToLogin;
        }

        self.user = self.session.user().cloned();
        self.refresh().await;
        self.view()
    }

    pub fn view(&self) -> View {
        if self.session.is_active() {
            View::Dashboard
        } else {
            View::RedirectToLogin
        }
    }

    pub async fn refresh(&mut self) {
        match self.api.list_todos(&mut self.session).await {
            Ok(todos) => {
                self.todos = todos;
                self.last_error = None;
            }
            Err(e) => self.record_failure("fetching todos", e),
        }
    }

    /// Submits the form. A blank title sends nothing.
    pub async fn add(&mut self) {
        if self.form.title.trim().is_empty() {
            return;
        }

        let description = Some(self.form.description.as_str()).filter(|d| !d.trim().is_empty());
        let result = self
            .api
            .create_todo(&mut self.session, &self.form.title, description)
            .await;

        match result {
            Ok(_) => {
                self.form = TodoForm::default();
                self.refresh().await;
            }
            Err(e) => self.record_failure("adding todo", e),
        }
    }

    pub async fn toggle(&mut self, id: Uuid, current_status: bool) {
        let patch = TodoPatch { is_done: Some(!current_status), ..Default::default() };
        match self.api.update_todo(&mut self.session, id, &patch).await {
            Ok(_) => self.refresh().await,
            Err(e) => self.record_failure("updating todo", e),
        }
    }

    /// Deletes only when `confirm` agrees. Returns whether a request was sent.
    pub async fn delete(&mut self, id: Uuid, confirm: impl FnOnce() -> bool) -> bool {
        if !confirm() {
            return false;
        }

        match self.api.delete_todo(&mut self.session, id).await {
            Ok(()) => self.refresh().await,
            Err(e) => self.record_failure("deleting todo", e),
        }
        true
    }

    /// Tells the server, then drops the local session whatever it said.
    pub async fn logout(&mut self) -> View {
        if let Err(e) = self.api.logout(&self.session).await {
            tracing::warn!(error = %e, "Logout error");
        }

        self.session.clear();
        self.user = None;
        self.todos.clear();
        View::RedirectToLogin
    }

    fn record_failure(&mut self, action: &str, err: ClientError) {
        tracing::error!(error = %err, "Error {}", action);

        if !self.session.is_active() {
            self.user = None;
            self.todos.clear();
        }
        self.last_error = Some(format!("Error {action}: {err}"));
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        match &self.user {
            Some(user) => {
                let _ = writeln!(out, "Todo App  ·  Welcome, {}", user.name);
            }
            None => out.push_str("Todo App\n"),
        }
        let _ = writeln!(out, "Your Todos ({})", self.todos.len());

        if self.todos.is_empty() {
            out.push_str("  No todos yet. Create your first one!\n");
        }
        for (n, todo) in self.todos.iter().enumerate() {
            let (mark, status) = if todo.is_done { ("x", "Done") } else { (" ", "Pending") };
            let _ = writeln!(out, "  {:>2}. [{mark}] {}  ({status})", n + 1, todo.title);
            if let Some(description) = todo.description.as_deref().filter(|d| !d.is_empty()) {
                let _ = writeln!(out, "        {description}");
            }
        }

        if let Some(err) = &self.last_error {
            let _ = writeln!(out, "! {err}");
        }
        out
    }
}
