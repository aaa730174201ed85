use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{ClientError, Credential, Session};
use crate::error::FieldErrors;
use crate::model::{Todo, UserProfile};

/// Fields to send with an update. `None` fields are left out of the body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

#[derive(Serialize)]
struct NewTodoBody<'a> {
    title: &'a str,
    descriptions: Option<&'a str>,
}

#[derive(Deserialize)]
struct TodoListBody {
    todos: Vec<Todo>,
}

#[derive(Deserialize)]
struct TodoBody {
    todo: Todo,
}

#[derive(Deserialize)]
struct UserBody {
    user: UserProfile,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: FieldErrors,
}

/// HTTP access to the todo API. Calls that need a login take the
/// [`Session`] explicitly and clear it when the server answers 401.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let request = self.http.post(self.endpoint("register")?).json(&serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
        }));
        let body: UserBody = decode(request.send().await?).await?;
        Ok(body.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError> {
        let request = self.http.post(self.endpoint("login")?).json(&serde_json::json!({
            "email": email,
            "password": password,
        }));
        decode(request.send().await?).await
    }

    /// Ends the session on the server. Leaves the local session untouched.
    pub async fn logout(&self, session: &Session) -> Result<(), ClientError> {
        let token = session.token().ok_or(ClientError::NoSession)?;
        let response = self
            .http
            .post(self.endpoint("logout")?)
            .bearer_auth(token)
            .send()
            .await?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }

    pub async fn list_todos(&self, session: &mut Session) -> Result<Vec<Todo>, ClientError> {
        let request = self.http.get(self.endpoint("todos")?);
        let body: TodoListBody = self.send(session, request).await?;
        Ok(body.todos)
    }

    pub async fn create_todo(
        &self,
        session: &mut Session,
        title: &str,
        description: Option<&str>,
    ) -> Result<Todo, ClientError> {
        let request = self
            .http
            .post(self.endpoint("todos")?)
            .json(&NewTodoBody { title, descriptions: description });
        let body: TodoBody = self.send(session, request).await?;
        Ok(body.todo)
    }

    pub async fn update_todo(
        &self,
        session: &mut Session,
        id: Uuid,
        patch: &TodoPatch,
    ) -> Result<Todo, ClientError> {
        let request = self
            .http
            .put(self.endpoint(&format!("todos/{id}"))?)
            .json(patch);
        let body: TodoBody = self.send(session, request).await?;
        Ok(body.todo)
    }

    pub async fn delete_todo(&self, session: &mut Session, id: Uuid) -> Result<(), ClientError> {
        let request = self.http.delete(self.endpoint(&format!("todos/{id}"))?);
        let _: serde_json::Value = self.send(session, request).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        session: &mut Session,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let token = session.token().ok_or(ClientError::NoSession)?;
        let response = request.bearer_auth(token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            session.clear();
            return Err(ClientError::Unauthorized);
        }
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body: ErrorBody = response.json().await.unwrap_or(ErrorBody {
        message: status.canonical_reason().unwrap_or("error").to_string(),
        errors: FieldErrors::new(),
    });

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound(body.message),
        StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation {
            message: body.message,
            errors: body.errors,
        },
        _ => ClientError::Server {
            status: status.as_u16(),
            message: body.message,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_is_kept_when_joining() {
        let client = ApiClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(client.endpoint("todos").unwrap().as_str(), "http://localhost:8000/api/todos");

        let client = ApiClient::new("http://localhost:8000").unwrap();
        assert_eq!(client.endpoint("todos").unwrap().as_str(), "http://localhost:8000/todos");
    }

    #[test]
    fn patch_sends_only_present_fields() {
        let patch = TodoPatch { is_done: Some(true), ..Default::default() };
        assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({ "is_done": true }));

        let patch = TodoPatch { descriptions: Some(None), ..Default::default() };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "descriptions": null })
        );
    }

    #[tokio::test]
    async fn calls_without_a_session_fail_locally() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut session = Session::absent();
        assert!(matches!(
            client.list_todos(&mut session).await,
            Err(ClientError::NoSession)
        ));
    }
}
