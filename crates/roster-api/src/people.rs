//! Handlers for `/person` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/person` | Every person; `?active_only=true` hides soft-deleted rows |
//! | `GET`    | `/person/{id}` | 404 if missing or soft-deleted |
//! | `POST`   | `/person/add` | Body: [`PersonInput`]; returns the new id |
//! | `PATCH`  | `/person/save` | Body: [`PersonInput`] with `id`; returns the id |
//! | `DELETE` | `/person/delete/{id}` | Soft delete; `?force=true` removes the row |
//! | `DELETE` | `/person/delete` | Body: `[id, ...]`; `?force=true` as above |
//! | `PUT`    | `/person/active/{id}` | Reactivate |
//! | `PUT`    | `/person/active` | Body: `[id, ...]` |

use std::sync::Arc;

use axum::{Json, extract::State};
use roster_core::{
  operations::{PersonService, Visibility},
  person::{Person, PersonInput},
  store::Store,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
};

type Service<S> = State<Arc<PersonService<S>>>;

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub active_only: bool,
}

/// `GET /person[?active_only=true]`
pub async fn list<S: Store + 'static>(
  State(service): Service<S>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Person>>, ApiError> {
  let visibility = if params.active_only {
    Visibility::ActiveOnly
  } else {
    Visibility::All
  };
  let people = service
    .read_all(visibility)
    .await
    .map_err(ApiError::not_found)?;
  Ok(Json(people))
}

/// `GET /person/{id}`
pub async fn get_one<S: Store + 'static>(
  State(service): Service<S>,
  PathParam(id): PathParam<i64>,
) -> Result<Json<Person>, ApiError> {
  let person = service.read_one(id).await.map_err(ApiError::not_found)?;
  Ok(Json(person))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /person/add`
pub async fn create<S: Store + 'static>(
  State(service): Service<S>,
  JsonBody(input): JsonBody<PersonInput>,
) -> Result<Json<i64>, ApiError> {
  let id = service.create(input).await.map_err(ApiError::bad_request)?;
  Ok(Json(id))
}

/// `PATCH /person/save`
pub async fn update<S: Store + 'static>(
  State(service): Service<S>,
  JsonBody(input): JsonBody<PersonInput>,
) -> Result<Json<i64>, ApiError> {
  let id = service.update(input).await.map_err(ApiError::bad_request)?;
  Ok(Json(id))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  /// Remove the row instead of marking it deleted.
  #[serde(default)]
  pub force: bool,
}

/// `DELETE /person/delete/{id}[?force=true]`
pub async fn delete_one<S: Store + 'static>(
  State(service): Service<S>,
  PathParam(id): PathParam<i64>,
  QueryParams(params): QueryParams<DeleteParams>,
) -> Result<Json<i64>, ApiError> {
  let id = service
    .delete_one(id, params.force)
    .await
    .map_err(ApiError::not_found)?;
  Ok(Json(id))
}

/// `DELETE /person/delete[?force=true]`; body: `[1, 2, 3]`
pub async fn delete_many<S: Store + 'static>(
  State(service): Service<S>,
  QueryParams(params): QueryParams<DeleteParams>,
  JsonBody(ids): JsonBody<Vec<i64>>,
) -> Result<Json<i64>, ApiError> {
  let id = service
    .delete_many(&ids, params.force)
    .await
    .map_err(ApiError::not_found)?;
  Ok(Json(id))
}

// ─── Reactivate ──────────────────────────────────────────────────────────────

/// `PUT /person/active/{id}`
pub async fn reactivate_one<S: Store + 'static>(
  State(service): Service<S>,
  PathParam(id): PathParam<i64>,
) -> Result<Json<i64>, ApiError> {
  let id = service
    .reactivate_one(id)
    .await
    .map_err(ApiError::bad_request)?;
  Ok(Json(id))
}

/// `PUT /person/active`; body: `[1, 2, 3]`
pub async fn reactivate_many<S: Store + 'static>(
  State(service): Service<S>,
  JsonBody(ids): JsonBody<Vec<i64>>,
) -> Result<Json<i64>, ApiError> {
  let id = service
    .reactivate_many(&ids)
    .await
    .map_err(ApiError::bad_request)?;
  Ok(Json(id))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
  };
  use roster_core::{
    entity::Entity,
    operations::PersonService,
    sink::TracingSink,
    specification::{Filter, Specification},
    store::{BulkMutator, PendingId, Repository, Store},
  };
  use roster_store_sqlite::{Error, Session, SqliteStore};
  use serde_json::{Value, json};
  use tower::ServiceExt;

  use crate::person_router;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    person_router(Arc::new(PersonService::new(store, Arc::new(TracingSink))))
  }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string())),
      None => builder.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// Reads go to SQLite; every staged save and bulk write fails as if its
  /// row had vanished underneath.
  struct VanishingStore(SqliteStore);

  struct VanishingSession {
    inner:  Session,
    target: i64,
  }

  fn vanished(id: i64) -> Error { Error::StaleRow { entity: "Person", id } }

  impl BulkMutator for VanishingStore {
    type Error = Error;

    async fn bulk_update<E: Entity>(&self, entities: Vec<E>) -> Result<usize, Error> {
      Err(vanished(entities.first().map_or(0, |e| e.id())))
    }
  }

  impl Store for VanishingStore {
    type Session = VanishingSession;

    async fn session(&self) -> Result<VanishingSession, Error> {
      Ok(VanishingSession { inner: self.0.session().await?, target: 0 })
    }
  }

  impl Repository for VanishingSession {
    type Error = Error;

    async fn get<E: Entity>(&mut self, spec: Specification) -> Result<Option<E>, Error> {
      self.inner.get(spec).await
    }

    async fn get_by_id<E: Entity>(&mut self, id: i64) -> Result<Option<E>, Error> {
      self.inner.get_by_id(id).await
    }

    async fn get_list<E: Entity>(&mut self, spec: Specification) -> Result<Vec<E>, Error> {
      self.inner.get_list(spec).await
    }

    async fn exists<E: Entity>(&mut self) -> Result<bool, Error> { self.inner.exists::<E>().await }

    fn add<E: Entity>(&mut self, entity: E) -> PendingId { self.inner.add(entity) }

    fn update<E: Entity>(&mut self, entity: E) {
      self.target = entity.id();
      self.inner.update(entity);
    }

    fn remove<E: Entity>(&mut self, entity: &E) {
      self.target = entity.id();
      self.inner.remove(entity);
    }

    async fn save(&mut self) -> Result<usize, Error> { Err(vanished(self.target)) }

    async fn execute_delete<E: Entity>(&mut self, filter: Filter) -> Result<usize, Error> {
      self.inner.execute_delete::<E>(filter).await
    }

    async fn begin(&mut self) -> Result<(), Error> { self.inner.begin().await }

    async fn commit(&mut self) -> Result<(), Error> { self.inner.commit().await }

    async fn rollback(&mut self) -> Result<(), Error> { self.inner.rollback().await }

    fn abandon(&mut self) { self.inner.abandon(); }
  }

  async fn add(app: &Router, name: &str) -> i64 {
    let (status, id) = send(app, "POST", "/person/add", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::OK);
    id.as_i64().unwrap()
  }

  #[tokio::test]
  async fn add_then_get_returns_camel_case_person() {
    let app = app().await;
    let (status, id) = send(
      &app,
      "POST",
      "/person/add",
      Some(json!({ "name": "Ana", "email": "ana@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, person) = send(&app, "GET", &format!("/person/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(person["name"], "Ana");
    assert_eq!(person["email"], "ana@example.com");
    assert_eq!(person["isDeleted"], false);
    assert!(person["createdDate"].is_string());
  }

  #[tokio::test]
  async fn invalid_add_is_400_with_joined_messages() {
    let app = app().await;
    let (status, body) = send(
      &app,
      "POST",
      "/person/add",
      Some(json!({ "name": "", "email": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name cannot be null or Empty,Wrong format Email");
  }

  #[tokio::test]
  async fn missing_person_is_404() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/person/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Person 9 not found");
  }

  #[tokio::test]
  async fn save_updates_and_rejects_zero_id() {
    let app = app().await;
    let id = add(&app, "Ana").await;

    let (status, body) =
      send(&app, "PATCH", "/person/save", Some(json!({ "id": id, "name": "Anna" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(id));
    let (_, person) = send(&app, "GET", &format!("/person/{id}"), None).await;
    assert_eq!(person["name"], "Anna");

    let (status, body) = send(&app, "PATCH", "/person/save", Some(json!({ "name": "Bo" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Id cannot be zero");
  }

  #[tokio::test]
  async fn soft_delete_then_reactivate() {
    let app = app().await;
    let id = add(&app, "Ana").await;

    let (status, _) = send(&app, "DELETE", &format!("/person/delete/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/person/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = send(&app, "GET", "/person", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["isDeleted"], true);
    let (_, active) = send(&app, "GET", "/person?active_only=true", None).await;
    assert!(active.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "PUT", &format!("/person/active/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/person/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn bulk_routes_key_on_first_match() {
    let app = app().await;
    let a = add(&app, "Ana").await;
    let b = add(&app, "Bo").await;

    let (status, key) =
      send(&app, "DELETE", "/person/delete", Some(json!([404, b, a]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(key, json!(b));

    let (status, key) = send(&app, "PUT", "/person/active", Some(json!([a, b]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(key, json!(a));

    let (status, _) =
      send(&app, "DELETE", "/person/delete?force=true", Some(json!([a]))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, all) = send(&app, "GET", "/person", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn bulk_routes_with_no_matches() {
    let app = app().await;
    let (status, _) = send(&app, "DELETE", "/person/delete", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, "PUT", "/person/active", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn failed_delete_is_404_with_the_reason() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let healthy = person_router(Arc::new(PersonService::new(store.clone(), Arc::new(TracingSink))));
    let id = add(&healthy, "Ana").await;
    let app = person_router(Arc::new(PersonService::new(
      VanishingStore(store),
      Arc::new(TracingSink),
    )));
    let reason = format!("Person with id {id} does not exist");

    for uri in [format!("/person/delete/{id}"), format!("/person/delete/{id}?force=true")] {
      let (status, body) = send(&app, "DELETE", &uri, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
      assert_eq!(body["error"], reason, "{uri}");
    }

    let (status, body) = send(&app, "DELETE", "/person/delete", Some(json!([id]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], reason);

    let (status, person) = send(&healthy, "GET", &format!("/person/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(person["isDeleted"], false);
  }

  #[tokio::test]
  async fn malformed_id_is_404_with_json_error() {
    let app = app().await;
    for (method, uri) in [
      ("GET", "/person/abc"),
      ("DELETE", "/person/delete/abc"),
      ("PUT", "/person/active/1.5"),
    ] {
      let (status, body) = send(&app, method, uri, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
      assert!(body["error"].is_string(), "{uri}");
    }
  }

  #[tokio::test]
  async fn malformed_body_and_query_are_400_with_json_error() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/person/add", Some(json!({ "name": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "PUT", "/person/active", Some(json!({ "ids": [1] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/person?active_only=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }
}
