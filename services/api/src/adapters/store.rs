//! services/api/src/adapters/store.rs
//!
//! This module contains the document store adapter, the concrete
//! implementation of the `DocumentStore` port from the `core` crate.
//!
//! Documents live as raw JSON objects in five in-memory collections behind
//! an async RwLock; the real backing store is an external concern and this
//! adapter reproduces its observable semantics: schema-less documents,
//! per-document last-write-wins, no transactions, and an `IN` filter capped
//! at ten keys.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use asistencias_core::domain::{Application, Assignment, Course, Offer, User};
use asistencias_core::ports::{DocumentStore, PortError, PortResult, MAX_IN_KEYS};

type Collection = HashMap<String, Value>;

#[derive(Default)]
struct Collections {
    usuarios: Collection,
    asistencias: Collection,
    solicitudes: Collection,
    asistencias_asignadas: Collection,
    cursos: Collection,
}

impl Collections {
    fn by_name(&mut self, name: &str) -> PortResult<&mut Collection> {
        match name {
            "Usuarios" => Ok(&mut self.usuarios),
            "Asistencias" => Ok(&mut self.asistencias),
            "Solicitudes" => Ok(&mut self.solicitudes),
            "AsistenciasAsignadas" => Ok(&mut self.asistencias_asignadas),
            "Cursos" => Ok(&mut self.cursos),
            other => Err(PortError::Validation(format!("unknown collection '{other}'"))),
        }
    }
}

/// In-memory document store adapter.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

fn decode<T: DeserializeOwned>(id: &str, value: &Value) -> PortResult<T> {
    let mut value = value.clone();
    if let Value::Object(object) = &mut value {
        object.insert("id".to_string(), Value::String(id.to_string()));
    }
    serde_json::from_value(value).map_err(|e| PortError::Store(e.to_string()))
}

fn encode<T: Serialize>(doc: &T) -> PortResult<Value> {
    serde_json::to_value(doc).map_err(|e| PortError::Store(e.to_string()))
}

fn decode_all<T: DeserializeOwned>(collection: &Collection) -> PortResult<Vec<T>> {
    collection
        .iter()
        .map(|(id, value)| decode(id, value))
        .collect()
}

fn get_from<T: DeserializeOwned>(collection: &Collection, id: &str, kind: &str) -> PortResult<T> {
    let value = collection
        .get(id)
        .ok_or_else(|| PortError::NotFound(format!("{kind} {id} not found")))?;
    decode(id, value)
}

fn insert_into<T: Serialize>(collection: &mut Collection, id: String, doc: &T) -> PortResult<String> {
    let mut value = encode(doc)?;
    if let Value::Object(object) = &mut value {
        object.insert("id".to_string(), Value::String(id.clone()));
    }
    collection.insert(id.clone(), value);
    Ok(id)
}

fn patch_in(
    collection: &mut Collection,
    id: &str,
    fields: Map<String, Value>,
    kind: &str,
) -> PortResult<()> {
    let value = collection
        .get_mut(id)
        .ok_or_else(|| PortError::NotFound(format!("{kind} {id} not found")))?;
    if let Value::Object(object) = value {
        for (key, field_value) in fields {
            object.insert(key, field_value);
        }
    }
    Ok(())
}

fn fresh_id(id: &str) -> String {
    if id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON fixture shaped as
    /// `{ "Usuarios": [ { ... }, ... ], "Asistencias": [ ... ], ... }`.
    /// Documents without an `id` get a generated one.
    pub async fn load_seed(&self, path: &Path) -> PortResult<usize> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PortError::Store(format!("cannot read seed file: {e}")))?;
        let seed: Value =
            serde_json::from_str(&raw).map_err(|e| PortError::Store(format!("bad seed JSON: {e}")))?;
        let Value::Object(by_collection) = seed else {
            return Err(PortError::Store("seed root must be an object".to_string()));
        };

        let mut loaded = 0;
        let mut collections = self.collections.write().await;
        for (name, docs) in by_collection {
            let collection = collections.by_name(&name)?;
            let Value::Array(docs) = docs else {
                return Err(PortError::Store(format!(
                    "seed collection '{name}' must be an array"
                )));
            };
            for mut doc in docs {
                let id = doc
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                if let Value::Object(object) = &mut doc {
                    object.insert("id".to_string(), Value::String(id.clone()));
                }
                collection.insert(id, doc);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Courses are reference data with no write endpoint; fixtures insert
    /// them directly.
    pub async fn insert_course(&self, course: Course) -> PortResult<String> {
        let id = fresh_id(&course.id);
        insert_into(&mut self.collections.write().await.cursos, id, &course)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        decode_all(&self.collections.read().await.usuarios)
    }

    async fn get_user(&self, id: &str) -> PortResult<User> {
        get_from(&self.collections.read().await.usuarios, id, "user")
    }

    async fn insert_user(&self, user: User) -> PortResult<String> {
        let id = fresh_id(&user.id);
        insert_into(&mut self.collections.write().await.usuarios, id, &user)
    }

    async fn update_user_fields(&self, id: &str, fields: Map<String, Value>) -> PortResult<()> {
        patch_in(&mut self.collections.write().await.usuarios, id, fields, "user")
    }

    async fn delete_user(&self, id: &str) -> PortResult<()> {
        self.collections.write().await.usuarios.remove(id);
        Ok(())
    }

    async fn list_offers(&self) -> PortResult<Vec<Offer>> {
        decode_all(&self.collections.read().await.asistencias)
    }

    async fn get_offer(&self, id: &str) -> PortResult<Offer> {
        get_from(&self.collections.read().await.asistencias, id, "offer")
    }

    async fn offers_by_professor(&self, professor_id: &str) -> PortResult<Vec<Offer>> {
        let offers: Vec<Offer> = decode_all(&self.collections.read().await.asistencias)?;
        Ok(offers
            .into_iter()
            .filter(|o| o.persona_a_cargo == professor_id)
            .collect())
    }

    async fn insert_offer(&self, offer: Offer) -> PortResult<String> {
        let id = fresh_id(&offer.id);
        insert_into(&mut self.collections.write().await.asistencias, id, &offer)
    }

    async fn update_offer_fields(&self, id: &str, fields: Map<String, Value>) -> PortResult<()> {
        patch_in(
            &mut self.collections.write().await.asistencias,
            id,
            fields,
            "offer",
        )
    }

    async fn delete_offer(&self, id: &str) -> PortResult<()> {
        self.collections.write().await.asistencias.remove(id);
        Ok(())
    }

    async fn list_applications(&self) -> PortResult<Vec<Application>> {
        decode_all(&self.collections.read().await.solicitudes)
    }

    async fn get_application(&self, id: &str) -> PortResult<Application> {
        get_from(&self.collections.read().await.solicitudes, id, "application")
    }

    async fn applications_by_user(&self, user_id: &str) -> PortResult<Vec<Application>> {
        let applications: Vec<Application> =
            decode_all(&self.collections.read().await.solicitudes)?;
        Ok(applications
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .collect())
    }

    async fn insert_application(&self, application: Application) -> PortResult<String> {
        let id = fresh_id(&application.id);
        insert_into(
            &mut self.collections.write().await.solicitudes,
            id,
            &application,
        )
    }

    async fn update_application_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> PortResult<()> {
        patch_in(
            &mut self.collections.write().await.solicitudes,
            id,
            fields,
            "application",
        )
    }

    async fn delete_application(&self, id: &str) -> PortResult<()> {
        self.collections.write().await.solicitudes.remove(id);
        Ok(())
    }

    async fn assignments_by_offer_ids(&self, offer_ids: &[String]) -> PortResult<Vec<Assignment>> {
        if offer_ids.len() > MAX_IN_KEYS {
            return Err(PortError::Validation(format!(
                "'in' filter supports at most {MAX_IN_KEYS} values"
            )));
        }
        let assignments: Vec<Assignment> =
            decode_all(&self.collections.read().await.asistencias_asignadas)?;
        Ok(assignments
            .into_iter()
            .filter(|a| offer_ids.iter().any(|id| *id == a.asistencia_id))
            .collect())
    }

    async fn insert_assignment(&self, assignment: Assignment) -> PortResult<String> {
        let id = fresh_id(&assignment.id);
        insert_into(
            &mut self.collections.write().await.asistencias_asignadas,
            id,
            &assignment,
        )
    }

    async fn update_assignment_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> PortResult<()> {
        patch_in(
            &mut self.collections.write().await.asistencias_asignadas,
            id,
            fields,
            "assignment",
        )
    }

    async fn get_course(&self, id: &str) -> PortResult<Course> {
        get_from(&self.collections.read().await.cursos, id, "course")
    }

    async fn courses_by_professor(&self, professor_id: &str) -> PortResult<Vec<Course>> {
        let courses: Vec<Course> = decode_all(&self.collections.read().await.cursos)?;
        Ok(courses
            .into_iter()
            .filter(|c| c.profesor == professor_id)
            .collect())
    }
}
