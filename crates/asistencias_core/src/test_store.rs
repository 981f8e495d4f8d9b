//! In-process `DocumentStore` used by the unit tests in this crate. Backed
//! by plain vectors behind a mutex; also records the size of every
//! `IN`-filter query so the chunking tests can assert the provider limit is
//! respected.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::{Application, Assignment, Course, Offer, User};
use crate::ports::{DocumentStore, PortError, PortResult, MAX_IN_KEYS};

#[derive(Default)]
pub struct TestStore {
    users: Mutex<Vec<User>>,
    offers: Mutex<Vec<Offer>>,
    applications: Mutex<Vec<Application>>,
    assignments: Mutex<Vec<Assignment>>,
    courses: Mutex<Vec<Course>>,
    in_query_sizes: Mutex<Vec<usize>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blank_user() -> User {
        serde_json::from_value(json!({ "tipoUsuario": "Estudiante" })).unwrap()
    }

    pub fn blank_offer() -> Offer {
        serde_json::from_value(json!({})).unwrap()
    }

    pub fn blank_application() -> Application {
        serde_json::from_value(json!({})).unwrap()
    }

    pub fn blank_assignment() -> Assignment {
        serde_json::from_value(json!({ "asistenciaId": "", "userId": "" })).unwrap()
    }

    pub fn blank_course() -> Course {
        serde_json::from_value(json!({})).unwrap()
    }

    pub fn push_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn push_offer(&self, offer: Offer) {
        self.offers.lock().unwrap().push(offer);
    }

    pub fn push_application(&self, application: Application) {
        self.applications.lock().unwrap().push(application);
    }

    pub fn push_assignment(&self, assignment: Assignment) {
        self.assignments.lock().unwrap().push(assignment);
    }

    pub fn push_course(&self, course: Course) {
        self.courses.lock().unwrap().push(course);
    }

    pub fn offers_snapshot(&self) -> Vec<Offer> {
        self.offers.lock().unwrap().clone()
    }

    pub fn applications_snapshot(&self) -> Vec<Application> {
        self.applications.lock().unwrap().clone()
    }

    pub fn assignments_snapshot(&self) -> Vec<Assignment> {
        self.assignments.lock().unwrap().clone()
    }

    pub fn in_query_sizes(&self) -> Vec<usize> {
        self.in_query_sizes.lock().unwrap().clone()
    }

    fn patch<T>(rows: &mut [T], id: &str, fields: Map<String, Value>) -> PortResult<()>
    where
        T: Serialize + DeserializeOwned + HasId,
    {
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| PortError::NotFound(format!("document {id} not found")))?;
        let mut value = serde_json::to_value(&*row).map_err(|e| PortError::Store(e.to_string()))?;
        if let Value::Object(object) = &mut value {
            for (key, field_value) in fields {
                object.insert(key, field_value);
            }
        }
        *row = serde_json::from_value(value).map_err(|e| PortError::Store(e.to_string()))?;
        Ok(())
    }
}

pub trait HasId {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

macro_rules! has_id {
    ($ty:ty) => {
        impl HasId for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

has_id!(User);
has_id!(Offer);
has_id!(Application);
has_id!(Assignment);
has_id!(Course);

fn assign_id<T: HasId>(doc: &mut T) -> String {
    if doc.id().is_empty() {
        doc.set_id(Uuid::new_v4().to_string());
    }
    doc.id().to_string()
}

#[async_trait]
impl DocumentStore for TestStore {
    async fn list_users(&self) -> PortResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_user(&self, id: &str) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("user {id} not found")))
    }

    async fn insert_user(&self, mut user: User) -> PortResult<String> {
        let id = assign_id(&mut user);
        self.users.lock().unwrap().push(user);
        Ok(id)
    }

    async fn update_user_fields(&self, id: &str, fields: Map<String, Value>) -> PortResult<()> {
        Self::patch(&mut self.users.lock().unwrap(), id, fields)
    }

    async fn delete_user(&self, id: &str) -> PortResult<()> {
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }

    async fn list_offers(&self) -> PortResult<Vec<Offer>> {
        Ok(self.offers.lock().unwrap().clone())
    }

    async fn get_offer(&self, id: &str) -> PortResult<Offer> {
        self.offers
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("offer {id} not found")))
    }

    async fn offers_by_professor(&self, professor_id: &str) -> PortResult<Vec<Offer>> {
        Ok(self
            .offers
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.persona_a_cargo == professor_id)
            .cloned()
            .collect())
    }

    async fn insert_offer(&self, mut offer: Offer) -> PortResult<String> {
        let id = assign_id(&mut offer);
        self.offers.lock().unwrap().push(offer);
        Ok(id)
    }

    async fn update_offer_fields(&self, id: &str, fields: Map<String, Value>) -> PortResult<()> {
        Self::patch(&mut self.offers.lock().unwrap(), id, fields)
    }

    async fn delete_offer(&self, id: &str) -> PortResult<()> {
        self.offers.lock().unwrap().retain(|o| o.id != id);
        Ok(())
    }

    async fn list_applications(&self) -> PortResult<Vec<Application>> {
        Ok(self.applications.lock().unwrap().clone())
    }

    async fn get_application(&self, id: &str) -> PortResult<Application> {
        self.applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("application {id} not found")))
    }

    async fn applications_by_user(&self, user_id: &str) -> PortResult<Vec<Application>> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_application(&self, mut application: Application) -> PortResult<String> {
        let id = assign_id(&mut application);
        self.applications.lock().unwrap().push(application);
        Ok(id)
    }

    async fn update_application_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> PortResult<()> {
        Self::patch(&mut self.applications.lock().unwrap(), id, fields)
    }

    async fn delete_application(&self, id: &str) -> PortResult<()> {
        self.applications.lock().unwrap().retain(|a| a.id != id);
        Ok(())
    }

    async fn assignments_by_offer_ids(&self, offer_ids: &[String]) -> PortResult<Vec<Assignment>> {
        if offer_ids.len() > MAX_IN_KEYS {
            return Err(PortError::Validation(format!(
                "'in' filter supports at most {MAX_IN_KEYS} values"
            )));
        }
        self.in_query_sizes.lock().unwrap().push(offer_ids.len());
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| offer_ids.iter().any(|id| *id == a.asistencia_id))
            .cloned()
            .collect())
    }

    async fn insert_assignment(&self, mut assignment: Assignment) -> PortResult<String> {
        let id = assign_id(&mut assignment);
        self.assignments.lock().unwrap().push(assignment);
        Ok(id)
    }

    async fn update_assignment_fields(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> PortResult<()> {
        Self::patch(&mut self.assignments.lock().unwrap(), id, fields)
    }

    async fn get_course(&self, id: &str) -> PortResult<Course> {
        self.courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("course {id} not found")))
    }

    async fn courses_by_professor(&self, professor_id: &str) -> PortResult<Vec<Course>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.profesor == professor_id)
            .cloned()
            .collect())
    }
}
