//! crates/asistencias_core/src/workflow.rs
//!
//! Write-side flows over the document store: registering applications,
//! approving and rejecting them, and guarded offer state changes.
//!
//! The store has no multi-document transactions. Approval orders the writes
//! create-Assignment-first, delete-Solicitud-second, so a crash in between
//! leaves an orphaned application but never a lost assignment.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Map};

use crate::domain::{Application, ApplicationState, Assignment, ChangeRecord, OfferState};
use crate::join::{assignments_for_offers, find_offer_by_title, find_open_offer, normalize_title, OfferRef};
use crate::ports::{DocumentStore, PortError, PortResult, MAX_IN_KEYS};
use crate::transition::Transition;

/// What happens when approvals reach an offer's vacancy count.
///
/// The source system never checked vacancies, so two concurrent approvals
/// both succeed; whether that is intended is an open business question.
/// `Unlimited` reproduces that behavior, `CloseWhenFilled` closes the offer
/// once assignments reach `cantidadVacantes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalPolicy {
    #[default]
    Unlimited,
    CloseWhenFilled,
}

impl FromStr for ApprovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unlimited" => Ok(ApprovalPolicy::Unlimited),
            "close-when-filled" => Ok(ApprovalPolicy::CloseWhenFilled),
            other => Err(format!("'{other}' is not a valid approval policy")),
        }
    }
}

/// Dates are stored as `DD/MM/YYYY` strings throughout the collections.
pub fn fecha_display(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Payload for registering a student's application to an offer.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub user_id: String,
    pub titulo_oportunidad: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub promedio: String,
    #[serde(default)]
    pub horas: String,
    #[serde(default)]
    pub nota: String,
    #[serde(default)]
    pub comentarios: String,
    #[serde(default)]
    pub documento: String,
}

/// Registers a Solicitud. When an offer with a matching title exists, the
/// stable offer ID is pinned on the application, the student is appended to
/// `postulaciones` and `cantidadSolicitudes` is incremented. The counter is
/// never decremented anywhere, so it drifts on withdrawal; preserved
/// behavior.
pub async fn register_application(
    store: &dyn DocumentStore,
    payload: NewApplication,
) -> PortResult<String> {
    if payload.user_id.is_empty() || payload.titulo_oportunidad.is_empty() {
        return Err(PortError::Validation(
            "userId y tituloOportunidad son requeridos".to_string(),
        ));
    }

    let offers = store.list_offers().await?;
    let matched = find_offer_by_title(&offers, &payload.titulo_oportunidad).cloned();

    let application = Application {
        id: String::new(),
        user_id: payload.user_id.clone(),
        titulo_oportunidad: payload.titulo_oportunidad,
        estado: ApplicationState::Pendiente,
        reunion: false,
        fecha: Some(Utc::now()),
        oferta_id: matched.as_ref().map(|o| o.id.clone()),
        nombre: payload.nombre,
        correo: payload.correo,
        telefono: payload.telefono,
        promedio: payload.promedio,
        horas: payload.horas,
        nota: payload.nota,
        comentarios: payload.comentarios,
        documento: payload.documento,
        extra: Map::new(),
    };
    let id = store.insert_application(application).await?;

    if let Some(offer) = matched {
        let mut postulaciones = offer.postulaciones.clone();
        if !postulaciones.contains(&payload.user_id) {
            postulaciones.push(payload.user_id);
        }
        let mut fields = Map::new();
        fields.insert("postulaciones".to_string(), json!(postulaciones));
        fields.insert(
            "cantidadSolicitudes".to_string(),
            json!(offer.cantidad_solicitudes + 1),
        );
        store.update_offer_fields(&offer.id, fields).await?;
    }

    Ok(id)
}

fn default_pago() -> i64 {
    2000
}

fn default_activo() -> bool {
    true
}

/// Payload for approving an application and assigning the student.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub user_id: String,
    pub titulo_oportunidad: String,
    #[serde(default = "default_pago")]
    pub pago: i64,
    #[serde(default)]
    pub retroalimentacion: String,
    #[serde(default)]
    pub desempeno: String,
    #[serde(default = "default_activo")]
    pub activo: bool,
}

/// Approves an application: requires an offer in state Abierto matching the
/// request (by pinned ID when the application carries one, by normalized
/// title otherwise), creates exactly one Assignment, then deletes the
/// student's matching Solicitudes. When no open offer exists the call fails
/// with NotFound and has no side effects.
pub async fn approve_application(
    store: &dyn DocumentStore,
    request: ApprovalRequest,
    policy: ApprovalPolicy,
) -> PortResult<()> {
    let wanted = normalize_title(&request.titulo_oportunidad);
    let student_apps = store.applications_by_user(&request.user_id).await?;
    let matching: Vec<&Application> = student_apps
        .iter()
        .filter(|a| normalize_title(&a.titulo_oportunidad) == wanted)
        .collect();

    let offers = store.list_offers().await?;
    let pinned = matching
        .iter()
        .find_map(|a| a.oferta_id.clone())
        .map(OfferRef::ById);
    // A pinned ID that no longer points at an open offer falls back to the
    // title join (the offer may have been re-published under the same name).
    let offer = pinned
        .as_ref()
        .and_then(|target| find_open_offer(&offers, target))
        .or_else(|| {
            find_open_offer(&offers, &OfferRef::ByTitle(request.titulo_oportunidad.clone()))
        })
        .ok_or_else(|| {
            PortError::NotFound("No existe Asistencia abierta con ese título.".to_string())
        })?
        .clone();

    let assignment = Assignment {
        id: String::new(),
        asistencia_id: offer.id.clone(),
        user_id: request.user_id.clone(),
        pago: request.pago,
        desempeno: request.desempeno,
        retroalimentacion: request.retroalimentacion,
        fecha_asignacion: Some(Utc::now()),
        activo: request.activo,
        extra: Map::new(),
    };
    store.insert_assignment(assignment).await?;

    // Delete only after the assignment landed; the reverse order could lose
    // the application without any derived record.
    for application in &matching {
        store.delete_application(&application.id).await?;
    }

    if policy == ApprovalPolicy::CloseWhenFilled {
        let filled = assignments_for_offers(store, &[offer.id.clone()], MAX_IN_KEYS)
            .await?
            .len();
        let vacantes: usize = offer.cantidad_vacantes.trim().parse().unwrap_or(0);
        if vacantes > 0 && filled >= vacantes {
            change_offer_state(store, &offer.id, OfferState::Cerrado).await?;
        }
    }

    Ok(())
}

/// Moves an application to a new state through the guard and persists the
/// flip. A no-op transition skips the write.
pub async fn set_application_state(
    store: &dyn DocumentStore,
    application: &Application,
    to: ApplicationState,
) -> PortResult<Transition> {
    match application.estado.transition(to)? {
        Transition::Noop => Ok(Transition::Noop),
        Transition::Changed => {
            let mut fields = Map::new();
            fields.insert("estado".to_string(), json!(to.as_str()));
            store
                .update_application_fields(&application.id, fields)
                .await?;
            Ok(Transition::Changed)
        }
    }
}

/// Rejects an application: a pure status flip, no side effects, the
/// document is kept.
pub async fn reject_application(store: &dyn DocumentStore, id: &str) -> PortResult<Transition> {
    let application = store.get_application(id).await?;
    set_application_state(store, &application, ApplicationState::Rechazado).await
}

/// Moves an offer to a new state through the guard. A real change appends
/// an entry to the offer's `historialCambios`.
pub async fn change_offer_state(
    store: &dyn DocumentStore,
    id: &str,
    to: OfferState,
) -> PortResult<Transition> {
    let offer = store.get_offer(id).await?;
    match offer.estado.transition(to)? {
        Transition::Noop => Ok(Transition::Noop),
        Transition::Changed => {
            let mut historial = offer.historial_cambios.clone();
            historial.push(ChangeRecord {
                cambios: format!(
                    "Estado cambiado de {} a {}",
                    offer.estado.as_str(),
                    to.as_str()
                ),
                fecha: fecha_display(Utc::now().date_naive()),
                hora_x_semana: offer.hora_x_semana.clone(),
            });
            let mut fields = Map::new();
            fields.insert("estado".to_string(), json!(to.as_str()));
            fields.insert(
                "historialCambios".to_string(),
                serde_json::to_value(historial).map_err(|e| PortError::Store(e.to_string()))?,
            );
            store.update_offer_fields(id, fields).await?;
            Ok(Transition::Changed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Offer;
    use crate::test_store::TestStore;

    fn open_offer(id: &str, titulo: &str) -> Offer {
        Offer {
            id: id.to_string(),
            titulo_programa: titulo.to_string(),
            estado: OfferState::Abierto,
            ..TestStore::blank_offer()
        }
    }

    fn approval(user_id: &str, titulo: &str) -> ApprovalRequest {
        ApprovalRequest {
            user_id: user_id.to_string(),
            titulo_oportunidad: titulo.to_string(),
            pago: 2000,
            retroalimentacion: String::new(),
            desempeno: String::new(),
            activo: true,
        }
    }

    fn pending(user_id: &str, titulo: &str) -> Application {
        Application {
            id: format!("sol-{user_id}"),
            user_id: user_id.to_string(),
            titulo_oportunidad: titulo.to_string(),
            ..TestStore::blank_application()
        }
    }

    #[tokio::test]
    async fn registering_pins_offer_id_and_bumps_counter() {
        let store = TestStore::new();
        store.push_offer(open_offer("o1", "Tuto Mate"));

        let payload = NewApplication {
            user_id: "u2".into(),
            titulo_oportunidad: " TUTO MATE ".into(),
            nombre: "Luis".into(),
            correo: String::new(),
            telefono: String::new(),
            promedio: "88".into(),
            horas: "10".into(),
            nota: String::new(),
            comentarios: String::new(),
            documento: String::new(),
        };
        register_application(&store, payload).await.unwrap();

        let apps = store.applications_snapshot();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].estado, ApplicationState::Pendiente);
        assert_eq!(apps[0].oferta_id.as_deref(), Some("o1"));

        let offer = store.offers_snapshot().remove(0);
        assert_eq!(offer.cantidad_solicitudes, 1);
        assert_eq!(offer.postulaciones, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn registering_without_matching_offer_still_saves() {
        let store = TestStore::new();
        let payload = NewApplication {
            user_id: "u2".into(),
            titulo_oportunidad: "Curso inexistente".into(),
            nombre: String::new(),
            correo: String::new(),
            telefono: String::new(),
            promedio: String::new(),
            horas: String::new(),
            nota: String::new(),
            comentarios: String::new(),
            documento: String::new(),
        };
        register_application(&store, payload).await.unwrap();
        let apps = store.applications_snapshot();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].oferta_id, None);
    }

    #[tokio::test]
    async fn approval_creates_assignment_and_removes_application() {
        let store = TestStore::new();
        store.push_offer(open_offer("o1", "Tuto Mate"));
        store.push_application(pending("u2", " Tuto  Mate "));

        // Padding and casing differ; the normalized join must still match
        // ("tuto mate" vs " Tuto Mate ") when inner spacing agrees.
        store.push_application(pending("u3", "tuto mate"));

        approve_application(&store, approval("u3", " TUTO MATE "), ApprovalPolicy::Unlimited)
            .await
            .unwrap();

        let assignments = store.assignments_snapshot();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].asistencia_id, "o1");
        assert_eq!(assignments[0].user_id, "u3");
        assert_eq!(assignments[0].pago, 2000);

        // Only u3's application is gone.
        let remaining = store.applications_snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, "u2");
    }

    #[tokio::test]
    async fn approval_without_open_offer_has_no_side_effects() {
        let store = TestStore::new();
        let mut closed = open_offer("o1", "Tuto Mate");
        closed.estado = OfferState::Cerrado;
        store.push_offer(closed);
        store.push_application(pending("u2", "Tuto Mate"));

        let err = approve_application(&store, approval("u2", "Tuto Mate"), ApprovalPolicy::Unlimited)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert!(store.assignments_snapshot().is_empty());
        assert_eq!(store.applications_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn double_approval_succeeds_under_unlimited_policy() {
        let store = TestStore::new();
        store.push_offer(open_offer("o1", "Tuto Mate"));
        store.push_application(pending("u2", "Tuto Mate"));

        approve_application(&store, approval("u2", "tuto mate"), ApprovalPolicy::Unlimited)
            .await
            .unwrap();
        // No vacancy check: the second call also succeeds.
        approve_application(&store, approval("u2", "tuto mate"), ApprovalPolicy::Unlimited)
            .await
            .unwrap();
        assert_eq!(store.assignments_snapshot().len(), 2);
    }

    #[tokio::test]
    async fn close_when_filled_closes_the_offer() {
        let store = TestStore::new();
        let mut offer = open_offer("o1", "Tuto Mate");
        offer.cantidad_vacantes = "1".into();
        store.push_offer(offer);
        store.push_application(pending("u2", "Tuto Mate"));

        approve_application(
            &store,
            approval("u2", "Tuto Mate"),
            ApprovalPolicy::CloseWhenFilled,
        )
        .await
        .unwrap();

        let offer = store.offers_snapshot().remove(0);
        assert_eq!(offer.estado, OfferState::Cerrado);
        assert_eq!(offer.historial_cambios.len(), 1);

        // A later approval attempt now fails: the offer is no longer open.
        store.push_application(pending("u4", "Tuto Mate"));
        let err = approve_application(
            &store,
            approval("u4", "Tuto Mate"),
            ApprovalPolicy::CloseWhenFilled,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn stale_pinned_offer_falls_back_to_title_join() {
        let store = TestStore::new();
        let mut retired = open_offer("o1", "Tuto Mate");
        retired.estado = OfferState::Cerrado;
        store.push_offer(retired);
        store.push_offer(open_offer("o2", "Tuto Mate"));
        let mut app = pending("u2", "Tuto Mate");
        app.oferta_id = Some("o1".into());
        store.push_application(app);

        approve_application(&store, approval("u2", "Tuto Mate"), ApprovalPolicy::Unlimited)
            .await
            .unwrap();
        assert_eq!(store.assignments_snapshot()[0].asistencia_id, "o2");
    }

    #[tokio::test]
    async fn rejection_flips_state_and_keeps_the_document() {
        let store = TestStore::new();
        store.push_application(pending("u2", "Tuto Mate"));

        let result = reject_application(&store, "sol-u2").await.unwrap();
        assert_eq!(result, Transition::Changed);
        let apps = store.applications_snapshot();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].estado, ApplicationState::Rechazado);

        // Rejecting again is a no-op, not an error.
        let again = reject_application(&store, "sol-u2").await.unwrap();
        assert_eq!(again, Transition::Noop);
    }

    #[tokio::test]
    async fn offer_state_change_appends_history() {
        let store = TestStore::new();
        let mut offer = open_offer("o1", "Tuto Mate");
        offer.estado = OfferState::Revision;
        offer.hora_x_semana = "8".into();
        store.push_offer(offer);

        let result = change_offer_state(&store, "o1", OfferState::Abierto)
            .await
            .unwrap();
        assert_eq!(result, Transition::Changed);
        let offer = store.offers_snapshot().remove(0);
        assert_eq!(offer.estado, OfferState::Abierto);
        assert_eq!(offer.historial_cambios.len(), 1);
        assert_eq!(
            offer.historial_cambios[0].cambios,
            "Estado cambiado de Revision a Abierto"
        );
        assert_eq!(offer.historial_cambios[0].hora_x_semana, "8");
    }

    #[tokio::test]
    async fn reopening_a_closed_offer_is_rejected() {
        let store = TestStore::new();
        let mut offer = open_offer("o1", "Tuto Mate");
        offer.estado = OfferState::Cerrado;
        store.push_offer(offer);

        let err = change_offer_state(&store, "o1", OfferState::Abierto)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::InvalidTransition { .. }));
        // And closing it again is an idempotent no-op.
        let noop = change_offer_state(&store, "o1", OfferState::Cerrado)
            .await
            .unwrap();
        assert_eq!(noop, Transition::Noop);
    }

    #[test]
    fn approval_policy_parses_from_config_strings() {
        assert_eq!(
            "unlimited".parse::<ApprovalPolicy>().unwrap(),
            ApprovalPolicy::Unlimited
        );
        assert_eq!(
            "Close-When-Filled".parse::<ApprovalPolicy>().unwrap(),
            ApprovalPolicy::CloseWhenFilled
        );
        assert!("first-wins".parse::<ApprovalPolicy>().is_err());
    }

    #[test]
    fn fechas_use_the_stored_date_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(fecha_display(date), "07/03/2026");
    }
}
