// src/services/notifications.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::{future::Future, sync::Arc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{auth::Role, plan::ActionPlan, recinto::Recinto},
    services::mail::{
        templates::{email_template, escape_html, format_fecha, CallToAction},
        EmailMessage, Mailer,
    },
};

// ---
// Mensagens
// ---

pub fn plan_created_message(plan: &ActionPlan, app_url: &str, to: Vec<String>) -> EmailMessage {
    let departamento = escape_html(&plan.departamento_name);
    let evento = escape_html(&plan.evento_name);
    let content = format!(
        r#"Se ha generado un nuevo plan de acción para el departamento <span class="highlight">{departamento}</span>
      relacionado con el evento <span class="highlight">{evento}</span>.<br><br>
      <p><b>Comentario:</b> {comentario}</p>
      Por favor, ingrese a la plataforma para gestionar las causas y el plan de acción correspondiente."#,
        comentario = escape_html(&plan.comentario),
    );
    let url = format!("{}/planes-accion", app_url.trim_end_matches('/'));

    EmailMessage {
        to,
        subject: format!("Nuevo Plan de Acción: {}", plan.evento_name),
        html: email_template(
            "Nuevo Plan de Acción Asignado",
            &content,
            Some(CallToAction { text: "Ver Planes de Acción", url: &url }),
        ),
    }
}

pub fn plan_submitted_message(plan: &ActionPlan, app_url: &str, to: Vec<String>) -> EmailMessage {
    let content = format!(
        r#"El departamento <span class="highlight">{departamento}</span> ha completado y enviado
        a aprobación un plan de acción para el evento <span class="highlight">{evento}</span>.<br><br>
        Por favor, revise y apruebe o rechace la gestión realizada."#,
        departamento = escape_html(&plan.departamento_name),
        evento = escape_html(&plan.evento_name),
    );
    let url = format!("{}/aprobaciones", app_url.trim_end_matches('/'));

    EmailMessage {
        to,
        subject: format!("Aprobación Pendiente: {}", plan.evento_name),
        html: email_template(
            "Plan de Acción Enviado para Revisión",
            &content,
            Some(CallToAction { text: "Ir a Aprobaciones", url: &url }),
        ),
    }
}

pub fn deadline_updated_message(
    recinto: Recinto,
    fecha_limite: DateTime<Utc>,
    tz: &Tz,
    app_url: &str,
    to: Vec<String>,
) -> EmailMessage {
    let content = format!(
        r#"Se ha establecido una nueva fecha y hora límite para el registro y gestión de planes de acción en <span class="highlight">{recinto}</span>.<br><br>
      Nueva fecha límite: <span class="highlight">{fecha}</span><br><br>
      Asegúrese de completar sus planes pendientes antes de esta fecha."#,
        fecha = format_fecha(fecha_limite, tz),
    );
    let url = format!("{}/", app_url.trim_end_matches('/'));

    EmailMessage {
        to,
        subject: format!("Nueva Fecha Límite: {recinto}"),
        html: email_template(
            "Actualización de Tiempo Límite",
            &content,
            Some(CallToAction { text: "Ir a la Plataforma", url: &url }),
        ),
    }
}

pub fn reminder_message(
    recinto: Recinto,
    fecha_limite: DateTime<Utc>,
    tz: &Tz,
    app_url: &str,
    to: Vec<String>,
) -> EmailMessage {
    let content = format!(
        r#"Este es un recordatorio de que el tiempo límite para la gestión de planes de acción en <span class="highlight">{recinto}</span>
            finaliza en <span class="highlight">24 horas</span>.<br><br>
            Fecha de cierre: <span class="highlight">{fecha}</span><br><br>
            Por favor, asegúrese de gestionar todos sus planes abiertos."#,
        fecha = format_fecha(fecha_limite, tz),
    );
    let url = format!("{}/", app_url.trim_end_matches('/'));

    EmailMessage {
        to,
        subject: format!("Recordatorio 24h: Cierre de Planes {recinto}"),
        html: email_template(
            "Recordatorio: Cierre Próximo",
            &content,
            Some(CallToAction { text: "Ir a la Plataforma", url: &url }),
        ),
    }
}

// ---
// Destinatários
// ---

#[async_trait]
pub trait Recipients: Send + Sync {
    async fn everyone(&self, recinto: Recinto) -> Result<Vec<String>, AppError>;
    async fn of_department(&self, recinto: Recinto, department_id: Uuid) -> Result<Vec<String>, AppError>;
    async fn with_roles(&self, recinto: Recinto, roles: &[Role]) -> Result<Vec<String>, AppError>;
}

#[async_trait]
impl Recipients for UserRepository {
    async fn everyone(&self, recinto: Recinto) -> Result<Vec<String>, AppError> {
        self.all_emails(recinto).await
    }

    async fn of_department(&self, recinto: Recinto, department_id: Uuid) -> Result<Vec<String>, AppError> {
        self.emails_by_department(recinto, department_id).await
    }

    async fn with_roles(&self, recinto: Recinto, roles: &[Role]) -> Result<Vec<String>, AppError> {
        self.emails_by_roles(recinto, roles).await
    }
}

// ---
// Disparo (depois do commit, em segundo plano)
// ---

/// Disparo das notificações de gatilho. Falhas só são registradas no log.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    recipients: Arc<dyn Recipients>,
    app_url: String,
    tz: Tz,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, recipients: Arc<dyn Recipients>, app_url: String, tz: Tz) -> Self {
        Self { mailer, recipients, app_url, tz }
    }

    /// Aviso aos usuários do departamento responsável.
    pub fn plan_created(&self, plan: ActionPlan) -> JoinHandle<()> {
        let this = self.clone();
        self.spawn("plan_created", async move {
            let to = this.recipients.of_department(plan.recinto, plan.departamento_id).await?;
            this.deliver(plan_created_message(&plan, &this.app_url, to)).await
        })
    }

    /// Aviso a Calidad/Administrador. Chamar só quando `gestionado` passou de false para true.
    pub fn plan_submitted(&self, plan: ActionPlan) -> JoinHandle<()> {
        let this = self.clone();
        self.spawn("plan_submitted", async move {
            let to = this
                .recipients
                .with_roles(plan.recinto, &[Role::Calidad, Role::Administrador])
                .await?;
            this.deliver(plan_submitted_message(&plan, &this.app_url, to)).await
        })
    }

    pub fn deadline_updated(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> JoinHandle<()> {
        let this = self.clone();
        self.spawn("deadline_updated", async move {
            let to = this.recipients.everyone(recinto).await?;
            this.deliver(deadline_updated_message(recinto, fecha_limite, &this.tz, &this.app_url, to))
                .await
        })
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), AppError> {
        if message.to.is_empty() {
            tracing::info!("Sem destinatários para '{}'", message.subject);
            return Ok(());
        }
        self.mailer.send(&message).await
    }

    fn spawn<F>(&self, kind: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::error!("Falha ao enviar notificação {kind}: {e:?}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::PlanStatus;
    use crate::services::lifecycle::tests::plan;
    use uuid::Uuid;

    #[test]
    fn plan_created_links_to_the_plans_screen() {
        let mut p = plan(PlanStatus::Abierto, Uuid::new_v4());
        p.evento_name = "Expo <Café>".into();
        let msg = plan_created_message(&p, "https://planes.example.com/", vec!["a@costaricacc.com".into()]);

        assert_eq!(msg.subject, "Nuevo Plan de Acción: Expo <Café>");
        assert!(msg.html.contains(r#"href="https://planes.example.com/planes-accion""#));
        assert!(msg.html.contains("Expo &lt;Café&gt;"));
        assert!(msg.html.contains("Sonido deficiente"));
    }

    #[test]
    fn plan_submitted_points_to_approvals() {
        let p = plan(PlanStatus::Cerrado, Uuid::new_v4());
        let msg = plan_submitted_message(&p, "https://planes.example.com", vec![]);
        assert_eq!(msg.subject, "Aprobación Pendiente: Expo");
        assert!(msg.html.contains("/aprobaciones"));
        assert!(msg.html.contains("Ir a Aprobaciones"));
    }

    #[test]
    fn deadline_and_reminder_messages_show_local_date() {
        let fecha = DateTime::parse_from_rfc3339("2026-10-14T23:00:00Z").unwrap().with_timezone(&Utc);
        let tz = chrono_tz::America::Mexico_City;

        let updated = deadline_updated_message(Recinto::Ccci, fecha, &tz, "https://x", vec![]);
        assert_eq!(updated.subject, "Nueva Fecha Límite: CCCI");
        assert!(updated.html.contains("14 oct 2026, 17:00"));

        let reminder = reminder_message(Recinto::Cevp, fecha, &tz, "https://x", vec![]);
        assert_eq!(reminder.subject, "Recordatorio 24h: Cierre de Planes CEVP");
        assert!(reminder.html.contains("24 horas"));
    }

    // --- Disparo ---

    use crate::services::mail::fake::FakeMailer;
    use std::collections::BTreeMap;

    /// Diretório em memória: e-mails por departamento e por papel.
    #[derive(Default)]
    struct FakeRecipients {
        by_department: BTreeMap<Uuid, Vec<String>>,
        by_role: BTreeMap<Role, Vec<String>>,
    }

    #[async_trait]
    impl Recipients for FakeRecipients {
        async fn everyone(&self, _recinto: Recinto) -> Result<Vec<String>, AppError> {
            let mut all: Vec<String> = self.by_department.values().flatten().cloned().collect();
            all.extend(self.by_role.values().flatten().cloned());
            all.sort();
            all.dedup();
            Ok(all)
        }

        async fn of_department(&self, _recinto: Recinto, department_id: Uuid) -> Result<Vec<String>, AppError> {
            Ok(self.by_department.get(&department_id).cloned().unwrap_or_default())
        }

        async fn with_roles(&self, _recinto: Recinto, roles: &[Role]) -> Result<Vec<String>, AppError> {
            Ok(roles.iter().filter_map(|r| self.by_role.get(r)).flatten().cloned().collect())
        }
    }

    fn notifier(recipients: FakeRecipients, fail: bool) -> (Notifier, Arc<FakeMailer>) {
        let mailer = Arc::new(FakeMailer { fail, ..Default::default() });
        let notifier = Notifier::new(
            mailer.clone(),
            Arc::new(recipients),
            "https://planes.example.com".into(),
            chrono_tz::America::Mexico_City,
        );
        (notifier, mailer)
    }

    fn directory(dept: Uuid) -> FakeRecipients {
        let mut recipients = FakeRecipients::default();
        recipients.by_department.insert(dept, vec!["av@costaricacc.com".into()]);
        recipients.by_department.insert(Uuid::new_v4(), vec!["limpieza@costaricacc.com".into()]);
        recipients.by_role.insert(Role::Calidad, vec!["calidad@costaricacc.com".into()]);
        recipients.by_role.insert(Role::Administrador, vec!["admin@costaricacc.com".into()]);
        recipients
    }

    #[tokio::test]
    async fn new_plan_mails_only_the_responsible_department() {
        let dept = Uuid::new_v4();
        let (notifier, mailer) = notifier(directory(dept), false);

        notifier.plan_created(plan(PlanStatus::Abierto, dept)).await.unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["av@costaricacc.com".to_string()]);
    }

    #[tokio::test]
    async fn submission_mails_quality_and_admins() {
        let dept = Uuid::new_v4();
        let (notifier, mailer) = notifier(directory(dept), false);

        notifier.plan_submitted(plan(PlanStatus::Cerrado, dept)).await.unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["calidad@costaricacc.com".to_string(), "admin@costaricacc.com".to_string()]);
    }

    #[tokio::test]
    async fn deadline_change_mails_every_user() {
        let (notifier, mailer) = notifier(directory(Uuid::new_v4()), false);
        let fecha = DateTime::parse_from_rfc3339("2026-10-20T23:00:00Z").unwrap().with_timezone(&Utc);

        notifier.deadline_updated(Recinto::Cccr, fecha).await.unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.len(), 4);
        assert!(sent[0].subject.contains("CCCR"));
    }

    #[tokio::test]
    async fn department_without_users_gets_no_mail() {
        let (notifier, mailer) = notifier(FakeRecipients::default(), false);
        notifier.plan_created(plan(PlanStatus::Abierto, Uuid::new_v4())).await.unwrap();
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn mailer_failure_stays_inside_the_task() {
        let dept = Uuid::new_v4();
        let (notifier, mailer) = notifier(directory(dept), true);

        // A tarefa termina normalmente: o erro só vai para o log.
        let outcome = notifier.plan_created(plan(PlanStatus::Abierto, dept)).await;
        assert!(outcome.is_ok());
        assert!(mailer.sent.lock().await.is_empty());
    }
}
