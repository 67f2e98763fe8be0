// src/services/reminder.rs

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{DeadlineRepository, UserRepository},
    models::recinto::Recinto,
    services::{
        mail::Mailer,
        notifications::reminder_message,
    },
};

const FIRST_HOUR: u32 = 8;
const LAST_HOUR: u32 = 17;

/// Acesso aos dados que o lembrete precisa (um recinto por vez).
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn fecha_limite(&self, recinto: Recinto) -> Result<Option<DateTime<Utc>>, AppError>;
    async fn recipients(&self, recinto: Recinto) -> Result<Vec<String>, AppError>;
    /// Registra o envio antes de entregar; false se já estava registrado.
    async fn claim(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<bool, AppError>;
    /// Desfaz o registro quando a entrega falha.
    async fn release(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<(), AppError>;
}

pub struct PgReminderStore {
    deadlines: DeadlineRepository,
    users: UserRepository,
}

impl PgReminderStore {
    pub fn new(deadlines: DeadlineRepository, users: UserRepository) -> Self {
        Self { deadlines, users }
    }
}

#[async_trait]
impl ReminderStore for PgReminderStore {
    async fn fecha_limite(&self, recinto: Recinto) -> Result<Option<DateTime<Utc>>, AppError> {
        self.deadlines.fecha_limite(recinto).await
    }

    async fn recipients(&self, recinto: Recinto) -> Result<Vec<String>, AppError> {
        self.users.all_emails(recinto).await
    }

    async fn claim(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<bool, AppError> {
        self.deadlines.claim_reminder(recinto, fecha_limite).await
    }

    async fn release(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<(), AppError> {
        self.deadlines.release_reminder(recinto, fecha_limite).await
    }
}

/// Faltam mais de 23 e no máximo 24 horas para o prazo?
pub fn in_reminder_window(now: DateTime<Utc>, fecha_limite: DateTime<Utc>) -> bool {
    let diff_hours = (fecha_limite - now).num_seconds() as f64 / 3600.0;
    diff_hours > 23.0 && diff_hours <= 24.0
}

/// Próximo disparo: hora cheia, 08:00-17:00, segunda a sexta, no fuso informado.
pub fn next_fire_after(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let local = now.with_timezone(tz).naive_local();
    let top_of_hour = NaiveTime::from_hms_opt(local.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut candidate = NaiveDateTime::new(local.date(), top_of_hour) + Duration::hours(1);

    // Uma semana e pouco de horas cobre qualquer fim de semana.
    for _ in 0..(24 * 9) {
        let weekday = candidate.weekday();
        let business_day = !matches!(weekday, Weekday::Sat | Weekday::Sun);
        if business_day && (FIRST_HOUR..=LAST_HOUR).contains(&candidate.hour()) {
            // Horários inexistentes (mudança de horário) são pulados.
            if let Some(fire) = tz.from_local_datetime(&candidate).earliest() {
                let fire = fire.with_timezone(&Utc);
                if fire > now {
                    return fire;
                }
            }
        }
        candidate += Duration::hours(1);
    }

    now + Duration::hours(1)
}

#[derive(Clone)]
pub struct ReminderJob {
    store: Arc<dyn ReminderStore>,
    mailer: Arc<dyn Mailer>,
    tz: Tz,
    app_url: String,
}

impl ReminderJob {
    pub fn new(store: Arc<dyn ReminderStore>, mailer: Arc<dyn Mailer>, tz: Tz, app_url: String) -> Self {
        Self { store, mailer, tz, app_url }
    }

    /// Varre todos os recintos; devolve quantos lembretes foram enviados.
    pub async fn scan(&self, now: DateTime<Utc>) -> usize {
        let mut sent = 0;
        for recinto in Recinto::ALL {
            match self.scan_facility(recinto, now).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => tracing::error!("Erro processando lembrete para {recinto}: {e:?}"),
            }
        }
        sent
    }

    async fn scan_facility(&self, recinto: Recinto, now: DateTime<Utc>) -> Result<bool, AppError> {
        let Some(fecha_limite) = self.store.fecha_limite(recinto).await? else {
            return Ok(false);
        };
        if !in_reminder_window(now, fecha_limite) {
            return Ok(false);
        }

        let to = self.store.recipients(recinto).await?;
        if to.is_empty() {
            return Ok(false);
        }

        if !self.store.claim(recinto, fecha_limite).await? {
            tracing::debug!("Lembrete de {recinto} para {fecha_limite} já enviado");
            return Ok(false);
        }

        let message = reminder_message(recinto, fecha_limite, &self.tz, &self.app_url, to);
        if let Err(e) = self.mailer.send(&message).await {
            // Libera o registro para a próxima varredura tentar de novo.
            if let Err(release_err) = self.store.release(recinto, fecha_limite).await {
                tracing::error!(
                    "Lembrete de {recinto} para {fecha_limite} não foi entregue e continua registrado: {release_err:?}"
                );
            }
            return Err(e);
        }

        tracing::info!("⏰ Lembrete de prazo enviado para {recinto} ({} destinatários)", message.to.len());
        Ok(true)
    }

    /// Loop do agendador: dorme até o próximo horário e varre.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_fire_after(now, &self.tz);
                tracing::debug!("Próxima verificação de prazos: {next}");

                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                self.scan(Utc::now()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mail::fake::FakeMailer;
    use std::collections::{BTreeMap, BTreeSet};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        deadlines: BTreeMap<Recinto, DateTime<Utc>>,
        failing: BTreeSet<Recinto>,
        sent: Mutex<BTreeSet<(Recinto, DateTime<Utc>)>>,
    }

    #[async_trait]
    impl ReminderStore for FakeStore {
        async fn fecha_limite(&self, recinto: Recinto) -> Result<Option<DateTime<Utc>>, AppError> {
            if self.failing.contains(&recinto) {
                return Err(AppError::UpstreamError("db offline".into()));
            }
            Ok(self.deadlines.get(&recinto).copied())
        }

        async fn recipients(&self, recinto: Recinto) -> Result<Vec<String>, AppError> {
            Ok(vec![format!("calidad@{}.com", recinto.code().to_lowercase())])
        }

        async fn claim(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<bool, AppError> {
            Ok(self.sent.lock().await.insert((recinto, fecha_limite)))
        }

        async fn release(&self, recinto: Recinto, fecha_limite: DateTime<Utc>) -> Result<(), AppError> {
            self.sent.lock().await.remove(&(recinto, fecha_limite));
            Ok(())
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn job(store: FakeStore) -> (ReminderJob, Arc<FakeMailer>) {
        let mailer = Arc::new(FakeMailer::default());
        let job = ReminderJob::new(
            Arc::new(store),
            mailer.clone(),
            chrono_tz::America::Mexico_City,
            "https://planes.example.com".into(),
        );
        (job, mailer)
    }

    #[test]
    fn window_is_strictly_after_23_hours_up_to_24() {
        let now = utc("2026-10-14T15:00:00Z");
        assert!(in_reminder_window(now, now + Duration::minutes(23 * 60 + 30)));
        assert!(in_reminder_window(now, now + Duration::hours(24)));
        assert!(!in_reminder_window(now, now + Duration::hours(23)));
        assert!(!in_reminder_window(now, now + Duration::hours(25)));
        assert!(!in_reminder_window(now, now + Duration::hours(22)));
        assert!(!in_reminder_window(now, now - Duration::hours(1)));
    }

    #[tokio::test]
    async fn sends_once_per_facility_inside_window() {
        let now = utc("2026-10-14T15:00:00Z");
        let mut store = FakeStore::default();
        store.deadlines.insert(Recinto::Cccr, now + Duration::minutes(23 * 60 + 30));
        store.deadlines.insert(Recinto::Ccci, now + Duration::hours(25));
        store.deadlines.insert(Recinto::Cevp, now + Duration::hours(22));

        let (job, mailer) = job(store);
        assert_eq!(job.scan(now).await, 1);

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Recordatorio 24h: Cierre de Planes CCCR");
        assert_eq!(sent[0].to, vec!["calidad@cccr.com".to_string()]);
    }

    #[tokio::test]
    async fn same_deadline_is_not_reminded_twice() {
        let now = utc("2026-10-14T15:00:00Z");
        let mut store = FakeStore::default();
        store.deadlines.insert(Recinto::Cccr, now + Duration::minutes(23 * 60 + 50));

        let (job, mailer) = job(store);
        assert_eq!(job.scan(now).await, 1);
        assert_eq!(job.scan(now + Duration::minutes(20)).await, 0);
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn failing_facility_does_not_stop_the_scan() {
        let now = utc("2026-10-14T15:00:00Z");
        let mut store = FakeStore::default();
        store.failing.insert(Recinto::Cccr);
        store.deadlines.insert(Recinto::Ccci, now + Duration::minutes(23 * 60 + 30));
        store.deadlines.insert(Recinto::Cevp, now + Duration::minutes(23 * 60 + 30));

        let (job, mailer) = job(store);
        assert_eq!(job.scan(now).await, 2);
        assert_eq!(mailer.sent.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn undelivered_reminder_is_retried_on_the_next_scan() {
        let now = utc("2026-10-14T15:00:00Z");
        let fecha = now + Duration::minutes(23 * 60 + 50);
        let mut store = FakeStore::default();
        store.deadlines.insert(Recinto::Cccr, fecha);
        let store = Arc::new(store);

        let down = ReminderJob::new(
            store.clone(),
            Arc::new(FakeMailer { fail: true, ..Default::default() }),
            chrono_tz::America::Mexico_City,
            "https://planes.example.com".into(),
        );
        assert_eq!(down.scan(now).await, 0);
        assert!(store.sent.lock().await.is_empty());

        let mailer = Arc::new(FakeMailer::default());
        let up = ReminderJob::new(
            store.clone(),
            mailer.clone(),
            chrono_tz::America::Mexico_City,
            "https://planes.example.com".into(),
        );
        assert_eq!(up.scan(now + Duration::minutes(5)).await, 1);
        assert_eq!(mailer.sent.lock().await.len(), 1);
        assert!(store.sent.lock().await.contains(&(Recinto::Cccr, fecha)));
    }

    #[tokio::test]
    async fn facility_without_deadline_is_skipped() {
        let (job, mailer) = job(FakeStore::default());
        assert_eq!(job.scan(Utc::now()).await, 0);
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[test]
    fn next_fire_skips_evenings_and_weekends() {
        let tz = chrono_tz::America::Mexico_City;

        // Quarta 07:10 local -> 08:00 do mesmo dia
        assert_eq!(next_fire_after(utc("2026-10-14T13:10:00Z"), &tz), utc("2026-10-14T14:00:00Z"));
        // Quarta 12:00 em ponto -> 13:00
        assert_eq!(next_fire_after(utc("2026-10-14T18:00:00Z"), &tz), utc("2026-10-14T19:00:00Z"));
        // Sexta 17:30 local -> segunda 08:00
        assert_eq!(next_fire_after(utc("2026-10-16T23:30:00Z"), &tz), utc("2026-10-19T14:00:00Z"));
    }
}
