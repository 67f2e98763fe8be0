use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{collections::BTreeMap, time::Duration};

use crate::models::recinto::Recinto;

// ---
// Um banco por recinto
// ---
/// Pools de conexão por recinto. Recintos com a mesma URL compartilham o pool.
#[derive(Clone)]
pub struct FacilityPools {
    cccr: PgPool,
    ccci: PgPool,
    cevp: PgPool,
    distinct: Vec<(String, PgPool)>,
}

impl FacilityPools {
    /// Cria os pools sem conectar (a conexão acontece no primeiro uso).
    pub fn connect_lazy(urls: &BTreeMap<Recinto, String>, fallback: &str) -> Result<Self, sqlx::Error> {
        let mut distinct: Vec<(String, PgPool)> = Vec::new();

        let mut pool_for = |recinto: Recinto| -> Result<PgPool, sqlx::Error> {
            let url = urls.get(&recinto).map(String::as_str).unwrap_or(fallback);
            if let Some((_, pool)) = distinct.iter().find(|(u, _)| u == url) {
                return Ok(pool.clone());
            }
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect_lazy(url)?;
            distinct.push((url.to_string(), pool.clone()));
            Ok(pool)
        };

        let cccr = pool_for(Recinto::Cccr)?;
        let ccci = pool_for(Recinto::Ccci)?;
        let cevp = pool_for(Recinto::Cevp)?;

        Ok(Self { cccr, ccci, cevp, distinct })
    }

    pub fn get(&self, recinto: Recinto) -> &PgPool {
        match recinto {
            Recinto::Cccr => &self.cccr,
            Recinto::Ccci => &self.ccci,
            Recinto::Cevp => &self.cevp,
        }
    }

    /// Um pool por banco físico (para rodar as migrações uma única vez).
    pub fn distinct_pools(&self) -> impl Iterator<Item = &PgPool> {
        self.distinct.iter().map(|(_, pool)| pool)
    }

    pub fn distinct_count(&self) -> usize {
        self.distinct.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn facilities_without_url_share_the_fallback_pool() {
        let mut urls = BTreeMap::new();
        urls.insert(Recinto::Cccr, "postgres://localhost/cccr".to_string());
        urls.insert(Recinto::Cevp, "postgres://localhost/cevp".to_string());

        let pools = FacilityPools::connect_lazy(&urls, "postgres://localhost/cccr").unwrap();
        assert_eq!(pools.distinct_count(), 2);
    }
}
