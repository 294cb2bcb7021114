//! Assignable business entities: the record kinds that carry a
//! "responsible user" reference and participate in the deactivation cascade.

use serde::Serialize;
use utoipa::ToSchema;

/// Every business table with a nullable `responsavel_id` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssignableKind {
    /// Case records (the `acervo` table), reported as `processos`
    Processos,
    Audiencias,
    /// Captured pending filings (the `expedientes` table)
    Pendentes,
    ExpedientesManuais,
    Contratos,
}

impl AssignableKind {
    pub const ALL: [AssignableKind; 5] = [
        AssignableKind::Processos,
        AssignableKind::Audiencias,
        AssignableKind::Pendentes,
        AssignableKind::ExpedientesManuais,
        AssignableKind::Contratos,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            AssignableKind::Processos => "acervo",
            AssignableKind::Audiencias => "audiencias",
            AssignableKind::Pendentes => "expedientes",
            AssignableKind::ExpedientesManuais => "expedientes_manuais",
            AssignableKind::Contratos => "contratos",
        }
    }

    /// Key used in count reports.
    pub fn key(self) -> &'static str {
        match self {
            AssignableKind::Processos => "processos",
            AssignableKind::Audiencias => "audiencias",
            AssignableKind::Pendentes => "pendentes",
            AssignableKind::ExpedientesManuais => "expedientes_manuais",
            AssignableKind::Contratos => "contratos",
        }
    }
}

/// Per-kind counts of records unassigned by a deactivation cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReassignmentCounts {
    pub processos: i64,
    pub audiencias: i64,
    pub pendentes: i64,
    pub expedientes_manuais: i64,
    pub contratos: i64,
}

impl ReassignmentCounts {
    pub fn get(&self, kind: AssignableKind) -> i64 {
        match kind {
            AssignableKind::Processos => self.processos,
            AssignableKind::Audiencias => self.audiencias,
            AssignableKind::Pendentes => self.pendentes,
            AssignableKind::ExpedientesManuais => self.expedientes_manuais,
            AssignableKind::Contratos => self.contratos,
        }
    }

    pub fn set(&mut self, kind: AssignableKind, count: i64) {
        match kind {
            AssignableKind::Processos => self.processos = count,
            AssignableKind::Audiencias => self.audiencias = count,
            AssignableKind::Pendentes => self.pendentes = count,
            AssignableKind::ExpedientesManuais => self.expedientes_manuais = count,
            AssignableKind::Contratos => self.contratos = count,
        }
    }

    pub fn total(&self) -> i64 {
        AssignableKind::ALL.iter().map(|&k| self.get(k)).sum()
    }
}
