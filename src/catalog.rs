//! Permission catalog: the authoritative resource/operation vocabulary.
//!
//! The catalog is an immutable value built once at startup and passed by
//! reference (`Arc<PermissionCatalog>`) into the authorization gate, the
//! matrix presenter and the stores. It is never global state, which keeps
//! every consumer testable against fixture catalogs.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::permission::GrantInput;

/// One resource and its ordered set of valid operations.
#[derive(Debug, Clone)]
pub struct CatalogResource {
    pub name: String,
    pub operations: Vec<String>,
}

/// Immutable mapping from resource name to its valid operations.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    resources: Vec<CatalogResource>,
    index: HashMap<String, usize>,
}

impl PermissionCatalog {
    /// Build a catalog from (resource, operations) pairs. Order is preserved
    /// and is the order the UI renders the matrix in.
    pub fn new<R, O>(entries: Vec<(R, Vec<O>)>) -> Self
    where
        R: Into<String>,
        O: Into<String>,
    {
        let resources: Vec<CatalogResource> = entries
            .into_iter()
            .map(|(name, operations)| CatalogResource {
                name: name.into(),
                operations: operations.into_iter().map(Into::into).collect(),
            })
            .collect();
        let index = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        Self { resources, index }
    }

    /// The full production catalog.
    pub fn standard() -> Self {
        let crud = || vec!["listar", "visualizar", "criar", "editar", "deletar"];
        Self::new(vec![
            ("advogados", crud()),
            (
                "credenciais",
                vec!["listar", "visualizar", "criar", "editar", "deletar", "ativar_desativar"],
            ),
            (
                "acervo",
                vec![
                    "listar",
                    "visualizar",
                    "editar",
                    "atribuir_responsavel",
                    "desatribuir_responsavel",
                    "transferir_responsavel",
                ],
            ),
            (
                "audiencias",
                vec![
                    "listar",
                    "visualizar",
                    "editar",
                    "atribuir_responsavel",
                    "desatribuir_responsavel",
                    "transferir_responsavel",
                    "editar_url_virtual",
                ],
            ),
            (
                "pendentes",
                vec![
                    "listar",
                    "visualizar",
                    "atribuir_responsavel",
                    "desatribuir_responsavel",
                    "transferir_responsavel",
                    "baixar_expediente",
                    "reverter_baixa",
                    "editar_tipo_descricao",
                ],
            ),
            (
                "expedientes_manuais",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "atribuir_responsavel",
                    "desatribuir_responsavel",
                    "transferir_responsavel",
                    "baixar_expediente",
                    "reverter_baixa",
                ],
            ),
            (
                "usuarios",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "ativar_desativar",
                    "gerenciar_permissoes",
                    "sincronizar",
                ],
            ),
            ("clientes", crud()),
            ("partes_contrarias", crud()),
            ("terceiros", crud()),
            ("representantes", crud()),
            ("enderecos", crud()),
            (
                "contratos",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "associar_processo",
                    "desassociar_processo",
                ],
            ),
            (
                "processo_partes",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "vincular_parte",
                    "desvincular_parte",
                ],
            ),
            (
                "acordos_condenacoes",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "gerenciar_parcelas",
                    "receber_pagamento",
                    "pagar",
                    "registrar_repasse",
                ],
            ),
            (
                "parcelas",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "editar_valores",
                    "marcar_como_recebida",
                    "marcar_como_paga",
                    "anexar_comprovante",
                    "registrar_repasse",
                ],
            ),
            (
                "agendamentos",
                vec![
                    "listar",
                    "visualizar",
                    "criar",
                    "editar",
                    "deletar",
                    "executar",
                    "ativar_desativar",
                ],
            ),
            (
                "captura",
                vec![
                    "executar_acervo_geral",
                    "executar_arquivados",
                    "executar_audiencias",
                    "executar_pendentes",
                    "visualizar_historico",
                    "gerenciar_credenciais",
                ],
            ),
            ("tipos_expedientes", crud()),
            (
                "cargos",
                vec!["listar", "visualizar", "criar", "editar", "deletar", "ativar_desativar"],
            ),
        ])
    }

    /// Resources in catalog order.
    pub fn resources(&self) -> &[CatalogResource] {
        &self.resources
    }

    /// Every (resource, operation) pair in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resources.iter().flat_map(|r| {
            r.operations
                .iter()
                .map(move |op| (r.name.as_str(), op.as_str()))
        })
    }

    /// Operations for a resource. Unknown resources yield an empty slice,
    /// never an error.
    pub fn operations_for(&self, resource: &str) -> &[String] {
        match self.index.get(resource) {
            Some(&i) => &self.resources[i].operations,
            None => &[],
        }
    }

    pub fn is_valid_resource(&self, resource: &str) -> bool {
        self.index.contains_key(resource)
    }

    pub fn is_valid_operation(&self, resource: &str, operation: &str) -> bool {
        self.operations_for(resource).iter().any(|op| op == operation)
    }

    /// Total number of (resource, operation) pairs, used for
    /// "N of M permissions active" reporting.
    pub fn total_entry_count(&self) -> usize {
        self.resources.iter().map(|r| r.operations.len()).sum()
    }

    /// Reject a grant batch containing any pair outside the catalog.
    /// The whole batch fails; catalog-invalid entries are never persisted.
    pub fn validate_grants(&self, grants: &[GrantInput]) -> Result<()> {
        for grant in grants {
            if !self.is_valid_operation(&grant.resource, &grant.operation) {
                return Err(AppError::Validation(format!(
                    "unknown permission pair: {}:{}",
                    grant.resource, grant.operation
                )));
            }
        }
        Ok(())
    }
}
