//! PersonaCatalog port - Read access to the external persona catalog.

use async_trait::async_trait;

use crate::domain::catalog::{Persona, PersonaFilter};
use crate::domain::foundation::{DomainError, PersonaId};

/// Port for looking up simulated clients.
///
/// The catalog owns personas; sessions only read them.
#[async_trait]
pub trait PersonaCatalog: Send + Sync {
    /// Returns every persona matching `filter`, in catalog order.
    async fn get_personas(&self, filter: &PersonaFilter) -> Result<Vec<Persona>, DomainError>;

    /// Returns a single persona.
    ///
    /// # Errors
    ///
    /// `PersonaNotFound` if no persona has this id.
    async fn get_persona(&self, id: &PersonaId) -> Result<Persona, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn PersonaCatalog) {}
}
