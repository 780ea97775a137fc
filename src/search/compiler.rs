//! Term tree → [`EntityQuery`].

use tracing::debug;

use super::query::EntityQuery;
use super::registry::QueryRegistry;
use crate::model::types::{SearchDomain, Term};

/// Compile `term` into one query over `domain`.
///
/// Leaves dispatch through the domain's category table; a category the
/// table does not know contributes no rows. Operations combine their
/// compiled children with the matching set operator.
pub fn compile(registry: &QueryRegistry, domain: SearchDomain, term: &Term) -> EntityQuery {
    match term {
        Term::Expression { category, value } => match registry.resolve(domain, category) {
            Some(handler) => (handler.build)(domain, value),
            None => {
                debug!(
                    domain = %domain,
                    category = category.as_str(),
                    known = ?registry.categories(domain),
                    "unknown search category; leaf matches nothing"
                );
                EntityQuery::empty(domain)
            }
        },
        Term::Operation {
            operator,
            left,
            right,
        } => {
            let left = compile(registry, domain, left);
            let right = compile(registry, domain, right);
            left.combine((*operator).into(), right)
        }
    }
}
