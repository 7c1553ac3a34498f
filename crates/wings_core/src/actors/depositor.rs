//! Stamps the acting user onto newly created resources.

use super::{Actor, ActorResult, Environment, Next};
use crate::model::resource::{Literal, Resource};

pub const DEPOSITOR_ATTRIBUTE: &str = "depositor";

/// Middleware setting `depositor` on create when neither the request nor the
/// resource already carries one. Updates and deletes pass through.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyDepositorActor;

impl Actor for ApplyDepositorActor {
    fn name(&self) -> &'static str {
        "apply_depositor"
    }

    fn create(&self, env: &mut Environment<'_>, next: Next<'_>) -> ActorResult<Option<Resource>> {
        let user_key = env.current_user.user_key.trim();
        let already_set = env
            .attributes
            .get(DEPOSITOR_ATTRIBUTE)
            .is_some_and(|values| !values.is_empty())
            || !env.change_set.resource().get(DEPOSITOR_ATTRIBUTE).is_empty();

        if !user_key.is_empty() && !already_set {
            env.attributes.insert(
                DEPOSITOR_ATTRIBUTE.to_string(),
                vec![Literal::text(user_key)],
            );
        }
        next.create(env)
    }
}
