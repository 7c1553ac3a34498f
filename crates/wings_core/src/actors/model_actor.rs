//! Terminal actor writing through the persister.

use super::{ActorResult, ChangeSet, Environment, TerminalActor};
use crate::model::resource::Resource;
use log::debug;

/// Applies the request attributes to the change set and persists the result.
///
/// After a successful save the change set is reset onto the stored resource,
/// so later stages observe the assigned id and timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelActor;

impl ModelActor {
    fn apply_and_save(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        env.change_set.apply(&env.attributes);
        let changed = env.change_set.changed_attributes().count();
        let saved = env.persister.save(&env.change_set.sync())?;

        debug!(
            "event=actor_save module=actors status=ok kind={} changed_attributes={}",
            saved.internal_resource, changed
        );
        env.change_set = ChangeSet::new(saved.clone());
        Ok(Some(saved))
    }
}

impl TerminalActor for ModelActor {
    fn create(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        self.apply_and_save(env)
    }

    fn update(&self, env: &mut Environment<'_>) -> ActorResult<Option<Resource>> {
        self.apply_and_save(env)
    }

    fn destroy(&self, env: &mut Environment<'_>) -> ActorResult<bool> {
        env.persister.delete(env.change_set.resource())?;
        Ok(true)
    }
}
