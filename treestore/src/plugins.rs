//! Built-in plugins.

use tracing::info;

use crate::store::Store;

/// Report every executed mutation as an `info` event.
///
/// The logger occupies the store's single subscriber slot.
pub fn mutation_logger() -> impl FnOnce(&Store) + 'static {
    |store: &Store| {
        store.subscribe(|mutation, state| {
            info!(
                mutation = %mutation.kind,
                payload = %mutation.payload,
                state = %state.snapshot(),
                "mutation committed"
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreOptions;
    use crate::test_support::{SubscriberLog, counter_module};
    use serde_json::json;

    #[test]
    fn logger_takes_the_subscriber_slot() {
        let store = Store::new(StoreOptions::new(counter_module()).plugin(mutation_logger()))
            .expect("store");
        store.commit("add", json!(1)).expect("commit with logger");

        // A later subscriber displaces the logger.
        let log = SubscriberLog::attach(&store);
        store.commit("add", json!(1)).expect("commit");
        assert_eq!(log.kinds(), vec!["add".to_string()]);
        assert_eq!(store.state().get(&["age"]), Some(json!(12)));
    }
}
