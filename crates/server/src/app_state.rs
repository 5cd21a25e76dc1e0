use std::sync::Arc;

use tracker::Tracker;

use crate::telegram::Outbox;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) tracker: Arc<Tracker>,
    pub(crate) outbox: Arc<dyn Outbox>,
}
