use std::sync::Arc;

use kotatsu_schema::InboundMessage;
use tokio::task::JoinHandle;

use crate::router::{CommandOutcome, CommandRouter};
use crate::search::{SearchOutcome, SearchTrigger};

/// Which engine took a message. A message goes to exactly one of them.
#[derive(Debug)]
pub enum Dispatched {
    Command(CommandOutcome),
    Search(JoinHandle<SearchOutcome>),
}

/// Entry point for every inbound message.
pub struct Dispatcher {
    router: CommandRouter,
    search: Arc<SearchTrigger>,
}

impl Dispatcher {
    pub fn new(router: CommandRouter, search: SearchTrigger) -> Self {
        Self {
            router,
            search: Arc::new(search),
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub async fn dispatch(&self, msg: InboundMessage) -> Dispatched {
        if self.router.is_command(&msg.content) {
            Dispatched::Command(self.router.handle(&msg).await)
        } else {
            Dispatched::Search(self.search.spawn(msg))
        }
    }
}
