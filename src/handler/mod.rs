pub mod callback;
pub mod keyboard;
pub mod message;
pub mod render;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::command::{handle_command, Command};
use crate::utils::parse_request;

pub fn handler_tree() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .filter_map(|msg: Message| msg.text().and_then(parse_request))
                .endpoint(message::handle_link),
        )
        // an edited message re-enters the same pipeline as a fresh one
        .branch(
            Update::filter_edited_message()
                .filter_map(|msg: Message| msg.text().and_then(parse_request))
                .endpoint(message::handle_link),
        )
        .branch(Update::filter_callback_query().endpoint(callback::handle_callback))
}
