//! Dispatcher schema and handler chain builders

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use crate::download::DownloadService;
use crate::telegram::bot::{welcome_text, Command};
use crate::telegram::keyboard::parse_choice;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub const EXPIRED_CHOICE_TEXT: &str = "This choice has expired";

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub service: Arc<DownloadService>,
}

impl HandlerDeps {
    pub fn new(service: Arc<DownloadService>) -> Self {
        Self { service }
    }
}

/// Creates the dispatcher schema: commands, then plain text, then button presses.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler())
        .branch(message_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        |bot: Bot, msg: Message, cmd: Command| async move {
            log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);
            match cmd {
                Command::Start | Command::Help => {
                    bot.send_message(msg.chat.id, welcome_text()).await?;
                }
            }
            Ok(())
        },
    ))
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some() && msg.from.is_some())
        .endpoint(move |msg: Message| {
            let deps = deps.clone();
            async move {
                let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
                    return Ok(());
                };
                let user = user.id;
                let chat = msg.chat.id;
                let text = text.to_string();

                // Resolution can take minutes; keep the dispatcher free for button presses
                let service = Arc::clone(&deps.service);
                tokio::spawn(async move {
                    service.submit(user, chat, &text).await;
                });
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let accepted = match q.data.as_deref().and_then(parse_choice) {
                Some((generation, choice)) => deps.service.select(q.from.id, generation, choice).is_some(),
                None => {
                    log::debug!("Ignoring callback data {:?} from {}", q.data, q.from.id);
                    false
                }
            };

            let answer = bot.answer_callback_query(q.id.clone());
            if accepted {
                answer.await?;
            } else {
                answer.text(EXPIRED_CHOICE_TEXT).await?;
            }
            Ok(())
        }
    })
}
