use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::error::HandlerResult;

const START_TEXT: &str = "Привіт! Кидай посилання на TikTok / Instagram / X (Twitter).";

const HELP_TEXT: &str = "Надішли посилання на пост — я поверну медіа.\n\n\
Модифікатори поруч із посиланням:\n\
- або ! — тільки медіа, без опису та кнопок\n\
audio або !a — тільки звукова доріжка\n\
translate або переклад — одразу показати переклад опису";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Help,
}

pub async fn setup_bot_commands(bot: &Throttle<Bot>) -> HandlerResult<()> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "Почати роботу"),
        BotCommand::new("help", "Як користуватися ботом"),
    ])
    .await?;

    Ok(())
}

pub async fn handle_command(bot: Throttle<Bot>, msg: Message, cmd: Command) -> HandlerResult<()> {
    match cmd {
        Command::Start => bot.send_message(msg.chat.id, START_TEXT).await?,
        Command::Help => bot.send_message(msg.chat.id, HELP_TEXT).await?,
    };

    Ok(())
}
