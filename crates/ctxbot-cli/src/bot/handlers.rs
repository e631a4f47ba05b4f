use tracing::{debug, error, info};

use ctxbot_lib::config::WEB_SEARCH_MAX_RESULTS;
use ctxbot_lib::pipeline::answer::news_summary_prompt;
use ctxbot_lib::pipeline::{QueryClass, Responder, Retriever, classify_query};
use ctxbot_lib::search::{SearchDepth, WebSearch};
use ctxbot_lib::telegram::{Command, Update, parse_command};

use super::replies::{
    self, APOLOGY, FINDING_ANSWER, NO_TEXT, NOT_AVAILABLE, SEARCHING, SUMMARIZING,
    UNKNOWN_COMMAND,
};
use super::{BotContext, ChatReplier};

/// Handle one update end to end. Failures are logged and answered with a
/// fixed apology; nothing propagates to the delivery loop.
pub async fn handle_update(ctx: &BotContext, update: Update) {
    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "Ignoring update without a message");
        return;
    };
    let Some(text) = message.text.as_deref() else {
        debug!(update_id = update.update_id, "Ignoring non-text message");
        return;
    };

    let chat_id = message.chat.id;
    let replier = ChatReplier::new(ctx.telegram.as_ref(), chat_id);

    let (command, result) = match parse_command(text) {
        Some(cmd) => {
            info!(chat_id, command = %cmd.name, "Handling command");
            let name = cmd.name.clone();
            (name, handle_command(ctx, &replier, &cmd).await)
        }
        None => {
            info!(chat_id, "Handling free text");
            ("text".to_string(), handle_text(ctx, &replier, text).await)
        }
    };

    if let Err(e) = result {
        error!(chat_id, command = %command, error = %format!("{e:#}"), "Request failed");
        if let Err(e) = replier.send(APOLOGY).await {
            error!(chat_id, error = %e, "Failed to send apology");
        }
    }
}

async fn handle_command(
    ctx: &BotContext,
    replier: &ChatReplier<'_>,
    command: &Command<'_>,
) -> anyhow::Result<()> {
    let features = ctx.features();
    let args = command.args;

    match command.name.as_str() {
        "start" => replier.send(&replies::greeting(features)).await?,
        "ctx" => match &ctx.retriever {
            Some(retriever) => show_chunks(ctx, replier, retriever, args).await?,
            None => replier.send(NOT_AVAILABLE).await?,
        },
        "ctxsum" => match (&ctx.retriever, &ctx.responder) {
            (Some(retriever), Some(responder)) => {
                summarize_chunks(ctx, replier, retriever, responder, args).await?;
            }
            _ => replier.send(NOT_AVAILABLE).await?,
        },
        "rag" => match (&ctx.retriever, &ctx.responder) {
            (Some(retriever), Some(responder)) => {
                answer_from_knowledge(ctx, replier, retriever, responder, args).await?;
            }
            _ => replier.send(NOT_AVAILABLE).await?,
        },
        "search" => match &ctx.search {
            Some(search) => web_search(replier, search.as_ref(), args).await?,
            None => replier.send(NOT_AVAILABLE).await?,
        },
        "ask" => match &ctx.search {
            Some(search) => web_answer(replier, search.as_ref(), args).await?,
            None => replier.send(NOT_AVAILABLE).await?,
        },
        "summary" => match (&ctx.search, &ctx.responder) {
            (Some(search), Some(responder)) => {
                news_summary(ctx, replier, search.as_ref(), responder, args).await?;
            }
            _ => replier.send(NOT_AVAILABLE).await?,
        },
        other => {
            debug!(command = other, "Unknown command");
            replier.send(UNKNOWN_COMMAND).await?;
        }
    }
    Ok(())
}

/// The searchable query in `args`, or `None` after sending the usage hint.
async fn query_or_usage<'a>(
    replier: &ChatReplier<'_>,
    command: &str,
    args: &'a str,
) -> anyhow::Result<Option<&'a str>> {
    match classify_query(args) {
        QueryClass::Searchable(query) => Ok(Some(query)),
        QueryClass::Rejected { reason } => {
            debug!(command, reason, "Query rejected");
            replier.send(&replies::usage(command)).await?;
            Ok(None)
        }
    }
}

async fn show_chunks(
    ctx: &BotContext,
    replier: &ChatReplier<'_>,
    retriever: &Retriever,
    args: &str,
) -> anyhow::Result<()> {
    let Some(query) = query_or_usage(replier, "ctx", args).await? else {
        return Ok(());
    };
    let hits = retriever.retrieve_async(query, ctx.top_k).await?;
    replier.send(&replies::format_chunks(query, &hits)).await?;
    Ok(())
}

async fn summarize_chunks(
    ctx: &BotContext,
    replier: &ChatReplier<'_>,
    retriever: &Retriever,
    responder: &Responder,
    args: &str,
) -> anyhow::Result<()> {
    let Some(query) = query_or_usage(replier, "ctxsum", args).await? else {
        return Ok(());
    };
    let hits = retriever.retrieve_async(query, ctx.top_k).await?;
    let summary = responder.summarize(query, &hits).await?;
    replier
        .send(&replies::format_context_summary(query, &summary))
        .await?;
    Ok(())
}

async fn answer_from_knowledge(
    ctx: &BotContext,
    replier: &ChatReplier<'_>,
    retriever: &Retriever,
    responder: &Responder,
    args: &str,
) -> anyhow::Result<()> {
    let Some(query) = query_or_usage(replier, "rag", args).await? else {
        return Ok(());
    };
    let hits = retriever.retrieve_async(query, ctx.top_k).await?;
    let answer = responder.answer(query, &hits).await?;
    replier.send(&answer).await?;
    Ok(())
}

async fn web_search(
    replier: &ChatReplier<'_>,
    search: &dyn WebSearch,
    args: &str,
) -> anyhow::Result<()> {
    let Some(query) = query_or_usage(replier, "search", args).await? else {
        return Ok(());
    };
    replier.send(SEARCHING).await?;
    let hits = search
        .search(query, SearchDepth::Basic, WEB_SEARCH_MAX_RESULTS)
        .await?;
    replier
        .send(&replies::format_search_results(query, &hits))
        .await?;
    Ok(())
}

async fn web_answer(
    replier: &ChatReplier<'_>,
    search: &dyn WebSearch,
    args: &str,
) -> anyhow::Result<()> {
    let Some(query) = query_or_usage(replier, "ask", args).await? else {
        return Ok(());
    };
    replier.send(FINDING_ANSWER).await?;
    let answer = search.qna(query).await?;
    replier.send(&replies::format_qna(&answer)).await?;
    Ok(())
}

async fn news_summary(
    ctx: &BotContext,
    replier: &ChatReplier<'_>,
    search: &dyn WebSearch,
    responder: &Responder,
    args: &str,
) -> anyhow::Result<()> {
    let Some(query) = query_or_usage(replier, "summary", args).await? else {
        return Ok(());
    };
    replier.send(SUMMARIZING).await?;
    let hits = search
        .search(query, SearchDepth::Advanced, WEB_SEARCH_MAX_RESULTS)
        .await?;
    if hits.is_empty() {
        replier
            .send(&replies::format_search_results(query, &hits))
            .await?;
        return Ok(());
    }
    let summary = responder
        .complete(&news_summary_prompt(&hits, &ctx.summary_language))
        .await?;
    replier
        .send(&replies::format_news_summary(query, &summary))
        .await?;
    Ok(())
}

async fn handle_text(
    ctx: &BotContext,
    replier: &ChatReplier<'_>,
    text: &str,
) -> anyhow::Result<()> {
    match &ctx.responder {
        Some(responder) if ctx.chat_enabled => {
            match classify_query(text) {
                QueryClass::Searchable(text) => {
                    let reply = responder.complete(text).await?;
                    replier.send(&reply).await?;
                }
                QueryClass::Rejected { reason } => {
                    debug!(reason, "Free text rejected");
                    replier.send(NO_TEXT).await?;
                }
            }
        }
        _ => {
            replier
                .send(&replies::chat_disabled_hint(ctx.features()))
                .await?;
        }
    }
    Ok(())
}
