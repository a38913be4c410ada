//! Personal todo lists.

use crate::error::CommandResult;
use crate::framework::Context;
use pbbot_common::{plural, truncate_string, UserId};

/// Longest rendered list before the remaining tasks are summarized.
pub const TODO_MESSAGE_LIMIT: usize = 1900;

/// Renders a numbered todo list, summarizing the tail when it would not fit
/// in one message.
pub fn render_todo_list<S: AsRef<str>>(tasks: &[S]) -> String {
    if tasks.is_empty() {
        return "Your todo list is empty.".to_string();
    }

    let mut out = String::new();
    for (i, task) in tasks.iter().enumerate() {
        let line = format!("{}. {}\n", i + 1, task.as_ref());
        if out.chars().count() + line.chars().count() > TODO_MESSAGE_LIMIT {
            let rest = (tasks.len() - i) as u64;
            out.push_str(&format!("...and {rest} more {}", plural(rest, "task")));
            return out;
        }
        out.push_str(&line);
    }
    out.trim_end().to_string()
}

/// Longest task text quoted back in a reply.
pub const QUOTED_TASK_LIMIT: usize = 100;

/// Reply for a removed task, quoting at most [`QUOTED_TASK_LIMIT`] characters.
pub fn removed_reply(task: &str) -> String {
    format!(
        "Removed `{}` from your todo list.",
        truncate_string(task, QUOTED_TASK_LIMIT)
    )
}

fn author(ctx: &Context<'_>) -> UserId {
    UserId(ctx.author().id.get())
}

/// Shows your todo list.
#[poise::command(prefix_command, subcommands("list", "add", "remove", "clear"))]
pub async fn todo(ctx: Context<'_>) -> CommandResult {
    let tasks = ctx.data().cache.todos(author(&ctx));
    ctx.say(render_todo_list(&tasks)).await?;
    Ok(())
}

/// Shows your todo list.
#[poise::command(prefix_command)]
pub async fn list(ctx: Context<'_>) -> CommandResult {
    let tasks = ctx.data().cache.todos(author(&ctx));
    ctx.say(render_todo_list(&tasks)).await?;
    Ok(())
}

/// Adds a task to your todo list.
#[poise::command(prefix_command)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Task to add"]
    #[rest]
    task: String,
) -> CommandResult {
    let position = ctx.data().cache.add_todo(author(&ctx), &task)?;
    ctx.say(format!("Added task {position} to your todo list."))
        .await?;
    Ok(())
}

/// Removes a task from your todo list by its number.
#[poise::command(prefix_command)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Number of the task to remove"] index: usize,
) -> CommandResult {
    let task = ctx.data().cache.remove_todo(author(&ctx), index)?;
    ctx.say(removed_reply(&task)).await?;
    Ok(())
}

/// Removes every task from your todo list.
#[poise::command(prefix_command)]
pub async fn clear(ctx: Context<'_>) -> CommandResult {
    let count = ctx.data().cache.clear_todos(author(&ctx))? as u64;
    ctx.say(format!(
        "Removed {count} {} from your todo list.",
        plural(count, "task")
    ))
    .await?;
    Ok(())
}
