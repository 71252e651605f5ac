use axum::extract::State;
use serde::Serialize;

use crate::application::error::AppError;
use crate::cache::Source;
use crate::domain::jokes::Joke;

use super::envelope::Reply;
use super::state::HttpState;

#[derive(Debug, Serialize)]
pub struct JokeView {
    /// `api` when fetched from upstream for this request, `cache` otherwise.
    pub source: &'static str,
    pub joke: Joke,
}

pub async fn get_joke(State(state): State<HttpState>) -> Result<Reply<JokeView>, AppError> {
    let joke = state.jokes.get_joke().await?;
    let source = joke.source;
    let view = JokeView {
        source: match source {
            Source::Cache => "cache",
            Source::Origin => "api",
        },
        joke: joke.value,
    };
    Ok(Reply::ok("Jokes Fetched Successfully", view).cache_status(source))
}
