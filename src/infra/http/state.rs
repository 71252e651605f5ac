use std::sync::Arc;

use crate::application::jokes::JokeService;
use crate::application::users::UserService;
use crate::cache::CacheClient;

#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<UserService>,
    pub jokes: Arc<JokeService>,
    pub cache: CacheClient,
}
