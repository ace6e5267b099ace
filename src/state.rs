use std::sync::Arc;

use mongodb::Database;

use super::{config::Config, database::init_mongo};

pub type SharedState = Arc<State>;

pub struct State {
    pub config: Config,
    pub db: Database,
}

impl State {
    pub async fn new() -> SharedState {
        let config = Config::load();

        let db = init_mongo(&config.mongo_url, &config.db_name).await;

        Arc::new(Self { config, db })
    }
}
