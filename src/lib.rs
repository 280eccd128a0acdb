pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod api {
    pub mod client;
    pub mod session;
}

pub mod handlers {
    pub mod fallback;
    pub mod health;
    pub mod metrics;
}

pub mod metrics {
    pub mod collector;
}

pub mod models {
    pub mod torrent;
    pub mod tracker;
}

pub mod unstaller {
    pub mod classify;
    pub mod evaluator;
    pub mod scheduler;
}

pub mod utils {
    pub mod time;
}
