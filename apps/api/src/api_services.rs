mod database;
mod sessions;
mod state_builder;
mod tree_import;

pub use database::connect_and_migrate;
pub use sessions::build_postgres_session_layer;
pub use state_builder::build_app_state;
pub use tree_import::import_tree_file;
