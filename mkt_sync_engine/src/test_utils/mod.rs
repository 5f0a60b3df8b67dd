pub mod prepare_env;
pub mod scripted_source;
