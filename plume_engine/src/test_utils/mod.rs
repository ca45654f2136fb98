mod prepare_env;

pub use prepare_env::*;
