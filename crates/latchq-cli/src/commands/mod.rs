pub mod peek;
pub mod pick;
pub mod serve;
pub mod status;

use crate::config::LatchqConfig;

pub(crate) fn load_config_or_exit() -> LatchqConfig {
    match LatchqConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
