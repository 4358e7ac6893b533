use anyhow::Error;
use tracing::info;

use crate::args::ConfigSubCommand;
use crate::config::{get_config_path, get_effective_value, load_config_from, write_config_to, KEYS};

pub fn run(config_cmd: &ConfigSubCommand) -> Result<(), Error> {
    if let Some(assignment) = &config_cmd.set {
        let path = get_config_path();
        let mut config = load_config_from(&path);
        config.assign(assignment)?;
        write_config_to(&path, &config)?;
        info!("Updated {}", path.display());
    }

    match &config_cmd.get {
        Some(key) => println!("{}", get_effective_value(key)?),
        None if config_cmd.set.is_none() => {
            let file = load_config_from(&get_config_path());
            for key in KEYS {
                let effective = get_effective_value(key)?;
                match file.get(key)? {
                    Some(stored) if !key.ends_with("_api_key") && stored != effective => {
                        println!("{} = {} (environment overrides file value {})", key, effective, stored)
                    }
                    _ => println!("{} = {}", key, effective),
                }
            }
        }
        None => {}
    }
    Ok(())
}
