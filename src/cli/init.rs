use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{config_path, expand_home, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(dir) = data_dir {
        settings.data_dir = expand_home(&dir);
    }
    settings.save()?;

    std::fs::create_dir_all(settings.exports_dir())?;
    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    println!("Initialized etb at {}", settings.data_dir.display());
    println!("Settings written to {}", config_path().display());
    Ok(())
}
